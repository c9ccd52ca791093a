//! In-memory stand-in for a warehouse account. Understands exactly the
//! statement shapes the dashboard issues and keeps a log of them.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use secrecy::ExposeSecret;
use snowdash::db::{Connector, QueryResult, WarehouseClient};
use snowdash::models::connections::Credentials;
use snowdash::DashError;

pub const USERNAME: &str = "alice";
pub const PASSWORD: &str = "correct horse";
pub const BAD_LOGIN: &str = "Incorrect username or password was specified.";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FakeTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

pub type Schemas = BTreeMap<String, BTreeMap<String, FakeTable>>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub warehouses: Vec<String>,
    pub databases: BTreeMap<String, Schemas>,
    /// Statements that fail with the given message, checked before anything else.
    pub failures: BTreeMap<String, String>,
}

impl Catalog {
    pub fn with_warehouses(names: &[&str]) -> Self {
        Self {
            warehouses: names.iter().map(|n| n.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn add_table(&mut self, database: &str, schema: &str, table: &str, data: FakeTable) {
        self.databases
            .entry(database.to_string())
            .or_default()
            .entry(schema.to_string())
            .or_default()
            .insert(table.to_string(), data);
    }

    pub fn add_schema(&mut self, database: &str, schema: &str) {
        self.databases
            .entry(database.to_string())
            .or_default()
            .entry(schema.to_string())
            .or_default();
    }
}

pub fn table(columns: &[&str], rows: usize) -> FakeTable {
    FakeTable {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows: (0..rows)
            .map(|i| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(j, _)| if j == 1 && i % 7 == 0 { None } else { Some(format!("{}-{}", i, j)) })
                    .collect()
            })
            .collect(),
    }
}

#[derive(Default)]
struct Context {
    warehouse: Option<String>,
    database: Option<String>,
    schema: Option<String>,
}

pub struct FakeSession {
    catalog: Arc<Mutex<Catalog>>,
    log: Arc<Mutex<Vec<String>>>,
    context: Mutex<Context>,
}

fn query_error(message: &str) -> DashError {
    DashError::Query(message.to_string())
}

fn missing(kind: &str, name: &str) -> DashError {
    query_error(&format!(
        "SQL compilation error:\n{} '{}' does not exist or not authorized.",
        kind, name
    ))
}

fn exists(name: &str) -> DashError {
    query_error(&format!("SQL compilation error:\nObject '{}' already exists.", name))
}

/// Folds an identifier the way the service does.
fn resolve(ident: &str) -> String {
    let ident = ident.trim();
    if ident.len() >= 2 && ident.starts_with('"') && ident.ends_with('"') {
        ident[1..ident.len() - 1].replace("\"\"", "\"")
    } else {
        ident.to_uppercase()
    }
}

fn names(columns: &[&str], rows: Vec<Vec<String>>) -> QueryResult {
    QueryResult {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows: rows
            .into_iter()
            .map(|row| row.into_iter().map(Some).collect())
            .collect(),
    }
}

fn status(message: String) -> QueryResult {
    names(&["status"], vec![vec![message]])
}

impl FakeSession {
    fn run(&self, sql: &str) -> Result<QueryResult, DashError> {
        let mut catalog = self.catalog.lock().unwrap();
        let mut context = self.context.lock().unwrap();

        if let Some(message) = catalog.failures.get(sql) {
            return Err(query_error(message));
        }

        if sql == "SHOW WAREHOUSES" {
            let rows = catalog
                .warehouses
                .iter()
                .map(|w| vec![w.clone(), "STARTED".to_string()])
                .collect();
            return Ok(names(&["name", "state"], rows));
        }
        if sql == "SHOW DATABASES" {
            let rows = catalog
                .databases
                .keys()
                .map(|d| vec!["2024-01-01".to_string(), d.clone()])
                .collect();
            return Ok(names(&["created_on", "name"], rows));
        }
        if sql == "SHOW SCHEMAS" {
            let database = context
                .database
                .clone()
                .ok_or_else(|| query_error("No active database"))?;
            let schemas = catalog
                .databases
                .get(&database)
                .ok_or_else(|| missing("Database", &database))?;
            let rows = schemas
                .keys()
                .map(|s| vec!["2024-01-01".to_string(), s.clone()])
                .collect();
            return Ok(names(&["created_on", "name"], rows));
        }
        if sql == "SHOW TABLES" {
            let tables = self.current_schema(&catalog, &context)?;
            let rows = tables
                .keys()
                .map(|t| vec!["2024-01-01".to_string(), t.clone()])
                .collect();
            return Ok(names(&["created_on", "name"], rows));
        }

        if let Some(rest) = sql.strip_prefix("USE WAREHOUSE ") {
            let name = resolve(rest);
            if !catalog.warehouses.contains(&name) {
                return Err(missing("Warehouse", &name));
            }
            context.warehouse = Some(name);
            return Ok(status("Statement executed successfully.".to_string()));
        }
        if let Some(rest) = sql.strip_prefix("USE DATABASE ") {
            let name = resolve(rest);
            if !catalog.databases.contains_key(&name) {
                return Err(missing("Database", &name));
            }
            context.database = Some(name);
            context.schema = None;
            return Ok(status("Statement executed successfully.".to_string()));
        }
        if let Some(rest) = sql.strip_prefix("USE SCHEMA ") {
            let name = resolve(rest);
            let database = context
                .database
                .clone()
                .ok_or_else(|| query_error("No active database"))?;
            let found = catalog
                .databases
                .get(&database)
                .map(|schemas| schemas.contains_key(&name))
                .unwrap_or(false);
            if !found {
                return Err(missing("Schema", &name));
            }
            context.schema = Some(name);
            return Ok(status("Statement executed successfully.".to_string()));
        }

        if let Some(rest) = sql.strip_prefix("SELECT * FROM ") {
            let (table, limit) = rest
                .split_once(" LIMIT ")
                .ok_or_else(|| query_error("Unsupported SELECT"))?;
            let limit: usize = limit.parse().map_err(|_| query_error("Bad LIMIT"))?;
            if context.warehouse.is_none() {
                return Err(query_error(
                    "No active warehouse selected in the current session.",
                ));
            }
            let name = resolve(table);
            let tables = self.current_schema(&catalog, &context)?;
            let data = tables.get(&name).ok_or_else(|| missing("Table", &name))?;
            return Ok(QueryResult {
                columns: data.columns.clone(),
                rows: data.rows.iter().take(limit).cloned().collect(),
            });
        }

        if let Some(rest) = sql.strip_prefix("CREATE WAREHOUSE ") {
            let name = resolve(rest);
            if catalog.warehouses.contains(&name) {
                return Err(exists(&name));
            }
            catalog.warehouses.push(name.clone());
            context.warehouse = Some(name.clone());
            return Ok(status(format!("Warehouse {} successfully created.", name)));
        }
        if let Some(rest) = sql.strip_prefix("CREATE DATABASE ") {
            let name = resolve(rest);
            if catalog.databases.contains_key(&name) {
                return Err(exists(&name));
            }
            let mut schemas = Schemas::new();
            schemas.insert("PUBLIC".to_string(), BTreeMap::new());
            catalog.databases.insert(name.clone(), schemas);
            context.database = Some(name.clone());
            context.schema = Some("PUBLIC".to_string());
            return Ok(status(format!("Database {} successfully created.", name)));
        }
        if let Some(rest) = sql.strip_prefix("CREATE SCHEMA ") {
            let name = resolve(rest);
            let database = context
                .database
                .clone()
                .ok_or_else(|| query_error("No active database"))?;
            let schemas = catalog
                .databases
                .get_mut(&database)
                .ok_or_else(|| missing("Database", &database))?;
            if schemas.contains_key(&name) {
                return Err(exists(&name));
            }
            schemas.insert(name.clone(), BTreeMap::new());
            context.schema = Some(name.clone());
            return Ok(status(format!("Schema {} successfully created.", name)));
        }
        if let Some(rest) = sql.strip_prefix("CREATE TABLE ") {
            let (name, defs) = rest
                .split_once(" (")
                .ok_or_else(|| query_error("SQL compilation error:\nsyntax error"))?;
            let columns = parse_columns(sql, defs)?;
            let name = resolve(name);
            let (database, schema) = match (&context.database, &context.schema) {
                (Some(d), Some(s)) => (d.clone(), s.clone()),
                _ => return Err(query_error("No active schema")),
            };
            let tables = catalog
                .databases
                .get_mut(&database)
                .and_then(|schemas| schemas.get_mut(&schema))
                .ok_or_else(|| missing("Schema", &schema))?;
            if tables.contains_key(&name) {
                return Err(exists(&name));
            }
            tables.insert(
                name.clone(),
                FakeTable {
                    columns,
                    rows: Vec::new(),
                },
            );
            return Ok(status(format!("Table {} successfully created.", name)));
        }

        Err(query_error(&format!(
            "SQL compilation error:\nunsupported statement '{}'",
            sql
        )))
    }

    fn current_schema<'a>(
        &self,
        catalog: &'a Catalog,
        context: &Context,
    ) -> Result<&'a BTreeMap<String, FakeTable>, DashError> {
        let (database, schema) = match (&context.database, &context.schema) {
            (Some(d), Some(s)) => (d, s),
            _ => return Err(query_error("No active schema")),
        };
        catalog
            .databases
            .get(database)
            .and_then(|schemas| schemas.get(schema))
            .ok_or_else(|| missing("Schema", schema))
    }
}

/// Column names of `defs` (the text after `CREATE TABLE name (`), or the
/// syntax error the service would report for the whole statement.
fn parse_columns(sql: &str, defs: &str) -> Result<Vec<String>, DashError> {
    let mut depth: i32 = 1;
    for (i, c) in sql.char_indices().skip(sql.len() - defs.len()) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth < 0 || (depth == 0 && i + 1 != sql.len()) {
                    return Err(query_error(&format!(
                        "SQL compilation error:\nsyntax error line 1 at position {} unexpected ')'.",
                        i
                    )));
                }
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(query_error(
            "SQL compilation error:\nsyntax error line 1 at position 0 unexpected '<EOF>'.",
        ));
    }

    let body = &defs[..defs.len() - 1];
    let mut columns = Vec::new();
    let mut depth = 0;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            ',' if depth == 0 => {
                columns.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    columns.push(&body[start..]);

    columns
        .into_iter()
        .map(|def| {
            def.split_whitespace()
                .next()
                .map(|name| name.to_uppercase())
                .ok_or_else(|| query_error("SQL compilation error:\nempty column definition"))
        })
        .collect()
}

#[async_trait]
impl WarehouseClient for FakeSession {
    async fn execute(&self, statement: &str) -> Result<QueryResult, DashError> {
        self.log.lock().unwrap().push(statement.to_string());
        self.run(statement)
    }

    async fn close(&self) -> Result<(), DashError> {
        Ok(())
    }
}

/// Hands out [`FakeSession`]s for one fixed user.
#[derive(Clone)]
pub struct FakeAccount {
    pub catalog: Arc<Mutex<Catalog>>,
    pub log: Arc<Mutex<Vec<String>>>,
    pub logins: Arc<AtomicUsize>,
}

impl FakeAccount {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(Mutex::new(catalog)),
            log: Arc::new(Mutex::new(Vec::new())),
            logins: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn statements(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn snapshot(&self) -> Catalog {
        self.catalog.lock().unwrap().clone()
    }

    pub fn session(&self) -> FakeSession {
        FakeSession {
            catalog: self.catalog.clone(),
            log: self.log.clone(),
            context: Mutex::new(Context::default()),
        }
    }
}

#[async_trait]
impl Connector for FakeAccount {
    async fn connect(
        &self,
        credentials: &Credentials,
    ) -> Result<Box<dyn WarehouseClient>, DashError> {
        self.logins.fetch_add(1, Ordering::SeqCst);
        if credentials.username != USERNAME || credentials.password.expose_secret() != PASSWORD {
            return Err(DashError::Auth(BAD_LOGIN.to_string()));
        }
        Ok(Box::new(self.session()))
    }
}
