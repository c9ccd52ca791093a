use log::{debug, info, warn};

use super::selection::{HierarchySelection, Level};
use crate::{
    db::{catalog, ddl, Connector, WarehouseClient},
    errors::DashError,
    models::{
        connections::Credentials,
        schema::{ColumnDefs, CreateRequest, Identifier, TablePreview},
    },
};

/// Outcome of the last action, shown on the status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    Error(String),
}

impl Notice {
    fn error(err: &DashError) -> Self {
        Notice::Error(err.to_string())
    }
}

/// Options offered at each level for the current selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelOptions {
    pub warehouses: Vec<String>,
    pub databases: Vec<String>,
    pub schemas: Vec<String>,
    pub tables: Vec<String>,
}

impl LevelOptions {
    pub fn get(&self, level: Level) -> &[String] {
        match level {
            Level::Warehouse => &self.warehouses,
            Level::Database => &self.databases,
            Level::Schema => &self.schemas,
            Level::Table => &self.tables,
        }
    }

    fn set(&mut self, level: Level, names: Vec<String>) {
        match level {
            Level::Warehouse => self.warehouses = names,
            Level::Database => self.databases = names,
            Level::Schema => self.schemas = names,
            Level::Table => self.tables = names,
        }
    }

    /// Copy with every level below `level` emptied.
    fn cleared_below(&self, level: Level) -> Self {
        let mut options = self.clone();
        for below in Level::ALL.iter().filter(|l| **l > level) {
            options.set(*below, Vec::new());
        }
        options
    }
}

/// Everything the browser screen shows while logged in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Browsing {
    pub selection: HierarchySelection,
    pub options: LevelOptions,
    pub preview: Option<TablePreview>,
    pub notice: Option<Notice>,
}

impl Browsing {
    fn with_notice(&self, notice: Notice) -> Self {
        Self {
            notice: Some(notice),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    LoggedOut { notice: Option<Notice> },
    LoggedIn(Browsing),
}

/// Raw input of one creation form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateForm {
    pub kind: Level,
    pub name: String,
    pub columns: String,
}

impl CreateForm {
    pub fn new(kind: Level, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            columns: String::new(),
        }
    }

    pub fn table(name: &str, columns: &str) -> Self {
        Self {
            kind: Level::Table,
            name: name.to_string(),
            columns: columns.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum Action {
    Login(Credentials),
    Select(Level, String),
    Create(CreateForm),
    Refresh,
    Logout,
}

/// Owns the session and the current view state.
///
/// Each action runs one transition that builds a new [`ViewState`]; the old
/// state is replaced, never edited. Actions that make no sense in the current
/// state are ignored.
pub struct Navigator {
    connector: Box<dyn Connector>,
    connection: Option<Box<dyn WarehouseClient>>,
    state: ViewState,
}

impl Navigator {
    pub fn new(connector: Box<dyn Connector>) -> Self {
        Self {
            connector,
            connection: None,
            state: ViewState::LoggedOut { notice: None },
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self.state, ViewState::LoggedIn(_))
    }

    pub async fn dispatch(&mut self, action: Action) {
        let next = match action {
            Action::Login(credentials) => {
                if self.is_logged_in() {
                    debug!("ignoring login while logged in");
                    return;
                }
                self.login(credentials).await
            }
            Action::Logout => {
                if !self.is_logged_in() {
                    return;
                }
                self.close_connection().await;
                ViewState::LoggedOut {
                    notice: Some(Notice::Success("Logged out".to_string())),
                }
            }
            action => {
                let (ViewState::LoggedIn(browsing), Some(client)) =
                    (&self.state, self.connection.as_deref())
                else {
                    debug!("ignoring {:?} while logged out", action);
                    return;
                };
                let browsing = match action {
                    Action::Select(level, name) => select(client, browsing, level, &name).await,
                    Action::Create(form) => create(client, browsing, &form).await,
                    Action::Refresh => refresh(client, browsing).await,
                    Action::Login(_) | Action::Logout => return,
                };
                ViewState::LoggedIn(browsing)
            }
        };

        self.state = next;
    }

    /// Ends the session, if any. Called on quit.
    pub async fn shutdown(&mut self) {
        self.close_connection().await;
        self.state = ViewState::LoggedOut { notice: None };
    }

    async fn login(&mut self, credentials: Credentials) -> ViewState {
        if credentials.username.trim().is_empty() {
            return ViewState::LoggedOut {
                notice: Some(Notice::Error("Enter a username".to_string())),
            };
        }

        let client = match self.connector.connect(&credentials).await {
            Ok(client) => client,
            Err(err) => {
                warn!("login failed for {}: {}", credentials.username, err);
                return ViewState::LoggedOut {
                    notice: Some(Notice::error(&err)),
                };
            }
        };

        let mut browsing = Browsing::default();
        match catalog::list_warehouses(client.as_ref()).await {
            Ok(warehouses) => {
                browsing.options.warehouses = warehouses;
                browsing.notice = Some(Notice::Success(format!(
                    "Connected as {}",
                    credentials.username
                )));
            }
            Err(err) => browsing.notice = Some(Notice::error(&err)),
        }

        self.connection = Some(client);
        ViewState::LoggedIn(browsing)
    }

    async fn close_connection(&mut self) {
        if let Some(client) = self.connection.take() {
            if let Err(err) = client.close().await {
                warn!("failed to close session: {}", err);
            }
        }
    }
}

async fn select(
    client: &dyn WarehouseClient,
    browsing: &Browsing,
    level: Level,
    name: &str,
) -> Browsing {
    if !browsing.options.get(level).iter().any(|option| option == name) {
        let err = DashError::Validation(format!("{} '{}' is not available", level, name));
        return browsing.with_notice(Notice::error(&err));
    }

    let selection = match browsing.selection.with(level, name) {
        Ok(selection) => selection,
        Err(err) => return browsing.with_notice(Notice::error(&err)),
    };
    debug!("selected {} {}", level, name);

    let mut next = Browsing {
        selection,
        options: browsing.options.cleared_below(level),
        preview: None,
        notice: None,
    };

    let loaded = match level.child() {
        Some(child) => list_options(client, &next.selection, child)
            .await
            .map(|names| next.options.set(child, names)),
        None => load_preview(client, &next.selection)
            .await
            .map(|preview| next.preview = Some(preview)),
    };
    if let Err(err) = loaded {
        next.notice = Some(Notice::error(&err));
    }

    next
}

async fn create(client: &dyn WarehouseClient, browsing: &Browsing, form: &CreateForm) -> Browsing {
    let request = match create_request(&browsing.selection, form) {
        Ok(request) => request,
        Err(err) => return browsing.with_notice(Notice::error(&err)),
    };

    let created = match &request {
        // CREATE DATABASE moves the session into the new database, so a bare
        // USE SCHEMA could resolve against the wrong parent.
        CreateRequest::Table { .. } => match database_of(&browsing.selection) {
            Ok(database) => catalog::use_context(client, None, Some(&database), None).await,
            Err(err) => Err(err),
        },
        _ => Ok(()),
    };
    let created = match created {
        Ok(()) => ddl::execute(client, &request).await,
        Err(err) => Err(err),
    };
    if let Err(err) = created {
        warn!("create {} failed: {}", request.kind().to_lowercase(), err);
        return browsing.with_notice(Notice::error(&err));
    }

    let message = format!("{} {} created", request.kind(), request.name().stored_name());
    info!("{}", message);

    let mut next = browsing.clone();
    match list_options(client, &browsing.selection, form.kind).await {
        Ok(names) => {
            next.options.set(form.kind, names);
            next.notice = Some(Notice::Success(message));
        }
        Err(err) => {
            next.notice = Some(Notice::Error(format!(
                "{}, but reloading the list failed: {}",
                message, err
            )));
        }
    }
    next
}

/// Re-reads every level from the top, dropping selections that no longer exist.
async fn refresh(client: &dyn WarehouseClient, browsing: &Browsing) -> Browsing {
    let mut next = Browsing {
        notice: Some(Notice::Success("Refreshed".to_string())),
        ..Browsing::default()
    };

    for level in Level::ALL {
        let names = match list_options(client, &next.selection, level).await {
            Ok(names) => names,
            Err(err) => {
                // Everything above `level` was confirmed, so the old selection still holds.
                next.selection = browsing.selection.clone();
                next.notice = Some(Notice::error(&err));
                return next;
            }
        };

        let kept = browsing
            .selection
            .get(level)
            .filter(|selected| names.iter().any(|name| name == selected))
            .map(str::to_string);
        next.options.set(level, names);

        let Some(name) = kept else {
            return next;
        };
        match next.selection.with(level, &name) {
            Ok(selection) => next.selection = selection,
            Err(err) => {
                next.notice = Some(Notice::error(&err));
                return next;
            }
        }
    }

    match load_preview(client, &next.selection).await {
        Ok(preview) => next.preview = Some(preview),
        Err(err) => next.notice = Some(Notice::error(&err)),
    }
    next
}

/// Options for `level` under the ancestors in `selection`.
async fn list_options(
    client: &dyn WarehouseClient,
    selection: &HierarchySelection,
    level: Level,
) -> Result<Vec<String>, DashError> {
    match level {
        Level::Warehouse => catalog::list_warehouses(client).await,
        Level::Database => {
            let warehouse = catalog_name(selection, Level::Warehouse)?;
            catalog::list_databases(client, &warehouse).await
        }
        Level::Schema => {
            let warehouse = catalog_name(selection, Level::Warehouse)?;
            let database = catalog_name(selection, Level::Database)?;
            catalog::list_schemas(client, &warehouse, &database).await
        }
        Level::Table => {
            let warehouse = catalog_name(selection, Level::Warehouse)?;
            let database = catalog_name(selection, Level::Database)?;
            let schema = catalog_name(selection, Level::Schema)?;
            catalog::list_tables(client, &warehouse, &database, &schema).await
        }
    }
}

async fn load_preview(
    client: &dyn WarehouseClient,
    selection: &HierarchySelection,
) -> Result<TablePreview, DashError> {
    catalog::preview_table(
        client,
        &catalog_name(selection, Level::Warehouse)?,
        &catalog_name(selection, Level::Database)?,
        &catalog_name(selection, Level::Schema)?,
        &catalog_name(selection, Level::Table)?,
    )
    .await
}

fn create_request(
    selection: &HierarchySelection,
    form: &CreateForm,
) -> Result<CreateRequest, DashError> {
    if form.name.trim().is_empty() {
        return Err(DashError::Validation(format!(
            "Enter a name for the new {}",
            form.kind.as_str().to_lowercase()
        )));
    }
    let name = Identifier::parse(&form.name)?;

    Ok(match form.kind {
        Level::Warehouse => CreateRequest::Warehouse { name },
        Level::Database => CreateRequest::Database {
            name,
            warehouse: catalog_name(selection, Level::Warehouse)?,
        },
        Level::Schema => CreateRequest::Schema {
            name,
            database: catalog_name(selection, Level::Database)?,
        },
        Level::Table => CreateRequest::Table {
            name,
            schema: catalog_name(selection, Level::Schema)?,
            columns: ColumnDefs::parse(&form.columns)?,
        },
    })
}

fn database_of(selection: &HierarchySelection) -> Result<Identifier, DashError> {
    catalog_name(selection, Level::Database)
}

fn catalog_name(selection: &HierarchySelection, level: Level) -> Result<Identifier, DashError> {
    Identifier::quoted(&selection.require(level)?)
}
