use std::fmt;

use crate::errors::DashError;

/// One level of the catalog hierarchy, top first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Warehouse,
    Database,
    Schema,
    Table,
}

impl Level {
    pub const ALL: [Level; 4] = [Level::Warehouse, Level::Database, Level::Schema, Level::Table];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Warehouse => "Warehouse",
            Level::Database => "Database",
            Level::Schema => "Schema",
            Level::Table => "Table",
        }
    }

    pub fn child(&self) -> Option<Level> {
        match self {
            Level::Warehouse => Some(Level::Database),
            Level::Database => Some(Level::Schema),
            Level::Schema => Some(Level::Table),
            Level::Table => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What is selected at each level.
///
/// A level can only be set when every level above it is set, and choosing a
/// level clears everything below it. Values are never mutated: each `with_*`
/// call returns a new selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchySelection {
    warehouse: Option<String>,
    database: Option<String>,
    schema: Option<String>,
    table: Option<String>,
}

impl HierarchySelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warehouse(&self) -> Option<&str> {
        self.warehouse.as_deref()
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn get(&self, level: Level) -> Option<&str> {
        match level {
            Level::Warehouse => self.warehouse(),
            Level::Database => self.database(),
            Level::Schema => self.schema(),
            Level::Table => self.table(),
        }
    }

    pub fn with_warehouse(&self, name: &str) -> Self {
        Self {
            warehouse: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn with_database(&self, name: &str) -> Result<Self, DashError> {
        let warehouse = self.require(Level::Warehouse)?;
        Ok(Self {
            warehouse: Some(warehouse),
            database: Some(name.to_string()),
            ..Self::default()
        })
    }

    pub fn with_schema(&self, name: &str) -> Result<Self, DashError> {
        let warehouse = self.require(Level::Warehouse)?;
        let database = self.require(Level::Database)?;
        Ok(Self {
            warehouse: Some(warehouse),
            database: Some(database),
            schema: Some(name.to_string()),
            table: None,
        })
    }

    pub fn with_table(&self, name: &str) -> Result<Self, DashError> {
        Ok(Self {
            warehouse: Some(self.require(Level::Warehouse)?),
            database: Some(self.require(Level::Database)?),
            schema: Some(self.require(Level::Schema)?),
            table: Some(name.to_string()),
        })
    }

    /// Sets `level` to `name`, clearing everything below it.
    pub fn with(&self, level: Level, name: &str) -> Result<Self, DashError> {
        match level {
            Level::Warehouse => Ok(self.with_warehouse(name)),
            Level::Database => self.with_database(name),
            Level::Schema => self.with_schema(name),
            Level::Table => self.with_table(name),
        }
    }

    pub fn require(&self, level: Level) -> Result<String, DashError> {
        self.get(level)
            .map(str::to_string)
            .ok_or_else(|| DashError::Validation(format!("Select a {} first", level.as_str().to_lowercase())))
    }
}
