use async_trait::async_trait;

use crate::{errors::DashError, models::connections::Credentials};

pub mod catalog;
pub mod ddl;
pub mod snowflake;

#[cfg(test)]
pub(crate) mod mock;

/// Columns and rows of one executed statement. Cells are text or NULL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryResult {
    /// Values of one column, in row order. NULLs and short rows are errors.
    pub fn column_values(&self, index: usize) -> Result<Vec<String>, DashError> {
        self.rows
            .iter()
            .map(|row| match row.get(index) {
                Some(Some(value)) => Ok(value.clone()),
                Some(None) => Err(DashError::Query(format!(
                    "Unexpected NULL in result column {}",
                    index
                ))),
                None => Err(DashError::Query(format!(
                    "Result row has no column {}",
                    index
                ))),
            })
            .collect()
    }
}

/// An authenticated warehouse session.
#[async_trait]
pub trait WarehouseClient: Send + Sync {
    async fn execute(&self, statement: &str) -> Result<QueryResult, DashError>;
    async fn close(&self) -> Result<(), DashError>;
}

/// Opens sessions.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        credentials: &Credentials,
    ) -> Result<Box<dyn WarehouseClient>, DashError>;
}
