//! Hierarchy browsing and table preview.
//!
//! Every call switches the session context from the top down before it reads,
//! so nothing depends on what an earlier call left selected.

use std::collections::HashSet;

use log::debug;

use super::{QueryResult, WarehouseClient};
use crate::{
    errors::DashError,
    models::schema::{Identifier, TableLocation, TablePreview, PREVIEW_ROW_LIMIT},
};

const WAREHOUSE_NAME_COLUMN: usize = 0;
const OBJECT_NAME_COLUMN: usize = 1;

pub async fn list_warehouses(client: &dyn WarehouseClient) -> Result<Vec<String>, DashError> {
    let result = client.execute("SHOW WAREHOUSES").await?;
    names(&result, WAREHOUSE_NAME_COLUMN)
}

pub async fn list_databases(
    client: &dyn WarehouseClient,
    warehouse: &Identifier,
) -> Result<Vec<String>, DashError> {
    use_context(client, Some(warehouse), None, None).await?;
    let result = client.execute("SHOW DATABASES").await?;
    names(&result, OBJECT_NAME_COLUMN)
}

pub async fn list_schemas(
    client: &dyn WarehouseClient,
    warehouse: &Identifier,
    database: &Identifier,
) -> Result<Vec<String>, DashError> {
    use_context(client, Some(warehouse), Some(database), None).await?;
    let result = client.execute("SHOW SCHEMAS").await?;
    names(&result, OBJECT_NAME_COLUMN)
}

pub async fn list_tables(
    client: &dyn WarehouseClient,
    warehouse: &Identifier,
    database: &Identifier,
    schema: &Identifier,
) -> Result<Vec<String>, DashError> {
    use_context(client, Some(warehouse), Some(database), Some(schema)).await?;
    let result = client.execute("SHOW TABLES").await?;
    names(&result, OBJECT_NAME_COLUMN)
}

pub async fn preview_table(
    client: &dyn WarehouseClient,
    warehouse: &Identifier,
    database: &Identifier,
    schema: &Identifier,
    table: &Identifier,
) -> Result<TablePreview, DashError> {
    use_context(client, Some(warehouse), Some(database), Some(schema)).await?;
    let result = client
        .execute(&format!("SELECT * FROM {} LIMIT {}", table, PREVIEW_ROW_LIMIT))
        .await?;
    debug!(
        "preview of {}: {} columns, {} rows",
        table.name(),
        result.columns.len(),
        result.rows.len()
    );

    TablePreview::new(
        TableLocation {
            warehouse: warehouse.name().to_string(),
            database: database.name().to_string(),
            schema: schema.name().to_string(),
            table: table.name().to_string(),
        },
        result.columns,
        result.rows,
    )
}

/// Issues `USE WAREHOUSE`, `USE DATABASE` and `USE SCHEMA` for the given levels, in that order.
pub(crate) async fn use_context(
    client: &dyn WarehouseClient,
    warehouse: Option<&Identifier>,
    database: Option<&Identifier>,
    schema: Option<&Identifier>,
) -> Result<(), DashError> {
    if let Some(warehouse) = warehouse {
        client.execute(&format!("USE WAREHOUSE {}", warehouse)).await?;
    }
    if let Some(database) = database {
        client.execute(&format!("USE DATABASE {}", database)).await?;
    }
    if let Some(schema) = schema {
        client.execute(&format!("USE SCHEMA {}", schema)).await?;
    }
    Ok(())
}

/// Names from one result column, first occurrence wins.
fn names(result: &QueryResult, column: usize) -> Result<Vec<String>, DashError> {
    let values = result.column_values(column)?;
    let mut seen: HashSet<&str> = HashSet::with_capacity(values.len());
    let mut names = Vec::with_capacity(values.len());
    for name in &values {
        if seen.insert(name.as_str()) {
            names.push(name.clone());
        }
    }
    Ok(names)
}
