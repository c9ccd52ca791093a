use log::info;

use super::{catalog::use_context, WarehouseClient};
use crate::{
    errors::DashError,
    models::schema::{ColumnDefs, CreateRequest, Identifier},
};

pub async fn create_warehouse(
    client: &dyn WarehouseClient,
    name: &Identifier,
) -> Result<(), DashError> {
    client.execute(&format!("CREATE WAREHOUSE {}", name)).await?;
    Ok(())
}

pub async fn create_database(
    client: &dyn WarehouseClient,
    name: &Identifier,
    warehouse: &Identifier,
) -> Result<(), DashError> {
    use_context(client, Some(warehouse), None, None).await?;
    client.execute(&format!("CREATE DATABASE {}", name)).await?;
    Ok(())
}

pub async fn create_schema(
    client: &dyn WarehouseClient,
    name: &Identifier,
    database: &Identifier,
) -> Result<(), DashError> {
    use_context(client, None, Some(database), None).await?;
    client.execute(&format!("CREATE SCHEMA {}", name)).await?;
    Ok(())
}

pub async fn create_table(
    client: &dyn WarehouseClient,
    schema: &Identifier,
    name: &Identifier,
    columns: &ColumnDefs,
) -> Result<(), DashError> {
    use_context(client, None, None, Some(schema)).await?;
    client
        .execute(&format!("CREATE TABLE {} ({})", name, columns))
        .await?;
    Ok(())
}

pub async fn execute(client: &dyn WarehouseClient, request: &CreateRequest) -> Result<(), DashError> {
    match request {
        CreateRequest::Warehouse { name } => create_warehouse(client, name).await?,
        CreateRequest::Database { name, warehouse } => {
            create_database(client, name, warehouse).await?
        }
        CreateRequest::Schema { name, database } => create_schema(client, name, database).await?,
        CreateRequest::Table {
            name,
            schema,
            columns,
        } => create_table(client, schema, name, columns).await?,
    }
    info!("created {} {}", request.kind().to_lowercase(), request.name().stored_name());
    Ok(())
}
