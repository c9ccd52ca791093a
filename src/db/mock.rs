use async_trait::async_trait;
use mockall::{mock, predicate, Sequence};

use super::{Connector, QueryResult, WarehouseClient};
use crate::{errors::DashError, models::connections::Credentials};

mock! {
    pub Client {}

    #[async_trait]
    impl WarehouseClient for Client {
        async fn execute(&self, statement: &str) -> Result<QueryResult, DashError>;
        async fn close(&self) -> Result<(), DashError>;
    }
}

mock! {
    pub Gateway {}

    #[async_trait]
    impl Connector for Gateway {
        async fn connect(&self, credentials: &Credentials) -> Result<Box<dyn WarehouseClient>, DashError>;
    }
}

pub fn result(columns: &[&str], rows: &[&[&str]]) -> QueryResult {
    QueryResult {
        columns: columns.iter().map(|c| c.to_string()).collect(),
        rows: rows
            .iter()
            .map(|row| row.iter().map(|v| Some(v.to_string())).collect())
            .collect(),
    }
}

/// Expects `statement` exactly once, in order, answering with `answer`.
pub fn expect_statement(
    client: &mut MockClient,
    seq: &mut Sequence,
    statement: &'static str,
    answer: QueryResult,
) {
    client
        .expect_execute()
        .with(predicate::eq(statement))
        .times(1)
        .in_sequence(seq)
        .returning(move |_| Ok(answer.clone()));
}
