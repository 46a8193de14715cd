use async_trait::async_trait;

use crate::db::{error::DbError, value::Param, value::Row};

/// Which database a connection selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The configured application database.
    Application,
    /// The server's default database. A database cannot be created while
    /// connected to itself, so provisioning starts here.
    Bootstrap,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementOutput {
    Rows(Vec<Row>),
    Affected(u64),
}

#[async_trait]
pub trait DbDriver: Send + Sync {
    async fn connect(&self, target: Target) -> Result<Box<dyn DbSession>, DbError>;
}

/// A single open connection. Dropping it releases the connection; `close`
/// does so gracefully.
#[async_trait]
pub trait DbSession: Send {
    async fn begin(&mut self) -> Result<(), DbError>;

    /// Runs one statement. Rows are returned only when `fetch` is set and the
    /// statement produces a result set.
    async fn run(
        &mut self,
        sql: &str,
        params: &[Param],
        fetch: bool,
    ) -> Result<StatementOutput, DbError>;

    async fn commit(&mut self) -> Result<(), DbError>;
    async fn rollback(&mut self) -> Result<(), DbError>;

    /// Numeric server version, e.g. `160002` for 16.2.
    async fn server_version(&mut self) -> Result<i32, DbError>;

    async fn close(self: Box<Self>) -> Result<(), DbError>;
}
