pub mod driver;
pub mod error;
#[cfg(test)]
pub(crate) mod fake;
pub mod gateway;
pub mod postgres;
pub mod value;

pub use driver::{DbDriver, DbSession, StatementOutput, Target};
pub use error::{DbError, ErrorKind};
pub use gateway::{version_string, DbStats, EnsureDatabaseResult, Gateway, ProbeResult, QueryResult};
pub use value::{quote_ident, Param, Row};
