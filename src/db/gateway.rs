use std::sync::Arc;

use serde::{de::DeserializeOwned, ser::SerializeMap, Serialize, Serializer};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::DbConfig;
use crate::db::{
    driver::{DbDriver, DbSession, StatementOutput, Target},
    error::DbError,
    postgres::PgDriver,
    value::{quote_ident, Param, Row},
};
use crate::params;

/// Outcome of [`Gateway::execute_query`]. Serializes to
/// `{success, data, count}`, `{success, affected}` or
/// `{success: false, error, error_type}`.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryResult {
    Rows(Vec<Row>),
    Affected(u64),
    Failed(DbError),
}

impl QueryResult {
    pub fn is_success(&self) -> bool {
        !matches!(self, QueryResult::Failed(_))
    }

    /// Rows of a successful fetch; empty otherwise.
    pub fn rows(&self) -> &[Row] {
        match self {
            QueryResult::Rows(rows) => rows,
            _ => &[],
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        match self {
            QueryResult::Rows(rows) => rows,
            _ => Vec::new(),
        }
    }

    pub fn count(&self) -> Option<usize> {
        match self {
            QueryResult::Rows(rows) => Some(rows.len()),
            _ => None,
        }
    }

    pub fn affected(&self) -> Option<u64> {
        match self {
            QueryResult::Affected(n) => Some(*n),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&DbError> {
        match self {
            QueryResult::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn first_row(&self) -> Option<&Row> {
        self.rows().first()
    }

    /// Integer in `column` of the first row, e.g. a `COUNT(*)`.
    pub fn scalar_i64(&self, column: &str) -> Option<i64> {
        self.first_row()?.get(column)?.as_i64()
    }

    /// Deserializes every row into `T`.
    pub fn rows_as<T: DeserializeOwned>(&self) -> Result<Vec<T>, serde_json::Error> {
        self.rows()
            .iter()
            .map(|r| serde_json::from_value(Value::Object(r.clone())))
            .collect()
    }

    /// Like [`rows_as`](Self::rows_as), but a failed call becomes an error.
    pub fn try_rows_as<T: DeserializeOwned>(&self) -> anyhow::Result<Vec<T>> {
        if let QueryResult::Failed(e) = self {
            return Err(e.clone().into());
        }
        Ok(self.rows_as()?)
    }

    /// Fails with the database error; otherwise yields the affected count,
    /// or the row count for fetches.
    pub fn try_affected(&self) -> anyhow::Result<u64> {
        match self {
            QueryResult::Failed(e) => Err(e.clone().into()),
            QueryResult::Affected(n) => Ok(*n),
            QueryResult::Rows(rows) => Ok(rows.len() as u64),
        }
    }
}

impl Serialize for QueryResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("success", &self.is_success())?;
        match self {
            QueryResult::Rows(rows) => {
                map.serialize_entry("data", rows)?;
                map.serialize_entry("count", &rows.len())?;
            }
            QueryResult::Affected(n) => map.serialize_entry("affected", n)?,
            QueryResult::Failed(e) => {
                map.serialize_entry("error", &e.message)?;
                map.serialize_entry("error_type", &e.kind)?;
            }
        }
        map.end()
    }
}

/// Outcome of [`Gateway::test_connection`].
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeResult {
    Connected { version: i32 },
    Failed(DbError),
}

impl ProbeResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeResult::Connected { .. })
    }

    pub fn version_str(&self) -> Option<String> {
        match self {
            ProbeResult::Connected { version } => Some(version_string(*version)),
            ProbeResult::Failed(_) => None,
        }
    }
}

impl Serialize for ProbeResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("success", &self.is_success())?;
        match self {
            ProbeResult::Connected { version } => {
                map.serialize_entry("version", version)?;
                map.serialize_entry("version_str", &version_string(*version))?;
            }
            ProbeResult::Failed(e) => {
                map.serialize_entry("error", &e.message)?;
                map.serialize_entry("error_type", &e.kind)?;
            }
        }
        map.end()
    }
}

/// `server_version_num` as "major.minor". Releases from 10 on use two-part
/// versions (`160002` is 16.2); older ones three-part (`90624` is 9.6).
pub fn version_string(num: i32) -> String {
    if num >= 100_000 {
        format!("{}.{}", num / 10_000, num % 10_000)
    } else {
        format!("{}.{}", num / 10_000, (num % 10_000) / 100)
    }
}

/// Outcome of [`Gateway::ensure_database`].
#[derive(Debug, Clone, PartialEq)]
pub enum EnsureDatabaseResult {
    Created(String),
    AlreadyExists(String),
    Failed(DbError),
}

impl EnsureDatabaseResult {
    pub fn is_success(&self) -> bool {
        !matches!(self, EnsureDatabaseResult::Failed(_))
    }

    pub fn existed(&self) -> bool {
        matches!(self, EnsureDatabaseResult::AlreadyExists(_))
    }

    pub fn message(&self) -> String {
        match self {
            EnsureDatabaseResult::Created(name) => format!("Database {name} created"),
            EnsureDatabaseResult::AlreadyExists(name) => format!("Database {name} already exists"),
            EnsureDatabaseResult::Failed(e) => e.message.clone(),
        }
    }
}

impl Serialize for EnsureDatabaseResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("success", &self.is_success())?;
        match self {
            EnsureDatabaseResult::Failed(e) => {
                map.serialize_entry("error", &e.message)?;
                map.serialize_entry("error_type", &e.kind)?;
            }
            ok => {
                map.serialize_entry("exists", &ok.existed())?;
                map.serialize_entry("message", &ok.message())?;
            }
        }
        map.end()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DbStats {
    pub tables: i64,
    pub users: i64,
    pub games: i64,
}

/// Uniform entry point for running SQL. Every call opens its own connection
/// and releases it before returning; failures come back as values.
#[derive(Clone)]
pub struct Gateway {
    driver: Arc<dyn DbDriver>,
}

impl Gateway {
    pub fn new(config: &DbConfig) -> Self {
        Self::with_driver(PgDriver::new(config.clone()))
    }

    pub fn with_driver(driver: impl DbDriver + 'static) -> Self {
        Self {
            driver: Arc::new(driver),
        }
    }

    pub async fn execute_query(
        &self,
        sql: &str,
        params: &[Param],
        fetch: bool,
        target: Target,
    ) -> QueryResult {
        let mut session = match self.driver.connect(target).await {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, kind = %e.kind, "database connect failed");
                return QueryResult::Failed(e);
            }
        };

        let outcome = run_in_transaction(session.as_mut(), sql, params, fetch).await;
        release(session).await;

        match outcome {
            Ok(StatementOutput::Rows(rows)) => {
                debug!(count = rows.len(), "query returned rows");
                QueryResult::Rows(rows)
            }
            Ok(StatementOutput::Affected(n)) => {
                debug!(affected = n, "statement applied");
                QueryResult::Affected(n)
            }
            Err(e) => {
                warn!(error = %e, kind = %e.kind, "statement failed");
                QueryResult::Failed(e)
            }
        }
    }

    /// Fetching query against the application database.
    pub async fn query(&self, sql: &str, params: &[Param]) -> QueryResult {
        self.execute_query(sql, params, true, Target::Application)
            .await
    }

    /// Non-fetching statement against the application database.
    pub async fn execute(&self, sql: &str, params: &[Param]) -> QueryResult {
        self.execute_query(sql, params, false, Target::Application)
            .await
    }

    pub async fn test_connection(&self, target: Target) -> ProbeResult {
        let mut session = match self.driver.connect(target).await {
            Ok(s) => s,
            Err(e) => return ProbeResult::Failed(e),
        };
        let version = session.server_version().await;
        release(session).await;
        match version {
            Ok(version) => ProbeResult::Connected { version },
            Err(e) => ProbeResult::Failed(e),
        }
    }

    /// Creates `name` on the server unless it already exists. Runs in
    /// autocommit mode on the bootstrap database.
    pub async fn ensure_database(&self, name: &str) -> EnsureDatabaseResult {
        let mut session = match self.driver.connect(Target::Bootstrap).await {
            Ok(s) => s,
            Err(e) => return EnsureDatabaseResult::Failed(e),
        };
        let outcome = create_if_missing(session.as_mut(), name).await;
        release(session).await;

        match outcome {
            Ok(true) => EnsureDatabaseResult::Created(name.to_string()),
            Ok(false) => EnsureDatabaseResult::AlreadyExists(name.to_string()),
            Err(e) if e.kind.is_duplicate_object() => {
                EnsureDatabaseResult::AlreadyExists(name.to_string())
            }
            Err(e) => EnsureDatabaseResult::Failed(e),
        }
    }

    /// Column layout of a table in the `public` schema.
    pub async fn table_info(&self, table: &str) -> QueryResult {
        self.query(
            r#"
            SELECT column_name, data_type, is_nullable, column_default
            FROM information_schema.columns
            WHERE table_schema = 'public' AND table_name = $1
            ORDER BY ordinal_position
            "#,
            &params![table],
        )
        .await
    }

    /// Base table, user and game counts. A failing count reads as 0.
    pub async fn stats(&self) -> DbStats {
        let tables = self
            .query(
                r#"
                SELECT COUNT(*) AS count
                FROM information_schema.tables
                WHERE table_schema = 'public' AND table_type = 'BASE TABLE'
                "#,
                &[],
            )
            .await
            .scalar_i64("count")
            .unwrap_or(0);
        let users = self
            .query("SELECT COUNT(*) AS count FROM users", &[])
            .await
            .scalar_i64("count")
            .unwrap_or(0);
        let games = self
            .query("SELECT COUNT(*) AS count FROM games", &[])
            .await
            .scalar_i64("count")
            .unwrap_or(0);
        DbStats {
            tables,
            users,
            games,
        }
    }
}

async fn run_in_transaction(
    session: &mut dyn DbSession,
    sql: &str,
    params: &[Param],
    fetch: bool,
) -> Result<StatementOutput, DbError> {
    session.begin().await?;
    let result = match session.run(sql, params, fetch).await {
        Ok(out) => session.commit().await.map(|_| out),
        Err(e) => Err(e),
    };
    if result.is_err() {
        if let Err(rb) = session.rollback().await {
            debug!(error = %rb, "rollback after failure also failed");
        }
    }
    result
}

async fn create_if_missing(session: &mut dyn DbSession, name: &str) -> Result<bool, DbError> {
    let found = session
        .run(
            "SELECT 1 FROM pg_catalog.pg_database WHERE datname = $1",
            &params![name],
            true,
        )
        .await?;
    if matches!(&found, StatementOutput::Rows(rows) if !rows.is_empty()) {
        return Ok(false);
    }
    let create = format!("CREATE DATABASE {}", quote_ident(name));
    session.run(&create, &[], false).await?;
    Ok(true)
}

async fn release(session: Box<dyn DbSession>) {
    if let Err(e) = session.close().await {
        debug!(error = %e, "connection close reported an error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::error::ErrorKind;
    use crate::db::fake::{FakeDriver, Script};
    use serde_json::json;
    use std::collections::HashSet;
    use std::sync::Mutex;

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn select_returns_rows_with_matching_count() {
        let driver = FakeDriver::new(|_, _| {
            Ok(StatementOutput::Rows(vec![
                row(&[("id", json!(1))]),
                row(&[("id", json!(2))]),
            ]))
        });
        let gw = Gateway::with_driver(driver.clone());

        let result = gw.query("SELECT id FROM users", &[]).await;

        assert!(result.is_success());
        assert_eq!(result.count(), Some(result.rows().len()));
        assert_eq!(result.count(), Some(2));
        assert_eq!(driver.counters().commits(), 1);
        assert_eq!(driver.counters().opens(), driver.counters().closes());
    }

    #[tokio::test]
    async fn unique_violation_rolls_back_and_reports() {
        let driver = FakeDriver::new(|_, _| {
            Err(DbError::new(
                ErrorKind::UniqueViolation,
                "duplicate key value violates unique constraint \"users_username_key\"",
            ))
        });
        let gw = Gateway::with_driver(driver.clone());

        let result = gw
            .execute(
                "INSERT INTO users (username, email, password) VALUES ($1, $2, $3)",
                &params!["admin", "admin@battlenet.com", "x"],
            )
            .await;

        assert!(!result.is_success());
        let err = result.error().expect("error present");
        assert!(!err.message.is_empty());
        assert_eq!(err.kind, ErrorKind::UniqueViolation);
        assert_eq!(driver.counters().commits(), 0);
        assert_eq!(driver.counters().rollbacks(), 1);
        assert_eq!(driver.counters().opens(), 1);
        assert_eq!(driver.counters().closes(), 1);
    }

    #[tokio::test]
    async fn connect_failure_is_a_value_not_a_panic() {
        let driver = FakeDriver::refusing(ErrorKind::Authentication);
        let gw = Gateway::with_driver(driver.clone());

        let result = gw.query("SELECT 1", &[]).await;
        assert_eq!(result.error().map(|e| e.kind), Some(ErrorKind::Authentication));

        let probe = gw.test_connection(Target::Application).await;
        assert!(!probe.is_success());
        assert_eq!(driver.counters().opens(), driver.counters().closes());
    }

    #[tokio::test]
    async fn non_fetch_reports_affected_rows() {
        let driver = FakeDriver::new(|_, _| Ok(StatementOutput::Affected(3)));
        let gw = Gateway::with_driver(driver.clone());

        let result = gw.execute("UPDATE users SET is_active = true", &[]).await;
        assert_eq!(result.affected(), Some(3));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"success": true, "affected": 3})
        );
    }

    #[tokio::test]
    async fn connections_are_released_on_every_path() {
        let driver = FakeDriver::new(|sql, _| {
            if sql.contains("boom") {
                Err(DbError::new(ErrorKind::SyntaxError, "syntax error at or near \"boom\""))
            } else {
                Ok(StatementOutput::Rows(vec![]))
            }
        });
        let gw = Gateway::with_driver(driver.clone());

        gw.query("SELECT 1", &[]).await;
        gw.query("boom", &[]).await;
        gw.execute("boom", &[]).await;
        gw.test_connection(Target::Bootstrap).await;
        gw.ensure_database("battlenet_db").await;

        let c = driver.counters();
        assert_eq!(c.opens(), 5);
        assert_eq!(c.opens(), c.closes());
    }

    #[tokio::test]
    async fn ensure_database_is_idempotent() {
        let databases = std::sync::Arc::new(Mutex::new(HashSet::<String>::new()));
        let dbs = databases.clone();
        let script: Script = std::sync::Arc::new(move |sql: &str, params: &[Param]| {
            let mut dbs = dbs.lock().unwrap();
            if sql.starts_with("SELECT 1 FROM pg_catalog.pg_database") {
                let name = match &params[0] {
                    Param::Text(Some(n)) => n.clone(),
                    other => panic!("unexpected param {other:?}"),
                };
                let rows = if dbs.contains(&name) {
                    vec![row(&[("?column?", json!(1))])]
                } else {
                    vec![]
                };
                Ok(StatementOutput::Rows(rows))
            } else if let Some(ident) = sql.strip_prefix("CREATE DATABASE ") {
                dbs.insert(ident.trim_matches('"').to_string());
                Ok(StatementOutput::Affected(0))
            } else {
                panic!("unexpected sql {sql}")
            }
        });
        let driver = FakeDriver::scripted(script);
        let gw = Gateway::with_driver(driver.clone());

        let first = gw.ensure_database("battlenet_db").await;
        let second = gw.ensure_database("battlenet_db").await;

        assert!(first.is_success() && !first.existed());
        assert!(second.is_success() && second.existed());
        assert_eq!(driver.counters().begins(), 0, "autocommit only");
        assert!(databases.lock().unwrap().contains("battlenet_db"));
        assert_eq!(
            serde_json::to_value(&second).unwrap()["exists"],
            json!(true)
        );
    }

    #[tokio::test]
    async fn ensure_database_quotes_the_identifier() {
        let seen = std::sync::Arc::new(Mutex::new(Vec::<String>::new()));
        let log = seen.clone();
        let driver = FakeDriver::new(move |sql, _| {
            log.lock().unwrap().push(sql.to_string());
            Ok(StatementOutput::Rows(vec![]))
        });
        let gw = Gateway::with_driver(driver);

        gw.ensure_database("x\"; DROP DATABASE prod; --").await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen[1], "CREATE DATABASE \"x\"\"; DROP DATABASE prod; --\"");
    }

    #[tokio::test]
    async fn duplicate_database_race_counts_as_existing() {
        let driver = FakeDriver::new(|sql, _| {
            if sql.starts_with("CREATE DATABASE") {
                Err(DbError::new(ErrorKind::DuplicateDatabase, "database exists"))
            } else {
                Ok(StatementOutput::Rows(vec![]))
            }
        });
        let gw = Gateway::with_driver(driver);
        let result = gw.ensure_database("battlenet_db").await;
        assert!(result.existed());
    }

    #[tokio::test]
    async fn probe_reports_version() {
        let driver = FakeDriver::new(|_, _| Ok(StatementOutput::Rows(vec![])))
            .with_server_version(160_002);
        let gw = Gateway::with_driver(driver);
        let probe = gw.test_connection(Target::Application).await;
        assert_eq!(probe.version_str().as_deref(), Some("16.2"));
        let json = serde_json::to_value(&probe).unwrap();
        assert_eq!(json["success"], json!(true));
        assert_eq!(json["version"], json!(160_002));
    }

    #[test]
    fn version_strings() {
        assert_eq!(version_string(160_002), "16.2");
        assert_eq!(version_string(100_000), "10.0");
        assert_eq!(version_string(90_624), "9.6");
    }

    #[tokio::test]
    async fn stats_fall_back_to_zero() {
        let driver = FakeDriver::new(|sql, _| {
            if sql.contains("FROM games") {
                Err(DbError::new(ErrorKind::UndefinedTable, "relation \"games\" does not exist"))
            } else {
                Ok(StatementOutput::Rows(vec![row(&[("count", json!(4))])]))
            }
        });
        let gw = Gateway::with_driver(driver);
        let stats = gw.stats().await;
        assert_eq!(
            stats,
            DbStats {
                tables: 4,
                users: 4,
                games: 0
            }
        );
    }

    #[test]
    fn failed_result_serializes_error_type() {
        let result = QueryResult::Failed(DbError::new(ErrorKind::CheckViolation, "bad role"));
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"success": false, "error": "bad role", "error_type": "CheckViolation"})
        );
    }

    #[test]
    fn rows_deserialize_into_types() {
        #[derive(serde::Deserialize)]
        struct Count {
            role: String,
            count: i64,
        }
        let result = QueryResult::Rows(vec![row(&[("role", json!("admin")), ("count", json!(1))])]);
        let counts: Vec<Count> = result.rows_as().unwrap();
        assert_eq!(counts[0].role, "admin");
        assert_eq!(counts[0].count, 1);
    }
}
