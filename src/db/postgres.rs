use std::time::Duration;

use async_trait::async_trait;
use sqlx::{
    postgres::{PgConnectOptions, PgConnection},
    Connection, Executor,
};
use tracing::debug;

use crate::config::DbConfig;
use crate::db::{
    driver::{DbDriver, DbSession, StatementOutput, Target},
    error::{DbError, ErrorKind},
    value::{bind_params, row_to_json, Param},
};

/// Opens one un-pooled PostgreSQL connection per call.
#[derive(Debug, Clone)]
pub struct PgDriver {
    config: DbConfig,
}

impl PgDriver {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }

    fn options(&self, target: Target) -> PgConnectOptions {
        let opts = PgConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(&self.config.user)
            .password(&self.config.password)
            .application_name("battlenet-analytics");
        match target {
            Target::Application => opts.database(&self.config.name),
            Target::Bootstrap => match &self.config.bootstrap_name {
                Some(name) => opts.database(name),
                None => opts,
            },
        }
    }
}

#[async_trait]
impl DbDriver for PgDriver {
    async fn connect(&self, target: Target) -> Result<Box<dyn DbSession>, DbError> {
        let secs = self.config.connect_timeout_secs;
        let opts = self.options(target);
        let conn = tokio::time::timeout(Duration::from_secs(secs), PgConnection::connect_with(&opts))
            .await
            .map_err(|_| DbError::timeout(secs))??;
        debug!(host = %self.config.host, ?target, "postgres connection opened");
        Ok(Box::new(PgSession { conn }))
    }
}

pub struct PgSession {
    conn: PgConnection,
}

#[async_trait]
impl DbSession for PgSession {
    async fn begin(&mut self) -> Result<(), DbError> {
        self.conn.execute("BEGIN").await?;
        Ok(())
    }

    async fn run(
        &mut self,
        sql: &str,
        params: &[Param],
        fetch: bool,
    ) -> Result<StatementOutput, DbError> {
        let produces_rows = if fetch {
            !self.conn.describe(sql).await?.columns().is_empty()
        } else {
            false
        };

        // Simple protocol: no implicit transaction block, so CREATE DATABASE works.
        if params.is_empty() && !produces_rows {
            let done = self.conn.execute(sql).await?;
            return Ok(StatementOutput::Affected(done.rows_affected()));
        }

        let query = bind_params(sqlx::query(sql), params);
        if produces_rows {
            let rows = query.fetch_all(&mut self.conn).await?;
            let rows = rows.iter().map(row_to_json).collect::<Result<Vec<_>, _>>()?;
            Ok(StatementOutput::Rows(rows))
        } else {
            let done = query.execute(&mut self.conn).await?;
            Ok(StatementOutput::Affected(done.rows_affected()))
        }
    }

    async fn commit(&mut self) -> Result<(), DbError> {
        self.conn.execute("COMMIT").await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), DbError> {
        self.conn.execute("ROLLBACK").await?;
        Ok(())
    }

    async fn server_version(&mut self) -> Result<i32, DbError> {
        let raw: String = sqlx::query_scalar("SELECT current_setting('server_version_num')")
            .fetch_one(&mut self.conn)
            .await?;
        raw.trim().parse::<i32>().map_err(|e| {
            DbError::new(
                ErrorKind::Decode,
                format!("unexpected server_version_num {raw:?}: {e}"),
            )
        })
    }

    async fn close(self: Box<Self>) -> Result<(), DbError> {
        self.conn.close().await?;
        Ok(())
    }
}
