use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::db::{DbError, Gateway, QueryResult};
use crate::users::{role_label, User};

pub const TABLES: &[(&str, &str)] = &[
    (
        "users",
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id SERIAL PRIMARY KEY,
            username VARCHAR(50) UNIQUE NOT NULL,
            email VARCHAR(100) UNIQUE NOT NULL,
            password VARCHAR(255) NOT NULL,
            role VARCHAR(20) DEFAULT 'user' CHECK (role IN ('admin', 'moderator', 'user')),
            full_name VARCHAR(100),
            avatar_url VARCHAR(255),
            is_active BOOLEAN DEFAULT true,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ),
    (
        "games",
        r#"
        CREATE TABLE IF NOT EXISTS games (
            id SERIAL PRIMARY KEY,
            title VARCHAR(200) NOT NULL,
            subtitle VARCHAR(200),
            description TEXT,
            image_url VARCHAR(500),
            category VARCHAR(100),
            color VARCHAR(20),
            price DECIMAL(10, 2),
            original_price DECIMAL(10, 2),
            discount INTEGER,
            badge VARCHAR(20),
            logo VARCHAR(10),
            is_free BOOLEAN DEFAULT false,
            rating DECIMAL(3, 2) DEFAULT 0,
            downloads INTEGER DEFAULT 0,
            created_by INTEGER REFERENCES users(id),
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ),
    (
        "user_activities",
        r#"
        CREATE TABLE IF NOT EXISTS user_activities (
            id SERIAL PRIMARY KEY,
            user_id INTEGER REFERENCES users(id) ON DELETE CASCADE,
            activity_type VARCHAR(50) NOT NULL,
            activity_data JSONB,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ),
    (
        "analytics",
        r#"
        CREATE TABLE IF NOT EXISTS analytics (
            id SERIAL PRIMARY KEY,
            metric_name VARCHAR(100) NOT NULL,
            metric_value DECIMAL(10, 2),
            metric_data JSONB,
            date_recorded DATE DEFAULT CURRENT_DATE,
            created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ),
];

pub const INDEXES: &[(&str, &str)] = &[
    ("idx_users_email", "CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)"),
    ("idx_users_role", "CREATE INDEX IF NOT EXISTS idx_users_role ON users(role)"),
    ("idx_games_category", "CREATE INDEX IF NOT EXISTS idx_games_category ON games(category)"),
    ("idx_games_created_at", "CREATE INDEX IF NOT EXISTS idx_games_created_at ON games(created_at)"),
    ("idx_activities_user_id", "CREATE INDEX IF NOT EXISTS idx_activities_user_id ON user_activities(user_id)"),
    ("idx_activities_created_at", "CREATE INDEX IF NOT EXISTS idx_activities_created_at ON user_activities(created_at)"),
    ("idx_analytics_date", "CREATE INDEX IF NOT EXISTS idx_analytics_date ON analytics(date_recorded)"),
];

/// Number of base tables a complete setup has.
pub const EXPECTED_TABLES: i64 = 4;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("creating {object} failed: {source}")]
    Statement {
        object: &'static str,
        #[source]
        source: DbError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProvisionReport {
    pub tables: Vec<&'static str>,
    pub indexes: Vec<&'static str>,
}

/// Runs every table and index statement in order, stopping at the first
/// real failure. A concurrent creator winning the race counts as done.
pub async fn create_tables(
    gw: &Gateway,
    mut on_created: impl FnMut(&'static str),
) -> Result<ProvisionReport, SchemaError> {
    let mut report = ProvisionReport::default();
    for &(name, ddl) in TABLES {
        run_ddl(gw, name, ddl).await?;
        on_created(name);
        report.tables.push(name);
    }
    for &(name, ddl) in INDEXES {
        run_ddl(gw, name, ddl).await?;
        on_created(name);
        report.indexes.push(name);
    }
    info!(
        tables = report.tables.len(),
        indexes = report.indexes.len(),
        "schema provisioned"
    );
    Ok(report)
}

async fn run_ddl(gw: &Gateway, object: &'static str, ddl: &str) -> Result<(), SchemaError> {
    match gw.execute(ddl, &[]).await {
        QueryResult::Failed(e) if e.kind.is_duplicate_object() => {
            debug!(object, "already present");
            Ok(())
        }
        QueryResult::Failed(source) => Err(SchemaError::Statement { object, source }),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SetupCheck {
    pub tables: i64,
    pub users: i64,
    /// `(email, role)` of the bootstrap admin.
    pub admin: Option<(String, String)>,
}

impl SetupCheck {
    pub fn is_complete(&self) -> bool {
        self.tables >= EXPECTED_TABLES && self.admin.is_some()
    }
}

pub async fn verify_setup(gw: &Gateway) -> anyhow::Result<SetupCheck> {
    let stats = gw.stats().await;
    let admin = User::find_admin(gw)
        .await?
        .map(|u| (u.email, role_label(u.role).to_string()));
    Ok(SetupCheck {
        tables: stats.tables,
        users: stats.users,
        admin,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{fake::FakeDriver, ErrorKind, StatementOutput};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[test]
    fn four_tables_seven_indexes() {
        assert_eq!(TABLES.len() as i64, EXPECTED_TABLES);
        assert_eq!(INDEXES.len(), 7);
        for (name, ddl) in TABLES {
            assert!(ddl.contains(&format!("CREATE TABLE IF NOT EXISTS {name}")));
        }
        for (name, ddl) in INDEXES {
            assert!(ddl.starts_with(&format!("CREATE INDEX IF NOT EXISTS {name}")));
        }
    }

    #[tokio::test]
    async fn create_tables_reports_every_object() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let gw = Gateway::with_driver(FakeDriver::new(|_, _| Ok(StatementOutput::Affected(0))));

        let report = create_tables(&gw, |name| log.lock().unwrap().push(name))
            .await
            .unwrap();
        assert_eq!(report.tables, vec!["users", "games", "user_activities", "analytics"]);
        assert_eq!(report.indexes.len(), 7);
        assert_eq!(seen.lock().unwrap().len(), 11);
    }

    #[tokio::test]
    async fn duplicate_objects_count_as_created() {
        let gw = Gateway::with_driver(FakeDriver::new(|_, _| {
            Err(DbError::new(ErrorKind::DuplicateTable, "relation already exists"))
        }));
        assert!(create_tables(&gw, |_| {}).await.is_ok());
    }

    #[tokio::test]
    async fn stops_at_first_failure() {
        let gw = Gateway::with_driver(FakeDriver::new(|sql, _| {
            if sql.contains("TABLE IF NOT EXISTS games") {
                Err(DbError::new(ErrorKind::InsufficientPrivilege, "permission denied"))
            } else {
                Ok(StatementOutput::Affected(0))
            }
        }));
        let err = create_tables(&gw, |_| {}).await.unwrap_err();
        assert!(err.to_string().starts_with("creating games failed"));
    }

    #[tokio::test]
    async fn verify_needs_tables_and_admin() {
        let gw = Gateway::with_driver(FakeDriver::new(|sql, _| {
            let row = if sql.contains("information_schema.tables") {
                json!({ "count": 4 })
            } else if sql.contains("COUNT(*) AS count FROM users") {
                json!({ "count": 2 })
            } else if sql.contains("WHERE username = $1") {
                json!({
                    "id": 1, "username": "admin", "email": "admin@battlenet.com",
                    "role": "admin"
                })
            } else {
                json!({ "count": 0 })
            };
            match row {
                serde_json::Value::Object(m) => Ok(StatementOutput::Rows(vec![m])),
                _ => unreachable!(),
            }
        }));

        let check = verify_setup(&gw).await.unwrap();
        assert_eq!(check.tables, 4);
        assert_eq!(check.users, 2);
        assert!(check.is_complete());
    }
}
