use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

/// Locations searched for a `.env` file, in order. The first hit wins.
pub const ENV_CANDIDATES: [&str; 3] = [".env", "backend/.env", "../.env"];

#[derive(Debug, Clone, Deserialize)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Application database.
    pub name: String,
    /// Database used before `name` exists. `None` lets the server pick its default.
    pub bootstrap_name: Option<String>,
    pub connect_timeout_secs: u64,
}

impl DbConfig {
    pub fn masked_password(&self) -> String {
        if self.password.is_empty() {
            "NOT SET".into()
        } else {
            "*".repeat(self.password.chars().count())
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub db: DbConfig,
    pub server: ServerConfig,
    pub cors_origins: Vec<String>,
    pub node_backend_url: String,
    /// Operator switch for the advanced analytics endpoints; the compiled
    /// capability still has the final say.
    pub advanced_analytics: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let db = DbConfig {
            host: get("DB_HOST", "localhost"),
            port: parse_var(&lookup, "DB_PORT", 5432)?,
            user: get("DB_USER", "postgres"),
            password: get("DB_PASSWORD", "123456"),
            name: get("DB_NAME", "battlenet_db"),
            bootstrap_name: lookup("DB_BOOTSTRAP_NAME").filter(|v| !v.trim().is_empty()),
            connect_timeout_secs: parse_var(&lookup, "DB_CONNECT_TIMEOUT_SECS", 5)?,
        };

        let server = ServerConfig {
            host: get("PYTHON_SERVICE_HOST", "0.0.0.0"),
            port: parse_var(&lookup, "PYTHON_SERVICE_PORT", 5000)?,
        };

        let cors_origins = get("CORS_ORIGINS", "http://localhost:4200")
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect();

        let advanced_analytics = lookup("ANALYTICS_ADVANCED")
            .map(|v| !matches!(v.trim().to_lowercase().as_str(), "0" | "off" | "false" | "no"))
            .unwrap_or(true);

        Ok(Self {
            db,
            server,
            cors_origins,
            node_backend_url: get("NODE_BACKEND_URL", "http://localhost:3000"),
            advanced_analytics,
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
        None => Ok(default),
    }
}

/// Loads the first `.env` found under `base` among [`ENV_CANDIDATES`].
/// Returns the path that was loaded, if any.
pub fn load_env_file(base: &Path) -> Option<PathBuf> {
    for candidate in ENV_CANDIDATES {
        let path = base.join(candidate);
        if path.is_file() && dotenvy::from_path(&path).is_ok() {
            return Some(path);
        }
    }
    None
}
