use serde::Serialize;
use thiserror::Error;

/// Category of a failed database call, derived from SQLSTATE codes and the
/// driver error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    Connectivity,
    Authentication,
    Timeout,
    UniqueViolation,
    ForeignKeyViolation,
    CheckViolation,
    NotNullViolation,
    DuplicateDatabase,
    DuplicateTable,
    DuplicateObject,
    InsufficientPrivilege,
    UndefinedTable,
    SyntaxError,
    Decode,
    Unexpected,
}

impl ErrorKind {
    /// Maps a PostgreSQL SQLSTATE code.
    pub fn from_sqlstate(code: &str) -> Self {
        match code {
            "23505" => Self::UniqueViolation,
            "23503" => Self::ForeignKeyViolation,
            "23514" => Self::CheckViolation,
            "23502" => Self::NotNullViolation,
            "42P04" => Self::DuplicateDatabase,
            "42P07" => Self::DuplicateTable,
            "42710" => Self::DuplicateObject,
            "42501" => Self::InsufficientPrivilege,
            "42P01" => Self::UndefinedTable,
            "42601" => Self::SyntaxError,
            "28P01" | "28000" => Self::Authentication,
            "57P03" => Self::Connectivity,
            c if c.starts_with("08") => Self::Connectivity,
            _ => Self::Unexpected,
        }
    }

    pub fn is_constraint_violation(self) -> bool {
        matches!(
            self,
            Self::UniqueViolation
                | Self::ForeignKeyViolation
                | Self::CheckViolation
                | Self::NotNullViolation
        )
    }

    /// Object already exists; callers that create things treat this as success.
    pub fn is_duplicate_object(self) -> bool {
        matches!(
            self,
            Self::DuplicateDatabase | Self::DuplicateTable | Self::DuplicateObject
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connectivity => "Connectivity",
            Self::Authentication => "Authentication",
            Self::Timeout => "Timeout",
            Self::UniqueViolation => "UniqueViolation",
            Self::ForeignKeyViolation => "ForeignKeyViolation",
            Self::CheckViolation => "CheckViolation",
            Self::NotNullViolation => "NotNullViolation",
            Self::DuplicateDatabase => "DuplicateDatabase",
            Self::DuplicateTable => "DuplicateTable",
            Self::DuplicateObject => "DuplicateObject",
            Self::InsufficientPrivilege => "InsufficientPrivilege",
            Self::UndefinedTable => "UndefinedTable",
            Self::SyntaxError => "SyntaxError",
            Self::Decode => "Decode",
            Self::Unexpected => "Unexpected",
        }
    }

    /// Operator-facing remediation for the CLI.
    pub fn hint(self) -> &'static [&'static str] {
        match self {
            Self::Authentication => &[
                "The password was rejected",
                "Check DB_PASSWORD in backend/.env",
            ],
            Self::Connectivity | Self::Timeout => &[
                "PostgreSQL is not running or not reachable",
                "Start the PostgreSQL service",
                "Check DB_HOST and DB_PORT",
            ],
            Self::InsufficientPrivilege => &["The user needs the CREATE DATABASE privilege"],
            Self::UndefinedTable => &["Run `bnetctl setup` to create the schema"],
            _ => &[
                "PostgreSQL is installed and running",
                "The credentials in backend/.env are correct",
                "The configured port is available",
            ],
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct DbError {
    pub kind: ErrorKind,
    pub message: String,
}

impl DbError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(secs: u64) -> Self {
        Self::new(
            ErrorKind::Timeout,
            format!("connection attempt timed out after {secs}s"),
        )
    }
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        let kind = match &e {
            sqlx::Error::Database(db) => db
                .code()
                .map(|c| ErrorKind::from_sqlstate(&c))
                .unwrap_or(ErrorKind::Unexpected),
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolClosed => {
                ErrorKind::Connectivity
            }
            sqlx::Error::PoolTimedOut => ErrorKind::Timeout,
            sqlx::Error::Configuration(_) => ErrorKind::Connectivity,
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => ErrorKind::Decode,
            _ => ErrorKind::Unexpected,
        };
        let message = e.to_string();
        let message = if message.is_empty() {
            format!("{e:?}")
        } else {
            message
        };
        Self { kind, message }
    }
}
