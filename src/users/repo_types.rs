use serde::{Deserialize, Serialize};

/// Role column values; the table enforces the same set with a CHECK.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Moderator,
    User,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Moderator => "moderator",
            Role::User => "user",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Role::Admin => "👑",
            Role::Moderator => "👤",
            Role::User => "👥",
        }
    }
}

/// Display text for a role column that may be NULL.
pub fn role_label(role: Option<Role>) -> &'static str {
    role.map_or("N/A", Role::as_str)
}

pub fn role_icon(role: Option<Role>) -> &'static str {
    role.map_or("❔", Role::icon)
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User row without the password column. Fields a query does not select
/// come back as `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// The column has a default but no NOT NULL.
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl User {
    pub fn active(&self) -> bool {
        self.is_active.unwrap_or(true)
    }
}

/// Stored credential for a login check.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub is_active: Option<bool>,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub activity_type: String,
    #[serde(default)]
    pub activity_data: Option<serde_json::Value>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCount {
    #[serde(default)]
    pub role: Option<Role>,
    pub count: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveCounts {
    pub active: i64,
    pub inactive: i64,
}

/// Input for a direct registration insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: Role,
}
