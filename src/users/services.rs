use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::db::Gateway;
use crate::users::{
    password::{hash_password, verify_password, HashScheme},
    repo_types::{NewUser, Role, User},
};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_EMAIL: &str = "admin@battlenet.com";
pub const ADMIN_FULL_NAME: &str = "Administrator";
pub const ADMIN_DEFAULT_PASSWORD: &str = "admin123";

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

#[derive(Debug)]
pub enum AdminOutcome {
    AlreadyExists(User),
    Created(User),
}

/// Creates the bootstrap admin account unless one named `admin` exists.
pub async fn create_admin(gw: &Gateway) -> anyhow::Result<AdminOutcome> {
    if let Some(existing) = User::find_admin(gw).await? {
        info!(user_id = existing.id, "admin already present");
        return Ok(AdminOutcome::AlreadyExists(existing));
    }

    let password_hash = hash_password(ADMIN_DEFAULT_PASSWORD, HashScheme::Bcrypt)?;
    let user = User::create(
        gw,
        &NewUser {
            username: ADMIN_USERNAME.into(),
            email: ADMIN_EMAIL.into(),
            password_hash,
            full_name: Some(ADMIN_FULL_NAME.into()),
            role: Role::Admin,
        },
    )
    .await?;
    info!(user_id = user.id, "admin created");
    Ok(AdminOutcome::Created(user))
}

#[derive(Debug, Clone)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

#[derive(Debug)]
pub enum RegisterOutcome {
    /// Username or email is taken by this user.
    Conflict(User),
    Registered(User),
}

/// Registers a user the way the account backend does: uniqueness check,
/// bcrypt hash, insert with role `user`.
pub async fn register_user(gw: &Gateway, mut req: RegisterRequest) -> anyhow::Result<RegisterOutcome> {
    req.email = req.email.trim().to_lowercase();
    req.username = req.username.trim().to_string();

    if !is_valid_email(&req.email) {
        warn!(email = %req.email, "invalid email");
        anyhow::bail!("invalid email: {}", req.email);
    }
    if req.username.is_empty() {
        anyhow::bail!("username must not be empty");
    }

    if let Some(existing) = User::find_by_login(gw, &req.username).await? {
        return Ok(RegisterOutcome::Conflict(existing));
    }
    if let Some(existing) = User::find_by_email(gw, &req.email).await? {
        return Ok(RegisterOutcome::Conflict(existing));
    }

    let password_hash = hash_password(&req.password, HashScheme::Bcrypt)?;
    let user = User::create(
        gw,
        &NewUser {
            username: req.username,
            email: req.email,
            password_hash,
            full_name: req.full_name.filter(|n| !n.trim().is_empty()),
            role: Role::User,
        },
    )
    .await?;
    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(RegisterOutcome::Registered(user))
}

#[derive(Debug, PartialEq, Eq)]
pub enum LoginOutcome {
    UnknownEmail,
    WrongPassword,
    Inactive { user_id: i64 },
    Ok { user_id: i64, username: String },
}

/// Checks a password against the stored hash.
pub async fn verify_login(gw: &Gateway, email: &str, password: &str) -> anyhow::Result<LoginOutcome> {
    let email = email.trim().to_lowercase();
    let Some(creds) = User::credentials_by_email(gw, &email).await? else {
        warn!(email = %email, "login unknown email");
        return Ok(LoginOutcome::UnknownEmail);
    };

    if creds.is_active == Some(false) {
        warn!(email = %email, user_id = creds.id, "login inactive account");
        return Ok(LoginOutcome::Inactive { user_id: creds.id });
    }
    if !verify_password(password, &creds.password)? {
        warn!(email = %email, user_id = creds.id, "login invalid password");
        return Ok(LoginOutcome::WrongPassword);
    }
    Ok(LoginOutcome::Ok {
        user_id: creds.id,
        username: creds.username,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{fake::FakeDriver, DbError, ErrorKind, Param, StatementOutput};
    use serde_json::{json, Map, Value};
    use std::sync::{Arc, Mutex};

    fn obj(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    fn admin_row() -> Map<String, Value> {
        obj(json!({
            "id": 1, "username": "admin", "email": ADMIN_EMAIL, "role": "admin",
            "full_name": "Administrator", "avatar_url": null, "is_active": true,
            "created_at": "2024-01-01T00:00:00", "updated_at": "2024-01-01T00:00:00"
        }))
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("player@battlenet.com"));
        assert!(!is_valid_email("player"));
        assert!(!is_valid_email("a b@c.d"));
    }

    #[tokio::test]
    async fn create_admin_skips_existing() {
        let gw = Gateway::with_driver(FakeDriver::new(|_, _| {
            Ok(StatementOutput::Rows(vec![admin_row()]))
        }));
        let outcome = create_admin(&gw).await.unwrap();
        assert!(matches!(outcome, AdminOutcome::AlreadyExists(u) if u.id == 1));
    }

    #[tokio::test]
    async fn create_admin_inserts_bcrypt_hash() {
        let inserted = Arc::new(Mutex::new(None::<Vec<Param>>));
        let seen = inserted.clone();
        let gw = Gateway::with_driver(FakeDriver::new(move |sql, params| {
            if sql.starts_with("INSERT INTO users") {
                *seen.lock().unwrap() = Some(params.to_vec());
                Ok(StatementOutput::Rows(vec![admin_row()]))
            } else {
                Ok(StatementOutput::Rows(vec![]))
            }
        }));

        let outcome = create_admin(&gw).await.unwrap();
        assert!(matches!(outcome, AdminOutcome::Created(_)));

        let params = inserted.lock().unwrap().clone().expect("insert issued");
        assert_eq!(params[0], Param::from("admin"));
        assert_eq!(params[4], Param::from("admin"));
        match &params[2] {
            Param::Text(Some(hash)) => {
                assert!(verify_password(ADMIN_DEFAULT_PASSWORD, hash).unwrap())
            }
            other => panic!("unexpected hash param {other:?}"),
        }
    }

    #[tokio::test]
    async fn register_reports_conflict_without_insert() {
        let gw = Gateway::with_driver(FakeDriver::new(|sql, _| {
            assert!(!sql.starts_with("INSERT"), "must not insert on conflict");
            Ok(StatementOutput::Rows(vec![admin_row()]))
        }));
        let outcome = register_user(
            &gw,
            RegisterRequest {
                username: "admin".into(),
                email: "other@battlenet.com".into(),
                password: "secret123".into(),
                full_name: None,
            },
        )
        .await
        .unwrap();
        assert!(matches!(outcome, RegisterOutcome::Conflict(_)));
    }

    #[tokio::test]
    async fn register_rejects_bad_email() {
        let gw = Gateway::with_driver(FakeDriver::new(|_, _| Ok(StatementOutput::Rows(vec![]))));
        let err = register_user(
            &gw,
            RegisterRequest {
                username: "player".into(),
                email: "not-an-email".into(),
                password: "secret123".into(),
                full_name: None,
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("invalid email"));
    }

    #[tokio::test]
    async fn register_surfaces_constraint_violation() {
        let gw = Gateway::with_driver(FakeDriver::new(|sql, _| {
            if sql.starts_with("INSERT") {
                Err(DbError::new(ErrorKind::UniqueViolation, "duplicate key"))
            } else {
                Ok(StatementOutput::Rows(vec![]))
            }
        }));
        let err = register_user(
            &gw,
            RegisterRequest {
                username: "player".into(),
                email: "player@battlenet.com".into(),
                password: "secret123".into(),
                full_name: Some("Player One".into()),
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("duplicate key"));
    }

    #[tokio::test]
    async fn login_checks_stored_hash() {
        let hash = hash_password("test123456", HashScheme::Bcrypt).unwrap();
        let gw = Gateway::with_driver(FakeDriver::new(move |_, _| {
            Ok(StatementOutput::Rows(vec![obj(json!({
                "id": 7, "username": "tester", "email": "t@test.com",
                "is_active": true, "password": hash.clone()
            }))]))
        }));

        assert_eq!(
            verify_login(&gw, "T@test.com", "test123456").await.unwrap(),
            LoginOutcome::Ok {
                user_id: 7,
                username: "tester".into()
            }
        );
        assert_eq!(
            verify_login(&gw, "t@test.com", "nope").await.unwrap(),
            LoginOutcome::WrongPassword
        );
    }

    #[tokio::test]
    async fn inactive_account_rejected_before_password() {
        let hash = hash_password("test123456", HashScheme::Bcrypt).unwrap();
        let gw = Gateway::with_driver(FakeDriver::new(move |_, _| {
            Ok(StatementOutput::Rows(vec![obj(json!({
                "id": 9, "username": "frozen", "email": "f@test.com",
                "is_active": false, "password": hash.clone()
            }))]))
        }));

        for password in ["test123456", "wrong"] {
            assert_eq!(
                verify_login(&gw, "f@test.com", password).await.unwrap(),
                LoginOutcome::Inactive { user_id: 9 }
            );
        }
    }

    #[tokio::test]
    async fn login_unknown_email() {
        let gw = Gateway::with_driver(FakeDriver::new(|_, _| Ok(StatementOutput::Rows(vec![]))));
        assert_eq!(
            verify_login(&gw, "ghost@test.com", "x").await.unwrap(),
            LoginOutcome::UnknownEmail
        );
    }
}
