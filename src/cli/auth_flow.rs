//! End-to-end check against the platform's account backend: register and
//! log in a throwaway user over HTTP, then confirm the row in PostgreSQL.

use std::process::ExitCode;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use time::{macros::format_description, OffsetDateTime};

use crate::db::{Gateway, ProbeResult, Target};
use crate::users::{role_label, User};

use super::output::{banner, fail, format_date, info, ok, rule, warn};
use super::users::fallback_listing;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Serialize)]
pub struct TestUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
}

impl TestUser {
    pub fn at(now: OffsetDateTime) -> Self {
        let stamp = now
            .format(format_description!(
                "[year][month][day][hour][minute][second]"
            ))
            .unwrap_or_else(|_| now.unix_timestamp().to_string());
        Self {
            username: format!("test_user_{stamp}"),
            email: format!("test_{stamp}@test.com"),
            password: "test123456".into(),
            full_name: "Test User".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn token_preview(token: Option<&str>) -> String {
    match token {
        Some(t) => format!("{}...", t.chars().take(50).collect::<String>()),
        None => "N/A".into(),
    }
}

pub async fn run(gw: &Gateway, backend_url: &str) -> anyhow::Result<ExitCode> {
    banner("🧪 Registration and login flow");
    let user = TestUser::at(OffsetDateTime::now_utc());
    println!("   Username: {}", user.username);
    println!("   Email:    {}", user.email);
    println!("   Password: {}", user.password);
    println!();

    let base = backend_url.trim_end_matches('/');
    let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

    println!("🔌 Checking backend at {base}...");
    let reachable = client
        .get(format!("{base}/api/auth/me"))
        .timeout(PROBE_TIMEOUT)
        .send()
        .await
        .is_ok();
    if !reachable {
        warn(format!("Backend is not running at {base}"));
        return direct_db(gw).await;
    }
    ok("Backend is running");

    println!();
    println!("📤 Registering...");
    let response = match client
        .post(format!("{base}/api/auth/register"))
        .json(&user)
        .send()
        .await
    {
        Ok(r) => r,
        Err(e) => {
            fail(format!("Connection error: {e}"));
            return direct_db(gw).await;
        }
    };

    let status = response.status();
    let body: AuthResponse = response.json().await.unwrap_or_default();
    match status {
        StatusCode::CREATED => {
            ok("Registration succeeded");
            println!("   Token: {}", token_preview(body.token.as_deref()));
        }
        StatusCode::BAD_REQUEST
            if body
                .error
                .as_deref()
                .is_some_and(|e| e.contains("already exists")) =>
        {
            info("User already exists");
        }
        other => {
            fail(format!(
                "Registration failed with {other}: {}",
                body.error.unwrap_or_default()
            ));
            return Ok(ExitCode::FAILURE);
        }
    }

    println!();
    println!("🔍 Checking PostgreSQL...");
    let stored = confirm_in_db(gw, &user.email).await?;

    println!();
    println!("🔐 Logging in...");
    let login = client
        .post(format!("{base}/api/auth/login"))
        .json(&serde_json::json!({ "email": user.email, "password": user.password }))
        .send()
        .await?;
    let login_ok = login.status() == StatusCode::OK;
    if login_ok {
        let body: AuthResponse = login.json().await.unwrap_or_default();
        ok("Login succeeded");
        println!("   Token: {}", token_preview(body.token.as_deref()));
    } else {
        fail(format!("Login failed: {}", login.status()));
        println!("   {}", login.text().await.unwrap_or_default());
    }

    println!();
    rule();
    Ok(if stored && login_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

async fn confirm_in_db(gw: &Gateway, email: &str) -> anyhow::Result<bool> {
    match User::find_by_email(gw, email).await? {
        Some(user) => {
            ok("User found in PostgreSQL");
            println!("   ID:       {}", user.id);
            println!("   Username: {}", user.username);
            println!("   Role:     {}", role_label(user.role));
            println!("   Name:     {}", user.full_name.as_deref().unwrap_or("N/A"));
            println!("   Created:  {}", format_date(user.created_at.as_deref()));
            Ok(true)
        }
        None => {
            fail("User NOT found in PostgreSQL");
            Ok(false)
        }
    }
}

async fn direct_db(gw: &Gateway) -> anyhow::Result<ExitCode> {
    println!();
    println!("📊 Checking PostgreSQL directly...");
    if let ProbeResult::Failed(e) = gw.test_connection(Target::Application).await {
        fail(format!("Cannot connect to PostgreSQL: {}", e.message));
        return Ok(ExitCode::FAILURE);
    }
    ok("Connected to PostgreSQL");
    println!();
    fallback_listing(gw).await?;
    Ok(ExitCode::FAILURE)
}
