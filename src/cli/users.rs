//! User inspection and account commands.

use std::process::ExitCode;

use crate::db::Gateway;
use crate::users::{
    password::{hash_password, HashScheme},
    services::{register_user, verify_login, LoginOutcome, RegisterOutcome, RegisterRequest},
    role_icon, role_label, User,
};

use super::output::{banner, fail, format_date, info, ok, rule, user_card, user_line, warn};

/// Activities shown next to a user's details.
const ACTIVITY_LIMIT: i64 = 5;

pub async fn list_all(gw: &Gateway) -> anyhow::Result<ExitCode> {
    banner("👥 Registered users");
    let users = User::list_all(gw).await?;
    if users.is_empty() {
        info("No users registered yet");
        return Ok(ExitCode::SUCCESS);
    }

    println!("📊 Total users: {}", users.len());
    println!();
    for user in &users {
        user_card(user);
    }

    println!();
    println!("📈 By role:");
    for rc in User::role_counts(gw).await? {
        println!("   {} {}: {}", role_icon(rc.role), role_label(rc.role), rc.count);
    }
    let active = User::active_counts(gw).await?;
    println!();
    println!("   Active:   {}", active.active);
    println!("   Inactive: {}", active.inactive);
    Ok(ExitCode::SUCCESS)
}

pub async fn search(gw: &Gateway, login: &str) -> anyhow::Result<ExitCode> {
    banner(&format!("🔎 Searching for '{login}'"));
    let Some(user) = User::find_by_login(gw, login).await? else {
        fail(format!("No user matches '{login}'"));
        return Ok(ExitCode::FAILURE);
    };
    user_card(&user);
    print_activities(gw, user.id).await?;
    Ok(ExitCode::SUCCESS)
}

async fn print_activities(gw: &Gateway, user_id: i64) -> anyhow::Result<()> {
    let activities = User::recent_activities(gw, user_id, ACTIVITY_LIMIT).await?;
    println!();
    if activities.is_empty() {
        info("No recorded activity");
        return Ok(());
    }
    println!("📝 Last {} activities:", activities.len());
    for a in &activities {
        println!(
            "   • {} - {}",
            a.activity_type,
            format_date(a.created_at.as_deref())
        );
        if let Some(data) = &a.activity_data {
            println!("     {data}");
        }
    }
    Ok(())
}

pub async fn recent(gw: &Gateway, limit: i64) -> anyhow::Result<ExitCode> {
    banner(&format!("🆕 Last {limit} registrations"));
    let users = User::recent(gw, limit).await?;
    if users.is_empty() {
        info("No users registered yet");
    }
    for user in &users {
        user_line(user);
    }
    Ok(ExitCode::SUCCESS)
}

/// An argument containing `@` is looked up as an email, anything else as
/// a username.
pub async fn verify(gw: &Gateway, login: &str) -> anyhow::Result<ExitCode> {
    banner("🔍 Registration check");
    let found = if login.contains('@') {
        User::find_by_email(gw, &login.trim().to_lowercase()).await?
    } else {
        User::find_by_username(gw, login.trim()).await?
    };

    match found {
        Some(user) => {
            ok("User found in PostgreSQL");
            user_card(&user);
            print_activities(gw, user.id).await?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            fail(format!("User '{login}' NOT found in PostgreSQL"));
            println!();
            println!("💡 Recent registrations:");
            for user in User::recent(gw, 5).await? {
                user_line(&user);
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

pub async fn verify_all(gw: &Gateway) -> anyhow::Result<ExitCode> {
    list_all(gw).await
}

pub async fn register(gw: &Gateway, req: RegisterRequest) -> anyhow::Result<ExitCode> {
    banner("📝 Simulated registration");
    println!("   Username: {}", req.username);
    println!("   Email:    {}", req.email);
    println!();

    match register_user(gw, req).await {
        Ok(RegisterOutcome::Conflict(existing)) => {
            warn(format!(
                "Username or email already registered by '{}' ({})",
                existing.username, existing.email
            ));
            Ok(ExitCode::FAILURE)
        }
        Ok(RegisterOutcome::Registered(user)) => {
            ok(format!("Registered with ID {}", user.id));
            match User::find_by_email(gw, &user.email).await? {
                Some(stored) => {
                    ok("Read back from PostgreSQL");
                    user_card(&stored);
                }
                None => fail("Inserted row could not be read back"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            fail(format!("Registration failed: {e:#}"));
            Ok(ExitCode::FAILURE)
        }
    }
}

pub async fn login(gw: &Gateway, email: &str, password: &str) -> anyhow::Result<ExitCode> {
    banner("🔐 Login check");
    let code = match verify_login(gw, email, password).await? {
        LoginOutcome::Ok { user_id, username } => {
            ok(format!("Password valid for {username} (ID {user_id})"));
            ExitCode::SUCCESS
        }
        LoginOutcome::Inactive { user_id } => {
            warn(format!("Password valid but user {user_id} is inactive"));
            ExitCode::FAILURE
        }
        LoginOutcome::WrongPassword => {
            fail("Invalid password");
            ExitCode::FAILURE
        }
        LoginOutcome::UnknownEmail => {
            fail(format!("No user with email {email}"));
            ExitCode::FAILURE
        }
    };
    Ok(code)
}

pub fn hash(password: &str, scheme: HashScheme) -> anyhow::Result<ExitCode> {
    println!("{}", hash_password(password, scheme)?);
    Ok(ExitCode::SUCCESS)
}

/// Prints a short listing used when the backend is unreachable.
pub async fn fallback_listing(gw: &Gateway) -> anyhow::Result<()> {
    println!("👥 Current users in the database:");
    let users = User::recent(gw, 10).await?;
    if users.is_empty() {
        warn("No users");
    }
    for user in &users {
        user_line(user);
    }
    println!();
    rule();
    Ok(())
}
