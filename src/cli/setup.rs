//! Provisioning commands: `setup`, `seed`, `check`.

use std::process::ExitCode;

use crate::config::AppConfig;
use crate::db::{version_string, EnsureDatabaseResult, Gateway, ProbeResult, Target};
use crate::games::seed::{seed_sample_data, SeedOutcome};
use crate::schema::{create_tables, verify_setup, EXPECTED_TABLES};
use crate::users::services::{create_admin, AdminOutcome, ADMIN_DEFAULT_PASSWORD, ADMIN_EMAIL};
use crate::users::{role_label, User};

use super::output::{self, banner, fail, hints, info, ok, rule, step, warn};

fn print_config(config: &AppConfig) {
    println!("Configuration:");
    println!("   Host:     {}", config.db.host);
    println!("   Port:     {}", config.db.port);
    println!("   Database: {}", config.db.name);
    println!("   User:     {}", config.db.user);
    println!("   Password: {}", config.db.masked_password());
}

fn fatal(reason: &str) -> ExitCode {
    println!();
    rule();
    println!("❌ Setup failed: {reason}");
    rule();
    ExitCode::FAILURE
}

/// Probe, create database, tables and admin, then verify. The first three
/// steps are fatal; the last two only warn.
pub async fn run_setup(config: &AppConfig, gw: &Gateway) -> anyhow::Result<ExitCode> {
    banner("🎮 Battle.net Platform - database setup");
    print_config(config);

    step(1, "Testing PostgreSQL connection...");
    match gw.test_connection(Target::Bootstrap).await {
        ProbeResult::Connected { version } => {
            ok(format!(
                "Connected, PostgreSQL {}",
                version_string(version)
            ));
        }
        ProbeResult::Failed(e) => {
            fail(format!("{}: {}", e.kind, e.message));
            hints(e.kind);
            return Ok(fatal("could not connect to PostgreSQL"));
        }
    }

    step(2, &format!("Creating database '{}'...", config.db.name));
    match gw.ensure_database(&config.db.name).await {
        EnsureDatabaseResult::Failed(e) => {
            fail(format!("{}: {}", e.kind, e.message));
            hints(e.kind);
            return Ok(fatal("could not create the database"));
        }
        created @ EnsureDatabaseResult::Created(_) => ok(created.message()),
        existing => info(existing.message()),
    }

    step(3, "Creating tables and indexes...");
    match create_tables(gw, |name| ok(format!("'{name}' ready"))).await {
        Ok(report) => ok(format!(
            "{} tables and {} indexes in place",
            report.tables.len(),
            report.indexes.len()
        )),
        Err(e) => {
            fail(e.to_string());
            return Ok(fatal("could not create the tables"));
        }
    }

    step(4, "Creating admin user...");
    match create_admin(gw).await {
        Ok(AdminOutcome::AlreadyExists(admin)) => info(format!("Admin already exists: {}", admin.email)),
        Ok(AdminOutcome::Created(admin)) => {
            ok("Admin user created");
            println!("   Credentials:");
            println!("      Email:    {}", admin.email);
            println!("      Password: {ADMIN_DEFAULT_PASSWORD}");
        }
        Err(e) => {
            fail(format!("creating admin: {e:#}"));
            warn("You can create the admin later with `bnetctl setup`");
        }
    }

    step(5, "Verifying setup...");
    match verify_setup(gw).await {
        Ok(check) => {
            ok(format!("Tables: {}/{EXPECTED_TABLES}", check.tables));
            ok(format!("Users: {}", check.users));
            match &check.admin {
                Some((email, role)) => ok(format!("Admin: {email} ({role})")),
                None => warn("Admin user not found"),
            }
            if !check.is_complete() {
                warn("Verification found problems");
            }
        }
        Err(e) => warn(format!("Verification failed: {e:#}")),
    }

    println!();
    rule();
    println!("✅ Setup complete");
    rule();
    println!();
    println!("Log in with {ADMIN_EMAIL} / {ADMIN_DEFAULT_PASSWORD}");
    Ok(ExitCode::SUCCESS)
}

pub async fn run_seed(gw: &Gateway) -> anyhow::Result<ExitCode> {
    banner("🌱 Seeding sample data");
    match seed_sample_data(gw).await? {
        SeedOutcome::NoAdmin => {
            warn("No admin user found. Run `bnetctl setup` first.");
            Ok(ExitCode::FAILURE)
        }
        SeedOutcome::Seeded { inserted, total } => {
            ok(format!("{inserted} of {total} sample games inserted"));
            if inserted < total {
                info("The rest were already in the catalog");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

pub async fn run_check(config: &AppConfig, gw: &Gateway) -> anyhow::Result<ExitCode> {
    banner("🔍 Checking database");
    print_config(config);
    println!();

    match gw.test_connection(Target::Application).await {
        ProbeResult::Connected { version } => ok(format!(
            "Connected, PostgreSQL {}",
            version_string(version)
        )),
        ProbeResult::Failed(e) => {
            fail(format!("{}: {}", e.kind, e.message));
            hints(e.kind);
            return Ok(ExitCode::FAILURE);
        }
    }

    let stats = gw.stats().await;
    ok(format!("Tables: {}", stats.tables));
    ok(format!("Users:  {}", stats.users));
    ok(format!("Games:  {}", stats.games));

    match User::find_admin(gw).await? {
        Some(admin) => ok(format!(
            "Admin: {} ({}), created {}",
            admin.email,
            role_label(admin.role),
            output::format_date(admin.created_at.as_deref())
        )),
        None => warn("Admin user not found"),
    }
    Ok(ExitCode::SUCCESS)
}
