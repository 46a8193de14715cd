//! `bnetctl`: provisioning and verification commands.

pub mod auth_flow;
pub mod output;
pub mod setup;
pub mod users;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::db::Gateway;
use crate::users::{password::HashScheme, services::RegisterRequest};

#[derive(Parser, Debug)]
#[command(
    name = "bnetctl",
    version,
    about = "Provision and inspect the Battle.net platform database"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database, tables, indexes and admin user
    Setup,
    /// Insert the sample game catalog
    Seed,
    /// Probe the database and print counts
    Check,
    /// Print a password hash
    Hash {
        password: String,
        #[arg(long, value_enum, default_value_t = HashScheme::Bcrypt)]
        scheme: HashScheme,
    },
    /// Inspect registered users
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
    /// Check that a registration reached PostgreSQL
    Verify {
        /// Email (contains `@`) or username
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        login: Option<String>,
        /// List every user instead
        #[arg(long)]
        all: bool,
    },
    /// Register a user directly in the database
    Register {
        username: String,
        email: String,
        password: String,
        #[arg(long)]
        full_name: Option<String>,
    },
    /// Check a password against the stored hash
    Login { email: String, password: String },
    /// Register and log in a test user through the account backend
    AuthFlow,
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    /// All users with role and status totals
    All,
    /// One user by username or email, with recent activity
    Search { login: String },
    /// Most recent registrations
    Recent {
        #[arg(default_value_t = 5, value_parser = clap::value_parser!(i64).range(1..))]
        limit: i64,
    },
}

pub async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<ExitCode> {
    let gw = Gateway::new(&config.db);
    match cli.command {
        Commands::Setup => setup::run_setup(config, &gw).await,
        Commands::Seed => setup::run_seed(&gw).await,
        Commands::Check => setup::run_check(config, &gw).await,
        Commands::Hash { password, scheme } => users::hash(&password, scheme),
        Commands::Users { command } => match command {
            UsersCommand::All => users::list_all(&gw).await,
            UsersCommand::Search { login } => users::search(&gw, &login).await,
            UsersCommand::Recent { limit } => users::recent(&gw, limit).await,
        },
        Commands::Verify { all: true, .. } => users::verify_all(&gw).await,
        Commands::Verify { login, .. } => match login {
            Some(login) => users::verify(&gw, &login).await,
            None => anyhow::bail!("pass an email or username, or --all"),
        },
        Commands::Register {
            username,
            email,
            password,
            full_name,
        } => {
            users::register(
                &gw,
                RegisterRequest {
                    username,
                    email,
                    password,
                    full_name,
                },
            )
            .await
        }
        Commands::Login { email, password } => users::login(&gw, &email, &password).await,
        Commands::AuthFlow => auth_flow::run(&gw, &config.node_backend_url).await,
    }
}
