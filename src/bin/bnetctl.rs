use std::process::ExitCode;

use clap::Parser;

use battlenet_analytics::{
    cli::{run, Cli},
    config::{load_env_file, AppConfig},
    logging::init_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let env_file = std::env::current_dir()
        .ok()
        .and_then(|dir| load_env_file(&dir));
    init_tracing("battlenet_analytics=warn");
    match env_file {
        Some(path) => tracing::info!(path = %path.display(), "loaded .env"),
        None => tracing::warn!("no .env file found, using process environment"),
    }

    let result = match AppConfig::from_env() {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ {e:#}");
            ExitCode::FAILURE
        }
    }
}
