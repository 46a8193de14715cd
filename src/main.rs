use battlenet_analytics::{
    app::{build_app, serve},
    config::{load_env_file, AppConfig},
    logging::{init_tracing, DEFAULT_FILTER},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_file = load_env_file(&std::env::current_dir()?);
    init_tracing(DEFAULT_FILTER);

    match &env_file {
        Some(path) => tracing::info!(path = %path.display(), "loaded .env"),
        None => tracing::warn!("no .env file found, using process environment"),
    }

    let config = AppConfig::from_env()?;
    tracing::info!(
        db_host = %config.db.host,
        db_port = config.db.port,
        db_name = %config.db.name,
        db_user = %config.db.user,
        db_password = %config.db.masked_password(),
        cors_origins = ?config.cors_origins,
        "configuration"
    );

    let host = config.server.host.clone();
    let port = config.server.port;
    let state = AppState::init(config);
    tracing::info!(
        advanced_analytics = state.capabilities.advanced_analytics,
        "capabilities"
    );
    for route in [
        "/health",
        "/api/db/status",
        "/api/analytics/basic",
        "/api/analytics/advanced",
        "/api/analytics/trends",
        "/api/analytics/predictions",
    ] {
        tracing::debug!(route, "GET");
    }

    serve(build_app(state), &host, port).await
}
