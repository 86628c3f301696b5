mod app;
mod auth;
mod config;
mod error;
mod meals;
mod metrics;
mod state;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // APP_MODE=test reads .env.test instead of .env; neither has to exist.
    let env_file = match std::env::var("APP_MODE").as_deref() {
        Ok("test") => ".env.test",
        _ => ".env",
    };
    dotenvy::from_filename(env_file).ok();

    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(mode = ?config.mode, "starting dailydiet");
    let (host, port) = (config.host.clone(), config.port);

    let app_state = AppState::init(config).await?;

    sqlx::migrate!("./migrations").run(&app_state.db).await?;

    app::serve(app::build_app(app_state), &host, port).await
}

fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "dailydiet=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}
