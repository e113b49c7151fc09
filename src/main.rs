use anyhow::Context;

mod achievements;
mod app;
mod auth;
mod config;
mod error;
mod explorer;
mod extract;
mod progress;
mod rate_limit;
mod state;
mod stats;
mod store;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "exoai_explorer=debug,axum=info,tower_http=info".to_string());
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

    let (state, store) = state::AppState::init().await?;

    sqlx::migrate!("./migrations")
        .run(store.pool())
        .await
        .context("run database migrations")?;

    rate_limit::spawn_pruner(state.limiter.clone(), std::time::Duration::from_secs(60));

    let (host, port) = (state.config.host.clone(), state.config.port);
    tracing::info!(
        production = state.config.production,
        enforce_sessions = state.config.session.enforce,
        "configuration loaded"
    );
    let app = app::build_app(state);
    app::serve(app, &host, port).await
}
