use anyhow::Context;
use handsup::{app, auth::TokenVerifier, config::Config, db, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let db_pool = db::connect(&config.database_url, config.db_max_connections)
        .await
        .with_context(|| format!("could not open {}", config.database_url))?;

    let app_state = AppState::new(db_pool, TokenVerifier::new(config.auth_secret.as_bytes()))
        .with_join_policy(config.join_policy);
    let app = app(app_state, time::Duration::minutes(config.session_idle_minutes));

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("could not bind {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
