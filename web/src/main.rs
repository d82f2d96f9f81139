use anyhow::Context;
use api::{router, AppConfig, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; variables may come from the process environment.
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tracklift=debug".into()),
        )
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let address = config.bind_address();
    info!(
        "Batch size {}, resolve concurrency {}, match policy {:?}, on search failure {:?}",
        config.migration.max_batch_size,
        config.migration.resolve_concurrency,
        config.migration.match_policy,
        config.migration.search_failure_policy
    );

    let state = AppState::from_config(config).context("could not set up Spotify authorization")?;
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("could not bind {address}"))?;
    info!("Listening on http://{}", address);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
