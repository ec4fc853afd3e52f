use anyhow::Result;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use courier_engine::api;
use courier_engine::config::Settings;
use courier_engine::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("courier_engine=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    if settings.api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY is not set; chat requests fail until an admin configures one");
    }
    let state = AppState::from_settings(&settings)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let api_handle = tokio::spawn(async move {
        if let Err(e) = api::start_server(&settings, state, shutdown_rx).await {
            tracing::error!("API server crashed: {:#}", e);
        }
    });

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(true);
            let _ = api_handle.await;
        }
        _ = shutdown_tx.closed() => {
            // The server task exited on its own, e.g. the port was taken.
        }
    }

    tracing::info!("Courier shutdown complete.");
    Ok(())
}
