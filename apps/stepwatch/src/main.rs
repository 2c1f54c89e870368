mod config;
mod render;

use anyhow::{Context, Result};
use client_core::{SyncClient, SyncEvent};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use config::load_settings;
use render::render;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = load_settings();
    let client_config = settings
        .client_config()
        .context("invalid stepwatch settings")?;
    info!(endpoint = %client_config.endpoint, "stepwatch: starting");

    let mut client = SyncClient::start(client_config)
        .await
        .context("failed to start step sync")?;
    let mut events = client.subscribe_events();

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                if let Err(err) = signal {
                    warn!("stepwatch: ctrl-c handler failed: {err}");
                }
                break;
            }
            event = events.recv() => match event {
                Ok(SyncEvent::StatusChanged { status }) => {
                    info!(status = status.label(), "stepwatch: connection status");
                }
                Ok(SyncEvent::StepsReconciled { revision, outcome, .. }) => {
                    debug!(revision, ?outcome, "stepwatch: redraw");
                    let snapshot = client.snapshot();
                    print!("{}", render(snapshot.status, &snapshot.view()));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "stepwatch: fell behind, redrawing latest state");
                    let snapshot = client.snapshot();
                    print!("{}", render(snapshot.status, &snapshot.view()));
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    info!("stepwatch: shutting down");
    client.shutdown().await;
    Ok(())
}
