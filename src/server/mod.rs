//! Web front end
//!
//! `GET /` serves the upload form, `POST /process` runs the dubbing pipeline
//! on the submitted video and answers with the transcript and a player, and
//! `GET /outputs/{run_id}` streams the finished video back for preview or
//! download. Finished videos are swept once they exceed the retention age.

pub mod handlers;
pub mod pages;
pub mod router;
pub mod state;

use std::time::Duration;

use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::error::Result;
use crate::pipeline::{DubbingPipeline, OutputStore};

pub use router::create_router;
pub use state::AppState;

const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Periodically deletes stored videos older than `retain`.
pub fn spawn_output_sweeper(store: OutputStore, retain: Duration) -> JoinHandle<()> {
    let period = (retain / 2).clamp(Duration::from_secs(1), MAX_SWEEP_INTERVAL);

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let store = store.clone();
            match tokio::task::spawn_blocking(move || store.sweep(retain)).await {
                Ok(0) => {}
                Ok(removed) => log::info!("Removed {} expired output video(s)", removed),
                Err(e) => log::warn!("Output sweep failed: {}", e),
            }
        }
    })
}

/// Runs the web server until Ctrl-C.
pub async fn serve(config: &Config) -> Result<()> {
    let addr = config.bind_addr()?;
    let pipeline = DubbingPipeline::from_config(config)?;
    let sweeper = spawn_output_sweeper(
        pipeline.outputs().clone(),
        Duration::from_secs(config.server.retain_outputs_secs),
    );
    let router = create_router(AppState::new(pipeline, config.max_upload_bytes()));

    let listener = TcpListener::bind(addr).await?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.abort();
    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Cannot listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
