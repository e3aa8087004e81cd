//! Main application run loop

use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{error, info};

use crate::app::controller::StationController;
use crate::errors::StationError;

/// Run the station agent until the input source closes or a shutdown signal
/// arrives.
pub async fn run(
    config_path: PathBuf,
    shutdown_signal: impl Future<Output = ()> + Send + 'static,
) -> Result<(), StationError> {
    info!("Initializing station controller...");

    let mut controller = StationController::init(&config_path).await?;
    controller.startup().await?;

    tokio::select! {
        _ = shutdown_signal => {
            info!("Shutdown signal received, shutting down...");
        }
        result = controller.serve() => {
            match result {
                Err(StationError::Io(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                    info!("Input stream closed, shutting down...");
                }
                Err(e) => {
                    error!("Input loop failed: {}", e);
                }
                Ok(()) => {}
            }
        }
    }

    controller.shutdown().await
}
