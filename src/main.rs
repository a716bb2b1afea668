mod device;
mod error;
mod logger;
mod simulation;
mod web;

use anyhow::Result;
use logger::DeviceLog;
use simulation::SimulationConfig;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use web::state::{AppState, LOG_FILE_NAME, WEB_SERVER_PORT};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    info!("Starting device log service");

    // Create the shared log
    let log = Arc::new(DeviceLog::new(LOG_FILE_NAME));
    info!("Logging device records to {}", log.path().display());

    let app_state = Arc::new(AppState::new(log));

    // Bind before spawning so the simulation never races the listener
    let listener = web::server::bind(WEB_SERVER_PORT).await?;

    tokio::spawn(async move {
        if let Err(e) = web::server::serve(listener, app_state).await {
            error!("Web server error: {}", e);
        }
    });

    if let Err(e) = simulation::run_simulation(&SimulationConfig::default()).await {
        error!("Simulation error: {}", e);
    }

    println!("\nServer is still running. Press Enter to exit...");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;

    info!("Shutting down");
    Ok(())
}
