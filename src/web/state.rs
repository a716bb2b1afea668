use crate::logger::DeviceLog;
use std::sync::Arc;

// Configuration constants
pub const WEB_SERVER_PORT: u16 = 8080;
pub const LOG_FILE_NAME: &str = "server.log";

// Application state shared across all handlers
pub struct AppState {
    // Shared device log file and its lock
    pub log: Arc<DeviceLog>,
}

impl AppState {
    pub fn new(log: Arc<DeviceLog>) -> Self {
        Self { log }
    }
}
