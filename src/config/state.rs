// Runtime state shared by all connection tasks.

use super::types::Config;

/// Application state
pub struct AppState {
    pub config: Config,
}

impl AppState {
    pub const fn new(config: Config) -> Self {
        Self { config }
    }

    /// Whether access logging is enabled.
    pub const fn access_log(&self) -> bool {
        self.config.logging.access_log
    }
}
