use std::sync::Arc;

use crate::config::Config;

/// Shared, read-only application state. Conversions keep nothing here
/// between requests.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}
