//! Application configuration.

use std::{path::PathBuf, time::Duration};

use postboard_client::ClientConfig;

/// Default backend address.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

/// Default timeout for one HTTP call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for a running client.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server root. Endpoint paths (which carry `/api`) are appended to it.
    pub base_url: String,
    /// Token file. `None` selects `$HOME/.postboard/access_token`.
    pub token_path: Option<PathBuf>,
    /// Timeout for one outward call.
    pub request_timeout: Duration,
    /// State machine configuration.
    pub client: ClientConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token_path: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            client: ClientConfig::default(),
        }
    }
}
