/// Configuration management
use crate::error::{ChatError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

// 10.0.2.2 is the Android emulator's loopback to the host machine,
// where the shop backend runs during development.
const DEFAULT_API_URL: &str = "http://10.0.2.2:5000/api";
const DEFAULT_SOCKET_URL: &str = "ws://10.0.2.2:5000/socket";

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the REST API
    pub api_url: String,

    /// Websocket endpoint of the realtime server
    pub socket_url: String,

    /// Websocket connect timeout
    pub connect_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            socket_url: DEFAULT_SOCKET_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Create config from the environment, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("LAUNDRYLINK_API_URL") {
            config.api_url = url;
        }
        if let Ok(url) = std::env::var("LAUNDRYLINK_SOCKET_URL") {
            config.socket_url = url;
        }
        if let Ok(ms) = std::env::var("LAUNDRYLINK_CONNECT_TIMEOUT_MS") {
            let ms = ms.parse::<u64>().map_err(|_| {
                ChatError::Config(
                    "LAUNDRYLINK_CONNECT_TIMEOUT_MS must be a number of milliseconds".to_string(),
                )
            })?;
            config.connect_timeout = Duration::from_millis(ms);
        }

        Ok(config)
    }
}
