/// Configuration management
use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:5000";

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the marketplace REST backend
    pub api_url: String,

    /// Data directory for the persisted session (defaults to `~/.cargolink`)
    pub data_dir: PathBuf,

    /// Conversation-list cadence for badge/notification views
    pub badge_poll_interval: Duration,

    /// Conversation-list cadence for the full conversations view
    pub page_poll_interval: Duration,

    /// Open-thread cadence
    pub thread_poll_interval: Duration,

    /// Per-request timeout
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            data_dir: default_data_dir(),
            badge_poll_interval: Duration::from_secs(30),
            page_poll_interval: Duration::from_secs(10),
            thread_poll_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(10),
        }
    }
}

fn default_data_dir() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".cargolink"),
        Err(_) => PathBuf::from(".cargolink"),
    }
}

impl Config {
    /// Create config from command line arguments
    pub fn from_args(args: &[String]) -> Result<Self> {
        let mut config = Config::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--api-url" => {
                    let url = args.get(i + 1).ok_or_else(|| {
                        ClientError::Config("--api-url requires a URL argument".to_string())
                    })?;
                    config.api_url = url.trim_end_matches('/').to_string();
                    i += 2;
                }
                "--data-dir" => {
                    let path = args.get(i + 1).ok_or_else(|| {
                        ClientError::Config("--data-dir requires a path argument".to_string())
                    })?;
                    config.data_dir = PathBuf::from(path);
                    i += 2;
                }
                // Command words and command-specific flags pass through
                _ => {
                    i += 1;
                }
            }
        }

        // Env overrides (nice for scripts)
        if let Ok(url) = std::env::var("CARGOLINK_API_URL") {
            config.api_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(dir) = std::env::var("CARGOLINK_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }

        if !config.api_url.starts_with("http://") && !config.api_url.starts_with("https://") {
            return Err(ClientError::Config(format!(
                "API URL must start with http:// or https://: {}",
                config.api_url
            )));
        }

        Ok(config)
    }
}
