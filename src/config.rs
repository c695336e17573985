//! Configuration management for the trainer core
//!
//! This module provides runtime configuration loading from JSON files,
//! enabling endpoint and policy changes without recompilation. The
//! detection backend address, reconnect policy, and song-assistance
//! parameters can all be adjusted via the config file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub link: LinkConfig,
    pub stream: StreamConfig,
    pub assist: AssistConfig,
}

/// Detection link parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// WebSocket endpoint pushing detection event frames
    pub event_endpoint: String,
    /// Delay between reconnect attempts, in milliseconds
    pub reconnect_delay_ms: u64,
    /// Maximum entries retained in the recent-chord history
    pub chord_history_cap: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            // The sensing rig is a LAN-local companion device, so the
            // reconnect delay stays fixed: no backoff growth, no cap.
            event_endpoint: "ws://127.0.0.1:8000/ws".to_string(),
            reconnect_delay_ms: 3000,
            chord_history_cap: 8,
        }
    }
}

/// Media stream control parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Base URL of the detection backend's control endpoints
    pub control_base_url: String,
    /// Timeout for a single start/stop control request, in seconds
    pub request_timeout_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            control_base_url: "http://127.0.0.1:8000".to_string(),
            request_timeout_secs: 5,
        }
    }
}

/// Song-assistance service parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistConfig {
    /// Chat-completions endpoint of the assistance service
    pub endpoint: String,
    /// Model identifier requested from the service
    pub model: String,
    /// Maximum tokens per response
    pub max_tokens: u32,
    /// Environment variable holding the API key
    pub api_key_env: String,
}

impl Default for AssistConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://openrouter.ai/api/v1/chat/completions".to_string(),
            model: "openai/gpt-3.5-turbo".to_string(),
            max_tokens: 128,
            api_key_env: "OPENROUTER_API_KEY".to_string(),
        }
    }
}

impl Default for AppConfig {
    /// Default configuration values (fallback if config file not found)
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            stream: StreamConfig::default(),
            assist: AssistConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from JSON file
    ///
    /// # Arguments
    /// * `path` - Path to JSON config file
    ///
    /// # Returns
    /// The loaded configuration, or the defaults if the file is missing or
    /// the JSON is invalid.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("[Config] Loaded configuration from {:?}", path.as_ref());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "[Config] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) => {
                log::warn!(
                    "[Config] Failed to read config file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }

    /// Load configuration from the default location
    pub fn load() -> Self {
        Self::load_from_file("assets/trainer_config.json")
    }
}
