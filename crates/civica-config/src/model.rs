// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Civica chat client.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Civica configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CivicaConfig {
    /// Backend endpoint and chat settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Grading-status polling settings.
    #[serde(default)]
    pub polling: PollingConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Backend endpoint and chat configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base URL of the legal-answer backend.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Language selector sent with every chat submission.
    #[serde(default = "default_language")]
    pub language: String,

    /// Per-request HTTP timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            language: default_language(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_language() -> String {
    "english".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Grading-status polling configuration.
///
/// The defaults bound worst-case steady-state polling to roughly 50 seconds
/// per message: one initial check after 3 seconds plus nine retries at a
/// fixed 5-second cadence.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PollingConfig {
    /// Delay before the first status check, in seconds. Gives the grading
    /// pipeline time to produce a result and avoids a guaranteed-wasted call.
    #[serde(default = "default_initial_delay_secs")]
    pub initial_delay_secs: u64,

    /// Fixed delay between status checks, in seconds.
    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,

    /// Maximum number of status checks per message before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Length of the shared rate-limit cooldown, in seconds.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            initial_delay_secs: default_initial_delay_secs(),
            retry_interval_secs: default_retry_interval_secs(),
            max_attempts: default_max_attempts(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

fn default_initial_delay_secs() -> u64 {
    3
}

fn default_retry_interval_secs() -> u64 {
    5
}

fn default_max_attempts() -> u32 {
    10
}

fn default_cooldown_secs() -> u64 {
    60
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
