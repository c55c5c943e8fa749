// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./civica.toml` > `~/.config/civica/civica.toml` > `/etc/civica/civica.toml`
//! with environment variable overrides via `CIVICA_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CivicaConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/civica/civica.toml` (system-wide)
/// 3. `~/.config/civica/civica.toml` (user XDG config)
/// 4. `./civica.toml` (local directory)
/// 5. `CIVICA_*` environment variables
pub fn load_config() -> Result<CivicaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CivicaConfig::default()))
        .merge(Toml::file("/etc/civica/civica.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("civica/civica.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("civica.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<CivicaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CivicaConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CivicaConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CivicaConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names. For example, `CIVICA_CLIENT_BACKEND_URL`
/// must map to `client.backend_url`, not `client.backend.url`.
fn env_provider() -> Env {
    Env::prefixed("CIVICA_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: CIVICA_POLLING_MAX_ATTEMPTS -> "polling_max_attempts"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("client_", "client.", 1)
            .replacen("polling_", "polling.", 1)
            .replacen("log_", "log.", 1);
        mapped.into()
    })
}
