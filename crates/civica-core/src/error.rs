// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Civica chat client.

use thiserror::Error;

/// The primary error type used across Civica adapter traits and core operations.
#[derive(Debug, Error)]
pub enum CivicaError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Transport-level errors (connection failure, timeout, malformed body).
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The backend answered with a non-success status that is not the
    /// rate-limit signal (429 is reported as a value, not an error).
    #[error("backend returned {status}: {message}")]
    Api { status: u16, message: String },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
