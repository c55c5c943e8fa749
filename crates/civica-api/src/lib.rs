// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP backend adapter for the Civica chat client.
//!
//! Implements [`civica_core::ChatBackend`] and [`civica_core::GradeSource`]
//! over HTTP against the legal-answer backend.

pub mod client;
pub mod types;

pub use client::ApiClient;
