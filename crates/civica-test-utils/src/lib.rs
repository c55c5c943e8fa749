// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Civica integration tests.
//!
//! Provides mock backend adapters for fast, deterministic, CI-runnable
//! tests without a running legal-answer backend.
//!
//! # Components
//!
//! - [`MockChatBackend`] - scripted chat endpoint
//! - [`MockGradeSource`] - scripted grading-status endpoint with a call counter

pub mod mock_backend;
pub mod mock_grades;

pub use mock_backend::MockChatBackend;
pub use mock_grades::MockGradeSource;
