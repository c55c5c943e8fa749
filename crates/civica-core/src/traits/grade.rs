// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Grading-status trait for the evaluation pipeline.

use async_trait::async_trait;

use crate::error::CivicaError;
use crate::types::GradeCheck;

/// Source of grading status for the most recent bot answer.
///
/// The query carries no per-message filter: the backend exposes an ordered
/// list of recent evaluation records, most-recent first, and the check
/// inspects the front of that list.
///
/// A rate-limit response is an expected value ([`GradeCheck::RateLimited`]),
/// not an error; `Err` is reserved for transport and protocol failures.
#[async_trait]
pub trait GradeSource {
    /// Fetches the grading status of the most recent evaluation record.
    async fn latest_grade(&self) -> Result<GradeCheck, CivicaError>;
}
