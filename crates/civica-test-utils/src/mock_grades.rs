// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock grading-status source for deterministic testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use civica_core::{CivicaError, GradeCheck, GradeSource};

/// A mock grading-status endpoint that returns scripted outcomes.
///
/// Outcomes are popped from a FIFO queue; when the queue is empty, every
/// check reports [`GradeCheck::NotYetGraded`]. A call counter lets tests
/// assert exact attempt accounting.
pub struct MockGradeSource {
    script: Mutex<VecDeque<Result<GradeCheck, CivicaError>>>,
    calls: AtomicUsize,
}

impl MockGradeSource {
    /// Create a new mock source with an empty script (always "not yet graded").
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Queue a "not yet graded" outcome.
    pub async fn push_not_yet_graded(&self) {
        self.script.lock().await.push_back(Ok(GradeCheck::NotYetGraded));
    }

    /// Queue a completed evaluation.
    pub async fn push_graded(&self, score: i64, reason: &str) {
        self.script.lock().await.push_back(Ok(GradeCheck::Graded {
            score,
            reason: reason.to_string(),
        }));
    }

    /// Queue a rate-limit signal.
    pub async fn push_rate_limited(&self) {
        self.script.lock().await.push_back(Ok(GradeCheck::RateLimited));
    }

    /// Queue a transport failure.
    pub async fn push_transport_error(&self) {
        self.script.lock().await.push_back(Err(CivicaError::Transport {
            message: "scripted failure".into(),
            source: None,
        }));
    }

    /// Number of status checks issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockGradeSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GradeSource for MockGradeSource {
    async fn latest_grade(&self) -> Result<GradeCheck, CivicaError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or(Ok(GradeCheck::NotYetGraded))
    }
}
