// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Civica workspace.

use serde::{Deserialize, Serialize};

/// Unique identifier for a chat message.
///
/// Ids are assigned monotonically by the message store and are stable for
/// the lifetime of a session, so renderers can key on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Bot => write!(f, "bot"),
        }
    }
}

/// Grading lifecycle of a single bot message.
///
/// `Complete` carries the score and reason so that "score and reason are
/// present if and only if grading completed" holds by construction.
/// `TimedOut`, `GaveUp`, and `Complete` are terminal: no further automatic
/// polling happens after them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum GradeStatus {
    /// Created, first check not yet issued.
    Pending,
    /// The nth status check is in flight (1-indexed).
    Checking(u32),
    /// Grading finished; the evaluation pipeline produced a score.
    Complete { score: i64, reason: String },
    /// The grading endpoint signalled overload; polling is suspended until
    /// the shared cooldown clears.
    RateLimited,
    /// The cooldown expired while this message was rate-limited; a manual
    /// retry will start a fresh attempt budget.
    RetryAvailable,
    /// The attempt budget was exhausted without a graded result.
    TimedOut,
    /// Transport errors exhausted the attempt budget.
    GaveUp,
}

impl GradeStatus {
    /// True for statuses after which no automatic polling ever happens.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            GradeStatus::Complete { .. } | GradeStatus::TimedOut | GradeStatus::GaveUp
        )
    }

    /// True if a user-initiated retry is accepted from this status.
    pub fn retry_allowed(&self) -> bool {
        matches!(
            self,
            GradeStatus::RetryAvailable | GradeStatus::TimedOut | GradeStatus::GaveUp
        )
    }
}

impl std::fmt::Display for GradeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GradeStatus::Pending => write!(f, "pending"),
            GradeStatus::Checking(n) => write!(f, "checking (attempt {n})"),
            GradeStatus::Complete { score, .. } => write!(f, "graded ({score})"),
            GradeStatus::RateLimited => write!(f, "rate limited"),
            GradeStatus::RetryAvailable => write!(f, "retry available"),
            GradeStatus::TimedOut => write!(f, "timed out"),
            GradeStatus::GaveUp => write!(f, "gave up"),
        }
    }
}

/// A single chat message as held by the store and seen by renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub text: String,
    /// The normalized form of the user query the backend actually used for
    /// the legal lookup, when it differs from the raw input.
    pub translated_query: Option<String>,
    /// Grading lifecycle. `None` for user messages and for bot messages
    /// appended after a failed chat exchange (grading is meaningless there).
    pub grade: Option<GradeStatus>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
}

/// Outcome of one grading-status check against the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GradeCheck {
    /// The most recent evaluation record is complete.
    Graded { score: i64, reason: String },
    /// Valid response, no completed evaluation yet.
    NotYetGraded,
    /// The endpoint answered with the rate-limit signal (HTTP 429).
    RateLimited,
}

/// A successful reply from the chat endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    /// The bot's answer text.
    pub text: String,
    /// Normalized query used internally, surfaced for transparency.
    pub translated_query: Option<String>,
}

/// Snapshot of the process-wide rate-limit cooldown.
///
/// Invariant: `remaining_secs > 0` implies `active`; reaching zero forces
/// `active = false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownWindow {
    pub active: bool,
    pub remaining_secs: u64,
}

impl CooldownWindow {
    /// The inactive window every session starts with.
    pub fn inactive() -> Self {
        Self {
            active: false,
            remaining_secs: 0,
        }
    }
}

impl Default for CooldownWindow {
    fn default() -> Self {
        Self::inactive()
    }
}
