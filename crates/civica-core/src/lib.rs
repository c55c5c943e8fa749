// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Civica chat client.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Civica workspace. The HTTP transport and
//! the session core both build on the definitions here.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CivicaError;
pub use types::{ChatReply, CooldownWindow, GradeCheck, GradeStatus, Message, MessageId, Role};

// Re-export backend traits at crate root.
pub use traits::{ChatBackend, GradeSource};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn civica_error_has_all_variants() {
        let _config = CivicaError::Config("test".into());
        let _transport = CivicaError::Transport {
            message: "test".into(),
            source: Some(Box::new(std::io::Error::other("test"))),
        };
        let _api = CivicaError::Api {
            status: 503,
            message: "unavailable".into(),
        };
        let _internal = CivicaError::Internal("test".into());
    }

    #[test]
    fn error_display_includes_status() {
        let err = CivicaError::Api {
            status: 503,
            message: "unavailable".into(),
        };
        assert_eq!(err.to_string(), "backend returned 503: unavailable");
    }

    #[test]
    fn grade_check_distinguishes_rate_limit_from_pending() {
        // 429 must be recognizable as distinct from both "not graded yet"
        // and transport failure.
        assert_ne!(GradeCheck::RateLimited, GradeCheck::NotYetGraded);
        assert_ne!(
            GradeCheck::RateLimited,
            GradeCheck::Graded {
                score: 85,
                reason: String::new()
            }
        );
    }

    #[test]
    fn trait_objects_are_constructible() {
        // Both backend traits must stay object-safe: the session core holds
        // them as Arc<dyn Trait + Send + Sync>.
        fn _assert_chat(_: &dyn ChatBackend) {}
        fn _assert_grades(_: &dyn GradeSource) {}
    }
}
