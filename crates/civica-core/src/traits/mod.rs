// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Backend trait definitions for the Civica chat client.
//!
//! The session core depends only on these traits, so the HTTP transport in
//! `civica-api` can be swapped for mocks in tests. All traits use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod chat;
pub mod grade;

// Re-export all traits at the traits module level for convenience.
pub use chat::ChatBackend;
pub use grade::GradeSource;
