// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat submission trait for the legal-answer backend.

use async_trait::async_trait;

use crate::error::CivicaError;
use crate::types::ChatReply;

/// Backend that answers a user's legal question.
///
/// The request carries the raw user text and a language selector; the reply
/// carries the answer text and, optionally, the normalized query the backend
/// used internally for the legal lookup.
#[async_trait]
pub trait ChatBackend {
    /// Submits a question and returns the bot's reply.
    async fn send_chat(&self, message: &str, language: &str) -> Result<ChatReply, CivicaError>;
}
