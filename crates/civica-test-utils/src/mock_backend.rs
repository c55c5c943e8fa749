// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat backend for deterministic testing.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use civica_core::{ChatBackend, ChatReply, CivicaError};

/// A mock chat endpoint that returns scripted replies.
///
/// Outcomes are popped from a FIFO queue. When the queue is empty, a
/// default "mock reply" is returned.
pub struct MockChatBackend {
    script: Mutex<VecDeque<Result<ChatReply, CivicaError>>>,
}

impl MockChatBackend {
    /// Create a new mock backend with an empty script.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue a successful reply.
    pub async fn push_reply(&self, text: &str, translated_query: Option<&str>) {
        self.script.lock().await.push_back(Ok(ChatReply {
            text: text.to_string(),
            translated_query: translated_query.map(String::from),
        }));
    }

    /// Queue a transport failure.
    pub async fn push_failure(&self) {
        self.script.lock().await.push_back(Err(CivicaError::Transport {
            message: "scripted failure".into(),
            source: None,
        }));
    }
}

impl Default for MockChatBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatBackend for MockChatBackend {
    async fn send_chat(&self, _message: &str, _language: &str) -> Result<ChatReply, CivicaError> {
        self.script.lock().await.pop_front().unwrap_or_else(|| {
            Ok(ChatReply {
                text: "mock reply".to_string(),
                translated_query: None,
            })
        })
    }
}
