// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the legal-answer backend.
//!
//! Provides [`ApiClient`] which speaks the two wire contracts the session
//! core depends on: chat submission (`POST /chat`) and the grading-status
//! query (`GET /logs`). Retry policy deliberately lives in the session's
//! poller, not here: the poller's attempt budget must account for every
//! request actually issued.

use std::time::Duration;

use async_trait::async_trait;
use civica_config::model::ClientConfig;
use civica_core::{ChatBackend, ChatReply, CivicaError, GradeCheck, GradeSource};
use reqwest::StatusCode;
use tracing::debug;

use crate::types::{ChatRequest, ChatResponse, LogsResponse};

/// HTTP client for backend communication.
///
/// Holds a pooled `reqwest::Client` with a per-request timeout; cloning is
/// cheap and shares the pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a new backend client from the `[client]` config section.
    pub fn new(config: &ClientConfig) -> Result<Self, CivicaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| CivicaError::Transport {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
        })
    }

    /// Overrides the base URL (for testing with wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url.trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn send_chat(&self, message: &str, language: &str) -> Result<ChatReply, CivicaError> {
        let request = ChatRequest { message, language };

        let response = self
            .client
            .post(self.endpoint("chat"))
            .json(&request)
            .send()
            .await
            .map_err(|e| CivicaError::Transport {
                message: format!("chat request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "chat response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CivicaError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: ChatResponse = response.json().await.map_err(|e| CivicaError::Transport {
            message: format!("failed to parse chat response: {e}"),
            source: Some(Box::new(e)),
        })?;

        Ok(ChatReply {
            text: body.response,
            translated_query: body.debug_info.and_then(|d| d.translated_query),
        })
    }
}

#[async_trait]
impl GradeSource for ApiClient {
    async fn latest_grade(&self) -> Result<GradeCheck, CivicaError> {
        let response = self
            .client
            .get(self.endpoint("logs"))
            .send()
            .await
            .map_err(|e| CivicaError::Transport {
                message: format!("grading-status request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "grading-status response received");

        // 429 is an expected signal, not a fault: the caller arms the shared
        // cooldown instead of burning a retry on it.
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(GradeCheck::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CivicaError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: LogsResponse = response.json().await.map_err(|e| CivicaError::Transport {
            message: format!("failed to parse logs response: {e}"),
            source: Some(Box::new(e)),
        })?;

        Ok(body.latest_check())
    }
}
