// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message submission, gating, and poller lifecycle.
//!
//! The submitter is the single writer of new messages: it enforces the
//! one-exchange-at-a-time and cooldown gates, appends both sides of the
//! exchange to the store and owns the cancellation token of every live
//! poll loop. Tokens are keyed by message id so a retry can cancel the
//! loop it supersedes before spawning its replacement.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use civica_config::PollingConfig;
use civica_core::{ChatBackend, GradeSource, GradeStatus, MessageId};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cooldown::RateLimitCoordinator;
use crate::poller::GradePoller;
use crate::store::MessageStore;

/// Text shown in place of a reply when the chat request fails. The raw
/// error goes to the log, never to the transcript.
pub const GENERIC_ERROR_TEXT: &str =
    "Sorry, I ran into a problem answering that. Please try again.";

/// Result of a [`Submitter::send`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The exchange completed; a grade poller is running for `bot`.
    Delivered { user: MessageId, bot: MessageId },
    /// The chat request failed; `bot` carries the generic error text and
    /// is never polled.
    Failed { user: MessageId, bot: MessageId },
    /// Another exchange is still in flight; nothing was appended.
    RejectedInFlight,
    /// The rate-limit cooldown is active; nothing was appended.
    RejectedCooldown,
    /// The input was empty or whitespace; nothing was appended.
    RejectedEmpty,
}

/// Result of a [`Submitter::retry_grade`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// A fresh poll loop was started with a reset attempt counter.
    Started,
    /// The cooldown window has not expired yet.
    CooldownActive,
    /// The message's current status does not accept a retry.
    NotRetryable,
    /// No message with that id exists.
    UnknownMessage,
}

/// Serializes chat exchanges and manages grade pollers.
pub struct Submitter {
    store: Arc<MessageStore>,
    backend: Arc<dyn ChatBackend + Send + Sync>,
    grades: Arc<dyn GradeSource + Send + Sync>,
    cooldown: Arc<RateLimitCoordinator>,
    polling: PollingConfig,
    language: Mutex<String>,
    in_flight: AtomicBool,
    pollers: Mutex<HashMap<MessageId, CancellationToken>>,
}

impl Submitter {
    pub fn new(
        store: Arc<MessageStore>,
        backend: Arc<dyn ChatBackend + Send + Sync>,
        grades: Arc<dyn GradeSource + Send + Sync>,
        cooldown: Arc<RateLimitCoordinator>,
        polling: PollingConfig,
        language: String,
    ) -> Self {
        Self {
            store,
            backend,
            grades,
            cooldown,
            polling,
            language: Mutex::new(language),
            in_flight: AtomicBool::new(false),
            pollers: Mutex::new(HashMap::new()),
        }
    }

    /// Sends a chat message through the backend.
    ///
    /// At most one exchange is in flight at a time; the gate is taken with
    /// a compare-and-set so concurrent callers cannot interleave. The gate
    /// is released before this returns, on every path.
    pub async fn send(&self, input: &str) -> SendOutcome {
        let text = input.trim();
        if text.is_empty() {
            return SendOutcome::RejectedEmpty;
        }
        if self.cooldown.is_active() {
            debug!("send rejected, cooldown active");
            return SendOutcome::RejectedCooldown;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("send rejected, exchange already in flight");
            return SendOutcome::RejectedInFlight;
        }

        let outcome = self.exchange(text).await;
        self.in_flight.store(false, Ordering::SeqCst);
        outcome
    }

    async fn exchange(&self, text: &str) -> SendOutcome {
        let user = self.store.append_user(text).await;
        let language = self.language.lock().await.clone();

        match self.backend.send_chat(text, &language).await {
            Ok(reply) => {
                let bot = self
                    .store
                    .append_bot(&reply.text, reply.translated_query, Some(GradeStatus::Pending))
                    .await;
                self.spawn_poller(bot).await;
                info!(user_id = %user, bot_id = %bot, "exchange delivered");
                SendOutcome::Delivered { user, bot }
            }
            Err(error) => {
                warn!(user_id = %user, %error, "chat request failed");
                let bot = self.store.append_bot(GENERIC_ERROR_TEXT, None, None).await;
                SendOutcome::Failed { user, bot }
            }
        }
    }

    /// Restarts grading for a parked or exhausted message.
    ///
    /// The attempt counter starts over from zero and any loop still
    /// registered for the message is cancelled first.
    pub async fn retry_grade(&self, id: MessageId) -> RetryOutcome {
        if self.cooldown.is_active() {
            return RetryOutcome::CooldownActive;
        }
        let Some(grade) = self.store.grade_of(id).await else {
            return RetryOutcome::UnknownMessage;
        };
        if !grade.retry_allowed() {
            debug!(message_id = %id, status = %grade, "retry refused");
            return RetryOutcome::NotRetryable;
        }

        self.store.set_grade(id, GradeStatus::Pending).await;
        self.spawn_poller(id).await;
        info!(message_id = %id, "grade retry started");
        RetryOutcome::Started
    }

    /// Spawns a poll loop for the message, cancelling any predecessor
    /// registered under the same id.
    async fn spawn_poller(&self, id: MessageId) {
        let cancel = CancellationToken::new();
        {
            let mut pollers = self.pollers.lock().await;
            if let Some(stale) = pollers.insert(id, cancel.clone()) {
                debug!(message_id = %id, "cancelling superseded poll loop");
                stale.cancel();
            }
        }

        let poller = GradePoller::new(
            id,
            Arc::clone(&self.store),
            Arc::clone(&self.grades),
            Arc::clone(&self.cooldown),
            self.polling.clone(),
        );
        poller.spawn(cancel);
    }

    /// Replaces the language forwarded with every chat request.
    pub async fn set_language(&self, language: &str) {
        let mut current = self.language.lock().await;
        info!(from = %current, to = language, "response language changed");
        *current = language.to_string();
    }

    pub async fn language(&self) -> String {
        self.language.lock().await.clone()
    }

    /// Cancels every live poll loop. Called on session shutdown.
    pub async fn shutdown(&self) {
        let pollers = self.pollers.lock().await;
        for token in pollers.values() {
            token.cancel();
        }
        debug!(count = pollers.len(), "all poll loops cancelled");
    }
}
