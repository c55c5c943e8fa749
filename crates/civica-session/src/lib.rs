// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session runtime: message store, rate-limit cooldown, grade pollers and
//! the submitter that ties them together.
//!
//! [`ChatSession`] is the facade the binary uses; the individual pieces
//! are public so tests and alternative frontends can wire them directly.

pub mod cooldown;
pub mod poller;
pub mod store;
pub mod submit;

use std::sync::Arc;
use std::time::Duration;

use civica_config::CivicaConfig;
use civica_core::{ChatBackend, CooldownWindow, GradeSource};
use tokio::sync::watch;

pub use cooldown::RateLimitCoordinator;
pub use poller::GradePoller;
pub use store::{MessagePatch, MessageStore, StoreEvent};
pub use submit::{GENERIC_ERROR_TEXT, RetryOutcome, SendOutcome, Submitter};

/// One interactive chat session: a store, a shared cooldown and a
/// submitter wired over the given backend and grade source.
pub struct ChatSession {
    store: Arc<MessageStore>,
    cooldown: Arc<RateLimitCoordinator>,
    submitter: Submitter,
}

impl ChatSession {
    pub fn new(
        config: &CivicaConfig,
        backend: Arc<dyn ChatBackend + Send + Sync>,
        grades: Arc<dyn GradeSource + Send + Sync>,
    ) -> Self {
        let store = Arc::new(MessageStore::new());
        let cooldown = RateLimitCoordinator::new(
            Arc::clone(&store),
            Duration::from_secs(config.polling.cooldown_secs),
        );
        let submitter = Submitter::new(
            Arc::clone(&store),
            backend,
            grades,
            Arc::clone(&cooldown),
            config.polling.clone(),
            config.client.language.clone(),
        );
        Self {
            store,
            cooldown,
            submitter,
        }
    }

    pub fn store(&self) -> &Arc<MessageStore> {
        &self.store
    }

    pub fn submitter(&self) -> &Submitter {
        &self.submitter
    }

    /// Snapshot of the cooldown window, for prompts and banners.
    pub fn cooldown_window(&self) -> CooldownWindow {
        self.cooldown.window()
    }

    /// Per-tick cooldown updates.
    pub fn cooldown_updates(&self) -> watch::Receiver<CooldownWindow> {
        self.cooldown.subscribe()
    }

    /// Cancels all background poll loops.
    pub async fn shutdown(&self) {
        self.submitter.shutdown().await;
    }
}
