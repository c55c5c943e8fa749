// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Insertion-ordered message store with subscribe/publish change events.
//!
//! The store is the single source of truth for what is rendered: the
//! submitter and every grade poller write to it, renderers subscribe to it.
//! Messages are mutated in place -- identity is preserved so UI keys stay
//! stable -- and never deleted during a session.

use std::sync::atomic::{AtomicU64, Ordering};

use civica_core::{GradeStatus, Message, MessageId, Role};
use tokio::sync::{Mutex, broadcast};
use tracing::debug;

/// Capacity of the change-event channel. Slow subscribers that fall more
/// than this far behind see a `Lagged` error and resync via `snapshot`.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// A change published by the store.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    /// A message was appended; carries the new message.
    Appended(Message),
    /// A message was patched in place; carries the updated message.
    Patched(Message),
}

/// Shallow patch applied to an existing message. `None` fields are left
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct MessagePatch {
    pub text: Option<String>,
    pub translated_query: Option<String>,
    pub grade: Option<GradeStatus>,
}

/// Ordered, mutable collection of chat messages.
pub struct MessageStore {
    messages: Mutex<Vec<Message>>,
    next_id: AtomicU64,
    events: broadcast::Sender<StoreEvent>,
}

impl MessageStore {
    /// Creates an empty store. Ids start at 1 and are assigned monotonically.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            messages: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            events,
        }
    }

    /// Appends a user message. User messages never carry a grade.
    pub async fn append_user(&self, text: &str) -> MessageId {
        self.append(Role::User, text, None, None).await
    }

    /// Appends a bot message. `grade` is `None` for bot messages that will
    /// never be polled (failed chat exchanges).
    pub async fn append_bot(
        &self,
        text: &str,
        translated_query: Option<String>,
        grade: Option<GradeStatus>,
    ) -> MessageId {
        self.append(Role::Bot, text, translated_query, grade).await
    }

    async fn append(
        &self,
        role: Role,
        text: &str,
        translated_query: Option<String>,
        grade: Option<GradeStatus>,
    ) -> MessageId {
        let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let message = Message {
            id,
            role,
            text: text.to_string(),
            translated_query,
            grade,
            created_at: chrono::Utc::now().to_rfc3339(),
        };
        self.messages.lock().await.push(message.clone());
        let _ = self.events.send(StoreEvent::Appended(message));
        id
    }

    /// Applies a shallow patch to the message with the given id, preserving
    /// order and identity. Unknown ids are a no-op (the message may have
    /// been handled by a feature outside this core), returning `false`.
    pub async fn patch(&self, id: MessageId, patch: MessagePatch) -> bool {
        let mut messages = self.messages.lock().await;
        let Some(message) = messages.iter_mut().find(|m| m.id == id) else {
            debug!(message_id = %id, "patch on unknown message id ignored");
            return false;
        };

        if let Some(text) = patch.text {
            message.text = text;
        }
        if let Some(translated_query) = patch.translated_query {
            message.translated_query = Some(translated_query);
        }
        if let Some(grade) = patch.grade {
            message.grade = Some(grade);
        }

        let updated = message.clone();
        drop(messages);
        let _ = self.events.send(StoreEvent::Patched(updated));
        true
    }

    /// Convenience for the common patch: replace a message's grade status.
    pub async fn set_grade(&self, id: MessageId, grade: GradeStatus) -> bool {
        self.patch(
            id,
            MessagePatch {
                grade: Some(grade),
                ..MessagePatch::default()
            },
        )
        .await
    }

    /// Returns a clone of the message with the given id, if present.
    pub async fn message(&self, id: MessageId) -> Option<Message> {
        self.messages.lock().await.iter().find(|m| m.id == id).cloned()
    }

    /// Current grade status of a message, if it carries one.
    pub async fn grade_of(&self, id: MessageId) -> Option<GradeStatus> {
        self.messages
            .lock()
            .await
            .iter()
            .find(|m| m.id == id)
            .and_then(|m| m.grade.clone())
    }

    /// Read-only snapshot for rendering, in insertion order.
    pub async fn snapshot(&self) -> Vec<Message> {
        self.messages.lock().await.clone()
    }

    /// Subscribes to change events.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Flips every message currently in `RateLimited` to `RetryAvailable`.
    ///
    /// Called by the cooldown coordinator when the shared window expires, so
    /// no message stays stuck behind a cooldown that already cleared.
    /// Returns how many messages were released.
    pub async fn release_rate_limited(&self) -> usize {
        let mut released = Vec::new();
        {
            let mut messages = self.messages.lock().await;
            for message in messages.iter_mut() {
                if message.grade == Some(GradeStatus::RateLimited) {
                    message.grade = Some(GradeStatus::RetryAvailable);
                    released.push(message.clone());
                }
            }
        }
        let count = released.len();
        for message in released {
            let _ = self.events.send(StoreEvent::Patched(message));
        }
        count
    }
}

impl Default for MessageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ids_are_monotonic_and_order_is_preserved() {
        let store = MessageStore::new();
        let a = store.append_user("first").await;
        let b = store.append_bot("second", None, Some(GradeStatus::Pending)).await;
        let c = store.append_user("third").await;

        assert!(a < b && b < c);

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].id, a);
        assert_eq!(snapshot[1].id, b);
        assert_eq!(snapshot[2].id, c);
    }

    #[tokio::test]
    async fn user_messages_never_carry_a_grade() {
        let store = MessageStore::new();
        let id = store.append_user("hello").await;
        assert!(store.message(id).await.unwrap().grade.is_none());
    }

    #[tokio::test]
    async fn patch_preserves_untouched_fields() {
        let store = MessageStore::new();
        let id = store
            .append_bot("answer", Some("normalized query".into()), Some(GradeStatus::Pending))
            .await;

        store.set_grade(id, GradeStatus::Checking(1)).await;

        let message = store.message(id).await.unwrap();
        assert_eq!(message.text, "answer");
        assert_eq!(message.translated_query.as_deref(), Some("normalized query"));
        assert_eq!(message.grade, Some(GradeStatus::Checking(1)));
    }

    #[tokio::test]
    async fn patch_unknown_id_is_a_no_op() {
        let store = MessageStore::new();
        store.append_user("only message").await;
        assert!(!store.set_grade(MessageId(99), GradeStatus::TimedOut).await);
        assert_eq!(store.snapshot().await.len(), 1);
    }

    #[tokio::test]
    async fn subscribers_observe_appends_and_patches() {
        let store = MessageStore::new();
        let mut events = store.subscribe();

        let id = store.append_bot("answer", None, Some(GradeStatus::Pending)).await;
        store.set_grade(id, GradeStatus::Checking(1)).await;

        match events.recv().await.unwrap() {
            StoreEvent::Appended(m) => assert_eq!(m.id, id),
            other => panic!("expected append event, got {other:?}"),
        }
        match events.recv().await.unwrap() {
            StoreEvent::Patched(m) => assert_eq!(m.grade, Some(GradeStatus::Checking(1))),
            other => panic!("expected patch event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn release_rate_limited_flips_only_rate_limited_messages() {
        let store = MessageStore::new();
        let a = store.append_bot("one", None, Some(GradeStatus::RateLimited)).await;
        let b = store.append_bot("two", None, Some(GradeStatus::Checking(4))).await;
        let c = store.append_bot("three", None, Some(GradeStatus::RateLimited)).await;
        let d = store
            .append_bot(
                "four",
                None,
                Some(GradeStatus::Complete {
                    score: 80,
                    reason: "fine".into(),
                }),
            )
            .await;

        assert_eq!(store.release_rate_limited().await, 2);

        assert_eq!(store.grade_of(a).await, Some(GradeStatus::RetryAvailable));
        assert_eq!(store.grade_of(b).await, Some(GradeStatus::Checking(4)));
        assert_eq!(store.grade_of(c).await, Some(GradeStatus::RetryAvailable));
        assert_eq!(
            store.grade_of(d).await,
            Some(GradeStatus::Complete {
                score: 80,
                reason: "fine".into()
            })
        );
    }
}
