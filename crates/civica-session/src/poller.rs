// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-message grading-status poll loop.
//!
//! One poller is spawned per bot reply (and per retry). The loop owns its
//! attempt counter; the cooldown gate and the message's published status
//! live in shared state. Cancellation is cooperative via
//! [`CancellationToken`], checked at every await point so a superseded
//! loop can never write a stale status.

use std::sync::Arc;
use std::time::Duration;

use civica_config::PollingConfig;
use civica_core::{GradeCheck, GradeSource, GradeStatus, MessageId};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cooldown::RateLimitCoordinator;
use crate::store::MessageStore;

/// Polls the grading endpoint for a single message until a terminal
/// status is reached or the loop is cancelled.
pub struct GradePoller {
    message_id: MessageId,
    store: Arc<MessageStore>,
    grades: Arc<dyn GradeSource + Send + Sync>,
    cooldown: Arc<RateLimitCoordinator>,
    polling: PollingConfig,
}

impl GradePoller {
    pub fn new(
        message_id: MessageId,
        store: Arc<MessageStore>,
        grades: Arc<dyn GradeSource + Send + Sync>,
        cooldown: Arc<RateLimitCoordinator>,
        polling: PollingConfig,
    ) -> Self {
        Self {
            message_id,
            store,
            grades,
            cooldown,
            polling,
        }
    }

    /// Spawns the poll loop as a task. The returned handle is for tests;
    /// the submitter keeps only the cancellation token.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run(cancel).await;
        })
    }

    async fn run(self, cancel: CancellationToken) {
        let id = self.message_id;
        debug!(message_id = %id, "grade poller started");

        // Grace delay before the first check; grading rarely completes
        // faster than this and the first request would be wasted.
        tokio::select! {
            () = cancel.cancelled() => {
                debug!(message_id = %id, "grade poller cancelled before first check");
                return;
            }
            () = tokio::time::sleep(Duration::from_secs(self.polling.initial_delay_secs)) => {}
        }

        let mut attempts: u32 = 0;
        loop {
            // Re-read the shared gate every iteration: a cooldown armed by
            // another poller mid-loop must stop this one too.
            if self.cooldown.is_active() {
                info!(message_id = %id, "cooldown active, parking message");
                self.store.set_grade(id, GradeStatus::RateLimited).await;
                return;
            }

            attempts += 1;
            self.store.set_grade(id, GradeStatus::Checking(attempts)).await;

            let check = tokio::select! {
                () = cancel.cancelled() => {
                    debug!(message_id = %id, "grade poller cancelled mid-check");
                    return;
                }
                check = self.grades.latest_grade() => check,
            };

            match check {
                Ok(GradeCheck::Graded { score, reason }) => {
                    info!(message_id = %id, score, attempts, "grade complete");
                    self.store
                        .set_grade(id, GradeStatus::Complete { score, reason })
                        .await;
                    return;
                }
                Ok(GradeCheck::NotYetGraded) => {
                    if attempts >= self.polling.max_attempts {
                        info!(message_id = %id, attempts, "attempt budget exhausted");
                        self.store.set_grade(id, GradeStatus::TimedOut).await;
                        return;
                    }
                }
                Ok(GradeCheck::RateLimited) => {
                    // Park the message and arm the shared window. The
                    // attempt that hit the limit does not count against the
                    // budget: a retry starts over with a fresh counter.
                    info!(message_id = %id, "rate limited by grading endpoint");
                    self.store.set_grade(id, GradeStatus::RateLimited).await;
                    self.cooldown.arm();
                    return;
                }
                Err(error) => {
                    warn!(message_id = %id, attempts, %error, "grade check failed");
                    if attempts >= self.polling.max_attempts {
                        self.store.set_grade(id, GradeStatus::GaveUp).await;
                        return;
                    }
                }
            }

            tokio::select! {
                () = cancel.cancelled() => {
                    debug!(message_id = %id, "grade poller cancelled between checks");
                    return;
                }
                () = tokio::time::sleep(Duration::from_secs(self.polling.retry_interval_secs)) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civica_test_utils::MockGradeSource;

    fn polling() -> PollingConfig {
        PollingConfig {
            initial_delay_secs: 3,
            retry_interval_secs: 5,
            max_attempts: 10,
            cooldown_secs: 60,
        }
    }

    struct Harness {
        store: Arc<MessageStore>,
        grades: Arc<MockGradeSource>,
        cooldown: Arc<RateLimitCoordinator>,
    }

    impl Harness {
        fn new() -> Self {
            let store = Arc::new(MessageStore::new());
            let cooldown =
                RateLimitCoordinator::new(Arc::clone(&store), Duration::from_secs(60));
            Self {
                store,
                grades: Arc::new(MockGradeSource::new()),
                cooldown,
            }
        }

        async fn spawn_for(&self, cancel: CancellationToken) -> (MessageId, JoinHandle<()>) {
            let id = self
                .store
                .append_bot("reply", None, Some(GradeStatus::Pending))
                .await;
            let poller = GradePoller::new(
                id,
                Arc::clone(&self.store),
                Arc::clone(&self.grades) as Arc<dyn GradeSource + Send + Sync>,
                Arc::clone(&self.cooldown),
                polling(),
            );
            (id, poller.spawn(cancel))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn graded_on_first_check_after_initial_delay() {
        let harness = Harness::new();
        harness.grades.push_graded(85, "well grounded").await;

        let (id, handle) = harness.spawn_for(CancellationToken::new()).await;
        handle.await.unwrap();

        assert_eq!(
            harness.store.grade_of(id).await,
            Some(GradeStatus::Complete {
                score: 85,
                reason: "well grounded".into()
            })
        );
        assert_eq!(harness.grades.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn first_check_waits_out_the_initial_delay() {
        let harness = Harness::new();
        harness.grades.push_graded(90, "ok").await;

        let (id, handle) = harness.spawn_for(CancellationToken::new()).await;

        // No check may be issued before the grace delay elapses. Yield so
        // the spawned task runs up to its first timer.
        tokio::task::yield_now().await;
        assert_eq!(harness.grades.calls(), 0);
        assert_eq!(harness.store.grade_of(id).await, Some(GradeStatus::Pending));

        handle.await.unwrap();
        assert_eq!(harness.grades.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_budget_and_times_out_after_exactly_max_attempts() {
        let harness = Harness::new();
        // Default mock behaviour is NotYetGraded for every call.

        let (id, handle) = harness.spawn_for(CancellationToken::new()).await;
        handle.await.unwrap();

        assert_eq!(harness.grades.calls(), 10);
        assert_eq!(harness.store.grade_of(id).await, Some(GradeStatus::TimedOut));
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_check_parks_message_and_arms_cooldown() {
        let harness = Harness::new();
        harness.grades.push_not_yet_graded().await;
        harness.grades.push_rate_limited().await;

        let (id, handle) = harness.spawn_for(CancellationToken::new()).await;
        handle.await.unwrap();

        assert_eq!(harness.grades.calls(), 2);
        assert_eq!(
            harness.store.grade_of(id).await,
            Some(GradeStatus::RateLimited)
        );
        assert!(harness.cooldown.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn active_cooldown_parks_without_issuing_a_check() {
        let harness = Harness::new();
        harness.cooldown.arm();

        let (id, handle) = harness.spawn_for(CancellationToken::new()).await;
        handle.await.unwrap();

        assert_eq!(harness.grades.calls(), 0);
        assert_eq!(
            harness.store.grade_of(id).await,
            Some(GradeStatus::RateLimited)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn transport_errors_are_retried_then_give_up() {
        let harness = Harness::new();
        for _ in 0..10 {
            harness.grades.push_transport_error().await;
        }

        let (id, handle) = harness.spawn_for(CancellationToken::new()).await;
        handle.await.unwrap();

        assert_eq!(harness.grades.calls(), 10);
        assert_eq!(harness.store.grade_of(id).await, Some(GradeStatus::GaveUp));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_error_then_grade_completes() {
        let harness = Harness::new();
        harness.grades.push_transport_error().await;
        harness.grades.push_graded(70, "partially grounded").await;

        let (id, handle) = harness.spawn_for(CancellationToken::new()).await;
        handle.await.unwrap();

        assert_eq!(
            harness.store.grade_of(id).await,
            Some(GradeStatus::Complete {
                score: 70,
                reason: "partially grounded".into()
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_stops_the_loop_without_a_status_write() {
        let harness = Harness::new();
        let cancel = CancellationToken::new();

        let (id, handle) = harness.spawn_for(cancel.clone()).await;

        // Let a few checks happen, then cancel between checks.
        tokio::time::sleep(Duration::from_secs(14)).await;
        let before = harness.store.grade_of(id).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(harness.store.grade_of(id).await, before);
        assert!(harness.grades.calls() < 10);
    }

    #[tokio::test(start_paused = true)]
    async fn checking_statuses_count_up_from_one() {
        let harness = Harness::new();
        harness.grades.push_not_yet_graded().await;
        harness.grades.push_not_yet_graded().await;
        harness.grades.push_graded(95, "excellent").await;

        let mut events = harness.store.subscribe();
        let (_, handle) = harness.spawn_for(CancellationToken::new()).await;
        handle.await.unwrap();

        let mut seen = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let crate::store::StoreEvent::Patched(message) = event {
                if let Some(GradeStatus::Checking(n)) = message.grade {
                    seen.push(n);
                }
            }
        }
        assert_eq!(seen, vec![1, 2, 3]);
    }
}
