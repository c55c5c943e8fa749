// SPDX-FileCopyrightText: 2026 Civica Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide rate-limit cooldown shared by every grade poller.
//!
//! A single [`RateLimitCoordinator`] instance is injected into the submitter
//! and every poller -- never a module-level global, so tests can run whole
//! sessions in isolation. Arming is idempotent: concurrent 429s from
//! multiple in-flight pollers neither stack nor extend the window.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use civica_core::CooldownWindow;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::store::MessageStore;

/// Coordinates the shared cooldown window and its one-second ticker.
pub struct RateLimitCoordinator {
    store: Arc<MessageStore>,
    cooldown_secs: u64,
    active: AtomicBool,
    window: watch::Sender<CooldownWindow>,
}

impl RateLimitCoordinator {
    /// Creates an inactive coordinator over the given store.
    ///
    /// The store reference is what lets cooldown expiry flip every
    /// `RateLimited` message to `RetryAvailable` without manual action.
    pub fn new(store: Arc<MessageStore>, cooldown: Duration) -> Arc<Self> {
        let (window, _) = watch::channel(CooldownWindow::inactive());
        Arc::new(Self {
            store,
            cooldown_secs: cooldown.as_secs().max(1),
            active: AtomicBool::new(false),
            window,
        })
    }

    /// Whether a cooldown is currently running. Pollers must call this
    /// before every status fetch; the value is never cached across
    /// iterations.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Current snapshot of the window.
    pub fn window(&self) -> CooldownWindow {
        *self.window.borrow()
    }

    /// Subscribes to per-tick window updates (for banners and tests).
    pub fn subscribe(&self) -> watch::Receiver<CooldownWindow> {
        self.window.subscribe()
    }

    /// Arms the cooldown and starts the shared one-second ticker.
    ///
    /// Idempotent: if a window is already active this is a no-op and the
    /// remaining time continues from wherever it was. The compare-and-set
    /// is the only synchronization the tick task needs -- exactly one task
    /// can win the `false -> true` transition.
    pub fn arm(self: &Arc<Self>) {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("cooldown already armed, ignoring");
            return;
        }

        let remaining = self.cooldown_secs;
        info!(cooldown_secs = remaining, "rate-limit cooldown armed");
        self.window.send_replace(CooldownWindow {
            active: true,
            remaining_secs: remaining,
        });

        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            coordinator.tick_down(remaining).await;
        });
    }

    /// Decrements once per second until the window expires, broadcasting
    /// every tick. On expiry, releases all rate-limited messages.
    async fn tick_down(&self, mut remaining: u64) {
        while remaining > 0 {
            tokio::time::sleep(Duration::from_secs(1)).await;
            remaining -= 1;

            if remaining == 0 {
                // Deactivate before the final broadcast so observers of the
                // zero window never race a still-active flag.
                self.active.store(false, Ordering::SeqCst);
                self.window.send_replace(CooldownWindow::inactive());
                let released = self.store.release_rate_limited().await;
                info!(released, "cooldown expired, rate-limited messages released");
            } else {
                self.window.send_replace(CooldownWindow {
                    active: true,
                    remaining_secs: remaining,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civica_core::GradeStatus;

    #[tokio::test(start_paused = true)]
    async fn arm_activates_and_expiry_deactivates() {
        let store = Arc::new(MessageStore::new());
        let coordinator = RateLimitCoordinator::new(store, Duration::from_secs(60));

        assert!(!coordinator.is_active());
        coordinator.arm();
        assert!(coordinator.is_active());
        assert_eq!(coordinator.window().remaining_secs, 60);

        tokio::time::sleep(Duration::from_secs(61)).await;
        assert!(!coordinator.is_active());
        assert_eq!(coordinator.window(), CooldownWindow::inactive());
    }

    #[tokio::test(start_paused = true)]
    async fn window_snapshot_tracks_countdown_without_subscribers() {
        // The shell's "wait Ns" rejection reads the snapshot directly; it
        // must be right even when no banner task ever subscribed.
        let store = Arc::new(MessageStore::new());
        let coordinator = RateLimitCoordinator::new(store, Duration::from_secs(10));

        coordinator.arm();
        tokio::time::sleep(Duration::from_millis(3_500)).await;

        let window = coordinator.window();
        assert!(window.active);
        assert_eq!(window.remaining_secs, 7);
        assert_eq!(window.active, coordinator.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn window_invariant_remaining_implies_active() {
        let store = Arc::new(MessageStore::new());
        let coordinator = RateLimitCoordinator::new(store, Duration::from_secs(5));
        let mut updates = coordinator.subscribe();

        coordinator.arm();

        // Every broadcast window must satisfy: remaining > 0 => active.
        loop {
            updates.changed().await.unwrap();
            let window = *updates.borrow();
            assert!(window.remaining_secs == 0 || window.active, "got {window:?}");
            if !window.active {
                break;
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn arming_while_active_does_not_extend_the_window() {
        let store = Arc::new(MessageStore::new());
        let coordinator = RateLimitCoordinator::new(store, Duration::from_secs(60));

        coordinator.arm();
        tokio::time::sleep(Duration::from_millis(30_500)).await;
        let before = coordinator.window().remaining_secs;

        // A second and third poller observe 429 mid-window.
        coordinator.arm();
        coordinator.arm();

        let after = coordinator.window().remaining_secs;
        assert_eq!(before, after, "re-arming must not reset the countdown");

        // The window still expires on the original schedule.
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(!coordinator.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_releases_rate_limited_messages_within_one_tick() {
        let store = Arc::new(MessageStore::new());
        let a = store.append_bot("one", None, Some(GradeStatus::RateLimited)).await;
        let b = store.append_bot("two", None, Some(GradeStatus::RateLimited)).await;

        let coordinator = RateLimitCoordinator::new(Arc::clone(&store), Duration::from_secs(3));
        coordinator.arm();

        // Just before expiry nothing has been released.
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(store.grade_of(a).await, Some(GradeStatus::RateLimited));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(store.grade_of(a).await, Some(GradeStatus::RetryAvailable));
        assert_eq!(store.grade_of(b).await, Some(GradeStatus::RetryAvailable));
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_after_expiry_starts_a_fresh_window() {
        let store = Arc::new(MessageStore::new());
        let coordinator = RateLimitCoordinator::new(store, Duration::from_secs(2));

        coordinator.arm();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!coordinator.is_active());

        coordinator.arm();
        assert!(coordinator.is_active());
        assert_eq!(coordinator.window().remaining_secs, 2);
    }
}
