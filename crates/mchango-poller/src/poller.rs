// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The notification poller: fetch loop, buffer, and drain loop.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use mchango_core::types::Notification;
use mchango_core::TransportSender;
use mchango_engine::ConversationEngine;

/// Tunables for the poller, from the `[poller]` config section.
#[derive(Debug, Clone)]
pub struct PollerSettings {
    pub poll_interval: Duration,
    pub drain_interval: Duration,
    pub start_enabled: bool,
}

impl PollerSettings {
    pub fn from_config(poller: &mchango_config::model::PollerConfig) -> Self {
        Self {
            poll_interval: Duration::from_millis(poller.poll_interval_ms),
            drain_interval: Duration::from_millis(poller.drain_interval_ms),
            start_enabled: poller.enabled,
        }
    }
}

struct PollerInner {
    transport: Arc<dyn TransportSender>,
    engine: Arc<ConversationEngine>,
    buffer: Mutex<VecDeque<Notification>>,
    /// Operator toggle. Disabled means the fetch loop idles; buffered
    /// notifications still drain.
    enabled: AtomicBool,
    /// Set once on a fatal fetch error; only a restart clears it.
    halted: AtomicBool,
    settings: PollerSettings,
}

/// Polls the gateway for inbound notifications and feeds the engine.
///
/// Cheap to clone; all clones share the same buffer and toggles.
#[derive(Clone)]
pub struct NotificationPoller {
    inner: Arc<PollerInner>,
}

impl NotificationPoller {
    pub fn new(
        transport: Arc<dyn TransportSender>,
        engine: Arc<ConversationEngine>,
        settings: PollerSettings,
    ) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                transport,
                engine,
                buffer: Mutex::new(VecDeque::new()),
                enabled: AtomicBool::new(settings.start_enabled),
                halted: AtomicBool::new(false),
                settings,
            }),
        }
    }

    /// Spawns the fetch and drain loops. Both stop when `cancel` fires.
    pub fn run(&self, cancel: CancellationToken) -> JoinHandle<()> {
        let fetch = self.clone();
        let fetch_cancel = cancel.clone();
        let fetch_handle = tokio::spawn(async move {
            fetch.fetch_loop(fetch_cancel).await;
        });

        let drain = self.clone();
        tokio::spawn(async move {
            let drain_handle = tokio::spawn({
                let drain = drain.clone();
                let cancel = cancel.clone();
                async move {
                    drain.drain_loop(cancel).await;
                }
            });
            let _ = fetch_handle.await;
            let _ = drain_handle.await;
            info!("notification poller stopped");
        })
    }

    /// Enables or disables fetching at runtime. Returns the new state.
    pub fn set_enabled(&self, enabled: bool) -> bool {
        self.inner.enabled.store(enabled, Ordering::SeqCst);
        info!(enabled, "poller toggled");
        enabled
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    /// Whether polling has stopped permanently after a fatal fetch error.
    pub fn is_halted(&self) -> bool {
        self.inner.halted.load(Ordering::SeqCst)
    }

    pub async fn buffered(&self) -> usize {
        self.inner.buffer.lock().await.len()
    }

    async fn fetch_loop(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.inner.settings.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !self.is_enabled() {
                        continue;
                    }
                    if self.fetch_once().await.is_break() {
                        return;
                    }
                }
                _ = cancel.cancelled() => {
                    debug!("fetch loop cancelled");
                    return;
                }
            }
        }
    }

    async fn fetch_once(&self) -> std::ops::ControlFlow<()> {
        match self.inner.transport.fetch_pending_notification().await {
            Ok(Some(notification)) => {
                debug!(
                    sender = %notification.sender,
                    notification_id = notification.id.0.as_str(),
                    "notification fetched"
                );
                let id = notification.id.clone();
                // Buffer first, acknowledge second: losing the ack means a
                // duplicate delivery, never a lost one.
                self.inner.buffer.lock().await.push_back(notification);
                if let Err(err) = self.inner.transport.acknowledge(&id).await {
                    warn!(error = %err, "acknowledge failed, expecting redelivery");
                }
                std::ops::ControlFlow::Continue(())
            }
            // Empty gateway queue is the common case, not an event.
            Ok(None) => std::ops::ControlFlow::Continue(()),
            Err(err) if err.is_fatal_for_polling() => {
                error!(error = %err, "fatal fetch error, polling halted");
                self.inner.halted.store(true, Ordering::SeqCst);
                std::ops::ControlFlow::Break(())
            }
            Err(err) => {
                warn!(error = %err, "transient fetch error");
                std::ops::ControlFlow::Continue(())
            }
        }
    }

    async fn drain_loop(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.inner.settings.drain_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.drain_once().await;
                }
                _ = cancel.cancelled() => {
                    // Flush whatever is buffered before stopping.
                    self.drain_once().await;
                    debug!("drain loop cancelled");
                    return;
                }
            }
        }
    }

    async fn drain_once(&self) {
        let batch: Vec<Notification> = self.inner.buffer.lock().await.drain(..).collect();
        if batch.is_empty() {
            return;
        }
        debug!(count = batch.len(), "draining notification buffer");
        for notification in batch {
            let engine = self.inner.engine.clone();
            // Concurrent across senders; the engine's subject locks keep
            // per-sender ordering.
            tokio::spawn(async move {
                engine.dispatch(&notification).await;
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mchango_core::types::Role;
    use mchango_core::MchangoError;
    use mchango_delivery::{OutboundQueue, QueueSettings};
    use mchango_engine::{ConversationEngine, FlowLimits, ResponseCache, SessionStore};
    use mchango_test_utils::{MockPersistence, MockTransport};

    struct Harness {
        poller: NotificationPoller,
        transport: Arc<MockTransport>,
        persistence: Arc<MockPersistence>,
    }

    fn harness(settings: PollerSettings) -> Harness {
        let transport = Arc::new(MockTransport::new());
        let persistence = Arc::new(MockPersistence::new());
        let queue = OutboundQueue::new(
            transport.clone(),
            1000,
            QueueSettings {
                max_retries: 3,
                inter_message_delay: Duration::from_millis(0),
                call_timeout: Duration::from_secs(5),
            },
        );
        let engine = Arc::new(ConversationEngine::new(
            Arc::new(SessionStore::new(Duration::from_secs(1800))),
            Arc::new(ResponseCache::new()),
            persistence.clone(),
            queue,
            FlowLimits {
                min_contribution: 10_000,
                max_contribution: 1_000_000,
                min_members: 2,
                max_members: 50,
            },
        ));
        let poller = NotificationPoller::new(transport.clone(), engine, settings);
        Harness {
            poller,
            transport,
            persistence,
        }
    }

    fn fast_settings() -> PollerSettings {
        PollerSettings {
            poll_interval: Duration::from_millis(5),
            drain_interval: Duration::from_millis(2),
            start_enabled: true,
        }
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    #[tokio::test]
    async fn fetched_notification_is_acked_and_dispatched() {
        let h = harness(fast_settings());
        h.persistence
            .seed_user("255700000001", Role::Member, "Juma")
            .await;
        h.transport.inject_text("255700000001", "salio").await;

        let cancel = CancellationToken::new();
        let handle = h.poller.run(cancel.clone());
        settle().await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(h.transport.acked().await.len(), 1);
        let bodies = h.transport.sent_bodies().await;
        assert_eq!(bodies.len(), 1);
        assert!(bodies[0].contains("haujajiunga"));
    }

    #[tokio::test]
    async fn transient_fetch_error_keeps_polling() {
        let h = harness(fast_settings());
        h.persistence
            .seed_user("255700000001", Role::Member, "Juma")
            .await;
        h.transport
            .inject_poll_error(MchangoError::transport("gateway 502"))
            .await;
        h.transport.inject_text("255700000001", "salio").await;

        let cancel = CancellationToken::new();
        let handle = h.poller.run(cancel.clone());
        settle().await;
        cancel.cancel();
        handle.await.unwrap();

        assert!(!h.poller.is_halted());
        assert_eq!(h.transport.sent_count().await, 1);
    }

    #[tokio::test]
    async fn auth_error_halts_polling_permanently() {
        let h = harness(fast_settings());
        h.transport
            .inject_poll_error(MchangoError::Auth("token revoked".into()))
            .await;
        // Queued after the fatal error; must never be fetched.
        h.transport.inject_text("255700000001", "salio").await;

        let cancel = CancellationToken::new();
        let handle = h.poller.run(cancel.clone());
        settle().await;

        assert!(h.poller.is_halted());
        assert_eq!(h.transport.acked().await.len(), 0);
        assert_eq!(h.transport.sent_count().await, 0);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn disabled_poller_fetches_nothing_until_reenabled() {
        let mut settings = fast_settings();
        settings.start_enabled = false;
        let h = harness(settings);
        h.persistence
            .seed_user("255700000001", Role::Member, "Juma")
            .await;
        h.transport.inject_text("255700000001", "salio").await;

        let cancel = CancellationToken::new();
        let handle = h.poller.run(cancel.clone());
        settle().await;
        assert_eq!(h.transport.acked().await.len(), 0);

        h.poller.set_enabled(true);
        settle().await;
        assert_eq!(h.transport.acked().await.len(), 1);

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn multiple_senders_are_all_dispatched() {
        let h = harness(fast_settings());
        for i in 1..=3 {
            let phone = format!("25570000000{i}");
            h.persistence.seed_user(&phone, Role::Member, "Mtu").await;
            h.transport.inject_text(&phone, "salio").await;
        }

        let cancel = CancellationToken::new();
        let handle = h.poller.run(cancel.clone());
        settle().await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(h.transport.acked().await.len(), 3);
        assert_eq!(h.transport.sent_count().await, 3);
    }
}
