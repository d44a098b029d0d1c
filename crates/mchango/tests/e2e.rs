// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests for the complete Mchango pipeline.
//!
//! Each test wires the real poller, engine, session store, and outbound
//! queue against the mock transport and store. Tests are independent and
//! order-insensitive.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use mchango_core::types::{OutboundMessage, Role, SubjectId};
use mchango_core::PersistenceAdapter;
use mchango_delivery::{OutboundQueue, QueueSettings};
use mchango_engine::{ConversationEngine, FlowLimits, ResponseCache, SessionStore};
use mchango_poller::{NotificationPoller, PollerSettings};
use mchango_test_utils::{MockPersistence, MockTransport};

struct Pipeline {
    poller: NotificationPoller,
    transport: Arc<MockTransport>,
    persistence: Arc<MockPersistence>,
    cancel: CancellationToken,
    handle: tokio::task::JoinHandle<()>,
}

fn queue_settings() -> QueueSettings {
    QueueSettings {
        max_retries: 3,
        inter_message_delay: Duration::from_millis(0),
        call_timeout: Duration::from_secs(5),
    }
}

fn flow_limits() -> FlowLimits {
    FlowLimits {
        min_contribution: 10_000,
        max_contribution: 1_000_000,
        min_members: 2,
        max_members: 50,
    }
}

/// Builds and starts a full pipeline with fast tick intervals.
fn start_pipeline() -> Pipeline {
    let transport = Arc::new(MockTransport::new());
    let persistence = Arc::new(MockPersistence::new());
    let queue = OutboundQueue::new(transport.clone(), 1000, queue_settings());
    let engine = Arc::new(ConversationEngine::new(
        Arc::new(SessionStore::new(Duration::from_secs(1800))),
        Arc::new(ResponseCache::new()),
        persistence.clone(),
        queue,
        flow_limits(),
    ));
    let poller = NotificationPoller::new(
        transport.clone(),
        engine,
        PollerSettings {
            poll_interval: Duration::from_millis(5),
            drain_interval: Duration::from_millis(2),
            start_enabled: true,
        },
    );
    let cancel = CancellationToken::new();
    let handle = poller.run(cancel.clone());
    Pipeline {
        poller,
        transport,
        persistence,
        cancel,
        handle,
    }
}

impl Pipeline {
    /// Injects one inbound message and waits for the reply count to grow.
    async fn exchange(&self, sender: &str, body: &str) -> String {
        let before = self.transport.sent_count().await;
        self.transport.inject_text(sender, body).await;
        for _ in 0..200 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            if self.transport.sent_count().await > before {
                break;
            }
        }
        self.transport
            .sent_bodies()
            .await
            .last()
            .cloned()
            .unwrap_or_default()
    }

    async fn shutdown(self) {
        self.cancel.cancel();
        let _ = self.handle.await;
    }
}

// ---- Scenario 1: three-step registration ----

#[tokio::test]
async fn new_sender_registers_in_three_messages() {
    let p = start_pipeline();
    let phone = "255712345678";

    let reply = p.exchange(phone, "hi").await;
    assert!(reply.contains("Kiongozi"), "expected role prompt, got: {reply}");

    let reply = p.exchange(phone, "1").await;
    assert!(reply.contains("jina"), "expected name prompt, got: {reply}");

    let reply = p.exchange(phone, "Asha Mwinyi").await;
    assert!(reply.contains("Asha Mwinyi"));

    let profile = p
        .persistence
        .find_user_by_phone(&SubjectId::from(phone))
        .await
        .unwrap()
        .expect("profile persisted");
    assert_eq!(profile.role, Role::Leader);
    assert_eq!(profile.name, "Asha Mwinyi");

    // Exactly one reply per inbound message.
    assert_eq!(p.transport.sent_count().await, 3);
    assert_eq!(p.transport.acked().await.len(), 3);

    p.shutdown().await;
}

// ---- Scenario 2: inline contribution happy path ----

#[tokio::test]
async fn registered_member_contributes_inline() {
    let p = start_pipeline();
    let phone = "255712345678";
    p.persistence.seed_user(phone, Role::Member, "Juma").await;

    let reply = p.exchange(phone, "toa 50000").await;
    assert!(reply.contains("50,000"), "expected confirmation, got: {reply}");

    let records = p.persistence.contributions().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].amount, 50_000);
    assert_eq!(records[0].phone, SubjectId::from(phone));

    p.shutdown().await;
}

// ---- Scenario 3: out-of-range amount re-prompts, then recovers ----

#[tokio::test]
async fn out_of_range_contribution_reprompts_without_recording() {
    let p = start_pipeline();
    let phone = "255712345678";
    p.persistence.seed_user(phone, Role::Member, "Juma").await;

    let reply = p.exchange(phone, "toa 500").await;
    assert!(reply.contains("si sahihi"), "expected rejection, got: {reply}");
    assert!(p.persistence.contributions().await.is_empty());

    // The next plain number lands in the waiting amount step.
    let reply = p.exchange(phone, "20000").await;
    assert!(reply.contains("20,000"));
    assert_eq!(p.persistence.contributions().await.len(), 1);

    p.shutdown().await;
}

// ---- Scenario 4: rate limit window under burst load ----

#[tokio::test(start_paused = true)]
async fn burst_of_forty_respects_thirty_per_minute_window() {
    let transport = Arc::new(MockTransport::new());
    // Production-style pacing; paused time auto-advances through it.
    let queue = OutboundQueue::new(
        transport.clone(),
        30,
        QueueSettings {
            max_retries: 3,
            inter_message_delay: Duration::from_millis(1000),
            call_timeout: Duration::from_secs(5),
        },
    );

    let start = tokio::time::Instant::now();
    for i in 0..40 {
        queue
            .enqueue(OutboundMessage::text(
                SubjectId::from("255712345678"),
                format!("ujumbe {i}"),
            ))
            .await;
    }

    // Auto-advancing paused time drives the drain through the window wait.
    while transport.sent_count().await < 40 {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    assert_eq!(transport.sent_count().await, 40);
    // The last ten had to wait for the 60 s window to roll over.
    assert!(
        start.elapsed() >= Duration::from_secs(60),
        "burst finished too fast: {:?}",
        start.elapsed()
    );

    // FIFO order held throughout.
    let bodies = transport.sent_bodies().await;
    let expected: Vec<String> = (0..40).map(|i| format!("ujumbe {i}")).collect();
    assert_eq!(bodies, expected);
}
