// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered, retrying buffer of messages awaiting delivery.
//!
//! A single drain loop processes messages strictly in FIFO order, gated by
//! the [`RateLimiter`] and paced by a fixed inter-message delay. Failed
//! sends are requeued at the **head** (retried messages take priority over
//! newer ones) until `max_retries` is exhausted, at which point a terminal
//! failed [`DeliveryOutcome`] is recorded.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use mchango_core::types::{
    DeliveryOutcome, DeliveryReceipt, DeliveryStatus, MessageKind, OutboundMessage, QueueStatus,
};
use mchango_core::{MchangoError, TransportSender};

use crate::limiter::RateLimiter;

/// Tunables for the outbound queue, taken from `[queue]` and `[transport]`
/// config sections.
#[derive(Debug, Clone)]
pub struct QueueSettings {
    pub max_retries: u32,
    pub inter_message_delay: Duration,
    pub call_timeout: Duration,
}

impl QueueSettings {
    pub fn from_config(
        queue: &mchango_config::model::QueueConfig,
        transport: &mchango_config::model::TransportConfig,
    ) -> Self {
        Self {
            max_retries: queue.max_retries,
            inter_message_delay: Duration::from_millis(queue.inter_message_delay_ms),
            call_timeout: Duration::from_secs(transport.call_timeout_secs),
        }
    }
}

struct QueueInner {
    pending: Mutex<VecDeque<OutboundMessage>>,
    /// Guard ensuring at most one drain loop runs at a time.
    is_processing: AtomicBool,
    limiter: RateLimiter,
    transport: Arc<dyn TransportSender>,
    settings: QueueSettings,
    /// Terminal delivery records awaiting collection by the caller.
    outcomes: Mutex<Vec<DeliveryOutcome>>,
}

/// The outbound message queue.
///
/// Cheap to clone; all clones share the same queue and drain state.
#[derive(Clone)]
pub struct OutboundQueue {
    inner: Arc<QueueInner>,
}

impl OutboundQueue {
    pub fn new(
        transport: Arc<dyn TransportSender>,
        per_minute_limit: u32,
        settings: QueueSettings,
    ) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                pending: Mutex::new(VecDeque::new()),
                is_processing: AtomicBool::new(false),
                limiter: RateLimiter::new(per_minute_limit),
                transport,
                settings,
                outcomes: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Appends a message to the tail of the queue and arms the drain loop
    /// if it is not already running.
    pub async fn enqueue(&self, msg: OutboundMessage) {
        debug!(
            message_id = msg.id.as_str(),
            recipient = %msg.recipient,
            "message enqueued"
        );
        self.inner.pending.lock().await.push_back(msg);
        self.arm_drain();
    }

    /// Starts the drain loop unless one is already active.
    ///
    /// Idempotent: invoking this while draining is a no-op.
    pub fn arm_drain(&self) {
        if self
            .inner
            .is_processing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            let inner = self.inner.clone();
            tokio::spawn(async move {
                drain(inner).await;
            });
        }
    }

    /// Current queue state in the operator shape.
    pub async fn status(&self) -> QueueStatus {
        QueueStatus {
            queue_length: self.inner.pending.lock().await.len(),
            is_processing: self.inner.is_processing.load(Ordering::Acquire),
            rate_limit_counter: self.inner.limiter.counter(),
            rate_limit_reset_time: self.inner.limiter.reset_time(),
        }
    }

    /// Discards all pending messages. Returns how many were dropped.
    pub async fn clear(&self) -> usize {
        let mut pending = self.inner.pending.lock().await;
        let dropped = pending.len();
        pending.clear();
        if dropped > 0 {
            warn!(dropped, "outbound queue cleared by operator");
        }
        dropped
    }

    /// Takes all terminal delivery outcomes recorded since the last call.
    pub async fn take_outcomes(&self) -> Vec<DeliveryOutcome> {
        std::mem::take(&mut *self.inner.outcomes.lock().await)
    }

    /// Hands terminal delivery outcomes to `record` on an interval until
    /// cancelled, with a final flush on shutdown.
    ///
    /// Without a running recorder the outcome buffer only grows; long-lived
    /// processes must keep one alive for the life of the queue.
    pub fn run_outcome_recorder<F>(
        &self,
        interval: Duration,
        cancel: CancellationToken,
        record: F,
    ) -> tokio::task::JoinHandle<()>
    where
        F: Fn(&DeliveryOutcome) + Send + Sync + 'static,
    {
        let queue = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        for outcome in queue.take_outcomes().await {
                            record(&outcome);
                        }
                    }
                    _ = cancel.cancelled() => {
                        for outcome in queue.take_outcomes().await {
                            record(&outcome);
                        }
                        debug!("outcome recorder stopped");
                        return;
                    }
                }
            }
        })
    }
}

/// The single active drain loop.
///
/// Exits when the queue is empty; the next `enqueue` re-arms it. The
/// `is_processing` flag is released before the final empty re-check so a
/// concurrent enqueue cannot be stranded.
async fn drain(inner: Arc<QueueInner>) {
    loop {
        let msg = inner.pending.lock().await.pop_front();
        let Some(mut msg) = msg else {
            inner.is_processing.store(false, Ordering::Release);
            // An enqueue may have landed between the pop and the release.
            // If so, try to retake the drain; another arm may win, which
            // is equally fine.
            let empty = inner.pending.lock().await.is_empty();
            if !empty
                && inner
                    .is_processing
                    .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
            {
                continue;
            }
            return;
        };

        if !inner.limiter.try_acquire() {
            // Rate budget exhausted: keep the same message at the head and
            // pause before retrying, preserving global order.
            debug!(
                message_id = msg.id.as_str(),
                "rate limit reached, pausing drain"
            );
            inner.pending.lock().await.push_front(msg);
            tokio::time::sleep(inner.settings.inter_message_delay).await;
            continue;
        }

        match send_with_timeout(&inner, &msg).await {
            Ok(receipt) => {
                info!(
                    message_id = msg.id.as_str(),
                    recipient = %msg.recipient,
                    receipt = receipt.0.as_str(),
                    attempts = msg.retry_count + 1,
                    "message delivered"
                );
                record_outcome(&inner, &msg, DeliveryStatus::Sent).await;
                // Pace the next send even when under the rate budget.
                tokio::time::sleep(inner.settings.inter_message_delay).await;
            }
            Err(e) => {
                if msg.retry_count < inner.settings.max_retries {
                    msg.retry_count += 1;
                    msg.enqueued_at = Utc::now();
                    warn!(
                        message_id = msg.id.as_str(),
                        retry_count = msg.retry_count,
                        error = %e,
                        "send failed, requeuing at head"
                    );
                    inner.pending.lock().await.push_front(msg);
                } else {
                    warn!(
                        message_id = msg.id.as_str(),
                        recipient = %msg.recipient,
                        error = %e,
                        "retries exhausted, recording terminal failure"
                    );
                    record_outcome(&inner, &msg, DeliveryStatus::Failed).await;
                }
                tokio::time::sleep(inner.settings.inter_message_delay).await;
            }
        }
    }
}

/// Dispatches one message to the transport with a bounded per-call timeout.
///
/// A call that never returns is treated as a transport failure after the
/// timeout elapses.
async fn send_with_timeout(
    inner: &QueueInner,
    msg: &OutboundMessage,
) -> Result<DeliveryReceipt, MchangoError> {
    let call = async {
        match &msg.kind {
            MessageKind::Text => inner.transport.send_text(&msg.recipient, &msg.body).await,
            MessageKind::Media { url, media_type } => {
                inner
                    .transport
                    .send_media(&msg.recipient, url, &msg.body, media_type)
                    .await
            }
            MessageKind::Buttons(buttons) => {
                inner
                    .transport
                    .send_buttons(&msg.recipient, &msg.body, buttons)
                    .await
            }
            MessageKind::List(sections) => {
                inner
                    .transport
                    .send_list(&msg.recipient, &msg.body, sections)
                    .await
            }
        }
    };

    match tokio::time::timeout(inner.settings.call_timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(MchangoError::Timeout {
            duration: inner.settings.call_timeout,
        }),
    }
}

async fn record_outcome(inner: &QueueInner, msg: &OutboundMessage, status: DeliveryStatus) {
    inner.outcomes.lock().await.push(DeliveryOutcome {
        message_id: msg.id.clone(),
        recipient: msg.recipient.clone(),
        status,
        attempts: msg.retry_count + 1,
        completed_at: Utc::now(),
    });
}
