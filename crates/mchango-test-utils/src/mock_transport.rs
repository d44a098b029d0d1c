// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock transport sender for deterministic testing.
//!
//! `MockTransport` implements [`TransportSender`] with injectable inbound
//! notifications, captured outbound sends, and scriptable failures/delays.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use mchango_core::types::{
    Button, DeliveryReceipt, InstanceStatus, ListSection, MessageKind, Notification,
    NotificationId, SubjectId,
};
use mchango_core::{MchangoError, TransportSender};

/// One captured outbound send.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub recipient: SubjectId,
    pub body: String,
    pub kind: MessageKind,
}

/// A mock messaging gateway for testing.
///
/// - Sends are captured and retrievable via [`sent_messages`]/[`sent_bodies`].
/// - Notifications injected via [`inject_notification`] are returned one at a
///   time by `fetch_pending_notification`.
/// - [`fail_next_sends`] scripts transient failures; [`delay_next_sends`]
///   simulates hung calls; [`inject_poll_error`] scripts fetch errors.
///
/// [`sent_messages`]: MockTransport::sent_messages
/// [`sent_bodies`]: MockTransport::sent_bodies
/// [`inject_notification`]: MockTransport::inject_notification
/// [`fail_next_sends`]: MockTransport::fail_next_sends
/// [`delay_next_sends`]: MockTransport::delay_next_sends
/// [`inject_poll_error`]: MockTransport::inject_poll_error
pub struct MockTransport {
    sent: Mutex<Vec<SentMessage>>,
    notifications: Mutex<VecDeque<Notification>>,
    poll_errors: Mutex<VecDeque<MchangoError>>,
    acked: Mutex<Vec<NotificationId>>,
    fail_sends_remaining: AtomicU32,
    delayed_sends: Mutex<Option<(u32, Duration)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            notifications: Mutex::new(VecDeque::new()),
            poll_errors: Mutex::new(VecDeque::new()),
            acked: Mutex::new(Vec::new()),
            fail_sends_remaining: AtomicU32::new(0),
            delayed_sends: Mutex::new(None),
        }
    }

    /// Queue an inbound notification for the next fetch.
    pub async fn inject_notification(&self, n: Notification) {
        self.notifications.lock().await.push_back(n);
    }

    /// Convenience: inject a text notification from the given sender.
    pub async fn inject_text(&self, sender: &str, body: &str) {
        self.inject_notification(Notification {
            id: NotificationId(uuid::Uuid::new_v4().to_string()),
            sender: SubjectId::from(sender),
            body: body.to_string(),
            received_at: chrono::Utc::now(),
        })
        .await;
    }

    /// Script an error for the next `fetch_pending_notification` call.
    /// Errors are consumed before any queued notifications.
    pub async fn inject_poll_error(&self, err: MchangoError) {
        self.poll_errors.lock().await.push_back(err);
    }

    /// The next `n` send calls fail with a transient transport error.
    pub fn fail_next_sends(&self, n: u32) {
        self.fail_sends_remaining.store(n, Ordering::SeqCst);
    }

    /// The next `n` send calls sleep for `delay` before completing.
    pub async fn delay_next_sends(&self, n: u32, delay: Duration) {
        *self.delayed_sends.lock().await = Some((n, delay));
    }

    /// All captured sends, in order.
    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    /// Bodies of all captured sends, in order.
    pub async fn sent_bodies(&self) -> Vec<String> {
        self.sent.lock().await.iter().map(|s| s.body.clone()).collect()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Notification ids acknowledged so far.
    pub async fn acked(&self) -> Vec<NotificationId> {
        self.acked.lock().await.clone()
    }

    async fn record_send(
        &self,
        recipient: &SubjectId,
        body: &str,
        kind: MessageKind,
    ) -> Result<DeliveryReceipt, MchangoError> {
        let delay = {
            let mut delayed = self.delayed_sends.lock().await;
            match *delayed {
                Some((remaining, delay)) if remaining > 0 => {
                    *delayed = Some((remaining - 1, delay));
                    Some(delay)
                }
                _ => None,
            }
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let remaining = self.fail_sends_remaining.load(Ordering::SeqCst);
        if remaining > 0
            && self
                .fail_sends_remaining
                .compare_exchange(remaining, remaining - 1, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            return Err(MchangoError::transport("scripted send failure"));
        }

        self.sent.lock().await.push(SentMessage {
            recipient: recipient.clone(),
            body: body.to_string(),
            kind,
        });
        Ok(DeliveryReceipt(format!("mock-{}", uuid::Uuid::new_v4())))
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransportSender for MockTransport {
    async fn send_text(
        &self,
        recipient: &SubjectId,
        body: &str,
    ) -> Result<DeliveryReceipt, MchangoError> {
        self.record_send(recipient, body, MessageKind::Text).await
    }

    async fn send_media(
        &self,
        recipient: &SubjectId,
        url: &str,
        caption: &str,
        media_type: &str,
    ) -> Result<DeliveryReceipt, MchangoError> {
        self.record_send(
            recipient,
            caption,
            MessageKind::Media {
                url: url.to_string(),
                media_type: media_type.to_string(),
            },
        )
        .await
    }

    async fn send_buttons(
        &self,
        recipient: &SubjectId,
        body: &str,
        buttons: &[Button],
    ) -> Result<DeliveryReceipt, MchangoError> {
        self.record_send(recipient, body, MessageKind::Buttons(buttons.to_vec()))
            .await
    }

    async fn send_list(
        &self,
        recipient: &SubjectId,
        body: &str,
        sections: &[ListSection],
    ) -> Result<DeliveryReceipt, MchangoError> {
        self.record_send(recipient, body, MessageKind::List(sections.to_vec()))
            .await
    }

    async fn fetch_pending_notification(&self) -> Result<Option<Notification>, MchangoError> {
        if let Some(err) = self.poll_errors.lock().await.pop_front() {
            return Err(err);
        }
        Ok(self.notifications.lock().await.pop_front())
    }

    async fn acknowledge(&self, id: &NotificationId) -> Result<(), MchangoError> {
        self.acked.lock().await.push(id.clone());
        Ok(())
    }

    async fn get_instance_status(&self) -> Result<InstanceStatus, MchangoError> {
        Ok(InstanceStatus {
            authorized: true,
            state: "connected".to_string(),
        })
    }
}
