// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transport sender trait wrapping the messaging gateway's RPC boundary.

use async_trait::async_trait;

use crate::error::MchangoError;
use crate::types::{
    Button, DeliveryReceipt, InstanceStatus, ListSection, Notification, NotificationId, SubjectId,
};

/// Opaque RPC boundary to the external messaging gateway.
///
/// All calls are synchronous request/response; callers wrap them in a bounded
/// timeout. Failures surface as typed [`MchangoError`] values, never panics.
#[async_trait]
pub trait TransportSender: Send + Sync {
    /// Sends a plain text message.
    async fn send_text(
        &self,
        recipient: &SubjectId,
        body: &str,
    ) -> Result<DeliveryReceipt, MchangoError>;

    /// Sends a media message with the body used as caption.
    async fn send_media(
        &self,
        recipient: &SubjectId,
        url: &str,
        caption: &str,
        media_type: &str,
    ) -> Result<DeliveryReceipt, MchangoError>;

    /// Sends an interactive buttons message.
    async fn send_buttons(
        &self,
        recipient: &SubjectId,
        body: &str,
        buttons: &[Button],
    ) -> Result<DeliveryReceipt, MchangoError>;

    /// Sends an interactive list message.
    async fn send_list(
        &self,
        recipient: &SubjectId,
        body: &str,
        sections: &[ListSection],
    ) -> Result<DeliveryReceipt, MchangoError>;

    /// Fetches at most one pending inbound notification.
    ///
    /// `Ok(None)` means the gateway queue is empty, which is expected and
    /// must not be logged as an error.
    async fn fetch_pending_notification(&self) -> Result<Option<Notification>, MchangoError>;

    /// Deletes a notification from the gateway's pending queue.
    async fn acknowledge(&self, id: &NotificationId) -> Result<(), MchangoError>;

    /// Reports the gateway instance's connection state.
    async fn get_instance_status(&self) -> Result<InstanceStatus, MchangoError>;
}
