// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Mchango delivery pipeline, poller, and engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Stable chat address of a human sender/recipient (phone number in
/// international format, e.g. `255712345678`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectId(pub String);

impl SubjectId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SubjectId {
    fn from(s: &str) -> Self {
        SubjectId(s.to_string())
    }
}

/// Identifier assigned to a pending inbound notification by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub String);

/// Gateway-assigned identifier of a delivered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReceipt(pub String);

/// A single tappable button in an interactive message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub id: String,
    pub title: String,
}

/// One row inside an interactive list section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRow {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A titled section of an interactive list message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSection {
    pub title: String,
    pub rows: Vec<ListRow>,
}

/// The delivery shape of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageKind {
    /// Plain text body.
    Text,
    /// Media attachment with the body used as caption.
    Media { url: String, media_type: String },
    /// Interactive reply buttons below the body.
    Buttons(Vec<Button>),
    /// Interactive sectioned list below the body.
    List(Vec<ListSection>),
}

/// A message awaiting delivery through the outbound queue.
///
/// Owned exclusively by the queue until terminal (sent or exhausted-retries).
#[derive(Debug, Clone)]
pub struct OutboundMessage {
    /// Unique id for correlating delivery outcomes.
    pub id: String,
    pub recipient: SubjectId,
    pub body: String,
    pub kind: MessageKind,
    pub enqueued_at: DateTime<Utc>,
    pub retry_count: u32,
}

impl OutboundMessage {
    /// Creates a plain-text outbound message with a fresh id and zero retries.
    pub fn text(recipient: SubjectId, body: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            recipient,
            body: body.into(),
            kind: MessageKind::Text,
            enqueued_at: Utc::now(),
            retry_count: 0,
        }
    }

    /// Creates an outbound message of the given kind.
    pub fn new(recipient: SubjectId, body: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            kind,
            ..Self::text(recipient, body)
        }
    }
}

/// An inbound notification pulled from the gateway's pending queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub sender: SubjectId,
    pub body: String,
    pub received_at: DateTime<Utc>,
}

/// Terminal status of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

/// Terminal record of one outbound message's delivery attempt history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub message_id: String,
    pub recipient: SubjectId,
    pub status: DeliveryStatus,
    /// Total send attempts made (1 for a first-try success).
    pub attempts: u32,
    pub completed_at: DateTime<Utc>,
}

/// Queue state reported to operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueStatus {
    pub queue_length: usize,
    pub is_processing: bool,
    pub rate_limit_counter: u32,
    pub rate_limit_reset_time: Option<DateTime<Utc>>,
}

/// Connection state of the messaging gateway instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatus {
    pub authorized: bool,
    pub state: String,
}

/// Role of a registered user within their chama.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    /// Kiongozi: may create groups and view group-wide status.
    Leader,
    /// Mwanachama: contributes and joins groups.
    Member,
}

/// Persisted user profile (owned by the persistence collaborator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub phone: SubjectId,
    pub role: Role,
    pub name: String,
}

/// A savings group as returned by the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Short alphanumeric join code.
    pub code: String,
    pub name: String,
    /// Agreed per-member contribution in TZS.
    pub contribution_amount: u64,
    pub max_members: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn outbound_text_starts_with_zero_retries() {
        let msg = OutboundMessage::text(SubjectId::from("255700000001"), "habari");
        assert_eq!(msg.retry_count, 0);
        assert_eq!(msg.kind, MessageKind::Text);
        assert!(!msg.id.is_empty());
    }

    #[test]
    fn role_parses_from_lowercase() {
        assert_eq!(Role::from_str("leader").unwrap(), Role::Leader);
        assert_eq!(Role::from_str("member").unwrap(), Role::Member);
        assert!(Role::from_str("admin").is_err());
    }

    #[test]
    fn delivery_status_displays_lowercase() {
        assert_eq!(DeliveryStatus::Sent.to_string(), "sent");
        assert_eq!(DeliveryStatus::Failed.to_string(), "failed");
    }

    #[test]
    fn queue_status_serializes_operator_shape() {
        let status = QueueStatus {
            queue_length: 3,
            is_processing: true,
            rate_limit_counter: 12,
            rate_limit_reset_time: None,
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"queue_length\":3"));
        assert!(json.contains("\"is_processing\":true"));
        assert!(json.contains("\"rate_limit_counter\":12"));
    }
}
