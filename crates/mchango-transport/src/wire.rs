// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire DTOs for the gateway REST API.

use serde::{Deserialize, Serialize};

/// Body for the sendMessage endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest<'a> {
    pub chat_id: String,
    pub message: &'a str,
}

/// Body for the sendFileByUrl endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendFileRequest<'a> {
    pub chat_id: String,
    pub url_file: &'a str,
    pub file_name: &'a str,
    pub caption: &'a str,
}

/// One button in a sendButtons body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireButton {
    pub button_id: String,
    pub button_text: String,
}

/// Body for the sendButtons endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendButtonsRequest<'a> {
    pub chat_id: String,
    pub message: &'a str,
    pub buttons: Vec<WireButton>,
}

/// One row in a list section.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireListRow {
    pub row_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// One section in a sendListMessage body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireListSection {
    pub title: String,
    pub rows: Vec<WireListRow>,
}

/// Body for the sendListMessage endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendListRequest<'a> {
    pub chat_id: String,
    pub message: &'a str,
    pub sections: Vec<WireListSection>,
}

/// Response of every send endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
    pub id_message: String,
}

/// Envelope returned by receiveNotification. The endpoint returns JSON
/// `null` when the pending queue is empty.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationEnvelope {
    pub receipt_id: u64,
    pub body: NotificationBody,
}

/// Payload of one pending notification.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationBody {
    pub type_webhook: String,
    #[serde(default)]
    pub sender_data: Option<SenderData>,
    #[serde(default)]
    pub message_data: Option<MessageData>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderData {
    pub chat_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageData {
    pub type_message: String,
    #[serde(default)]
    pub text_message_data: Option<TextMessageData>,
    #[serde(default)]
    pub extended_text_message_data: Option<ExtendedTextMessageData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessageData {
    pub text_message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedTextMessageData {
    pub text: String,
}

/// Response of the getStateInstance endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateInstanceResponse {
    pub state_instance: String,
}

impl NotificationBody {
    /// Extracts the text of an inbound message notification, if it is one.
    pub fn message_text(&self) -> Option<&str> {
        let data = self.message_data.as_ref()?;
        if let Some(text) = &data.text_message_data {
            return Some(&text.text_message);
        }
        if let Some(ext) = &data.extended_text_message_data {
            return Some(&ext.text);
        }
        None
    }

    /// The sender chat id without the gateway's `@c.us` suffix.
    pub fn sender_phone(&self) -> Option<&str> {
        let chat_id = &self.sender_data.as_ref()?.chat_id;
        Some(chat_id.strip_suffix("@c.us").unwrap_or(chat_id))
    }
}
