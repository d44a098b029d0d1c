// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! reqwest-backed implementation of [`TransportSender`].

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use mchango_core::types::{
    Button, DeliveryReceipt, InstanceStatus, ListSection, Notification, NotificationId, SubjectId,
};
use mchango_core::{MchangoError, TransportSender};

use crate::wire;

/// HTTP client for the messaging gateway.
///
/// URLs follow the gateway's `{base}/{method}/{token}` scheme. Credentials
/// come from the `[transport]` config section (or `MCHANGO_TRANSPORT_*`
/// environment overrides).
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl HttpTransport {
    pub fn new(config: &mchango_config::model::TransportConfig) -> Result<Self, MchangoError> {
        let base_url = config
            .instance_url
            .clone()
            .ok_or_else(|| MchangoError::Config("transport.instance_url is required".into()))?;
        let api_token = config
            .api_token
            .clone()
            .ok_or_else(|| MchangoError::Config("transport.api_token is required".into()))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.call_timeout_secs))
            .build()
            .map_err(|e| MchangoError::Transport {
                message: "failed to build http client".into(),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{}/{}", self.base_url, method, self.api_token)
    }

    fn chat_id(recipient: &SubjectId) -> String {
        format!("{}@c.us", recipient.as_str())
    }

    /// Maps a non-success status to the error taxonomy: credential problems
    /// are fatal for polling, everything else is transient.
    fn classify_status(status: reqwest::StatusCode, context: &str) -> MchangoError {
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            MchangoError::Auth(format!("{context}: gateway returned {status}"))
        } else {
            MchangoError::transport(format!("{context}: gateway returned {status}"))
        }
    }

    async fn post_send<B: serde::Serialize>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<DeliveryReceipt, MchangoError> {
        let response = self
            .client
            .post(self.url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| MchangoError::Transport {
                message: format!("{method} request failed"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify_status(status, method));
        }

        let parsed: wire::SendResponse =
            response.json().await.map_err(|e| MchangoError::Transport {
                message: format!("{method} returned malformed response"),
                source: Some(Box::new(e)),
            })?;
        Ok(DeliveryReceipt(parsed.id_message))
    }
}

#[async_trait]
impl TransportSender for HttpTransport {
    async fn send_text(
        &self,
        recipient: &SubjectId,
        body: &str,
    ) -> Result<DeliveryReceipt, MchangoError> {
        self.post_send(
            "sendMessage",
            &wire::SendMessageRequest {
                chat_id: Self::chat_id(recipient),
                message: body,
            },
        )
        .await
    }

    async fn send_media(
        &self,
        recipient: &SubjectId,
        url: &str,
        caption: &str,
        media_type: &str,
    ) -> Result<DeliveryReceipt, MchangoError> {
        let file_name = url.rsplit('/').next().unwrap_or(media_type);
        self.post_send(
            "sendFileByUrl",
            &wire::SendFileRequest {
                chat_id: Self::chat_id(recipient),
                url_file: url,
                file_name,
                caption,
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
        self.post_send(
            "sendButtons",
            &wire::SendButtonsRequest {
                chat_id: Self::chat_id(recipient),
                message: body,
                buttons: buttons
                    .iter()
                    .map(|b| wire::WireButton {
                        button_id: b.id.clone(),
                        button_text: b.title.clone(),
                    })
                    .collect(),
            },
        )
        .await
    }

    async fn send_list(
        &self,
        recipient: &SubjectId,
        body: &str,
        sections: &[ListSection],
    ) -> Result<DeliveryReceipt, MchangoError> {
        self.post_send(
            "sendListMessage",
            &wire::SendListRequest {
                chat_id: Self::chat_id(recipient),
                message: body,
                sections: sections
                    .iter()
                    .map(|s| wire::WireListSection {
                        title: s.title.clone(),
                        rows: s
                            .rows
                            .iter()
                            .map(|r| wire::WireListRow {
                                row_id: r.id.clone(),
                                title: r.title.clone(),
                                description: r.description.clone(),
                            })
                            .collect(),
                    })
                    .collect(),
            },
        )
        .await
    }

    async fn fetch_pending_notification(&self) -> Result<Option<Notification>, MchangoError> {
        let response = self
            .client
            .get(self.url("receiveNotification"))
            .send()
            .await
            .map_err(|e| MchangoError::Transport {
                message: "receiveNotification request failed".into(),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify_status(status, "receiveNotification"));
        }

        // The endpoint returns JSON null when the pending queue is empty.
        let envelope: Option<wire::NotificationEnvelope> =
            response.json().await.map_err(|e| MchangoError::Transport {
                message: "receiveNotification returned malformed response".into(),
                source: Some(Box::new(e)),
            })?;
        let Some(envelope) = envelope else {
            return Ok(None);
        };

        let id = NotificationId(envelope.receipt_id.to_string());
        let (Some(sender), Some(text)) = (
            envelope.body.sender_phone(),
            envelope.body.message_text(),
        ) else {
            // Webhook types other than inbound text carry nothing for the
            // engine; acknowledge so they do not clog the pending queue.
            debug!(
                webhook = envelope.body.type_webhook.as_str(),
                "skipping non-text notification"
            );
            if let Err(err) = self.acknowledge(&id).await {
                warn!(error = %err, "failed to acknowledge skipped notification");
            }
            return Ok(None);
        };

        let received_at = envelope
            .body
            .timestamp
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .unwrap_or_else(Utc::now);

        Ok(Some(Notification {
            id,
            sender: SubjectId::from(sender),
            body: text.to_string(),
            received_at,
        }))
    }

    async fn acknowledge(&self, id: &NotificationId) -> Result<(), MchangoError> {
        let url = format!("{}/{}", self.url("deleteNotification"), id.0);
        let response =
            self.client
                .delete(url)
                .send()
                .await
                .map_err(|e| MchangoError::Transport {
                    message: "deleteNotification request failed".into(),
                    source: Some(Box::new(e)),
                })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify_status(status, "deleteNotification"));
        }
        Ok(())
    }

    async fn get_instance_status(&self) -> Result<InstanceStatus, MchangoError> {
        let response = self
            .client
            .get(self.url("getStateInstance"))
            .send()
            .await
            .map_err(|e| MchangoError::Transport {
                message: "getStateInstance request failed".into(),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::classify_status(status, "getStateInstance"));
        }

        let parsed: wire::StateInstanceResponse =
            response.json().await.map_err(|e| MchangoError::Transport {
                message: "getStateInstance returned malformed response".into(),
                source: Some(Box::new(e)),
            })?;
        Ok(InstanceStatus {
            authorized: parsed.state_instance == "authorized",
            state: parsed.state_instance,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: Option<&str>, token: Option<&str>) -> mchango_config::model::TransportConfig {
        mchango_config::model::TransportConfig {
            instance_url: url.map(String::from),
            api_token: token.map(String::from),
            call_timeout_secs: 15,
        }
    }

    #[test]
    fn new_requires_url_and_token() {
        assert!(HttpTransport::new(&config(None, Some("t"))).is_err());
        assert!(HttpTransport::new(&config(Some("https://gw.example"), None)).is_err());
        assert!(
            HttpTransport::new(&config(Some("https://gw.example"), Some("t"))).is_ok()
        );
    }

    #[test]
    fn urls_embed_method_and_token_and_trim_slash() {
        let transport =
            HttpTransport::new(&config(Some("https://gw.example/"), Some("secret"))).unwrap();
        assert_eq!(
            transport.url("sendMessage"),
            "https://gw.example/sendMessage/secret"
        );
    }

    #[test]
    fn chat_id_appends_gateway_suffix() {
        assert_eq!(
            HttpTransport::chat_id(&SubjectId::from("255700000001")),
            "255700000001@c.us"
        );
    }

    #[test]
    fn credential_statuses_map_to_auth() {
        let err = HttpTransport::classify_status(reqwest::StatusCode::UNAUTHORIZED, "x");
        assert!(err.is_fatal_for_polling());
        let err = HttpTransport::classify_status(reqwest::StatusCode::BAD_GATEWAY, "x");
        assert!(!err.is_fatal_for_polling());
    }
}
