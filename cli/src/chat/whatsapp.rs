//! # WhatsApp Webhook Adapter
//!
//! File: cli/src/chat/whatsapp.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! This module contains the platform-facing half of the chatbot:
//! - Inbound: the webhook payload model, parsed leniently so that status
//!   updates and non-text messages are simply ignored, plus the verification
//!   challenge check performed on `GET /webhook`.
//! - Outbound: the [`MessageSender`] seam and its implementations. The Cloud
//!   API client posts `{messaging_product, to, text: {body}}` with bearer auth;
//!   the logging sender is used when no credentials are configured.
//!
//! Outbound sends are fire-and-forget: failures are reported to the caller,
//! who logs them; there are no retries.
//!
use crate::core::config::WhatsAppConfig;
use crate::core::error::{GitabotError, Result};
use anyhow::anyhow;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// WhatsApp rejects text bodies longer than this many characters.
pub const MAX_BODY_CHARS: usize = 4096;

// --- Inbound payload ---

#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub entry: Vec<WebhookEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookEntry {
    #[serde(default)]
    pub changes: Vec<WebhookChange>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookChange {
    #[serde(default)]
    pub value: WebhookValue,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookValue {
    #[serde(default)]
    pub messages: Vec<WebhookMessage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookMessage {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub text: Option<WebhookText>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WebhookText {
    #[serde(default)]
    pub body: Option<String>,
}

/// Sender and text of the first message in a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub from: String,
    pub body: String,
}

impl WebhookPayload {
    /// The first message of the delivery, if it is a text message with a sender.
    pub fn first_text_message(&self) -> Option<IncomingMessage> {
        let message = self
            .entry
            .first()?
            .changes
            .first()?
            .value
            .messages
            .first()?;
        let from = message.from.as_deref()?.trim();
        let body = message.text.as_ref()?.body.as_deref()?;
        if from.is_empty() {
            return None;
        }
        Some(IncomingMessage {
            from: from.to_string(),
            body: body.to_string(),
        })
    }
}

/// Query parameters of the verification handshake.
#[derive(Debug, Default, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode", default)]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token", default)]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge", default)]
    pub challenge: Option<String>,
}

impl VerifyParams {
    /// Returns the challenge to echo when the handshake is valid.
    pub fn challenge_for(&self, expected_token: Option<&str>) -> Option<&str> {
        let expected = expected_token?;
        let subscribed = self.mode.as_deref() == Some("subscribe");
        if subscribed && self.verify_token.as_deref() == Some(expected) {
            Some(self.challenge.as_deref().unwrap_or_default())
        } else {
            None
        }
    }
}

// --- Outbound ---

/// Delivers a text reply to a chat user.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_text(&self, to: &str, body: &str) -> Result<()>;
}

#[derive(Serialize)]
struct OutboundText<'a> {
    body: &'a str,
}

#[derive(Serialize)]
struct OutboundMessage<'a> {
    messaging_product: &'static str,
    to: &'a str,
    text: OutboundText<'a>,
}

/// WhatsApp Cloud API client.
#[derive(Debug, Clone)]
pub struct WhatsAppClient {
    client: reqwest::Client,
    messages_url: String,
    access_token: String,
}

impl WhatsAppClient {
    /// Builds a client if both the access token and phone number id are set.
    pub fn from_config(config: &WhatsAppConfig) -> Option<Self> {
        let access_token = config.access_token.clone()?;
        let phone_number_id = config.phone_number_id.as_deref()?;
        Some(Self {
            client: reqwest::Client::new(),
            messages_url: format!(
                "{}/{}/{}/messages",
                config.api_base.trim_end_matches('/'),
                config.api_version,
                phone_number_id
            ),
            access_token,
        })
    }

    pub fn messages_url(&self) -> &str {
        &self.messages_url
    }
}

#[async_trait]
impl MessageSender for WhatsAppClient {
    async fn send_text(&self, to: &str, body: &str) -> Result<()> {
        for (i, part) in split_message(body, MAX_BODY_CHARS).iter().enumerate() {
            let response = self
                .client
                .post(&self.messages_url)
                .bearer_auth(&self.access_token)
                .json(&OutboundMessage {
                    messaging_product: "whatsapp",
                    to,
                    text: OutboundText { body: part },
                })
                .send()
                .await
                .map_err(|e| anyhow!(GitabotError::Messaging(e.to_string())))?;
            let status = response.status();
            if !status.is_success() {
                let detail = response.text().await.unwrap_or_default();
                return Err(anyhow!(GitabotError::Messaging(format!(
                    "send to {} failed with {}: {}",
                    to, status, detail
                ))));
            }
            debug!("Sent part {} to {}", i + 1, to);
        }
        Ok(())
    }
}

/// Used when WhatsApp credentials are missing: replies only reach the log.
#[derive(Debug, Clone, Default)]
pub struct LoggingSender;

#[async_trait]
impl MessageSender for LoggingSender {
    async fn send_text(&self, to: &str, body: &str) -> Result<()> {
        info!("Reply to {} (not sent, WhatsApp not configured):\n{}", to, body);
        Ok(())
    }
}

/// Splits `body` into parts of at most `limit` characters, preferring line
/// boundaries. Lines longer than `limit` are cut on character boundaries.
pub fn split_message(body: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    if body.chars().count() <= limit {
        return vec![body.to_string()];
    }
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for line in body.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len > 0 && current_len + line_len > limit {
            parts.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len <= limit {
            current.push_str(line);
            current_len += line_len;
            continue;
        }
        let chars: Vec<char> = line.chars().collect();
        for chunk in chars.chunks(limit) {
            if chunk.len() == limit {
                parts.push(chunk.iter().collect());
            } else {
                current = chunk.iter().collect();
                current_len = chunk.len();
            }
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
        .into_iter()
        .map(|p| p.trim_end_matches('\n').to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_first_text_message() {
        let payload: WebhookPayload = serde_json::from_value(json!({
            "object": "whatsapp_business_account",
            "entry": [{ "changes": [{ "value": {
                "messages": [
                    { "from": "15550001111", "type": "text", "text": { "body": "2.47" } },
                    { "from": "15550002222", "text": { "body": "ignored" } }
                ]
            } }] }]
        }))
        .unwrap();
        assert_eq!(
            payload.first_text_message(),
            Some(IncomingMessage {
                from: "15550001111".into(),
                body: "2.47".into()
            })
        );
    }

    #[test]
    fn test_status_updates_and_media_are_ignored() {
        let statuses: WebhookPayload = serde_json::from_value(json!({
            "entry": [{ "changes": [{ "value": { "statuses": [{ "status": "read" }] } }] }]
        }))
        .unwrap();
        assert_eq!(statuses.first_text_message(), None);

        let image: WebhookPayload = serde_json::from_value(json!({
            "entry": [{ "changes": [{ "value": { "messages": [
                { "from": "1", "type": "image", "image": { "id": "x" } }
            ] } }] }]
        }))
        .unwrap();
        assert_eq!(image.first_text_message(), None);

        assert_eq!(WebhookPayload::default().first_text_message(), None);
    }

    #[test]
    fn test_verification_challenge() {
        let params = VerifyParams {
            mode: Some("subscribe".into()),
            verify_token: Some("secret".into()),
            challenge: Some("12345".into()),
        };
        assert_eq!(params.challenge_for(Some("secret")), Some("12345"));
        assert_eq!(params.challenge_for(Some("other")), None);
        assert_eq!(params.challenge_for(None), None);

        let wrong_mode = VerifyParams {
            mode: Some("unsubscribe".into()),
            ..params
        };
        assert_eq!(wrong_mode.challenge_for(Some("secret")), None);
    }

    #[test]
    fn test_client_requires_credentials() {
        let mut config = WhatsAppConfig::default();
        assert!(WhatsAppClient::from_config(&config).is_none());
        config.access_token = Some("token".into());
        assert!(WhatsAppClient::from_config(&config).is_none());
        config.phone_number_id = Some("1098".into());
        config.api_base = "https://graph.example.com/".into();
        let client = WhatsAppClient::from_config(&config).unwrap();
        assert_eq!(
            client.messages_url(),
            "https://graph.example.com/v19.0/1098/messages"
        );
    }

    #[test]
    fn test_outbound_body_shape() {
        let value = serde_json::to_value(OutboundMessage {
            messaging_product: "whatsapp",
            to: "123",
            text: OutboundText { body: "hi" },
        })
        .unwrap();
        assert_eq!(
            value,
            json!({ "messaging_product": "whatsapp", "to": "123", "text": { "body": "hi" } })
        );
    }

    #[test]
    fn test_split_message() {
        assert_eq!(split_message("short", 10), vec!["short"]);

        let body = "aaaa\nbbbb\ncccc";
        assert_eq!(split_message(body, 10), vec!["aaaa\nbbbb", "cccc"]);

        let long_line = "x".repeat(25);
        let parts = split_message(&long_line, 10);
        assert_eq!(parts.len(), 3);
        assert!(parts.iter().all(|p| p.chars().count() <= 10));
        assert_eq!(parts.concat(), long_line);

        let unicode = "ॐ".repeat(12);
        let parts = split_message(&unicode, 5);
        assert!(parts.iter().all(|p| p.chars().count() <= 5));
        assert_eq!(parts.concat(), unicode);
    }
}
