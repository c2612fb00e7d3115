//! # HTTP Handlers
//!
//! File: cli/src/commands/serve/handlers.rs
//! Author: Christi Mahu
//!
//! ## Overview
//!
//! Request handlers for the three routes and [`ApiError`], which maps domain
//! errors onto status codes with a `{"error": "<message>"}` body:
//!
//! | Error | Status |
//! |---|---|
//! | `MissingParameters` | 400 |
//! | `ChapterNotFound` | 404 |
//! | anything else | 500 |
//!
//! The webhook receiver never reports failure to the platform: it answers
//! `200 ok` as soon as the reply has been produced and handed to a background
//! send task.
//!
use super::server_logic::AppState;
use crate::chat::whatsapp::{VerifyParams, WebhookPayload};
use crate::core::error::GitabotError;
use crate::scripture::resolver::resolve;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const CHAPTER_PARAM: &str = "chapter_number";
const VERSE_PARAM: &str = "verse_numbers";

/// An error returned from a JSON endpoint.
#[derive(Debug)]
pub struct ApiError(anyhow::Error);

impl<E: Into<anyhow::Error>> From<E> for ApiError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<GitabotError>() {
            Some(GitabotError::MissingParameters) => StatusCode::BAD_REQUEST,
            Some(GitabotError::ChapterNotFound { .. }) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {:#}", self.0);
        } else {
            debug!("Request rejected ({}): {}", status, self.0);
        }
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// # Verse Details (`verse_details`)
///
/// `GET /verse-details?chapter_number=2&verse_numbers=1&verse_numbers=47`
///
/// Responds with one object per requested verse, in request order. Unknown
/// verses inside a known chapter become `{"chapter", "verse", "error"}`
/// entries; an unknown chapter fails the whole request.
pub async fn verse_details(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, ApiError> {
    let chapter = params
        .iter()
        .find(|(key, _)| key == CHAPTER_PARAM)
        .map(|(_, value)| value.as_str())
        .unwrap_or_default();
    let verses: Vec<&str> = params
        .iter()
        .filter(|(key, _)| key == VERSE_PARAM)
        .map(|(_, value)| value.as_str())
        .collect();

    let results = resolve(&state.dataset, chapter, &verses)?;
    info!(
        "verse-details chapter {} -> {} result(s), {} found",
        chapter,
        results.len(),
        results.iter().filter(|r| r.is_found()).count()
    );
    Ok(Json(serde_json::to_value(results)?))
}

/// # Webhook Verification (`verify_webhook`)
///
/// Echoes `hub.challenge` when the mode is `subscribe` and the token matches.
pub async fn verify_webhook(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    match params.challenge_for(state.verify_token.as_deref()) {
        Some(challenge) => {
            info!("Webhook verified");
            (StatusCode::OK, challenge.to_string()).into_response()
        }
        None => {
            warn!("Webhook verification failed (mode: {:?})", params.mode);
            (StatusCode::FORBIDDEN, "Verification failed").into_response()
        }
    }
}

/// # Webhook Receiver (`receive_webhook`)
///
/// Routes the first text message of the delivery and sends the reply in the
/// background. Always answers `ok`.
pub async fn receive_webhook(State(state): State<AppState>, body: Bytes) -> &'static str {
    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("Ignoring malformed webhook payload: {}", e);
            return "ok";
        }
    };
    let Some(message) = payload.first_text_message() else {
        debug!("Webhook delivery without a text message");
        return "ok";
    };

    let reply = state.router.respond(&message.from, &message.body).await;
    let sender = Arc::clone(&state.sender);
    tokio::spawn(async move {
        if let Err(e) = sender.send_text(&message.from, &reply).await {
            error!("Failed to deliver reply to {}: {:#}", message.from, e);
        }
    });
    "ok"
}
