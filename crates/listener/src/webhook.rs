//! GitHub webhook receiver.
//!
//! Classifies each delivery by its `X-GitHub-Event` header, normalizes push
//! events into a [`PushEvent`], and publishes them before answering GitHub.
//!
//! | `X-GitHub-Event` | Action | Status |
//! |------------------|--------|--------|
//! | missing / empty | reject | 400 |
//! | `ping` | acknowledge | 200 |
//! | `push` | normalize + publish | 200, or 500 if the body is malformed or publishing fails |
//! | anything else | ignore | 200 |
//!
//! Deliveries are not signature-checked. Publishing an arbitrary repository
//! name is harmless: the consumer validates the inferred module name, and
//! r10k only deploys modules it is already configured for.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use relay::{EventPublisher, PublishError, PushEvent};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info};

/// Header carrying the GitHub event type.
const HEADER_EVENT: &str = "x-github-event";

// ---------------------------------------------------------------------------
// Response body
// ---------------------------------------------------------------------------

/// JSON body returned for every delivery: `{"status": ..., "message": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookResponse {
    /// `"success"` or `"failed"`.
    pub status: String,
    /// Human-readable outcome.
    pub message: String,
}

impl WebhookResponse {
    fn success(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            status: "failed".to_string(),
            message: message.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// A classified delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEvent {
    /// GitHub's hook-installation check.
    Ping,
    /// A push, already normalized.
    Push(PushEvent),
    /// Any other event type; acknowledged and ignored.
    Unsupported(String),
}

/// Errors that turn a delivery into a failed response.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// The request is not a GitHub webhook delivery.
    #[error("missing required header: {0}")]
    MissingEventHeader(&'static str),

    /// The push body is not JSON or lacks `repository.name`,
    /// `repository.url`, or `pusher.email`.
    #[error("invalid push payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    /// The normalized event could not be handed to the topic.
    #[error("failed to publish push event for {event}: {source}")]
    Publish {
        /// The event that was not delivered.
        event: PushEvent,
        /// Underlying publisher error.
        #[source]
        source: PublishError,
    },
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            WebhookError::MissingEventHeader(_) => (
                StatusCode::BAD_REQUEST,
                WebhookResponse::failed("Not a valid GitHub webhook event."),
            ),
            WebhookError::InvalidPayload(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                WebhookResponse::failed(format!("Unable to process push event: {e}")),
            ),
            WebhookError::Publish { event, .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                WebhookResponse::failed(format!(
                    "Failed to relay webhook from GitHub for repository {}",
                    event.repo_name
                )),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// The fields of GitHub's push payload the relay keeps.
#[derive(Debug, Deserialize)]
struct GitHubPush {
    repository: GitHubRepository,
    pusher: GitHubPusher,
}

#[derive(Debug, Deserialize)]
struct GitHubRepository {
    name: String,
    url: String,
}

#[derive(Debug, Deserialize)]
struct GitHubPusher {
    email: String,
}

impl From<GitHubPush> for PushEvent {
    fn from(push: GitHubPush) -> Self {
        PushEvent {
            repo_name: push.repository.name,
            repo_url: push.repository.url,
            user: push.pusher.email,
        }
    }
}

/// Classifies a delivery and, for pushes, normalizes the body.
///
/// The body is only parsed for push events.
pub fn classify(headers: &HeaderMap, body: &[u8]) -> Result<WebhookEvent, WebhookError> {
    let event_type = headers
        .get(HEADER_EVENT)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(WebhookError::MissingEventHeader("X-GitHub-Event"))?;

    match event_type {
        "ping" => Ok(WebhookEvent::Ping),
        "push" => {
            let push: GitHubPush = serde_json::from_slice(body)?;
            Ok(WebhookEvent::Push(push.into()))
        }
        other => Ok(WebhookEvent::Unsupported(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// HTTP surface
// ---------------------------------------------------------------------------

/// Shared state for the webhook router.
#[derive(Clone)]
pub struct WebhookState {
    publisher: Arc<dyn EventPublisher>,
}

/// Builds the webhook router.
///
/// - `POST /` and `POST /webhook` accept GitHub deliveries (the bare path is
///   what an API Gateway proxy integration forwards).
/// - `GET /health` is a liveness probe.
pub fn router(publisher: Arc<dyn EventPublisher>) -> Router {
    Router::new()
        .route("/", post(handle_delivery))
        .route("/webhook", post(handle_delivery))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(WebhookState { publisher })
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// Handles one GitHub delivery.
async fn handle_delivery(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, WebhookError> {
    let event = classify(&headers, &body).inspect_err(|e| {
        info!(error = %e, "Rejected webhook delivery");
    })?;

    match event {
        WebhookEvent::Ping => {
            debug!("Ping received");
            Ok(Json(WebhookResponse::success("Ping OK")))
        }
        WebhookEvent::Unsupported(event_type) => {
            debug!(event_type = %event_type, "Ignoring unsupported event type");
            Ok(Json(WebhookResponse::success(format!(
                "Ignored unsupported webhook event type: {event_type}"
            ))))
        }
        WebhookEvent::Push(push) => match state.publisher.publish(&push).await {
            Ok(message_id) => {
                info!(
                    repo = %push.repo_name,
                    user = %push.user,
                    message_id = %message_id,
                    "Relayed push event"
                );
                Ok(Json(WebhookResponse::success(format!(
                    "Received webhook from GitHub for repository {} by user {}",
                    push.repo_name, push.user
                ))))
            }
            Err(source) => {
                error!(
                    repo = %push.repo_name,
                    repo_url = %push.repo_url,
                    user = %push.user,
                    error = %source,
                    "Failed to publish push event"
                );
                Err(WebhookError::Publish { event: push, source })
            }
        },
    }
}
