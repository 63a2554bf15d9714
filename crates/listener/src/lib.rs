//! r10k relay event plumbing.
//!
//! Both ends of the relay live here:
//!
//! - [`webhook`]: receives GitHub deliveries over HTTP, normalizes push
//!   events, and hands them to a [`relay::EventPublisher`] (SNS in
//!   production). Served either on a plain TCP listener ([`serve`]) or under
//!   the AWS Lambda HTTP runtime by the binary.
//!
//! - [`consumer`]: long-polls a [`relay::MessageQueue`] (SQS in production),
//!   decodes the SNS-wrapped push event, routes it with
//!   [`relay::plan_deployment`], and runs the deployment through a
//!   [`relay::Deployer`].
//!
//! ## Deployment Scenarios
//!
//! | Scenario | Component | Notes |
//! |----------|-----------|-------|
//! | Lambda behind API Gateway | [`webhook::router`] under `lambda_http` | original deployment model |
//! | Standalone receiver | [`webhook::router`] via [`serve`] | needs a public HTTPS endpoint in front |
//! | Puppet master | [`consumer::Consumer`] | one queue per host; every host deploys every push |
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP framing and loop control live here; routing rules
//! come from [`relay`], and transports are injected as port trait objects.

pub mod consumer;
pub mod webhook;

#[cfg(test)]
mod test_utils;

pub use consumer::{Consumer, DispatchOutcome};
pub use webhook::{classify, router, WebhookError, WebhookEvent, WebhookResponse};

use std::net::SocketAddr;

use axum::Router;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Serves `app` on `addr` until `shutdown` is cancelled.
///
/// In-flight requests are allowed to finish before this returns.
pub async fn serve(addr: SocketAddr, app: Router, shutdown: CancellationToken) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Webhook receiver listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
