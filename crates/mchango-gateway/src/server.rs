// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admin HTTP server built on axum.
//!
//! Sets up routes and shared state for the operator surface.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use mchango_core::{MchangoError, TransportSender};
use mchango_delivery::OutboundQueue;
use mchango_poller::NotificationPoller;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AdminState {
    pub queue: OutboundQueue,
    pub poller: NotificationPoller,
    pub transport: Arc<dyn TransportSender>,
    /// Process start time for uptime reporting.
    pub start_time: std::time::Instant,
}

/// Builds the admin router. Split out so tests can drive it without a
/// listener.
pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/v1/health", get(handlers::get_health))
        .route("/v1/queue/status", get(handlers::get_queue_status))
        .route("/v1/queue/clear", post(handlers::post_queue_clear))
        .route("/v1/poller/toggle", post(handlers::post_poller_toggle))
        .route("/v1/messages/test", post(handlers::post_test_message))
        .with_state(state)
}

/// Starts the admin HTTP server on the configured bind address.
///
/// Runs until the process exits; callers spawn it alongside the poller.
pub async fn start_server(bind_address: &str, state: AdminState) -> Result<(), MchangoError> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .map_err(|e| MchangoError::Config(format!("failed to bind admin server to {bind_address}: {e}")))?;

    tracing::info!("admin server listening on {bind_address}");

    axum::serve(listener, app)
        .await
        .map_err(|e| MchangoError::Internal(format!("admin server error: {e}")))?;

    Ok(())
}
