// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mchango serve` command implementation.
//!
//! Wires the transport, store, outbound queue, conversation engine, poller,
//! and optional admin surface together, then runs until interrupted.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use mchango_config::model::MchangoConfig;
use mchango_core::types::{DeliveryStatus, SubjectId};
use mchango_core::{MchangoError, TransportSender};
use mchango_delivery::{OutboundQueue, QueueSettings};
use mchango_engine::{ConversationEngine, FlowLimits, ResponseCache, SessionStore};
use mchango_gateway::AdminState;
use mchango_poller::{NotificationPoller, PollerSettings};
use mchango_transport::HttpTransport;

use crate::store::JsonStore;

/// Runs the `mchango serve` command.
///
/// Starts the session sweeper, the notification poller, and (when enabled)
/// the admin HTTP server. Shuts down gracefully on ctrl-c.
pub async fn run_serve(config: MchangoConfig) -> Result<(), MchangoError> {
    init_tracing(&config.agent.log_level);

    info!(agent = config.agent.name.as_str(), "starting mchango serve");

    let transport: Arc<dyn TransportSender> = Arc::new(HttpTransport::new(&config.transport)?);

    let store = Arc::new(JsonStore::open(JsonStore::default_path()?).await?);

    let queue = OutboundQueue::new(
        transport.clone(),
        config.queue.per_minute_limit,
        QueueSettings::from_config(&config.queue, &config.transport),
    );

    let sessions = Arc::new(SessionStore::new(Duration::from_secs(
        config.session.idle_timeout_secs,
    )));

    let cancel = CancellationToken::new();
    let sweeper = sessions.run_sweeper(
        Duration::from_secs(config.session.sweep_interval_secs),
        cancel.clone(),
    );

    // Terminal delivery records would otherwise pile up unread in the queue.
    let recorder = queue.run_outcome_recorder(
        Duration::from_secs(30),
        cancel.clone(),
        |outcome| match outcome.status {
            DeliveryStatus::Sent => debug!(
                message_id = outcome.message_id.as_str(),
                recipient = %outcome.recipient,
                attempts = outcome.attempts,
                "delivery recorded"
            ),
            DeliveryStatus::Failed => warn!(
                message_id = outcome.message_id.as_str(),
                recipient = %outcome.recipient,
                attempts = outcome.attempts,
                "delivery failed permanently"
            ),
        },
    );

    let cache = Arc::new(ResponseCache::new());
    for entry in &config.cache.entries {
        cache.seed(
            &SubjectId::from(entry.subject.as_str()),
            &entry.message,
            &entry.reply,
        );
    }
    if !config.cache.entries.is_empty() {
        info!(entries = config.cache.entries.len(), "response cache seeded");
    }

    let engine = Arc::new(ConversationEngine::new(
        sessions,
        cache,
        store,
        queue.clone(),
        FlowLimits::from_config(&config.flows),
    ));

    let poller = NotificationPoller::new(
        transport.clone(),
        engine,
        PollerSettings::from_config(&config.poller),
    );
    let poller_handle = poller.run(cancel.clone());

    if config.gateway.enabled {
        let state = AdminState {
            queue: queue.clone(),
            poller: poller.clone(),
            transport: transport.clone(),
            start_time: std::time::Instant::now(),
        };
        let bind_address = config.gateway.bind_address.clone();
        tokio::spawn(async move {
            if let Err(err) = mchango_gateway::start_server(&bind_address, state).await {
                error!(error = %err, "admin server exited");
            }
        });
    }

    match transport.get_instance_status().await {
        Ok(status) if status.authorized => {
            info!(state = status.state.as_str(), "gateway connection ready");
        }
        Ok(status) => {
            warn!(state = status.state.as_str(), "gateway not authorized yet");
        }
        Err(err) => {
            warn!(error = %err, "could not query gateway state at startup");
        }
    }

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| MchangoError::Internal(format!("failed to listen for ctrl-c: {e}")))?;

    info!("shutdown requested");
    cancel.cancel();
    let _ = poller_handle.await;
    let _ = sweeper.await;
    let _ = recorder.await;

    let pending = queue.status().await.queue_length;
    if pending > 0 {
        warn!(pending, "shutting down with undelivered messages");
    }
    info!("mchango stopped");
    Ok(())
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mchango={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
