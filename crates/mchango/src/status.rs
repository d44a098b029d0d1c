// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `mchango status` command implementation.
//!
//! Queries the admin health endpoint of a running bot and prints its state.
//! Falls back gracefully when the bot is not running.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use mchango_config::model::MchangoConfig;
use mchango_core::MchangoError;

/// Health endpoint response from the admin surface.
#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
    uptime_secs: u64,
    transport_state: String,
    poller_enabled: bool,
    poller_halted: bool,
}

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
struct StatusOutput {
    running: bool,
    status: String,
    uptime_secs: Option<u64>,
    uptime_human: Option<String>,
    transport_state: Option<String>,
    poller_enabled: Option<bool>,
    poller_halted: Option<bool>,
    admin_address: String,
}

/// Format seconds into a human-readable duration string.
fn format_uptime(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// Runs the `mchango status` command.
pub async fn run_status(config: &MchangoConfig, json: bool) -> Result<(), MchangoError> {
    let address = &config.gateway.bind_address;
    let url = format!("http://{address}/v1/health");

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(2))
        .build()
        .map_err(|e| MchangoError::Internal(format!("failed to build http client: {e}")))?;

    let health: Option<HealthResponse> = match client.get(&url).send().await {
        Ok(response) if response.status().is_success() => response.json().await.ok(),
        _ => None,
    };

    let output = match health {
        Some(h) => StatusOutput {
            running: true,
            status: h.status,
            uptime_human: Some(format_uptime(h.uptime_secs)),
            uptime_secs: Some(h.uptime_secs),
            transport_state: Some(h.transport_state),
            poller_enabled: Some(h.poller_enabled),
            poller_halted: Some(h.poller_halted),
            admin_address: address.clone(),
        },
        None => StatusOutput {
            running: false,
            status: "not running".to_string(),
            uptime_secs: None,
            uptime_human: None,
            transport_state: None,
            poller_enabled: None,
            poller_halted: None,
            admin_address: address.clone(),
        },
    };

    if json {
        let rendered = serde_json::to_string_pretty(&output)
            .map_err(|e| MchangoError::Internal(format!("failed to render status: {e}")))?;
        println!("{rendered}");
        return Ok(());
    }

    if output.running {
        println!("mchango: {}", output.status);
        if let Some(uptime) = &output.uptime_human {
            println!("  uptime:    {uptime}");
        }
        if let Some(state) = &output.transport_state {
            println!("  transport: {state}");
        }
        if let Some(enabled) = output.poller_enabled {
            println!("  poller:    {}", if enabled { "enabled" } else { "disabled" });
        }
        if output.poller_halted == Some(true) {
            println!("  warning:   poller halted after a fatal error");
        }
    } else {
        println!("mchango: not running (no admin surface at {address})");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(59), "0m");
        assert_eq!(format_uptime(3600 + 120), "1h 2m");
        assert_eq!(format_uptime(2 * 86400 + 3 * 3600 + 60), "2d 3h 1m");
    }
}
