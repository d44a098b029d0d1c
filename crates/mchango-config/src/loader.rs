// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./mchango.toml` > `~/.config/mchango/mchango.toml`
//! > `/etc/mchango/mchango.toml` with environment variable overrides via
//! `MCHANGO_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::MchangoConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/mchango/mchango.toml` (system-wide)
/// 3. `~/.config/mchango/mchango.toml` (user XDG config)
/// 4. `./mchango.toml` (local directory)
/// 5. `MCHANGO_*` environment variables
pub fn load_config() -> Result<MchangoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MchangoConfig::default()))
        .merge(Toml::file("/etc/mchango/mchango.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("mchango/mchango.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("mchango.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<MchangoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MchangoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<MchangoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(MchangoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `MCHANGO_TRANSPORT_API_TOKEN` must map
/// to `transport.api_token`, not `transport.api.token`.
fn env_provider() -> Env {
    Env::prefixed("MCHANGO_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        // Example: MCHANGO_QUEUE_PER_MINUTE_LIMIT -> "queue_per_minute_limit"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("transport_", "transport.", 1)
            .replacen("queue_", "queue.", 1)
            .replacen("poller_", "poller.", 1)
            .replacen("session_", "session.", 1)
            .replacen("flows_", "flows.", 1)
            .replacen("gateway_", "gateway.", 1);
        mapped.into()
    })
}
