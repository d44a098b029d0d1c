// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Mchango bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Mchango configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MchangoConfig {
    /// Bot identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Messaging gateway transport settings.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Outbound queue and rate limiter settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Inbound notification poller settings.
    #[serde(default)]
    pub poller: PollerConfig,

    /// Session store and eviction settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Conversation flow validation bounds.
    #[serde(default)]
    pub flows: FlowConfig,

    /// Response cache seed entries.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Operator/admin HTTP surface settings.
    #[serde(default)]
    pub gateway: GatewayConfig,
}

/// Bot identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the bot.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "mchango".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Messaging gateway transport configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TransportConfig {
    /// Base URL of the gateway instance. `None` disables the live transport.
    #[serde(default)]
    pub instance_url: Option<String>,

    /// Gateway API token. `None` requires environment variable.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Bounded timeout applied to every transport call, in seconds.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            instance_url: None,
            api_token: None,
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

fn default_call_timeout_secs() -> u64 {
    15
}

/// Outbound queue and rate limiter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueueConfig {
    /// Maximum messages sent per rolling minute window.
    #[serde(default = "default_per_minute_limit")]
    pub per_minute_limit: u32,

    /// Maximum retries before a message is recorded as failed.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between consecutive sends (and between rate-denied retries),
    /// in milliseconds.
    #[serde(default = "default_inter_message_delay_ms")]
    pub inter_message_delay_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            per_minute_limit: default_per_minute_limit(),
            max_retries: default_max_retries(),
            inter_message_delay_ms: default_inter_message_delay_ms(),
        }
    }
}

fn default_per_minute_limit() -> u32 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_inter_message_delay_ms() -> u64 {
    1000
}

/// Inbound notification poller configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PollerConfig {
    /// Interval between gateway fetches, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Interval of the internal buffer drain loop, in milliseconds.
    #[serde(default = "default_drain_interval_ms")]
    pub drain_interval_ms: u64,

    /// Whether polling starts enabled. Toggleable at runtime by operators.
    #[serde(default = "default_poller_enabled")]
    pub enabled: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            drain_interval_ms: default_drain_interval_ms(),
            enabled: default_poller_enabled(),
        }
    }
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_drain_interval_ms() -> u64 {
    250
}

fn default_poller_enabled() -> bool {
    true
}

/// Session store and eviction configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    /// Seconds of inactivity before a session is evicted.
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Interval of the eviction sweep, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_idle_timeout_secs() -> u64 {
    1800 // 30 minutes
}

fn default_sweep_interval_secs() -> u64 {
    60
}

/// Conversation flow validation bounds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FlowConfig {
    /// Minimum accepted contribution amount in TZS.
    #[serde(default = "default_min_contribution")]
    pub min_contribution: u64,

    /// Maximum accepted contribution amount in TZS.
    #[serde(default = "default_max_contribution")]
    pub max_contribution: u64,

    /// Minimum group member count.
    #[serde(default = "default_min_members")]
    pub min_members: u32,

    /// Maximum group member count.
    #[serde(default = "default_max_members")]
    pub max_members: u32,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            min_contribution: default_min_contribution(),
            max_contribution: default_max_contribution(),
            min_members: default_min_members(),
            max_members: default_max_members(),
        }
    }
}

fn default_min_contribution() -> u64 {
    10_000
}

fn default_max_contribution() -> u64 {
    1_000_000
}

fn default_min_members() -> u32 {
    2
}

fn default_max_members() -> u32 {
    50
}

/// Response cache seed table.
///
/// Entries are loaded once at startup and looked up before any business
/// logic runs; there is no runtime invalidation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Precomputed (subject, message) -> reply entries.
    #[serde(default)]
    pub entries: Vec<CacheEntryConfig>,
}

/// One precomputed reply for an exact subject and message.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheEntryConfig {
    /// Sender phone/chat id the entry applies to.
    pub subject: String,
    /// Message text; matched after trimming and lowercasing.
    pub message: String,
    pub reply: String,
}

/// Operator/admin HTTP surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Enable the admin HTTP server.
    #[serde(default)]
    pub enabled: bool,

    /// Address to bind the admin server to.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: default_bind_address(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1:8321".to_string()
}
