// SPDX-FileCopyrightText: 2026 Mchango Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation of configuration values.
//!
//! Figment guarantees type correctness; these checks enforce the value-level
//! constraints the pipeline relies on (positive limits, ordered bounds).

use mchango_core::MchangoError;

use crate::model::MchangoConfig;

/// Validate a loaded configuration.
///
/// Returns every violation found, not just the first.
pub fn validate_config(config: &MchangoConfig) -> Result<(), Vec<MchangoError>> {
    let mut errors = Vec::new();

    if config.queue.per_minute_limit == 0 {
        errors.push(MchangoError::Config(
            "queue.per_minute_limit must be greater than 0".into(),
        ));
    }

    if config.poller.poll_interval_ms == 0 {
        errors.push(MchangoError::Config(
            "poller.poll_interval_ms must be greater than 0".into(),
        ));
    }

    if config.poller.drain_interval_ms == 0 {
        errors.push(MchangoError::Config(
            "poller.drain_interval_ms must be greater than 0".into(),
        ));
    }

    if config.transport.call_timeout_secs == 0 {
        errors.push(MchangoError::Config(
            "transport.call_timeout_secs must be greater than 0".into(),
        ));
    }

    if config.session.idle_timeout_secs == 0 {
        errors.push(MchangoError::Config(
            "session.idle_timeout_secs must be greater than 0".into(),
        ));
    }

    if config.flows.min_contribution >= config.flows.max_contribution {
        errors.push(MchangoError::Config(format!(
            "flows.min_contribution ({}) must be below flows.max_contribution ({})",
            config.flows.min_contribution, config.flows.max_contribution
        )));
    }

    if config.flows.min_members < 2 {
        errors.push(MchangoError::Config(
            "flows.min_members must be at least 2".into(),
        ));
    }

    if config.flows.min_members >= config.flows.max_members {
        errors.push(MchangoError::Config(format!(
            "flows.min_members ({}) must be below flows.max_members ({})",
            config.flows.min_members, config.flows.max_members
        )));
    }

    for (i, entry) in config.cache.entries.iter().enumerate() {
        if entry.subject.trim().is_empty() || entry.message.trim().is_empty() {
            errors.push(MchangoError::Config(format!(
                "cache.entries[{i}] needs a non-empty subject and message"
            )));
        }
    }

    if config.gateway.enabled && config.gateway.bind_address.parse::<std::net::SocketAddr>().is_err()
    {
        errors.push(MchangoError::Config(format!(
            "gateway.bind_address is not a valid socket address: {}",
            config.gateway.bind_address
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&MchangoConfig::default()).is_ok());
    }

    #[test]
    fn zero_rate_limit_rejected() {
        let mut config = MchangoConfig::default();
        config.queue.per_minute_limit = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("per_minute_limit"));
    }

    #[test]
    fn inverted_contribution_bounds_rejected() {
        let mut config = MchangoConfig::default();
        config.flows.min_contribution = 2_000_000;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("min_contribution")));
    }

    #[test]
    fn collects_multiple_violations() {
        let mut config = MchangoConfig::default();
        config.queue.per_minute_limit = 0;
        config.session.idle_timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn blank_cache_entry_rejected() {
        let mut config = MchangoConfig::default();
        config.cache.entries.push(crate::model::CacheEntryConfig {
            subject: "  ".into(),
            message: "bei".into(),
            reply: "Huduma ni bure.".into(),
        });
        let errors = validate_config(&config).unwrap_err();
        assert!(errors[0].to_string().contains("cache.entries[0]"));
    }

    #[test]
    fn bad_bind_address_rejected_only_when_enabled() {
        let mut config = MchangoConfig::default();
        config.gateway.bind_address = "not-an-address".into();
        assert!(validate_config(&config).is_ok());

        config.gateway.enabled = true;
        assert!(validate_config(&config).is_err());
    }
}
