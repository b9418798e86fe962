//! Configuration loading and representation.

use std::time::Duration;

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};

use backoffice_auth::{ScopePolicy, ScopeSettings};
use backoffice_observability::LogFormat;

pub const MAX_DEPTH_VAR: &str = "BACKOFFICE_SCOPE_MAX_DEPTH";
pub const MAX_FANOUT_VAR: &str = "BACKOFFICE_SCOPE_MAX_FANOUT";
pub const POLICY_VAR: &str = "BACKOFFICE_SCOPE_POLICY";
pub const EXPAND_ROLE_GRANTS_VAR: &str = "BACKOFFICE_SCOPE_EXPAND_ROLE_GRANTS";
pub const STORE_TIMEOUT_VAR: &str = "BACKOFFICE_STORE_TIMEOUT_MS";
pub use backoffice_observability::tracing::LOG_FORMAT_VAR;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessConfig {
    pub scope: ScopeSettings,
    /// Bound on every store read, in milliseconds.
    pub store_timeout_ms: u64,
    pub log_format: LogFormat,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            scope: ScopeSettings::default(),
            store_timeout_ms: 5_000,
            log_format: LogFormat::default(),
        }
    }
}

impl AccessConfig {
    /// Load from the process environment; unset variables keep their defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (the environment, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(MAX_DEPTH_VAR) {
            config.scope.limits.max_depth = raw
                .trim()
                .parse()
                .with_context(|| format!("{MAX_DEPTH_VAR} must be a non-negative integer, got {raw:?}"))?;
        }
        if let Some(raw) = lookup(MAX_FANOUT_VAR) {
            let fanout: usize = raw
                .trim()
                .parse()
                .with_context(|| format!("{MAX_FANOUT_VAR} must be a positive integer, got {raw:?}"))?;
            if fanout == 0 {
                return Err(anyhow!("{MAX_FANOUT_VAR} must be at least 1"));
            }
            config.scope.limits.max_fanout = fanout;
        }
        if let Some(raw) = lookup(POLICY_VAR) {
            config.scope.policy = raw
                .parse::<ScopePolicy>()
                .map_err(|e| anyhow!(e))
                .with_context(|| format!("invalid {POLICY_VAR}"))?;
        }
        if let Some(raw) = lookup(EXPAND_ROLE_GRANTS_VAR) {
            config.scope.expand_role_grants = parse_flag(&raw)
                .with_context(|| format!("{EXPAND_ROLE_GRANTS_VAR} must be true or false, got {raw:?}"))?;
        }
        if let Some(raw) = lookup(STORE_TIMEOUT_VAR) {
            config.store_timeout_ms = raw
                .trim()
                .parse()
                .with_context(|| format!("{STORE_TIMEOUT_VAR} must be milliseconds, got {raw:?}"))?;
        }
        if let Some(raw) = lookup(LOG_FORMAT_VAR) {
            config.log_format = raw
                .parse::<LogFormat>()
                .map_err(|e| anyhow!(e))
                .with_context(|| format!("invalid {LOG_FORMAT_VAR}"))?;
        }

        if config.scope.policy == ScopePolicy::FailOpen {
            tracing::info!("data scope policy is fail_open; principals without department or fallback see everything");
        }
        Ok(config)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

fn parse_flag(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(anyhow!("not a boolean")),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> anyhow::Result<AccessConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AccessConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = load(&[]).unwrap();
        assert_eq!(config, AccessConfig::default());
        assert_eq!(config.scope.policy, ScopePolicy::FailOpen);
        assert_eq!(config.scope.limits.max_depth, 64);
        assert_eq!(config.store_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn reads_every_variable() {
        let config = load(&[
            (MAX_DEPTH_VAR, "12"),
            (MAX_FANOUT_VAR, "3"),
            (POLICY_VAR, "fail_closed"),
            (EXPAND_ROLE_GRANTS_VAR, "yes"),
            (STORE_TIMEOUT_VAR, "250"),
            (LOG_FORMAT_VAR, "pretty"),
        ])
        .unwrap();
        assert_eq!(config.scope.limits.max_depth, 12);
        assert_eq!(config.scope.limits.max_fanout, 3);
        assert_eq!(config.scope.policy, ScopePolicy::FailClosed);
        assert!(config.scope.expand_role_grants);
        assert_eq!(config.store_timeout_ms, 250);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn rejects_bad_values_with_the_variable_name() {
        let err = load(&[(MAX_FANOUT_VAR, "0")]).unwrap_err();
        assert!(err.to_string().contains(MAX_FANOUT_VAR));

        let err = load(&[(POLICY_VAR, "sometimes")]).unwrap_err();
        assert!(err.to_string().contains(POLICY_VAR));

        assert!(load(&[(EXPAND_ROLE_GRANTS_VAR, "maybe")]).is_err());
    }

    #[test]
    fn deserializes_partial_json() {
        let config: AccessConfig =
            serde_json::from_str(r#"{"scope":{"policy":"fail_closed"},"store_timeout_ms":100}"#).unwrap();
        assert_eq!(config.scope.policy, ScopePolicy::FailClosed);
        assert_eq!(config.scope.limits.max_fanout, 8);
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
