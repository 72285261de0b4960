//! Ledger configuration loaded from process environment variables.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use bonded_session::DEFAULT_NOTIFICATION_LIMIT;
use bonded_warehousing::DEFAULT_TOLERANCE;

pub const TOLERANCE_ENV: &str = "BONDED_CAPACITY_TOLERANCE";
pub const DECIMALS_ENV: &str = "BONDED_AMOUNT_DECIMALS";
pub const NOTIFICATION_LIMIT_ENV: &str = "BONDED_NOTIFICATION_LIMIT";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} is not a valid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Absolute tolerance for capacity and depletion checks.
    pub capacity_tolerance: f64,
    /// Fractional digits kept on release line weight/value.
    pub amount_decimals: u32,
    /// Notifications kept per session.
    pub notification_limit: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            capacity_tolerance: DEFAULT_TOLERANCE,
            amount_decimals: 2,
            notification_limit: DEFAULT_NOTIFICATION_LIMIT,
        }
    }
}

impl LedgerConfig {
    /// Read overrides from the environment; unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(TOLERANCE_ENV) {
            config.capacity_tolerance = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .ok_or(ConfigError::Invalid {
                    key: TOLERANCE_ENV,
                    value: raw.clone(),
                })?;
        }
        if let Some(raw) = lookup(DECIMALS_ENV) {
            config.amount_decimals = raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|v| *v <= 9)
                .ok_or(ConfigError::Invalid {
                    key: DECIMALS_ENV,
                    value: raw.clone(),
                })?;
        }
        if let Some(raw) = lookup(NOTIFICATION_LIMIT_ENV) {
            config.notification_limit = raw
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::Invalid {
                    key: NOTIFICATION_LIMIT_ENV,
                    value: raw.clone(),
                })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = LedgerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, LedgerConfig::default());
        assert_eq!(config.capacity_tolerance, 1e-4);
        assert_eq!(config.amount_decimals, 2);
        assert_eq!(config.notification_limit, 40);
    }

    #[test]
    fn overrides_are_parsed() {
        let config = LedgerConfig::from_lookup(lookup(&[
            (TOLERANCE_ENV, "0.001"),
            (DECIMALS_ENV, " 3 "),
            (NOTIFICATION_LIMIT_ENV, "10"),
        ]))
        .unwrap();
        assert_eq!(config.capacity_tolerance, 0.001);
        assert_eq!(config.amount_decimals, 3);
        assert_eq!(config.notification_limit, 10);
    }

    #[test]
    fn rejects_bad_values() {
        let err = LedgerConfig::from_lookup(lookup(&[(TOLERANCE_ENV, "-1")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                key: TOLERANCE_ENV,
                value: "-1".to_string()
            }
        );
        assert!(LedgerConfig::from_lookup(lookup(&[(DECIMALS_ENV, "two")])).is_err());
        assert!(LedgerConfig::from_lookup(lookup(&[(NOTIFICATION_LIMIT_ENV, "-3")])).is_err());
    }

    #[test]
    fn deserializes_partial_documents() {
        let config: LedgerConfig =
            serde_json::from_str(r#"{ "notification_limit": 5 }"#).unwrap();
        assert_eq!(config.notification_limit, 5);
        assert_eq!(config.amount_decimals, 2);
    }
}
