//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::env;

/// Environment variable toggling [`EngineConfig::record_snapshots`].
pub const RECORD_SNAPSHOTS_ENV: &str = "MODELSHIFT_RECORD_SNAPSHOTS";
/// Environment variable toggling [`EngineConfig::validate_chain`].
pub const VALIDATE_CHAIN_ENV: &str = "MODELSHIFT_VALIDATE_CHAIN";

/// Options applied when an engine is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Clone the working value into every trail step. When off, steps carry
    /// no data and the engine never clones a model.
    pub record_snapshots: bool,
    /// Reject duplicate versions and mismatched neighbour declarations at
    /// construction. When off, the chain is trusted as given.
    pub validate_chain: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            record_snapshots: true,
            validate_chain: true,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style toggle for trail snapshots.
    pub fn record_snapshots(mut self, enabled: bool) -> Self {
        self.record_snapshots = enabled;
        self
    }

    /// Builder-style toggle for chain validation.
    pub fn validate_chain(mut self, enabled: bool) -> Self {
        self.validate_chain = enabled;
        self
    }

    /// Load configuration from environment variables, falling back to the
    /// defaults for unset ones.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(value) = lookup(RECORD_SNAPSHOTS_ENV) {
            config.record_snapshots = parse_flag(RECORD_SNAPSHOTS_ENV, &value)?;
        }
        if let Some(value) = lookup(VALIDATE_CHAIN_ENV) {
            config.validate_chain = parse_flag(VALIDATE_CHAIN_ENV, &value)?;
        }

        Ok(config)
    }

    /// Parse configuration from a JSON document. Missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid boolean for {key}: {value:?}")]
    InvalidFlag { key: String, value: String },

    #[error("invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_enable_everything() {
        let config = EngineConfig::default();
        assert!(config.record_snapshots);
        assert!(config.validate_chain);
    }

    #[test]
    fn lookup_overrides_defaults() {
        let config =
            EngineConfig::from_lookup(lookup_from(&[(RECORD_SNAPSHOTS_ENV, " Off ")])).unwrap();
        assert!(!config.record_snapshots);
        assert!(config.validate_chain);

        let config = EngineConfig::from_lookup(lookup_from(&[
            (RECORD_SNAPSHOTS_ENV, "1"),
            (VALIDATE_CHAIN_ENV, "false"),
        ]))
        .unwrap();
        assert!(config.record_snapshots);
        assert!(!config.validate_chain);
    }

    #[test]
    fn lookup_rejects_garbage() {
        let result = EngineConfig::from_lookup(lookup_from(&[(VALIDATE_CHAIN_ENV, "maybe")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidFlag { key, value }) if key == VALIDATE_CHAIN_ENV && value == "maybe"
        ));
    }

    #[test]
    fn json_uses_camel_case_and_defaults() {
        let config = EngineConfig::from_json(r#"{"recordSnapshots": false}"#).unwrap();
        assert_eq!(
            config,
            EngineConfig::new().record_snapshots(false).validate_chain(true)
        );

        assert!(EngineConfig::from_json("[1, 2]").is_err());
    }
}
