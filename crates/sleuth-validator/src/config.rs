//! Validator configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ValidatorError, ValidatorResult};

/// Configuration for a validation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// How many candidates (highest initial confidence first) get tested.
    pub max_hypotheses: usize,
    /// Upper bound on a single data-source query.
    pub query_timeout_ms: u64,
    /// Upper bound on a single strategy execution.
    pub strategy_timeout_ms: u64,
    /// Test the selected hypotheses concurrently. Each hypothesis still runs
    /// its strategies strictly in order.
    pub parallel_hypotheses: bool,
    /// Cost charged for a strategy that does not declare its own.
    pub default_strategy_cost: u64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_hypotheses: 3,
            query_timeout_ms: 5_000,
            strategy_timeout_ms: 30_000,
            parallel_hypotheses: false,
            default_strategy_cost: 1,
        }
    }
}

impl ValidatorConfig {
    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> ValidatorResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and check a TOML document.
    pub fn from_toml(contents: &str) -> ValidatorResult<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ValidatorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make every run meaningless.
    pub fn validate(&self) -> ValidatorResult<()> {
        if self.max_hypotheses == 0 {
            return Err(ValidatorError::Config("max_hypotheses must be at least 1".into()));
        }
        if self.query_timeout_ms == 0 || self.strategy_timeout_ms == 0 {
            return Err(ValidatorError::Config("timeouts must be non-zero".into()));
        }
        Ok(())
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn strategy_timeout(&self) -> Duration {
        Duration::from_millis(self.strategy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = ValidatorConfig::default();
        assert_eq!(cfg.max_hypotheses, 3);
        assert_eq!(cfg.query_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.strategy_timeout(), Duration::from_secs(30));
        assert!(!cfg.parallel_hypotheses);
        assert_eq!(cfg.default_strategy_cost, 1);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg = ValidatorConfig::from_toml("max_hypotheses = 5\nparallel_hypotheses = true\n")
            .unwrap();
        assert_eq!(cfg.max_hypotheses, 5);
        assert!(cfg.parallel_hypotheses);
        assert_eq!(cfg.query_timeout_ms, 5_000);
    }

    #[test]
    fn zero_cap_rejected() {
        let err = ValidatorConfig::from_toml("max_hypotheses = 0").unwrap_err();
        assert!(matches!(err, ValidatorError::Config(_)));
    }

    #[test]
    fn malformed_toml_rejected() {
        let err = ValidatorConfig::from_toml("max_hypotheses = \"many\"").unwrap_err();
        assert!(matches!(err, ValidatorError::Config(_)));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let cfg = ValidatorConfig::load("/nonexistent/sleuth/validator.toml").unwrap();
        assert_eq!(cfg, ValidatorConfig::default());
    }
}
