use std::time::Duration;
use thiserror::Error;

/// Tunables for the efficiency engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Non-Archimedean slack weight, i.e. the lower bound on every measure
    /// weight, in normalized units.
    pub epsilon: f64,
    /// Scores are rounded to this grid; values this close to 1 become `1.0`.
    pub frontier_tolerance: f64,
    pub solve_timeout: Option<Duration>,
    pub parallel: bool,
    /// Divide every measure column by its population maximum before solving.
    pub normalize: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            epsilon: 1e-6,
            frontier_tolerance: 1e-9,
            solve_timeout: None,
            parallel: true,
            normalize: true,
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("epsilon must be positive and finite, got {0}")]
    InvalidEpsilon(f64),
    #[error("frontier tolerance must be non-negative and finite, got {0}")]
    InvalidTolerance(f64),
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(ConfigError::InvalidEpsilon(self.epsilon));
        }
        if !(self.frontier_tolerance.is_finite() && self.frontier_tolerance >= 0.0) {
            return Err(ConfigError::InvalidTolerance(self.frontier_tolerance));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert_eq!(EngineConfig::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_zero_epsilon() {
        let config = EngineConfig { epsilon: 0.0, ..EngineConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::InvalidEpsilon(0.0)));
    }

    #[test]
    fn rejects_negative_tolerance() {
        let config = EngineConfig { frontier_tolerance: -1.0, ..EngineConfig::default() };
        assert_eq!(config.validate(), Err(ConfigError::InvalidTolerance(-1.0)));
    }
}
