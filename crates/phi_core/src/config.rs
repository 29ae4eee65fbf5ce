use serde::{Deserialize, Serialize};

use crate::error::{PhiError, Result};

/// Default spacing between activation stages (half a second).
pub const DEFAULT_STAGE_INTERVAL_MS: u64 = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Milliseconds between consecutive activation stages
    pub stage_interval_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            stage_interval_ms: DEFAULT_STAGE_INTERVAL_MS,
        }
    }
}

impl SimulationConfig {
    pub fn with_stage_interval_ms(mut self, interval: u64) -> Self {
        self.stage_interval_ms = interval;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.stage_interval_ms == 0 {
            return Err(PhiError::ZeroStageInterval);
        }
        Ok(())
    }

    /// Delay of the `n`th stage (1-based) from the start of a run.
    pub fn stage_delay_ms(&self, n: u64) -> u64 {
        self.stage_interval_ms.saturating_mul(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stage_delays() {
        let cfg = SimulationConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.stage_delay_ms(1), 500);
        assert_eq!(cfg.stage_delay_ms(4), 2_000);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let cfg = SimulationConfig::default().with_stage_interval_ms(0);
        assert_eq!(cfg.validate(), Err(PhiError::ZeroStageInterval));
    }
}
