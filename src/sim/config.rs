use serde::{Deserialize, Serialize};

use super::scale::{DEFAULT_MAX_DECIMAL_DIGITS, MAX_TICKS};
use crate::core::{MAX_LEVELS, Ticks};
use crate::error::{Result, SimError};

// 10^9 still leaves headroom in u64 ticks for realistic times
const MAX_DECIMAL_DIGITS_LIMIT: u32 = 9;

/// Run-independent simulator settings, in real (unscaled) time units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub quantum: f64,
    pub context_switch: f64,
    pub max_decimal_digits: u32,
    pub mlq: MlqConfig,
    pub mlfq: MlfqConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            quantum: 1.0,
            context_switch: 0.0,
            max_decimal_digits: DEFAULT_MAX_DECIMAL_DIGITS,
            mlq: MlqConfig::default(),
            mlfq: MlfqConfig::default(),
        }
    }
}

impl SimConfig {
    pub fn new(quantum: f64, context_switch: f64) -> Self {
        Self {
            quantum,
            context_switch,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.quantum > 0.0) || !self.quantum.is_finite() {
            return Err(SimError::NonPositiveQuantum(self.quantum));
        }
        if !(self.context_switch >= 0.0) || !self.context_switch.is_finite() {
            return Err(SimError::NegativeContextSwitch(self.context_switch));
        }
        if self.max_decimal_digits > MAX_DECIMAL_DIGITS_LIMIT {
            return Err(SimError::InvalidConfig(format!(
                "max_decimal_digits must be at most {MAX_DECIMAL_DIGITS_LIMIT}, got {}",
                self.max_decimal_digits
            )));
        }
        self.mlq.validate()?;
        self.mlfq.validate()
    }

    /// Check that every level quantum derived from a base of `quantum` ticks
    /// fits the tick range: both MLQ Round-Robin bands and the largest MLFQ
    /// Round-Robin level.
    pub fn validate_level_quanta(&self, quantum: Ticks) -> Result<()> {
        let multipliers = [
            self.mlq.real_time_multiplier,
            self.mlq.interactive_multiplier,
            self.mlfq.round_robin_levels as u64,
        ];
        for multiplier in multipliers {
            let fits = quantum
                .checked_mul(multiplier)
                .is_some_and(|ticks| ticks <= MAX_TICKS);
            if !fits {
                return Err(SimError::InvalidConfig(format!(
                    "quantum of {quantum} ticks times {multiplier} exceeds the tick range"
                )));
            }
        }
        Ok(())
    }
}

/// Quantum multipliers of the two Round-Robin MLQ bands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlqConfig {
    pub real_time_multiplier: u64,
    pub interactive_multiplier: u64,
}

impl Default for MlqConfig {
    fn default() -> Self {
        Self {
            real_time_multiplier: 1,
            interactive_multiplier: 3,
        }
    }
}

impl MlqConfig {
    fn validate(&self) -> Result<()> {
        if self.real_time_multiplier == 0 || self.interactive_multiplier == 0 {
            return Err(SimError::InvalidConfig(
                "MLQ quantum multipliers must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlfqConfig {
    /// Round-Robin levels before the final FCFS level.
    pub round_robin_levels: usize,
}

impl Default for MlfqConfig {
    fn default() -> Self {
        Self {
            round_robin_levels: 3,
        }
    }
}

impl MlfqConfig {
    fn validate(&self) -> Result<()> {
        if self.round_robin_levels == 0 || self.round_robin_levels >= MAX_LEVELS {
            return Err(SimError::InvalidConfig(format!(
                "MLFQ needs between 1 and {} round-robin levels, got {}",
                MAX_LEVELS - 1,
                self.round_robin_levels
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert_eq!(SimConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_scalar_validation() {
        assert_eq!(
            SimConfig::new(0.0, 0.0).validate(),
            Err(SimError::NonPositiveQuantum(0.0))
        );
        assert_eq!(
            SimConfig::new(1.0, -0.5).validate(),
            Err(SimError::NegativeContextSwitch(-0.5))
        );
        assert!(SimConfig::new(f64::INFINITY, 0.0).validate().is_err());
    }

    #[test]
    fn test_level_quanta_must_fit_tick_range() {
        let mut config = SimConfig::default();
        assert_eq!(config.validate_level_quanta(100), Ok(()));

        config.mlq.interactive_multiplier = u64::MAX;
        assert_eq!(config.validate(), Ok(()));
        assert!(matches!(
            config.validate_level_quanta(2),
            Err(SimError::InvalidConfig(_))
        ));

        let config = SimConfig::default();
        assert!(config.validate_level_quanta(MAX_TICKS).is_err());
    }

    #[test]
    fn test_level_bounds() {
        let mut config = SimConfig::default();
        config.mlfq.round_robin_levels = MAX_LEVELS;
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));

        config.mlfq.round_robin_levels = 0;
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
    }
}
