use serde::Serialize;

use crate::core::Ticks;

/// Precision bound used when counting decimal places.
pub const DEFAULT_MAX_DECIMAL_DIGITS: u32 = 5;

/// Largest tick count an `f64` still represents exactly.
pub const MAX_TICKS: Ticks = 1 << 53;

/// Power-of-ten factor mapping real-valued times onto integer ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeScale {
    factor: u64,
    decimals: u32,
}

impl TimeScale {
    /// Smallest power of ten that makes every value integral, looking at no
    /// more than `max_digits` decimal places.
    pub fn detect(values: impl IntoIterator<Item = f64>, max_digits: u32) -> Self {
        let decimals = values
            .into_iter()
            .map(|value| decimal_places(value, max_digits))
            .max()
            .unwrap_or(0);

        Self {
            factor: 10u64.pow(decimals),
            decimals,
        }
    }

    pub fn unit() -> Self {
        Self {
            factor: 1,
            decimals: 0,
        }
    }

    pub fn factor(&self) -> u64 {
        self.factor
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// `None` when the scaled value is negative, not finite or above
    /// [`MAX_TICKS`].
    pub fn to_ticks(&self, value: f64) -> Option<Ticks> {
        let scaled = (value * self.factor as f64).round();
        (scaled >= 0.0 && scaled <= MAX_TICKS as f64).then_some(scaled as Ticks)
    }

    pub fn to_real(&self, ticks: Ticks) -> f64 {
        ticks as f64 / self.factor as f64
    }
}

impl Default for TimeScale {
    fn default() -> Self {
        Self::unit()
    }
}

fn decimal_places(value: f64, max_digits: u32) -> u32 {
    let formatted = format!("{:.*}", max_digits as usize, value);
    let trimmed = formatted.trim_end_matches('0');
    trimmed
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.len() as u32)
}
