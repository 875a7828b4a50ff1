use thiserror::Error;

use crate::scheduler::Algorithm;
use crate::sim::InputMode;

/// Validation failures. All of them are raised before the first tick runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("quantum must be positive, got {0}")]
    NonPositiveQuantum(f64),

    #[error("context switch must be non-negative, got {0}")]
    NegativeContextSwitch(f64),

    #[error("input list cannot be empty")]
    EmptyInput,

    #[error("item {index}: time values must be finite")]
    NonFiniteTime { index: usize },

    #[error("item {index}: arrival time must be non-negative, got {value}")]
    NegativeArrival { index: usize, value: f64 },

    #[error("item {index}: burst time must be positive, got {value}")]
    NonPositiveBurst { index: usize, value: f64 },

    #[error("item {index}: time value {value} does not fit the tick range at this precision")]
    TimeOutOfRange { index: usize, value: f64 },

    #[error("item {index}: memory requirement must be positive, got {value}")]
    NonPositiveMemory { index: usize, value: f64 },

    #[error("item {index}: input shape differs from the first item ({expected:?})")]
    MixedInputShapes { index: usize, expected: InputMode },

    #[error("unknown algorithm '{0}'. Valid: fcfs, spn, hrrn, srtf, rr, mlq, mlfq")]
    UnknownAlgorithm(String),

    #[error("unknown category '{0}'. Valid: real_time, system, interactive, batch")]
    UnknownCategory(String),

    #[error("{algorithm} is not compatible with {mode:?} input (available: {available})")]
    IncompatibleAlgorithm {
        algorithm: Algorithm,
        mode: InputMode,
        available: String,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SimError>;
