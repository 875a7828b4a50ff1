pub mod core;
pub mod error;
pub mod scheduler;
pub mod sim;

pub use crate::core::{Category, EventKind, EventLog, EventLogEntry, Workload, WorkloadId};
pub use error::{Result, SimError};
pub use scheduler::{Algorithm, Scheduler};
pub use sim::{
    InputMode, SimConfig, SimulationReport, SimulationRun, Simulator, TimeScale, WorkloadInput,
};
