pub mod config;
pub mod driver;
pub mod input;
pub mod report;
pub mod scale;

pub use config::{MlfqConfig, MlqConfig, SimConfig};
pub use driver::{SimulationRun, Simulator};
pub use input::{InputMode, WorkloadInput, validate_inputs};
pub use report::{Averages, EventRecord, SimulationReport, WorkloadMetrics};
pub use scale::TimeScale;
