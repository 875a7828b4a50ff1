pub mod driver;
pub mod event;
pub mod observer;
pub mod queue;
pub mod state;

pub use driver::{CpuPhase, SchedCore};
pub use event::{EventKind, EventLog, EventLogEntry};
pub use observer::Observer;
pub use queue::{Discipline, ReadyQueueLevel};
pub use state::{
    Category, LevelId, MAX_LEVELS, RunCtx, Ticks, Workload, WorkloadId, WorkloadState,
};
