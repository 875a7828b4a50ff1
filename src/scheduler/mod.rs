pub mod mlfq;
pub mod mlq;
pub mod single;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::core::{LevelId, RunCtx, Ticks, WorkloadId};
use crate::error::SimError;
use crate::sim::config::{MlfqConfig, MlqConfig};
pub use mlfq::MlfqScheduler;
pub use mlq::MlqScheduler;
pub use single::SingleQueueScheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Algorithm {
    Fcfs,
    Spn,
    Hrrn,
    Srtf,
    Rr,
    Mlq,
    Mlfq,
}

impl Algorithm {
    pub const ALL: [Algorithm; 7] = [
        Algorithm::Fcfs,
        Algorithm::Spn,
        Algorithm::Hrrn,
        Algorithm::Srtf,
        Algorithm::Rr,
        Algorithm::Mlq,
        Algorithm::Mlfq,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fcfs => "FCFS",
            Self::Spn => "SPN",
            Self::Hrrn => "HRRN",
            Self::Srtf => "SRTF",
            Self::Rr => "RR",
            Self::Mlq => "MLQ",
            Self::Mlfq => "MLFQ",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fcfs" | "first_come_first_served" => Ok(Self::Fcfs),
            "spn" | "sjf" | "shortest_process_next" => Ok(Self::Spn),
            "hrrn" | "highest_response_ratio_next" => Ok(Self::Hrrn),
            "srtf" | "shortest_remaining_time_first" => Ok(Self::Srtf),
            "rr" | "round_robin" | "roundrobin" => Ok(Self::Rr),
            "mlq" | "multi_level_queue" => Ok(Self::Mlq),
            "mlfq" | "multi_level_feedback_queue" => Ok(Self::Mlfq),
            _ => Err(SimError::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl Serialize for Algorithm {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Algorithm {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Scaled, validated parameters handed to a scheduler when a run starts.
#[derive(Debug, Clone)]
pub struct RunParams {
    pub algorithm: Algorithm,
    pub quantum: Ticks,
    pub context_switch: Ticks,
    pub mlq: MlqConfig,
    pub mlfq: MlfqConfig,
}

/// A scheduling discipline plugged into the context-switch engine.
///
/// The engine owns the CPU state machine; a scheduler only lays out ready
/// queues, routes workloads into them and decides preemption.
pub trait Scheduler {
    /// Create the ready-queue levels this discipline needs.
    fn init(ctx: &mut RunCtx, params: &RunParams) -> Self
    where
        Self: Sized;

    fn algorithm(&self) -> Algorithm;

    /// Level a newly arrived workload joins.
    fn admit_level(&self, ctx: &RunCtx, workload: WorkloadId) -> LevelId;

    /// Called when `workload` used up its quantum. The workload is back in
    /// Ready and not queued yet; it is re-enqueued at its `level` after the
    /// context save.
    fn quantum_expired(&mut self, _ctx: &mut RunCtx, _workload: WorkloadId) {}

    /// Remove and return the next workload to dispatch: the best candidate
    /// of the highest non-empty level.
    fn pick_next(&mut self, ctx: &mut RunCtx) -> Option<WorkloadId> {
        let level = ctx.highest_ready_level()?;
        ctx.take_best(level)
    }

    /// Whether `current` (loading or executing) must give up the CPU: any
    /// higher level holds a Ready workload, or its own preemptive level
    /// received a strictly better one.
    fn should_preempt(&mut self, ctx: &mut RunCtx, current: WorkloadId) -> bool {
        let level = ctx.workload(current).level;
        if ctx.highest_ready_level().is_some_and(|ready| ready < level) {
            return true;
        }
        ctx.better_candidate_waiting(current)
    }
}
