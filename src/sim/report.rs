use average::{Estimate, Mean};
use serde::Serialize;

use super::scale::TimeScale;
use crate::core::{Category, EventKind, EventLog, LevelId, Ticks, Workload, WorkloadId};
use crate::scheduler::Algorithm;

/// An event log entry with its times converted back to real units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    pub algorithm: Algorithm,
    pub start: f64,
    pub end: f64,
    pub workload: Option<WorkloadId>,
    pub level: Option<LevelId>,
    pub kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkloadMetrics {
    pub id: WorkloadId,
    pub category: Option<Category>,
    pub arrival: f64,
    pub burst: f64,
    pub start: f64,
    pub completion: f64,
    pub turnaround: f64,
    pub wait: f64,
    pub response: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Averages {
    pub turnaround: f64,
    pub wait: f64,
    pub response: f64,
}

/// Everything an external consumer gets from one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub algorithm: Algorithm,
    pub scale: u64,
    pub quantum: f64,
    pub context_switch: f64,
    pub makespan: f64,
    pub cpu_utilization: f64,
    pub averages: Averages,
    pub workloads: Vec<WorkloadMetrics>,
    pub events: Vec<EventRecord>,
    #[serde(skip)]
    tick_log: EventLog,
    #[serde(skip)]
    final_workloads: Vec<Workload>,
}

impl SimulationReport {
    pub(crate) fn new(
        algorithm: Algorithm,
        scale: TimeScale,
        quantum: Ticks,
        context_switch: Ticks,
        workloads: Vec<Workload>,
        log: EventLog,
    ) -> Self {
        let metrics: Vec<WorkloadMetrics> = workloads
            .iter()
            .map(|workload| workload_metrics(workload, &scale))
            .collect();

        let averages = Averages {
            turnaround: mean(metrics.iter().map(|m| m.turnaround)),
            wait: mean(metrics.iter().map(|m| m.wait)),
            response: mean(metrics.iter().map(|m| m.response)),
        };

        let last_tick = log.last_tick();
        let cpu_utilization = if last_tick == 0 {
            0.0
        } else {
            log.busy_ticks() as f64 / last_tick as f64
        };
        let makespan = workloads
            .iter()
            .filter_map(|workload| workload.completion)
            .max()
            .unwrap_or(0);

        let events = log
            .iter()
            .map(|entry| EventRecord {
                algorithm: entry.algorithm,
                start: scale.to_real(entry.start),
                end: scale.to_real(entry.end),
                workload: entry.workload,
                level: entry.level,
                kind: entry.kind,
            })
            .collect();

        Self {
            algorithm,
            scale: scale.factor(),
            quantum: scale.to_real(quantum),
            context_switch: scale.to_real(context_switch),
            makespan: scale.to_real(makespan),
            cpu_utilization,
            averages,
            workloads: metrics,
            events,
            tick_log: log,
            final_workloads: workloads,
        }
    }

    pub fn metrics(&self, id: WorkloadId) -> Option<&WorkloadMetrics> {
        self.workloads.iter().find(|m| m.id == id)
    }

    /// The raw event log, in ticks.
    pub fn tick_log(&self) -> &EventLog {
        &self.tick_log
    }

    /// Workload state at the end of the run, in ticks.
    pub fn final_workloads(&self) -> &[Workload] {
        &self.final_workloads
    }
}

fn workload_metrics(workload: &Workload, scale: &TimeScale) -> WorkloadMetrics {
    let stamp = |value: Option<Ticks>, what: &str| {
        let ticks = value.unwrap_or_else(|| {
            panic!("Workload {} finished the run without a {what} stamp", workload.id)
        });
        scale.to_real(ticks)
    };

    WorkloadMetrics {
        id: workload.id,
        category: workload.category,
        arrival: scale.to_real(workload.arrival),
        burst: scale.to_real(workload.burst),
        start: stamp(workload.start, "start"),
        completion: stamp(workload.completion, "completion"),
        turnaround: stamp(workload.turnaround, "turnaround"),
        wait: scale.to_real(workload.wait),
        response: stamp(workload.response, "response"),
    }
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    values.collect::<Mean>().estimate()
}
