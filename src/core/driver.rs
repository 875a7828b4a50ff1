use tracing::{debug, trace};

use super::{
    event::{EventKind, EventLog, EventLogEntry},
    observer::Observer,
    state::{RunCtx, Ticks, Workload, WorkloadId},
};
use crate::scheduler::{RunParams, Scheduler};

/// What the single CPU is doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuPhase {
    Idle,
    ContextLoad { workload: WorkloadId, progress: Ticks },
    Executing { workload: WorkloadId, slice_used: Ticks },
    ContextSave { workload: WorkloadId, progress: Ticks },
}

impl CpuPhase {
    pub fn workload(&self) -> Option<WorkloadId> {
        match *self {
            Self::Idle => None,
            Self::ContextLoad { workload, .. }
            | Self::Executing { workload, .. }
            | Self::ContextSave { workload, .. } => Some(workload),
        }
    }
}

enum Transition {
    // Phase changed without time passing; look again
    Moved,
    // Phase needs the next tick
    Settled,
}

/// The context-switch engine: IDLE / LOAD / EXECUTING / SAVE shared by every
/// discipline. The scheduler supplies candidate selection and preemption.
pub struct SchedCore<S: Scheduler> {
    pub ctx: RunCtx,
    pub scheduler: S,
    phase: CpuPhase,
    half_cs: Ticks,
    segment_start: Ticks,
    log: EventLog,
    observer: Observer,
}

impl<S: Scheduler> SchedCore<S> {
    pub fn new(workloads: Vec<Workload>, params: &RunParams) -> Self {
        let mut ctx = RunCtx::new(workloads);
        let scheduler = S::init(&mut ctx, params);
        Self {
            ctx,
            scheduler,
            phase: CpuPhase::Idle,
            // Odd costs lose a tick here: both halves get the floor
            half_cs: params.context_switch / 2,
            segment_start: 0,
            log: EventLog::new(),
            observer: Observer::new(),
        }
    }

    /// Put a newly arrived workload into its ready queue.
    pub fn admit(&mut self, workload: WorkloadId) {
        let level = self.scheduler.admit_level(&self.ctx, workload);
        self.ctx.enqueue(level, workload);
        trace!(workload, level, tick = self.ctx.now, "Workload arrived");

        let now = self.ctx.now;
        self.log.record(EventLogEntry {
            algorithm: self.scheduler.algorithm(),
            start: now,
            end: now,
            workload: Some(workload),
            level: Some(level),
            kind: EventKind::Arrival,
        });
    }

    /// Apply every zero-time transition available at the current tick.
    pub fn settle(&mut self) {
        while let Transition::Moved = self.transition() {}
    }

    /// Spend one tick in the current phase.
    pub fn tick(&mut self) {
        match &mut self.phase {
            CpuPhase::Idle => {}
            CpuPhase::ContextLoad { progress, .. } | CpuPhase::ContextSave { progress, .. } => {
                *progress += 1;
            }
            CpuPhase::Executing {
                workload,
                slice_used,
            } => {
                let w = self.ctx.workload_mut(*workload);
                assert!(w.remaining > 0, "Executing workload {} has no burst left", w.id);
                w.remaining -= 1;
                *slice_used += 1;
            }
        }

        self.ctx.accrue_wait(1);
        self.ctx.advance_time(1);
        self.observer.observe(&self.ctx, &self.phase);
    }

    fn transition(&mut self) -> Transition {
        match self.phase {
            CpuPhase::Idle => {
                let Some(next) = self.scheduler.pick_next(&mut self.ctx) else {
                    return Transition::Settled;
                };
                self.close_segment(EventKind::Idle, None);
                debug!(workload = next, tick = self.ctx.now, "Dispatching workload");
                self.phase = CpuPhase::ContextLoad {
                    workload: next,
                    progress: 0,
                };
                Transition::Moved
            }

            CpuPhase::ContextLoad { workload, progress } => {
                if self.scheduler.should_preempt(&mut self.ctx, workload) {
                    self.close_segment(EventKind::ContextAbort, Some(workload));
                    debug!(workload, tick = self.ctx.now, "Aborting context load");
                    let level = self.ctx.workload(workload).level;
                    self.ctx.enqueue(level, workload);
                    self.phase = CpuPhase::Idle;
                    return Transition::Moved;
                }
                if progress < self.half_cs {
                    return Transition::Settled;
                }

                self.close_segment(EventKind::ContextLoad, Some(workload));
                self.ctx.mark_running(workload);
                self.phase = CpuPhase::Executing {
                    workload,
                    slice_used: 0,
                };
                Transition::Moved
            }

            CpuPhase::Executing {
                workload,
                slice_used,
            } => {
                if self.ctx.workload(workload).remaining == 0 {
                    self.close_segment(EventKind::Executing, Some(workload));
                    self.ctx.mark_terminated(workload);
                    debug!(workload, tick = self.ctx.now, "Workload terminated");
                    self.begin_save(workload);
                    return Transition::Moved;
                }

                if self.scheduler.should_preempt(&mut self.ctx, workload) {
                    self.close_segment(EventKind::Executing, Some(workload));
                    self.ctx.mark_preempted(workload);
                    debug!(workload, tick = self.ctx.now, "Workload preempted");
                    self.begin_save(workload);
                    return Transition::Moved;
                }

                let level = self.ctx.workload(workload).level;
                let expired = self
                    .ctx
                    .level(level)
                    .quantum()
                    .is_some_and(|quantum| slice_used >= quantum);
                if expired {
                    self.close_segment(EventKind::Executing, Some(workload));
                    self.ctx.mark_preempted(workload);
                    self.scheduler.quantum_expired(&mut self.ctx, workload);
                    debug!(workload, tick = self.ctx.now, "Quantum expired");
                    self.begin_save(workload);
                    return Transition::Moved;
                }

                Transition::Settled
            }

            CpuPhase::ContextSave { workload, progress } => {
                if progress < self.half_cs {
                    return Transition::Settled;
                }

                self.close_segment(EventKind::ContextSave, Some(workload));
                if !self.ctx.workload(workload).is_terminated() {
                    let level = self.ctx.workload(workload).level;
                    self.ctx.enqueue(level, workload);
                }
                self.phase = CpuPhase::Idle;
                Transition::Moved
            }
        }
    }

    fn begin_save(&mut self, workload: WorkloadId) {
        self.phase = CpuPhase::ContextSave {
            workload,
            progress: 0,
        };
    }

    // Log the segment that ends now and start the next one
    fn close_segment(&mut self, kind: EventKind, workload: Option<WorkloadId>) {
        let now = self.ctx.now;
        self.log.record(EventLogEntry {
            algorithm: self.scheduler.algorithm(),
            start: self.segment_start,
            end: now,
            workload,
            level: workload.map(|id| self.ctx.workload(id).level),
            kind,
        });
        self.segment_start = now;
    }

    /// Nothing loading, executing or saving and every ready queue drained.
    pub fn is_quiescent(&self) -> bool {
        self.phase == CpuPhase::Idle && self.ctx.all_queues_empty()
    }

    pub fn now(&self) -> Ticks {
        self.ctx.now
    }

    pub fn phase(&self) -> CpuPhase {
        self.phase
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }

    pub fn into_parts(self) -> (Vec<Workload>, EventLog) {
        (self.ctx.workloads, self.log)
    }
}
