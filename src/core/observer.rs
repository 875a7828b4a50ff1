use super::driver::CpuPhase;
use super::state::{RunCtx, WorkloadState};

/// Debug-build invariant checks run after every tick.
#[derive(Debug, Default)]
pub struct Observer {
    step: u64,
}

impl Observer {
    pub fn new() -> Self {
        Self { step: 0 }
    }

    pub fn steps(&self) -> u64 {
        self.step
    }

    pub fn observe(&mut self, ctx: &RunCtx, phase: &CpuPhase) {
        self.step += 1;

        if let Some(workload_id) = phase.workload() {
            let workload = ctx.workload(workload_id);
            debug_assert!(
                !ctx.is_queued(workload_id),
                "Workload {workload_id} on the CPU must not appear in any ready queue"
            );
            match phase {
                CpuPhase::Executing { .. } => debug_assert_eq!(
                    workload.state,
                    WorkloadState::Running,
                    "Executing workload {workload_id} must be Running"
                ),
                CpuPhase::ContextLoad { .. } => debug_assert_eq!(
                    workload.state,
                    WorkloadState::Ready,
                    "Loading workload {workload_id} must still be Ready"
                ),
                _ => {}
            }
        }

        for workload in &ctx.workloads {
            debug_assert!(
                workload.remaining <= workload.burst,
                "Workload {} remaining {} exceeds burst {}",
                workload.id,
                workload.remaining,
                workload.burst
            );
        }

        for (&workload_id, &level_id) in &ctx.workload_to_level {
            let workload = ctx.workload(workload_id);
            debug_assert_eq!(
                workload.state,
                WorkloadState::Ready,
                "Queued workload {workload_id} must be Ready"
            );
            debug_assert_eq!(
                workload.level, level_id,
                "Workload {workload_id} level metadata mismatch"
            );
            if let Some(level) = ctx.levels.get(level_id) {
                debug_assert!(
                    level.contains(workload_id),
                    "Workload {workload_id} mapped to level {level_id}, which does not hold it"
                );
            } else {
                debug_assert!(false, "workload_to_level references unknown level {level_id}");
            }
        }
    }
}
