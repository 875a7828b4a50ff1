use tracing::debug;

use super::{Algorithm, RunParams, Scheduler};
use crate::core::{Discipline, LevelId, RunCtx, WorkloadId};

/// Multi-level feedback queue.
///
/// Every workload enters level 0. Level `i < round_robin_levels` is RR with
/// quantum `q * (i + 1)`; the final level is non-preemptive FCFS. Using up a
/// quantum demotes the workload one level; being preempted by a higher
/// level does not. All levels are allocated up front and indexed by number.
pub struct MlfqScheduler {
    last_level: LevelId,
}

impl Scheduler for MlfqScheduler {
    fn init(ctx: &mut RunCtx, params: &RunParams) -> Self {
        for i in 0..params.mlfq.round_robin_levels {
            ctx.create_level(Discipline::RoundRobin, Some(params.quantum * (i as u64 + 1)));
        }
        let last_level = ctx.create_level(Discipline::Fcfs, None);

        Self { last_level }
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::Mlfq
    }

    fn admit_level(&self, _ctx: &RunCtx, _workload: WorkloadId) -> LevelId {
        0
    }

    fn quantum_expired(&mut self, ctx: &mut RunCtx, workload: WorkloadId) {
        let now = ctx.now;
        let w = ctx.workload_mut(workload);
        let demoted = (w.level + 1).min(self.last_level);
        if demoted != w.level {
            debug!(
                workload,
                from = w.level,
                to = demoted,
                tick = now,
                "Demoting workload after quantum expiry"
            );
        }
        w.level = demoted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Workload;
    use crate::sim::config::{MlfqConfig, MlqConfig};

    fn setup(round_robin_levels: usize) -> (RunCtx, MlfqScheduler) {
        let mut ctx = RunCtx::new(vec![
            Workload::new(0, 0, 50, None),
            Workload::new(1, 0, 5, None),
        ]);
        let params = RunParams {
            algorithm: Algorithm::Mlfq,
            quantum: 3,
            context_switch: 0,
            mlq: MlqConfig::default(),
            mlfq: MlfqConfig { round_robin_levels },
        };
        let scheduler = MlfqScheduler::init(&mut ctx, &params);
        (ctx, scheduler)
    }

    #[test]
    fn test_level_layout() {
        let (ctx, _) = setup(3);
        let quanta: Vec<_> = ctx.levels.iter().map(|level| level.quantum()).collect();
        assert_eq!(quanta, vec![Some(3), Some(6), Some(9), None]);
        assert_eq!(ctx.level(3).discipline(), Discipline::Fcfs);
    }

    #[test]
    fn test_demotion_stops_at_last_level() {
        let (mut ctx, mut scheduler) = setup(2);
        let mut levels = Vec::new();
        for _ in 0..4 {
            scheduler.quantum_expired(&mut ctx, 0);
            levels.push(ctx.workload(0).level);
        }
        assert_eq!(levels, vec![1, 2, 2, 2]);
    }

    #[test]
    fn test_arrival_at_top_preempts_lower_level() {
        let (mut ctx, mut scheduler) = setup(3);
        ctx.enqueue(1, 0);
        let current = scheduler.pick_next(&mut ctx).unwrap();
        assert_eq!(current, 0);

        let level = scheduler.admit_level(&ctx, 1);
        ctx.enqueue(level, 1);
        assert!(scheduler.should_preempt(&mut ctx, current));
    }
}
