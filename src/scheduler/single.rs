use super::{Algorithm, RunParams, Scheduler};
use crate::core::{Discipline, LevelId, RunCtx, WorkloadId};

/// One ready queue running a leaf discipline: FCFS, SPN, HRRN, SRTF or RR.
pub struct SingleQueueScheduler {
    algorithm: Algorithm,
    level: LevelId,
}

impl Scheduler for SingleQueueScheduler {
    fn init(ctx: &mut RunCtx, params: &RunParams) -> Self {
        let (discipline, quantum) = match params.algorithm {
            Algorithm::Fcfs => (Discipline::Fcfs, None),
            Algorithm::Spn => (Discipline::Spn, None),
            Algorithm::Hrrn => (Discipline::Hrrn, None),
            Algorithm::Srtf => (Discipline::Srtf, None),
            Algorithm::Rr => (Discipline::RoundRobin, Some(params.quantum)),
            other => panic!("{other} is not a single-queue discipline"),
        };

        Self {
            algorithm: params.algorithm,
            level: ctx.create_level(discipline, quantum),
        }
    }

    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    fn admit_level(&self, _ctx: &RunCtx, _workload: WorkloadId) -> LevelId {
        self.level
    }
}
