use super::{Algorithm, RunParams, Scheduler};
use crate::core::{Category, Discipline, LevelId, RunCtx, WorkloadId};

/// Multi-level queue: four permanent bands in strict priority order.
///
/// | band        | discipline | quantum                  |
/// |-------------|------------|--------------------------|
/// | real_time   | RR         | q × real_time_multiplier |
/// | system      | SPN        | -                        |
/// | interactive | RR         | q × interactive_multiplier |
/// | batch       | FCFS       | -                        |
///
/// A workload's category pins it to one band for life.
pub struct MlqScheduler {
    bands: [LevelId; 4],
}

impl MlqScheduler {
    fn band_of(category: Category) -> usize {
        match category {
            Category::RealTime => 0,
            Category::System => 1,
            Category::Interactive => 2,
            Category::Batch => 3,
        }
    }
}

impl Scheduler for MlqScheduler {
    fn init(ctx: &mut RunCtx, params: &RunParams) -> Self {
        let bands = Category::ALL.map(|category| match category {
            Category::RealTime => ctx.create_level(
                Discipline::RoundRobin,
                Some(params.quantum * params.mlq.real_time_multiplier),
            ),
            Category::System => ctx.create_level(Discipline::Spn, None),
            Category::Interactive => ctx.create_level(
                Discipline::RoundRobin,
                Some(params.quantum * params.mlq.interactive_multiplier),
            ),
            Category::Batch => ctx.create_level(Discipline::Fcfs, None),
        });

        Self { bands }
    }

    fn algorithm(&self) -> Algorithm {
        Algorithm::Mlq
    }

    fn admit_level(&self, ctx: &RunCtx, workload: WorkloadId) -> LevelId {
        let category = ctx
            .workload(workload)
            .category
            .expect("MLQ workload must carry a category");
        self.bands[Self::band_of(category)]
    }
}
