use tracing::{debug, info};

use super::config::SimConfig;
use super::input::{InputMode, WorkloadInput, validate_inputs};
use super::report::SimulationReport;
use super::scale::TimeScale;
use crate::{
    core::{EventLog, SchedCore, Ticks, Workload, WorkloadId},
    error::{Result, SimError},
    scheduler::{
        Algorithm, MlfqScheduler, MlqScheduler, RunParams, Scheduler, SingleQueueScheduler,
    },
};

/// One run of one discipline over a workload set, advanced tick by tick.
pub struct SimulationRun<S: Scheduler> {
    pub core: SchedCore<S>,
    // Workload ids sorted by (arrival, id)
    arrival_order: Vec<WorkloadId>,
    arrival_cursor: usize,
}

impl<S: Scheduler> SimulationRun<S> {
    pub fn new(workloads: Vec<Workload>, params: &RunParams) -> Self {
        let mut arrival_order: Vec<WorkloadId> = workloads.iter().map(|w| w.id).collect();
        arrival_order.sort_by_key(|&id| (workloads[id].arrival, id));

        Self {
            core: SchedCore::new(workloads, params),
            arrival_order,
            arrival_cursor: 0,
        }
    }

    /// Admit arrivals, apply zero-time transitions and spend one tick.
    /// Returns false once the run is over and no tick was spent.
    pub fn step(&mut self) -> bool {
        self.handle_arrivals();
        self.core.settle();
        if self.is_finished() {
            return false;
        }
        self.core.tick();
        true
    }

    fn handle_arrivals(&mut self) {
        let now = self.core.now();
        while let Some(&id) = self.arrival_order.get(self.arrival_cursor) {
            // Contiguous, since arrival_order is sorted
            if self.core.ctx.workload(id).arrival > now {
                break;
            }
            self.core.admit(id);
            self.arrival_cursor += 1;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.arrival_cursor == self.arrival_order.len() && self.core.is_quiescent()
    }

    pub fn run_to_completion(mut self) -> (Vec<Workload>, EventLog) {
        let algorithm = self.core.scheduler.algorithm();
        debug!(
            %algorithm,
            workloads = self.arrival_order.len(),
            "Entering run loop"
        );

        while self.step() {}

        let unfinished = self
            .core
            .ctx
            .workloads
            .iter()
            .filter(|w| !w.is_terminated())
            .count();
        assert_eq!(unfinished, 0, "{algorithm} run ended with {unfinished} unfinished workloads");
        info!(
            %algorithm,
            ticks = self.core.now(),
            events = self.core.log().len(),
            steps = self.core.observer().steps(),
            "Simulation finished"
        );

        self.core.into_parts()
    }
}

/// A validated, scaled workload set that every compatible discipline can be
/// run against.
#[derive(Debug, Clone)]
pub struct Simulator {
    mode: InputMode,
    scale: TimeScale,
    workloads: Vec<Workload>,
    quantum: Ticks,
    context_switch: Ticks,
    config: SimConfig,
}

impl Simulator {
    pub fn new(inputs: &[WorkloadInput], config: SimConfig) -> Result<Self> {
        config.validate()?;
        let mode = validate_inputs(inputs)?;

        let scale = TimeScale::detect(
            [
                config.quantum,
                config.context_switch,
                config.context_switch / 2.0,
            ]
            .into_iter()
            .chain(inputs.iter().flat_map(|input| [input.arrival(), input.burst()])),
            config.max_decimal_digits,
        );

        let quantum = match scale.to_ticks(config.quantum) {
            Some(0) => {
                return Err(SimError::InvalidConfig(format!(
                    "quantum {} is below the {}-digit precision",
                    config.quantum, config.max_decimal_digits
                )));
            }
            Some(ticks) => ticks,
            None => {
                return Err(SimError::InvalidConfig(format!(
                    "quantum {} does not fit the tick range",
                    config.quantum
                )));
            }
        };
        config.validate_level_quanta(quantum)?;
        let context_switch = scale.to_ticks(config.context_switch).ok_or_else(|| {
            SimError::InvalidConfig(format!(
                "context switch {} does not fit the tick range",
                config.context_switch
            ))
        })?;

        let workloads = inputs
            .iter()
            .enumerate()
            .map(|(index, input)| {
                let ticks = |value: f64| {
                    scale
                        .to_ticks(value)
                        .ok_or(SimError::TimeOutOfRange { index, value })
                };
                let (arrival, burst) = (ticks(input.arrival())?, ticks(input.burst())?);
                if burst == 0 {
                    return Err(SimError::NonPositiveBurst {
                        index,
                        value: input.burst(),
                    });
                }
                Ok(Workload::new(index, arrival, burst, input.category()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            mode,
            scale,
            workloads,
            quantum,
            context_switch,
            config,
        })
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn scale(&self) -> TimeScale {
        self.scale
    }

    /// The scaled workloads as admitted, before any run.
    pub fn workloads(&self) -> &[Workload] {
        &self.workloads
    }

    pub fn available_algorithms(&self) -> &'static [Algorithm] {
        self.mode.algorithms()
    }

    pub fn run(&self, algorithm: Algorithm) -> Result<SimulationReport> {
        self.mode.check(algorithm)?;
        info!(
            %algorithm,
            workloads = self.workloads.len(),
            scale = self.scale.factor(),
            quantum = self.quantum,
            context_switch = self.context_switch,
            "Starting simulation"
        );

        let params = RunParams {
            algorithm,
            quantum: self.quantum,
            context_switch: self.context_switch,
            mlq: self.config.mlq.clone(),
            mlfq: self.config.mlfq.clone(),
        };
        let (workloads, log) = match algorithm {
            Algorithm::Mlq => self.execute::<MlqScheduler>(&params),
            Algorithm::Mlfq => self.execute::<MlfqScheduler>(&params),
            _ => self.execute::<SingleQueueScheduler>(&params),
        };

        Ok(SimulationReport::new(
            algorithm,
            self.scale,
            self.quantum,
            self.context_switch,
            workloads,
            log,
        ))
    }

    /// `run` with the algorithm given by name, e.g. `"srtf"` or `"Round_Robin"`.
    pub fn run_named(&self, name: &str) -> Result<SimulationReport> {
        self.run(name.parse()?)
    }

    /// Every algorithm the input mode supports, in declaration order.
    pub fn run_all(&self) -> Result<Vec<SimulationReport>> {
        self.available_algorithms()
            .iter()
            .map(|&algorithm| self.run(algorithm))
            .collect()
    }

    fn execute<S: Scheduler>(&self, params: &RunParams) -> (Vec<Workload>, EventLog) {
        SimulationRun::<S>::new(self.workloads.clone(), params).run_to_completion()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Category;

    fn standard(pairs: &[(f64, f64)]) -> Vec<WorkloadInput> {
        pairs.iter().copied().map(WorkloadInput::from).collect()
    }

    #[test]
    fn test_arrivals_admitted_in_time_then_id_order() {
        let sim = Simulator::new(
            &standard(&[(2.0, 1.0), (0.0, 1.0), (0.0, 1.0)]),
            SimConfig::default(),
        )
        .unwrap();
        let params = RunParams {
            algorithm: Algorithm::Fcfs,
            quantum: 1,
            context_switch: 0,
            mlq: Default::default(),
            mlfq: Default::default(),
        };
        let (_, log) =
            SimulationRun::<SingleQueueScheduler>::new(sim.workloads().to_vec(), &params)
                .run_to_completion();

        let executed: Vec<_> = log
            .iter()
            .filter(|entry| entry.kind == crate::core::EventKind::Executing)
            .filter_map(|entry| entry.workload)
            .collect();
        assert_eq!(executed, vec![1, 2, 0]);
    }

    #[test]
    fn test_step_reports_idle_gap_then_finishes() {
        let workloads = vec![Workload::new(0, 3, 1, None)];
        let params = RunParams {
            algorithm: Algorithm::Fcfs,
            quantum: 1,
            context_switch: 0,
            mlq: Default::default(),
            mlfq: Default::default(),
        };
        let mut run = SimulationRun::<SingleQueueScheduler>::new(workloads, &params);

        let mut ticks = 0;
        while run.step() {
            ticks += 1;
        }
        assert_eq!(ticks, 4);
        assert!(run.is_finished());
        assert_eq!(run.core.ctx.workload(0).completion, Some(4));
    }

    #[test]
    fn test_precision_comes_from_every_time_value() {
        let sim = Simulator::new(&standard(&[(0.0, 1.0)]), SimConfig::new(0.5, 0.0)).unwrap();
        assert_eq!(sim.scale().factor(), 10);
        assert_eq!(sim.workloads()[0].burst, 10);

        // Half of the context switch also counts
        let sim = Simulator::new(&standard(&[(0.0, 1.0)]), SimConfig::new(1.0, 0.5)).unwrap();
        assert_eq!(sim.scale().factor(), 100);
    }

    #[test]
    fn test_incompatible_algorithms_are_rejected() {
        let sim = Simulator::new(
            &[WorkloadInput::Mlq(0.0, 1.0, Category::Batch)],
            SimConfig::default(),
        )
        .unwrap();
        assert_eq!(sim.available_algorithms(), &[Algorithm::Mlq]);
        assert!(matches!(
            sim.run(Algorithm::Fcfs),
            Err(SimError::IncompatibleAlgorithm { .. })
        ));
        assert!(sim.run(Algorithm::Mlq).is_ok());
    }

    #[test]
    fn test_overflowing_level_quantum_is_rejected_up_front() {
        let mut config = SimConfig::default();
        config.mlq.interactive_multiplier = u64::MAX;
        let inputs = [WorkloadInput::Mlq(0.0, 1.0, Category::Interactive)];

        assert!(matches!(
            Simulator::new(&inputs, config.clone()),
            Err(SimError::InvalidConfig(_))
        ));

        config.mlq.interactive_multiplier = 3;
        // The base quantum fits, the 3x interactive band does not
        config.quantum = 4e15;
        assert!(matches!(
            Simulator::new(&inputs, config),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_times_beyond_tick_range_are_rejected() {
        // Five decimals push 1e15 past the exact f64 range
        let inputs = standard(&[(0.0, 0.00001), (1e15, 1.0)]);
        assert_eq!(
            Simulator::new(&inputs, SimConfig::default()).unwrap_err(),
            SimError::TimeOutOfRange {
                index: 1,
                value: 1e15
            }
        );
    }

    #[test]
    fn test_invalid_config_fails_before_inputs() {
        assert_eq!(
            Simulator::new(&[], SimConfig::new(0.0, 0.0)).unwrap_err(),
            SimError::NonPositiveQuantum(0.0)
        );
        assert_eq!(
            Simulator::new(&[], SimConfig::default()).unwrap_err(),
            SimError::EmptyInput
        );
    }
}
