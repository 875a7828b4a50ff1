use rustc_hash::FxHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::queue::{Discipline, ReadyQueueLevel};
use crate::error::SimError;

// Index into the workload Vec
pub type WorkloadId = usize;
// Index into the ready-queue level Vec; lower is higher priority
pub type LevelId = usize;
pub type Ticks = u64;

/// Upper bound on ready-queue levels a single run may create.
pub const MAX_LEVELS: usize = 8;

/// MLQ priority band tag carried by a workload for its whole life.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    RealTime,
    System,
    Interactive,
    Batch,
}

impl Category {
    /// Bands in priority order.
    pub const ALL: [Category; 4] = [
        Category::RealTime,
        Category::System,
        Category::Interactive,
        Category::Batch,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RealTime => "real_time",
            Self::System => "system",
            Self::Interactive => "interactive",
            Self::Batch => "batch",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "real_time" | "realtime" => Ok(Self::RealTime),
            "system" => Ok(Self::System),
            "interactive" => Ok(Self::Interactive),
            "batch" => Ok(Self::Batch),
            _ => Err(SimError::UnknownCategory(s.to_string())),
        }
    }
}

impl Serialize for Category {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadState {
    New,
    Ready,
    Running,
    Terminated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workload {
    pub id: WorkloadId,
    pub arrival: Ticks,
    pub burst: Ticks,
    pub remaining: Ticks,
    pub category: Option<Category>,
    pub level: LevelId,
    pub state: WorkloadState,
    pub start: Option<Ticks>,
    pub response: Option<Ticks>,
    pub completion: Option<Ticks>,
    pub turnaround: Option<Ticks>,
    pub wait: Ticks,
}

impl Workload {
    pub fn new(id: WorkloadId, arrival: Ticks, burst: Ticks, category: Option<Category>) -> Self {
        assert!(burst > 0, "Workload {id} must have a positive burst");
        Self {
            id,
            arrival,
            burst,
            remaining: burst,
            category,
            level: 0,
            state: WorkloadState::New,
            start: None,
            response: None,
            completion: None,
            turnaround: None,
            wait: 0,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.state == WorkloadState::Terminated
    }
}

/// Everything one simulation run mutates: the clock, the workload arena and
/// the ready-queue levels. Queues hold ids only; the arena owns the data.
#[derive(Debug)]
pub struct RunCtx {
    pub now: Ticks,
    pub workloads: Vec<Workload>,
    pub levels: Vec<ReadyQueueLevel>,
    pub workload_to_level: FxHashMap<WorkloadId, LevelId>,
}

impl RunCtx {
    pub fn new(workloads: Vec<Workload>) -> Self {
        for (index, workload) in workloads.iter().enumerate() {
            debug_assert_eq!(workload.id, index, "WorkloadId must match Vec index");
        }

        Self {
            now: 0,
            workloads,
            levels: Vec::with_capacity(MAX_LEVELS),
            workload_to_level: FxHashMap::default(),
        }
    }

    pub fn advance_time(&mut self, delta: Ticks) {
        self.now = self.now.saturating_add(delta);
    }

    pub fn create_level(&mut self, discipline: Discipline, quantum: Option<Ticks>) -> LevelId {
        assert!(
            self.levels.len() < MAX_LEVELS,
            "At most {MAX_LEVELS} ready-queue levels are supported"
        );
        self.levels.push(ReadyQueueLevel::new(discipline, quantum));
        self.levels.len() - 1
    }

    pub fn level(&self, level: LevelId) -> &ReadyQueueLevel {
        &self.levels[level]
    }

    pub fn level_mut(&mut self, level: LevelId) -> &mut ReadyQueueLevel {
        &mut self.levels[level]
    }

    pub fn workload(&self, id: WorkloadId) -> &Workload {
        &self.workloads[id]
    }

    pub fn workload_mut(&mut self, id: WorkloadId) -> &mut Workload {
        &mut self.workloads[id]
    }

    pub fn is_queued(&self, id: WorkloadId) -> bool {
        self.workload_to_level.contains_key(&id)
    }

    pub fn enqueue(&mut self, level: LevelId, id: WorkloadId) {
        assert!(
            !self.workload_to_level.contains_key(&id),
            "Workload {id} already present in some ready queue"
        );

        let workload = &mut self.workloads[id];
        assert!(
            matches!(workload.state, WorkloadState::New | WorkloadState::Ready),
            "Workload {id} must be New or Ready when enqueued, found {:?}",
            workload.state
        );
        workload.state = WorkloadState::Ready;
        workload.level = level;

        let queue = self.levels.get_mut(level).expect("Unknown ready-queue level");
        queue.push(workload);
        self.workload_to_level.insert(id, level);
    }

    /// Remove and return the level's best candidate. Clears the level's
    /// arrival flag, since the choice already accounts for every arrival.
    pub fn take_best(&mut self, level: LevelId) -> Option<WorkloadId> {
        let queue = self.levels.get_mut(level)?;
        queue.arrival_flag = false;
        let id = queue.pop_best(&self.workloads)?;

        let removed = self.workload_to_level.remove(&id);
        debug_assert_eq!(removed, Some(level), "Workload {id} missing queue membership");

        Some(id)
    }

    pub fn best_candidate(&self, level: LevelId) -> Option<WorkloadId> {
        self.levels.get(level)?.peek_best(&self.workloads)
    }

    /// Lowest-index level holding at least one Ready workload.
    pub fn highest_ready_level(&self) -> Option<LevelId> {
        self.levels.iter().position(|level| !level.is_empty())
    }

    pub fn all_queues_empty(&self) -> bool {
        self.workload_to_level.is_empty()
    }

    /// True when `current`'s own level holds a strictly better candidate and
    /// something was enqueued there since the last look.
    pub fn better_candidate_waiting(&mut self, current: WorkloadId) -> bool {
        let level = self.workloads[current].level;
        let queue = &mut self.levels[level];
        if !queue.discipline().preempts_on_arrival() || !queue.arrival_flag {
            return false;
        }
        queue.arrival_flag = false;

        let queue = &self.levels[level];
        queue
            .peek_best(&self.workloads)
            .is_some_and(|candidate| {
                queue.is_better(&self.workloads[candidate], &self.workloads[current])
            })
    }

    pub fn accrue_wait(&mut self, delta: Ticks) {
        for level in &self.levels {
            for id in level.iter() {
                self.workloads[id].wait += delta;
            }
        }
    }

    pub fn mark_running(&mut self, id: WorkloadId) {
        debug_assert!(
            !self.workload_to_level.contains_key(&id),
            "Running workload {id} must not be enqueued"
        );
        let now = self.now;
        let workload = &mut self.workloads[id];
        assert_eq!(
            workload.state,
            WorkloadState::Ready,
            "Workload {id} must be Ready before it runs"
        );

        workload.state = WorkloadState::Running;
        if workload.start.is_none() {
            workload.start = Some(now);
            workload.response = Some(now - workload.arrival);
        }
    }

    pub fn mark_preempted(&mut self, id: WorkloadId) {
        let workload = &mut self.workloads[id];
        assert_eq!(
            workload.state,
            WorkloadState::Running,
            "Only a running workload {id} can be preempted"
        );
        assert!(workload.remaining > 0, "Finished workload {id} cannot be preempted");
        workload.state = WorkloadState::Ready;
    }

    pub fn mark_terminated(&mut self, id: WorkloadId) {
        let now = self.now;
        let workload = &mut self.workloads[id];
        assert_eq!(
            workload.state,
            WorkloadState::Running,
            "Workload {id} must have been running before marked terminated"
        );
        assert_eq!(workload.remaining, 0, "Workload {id} terminated with burst left");

        workload.state = WorkloadState::Terminated;
        workload.completion = Some(now);
        workload.turnaround = Some(now - workload.arrival);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx_with(bursts: &[Ticks]) -> RunCtx {
        let workloads = bursts
            .iter()
            .enumerate()
            .map(|(id, &burst)| Workload::new(id, 0, burst, None))
            .collect();
        RunCtx::new(workloads)
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("real_time".parse::<Category>(), Ok(Category::RealTime));
        assert_eq!("Real-Time".parse::<Category>(), Ok(Category::RealTime));
        assert_eq!("BATCH".parse::<Category>(), Ok(Category::Batch));
        assert!(matches!(
            "general".parse::<Category>(),
            Err(SimError::UnknownCategory(_))
        ));
    }

    #[test]
    fn test_enqueue_and_take_tracks_membership() {
        let mut ctx = ctx_with(&[3, 1]);
        let level = ctx.create_level(Discipline::Fcfs, None);

        ctx.enqueue(level, 0);
        ctx.enqueue(level, 1);
        assert!(ctx.is_queued(0));
        assert_eq!(ctx.workload(1).state, WorkloadState::Ready);
        assert!(ctx.level(level).arrival_flag);

        assert_eq!(ctx.take_best(level), Some(0));
        assert!(!ctx.is_queued(0));
        assert!(!ctx.level(level).arrival_flag);
        assert_eq!(ctx.highest_ready_level(), Some(level));
    }

    #[test]
    #[should_panic(expected = "already present")]
    fn test_double_enqueue_panics() {
        let mut ctx = ctx_with(&[2]);
        let level = ctx.create_level(Discipline::Fcfs, None);
        ctx.enqueue(level, 0);
        ctx.enqueue(level, 0);
    }

    #[test]
    fn test_accrue_wait_only_counts_queued() {
        let mut ctx = ctx_with(&[2, 2]);
        let level = ctx.create_level(Discipline::RoundRobin, Some(1));
        ctx.enqueue(level, 0);
        ctx.enqueue(level, 1);
        let running = ctx.take_best(level).unwrap();

        ctx.accrue_wait(1);
        assert_eq!(ctx.workload(running).wait, 0);
        assert_eq!(ctx.workload(1).wait, 1);
    }

    #[test]
    fn test_lifecycle_stamps() {
        let mut ctx = ctx_with(&[1]);
        let level = ctx.create_level(Discipline::Fcfs, None);
        ctx.advance_time(2);
        ctx.enqueue(level, 0);
        let id = ctx.take_best(level).unwrap();
        ctx.advance_time(3);
        ctx.mark_running(id);
        ctx.workload_mut(id).remaining = 0;
        ctx.advance_time(1);
        ctx.mark_terminated(id);

        let workload = ctx.workload(id);
        assert_eq!(workload.start, Some(5));
        assert_eq!(workload.response, Some(5));
        assert_eq!(workload.completion, Some(6));
        assert_eq!(workload.turnaround, Some(6));
    }
}
