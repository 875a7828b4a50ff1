use keyed_priority_queue::KeyedPriorityQueue;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::VecDeque;

use super::state::{Ticks, Workload, WorkloadId};

/// Candidate-selection rule of one ready-queue level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Discipline {
    Fcfs,
    Spn,
    Hrrn,
    Srtf,
    RoundRobin,
}

impl Discipline {
    /// Whether a newly enqueued, strictly better workload displaces the one
    /// currently loading or executing from the same level.
    pub fn preempts_on_arrival(self) -> bool {
        matches!(self, Self::Srtf)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fcfs => "fcfs",
            Self::Spn => "spn",
            Self::Hrrn => "hrrn",
            Self::Srtf => "srtf",
            Self::RoundRobin => "rr",
        }
    }
}

/// Static ordering key for the keyed levels (SPN, SRTF).
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub struct Rank {
    key: Ticks,
    arrival: Ticks,
    id: WorkloadId,
}

// KeyedPriorityQueue is a max-heap, so flip the ordering: smallest key,
// then earliest arrival, then lowest id comes out first
impl PartialOrd for Rank {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Rank {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.key, other.arrival, other.id).cmp(&(self.key, self.arrival, self.id))
    }
}

#[derive(Debug)]
enum Entries {
    Fifo {
        ids: VecDeque<WorkloadId>,
    },
    Priq {
        ids: KeyedPriorityQueue<WorkloadId, Rank>,
    },
    // Key changes every tick (HRRN), so rescan on every selection
    Scan {
        ids: Vec<WorkloadId>,
    },
}

#[derive(Debug)]
pub struct ReadyQueueLevel {
    discipline: Discipline,
    quantum: Option<Ticks>,
    entries: Entries,
    pub arrival_flag: bool,
}

impl ReadyQueueLevel {
    pub fn new(discipline: Discipline, quantum: Option<Ticks>) -> Self {
        debug_assert!(quantum.is_none_or(|q| q > 0), "Quantum must be positive");

        let entries = match discipline {
            Discipline::Fcfs | Discipline::RoundRobin => Entries::Fifo {
                ids: VecDeque::new(),
            },
            Discipline::Spn | Discipline::Srtf => Entries::Priq {
                ids: KeyedPriorityQueue::new(),
            },
            Discipline::Hrrn => Entries::Scan { ids: Vec::new() },
        };

        Self {
            discipline,
            quantum,
            entries,
            arrival_flag: false,
        }
    }

    pub fn discipline(&self) -> Discipline {
        self.discipline
    }

    pub fn quantum(&self) -> Option<Ticks> {
        self.quantum
    }

    pub fn len(&self) -> usize {
        match &self.entries {
            Entries::Fifo { ids } => ids.len(),
            Entries::Priq { ids } => ids.len(),
            Entries::Scan { ids } => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: WorkloadId) -> bool {
        match &self.entries {
            Entries::Fifo { ids } => ids.contains(&id),
            Entries::Priq { ids } => ids.iter().any(|entry| *entry.0 == id),
            Entries::Scan { ids } => ids.contains(&id),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = WorkloadId> + '_> {
        match &self.entries {
            Entries::Fifo { ids } => Box::new(ids.iter().copied()),
            Entries::Priq { ids } => Box::new(ids.iter().map(|entry| *entry.0)),
            Entries::Scan { ids } => Box::new(ids.iter().copied()),
        }
    }

    pub(crate) fn push(&mut self, workload: &Workload) {
        match &mut self.entries {
            Entries::Fifo { ids } => ids.push_back(workload.id),
            Entries::Priq { ids } => {
                let key = match self.discipline {
                    Discipline::Spn => workload.burst,
                    _ => workload.remaining,
                };
                let rank = Rank {
                    key,
                    arrival: workload.arrival,
                    id: workload.id,
                };
                let previous = ids.push(workload.id, rank);
                debug_assert!(previous.is_none(), "Workload {} queued twice", workload.id);
            }
            Entries::Scan { ids } => ids.push(workload.id),
        }
        self.arrival_flag = true;
    }

    pub fn peek_best(&self, workloads: &[Workload]) -> Option<WorkloadId> {
        match &self.entries {
            Entries::Fifo { ids } => ids.front().copied(),
            Entries::Priq { ids } => ids.peek().map(|entry| *entry.0),
            Entries::Scan { ids } => highest_response_ratio(ids, workloads).map(|pos| ids[pos]),
        }
    }

    pub(crate) fn pop_best(&mut self, workloads: &[Workload]) -> Option<WorkloadId> {
        match &mut self.entries {
            Entries::Fifo { ids } => ids.pop_front(),
            Entries::Priq { ids } => ids.pop().map(|entry| entry.0),
            Entries::Scan { ids } => {
                let pos = highest_response_ratio(ids, workloads)?;
                Some(ids.remove(pos))
            }
        }
    }

    /// Strict comparison used by preemptive levels.
    pub fn is_better(&self, candidate: &Workload, current: &Workload) -> bool {
        match self.discipline {
            Discipline::Srtf => candidate.remaining < current.remaining,
            Discipline::Spn => candidate.burst < current.burst,
            Discipline::Hrrn => compare_ratio(candidate, current) == Ordering::Greater,
            Discipline::Fcfs | Discipline::RoundRobin => false,
        }
    }
}

/// Response ratio (wait + burst) / burst compared exactly by
/// cross-multiplication.
fn compare_ratio(a: &Workload, b: &Workload) -> Ordering {
    let lhs = (a.wait as u128 + a.burst as u128) * b.burst as u128;
    let rhs = (b.wait as u128 + b.burst as u128) * a.burst as u128;
    lhs.cmp(&rhs)
}

fn highest_response_ratio(ids: &[WorkloadId], workloads: &[Workload]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (pos, &id) in ids.iter().enumerate() {
        let candidate = &workloads[id];
        let wins = match best {
            None => true,
            Some(best_pos) => {
                let incumbent = &workloads[ids[best_pos]];
                compare_ratio(candidate, incumbent).then_with(|| {
                    (incumbent.arrival, incumbent.id).cmp(&(candidate.arrival, candidate.id))
                }) == Ordering::Greater
            }
        };
        if wins {
            best = Some(pos);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workload(id: WorkloadId, arrival: Ticks, burst: Ticks) -> Workload {
        Workload::new(id, arrival, burst, None)
    }

    fn fill(level: &mut ReadyQueueLevel, workloads: &[Workload]) {
        for w in workloads {
            level.push(w);
        }
    }

    #[test]
    fn test_fifo_pops_in_enqueue_order() {
        let workloads = vec![workload(0, 0, 5), workload(1, 1, 1), workload(2, 2, 3)];
        let mut level = ReadyQueueLevel::new(Discipline::RoundRobin, Some(2));
        fill(&mut level, &workloads);

        assert_eq!(level.pop_best(&workloads), Some(0));
        assert_eq!(level.pop_best(&workloads), Some(1));
        assert_eq!(level.pop_best(&workloads), Some(2));
        assert_eq!(level.pop_best(&workloads), None);
    }

    #[test]
    fn test_spn_picks_shortest_burst_with_tiebreak() {
        let workloads = vec![
            workload(0, 0, 6),
            workload(1, 2, 2),
            workload(2, 1, 2),
            workload(3, 1, 4),
        ];
        let mut level = ReadyQueueLevel::new(Discipline::Spn, None);
        fill(&mut level, &workloads);

        // Equal bursts: earliest arrival first
        assert_eq!(level.peek_best(&workloads), Some(2));
        assert_eq!(level.pop_best(&workloads), Some(2));
        assert_eq!(level.pop_best(&workloads), Some(1));
        assert_eq!(level.pop_best(&workloads), Some(3));
        assert_eq!(level.pop_best(&workloads), Some(0));
    }

    #[test]
    fn test_srtf_uses_remaining_at_enqueue() {
        let mut workloads = vec![workload(0, 0, 8), workload(1, 0, 3)];
        workloads[0].remaining = 2;
        let mut level = ReadyQueueLevel::new(Discipline::Srtf, None);
        fill(&mut level, &workloads);

        assert_eq!(level.pop_best(&workloads), Some(0));
        assert!(level.is_better(&workloads[0], &workloads[1]));
        assert!(!level.is_better(&workloads[1], &workloads[1]));
    }

    #[test]
    fn test_hrrn_rescans_live_wait() {
        let mut workloads = vec![workload(0, 0, 10), workload(1, 0, 2)];
        let mut level = ReadyQueueLevel::new(Discipline::Hrrn, None);
        fill(&mut level, &workloads);

        // Equal ratios (1.0): lowest id wins
        assert_eq!(level.peek_best(&workloads), Some(0));

        // (10 + 10) / 10 = 2.0 vs (1 + 2) / 2 = 1.5
        workloads[0].wait = 10;
        workloads[1].wait = 1;
        assert_eq!(level.peek_best(&workloads), Some(0));

        // (10 + 10) / 10 = 2.0 vs (4 + 2) / 2 = 3.0
        workloads[1].wait = 4;
        assert_eq!(level.pop_best(&workloads), Some(1));
        assert_eq!(level.len(), 1);
    }

    #[test]
    fn test_push_sets_arrival_flag_and_iter_sees_all() {
        let workloads = vec![workload(0, 0, 1), workload(1, 0, 2)];
        let mut level = ReadyQueueLevel::new(Discipline::Srtf, None);
        assert!(!level.arrival_flag);
        fill(&mut level, &workloads);

        assert!(level.arrival_flag);
        assert!(level.contains(1));
        let mut ids: Vec<_> = level.iter().collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![0, 1]);
    }
}
