use serde::Serialize;

use crate::core::{LevelId, Ticks, WorkloadId};
use crate::scheduler::Algorithm;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    // Zero-duration marker at the instant a workload enters a ready queue
    Arrival,
    Idle,
    ContextLoad,
    ContextSave,
    Executing,
    // Partial load cut short by a better candidate
    ContextAbort,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventLogEntry {
    pub algorithm: Algorithm,
    pub start: Ticks,
    pub end: Ticks,
    pub workload: Option<WorkloadId>,
    pub level: Option<LevelId>,
    pub kind: EventKind,
}

impl EventLogEntry {
    pub fn duration(&self) -> Ticks {
        self.end - self.start
    }
}

/// Append-only record of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EventLog {
    entries: Vec<EventLogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `entry`, dropping it if it is a zero-length segment. Returns
    /// whether the entry was kept.
    pub fn record(&mut self, entry: EventLogEntry) -> bool {
        assert!(
            entry.end >= entry.start,
            "Event {:?} ends before it starts ({} < {})",
            entry.kind,
            entry.end,
            entry.start
        );
        if entry.kind != EventKind::Arrival && entry.end == entry.start {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn entries(&self) -> &[EventLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EventLogEntry> {
        self.entries.iter()
    }

    /// Entries of `kind` that belong to `workload`, in log order.
    pub fn segments(
        &self,
        workload: WorkloadId,
        kind: EventKind,
    ) -> impl Iterator<Item = &EventLogEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.workload == Some(workload) && entry.kind == kind)
    }

    pub fn executing_ticks(&self, workload: WorkloadId) -> Ticks {
        self.segments(workload, EventKind::Executing)
            .map(EventLogEntry::duration)
            .sum()
    }

    /// Ticks the CPU spent executing any workload.
    pub fn busy_ticks(&self) -> Ticks {
        self.entries
            .iter()
            .filter(|entry| entry.kind == EventKind::Executing)
            .map(EventLogEntry::duration)
            .sum()
    }

    /// End of the last recorded segment.
    pub fn last_tick(&self) -> Ticks {
        self.entries.iter().map(|entry| entry.end).max().unwrap_or(0)
    }
}
