use crate::types::{ItemStatus, ItemType, Phase};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// A checklist entry from one of the phase sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub description: String,
    pub completed: bool,
    pub phase: Phase,
    pub assigned_to: String,
}

// ---------------------------------------------------------------------------
// TaskCounts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub completed: usize,
    pub total: usize,
}

impl TaskCounts {
    fn tally<'a>(tasks: impl Iterator<Item = &'a Task>) -> Self {
        tasks.fold(TaskCounts::default(), |acc, t| TaskCounts {
            completed: acc.completed + usize::from(t.completed),
            total: acc.total + 1,
        })
    }

    /// Integer percentage, rounded down. Zero when there are no tasks.
    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (self.completed * 100 / self.total).min(100) as u8
    }
}

// ---------------------------------------------------------------------------
// WorkItem
// ---------------------------------------------------------------------------

/// In-memory view of one work-item document. Built by [`crate::codec::parse`]
/// and never written back directly: mutations go through the codec's rewrites.
#[derive(Debug, Clone, Serialize)]
pub struct WorkItem {
    /// Directory name, e.g. `feature-login`.
    pub name: String,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<ItemType>,
    pub status: ItemStatus,
    pub phase: Phase,
    pub progress: u8,
    pub assigned_to: String,
    pub tasks: Vec<Task>,
    /// Path of the backing document.
    pub path: PathBuf,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl WorkItem {
    pub fn new(name: impl Into<String>) -> Self {
        WorkItem {
            name: name.into(),
            title: None,
            item_type: None,
            status: ItemStatus::unknown(),
            phase: Phase::Discovery,
            progress: 0,
            assigned_to: String::new(),
            tasks: Vec::new(),
            path: PathBuf::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Tasks filed under `phase`, in document order.
    pub fn tasks_in(&self, phase: Phase) -> impl Iterator<Item = &Task> + '_ {
        self.tasks.iter().filter(move |t| t.phase == phase)
    }

    /// Tasks of the current phase, in document order.
    pub fn phase_tasks(&self) -> Vec<&Task> {
        self.tasks_in(self.phase).collect()
    }

    /// Translate a zero-based index within the current phase's task list into
    /// the document-wide task index the codec works with.
    pub fn global_task_index(&self, local: usize) -> Option<usize> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.phase == self.phase)
            .nth(local)
            .map(|(i, _)| i)
    }

    pub fn task_counts(&self) -> TaskCounts {
        TaskCounts::tally(self.tasks.iter())
    }

    pub fn phase_task_counts(&self, phase: Phase) -> TaskCounts {
        TaskCounts::tally(self.tasks_in(phase))
    }

    pub fn is_completed(&self) -> bool {
        self.status == ItemStatus::Completed
    }

    /// An open item whose document has not changed in `days` days.
    pub fn is_stale(&self, now: DateTime<Utc>, days: u32) -> bool {
        if self.is_completed() {
            return false;
        }
        self.updated_at
            .is_some_and(|at| now - at > Duration::days(i64::from(days)))
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }
}

// ---------------------------------------------------------------------------
// ListFilter
// ---------------------------------------------------------------------------

/// Selection for [`crate::service::WorkItemService::list`]. Empty fields
/// match everything.
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub statuses: Vec<ItemStatus>,
    pub item_type: Option<ItemType>,
}

impl ListFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn status(status: ItemStatus) -> Self {
        ListFilter {
            statuses: vec![status],
            item_type: None,
        }
    }

    pub fn with_type(mut self, item_type: Option<ItemType>) -> Self {
        self.item_type = item_type;
        self
    }

    pub fn matches(&self, item: &WorkItem) -> bool {
        let status_ok = self.statuses.is_empty() || self.statuses.contains(&item.status);
        let type_ok = self.item_type.is_none() || self.item_type == item.item_type;
        status_ok && type_ok
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn task(phase: Phase, completed: bool) -> Task {
        Task {
            description: format!("{phase} task"),
            completed,
            phase,
            assigned_to: String::new(),
        }
    }

    fn sample() -> WorkItem {
        let mut item = WorkItem::new("feature-x");
        item.tasks = vec![
            task(Phase::Discovery, true),
            task(Phase::Discovery, false),
            task(Phase::Planning, false),
            task(Phase::Execution, true),
            task(Phase::Execution, false),
        ];
        item
    }

    #[test]
    fn global_index_skips_other_phases() {
        let mut item = sample();
        item.phase = Phase::Execution;
        assert_eq!(item.global_task_index(0), Some(3));
        assert_eq!(item.global_task_index(1), Some(4));
        assert_eq!(item.global_task_index(2), None);

        item.phase = Phase::Cleanup;
        assert_eq!(item.global_task_index(0), None);
    }

    #[test]
    fn counts_and_percent() {
        let item = sample();
        let all = item.task_counts();
        assert_eq!(all, TaskCounts { completed: 2, total: 5 });
        assert_eq!(all.percent(), 40);
        assert_eq!(item.phase_task_counts(Phase::Planning).percent(), 0);

        let thirds = TaskCounts { completed: 2, total: 3 };
        assert_eq!(thirds.percent(), 66);
    }

    #[test]
    fn phase_tasks_follow_current_phase() {
        let item = sample();
        assert_eq!(item.phase_tasks().len(), 2);
        assert!(item.phase_tasks()[0].completed);
    }

    #[test]
    fn stale_only_when_open_and_old() {
        let now = Utc::now();
        let mut item = sample();
        item.status = ItemStatus::InProgressPlanning;
        item.updated_at = Some(now - Duration::days(10));
        assert!(item.is_stale(now, 7));
        assert!(!item.is_stale(now, 14));

        item.status = ItemStatus::Completed;
        assert!(!item.is_stale(now, 7));
    }

    #[test]
    fn filter_matches_status_and_type() {
        let mut item = sample();
        item.status = ItemStatus::Proposed;
        item.item_type = Some(ItemType::Feature);

        assert!(ListFilter::all().matches(&item));
        assert!(ListFilter::status(ItemStatus::Proposed).matches(&item));
        assert!(!ListFilter::status(ItemStatus::Completed).matches(&item));
        assert!(!ListFilter::all()
            .with_type(Some(ItemType::Bug))
            .matches(&item));
    }
}
