//! The phase/status state machine.
//!
//! ```text
//! PROPOSED -> IN_PROGRESS_DISCOVERY -> IN_PROGRESS_PLANNING -> IN_PROGRESS_EXECUTION
//!          -> IN_PROGRESS_CLEANUP -> IN_PROGRESS_REVIEW -> COMPLETED
//! ```
//!
//! The walk is driven by `status` alone. `phase` is recorded alongside but
//! never consulted for the transition, only for task gating.

use crate::error::{PmError, Result};
use crate::types::{ItemStatus, Phase};
use crate::workitem::WorkItem;
use serde::Serialize;

/// The (phase, status) pair an item moves to on advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub phase: Phase,
    pub status: ItemStatus,
}

impl Step {
    fn new(phase: Phase, status: ItemStatus) -> Self {
        Step { phase, status }
    }
}

/// Next legal step from `status`. `None` for `COMPLETED` and for any status
/// outside the workflow.
pub fn next_step(status: &ItemStatus) -> Option<Step> {
    use ItemStatus::*;
    let step = match status {
        Proposed => Step::new(Phase::Discovery, InProgressDiscovery),
        InProgressDiscovery => Step::new(Phase::Planning, InProgressPlanning),
        InProgressPlanning => Step::new(Phase::Execution, InProgressExecution),
        InProgressExecution => Step::new(Phase::Cleanup, InProgressCleanup),
        InProgressCleanup => Step::new(Phase::Cleanup, InProgressReview),
        InProgressReview => Step::new(Phase::Cleanup, Completed),
        Completed | Unrecognized(_) => return None,
    };
    Some(step)
}

/// Refuse to leave the current phase while any of its tasks is open.
/// Items still in `PROPOSED` pass unconditionally.
pub fn check_gate(item: &WorkItem) -> Result<()> {
    if item.status == ItemStatus::Proposed {
        return Ok(());
    }
    let Some(open) = item.tasks_in(item.phase).find(|t| !t.completed) else {
        return Ok(());
    };
    let target = next_step(&item.status).map_or(item.phase, |s| s.phase);
    let remaining = item.tasks_in(item.phase).filter(|t| !t.completed).count();
    let reason = if remaining == 1 {
        format!("task '{}' is not completed", open.description)
    } else {
        format!(
            "task '{}' is not completed ({remaining} open tasks in {} phase)",
            open.description, item.phase
        )
    };
    Err(PmError::Phase {
        item: item.name.clone(),
        current: item.phase.to_string(),
        target: target.to_string(),
        reason,
    })
}

/// Resolve the transition for `item`, applying gating.
pub fn plan_advance(item: &WorkItem) -> Result<Step> {
    let Some(step) = next_step(&item.status) else {
        let reason = match item.status {
            ItemStatus::Completed => "work item is already completed".to_string(),
            ref other => format!("status '{other}' is not part of the workflow"),
        };
        return Err(PmError::Phase {
            item: item.name.clone(),
            current: item.phase.to_string(),
            target: "none".to_string(),
            reason,
        });
    };
    check_gate(item)?;
    Ok(step)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workitem::Task;

    fn item(status: ItemStatus, phase: Phase, tasks: &[(Phase, bool)]) -> WorkItem {
        let mut item = WorkItem::new("feature-login");
        item.status = status;
        item.phase = phase;
        item.tasks = tasks
            .iter()
            .enumerate()
            .map(|(i, (phase, completed))| Task {
                description: format!("task {i}"),
                completed: *completed,
                phase: *phase,
                assigned_to: String::new(),
            })
            .collect();
        item
    }

    #[test]
    fn transition_table() {
        use ItemStatus::*;
        let cases = [
            (Proposed, Phase::Discovery, InProgressDiscovery),
            (InProgressDiscovery, Phase::Planning, InProgressPlanning),
            (InProgressPlanning, Phase::Execution, InProgressExecution),
            (InProgressExecution, Phase::Cleanup, InProgressCleanup),
            (InProgressCleanup, Phase::Cleanup, InProgressReview),
            (InProgressReview, Phase::Cleanup, Completed),
        ];
        for (from, phase, status) in cases {
            assert_eq!(next_step(&from), Some(Step { phase, status }), "from {from}");
        }
        assert_eq!(next_step(&Completed), None);
        assert_eq!(next_step(&ItemStatus::unknown()), None);
    }

    #[test]
    fn proposed_skips_gating() {
        let item = item(
            ItemStatus::Proposed,
            Phase::Discovery,
            &[(Phase::Discovery, false)],
        );
        let step = plan_advance(&item).unwrap();
        assert_eq!(step.status, ItemStatus::InProgressDiscovery);
        assert_eq!(step.phase, Phase::Discovery);
    }

    #[test]
    fn open_task_in_current_phase_blocks() {
        let item = item(
            ItemStatus::InProgressDiscovery,
            Phase::Discovery,
            &[(Phase::Discovery, true), (Phase::Discovery, false)],
        );
        let err = plan_advance(&item).unwrap_err();
        match err {
            PmError::Phase {
                current,
                target,
                reason,
                ..
            } => {
                assert_eq!(current, "discovery");
                assert_eq!(target, "planning");
                assert_eq!(reason, "task 'task 1' is not completed");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn open_tasks_in_other_phases_do_not_block() {
        let item = item(
            ItemStatus::InProgressDiscovery,
            Phase::Discovery,
            &[(Phase::Discovery, true), (Phase::Planning, false)],
        );
        assert_eq!(plan_advance(&item).unwrap().phase, Phase::Planning);
    }

    #[test]
    fn gate_counts_multiple_open_tasks() {
        let item = item(
            ItemStatus::InProgressExecution,
            Phase::Execution,
            &[(Phase::Execution, false), (Phase::Execution, false)],
        );
        let err = check_gate(&item).unwrap_err().to_string();
        assert!(err.contains("2 open tasks in execution phase"), "{err}");
    }

    #[test]
    fn completed_cannot_advance() {
        let item = item(ItemStatus::Completed, Phase::Cleanup, &[]);
        let err = plan_advance(&item).unwrap_err();
        assert!(matches!(err, PmError::Phase { .. }));
        assert!(err.to_string().contains("already completed"));
    }

    #[test]
    fn unrecognized_status_cannot_advance() {
        let item = item(ItemStatus::from_token("BLOCKED"), Phase::Planning, &[]);
        let err = plan_advance(&item).unwrap_err().to_string();
        assert!(err.contains("'BLOCKED'"), "{err}");
    }

    #[test]
    fn gating_follows_phase_field_after_override() {
        // status says planning, phase was forced to execution
        let item = item(
            ItemStatus::InProgressPlanning,
            Phase::Execution,
            &[(Phase::Planning, false), (Phase::Execution, true)],
        );
        let step = plan_advance(&item).unwrap();
        assert_eq!(step.status, ItemStatus::InProgressExecution);
    }
}
