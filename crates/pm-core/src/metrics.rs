//! Read-only progress aggregation over a parsed work item.
//!
//! Time spent per phase is an estimate: documents carry no phase-entry
//! timestamps, so an item's age is split as `age / (phase index + 1)`.
//! Nothing here should be read as measured time.

use crate::types::Phase;
use crate::workitem::WorkItem;
use chrono::{DateTime, Duration, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt::Write as _;

fn as_secs<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(d.num_seconds())
}

fn as_opt_secs<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
    match d {
        Some(d) => s.serialize_some(&d.num_seconds()),
        None => s.serialize_none(),
    }
}

/// Render a duration rounded to the nearest hour, e.g. `26h`.
pub fn format_hours(d: Duration) -> String {
    let secs = d.num_seconds().max(0);
    format!("{}h", (secs + 1800) / 3600)
}

fn format_timestamp(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(
        || "unknown".to_string(),
        |t| t.format("%Y-%m-%d %H:%M").to_string(),
    )
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct PhaseProgress {
    pub phase: Phase,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub percent: u8,
    #[serde(rename = "time_spent_secs", serialize_with = "as_secs")]
    pub time_spent: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressMetrics {
    pub name: String,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub overall_progress: u8,
    pub phases: Vec<PhaseProgress>,
    #[serde(rename = "total_time_spent_secs", serialize_with = "as_secs")]
    pub total_time_spent: Duration,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// The clock reading the estimates were taken against.
    pub as_of: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionKind {
    AlreadyCompleted,
    Extrapolated,
    InsufficientData,
}

#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub kind: PredictionKind,
    pub at: Option<DateTime<Utc>>,
    #[serde(rename = "remaining_secs", serialize_with = "as_opt_secs")]
    pub remaining: Option<Duration>,
    pub message: String,
}

// ---------------------------------------------------------------------------
// Calculation
// ---------------------------------------------------------------------------

fn estimated_time_in(item: &WorkItem, phase: Phase, now: DateTime<Utc>) -> Duration {
    let Some(created) = item.created_at else {
        return Duration::zero();
    };
    let age = (now - created).max(Duration::zero());
    age / (phase.index() as i32 + 1)
}

/// Aggregate `item`'s tasks. All four phases are reported, empty or not.
pub fn calculate(item: &WorkItem, now: DateTime<Utc>) -> ProgressMetrics {
    let overall = item.task_counts();

    let phases: Vec<PhaseProgress> = Phase::all()
        .iter()
        .map(|&phase| {
            let counts = item.phase_task_counts(phase);
            PhaseProgress {
                phase,
                total_tasks: counts.total,
                completed_tasks: counts.completed,
                percent: counts.percent(),
                time_spent: estimated_time_in(item, phase, now),
            }
        })
        .collect();

    let total_time_spent = phases
        .iter()
        .fold(Duration::zero(), |acc, p| acc + p.time_spent);

    ProgressMetrics {
        name: item.name.clone(),
        total_tasks: overall.total,
        completed_tasks: overall.completed,
        overall_progress: overall.percent(),
        phases,
        total_time_spent,
        created_at: item.created_at,
        updated_at: item.updated_at,
        as_of: now,
    }
}

impl ProgressMetrics {
    /// Linear extrapolation from the estimated time spent so far.
    pub fn predict_completion(&self) -> Prediction {
        if self.overall_progress >= 100 {
            return Prediction {
                kind: PredictionKind::AlreadyCompleted,
                at: self.updated_at,
                remaining: None,
                message: "Already completed".to_string(),
            };
        }

        let spent_ms = self.total_time_spent.num_milliseconds();
        let progress = i64::from(self.overall_progress);
        if spent_ms > 0 && progress > 0 {
            let remaining = Duration::milliseconds(spent_ms / progress * (100 - progress));
            return Prediction {
                kind: PredictionKind::Extrapolated,
                at: Some(self.as_of + remaining),
                remaining: Some(remaining),
                message: format!(
                    "Based on current progress rate: {} remaining",
                    format_hours(remaining)
                ),
            };
        }

        Prediction {
            kind: PredictionKind::InsufficientData,
            at: None,
            remaining: None,
            message: "Insufficient data for prediction".to_string(),
        }
    }

    /// 1.0 for every phase that has time attributed to it, 0.0 otherwise.
    /// A presence signal, not a ratio.
    pub fn phase_efficiency(&self) -> BTreeMap<Phase, f64> {
        self.phases
            .iter()
            .map(|p| {
                let signal = if p.time_spent > Duration::zero() { 1.0 } else { 0.0 };
                (p.phase, signal)
            })
            .collect()
    }

    pub fn report(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Progress Report for {}", self.name);
        out.push_str("================================\n");
        let _ = writeln!(
            out,
            "Overall Progress: {}% ({}/{} tasks completed)",
            self.overall_progress, self.completed_tasks, self.total_tasks
        );
        let _ = writeln!(
            out,
            "Total Time Spent: {}",
            format_hours(self.total_time_spent)
        );
        let _ = writeln!(out, "Created: {}", format_timestamp(self.created_at));
        let _ = writeln!(out, "Updated: {}", format_timestamp(self.updated_at));
        out.push_str("\nPhase Progress:\n");
        for p in &self.phases {
            let _ = write!(
                out,
                "  {}: {}% ({}/{} tasks)",
                p.phase, p.percent, p.completed_tasks, p.total_tasks
            );
            if p.time_spent > Duration::zero() {
                let _ = write!(out, " - Spent: {}", format_hours(p.time_spent));
            }
            out.push('\n');
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workitem::Task;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn task(phase: Phase, completed: bool) -> Task {
        Task {
            description: "t".into(),
            completed,
            phase,
            assigned_to: String::new(),
        }
    }

    fn sample() -> WorkItem {
        let mut item = WorkItem::new("feature-x");
        item.tasks = vec![
            task(Phase::Discovery, true),
            task(Phase::Discovery, true),
            task(Phase::Execution, false),
        ];
        item.created_at = Some(t0());
        item.updated_at = Some(t0() + Duration::minutes(390));
        item
    }

    #[test]
    fn overall_progress_truncates() {
        let m = calculate(&sample(), t0() + Duration::hours(12));
        assert_eq!(m.overall_progress, 66);
        assert_eq!((m.completed_tasks, m.total_tasks), (2, 3));
    }

    #[test]
    fn every_phase_is_reported() {
        let m = calculate(&sample(), t0());
        let phases: Vec<Phase> = m.phases.iter().map(|p| p.phase).collect();
        assert_eq!(phases, Phase::all());
        assert_eq!(m.phases[0].percent, 100);
        assert_eq!(m.phases[1].total_tasks, 0);
        assert_eq!(m.phases[1].percent, 0);
        assert_eq!(m.phases[2].percent, 0);
    }

    #[test]
    fn time_spent_splits_age_by_phase_index() {
        let m = calculate(&sample(), t0() + Duration::hours(12));
        let hours: Vec<i64> = m.phases.iter().map(|p| p.time_spent.num_hours()).collect();
        assert_eq!(hours, vec![12, 6, 4, 3]);
        assert_eq!(m.total_time_spent, Duration::hours(25));
    }

    #[test]
    fn no_creation_time_means_no_time_spent() {
        let mut item = sample();
        item.created_at = None;
        let m = calculate(&item, t0());
        assert_eq!(m.total_time_spent, Duration::zero());
        assert!(m.phase_efficiency().values().all(|&e| e == 0.0));
    }

    #[test]
    fn report_layout() {
        let m = calculate(&sample(), t0() + Duration::hours(12));
        let expected = "\
Progress Report for feature-x
================================
Overall Progress: 66% (2/3 tasks completed)
Total Time Spent: 25h
Created: 2026-01-01 00:00
Updated: 2026-01-01 06:30

Phase Progress:
  discovery: 100% (2/2 tasks) - Spent: 12h
  planning: 0% (0/0 tasks) - Spent: 6h
  execution: 0% (0/1 tasks) - Spent: 4h
  cleanup: 0% (0/0 tasks) - Spent: 3h
";
        assert_eq!(m.report(), expected);
    }

    #[test]
    fn prediction_extrapolates_linearly() {
        let now = t0() + Duration::hours(12);
        let p = calculate(&sample(), now).predict_completion();
        assert_eq!(p.kind, PredictionKind::Extrapolated);
        // 25h over 66% leaves roughly 12.9h for the remaining 34%
        assert_eq!(p.message, "Based on current progress rate: 13h remaining");
        let remaining = p.remaining.unwrap();
        assert_eq!(p.at, Some(now + remaining));
    }

    #[test]
    fn prediction_when_done() {
        let mut item = sample();
        item.tasks.iter_mut().for_each(|t| t.completed = true);
        let p = calculate(&item, t0()).predict_completion();
        assert_eq!(p.kind, PredictionKind::AlreadyCompleted);
        assert_eq!(p.at, item.updated_at);
    }

    #[test]
    fn prediction_without_data() {
        let mut item = sample();
        item.tasks.clear();
        let p = calculate(&item, t0() + Duration::hours(5)).predict_completion();
        assert_eq!(p.kind, PredictionKind::InsufficientData);
        assert!(p.at.is_none());
        assert_eq!(p.message, "Insufficient data for prediction");
    }

    #[test]
    fn efficiency_is_a_presence_signal() {
        let m = calculate(&sample(), t0() + Duration::hours(1));
        let eff = m.phase_efficiency();
        assert_eq!(eff.len(), 4);
        assert!(eff.values().all(|&e| e == 1.0));
    }

    #[test]
    fn metrics_serialize_durations_as_seconds() {
        let m = calculate(&sample(), t0() + Duration::hours(1));
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["overall_progress"], 66);
        assert_eq!(json["phases"][0]["time_spent_secs"], 3600);
        assert_eq!(json["phases"][0]["phase"], "discovery");
    }
}
