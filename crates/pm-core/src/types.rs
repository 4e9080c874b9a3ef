use crate::error::PmError;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Discovery,
    Planning,
    Execution,
    Cleanup,
}

impl Phase {
    pub fn all() -> &'static [Phase] {
        &[
            Phase::Discovery,
            Phase::Planning,
            Phase::Execution,
            Phase::Cleanup,
        ]
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Discovery => "discovery",
            Phase::Planning => "planning",
            Phase::Execution => "execution",
            Phase::Cleanup => "cleanup",
        }
    }

    /// Section heading that opens this phase's checklist, e.g. `## Planning Phase`.
    pub fn heading(self) -> &'static str {
        match self {
            Phase::Discovery => "## Discovery Phase",
            Phase::Planning => "## Planning Phase",
            Phase::Execution => "## Execution Phase",
            Phase::Cleanup => "## Cleanup Phase",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Phase {
    type Err = PmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "discovery" => Ok(Phase::Discovery),
            "planning" => Ok(Phase::Planning),
            "execution" => Ok(Phase::Execution),
            "cleanup" => Ok(Phase::Cleanup),
            _ => Err(PmError::validation("phase", s, "invalid phase")),
        }
    }
}

// ---------------------------------------------------------------------------
// ItemType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Feature,
    Bug,
    Experiment,
}

impl ItemType {
    pub fn all() -> &'static [ItemType] {
        &[ItemType::Feature, ItemType::Bug, ItemType::Experiment]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemType::Feature => "feature",
            ItemType::Bug => "bug",
            ItemType::Experiment => "experiment",
        }
    }

    /// Infer the type from a directory name such as `bug-login-crash`.
    pub fn from_name_prefix(name: &str) -> Option<ItemType> {
        ItemType::all().iter().copied().find(|t| {
            name.strip_prefix(t.as_str())
                .is_some_and(|rest| rest.starts_with('-'))
        })
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ItemType {
    type Err = PmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" => Err(PmError::validation("type", s, "type cannot be empty")),
            "feature" => Ok(ItemType::Feature),
            "bug" => Ok(ItemType::Bug),
            "experiment" => Ok(ItemType::Experiment),
            _ => Err(PmError::validation("type", s, "invalid work item type")),
        }
    }
}

// ---------------------------------------------------------------------------
// ItemStatus
// ---------------------------------------------------------------------------

/// Sentinel written into [`ItemStatus::Unrecognized`] when a document has no
/// status line at all.
pub const UNKNOWN_STATUS: &str = "UNKNOWN";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemStatus {
    Proposed,
    InProgressDiscovery,
    InProgressPlanning,
    InProgressExecution,
    InProgressCleanup,
    InProgressReview,
    Completed,
    /// Whatever token the document carried when it is not one of the seven
    /// workflow statuses, or [`UNKNOWN_STATUS`] when the line is missing.
    Unrecognized(String),
}

static WORKFLOW_STATUSES: [ItemStatus; 7] = [
    ItemStatus::Proposed,
    ItemStatus::InProgressDiscovery,
    ItemStatus::InProgressPlanning,
    ItemStatus::InProgressExecution,
    ItemStatus::InProgressCleanup,
    ItemStatus::InProgressReview,
    ItemStatus::Completed,
];

impl ItemStatus {
    pub fn all() -> &'static [ItemStatus] {
        &WORKFLOW_STATUSES
    }

    /// Statuses shown by `list active`.
    pub fn active() -> &'static [ItemStatus] {
        &WORKFLOW_STATUSES[1..6]
    }

    pub fn unknown() -> Self {
        ItemStatus::Unrecognized(UNKNOWN_STATUS.to_string())
    }

    pub fn as_str(&self) -> &str {
        match self {
            ItemStatus::Proposed => "PROPOSED",
            ItemStatus::InProgressDiscovery => "IN_PROGRESS_DISCOVERY",
            ItemStatus::InProgressPlanning => "IN_PROGRESS_PLANNING",
            ItemStatus::InProgressExecution => "IN_PROGRESS_EXECUTION",
            ItemStatus::InProgressCleanup => "IN_PROGRESS_CLEANUP",
            ItemStatus::InProgressReview => "IN_PROGRESS_REVIEW",
            ItemStatus::Completed => "COMPLETED",
            ItemStatus::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, ItemStatus::Unrecognized(_))
    }

    /// Map a token read from a document. Never fails: unknown tokens are kept
    /// verbatim so a later write does not lose them.
    pub fn from_token(token: &str) -> Self {
        let token = token.trim();
        ItemStatus::all()
            .iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(token))
            .cloned()
            .unwrap_or_else(|| ItemStatus::Unrecognized(token.to_string()))
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ItemStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Accepts the canonical tokens in any case, plus the short aliases the CLI
/// has always taken (`discovery`, `review`, ...).
impl std::str::FromStr for ItemStatus {
    type Err = PmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "proposed" => Ok(ItemStatus::Proposed),
            "in_progress_discovery" | "discovery" => Ok(ItemStatus::InProgressDiscovery),
            "in_progress_planning" | "planning" => Ok(ItemStatus::InProgressPlanning),
            "in_progress_execution" | "execution" => Ok(ItemStatus::InProgressExecution),
            "in_progress_cleanup" | "cleanup" => Ok(ItemStatus::InProgressCleanup),
            "in_progress_review" | "review" => Ok(ItemStatus::InProgressReview),
            "completed" => Ok(ItemStatus::Completed),
            _ => Err(PmError::validation("status", s, "invalid status")),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn phase_ordering_and_index() {
        assert!(Phase::Discovery < Phase::Planning);
        assert!(Phase::Execution < Phase::Cleanup);
        assert_eq!(Phase::Discovery.index(), 0);
        assert_eq!(Phase::Cleanup.index(), 3);
    }

    #[test]
    fn phase_parse_is_case_insensitive() {
        assert_eq!(Phase::from_str("Planning").unwrap(), Phase::Planning);
        assert!(matches!(
            Phase::from_str("review"),
            Err(PmError::Validation { .. })
        ));
    }

    #[test]
    fn item_type_from_name_prefix() {
        assert_eq!(ItemType::from_name_prefix("feature-login"), Some(ItemType::Feature));
        assert_eq!(ItemType::from_name_prefix("bug-crash"), Some(ItemType::Bug));
        assert_eq!(
            ItemType::from_name_prefix("experiment-cache"),
            Some(ItemType::Experiment)
        );
        assert_eq!(ItemType::from_name_prefix("featurelogin"), None);
        assert_eq!(ItemType::from_name_prefix("chore-cleanup"), None);
    }

    #[test]
    fn item_type_rejects_empty_and_unknown() {
        let err = ItemType::from_str("").unwrap_err();
        assert!(err.to_string().contains("type cannot be empty"));
        let err = ItemType::from_str("epic").unwrap_err();
        assert!(err.to_string().contains("invalid work item type"));
    }

    #[test]
    fn status_aliases() {
        assert_eq!(
            ItemStatus::from_str("discovery").unwrap(),
            ItemStatus::InProgressDiscovery
        );
        assert_eq!(
            ItemStatus::from_str("IN_PROGRESS_REVIEW").unwrap(),
            ItemStatus::InProgressReview
        );
        assert!(ItemStatus::from_str("blocked").is_err());
    }

    #[test]
    fn status_token_keeps_unknown_values() {
        assert_eq!(ItemStatus::from_token("COMPLETED"), ItemStatus::Completed);
        let odd = ItemStatus::from_token("BLOCKED");
        assert!(!odd.is_recognized());
        assert_eq!(odd.as_str(), "BLOCKED");
        assert_eq!(ItemStatus::unknown().as_str(), "UNKNOWN");
    }

    #[test]
    fn active_statuses_exclude_endpoints() {
        let active = ItemStatus::active();
        assert_eq!(active.len(), 5);
        assert!(!active.contains(&ItemStatus::Proposed));
        assert!(!active.contains(&ItemStatus::Completed));
    }
}
