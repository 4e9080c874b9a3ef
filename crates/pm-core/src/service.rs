//! The work-item service: the only code that mutates persisted state.
//!
//! Every mutation is one whole-document read, an in-memory rewrite through
//! [`crate::codec`], and one whole-document write. Side effects that follow a
//! successful write (branches, auto-assignment, postmortems, progress
//! recompute) are advisory: they report an [`Advisory`] and never fail the
//! operation.

use crate::codec;
use crate::config::Config;
use crate::error::{PmError, Result};
use crate::lifecycle::{self, Step};
use crate::metrics::{self, ProgressMetrics};
use crate::paths;
use crate::store::{DocumentStore, FsStore};
use crate::templates::{self, EmbeddedTemplates, TemplateProvider};
use crate::types::{ItemStatus, ItemType, Phase};
use crate::vcs::{self, GitCli, VersionControl};
use crate::workitem::{ListFilter, Task, WorkItem};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Advisory results
// ---------------------------------------------------------------------------

/// Result of a best-effort side effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum Advisory {
    Applied(String),
    Skipped(String),
    Failed(String),
}

impl Advisory {
    fn skipped(reason: &str) -> Self {
        Advisory::Skipped(reason.to_string())
    }

    fn from_result(what: &str, name: &str, result: Result<String>) -> Self {
        match result {
            Ok(detail) => {
                debug!(item = %name, what, detail = %detail, "advisory step applied");
                Advisory::Applied(detail)
            }
            Err(e) => {
                warn!(item = %name, what, error = %e, "advisory step failed");
                Advisory::Failed(e.to_string())
            }
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Advisory::Failed(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateOutcome {
    pub item: WorkItem,
    pub branch: Advisory,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompleteOutcome {
    pub item: WorkItem,
    pub task: Task,
    pub progress: Advisory,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdvanceOutcome {
    pub item: WorkItem,
    pub from: ItemStatus,
    pub to: Step,
    pub assignment: Advisory,
    pub branch: Advisory,
}

#[derive(Debug, Clone, Serialize)]
pub struct ArchiveOutcome {
    pub name: String,
    pub path: PathBuf,
    pub postmortem: Advisory,
}

// ---------------------------------------------------------------------------
// WorkItemService
// ---------------------------------------------------------------------------

pub struct WorkItemService {
    config: Config,
    store: Box<dyn DocumentStore>,
    vcs: Box<dyn VersionControl>,
    templates: Box<dyn TemplateProvider>,
}

impl WorkItemService {
    pub fn new(
        config: Config,
        store: Box<dyn DocumentStore>,
        vcs: Box<dyn VersionControl>,
        templates: Box<dyn TemplateProvider>,
    ) -> Self {
        Self {
            config,
            store,
            vcs,
            templates,
        }
    }

    /// Production wiring: files on disk, git in the base directory, and the
    /// compiled-in templates.
    pub fn open(config: Config) -> Self {
        let git = GitCli::new(config.base_dir());
        Self::new(
            config,
            Box::new(FsStore::new()),
            Box::new(git),
            Box::new(EmbeddedTemplates),
        )
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Document plumbing
    // -----------------------------------------------------------------------

    fn readme(&self, name: &str) -> PathBuf {
        paths::readme_path(&self.config.backlog_path(), name)
    }

    fn load(&self, op: &'static str, name: &str) -> Result<(PathBuf, String)> {
        paths::validate_name(name)?;
        let path = self.readme(name);
        match self.store.read_document(&path) {
            Ok(text) => Ok((path, text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(PmError::NotFound {
                op,
                name: name.to_string(),
            }),
            Err(e) => Err(PmError::storage(op, name, e)),
        }
    }

    fn save(&self, op: &'static str, name: &str, path: &Path, text: &str) -> Result<()> {
        self.store
            .write_document(path, text)
            .map_err(|e| PmError::storage(op, name, e))
    }

    fn parse_at(&self, name: &str, path: &Path, text: &str) -> WorkItem {
        let mut item = codec::parse(name, text);
        let modified = self.store.modified_at(path);
        item.path = path.to_path_buf();
        item.created_at = modified;
        item.updated_at = modified;
        item
    }

    /// Load, rewrite with `f`, save, and return the item as now persisted.
    fn rewrite(
        &self,
        op: &'static str,
        name: &str,
        f: impl FnOnce(&str) -> String,
    ) -> Result<WorkItem> {
        let (path, text) = self.load(op, name)?;
        let updated = f(&text);
        self.save(op, name, &path, &updated)?;
        Ok(self.parse_at(name, &path, &updated))
    }

    // -----------------------------------------------------------------------
    // Create / read
    // -----------------------------------------------------------------------

    pub fn create(&self, item_type: ItemType, name: &str) -> Result<CreateOutcome> {
        const OP: &str = "create";
        paths::validate_name(name)?;
        let dir_name = paths::item_dir_name(item_type, name);
        let backlog = self.config.backlog_path();
        let dir = paths::item_dir(&backlog, &dir_name);
        if self.store.exists(&dir) {
            return Err(PmError::validation(
                "name",
                &dir_name,
                "work item already exists",
            ));
        }

        let text = templates::render_item(&*self.templates, item_type, name)?;
        self.store
            .create_dir(&dir)
            .map_err(|e| PmError::storage(OP, &dir_name, e))?;
        let path = paths::readme_path(&backlog, &dir_name);
        self.save(OP, &dir_name, &path, &text)?;
        info!(item = %dir_name, path = %path.display(), "created work item");

        let branch = if self.config.enable_git {
            let branch = vcs::item_branch(item_type, name);
            self.ensure_branch(&dir_name, branch)
        } else {
            Advisory::skipped("git integration disabled")
        };

        Ok(CreateOutcome {
            item: self.parse_at(&dir_name, &path, &text),
            branch,
        })
    }

    /// Items in the active store matching `filter`, sorted by name.
    pub fn list(&self, filter: &ListFilter) -> Result<Vec<WorkItem>> {
        let backlog = self.config.backlog_path();
        if !self.store.is_dir(&backlog) {
            debug!(path = %backlog.display(), "backlog does not exist yet");
            return Ok(Vec::new());
        }
        let entries = self
            .store
            .list_entries(&backlog)
            .map_err(|e| PmError::storage("list", backlog.display().to_string(), e))?;

        let mut items = Vec::new();
        for name in entries {
            let path = paths::readme_path(&backlog, &name);
            let text = match self.store.read_document(&path) {
                Ok(text) => text,
                Err(e) => {
                    warn!(item = %name, error = %e, "skipping unreadable work item");
                    continue;
                }
            };
            let item = self.parse_at(&name, &path, &text);
            if filter.matches(&item) {
                items.push(item);
            }
        }
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    pub fn get(&self, name: &str) -> Result<WorkItem> {
        let (path, text) = self.load("get", name)?;
        debug!(item = %name, "loaded work item");
        Ok(self.parse_at(name, &path, &text))
    }

    // -----------------------------------------------------------------------
    // Field updates
    // -----------------------------------------------------------------------

    /// Raw status override. Phase is left alone.
    pub fn update_status(&self, name: &str, status: &ItemStatus) -> Result<WorkItem> {
        if !status.is_recognized() {
            return Err(PmError::validation("status", status, "invalid status"));
        }
        let item = self.rewrite("update", name, |text| codec::set_status(text, status))?;
        info!(item = %name, status = %status, "updated status");
        Ok(item)
    }

    pub fn update_progress(&self, name: &str, percent: i64) -> Result<WorkItem> {
        let percent = u8::try_from(percent)
            .ok()
            .filter(|p| *p <= 100)
            .ok_or_else(|| {
                PmError::validation("progress", percent, "progress must be between 0 and 100")
            })?;
        let item = self.rewrite("update_progress", name, |text| {
            codec::set_progress(text, percent)
        })?;
        info!(item = %name, percent, "updated progress");
        Ok(item)
    }

    pub fn assign(&self, name: &str, assignee: &str) -> Result<WorkItem> {
        let assignee = assignee.trim();
        if assignee.is_empty() {
            return Err(PmError::validation(
                "assignee",
                assignee,
                "assignee cannot be empty",
            ));
        }
        let item = self.rewrite("assign", name, |text| codec::set_assignee(text, assignee))?;
        info!(item = %name, assignee, "assigned work item");
        Ok(item)
    }

    /// Admin override: moves the phase line only, with no gating and no
    /// status change.
    pub fn set_phase(&self, name: &str, phase: Phase) -> Result<WorkItem> {
        let item = self.rewrite("set_phase", name, |text| codec::set_phase(text, phase))?;
        info!(item = %name, phase = %phase, "set phase");
        Ok(item)
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    pub fn phase_tasks(&self, name: &str) -> Result<Vec<Task>> {
        let (path, text) = self.load("get_phase_tasks", name)?;
        let item = self.parse_at(name, &path, &text);
        Ok(item.phase_tasks().into_iter().cloned().collect())
    }

    /// Check off the `index`-th task of the current phase, then refresh the
    /// progress line from all tasks.
    pub fn complete_task(&self, name: &str, index: usize) -> Result<CompleteOutcome> {
        const OP: &str = "complete_task";
        let invalid = || PmError::validation("taskId", index, "invalid task ID for current phase");

        let (path, text) = self.load(OP, name)?;
        let item = codec::parse(name, &text);
        let global = item.global_task_index(index).ok_or_else(invalid)?;
        let task = item.tasks[global].clone();
        let updated = codec::complete_task(&text, global).ok_or_else(invalid)?;
        self.save(OP, name, &path, &updated)?;
        info!(item = %name, task = %task.description, "completed task");

        let (progress, text) = match self.recompute_progress(name, &path, &updated) {
            Ok((percent, text)) => (Advisory::Applied(format!("{percent}%")), text),
            Err(e) => {
                warn!(item = %name, error = %e, "could not refresh progress");
                (Advisory::Failed(e.to_string()), updated)
            }
        };

        Ok(CompleteOutcome {
            item: self.parse_at(name, &path, &text),
            task: Task {
                completed: true,
                ..task
            },
            progress,
        })
    }

    fn recompute_progress(&self, name: &str, path: &Path, text: &str) -> Result<(u8, String)> {
        let (total, done) = codec::count_tasks(text);
        let percent = if total == 0 {
            0
        } else {
            (done * 100 / total).min(100) as u8
        };
        let updated = codec::set_progress(text, percent);
        self.save("update_progress", name, path, &updated)?;
        Ok((percent, updated))
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    pub fn advance_phase(&self, name: &str) -> Result<AdvanceOutcome> {
        const OP: &str = "advance_phase";
        let (path, text) = self.load(OP, name)?;
        let item = codec::parse(name, &text);
        let step = lifecycle::plan_advance(&item)?;

        let updated = codec::set_phase_and_status(&text, step.phase, &step.status);
        self.save(OP, name, &path, &updated)?;
        info!(
            item = %name,
            from = %item.status,
            to = %step.status,
            phase = %step.phase,
            "advanced work item"
        );

        let (assignment, updated) = self.auto_assign(&item, &step, &path, updated);
        let branch = match item.item_type {
            Some(item_type) => {
                self.ensure_branch(name, vcs::phase_branch(item_type, name, step.phase))
            }
            None => Advisory::skipped("work item type unknown"),
        };

        Ok(AdvanceOutcome {
            item: self.parse_at(name, &path, &updated),
            from: item.status,
            to: step,
            assignment,
            branch,
        })
    }

    /// Hand an item entering execution to the current git user. Returns the
    /// advisory and the document text as persisted afterwards.
    fn auto_assign(
        &self,
        item: &WorkItem,
        step: &Step,
        path: &Path,
        text: String,
    ) -> (Advisory, String) {
        if step.phase != Phase::Execution {
            return (Advisory::skipped("not entering execution"), text);
        }
        if !self.config.auto_assign_agent {
            return (Advisory::skipped("auto-assignment disabled"), text);
        }
        if !(item.assigned_to.is_empty() || item.assigned_to == "human") {
            return (Advisory::skipped("already assigned"), text);
        }
        let result = self.vcs.current_user().and_then(|user| {
            let assigned = codec::set_assignee(&text, &user);
            self.save("assign", &item.name, path, &assigned)?;
            Ok((user, assigned))
        });
        match result {
            Ok((user, assigned)) => (
                Advisory::from_result("auto-assign", &item.name, Ok(user)),
                assigned,
            ),
            Err(e) => (Advisory::from_result("auto-assign", &item.name, Err(e)), text),
        }
    }

    fn ensure_branch(&self, name: &str, branch: String) -> Advisory {
        let result = vcs::ensure_branch(&*self.vcs, &branch).map(|created| {
            if created {
                branch.clone()
            } else {
                format!("{branch} (already exists)")
            }
        });
        Advisory::from_result("branch", name, result)
    }

    // -----------------------------------------------------------------------
    // Archive
    // -----------------------------------------------------------------------

    /// Move the item directory into the completed store and drop a
    /// postmortem next to its README.
    pub fn archive(&self, name: &str) -> Result<ArchiveOutcome> {
        const OP: &str = "archive";
        paths::validate_name(name)?;
        let src = paths::item_dir(&self.config.backlog_path(), name);
        if !self.store.exists(&src.join(paths::README_FILE)) {
            return Err(PmError::NotFound {
                op: OP,
                name: name.to_string(),
            });
        }

        let completed = self.config.completed_path();
        let dst = paths::item_dir(&completed, name);
        if self.store.exists(&dst) {
            return Err(PmError::validation(
                "name",
                name,
                "work item already archived",
            ));
        }

        self.store
            .create_dir(&completed)
            .map_err(|e| PmError::storage(OP, name, e))?;
        self.store
            .move_dir(&src, &dst)
            .map_err(|e| PmError::storage(OP, name, e))?;
        info!(item = %name, to = %dst.display(), "archived work item");

        let postmortem_path = paths::postmortem_path(&dst);
        let body = templates::postmortem(name, Utc::now().date_naive());
        let result = self
            .store
            .write_document(&postmortem_path, &body)
            .map(|_| postmortem_path.display().to_string())
            .map_err(|e| PmError::storage("postmortem", name, e));
        let postmortem = Advisory::from_result("postmortem", name, result);

        Ok(ArchiveOutcome {
            name: name.to_string(),
            path: dst,
            postmortem,
        })
    }

    // -----------------------------------------------------------------------
    // Metrics
    // -----------------------------------------------------------------------

    pub fn progress_metrics(&self, name: &str) -> Result<ProgressMetrics> {
        self.progress_metrics_at(name, Utc::now())
    }

    pub fn progress_metrics_at(&self, name: &str, now: DateTime<Utc>) -> Result<ProgressMetrics> {
        let (path, text) = self.load("get_progress_metrics", name)?;
        Ok(metrics::calculate(&self.parse_at(name, &path, &text), now))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
