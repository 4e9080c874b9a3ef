//! Version-control collaborator. Branches and identity are conveniences:
//! nothing in the lifecycle depends on them succeeding.

use crate::error::{PmError, Result};
use crate::types::{ItemType, Phase};
use std::path::PathBuf;
use std::process::Command;

pub trait VersionControl: Send + Sync {
    fn branch_exists(&self, name: &str) -> bool;

    /// Create `name` and switch to it.
    fn create_branch(&self, name: &str) -> Result<()>;

    /// Identity used for auto-assignment.
    fn current_user(&self) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Branch naming
// ---------------------------------------------------------------------------

/// Branch opened when an item is created: `feature/login`.
pub fn item_branch(item_type: ItemType, name: &str) -> String {
    format!("{item_type}/{name}")
}

/// Branch opened when an item enters a phase: `feature/feature-login/planning`.
pub fn phase_branch(item_type: ItemType, dir_name: &str, phase: Phase) -> String {
    format!("{item_type}/{dir_name}/{phase}")
}

/// Create `branch` unless it already exists. `Ok(false)` means it was there.
pub fn ensure_branch(vcs: &dyn VersionControl, branch: &str) -> Result<bool> {
    if vcs.branch_exists(branch) {
        return Ok(false);
    }
    vcs.create_branch(branch)?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// GitCli
// ---------------------------------------------------------------------------

/// Shells out to the `git` binary on `PATH`, running in `workdir`.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        GitCli {
            workdir: workdir.into(),
        }
    }

    fn git(&self, args: &[&str]) -> Result<String> {
        let command = args.join(" ");
        let bin = which::which("git").map_err(|_| PmError::Vcs {
            command: command.clone(),
            message: "git is not installed".to_string(),
        })?;
        let output = Command::new(bin)
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .map_err(|e| PmError::Vcs {
                command: command.clone(),
                message: e.to_string(),
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = match stderr.trim() {
                "" => format!("exited with {}", output.status),
                s => s.to_string(),
            };
            return Err(PmError::Vcs { command, message });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl VersionControl for GitCli {
    fn branch_exists(&self, name: &str) -> bool {
        self.git(&["branch", "--list", name])
            .map(|out| !out.is_empty())
            .unwrap_or(false)
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        self.git(&["checkout", "-b", name]).map(|_| ())
    }

    fn current_user(&self) -> Result<String> {
        let name = self.git(&["config", "user.name"])?;
        if name.is_empty() {
            return Err(PmError::Vcs {
                command: "config user.name".to_string(),
                message: "user.name is not set".to_string(),
            });
        }
        Ok(name)
    }
}

// ---------------------------------------------------------------------------
// NoopVcs
// ---------------------------------------------------------------------------

/// No branches, no identity. Branch creation quietly succeeds.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopVcs;

impl VersionControl for NoopVcs {
    fn branch_exists(&self, _name: &str) -> bool {
        false
    }

    fn create_branch(&self, _name: &str) -> Result<()> {
        Ok(())
    }

    fn current_user(&self) -> Result<String> {
        Err(PmError::Vcs {
            command: "config user.name".to_string(),
            message: "version control is disabled".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn branch_names() {
        assert_eq!(item_branch(ItemType::Feature, "login"), "feature/login");
        assert_eq!(
            phase_branch(ItemType::Bug, "bug-crash", Phase::Execution),
            "bug/bug-crash/execution"
        );
    }

    #[test]
    fn noop_has_no_identity() {
        let vcs = NoopVcs;
        assert!(!vcs.branch_exists("main"));
        assert!(ensure_branch(&vcs, "feature/x").unwrap());
        assert!(vcs.current_user().is_err());
    }

    fn run(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .unwrap()
            .status;
        assert!(status.success(), "git {args:?} failed");
    }

    #[test]
    fn git_cli_creates_and_detects_branches() {
        if which::which("git").is_err() {
            return;
        }
        let dir = TempDir::new().unwrap();
        run(dir.path(), &["init", "-q"]);
        run(dir.path(), &["config", "user.name", "Ada"]);
        run(dir.path(), &["config", "user.email", "ada@example.com"]);
        run(dir.path(), &["commit", "-q", "--allow-empty", "-m", "init"]);

        let git = GitCli::new(dir.path());
        assert_eq!(git.current_user().unwrap(), "Ada");
        assert!(!git.branch_exists("feature/login"));
        assert!(ensure_branch(&git, "feature/login").unwrap());
        assert!(git.branch_exists("feature/login"));
        assert!(!ensure_branch(&git, "feature/login").unwrap());
    }

    #[test]
    fn git_cli_outside_a_repository_fails_softly() {
        if which::which("git").is_err() {
            return;
        }
        let dir = TempDir::new().unwrap();
        let git = GitCli::new(dir.path());
        assert!(!git.branch_exists("anything"));
        assert!(matches!(
            git.create_branch("feature/x"),
            Err(PmError::Vcs { .. })
        ));
    }
}
