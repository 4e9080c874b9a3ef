use crate::error::{PmError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Settings for one invocation. Built once by [`Config::load`] (or
/// [`Config::for_root`] in tests) and handed to the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory the store paths are relative to. Always set after `load`.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub auto_detect_repo_root: bool,
    #[serde(default = "default_backlog_dir")]
    pub backlog_dir: PathBuf,
    #[serde(default = "default_completed_dir")]
    pub completed_dir: PathBuf,
    #[serde(default = "default_phase_timeout_days")]
    pub phase_timeout_days: u32,
    #[serde(default = "default_true")]
    pub auto_assign_agent: bool,
    #[serde(default)]
    pub enable_git: bool,
}

fn default_true() -> bool {
    true
}

fn default_backlog_dir() -> PathBuf {
    PathBuf::from(paths::DEFAULT_BACKLOG_DIR)
}

fn default_completed_dir() -> PathBuf {
    PathBuf::from(paths::DEFAULT_COMPLETED_DIR)
}

fn default_phase_timeout_days() -> u32 {
    7
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: None,
            auto_detect_repo_root: default_true(),
            backlog_dir: default_backlog_dir(),
            completed_dir: default_completed_dir(),
            phase_timeout_days: default_phase_timeout_days(),
            auto_assign_agent: default_true(),
            enable_git: false,
        }
    }
}

/// Command-line settings, applied last.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_dir: Option<PathBuf>,
    pub enable_git: Option<bool>,
    pub auto_detect_repo_root: Option<bool>,
}

impl Config {
    /// Defaults rooted at `root`, git off. No files or environment consulted.
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(root.into()),
            ..Self::default()
        }
    }

    /// Load against the real process environment and home directory.
    pub fn load(cwd: &Path, overrides: &Overrides) -> Result<Self> {
        Self::load_with(cwd, home::home_dir(), |key| std::env::var(key).ok(), overrides)
    }

    /// Layers, lowest first: defaults, config file, `PM_*` variables from
    /// `env`, then `overrides`. The base directory is resolved last.
    pub fn load_with(
        cwd: &Path,
        home: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
        overrides: &Overrides,
    ) -> Result<Self> {
        let mut cfg = match find_config_file(cwd, home.as_deref()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config file");
                let data = std::fs::read_to_string(&path)?;
                serde_yaml::from_str::<Option<Config>>(&data)?.unwrap_or_default()
            }
            None => Config::default(),
        };

        cfg.apply_env(&env)?;

        if let Some(dir) = &overrides.base_dir {
            cfg.base_dir = Some(dir.clone());
        }
        if let Some(on) = overrides.enable_git {
            cfg.enable_git = on;
        }
        if let Some(on) = overrides.auto_detect_repo_root {
            cfg.auto_detect_repo_root = on;
        }

        cfg.base_dir = Some(cfg.resolve_base_dir(cwd));
        Ok(cfg)
    }

    fn apply_env(&mut self, env: &impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("PM_BASE_DIR") {
            self.base_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = var("PM_AUTO_DETECT_REPO_ROOT") {
            self.auto_detect_repo_root = parse_bool("PM_AUTO_DETECT_REPO_ROOT", &v)?;
        }
        if let Some(v) = var("PM_BACKLOG_DIR") {
            self.backlog_dir = PathBuf::from(v);
        }
        if let Some(v) = var("PM_COMPLETED_DIR") {
            self.completed_dir = PathBuf::from(v);
        }
        if let Some(v) = var("PM_PHASE_TIMEOUT_DAYS") {
            self.phase_timeout_days = v.trim().parse().map_err(|_| PmError::Config {
                key: "PM_PHASE_TIMEOUT_DAYS".to_string(),
                value: v.clone(),
                message: "expected a whole number of days".to_string(),
            })?;
        }
        if let Some(v) = var("PM_AUTO_ASSIGN_AGENT") {
            self.auto_assign_agent = parse_bool("PM_AUTO_ASSIGN_AGENT", &v)?;
        }
        if let Some(v) = var("PM_ENABLE_GIT") {
            self.enable_git = parse_bool("PM_ENABLE_GIT", &v)?;
        }
        Ok(())
    }

    fn resolve_base_dir(&self, cwd: &Path) -> PathBuf {
        if let Some(dir) = &self.base_dir {
            return cwd.join(dir);
        }
        if self.auto_detect_repo_root {
            find_repo_root(cwd).unwrap_or_else(|| cwd.to_path_buf())
        } else {
            cwd.join("wiki")
        }
    }

    pub fn base_dir(&self) -> &Path {
        self.base_dir.as_deref().unwrap_or(Path::new("."))
    }

    /// Root of the active store. An absolute `backlog_dir` stands alone.
    pub fn backlog_path(&self) -> PathBuf {
        self.base_dir().join(&self.backlog_dir)
    }

    pub fn completed_path(&self) -> PathBuf {
        self.base_dir().join(&self.completed_dir)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn find_config_file(cwd: &Path, home: Option<&Path>) -> Option<PathBuf> {
    std::iter::once(cwd)
        .chain(home)
        .map(paths::config_path)
        .find(|p| p.is_file())
}

/// Nearest ancestor of `start` (inclusive) that holds a `.git` entry.
pub fn find_repo_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

pub fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(PmError::Config {
            key: key.to_string(),
            value: value.to_string(),
            message: "expected true or false".to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
