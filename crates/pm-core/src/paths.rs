use crate::error::{PmError, Result};
use crate::types::ItemType;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// File and directory names
// ---------------------------------------------------------------------------

pub const README_FILE: &str = "README.md";
pub const POSTMORTEM_FILE: &str = "POSTMORTEM.md";

pub const DEFAULT_BACKLOG_DIR: &str = "work-items/backlog";
pub const DEFAULT_COMPLETED_DIR: &str = "work-items/completed";

pub const CONFIG_DIR: &str = ".pm";
pub const CONFIG_FILE: &str = ".pm/config.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// Directory name of a work item: `{type}-{name}`.
pub fn item_dir_name(item_type: ItemType, name: &str) -> String {
    format!("{item_type}-{name}")
}

pub fn item_dir(store_root: &Path, dir_name: &str) -> PathBuf {
    store_root.join(dir_name)
}

pub fn readme_path(store_root: &Path, dir_name: &str) -> PathBuf {
    item_dir(store_root, dir_name).join(README_FILE)
}

pub fn postmortem_path(item_dir: &Path) -> PathBuf {
    item_dir.join(POSTMORTEM_FILE)
}

pub fn config_path(dir: &Path) -> PathBuf {
    dir.join(CONFIG_FILE)
}

// ---------------------------------------------------------------------------
// Name validation
// ---------------------------------------------------------------------------

/// Names become directory names, so they must stay inside the store root.
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(PmError::validation("name", name, "name cannot be empty"));
    }
    if name.contains(['/', '\\']) || name.starts_with('.') {
        return Err(PmError::validation(
            "name",
            name,
            "name must not contain path separators or start with '.'",
        ));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
