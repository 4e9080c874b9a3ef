//! Document storage behind the work-item service.
//!
//! The service only ever reads and writes whole documents and moves whole item
//! directories, so the trait stays small. [`FsStore`] is the production
//! implementation; [`MemoryStore`] backs unit tests and anything else that
//! wants to drive the service without touching disk.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub trait DocumentStore: Send + Sync {
    /// Create a directory and all missing parents.
    fn create_dir(&self, path: &Path) -> std::io::Result<()>;

    /// Move a directory and everything below it. Fails if `dst` exists.
    fn move_dir(&self, src: &Path, dst: &Path) -> std::io::Result<()>;

    /// Read a whole document. Missing documents yield `ErrorKind::NotFound`.
    fn read_document(&self, path: &Path) -> std::io::Result<String>;

    /// Replace a whole document, creating parent directories as needed.
    fn write_document(&self, path: &Path, contents: &str) -> std::io::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Names of the immediate subdirectories of `path`, sorted.
    fn list_entries(&self, path: &Path) -> std::io::Result<Vec<String>>;

    fn modified_at(&self, path: &Path) -> Option<DateTime<Utc>>;
}

// ---------------------------------------------------------------------------
// FsStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy)]
pub struct FsStore;

impl FsStore {
    pub fn new() -> Self {
        FsStore
    }
}

impl DocumentStore for FsStore {
    fn create_dir(&self, path: &Path) -> std::io::Result<()> {
        crate::io::ensure_dir(path)
    }

    fn move_dir(&self, src: &Path, dst: &Path) -> std::io::Result<()> {
        crate::io::move_dir(src, dst)
    }

    fn read_document(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_document(&self, path: &Path, contents: &str) -> std::io::Result<()> {
        crate::io::atomic_write(path, contents.as_bytes())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn list_entries(&self, path: &Path) -> std::io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn modified_at(&self, path: &Path) -> Option<DateTime<Utc>> {
        crate::io::modified_at(path)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<PathBuf, (String, DateTime<Utc>)>,
    dirs: BTreeSet<PathBuf>,
}

impl MemoryState {
    fn add_dir_with_parents(&mut self, path: &Path) {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            self.dirs.insert(ancestor.to_path_buf());
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backdate a document, standing in for an old file mtime.
    pub fn set_modified(&self, path: &Path, at: DateTime<Utc>) {
        if let Some(entry) = self.lock().files.get_mut(path) {
            entry.1 = at;
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_found(path: &Path) -> Error {
    Error::new(ErrorKind::NotFound, format!("{} not found", path.display()))
}

impl DocumentStore for MemoryStore {
    fn create_dir(&self, path: &Path) -> std::io::Result<()> {
        self.lock().add_dir_with_parents(path);
        Ok(())
    }

    fn move_dir(&self, src: &Path, dst: &Path) -> std::io::Result<()> {
        let mut state = self.lock();
        if !state.dirs.contains(src) {
            return Err(not_found(src));
        }
        if state.dirs.contains(dst) || state.files.contains_key(dst) {
            return Err(Error::new(
                ErrorKind::AlreadyExists,
                format!("{} already exists", dst.display()),
            ));
        }

        let moved_dirs: Vec<PathBuf> = state
            .dirs
            .iter()
            .filter(|d| d.starts_with(src))
            .cloned()
            .collect();
        for dir in moved_dirs {
            state.dirs.remove(&dir);
            if let Ok(rest) = dir.strip_prefix(src) {
                state.dirs.insert(dst.join(rest));
            }
        }

        let moved_files: Vec<PathBuf> = state
            .files
            .keys()
            .filter(|f| f.starts_with(src))
            .cloned()
            .collect();
        for file in moved_files {
            if let (Some(entry), Ok(rest)) = (state.files.remove(&file), file.strip_prefix(src)) {
                state.files.insert(dst.join(rest), entry);
            }
        }

        state.add_dir_with_parents(dst);
        Ok(())
    }

    fn read_document(&self, path: &Path) -> std::io::Result<String> {
        self.lock()
            .files
            .get(path)
            .map(|(text, _)| text.clone())
            .ok_or_else(|| not_found(path))
    }

    fn write_document(&self, path: &Path, contents: &str) -> std::io::Result<()> {
        let mut state = self.lock();
        if let Some(parent) = path.parent() {
            state.add_dir_with_parents(parent);
        }
        state
            .files
            .insert(path.to_path_buf(), (contents.to_string(), Utc::now()));
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.lock();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.lock().dirs.contains(path)
    }

    fn list_entries(&self, path: &Path) -> std::io::Result<Vec<String>> {
        let state = self.lock();
        if !state.dirs.contains(path) {
            return Err(not_found(path));
        }
        // BTreeSet iteration is already sorted.
        Ok(state
            .dirs
            .iter()
            .filter(|d| d.parent() == Some(path))
            .filter_map(|d| d.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect())
    }

    fn modified_at(&self, path: &Path) -> Option<DateTime<Utc>> {
        self.lock().files.get(path).map(|(_, at)| *at)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn exercise(store: &dyn DocumentStore, root: &Path) {
        let backlog = root.join("backlog");
        let item = backlog.join("feature-login");
        store.create_dir(&item).unwrap();
        store
            .write_document(&item.join("README.md"), "# Feature: login\n")
            .unwrap();

        assert!(store.is_dir(&backlog));
        assert!(store.exists(&item.join("README.md")));
        assert_eq!(store.list_entries(&backlog).unwrap(), vec!["feature-login"]);
        assert!(store.modified_at(&item.join("README.md")).is_some());

        let missing = store.read_document(&item.join("NOPE.md")).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::NotFound);

        let done = root.join("completed/feature-login");
        store.move_dir(&item, &done).unwrap();
        assert!(!store.exists(&item));
        assert_eq!(
            store.read_document(&done.join("README.md")).unwrap(),
            "# Feature: login\n"
        );
        assert!(store.list_entries(&backlog).unwrap().is_empty());
    }

    #[test]
    fn fs_store_contract() {
        let dir = TempDir::new().unwrap();
        exercise(&FsStore::new(), dir.path());
    }

    #[test]
    fn memory_store_contract() {
        exercise(&MemoryStore::new(), Path::new("/mem"));
    }

    #[test]
    fn memory_store_lists_only_direct_children_sorted() {
        let store = MemoryStore::new();
        let root = Path::new("/mem/backlog");
        store.create_dir(&root.join("bug-b/nested")).unwrap();
        store.create_dir(&root.join("bug-a")).unwrap();
        assert_eq!(store.list_entries(root).unwrap(), vec!["bug-a", "bug-b"]);
        assert_eq!(
            store.list_entries(Path::new("/nowhere")).unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn memory_store_move_refuses_existing_destination() {
        let store = MemoryStore::new();
        store.create_dir(Path::new("/m/a")).unwrap();
        store.create_dir(Path::new("/m/b")).unwrap();
        let err = store
            .move_dir(Path::new("/m/a"), Path::new("/m/b"))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    }
}
