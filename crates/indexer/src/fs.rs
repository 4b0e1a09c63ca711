//! Filesystem capabilities used by the tree builder and the snapshot writer.
//!
//! The traversal only ever needs "list the child directories / files of this
//! directory" and "write this text file", so both are traits with a disk
//! implementation and an in-memory one for tests and dry runs.

use crate::{IndexerError, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use walkdir::WalkDir;

pub trait DirectoryLister: Send + Sync {
    /// Names of the immediate child directories of `path`, sorted by name.
    fn list_dirs(&self, path: &Path) -> Result<Vec<String>>;

    /// Names of the immediate child files of `path`, sorted by name.
    fn list_files(&self, path: &Path) -> Result<Vec<String>>;
}

pub trait FileWriter: Send + Sync {
    fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Create or truncate `path` and write `contents` to it.
    fn write(&self, path: &Path, contents: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Dir,
    File,
}

/// Lists directories on disk, one level deep.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskLister;

impl DiskLister {
    fn list(&self, path: &Path, kind: EntryKind) -> Result<Vec<String>> {
        let meta = std::fs::metadata(path)?;
        if !meta.is_dir() {
            return Err(IndexerError::InvalidPath(format!(
                "{} is not a directory",
                path.display()
            )));
        }

        let mut names = Vec::new();
        for entry in WalkDir::new(path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            let file_type = entry.file_type();
            let wanted = match kind {
                EntryKind::Dir => file_type.is_dir(),
                EntryKind::File => file_type.is_file(),
            };
            if !wanted {
                continue;
            }
            match entry.file_name().to_str() {
                Some(name) => names.push(name.to_string()),
                None => log::debug!("Skipping non UTF-8 entry {}", entry.path().display()),
            }
        }
        Ok(names)
    }
}

impl DirectoryLister for DiskLister {
    fn list_dirs(&self, path: &Path) -> Result<Vec<String>> {
        self.list(path, EntryKind::Dir)
    }

    fn list_files(&self, path: &Path) -> Result<Vec<String>> {
        self.list(path, EntryKind::File)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DiskWriter;

impl FileWriter for DiskWriter {
    fn create_dir_all(&self, path: &Path) -> Result<()> {
        std::fs::create_dir_all(path)?;
        Ok(())
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// In-memory directory tree. Paths are given relative to `root`; every
/// ancestor of an added file or directory exists implicitly.
#[derive(Debug, Clone)]
pub struct MemoryTree {
    root: PathBuf,
    dirs: BTreeSet<PathBuf>,
    files: BTreeSet<PathBuf>,
    unreadable: BTreeSet<PathBuf>,
}

impl MemoryTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut dirs = BTreeSet::new();
        dirs.insert(root.clone());
        Self {
            root,
            dirs,
            files: BTreeSet::new(),
            unreadable: BTreeSet::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn with_file(mut self, relative: impl AsRef<Path>) -> Self {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            self.insert_dir(parent.to_path_buf());
        }
        self.files.insert(path);
        self
    }

    pub fn with_dir(mut self, relative: impl AsRef<Path>) -> Self {
        let path = self.root.join(relative);
        self.insert_dir(path);
        self
    }

    /// Listing this directory fails with `PermissionDenied`.
    pub fn with_unreadable(mut self, relative: impl AsRef<Path>) -> Self {
        let path = self.root.join(relative);
        self.insert_dir(path.clone());
        self.unreadable.insert(path);
        self
    }

    fn insert_dir(&mut self, path: PathBuf) {
        let mut current = Some(path.as_path());
        while let Some(dir) = current {
            if !dir.starts_with(&self.root) {
                break;
            }
            self.dirs.insert(dir.to_path_buf());
            current = dir.parent();
        }
    }

    fn children(&self, path: &Path, set: &BTreeSet<PathBuf>) -> Result<Vec<String>> {
        if self.unreadable.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("permission denied: {}", path.display()),
            )
            .into());
        }
        if !self.dirs.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such directory: {}", path.display()),
            )
            .into());
        }

        let mut names: Vec<String> = set
            .iter()
            .filter(|candidate| candidate.parent() == Some(path))
            .filter_map(|candidate| candidate.file_name()?.to_str().map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }
}

impl DirectoryLister for MemoryTree {
    fn list_dirs(&self, path: &Path) -> Result<Vec<String>> {
        self.children(path, &self.dirs)
    }

    fn list_files(&self, path: &Path) -> Result<Vec<String>> {
        self.children(path, &self.files)
    }
}

/// Records writes instead of touching the disk.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    dirs: Mutex<BTreeSet<PathBuf>>,
    files: Mutex<BTreeMap<PathBuf, String>>,
    fail_writes: bool,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write fails with `PermissionDenied`.
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn files(&self) -> BTreeMap<PathBuf, String> {
        lock(&self.files).clone()
    }

    pub fn dirs(&self) -> BTreeSet<PathBuf> {
        lock(&self.dirs).clone()
    }
}

impl FileWriter for MemoryWriter {
    fn create_dir_all(&self, path: &Path) -> Result<()> {
        lock(&self.dirs).insert(path.to_path_buf());
        Ok(())
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        if self.fail_writes {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("read-only: {}", path.display()),
            )
            .into());
        }
        lock(&self.files).insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn disk_lister_separates_dirs_and_files() {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("walk_02")).unwrap();
        fs::create_dir_all(temp.path().join("walk_01")).unwrap();
        fs::write(temp.path().join("notes.txt"), b"x").unwrap();
        fs::write(temp.path().join("walk_01").join("accel.csv"), b"1,2").unwrap();

        let lister = DiskLister;
        assert_eq!(lister.list_dirs(temp.path()).unwrap(), vec!["walk_01", "walk_02"]);
        assert_eq!(lister.list_files(temp.path()).unwrap(), vec!["notes.txt"]);
    }

    #[test]
    fn disk_lister_fails_on_missing_directory() {
        let temp = tempdir().unwrap();
        let err = DiskLister.list_dirs(&temp.path().join("missing")).unwrap_err();
        assert!(matches!(err, IndexerError::IoError(ref e) if e.kind() == io::ErrorKind::NotFound));
    }

    #[test]
    fn disk_lister_rejects_files() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("accel.csv");
        fs::write(&file, b"").unwrap();
        assert!(matches!(
            DiskLister.list_files(&file),
            Err(IndexerError::InvalidPath(_))
        ));
    }

    #[test]
    fn memory_tree_creates_ancestors() {
        let tree = MemoryTree::new("data")
            .with_file("user_01/walk_01/accel.csv")
            .with_dir("user_02");

        assert_eq!(
            tree.list_dirs(Path::new("data")).unwrap(),
            vec!["user_01", "user_02"]
        );
        assert_eq!(
            tree.list_dirs(Path::new("data/user_01")).unwrap(),
            vec!["walk_01"]
        );
        assert_eq!(
            tree.list_files(Path::new("data/user_01/walk_01")).unwrap(),
            vec!["accel.csv"]
        );
        assert!(tree.list_files(Path::new("data/user_02")).unwrap().is_empty());
        assert!(tree.list_dirs(Path::new("data/user_03")).is_err());
    }

    #[test]
    fn memory_tree_unreadable_dir() {
        let tree = MemoryTree::new("data").with_unreadable("user_01");
        let err = tree.list_dirs(Path::new("data/user_01")).unwrap_err();
        assert!(
            matches!(err, IndexerError::IoError(ref e) if e.kind() == io::ErrorKind::PermissionDenied)
        );
    }

    #[test]
    fn memory_writer_records_and_fails_on_demand() {
        let writer = MemoryWriter::new();
        writer.create_dir_all(Path::new("history")).unwrap();
        writer.write(Path::new("history/a.md"), "# User\n").unwrap();
        assert_eq!(
            writer.files().get(Path::new("history/a.md")).map(String::as_str),
            Some("# User\n")
        );
        assert!(writer.dirs().contains(Path::new("history")));

        assert!(MemoryWriter::failing()
            .write(Path::new("history/a.md"), "")
            .is_err());
    }
}
