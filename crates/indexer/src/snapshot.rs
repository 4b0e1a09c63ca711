use crate::fs::FileWriter;
use crate::{IndexerError, Result};
use chrono::{Local, NaiveDateTime};
use session_protocol::RootCategory;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Persists rendered outlines as `<timestamp>_<base>_by_<root>.md`.
///
/// Nothing is ever evicted; two snapshots in the same second with the same
/// base name and root overwrite each other.
pub struct SnapshotWriter {
    dir: PathBuf,
    writer: Arc<dyn FileWriter>,
}

impl SnapshotWriter {
    pub fn new(dir: impl Into<PathBuf>, writer: Arc<dyn FileWriter>) -> Self {
        Self {
            dir: dir.into(),
            writer,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, text: &str, base_name: &str, root: RootCategory) -> Result<PathBuf> {
        self.write_at(text, base_name, root, Local::now().naive_local())
    }

    pub fn write_at(
        &self,
        text: &str,
        base_name: &str,
        root: RootCategory,
        at: NaiveDateTime,
    ) -> Result<PathBuf> {
        let is_plain = !base_name.is_empty()
            && base_name != ".."
            && !base_name.contains(|c: char| c == '/' || c == '\\');
        if !is_plain {
            return Err(IndexerError::InvalidPath(format!(
                "snapshot base name must be a plain file name: {base_name:?}"
            )));
        }

        self.writer.create_dir_all(&self.dir)?;
        let path = self.dir.join(snapshot_file_name(at, base_name, root));
        self.writer.write(&path, text)?;
        log::info!("Wrote snapshot {}", path.display());
        Ok(path)
    }
}

pub fn snapshot_file_name(at: NaiveDateTime, base_name: &str, root: RootCategory) -> String {
    format!("{}_{base_name}_by_{root}.md", at.format(TIMESTAMP_FORMAT))
}
