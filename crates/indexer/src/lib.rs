//! # Session Indexer
//!
//! Turns a directory of recorded sessions into a labeled tree and a Markdown
//! outline.
//!
//! ## Pipeline
//!
//! ```text
//! Data root (user_XX/activity_YY/<file>.csv)
//!     │
//!     ├──> Folder Grouper (prefix buckets from the Name Registry)
//!     │      └─> user / activity directories
//!     │
//!     ├──> Tree Builder (by user or by activity, empty branches pruned)
//!     │      └─> TreeNode[]
//!     │
//!     ├──> Markdown Renderer
//!     │      └─> "# User\n- 01\n  - walk ..."
//!     │
//!     └──> Snapshot Writer
//!            └─> <timestamp>_<name>_by_<root>.md
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use session_indexer::{render_markdown, DiskLister, NameRegistry, TreeBuilder};
//! use session_protocol::RootCategory;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! fn main() -> session_indexer::Result<()> {
//!     let registry = Arc::new(NameRegistry::load(Path::new("config/names.json"))?);
//!     let builder = TreeBuilder::new(registry, Arc::new(DiskLister), "data");
//!     let tree = builder.build(RootCategory::User)?;
//!
//!     print!("{}", render_markdown(&tree));
//!     Ok(())
//! }
//! ```

mod builder;
mod error;
mod fs;
mod grouper;
mod markdown;
mod registry;
mod service;
mod snapshot;

pub use builder::{TreeBuilder, DEFAULT_DATA_EXTENSION};
pub use error::{IndexerError, Result};
pub use fs::{DirectoryLister, DiskLister, DiskWriter, FileWriter, MemoryTree, MemoryWriter};
pub use grouper::{FolderGrouper, PrefixGroup};
pub use markdown::{render_line, render_markdown, MarkdownLines};
pub use registry::{Category, NameRegistry};
pub use service::{TreeOutcome, TreeService};
pub use snapshot::{snapshot_file_name, SnapshotWriter};
