use crate::builder::TreeBuilder;
use crate::markdown::render_markdown;
use crate::snapshot::SnapshotWriter;
use session_protocol::{RootCategory, TreeNode, TreeResponse};
use std::path::PathBuf;

/// Result of one tree request: build, render, snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeOutcome {
    Built {
        tree: Vec<TreeNode>,
        snapshot: PathBuf,
    },
    /// The tree is complete but could not be persisted.
    SnapshotFailed { tree: Vec<TreeNode>, error: String },
    BuildFailed { error: String },
}

impl TreeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, TreeOutcome::Built { .. })
    }

    pub fn into_response(self) -> TreeResponse {
        match self {
            TreeOutcome::Built { tree, .. } => TreeResponse::ok(tree),
            TreeOutcome::SnapshotFailed { tree, error } => TreeResponse::error(error, Some(tree)),
            TreeOutcome::BuildFailed { error } => TreeResponse::error(error, None),
        }
    }
}

pub struct TreeService {
    builder: TreeBuilder,
    snapshots: SnapshotWriter,
    base_name: String,
}

impl TreeService {
    pub fn new(
        builder: TreeBuilder,
        snapshots: SnapshotWriter,
        base_name: impl Into<String>,
    ) -> Self {
        Self {
            builder,
            snapshots,
            base_name: base_name.into(),
        }
    }

    pub fn builder(&self) -> &TreeBuilder {
        &self.builder
    }

    pub fn snapshots(&self) -> &SnapshotWriter {
        &self.snapshots
    }

    /// A missing parameter means `user`; anything else must name a root.
    pub fn parse_root(param: Option<&str>) -> Result<RootCategory, String> {
        match param {
            None => Ok(RootCategory::default()),
            Some(raw) => raw
                .parse::<RootCategory>()
                .map_err(|err| err.to_string()),
        }
    }

    pub fn get_tree(&self, root: RootCategory) -> TreeOutcome {
        let tree = match self.builder.build(root) {
            Ok(tree) => tree,
            Err(err) => {
                log::error!("Failed to build tree by {root}: {err}");
                return TreeOutcome::BuildFailed {
                    error: format!("Failed to build tree by {root}: {err}"),
                };
            }
        };

        let markdown = render_markdown(&tree);
        match self.snapshots.write(&markdown, &self.base_name, root) {
            Ok(snapshot) => TreeOutcome::Built { tree, snapshot },
            Err(err) => {
                log::warn!(
                    "Tree by {root} built but snapshot in {} failed: {err}",
                    self.snapshots.dir().display()
                );
                TreeOutcome::SnapshotFailed {
                    tree,
                    error: format!("Tree built but snapshot could not be saved: {err}"),
                }
            }
        }
    }
}
