use crate::fs::DirectoryLister;
use crate::grouper::FolderGrouper;
use crate::registry::{Category, NameRegistry};
use crate::Result;
use session_protocol::{RootCategory, TreeNode};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

pub const DEFAULT_DATA_EXTENSION: &str = "csv";

/// Walks a `user_XX/activity_YY/<file>` layout and builds the labeled tree.
///
/// By user:     user prefix → instance → activity prefix → trial → file
/// By activity: activity prefix → user prefix → instance → trial → file
///
/// Branches without at least one qualifying data file below them are dropped.
pub struct TreeBuilder {
    registry: Arc<NameRegistry>,
    lister: Arc<dyn DirectoryLister>,
    data_root: PathBuf,
    extension: String,
}

impl TreeBuilder {
    pub fn new(
        registry: Arc<NameRegistry>,
        lister: Arc<dyn DirectoryLister>,
        data_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            registry,
            lister,
            data_root: data_root.into(),
            extension: DEFAULT_DATA_EXTENSION.to_string(),
        }
    }

    /// Data file extension without the leading dot.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    pub fn registry(&self) -> &NameRegistry {
        &self.registry
    }

    pub fn build(&self, root: RootCategory) -> Result<Vec<TreeNode>> {
        let started = Instant::now();
        let tree = match root {
            RootCategory::User => self.user_branches(None)?,
            RootCategory::Activity => {
                let mut branches = Vec::new();
                for activity in self.registry.prefixes(Category::Activity)? {
                    let users = self.user_branches(Some(activity.as_str()))?;
                    push_branch(&mut branches, activity, users);
                }
                branches
            }
        };

        log::info!(
            "Built session tree by {} from {} ({} top-level branches, {} ms)",
            root,
            self.data_root.display(),
            tree.len(),
            started.elapsed().as_millis()
        );
        Ok(tree)
    }

    fn grouper(&self) -> FolderGrouper<'_> {
        FolderGrouper::new(&self.registry, self.lister.as_ref())
    }

    /// User prefix → instance → ... With `only_activity` set, the activity
    /// level is collapsed and only trials of that activity are kept.
    fn user_branches(&self, only_activity: Option<&str>) -> Result<Vec<TreeNode>> {
        let mut branches = Vec::new();
        for group in self.grouper().group(&self.data_root, Category::User)? {
            let mut instances = Vec::new();
            for dir in &group.entries {
                let user_dir = self.data_root.join(dir);
                let children = match only_activity {
                    None => self.activity_branches(&user_dir)?,
                    Some(activity) => self.activity_trials(&user_dir, activity)?,
                };
                push_branch(&mut instances, instance_id(dir), children);
            }
            push_branch(&mut branches, &group.prefix, instances);
        }
        Ok(branches)
    }

    fn activity_branches(&self, user_dir: &Path) -> Result<Vec<TreeNode>> {
        let mut branches = Vec::new();
        for group in self.grouper().group(user_dir, Category::Activity)? {
            let trials = self.trial_branches(user_dir, &group.entries)?;
            push_branch(&mut branches, &group.prefix, trials);
        }
        Ok(branches)
    }

    fn activity_trials(&self, user_dir: &Path, activity: &str) -> Result<Vec<TreeNode>> {
        let groups = self.grouper().group(user_dir, Category::Activity)?;
        match groups.into_iter().find(|group| group.prefix == activity) {
            Some(group) => self.trial_branches(user_dir, &group.entries),
            None => Ok(Vec::new()),
        }
    }

    fn trial_branches(&self, user_dir: &Path, trial_dirs: &[String]) -> Result<Vec<TreeNode>> {
        let mut trials = Vec::new();
        for dir in trial_dirs {
            let leaves = self.leaves(&user_dir.join(dir))?;
            push_branch(&mut trials, trial_id(dir), leaves);
        }
        Ok(trials)
    }

    fn leaves(&self, trial_dir: &Path) -> Result<Vec<TreeNode>> {
        let suffix = format!(".{}", self.extension);
        let mut leaves = Vec::new();
        for file in self.lister.list_files(trial_dir)? {
            let Some(stem) = file.strip_suffix(suffix.as_str()) else {
                continue;
            };
            if self.registry.matches(&file, Category::DataType)? {
                leaves.push(TreeNode::leaf(stem));
            }
        }
        Ok(leaves)
    }
}

fn push_branch(branches: &mut Vec<TreeNode>, name: &str, children: Vec<TreeNode>) {
    if children.is_empty() {
        log::debug!("Pruning empty branch '{name}'");
        return;
    }
    branches.push(TreeNode::branch(name, children));
}

/// `user_01_extra` → `01`; names without a second segment are used whole.
fn instance_id(dir: &str) -> &str {
    dir.split('_')
        .nth(1)
        .filter(|segment| !segment.is_empty())
        .unwrap_or(dir)
}

/// `walk_fast_03` → `03`.
fn trial_id(dir: &str) -> &str {
    dir.rsplit('_')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(dir)
}
