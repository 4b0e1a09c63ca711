use crate::fs::DirectoryLister;
use crate::registry::NameRegistry;
use crate::Result;
use std::path::Path;

/// Directory names under one registered prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixGroup {
    pub prefix: String,
    pub entries: Vec<String>,
}

/// Buckets the child directories of a path by category prefix.
pub struct FolderGrouper<'a> {
    registry: &'a NameRegistry,
    lister: &'a dyn DirectoryLister,
}

impl<'a> FolderGrouper<'a> {
    pub fn new(registry: &'a NameRegistry, lister: &'a dyn DirectoryLister) -> Self {
        Self { registry, lister }
    }

    /// One group per registered prefix, in registry order, including empty
    /// ones. A directory matching several prefixes lands in each of them.
    pub fn group(&self, dir: &Path, category: impl AsRef<str>) -> Result<Vec<PrefixGroup>> {
        let prefixes = self.registry.prefixes(category)?;
        let entries = self.lister.list_dirs(dir)?;

        Ok(prefixes
            .iter()
            .map(|prefix| PrefixGroup {
                prefix: prefix.clone(),
                entries: entries
                    .iter()
                    .filter(|name| name.starts_with(prefix.as_str()))
                    .cloned()
                    .collect(),
            })
            .collect())
    }
}
