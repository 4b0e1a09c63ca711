use crate::{IndexerError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Well-known registry dimensions used by the tree builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    User,
    Activity,
    DataType,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::User, Category::Activity, Category::DataType];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::User => "user",
            Category::Activity => "activity",
            Category::DataType => "data_type",
        }
    }
}

impl AsRef<str> for Category {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Allowed name prefixes per category, in the order they were registered.
///
/// Prefixes are matched with "starts with" against raw directory and file
/// names and are not required to be mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameRegistry {
    categories: HashMap<String, Vec<String>>,
}

impl NameRegistry {
    pub fn new<C, P, S>(categories: C) -> Self
    where
        C: IntoIterator<Item = (S, P)>,
        P: IntoIterator,
        P::Item: Into<String>,
        S: Into<String>,
    {
        let categories = categories
            .into_iter()
            .map(|(name, prefixes)| (name.into(), prefixes.into_iter().map(Into::into).collect()))
            .collect();
        Self { categories }
    }

    pub fn with_category<P>(mut self, category: impl AsRef<str>, prefixes: P) -> Self
    where
        P: IntoIterator,
        P::Item: Into<String>,
    {
        self.categories.insert(
            category.as_ref().to_string(),
            prefixes.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Parse a JSON object of `category -> [prefix, ...]`.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let categories: HashMap<String, Vec<String>> = serde_json::from_str(raw)?;
        let registry = Self { categories };
        for category in Category::ALL {
            if !registry.categories.contains_key(category.as_str()) {
                log::warn!(
                    "Name registry has no '{}' category; builds will fail until it is added",
                    category.as_str()
                );
            }
        }
        Ok(registry)
    }

    pub fn load(path: &Path) -> Result<Self> {
        log::info!("Loading name registry from {}", path.display());
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn prefixes(&self, category: impl AsRef<str>) -> Result<&[String]> {
        let category = category.as_ref();
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .ok_or_else(|| IndexerError::UnknownCategory(category.to_string()))
    }

    /// True iff `name` starts with at least one prefix registered for `category`.
    pub fn matches(&self, name: &str, category: impl AsRef<str>) -> Result<bool> {
        Ok(self
            .prefixes(category)?
            .iter()
            .any(|prefix| name.starts_with(prefix.as_str())))
    }

    pub fn categories(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.categories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
