use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One labeled node of the session tree.
///
/// Leaves (data files) carry no children; the `children` key is omitted from
/// their JSON form.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct TreeNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn branch(name: impl Into<String>, children: Vec<TreeNode>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Names of every leaf below (or at) this node, in pre-order.
    pub fn leaf_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        collect_leaves(self, &mut out);
        out
    }

    /// Number of levels including this node.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(TreeNode::depth).max().unwrap_or(0)
    }
}

fn collect_leaves<'a>(node: &'a TreeNode, out: &mut Vec<&'a str>) {
    if node.is_leaf() {
        out.push(&node.name);
        return;
    }
    for child in &node.children {
        collect_leaves(child, out);
    }
}

/// Which category forms the top level of the tree.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum RootCategory {
    #[default]
    User,
    Activity,
}

impl RootCategory {
    pub const ALL: [RootCategory; 2] = [RootCategory::User, RootCategory::Activity];

    pub fn as_str(self) -> &'static str {
        match self {
            RootCategory::User => "user",
            RootCategory::Activity => "activity",
        }
    }
}

impl fmt::Display for RootCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RootCategory {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "user" => Ok(RootCategory::User),
            "activity" => Ok(RootCategory::Activity),
            other => anyhow::bail!(
                "Unsupported starting class name '{other}' (expected 'user' or 'activity')"
            ),
        }
    }
}

/// Body of `GET /get-tree`. Both fields are always present, `null` when unset.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct TreeResponse {
    pub error_msg: Option<String>,
    pub tree: Option<Vec<TreeNode>>,
}

impl TreeResponse {
    pub fn ok(tree: Vec<TreeNode>) -> Self {
        Self {
            error_msg: None,
            tree: Some(tree),
        }
    }

    pub fn error(message: impl Into<String>, tree: Option<Vec<TreeNode>>) -> Self {
        Self {
            error_msg: Some(message.into()),
            tree,
        }
    }
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}
