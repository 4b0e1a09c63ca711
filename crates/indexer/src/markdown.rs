use session_protocol::TreeNode;

/// Lazily renders a tree as an outline, one line per node, depth first.
///
/// Top-level nodes become `# Header` lines with the first letter
/// upper-cased. Deeper nodes become `- item` bullets indented by two spaces
/// per level below the first bullet level, so depth 1 has no indent.
pub struct MarkdownLines<'a> {
    stack: Vec<(usize, &'a TreeNode)>,
}

impl<'a> MarkdownLines<'a> {
    pub fn new(tree: &'a [TreeNode]) -> Self {
        Self {
            stack: tree.iter().rev().map(|node| (0, node)).collect(),
        }
    }
}

impl<'a> Iterator for MarkdownLines<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (depth + 1, child)));
        Some(render_line(depth, &node.name))
    }
}

pub fn render_line(depth: usize, name: &str) -> String {
    if depth == 0 {
        format!("# {}", capitalize_first(name))
    } else {
        format!("{}- {}", "  ".repeat(depth - 1), name)
    }
}

pub fn render_markdown(tree: &[TreeNode]) -> String {
    let mut md = String::new();
    for line in MarkdownLines::new(tree) {
        md.push_str(&line);
        md.push('\n');
    }
    md
}

fn capitalize_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
