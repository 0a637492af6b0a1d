//! ASCII tree rendering, the first piece of the file-structure block.

use crate::scanner::{FileNode, FileTree};

/// Render `tree` as an ASCII diagram using `│  `, `├──`, `└──` connectors,
/// with a trailing `/` on directory names. Ignored nodes are omitted.
pub fn render_tree(tree: &FileTree) -> String {
    let mut out = String::new();
    if let Some(children) = &tree.root().children {
        let visible: Vec<usize> = children.iter().copied().filter(|&i| is_visible(tree.node(i))).collect();
        render_children(tree, &visible, "", &mut out);
    }
    out
}

fn is_visible(node: &FileNode) -> bool {
    !(node.is_gitignored || node.is_custom_ignored || node.is_explicit_ignored)
}

fn render_children(tree: &FileTree, indices: &[usize], prefix: &str, out: &mut String) {
    for (i, &index) in indices.iter().enumerate() {
        let node = tree.node(index);
        let is_last = i == indices.len() - 1;
        let connector = if is_last { "└── " } else { "├── " };
        let name = if node.is_directory {
            format!("{}/", node.name)
        } else {
            node.name.clone()
        };
        out.push_str(prefix);
        out.push_str(connector);
        out.push_str(&name);
        out.push('\n');

        if let Some(children) = &node.children {
            let visible: Vec<usize> = children.iter().copied().filter(|&i| is_visible(tree.node(i))).collect();
            if !visible.is_empty() {
                let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
                render_children(tree, &visible, &child_prefix, out);
            }
        }
    }
}
