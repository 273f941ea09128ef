use crate::vfs::VirtualFS;
use colored::Colorize;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Represents a node in the tree (either file or directory).
#[derive(Debug)]
struct TreeNode {
    name: String,
    children: Vec<Rc<RefCell<TreeNode>>>,
    is_file: bool,
}
impl TreeNode {
    fn new(name: String, is_file: bool) -> Self {
        Self {
            name,
            children: Vec::new(),
            is_file,
        }
    }
}

/// Returns the node for `path`, creating directory nodes for any ancestors that
/// the VFS did not list explicitly.
fn node_for(
    path: &Path,
    is_file: bool,
    lookup: &mut HashMap<PathBuf, Rc<RefCell<TreeNode>>>,
) -> Option<Rc<RefCell<TreeNode>>> {
    if let Some(node) = lookup.get(path) {
        return Some(Rc::clone(node));
    }

    let parent = node_for(path.parent()?, false, lookup)?;

    let name = path
        .file_name()
        .map(|os| os.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let node = Rc::new(RefCell::new(TreeNode::new(name, is_file)));
    parent.borrow_mut().children.push(Rc::clone(&node));
    lookup.insert(path.to_path_buf(), Rc::clone(&node));

    Some(node)
}

/// Build the directory tree from the VFS entries, returning the root node.
fn build_tree(vfs: &VirtualFS, destination: &Path) -> Rc<RefCell<TreeNode>> {
    let root_name = destination
        .file_name()
        .map(|os| os.to_string_lossy().to_string())
        .unwrap_or_else(|| destination.display().to_string());

    let root = Rc::new(RefCell::new(TreeNode::new(root_name, false)));

    // keyed by path relative to the destination; the root is the empty path
    let mut lookup: HashMap<PathBuf, Rc<RefCell<TreeNode>>> = HashMap::new();
    lookup.insert(PathBuf::new(), Rc::clone(&root));

    for entry in &vfs.entries {
        if node_for(&entry.destination, entry.is_file, &mut lookup).is_none() {
            log::debug!("no parent for path: {}", entry.destination.display());
        }
    }

    root
}

/// Renders the tree with box-drawing connectors, one line per node.
fn render_tree(node: &Rc<RefCell<TreeNode>>, prefix: &str, is_last: bool, out: &mut Vec<String>) {
    let node_borrow = node.borrow();

    let connector = if is_last {
        "└── ".yellow()
    } else {
        "├── ".yellow()
    };
    let name = if node_borrow.is_file {
        node_borrow.name.green()
    } else {
        node_borrow.name.blue()
    };
    out.push(format!("{}{}{}", prefix.yellow(), connector, name));

    let child_prefix = if is_last {
        format!("{}    ", prefix)
    } else {
        format!("{}│   ", prefix)
    };

    let len = node_borrow.children.len();
    for (i, child) in node_borrow.children.iter().enumerate() {
        let last = i == len - 1;
        render_tree(child, &child_prefix, last, out);
    }
}

/// Lines of the preview tree for `vfs` rooted at `destination`.
pub fn tree_lines(vfs: &VirtualFS, destination: &Path) -> Vec<String> {
    let tree_root = build_tree(vfs, destination);

    let mut lines = Vec::new();
    render_tree(&tree_root, "", true, &mut lines);

    lines
}

pub fn preview_as_tree(vfs: &VirtualFS, destination: &Path) {
    println!(
        "Legend: {} = (directory), {} = (file)",
        "blue".blue(),
        "green".green()
    );

    let fancy_prompt = format!(
        "{} {}\n",
        "┌─".bold().bright_blue(),
        "Preview".bold().bright_blue(),
    );

    println!("{}", fancy_prompt);

    for line in tree_lines(vfs, destination) {
        println!("{}", line);
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::VirtualEntry;

    #[test]
    fn missing_parents_are_synthesized() {
        colored::control::set_override(false);

        let vfs = VirtualFS {
            entries: vec![
                VirtualEntry {
                    destination: PathBuf::from("Game/Source/Game.Target.cs"),
                    content: Some(Vec::new()),
                    is_file: true,
                },
                VirtualEntry {
                    destination: PathBuf::from("Game/Source/Game/Game.cpp"),
                    content: Some(Vec::new()),
                    is_file: true,
                },
            ],
        };

        let lines = tree_lines(&vfs, Path::new("/projects"));

        assert_eq!(
            lines,
            vec![
                "└── projects",
                "    └── Game",
                "        └── Source",
                "            ├── Game.Target.cs",
                "            └── Game",
                "                └── Game.cpp",
            ]
        );
    }
}
