use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

const MAX_ENTRIES: usize = 1000;

/// One row of the file tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub path: PathBuf,
    /// Depth below the folder root, starting at 1.
    pub depth: usize,
    pub is_dir: bool,
}

impl TreeEntry {
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Walk `root` in tree order (depth-first, names sorted, directories before
/// files at each level). Respects `.gitignore`. `max_depth` of `None` walks
/// the whole tree; output is capped at 1000 entries.
pub fn list_folder(root: &Path, max_depth: Option<usize>) -> Vec<TreeEntry> {
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(true)
        .git_global(true)
        .max_depth(max_depth)
        .sort_by_file_path(|a, b| b.is_dir().cmp(&a.is_dir()).then_with(|| a.cmp(b)));

    let mut entries = Vec::new();
    for entry in builder.build().flatten() {
        if entry.depth() == 0 {
            continue;
        }
        entries.push(TreeEntry {
            is_dir: entry.file_type().is_some_and(|ft| ft.is_dir()),
            depth: entry.depth(),
            path: entry.into_path(),
        });
        if entries.len() >= MAX_ENTRIES {
            break;
        }
    }
    entries
}
