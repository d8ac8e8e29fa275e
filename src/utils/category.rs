//! Classification of changed paths for the synchronizer.
//!
//! Every event path is mapped to the post it belongs to by its first
//! component below the content root:
//!
//! | Path                               | Category        |
//! |------------------------------------|-----------------|
//! | `posts/hello/post.toml`            | `Post(hello)`   |
//! | `posts/hello/img/cat.png`          | `Post(hello)`   |
//! | `posts/hello`                      | `Post(hello)`   |
//! | `posts/tags.toml`                  | `TagFile`       |
//! | `posts/.git/index`, `*.swp`, `x~`  | `Ignored`       |
//! | `posts/README.md` (a plain file)   | `Ignored`       |
//! | anything outside `posts/`          | `Ignored`       |

use std::path::{Component, Path};

use crate::post::PostId;

/// What a changed path means for the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryCategory {
    /// Inside (or is) the directory of this post.
    Post(PostId),
    /// The persisted tag directory itself.
    TagFile,
    /// Not relevant to the index.
    Ignored,
}

/// Check if path is a temp/backup file (editor artifacts).
pub fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// Categorize `path` relative to the content `root`.
///
/// `root` and `path` are compared as given; callers pass paths in the same
/// form the watcher was registered with.
pub fn categorize_path(path: &Path, root: &Path, tag_file: &str) -> EntryCategory {
    let Ok(rel) = path.strip_prefix(root) else {
        return EntryCategory::Ignored;
    };
    if is_temp_file(path) {
        return EntryCategory::Ignored;
    }

    let mut components = rel.components();
    let Some(Component::Normal(first)) = components.next() else {
        return EntryCategory::Ignored;
    };
    let Some(first) = first.to_str() else {
        return EntryCategory::Ignored;
    };

    let top_level = components.next().is_none();
    if top_level {
        if first == tag_file {
            return EntryCategory::TagFile;
        }
        // Loose files next to the post directories are not posts.
        if path.is_file() {
            return EntryCategory::Ignored;
        }
    }

    PostId::parse(first).map_or(EntryCategory::Ignored, EntryCategory::Post)
}
