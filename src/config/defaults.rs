//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [content] Section Defaults
// ============================================================================

pub mod content {
    use std::path::PathBuf;

    pub fn dir() -> PathBuf {
        "posts".into()
    }

    pub fn tag_file() -> String {
        "tags.toml".into()
    }

    pub fn meta_file() -> String {
        "post.toml".into()
    }

    pub fn source_file() -> String {
        "post.md".into()
    }
}

// ============================================================================
// [watch] Section Defaults
// ============================================================================

pub mod watch {
    pub fn reconcile_secs() -> u64 {
        0
    }
}
