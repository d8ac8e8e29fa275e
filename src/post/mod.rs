//! Post records and the parser that produces them.
//!
//! A post lives in its own directory below the content root:
//!
//! ```text
//! posts/
//! ├── tags.toml          tag name -> tag id
//! └── hello-world/       PostId = directory name
//!     ├── post.toml      title, date, tags
//!     ├── post.md        body source
//!     └── diagram.png    attachment
//! ```

mod id;
mod parser;

pub use id::{POST_ID_ATTEMPTS, PostId, TagId, generate_post_id};
pub use parser::{ParseError, ParsedPost, PostParser, TomlMarkdownParser};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

/// Metadata extracted from a post's metadata file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostMeta {
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub tags: BTreeSet<String>,
}

/// One indexed post.
///
/// Replaced wholesale whenever the post is re-parsed, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PostRecord {
    pub id: PostId,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub tags: BTreeSet<String>,
}

impl PostRecord {
    pub fn new(id: PostId, meta: PostMeta) -> Self {
        Self {
            id,
            title: meta.title,
            created_at: meta.created_at,
            tags: meta.tags,
        }
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}
