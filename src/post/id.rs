//! Post and tag identifiers.
//!
//! Both are short opaque strings. A [`PostId`] names a directory in the
//! content root; a [`TagId`] is what tag URLs carry instead of the raw name.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use serde::{Deserialize, Serialize};
use std::{fmt, path::Path};
use uuid::Uuid;

use crate::index::IndexError;

/// Attempts made by [`generate_post_id`] before giving up.
pub const POST_ID_ATTEMPTS: usize = 64;

/// Random bytes per generated identifier (8 base64 characters).
const ID_BYTES: usize = 6;

/// Stable identifier of a post, equal to its directory name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(String);

impl PostId {
    /// Validate an identifier that came from outside the content root.
    ///
    /// Rejects anything that would not resolve to a single, visible
    /// directory directly below the root.
    pub fn parse(s: &str) -> Result<Self, IndexError> {
        let valid = !s.is_empty()
            && s != "."
            && s != ".."
            && !s.starts_with('.')
            && !s.contains(['/', '\\', '\0']);

        if valid {
            Ok(Self(s.to_owned()))
        } else {
            Err(IndexError::InvalidId(s.to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Short URL-safe identifier assigned to a tag name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagId(String);

impl TagId {
    /// Fresh random identifier. Uniqueness is the caller's concern.
    pub fn random() -> Self {
        Self(random_token())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TagId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Base64-url encoding of fresh random bytes.
fn random_token() -> String {
    // The first six bytes of a v4 UUID carry no version/variant bits.
    let uuid = Uuid::new_v4();
    URL_SAFE_NO_PAD.encode(&uuid.as_bytes()[..ID_BYTES])
}

/// Allocate an id for a new post whose directory does not exist yet.
pub fn generate_post_id(root: &Path) -> Result<PostId, IndexError> {
    for _ in 0..POST_ID_ATTEMPTS {
        let token = random_token();
        // base64-url may produce a leading '-' but never '.' or '/'
        if !root.join(&token).exists() {
            return Ok(PostId(token));
        }
    }
    Err(IndexError::IdExhausted(POST_ID_ATTEMPTS))
}
