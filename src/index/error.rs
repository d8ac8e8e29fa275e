//! Index error types.

use std::{io, path::PathBuf};
use thiserror::Error;

use crate::post::{ParseError, PostId};

/// Failures of index operations.
///
/// An unknown id is never an error: lookups report it through
/// `bool`/`Option`/empty results instead.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("failed to parse post `{id}`")]
    Parse {
        id: PostId,
        #[source]
        source: ParseError,
    },

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// The in-memory change already happened; only the disk lags behind.
    #[error("failed to update storage of post `{id}`")]
    Storage {
        id: PostId,
        #[source]
        source: io::Error,
    },

    #[error("invalid post id `{0}`")]
    InvalidId(String),

    #[error("could not allocate a post id after {0} attempts")]
    IdExhausted(usize),
}

/// Failures reading or writing the tag directory file.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error when accessing `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error("corrupt tag directory `{0}`")]
    Corrupt(PathBuf, #[source] toml::de::Error),

    #[error("failed to serialize tag directory")]
    Serialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_parse_error_keeps_source() {
        let err = IndexError::Parse {
            id: PostId::parse("abc").unwrap(),
            source: ParseError::MissingTitle(PathBuf::from("abc/post.toml")),
        };
        assert_eq!(err.to_string(), "failed to parse post `abc`");
        assert!(err.source().unwrap().to_string().contains("abc/post.toml"));
    }

    #[test]
    fn test_persistence_is_transparent() {
        let err: IndexError = PersistenceError::Io(
            PathBuf::from("tags.toml"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        )
        .into();
        assert!(err.to_string().contains("tags.toml"));
    }
}
