//! Errors raised while loading `postwatch.toml`.

use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read.
    #[error("cannot read config `{0}`")]
    Read(PathBuf, #[source] io::Error),

    /// The file is not valid TOML or has unknown keys.
    #[error("malformed config `{}`", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A value parsed but cannot be used.
    #[error("`{key}` {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_messages_name_the_culprit() {
        let err = ConfigError::Read(
            PathBuf::from("postwatch.toml"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert_eq!(err.to_string(), "cannot read config `postwatch.toml`");
        assert!(err.source().is_some());

        let err = ConfigError::Invalid {
            key: "[content.tag_file]",
            reason: "must be a plain file name".into(),
        };
        assert_eq!(err.to_string(), "`[content.tag_file]` must be a plain file name");
    }

    #[test]
    fn test_malformed_keeps_toml_source() {
        let source = toml::from_str::<toml::Table>("[content").unwrap_err();
        let err = ConfigError::Malformed {
            path: PathBuf::from("site/postwatch.toml"),
            source,
        };
        assert!(err.to_string().contains("site/postwatch.toml"));
        assert!(err.source().is_some());
    }
}
