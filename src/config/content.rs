//! `[content]` section configuration.
//!
//! Where posts live and which files make up a post.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[content]` section in postwatch.toml.
///
/// # Example
/// ```toml
/// [content]
/// dir = "posts"            # one sub-directory per post
/// tag_file = "tags.toml"   # tag name -> id mapping, inside `dir`
/// meta_file = "post.toml"
/// source_file = "post.md"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ContentConfig {
    /// Posts directory, relative to the project root.
    #[serde(default = "defaults::content::dir")]
    #[educe(Default = defaults::content::dir())]
    pub dir: PathBuf,

    /// File in `dir` holding the persisted tag directory.
    #[serde(default = "defaults::content::tag_file")]
    #[educe(Default = defaults::content::tag_file())]
    pub tag_file: String,

    /// Per-post metadata file (title, date, tags).
    #[serde(default = "defaults::content::meta_file")]
    #[educe(Default = defaults::content::meta_file())]
    pub meta_file: String,

    /// Per-post body source.
    #[serde(default = "defaults::content::source_file")]
    #[educe(Default = defaults::content::source_file())]
    pub source_file: String,
}

#[cfg(test)]
mod tests {
    use super::super::Config;
    use std::path::PathBuf;

    #[test]
    fn test_content_config() {
        let config: Config = toml::from_str(
            r#"
            [content]
            dir = "blog/posts"
            tag_file = "tag-ids.toml"
        "#,
        )
        .unwrap();

        assert_eq!(config.content.dir, PathBuf::from("blog/posts"));
        assert_eq!(config.content.tag_file, "tag-ids.toml");
        assert_eq!(config.content.meta_file, "post.toml");
        assert_eq!(config.content.source_file, "post.md");
    }

    #[test]
    fn test_content_config_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.content.dir, PathBuf::from("posts"));
        assert_eq!(config.content.tag_file, "tags.toml");
    }

    #[test]
    fn test_unknown_field_rejection() {
        let result: Result<Config, _> = toml::from_str(
            r#"
            [content]
            unknown_field = "should_fail"
        "#,
        );
        assert!(result.is_err());
    }
}
