//! Post parsing.
//!
//! The index only ever needs [`PostParser::parse_meta`]; the full
//! [`PostParser::parse`] (rendered body and attachments) is for display.

use pulldown_cmark::{Event, Options, Parser, Tag, html};
use serde::Deserialize;
use std::{
    collections::BTreeSet,
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

use super::PostMeta;
use crate::{config::ContentConfig, utils::date::parse_date};

/// Errors produced while reading a post directory.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] io::Error),

    #[error("malformed metadata in `{0}`")]
    Toml(PathBuf, #[source] toml::de::Error),

    #[error("invalid date `{1}` in `{0}`")]
    Date(PathBuf, String),

    #[error("missing title in `{0}`")]
    MissingTitle(PathBuf),
}

/// A fully parsed post, ready to render.
#[derive(Debug, Clone)]
pub struct ParsedPost {
    pub meta: PostMeta,
    /// Body rendered to HTML.
    pub html: String,
    /// Files in the post directory that the body references.
    pub attachments: BTreeSet<String>,
}

/// Turns a post directory into structured data.
pub trait PostParser: Send + Sync {
    /// Read the metadata and check that a body exists.
    fn parse_meta(&self, dir: &Path) -> Result<PostMeta, ParseError>;

    /// Read metadata, render the body and collect attachments.
    fn parse(&self, dir: &Path) -> Result<ParsedPost, ParseError>;
}

/// `post.toml` + markdown `post.md` posts.
#[derive(Debug, Clone)]
pub struct TomlMarkdownParser {
    meta_file: String,
    source_file: String,
}

impl TomlMarkdownParser {
    pub fn new(meta_file: impl Into<String>, source_file: impl Into<String>) -> Self {
        Self {
            meta_file: meta_file.into(),
            source_file: source_file.into(),
        }
    }

    pub fn from_config(content: &ContentConfig) -> Self {
        Self::new(&content.meta_file, &content.source_file)
    }

    fn read_source(&self, dir: &Path) -> Result<String, ParseError> {
        let path = dir.join(&self.source_file);
        fs::read_to_string(&path).map_err(|err| ParseError::Io(path, err))
    }
}

impl Default for TomlMarkdownParser {
    fn default() -> Self {
        Self::new("post.toml", "post.md")
    }
}

/// On-disk metadata layout. Capitalized keys are accepted for older posts.
#[derive(Debug, Deserialize)]
struct RawMeta {
    #[serde(alias = "Title")]
    title: String,

    #[serde(alias = "Date")]
    date: toml::Value,

    #[serde(default, alias = "Tags")]
    tags: Vec<String>,
}

impl PostParser for TomlMarkdownParser {
    fn parse_meta(&self, dir: &Path) -> Result<PostMeta, ParseError> {
        let path = dir.join(&self.meta_file);
        let content = fs::read_to_string(&path).map_err(|err| ParseError::Io(path.clone(), err))?;
        let raw: RawMeta =
            toml::from_str(&content).map_err(|err| ParseError::Toml(path.clone(), err))?;

        let title = raw.title.trim().to_owned();
        if title.is_empty() {
            return Err(ParseError::MissingTitle(path));
        }

        let date = match raw.date {
            toml::Value::Datetime(dt) => dt.to_string(),
            toml::Value::String(s) => s,
            other => return Err(ParseError::Date(path, other.to_string())),
        };
        let created_at = parse_date(&date).ok_or_else(|| ParseError::Date(path.clone(), date))?;

        let tags = raw
            .tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect();

        // A post without a body is not a post.
        let source = dir.join(&self.source_file);
        fs::metadata(&source).map_err(|err| ParseError::Io(source, err))?;

        Ok(PostMeta {
            title,
            created_at,
            tags,
        })
    }

    fn parse(&self, dir: &Path) -> Result<ParsedPost, ParseError> {
        let meta = self.parse_meta(dir)?;
        let source = self.read_source(dir)?;
        let (html, attachments) = render_markdown(&source, dir);
        Ok(ParsedPost {
            meta,
            html,
            attachments,
        })
    }
}

/// Render markdown to HTML, collecting links/images that point at files in `dir`.
fn render_markdown(source: &str, dir: &Path) -> (String, BTreeSet<String>) {
    let options = Options::ENABLE_FOOTNOTES | Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;

    let mut attachments = BTreeSet::new();
    let events: Vec<Event> = Parser::new_ext(source, options)
        .inspect(|event| {
            if let Event::Start(Tag::Image { dest_url, .. } | Tag::Link { dest_url, .. }) = event
                && is_local_file(dir, dest_url)
            {
                attachments.insert(dest_url.to_string());
            }
        })
        .collect();

    let mut html = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut html, events.into_iter());
    (html, attachments)
}

/// Plain relative file name that exists inside the post directory.
fn is_local_file(dir: &Path, dest: &str) -> bool {
    !dest.is_empty()
        && !dest.contains("://")
        && !dest.starts_with(['/', '#', '.'])
        && !dest.contains(['/', '\\'])
        && dir.join(dest).is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn post_dir(meta: &str, body: Option<&str>) -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("post.toml"), meta).unwrap();
        if let Some(body) = body {
            fs::write(dir.path().join("post.md"), body).unwrap();
        }
        dir
    }

    #[test]
    fn test_parse_meta_full() {
        let dir = post_dir(
            "title = \"Hello\"\ndate = 2024-01-01\ntags = [\"go\", \" rust \", \"\", \"go\"]\n",
            Some("# Hello"),
        );
        let meta = TomlMarkdownParser::default().parse_meta(dir.path()).unwrap();

        assert_eq!(meta.title, "Hello");
        assert_eq!(meta.created_at, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(
            meta.tags.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["go", "rust"]
        );
    }

    #[test]
    fn test_parse_meta_offset_datetime_and_string_date() {
        let dir = post_dir(
            "title = \"A\"\ndate = 2024-06-01T12:00:00+02:00\n",
            Some(""),
        );
        let meta = TomlMarkdownParser::default().parse_meta(dir.path()).unwrap();
        assert_eq!(meta.created_at, Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap());
        assert!(meta.tags.is_empty());

        let dir = post_dir("title = \"B\"\ndate = \"2024-06-01\"\n", Some(""));
        let meta = TomlMarkdownParser::default().parse_meta(dir.path()).unwrap();
        assert_eq!(meta.created_at, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_meta_capitalized_keys() {
        let dir = post_dir(
            "Title = \"Old\"\nDate = 2023-03-03T00:00:00Z\nTags = [\"About\"]\n",
            Some(""),
        );
        let meta = TomlMarkdownParser::default().parse_meta(dir.path()).unwrap();
        assert_eq!(meta.title, "Old");
        assert!(meta.tags.contains("About"));
    }

    #[test]
    fn test_parse_meta_errors() {
        let parser = TomlMarkdownParser::default();

        let dir = post_dir("title = \"x\"\ndate = 2024-01-01\n", None);
        assert!(matches!(parser.parse_meta(dir.path()), Err(ParseError::Io(..))));

        let dir = post_dir("title = \"x\"\ndate = \n", Some(""));
        assert!(matches!(parser.parse_meta(dir.path()), Err(ParseError::Toml(..))));

        let dir = post_dir("title = \"x\"\ndate = \"soon\"\n", Some(""));
        assert!(matches!(parser.parse_meta(dir.path()), Err(ParseError::Date(..))));

        let dir = post_dir("title = \"x\"\ndate = 12\n", Some(""));
        assert!(matches!(parser.parse_meta(dir.path()), Err(ParseError::Date(..))));

        let dir = post_dir("title = \"  \"\ndate = 2024-01-01\n", Some(""));
        assert!(matches!(parser.parse_meta(dir.path()), Err(ParseError::MissingTitle(_))));

        let empty = TempDir::new().unwrap();
        assert!(matches!(parser.parse_meta(empty.path()), Err(ParseError::Io(..))));
    }

    #[test]
    fn test_parse_renders_body_and_attachments() {
        let dir = post_dir(
            "title = \"Pics\"\ndate = 2024-01-01\n",
            Some("# Pics\n\n![a cat](cat.png)\n\n[notes](notes.txt) [web](https://example.com) ![gone](missing.png)\n"),
        );
        fs::write(dir.path().join("cat.png"), b"png").unwrap();
        fs::write(dir.path().join("notes.txt"), b"txt").unwrap();

        let post = TomlMarkdownParser::default().parse(dir.path()).unwrap();

        assert!(post.html.contains("<h1>Pics</h1>"));
        assert!(post.html.contains("src=\"cat.png\""));
        assert_eq!(
            post.attachments.iter().map(String::as_str).collect::<Vec<_>>(),
            vec!["cat.png", "notes.txt"]
        );
    }

    #[test]
    fn test_custom_file_names() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("meta.toml"), "title = \"C\"\ndate = 2024-01-01\n").unwrap();
        fs::write(dir.path().join("index.md"), "hi").unwrap();

        let parser = TomlMarkdownParser::new("meta.toml", "index.md");
        assert_eq!(parser.parse(dir.path()).unwrap().meta.title, "C");
    }
}
