//! Configuration management for `postwatch.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                      |
//! |-------------|----------------------------------------------|
//! | `[content]` | Posts directory and per-post file names      |
//! | `[watch]`   | Live synchronization and periodic rescans    |
//!
//! The file is optional: without it every field takes its default.
//!
//! # Example
//!
//! ```toml
//! [content]
//! dir = "~/blog/posts"
//!
//! [watch]
//! reconcile_secs = 300
//! ```

mod content;
pub mod defaults;
mod error;
mod watch;

pub use content::ContentConfig;
pub use error::ConfigError;
pub use watch::WatchConfig;

use crate::cli::{Cli, Commands};
use anyhow::Result;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing postwatch.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root; relative paths resolve against it
    #[serde(skip)]
    pub root: PathBuf,

    /// Posts directory and file layout
    #[serde(default)]
    pub content: ContentConfig,

    /// Live synchronization settings
    #[serde(default)]
    pub watch: WatchConfig,
}

impl Config {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Read(path.to_path_buf(), err))?;
        Self::from_str(&content).map_err(|source| ConfigError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `cli.config` below the root if present, else defaults, then apply CLI overrides.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.update_with_cli(cli);
        config.validate()?;
        Ok(config)
    }

    /// Absolute posts directory.
    pub fn content_dir(&self) -> &Path {
        &self.content.dir
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli.root.clone().unwrap_or_else(|| PathBuf::from("./"));
        let root = normalize_path(&root);

        Self::update_option(&mut self.content.dir, cli.posts.as_ref());
        if let Commands::Watch { reconcile_secs } = &cli.command {
            Self::update_option(&mut self.watch.reconcile_secs, reconcile_secs.as_ref());
        }

        self.config_path = normalize_path(&root.join(&cli.config));
        self.content.dir = resolve_dir(&root, &self.content.dir);
        self.root = root;
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Check that per-post file names are plain and distinct.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let names = [
            ("[content.tag_file]", &self.content.tag_file),
            ("[content.meta_file]", &self.content.meta_file),
            ("[content.source_file]", &self.content.source_file),
        ];

        for (key, name) in names {
            if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("must be a plain file name, got `{name}`"),
                });
            }
        }

        if self.content.meta_file == self.content.source_file {
            return Err(ConfigError::Invalid {
                key: "[content.source_file]",
                reason: "must differ from [content.meta_file]".into(),
            });
        }

        Ok(())
    }
}

/// Expand `~` and resolve a configured directory against the root.
fn resolve_dir(root: &Path, dir: &Path) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(&dir.to_string_lossy()).into_owned());
    if expanded.is_relative() {
        normalize_path(&root.join(expanded))
    } else {
        normalize_path(&expanded)
    }
}

/// Normalize a path to absolute, using canonicalize if the path exists
fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map(|cwd| cwd.join(path))
                .unwrap_or_else(|_| path.to_path_buf())
        }
    })
}
