//! Live post index.
//!
//! [`PostStore`] is the single shared mutable resource: the in-memory
//! [`PostIndex`] behind a reader/writer lock, plus the content root it mirrors.
//!
//! # Locking
//!
//! ```text
//! readers (query, search, listings)      writers (add, remove, sync events)
//! ─────────────────────────────────      ──────────────────────────────────
//! index.read()  ── many at once          parse post (no lock held)
//!   copy results out                     index.write() ── exclusive
//! drop guard                               mutate tables + save tags.toml
//!                                        drop guard
//!                                        delete/move directories (no lock)
//! ```
//!
//! Every mutation, including the tag file write, happens under one write
//! guard, so readers never observe a half-applied change.

mod error;
mod query;
mod rank;
mod state;
mod tags;

pub use error::{IndexError, PersistenceError};
pub use query::{QueryOptions, TagPosts, TagSummary};
pub use rank::{Matcher, fold, rank_match};
pub use state::PostIndex;
pub use tags::TagDirectory;

use parking_lot::{RwLock, RwLockReadGuard};
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

use crate::{
    config::Config,
    log,
    post::{ParsedPost, PostId, PostParser, PostRecord, TagId, TomlMarkdownParser},
};

/// Post directories directly below `root`, sorted by name.
///
/// Hidden directories and names that are not valid post ids are skipped.
pub fn scan_post_dirs(root: &Path) -> Result<Vec<PostId>, IndexError> {
    let mut ids = Vec::new();
    for entry in WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(root).to_path_buf();
            IndexError::Io(path, err.into())
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if let Some(id) = entry.file_name().to_str().and_then(|name| PostId::parse(name).ok()) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Outcome of a [`PostStore::reconcile`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Posts present and parsed.
    pub indexed: usize,
    /// Indexed posts whose directory vanished.
    pub removed: usize,
    /// Directories that failed to parse and are now absent.
    pub failed: usize,
}

/// The post index together with the directory it mirrors.
pub struct PostStore {
    root: PathBuf,
    tag_file: String,
    parser: Box<dyn PostParser>,
    index: RwLock<PostIndex>,
}

impl std::fmt::Debug for PostStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostStore")
            .field("root", &self.root)
            .field("tag_file", &self.tag_file)
            .field("posts", &self.index.read().len())
            .finish()
    }
}

impl PostStore {
    /// Scan `root` and build the index.
    ///
    /// Strict: any post that fails to parse aborts with that error, as does a
    /// corrupt tag file.
    pub fn open(
        root: impl Into<PathBuf>,
        tag_file: impl Into<String>,
        parser: Box<dyn PostParser>,
    ) -> Result<Self, IndexError> {
        let root = root.into();
        let tag_file = tag_file.into();

        let ids = scan_post_dirs(&root)?;
        // Missing file: ids are minted while inserting below.
        let loaded = TagDirectory::load(&root.join(&tag_file))?;
        let rebuilt = loaded.is_none();

        let mut index = PostIndex::with_tags(loaded.unwrap_or_default());
        for id in ids {
            let meta = parser
                .parse_meta(&root.join(id.as_str()))
                .map_err(|source| IndexError::Parse {
                    id: id.clone(),
                    source,
                })?;
            index.insert(PostRecord::new(id, meta));
        }
        index.prune_tags();
        if rebuilt {
            log!("tags"; "rebuilt {} with {} tags", tag_file, index.tags().len());
        }

        let store = Self {
            root,
            tag_file,
            parser,
            index: RwLock::new(index),
        };
        {
            let index = store.index.read();
            store.persist_tags(&index);
            log!("index"; "indexed {} posts with {} tags", index.len(), index.tags().len());
        }
        Ok(store)
    }

    /// [`Self::open`] with the layout and parser from `config`.
    pub fn from_config(config: &Config) -> Result<Self, IndexError> {
        Self::open(
            config.content_dir(),
            &config.content.tag_file,
            Box::new(TomlMarkdownParser::from_config(&config.content)),
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tag_file(&self) -> &str {
        &self.tag_file
    }

    /// Directory backing `id`.
    pub fn post_dir(&self, id: &PostId) -> PathBuf {
        self.root.join(id.as_str())
    }

    /// Shared read access for callers that need several lookups at once.
    pub fn read(&self) -> RwLockReadGuard<'_, PostIndex> {
        self.index.read()
    }

    /// Parse `id` and insert it, replacing any stale record.
    ///
    /// On parse failure the index is left untouched.
    pub fn add(&self, id: &PostId) -> Result<(), IndexError> {
        let record = self.parse_record(id)?;

        let mut index = self.index.write();
        index.insert(record);
        self.persist_tags(&index);
        Ok(())
    }

    /// Re-read `id` from disk, replacing its record if it parses.
    ///
    /// Unlike [`Self::add`], a parse failure leaves the post absent. Returns
    /// whether the post is indexed afterwards.
    pub fn refresh(&self, id: &PostId) -> Result<bool, IndexError> {
        let parsed = self.parse_record(id);

        let mut index = self.index.write();
        let result = match parsed {
            Ok(record) => {
                index.insert(record);
                Ok(true)
            }
            Err(err) => {
                index.retract(id);
                Err(err)
            }
        };
        self.persist_tags(&index);
        result
    }

    /// Drop `id` from the index without touching its files.
    ///
    /// Returns whether it was indexed.
    pub fn retract(&self, id: &PostId) -> bool {
        let mut index = self.index.write();
        let existed = index.retract(id).is_some();
        if existed {
            self.persist_tags(&index);
        }
        existed
    }

    /// Remove `id`, optionally deleting its directory.
    ///
    /// Returns `Ok(false)` for unknown ids. A failed delete is reported as
    /// [`IndexError::Storage`] but the in-memory removal stands.
    pub fn remove(&self, id: &PostId, delete_files: bool) -> Result<bool, IndexError> {
        if !self.retract(id) {
            return Ok(false);
        }

        if delete_files {
            fs::remove_dir_all(self.post_dir(id)).map_err(|source| IndexError::Storage {
                id: id.clone(),
                source,
            })?;
        }
        Ok(true)
    }

    /// Replace `old` with the post stored under `new`, in one step.
    ///
    /// The new location is parsed first; on failure nothing changes.
    pub fn rename(&self, old: &PostId, new: &PostId) -> Result<(), IndexError> {
        let record = self.parse_record(new)?;

        let mut index = self.index.write();
        index.insert(record);
        if old != new {
            index.retract(old);
        }
        self.persist_tags(&index);
        Ok(())
    }

    /// Publish the staged post `staged` under the existing id `target`.
    ///
    /// The target's directory is deleted, the staged directory moved onto it
    /// and the result indexed as `target`. Tags shared by both keep their ids.
    /// Replacing a post with itself just re-reads it.
    ///
    /// If the move fails, `staged` stays indexed and `target` stays indexed
    /// only while its directory still exists.
    pub fn replace(&self, target: &PostId, staged: &PostId) -> Result<(), IndexError> {
        if target == staged {
            return self.add(target);
        }

        let staged_dir = self.post_dir(staged);
        let meta = self
            .parser
            .parse_meta(&staged_dir)
            .map_err(|source| IndexError::Parse {
                id: staged.clone(),
                source,
            })?;

        let target_dir = self.post_dir(target);
        let moved = (|| -> std::io::Result<()> {
            if target_dir.exists() {
                fs::remove_dir_all(&target_dir)?;
            }
            fs::rename(&staged_dir, &target_dir)
        })();

        let mut index = self.index.write();
        let result = match moved {
            Ok(()) => {
                index.insert(PostRecord::new(target.clone(), meta));
                index.retract(staged);
                Ok(())
            }
            Err(source) => {
                if !target_dir.is_dir() {
                    index.retract(target);
                }
                Err(IndexError::Storage {
                    id: target.clone(),
                    source,
                })
            }
        };
        self.persist_tags(&index);
        result
    }

    /// Rescan the whole content root, repairing any drift from missed events.
    ///
    /// Lenient: unparseable posts are logged and left out.
    pub fn reconcile(&self) -> Result<ReconcileReport, IndexError> {
        let on_disk = scan_post_dirs(&self.root)?;
        let mut report = ReconcileReport::default();

        let vanished: Vec<PostId> = {
            let index = self.index.read();
            index
                .by_date()
                .iter()
                .filter(|id| !on_disk.contains(id))
                .cloned()
                .collect()
        };
        for id in &vanished {
            if self.retract(id) {
                report.removed += 1;
            }
        }

        for id in &on_disk {
            match self.refresh(id) {
                Ok(_) => report.indexed += 1,
                Err(err) => {
                    log!("index"; "skipped {id}: {}", error_chain(&err));
                    report.failed += 1;
                }
            }
        }
        Ok(report)
    }

    /// Snapshot of one record.
    pub fn get(&self, id: &PostId) -> Option<PostRecord> {
        self.index.read().get(id).cloned()
    }

    /// Full parse of an indexed post, for rendering.
    pub fn load(&self, id: &PostId) -> Result<Option<ParsedPost>, IndexError> {
        if !self.index.read().contains(id) {
            return Ok(None);
        }
        self.parser
            .parse(&self.post_dir(id))
            .map(Some)
            .map_err(|source| IndexError::Parse {
                id: id.clone(),
                source,
            })
    }

    /// Posts matching every filter in `opts`.
    pub fn query(&self, opts: &QueryOptions) -> Vec<PostRecord> {
        query::query(&self.index.read(), opts)
    }

    /// Ids of posts whose title fuzzily matches `term`, best first.
    pub fn search_and_rank(&self, term: &str) -> Vec<PostId> {
        query::search_and_rank(&self.index.read(), term)
    }

    /// Every post, newest first.
    pub fn posts_by_date(&self) -> Vec<PostRecord> {
        query::posts_by_date(&self.index.read())
    }

    /// Tags matching `search` (all when empty) with their ids and post counts.
    pub fn tags_with_counts(&self, search: &str) -> Vec<TagSummary> {
        query::tags_with_counts(&self.index.read(), search)
    }

    pub fn tag_id(&self, name: &str) -> Option<TagId> {
        self.index.read().tags().get(name).cloned()
    }

    pub fn tag_by_id(&self, tag_id: &str) -> Option<String> {
        self.index.read().tags().name_of(tag_id).map(str::to_owned)
    }

    /// The tag published under `tag_id` with its posts.
    pub fn tag_posts(&self, tag_id: &str) -> Option<TagPosts> {
        query::tag_posts(&self.index.read(), tag_id)
    }

    fn parse_record(&self, id: &PostId) -> Result<PostRecord, IndexError> {
        self.parser
            .parse_meta(&self.post_dir(id))
            .map(|meta| PostRecord::new(id.clone(), meta))
            .map_err(|source| IndexError::Parse {
                id: id.clone(),
                source,
            })
    }

    /// Best-effort write of the tag file. Failures are logged, never returned.
    fn persist_tags(&self, index: &PostIndex) {
        let path = self.root.join(&self.tag_file);
        if let Err(err) = index.tags().save(&path) {
            log!("tags"; "failed to save {}: {}", path.display(), error_chain(&err));
        }
    }
}

/// `outer: inner: root` rendering of an error and its sources.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}
