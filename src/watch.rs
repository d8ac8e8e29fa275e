//! File system watcher keeping the index in sync with the posts directory.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      Event Loop                              │
//! │                                                              │
//! │  ┌──────────┐    ┌─────────────┐    ┌─────────────────────┐  │
//! │  │ notify   │───▶│ translate() │───▶│  Synchronizer       │  │
//! │  │ events   │    │ Create/     │    │  ::apply()          │  │
//! │  └──────────┘    │ Write/Remove│    │  one change at a    │  │
//! │                  └─────────────┘    │  time, write lock   │  │
//! │                                     └─────────────────────┘  │
//! │  recv_timeout ──▶ periodic reconcile (optional)              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Events are applied strictly in delivery order. Parse failures are logged
//! and leave the post absent until its next successful write.

use anyhow::{Context, Result};
use notify::{
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
    event::{ModifyKind, RenameMode},
};
use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        mpsc::{self, Receiver, RecvTimeoutError},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use crate::{
    config::WatchConfig,
    index::{PostStore, error_chain},
    log,
    post::PostId,
    utils::category::{EntryCategory, categorize_path},
};

/// How long the loop sleeps when there is nothing scheduled.
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Kind of change the synchronizer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Write,
    Remove,
}

/// One path-level change, normalized from a watcher event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsChange {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

impl FsChange {
    pub fn new(path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// What applying a change did to the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Not a post path, or nothing to do.
    Ignored,
    /// The post was (re)parsed and is indexed.
    Indexed(PostId),
    /// The post was dropped from the index.
    Retracted(PostId),
    /// The post failed to parse and is absent from the index.
    Failed(PostId),
}

/// Map a watcher event to path-level changes.
///
/// Access and metadata-only events produce nothing.
pub fn translate(event: Event) -> Vec<FsChange> {
    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Create,
        EventKind::Remove(_) => ChangeKind::Remove,
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => ChangeKind::Remove,
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => ChangeKind::Create,
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut paths = event.paths.into_iter();
            return paths
                .next()
                .map(|from| FsChange::new(from, ChangeKind::Remove))
                .into_iter()
                .chain(paths.next().map(|to| FsChange::new(to, ChangeKind::Create)))
                .collect();
        }
        // Backends that cannot tell the two halves of a rename apart.
        EventKind::Modify(ModifyKind::Name(_)) => {
            return event
                .paths
                .into_iter()
                .map(|path| {
                    let kind = if path.exists() {
                        ChangeKind::Create
                    } else {
                        ChangeKind::Remove
                    };
                    FsChange::new(path, kind)
                })
                .collect();
        }
        EventKind::Modify(ModifyKind::Metadata(_)) => return Vec::new(),
        EventKind::Modify(_) => ChangeKind::Write,
        EventKind::Access(_) | EventKind::Any | EventKind::Other => return Vec::new(),
    };

    event
        .paths
        .into_iter()
        .map(|path| FsChange::new(path, kind))
        .collect()
}

/// Applies filesystem changes to a [`PostStore`].
#[derive(Debug)]
pub struct Synchronizer {
    store: Arc<PostStore>,
    /// Canonical content root, as the watcher reports paths.
    root: PathBuf,
}

impl Synchronizer {
    pub fn new(store: Arc<PostStore>) -> Self {
        let root = store
            .root()
            .canonicalize()
            .unwrap_or_else(|_| store.root().to_path_buf());
        Self { store, root }
    }

    pub fn store(&self) -> &Arc<PostStore> {
        &self.store
    }

    /// Apply a single change. Never fails: problems are logged.
    pub fn apply(&self, change: &FsChange) -> SyncOutcome {
        let id = match categorize_path(&change.path, &self.root, self.store.tag_file()) {
            EntryCategory::Post(id) => id,
            EntryCategory::TagFile | EntryCategory::Ignored => return SyncOutcome::Ignored,
        };

        match change.kind {
            ChangeKind::Create | ChangeKind::Write => self.refresh(id),
            // An attachment went away but the post itself is still there.
            ChangeKind::Remove if self.store.post_dir(&id).is_dir() => self.refresh(id),
            ChangeKind::Remove => {
                if self.store.retract(&id) {
                    log!("watch"; "removed {id}");
                    SyncOutcome::Retracted(id)
                } else {
                    SyncOutcome::Ignored
                }
            }
        }
    }

    fn refresh(&self, id: PostId) -> SyncOutcome {
        match self.store.refresh(&id) {
            Ok(_) => {
                log!("watch"; "indexed {id}");
                SyncOutcome::Indexed(id)
            }
            Err(err) => {
                log!("watch"; "{}", error_chain(&err));
                SyncOutcome::Failed(id)
            }
        }
    }

    /// Full rescan; see [`PostStore::reconcile`].
    pub fn reconcile(&self) {
        match self.store.reconcile() {
            Ok(report) => log!(
                "watch";
                "reconciled: {} indexed, {} removed, {} failed",
                report.indexed, report.removed, report.failed
            ),
            Err(err) => log!("error"; "reconcile failed: {}", error_chain(&err)),
        }
    }

    /// Drain `rx` until every sender is gone.
    ///
    /// With `reconcile_every` set, a full rescan runs whenever that much time
    /// has passed since the previous one.
    pub fn run(&self, rx: Receiver<notify::Result<Event>>, reconcile_every: Option<Duration>) {
        let mut last_reconcile = Instant::now();

        loop {
            let timeout = reconcile_every.map_or(IDLE_TIMEOUT, |every| {
                every.saturating_sub(last_reconcile.elapsed())
            });

            match rx.recv_timeout(timeout) {
                Ok(Ok(event)) => {
                    for change in translate(event) {
                        self.apply(&change);
                    }
                }
                Ok(Err(e)) => log!("watch"; "error: {e}"),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            if let Some(every) = reconcile_every
                && last_reconcile.elapsed() >= every
            {
                self.reconcile();
                last_reconcile = Instant::now();
            }
        }
    }
}

/// A watcher running on a background thread.
///
/// Dropping the handle stops the watcher; the thread exits once the event
/// channel closes.
pub struct WatchHandle {
    watcher: RecommendedWatcher,
    thread: JoinHandle<()>,
}

impl WatchHandle {
    /// Stop watching and wait for the event loop to finish.
    pub fn stop(self) {
        drop(self.watcher);
        if self.thread.join().is_err() {
            log!("error"; "watch thread panicked");
        }
    }
}

fn start_watcher(root: &Path) -> Result<(RecommendedWatcher, Receiver<notify::Result<Event>>)> {
    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    watcher
        .watch(root, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch posts: {}", root.display()))?;
    log!("watch"; "watching {}", root.display());
    Ok((watcher, rx))
}

fn reconcile_interval(config: &WatchConfig) -> Option<Duration> {
    (config.reconcile_secs > 0).then(|| Duration::from_secs(config.reconcile_secs))
}

/// Start watching on a background thread.
pub fn spawn(store: Arc<PostStore>, config: &WatchConfig) -> Result<WatchHandle> {
    let (watcher, rx) = start_watcher(store.root())?;
    let every = reconcile_interval(config);
    let sync = Synchronizer::new(store);

    let thread = thread::Builder::new()
        .name("postwatch-sync".into())
        .spawn(move || sync.run(rx, every))
        .context("Failed to spawn watch thread")?;
    Ok(WatchHandle { watcher, thread })
}

/// Watch the posts directory on the current thread until the watcher fails.
pub fn watch_for_changes_blocking(store: Arc<PostStore>, config: &WatchConfig) -> Result<()> {
    if !config.enable {
        return Ok(());
    }

    let (_watcher, rx) = start_watcher(store.root())?;
    Synchronizer::new(store).run(rx, reconcile_interval(config));
    Ok(())
}
