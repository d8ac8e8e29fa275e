//! In-memory index tables.
//!
//! [`PostIndex`] owns three views of the same set of posts plus the tag
//! directory, and keeps them consistent:
//!
//! - `posts` and `by_date` hold exactly the same ids
//! - `by_tag[t]` holds `id` iff `posts[id].tags` contains `t`
//! - the tag directory holds `t` iff `by_tag[t]` is non-empty
//! - `by_date` is sorted newest first, equal dates in insertion order

use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};

use super::TagDirectory;
use crate::post::{PostId, PostRecord};

#[derive(Debug, Default)]
pub struct PostIndex {
    posts: FxHashMap<PostId, PostRecord>,
    by_date: Vec<PostId>,
    by_tag: BTreeMap<String, Vec<PostId>>,
    tags: TagDirectory,
}

impl PostIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty index seeded with a loaded tag directory.
    pub fn with_tags(tags: TagDirectory) -> Self {
        Self {
            tags,
            ..Self::default()
        }
    }

    /// Insert a record, replacing any previous record with the same id.
    ///
    /// Tags carried by both the old and the new record keep their ids.
    /// Returns the replaced record.
    pub fn insert(&mut self, record: PostRecord) -> Option<PostRecord> {
        let previous = self.detach(&record.id, &record.tags);

        let created_at = record.created_at;
        let pos = self
            .by_date
            .partition_point(|id| self.posts[id].created_at >= created_at);
        self.by_date.insert(pos, record.id.clone());

        for tag in &record.tags {
            self.by_tag.entry(tag.clone()).or_default().push(record.id.clone());
            self.tags.get_or_create(tag);
        }

        self.posts.insert(record.id.clone(), record);
        previous
    }

    /// Remove a record and every derived entry pointing at it.
    ///
    /// Tags left without posts are dropped from the tag directory.
    pub fn retract(&mut self, id: &PostId) -> Option<PostRecord> {
        self.detach(id, &BTreeSet::new())
    }

    /// [`Self::retract`], but tags in `keep` stay in the directory even when
    /// they lose their last post.
    fn detach(&mut self, id: &PostId, keep: &BTreeSet<String>) -> Option<PostRecord> {
        let record = self.posts.remove(id)?;

        if let Some(pos) = self.by_date.iter().position(|other| other == id) {
            self.by_date.remove(pos);
        }

        for tag in &record.tags {
            let Some(members) = self.by_tag.get_mut(tag) else {
                continue;
            };
            members.retain(|other| other != id);
            if members.is_empty() {
                self.by_tag.remove(tag);
                if !keep.contains(tag) {
                    self.tags.remove(tag);
                }
            }
        }

        Some(record)
    }

    /// Drop tag directory entries no post refers to.
    ///
    /// Returns true when anything was removed.
    pub fn prune_tags(&mut self) -> bool {
        let before = self.tags.len();
        let by_tag = &self.by_tag;
        self.tags.retain(|name| by_tag.contains_key(name));
        self.tags.len() != before
    }

    pub fn get(&self, id: &PostId) -> Option<&PostRecord> {
        self.posts.get(id)
    }

    pub fn contains(&self, id: &PostId) -> bool {
        self.posts.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// All records, in no particular order.
    pub fn records(&self) -> impl Iterator<Item = &PostRecord> {
        self.posts.values()
    }

    /// Ids newest first.
    pub fn by_date(&self) -> &[PostId] {
        &self.by_date
    }

    /// Tag name -> ids in insertion order.
    pub fn by_tag(&self) -> &BTreeMap<String, Vec<PostId>> {
        &self.by_tag
    }

    /// Ids carrying `tag`, in insertion order.
    pub fn tag_members(&self, tag: &str) -> &[PostId] {
        self.by_tag.get(tag).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn tags(&self) -> &TagDirectory {
        &self.tags
    }

    /// Panic unless every table agrees with every other.
    #[cfg(test)]
    pub fn assert_consistent(&self) {
        let keys: BTreeSet<_> = self.posts.keys().collect();
        let dated: BTreeSet<_> = self.by_date.iter().collect();
        assert_eq!(keys, dated, "posts and by_date disagree");
        assert_eq!(self.by_date.len(), dated.len(), "duplicate ids in by_date");

        for pair in self.by_date.windows(2) {
            assert!(
                self.posts[&pair[0]].created_at >= self.posts[&pair[1]].created_at,
                "by_date out of order"
            );
        }

        for (tag, members) in &self.by_tag {
            assert!(!members.is_empty(), "empty by_tag entry {tag}");
            for id in members {
                assert!(self.posts[id].has_tag(tag), "{id} listed under {tag}");
            }
            assert!(self.tags.contains(tag), "{tag} missing from tag directory");
        }

        for record in self.posts.values() {
            for tag in &record.tags {
                let members = self.tag_members(tag);
                assert_eq!(
                    members.iter().filter(|id| **id == record.id).count(),
                    1,
                    "{} not listed once under {tag}",
                    record.id
                );
            }
        }

        for (name, _) in self.tags.iter() {
            assert!(self.by_tag.contains_key(name), "stale tag {name}");
        }
    }
}
