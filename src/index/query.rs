//! Read-only queries over a [`PostIndex`].
//!
//! Every function returns owned snapshots so callers can drop the read lock
//! before rendering.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::{cmp::Ordering, collections::BTreeSet};

use super::{PostIndex, rank::Matcher};
use crate::post::{PostId, PostRecord, TagId};

/// Filters for [`query`]. The default matches every post.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Every one of these tags must be present.
    pub tags: BTreeSet<String>,
    /// Inclusive lower bound on the creation date.
    pub after: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the creation date.
    pub before: Option<DateTime<Utc>>,
    /// Fuzzy title search; empty means no ranking.
    pub search: String,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn after(mut self, date: DateTime<Utc>) -> Self {
        self.after = Some(date);
        self
    }

    pub fn before(mut self, date: DateTime<Utc>) -> Self {
        self.before = Some(date);
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    fn in_range(&self, date: &DateTime<Utc>) -> bool {
        self.after.is_none_or(|after| *date >= after)
            && self.before.is_none_or(|before| *date <= before)
    }
}

/// A tag with its id and how many posts carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagSummary {
    pub name: String,
    pub id: TagId,
    pub count: usize,
}

/// A tag together with its posts, as shown on a tag page.
#[derive(Debug, Clone, Serialize)]
pub struct TagPosts {
    pub name: String,
    pub id: TagId,
    /// In the order the posts were tagged.
    pub posts: Vec<PostRecord>,
}

/// Newest first, then by title.
fn newest_first(a: &PostRecord, b: &PostRecord) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| a.title.cmp(&b.title))
}

/// Posts passing every filter, best match first.
///
/// Ties on rank fall back to newest first, then title.
pub fn query(index: &PostIndex, opts: &QueryOptions) -> Vec<PostRecord> {
    let matcher = Matcher::new(&opts.search);

    let mut results: Vec<(usize, &PostRecord)> = index
        .records()
        .filter(|post| opts.tags.iter().all(|tag| post.has_tag(tag)))
        .filter(|post| opts.in_range(&post.created_at))
        .filter_map(|post| matcher.rank(&post.title).map(|rank| (rank, post)))
        .collect();

    results.sort_by(|(rank_a, a), (rank_b, b)| rank_a.cmp(rank_b).then_with(|| newest_first(a, b)));
    results.into_iter().map(|(_, post)| post.clone()).collect()
}

/// Ids of posts whose title matches `term`, best match first.
///
/// Ties on rank fall back to newest first, then id.
pub fn search_and_rank(index: &PostIndex, term: &str) -> Vec<PostId> {
    let matcher = Matcher::new(term);

    let mut results: Vec<(usize, &PostRecord)> = index
        .records()
        .filter_map(|post| matcher.rank(&post.title).map(|rank| (rank, post)))
        .collect();

    results.sort_by(|(rank_a, a), (rank_b, b)| {
        rank_a
            .cmp(rank_b)
            .then_with(|| b.created_at.cmp(&a.created_at))
            .then_with(|| a.id.cmp(&b.id))
    });
    results.into_iter().map(|(_, post)| post.id.clone()).collect()
}

/// Every post, newest first.
pub fn posts_by_date(index: &PostIndex) -> Vec<PostRecord> {
    index
        .by_date()
        .iter()
        .filter_map(|id| index.get(id).cloned())
        .collect()
}

/// Tags whose name fuzzily matches `search`, most used first, then by name.
///
/// An empty `search` lists every tag.
pub fn tags_with_counts(index: &PostIndex, search: &str) -> Vec<TagSummary> {
    let matcher = Matcher::new(search);

    let mut tags: Vec<TagSummary> = index
        .tags()
        .iter()
        .filter(|(name, _)| matcher.rank(name).is_some())
        .map(|(name, id)| TagSummary {
            name: name.to_owned(),
            id: id.clone(),
            count: index.tag_members(name).len(),
        })
        .collect();

    tags.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    tags
}

/// The tag published under `tag_id` with its posts.
pub fn tag_posts(index: &PostIndex, tag_id: &str) -> Option<TagPosts> {
    let name = index.tags().name_of(tag_id)?;
    let id = index.tags().get(name)?.clone();
    let posts = index
        .tag_members(name)
        .iter()
        .filter_map(|post| index.get(post).cloned())
        .collect();

    Some(TagPosts {
        name: name.to_owned(),
        id,
        posts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn record(id: &str, title: &str, created_at: DateTime<Utc>, tags: &[&str]) -> PostRecord {
        PostRecord {
            id: PostId::parse(id).unwrap(),
            title: title.to_owned(),
            created_at,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn sample() -> PostIndex {
        let mut index = PostIndex::new();
        index.insert(record("a", "Hello", date(2024, 1, 1), &["go"]));
        index.insert(record("b", "World", date(2024, 6, 1), &["go", "rust"]));
        index.insert(record("c", "Hello Rust", date(2024, 3, 1), &["rust"]));
        index
    }

    fn ids(posts: &[PostRecord]) -> Vec<&str> {
        posts.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_query_all_newest_first() {
        let index = sample();
        assert_eq!(ids(&query(&index, &QueryOptions::new())), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_query_requires_every_tag() {
        let index = sample();
        let posts = query(&index, &QueryOptions::new().tag("rust"));
        assert_eq!(ids(&posts), vec!["b", "c"]);

        let posts = query(&index, &QueryOptions::new().tag("rust").tag("go"));
        assert_eq!(ids(&posts), vec!["b"]);

        let posts = query(&index, &QueryOptions::new().tag("missing"));
        assert!(posts.is_empty());
    }

    #[test]
    fn test_query_date_range_inclusive() {
        let index = sample();
        let opts = QueryOptions::new().after(date(2024, 1, 1)).before(date(2024, 3, 1));
        assert_eq!(ids(&query(&index, &opts)), vec!["c", "a"]);

        let opts = QueryOptions::new().after(date(2024, 3, 2));
        assert_eq!(ids(&query(&index, &opts)), vec!["b"]);

        let opts = QueryOptions::new().after(date(2025, 1, 1)).before(date(2023, 1, 1));
        assert!(query(&index, &opts).is_empty());
    }

    #[test]
    fn test_query_search_ranks_then_dates() {
        let index = sample();
        let posts = query(&index, &QueryOptions::new().search("hello"));
        // exact title first, longer title after, "World" does not match
        assert_eq!(ids(&posts), vec!["a", "c"]);
    }

    #[test]
    fn test_query_ties_break_on_title() {
        let mut index = PostIndex::new();
        index.insert(record("z", "Beta", date(2024, 1, 1), &[]));
        index.insert(record("y", "Alpha", date(2024, 1, 1), &[]));
        assert_eq!(ids(&query(&index, &QueryOptions::new())), vec!["y", "z"]);
    }

    #[test]
    fn test_search_and_rank() {
        let mut index = PostIndex::new();
        index.insert(record("a", "Hello", date(2024, 1, 1), &["go"]));
        index.insert(record("b", "World", date(2024, 6, 1), &["go", "rust"]));

        let found = search_and_rank(&index, "Hallo");
        assert_eq!(found, vec![PostId::parse("a").unwrap()]);
    }

    #[test]
    fn test_search_and_rank_equal_rank_newest_first() {
        let mut index = PostIndex::new();
        index.insert(record("old", "Rust", date(2020, 1, 1), &[]));
        index.insert(record("new", "Rust", date(2024, 1, 1), &[]));
        index.insert(record("far", "Rust and more", date(2025, 1, 1), &[]));

        let found = search_and_rank(&index, "rust");
        let found: Vec<_> = found.iter().map(PostId::as_str).collect();
        assert_eq!(found, vec!["new", "old", "far"]);
    }

    #[test]
    fn test_posts_by_date_snapshot() {
        let index = sample();
        let posts = posts_by_date(&index);
        assert_eq!(ids(&posts), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_tags_with_counts() {
        let mut index = sample();
        index.insert(record("d", "Solo", date(2024, 2, 1), &["alpha"]));

        let tags = tags_with_counts(&index, "");
        let summary: Vec<_> = tags.iter().map(|t| (t.name.as_str(), t.count)).collect();
        assert_eq!(summary, vec![("go", 2), ("rust", 2), ("alpha", 1)]);
        assert_eq!(Some(&tags[0].id), index.tags().get("go"));
    }

    #[test]
    fn test_tags_with_counts_filtered_by_name() {
        let mut index = PostIndex::new();
        index.insert(record("a", "A", date(2024, 1, 1), &["golang", "rust"]));
        index.insert(record("b", "B", date(2024, 2, 1), &["golang"]));

        let names = |search: &str| -> Vec<String> {
            tags_with_counts(&index, search)
                .into_iter()
                .map(|t| t.name)
                .collect()
        };
        assert_eq!(names("go"), vec!["golang"]);
        assert_eq!(names("RUST"), vec!["rust"]);
        assert_eq!(names("python"), Vec::<String>::new());
        assert_eq!(names(""), vec!["golang", "rust"]);
    }

    #[test]
    fn test_tag_posts_by_id() {
        let index = sample();
        let rust_id = index.tags().get("rust").unwrap().clone();

        let tag = tag_posts(&index, rust_id.as_str()).unwrap();
        assert_eq!(tag.name, "rust");
        assert_eq!(ids(&tag.posts), vec!["b", "c"]);

        assert!(tag_posts(&index, "unknown").is_none());
    }
}
