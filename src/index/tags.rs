//! Persisted tag name -> tag id mapping.
//!
//! Tag ids appear in URLs, so once published they must survive restarts.
//! The mapping is written to a flat TOML table in the content root:
//!
//! ```toml
//! go = "Zq3c_1aB"
//! "machine learning" = "k9-xQ0Tw"
//! ```

use std::{collections::BTreeMap, fs, path::Path};

use super::PersistenceError;
use crate::post::TagId;

/// Bijective mapping from tag names to short unique ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDirectory {
    ids: BTreeMap<String, TagId>,
}

impl TagDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of `name`, if registered.
    pub fn get(&self, name: &str) -> Option<&TagId> {
        self.ids.get(name)
    }

    /// Reverse lookup, as used when resolving `/tags/{id}`.
    pub fn name_of(&self, id: &str) -> Option<&str> {
        self.ids
            .iter()
            .find(|(_, tag_id)| tag_id.as_str() == id)
            .map(|(name, _)| name.as_str())
    }

    /// Existing id of `name`, or a freshly generated one.
    ///
    /// Does not persist.
    pub fn get_or_create(&mut self, name: &str) -> TagId {
        self.get_or_create_with(name, TagId::random)
    }

    /// [`Self::get_or_create`] with an explicit id source.
    ///
    /// Generated ids that collide with any registered id are discarded and
    /// `generate` is called again.
    pub fn get_or_create_with(&mut self, name: &str, mut generate: impl FnMut() -> TagId) -> TagId {
        if let Some(id) = self.ids.get(name) {
            return id.clone();
        }

        let id = loop {
            let candidate = generate();
            if !self.ids.values().any(|id| *id == candidate) {
                break candidate;
            }
        };
        self.ids.insert(name.to_owned(), id.clone());
        id
    }

    /// Drop the mapping for `name`. No-op when absent.
    pub fn remove(&mut self, name: &str) -> Option<TagId> {
        self.ids.remove(name)
    }

    /// Keep only the names for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.ids.retain(|name, _| keep(name));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ids.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Entries in tag name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TagId)> {
        self.ids.iter().map(|(name, id)| (name.as_str(), id))
    }

    /// Overwrite `path` with the full mapping.
    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        let content = toml::to_string(&self.ids)?;
        fs::write(path, content).map_err(|err| PersistenceError::Io(path.to_path_buf(), err))
    }

    /// Read a previously saved mapping. `Ok(None)` when the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>, PersistenceError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(PersistenceError::Io(path.to_path_buf(), err)),
        };

        let ids = toml::from_str(&content)
            .map_err(|err| PersistenceError::Corrupt(path.to_path_buf(), err))?;
        Ok(Some(Self { ids }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_get_or_create_is_stable() {
        let mut tags = TagDirectory::new();
        let a = tags.get_or_create("go");
        let b = tags.get_or_create("go");
        assert_eq!(a, b);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags.get("go"), Some(&a));
    }

    #[test]
    fn test_get_or_create_retries_on_collision() {
        let mut tags = TagDirectory::new();
        tags.get_or_create_with("go", || TagId::from("AAAAAAAA"));

        let mut candidates = vec![TagId::from("BBBBBBBB"), TagId::from("AAAAAAAA")];
        let mut calls = 0;
        let id = tags.get_or_create_with("rust", || {
            calls += 1;
            candidates.pop().unwrap()
        });

        assert_eq!(calls, 2);
        assert_eq!(id.as_str(), "BBBBBBBB");
    }

    #[test]
    fn test_ids_unique_across_many_tags() {
        let mut tags = TagDirectory::new();
        for i in 0..500 {
            tags.get_or_create(&format!("tag{i}"));
        }
        let mut ids: Vec<_> = tags.iter().map(|(_, id)| id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 500);
    }

    #[test]
    fn test_remove_and_name_of() {
        let mut tags = TagDirectory::new();
        let id = tags.get_or_create("rust");
        assert_eq!(tags.name_of(id.as_str()), Some("rust"));

        assert_eq!(tags.remove("rust"), Some(id.clone()));
        assert_eq!(tags.remove("rust"), None);
        assert_eq!(tags.name_of(id.as_str()), None);
        assert!(tags.is_empty());
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tags.toml");

        let mut tags = TagDirectory::new();
        tags.get_or_create("go");
        tags.get_or_create("machine learning");
        tags.get_or_create("C++");
        tags.save(&path).unwrap();

        assert_eq!(TagDirectory::load(&path).unwrap(), Some(tags));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        assert_eq!(TagDirectory::load(&dir.path().join("tags.toml")).unwrap(), None);
    }

    #[test]
    fn test_load_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tags.toml");
        fs::write(&path, "go = [unterminated").unwrap();

        assert!(matches!(TagDirectory::load(&path), Err(PersistenceError::Corrupt(..))));
    }

    #[test]
    fn test_load_directory_in_place_is_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tags.toml");
        fs::create_dir(&path).unwrap();

        assert!(matches!(TagDirectory::load(&path), Err(PersistenceError::Io(..))));
    }
}
