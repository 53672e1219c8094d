//! Key-value persistence for favorites and section order.
//!
//! The layout mirrors what the portal page kept in browser local storage: one
//! key for the favorites list and one key per section, each holding a JSON
//! array of `{ "href", "label" }` records.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{Board, LinkItem};

pub const FAVORITES_KEY: &str = "portal_favorites";
const LAYOUT_KEY_PREFIX: &str = "portal_layout_";

pub fn layout_key(section_id: &str) -> String {
    format!("{LAYOUT_KEY_PREFIX}{section_id}")
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read store {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write store {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid store file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to encode {key}: {source}")]
    Encode {
        key: String,
        source: serde_json::Error,
    },
}

/// String key-value storage with local-storage semantics.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
    /// Write every entry or none of them.
    fn set_many(&mut self, entries: Vec<(String, String)>) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn set_many(&mut self, entries: Vec<(String, String)>) -> Result<(), StoreError> {
        self.entries.extend(entries);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A store backed by a single JSON object file.
///
/// Every write rewrites the whole file through a sibling temp file. The
/// in-memory entries only change once that write has landed.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file starts out empty.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn commit(&mut self, entries: BTreeMap<String, String>) -> Result<(), StoreError> {
        self.write_file(&entries)?;
        self.entries = entries;
        Ok(())
    }

    fn write_file(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let write_err = |source: std::io::Error| StoreError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let text = serde_json::to_string_pretty(entries).map_err(|source| {
            StoreError::Encode {
                key: self.path.display().to_string(),
                source,
            }
        })?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, text).map_err(write_err)?;
        if let Err(source) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(write_err(source));
        }
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.set_many(vec![(key.to_string(), value)])
    }

    fn set_many(&mut self, entries: Vec<(String, String)>) -> Result<(), StoreError> {
        let mut next = self.entries.clone();
        next.extend(entries);
        self.commit(next)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }
        let mut next = self.entries.clone();
        next.remove(key);
        self.commit(next)
    }
}

/// Persisted form of a link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedLink {
    pub href: String,
    pub label: String,
}

impl From<&LinkItem> for SavedLink {
    fn from(link: &LinkItem) -> Self {
        Self {
            href: link.href.clone(),
            label: link.label.clone(),
        }
    }
}

fn encode(key: &str, links: &[LinkItem]) -> Result<String, StoreError> {
    let saved: Vec<SavedLink> = links.iter().map(SavedLink::from).collect();
    serde_json::to_string(&saved).map_err(|source| StoreError::Encode {
        key: key.to_string(),
        source,
    })
}

fn decode(store: &dyn KeyValueStore, key: &str) -> Result<Option<Vec<SavedLink>>, StoreError> {
    let Some(text) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&text) {
        Ok(saved) => Ok(Some(saved)),
        Err(err) => {
            tracing::warn!("ignoring unreadable {key}: {err}");
            Ok(None)
        }
    }
}

/// Write favorites and the order of every section that has an id, as one batch.
pub fn save_board(store: &mut dyn KeyValueStore, board: &Board) -> Result<(), StoreError> {
    let mut entries = vec![(
        FAVORITES_KEY.to_string(),
        encode(FAVORITES_KEY, board.favorites())?,
    )];
    for section in board.sections() {
        if section.id.is_empty() {
            continue;
        }
        let key = layout_key(&section.id);
        let value = encode(&key, &section.links)?;
        entries.push((key, value));
    }
    store.set_many(entries)?;

    tracing::debug!(
        favorites = board.favorites().len(),
        sections = board.sections().len(),
        "saved board"
    );
    Ok(())
}

/// Rebuild a board from `catalog` plus whatever `store` remembers.
///
/// Saved favorites survive only while their href is still in the catalog.
/// Saved section entries keep their label and borrow icon and target from the
/// catalog link with the same href.
pub fn restore_board(store: &dyn KeyValueStore, catalog: &Board) -> Result<Board, StoreError> {
    let mut board = catalog.clone();

    if let Some(saved) = decode(store, FAVORITES_KEY)? {
        board.clear_favorites();
        for entry in saved {
            match catalog.find_link(&entry.href) {
                Some(link) => {
                    board.add_favorite(link.clone());
                }
                None => {
                    tracing::debug!(href = %entry.href, "dropping favorite missing from catalog");
                }
            }
        }
    }

    for section in catalog.sections() {
        if section.id.is_empty() {
            continue;
        }
        let Some(saved) = decode(store, &layout_key(&section.id))? else {
            continue;
        };
        let links = saved
            .into_iter()
            .map(|entry| {
                let mut link = LinkItem::new(entry.href, entry.label);
                if let Some(known) = catalog.find_link(&link.href) {
                    link.icon = known.icon.clone();
                    link.new_tab = known.new_tab;
                }
                link
            })
            .collect();
        if let Some(target) = board.section_mut(&section.id) {
            target.links = links;
        }
    }

    Ok(board)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips_values() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v".to_string()).unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn layout_keys_are_prefixed() {
        assert_eq!(layout_key("expenses"), "portal_layout_expenses");
    }

    #[test]
    fn json_file_store_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        store.set(FAVORITES_KEY, "[]".to_string()).unwrap();
        store.set("other", "1".to_string()).unwrap();
        store.remove("other").unwrap();

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get(FAVORITES_KEY).unwrap().as_deref(), Some("[]"));
        assert_eq!(reopened.get("other").unwrap(), None);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn failed_write_keeps_previous_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        store.set("k", "old".to_string()).unwrap();

        // A directory in the temp file's place makes the next write fail.
        fs::create_dir(path.with_extension("json.tmp")).unwrap();
        let err = store
            .set_many(vec![
                ("k".to_string(), "new".to_string()),
                ("other".to_string(), "1".to_string()),
            ])
            .unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));

        assert_eq!(store.get("k").unwrap().as_deref(), Some("old"));
        assert_eq!(store.get("other").unwrap(), None);
        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("old"));
    }

    #[test]
    fn failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let mut store = JsonFileStore::open(&path).unwrap();

        // A non-empty directory at the target path cannot be replaced by a file.
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "").unwrap();

        let err = store.set("k", "v".to_string()).unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn json_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json").unwrap();

        let err = JsonFileStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));
    }
}
