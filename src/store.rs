// Zettel storage
// The network layer the editor persists through, as a trait, with an
// in-memory store and a store keeping one JSON file per note in a directory.

use crate::zettel::{Zettel, ZettelContent, ZettelId};
use chrono::{DateTime, Datelike, Timelike, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("zettel {0} does not exist")]
    NotFound(ZettelId),
    #[error("{context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: io::Error,
    },
    #[error("zettel {id} is corrupt: {source}")]
    Corrupt {
        id: ZettelId,
        #[source]
        source: serde_json::Error,
    },
}

/// A partial update; fields left `None` keep their stored value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZettelUpdate {
    pub title: Option<String>,
    pub content: Option<ZettelContent>,
}

impl ZettelUpdate {
    pub fn apply(self, zettel: &mut Zettel) {
        if let Some(title) = self.title {
            zettel.title = title;
        }
        if let Some(content) = self.content {
            zettel.content = content;
        }
    }
}

/// One entry of a listing or search result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZettelSummary {
    pub id: ZettelId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<ZettelContent>,
}

impl ZettelSummary {
    fn new(id: ZettelId, zettel: Zettel) -> Self {
        ZettelSummary {
            id,
            title: zettel.title,
            content: Some(zettel.content),
        }
    }
}

pub trait ZettelStore {
    /// Allocate an empty zettel
    fn create(&self) -> Result<ZettelId, StoreError>;

    fn fetch(&self, id: ZettelId) -> Result<Zettel, StoreError>;

    fn update(&self, id: ZettelId, update: ZettelUpdate) -> Result<(), StoreError>;

    /// Every zettel, ordered by id
    fn list(&self) -> Result<Vec<ZettelSummary>, StoreError>;

    /// Zettels whose title or text contains `query`, ignoring case. An empty
    /// query matches everything.
    fn search(&self, query: &str) -> Result<Vec<ZettelSummary>, StoreError> {
        let query = query.trim().to_lowercase();
        let mut hits = Vec::new();
        for summary in self.list()? {
            let zettel = Zettel::new(summary.title.clone(), summary.content.clone().unwrap_or_default());
            if query.is_empty() || zettel.index_text().to_lowercase().contains(&query) {
                hits.push(summary);
            }
        }
        Ok(hits)
    }
}

/// An id built from the creation time in UTC, readable as
/// `YYYYY MM DD hh mm ss` with the year in the Holocene calendar
pub fn generate_id(now: DateTime<Utc>) -> ZettelId {
    let year = u64::try_from(now.year()).unwrap_or_default() + 10_000;
    year * 1_00_00_00_00_00
        + u64::from(now.month()) * 1_00_00_00_00
        + u64::from(now.day()) * 1_00_00_00
        + u64::from(now.hour()) * 1_00_00
        + u64::from(now.minute()) * 1_00
        + u64::from(now.second())
}

/// A fresh id not yet taken. Two zettels created within the same second get
/// consecutive ids.
fn next_free_id(taken: impl Fn(ZettelId) -> bool) -> ZettelId {
    let mut id = generate_id(Utc::now());
    while taken(id) {
        id += 1;
    }
    id
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    zettels: RefCell<BTreeMap<ZettelId, Zettel>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `zettel` under `id`, replacing what was there
    pub fn insert(&self, id: ZettelId, zettel: Zettel) {
        self.zettels.borrow_mut().insert(id, zettel);
    }
}

impl ZettelStore for MemoryStore {
    fn create(&self) -> Result<ZettelId, StoreError> {
        let id = next_free_id(|id| self.zettels.borrow().contains_key(&id));
        self.insert(id, Zettel::default());
        Ok(id)
    }

    fn fetch(&self, id: ZettelId) -> Result<Zettel, StoreError> {
        self.zettels
            .borrow()
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn update(&self, id: ZettelId, update: ZettelUpdate) -> Result<(), StoreError> {
        let mut zettels = self.zettels.borrow_mut();
        let zettel = zettels.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        update.apply(zettel);
        Ok(())
    }

    fn list(&self) -> Result<Vec<ZettelSummary>, StoreError> {
        Ok(self
            .zettels
            .borrow()
            .iter()
            .map(|(id, zettel)| ZettelSummary::new(*id, zettel.clone()))
            .collect())
    }
}

/// Keeps each zettel as `<id>.json` in one directory
pub struct DirStore {
    base_path: PathBuf,
}

impl DirStore {
    pub fn new(base_path: PathBuf) -> Self {
        DirStore { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, id: ZettelId) -> PathBuf {
        self.base_path.join(format!("{}.json", id))
    }

    fn write(&self, id: ZettelId, zettel: &Zettel) -> Result<(), StoreError> {
        fs::create_dir_all(&self.base_path).map_err(|source| StoreError::Transport {
            context: format!("failed to create '{}'", self.base_path.display()),
            source,
        })?;
        let json = serde_json::to_string_pretty(zettel)
            .map_err(|source| StoreError::Corrupt { id, source })?;
        let path = self.path_for(id);
        fs::write(&path, json).map_err(|source| StoreError::Transport {
            context: format!("failed to save '{}'", path.display()),
            source,
        })?;
        debug!("wrote zettel {} to {}", id, path.display());
        Ok(())
    }

    /// Ids of all `<number>.json` files, sorted. Other files are ignored.
    fn ids(&self) -> Result<Vec<ZettelId>, StoreError> {
        let entries = match fs::read_dir(&self.base_path) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Transport {
                    context: format!("failed to read directory '{}'", self.base_path.display()),
                    source,
                });
            }
        };

        let mut ids: Vec<ZettelId> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
            .filter_map(|path| path.file_stem()?.to_str()?.parse().ok())
            .collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

impl ZettelStore for DirStore {
    fn create(&self) -> Result<ZettelId, StoreError> {
        let id = next_free_id(|id| self.path_for(id).exists());
        self.write(id, &Zettel::default())?;
        Ok(id)
    }

    fn fetch(&self, id: ZettelId) -> Result<Zettel, StoreError> {
        let path = self.path_for(id);
        let json = fs::read_to_string(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => StoreError::NotFound(id),
            _ => StoreError::Transport {
                context: format!("failed to read '{}'", path.display()),
                source,
            },
        })?;
        serde_json::from_str(&json).map_err(|source| StoreError::Corrupt { id, source })
    }

    fn update(&self, id: ZettelId, update: ZettelUpdate) -> Result<(), StoreError> {
        let mut zettel = self.fetch(id)?;
        update.apply(&mut zettel);
        self.write(id, &zettel)
    }

    fn list(&self) -> Result<Vec<ZettelSummary>, StoreError> {
        let mut summaries = Vec::new();
        for id in self.ids()? {
            match self.fetch(id) {
                Ok(zettel) => summaries.push(ZettelSummary::new(id, zettel)),
                Err(StoreError::Corrupt { id, source }) => {
                    warn!("skipping zettel {}: {}", id, source);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zettel::{Block, Inline};
    use chrono::TimeZone;
    use tempfile::TempDir;

    #[test]
    fn test_generate_id_reads_as_timestamp() {
        let now = Utc.with_ymd_and_hms(2021, 7, 4, 23, 32, 24).unwrap();
        assert_eq!(generate_id(now), 12021_07_04_23_32_24);
    }

    #[test]
    fn test_memory_store_create_update_fetch() {
        let store = MemoryStore::new();
        let first = store.create().unwrap();
        let second = store.create().unwrap();
        assert_ne!(first, second);

        store
            .update(
                first,
                ZettelUpdate {
                    title: Some("Ideas".to_string()),
                    content: None,
                },
            )
            .unwrap();
        let zettel = store.fetch(first).unwrap();
        assert_eq!(zettel.title, "Ideas");
        assert!(zettel.content.is_empty());
        assert!(matches!(store.fetch(7), Err(StoreError::NotFound(7))));
        assert!(matches!(
            store.update(7, ZettelUpdate::default()),
            Err(StoreError::NotFound(7))
        ));
    }

    #[test]
    fn test_search_ignores_case() {
        let store = MemoryStore::new();
        store.insert(1, Zettel::new("Groceries", vec![Block::paragraph(vec![Inline::plain("Milk")])]));
        store.insert(2, Zettel::new("Reading", vec![]));

        let hits: Vec<ZettelId> = store.search("milk").unwrap().iter().map(|s| s.id).collect();
        assert_eq!(hits, vec![1]);
        let hits: Vec<ZettelId> = store.search("READ").unwrap().iter().map(|s| s.id).collect();
        assert_eq!(hits, vec![2]);
        assert_eq!(store.search("  ").unwrap().len(), 2);
    }

    #[test]
    fn test_dir_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = DirStore::new(dir.path().join("notes"));
        assert!(store.list().unwrap().is_empty());

        let id = store.create().unwrap();
        let content = vec![Block::heading(1, vec![Inline::plain("Hello")])];
        store
            .update(
                id,
                ZettelUpdate {
                    title: Some("Greeting".to_string()),
                    content: Some(content.clone()),
                },
            )
            .unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Greeting");
        assert_eq!(store.fetch(id).unwrap().content, content);
        assert!(matches!(store.fetch(id + 1), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_dir_store_skips_corrupt_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("5.json"), "{not json").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        let store = DirStore::new(dir.path().to_path_buf());
        let id = store.create().unwrap();

        let ids: Vec<ZettelId> = store.list().unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![id]);
        assert!(matches!(store.fetch(5), Err(StoreError::Corrupt { id: 5, .. })));
    }
}
