//! file: core/src/cache.rs
//! description: deduplicating, persisted asset cache.
//!
//! Lookups are keyed by `(category, key)`. The first `get` of a key starts
//! one fetch through the configured `Fetcher`; every later `get` of the same
//! key, concurrent or not, awaits that same shared future. `save` writes each
//! fetched entry under the cache directory and records it in `index.json`,
//! so the next build reads it from disk instead of fetching.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const INDEX_FILE: &str = "index.json";

/// Failure of one lookup. Cloneable so a shared fetch can hand it to every
/// waiter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheError {
    #[error("fetching {category}/{key} failed: {reason}")]
    Fetch {
        category: String,
        key: String,
        reason: String,
    },

    #[error("{category}/{key} is not valid UTF-8")]
    InvalidUtf8 { category: String, key: String },

    #[error("cache i/o failed: {0}")]
    Io(String),

    #[error("cache index is corrupt: {0}")]
    Index(String),
}

impl From<std::io::Error> for CacheError {
    fn from(error: std::io::Error) -> Self {
        CacheError::Io(error.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(error: serde_json::Error) -> Self {
        CacheError::Index(error.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetContent {
    Text(String),
    Bytes(Vec<u8>),
}

impl AssetContent {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AssetContent::Text(text) => Some(text),
            AssetContent::Bytes(_) => None,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            AssetContent::Text(text) => text.into_bytes(),
            AssetContent::Bytes(bytes) => bytes,
        }
    }
}

/// Source of assets that are not cached yet.
#[async_trait]
pub trait Fetcher: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, category: &str, key: &str) -> Result<Vec<u8>, CacheError>;
}

/// Fetcher serving a fixed set of assets, for offline builds.
#[derive(Debug, Clone, Default)]
pub struct MapFetcher {
    assets: HashMap<(String, String), Vec<u8>>,
}

impl MapFetcher {
    pub fn new() -> Self {
        MapFetcher::default()
    }

    pub fn with(mut self, category: &str, key: &str, content: impl Into<Vec<u8>>) -> Self {
        self.assets.insert((category.to_string(), key.to_string()), content.into());
        self
    }
}

#[async_trait]
impl Fetcher for MapFetcher {
    fn name(&self) -> &str {
        "map"
    }

    async fn fetch(&self, category: &str, key: &str) -> Result<Vec<u8>, CacheError> {
        self.assets
            .get(&(category.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| CacheError::Fetch {
                category: category.to_string(),
                key: key.to_string(),
                reason: "no such asset".to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct IndexEntry {
    category: String,
    key: String,
    file: String,
    size: usize,
    fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct CacheIndex {
    entries: BTreeMap<String, IndexEntry>,
}

type SharedFetch = Shared<BoxFuture<'static, Result<Arc<Vec<u8>>, CacheError>>>;

pub struct AssetCache {
    dir: Option<PathBuf>,
    fetcher: Arc<dyn Fetcher>,
    entries: Mutex<HashMap<(String, String), SharedFetch>>,
    index: Mutex<CacheIndex>,
    fetches: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn entry_id(category: &str, key: &str) -> String {
    format!("{}/{}", category, key)
}

/// Percent-escapes everything but ASCII alphanumerics, `-`, `_` and `.`.
/// Names made only of dots, and the empty name, are escaped too, so every
/// name maps to its own plain file name.
fn safe_name(name: &str) -> String {
    let only_dots = name.chars().all(|c| c == '.');
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        match byte {
            b'.' if !only_dots => out.push('.'),
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    if out.is_empty() {
        out.push('%');
    }
    out
}

/// Index key and relative file of `(category, key)`.
fn entry_file(category: &str, key: &str) -> String {
    format!("{}/{}", safe_name(category), safe_name(key))
}

impl AssetCache {
    /// Cache persisted under `dir`. An existing `index.json` is loaded.
    pub fn open(dir: impl AsRef<Path>, fetcher: Arc<dyn Fetcher>) -> Result<Self, CacheError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let index_path = dir.join(INDEX_FILE);
        let index = if index_path.exists() {
            serde_json::from_str(&fs::read_to_string(&index_path)?)?
        } else {
            CacheIndex::default()
        };
        log::debug!("opened asset cache at {} ({} entries)", dir.display(), index.entries.len());

        Ok(AssetCache {
            dir: Some(dir),
            fetcher,
            entries: Mutex::new(HashMap::new()),
            index: Mutex::new(index),
            fetches: AtomicUsize::new(0),
        })
    }

    /// Cache that only deduplicates within this process.
    pub fn in_memory(fetcher: Arc<dyn Fetcher>) -> Self {
        AssetCache {
            dir: None,
            fetcher,
            entries: Mutex::new(HashMap::new()),
            index: Mutex::new(CacheIndex::default()),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Number of fetches started through the fetcher.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub async fn get(&self, category: &str, key: &str, want_text: bool) -> Result<AssetContent, CacheError> {
        let bytes = self.lookup(category, key).await?;
        if !want_text {
            return Ok(AssetContent::Bytes(bytes.to_vec()));
        }
        String::from_utf8(bytes.to_vec())
            .map(AssetContent::Text)
            .map_err(|_| CacheError::InvalidUtf8 {
                category: category.to_string(),
                key: key.to_string(),
            })
    }

    fn lookup(&self, category: &str, key: &str) -> SharedFetch {
        let id = (category.to_string(), key.to_string());
        let mut entries = lock(&self.entries);
        if let Some(pending) = entries.get(&id) {
            return pending.clone();
        }

        let future: BoxFuture<'static, Result<Arc<Vec<u8>>, CacheError>> = match self.read_persisted(category, key) {
            Some(bytes) => {
                log::trace!("cache hit on disk for {}", entry_id(category, key));
                futures::future::ready(Ok(Arc::new(bytes))).boxed()
            }
            None => {
                self.fetches.fetch_add(1, Ordering::SeqCst);
                log::debug!("fetching {} through `{}`", entry_id(category, key), self.fetcher.name());
                let fetcher = Arc::clone(&self.fetcher);
                let (category, key) = (category.to_string(), key.to_string());
                async move { fetcher.fetch(&category, &key).await.map(Arc::new) }.boxed()
            }
        };

        let shared = future.shared();
        entries.insert(id, shared.clone());
        shared
    }

    fn read_persisted(&self, category: &str, key: &str) -> Option<Vec<u8>> {
        let dir = self.dir.as_ref()?;
        let file = lock(&self.index).entries.get(&entry_file(category, key))?.file.clone();
        fs::read(dir.join(file)).ok()
    }

    /// Persist every completed, successful lookup not on disk yet and rewrite
    /// the index. Returns the number of entries written; calling it again
    /// without new lookups writes nothing.
    pub fn save(&self) -> Result<usize, CacheError> {
        let Some(dir) = &self.dir else {
            return Ok(0);
        };

        let entries = lock(&self.entries);
        let mut index = lock(&self.index);
        let mut written = 0;

        for ((category, key), pending) in entries.iter() {
            let file = entry_file(category, key);
            if index.entries.contains_key(&file) {
                continue;
            }
            let Some(Ok(bytes)) = pending.peek() else { continue };

            let path = dir.join(&file);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, bytes.as_slice())?;

            index.entries.insert(
                file.clone(),
                IndexEntry {
                    category: category.clone(),
                    key: key.clone(),
                    file,
                    size: bytes.len(),
                    fetched_at: Utc::now(),
                },
            );
            written += 1;
        }

        if written > 0 || !dir.join(INDEX_FILE).exists() {
            fs::write(dir.join(INDEX_FILE), serde_json::to_string_pretty(&*index)?)?;
        }
        log::debug!("asset cache saved, {} new entr(ies)", written);
        Ok(written)
    }

    /// When `(category, key)` was first stored on disk.
    pub fn fetched_at(&self, category: &str, key: &str) -> Option<DateTime<Utc>> {
        lock(&self.index).entries.get(&entry_file(category, key)).map(|e| e.fetched_at)
    }
}
