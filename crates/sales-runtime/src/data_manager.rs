//! Content-keyed load cache for uploaded period files.
//!
//! Decoding and normalising an export is the expensive part of a report, so
//! the normalised records of each upload are memoised. Entries are keyed by a
//! SHA-256 digest of the file content, the source format and the period label.
//! The format picks the decoder and the label fills rows without a period
//! column, so both are part of the result. Aggregates and comparisons are
//! never cached; they are recomputed on every report.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sales_core::error::LoadError;
use sales_core::models::NormalizedRecord;
use sales_data::reader::{read_source, Loader, SourceFormat};
use sha2::{Digest, Sha256};

// ── CacheKey ──────────────────────────────────────────────────────────────────

/// Stable identity of one loaded upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Hex SHA-256 of the raw file bytes.
    pub content_hash: String,
    pub format: SourceFormat,
    pub period_label: String,
}

impl CacheKey {
    pub fn new(bytes: &[u8], format: SourceFormat, period_label: &str) -> Self {
        Self {
            content_hash: content_hash(bytes),
            format,
            period_label: period_label.to_string(),
        }
    }
}

/// Hex-encoded SHA-256 digest of `bytes`.
pub fn content_hash(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Hit/miss counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

// ── DataManager ───────────────────────────────────────────────────────────────

/// Memoising wrapper around a [`Loader`].
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use sales_runtime::data_manager::DataManager;
///
/// let mut mgr = DataManager::default();
/// let records = mgr.get_records(Path::new("current.csv"), "current").unwrap();
/// println!("{} records", records.len());
/// ```
#[derive(Default)]
pub struct DataManager {
    loader: Loader,
    cache: HashMap<CacheKey, Arc<Vec<NormalizedRecord>>>,
    /// Which entry each source path last resolved to.
    sources: HashMap<PathBuf, CacheKey>,
    hits: u64,
    misses: u64,
}

impl DataManager {
    pub fn new(loader: Loader) -> Self {
        Self {
            loader,
            ..Self::default()
        }
    }

    /// The wrapped loader, e.g. to register a custom decoder.
    pub fn loader_mut(&mut self) -> &mut Loader {
        &mut self.loader
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the normalised records of `path`, loading them on a cache miss.
    ///
    /// The file is always read so that a re-upload under the same path is
    /// detected; when its content changed, the entry for the old content is
    /// evicted.
    pub fn get_records(
        &mut self,
        path: &Path,
        period_label: &str,
    ) -> Result<Arc<Vec<NormalizedRecord>>, LoadError> {
        let format = SourceFormat::from_path(path)?;
        let bytes = read_source(path)?;
        let key = CacheKey::new(&bytes, format, period_label);

        if let Some(previous) = self.sources.insert(path.to_path_buf(), key.clone()) {
            if previous != key {
                self.evict_if_unreferenced(&previous);
            }
        }

        if let Some(records) = self.cache.get(&key) {
            self.hits += 1;
            tracing::debug!(path = %path.display(), period = period_label, "load cache hit");
            return Ok(Arc::clone(records));
        }

        self.misses += 1;
        let records = match self.loader.load_bytes(&bytes, format, period_label) {
            Ok(records) => Arc::new(records),
            Err(e) => {
                self.sources.remove(path);
                return Err(e);
            }
        };
        tracing::debug!(
            path = %path.display(),
            period = period_label,
            records = records.len(),
            "load cache populated"
        );
        self.cache.insert(key, Arc::clone(&records));
        Ok(records)
    }

    /// Forget everything cached for `path`. Returns `true` when an entry was
    /// removed.
    pub fn invalidate(&mut self, path: &Path) -> bool {
        match self.sources.remove(path) {
            Some(key) => {
                let removed = self.evict_if_unreferenced(&key);
                tracing::debug!(path = %path.display(), "load cache invalidated");
                removed
            }
            None => false,
        }
    }

    /// Drop every cached entry.
    pub fn clear(&mut self) {
        self.cache.clear();
        self.sources.clear();
        tracing::debug!("load cache cleared");
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.cache.len(),
        }
    }

    // ── Private helpers ───────────────────────────────────────────────────

    /// Remove `key` unless another source path still resolves to it.
    fn evict_if_unreferenced(&mut self, key: &CacheKey) -> bool {
        if self.sources.values().any(|k| k == key) {
            return false;
        }
        self.cache.remove(key).is_some()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
