use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use dashmap::DashMap;

use crate::error::Result;
use crate::outline::{scan, HeadingRecord, Outline, OutlineOptions};
use crate::stats::{reading_minutes, word_count, DocumentStats};

/// A scanned document: full-depth outline plus its word count.
#[derive(Debug)]
pub struct CachedDocument {
    pub outline: Outline,
    pub words: usize,
}

impl CachedDocument {
    pub fn from_markdown(markdown: &str) -> Self {
        Self {
            outline: scan(markdown, &OutlineOptions::default()),
            words: word_count(markdown),
        }
    }

    /// Headings at or above `opts.max_depth`.
    pub fn headings(&self, opts: &OutlineOptions) -> Vec<HeadingRecord> {
        let ceiling = opts.max_depth.clamp(1, crate::outline::MAX_DEPTH);
        self.outline
            .headings
            .iter()
            .filter(|h| h.depth <= ceiling)
            .cloned()
            .collect()
    }

    pub fn stats(&self, opts: &OutlineOptions, words_per_minute: u32) -> DocumentStats {
        DocumentStats {
            words: self.words,
            reading_minutes: reading_minutes(self.words, words_per_minute),
            headings: self.headings(opts).len(),
            code_blocks: self.outline.code_blocks,
        }
    }
}

/// Entries kept before the least recently used one is dropped.
pub const DEFAULT_CAPACITY: usize = 512;

struct Slot {
    mtime: SystemTime,
    doc: Arc<CachedDocument>,
    last_used: u64,
}

/// Scanned documents keyed by path, invalidated by mtime.
/// Shared across requests in the long-running server; bounded by `capacity`.
pub struct OutlineCache {
    entries: DashMap<PathBuf, Slot>,
    capacity: usize,
    clock: AtomicU64,
}

impl Default for OutlineCache {
    fn default() -> Self {
        Self::new()
    }
}

impl OutlineCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Cache holding at most `capacity` documents (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            capacity: capacity.max(1),
            clock: AtomicU64::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::Relaxed)
    }

    /// Cached value when `mtime` still matches, otherwise compute and store.
    pub fn get_or_compute(
        &self,
        path: &Path,
        mtime: SystemTime,
        compute: impl FnOnce() -> Result<CachedDocument>,
    ) -> Result<Arc<CachedDocument>> {
        if let Some(mut slot) = self.entries.get_mut(path) {
            if slot.mtime == mtime {
                slot.last_used = self.tick();
                return Ok(Arc::clone(&slot.doc));
            }
        }

        let doc = Arc::new(compute()?);
        if !self.entries.contains_key(path) {
            while self.entries.len() >= self.capacity {
                if !self.evict_oldest() {
                    break;
                }
            }
        }
        self.entries.insert(
            path.to_path_buf(),
            Slot {
                mtime,
                doc: Arc::clone(&doc),
                last_used: self.tick(),
            },
        );
        Ok(doc)
    }

    /// Drop the least recently used entry. False when empty.
    fn evict_oldest(&self) -> bool {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|e| e.value().last_used)
            .map(|e| e.key().clone());
        match oldest {
            Some(path) => {
                log::debug!("evicting {}", path.display());
                self.entries.remove(&path);
                true
            }
            None => false,
        }
    }

    /// Read and scan `path`, reusing the previous scan if unchanged on disk.
    pub fn load(&self, path: &Path) -> Result<Arc<CachedDocument>> {
        let mtime = fs::metadata(path)
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        self.get_or_compute(path, mtime, || {
            let markdown = super::read_document(path)?;
            log::debug!("scanning {}", path.display());
            Ok(CachedDocument::from_markdown(&markdown))
        })
    }
}

impl std::fmt::Debug for OutlineCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutlineCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}
