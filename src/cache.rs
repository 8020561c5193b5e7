//! Station analysis cache, persisted between batch runs.
//!
//! Keyed by station code plus a fingerprint of the cleaned series, so an
//! edited file under the same code is recomputed. The cache file also
//! records a fingerprint of the analysis settings; when that differs every
//! stored entry is discarded.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use pluvio_series::DailySeries;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    code: String,
    fingerprint: u64,
}

struct Slot<T> {
    value: Arc<T>,
    /// Looked up or inserted since the cache was opened.
    used: bool,
}

#[derive(Serialize, Deserialize)]
struct CacheFile<T> {
    version: String,
    settings: u64,
    entries: Vec<CacheEntry<T>>,
}

#[derive(Serialize, Deserialize)]
struct CacheEntry<T> {
    code: String,
    fingerprint: u64,
    value: T,
}

/// Hash of every `(date, value)` pair; values hash by bit pattern.
pub fn fingerprint(series: &DailySeries) -> u64 {
    let mut hasher = DefaultHasher::new();
    series.len().hash(&mut hasher);
    for (date, value) in series.iter() {
        date.hash(&mut hasher);
        value.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

/// Fingerprint of any `Debug` value, for settings that shape a result.
pub fn settings_fingerprint<S: std::fmt::Debug>(settings: &S) -> u64 {
    let mut hasher = DefaultHasher::new();
    format!("{settings:?}").hash(&mut hasher);
    hasher.finish()
}

/// Thread-safe memo table shared by batch workers.
pub struct ResultCache<T> {
    settings: u64,
    entries: Mutex<HashMap<CacheKey, Slot<T>>>,
    hits: AtomicUsize,
}

impl<T> ResultCache<T> {
    /// Empty cache for results computed under `settings`.
    pub fn new(settings: u64) -> Self {
        Self {
            settings,
            entries: Mutex::new(HashMap::new()),
            hits: AtomicUsize::new(0),
        }
    }

    /// Return the cached value for `(code, series)` or compute and store it.
    ///
    /// `compute` runs without the lock held; two workers racing on the same
    /// key both compute and the first insert wins.
    pub fn get_or_compute<F>(&self, code: &str, series: &DailySeries, compute: F) -> Arc<T>
    where
        F: FnOnce() -> T,
    {
        let key = CacheKey {
            code: code.to_string(),
            fingerprint: fingerprint(series),
        };

        if let Some(slot) = self.lock().get_mut(&key) {
            slot.used = true;
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(&slot.value);
        }

        let value = Arc::new(compute());
        let mut entries = self.lock();
        let slot = entries.entry(key).or_insert(Slot { value, used: true });
        Arc::clone(&slot.value)
    }

    /// Number of stored entries, used or not.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Lookups answered without computing.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, Slot<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Serialize + DeserializeOwned> ResultCache<T> {
    /// Open the cache stored at `path`.
    ///
    /// A missing file, an unreadable one, or one written under other
    /// settings or another pluvio version yields an empty cache.
    pub fn load(path: &Path, settings: u64) -> Self {
        let cache = Self::new(settings);
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return cache,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring unreadable result cache");
                return cache;
            }
        };
        let file: CacheFile<T> = match serde_json::from_str(&text) {
            Ok(file) => file,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring malformed result cache");
                return cache;
            }
        };
        if file.settings != settings || file.version != env!("CARGO_PKG_VERSION") {
            debug!(path = %path.display(), "settings changed; result cache discarded");
            return cache;
        }

        let mut entries = cache.lock();
        for entry in file.entries {
            let key = CacheKey {
                code: entry.code,
                fingerprint: entry.fingerprint,
            };
            let slot = Slot {
                value: Arc::new(entry.value),
                used: false,
            };
            entries.insert(key, slot);
        }
        debug!(n_entries = entries.len(), "result cache loaded");
        drop(entries);
        cache
    }

    /// Write every entry used since the cache was opened, sorted by code.
    /// Entries no lookup asked for are dropped.
    pub fn save(&self, path: &Path) -> Result<()> {
        let entries = self.lock();
        let mut used: Vec<CacheEntry<&T>> = entries
            .iter()
            .filter(|(_, slot)| slot.used)
            .map(|(key, slot)| CacheEntry {
                code: key.code.clone(),
                fingerprint: key.fingerprint,
                value: slot.value.as_ref(),
            })
            .collect();
        used.sort_by(|a, b| a.code.cmp(&b.code).then(a.fingerprint.cmp(&b.fingerprint)));

        let file = CacheFile {
            version: env!("CARGO_PKG_VERSION").to_string(),
            settings: self.settings,
            entries: used,
        };
        let json = serde_json::to_string(&file).context("failed to serialize result cache")?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write result cache: {}", path.display()))
    }
}
