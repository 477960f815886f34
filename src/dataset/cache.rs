use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};
use std::time::SystemTime;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use super::Dataset;
use crate::Result;
use crate::config::DatasetConfig;

static GLOBAL_CACHE: LazyLock<DatasetCache> = LazyLock::new(DatasetCache::new);

/// Source of the current time for cache expiry decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock used outside of tests
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

struct CachedDataset {
    dataset: Arc<Dataset>,
    loaded_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    source_mtime: Option<SystemTime>,
}

/// Read-only dataset snapshots keyed by source identifier.
///
/// Each distinct source is parsed once; later loads return the same
/// `Arc<Dataset>` until the entry expires, the source file changes (when
/// `reload_on_change` is set) or it is invalidated explicitly.
pub struct DatasetCache<C: Clock = SystemClock> {
    clock: C,
    ttl: Option<Duration>,
    reload_on_change: bool,
    entries: RwLock<HashMap<String, CachedDataset>>,
}

impl DatasetCache<SystemClock> {
    /// Cache that keeps every snapshot for the lifetime of the process
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Cache honouring the `[dataset]` TTL and reload settings
    #[must_use]
    pub fn from_config(config: &DatasetConfig) -> Self {
        let mut cache = Self::new().reload_on_change(config.reload_on_change);
        if let Some(seconds) = config.cache_ttl_seconds {
            let seconds = i64::try_from(seconds).unwrap_or(i64::MAX);
            cache = cache.with_ttl(Duration::try_seconds(seconds).unwrap_or(Duration::MAX));
        }
        cache
    }
}

impl Default for DatasetCache<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> DatasetCache<C> {
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            ttl: None,
            reload_on_change: false,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Expire snapshots after `ttl`
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Reload file sources whose modification time moved past the cached one
    #[must_use]
    pub fn reload_on_change(mut self, enabled: bool) -> Self {
        self.reload_on_change = enabled;
        self
    }

    /// Load a CSV dataset from `path`, parsing it only on a cache miss
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Arc<Dataset>> {
        let path = path.as_ref();
        let key = path.display().to_string();

        if let Some(dataset) = self.fresh(&key, Some(path)) {
            return Ok(dataset);
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get(&key) {
            if self.is_fresh(entry, Some(path)) {
                return Ok(Arc::clone(&entry.dataset));
            }
        }

        let source_mtime = file_mtime(path);
        let dataset = Arc::new(Dataset::load(path)?);
        entries.insert(key, self.entry(Arc::clone(&dataset), source_mtime));
        Ok(dataset)
    }

    /// Return the snapshot cached under `source`, or build it with `loader`.
    ///
    /// Loader errors are returned as-is and nothing is cached.
    pub fn load_with<F>(&self, source: &str, loader: F) -> Result<Arc<Dataset>>
    where
        F: FnOnce() -> Result<Dataset>,
    {
        if let Some(dataset) = self.fresh(source, None) {
            return Ok(dataset);
        }

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get(source) {
            if self.is_fresh(entry, None) {
                return Ok(Arc::clone(&entry.dataset));
            }
        }

        let dataset = Arc::new(loader()?);
        entries.insert(source.to_string(), self.entry(Arc::clone(&dataset), None));
        Ok(dataset)
    }

    /// Drop the snapshot for one source. Returns whether it was cached
    pub fn invalidate(&self, source: &str) -> bool {
        let removed = self
            .entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(source)
            .is_some();
        if removed {
            info!("Invalidated cached dataset for {}", source);
        }
        removed
    }

    /// Drop every cached snapshot
    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    #[must_use]
    pub fn contains(&self, source: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(source)
    }

    /// When the snapshot for `source` was parsed, if it is cached
    #[must_use]
    pub fn loaded_at(&self, source: &str) -> Option<DateTime<Utc>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(source)
            .map(|entry| entry.loaded_at)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn fresh(&self, key: &str, path: Option<&Path>) -> Option<Arc<Dataset>> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if self.is_fresh(entry, path) => {
                debug!("Dataset cache hit for {}", key);
                Some(Arc::clone(&entry.dataset))
            }
            Some(_) => {
                debug!("Dataset cache entry for {} is stale", key);
                None
            }
            None => {
                debug!("Dataset cache miss for {}", key);
                None
            }
        }
    }

    fn is_fresh(&self, entry: &CachedDataset, path: Option<&Path>) -> bool {
        if let Some(expires_at) = entry.expires_at {
            if self.clock.now() >= expires_at {
                return false;
            }
        }

        if self.reload_on_change {
            if let (Some(path), Some(cached_mtime)) = (path, entry.source_mtime) {
                match file_mtime(path) {
                    Some(current) if current <= cached_mtime => {}
                    _ => return false,
                }
            }
        }

        true
    }

    fn entry(&self, dataset: Arc<Dataset>, source_mtime: Option<SystemTime>) -> CachedDataset {
        let loaded_at = self.clock.now();
        CachedDataset {
            dataset,
            loaded_at,
            expires_at: self.ttl.and_then(|ttl| loaded_at.checked_add_signed(ttl)),
            source_mtime,
        }
    }
}

/// Process-wide cache for callers that do not manage their own
#[must_use]
pub fn global() -> &'static DatasetCache {
    &GLOBAL_CACHE
}

fn file_mtime(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
