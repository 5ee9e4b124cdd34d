//! In-memory cache with optional TTL and JSON snapshots.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::cache::{Cache, CacheError};
use crate::config::CacheConfig;
use crate::resilience::clock::Clock;

/// A cached value and when it was written.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub value: String,
    pub inserted_at: Instant,
}

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Snapshot form of an entry; the age keeps TTLs running across restarts.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedEntry {
    value: String,
    age_ms: u64,
}

/// Sharded concurrent cache.
///
/// Distinct keys live in different `DashMap` shards, so readers and writers
/// of different keys do not serialize on one lock.
#[derive(Debug, Clone)]
pub struct MemoryCache {
    inner: Arc<DashMap<String, CacheEntry>>,
    ttl: Option<Duration>,
    clock: Arc<dyn Clock>,
    persistence_path: Option<PathBuf>,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new(clock: Arc<dyn Clock>, ttl: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl,
            clock,
            persistence_path: None,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Build from configuration, loading the snapshot when one exists.
    pub fn from_config(config: &CacheConfig, clock: Arc<dyn Clock>) -> std::io::Result<Self> {
        let mut cache = Self::new(clock, config.ttl_secs.map(Duration::from_secs));
        if let Some(path) = &config.persistence_path {
            cache.persistence_path = Some(PathBuf::from(path));
            cache.load_snapshot(Path::new(path))?;
        }
        Ok(cache)
    }

    fn load_snapshot(&self, path: &Path) -> std::io::Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let reader = BufReader::new(File::open(path)?);
        let map: HashMap<String, PersistedEntry> = serde_json::from_reader(reader)?;
        let now = self.clock.now();
        for (key, persisted) in map {
            let age = Duration::from_millis(persisted.age_ms);
            let entry = CacheEntry {
                key: key.clone(),
                value: persisted.value,
                inserted_at: now.checked_sub(age).unwrap_or(now),
            };
            if self.is_expired(&entry, now) {
                continue;
            }
            self.inner.insert(key, entry);
        }
        tracing::info!(path = ?path, entries = self.inner.len(), "Loaded cache snapshot");
        Ok(())
    }

    /// Write all live entries to the snapshot file, if configured.
    pub fn save_snapshot(&self) -> std::io::Result<()> {
        if let Some(path) = &self.persistence_path {
            let now = self.clock.now();
            let map: HashMap<String, PersistedEntry> = self
                .inner
                .iter()
                .filter(|r| !self.is_expired(r.value(), now))
                .map(|r| {
                    let age = now.saturating_duration_since(r.value().inserted_at);
                    let persisted = PersistedEntry {
                        value: r.value().value.clone(),
                        age_ms: age.as_millis() as u64,
                    };
                    (r.key().clone(), persisted)
                })
                .collect();

            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer(writer, &map)?;
            tracing::info!(path = ?path, entries = map.len(), "Saved cache snapshot");
        }
        Ok(())
    }

    /// Entry with its metadata, if present and not expired.
    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        let now = self.clock.now();
        self.inner
            .get(key)
            .filter(|r| !self.is_expired(r.value(), now))
            .map(|r| r.value().clone())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.inner.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn is_expired(&self, entry: &CacheEntry, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(entry.inserted_at) >= ttl,
            None => false,
        }
    }
}

impl Cache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = self.clock.now();
        let found = self
            .inner
            .get(key)
            .filter(|r| !self.is_expired(r.value(), now))
            .map(|r| r.value().value.clone());

        // The read guard is gone by now; removing from the same shard is safe.
        if found.is_none() {
            if self.ttl.is_some() {
                self.inner
                    .remove_if(key, |_, entry| self.is_expired(entry, now));
            }
            self.misses.fetch_add(1, Ordering::Relaxed);
        } else {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        Ok(found)
    }

    fn put(&self, key: &str, value: String) -> Result<(), CacheError> {
        self.inner.insert(
            key.to_string(),
            CacheEntry {
                key: key.to_string(),
                value,
                inserted_at: self.clock.now(),
            },
        );
        Ok(())
    }
}
