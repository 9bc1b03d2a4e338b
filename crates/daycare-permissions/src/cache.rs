//! Memoization of resolved permission sets
//!
//! The cache is owned by a resolver instance rather than living in a global,
//! so each resolver (and each test) gets its own lifetime and can reset it.

use crate::error::{Error, Result};
use crate::role::PermissionSet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Snapshot of cache activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups answered from the cache
    pub hits: u64,
    /// Lookups that required resolution
    pub misses: u64,
    /// Entries removed by `invalidate` or `clear`
    pub invalidations: u64,
    /// Entries currently cached
    pub entry_count: usize,
}

impl CacheStats {
    /// Hit rate as a percentage (0.0 to 100.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Thread-safe map from role id to its resolved permission set
#[derive(Debug, Default)]
pub struct PermissionCache {
    entries: RwLock<HashMap<String, Arc<PermissionSet>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    invalidations: AtomicU64,
}

impl PermissionCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a role, recording a hit or miss
    pub fn get(&self, role: &str) -> Result<Option<Arc<PermissionSet>>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| Error::Internal(format!("Failed to acquire read lock: {}", e)))?;
        let found = entries.get(role).cloned();

        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        Ok(found)
    }

    /// Store a resolved set, replacing any previous entry for the role
    pub fn insert(&self, role: &str, permissions: Arc<PermissionSet>) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| Error::Internal(format!("Failed to acquire write lock: {}", e)))?;
        entries.insert(role.to_string(), permissions);
        Ok(())
    }

    /// Drop the entry for one role, returning whether one existed
    pub fn invalidate(&self, role: &str) -> Result<bool> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| Error::Internal(format!("Failed to acquire write lock: {}", e)))?;
        let removed = entries.remove(role).is_some();
        if removed {
            self.invalidations.fetch_add(1, Ordering::Relaxed);
        }
        Ok(removed)
    }

    /// Drop every entry and zero the hit/miss counters
    pub fn clear(&self) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| Error::Internal(format!("Failed to acquire write lock: {}", e)))?;
        self.invalidations
            .fetch_add(entries.len() as u64, Ordering::Relaxed);
        entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        Ok(())
    }

    /// Number of cached roles
    pub fn len(&self) -> Result<usize> {
        let entries = self
            .entries
            .read()
            .map_err(|e| Error::Internal(format!("Failed to acquire read lock: {}", e)))?;
        Ok(entries.len())
    }

    /// Whether nothing is cached
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Snapshot of counters and entry count
    pub fn stats(&self) -> Result<CacheStats> {
        Ok(CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            entry_count: self.len()?,
        })
    }
}
