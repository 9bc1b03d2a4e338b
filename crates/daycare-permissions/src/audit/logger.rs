//! In-memory audit log of access decisions

use super::models::{AccessAuditEntry, AuditOutcome};
use super::query::AuditFilter;
use crate::error::{Error, Result};
use std::sync::{Arc, RwLock};

/// Shared, append-only record of guard decisions
///
/// Clones share the same underlying entries.
#[derive(Debug, Clone, Default)]
pub struct AccessAuditLog {
    entries: Arc<RwLock<Vec<AccessAuditEntry>>>,
}

impl AccessAuditLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry
    pub fn record(&self, entry: AccessAuditEntry) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| Error::Internal(format!("Failed to acquire write lock: {}", e)))?;
        entries.push(entry);
        Ok(())
    }

    /// All entries in recording order
    pub fn entries(&self) -> Result<Vec<AccessAuditEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| Error::Internal(format!("Failed to acquire read lock: {}", e)))?;
        Ok(entries.clone())
    }

    /// Entries matching a filter, in recording order
    pub fn query(&self, filter: &AuditFilter) -> Result<Vec<AccessAuditEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| Error::Internal(format!("Failed to acquire read lock: {}", e)))?;
        Ok(entries
            .iter()
            .filter(|entry| filter.matches(entry))
            .cloned()
            .collect())
    }

    /// Entries recorded for sessions holding `role`
    pub fn entries_for_role(&self, role: &str) -> Result<Vec<AccessAuditEntry>> {
        self.query(&AuditFilter::new().with_role(role))
    }

    /// Every entry that did not grant access
    pub fn denials(&self) -> Result<Vec<AccessAuditEntry>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| Error::Internal(format!("Failed to acquire read lock: {}", e)))?;
        Ok(entries
            .iter()
            .filter(|entry| entry.outcome.is_denial())
            .cloned()
            .collect())
    }

    /// Number of entries with the given outcome
    pub fn count_outcome(&self, outcome: AuditOutcome) -> Result<usize> {
        Ok(self.query(&AuditFilter::new().with_outcome(outcome))?.len())
    }

    /// Number of recorded entries
    pub fn len(&self) -> Result<usize> {
        let entries = self
            .entries
            .read()
            .map_err(|e| Error::Internal(format!("Failed to acquire read lock: {}", e)))?;
        Ok(entries.len())
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove every entry
    pub fn clear(&self) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| Error::Internal(format!("Failed to acquire write lock: {}", e)))?;
        entries.clear();
        Ok(())
    }
}
