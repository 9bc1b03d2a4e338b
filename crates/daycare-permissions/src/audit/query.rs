//! Filtering of recorded access decisions

use super::models::{AccessAuditEntry, AuditOutcome};
use chrono::{DateTime, Utc};

/// Filter criteria for audit entries; unset fields match everything
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub role: Option<String>,
    pub user_id: Option<String>,
    pub outcome: Option<AuditOutcome>,
    /// Only entries at or after this instant
    pub since: Option<DateTime<Utc>>,
}

impl AuditFilter {
    /// Filter matching every entry
    pub fn new() -> Self {
        Self::default()
    }

    /// Only entries for this role
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Only entries for this user
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Only entries with this outcome
    pub fn with_outcome(mut self, outcome: AuditOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Only entries recorded at or after `instant`
    pub fn since(mut self, instant: DateTime<Utc>) -> Self {
        self.since = Some(instant);
        self
    }

    /// Whether an entry passes every set criterion
    pub fn matches(&self, entry: &AccessAuditEntry) -> bool {
        if let Some(ref role) = self.role {
            if entry.role.as_deref() != Some(role.as_str()) {
                return false;
            }
        }
        if let Some(ref user_id) = self.user_id {
            if entry.user_id.as_deref() != Some(user_id.as_str()) {
                return false;
            }
        }
        if let Some(outcome) = self.outcome {
            if entry.outcome != outcome {
                return false;
            }
        }
        if let Some(since) = self.since {
            if entry.timestamp < since {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(role: &str, outcome: AuditOutcome) -> AccessAuditEntry {
        AccessAuditEntry::new(outcome, Vec::new()).with_role(Some(role.to_string()))
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let filter = AuditFilter::new();
        assert!(filter.matches(&entry("parent", AuditOutcome::Granted)));
        assert!(filter.matches(&AccessAuditEntry::new(AuditOutcome::Unauthenticated, Vec::new())));
    }

    #[test]
    fn test_filter_by_role_and_outcome() {
        let filter = AuditFilter::new()
            .with_role("parent")
            .with_outcome(AuditOutcome::Unauthorized);

        assert!(filter.matches(&entry("parent", AuditOutcome::Unauthorized)));
        assert!(!filter.matches(&entry("parent", AuditOutcome::Granted)));
        assert!(!filter.matches(&entry("admin", AuditOutcome::Unauthorized)));
    }

    #[test]
    fn test_filter_by_user() {
        let filter = AuditFilter::new().with_user("u1");
        let matching = entry("parent", AuditOutcome::Granted).with_user(Some("u1".to_string()));

        assert!(filter.matches(&matching));
        assert!(!filter.matches(&entry("parent", AuditOutcome::Granted)));
    }

    #[test]
    fn test_filter_since() {
        let old = entry("parent", AuditOutcome::Granted);
        let cutoff = old.timestamp + chrono::Duration::seconds(1);

        assert!(!AuditFilter::new().since(cutoff).matches(&old));
        assert!(AuditFilter::new().since(old.timestamp).matches(&old));
    }
}
