//! Audit trail data models

use crate::role::Permission;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of an access check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    /// Access was granted
    Granted,
    /// No usable session was presented
    Unauthenticated,
    /// The session lacked a required role or permission
    Unauthorized,
}

impl AuditOutcome {
    /// Whether the outcome denied access
    pub fn is_denial(&self) -> bool {
        !matches!(self, AuditOutcome::Granted)
    }
}

impl std::fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditOutcome::Granted => write!(f, "granted"),
            AuditOutcome::Unauthenticated => write!(f, "unauthenticated"),
            AuditOutcome::Unauthorized => write!(f, "unauthorized"),
        }
    }
}

/// One recorded access decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessAuditEntry {
    /// Unique identifier for this entry
    pub id: String,
    pub timestamp: DateTime<Utc>,
    /// User the session belonged to, if any
    pub user_id: Option<String>,
    /// Role carried by the session, if any
    pub role: Option<String>,
    /// Permissions the guarded resource required
    pub required: Vec<Permission>,
    pub outcome: AuditOutcome,
    /// Required permissions the session did not have
    #[serde(default)]
    pub missing: Vec<Permission>,
}

impl AccessAuditEntry {
    /// Create a new entry stamped with the current time
    pub fn new(outcome: AuditOutcome, required: Vec<Permission>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            user_id: None,
            role: None,
            required,
            outcome,
            missing: Vec::new(),
        }
    }

    /// Set the user id
    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Set the session role
    pub fn with_role(mut self, role: Option<String>) -> Self {
        self.role = role;
        self
    }

    /// Set the permissions that were missing
    pub fn with_missing(mut self, missing: Vec<Permission>) -> Self {
        self.missing = missing;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_outcome_display() {
        assert_eq!(AuditOutcome::Granted.to_string(), "granted");
        assert_eq!(AuditOutcome::Unauthenticated.to_string(), "unauthenticated");
        assert_eq!(AuditOutcome::Unauthorized.to_string(), "unauthorized");
    }

    #[test]
    fn test_audit_outcome_is_denial() {
        assert!(!AuditOutcome::Granted.is_denial());
        assert!(AuditOutcome::Unauthenticated.is_denial());
        assert!(AuditOutcome::Unauthorized.is_denial());
    }

    #[test]
    fn test_entry_creation() {
        let entry = AccessAuditEntry::new(AuditOutcome::Granted, vec!["view_schedule".into()])
            .with_user(Some("u1".to_string()))
            .with_role(Some("parent".to_string()));

        assert!(!entry.id.is_empty());
        assert_eq!(entry.user_id.as_deref(), Some("u1"));
        assert_eq!(entry.role.as_deref(), Some("parent"));
        assert!(entry.missing.is_empty());
    }

    #[test]
    fn test_entry_timestamp() {
        let before = Utc::now();
        let entry = AccessAuditEntry::new(AuditOutcome::Unauthenticated, Vec::new());
        let after = Utc::now();

        assert!(entry.timestamp >= before);
        assert!(entry.timestamp <= after);
    }

    #[test]
    fn test_entry_serialization() {
        let entry = AccessAuditEntry::new(AuditOutcome::Unauthorized, vec!["manage_billing".into()])
            .with_missing(vec!["manage_billing".into()]);

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["outcome"], "unauthorized");
        assert_eq!(json["missing"][0], "manage_billing");

        let back: AccessAuditEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back.id, entry.id);
        assert_eq!(back.outcome, AuditOutcome::Unauthorized);
    }
}
