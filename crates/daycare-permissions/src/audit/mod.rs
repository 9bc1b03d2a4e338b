//! Audit trail of access decisions

pub mod logger;
pub mod models;
pub mod query;

pub use logger::AccessAuditLog;
pub use models::{AccessAuditEntry, AuditOutcome};
pub use query::AuditFilter;
