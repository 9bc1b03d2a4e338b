//! Role and permission resolution for the daycare front ends
//!
//! Roles grant permission strings directly and through inheritance. The
//! [`PermissionResolver`] flattens a role into its full [`PermissionSet`],
//! memoizing per role, and the [`AccessGuard`] turns a user session into an
//! authorization decision for route gating. Unknown roles and missing
//! sessions fail closed.

pub mod audit;
pub mod cache;
pub mod error;
pub mod guard;
pub mod resolver;
pub mod role;
pub mod storage;
pub mod table;

pub use audit::{AccessAuditEntry, AccessAuditLog, AuditFilter, AuditOutcome};
pub use cache::{CacheStats, PermissionCache};
pub use error::{Error, Result};
pub use guard::{AccessDecision, AccessGuard, AccessRequirement, UserSession};
pub use resolver::PermissionResolver;
pub use role::{Permission, PermissionSet, Role};
pub use storage::{FileRoleTableRepository, InMemoryRoleTableRepository, RoleTableRepository};
pub use table::RoleTable;
