//! Route guard authorization
//!
//! Route guards hand the current session (if any) and the requirement of the
//! route to an [`AccessGuard`]. Redirecting on a denial is left to the caller.

use crate::audit::{AccessAuditEntry, AccessAuditLog, AuditOutcome};
use crate::error::Result;
use crate::resolver::PermissionResolver;
use crate::role::{Permission, PermissionSet};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// The signed-in user's session as carried by the front end
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSession {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    /// Permissions materialized when the session was issued
    #[serde(default)]
    pub permissions: Option<Vec<Permission>>,
}

impl UserSession {
    /// Session identified only by role
    pub fn for_role(user_id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            role: Some(role.into()),
            permissions: None,
        }
    }

    /// Session for a role with its permissions resolved up front
    pub fn materialized(
        user_id: impl Into<String>,
        role: impl Into<String>,
        resolver: &PermissionResolver,
    ) -> Result<Self> {
        let role = role.into();
        let permissions = resolver.resolve(&role)?.to_sorted_vec();
        Ok(Self {
            user_id: Some(user_id.into()),
            role: Some(role),
            permissions: Some(permissions),
        })
    }

    /// Replace the materialized permission list
    pub fn with_permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        self.permissions = Some(permissions.into_iter().map(Into::into).collect());
        self
    }

    fn role_id(&self) -> Option<&str> {
        self.role.as_deref().filter(|role| !role.is_empty())
    }

    /// A session needs a role or a materialized permission list to count
    pub fn is_authenticated(&self) -> bool {
        self.role_id().is_some() || self.permissions.is_some()
    }
}

/// What a guarded route demands of a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequirement {
    /// Accepted roles; empty accepts any role
    #[serde(default)]
    pub roles: Vec<String>,
    /// Permissions that must all be held
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl AccessRequirement {
    /// Any authenticated session
    pub fn any() -> Self {
        Self::default()
    }

    /// Require a single permission
    pub fn permission(permission: impl Into<Permission>) -> Self {
        Self::permissions([permission])
    }

    /// Require every listed permission
    pub fn permissions<I, P>(permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        Self {
            roles: Vec::new(),
            permissions: permissions.into_iter().map(Into::into).collect(),
        }
    }

    /// Restrict to sessions holding one of these roles
    pub fn with_roles<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles.extend(roles.into_iter().map(Into::into));
        self
    }
}

/// Result of checking a session against a requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    /// No session, or one with neither role nor permissions
    Unauthenticated,
    /// The role is not accepted or required permissions are missing
    Unauthorized { missing: Vec<Permission> },
}

impl AccessDecision {
    /// Whether access was granted
    pub fn is_granted(&self) -> bool {
        matches!(self, AccessDecision::Granted)
    }

    fn outcome(&self) -> AuditOutcome {
        match self {
            AccessDecision::Granted => AuditOutcome::Granted,
            AccessDecision::Unauthenticated => AuditOutcome::Unauthenticated,
            AccessDecision::Unauthorized { .. } => AuditOutcome::Unauthorized,
        }
    }
}

impl std::fmt::Display for AccessDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccessDecision::Granted => write!(f, "granted"),
            AccessDecision::Unauthenticated => write!(f, "unauthenticated"),
            AccessDecision::Unauthorized { missing } if missing.is_empty() => {
                write!(f, "unauthorized")
            }
            AccessDecision::Unauthorized { missing } => {
                let names: Vec<&str> = missing.iter().map(Permission::as_str).collect();
                write!(f, "unauthorized (missing: {})", names.join(", "))
            }
        }
    }
}

/// Authorizes sessions against route requirements
#[derive(Debug)]
pub struct AccessGuard {
    resolver: Arc<PermissionResolver>,
    audit_log: Option<AccessAuditLog>,
}

impl AccessGuard {
    /// Guard without an audit log
    pub fn new(resolver: Arc<PermissionResolver>) -> Self {
        Self {
            resolver,
            audit_log: None,
        }
    }

    /// Guard that records every decision into `audit_log`
    pub fn with_audit_log(resolver: Arc<PermissionResolver>, audit_log: AccessAuditLog) -> Self {
        Self {
            resolver,
            audit_log: Some(audit_log),
        }
    }

    /// Resolver used for role-based sessions
    pub fn resolver(&self) -> &PermissionResolver {
        &self.resolver
    }

    /// Audit log receiving decisions, if any
    pub fn audit_log(&self) -> Option<&AccessAuditLog> {
        self.audit_log.as_ref()
    }

    /// Decide whether a session satisfies a requirement
    ///
    /// A missing session is denied. A materialized permission list on the
    /// session takes precedence over resolving its role.
    pub fn authorize(
        &self,
        session: Option<&UserSession>,
        requirement: &AccessRequirement,
    ) -> AccessDecision {
        let decision = self.decide(session, requirement);
        debug!(
            user_id = ?session.and_then(|s| s.user_id.as_deref()),
            role = ?session.and_then(|s| s.role.as_deref()),
            decision = %decision,
            "Access decision"
        );
        self.record(session, requirement, &decision);
        decision
    }

    fn decide(&self, session: Option<&UserSession>, requirement: &AccessRequirement) -> AccessDecision {
        let Some(session) = session.filter(|s| s.is_authenticated()) else {
            return AccessDecision::Unauthenticated;
        };

        if !requirement.roles.is_empty() {
            let accepted = session
                .role_id()
                .is_some_and(|role| requirement.roles.iter().any(|r| r == role));
            if !accepted {
                return AccessDecision::Unauthorized {
                    missing: Vec::new(),
                };
            }
        }

        if requirement.permissions.is_empty() {
            return AccessDecision::Granted;
        }

        let granted = self.effective_permissions(session);
        let missing = granted.missing(&requirement.permissions);
        if missing.is_empty() {
            AccessDecision::Granted
        } else {
            AccessDecision::Unauthorized { missing }
        }
    }

    fn effective_permissions(&self, session: &UserSession) -> Arc<PermissionSet> {
        if let Some(ref materialized) = session.permissions {
            return Arc::new(materialized.iter().cloned().collect());
        }

        let Some(role) = session.role_id() else {
            return Arc::new(PermissionSet::new());
        };
        self.resolver.resolve(role).unwrap_or_else(|e| {
            warn!(role = %role, error = %e, "Treating session as having no permissions");
            Arc::new(PermissionSet::new())
        })
    }

    fn record(
        &self,
        session: Option<&UserSession>,
        requirement: &AccessRequirement,
        decision: &AccessDecision,
    ) {
        let Some(ref audit_log) = self.audit_log else {
            return;
        };

        let missing = match decision {
            AccessDecision::Unauthorized { missing } => missing.clone(),
            _ => Vec::new(),
        };
        let entry = AccessAuditEntry::new(decision.outcome(), requirement.permissions.clone())
            .with_user(session.and_then(|s| s.user_id.clone()))
            .with_role(session.and_then(|s| s.role.clone()))
            .with_missing(missing);

        if let Err(e) = audit_log.record(entry) {
            warn!(error = %e, "Failed to record access decision");
        }
    }

    /// Run `f` only when the session is authorized
    pub fn run_if_authorized<F, T>(
        &self,
        session: Option<&UserSession>,
        requirement: &AccessRequirement,
        f: F,
    ) -> (AccessDecision, Option<T>)
    where
        F: FnOnce() -> T,
    {
        let decision = self.authorize(session, requirement);
        if decision.is_granted() {
            (decision, Some(f()))
        } else {
            (decision, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{permissions, roles};

    fn guard() -> AccessGuard {
        AccessGuard::new(Arc::new(PermissionResolver::daycare()))
    }

    #[test]
    fn test_guard_debug_shows_audit_log() {
        let debug = format!("{:?}", guard());
        assert!(debug.starts_with("AccessGuard"));
        assert!(debug.contains("audit_log: None"));
    }

    #[test]
    fn test_missing_session_is_unauthenticated() {
        let decision = guard().authorize(None, &AccessRequirement::any());
        assert_eq!(decision, AccessDecision::Unauthenticated);
    }

    #[test]
    fn test_empty_session_is_unauthenticated() {
        let session = UserSession::default();
        let decision = guard().authorize(Some(&session), &AccessRequirement::any());
        assert_eq!(decision, AccessDecision::Unauthenticated);

        let blank_role = UserSession {
            role: Some(String::new()),
            ..UserSession::default()
        };
        let decision = guard().authorize(Some(&blank_role), &AccessRequirement::any());
        assert_eq!(decision, AccessDecision::Unauthenticated);
    }

    #[test]
    fn test_role_session_granted_through_inheritance() {
        let session = UserSession::for_role("u1", roles::MANAGER);
        let requirement = AccessRequirement::permission(permissions::VIEW_SCHEDULE);

        assert!(guard().authorize(Some(&session), &requirement).is_granted());
    }

    #[test]
    fn test_missing_permissions_are_reported_sorted() {
        let session = UserSession::for_role("u1", roles::PARENT);
        let requirement = AccessRequirement::permissions([
            permissions::VIEW_SCHEDULE,
            permissions::MANAGE_BILLING,
            permissions::MANAGE_CHILDREN,
        ]);

        let decision = guard().authorize(Some(&session), &requirement);
        assert_eq!(
            decision,
            AccessDecision::Unauthorized {
                missing: vec![
                    Permission::from(permissions::MANAGE_BILLING),
                    Permission::from(permissions::MANAGE_CHILDREN),
                ],
            }
        );
        assert_eq!(
            decision.to_string(),
            "unauthorized (missing: manage_billing, manage_children)"
        );
    }

    #[test]
    fn test_materialized_permissions_take_precedence() {
        let session =
            UserSession::for_role("u1", roles::ADMIN).with_permissions([permissions::VIEW_SCHEDULE]);

        let guard = guard();
        assert!(guard
            .authorize(Some(&session), &AccessRequirement::permission(permissions::VIEW_SCHEDULE))
            .is_granted());
        assert!(!guard
            .authorize(Some(&session), &AccessRequirement::permission(permissions::MANAGE_USERS))
            .is_granted());
    }

    #[test]
    fn test_permissions_only_session_is_authenticated() {
        let session = UserSession::default().with_permissions([permissions::VIEW_REPORTS]);
        let decision = guard().authorize(
            Some(&session),
            &AccessRequirement::permission(permissions::VIEW_REPORTS),
        );
        assert!(decision.is_granted());
    }

    #[test]
    fn test_role_restriction() {
        let guard = guard();
        let requirement = AccessRequirement::any().with_roles([roles::ADMIN, roles::MANAGER]);

        let manager = UserSession::for_role("u1", roles::MANAGER);
        assert!(guard.authorize(Some(&manager), &requirement).is_granted());

        let parent = UserSession::for_role("u2", roles::PARENT);
        assert_eq!(
            guard.authorize(Some(&parent), &requirement),
            AccessDecision::Unauthorized { missing: Vec::new() }
        );

        let no_role = UserSession::default().with_permissions([permissions::VIEW_REPORTS]);
        assert!(!guard.authorize(Some(&no_role), &requirement).is_granted());
    }

    #[test]
    fn test_unknown_role_is_denied() {
        let session = UserSession::for_role("u1", "janitor");
        let decision = guard().authorize(
            Some(&session),
            &AccessRequirement::permission(permissions::VIEW_SCHEDULE),
        );
        assert!(matches!(decision, AccessDecision::Unauthorized { .. }));
    }

    #[test]
    fn test_materialized_session_matches_resolution() {
        let resolver = PermissionResolver::daycare();
        let session = UserSession::materialized("u1", roles::MANAGER, &resolver).unwrap();

        let permissions = session.permissions.unwrap();
        assert_eq!(permissions.len(), resolver.resolve(roles::MANAGER).unwrap().len());
        assert!(permissions.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_decisions_are_audited() {
        let log = AccessAuditLog::new();
        let guard = AccessGuard::with_audit_log(Arc::new(PermissionResolver::daycare()), log.clone());

        let parent = UserSession::for_role("u1", roles::PARENT);
        guard.authorize(Some(&parent), &AccessRequirement::permission(permissions::VIEW_SCHEDULE));
        guard.authorize(Some(&parent), &AccessRequirement::permission(permissions::MANAGE_USERS));
        guard.authorize(None, &AccessRequirement::any());

        let entries = log.entries().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].outcome, AuditOutcome::Granted);
        assert_eq!(entries[1].outcome, AuditOutcome::Unauthorized);
        assert_eq!(entries[1].missing, vec![Permission::from(permissions::MANAGE_USERS)]);
        assert_eq!(entries[2].outcome, AuditOutcome::Unauthenticated);
        assert_eq!(entries[2].user_id, None);
    }

    #[test]
    fn test_run_if_authorized() {
        let guard = guard();
        let session = UserSession::for_role("u1", roles::BABYSITTER);

        let (decision, output) = guard.run_if_authorized(
            Some(&session),
            &AccessRequirement::permission(permissions::MANAGE_ATTENDANCE),
            || 42,
        );
        assert!(decision.is_granted());
        assert_eq!(output, Some(42));

        let (decision, output) = guard.run_if_authorized(
            Some(&session),
            &AccessRequirement::permission(permissions::MANAGE_BILLING),
            || 42,
        );
        assert!(!decision.is_granted());
        assert_eq!(output, None);
    }
}
