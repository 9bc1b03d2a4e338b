//! Transitive permission resolution over a role table

use crate::cache::{CacheStats, PermissionCache};
use crate::error::{Error, Result};
use crate::role::{PermissionSet, Role};
use crate::table::RoleTable;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves roles to their full, inherited permission sets
///
/// Resolution follows `inherits` links depth-first, unions every set it
/// reaches and memoizes the result per role. Unknown roles resolve to an
/// empty set. A role that is reached again while it is still being resolved
/// is reported as [`Error::CircularInheritance`].
#[derive(Debug)]
pub struct PermissionResolver {
    table: Arc<RoleTable>,
    cache: PermissionCache,
}

impl PermissionResolver {
    /// Create a resolver over a table without validating it
    pub fn new(table: Arc<RoleTable>) -> Self {
        debug!(roles = table.len(), "Creating permission resolver");
        Self {
            table,
            cache: PermissionCache::new(),
        }
    }

    /// Create a resolver after checking the table for cycles and dangling parents
    pub fn validated(table: RoleTable) -> Result<Self> {
        table.validate()?;
        Ok(Self::new(Arc::new(table)))
    }

    /// Resolver over the built-in daycare roles
    pub fn daycare() -> Self {
        Self::new(Arc::new(RoleTable::daycare()))
    }

    /// The role table this resolver reads from
    pub fn table(&self) -> &RoleTable {
        &self.table
    }

    /// Resolve a role to every permission it grants, directly or inherited
    ///
    /// # Errors
    /// Returns [`Error::CircularInheritance`] if the role's inheritance graph
    /// loops back on itself.
    pub fn resolve(&self, role: &str) -> Result<Arc<PermissionSet>> {
        // Unknown ids never touch the cache.
        let Some(definition) = self.table.get(role) else {
            debug!(role = %role, "Unknown role resolves to no permissions");
            return Ok(Arc::new(PermissionSet::new()));
        };

        if let Some(cached) = self.cache.get(role)? {
            return Ok(cached);
        }

        let resolved = self.resolve_uncached(definition)?;
        debug!(role = %role, permissions = resolved.len(), "Resolved role");
        Ok(resolved)
    }

    /// Depth-first union over an explicit stack of roles still being resolved
    fn resolve_uncached<'a>(&'a self, root: &'a Role) -> Result<Arc<PermissionSet>> {
        let mut resolving: Vec<Frame<'a>> = vec![Frame::new(root)];
        let mut on_stack: HashSet<&'a str> = HashSet::from([root.id.as_str()]);

        while let Some(frame) = resolving.last_mut() {
            let role = frame.role;
            let next = frame.next_parent;
            frame.next_parent += 1;

            let Some(parent) = role.inherits.get(next) else {
                on_stack.remove(role.id.as_str());
                let permissions = match resolving.pop() {
                    Some(finished) => Arc::new(finished.permissions),
                    None => break,
                };
                self.cache.insert(&role.id, Arc::clone(&permissions))?;
                match resolving.last_mut() {
                    Some(child) => child.permissions.extend_from(&permissions),
                    None => return Ok(permissions),
                }
                continue;
            };

            if on_stack.contains(parent.as_str()) {
                let start = resolving
                    .iter()
                    .position(|f| f.role.id == *parent)
                    .unwrap_or(0);
                let mut chain: Vec<String> =
                    resolving[start..].iter().map(|f| f.role.id.clone()).collect();
                chain.push(parent.clone());
                warn!(chain = ?chain, "Circular role inheritance");
                return Err(Error::CircularInheritance { chain });
            }

            // Shared ancestors resolve once.
            if let Some(cached) = self.cache.get(parent)? {
                if let Some(frame) = resolving.last_mut() {
                    frame.permissions.extend_from(&cached);
                }
                continue;
            }

            match self.table.get(parent) {
                Some(definition) => {
                    on_stack.insert(definition.id.as_str());
                    resolving.push(Frame::new(definition));
                }
                None => warn!(
                    role = %parent,
                    inherited_by = %role.id,
                    "Inherited role is not defined"
                ),
            }
        }

        Err(Error::Internal(format!(
            "Resolution of '{}' ended without a result",
            root.id
        )))
    }

    /// Whether the role grants a permission
    ///
    /// Resolution errors deny access.
    pub fn has_permission(&self, role: &str, permission: &str) -> bool {
        match self.resolve(role) {
            Ok(permissions) => permissions.contains(permission),
            Err(e) => {
                warn!(role = %role, permission = %permission, error = %e, "Denying on resolution failure");
                false
            }
        }
    }

    /// Whether the role grants every listed permission
    ///
    /// An empty list is satisfied by any role, known or not.
    pub fn has_all_permissions<P: AsRef<str>>(&self, role: &str, permissions: &[P]) -> bool {
        if permissions.is_empty() {
            return true;
        }
        match self.resolve(role) {
            Ok(granted) => granted.contains_all(permissions),
            Err(e) => {
                warn!(role = %role, error = %e, "Denying on resolution failure");
                false
            }
        }
    }

    /// Whether the role grants at least one listed permission
    pub fn has_any_permission<P: AsRef<str>>(&self, role: &str, permissions: &[P]) -> bool {
        if permissions.is_empty() {
            return false;
        }
        match self.resolve(role) {
            Ok(granted) => granted.contains_any(permissions),
            Err(e) => {
                warn!(role = %role, error = %e, "Denying on resolution failure");
                false
            }
        }
    }

    /// Forget every memoized resolution
    pub fn reset_cache(&self) -> Result<()> {
        debug!("Resetting permission cache");
        self.cache.clear()
    }

    /// Snapshot of this resolver's cache activity
    pub fn cache_stats(&self) -> Result<CacheStats> {
        self.cache.stats()
    }
}

/// A role whose parents are still being merged
struct Frame<'a> {
    role: &'a Role,
    next_parent: usize,
    permissions: PermissionSet,
}

impl<'a> Frame<'a> {
    fn new(role: &'a Role) -> Self {
        Self {
            role,
            next_parent: 0,
            permissions: role.permissions.iter().cloned().collect(),
        }
    }
}
