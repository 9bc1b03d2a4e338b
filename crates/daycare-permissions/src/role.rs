//! Role and permission data models

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::HashSet;

/// Opaque capability identifier such as `view_children`
///
/// Permissions have no internal structure; two permissions are the same
/// only when their strings match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(String);

impl Permission {
    /// Create a permission from any string-like identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The permission identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Permission {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Permission {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Permission {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Permission {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A named bundle of permissions, optionally inheriting from other roles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Identifier used for lookup and inheritance references
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Permissions granted directly by this role
    #[serde(default)]
    pub permissions: Vec<Permission>,
    /// Ids of roles whose permissions this role also grants
    #[serde(default)]
    pub inherits: Vec<String>,
}

impl Role {
    /// Create a role with no permissions and no parents
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            permissions: Vec::new(),
            inherits: Vec::new(),
        }
    }

    /// Add directly granted permissions
    pub fn with_permissions<I, P>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Permission>,
    {
        self.permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    /// Add parent roles
    pub fn inheriting<I, S>(mut self, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inherits.extend(parents.into_iter().map(Into::into));
        self
    }

    /// Whether this role inherits from any other role
    pub fn has_parents(&self) -> bool {
        !self.inherits.is_empty()
    }
}

/// Flattened, de-duplicated permissions a role confers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    permissions: HashSet<Permission>,
}

impl PermissionSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a permission, returning whether it was newly added
    pub fn insert(&mut self, permission: Permission) -> bool {
        self.permissions.insert(permission)
    }

    /// Union another set into this one
    pub fn extend_from(&mut self, other: &PermissionSet) {
        self.permissions.extend(other.permissions.iter().cloned());
    }

    /// Whether the set holds this permission
    pub fn contains(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// True when every listed permission is present; vacuously true when empty
    pub fn contains_all<P: AsRef<str>>(&self, permissions: &[P]) -> bool {
        permissions.iter().all(|p| self.contains(p.as_ref()))
    }

    /// True when at least one listed permission is present
    pub fn contains_any<P: AsRef<str>>(&self, permissions: &[P]) -> bool {
        permissions.iter().any(|p| self.contains(p.as_ref()))
    }

    /// Listed permissions not present in this set, sorted
    pub fn missing<P: AsRef<str>>(&self, permissions: &[P]) -> Vec<Permission> {
        let mut missing: Vec<Permission> = permissions
            .iter()
            .map(|p| p.as_ref())
            .filter(|p| !self.contains(p))
            .map(Permission::from)
            .collect();
        missing.sort();
        missing.dedup();
        missing
    }

    /// Whether every permission here is also in `other`
    pub fn is_subset(&self, other: &PermissionSet) -> bool {
        self.permissions.is_subset(&other.permissions)
    }

    /// Number of distinct permissions
    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Iterate in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.permissions.iter()
    }

    /// Permissions in lexical order, for stable display
    pub fn to_sorted_vec(&self) -> Vec<Permission> {
        let mut sorted: Vec<Permission> = self.permissions.iter().cloned().collect();
        sorted.sort();
        sorted
    }
}

impl<P: Into<Permission>> FromIterator<P> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            permissions: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = &'a Permission;
    type IntoIter = std::collections::hash_set::Iter<'a, Permission>;

    fn into_iter(self) -> Self::IntoIter {
        self.permissions.iter()
    }
}
