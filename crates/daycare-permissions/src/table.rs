//! Static role configuration
//!
//! A [`RoleTable`] is built once at startup, validated, and then shared
//! read-only with a [`crate::PermissionResolver`].

use crate::error::{Error, Result};
use crate::role::Role;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Permission identifiers used by the daycare front ends
pub mod permissions {
    pub const VIEW_DASHBOARD: &str = "view_dashboard";
    pub const VIEW_CHILDREN: &str = "view_children";
    pub const MANAGE_CHILDREN: &str = "manage_children";
    pub const VIEW_OWN_CHILDREN: &str = "view_own_children";
    pub const VIEW_BABYSITTERS: &str = "view_babysitters";
    pub const MANAGE_BABYSITTERS: &str = "manage_babysitters";
    pub const VIEW_PARENTS: &str = "view_parents";
    pub const MANAGE_PARENTS: &str = "manage_parents";
    pub const VIEW_ATTENDANCE: &str = "view_attendance";
    pub const MANAGE_ATTENDANCE: &str = "manage_attendance";
    pub const VIEW_SCHEDULE: &str = "view_schedule";
    pub const MANAGE_SCHEDULE: &str = "manage_schedule";
    pub const VIEW_BILLING: &str = "view_billing";
    pub const VIEW_OWN_BILLING: &str = "view_own_billing";
    pub const MANAGE_BILLING: &str = "manage_billing";
    pub const VIEW_REPORTS: &str = "view_reports";
    pub const MANAGE_USERS: &str = "manage_users";
    pub const MANAGE_SETTINGS: &str = "manage_settings";
}

/// Role ids of the built-in daycare table
pub mod roles {
    pub const ADMIN: &str = "admin";
    pub const MANAGER: &str = "manager";
    pub const BABYSITTER: &str = "babysitter";
    pub const PARENT: &str = "parent";
}

/// On-disk shape of a role table
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RoleTableDocument {
    #[serde(default)]
    roles: Vec<Role>,
}

/// Role id to role mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RoleTableDocument", into = "RoleTableDocument")]
pub struct RoleTable {
    roles: BTreeMap<String, Role>,
}

impl RoleTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from roles, rejecting duplicate ids
    pub fn from_roles<I: IntoIterator<Item = Role>>(roles: I) -> Result<Self> {
        let mut table = Self::new();
        for role in roles {
            table.add_role(role)?;
        }
        Ok(table)
    }

    /// The table shipped with the daycare front ends
    pub fn daycare() -> Self {
        use self::permissions::*;

        let admin = Role::new(roles::ADMIN, "Administrator").with_permissions([
            VIEW_DASHBOARD,
            VIEW_CHILDREN,
            MANAGE_CHILDREN,
            VIEW_BABYSITTERS,
            MANAGE_BABYSITTERS,
            VIEW_PARENTS,
            MANAGE_PARENTS,
            VIEW_ATTENDANCE,
            MANAGE_ATTENDANCE,
            VIEW_SCHEDULE,
            MANAGE_SCHEDULE,
            VIEW_BILLING,
            MANAGE_BILLING,
            VIEW_REPORTS,
            MANAGE_USERS,
            MANAGE_SETTINGS,
        ]);
        let manager = Role::new(roles::MANAGER, "Manager")
            .with_permissions([
                VIEW_DASHBOARD,
                MANAGE_CHILDREN,
                VIEW_BABYSITTERS,
                VIEW_PARENTS,
                MANAGE_SCHEDULE,
                VIEW_BILLING,
                VIEW_REPORTS,
            ])
            .inheriting([roles::BABYSITTER]);
        let babysitter = Role::new(roles::BABYSITTER, "Babysitter").with_permissions([
            VIEW_DASHBOARD,
            VIEW_CHILDREN,
            VIEW_ATTENDANCE,
            MANAGE_ATTENDANCE,
            VIEW_SCHEDULE,
        ]);
        let parent = Role::new(roles::PARENT, "Parent").with_permissions([
            VIEW_OWN_CHILDREN,
            VIEW_SCHEDULE,
            VIEW_OWN_BILLING,
        ]);

        let roles = [admin, manager, babysitter, parent]
            .into_iter()
            .map(|role| (role.id.clone(), role))
            .collect();
        Self { roles }
    }

    /// Add a role, failing if its id is already present
    pub fn add_role(&mut self, role: Role) -> Result<()> {
        if self.roles.contains_key(&role.id) {
            return Err(Error::DuplicateRole(role.id));
        }
        debug!(role = %role.id, parents = role.inherits.len(), "Adding role");
        self.roles.insert(role.id.clone(), role);
        Ok(())
    }

    /// Look up a role by id
    pub fn get(&self, id: &str) -> Option<&Role> {
        self.roles.get(id)
    }

    /// Whether a role with this id is defined
    pub fn contains(&self, id: &str) -> bool {
        self.roles.contains_key(id)
    }

    /// Role ids in lexical order
    pub fn role_ids(&self) -> impl Iterator<Item = &str> {
        self.roles.keys().map(String::as_str)
    }

    /// Role definitions in id order
    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    /// Number of defined roles
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Whether no roles are defined
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Check that every parent reference exists and inheritance is acyclic
    pub fn validate(&self) -> Result<()> {
        for role in self.roles.values() {
            if let Some(parent) = role.inherits.iter().find(|p| !self.contains(p)) {
                return Err(Error::UndefinedParent {
                    role: role.id.clone(),
                    parent: parent.clone(),
                });
            }
        }

        let mut marks: HashMap<&str, Mark> = HashMap::new();
        for root in self.roles.values() {
            if marks.contains_key(root.id.as_str()) {
                continue;
            }
            self.visit(root, &mut marks)?;
        }
        Ok(())
    }

    /// Iterative DFS from `root`; `path` holds each visiting role and its next parent index
    fn visit<'a>(&'a self, root: &'a Role, marks: &mut HashMap<&'a str, Mark>) -> Result<()> {
        marks.insert(root.id.as_str(), Mark::Visiting);
        let mut path: Vec<(&'a Role, usize)> = vec![(root, 0)];

        while let Some(top) = path.last_mut() {
            let (role, next) = *top;
            top.1 += 1;

            let Some(parent) = role.inherits.get(next) else {
                marks.insert(role.id.as_str(), Mark::Done);
                path.pop();
                continue;
            };

            match marks.get(parent.as_str()) {
                Some(Mark::Done) => {}
                Some(Mark::Visiting) => {
                    let start = path.iter().position(|(r, _)| r.id == *parent).unwrap_or(0);
                    let mut chain: Vec<String> =
                        path[start..].iter().map(|(r, _)| r.id.clone()).collect();
                    chain.push(parent.clone());
                    return Err(Error::CircularInheritance { chain });
                }
                None => {
                    if let Some(definition) = self.roles.get(parent) {
                        marks.insert(definition.id.as_str(), Mark::Visiting);
                        path.push((definition, 0));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Clone, Copy)]
enum Mark {
    Visiting,
    Done,
}

impl TryFrom<RoleTableDocument> for RoleTable {
    type Error = Error;

    fn try_from(document: RoleTableDocument) -> Result<Self> {
        Self::from_roles(document.roles)
    }
}

impl From<RoleTable> for RoleTableDocument {
    fn from(table: RoleTable) -> Self {
        Self {
            roles: table.roles.into_values().collect(),
        }
    }
}
