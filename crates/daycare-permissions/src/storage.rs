//! Persistence for role table configuration
//!
//! Role tables live in a JSON or YAML document of the form
//! `{ "roles": [ { "id": ..., "name": ..., "permissions": [...], "inherits": [...] } ] }`.

use crate::error::{Error, Result};
use crate::table::RoleTable;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, info};

/// Repository trait for loading and storing the role table
pub trait RoleTableRepository: Send + Sync {
    /// Load the role table; loaded tables are validated
    fn load_table(&self) -> Result<RoleTable>;

    /// Persist the role table; tables that would fail to load are rejected
    fn save_table(&self, table: &RoleTable) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Yaml,
}

impl Format {
    fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Ok(Format::Json),
            Some("yaml") | Some("yml") => Ok(Format::Yaml),
            other => Err(Error::Config(format!(
                "Unsupported role table format {:?} for {}",
                other,
                path.display()
            ))),
        }
    }
}

/// File-based role table repository
///
/// A missing file yields the built-in daycare table.
#[derive(Debug, Clone)]
pub struct FileRoleTableRepository {
    path: PathBuf,
}

impl FileRoleTableRepository {
    /// Repository backed by the file at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Repository at `<base>/roles.json`
    pub fn with_defaults<P: AsRef<Path>>(base_path: P) -> Self {
        Self::new(base_path.as_ref().join("roles.json"))
    }

    /// Location of the role table document
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RoleTableRepository for FileRoleTableRepository {
    fn load_table(&self) -> Result<RoleTable> {
        let format = Format::from_path(&self.path)?;
        if !self.path.exists() {
            debug!(path = %self.path.display(), "Role table not found, using built-in roles");
            return Ok(RoleTable::daycare());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let table: RoleTable = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Yaml => serde_yaml::from_str(&content)?,
        };
        table.validate()?;

        info!(path = %self.path.display(), roles = table.len(), "Loaded role table");
        Ok(table)
    }

    fn save_table(&self, table: &RoleTable) -> Result<()> {
        let format = Format::from_path(&self.path)?;
        table.validate()?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = match format {
            Format::Json => serde_json::to_string_pretty(table)?,
            Format::Yaml => serde_yaml::to_string(table)?,
        };
        std::fs::write(&self.path, content)?;

        debug!(path = %self.path.display(), roles = table.len(), "Saved role table");
        Ok(())
    }
}

/// In-memory role table repository (for testing)
#[derive(Debug)]
pub struct InMemoryRoleTableRepository {
    table: RwLock<RoleTable>,
}

impl InMemoryRoleTableRepository {
    /// Repository seeded with `table`
    pub fn new(table: RoleTable) -> Self {
        Self {
            table: RwLock::new(table),
        }
    }
}

impl Default for InMemoryRoleTableRepository {
    fn default() -> Self {
        Self::new(RoleTable::daycare())
    }
}

impl RoleTableRepository for InMemoryRoleTableRepository {
    fn load_table(&self) -> Result<RoleTable> {
        let table = self
            .table
            .read()
            .map_err(|e| Error::Internal(format!("Failed to read role table: {}", e)))?;
        table.validate()?;
        Ok(table.clone())
    }

    fn save_table(&self, table: &RoleTable) -> Result<()> {
        table.validate()?;
        let mut stored = self
            .table
            .write()
            .map_err(|e| Error::Internal(format!("Failed to write role table: {}", e)))?;
        *stored = table.clone();
        Ok(())
    }
}
