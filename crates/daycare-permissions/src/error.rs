//! Error types for role and permission resolution

use thiserror::Error;

/// Result type for permission operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading or resolving roles
///
/// Unknown roles are not an error: they resolve to an empty permission set.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Circular role inheritance: {}", .chain.join(" -> "))]
    CircularInheritance { chain: Vec<String> },

    #[error("Role '{role}' inherits from undefined role '{parent}'")]
    UndefinedParent { role: String, parent: String },

    #[error("Duplicate role id: {0}")]
    DuplicateRole(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_inheritance_message_shows_chain() {
        let err = Error::CircularInheritance {
            chain: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        assert_eq!(err.to_string(), "Circular role inheritance: a -> b -> a");
    }

    #[test]
    fn test_undefined_parent_message() {
        let err = Error::UndefinedParent {
            role: "manager".to_string(),
            parent: "ghost".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Role 'manager' inherits from undefined role 'ghost'"
        );
    }
}
