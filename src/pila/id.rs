//! Identifiers for databases and stacks.
//!
//! Every database and stack is identified by a random 128-bit UUID. The
//! string rendering is the canonical hyphenated form, which is also what the
//! HTTP layer receives as a path parameter and parses back.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

/// A unique identifier for a database.
///
/// # Examples
///
/// ```rust
/// use piladb::pila::DatabaseId;
///
/// let id = DatabaseId::new();
/// let parsed: DatabaseId = id.to_string().parse().unwrap();
/// assert_eq!(id, parsed);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DatabaseId(Uuid);

impl DatabaseId {
    /// Creates a new random database ID using UUIDv4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DatabaseId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| Error::InvalidIdentifier(s.to_string()))
    }
}

impl Default for DatabaseId {
    fn default() -> Self {
        Self::new()
    }
}

/// A unique identifier for a stack within a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StackId(Uuid);

impl StackId {
    /// Creates a new random stack ID using UUIDv4.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for StackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StackId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| Error::InvalidIdentifier(s.to_string()))
    }
}

impl Default for StackId {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generated_ids_are_unique() {
        let rendered: HashSet<String> = (0..10_000).map(|_| DatabaseId::new().to_string()).collect();
        assert_eq!(rendered.len(), 10_000);

        let rendered: HashSet<String> = (0..10_000).map(|_| StackId::new().to_string()).collect();
        assert_eq!(rendered.len(), 10_000);
    }

    #[test]
    fn test_equality_follows_rendering() {
        let id = StackId::new();
        let parsed: StackId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
        assert_eq!(id.to_string(), parsed.to_string());
        assert_eq!(id.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = "not-a-uuid".parse::<DatabaseId>().unwrap_err();
        assert_eq!(err, Error::InvalidIdentifier("not-a-uuid".to_string()));
    }
}
