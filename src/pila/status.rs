//! Read-only status payloads.
//!
//! These are the summaries handed to the HTTP layer. Field names follow the
//! JSON exchange format:
//!
//! ```json
//! {
//!   "number_of_databases": 2,
//!   "databases": [
//!     {"id": "…", "name": "a", "number_of_stacks": 0},
//!     {"id": "…", "name": "b", "number_of_stacks": 3}
//!   ]
//! }
//! ```
//!
//! The order of `databases` (and of `stacks` in a `StacksStatus`) follows
//! hash map iteration and is not stable between runs. Consumers must not
//! depend on it.

use serde::{Deserialize, Serialize};

use super::Value;
use crate::error::Result;

/// Status of a whole Pila.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Status {
    pub number_of_databases: usize,
    pub databases: Vec<DatabaseStatus>,
}

impl Status {
    /// Serializes the status into its JSON exchange form.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Total stacks across every database in the snapshot.
    pub fn number_of_stacks(&self) -> usize {
        self.databases.iter().map(|db| db.number_of_stacks).sum()
    }
}

/// Status of a single Database.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DatabaseStatus {
    pub id: String,
    pub name: String,
    pub number_of_stacks: usize,
}

impl DatabaseStatus {
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Status of a single Stack. `peek` is `null` for an empty stack.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StackStatus {
    pub id: String,
    pub name: String,
    pub peek: Value,
    pub size: usize,
}

/// Listing of the stacks held by a Database.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StacksStatus {
    pub stacks: Vec<StackStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_json_shape() {
        let status = Status {
            number_of_databases: 1,
            databases: vec![DatabaseStatus {
                id: "d1".to_string(),
                name: "db".to_string(),
                number_of_stacks: 3,
            }],
        };

        let bytes = status.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            value,
            json!({
                "number_of_databases": 1,
                "databases": [{"id": "d1", "name": "db", "number_of_stacks": 3}]
            })
        );
        assert_eq!(status.number_of_stacks(), 3);
    }

    #[test]
    fn test_empty_status_serializes_empty_list() {
        let bytes = Status::default().to_json().unwrap();
        assert_eq!(bytes, br#"{"number_of_databases":0,"databases":[]}"#.to_vec());
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let status = Status {
            number_of_databases: 2,
            databases: vec![
                DatabaseStatus {
                    id: "1".to_string(),
                    name: "a".to_string(),
                    number_of_stacks: 0,
                },
                DatabaseStatus {
                    id: "2".to_string(),
                    name: "b".to_string(),
                    number_of_stacks: 1,
                },
            ],
        };
        assert_eq!(status.to_json().unwrap(), status.clone().to_json().unwrap());
    }

    #[test]
    fn test_stack_status_empty_peek_is_null() {
        let status = StackStatus {
            id: "s".to_string(),
            name: "stack".to_string(),
            peek: Value::Null,
            size: 0,
        };
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({"id": "s", "name": "stack", "peek": null, "size": 0})
        );
    }
}
