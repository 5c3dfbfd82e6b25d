// piladb - Rust Implementation
// An in-memory database of LIFO stacks, served over HTTP

#![warn(rust_2018_idioms)]

pub mod pila;
pub mod server;

// Re-exports for convenience
pub use pila::{Database, DatabaseId, Pila, Stack, StackId, Status, Value};

/// piladb error types
pub mod error {
    use thiserror::Error;

    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum Error {
        /// The entity already has an owner and must be detached first.
        #[error("{entity} already added to a {owner}")]
        AlreadyOwned {
            entity: &'static str,
            owner: &'static str,
        },

        /// The container already holds an entity under the same identifier.
        #[error("{owner} already contains {entity} {id}")]
        AlreadyRegistered {
            owner: &'static str,
            entity: &'static str,
            id: String,
        },

        #[error("Invalid identifier: {0}")]
        InvalidIdentifier(String),

        #[error("Serialization error: {0}")]
        Serialization(String),
    }

    impl From<serde_json::Error> for Error {
        fn from(err: serde_json::Error) -> Self {
            Error::Serialization(err.to_string())
        }
    }

    pub type Result<T> = std::result::Result<T, Error>;
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::error::Error;

    #[test]
    fn test_error_messages() {
        let owned = Error::AlreadyOwned {
            entity: "database",
            owner: "pila",
        };
        assert_eq!(owned.to_string(), "database already added to a pila");

        let registered = Error::AlreadyRegistered {
            owner: "pila",
            entity: "database",
            id: "abc".to_string(),
        };
        assert_eq!(registered.to_string(), "pila already contains database abc");
    }
}
