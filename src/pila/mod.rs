//! The in-memory data model.
//!
//! # Overview
//!
//! piladb organizes data in a three-level hierarchy:
//! ```text
//! Pila (DatabaseId → Database)
//!   └─→ Database (StackId → Stack)
//!        └─→ Stack (LIFO sequence of Values)
//! ```
//!
//! Ownership flows top-down through `Arc`s held in each container's map.
//! Children point back at their owner through a `Weak`, which is only used
//! to validate attach/detach and to navigate upwards.
//!
//! # Locking
//!
//! Every container has one `parking_lot::Mutex` guarding its collection and
//! its back-reference. Operations that touch a parent and a child always
//! lock the parent first. [`Pila::status`] holds the Pila lock for the whole
//! traversal and locks each database in turn, so adding or removing a
//! database is never half-visible in a snapshot. Stack counts are consistent
//! per database.
//!
//! # Examples
//!
//! ```rust
//! use piladb::pila::Pila;
//!
//! let pila = Pila::new();
//! let db_id = pila.create_database("app");
//! let db = pila.get_database(db_id).unwrap();
//!
//! let stack_id = db.create_stack("jobs");
//! let stack = db.get_stack(stack_id).unwrap();
//! stack.push("first");
//! stack.push("second");
//! assert_eq!(stack.pop().unwrap().as_str(), Some("second"));
//! ```

pub mod database;
pub mod id;
pub mod stack;
pub mod status;
pub mod value;

pub use database::Database;
pub use id::{DatabaseId, StackId};
pub use stack::Stack;
pub use status::{DatabaseStatus, StackStatus, StacksStatus, Status};
pub use value::Value;

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::debug;

use crate::error::{Error, Result};

/// The root registry of databases.
///
/// A `Pila` is constructed explicitly and passed to whoever needs it; there
/// is no process-wide global.
#[derive(Debug)]
pub struct Pila {
    this: Weak<Pila>,
    databases: Mutex<HashMap<DatabaseId, Arc<Database>>>,
}

impl Pila {
    /// Returns a blank Pila.
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            this: this.clone(),
            databases: Mutex::new(HashMap::new()),
        })
    }

    /// Creates a database owned by this Pila and returns its identifier.
    ///
    /// Names are not required to be unique; two databases may share one.
    pub fn create_database(&self, name: &str) -> DatabaseId {
        let mut databases = self.databases.lock();
        let db = loop {
            let db = Database::new(name);
            if !databases.contains_key(&db.id()) {
                break db;
            }
        };
        db.try_attach(self.this.clone());

        let id = db.id();
        databases.insert(id, db);
        debug!(database = %id, name, "Database created");
        id
    }

    /// Registers an existing database.
    ///
    /// Fails with [`Error::AlreadyOwned`] if the database is attached to a
    /// Pila (this one included), and with [`Error::AlreadyRegistered`] if
    /// its identifier is already taken here.
    pub fn add_database(&self, db: Arc<Database>) -> Result<()> {
        let mut databases = self.databases.lock();
        if db.is_attached() {
            return Err(Error::AlreadyOwned {
                entity: "database",
                owner: "pila",
            });
        }
        if databases.contains_key(&db.id()) {
            return Err(Error::AlreadyRegistered {
                owner: "pila",
                entity: "database",
                id: db.id().to_string(),
            });
        }
        if !db.try_attach(self.this.clone()) {
            return Err(Error::AlreadyOwned {
                entity: "database",
                owner: "pila",
            });
        }

        databases.insert(db.id(), db);
        Ok(())
    }

    /// Detaches and unregisters a database. Returns `false` if it is unknown.
    pub fn remove_database(&self, id: DatabaseId) -> bool {
        let mut databases = self.databases.lock();
        match databases.remove(&id) {
            Some(db) => {
                db.detach();
                debug!(database = %id, "Database removed");
                true
            }
            None => false,
        }
    }

    pub fn get_database(&self, id: DatabaseId) -> Option<Arc<Database>> {
        self.databases.lock().get(&id).cloned()
    }

    pub fn number_of_databases(&self) -> usize {
        self.databases.lock().len()
    }

    /// Summarizes every database.
    ///
    /// The Pila lock is held for the full traversal. The order of
    /// `databases` in the result is unspecified.
    pub fn status(&self) -> Status {
        let databases = self.databases.lock();
        Status {
            number_of_databases: databases.len(),
            databases: databases.values().map(|db| db.status()).collect(),
        }
    }
}
