//! Databases: named collections of stacks.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::debug;

use super::status::{DatabaseStatus, StacksStatus};
use super::{DatabaseId, Pila, Stack, StackId};
use crate::error::{Error, Result};

/// A named container of [`Stack`]s keyed by [`StackId`].
///
/// The stack map and the back-reference to the owning [`Pila`] are guarded
/// by the same lock. When a stack is registered or removed the database lock
/// is taken first and the stack lock second.
#[derive(Debug)]
pub struct Database {
    id: DatabaseId,
    name: String,
    this: Weak<Database>,
    inner: Mutex<DatabaseInner>,
}

#[derive(Debug, Default)]
struct DatabaseInner {
    stacks: HashMap<StackId, Arc<Stack>>,
    pila: Option<Weak<Pila>>,
}

impl Database {
    /// Creates a detached, empty database with a fresh identifier.
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Self::with_id(DatabaseId::new(), name)
    }

    pub(crate) fn with_id(id: DatabaseId, name: impl Into<String>) -> Arc<Self> {
        let name = name.into();
        Arc::new_cyclic(|this| Self {
            id,
            name,
            this: this.clone(),
            inner: Mutex::new(DatabaseInner::default()),
        })
    }

    pub fn id(&self) -> DatabaseId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates a stack owned by this database and returns its identifier.
    pub fn create_stack(&self, name: &str) -> StackId {
        let mut inner = self.inner.lock();
        let stack = loop {
            let stack = Stack::new(name);
            if !inner.stacks.contains_key(&stack.id()) {
                break stack;
            }
        };
        stack.try_attach(self.this.clone());

        let id = stack.id();
        inner.stacks.insert(id, stack);
        debug!(database = %self.id, stack = %id, name, "Stack created");
        id
    }

    /// Registers an existing, detached stack.
    pub fn add_stack(&self, stack: Arc<Stack>) -> Result<()> {
        let mut inner = self.inner.lock();
        if stack.is_attached() {
            return Err(Error::AlreadyOwned {
                entity: "stack",
                owner: "database",
            });
        }
        if inner.stacks.contains_key(&stack.id()) {
            return Err(Error::AlreadyRegistered {
                owner: "database",
                entity: "stack",
                id: stack.id().to_string(),
            });
        }
        if !stack.try_attach(self.this.clone()) {
            return Err(Error::AlreadyOwned {
                entity: "stack",
                owner: "database",
            });
        }

        inner.stacks.insert(stack.id(), stack);
        Ok(())
    }

    /// Detaches and unregisters a stack. Returns `false` if it is unknown.
    pub fn remove_stack(&self, id: StackId) -> bool {
        let mut inner = self.inner.lock();
        match inner.stacks.remove(&id) {
            Some(stack) => {
                stack.detach();
                debug!(database = %self.id, stack = %id, "Stack removed");
                true
            }
            None => false,
        }
    }

    pub fn get_stack(&self, id: StackId) -> Option<Arc<Stack>> {
        self.inner.lock().stacks.get(&id).cloned()
    }

    pub fn number_of_stacks(&self) -> usize {
        self.inner.lock().stacks.len()
    }

    /// Returns the owning pila, if the database is attached to a live one.
    pub fn pila(&self) -> Option<Arc<Pila>> {
        self.inner.lock().pila.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_attached(&self) -> bool {
        Self::owned(&self.inner.lock())
    }

    pub fn status(&self) -> DatabaseStatus {
        DatabaseStatus {
            id: self.id.to_string(),
            name: self.name.clone(),
            number_of_stacks: self.number_of_stacks(),
        }
    }

    /// Status of every stack, each read under its own lock.
    pub fn stacks_status(&self) -> StacksStatus {
        let inner = self.inner.lock();
        StacksStatus {
            stacks: inner.stacks.values().map(|stack| stack.status()).collect(),
        }
    }

    pub(super) fn try_attach(&self, pila: Weak<Pila>) -> bool {
        let mut inner = self.inner.lock();
        if Self::owned(&inner) {
            return false;
        }
        inner.pila = Some(pila);
        true
    }

    pub(super) fn detach(&self) {
        self.inner.lock().pila = None;
    }

    fn owned(inner: &DatabaseInner) -> bool {
        inner.pila.as_ref().is_some_and(|p| p.strong_count() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    #[test]
    fn test_create_stack_sets_back_reference() {
        let db = Database::new("db");
        let id = db.create_stack("s");

        let stack = db.get_stack(id).unwrap();
        assert_eq!(stack.name(), "s");
        assert!(stack.is_attached());
        assert!(Arc::ptr_eq(&stack.database().unwrap(), &db));
    }

    #[test]
    fn test_add_stack_twice() {
        let db = Database::new("db");
        let stack = Stack::new("s");

        db.add_stack(stack.clone()).unwrap();
        let err = db.add_stack(stack.clone()).unwrap_err();
        assert!(matches!(err, Error::AlreadyOwned { .. }));
        assert_eq!(db.number_of_stacks(), 1);
    }

    #[test]
    fn test_add_stack_owned_elsewhere() {
        let first = Database::new("first");
        let second = Database::new("second");
        let id = first.create_stack("s");
        let stack = first.get_stack(id).unwrap();

        assert!(matches!(
            second.add_stack(stack),
            Err(Error::AlreadyOwned { .. })
        ));
        assert_eq!(second.number_of_stacks(), 0);
    }

    #[test]
    fn test_remove_stack_detaches() {
        let db = Database::new("db");
        let id = db.create_stack("s");
        let stack = db.get_stack(id).unwrap();

        assert!(db.remove_stack(id));
        assert!(!stack.is_attached());
        assert!(db.get_stack(id).is_none());
        assert!(!db.remove_stack(id));

        // a detached stack can be attached again
        db.add_stack(stack).unwrap();
        assert!(db.get_stack(id).is_some());
    }

    #[test]
    fn test_stack_back_reference_does_not_keep_database_alive() {
        let db = Database::new("db");
        let id = db.create_stack("s");
        let stack = db.get_stack(id).unwrap();

        drop(db);
        assert!(stack.database().is_none());
        assert!(!stack.is_attached());
    }

    #[test]
    fn test_status() {
        let db = Database::new("db");
        db.create_stack("a");
        db.create_stack("b");

        let status = db.status();
        assert_eq!(status.id, db.id().to_string());
        assert_eq!(status.name, "db");
        assert_eq!(status.number_of_stacks, 2);

        let mut names: Vec<_> = db
            .stacks_status()
            .stacks
            .into_iter()
            .map(|s| s.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_add_stack_with_taken_id() {
        let db = Database::new("db");
        let id = db.create_stack("original");
        let impostor = Stack::with_id(id, "impostor");

        let err = db.add_stack(impostor.clone()).unwrap_err();
        assert_eq!(
            err,
            Error::AlreadyRegistered {
                owner: "database",
                entity: "stack",
                id: id.to_string(),
            }
        );
        assert!(!impostor.is_attached());
        assert_eq!(db.get_stack(id).unwrap().name(), "original");
    }

    #[test]
    fn test_pila_status_keeps_registry_locked_while_reading_databases() {
        let pila = Pila::new();
        let db = pila.get_database(pila.create_database("busy")).unwrap();

        let held = db.inner.lock();
        thread::scope(|s| {
            let reader = s.spawn(|| pila.status());

            // wait until the reader owns the registry lock
            let deadline = Instant::now() + Duration::from_secs(5);
            while pila.databases.try_lock().is_some() {
                assert!(Instant::now() < deadline, "status never locked the registry");
                thread::yield_now();
            }

            // parked on the database lock, the registry must stay locked
            thread::sleep(Duration::from_millis(50));
            assert!(pila.databases.try_lock().is_none());
            assert!(!reader.is_finished());

            drop(held);
            let status = reader.join().unwrap();
            assert_eq!(status.number_of_databases, 1);
            assert_eq!(status.databases[0].name, "busy");
        });
    }
}
