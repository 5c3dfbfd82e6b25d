//! LIFO stacks of opaque values.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};

use super::status::StackStatus;
use super::{Database, StackId, Value};

/// A named LIFO sequence of values.
///
/// The element sequence and the back-reference to the owning [`Database`]
/// share one lock. The back-reference is weak: a stack never keeps its
/// database alive.
#[derive(Debug)]
pub struct Stack {
    id: StackId,
    name: String,
    inner: Mutex<StackInner>,
}

#[derive(Debug, Default)]
struct StackInner {
    // top of the stack is the end of the vec
    elements: Vec<Value>,
    database: Option<Weak<Database>>,
}

impl Stack {
    /// Creates a detached, empty stack with a fresh identifier.
    pub fn new(name: impl Into<String>) -> Arc<Self> {
        Self::with_id(StackId::new(), name)
    }

    pub(crate) fn with_id(id: StackId, name: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id,
            name: name.into(),
            inner: Mutex::new(StackInner::default()),
        })
    }

    pub fn id(&self) -> StackId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pushes a value onto the top of the stack.
    pub fn push(&self, value: impl Into<Value>) {
        self.inner.lock().elements.push(value.into());
    }

    /// Removes and returns the top value, or `None` if the stack is empty.
    pub fn pop(&self) -> Option<Value> {
        self.inner.lock().elements.pop()
    }

    /// Returns a copy of the top value without removing it.
    pub fn peek(&self) -> Option<Value> {
        self.inner.lock().elements.last().cloned()
    }

    pub fn size(&self) -> usize {
        self.inner.lock().elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().elements.is_empty()
    }

    /// Drops every element.
    pub fn flush(&self) {
        self.inner.lock().elements.clear();
    }

    /// Returns the owning database, if the stack is attached to a live one.
    pub fn database(&self) -> Option<Arc<Database>> {
        self.inner.lock().database.as_ref().and_then(Weak::upgrade)
    }

    pub fn is_attached(&self) -> bool {
        Self::owned(&self.inner.lock())
    }

    pub fn status(&self) -> StackStatus {
        let inner = self.inner.lock();
        StackStatus {
            id: self.id.to_string(),
            name: self.name.clone(),
            peek: inner.elements.last().cloned().unwrap_or_default(),
            size: inner.elements.len(),
        }
    }

    /// Sets the back-reference unless the stack is already owned.
    /// Returns `false` when it was owned.
    pub(super) fn try_attach(&self, database: Weak<Database>) -> bool {
        let mut inner = self.inner.lock();
        if Self::owned(&inner) {
            return false;
        }
        inner.database = Some(database);
        true
    }

    pub(super) fn detach(&self) {
        self.inner.lock().database = None;
    }

    // A back-reference to a database that no longer exists does not count.
    fn owned(inner: &StackInner) -> bool {
        inner
            .database
            .as_ref()
            .is_some_and(|db| db.strong_count() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifo_order() {
        let stack = Stack::new("lifo");
        let values: Vec<Value> = vec![1.into(), "two".into(), true.into(), Value::Null];
        for v in &values {
            stack.push(v.clone());
        }

        for expected in values.iter().rev() {
            assert_eq!(stack.pop().as_ref(), Some(expected));
        }
        assert_eq!(stack.pop(), None);
    }

    #[test]
    fn test_size_tracks_pushes_and_pops() {
        let stack = Stack::new("size");
        for i in 0..7 {
            stack.push(i);
        }
        stack.pop();
        stack.pop();
        assert_eq!(stack.size(), 5);
    }

    #[test]
    fn test_peek_does_not_mutate() {
        let stack = Stack::new("peek");
        assert_eq!(stack.peek(), None);

        stack.push("top");
        assert_eq!(stack.peek(), Some(Value::from("top")));
        assert_eq!(stack.peek(), Some(Value::from("top")));
        assert_eq!(stack.size(), 1);
    }

    #[test]
    fn test_pop_on_empty_is_not_an_error() {
        let stack = Stack::new("empty");
        assert_eq!(stack.pop(), None);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_flush() {
        let stack = Stack::new("flush");
        stack.push(1);
        stack.push(2);
        stack.flush();
        assert_eq!(stack.size(), 0);
        assert_eq!(stack.peek(), None);
    }

    #[test]
    fn test_status_reports_top_and_size() {
        let stack = Stack::new("status");
        assert_eq!(stack.status().peek, Value::Null);

        stack.push("a");
        stack.push("b");
        let status = stack.status();
        assert_eq!(status.id, stack.id().to_string());
        assert_eq!(status.name, "status");
        assert_eq!(status.peek, Value::from("b"));
        assert_eq!(status.size, 2);
    }

    #[test]
    fn test_new_stack_is_detached() {
        let stack = Stack::new("detached");
        assert!(!stack.is_attached());
        assert!(stack.database().is_none());
    }
}
