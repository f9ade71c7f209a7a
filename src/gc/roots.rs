//! # The Root Set
//!
//! Values held in Rust locals are invisible to the collector. Before such a
//! value may survive a collection it is registered here, and the returned
//! [`Root`] guard keeps it registered until the guard is dropped. Release is
//! tied to scope exit, so error returns and unwinding unregister as well.
//!
//! The guard owns a slot of the root table rather than pointing at the local
//! variable, which lets it be re-pointed with [`Root::set`] (the evaluator's
//! trampoline does this on every tail call).

use std::{cell::RefCell, fmt, rc::Rc};

use crate::runtime::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("root #{0} is not registered")]
pub struct UnknownRoot(pub usize);

#[derive(Default)]
struct RootTable {
    entries: Vec<Option<Value>>,
    vacant: Vec<usize>,
    live: usize,
}

impl RootTable {
    fn register(&mut self, value: Value) -> usize {
        self.live += 1;
        match self.vacant.pop() {
            Some(id) => {
                self.entries[id] = Some(value);
                id
            }
            None => {
                self.entries.push(Some(value));
                self.entries.len() - 1
            }
        }
    }

    fn unregister(&mut self, id: usize) -> Result<Value, UnknownRoot> {
        let value = self
            .entries
            .get_mut(id)
            .and_then(Option::take)
            .ok_or(UnknownRoot(id))?;
        self.vacant.push(id);
        self.live -= 1;
        Ok(value)
    }

    fn entry(&mut self, id: usize) -> Result<&mut Value, UnknownRoot> {
        self.entries
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(UnknownRoot(id))
    }
}

/// Registry of values referenced from outside the heap.
#[derive(Clone, Default)]
pub struct RootSet {
    table: Rc<RefCell<RootTable>>,
}

impl RootSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, value: Value) -> Root {
        let id = self.table.borrow_mut().register(value);
        Root {
            roots: self.clone(),
            id,
        }
    }

    pub(crate) fn unregister(&self, id: usize) -> Result<Value, UnknownRoot> {
        self.table.borrow_mut().unregister(id)
    }

    pub fn len(&self) -> usize {
        self.table.borrow().live
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of every registered value, in no particular order.
    pub fn values(&self) -> Vec<Value> {
        self.table.borrow().entries.iter().flatten().copied().collect()
    }
}

/// Scoped registration of one value in a [`RootSet`].
pub struct Root {
    roots: RootSet,
    id: usize,
}

impl Root {
    pub fn get(&self) -> Value {
        match self.roots.table.borrow_mut().entry(self.id) {
            Ok(value) => *value,
            Err(err) => inconsistent(err),
        }
    }

    /// Re-points this root, returning the previously rooted value.
    pub fn set(&self, value: Value) -> Value {
        match self.roots.table.borrow_mut().entry(self.id) {
            Ok(slot) => std::mem::replace(slot, value),
            Err(err) => inconsistent(err),
        }
    }
}

impl Drop for Root {
    fn drop(&mut self) {
        if let Err(err) = self.roots.unregister(self.id) {
            inconsistent(err);
        }
    }
}

impl fmt::Debug for Root {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Root(#{})", self.id)
    }
}

#[cold]
fn inconsistent(err: UnknownRoot) -> ! {
    log::error!(target: "gc", "root set corrupted: {}", err);
    panic!("root set corrupted: {err}");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(n: u32) -> Value {
        Value::new(0, n, 0)
    }

    #[test]
    fn guards_unregister_on_drop() {
        let roots = RootSet::new();
        {
            let a = roots.register(value(1));
            let _b = roots.register(value(2));
            assert_eq!(roots.len(), 2);
            assert_eq!(a.get(), value(1));
        }
        assert!(roots.is_empty());
        assert!(roots.values().is_empty());
    }

    #[test]
    fn guards_unregister_on_error_paths() {
        fn fails(roots: &RootSet) -> Result<(), &'static str> {
            let _root = roots.register(value(3));
            Err::<(), _>("boom")?;
            Ok(())
        }

        let roots = RootSet::new();
        assert!(fails(&roots).is_err());
        assert!(roots.is_empty());
    }

    #[test]
    fn set_repoints_the_root() {
        let roots = RootSet::new();
        let root = roots.register(value(1));
        assert_eq!(root.set(value(2)), value(1));
        assert_eq!(roots.values(), vec![value(2)]);
    }

    #[test]
    fn removal_order_is_free() {
        let roots = RootSet::new();
        let a = roots.register(value(1));
        let b = roots.register(value(2));
        let c = roots.register(value(3));
        drop(b);
        drop(a);
        let d = roots.register(value(4));
        let mut values = roots.values();
        values.sort_by_key(|v| v.index());
        assert_eq!(values, vec![value(3), value(4)]);
        drop(c);
        drop(d);
        assert!(roots.is_empty());
    }

    #[test]
    fn unknown_removal_is_reported() {
        let roots = RootSet::new();
        assert_eq!(roots.unregister(5), Err(UnknownRoot(5)));

        let root = roots.register(value(1));
        assert_eq!(roots.unregister(0), Ok(value(1)));
        assert_eq!(roots.unregister(0), Err(UnknownRoot(0)));
        // The guard now refers to a vacated entry.
        std::mem::forget(root);
    }

    #[test]
    #[should_panic(expected = "root set corrupted")]
    fn dropping_an_unregistered_guard_is_fatal() {
        let roots = RootSet::new();
        let root = roots.register(value(1));
        roots.unregister(0).unwrap();
        drop(root);
    }
}
