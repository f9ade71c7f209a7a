//! Lexical environments.
//!
//! An environment is an ordinary heap object: a map from symbol identity to
//! value plus an optional parent, fixed at creation. Closures share the
//! environment they were created in, so environments are kept alive only by
//! reachability like everything else.

use indexmap::IndexMap;

use super::{
    context::Runtime,
    error::{Error, Result},
    value::{Object, Value},
};

#[derive(Debug, Default)]
pub struct Environment {
    bindings: IndexMap<Value, Value>,
    parent: Option<Value>,
}

impl Environment {
    pub fn parent(&self) -> Option<Value> {
        self.parent
    }

    pub fn get(&self, symbol: Value) -> Option<Value> {
        self.bindings.get(&symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub(crate) fn trace(&self, mut visit: impl FnMut(Value)) {
        for (&symbol, &value) in &self.bindings {
            visit(symbol);
            visit(value);
        }
        if let Some(parent) = self.parent {
            visit(parent);
        }
    }
}

impl Runtime {
    /// Allocates an empty environment whose lookups fall back to `parent`.
    pub fn make_environment(&mut self, parent: Option<Value>) -> Result<Value> {
        if let Some(parent) = parent {
            self.environment(parent)?;
        }
        self.heap.allocate(Object::Environment(Environment {
            bindings: IndexMap::new(),
            parent,
        }))
    }

    pub fn environment(&self, env: Value) -> Result<&Environment> {
        match self.heap.get(env)? {
            Object::Environment(frame) => Ok(frame),
            other => Err(Error::Type {
                expected: "environment",
                found: other.kind_name(),
            }),
        }
    }

    /// Binds `symbol` in `env` itself, replacing any existing binding there.
    pub fn bind(&mut self, env: Value, symbol: Value, value: Value) -> Result<()> {
        self.symbol_name(symbol)?;
        match self.heap.get_mut(env)? {
            Object::Environment(frame) => {
                frame.bindings.insert(symbol, value);
                Ok(())
            }
            other => Err(Error::Type {
                expected: "environment",
                found: other.kind_name(),
            }),
        }
    }

    /// Finds the innermost binding of `symbol` visible from `env`.
    pub fn lookup(&self, env: Value, symbol: Value) -> Result<Value> {
        let mut frame = Some(env);
        while let Some(current) = frame {
            let env = self.environment(current)?;
            if let Some(value) = env.get(symbol) {
                return Ok(value);
            }
            frame = env.parent();
        }
        Err(Error::UnboundVariable(self.symbol_name(symbol)?.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_walks_the_parent_chain() {
        let mut rt = Runtime::new().unwrap();
        let global = rt.make_environment(None).unwrap();
        let local = rt.make_environment(Some(global)).unwrap();
        let x = rt.intern("x").unwrap();
        let y = rt.intern("y").unwrap();
        let one = rt.integer(1).unwrap();
        let two = rt.integer(2).unwrap();

        rt.bind(global, x, one).unwrap();
        rt.bind(local, y, two).unwrap();

        assert_eq!(rt.lookup(local, x).unwrap(), one);
        assert_eq!(rt.lookup(local, y).unwrap(), two);
        assert!(matches!(
            rt.lookup(global, y),
            Err(Error::UnboundVariable(name)) if name == "y"
        ));
    }

    #[test]
    fn bind_shadows_without_touching_the_parent() {
        let mut rt = Runtime::new().unwrap();
        let global = rt.make_environment(None).unwrap();
        let local = rt.make_environment(Some(global)).unwrap();
        let x = rt.intern("x").unwrap();
        let outer = rt.integer(1).unwrap();
        let inner = rt.integer(2).unwrap();

        rt.bind(global, x, outer).unwrap();
        rt.bind(local, x, inner).unwrap();
        assert_eq!(rt.lookup(local, x).unwrap(), inner);
        assert_eq!(rt.lookup(global, x).unwrap(), outer);

        let again = rt.integer(3).unwrap();
        rt.bind(local, x, again).unwrap();
        assert_eq!(rt.environment(local).unwrap().len(), 1);
        assert_eq!(rt.lookup(local, x).unwrap(), again);
    }

    #[test]
    fn rejects_wrong_kinds() {
        let mut rt = Runtime::new().unwrap();
        let n = rt.integer(1).unwrap();
        let env = rt.make_environment(None).unwrap();
        assert!(matches!(
            rt.make_environment(Some(n)),
            Err(Error::Type { expected: "environment", .. })
        ));
        assert!(rt.bind(env, n, n).is_err());
        let x = rt.intern("x").unwrap();
        assert!(rt.bind(n, x, n).is_err());
    }

    #[test]
    fn environments_keep_bindings_alive() {
        let mut rt = Runtime::new().unwrap();
        let global = rt.make_environment(None).unwrap();
        let root = rt.root(global);
        let local = rt.make_environment(Some(global)).unwrap();
        let x = rt.intern("x").unwrap();
        let n = rt.integer(5).unwrap();
        rt.bind(global, x, n).unwrap();

        rt.collect();
        assert_eq!(rt.lookup(root.get(), x).unwrap(), n);
        assert!(!rt.heap().is_live(local));
    }
}
