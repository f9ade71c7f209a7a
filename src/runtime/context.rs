//! The runtime context.
//!
//! All state that a process-wide implementation would keep in globals (the
//! heap, the root set, the symbol table and the singleton values) lives in a
//! [`Runtime`]. Dropping it releases everything at once.

use super::{
    error::{Error, Result},
    symbol::SymbolTable,
    value::{Object, Pair, Value},
};
use crate::gc::{CollectStats, Heap, HeapConfig, Root, RootSet};

#[derive(Debug, Clone, Copy)]
struct Singletons {
    empty_list: Value,
    true_value: Value,
    false_value: Value,
}

/// Interned heads of the special forms, compared by identity.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SpecialForms {
    pub(crate) quote: Value,
    pub(crate) define: Value,
    pub(crate) lambda: Value,
    pub(crate) if_: Value,
}

pub struct Runtime {
    pub(crate) heap: Heap,
    pub(crate) symbols: SymbolTable,
    roots: RootSet,
    singletons: Singletons,
    pub(crate) forms: SpecialForms,
}

impl Runtime {
    pub fn new() -> Result<Self> {
        Self::with_config(HeapConfig::default())
    }

    pub fn with_config(config: HeapConfig) -> Result<Self> {
        let mut heap = Heap::new(config);
        let singletons = Singletons {
            empty_list: heap.allocate(Object::EmptyList)?,
            true_value: heap.allocate(Object::True)?,
            false_value: heap.allocate(Object::False)?,
        };

        let mut symbols = SymbolTable::new();
        let forms = SpecialForms {
            quote: symbols.intern(&mut heap, "quote")?,
            define: symbols.intern(&mut heap, "define")?,
            lambda: symbols.intern(&mut heap, "lambda")?,
            if_: symbols.intern(&mut heap, "if")?,
        };

        Ok(Self {
            heap,
            symbols,
            roots: RootSet::new(),
            singletons,
            forms,
        })
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn roots(&self) -> &RootSet {
        &self.roots
    }

    /// Registers `value` as a root for the lifetime of the returned guard.
    pub fn root(&self, value: Value) -> Root {
        self.roots.register(value)
    }

    pub fn object(&self, value: Value) -> Result<&Object> {
        self.heap.get(value)
    }

    pub fn kind_name(&self, value: Value) -> &'static str {
        self.heap
            .get(value)
            .map_or("stale reference", Object::kind_name)
    }

    pub fn integer(&mut self, n: i64) -> Result<Value> {
        self.heap.allocate(Object::Integer(n))
    }

    pub fn float(&mut self, x: f64) -> Result<Value> {
        self.heap.allocate(Object::Float(x))
    }

    pub fn empty_list(&self) -> Value {
        self.singletons.empty_list
    }

    pub fn true_value(&self) -> Value {
        self.singletons.true_value
    }

    pub fn false_value(&self) -> Value {
        self.singletons.false_value
    }

    pub fn boolean(&self, b: bool) -> Value {
        if b {
            self.true_value()
        } else {
            self.false_value()
        }
    }

    /// Everything except the false singleton is true.
    pub fn is_truthy(&self, value: Value) -> bool {
        value != self.singletons.false_value
    }

    /// Allocates a pair, computing its cached list length from `tail`.
    pub fn cons(&mut self, head: Value, tail: Value) -> Result<Value> {
        let tail_length = self.list_length(tail)?;
        self.heap
            .allocate(Object::Pair(Pair::new(head, tail, tail_length)))
    }

    /// Builds a proper list of `items`.
    pub fn list(&mut self, items: &[Value]) -> Result<Value> {
        items
            .iter()
            .rev()
            .try_fold(self.empty_list(), |tail, &head| self.cons(head, tail))
    }

    /// Proper-list length of `value`: 0 for the empty list, the cached length
    /// for a pair, `None` for anything else.
    pub fn list_length(&self, value: Value) -> Result<Option<usize>> {
        Ok(match self.heap.get(value)? {
            Object::EmptyList => Some(0),
            Object::Pair(pair) => pair.length(),
            _ => None,
        })
    }

    pub fn pair(&self, value: Value) -> Result<&Pair> {
        match self.heap.get(value)? {
            Object::Pair(pair) => Ok(pair),
            other => Err(Error::Type {
                expected: "pair",
                found: other.kind_name(),
            }),
        }
    }

    pub fn car(&self, value: Value) -> Result<Value> {
        self.pair(value).map(Pair::head)
    }

    pub fn cdr(&self, value: Value) -> Result<Value> {
        self.pair(value).map(Pair::tail)
    }

    /// Elements of a proper list, or `None` if `list` is not one.
    pub fn list_to_vec(&self, list: Value) -> Result<Option<Vec<Value>>> {
        let Some(length) = self.list_length(list)? else {
            return Ok(None);
        };
        let mut items = Vec::with_capacity(length);
        let mut cursor = list;
        for _ in 0..length {
            let pair = self.pair(cursor)?;
            items.push(pair.head());
            cursor = pair.tail();
        }
        Ok(Some(items))
    }

    pub fn as_integer(&self, value: Value) -> Result<i64> {
        match self.heap.get(value)? {
            Object::Integer(n) => Ok(*n),
            other => Err(Error::Type {
                expected: "integer",
                found: other.kind_name(),
            }),
        }
    }

    /// Runs a collection if the allocation counter has crossed its threshold.
    pub fn maybe_collect(&mut self) -> Option<CollectStats> {
        if self.heap.should_collect() {
            Some(self.collect())
        } else {
            None
        }
    }

    /// Collects now. Roots are the registered roots, every interned symbol
    /// and the singletons.
    pub fn collect(&mut self) -> CollectStats {
        let mut roots = self.roots.values();
        roots.extend(self.symbols.values());
        roots.extend([
            self.singletons.empty_list,
            self.singletons.true_value,
            self.singletons.false_value,
        ]);
        self.heap.collect(roots)
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        let stats = self.heap.stats();
        log::debug!(
            target: "gc",
            "runtime shutdown: {} arenas, {} live slots, {} allocations, {} collections",
            stats.arenas,
            stats.live,
            stats.allocations,
            stats.collections
        );
        if !self.roots.is_empty() {
            log::warn!(target: "gc", "{} roots still registered at shutdown", self.roots.len());
        }
    }
}
