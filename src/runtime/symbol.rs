use indexmap::IndexMap;

use super::{
    context::Runtime,
    error::{Error, Result},
    value::{Object, Value},
};
use crate::gc::Heap;

/// Interning table. Every symbol it hands out stays alive for as long as the
/// table does; the collector treats its contents as roots.
#[derive(Default)]
pub struct SymbolTable {
    symbols: IndexMap<Box<str>, Value>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, heap: &mut Heap, text: &str) -> Result<Value> {
        if let Some(symbol) = self.symbols.get(text) {
            return Ok(*symbol);
        }
        let symbol = heap.allocate(Object::Symbol(text.into()))?;
        self.symbols.insert(text.into(), symbol);
        Ok(symbol)
    }

    pub fn get(&self, text: &str) -> Option<Value> {
        self.symbols.get(text).copied()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        self.symbols.values().copied()
    }
}

impl Runtime {
    /// Returns the unique symbol spelled `text`.
    pub fn intern(&mut self, text: &str) -> Result<Value> {
        self.symbols.intern(&mut self.heap, text)
    }

    pub fn symbol_name(&self, symbol: Value) -> Result<&str> {
        match self.heap.get(symbol)? {
            Object::Symbol(name) => Ok(&**name),
            other => Err(Error::Type {
                expected: "symbol",
                found: other.kind_name(),
            }),
        }
    }
}
