//! Heap value representation.
//!
//! A [`Value`] is a generation-checked handle to an arena slot; the slot holds
//! an [`Object`]. Every datum the runtime manipulates, numbers included, lives
//! in a slot, so a `Value` is always just three small integers and is `Copy`.

use std::fmt;

use super::{context::Runtime, environment::Environment, error::Result};

/// Handle to a heap slot: `(arena, slot index, slot generation)`.
///
/// Equality is identity. A handle whose slot was reclaimed (and possibly
/// reused) no longer matches the slot's generation and is rejected by
/// [`Heap::get`](crate::gc::heap::Heap::get).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Value {
    arena: u32,
    index: u32,
    generation: u32,
}

impl Value {
    pub(crate) const fn new(arena: u32, index: u32, generation: u32) -> Self {
        Self {
            arena,
            index,
            generation,
        }
    }

    pub const fn arena(self) -> u32 {
        self.arena
    }

    pub const fn index(self) -> u32 {
        self.index
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({}:{}#{})", self.arena, self.index, self.generation)
    }
}

/// Signature of a native function. `args` is a proper list of already
/// evaluated arguments.
pub type BuiltinFn = fn(&mut Runtime, Value) -> Result<Value>;

/// Cons cell. Head and tail are set once at construction.
#[derive(Debug, Clone, Copy)]
pub struct Pair {
    head: Value,
    tail: Value,
    length: Option<usize>,
}

impl Pair {
    /// `tail_length` is the proper-list length of `tail` (0 for the empty
    /// list) or `None` when `tail` does not end in the empty list.
    pub(crate) fn new(head: Value, tail: Value, tail_length: Option<usize>) -> Self {
        Self {
            head,
            tail,
            length: tail_length.map(|n| n + 1),
        }
    }

    pub fn head(&self) -> Value {
        self.head
    }

    pub fn tail(&self) -> Value {
        self.tail
    }

    /// Number of elements when this pair starts a proper list.
    pub fn length(&self) -> Option<usize> {
        self.length
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Closure {
    pub params: Value,
    /// Non-empty proper list of body expressions.
    pub body: Value,
    pub env: Value,
    pub name: Option<Value>,
}

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

#[derive(Debug)]
pub enum Object {
    Integer(i64),
    Float(f64),
    Pair(Pair),
    EmptyList,
    Symbol(Box<str>),
    True,
    False,
    Closure(Closure),
    Builtin(Builtin),
    Environment(Environment),
    /// Unused slot. Never reachable through a live handle.
    Free,
}

impl Object {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Object::Integer(_) => "integer",
            Object::Float(_) => "float",
            Object::Pair(_) => "pair",
            Object::EmptyList => "empty list",
            Object::Symbol(_) => "symbol",
            Object::True | Object::False => "boolean",
            Object::Closure(_) => "closure",
            Object::Builtin(_) => "builtin",
            Object::Environment(_) => "environment",
            Object::Free => "free slot",
        }
    }

    pub fn is_free(&self) -> bool {
        matches!(self, Object::Free)
    }

    /// Calls `visit` with every heap reference held by this object.
    pub fn trace(&self, mut visit: impl FnMut(Value)) {
        match self {
            Object::Pair(pair) => {
                visit(pair.head);
                visit(pair.tail);
            }
            Object::Closure(closure) => {
                visit(closure.params);
                visit(closure.body);
                visit(closure.env);
                if let Some(name) = closure.name {
                    visit(name);
                }
            }
            Object::Environment(env) => env.trace(visit),
            Object::Integer(_)
            | Object::Float(_)
            | Object::EmptyList
            | Object::Symbol(_)
            | Object::True
            | Object::False
            | Object::Builtin(_)
            | Object::Free => {}
        }
    }
}
