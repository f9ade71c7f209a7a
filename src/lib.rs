//! `con` is a small list-processing language runtime: arena-allocated values,
//! a mark-and-sweep collector with explicit roots, lexical environments and a
//! tail-call-safe evaluator.

pub mod gc;
pub mod interpreter;
pub mod options;
pub mod runtime;

pub mod prelude {
    pub use crate::gc::{CollectStats, HeapConfig, HeapStats, Root, RootSet};
    pub use crate::interpreter::Interpreter;
    pub use crate::runtime::{
        environment::Environment,
        fmt::{pretty, to_string},
        reader::Reader,
        value::{Builtin, BuiltinFn, Closure, Pair},
        Error, Object, Result, Runtime, Step, Value,
    };
}

pub use prelude::{Error, Interpreter, Result, Runtime, Value};
