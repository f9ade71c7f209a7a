pub mod builtins;
pub mod context;
pub mod environment;
pub mod error;
pub mod eval;
pub mod fmt;
pub mod reader;
pub mod symbol;
pub mod value;

pub use context::Runtime;
pub use error::{Error, Result};
pub use eval::Step;
pub use value::{Object, Value};
