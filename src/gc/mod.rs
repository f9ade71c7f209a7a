//! Memory management: the arena pool, the root set and the mark-and-sweep
//! collector.

pub mod arena;
pub mod collector;
pub mod heap;
pub mod roots;

pub use collector::CollectStats;
pub use heap::{Heap, HeapConfig, HeapStats};
pub use roots::{Root, RootSet};
