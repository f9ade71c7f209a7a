//! Mark-and-sweep collection over the arena pool.
//!
//! The caller supplies the complete root set. Anything not reachable from it
//! is reclaimed, so a reference held outside the heap and outside the roots
//! must not be dereferenced after a collection.

use super::heap::Heap;
use crate::runtime::value::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    pub marked: usize,
    pub reclaimed: usize,
    pub arenas: usize,
}

impl Heap {
    /// Whether enough allocation has happened since the last collection.
    pub fn should_collect(&self) -> bool {
        let threshold = if self.collections == 0 {
            self.config().initial_threshold
        } else {
            self.config().threshold
        };
        self.allocated >= threshold
    }

    pub fn collect<I>(&mut self, roots: I) -> CollectStats
    where
        I: IntoIterator<Item = Value>,
    {
        let marked = self.mark(roots);
        let reclaimed = self.sweep();
        self.clear_marks();

        self.allocated = 0;
        self.collections += 1;

        let stats = CollectStats {
            marked,
            reclaimed,
            arenas: self.arenas.len(),
        };
        log::debug!(
            target: "gc",
            "collection #{}: {} live, {} reclaimed, {} arenas",
            self.collections,
            stats.marked,
            stats.reclaimed,
            stats.arenas
        );
        stats
    }

    /// Traces with an explicit worklist so long lists and deep environment
    /// chains do not recurse on the native stack.
    fn mark<I>(&mut self, roots: I) -> usize
    where
        I: IntoIterator<Item = Value>,
    {
        let mut worklist: Vec<Value> = roots.into_iter().collect();
        let mut marked = 0;

        while let Some(value) = worklist.pop() {
            let Some(slot) = self.slot_mut(value) else {
                log::error!(target: "gc", "ignoring stale reference {:?}", value);
                continue;
            };
            if slot.marked {
                continue;
            }
            slot.marked = true;
            marked += 1;
            slot.object.trace(|child| worklist.push(child));
        }

        marked
    }

    fn sweep(&mut self) -> usize {
        let mut reclaimed = 0;
        for arena in &mut self.arenas {
            let dead = arena
                .slots_mut()
                .filter(|(_, slot)| !slot.marked && !slot.object.is_free())
                .map(|(index, _)| index)
                .collect::<Vec<_>>();
            reclaimed += dead.len();
            for index in dead {
                arena.release(index);
            }
        }
        reclaimed
    }

    fn clear_marks(&mut self) {
        for arena in &mut self.arenas {
            for (_, slot) in arena.slots_mut() {
                slot.marked = false;
            }
        }
    }
}
