//! The arena pool.

use super::arena::{Arena, Slot};
use crate::runtime::{
    error::{Error, Result},
    value::{Object, Value},
};

/// Sizing and pacing of the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapConfig {
    /// Slots per arena.
    pub arena_capacity: usize,
    /// Allocations before the first collection.
    pub initial_threshold: usize,
    /// Allocations between subsequent collections.
    pub threshold: usize,
    /// Upper bound on the number of arenas; `None` grows without limit.
    pub max_arenas: Option<usize>,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            arena_capacity: 4096,
            initial_threshold: 10_000,
            threshold: 100_000,
            max_arenas: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    pub arenas: usize,
    pub capacity: usize,
    pub live: usize,
    pub allocations: u64,
    pub collections: usize,
}

pub struct Heap {
    pub(crate) arenas: Vec<Arena>,
    config: HeapConfig,
    /// Arena that served the last allocation.
    current: usize,
    /// Allocations since the last collection.
    pub(crate) allocated: usize,
    pub(crate) allocations: u64,
    pub(crate) collections: usize,
}

impl Heap {
    pub fn new(config: HeapConfig) -> Self {
        assert!(config.arena_capacity > 0, "arena capacity must be non-zero");
        Self {
            arenas: Vec::new(),
            config,
            current: 0,
            allocated: 0,
            allocations: 0,
            collections: 0,
        }
    }

    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    /// Places `object` in a free slot, growing the pool when every arena is
    /// full.
    pub fn allocate(&mut self, object: Object) -> Result<Value> {
        debug_assert!(!object.is_free());
        let arena = match self.arena_with_space() {
            Some(arena) => arena,
            None => self.grow()?,
        };

        let (index, generation) = self.arenas[arena]
            .allocate(object)
            .map_err(|_| self.exhausted())?;
        self.current = arena;
        self.allocated += 1;
        self.allocations += 1;
        Ok(Value::new(arena as u32, index, generation))
    }

    fn arena_with_space(&self) -> Option<usize> {
        if self
            .arenas
            .get(self.current)
            .is_some_and(|arena| !arena.is_full())
        {
            return Some(self.current);
        }
        self.arenas.iter().position(|arena| !arena.is_full())
    }

    fn grow(&mut self) -> Result<usize> {
        if let Some(max) = self.config.max_arenas {
            if self.arenas.len() >= max {
                log::error!(target: "alloc", "heap limit of {} arenas reached", max);
                return Err(self.exhausted());
            }
        }
        self.arenas.push(Arena::new(self.config.arena_capacity));
        log::info!(
            target: "alloc",
            "added arena #{} ({} slots total)",
            self.arenas.len() - 1,
            self.arenas.len() * self.config.arena_capacity
        );
        Ok(self.arenas.len() - 1)
    }

    fn exhausted(&self) -> Error {
        Error::AllocatorExhausted {
            arenas: self.arenas.len(),
            capacity: self.config.arena_capacity,
        }
    }

    pub(crate) fn slot(&self, value: Value) -> Option<&Slot> {
        self.arenas
            .get(value.arena() as usize)?
            .slot(value.index())
            .filter(|slot| slot.generation == value.generation() && !slot.object.is_free())
    }

    pub(crate) fn slot_mut(&mut self, value: Value) -> Option<&mut Slot> {
        self.arenas
            .get_mut(value.arena() as usize)?
            .slot_mut(value.index())
            .filter(|slot| slot.generation == value.generation() && !slot.object.is_free())
    }

    /// Dereferences a handle. Fails if the slot was reclaimed since the handle
    /// was issued.
    pub fn get(&self, value: Value) -> Result<&Object> {
        self.slot(value)
            .map(|slot| &slot.object)
            .ok_or(Error::StaleHandle {
                arena: value.arena(),
                index: value.index(),
            })
    }

    pub fn get_mut(&mut self, value: Value) -> Result<&mut Object> {
        self.slot_mut(value)
            .map(|slot| &mut slot.object)
            .ok_or(Error::StaleHandle {
                arena: value.arena(),
                index: value.index(),
            })
    }

    pub fn is_live(&self, value: Value) -> bool {
        self.slot(value).is_some()
    }

    pub fn live(&self) -> usize {
        self.arenas.iter().map(Arena::live).sum()
    }

    pub fn stats(&self) -> HeapStats {
        HeapStats {
            arenas: self.arenas.len(),
            capacity: self.arenas.len() * self.config.arena_capacity,
            live: self.live(),
            allocations: self.allocations,
            collections: self.collections,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small(max_arenas: Option<usize>) -> Heap {
        Heap::new(HeapConfig {
            arena_capacity: 2,
            max_arenas,
            ..HeapConfig::default()
        })
    }

    #[test]
    fn grows_on_demand() {
        let mut heap = small(None);
        let values = (0..5)
            .map(|n| heap.allocate(Object::Integer(n)).unwrap())
            .collect::<Vec<_>>();

        assert_eq!(heap.stats().arenas, 3);
        assert_eq!(heap.live(), 5);
        for (n, value) in values.iter().enumerate() {
            assert!(matches!(heap.get(*value), Ok(Object::Integer(i)) if *i == n as i64));
        }
    }

    #[test]
    fn bounded_pool_reports_exhaustion() {
        let mut heap = small(Some(1));
        heap.allocate(Object::Integer(1)).unwrap();
        heap.allocate(Object::Integer(2)).unwrap();
        assert_eq!(
            heap.allocate(Object::Integer(3)),
            Err(Error::AllocatorExhausted {
                arenas: 1,
                capacity: 2
            })
        );
    }

    #[test]
    fn counts_allocations() {
        let mut heap = small(None);
        heap.allocate(Object::True).unwrap();
        heap.allocate(Object::False).unwrap();
        assert_eq!(heap.allocated, 2);
        assert_eq!(heap.stats().allocations, 2);
    }

    #[test]
    fn stale_handles_are_rejected() {
        let mut heap = small(None);
        let value = heap.allocate(Object::Integer(7)).unwrap();
        heap.arenas[0].release(value.index());
        assert!(!heap.is_live(value));
        assert!(matches!(heap.get(value), Err(Error::StaleHandle { .. })));

        let reused = heap.allocate(Object::Integer(8)).unwrap();
        assert_eq!(reused.index(), value.index());
        assert!(heap.get(value).is_err());
        assert!(matches!(heap.get(reused), Ok(Object::Integer(8))));
    }
}
