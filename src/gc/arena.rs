//! Fixed-capacity slab of value slots.
//!
//! Unused slots are tracked with a stack of indices: allocation pops, the
//! sweeper pushes. Order of reuse is unspecified.

use crate::runtime::value::Object;

pub(crate) struct Slot {
    pub(crate) generation: u32,
    pub(crate) marked: bool,
    pub(crate) object: Object,
}

impl Slot {
    fn vacant() -> Self {
        Self {
            generation: 0,
            marked: false,
            object: Object::Free,
        }
    }
}

pub struct Arena {
    slots: Box<[Slot]>,
    free: Vec<u32>,
}

impl Arena {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0 && capacity <= u32::MAX as usize);
        let slots = (0..capacity).map(|_| Slot::vacant()).collect();
        // Reversed so that the lowest index is handed out first.
        let free = (0..capacity as u32).rev().collect();
        Self { slots, free }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn live(&self) -> usize {
        self.capacity() - self.available()
    }

    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// Stores `object` in a free slot and returns `(index, generation)`, or
    /// hands the object back when the arena is full.
    pub(crate) fn allocate(&mut self, object: Object) -> Result<(u32, u32), Object> {
        let Some(index) = self.free.pop() else {
            return Err(object);
        };
        let slot = &mut self.slots[index as usize];
        debug_assert!(slot.object.is_free());
        slot.object = object;
        slot.marked = false;
        Ok((index, slot.generation))
    }

    pub(crate) fn slot(&self, index: u32) -> Option<&Slot> {
        self.slots.get(index as usize)
    }

    pub(crate) fn slot_mut(&mut self, index: u32) -> Option<&mut Slot> {
        self.slots.get_mut(index as usize)
    }

    pub(crate) fn slots_mut(&mut self) -> impl Iterator<Item = (u32, &mut Slot)> {
        self.slots
            .iter_mut()
            .enumerate()
            .map(|(index, slot)| (index as u32, slot))
    }

    /// Drops the slot's object, invalidates outstanding handles and makes the
    /// slot available again.
    pub(crate) fn release(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        if slot.object.is_free() {
            return;
        }
        slot.object = Object::Free;
        slot.marked = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocates_until_full() {
        let mut arena = Arena::new(2);
        assert_eq!(arena.allocate(Object::Integer(1)).ok(), Some((0, 0)));
        assert_eq!(arena.allocate(Object::Integer(2)).ok(), Some((1, 0)));
        assert!(arena.is_full());
        assert!(matches!(
            arena.allocate(Object::Integer(3)),
            Err(Object::Integer(3))
        ));
    }

    #[test]
    fn release_bumps_generation_and_recycles() {
        let mut arena = Arena::new(1);
        let (index, generation) = arena.allocate(Object::Integer(1)).ok().unwrap();
        arena.release(index);
        assert_eq!(arena.live(), 0);

        let (again, next) = arena.allocate(Object::Float(2.0)).ok().unwrap();
        assert_eq!(again, index);
        assert_eq!(next, generation + 1);
    }

    #[test]
    fn releasing_a_free_slot_is_a_no_op() {
        let mut arena = Arena::new(3);
        arena.release(1);
        assert_eq!(arena.available(), 3);
    }
}
