//! Generation-checked arena
//!
//! Objects of the async subsystem refer to each other by index instead of by
//! pointer. Every slot carries a generation counter that is bumped when the
//! slot is vacated, so an index kept past the death of its object is
//! detected instead of silently aliasing a newer object.

use alloc::vec::Vec;

/// Index into an [`Arena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Index {
    slot: u32,
    generation: u32,
}

impl Index {
    pub const fn slot(self) -> u32 {
        self.slot
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

enum Slot<T> {
    Occupied { generation: u32, value: T },
    Vacant { generation: u32, next_free: Option<u32> },
}

/// Slot storage with a free list, reusing vacated slots first.
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free_head: Option<u32>,
    len: usize,
}

impl<T> Arena<T> {
    /// Create an empty arena
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Insert a value, returning its index
    pub fn insert(&mut self, value: T) -> Index {
        self.len += 1;
        match self.free_head {
            Some(slot) => {
                let entry = &mut self.slots[slot as usize];
                let (generation, next_free) = match *entry {
                    Slot::Vacant { generation, next_free } => (generation, next_free),
                    Slot::Occupied { .. } => unreachable!("free list points at an occupied slot"),
                };
                self.free_head = next_free;
                *entry = Slot::Occupied { generation, value };
                Index { slot, generation }
            }
            None => {
                let slot = self.slots.len() as u32;
                self.slots.push(Slot::Occupied { generation: 0, value });
                Index { slot, generation: 0 }
            }
        }
    }

    /// Remove the value at `index`, if it is still alive
    pub fn remove(&mut self, index: Index) -> Option<T> {
        if !self.contains(index) {
            return None;
        }
        let next_generation = index.generation.wrapping_add(1);
        let vacant = Slot::Vacant {
            generation: next_generation,
            next_free: self.free_head,
        };
        let old = core::mem::replace(&mut self.slots[index.slot as usize], vacant);
        self.free_head = Some(index.slot);
        self.len -= 1;
        match old {
            Slot::Occupied { value, .. } => Some(value),
            Slot::Vacant { .. } => None,
        }
    }

    pub fn contains(&self, index: Index) -> bool {
        self.get(index).is_some()
    }

    pub fn get(&self, index: Index) -> Option<&T> {
        match self.slots.get(index.slot as usize) {
            Some(Slot::Occupied { generation, value }) if *generation == index.generation => Some(value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, index: Index) -> Option<&mut T> {
        match self.slots.get_mut(index.slot as usize) {
            Some(Slot::Occupied { generation, value }) if *generation == index.generation => Some(value),
            _ => None,
        }
    }

    /// Iterate over live entries in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Index, &T)> {
        self.slots.iter().enumerate().filter_map(|(slot, entry)| match entry {
            Slot::Occupied { generation, value } => Some((
                Index {
                    slot: slot as u32,
                    generation: *generation,
                },
                value,
            )),
            Slot::Vacant { .. } => None,
        })
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
