use bevy::prelude::*;

use super::{EntityList, Tier};

/// One heap entry: where the entity sits in the frame's entity list, and the
/// vertical position it had when the heap was built.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeapSlot {
    pub index: usize,
    pub key: i32,
}

/// Binary min-heap over one tier's entities, keyed by vertical position.
///
/// The backing buffer is only reallocated when the live entity count differs
/// from the count seen at the previous rebuild. Identity and key changes do not
/// trigger a reallocation, but the contents are rebuilt on every call anyway.
#[derive(Debug, Default)]
pub struct TierHeap {
    slots: Vec<HeapSlot>,
    last_count: Option<usize>,
    reallocations: usize,
}

impl TierHeap {
    pub(super) fn rebuild<L: EntityList + ?Sized>(&mut self, tier: Tier, entities: &L) {
        let count = entities.count();
        if self.last_count != Some(count) {
            trace!(
                "Reallocating {:?} heap: {:?} -> {} entities",
                tier,
                self.last_count,
                count
            );
            self.slots = Vec::with_capacity(count);
            self.last_count = Some(count);
            self.reallocations += 1;
        }

        self.slots.clear();
        for index in 0..count {
            let key = entities.key_at(index);
            if tier.admits(&key) {
                self.push(HeapSlot {
                    index,
                    key: key.vertical_position,
                });
            }
        }
    }

    fn push(&mut self, slot: HeapSlot) {
        self.slots.push(slot);
        let mut pos = self.slots.len() - 1;
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.slots[pos].key < self.slots[parent].key {
                self.slots.swap(pos, parent);
                pos = parent;
            } else {
                break;
            }
        }
    }

    /// Remove the entry with the lowest key and return its entity index.
    pub(super) fn pop(&mut self) -> Option<usize> {
        if self.slots.is_empty() {
            return None;
        }
        // Moves the last slot into the root.
        let root = self.slots.swap_remove(0);

        let len = self.slots.len();
        let mut pos = 0;
        loop {
            let left = pos * 2 + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let mut child = left;
            if right < len && self.slots[right].key < self.slots[left].key {
                child = right;
            }
            if self.slots[pos].key > self.slots[child].key {
                self.slots.swap(pos, child);
                pos = child;
            } else {
                break;
            }
        }

        Some(root.index)
    }

    /// Forget the recorded entity count so the next rebuild reallocates.
    pub(super) fn invalidate(&mut self) {
        self.last_count = None;
    }

    pub fn slots(&self) -> &[HeapSlot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// How many times the backing buffer has been replaced.
    pub fn reallocations(&self) -> usize {
        self.reallocations
    }

    /// Entity count recorded at the last reallocation.
    pub fn recorded_count(&self) -> Option<usize> {
        self.last_count
    }

    /// Every parent key is <= both of its children's keys.
    pub fn is_valid_heap(&self) -> bool {
        (1..self.slots.len()).all(|i| self.slots[(i - 1) / 2].key <= self.slots[i].key)
    }
}
