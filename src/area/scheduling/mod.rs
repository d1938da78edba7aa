//! Per-frame depth ordering of area entities.
//!
//! Every frame the area asks the [`FrameScheduler`] for each tier in turn:
//! `generate_queue` builds a min-heap over the tier's entities keyed by vertical
//! position, then `get_root` is called until it returns `None`. Entities come
//! out top of screen first, which is the order they have to be updated and
//! composited in for occlusion to look right.

use bevy::prelude::*;

mod heap;


pub use heap::{HeapSlot, TierHeap};

/// What the scheduler needs to know about one entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EntityKey {
    /// Screen-space y; lower values are processed first.
    pub vertical_position: i32,
    pub dormant: bool,
}

/// Anything that can present itself to the scheduler.
pub trait Scheduled {
    fn entity_key(&self) -> EntityKey;
}

impl Scheduled for EntityKey {
    fn entity_key(&self) -> EntityKey {
        *self
    }
}

/// Read-only view of the live entity list for one frame.
pub trait EntityList {
    fn count(&self) -> usize;
    fn key_at(&self, index: usize) -> EntityKey;
}

impl<T: Scheduled> EntityList for [T] {
    fn count(&self) -> usize {
        self.len()
    }

    fn key_at(&self, index: usize) -> EntityKey {
        self[index].entity_key()
    }
}

impl<T: Scheduled> EntityList for Vec<T> {
    fn count(&self) -> usize {
        self.len()
    }

    fn key_at(&self, index: usize) -> EntityKey {
        self[index].entity_key()
    }
}

/// Processing partitions, drained in declaration order.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Sleeping entities.
    Dormant = 0,
    /// Everything awake.
    Active = 1,
    /// Reserved; nothing is routed here.
    Reserved = 2,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Dormant, Tier::Active, Tier::Reserved];

    #[inline]
    pub fn as_index(self) -> usize {
        self as usize
    }

    /// Whether an entity belongs to this tier.
    #[inline]
    pub fn admits(self, key: &EntityKey) -> bool {
        match self {
            Tier::Dormant => key.dormant,
            Tier::Active => !key.dormant,
            Tier::Reserved => false,
        }
    }
}

/// Three independent tier heaps, rebuilt and drained once per frame.
///
/// Heaps hold indices into the entity list passed to [`generate_queue`](Self::generate_queue);
/// those indices are only meaningful for that list, within that frame.
#[derive(Resource, Debug, Default)]
pub struct FrameScheduler {
    heaps: [TierHeap; 3],
}

impl FrameScheduler {
    /// Rebuild a tier's heap from the current entity list.
    pub fn generate_queue<L: EntityList + ?Sized>(&mut self, tier: Tier, entities: &L) {
        self.heaps[tier.as_index()].rebuild(tier, entities);
    }

    /// Pop the entity with the lowest vertical position from a tier.
    ///
    /// `None` once the tier is exhausted, or if it was never generated.
    pub fn get_root(&mut self, tier: Tier) -> Option<usize> {
        self.heaps[tier.as_index()].pop()
    }

    /// Drain a tier in ascending vertical order.
    pub fn drain(&mut self, tier: Tier) -> Drain<'_> {
        Drain {
            heap: &mut self.heaps[tier.as_index()],
        }
    }

    /// Force every tier to reallocate on its next generation.
    ///
    /// Called when entities are deleted from the area.
    pub fn invalidate(&mut self) {
        for heap in &mut self.heaps {
            heap.invalidate();
        }
    }

    pub fn heap(&self, tier: Tier) -> &TierHeap {
        &self.heaps[tier.as_index()]
    }
}

/// Iterator returned by [`FrameScheduler::drain`].
pub struct Drain<'a> {
    heap: &'a mut TierHeap,
}

impl Iterator for Drain<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        self.heap.pop()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.heap.len(), Some(self.heap.len()))
    }
}
