mod entities;

use serde::Serialize;
use tracing::debug;

pub use entities::{
    Particle, ParticlePool, ParticleSpawn, Rgba, Target, TargetKind, TargetPool, TargetSpawn,
    Vec2,
};

pub const DEFAULT_PREWARM: usize = 50;

/// Records that can live in an [`EntityPool`]. `reset` must leave the value indistinguishable
/// from a freshly created one.
pub trait Pooled: Default {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Slot index plus the generation the slot had when it was handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolHandle {
    index: u32,
    generation: u32,
}

impl PoolHandle {
    pub fn index(self) -> usize {
        self.index as usize
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub available: usize,
    pub in_use: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
struct Slot<T> {
    value: T,
    generation: u32,
    in_use: bool,
}

impl<T: Pooled> Slot<T> {
    fn fresh() -> Self {
        Self {
            value: T::default(),
            generation: 0,
            in_use: false,
        }
    }
}

/// Grow-only pool of reusable records.
///
/// Every slot is either available or in use. Released slots are reused LIFO, and the pool
/// never shrinks, so its size is the peak concurrent demand.
#[derive(Debug, Clone)]
pub struct EntityPool<T> {
    slots: Vec<Slot<T>>,
    available: Vec<u32>,
    in_use_count: usize,
}

impl<T: Pooled> Default for EntityPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Pooled> EntityPool<T> {
    pub fn new() -> Self {
        Self::with_prewarm(DEFAULT_PREWARM)
    }

    pub fn with_prewarm(count: usize) -> Self {
        let slots: Vec<Slot<T>> = (0..count).map(|_| Slot::fresh()).collect();
        // reversed so the first acquire hands out slot 0
        let available = (0..count as u32).rev().collect();
        Self {
            slots,
            available,
            in_use_count: 0,
        }
    }

    pub fn acquire(&mut self) -> PoolHandle {
        let index = match self.available.pop() {
            Some(index) => index,
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot::fresh());
                debug!(
                    total = self.slots.len(),
                    pool = std::any::type_name::<T>(),
                    "entity_pool_grew"
                );
                index
            }
        };

        let slot = &mut self.slots[index as usize];
        slot.in_use = true;
        self.in_use_count += 1;
        PoolHandle {
            index,
            generation: slot.generation,
        }
    }

    /// Returns the slot to the available set. Stale, foreign and already released handles
    /// are ignored and yield `false`.
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        let Some(slot) = self.live_slot_mut(handle) else {
            return false;
        };
        slot.value.reset();
        slot.generation = slot.generation.wrapping_add(1);
        slot.in_use = false;
        self.available.push(handle.index);
        self.in_use_count -= 1;
        true
    }

    /// Releases every in-use record matching `predicate`; returns how many were released.
    pub fn release_where(&mut self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        let doomed: Vec<PoolHandle> = self
            .iter_in_use()
            .filter(|(_, value)| predicate(*value))
            .map(|(handle, _)| handle)
            .collect();
        doomed
            .into_iter()
            .filter(|handle| self.release(*handle))
            .count()
    }

    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.in_use && slot.generation == handle.generation)
            .map(|slot| &slot.value)
    }

    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.live_slot_mut(handle).map(|slot| &mut slot.value)
    }

    pub fn is_live(&self, handle: PoolHandle) -> bool {
        self.get(handle).is_some()
    }

    /// In-use records in slot order.
    pub fn iter_in_use(&self) -> impl Iterator<Item = (PoolHandle, &T)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.in_use)
            .map(|(index, slot)| {
                (
                    PoolHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    &slot.value,
                )
            })
    }

    pub fn iter_in_use_mut(&mut self) -> impl Iterator<Item = (PoolHandle, &mut T)> + '_ {
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, slot)| slot.in_use)
            .map(|(index, slot)| {
                (
                    PoolHandle {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    &mut slot.value,
                )
            })
    }

    pub fn in_use_handles(&self) -> Vec<PoolHandle> {
        self.iter_in_use().map(|(handle, _)| handle).collect()
    }

    pub fn available_count(&self) -> usize {
        self.available.len()
    }

    pub fn in_use_count(&self) -> usize {
        self.in_use_count
    }

    pub fn total_count(&self) -> usize {
        self.slots.len()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            available: self.available_count(),
            in_use: self.in_use_count(),
            total: self.total_count(),
        }
    }

    fn live_slot_mut(&mut self, handle: PoolHandle) -> Option<&mut Slot<T>> {
        self.slots
            .get_mut(handle.index())
            .filter(|slot| slot.in_use && slot.generation == handle.generation)
    }
}
