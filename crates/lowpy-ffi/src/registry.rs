//! Registry of live buffers addressed by opaque `u64` handles.
//!
//! A handle is `slot << 32 | generation`. Vacant slots form a free list
//! threaded through the slots themselves, and every reuse of a slot carries
//! a new generation, so a handle kept by the host after `destroy` names
//! nothing instead of reaching whichever buffer took the slot over.
//!
//! The registry lock is held only to resolve or change a handle. Callers
//! get a clone of the buffer's `Arc` and lock the buffer on their own.

use std::sync::{Arc, Mutex};

use lowpy_core::Buffer;

/// A registered buffer, locked independently of the registry.
pub(crate) type SharedBuffer = Arc<Mutex<Buffer>>;

static REGISTRY: Mutex<Registry> = Mutex::new(Registry::new());

enum Slot {
    Occupied {
        generation: u32,
        buffer: SharedBuffer,
    },
    Free {
        generation: u32,
        next: Option<u32>,
    },
    /// Generation counter exhausted; the slot is never handed out again.
    Retired,
}

/// Slot storage plus the head of the free list.
pub(crate) struct Registry {
    slots: Vec<Slot>,
    free_head: Option<u32>,
}

fn handle_of(index: u32, generation: u32) -> u64 {
    (u64::from(index) << 32) | u64::from(generation)
}

fn split(handle: u64) -> (u32, u32) {
    ((handle >> 32) as u32, handle as u32)
}

impl Registry {
    const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_head: None,
        }
    }

    /// Register `buffer` and return its handle.
    ///
    /// Returns `None` only when all `u32` slot indices are in use.
    pub(crate) fn insert(&mut self, buffer: Buffer) -> Option<u64> {
        let buffer = Arc::new(Mutex::new(buffer));
        if let Some(index) = self.free_head {
            let slot = &mut self.slots[index as usize];
            if let Slot::Free { generation, next } = *slot {
                self.free_head = next;
                *slot = Slot::Occupied { generation, buffer };
                return Some(handle_of(index, generation));
            }
        }
        let index = u32::try_from(self.slots.len()).ok()?;
        self.slots.push(Slot::Occupied {
            generation: 0,
            buffer,
        });
        Some(handle_of(index, 0))
    }

    fn get(&self, handle: u64) -> Option<&SharedBuffer> {
        let (index, generation) = split(handle);
        match self.slots.get(index as usize)? {
            Slot::Occupied {
                generation: current,
                buffer,
            } if *current == generation => Some(buffer),
            _ => None,
        }
    }

    /// Unregister the buffer named by `handle`.
    ///
    /// A stale or never-issued handle yields `None` and changes nothing.
    pub(crate) fn remove(&mut self, handle: u64) -> Option<SharedBuffer> {
        self.get(handle)?;
        let (index, generation) = split(handle);
        let next_generation = generation.wrapping_add(1);
        let vacated = if next_generation == 0 {
            Slot::Retired
        } else {
            Slot::Free {
                generation: next_generation,
                next: self.free_head,
            }
        };
        let previous = std::mem::replace(&mut self.slots[index as usize], vacated);
        if next_generation != 0 {
            self.free_head = Some(index);
        }
        match previous {
            Slot::Occupied { buffer, .. } => Some(buffer),
            Slot::Free { .. } | Slot::Retired => None,
        }
    }

    #[cfg(test)]
    fn live(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Occupied { .. }))
            .count()
    }
}

/// The process-wide registry.
pub(crate) fn registry() -> &'static Mutex<Registry> {
    &REGISTRY
}

/// Clone the buffer named by `handle`, holding the registry lock only for
/// the lookup.
///
/// Returns `None` if the handle is stale or the registry mutex is poisoned.
pub(crate) fn lookup(handle: u64) -> Option<SharedBuffer> {
    REGISTRY.lock().ok()?.get(handle).cloned()
}
