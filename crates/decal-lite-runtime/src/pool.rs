// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Mesh Pool - generational arena of decal meshes
//!
//! Released slots keep their buffer allocations so steady-state decal churn
//! does not touch the allocator.

use decal_lite_model::{DecalHandle, DecalMesh};

#[derive(Debug, Default)]
struct Slot {
    mesh: DecalMesh,
    generation: u32,
    occupied: bool,
}

/// Arena of decal meshes addressed by [`DecalHandle`]
#[derive(Debug, Default)]
pub struct MeshPool {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
}

impl MeshPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-allocate slots for `capacity` meshes
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::with_capacity(capacity),
            live: 0,
        }
    }

    /// Store a copy of `mesh`, reusing a released slot when one exists
    pub fn insert(&mut self, mesh: &DecalMesh) -> DecalHandle {
        self.live += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.mesh.clone_from(mesh);
            slot.occupied = true;
            return DecalHandle::new(index, slot.generation);
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            mesh: mesh.clone(),
            generation: 0,
            occupied: true,
        });
        DecalHandle::new(index, 0)
    }

    /// Move `mesh` into the pool without copying its buffers
    ///
    /// A recycled slot's retained buffers are dropped in favor of `mesh`'s.
    pub fn insert_owned(&mut self, mesh: DecalMesh) -> DecalHandle {
        self.live += 1;

        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.mesh = mesh;
            slot.occupied = true;
            return DecalHandle::new(index, slot.generation);
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            mesh,
            generation: 0,
            occupied: true,
        });
        DecalHandle::new(index, 0)
    }

    /// Release the slot behind `handle`
    ///
    /// Returns false for stale or unknown handles.
    pub fn remove(&mut self, handle: DecalHandle) -> bool {
        let Some(slot) = self.slot_mut(handle) else {
            return false;
        };

        slot.mesh.clear();
        slot.occupied = false;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        self.live -= 1;
        true
    }

    pub fn get(&self, handle: DecalHandle) -> Option<&DecalMesh> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.occupied && slot.generation == handle.generation)
            .map(|slot| &slot.mesh)
    }

    pub fn contains(&self, handle: DecalHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Number of live meshes
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Number of allocated slots, live or released
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn slot_mut(&mut self, handle: DecalHandle) -> Option<&mut Slot> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.occupied && slot.generation == handle.generation)
    }
}
