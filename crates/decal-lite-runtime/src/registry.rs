// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Creation-ordered, bounded set of live decals

use decal_lite_model::{DecalHandle, MaterialId, SurfaceId};
use nalgebra::Point3;
use smallvec::SmallVec;
use std::collections::VecDeque;

/// Bookkeeping for one live decal
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecalInstance {
    /// Slot in the mesh pool
    pub handle: DecalHandle,
    pub material: MaterialId,
    /// Surface the decal was projected onto
    pub parent: SurfaceId,
    /// World-space hit point
    pub center: Point3<f32>,
    /// Half the approximate decal size
    pub bounding_radius: f32,
    /// Offset applied along the welded normals
    pub push_distance: f32,
    /// Monotonic creation counter
    pub order: u64,
    /// Decal-local to world transform (column-major)
    pub transform: [f32; 16],
}

impl DecalInstance {
    /// Whether this decal sits on `parent` strictly closer than `radius` to `point`
    pub fn is_near(&self, parent: SurfaceId, point: &Point3<f32>, radius: f32) -> bool {
        self.parent == parent && nalgebra::distance_squared(&self.center, point) < radius * radius
    }
}

/// Live decals, oldest first
///
/// The registry never holds more than `capacity` instances. It does not own
/// meshes or talk to the renderer; callers release whatever it hands back.
#[derive(Debug, Default)]
pub struct DecalRegistry {
    instances: VecDeque<DecalInstance>,
    capacity: usize,
    next_order: u64,
}

impl DecalRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            instances: VecDeque::with_capacity(capacity),
            capacity,
            next_order: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.instances.len() >= self.capacity
    }

    /// Change the bound, returning the instances evicted to meet it
    pub fn set_capacity(&mut self, capacity: usize) -> Vec<DecalInstance> {
        self.capacity = capacity;
        let excess = self.instances.len().saturating_sub(capacity);
        self.instances.drain(..excess).collect()
    }

    /// Next creation order value
    pub fn next_order(&mut self) -> u64 {
        let order = self.next_order;
        self.next_order += 1;
        order
    }

    /// Append a new instance
    ///
    /// Returns the instance back if the registry is full.
    pub fn push(&mut self, instance: DecalInstance) -> Result<(), DecalInstance> {
        if self.is_full() {
            return Err(instance);
        }
        self.instances.push_back(instance);
        Ok(())
    }

    /// Remove the oldest instance
    pub fn pop_oldest(&mut self) -> Option<DecalInstance> {
        self.instances.pop_front()
    }

    /// Remove every instance matching `predicate`, keeping the others in order
    pub fn remove_where<F>(&mut self, mut predicate: F) -> SmallVec<[DecalInstance; 4]>
    where
        F: FnMut(&DecalInstance) -> bool,
    {
        let mut removed = SmallVec::new();
        self.instances.retain(|instance| {
            if predicate(instance) {
                removed.push(*instance);
                false
            } else {
                true
            }
        });
        removed
    }

    /// Remove one instance by handle
    pub fn remove(&mut self, handle: DecalHandle) -> Option<DecalInstance> {
        let position = self.instances.iter().position(|i| i.handle == handle)?;
        self.instances.remove(position)
    }

    /// Remove everything, oldest first
    pub fn drain(&mut self) -> impl Iterator<Item = DecalInstance> + '_ {
        self.instances.drain(..)
    }

    pub fn get(&self, handle: DecalHandle) -> Option<&DecalInstance> {
        self.instances.iter().find(|i| i.handle == handle)
    }

    /// Instances in creation order
    pub fn iter(&self) -> impl Iterator<Item = &DecalInstance> {
        self.instances.iter()
    }

    /// Instances on `parent` strictly closer than `radius` to `point`
    pub fn neighbors<'a>(
        &'a self,
        parent: SurfaceId,
        point: &'a Point3<f32>,
        radius: f32,
    ) -> impl Iterator<Item = &'a DecalInstance> {
        self.instances
            .iter()
            .filter(move |i| i.is_near(parent, point, radius))
    }
}
