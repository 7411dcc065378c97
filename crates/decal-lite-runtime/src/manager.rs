// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decal Manager - lifecycle of projected decals
//!
//! Accepts finished decal meshes, removes decals they supersede, stacks
//! overlapping decals at increasing offsets so they do not z-fight, and
//! evicts the oldest decal once the configured budget is reached.

use crate::error::{Error, Result};
use crate::hit::DecalHit;
use crate::pool::MeshPool;
use crate::registry::{DecalInstance, DecalRegistry};
use decal_lite_geometry::{weld_and_push, DecalProjector};
use decal_lite_model::{
    DecalConfig, DecalHandle, DecalMesh, DecalRenderable, MaterialId, MeshSource, RenderableSink,
    SurfaceId, IDENTITY_TRANSFORM,
};
use nalgebra::Point3;
use smallvec::SmallVec;
use std::fmt;

/// A decal mesh waiting to be registered
#[derive(Clone, Debug)]
pub struct DecalCandidate {
    /// Geometry in decal-local space, not yet pushed
    pub mesh: DecalMesh,
    pub material: Option<MaterialId>,
    pub parent: SurfaceId,
    /// World-space hit point
    pub position: Point3<f32>,
    /// Rough decal size; half of it is the bounding radius
    pub approx_scale: f32,
    /// Decal-local to world transform (column-major)
    pub transform: [f32; 16],
}

impl DecalCandidate {
    pub fn new(
        mesh: DecalMesh,
        parent: SurfaceId,
        position: Point3<f32>,
        approx_scale: f32,
    ) -> Self {
        Self {
            mesh,
            material: None,
            parent,
            position,
            approx_scale,
            transform: IDENTITY_TRANSFORM,
        }
    }

    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_transform(mut self, transform: [f32; 16]) -> Self {
        self.transform = transform;
        self
    }
}

/// A successful registration
#[derive(Clone, Debug, PartialEq)]
pub struct Registration {
    pub handle: DecalHandle,
    /// Offset the mesh was pushed by
    pub push_distance: f32,
    /// Oldest decal evicted to make room
    pub evicted: Option<DecalHandle>,
    /// Decals on the same surface that this one replaced
    pub superseded: SmallVec<[DecalHandle; 4]>,
}

/// Why a candidate was not registered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Nothing survived clipping
    EmptyMesh,
    /// The manager holds zero decals
    NoCapacity,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyMesh => f.write_str("empty mesh"),
            SkipReason::NoCapacity => f.write_str("zero capacity"),
        }
    }
}

/// Result of [`DecalManager::register`]
#[derive(Clone, Debug, PartialEq)]
pub enum RegisterOutcome {
    Registered(Registration),
    Skipped(SkipReason),
}

impl RegisterOutcome {
    pub fn registration(&self) -> Option<&Registration> {
        match self {
            RegisterOutcome::Registered(registration) => Some(registration),
            RegisterOutcome::Skipped(_) => None,
        }
    }

    pub fn handle(&self) -> Option<DecalHandle> {
        self.registration().map(|r| r.handle)
    }

    pub fn is_registered(&self) -> bool {
        matches!(self, RegisterOutcome::Registered(_))
    }
}

/// Owns every live decal and the renderer hookup
///
/// # Example
///
/// ```ignore
/// use decal_lite_runtime::{DecalHit, DecalManager};
///
/// let mut manager = DecalManager::new(config, renderer)?;
/// let hit = DecalHit::new(point, normal, surface.id()).with_material(material);
/// if let Some(handle) = manager.spawn(&hit, &[&surface])?.handle() {
///     println!("spawned {}", handle);
/// }
/// ```
pub struct DecalManager<S: RenderableSink> {
    projector: DecalProjector,
    registry: DecalRegistry,
    pool: MeshPool,
    sink: S,
}

impl<S: RenderableSink> DecalManager<S> {
    /// Create a manager, validating `config`
    pub fn new(config: DecalConfig, sink: S) -> Result<Self> {
        if let Err(e) = config.validate() {
            log::warn!("rejected decal config: {}", e);
            return Err(e.into());
        }

        let capacity = config.max_decals_per_manager;
        let projector = DecalProjector::new(config)?;

        Ok(Self {
            projector,
            registry: DecalRegistry::new(capacity),
            pool: MeshPool::with_capacity(capacity),
            sink,
        })
    }

    pub fn config(&self) -> &DecalConfig {
        self.projector.config()
    }

    pub fn projector(&self) -> &DecalProjector {
        &self.projector
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Release every decal and hand back the sink
    pub fn into_sink(mut self) -> S {
        self.clear();
        self.sink
    }

    /// Number of live decals
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Maximum number of live decals
    pub fn capacity(&self) -> usize {
        self.registry.capacity()
    }

    pub fn get(&self, handle: DecalHandle) -> Option<&DecalInstance> {
        self.registry.get(handle)
    }

    /// Pushed geometry of a live decal
    pub fn mesh(&self, handle: DecalHandle) -> Option<&DecalMesh> {
        self.pool.get(handle)
    }

    /// Live decals, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &DecalInstance> {
        self.registry.iter()
    }

    /// Change the decal budget, evicting the oldest decals if it shrinks
    ///
    /// Returns the number of decals evicted.
    pub fn set_capacity(&mut self, capacity: usize) -> usize {
        let evicted = self.registry.set_capacity(capacity);
        for instance in &evicted {
            self.destroy(instance.handle);
        }
        if !evicted.is_empty() {
            log::debug!("capacity now {}, evicted {} decals", capacity, evicted.len());
        }
        evicted.len()
    }

    /// Register a finished decal mesh
    ///
    /// Same-surface decals within the separation radius are destroyed,
    /// closer neighbors raise the push distance, and the oldest decal is
    /// evicted when the manager is full. A candidate without a material, with
    /// a scale that is not positive and finite, or with inconsistent mesh
    /// buffers is rejected before anything is destroyed.
    pub fn register(&mut self, candidate: DecalCandidate) -> Result<RegisterOutcome> {
        let DecalCandidate {
            mut mesh,
            material,
            parent,
            position,
            approx_scale,
            transform,
        } = candidate;

        let material = material.ok_or_else(|| Error::missing_material(parent))?;

        if !(approx_scale.is_finite() && approx_scale > 0.0) {
            return Err(Error::InvalidScale {
                parent,
                scale: approx_scale,
            });
        }

        mesh.check_buffers().map_err(|reason| Error::malformed_mesh(parent, reason))?;

        if mesh.is_empty() {
            log::debug!("not registering decal on {}: {}", parent, SkipReason::EmptyMesh);
            return Ok(RegisterOutcome::Skipped(SkipReason::EmptyMesh));
        }

        if self.registry.capacity() == 0 {
            log::debug!("not registering decal on {}: {}", parent, SkipReason::NoCapacity);
            return Ok(RegisterOutcome::Skipped(SkipReason::NoCapacity));
        }

        let config = self.projector.config();
        let bounding_radius = 0.5 * approx_scale;
        let separation_radius = bounding_radius * config.separator_factor;

        let removed = self
            .registry
            .remove_where(|i| i.is_near(parent, &position, separation_radius));
        let superseded: SmallVec<[DecalHandle; 4]> = removed.iter().map(|i| i.handle).collect();

        let push_distance = self
            .registry
            .neighbors(parent, &position, 2.0 * bounding_radius)
            .map(|i| i.push_distance)
            .reduce(f32::max)
            .map_or(config.push_distance, |max| max + config.push_increment);

        for &handle in &superseded {
            log::debug!("{} supersedes {}", parent, handle);
            self.destroy(handle);
        }

        let evicted = if self.registry.is_full() {
            self.registry.pop_oldest().map(|oldest| {
                log::debug!("evicting {} (order {})", oldest.handle, oldest.order);
                self.destroy(oldest.handle);
                oldest.handle
            })
        } else {
            None
        };

        weld_and_push(&mut mesh, push_distance);
        let triangle_count = mesh.triangle_count();
        let handle = self.pool.insert_owned(mesh);

        let instance = DecalInstance {
            handle,
            material,
            parent,
            center: position,
            bounding_radius,
            push_distance,
            order: self.registry.next_order(),
            transform,
        };
        if let Err(rejected) = self.registry.push(instance) {
            // Only reachable if eviction left the registry full
            self.pool.remove(rejected.handle);
            return Ok(RegisterOutcome::Skipped(SkipReason::NoCapacity));
        }

        if let Some(mesh) = self.pool.get(handle) {
            self.sink.attach(DecalRenderable {
                handle,
                mesh,
                material,
                parent,
                transform,
            });
        }

        log::trace!(
            "registered {} on {}: {} triangles, push {}",
            handle,
            parent,
            triangle_count,
            push_distance
        );

        Ok(RegisterOutcome::Registered(Registration {
            handle,
            push_distance,
            evicted,
            superseded,
        }))
    }

    /// Project a decal at `hit` onto `surfaces` and register it
    pub fn spawn(
        &mut self,
        hit: &DecalHit,
        surfaces: &[&dyn MeshSource],
    ) -> Result<RegisterOutcome> {
        let material = hit
            .material
            .ok_or_else(|| Error::missing_material(hit.parent))?;

        let volume = hit.volume(self.config().max_angle_degrees)?;
        let projected = self.projector.project(&volume, surfaces)?;

        let candidate =
            DecalCandidate::new(projected.mesh, hit.parent, hit.position, hit.approx_scale())
                .with_material(material)
                .with_transform(volume.local_to_world_columns());

        self.register(candidate)
    }

    /// Destroy one decal
    pub fn remove(&mut self, handle: DecalHandle) -> bool {
        match self.registry.remove(handle) {
            Some(instance) => {
                self.destroy(instance.handle);
                true
            }
            None => false,
        }
    }

    /// Destroy every decal attached to `parent`
    ///
    /// Returns the number of decals destroyed.
    pub fn remove_surface(&mut self, parent: SurfaceId) -> usize {
        let removed = self.registry.remove_where(|i| i.parent == parent);
        for instance in &removed {
            self.destroy(instance.handle);
        }
        removed.len()
    }

    /// Destroy every decal
    ///
    /// Returns the number of decals destroyed.
    pub fn clear(&mut self) -> usize {
        let handles: Vec<DecalHandle> = self.registry.drain().map(|i| i.handle).collect();
        for &handle in &handles {
            self.destroy(handle);
        }
        if !handles.is_empty() {
            log::debug!("cleared {} decals", handles.len());
        }
        handles.len()
    }

    fn destroy(&mut self, handle: DecalHandle) {
        self.pool.remove(handle);
        self.sink.release(handle);
    }
}

impl<S: RenderableSink + fmt::Debug> fmt::Debug for DecalManager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecalManager")
            .field("len", &self.registry.len())
            .field("capacity", &self.registry.capacity())
            .field("sink", &self.sink)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use decal_lite_model::{DecalRenderable, SurfaceData};
    use nalgebra::Vector3;

    #[derive(Debug, Default)]
    struct RecordingSink {
        attached: Vec<DecalHandle>,
        released: Vec<DecalHandle>,
    }

    impl RenderableSink for RecordingSink {
        fn attach(&mut self, decal: DecalRenderable<'_>) {
            assert!(!decal.mesh.is_empty());
            self.attached.push(decal.handle);
        }

        fn release(&mut self, handle: DecalHandle) {
            self.released.push(handle);
        }
    }

    fn config(capacity: usize) -> DecalConfig {
        DecalConfig {
            max_decals_per_manager: capacity,
            ..DecalConfig::default()
        }
    }

    fn manager(capacity: usize) -> DecalManager<RecordingSink> {
        DecalManager::new(config(capacity), RecordingSink::default()).unwrap()
    }

    fn quad() -> DecalMesh {
        let mut mesh = DecalMesh::new();
        for (x, y) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
            mesh.push_vertex([x, y, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0, 1.0], [x + 0.5, y + 0.5]);
        }
        mesh.indices.extend_from_slice(&[0, 1, 2, 0, 2, 3]);
        mesh
    }

    fn candidate(parent: u64, x: f32) -> DecalCandidate {
        DecalCandidate::new(quad(), SurfaceId(parent), Point3::new(x, 0.0, 0.0), 1.0)
            .with_material(MaterialId(1))
    }

    fn register(manager: &mut DecalManager<RecordingSink>, parent: u64, x: f32) -> Registration {
        match manager.register(candidate(parent, x)).unwrap() {
            RegisterOutcome::Registered(registration) => registration,
            RegisterOutcome::Skipped(reason) => panic!("skipped: {reason}"),
        }
    }

    #[test]
    fn test_register_pushes_mesh() {
        let mut manager = manager(4);
        let registration = register(&mut manager, 1, 0.0);

        assert_eq!(manager.len(), 1);
        assert_relative_eq!(registration.push_distance, 0.009);
        assert_eq!(manager.sink().attached, vec![registration.handle]);

        let mesh = manager.mesh(registration.handle).unwrap();
        for i in 0..mesh.vertex_count() {
            assert_relative_eq!(mesh.position(i)[2], 0.009, epsilon = 1e-6);
        }

        let instance = manager.get(registration.handle).unwrap();
        assert_relative_eq!(instance.bounding_radius, 0.5);
        assert_eq!(instance.material, MaterialId(1));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut manager = manager(3);
        let handles: Vec<DecalHandle> = (0..3)
            .map(|i| register(&mut manager, i, 10.0 * i as f32).handle)
            .collect();

        let registration = register(&mut manager, 9, 100.0);

        assert_eq!(registration.evicted, Some(handles[0]));
        assert_eq!(manager.len(), 3);
        assert!(manager.get(handles[0]).is_none());
        assert!(manager.mesh(handles[0]).is_none());
        assert_eq!(manager.sink().released, vec![handles[0]]);

        let live: Vec<DecalHandle> = manager.iter().map(|i| i.handle).collect();
        assert_eq!(live, vec![handles[1], handles[2], registration.handle]);
    }

    #[test]
    fn test_close_decal_supersedes() {
        let mut manager = manager(4);
        let first = register(&mut manager, 1, 0.0);

        // separation radius is 0.5 * 0.5 = 0.25
        let second = register(&mut manager, 1, 0.1);

        assert_eq!(second.superseded.as_slice(), &[first.handle]);
        assert_eq!(second.evicted, None);
        assert_eq!(manager.len(), 1);
        assert!(manager.len() <= manager.capacity());
        assert_eq!(manager.sink().released, vec![first.handle]);
        assert_relative_eq!(second.push_distance, 0.009);
    }

    #[test]
    fn test_nearby_decal_stacks() {
        let mut manager = manager(4);
        let first = register(&mut manager, 1, 0.0);
        let second = register(&mut manager, 1, 0.6);
        let third = register(&mut manager, 1, 0.3);

        assert!(second.superseded.is_empty());
        assert!(manager.get(first.handle).is_some());
        assert!(second.push_distance > first.push_distance);
        assert_relative_eq!(second.push_distance, 0.010);
        // Takes the maximum of both neighbors
        assert_relative_eq!(third.push_distance, 0.011, epsilon = 1e-6);
        assert_eq!(manager.len(), 3);
    }

    #[test]
    fn test_other_surface_not_affected() {
        let mut manager = manager(4);
        let first = register(&mut manager, 1, 0.0);
        let second = register(&mut manager, 2, 0.0);

        assert!(second.superseded.is_empty());
        assert_relative_eq!(second.push_distance, 0.009);
        assert!(manager.get(first.handle).is_some());
    }

    #[test]
    fn test_far_decal_uses_base_push() {
        let mut manager = manager(4);
        register(&mut manager, 1, 0.0);
        let far = register(&mut manager, 1, 1.5);
        assert_relative_eq!(far.push_distance, 0.009);
    }

    #[test]
    fn test_missing_material_is_error() {
        let mut manager = manager(4);
        let bare = DecalCandidate::new(quad(), SurfaceId(1), Point3::origin(), 1.0);

        let err = manager.register(bare).unwrap_err();
        assert!(matches!(err, Error::MissingMaterial { parent: SurfaceId(1) }));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_malformed_mesh_is_error() {
        let mut manager = manager(4);
        let mut mesh = quad();
        mesh.normals.truncate(3);
        let bad = DecalCandidate::new(mesh, SurfaceId(1), Point3::origin(), 1.0)
            .with_material(MaterialId(1));

        let err = manager.register(bad).unwrap_err();
        assert!(matches!(err, Error::MalformedMesh { parent: SurfaceId(1), .. }));

        let mut mesh = quad();
        mesh.indices.push(7);
        mesh.indices.extend_from_slice(&[0, 1]);
        let bad = DecalCandidate::new(mesh, SurfaceId(1), Point3::origin(), 1.0)
            .with_material(MaterialId(1));
        assert!(matches!(
            manager.register(bad),
            Err(Error::MalformedMesh { .. })
        ));

        assert!(manager.is_empty());
        assert!(manager.sink().attached.is_empty());
    }

    #[test]
    fn test_invalid_scale_is_error() {
        let mut manager = manager(4);
        let first = register(&mut manager, 1, 0.0);

        for scale in [-1.0, 0.0, f32::NAN, f32::INFINITY] {
            let position = Point3::new(0.1, 0.0, 0.0);
            let candidate = DecalCandidate::new(quad(), SurfaceId(1), position, scale)
                .with_material(MaterialId(1));
            assert!(matches!(
                manager.register(candidate),
                Err(Error::InvalidScale { parent: SurfaceId(1), .. })
            ));
        }

        // The existing decal is neither superseded nor released
        assert_eq!(manager.len(), 1);
        assert!(manager.get(first.handle).is_some());
        assert!(manager.sink().released.is_empty());
    }

    #[test]
    fn test_skips() {
        let mut manager = manager(4);
        let empty = DecalCandidate::new(DecalMesh::new(), SurfaceId(1), Point3::origin(), 1.0)
            .with_material(MaterialId(1));
        assert_eq!(
            manager.register(empty).unwrap(),
            RegisterOutcome::Skipped(SkipReason::EmptyMesh)
        );

        let mut none = self::manager(0);
        let outcome = none.register(candidate(1, 0.0)).unwrap();
        assert_eq!(outcome, RegisterOutcome::Skipped(SkipReason::NoCapacity));
        assert!(none.sink().attached.is_empty());
    }

    #[test]
    fn test_clear_releases_everything() {
        let mut manager = manager(8);
        let handles: Vec<DecalHandle> = (0..5)
            .map(|i| register(&mut manager, 1, 3.0 * i as f32).handle)
            .collect();

        assert_eq!(manager.clear(), 5);
        assert!(manager.is_empty());
        assert_eq!(manager.sink().released, handles);
        assert_eq!(manager.clear(), 0);
    }

    #[test]
    fn test_shrink_capacity() {
        let mut manager = manager(4);
        let handles: Vec<DecalHandle> = (0..4)
            .map(|i| register(&mut manager, 1, 3.0 * i as f32).handle)
            .collect();

        assert_eq!(manager.set_capacity(2), 2);
        assert_eq!(manager.capacity(), 2);
        assert_eq!(manager.sink().released, &handles[..2]);

        let live: Vec<DecalHandle> = manager.iter().map(|i| i.handle).collect();
        assert_eq!(live, &handles[2..]);
    }

    #[test]
    fn test_remove_and_remove_surface() {
        let mut manager = manager(8);
        let a = register(&mut manager, 1, 0.0).handle;
        register(&mut manager, 2, 0.0);
        register(&mut manager, 2, 5.0);

        assert!(manager.remove(a));
        assert!(!manager.remove(a));
        assert_eq!(manager.remove_surface(SurfaceId(2)), 2);
        assert!(manager.is_empty());
        assert_eq!(manager.sink().released.len(), 3);
    }

    #[test]
    fn test_slot_reuse_after_eviction() {
        let mut manager = manager(1);
        let first = register(&mut manager, 1, 0.0).handle;
        let second = register(&mut manager, 1, 10.0).handle;

        assert_eq!(first.index, second.index);
        assert_ne!(first, second);
        assert!(manager.mesh(first).is_none());
        assert!(manager.mesh(second).is_some());
    }

    #[test]
    fn test_spawn_projects_and_registers() {
        let floor = SurfaceData::new(
            SurfaceId(5),
            vec![-4.0, -4.0, 0.0, 4.0, -4.0, 0.0, 4.0, 4.0, 0.0, -4.0, 4.0, 0.0],
            [0.0, 0.0, 1.0].repeat(4),
            vec![0, 1, 2, 0, 2, 3],
        )
        .with_tangents([1.0, 0.0, 0.0, 1.0].repeat(4));

        let mut manager = manager(4);
        let hit = DecalHit::new(Point3::new(0.5, 0.5, 0.0), Vector3::z(), SurfaceId(5))
            .with_size(Vector3::new(0.5, 0.5, 0.5))
            .with_material(MaterialId(3));

        let outcome = manager.spawn(&hit, &[&floor]).unwrap();
        let handle = outcome.handle().unwrap();

        let instance = manager.get(handle).unwrap();
        assert_eq!(instance.parent, SurfaceId(5));
        assert_relative_eq!(instance.bounding_radius, 0.25);
        // Column-major: translation lives in the last column
        assert_eq!(&instance.transform[12..15], &[0.5, 0.5, 0.0]);

        let mesh = manager.mesh(handle).unwrap();
        assert!(mesh.triangle_count() > 0);
        for i in 0..mesh.vertex_count() {
            let p = mesh.position(i);
            assert!(p[0].abs() <= 0.25 + 1e-4 && p[1].abs() <= 0.25 + 1e-4);
            assert_relative_eq!(p[2], 0.009, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_spawn_without_material() {
        let mut manager = manager(4);
        let hit = DecalHit::new(Point3::origin(), Vector3::z(), SurfaceId(1));
        assert!(matches!(
            manager.spawn(&hit, &[]),
            Err(Error::MissingMaterial { .. })
        ));
    }

    #[test]
    fn test_invalid_config() {
        let bad = DecalConfig {
            push_distance: 0.0,
            ..DecalConfig::default()
        };
        assert!(matches!(
            DecalManager::new(bad, RecordingSink::default()),
            Err(Error::Config(_))
        ));
    }
}
