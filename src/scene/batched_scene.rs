//! Batched Scene
//!
//! Scene setup and teardown for a batch of spinning shapes: registers the
//! shared base geometries, fills the pool and remembers the allocation order.

use log::info;

use crate::batch::{InstanceHandle, InstancePool, TransformFactory};
use crate::errors::Result;
use crate::resources::{Geometry, GeometryHandle};
use crate::settings::BatchSettings;

pub struct BatchedScene {
    settings: BatchSettings,
    pool: InstancePool,
    geometries: Vec<GeometryHandle>,
    /// Live handles in the order they were allocated
    ids: Vec<InstanceHandle>,
}

impl BatchedScene {
    /// Validates `settings`, registers the cone, box and sphere geometries and
    /// allocates `settings.count` instances, cycling through the geometries.
    pub fn new(settings: BatchSettings) -> Result<Self> {
        settings.validate()?;

        let factory = TransformFactory::new(settings.seed);
        let mut pool =
            InstancePool::with_factory(settings.capacity, factory, settings.position_bounds)?;

        let geometries = vec![
            pool.add_geometry(Geometry::new_cone(1.0, 2.0)),
            pool.add_geometry(Geometry::new_box(2.0, 2.0, 2.0)),
            pool.add_geometry(Geometry::new_sphere(1.0, 16, 8)),
        ];

        let mut scene = Self {
            ids: Vec::with_capacity(settings.count),
            settings,
            pool,
            geometries,
        };

        for i in 0..scene.settings.count {
            let geometry = scene.geometries[i % scene.geometries.len()];
            scene.spawn(geometry)?;
        }

        info!(
            "Batched scene ready: {} instances over {} geometries (capacity {})",
            scene.pool.len(),
            scene.geometries.len(),
            scene.settings.capacity
        );

        Ok(scene)
    }

    /// Allocates one more instance of `geometry`.
    pub fn spawn(&mut self, geometry: GeometryHandle) -> Result<InstanceHandle> {
        let handle = self.pool.allocate(geometry)?;
        self.ids.push(handle);
        Ok(handle)
    }

    /// Releases one instance. Not meant for the per-frame path.
    pub fn despawn(&mut self, handle: InstanceHandle) -> Result<()> {
        self.pool.release(handle)?;
        self.ids.retain(|&id| id != handle);
        Ok(())
    }

    /// Releases every instance. The scene can be refilled with [`Self::spawn`].
    pub fn teardown(&mut self) {
        let released = self.pool.len();
        self.pool.clear();
        self.ids.clear();
        info!("Batched scene torn down, released {released} instances");
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    pub(crate) fn settings_mut(&mut self) -> &mut BatchSettings {
        &mut self.settings
    }

    #[inline]
    #[must_use]
    pub fn pool(&self) -> &InstancePool {
        &self.pool
    }

    #[inline]
    pub fn pool_mut(&mut self) -> &mut InstancePool {
        &mut self.pool
    }

    /// Registered base geometries: cone, box, sphere.
    #[inline]
    #[must_use]
    pub fn geometries(&self) -> &[GeometryHandle] {
        &self.geometries
    }

    #[inline]
    #[must_use]
    pub fn ids(&self) -> &[InstanceHandle] {
        &self.ids
    }
}
