//! 渲染帧管理
//!
//! [`FrameDriver`] runs one tick of the batch per call:
//!
//! ```text
//! RotationAnimator::advance → OrbitControls::update → collect depth list
//!     → DepthSortEngine::sort → Renderer::draw
//! ```
//!
//! The depth list is owned by the driver and reused every frame, so steady-state
//! ticks do not allocate.

use log::debug;

use crate::batch::{DepthEntry, DepthSortEngine, RotationAnimator};
use crate::errors::{BatchError, Result};
use crate::renderer::{DrawBatch, Renderer};
use crate::scene::{BatchedScene, Camera};
use crate::settings::{BatchSettings, SortAlgorithm};
use crate::utils::OrbitControls;

/// Vertical field of view of the default camera, in degrees.
pub const DEFAULT_FOV: f32 = 70.0;
pub const DEFAULT_NEAR: f32 = 1.0;
pub const DEFAULT_FAR: f32 = 100.0;
/// Distance of the default camera from the origin.
pub const DEFAULT_ORBIT_RADIUS: f32 = 30.0;

/// Per-tick counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Index of the tick, starting at 1.
    pub frame: u64,
    /// Instances rotated this tick.
    pub animated: usize,
    /// Instances handed to the renderer.
    pub drawn: usize,
    /// Instances rejected by the frustum test.
    pub culled: usize,
    /// Instances skipped because they are hidden.
    pub hidden: usize,
}

pub struct FrameDriver {
    scene: BatchedScene,
    camera: Camera,
    controls: Option<OrbitControls>,
    animator: RotationAnimator,
    sorter: DepthSortEngine,

    /// 复用的 draw list 内存
    draw_list: Vec<DepthEntry>,
    frame: u64,
}

impl FrameDriver {
    /// Driver with a fixed camera. The caller positions it.
    #[must_use]
    pub fn new(scene: BatchedScene, camera: Camera) -> Self {
        let settings = scene.settings();
        let animator = RotationAnimator::new(settings.rotation_mode);
        let sorter = DepthSortEngine::from_settings(settings);
        let draw_list = Vec::with_capacity(settings.count);

        Self {
            scene,
            camera,
            controls: None,
            animator,
            sorter,
            draw_list,
            frame: 0,
        }
    }

    /// Driver with a 70° perspective camera auto-orbiting the origin at
    /// distance 30, starting on the +Z axis.
    #[must_use]
    pub fn with_orbit_camera(scene: BatchedScene, aspect: f32) -> Self {
        let mut camera = Camera::new_perspective(DEFAULT_FOV, aspect, DEFAULT_NEAR, DEFAULT_FAR);
        let controls = OrbitControls::new(glam::Vec3::ZERO, DEFAULT_ORBIT_RADIUS);
        camera.look_at(controls.eye(), controls.center, glam::Vec3::Y);

        let mut driver = Self::new(scene, camera);
        driver.controls = Some(controls);
        driver
    }

    /// Runs one frame and hands the sorted batch to `renderer`.
    pub fn tick<R: Renderer + ?Sized>(&mut self, renderer: &mut R) -> FrameStats {
        self.frame += 1;
        let mut stats = FrameStats {
            frame: self.frame,
            ..Default::default()
        };

        // 1. Animate the dynamic subset
        let dynamic_count = self.scene.settings().dynamic_count;
        stats.animated = self.animator.advance(self.scene.pool_mut(), dynamic_count);

        // 2. Move the camera
        if let Some(controls) = &mut self.controls {
            controls.update(&mut self.camera);
        }

        // 3. Collect visible instances with their camera-space depth
        self.collect_draw_list(&mut stats);

        // 4. Order
        self.sorter.sort(&mut self.draw_list);

        // 5. Draw
        let settings = self.scene.settings();
        renderer.draw(&DrawBatch {
            pool: self.scene.pool(),
            camera: &self.camera,
            order: &self.draw_list,
            transparent: settings.is_transparent(),
            opacity: settings.opacity,
        });

        if settings.diagnostics {
            debug!(
                "Frame {}: animated {}, drawn {}, culled {}, hidden {}",
                stats.frame, stats.animated, stats.drawn, stats.culled, stats.hidden
            );
        }

        stats
    }

    fn collect_draw_list(&mut self, stats: &mut FrameStats) {
        self.draw_list.clear();

        let cull = self.scene.settings().per_object_frustum_culled;
        let pool = self.scene.pool();
        let frustum = self.camera.frustum();

        for (handle, slot) in pool.iter() {
            if !slot.is_visible() {
                stats.hidden += 1;
                continue;
            }

            // Geometries are never removed, so every live slot resolves
            let Some(geometry) = pool.geometry(slot.geometry()) else {
                continue;
            };
            let sphere = geometry.bounding_sphere().transform(slot.transform());

            if cull && !frustum.intersects_bounding_sphere(&sphere) {
                stats.culled += 1;
                continue;
            }

            self.draw_list
                .push(DepthEntry::new(handle, self.camera.depth_of(sphere.center)));
        }

        stats.drawn = self.draw_list.len();
    }

    // ========================================================================
    // Runtime options
    // ========================================================================

    /// Changes the material opacity. Crossing `1.0` flips the draw direction
    /// unless it is pinned by `use_reversed_order`.
    pub fn set_opacity(&mut self, opacity: f32) -> Result<()> {
        self.update_settings(|s| s.opacity = opacity)
    }

    /// Pins the draw direction, or `None` to follow transparency again.
    pub fn set_reversed_order(&mut self, reversed: Option<bool>) -> Result<()> {
        self.update_settings(|s| s.use_reversed_order = reversed)
    }

    pub fn set_sorting_enabled(&mut self, enabled: bool) -> Result<()> {
        self.update_settings(|s| s.sorting_enabled = enabled)
    }

    pub fn set_sort_algorithm(&mut self, algorithm: SortAlgorithm) -> Result<()> {
        self.update_settings(|s| s.sort_algorithm = algorithm)
    }

    pub fn set_dynamic_count(&mut self, dynamic_count: usize) -> Result<()> {
        self.update_settings(|s| s.dynamic_count = dynamic_count)
    }

    pub fn set_frustum_culling(&mut self, enabled: bool) -> Result<()> {
        self.update_settings(|s| s.per_object_frustum_culled = enabled)
    }

    /// Applies `edit` to a copy of the settings and commits it only if the
    /// result validates.
    fn update_settings(&mut self, edit: impl FnOnce(&mut BatchSettings)) -> Result<()> {
        let mut next = self.scene.settings().clone();
        edit(&mut next);
        if next.capacity != self.scene.pool().capacity() {
            return Err(BatchError::InvalidConfig {
                field: "capacity",
                reason: "cannot change after construction".to_string(),
            });
        }
        next.validate()?;

        self.sorter.set_enabled(next.sorting_enabled);
        self.sorter.set_reversed(next.reversed());
        self.sorter.set_algorithm(next.sort_algorithm);
        self.sorter.set_diagnostics(next.diagnostics);
        self.animator.set_mode(next.rotation_mode);
        *self.scene.settings_mut() = next;
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn scene(&self) -> &BatchedScene {
        &self.scene
    }

    #[inline]
    pub fn scene_mut(&mut self) -> &mut BatchedScene {
        &mut self.scene
    }

    #[inline]
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[inline]
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    #[inline]
    pub fn controls_mut(&mut self) -> Option<&mut OrbitControls> {
        self.controls.as_mut()
    }

    #[inline]
    #[must_use]
    pub fn sorter(&self) -> &DepthSortEngine {
        &self.sorter
    }

    #[inline]
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Stops driving and tears the scene down.
    pub fn shutdown(mut self) -> BatchedScene {
        self.scene.teardown();
        self.scene
    }
}
