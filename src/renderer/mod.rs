//! Renderer boundary
//!
//! The crate does not rasterize anything. Each tick the [`FrameDriver`] hands a
//! [`DrawBatch`] to an implementation of [`Renderer`], which submits the
//! instances in the given order.
//!
//! The batch borrows the pool and the driver's draw list, so a renderer cannot
//! hold on to either past the call.

pub mod frame;

pub use frame::{FrameDriver, FrameStats};

use glam::Affine3A;

use crate::batch::{DepthEntry, InstanceHandle, InstancePool};
use crate::resources::Geometry;
use crate::scene::Camera;

/// Consumer of one frame's sorted instances.
pub trait Renderer {
    fn draw(&mut self, batch: &DrawBatch<'_>);
}

impl<F> Renderer for F
where
    F: FnMut(&DrawBatch<'_>),
{
    fn draw(&mut self, batch: &DrawBatch<'_>) {
        self(batch);
    }
}

/// One instance as the renderer sees it.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem<'a> {
    pub handle: InstanceHandle,
    pub geometry: &'a Geometry,
    pub transform: &'a Affine3A,
    pub depth: f32,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Copy)]
pub struct DrawBatch<'a> {
    pub pool: &'a InstancePool,
    pub camera: &'a Camera,
    /// Visible instances in draw order, with their camera-space depth.
    pub order: &'a [DepthEntry],
    /// Blended material; `order` then runs far-to-near unless overridden.
    pub transparent: bool,
    pub opacity: f32,
}

impl<'a> DrawBatch<'a> {
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Handles in draw order.
    pub fn handles(&self) -> impl Iterator<Item = InstanceHandle> + 'a {
        self.order.iter().map(|entry| entry.handle)
    }

    /// Resolved instances in draw order.
    pub fn items(&self) -> impl Iterator<Item = DrawItem<'a>> + 'a {
        let pool = self.pool;
        self.order.iter().filter_map(move |entry| {
            let slot = pool.get(entry.handle).ok()?;
            let geometry = pool.geometry(slot.geometry())?;
            Some(DrawItem {
                handle: entry.handle,
                geometry,
                transform: slot.transform(),
                depth: entry.depth,
            })
        })
    }
}
