//! Rotation Animator
//!
//! Spins the dynamic subset of a pool: the first `active_count` instances in
//! allocation order. Everything after that subset is static.

use glam::{EulerRot, Quat, Vec3};
use log::trace;

use crate::batch::pool::InstancePool;
use crate::scene::transform::Transform;
use crate::settings::RotationMode;

#[derive(Debug, Clone, Default)]
pub struct RotationAnimator {
    mode: RotationMode,
}

impl RotationAnimator {
    #[must_use]
    pub fn new(mode: RotationMode) -> Self {
        Self { mode }
    }

    #[inline]
    #[must_use]
    pub fn mode(&self) -> RotationMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: RotationMode) {
        self.mode = mode;
    }

    /// Advances the dynamic subset by one tick.
    ///
    /// `active_count` is clamped to the pool's occupancy. Returns the number of
    /// instances touched.
    pub fn advance(&self, pool: &mut InstancePool, active_count: usize) -> usize {
        let count = active_count.min(pool.len());

        let touched = match self.mode {
            RotationMode::Matrix => pool.for_each_mut(count, |_, slot| {
                // new = current · R(ω)
                let next = *slot.transform() * *slot.spin();
                slot.set_transform(next);
            }),
            RotationMode::Euler => pool.for_each_mut(count, |_, slot| {
                let velocity = slot.angular_velocity();
                if velocity == Vec3::ZERO {
                    return;
                }
                let mut trs = Transform::from_matrix(slot.transform());
                let euler = trs.rotation_euler() + velocity;
                trs.rotation = Quat::from_euler(EulerRot::XYZ, euler.x, euler.y, euler.z);
                slot.set_transform(trs.to_matrix());
            }),
        };

        trace!("Advanced {touched} instances ({:?})", self.mode);
        touched
    }
}
