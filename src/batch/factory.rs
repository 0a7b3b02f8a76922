//! Randomized transforms
//!
//! Produces the scattered layout of a batched scene: positions inside a cube,
//! fully random orientations and a uniform scale per instance.

use std::f32::consts::TAU;

use glam::{Affine3A, EulerRot, Quat, Vec3};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};

use crate::scene::transform::Transform;

/// Default half extent of the spawn cube.
pub const DEFAULT_POSITION_BOUNDS: f32 = 20.0;

/// Upper bound of each angular velocity component, in radians per tick.
pub const MAX_ANGULAR_SPEED: f32 = 0.01;

const MIN_SCALE: f32 = 0.5;
const MAX_SCALE: f32 = 1.0;

/// Source of random rigid transforms and angular velocities.
///
/// Every draw only touches the factory's own generator, so two factories built
/// from the same seed yield the same sequence.
#[derive(Debug)]
pub struct TransformFactory {
    rng: StdRng,
}

impl TransformFactory {
    /// Deterministic factory for reproducible layouts and tests.
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Factory seeded from the thread-local generator.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random())
    }

    /// Builds a factory from an optional seed.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        seed.map_or_else(Self::from_entropy, Self::from_seed)
    }

    /// Draws a decomposed transform.
    ///
    /// Position is uniform in `[-bounds, bounds]` on each axis, the orientation
    /// comes from three independent XYZ Euler angles in `[0, 2π)` and the
    /// scale is uniform in `[0.5, 1.0]`.
    pub fn random_trs(&mut self, bounds: f32) -> Transform {
        let position = if bounds > 0.0 {
            Vec3::new(
                self.rng.random_range(-bounds..=bounds),
                self.rng.random_range(-bounds..=bounds),
                self.rng.random_range(-bounds..=bounds),
            )
        } else {
            Vec3::ZERO
        };

        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rng.random_range(0.0..TAU),
            self.rng.random_range(0.0..TAU),
            self.rng.random_range(0.0..TAU),
        );

        let scale = self.rng.random_range(MIN_SCALE..=MAX_SCALE);

        Transform::from_trs(position, rotation, scale)
    }

    /// Draws a composed transform. See [`Self::random_trs`].
    pub fn random_transform(&mut self, bounds: f32) -> Affine3A {
        self.random_trs(bounds).to_matrix()
    }

    /// Each component uniform in `[0, 0.01]` radians per tick.
    pub fn random_angular_velocity(&mut self) -> Vec3 {
        Vec3::new(
            self.rng.random_range(0.0..=MAX_ANGULAR_SPEED),
            self.rng.random_range(0.0..=MAX_ANGULAR_SPEED),
            self.rng.random_range(0.0..=MAX_ANGULAR_SPEED),
        )
    }
}

impl Default for TransformFactory {
    fn default() -> Self {
        Self::from_entropy()
    }
}
