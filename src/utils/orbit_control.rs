use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec3;

use crate::scene::Camera;

/// Rotation applied per update at `auto_rotate_speed == 1.0`: one full turn
/// every 60 seconds at 60 frames per second.
const AUTO_ROTATE_STEP: f32 = TAU / 60.0 / 60.0;

/// Keeps the eye off the poles so `look_at` never sees a degenerate up vector.
const POLE_EPS: f32 = 0.0001;

/// Orbit controller reduced to its auto-rotate behaviour.
///
/// Keeps the camera on a sphere around `center` and advances the azimuth a
/// fixed step per update.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub auto_rotate: bool,
    pub auto_rotate_speed: f32,

    pub center: Vec3,
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
}

impl OrbitControls {
    /// Starts on the +Z axis, `radius` away from `center`.
    #[must_use]
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            auto_rotate: true,
            auto_rotate_speed: 1.0,

            center,
            radius,
            theta: 0.0,
            phi: FRAC_PI_2,
        }
    }

    /// Advances one frame and writes the new pose into `camera`.
    pub fn update(&mut self, camera: &mut Camera) {
        if self.auto_rotate {
            self.theta = (self.theta - AUTO_ROTATE_STEP * self.auto_rotate_speed).rem_euclid(TAU);
        }

        self.phi = self.phi.clamp(POLE_EPS, PI - POLE_EPS);

        camera.look_at(self.eye(), self.center, Vec3::Y);
    }

    /// Current eye position on the orbit sphere.
    #[must_use]
    pub fn eye(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        let offset = Vec3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        );
        self.center + offset
    }
}
