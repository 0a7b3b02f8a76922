use glam::{Affine3A, Mat4, Vec3, Vec4};

use crate::resources::BoundingSphere;

/// Perspective camera feeding depth values to the sorter.
///
/// Right-handed, looking down its local -Z. The cached matrices are refreshed
/// by [`Camera::update_view_projection`] and [`Camera::update_projection_matrix`].
#[derive(Debug, Clone)]
pub struct Camera {
    // === 投影属性 (Projection Only) ===
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    // 缓存的矩阵 renderer只读
    pub(crate) world_matrix: Affine3A,
    pub(crate) view_matrix: Mat4,
    pub(crate) projection_matrix: Mat4,
    pub(crate) view_projection_matrix: Mat4,
    pub(crate) frustum: Frustum,
}

impl Camera {
    /// `fov` is the vertical field of view in degrees.
    #[must_use]
    pub fn new_perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self {
            fov: fov.to_radians(),
            aspect,
            near,
            far,

            world_matrix: Affine3A::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            view_projection_matrix: Mat4::IDENTITY,
            frustum: Frustum::default(),
        };

        cam.update_projection_matrix();
        cam
    }

    pub fn update_projection_matrix(&mut self) {
        // glam 的 perspective_rh 默认是为了 WGPU/Vulkan 设计的 (0 to 1)
        self.projection_matrix = Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far);
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
        self.frustum = Frustum::from_matrix(self.view_projection_matrix);
    }

    pub fn update_view_projection(&mut self, world_transform: &Affine3A) {
        self.world_matrix = *world_transform;

        // 1. View Matrix = World Inverse
        self.view_matrix = Mat4::from(*world_transform).inverse();

        // 2. VP
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;

        // 3. Frustum
        self.frustum = Frustum::from_matrix(self.view_projection_matrix);
    }

    /// Places the camera at `eye` looking at `target`.
    pub fn look_at(&mut self, eye: Vec3, target: Vec3, up: Vec3) {
        let view = Mat4::look_at_rh(eye, target, up);
        self.update_view_projection(&Affine3A::from_mat4(view.inverse()));
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_projection_matrix();
    }

    /// Camera-space depth of a world point: distance along the view direction.
    ///
    /// Grows with distance from the eye; negative behind the camera.
    #[inline]
    #[must_use]
    pub fn depth_of(&self, world_point: Vec3) -> f32 {
        -self.view_matrix.transform_point3(world_point).z
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        self.world_matrix.translation.into()
    }

    #[inline]
    #[must_use]
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    #[inline]
    #[must_use]
    pub fn view_projection_matrix(&self) -> &Mat4 {
        &self.view_projection_matrix
    }

    #[inline]
    #[must_use]
    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Frustum {
    planes: [Vec4; 6], // Left, Right, Bottom, Top, Near, Far
}

impl Frustum {
    #[must_use]
    pub fn from_matrix(m: Mat4) -> Self {
        let rows = [m.row(0), m.row(1), m.row(2), m.row(3)];

        // Gribb-Hartmann 方法, NDC z in [0, 1]
        let mut planes = [
            rows[3] + rows[0], // Left
            rows[3] - rows[0], // Right
            rows[3] + rows[1], // Bottom
            rows[3] - rows[1], // Top
            rows[2],           // Near
            rows[3] - rows[2], // Far
        ];

        for plane in &mut planes {
            let length = plane.truncate().length();
            if length > 0.0 {
                *plane /= length;
            }
        }

        Self { planes }
    }

    // 简单的球体相交检测
    #[must_use]
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.truncate().dot(center) + plane.w >= -radius)
    }

    #[inline]
    #[must_use]
    pub fn intersects_bounding_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.intersects_sphere(sphere.center, sphere.radius)
    }
}
