//! Shared base geometries
//!
//! A batched scene draws many instances of a handful of shapes. Only the
//! analytic description and the bounding volume live here; vertex data is the
//! renderer's business.

use std::borrow::Cow;

use glam::{Affine3A, Vec3};

slotmap::new_key_type! {
    /// Key of a geometry registered with an [`InstancePool`](crate::batch::InstancePool).
    pub struct GeometryHandle;
}

/// Analytic description of a base shape, centered on the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BaseShape {
    /// Cone along +Y with its apex at `height / 2`.
    Cone { radius: f32, height: f32 },
    /// Axis-aligned box.
    Box { width: f32, height: f32, depth: f32 },
    /// UV sphere. Segment counts only matter to the tessellating renderer.
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
}

impl BaseShape {
    /// Radius of the smallest origin-centered sphere enclosing the shape.
    #[must_use]
    pub fn bounding_radius(&self) -> f32 {
        match *self {
            Self::Cone { radius, height } => Vec3::new(radius, height * 0.5, 0.0).length(),
            Self::Box {
                width,
                height,
                depth,
            } => Vec3::new(width, height, depth).length() * 0.5,
            Self::Sphere { radius, .. } => radius,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    /// Moves the sphere into world space.
    ///
    /// The radius grows by the largest axis scale so non-uniform matrices stay
    /// conservative.
    #[must_use]
    pub fn transform(&self, matrix: &Affine3A) -> Self {
        let max_scale = matrix
            .matrix3
            .x_axis
            .length()
            .max(matrix.matrix3.y_axis.length())
            .max(matrix.matrix3.z_axis.length());

        Self {
            center: matrix.transform_point3(self.center),
            radius: self.radius * max_scale,
        }
    }
}

/// An immutable shared base geometry.
#[derive(Debug, Clone)]
pub struct Geometry {
    pub name: Cow<'static, str>,
    shape: BaseShape,
    bounding_sphere: BoundingSphere,
}

impl Geometry {
    #[must_use]
    pub fn new(shape: BaseShape) -> Self {
        let name = match shape {
            BaseShape::Cone { .. } => "Cone",
            BaseShape::Box { .. } => "Box",
            BaseShape::Sphere { .. } => "Sphere",
        };
        Self {
            name: Cow::Borrowed(name),
            shape,
            bounding_sphere: BoundingSphere {
                center: Vec3::ZERO,
                radius: shape.bounding_radius(),
            },
        }
    }

    #[must_use]
    pub fn new_cone(radius: f32, height: f32) -> Self {
        Self::new(BaseShape::Cone { radius, height })
    }

    #[must_use]
    pub fn new_box(width: f32, height: f32, depth: f32) -> Self {
        Self::new(BaseShape::Box {
            width,
            height,
            depth,
        })
    }

    #[must_use]
    pub fn new_sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Self::new(BaseShape::Sphere {
            radius,
            width_segments,
            height_segments,
        })
    }

    #[inline]
    #[must_use]
    pub fn shape(&self) -> &BaseShape {
        &self.shape
    }

    /// Local-space bounding sphere, computed once at construction.
    #[inline]
    #[must_use]
    pub fn bounding_sphere(&self) -> BoundingSphere {
        self.bounding_sphere
    }
}
