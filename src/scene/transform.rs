use glam::{Affine3A, EulerRot, Quat, Vec3};

/// Transform 组件
///
/// Decomposed TRS form of an instance matrix. The pool stores the composed
/// [`Affine3A`]; this type is the editing view used when a transform is built
/// or when rotation is accumulated per axis.
///
/// Composition order is always scale → rotate → translate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    #[must_use]
    pub fn new() -> Self {
        Self::IDENTITY
    }

    #[must_use]
    pub fn from_trs(position: Vec3, rotation: Quat, uniform_scale: f32) -> Self {
        Self {
            position,
            rotation,
            scale: Vec3::splat(uniform_scale),
        }
    }

    /// Composes the matrix (scale, then rotation, then translation).
    #[inline]
    #[must_use]
    pub fn to_matrix(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    /// Decomposes a matrix. Shear, if any, is lost.
    #[must_use]
    pub fn from_matrix(matrix: &Affine3A) -> Self {
        let (scale, rotation, position) = matrix.to_scale_rotation_translation();
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Helper：设置欧拉角旋转 (XYZ)
    pub fn set_rotation_euler(&mut self, x: f32, y: f32, z: f32) {
        self.rotation = Quat::from_euler(EulerRot::XYZ, x, y, z);
    }

    /// 获取当前的欧拉角 (XYZ 顺序)
    #[must_use]
    pub fn rotation_euler(&self) -> Vec3 {
        let (x, y, z) = self.rotation.to_euler(EulerRot::XYZ);
        Vec3::new(x, y, z)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
