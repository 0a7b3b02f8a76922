//! 核心资源定义模块
//!
//! Shared, immutable base geometries referenced by many instances.

pub mod geometry;

pub use geometry::{BaseShape, BoundingSphere, Geometry, GeometryHandle};
