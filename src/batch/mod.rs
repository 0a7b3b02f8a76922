//! Batched instance core
//!
//! - [`TransformFactory`]: random rigid transforms and angular velocities
//! - [`InstancePool`]: fixed-capacity, generation-checked instance storage
//! - [`RotationAnimator`]: per-tick rotation of the dynamic subset
//! - [`DepthSortEngine`]: linear-time depth ordering of the draw list

pub mod animator;
pub mod factory;
pub mod pool;
pub mod sort;

pub use animator::RotationAnimator;
pub use factory::TransformFactory;
pub use pool::{InstanceHandle, InstancePool, InstanceSlot, Iter};
pub use sort::{DepthEntry, DepthSortEngine};
