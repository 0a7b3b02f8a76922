#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! Batched instance animation and depth sorting.
//!
//! Thousands of rigid instances share a few base geometries. Every frame a
//! subset of them spins, and the visible ones are ordered by camera-space depth
//! with a linear-time radix sort before being handed to a [`Renderer`].

pub mod batch;
pub mod errors;
pub mod renderer;
pub mod resources;
pub mod scene;
pub mod settings;
pub mod utils;

pub use batch::{DepthEntry, DepthSortEngine, InstanceHandle, InstancePool, RotationAnimator, TransformFactory};
pub use errors::{BatchError, Result};
pub use renderer::{DrawBatch, DrawItem, FrameDriver, FrameStats, Renderer};
pub use resources::{BaseShape, Geometry, GeometryHandle};
pub use scene::{BatchedScene, Camera, Transform};
pub use settings::{BatchSettings, RotationMode, SortAlgorithm, MAX_INSTANCE_CAPACITY};
pub use utils::OrbitControls;
