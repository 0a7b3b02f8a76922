pub mod batched_scene;
pub mod camera;
pub mod transform;

pub use batched_scene::BatchedScene;
pub use camera::{Camera, Frustum};
pub use transform::Transform;
