//! Utility Module
//!
//! - [`OrbitControls`]: auto-rotating camera orbit

pub mod orbit_control;

pub use orbit_control::OrbitControls;
