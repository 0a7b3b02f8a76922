//! Error Types
//!
//! This module defines the error types used throughout the crate.
//!
//! # Overview
//!
//! The main error type [`BatchError`] covers all failure modes including:
//! - Misuse of the instance pool (full pool, stale or unknown handles)
//! - Unknown geometry references
//! - Malformed configuration
//!
//! A degenerate depth range (every instance at the same camera-space depth) is
//! not an error: the depth sorter falls back to submission order.
//!
//! # Usage
//!
//! All fallible public APIs return [`Result<T>`] which is an alias for
//! `std::result::Result<T, BatchError>`.
//!
//! ```rust,ignore
//! use batched_scene::errors::{BatchError, Result};
//!
//! fn spawn(pool: &mut InstancePool, geo: GeometryHandle) -> Result<()> {
//!     let handle = pool.allocate(geo)?;
//!     pool.set_visible(handle, true)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::batch::InstanceHandle;
use crate::resources::GeometryHandle;

/// The main error type for the batched instance system.
///
/// `CapacityExceeded` and `InvalidHandle` signal caller bugs. They are fatal to
/// the failing operation only; the caller decides whether to skip the instance
/// or abort the frame.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BatchError {
    // ========================================================================
    // Pool Errors
    // ========================================================================
    /// The pool already holds `capacity` live instances.
    #[error("Instance capacity exceeded: all {capacity} slots are in use")]
    CapacityExceeded {
        /// Fixed capacity of the pool
        capacity: usize,
    },

    /// The handle was released, never allocated, or belongs to a reused slot.
    #[error("Invalid instance handle: {0:?}")]
    InvalidHandle(InstanceHandle),

    /// The geometry was never registered with the pool.
    #[error("Geometry not registered: {0:?}")]
    GeometryNotFound(GeometryHandle),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// A configuration value is out of its accepted range.
    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfig {
        /// Name of the offending setting
        field: &'static str,
        /// Human-readable description of the violated constraint
        reason: String,
    },

    /// Settings document could not be parsed.
    #[error("JSON parse error: {0}")]
    JsonError(String),
}

// ============================================================================
// Convenient conversion implementations
// ============================================================================

impl From<serde_json::Error> for BatchError {
    fn from(err: serde_json::Error) -> Self {
        BatchError::JsonError(err.to_string())
    }
}

/// Alias for `Result<T, BatchError>`.
pub type Result<T> = std::result::Result<T, BatchError>;
