//! Batch Settings & Scene Configuration
//!
//! This module defines the construction-time configuration of a batched scene.
//!
//! The settings are consumed once when a [`BatchedScene`](crate::scene::BatchedScene)
//! is built. Malformed values fail fast in [`BatchSettings::validate`] instead of
//! being clamped.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use batched_scene::settings::{BatchSettings, RotationMode};
//!
//! // Defaults: 256 instances, 16 animated per tick, radix depth sort.
//! let settings = BatchSettings::default();
//!
//! // Large transparent batch, everything spinning
//! let settings = BatchSettings {
//!     count: 10_000,
//!     dynamic_count: 10_000,
//!     opacity: 0.5,
//!     ..Default::default()
//! };
//!
//! // Or from a partial JSON document
//! let settings = BatchSettings::from_json_str(r#"{ "count": 4096 }"#)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{BatchError, Result};

/// Upper bound on the number of instance slots a single pool may reserve.
pub const MAX_INSTANCE_CAPACITY: usize = 20_000;

// ---------------------------------------------------------------------------
// RotationMode
// ---------------------------------------------------------------------------

/// How the per-tick rotation of the dynamic subset is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    /// Post-multiply the instance matrix by a cached rotation delta.
    ///
    /// Accumulates correctly regardless of the current orientation.
    #[default]
    Matrix,

    /// Decompose, add the angular velocity to the XYZ Euler angles, recompose.
    ///
    /// Mirrors the per-object scene graph path. Subject to gimbal effects.
    Euler,
}

// ---------------------------------------------------------------------------
// SortAlgorithm
// ---------------------------------------------------------------------------

/// Which ordering routine the depth sorter runs when sorting is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortAlgorithm {
    /// Quantize depth to `u32` keys and run a linear-time radix sort.
    #[default]
    Radix,

    /// Stable comparison sort on the raw depth values. O(n log n).
    ///
    /// Places special values like the radix path: `-0.0` equals `0.0`, NaN
    /// ties with `-inf` ahead of every finite depth. The two only differ on
    /// depths too close together for distinct radix keys.
    Comparison,
}

// ---------------------------------------------------------------------------
// BatchSettings
// ---------------------------------------------------------------------------

/// Configuration for a batched scene.
///
/// # Fields
///
/// | Field                       | Description                                   | Default  |
/// |-----------------------------|-----------------------------------------------|----------|
/// | `capacity`                  | Fixed number of instance slots                | 20000    |
/// | `count`                     | Instances allocated at scene setup            | 256      |
/// | `dynamic_count`             | Instances rotated per tick                    | 16       |
/// | `rotation_mode`             | Matrix composition or Euler accumulation      | `Matrix` |
/// | `sorting_enabled`           | Depth sort the draw list                      | `true`   |
/// | `sort_algorithm`            | Radix or comparison sort                      | `Radix`  |
/// | `per_object_frustum_culled` | Drop instances outside the camera frustum     | `true`   |
/// | `opacity`                   | Material opacity; `< 1.0` means transparent   | `1.0`    |
/// | `use_reversed_order`        | Force far-to-near (`Some`) or follow opacity  | `None`   |
/// | `position_bounds`           | Half extent of the spawn cube                 | `20.0`   |
/// | `seed`                      | RNG seed for reproducible layouts             | `None`   |
/// | `diagnostics`               | Log degenerate depth ranges and frame stats   | `false`  |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    // === Pool ===
    /// Maximum number of live instances. Must be in `1..=MAX_INSTANCE_CAPACITY`.
    pub capacity: usize,

    /// Number of instances allocated during scene setup.
    pub count: usize,

    // === Animation ===
    /// Size of the dynamic subset animated each tick (`0..=capacity`).
    pub dynamic_count: usize,

    /// Rotation accumulation strategy for the dynamic subset.
    pub rotation_mode: RotationMode,

    // === Sorting ===
    /// When `false` the draw list keeps submission order.
    pub sorting_enabled: bool,

    /// Routine used when sorting is enabled.
    pub sort_algorithm: SortAlgorithm,

    /// Cull instances whose bounding sphere is outside the view frustum.
    pub per_object_frustum_culled: bool,

    /// Material opacity in `[0, 1]`. Anything below `1.0` is blended.
    pub opacity: f32,

    /// Explicit far-to-near override. `None` derives it from transparency.
    pub use_reversed_order: Option<bool>,

    // === Layout ===
    /// Positions are drawn from `[-position_bounds, position_bounds]` per axis.
    pub position_bounds: f32,

    /// Seed for the transform factory. `None` uses the thread RNG.
    pub seed: Option<u64>,

    /// Enables debug logging of degenerate depth ranges and per-frame stats.
    pub diagnostics: bool,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            capacity: MAX_INSTANCE_CAPACITY,
            count: 256,
            dynamic_count: 16,
            rotation_mode: RotationMode::default(),
            sorting_enabled: true,
            sort_algorithm: SortAlgorithm::default(),
            per_object_frustum_culled: true,
            opacity: 1.0,
            use_reversed_order: None,
            position_bounds: 20.0,
            seed: None,
            diagnostics: false,
        }
    }
}

impl BatchSettings {
    /// Parses settings from JSON. Missing fields take their default values.
    ///
    /// The result is validated before it is returned.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks every range constraint, reporting the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(invalid("capacity", "must be positive"));
        }
        if self.capacity > MAX_INSTANCE_CAPACITY {
            return Err(invalid(
                "capacity",
                format!("{} exceeds the maximum of {MAX_INSTANCE_CAPACITY}", self.capacity),
            ));
        }
        if self.count > self.capacity {
            return Err(invalid(
                "count",
                format!("{} exceeds capacity {}", self.count, self.capacity),
            ));
        }
        if self.dynamic_count > self.capacity {
            return Err(invalid(
                "dynamic_count",
                format!("{} exceeds capacity {}", self.dynamic_count, self.capacity),
            ));
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(invalid(
                "opacity",
                format!("{} is outside [0, 1]", self.opacity),
            ));
        }
        if !self.position_bounds.is_finite() || self.position_bounds < 0.0 {
            return Err(invalid(
                "position_bounds",
                format!("{} must be finite and non-negative", self.position_bounds),
            ));
        }
        Ok(())
    }

    /// Returns `true` when the material is blended.
    #[inline]
    #[must_use]
    pub fn is_transparent(&self) -> bool {
        self.opacity < 1.0
    }

    /// Returns `true` when the draw list should run far-to-near.
    ///
    /// An explicit `use_reversed_order` wins over the transparency rule.
    #[inline]
    #[must_use]
    pub fn reversed(&self) -> bool {
        self.use_reversed_order
            .unwrap_or_else(|| self.is_transparent())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> BatchError {
    BatchError::InvalidConfig {
        field,
        reason: reason.into(),
    }
}
