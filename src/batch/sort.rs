//! Depth Sort Engine
//!
//! Orders the per-frame draw list by camera-space depth in linear time.
//!
//! # Algorithm
//!
//! 1. One pass finds `min` and `max` over the finite depths, in `f64`.
//! 2. Each depth is remapped affinely onto the full `u32` range:
//!    `key = (z - min) * u32::MAX / (max - min)`, clamped. When the list holds
//!    infinite or NaN depths, `-inf` and NaN take key 0, `+inf` takes
//!    `u32::MAX` and finite depths are kept strictly between them.
//! 3. A stable LSD radix sort runs over the keys: four 8-bit digits, each a
//!    counting scatter between the caller's list and an owned scratch buffer.
//!    Digits whose values all land in one bucket are skipped.
//!
//! Descending order sorts the complemented keys ascending, so entries with equal
//! depth keep their submission order in both directions.
//!
//! The scratch buffers live in the engine and are reused every frame. They only
//! grow when the list outgrows every previous frame.

use log::debug;

use crate::batch::pool::InstanceHandle;
use crate::settings::{BatchSettings, SortAlgorithm};

const RADIX_BITS: u32 = 8;
const RADIX_BUCKETS: usize = 1 << RADIX_BITS;
const RADIX_MASK: u32 = (1 << RADIX_BITS) - 1;

/// One visible instance and its camera-space depth.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DepthEntry {
    pub handle: InstanceHandle,
    pub depth: f32,
}

impl DepthEntry {
    #[inline]
    #[must_use]
    pub fn new(handle: InstanceHandle, depth: f32) -> Self {
        Self { handle, depth }
    }
}

#[derive(Debug, Clone)]
pub struct DepthSortEngine {
    enabled: bool,
    reversed: bool,
    algorithm: SortAlgorithm,
    diagnostics: bool,

    // Working buffers, reused across frames
    keys: Vec<u32>,
    scratch_keys: Vec<u32>,
    scratch: Vec<DepthEntry>,
    entries: Vec<DepthEntry>,
    order: Vec<InstanceHandle>,
}

impl Default for DepthSortEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DepthSortEngine {
    /// Enabled, ascending (near to far), radix.
    #[must_use]
    pub fn new() -> Self {
        Self {
            enabled: true,
            reversed: false,
            algorithm: SortAlgorithm::Radix,
            diagnostics: false,

            keys: Vec::new(),
            scratch_keys: Vec::new(),
            scratch: Vec::new(),
            entries: Vec::new(),
            order: Vec::new(),
        }
    }

    #[must_use]
    pub fn from_settings(settings: &BatchSettings) -> Self {
        let mut engine = Self::new();
        engine.enabled = settings.sorting_enabled;
        engine.reversed = settings.reversed();
        engine.algorithm = settings.sort_algorithm;
        engine.diagnostics = settings.diagnostics;
        engine.reserve(settings.count);
        engine
    }

    /// Pre-sizes the working buffers for `additional` entries.
    pub fn reserve(&mut self, additional: usize) {
        self.keys.reserve(additional);
        self.scratch_keys.reserve(additional);
        self.scratch.reserve(additional);
    }

    // ========================================================================
    // Options
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabled engines leave the list in submission order.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    #[inline]
    #[must_use]
    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Far-to-near when `true`. Takes effect on the next sort only.
    pub fn set_reversed(&mut self, reversed: bool) {
        self.reversed = reversed;
    }

    #[inline]
    #[must_use]
    pub fn algorithm(&self) -> SortAlgorithm {
        self.algorithm
    }

    pub fn set_algorithm(&mut self, algorithm: SortAlgorithm) {
        self.algorithm = algorithm;
    }

    pub fn set_diagnostics(&mut self, diagnostics: bool) {
        self.diagnostics = diagnostics;
    }

    // ========================================================================
    // Sorting
    // ========================================================================

    /// Sorts `list` in place by depth.
    ///
    /// The result is a stable permutation of the input. Returns immediately,
    /// without touching the list, when the engine is disabled.
    pub fn sort(&mut self, list: &mut [DepthEntry]) {
        if !self.enabled || list.len() < 2 {
            return;
        }

        match self.algorithm {
            SortAlgorithm::Radix => self.radix_sort(list),
            SortAlgorithm::Comparison => {
                if self.reversed {
                    list.sort_by(|a, b| comparable(b.depth).total_cmp(&comparable(a.depth)));
                } else {
                    list.sort_by(|a, b| comparable(a.depth).total_cmp(&comparable(b.depth)));
                }
            }
        }
    }

    /// Sorts `(handle, depth)` pairs and returns the handles in draw order.
    ///
    /// The returned slice borrows the engine's output buffer and is overwritten
    /// by the next call.
    pub fn compute_order<I>(&mut self, input: I) -> &[InstanceHandle]
    where
        I: IntoIterator<Item = (InstanceHandle, f32)>,
    {
        let mut entries = std::mem::take(&mut self.entries);
        entries.clear();
        entries.extend(
            input
                .into_iter()
                .map(|(handle, depth)| DepthEntry::new(handle, depth)),
        );

        self.sort(&mut entries);

        self.order.clear();
        self.order.extend(entries.iter().map(|e| e.handle));
        self.entries = entries;
        &self.order
    }

    fn radix_sort(&mut self, list: &mut [DepthEntry]) {
        let (min_z, max_z) = depth_range(list);
        let span = max_z - min_z;
        let all_finite = list.iter().all(|e| e.depth.is_finite());

        if span <= 0.0 && all_finite {
            if self.diagnostics {
                debug!(
                    "Degenerate depth range ({min_z}) over {} entries, keeping submission order",
                    list.len()
                );
            }
            return;
        }

        let n = list.len();
        let Self {
            keys,
            scratch_keys,
            scratch,
            reversed,
            ..
        } = self;

        keys.clear();
        keys.extend(list.iter().map(|e| {
            let mut key = depth_key(e.depth, min_z, span);
            if !all_finite && e.depth.is_finite() {
                // The end keys belong to the infinities
                key = key.clamp(1, u32::MAX - 1);
            }
            if *reversed { !key } else { key }
        }));

        scratch.clear();
        scratch.resize(n, DepthEntry::default());
        scratch_keys.clear();
        scratch_keys.resize(n, 0);

        let mut in_list = true;
        for shift in (0..u32::BITS).step_by(RADIX_BITS as usize) {
            let moved = if in_list {
                scatter_digit(list, keys, scratch, scratch_keys, shift)
            } else {
                scatter_digit(scratch, scratch_keys, list, keys, shift)
            };
            if moved {
                in_list = !in_list;
            }
        }

        if !in_list {
            list.copy_from_slice(scratch);
        }
    }
}

/// Smallest and largest finite depth, widened to `f64`.
///
/// Infinite and NaN depths are left out so they cannot stretch the range.
/// `(0, 0)` when no depth is finite.
fn depth_range(list: &[DepthEntry]) -> (f64, f64) {
    let mut min_z = f64::INFINITY;
    let mut max_z = f64::NEG_INFINITY;
    for z in list.iter().map(|e| e.depth).filter(|z| z.is_finite()) {
        let z = f64::from(z);
        min_z = min_z.min(z);
        max_z = max_z.max(z);
    }

    if min_z > max_z { (0.0, 0.0) } else { (min_z, max_z) }
}

/// Order-preserving remap of `z` from `[min_z, min_z + span]` onto `[0, u32::MAX]`.
///
/// Computed in `f64` so neighbouring depths keep distinct keys and spans wider
/// than `f32::MAX` stay finite. `-inf` maps to 0 and `+inf` to `u32::MAX`.
/// NaN maps to 0. With a zero span every finite depth lands on the middle key.
#[inline]
pub(crate) fn depth_key(z: f32, min_z: f64, span: f64) -> u32 {
    let max_key = f64::from(u32::MAX);
    let offset = f64::from(z) - min_z;

    let key = if span > 0.0 {
        offset * (max_key / span)
    } else if offset == 0.0 {
        max_key / 2.0
    } else {
        // Only non-finite depths differ from a zero-width range
        offset * max_key
    };
    // `as` sends NaN to 0
    key.clamp(0.0, max_key) as u32
}

/// Depth as the radix path orders it: `-0.0` equals `0.0` and NaN ties with
/// `-inf` at the front.
#[inline]
fn comparable(z: f32) -> f32 {
    if z.is_nan() { f32::NEG_INFINITY } else { z + 0.0 }
}

/// One counting-sort pass on the digit at `shift`.
///
/// Returns `false`, leaving `dst` untouched, when every key shares the digit.
fn scatter_digit(
    src: &[DepthEntry],
    src_keys: &[u32],
    dst: &mut [DepthEntry],
    dst_keys: &mut [u32],
    shift: u32,
) -> bool {
    let mut counts = [0usize; RADIX_BUCKETS];
    for &key in src_keys {
        counts[((key >> shift) & RADIX_MASK) as usize] += 1;
    }

    if counts.iter().any(|&c| c == src_keys.len()) {
        return false;
    }

    let mut offsets = [0usize; RADIX_BUCKETS];
    let mut sum = 0;
    for (offset, count) in offsets.iter_mut().zip(counts) {
        *offset = sum;
        sum += count;
    }

    for (entry, &key) in src.iter().zip(src_keys) {
        let bucket = ((key >> shift) & RADIX_MASK) as usize;
        let at = offsets[bucket];
        dst[at] = *entry;
        dst_keys[at] = key;
        offsets[bucket] += 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::KeyData;

    fn handle(i: u64) -> InstanceHandle {
        // version 1 in the high bits, index in the low bits
        InstanceHandle::from(KeyData::from_ffi((1 << 32) | i))
    }

    #[test]
    fn depth_key_spans_full_range() {
        assert_eq!(depth_key(-3.0, -3.0, 8.0), 0);
        assert_eq!(depth_key(5.0, -3.0, 8.0), u32::MAX);
        let mid = depth_key(1.0, -3.0, 8.0);
        assert!(mid > u32::MAX / 2 - 2 && mid < u32::MAX / 2 + 2);
    }

    #[test]
    fn depth_key_clamps_overshoot_and_non_finite() {
        assert_eq!(depth_key(6.0, -3.0, 8.0), u32::MAX);
        assert_eq!(depth_key(-4.0, -3.0, 8.0), 0);
        assert_eq!(depth_key(f32::NAN, -3.0, 8.0), 0);
        assert_eq!(depth_key(f32::INFINITY, -3.0, 8.0), u32::MAX);
        assert_eq!(depth_key(f32::NEG_INFINITY, -3.0, 8.0), 0);
    }

    #[test]
    fn zero_span_puts_finite_depths_between_infinities() {
        let mid = depth_key(2.0, 2.0, 0.0);
        assert!(mid > 0 && mid < u32::MAX);
        assert_eq!(depth_key(f32::INFINITY, 2.0, 0.0), u32::MAX);
        assert_eq!(depth_key(f32::NEG_INFINITY, 2.0, 0.0), 0);
    }

    #[test]
    fn depth_range_ignores_non_finite() {
        let list = [
            DepthEntry::new(handle(0), f32::INFINITY),
            DepthEntry::new(handle(1), -2.0),
            DepthEntry::new(handle(2), f32::NAN),
            DepthEntry::new(handle(3), 7.0),
        ];
        assert_eq!(depth_range(&list), (-2.0, 7.0));
        assert_eq!(depth_range(&list[..1]), (0.0, 0.0));
    }

    #[test]
    fn depth_key_is_monotonic() {
        let depths: Vec<f32> = (0..1000).map(|i| -50.0 + i as f32 * 0.1).collect();
        let keys: Vec<u32> = depths.iter().map(|&z| depth_key(z, -50.0, 100.0)).collect();
        assert!(keys.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn two_entries_are_swapped() {
        let mut engine = DepthSortEngine::new();
        let mut list = vec![
            DepthEntry::new(handle(1), 1.0),
            DepthEntry::new(handle(2), 0.0),
        ];
        engine.sort(&mut list);
        assert_eq!(list[0].handle, handle(2));
        assert_eq!(list[1].handle, handle(1));
    }

    #[test]
    fn scratch_buffers_are_reused() {
        let mut engine = DepthSortEngine::new();
        let mut list: Vec<DepthEntry> = (0..512)
            .map(|i| DepthEntry::new(handle(i), (i % 37) as f32))
            .collect();

        engine.sort(&mut list);
        let capacity = engine.scratch.capacity();
        engine.sort(&mut list);
        assert_eq!(engine.scratch.capacity(), capacity);
    }
}
