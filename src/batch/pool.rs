//! Instance Pool
//!
//! Fixed-capacity table of instances sharing a small set of base geometries.
//!
//! # Handles
//!
//! [`InstanceHandle`] is a slotmap key: it packs the slot index together with
//! the slot's generation. Releasing an instance bumps the generation, so a
//! handle to a released instance is rejected with
//! [`BatchError::InvalidHandle`] even after its slot has been reused.
//!
//! # Ordering
//!
//! Live instances are threaded on a doubly linked list in allocation order.
//! Freed slots are reused before the table grows, but a reallocated slot is
//! appended at the tail, so the newest instance always iterates last. Both
//! allocation and release stay O(1).

use glam::{Affine3A, EulerRot, Quat, Vec3};
use log::{debug, warn};
use slotmap::SlotMap;
use std::iter::FusedIterator;

use crate::batch::factory::{DEFAULT_POSITION_BOUNDS, TransformFactory};
use crate::errors::{BatchError, Result};
use crate::resources::{Geometry, GeometryHandle};
use crate::scene::transform::Transform;
use crate::settings::MAX_INSTANCE_CAPACITY;

slotmap::new_key_type! {
    /// Generation-checked handle to a live instance.
    pub struct InstanceHandle;
}

/// Per-instance state.
#[derive(Debug, Clone)]
pub struct InstanceSlot {
    geometry: GeometryHandle,
    transform: Affine3A,
    angular_velocity: Vec3,
    /// Rotation delta derived from `angular_velocity`, cached for the animator.
    spin: Affine3A,
    visible: bool,

    // Allocation-order links
    prev: Option<InstanceHandle>,
    next: Option<InstanceHandle>,
}

impl InstanceSlot {
    #[inline]
    #[must_use]
    pub fn geometry(&self) -> GeometryHandle {
        self.geometry
    }

    #[inline]
    #[must_use]
    pub fn transform(&self) -> &Affine3A {
        &self.transform
    }

    #[inline]
    #[must_use]
    pub fn angular_velocity(&self) -> Vec3 {
        self.angular_velocity
    }

    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    #[inline]
    pub(crate) fn spin(&self) -> &Affine3A {
        &self.spin
    }

    #[inline]
    pub(crate) fn set_transform(&mut self, transform: Affine3A) {
        self.transform = transform;
    }

    fn set_angular_velocity(&mut self, velocity: Vec3) {
        self.angular_velocity = velocity;
        self.spin = spin_from_velocity(velocity);
    }
}

fn spin_from_velocity(velocity: Vec3) -> Affine3A {
    if velocity == Vec3::ZERO {
        return Affine3A::IDENTITY;
    }
    Affine3A::from_quat(Quat::from_euler(
        EulerRot::XYZ,
        velocity.x,
        velocity.y,
        velocity.z,
    ))
}

/// Owner of every instance slot and registered geometry.
#[derive(Debug)]
pub struct InstancePool {
    capacity: usize,
    geometries: SlotMap<GeometryHandle, Geometry>,
    slots: SlotMap<InstanceHandle, InstanceSlot>,
    factory: TransformFactory,
    position_bounds: f32,

    /// Oldest live instance
    head: Option<InstanceHandle>,
    /// Newest live instance
    tail: Option<InstanceHandle>,
}

impl InstancePool {
    /// Creates an empty pool with an entropy-seeded transform factory.
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_factory(capacity, TransformFactory::from_entropy(), DEFAULT_POSITION_BOUNDS)
    }

    /// Creates an empty pool whose initial transforms come from `factory`.
    ///
    /// Fails with [`BatchError::InvalidConfig`] when `capacity` is zero or above
    /// [`MAX_INSTANCE_CAPACITY`].
    pub fn with_factory(
        capacity: usize,
        factory: TransformFactory,
        position_bounds: f32,
    ) -> Result<Self> {
        if capacity == 0 || capacity > MAX_INSTANCE_CAPACITY {
            return Err(BatchError::InvalidConfig {
                field: "capacity",
                reason: format!("{capacity} is outside 1..={MAX_INSTANCE_CAPACITY}"),
            });
        }

        Ok(Self {
            capacity,
            geometries: SlotMap::with_key(),
            slots: SlotMap::with_capacity_and_key(capacity),
            factory,
            position_bounds,
            head: None,
            tail: None,
        })
    }

    // ========================================================================
    // Geometry
    // ========================================================================

    /// Registers a shared base geometry. Geometries are never removed.
    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryHandle {
        let handle = self.geometries.insert(geometry);
        debug!("Registered geometry {handle:?}");
        handle
    }

    #[inline]
    #[must_use]
    pub fn geometry(&self, handle: GeometryHandle) -> Option<&Geometry> {
        self.geometries.get(handle)
    }

    #[inline]
    #[must_use]
    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    // ========================================================================
    // Allocation
    // ========================================================================

    /// Reserves a slot bound to `geometry` with a random transform and
    /// angular velocity.
    pub fn allocate(&mut self, geometry: GeometryHandle) -> Result<InstanceHandle> {
        if self.slots.len() >= self.capacity {
            warn!("Instance pool full ({} slots)", self.capacity);
            return Err(BatchError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        if !self.geometries.contains_key(geometry) {
            warn!("Allocation against unregistered geometry {geometry:?}");
            return Err(BatchError::GeometryNotFound(geometry));
        }

        let transform = self.factory.random_transform(self.position_bounds);
        let angular_velocity = self.factory.random_angular_velocity();

        let handle = self.slots.insert(InstanceSlot {
            geometry,
            transform,
            angular_velocity,
            spin: spin_from_velocity(angular_velocity),
            visible: true,
            prev: self.tail,
            next: None,
        });

        match self.tail.and_then(|tail| self.slots.get_mut(tail)) {
            Some(tail) => tail.next = Some(handle),
            None => self.head = Some(handle),
        }
        self.tail = Some(handle);

        Ok(handle)
    }

    /// Frees the slot. The handle is invalid afterwards.
    pub fn release(&mut self, handle: InstanceHandle) -> Result<()> {
        let Some(slot) = self.slots.remove(handle) else {
            warn!("Release of stale or unknown handle {handle:?}");
            return Err(BatchError::InvalidHandle(handle));
        };

        match slot.prev.and_then(|prev| self.slots.get_mut(prev)) {
            Some(prev) => prev.next = slot.next,
            None => self.head = slot.next,
        }
        match slot.next.and_then(|next| self.slots.get_mut(next)) {
            Some(next) => next.prev = slot.prev,
            None => self.tail = slot.prev,
        }
        Ok(())
    }

    /// Releases every instance. Registered geometries are kept.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = None;
        self.tail = None;
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, handle: InstanceHandle) -> bool {
        self.slots.contains_key(handle)
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of live instances.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn get(&self, handle: InstanceHandle) -> Result<&InstanceSlot> {
        self.slots
            .get(handle)
            .ok_or(BatchError::InvalidHandle(handle))
    }

    fn get_mut(&mut self, handle: InstanceHandle) -> Result<&mut InstanceSlot> {
        self.slots
            .get_mut(handle)
            .ok_or(BatchError::InvalidHandle(handle))
    }

    pub fn transform(&self, handle: InstanceHandle) -> Result<Affine3A> {
        self.get(handle).map(|slot| slot.transform)
    }

    pub fn set_transform(&mut self, handle: InstanceHandle, transform: Affine3A) -> Result<()> {
        self.get_mut(handle)?.set_transform(transform);
        Ok(())
    }

    /// Composes `trs` and stores the matrix.
    pub fn set_trs(&mut self, handle: InstanceHandle, trs: &Transform) -> Result<()> {
        self.set_transform(handle, trs.to_matrix())
    }

    pub fn geometry_of(&self, handle: InstanceHandle) -> Result<GeometryHandle> {
        self.get(handle).map(|slot| slot.geometry)
    }

    pub fn angular_velocity(&self, handle: InstanceHandle) -> Result<Vec3> {
        self.get(handle).map(|slot| slot.angular_velocity)
    }

    /// Sets the per-tick rotation in radians (XYZ Euler increments).
    pub fn set_angular_velocity(&mut self, handle: InstanceHandle, velocity: Vec3) -> Result<()> {
        self.get_mut(handle)?.set_angular_velocity(velocity);
        Ok(())
    }

    pub fn is_visible(&self, handle: InstanceHandle) -> Result<bool> {
        self.get(handle).map(|slot| slot.visible)
    }

    /// Hidden instances stay allocated but never enter a draw list.
    pub fn set_visible(&mut self, handle: InstanceHandle, visible: bool) -> Result<()> {
        self.get_mut(handle)?.visible = visible;
        Ok(())
    }

    // ========================================================================
    // Iteration
    // ========================================================================

    /// Live instances in allocation order. Lazy and restartable.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            slots: &self.slots,
            cursor: self.head,
            remaining: self.slots.len(),
        }
    }

    /// Live handles in allocation order.
    pub fn handles(&self) -> impl Iterator<Item = InstanceHandle> + '_ {
        self.iter().map(|(handle, _)| handle)
    }

    /// Visits the first `limit` live instances in allocation order.
    ///
    /// Returns the number of instances visited.
    pub(crate) fn for_each_mut(
        &mut self,
        limit: usize,
        mut visit: impl FnMut(InstanceHandle, &mut InstanceSlot),
    ) -> usize {
        let mut cursor = self.head;
        let mut visited = 0;
        while visited < limit {
            let Some(handle) = cursor else { break };
            let Some(slot) = self.slots.get_mut(handle) else { break };
            visit(handle, slot);
            cursor = slot.next;
            visited += 1;
        }
        visited
    }
}

/// Allocation-order iterator over an [`InstancePool`].
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    slots: &'a SlotMap<InstanceHandle, InstanceSlot>,
    cursor: Option<InstanceHandle>,
    remaining: usize,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (InstanceHandle, &'a InstanceSlot);

    fn next(&mut self) -> Option<Self::Item> {
        let handle = self.cursor?;
        let slot = self.slots.get(handle)?;
        self.cursor = slot.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((handle, slot))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl<'a> IntoIterator for &'a InstancePool {
    type Item = (InstanceHandle, &'a InstanceSlot);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FusedIterator for Iter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::Key;

    #[test]
    fn zero_velocity_spin_is_exact_identity() {
        assert_eq!(spin_from_velocity(Vec3::ZERO), Affine3A::IDENTITY);
    }

    #[test]
    fn spin_matches_euler_rotation() {
        let v = Vec3::new(0.01, 0.002, 0.005);
        let expected = Quat::from_euler(EulerRot::XYZ, v.x, v.y, v.z);
        let (_, rotation, _) = spin_from_velocity(v).to_scale_rotation_translation();
        assert!(rotation.angle_between(expected) < 1e-5);
    }

    fn slot_index(handle: InstanceHandle) -> u64 {
        handle.data().as_ffi() & 0xffff_ffff
    }

    #[test]
    fn freed_slot_is_reused_but_appended_to_order() {
        let mut pool = InstancePool::with_factory(4, TransformFactory::from_seed(1), 20.0).unwrap();
        let geo = pool.add_geometry(Geometry::new_box(2.0, 2.0, 2.0));

        let a = pool.allocate(geo).unwrap();
        let b = pool.allocate(geo).unwrap();
        pool.release(a).unwrap();
        let c = pool.allocate(geo).unwrap();

        assert_eq!(slot_index(c), slot_index(a));
        let order: Vec<_> = pool.handles().collect();
        assert_eq!(order, vec![b, c]);
    }

    #[test]
    fn links_survive_release_at_every_position() {
        let mut pool = InstancePool::with_factory(8, TransformFactory::from_seed(1), 20.0).unwrap();
        let geo = pool.add_geometry(Geometry::new_box(2.0, 2.0, 2.0));
        let h: Vec<_> = (0..5).map(|_| pool.allocate(geo).unwrap()).collect();

        pool.release(h[2]).unwrap(); // middle
        pool.release(h[0]).unwrap(); // head
        pool.release(h[4]).unwrap(); // tail
        assert_eq!(pool.head, Some(h[1]));
        assert_eq!(pool.tail, Some(h[3]));
        assert_eq!(pool.handles().collect::<Vec<_>>(), vec![h[1], h[3]]);

        pool.release(h[1]).unwrap();
        pool.release(h[3]).unwrap();
        assert_eq!((pool.head, pool.tail), (None, None));
        assert_eq!(pool.iter().len(), 0);

        let fresh = pool.allocate(geo).unwrap();
        assert_eq!(pool.handles().collect::<Vec<_>>(), vec![fresh]);
    }

    #[test]
    fn for_each_mut_stops_at_limit() {
        let mut pool = InstancePool::with_factory(8, TransformFactory::from_seed(1), 20.0).unwrap();
        let geo = pool.add_geometry(Geometry::new_box(2.0, 2.0, 2.0));
        let h: Vec<_> = (0..4).map(|_| pool.allocate(geo).unwrap()).collect();

        let mut seen = Vec::new();
        assert_eq!(pool.for_each_mut(2, |handle, _| seen.push(handle)), 2);
        assert_eq!(seen, &h[..2]);
        assert_eq!(pool.for_each_mut(10, |_, _| {}), 4);
    }
}
