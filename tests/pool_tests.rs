//! InstancePool and TransformFactory tests
//!
//! Tests for:
//! - Capacity enforcement and slot reuse
//! - Stale-handle detection across release / reallocation
//! - Transform read/write isolation between handles
//! - Geometry registration checks
//! - Randomized transform ranges and seeding

use glam::{Affine3A, Quat, Vec3};
use batched_scene::batch::{InstancePool, TransformFactory};
use batched_scene::errors::BatchError;
use batched_scene::resources::{Geometry, GeometryHandle};
use batched_scene::scene::Transform;
use batched_scene::settings::MAX_INSTANCE_CAPACITY;

// ============================================================================
// Helper
// ============================================================================

fn new_pool(capacity: usize) -> (InstancePool, GeometryHandle) {
    let mut pool = InstancePool::with_factory(capacity, TransformFactory::from_seed(7), 20.0)
        .expect("valid capacity");
    let geo = pool.add_geometry(Geometry::new_box(2.0, 2.0, 2.0));
    (pool, geo)
}

fn marker(i: usize) -> Affine3A {
    Affine3A::from_translation(Vec3::new(i as f32, -(i as f32), 0.5))
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn pool_rejects_zero_capacity() {
    let err = InstancePool::new(0).unwrap_err();
    assert!(matches!(err, BatchError::InvalidConfig { field: "capacity", .. }));
}

#[test]
fn pool_rejects_capacity_above_maximum() {
    let err = InstancePool::new(MAX_INSTANCE_CAPACITY + 1).unwrap_err();
    assert!(matches!(err, BatchError::InvalidConfig { field: "capacity", .. }));
    assert!(InstancePool::new(MAX_INSTANCE_CAPACITY).is_ok());
}

// ============================================================================
// Allocation & Release
// ============================================================================

#[test]
fn pool_allocate_until_full() {
    let (mut pool, geo) = new_pool(3);
    for _ in 0..3 {
        pool.allocate(geo).unwrap();
    }
    assert_eq!(pool.len(), 3);

    let err = pool.allocate(geo).unwrap_err();
    assert_eq!(err, BatchError::CapacityExceeded { capacity: 3 });
}

#[test]
fn pool_release_frees_capacity() {
    let (mut pool, geo) = new_pool(2);
    let a = pool.allocate(geo).unwrap();
    pool.allocate(geo).unwrap();

    pool.release(a).unwrap();
    assert_eq!(pool.len(), 1);
    assert!(pool.allocate(geo).is_ok());
}

#[test]
fn pool_double_release_is_invalid() {
    let (mut pool, geo) = new_pool(2);
    let a = pool.allocate(geo).unwrap();
    pool.release(a).unwrap();
    assert_eq!(pool.release(a), Err(BatchError::InvalidHandle(a)));
}

#[test]
fn pool_allocate_unknown_geometry_fails() {
    let (mut pool, _) = new_pool(2);
    let (mut other, _) = new_pool(2);
    // Register a second geometry elsewhere so its key is unknown to `pool`
    other.add_geometry(Geometry::new_cone(1.0, 2.0));
    let foreign = other.add_geometry(Geometry::new_sphere(1.0, 16, 8));

    assert_eq!(
        pool.allocate(foreign),
        Err(BatchError::GeometryNotFound(foreign))
    );
    assert!(pool.is_empty());
}

#[test]
fn pool_allocation_binds_geometry_and_is_visible() {
    let (mut pool, box_geo) = new_pool(4);
    let cone = pool.add_geometry(Geometry::new_cone(1.0, 2.0));

    let a = pool.allocate(box_geo).unwrap();
    let b = pool.allocate(cone).unwrap();

    assert_eq!(pool.geometry_of(a).unwrap(), box_geo);
    assert_eq!(pool.geometry_of(b).unwrap(), cone);
    assert!(pool.is_visible(a).unwrap());
    assert_eq!(pool.geometry_count(), 2);
}

// ============================================================================
// Stale Handles
// ============================================================================

#[test]
fn stale_handle_rejected_after_slot_reuse() {
    let (mut pool, geo) = new_pool(1);
    let old = pool.allocate(geo).unwrap();
    pool.release(old).unwrap();

    // Same slot, new generation
    let new = pool.allocate(geo).unwrap();
    assert_ne!(old, new);

    assert_eq!(pool.transform(old), Err(BatchError::InvalidHandle(old)));
    assert_eq!(
        pool.set_transform(old, Affine3A::IDENTITY),
        Err(BatchError::InvalidHandle(old))
    );
    assert_eq!(pool.is_visible(old), Err(BatchError::InvalidHandle(old)));
    assert_eq!(
        pool.set_angular_velocity(old, Vec3::ONE),
        Err(BatchError::InvalidHandle(old))
    );
    assert!(!pool.contains(old));
    assert!(pool.contains(new));
}

#[test]
fn no_cross_talk_under_churn() {
    let (mut pool, geo) = new_pool(16);
    let mut live = Vec::new();
    let mut expected = std::collections::HashMap::new();
    let mut stale = Vec::new();

    for round in 0..8 {
        for i in 0..4 {
            let h = pool.allocate(geo).unwrap();
            let m = marker(round * 10 + i);
            pool.set_transform(h, m).unwrap();
            expected.insert(h, m);
            live.push(h);
        }
        // Release every other live handle
        let mut keep = Vec::new();
        for (i, h) in live.drain(..).enumerate() {
            if i % 2 == 0 {
                pool.release(h).unwrap();
                expected.remove(&h);
                stale.push(h);
            } else {
                keep.push(h);
            }
        }
        live = keep;
    }

    for (&h, m) in &expected {
        assert_eq!(pool.transform(h).unwrap(), *m);
    }
    for h in stale {
        assert_eq!(pool.transform(h), Err(BatchError::InvalidHandle(h)));
    }
    assert_eq!(pool.len(), expected.len());
}

// ============================================================================
// Transforms
// ============================================================================

#[test]
fn set_transform_then_get_roundtrips() {
    let (mut pool, geo) = new_pool(2);
    let h = pool.allocate(geo).unwrap();
    let m = Affine3A::from_scale_rotation_translation(
        Vec3::splat(0.75),
        Quat::from_rotation_z(0.4),
        Vec3::new(1.0, 2.0, 3.0),
    );
    pool.set_transform(h, m).unwrap();
    assert_eq!(pool.transform(h).unwrap(), m);
}

#[test]
fn set_trs_composes_scale_rotate_translate() {
    let (mut pool, geo) = new_pool(1);
    let h = pool.allocate(geo).unwrap();
    let trs = Transform::from_trs(Vec3::new(5.0, 0.0, 0.0), Quat::from_rotation_y(0.3), 2.0);
    pool.set_trs(h, &trs).unwrap();

    let m = pool.transform(h).unwrap();
    // Unit X is scaled, then rotated, then moved
    let expected = trs.rotation * (Vec3::X * 2.0) + trs.position;
    assert!((m.transform_point3(Vec3::X) - expected).length() < 1e-5);
}

#[test]
fn iteration_follows_allocation_order_and_restarts() {
    let (mut pool, geo) = new_pool(8);
    let handles: Vec<_> = (0..5).map(|_| pool.allocate(geo).unwrap()).collect();

    let first: Vec<_> = pool.handles().collect();
    let second: Vec<_> = pool.iter().map(|(h, _)| h).collect();
    assert_eq!(first, handles);
    assert_eq!(second, handles);
}

#[test]
fn reallocated_slots_iterate_after_older_instances() {
    let (mut pool, geo) = new_pool(8);
    let h: Vec<_> = (0..4).map(|_| pool.allocate(geo).unwrap()).collect();

    pool.release(h[0]).unwrap();
    pool.release(h[2]).unwrap();
    let n1 = pool.allocate(geo).unwrap();
    let n2 = pool.allocate(geo).unwrap();

    let order: Vec<_> = pool.handles().collect();
    assert_eq!(order, vec![h[1], h[3], n1, n2]);
    assert_eq!(pool.iter().len(), 4);

    // Restartable after churn
    assert_eq!((&pool).into_iter().map(|(h, _)| h).collect::<Vec<_>>(), order);
}

// ============================================================================
// TransformFactory
// ============================================================================

#[test]
fn factory_transform_ranges() {
    let mut factory = TransformFactory::from_seed(99);
    for _ in 0..500 {
        let trs = factory.random_trs(20.0);
        assert!(trs.position.abs().max_element() <= 20.0);
        assert!((trs.rotation.length() - 1.0).abs() < 1e-4);
        assert!(trs.scale.x >= 0.5 && trs.scale.x <= 1.0);
        assert_eq!(trs.scale.x, trs.scale.y);
        assert_eq!(trs.scale.y, trs.scale.z);
    }
}

#[test]
fn factory_velocity_ranges() {
    let mut factory = TransformFactory::from_seed(3);
    for _ in 0..500 {
        let v = factory.random_angular_velocity();
        assert!(v.min_element() >= 0.0);
        assert!(v.max_element() <= 0.01);
    }
}

#[test]
fn factory_is_deterministic_per_seed() {
    let mut a = TransformFactory::from_seed(42);
    let mut b = TransformFactory::from_seed(42);
    for _ in 0..10 {
        assert_eq!(a.random_transform(20.0), b.random_transform(20.0));
        assert_eq!(a.random_angular_velocity(), b.random_angular_velocity());
    }
}

#[test]
fn factory_zero_bounds_places_at_origin() {
    let mut factory = TransformFactory::from_seed(5);
    let trs = factory.random_trs(0.0);
    assert_eq!(trs.position, Vec3::ZERO);
}
