//! End-to-end frame scenarios driven through the public [`CullingGroup`] API.

use glam::{Mat4, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::bounds::Aabb;
use crate::error::CullingError;
use crate::group::{CullingGroup, ReferenceCamera};
use crate::pass::ExecutionStrategy;
use crate::state::ChangeEvent;
use crate::worker_pool::WorkerPool;

/// 90 degree square frustum at `eye` looking down -Z. A box with y-extent
/// `e` and zero depth at distance `d` covers `e / d` of the viewport.
fn camera_at(eye: Vec3) -> ReferenceCamera {
    let view = Mat4::look_to_rh(eye, Vec3::NEG_Z, Vec3::Y);
    let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 1000.0);
    ReferenceCamera::new(view, proj)
}

fn flat_box(z: f32, half_height: f32) -> Aabb {
    Aabb::new(Vec3::new(0.0, 0.0, z), Vec3::new(0.5, half_height, 0.0))
}

#[test]
fn test_visible_at_registration_then_camera_leaves() {
    let mut group = CullingGroup::with_capacity(10);
    group.set_reference_camera(Some(camera_at(Vec3::ZERO)));
    group.add(Aabb::new(Vec3::new(0.0, 0.0, -10.0), Vec3::ONE)).unwrap();

    assert!(group.update().is_empty(), "seeded visible, nothing to report");

    group.set_reference_camera(Some(camera_at(Vec3::new(0.0, 0.0, -50.0))));
    let events = group.update();
    assert_eq!(events.len(), 1);
    assert!(events[0].became_invisible());
    assert_eq!(events[0].slot, 0);
}

#[test]
fn test_lod_crossing_between_frames() {
    let mut group = CullingGroup::with_capacity(4);
    group.set_reference_camera(Some(camera_at(Vec3::ZERO)));
    group.set_lod_thresholds(Some([1.0, 0.5, 0.25].as_slice())).unwrap();
    group.add(flat_box(-10.0, 6.0)).unwrap();

    // Height 0.6 sits in bucket 1, same as the seed.
    assert!(group.update().is_empty());
    assert!((group.get_state(0).unwrap().viewport_height - 0.6).abs() < 1e-4);

    group.set_bounds(0, flat_box(-10.0, 4.0)).unwrap();
    let events = group.update();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].previous_lod(), 1);
    assert_eq!(events[0].current_lod(), 2);
    assert!(events[0].is_visible());
    assert!(events[0].was_visible());
}

#[test]
fn test_remove_only_volume() {
    let mut group = CullingGroup::with_capacity(4);
    group.set_reference_camera(Some(camera_at(Vec3::ZERO)));
    group.add(flat_box(-5.0, 1.0)).unwrap();
    group.update();

    assert_eq!(group.remove_at(0), Ok(None));
    assert_eq!(group.count(), 0);
    assert!(group.get_state(0).is_none());
    assert!(group.update().is_empty());
}

#[test]
fn test_remove_middle_volume_moves_last_state() {
    let mut group = CullingGroup::with_capacity(4);
    group.set_reference_camera(Some(camera_at(Vec3::ZERO)));
    group.add(flat_box(-5.0, 1.0)).unwrap();
    group.add(flat_box(-6.0, 1.0)).unwrap();
    // Behind the camera.
    group.add(flat_box(5.0, 1.0)).unwrap();
    assert_eq!(group.update().len(), 1);

    let relocation = group.remove_at(0).unwrap().unwrap();
    assert_eq!((relocation.from, relocation.to), (2, 0));
    assert!(!group.get_state(0).unwrap().visible);
    // The moved volume keeps its history, so nothing is re-reported.
    assert!(group.update().is_empty());
}

#[test]
fn test_add_remove_round_trip_reuses_slot() {
    let mut group = CullingGroup::with_capacity(2);
    group.add(flat_box(-5.0, 1.0)).unwrap();
    let slot = group.add(flat_box(-6.0, 1.0)).unwrap();
    assert_eq!(group.add(flat_box(-7.0, 1.0)), Err(CullingError::OutOfCapacity { capacity: 2 }));

    group.remove_at(slot).unwrap();
    assert_eq!(group.add(flat_box(-7.0, 1.0)), Ok(slot));
    assert_eq!(group.count(), 2);
}

#[test]
fn test_check_event_twice_is_silent() {
    let mut group = CullingGroup::with_capacity(4);
    group.set_reference_camera(Some(camera_at(Vec3::ZERO)));
    group.add(flat_box(20.0, 1.0)).unwrap();
    group.add(flat_box(-20.0, 1.0)).unwrap();
    let from_update: Vec<ChangeEvent> = group.update().to_vec();
    assert_eq!(from_update.len(), 1);

    assert_eq!(group.check_event().to_vec(), from_update);
    assert!(group.check_event().is_empty());
}

/// Many frames with a wandering camera: both strategies report the same
/// events, in the same order, every frame.
#[test]
fn test_parallel_and_sequential_groups_agree() {
    let mut rng = ChaCha8Rng::seed_from_u64(2024);
    let mut sequential = CullingGroup::with_capacity(2500);
    let mut parallel = CullingGroup::with_capacity(2500);
    parallel.set_execution(ExecutionStrategy::Parallel(WorkerPool::new(4, 64).unwrap()));

    for group in [&mut sequential, &mut parallel] {
        group.set_lod_thresholds(Some([1.0, 0.5, 0.25, 0.025].as_slice())).unwrap();
    }
    for _ in 0..2500 {
        let center = Vec3::new(
            rng.random_range(-200.0..200.0),
            rng.random_range(-2.0..2.0),
            rng.random_range(-200.0..200.0),
        );
        let aabb = Aabb::new(center, Vec3::splat(rng.random_range(0.1..3.0)));
        sequential.add(aabb).unwrap();
        parallel.add(aabb).unwrap();
    }

    for frame in 0..20 {
        let eye = Vec3::new(rng.random_range(-100.0..100.0), 5.0, rng.random_range(-100.0..100.0));
        let target = Vec3::new(rng.random_range(-50.0..50.0), 0.0, rng.random_range(-50.0..50.0));
        let camera = ReferenceCamera::new(
            Mat4::look_at_rh(eye, target, Vec3::Y),
            Mat4::perspective_rh(1.0, 16.0 / 9.0, 0.1, 400.0),
        );
        sequential.set_reference_camera(Some(camera));
        parallel.set_reference_camera(Some(camera));

        let expected = sequential.update().to_vec();
        let actual = parallel.update().to_vec();
        assert_eq!(expected, actual, "frame {frame}");
    }
}
