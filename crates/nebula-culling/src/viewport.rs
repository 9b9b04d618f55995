//! Projected on-screen height of a bounding box, the size proxy behind LOD
//! selection.

use glam::Mat4;

use crate::bounds::Aabb;

/// Fraction of the normalized viewport height covered by the projected box.
///
/// All eight corners go through the full view-projection matrix; each clip
/// position maps to viewport Y as `0.5 + 0.5 * y / w` and the result is
/// `max(y) - min(y)`. This is an approximation: corners behind the camera flip
/// sign in the perspective divide, so the value is only meaningful for boxes
/// that passed the frustum test.
pub fn viewport_height(view_projection: &Mat4, aabb: &Aabb) -> f32 {
    let mut min_y = f32::MAX;
    let mut max_y = f32::MIN;
    for corner in aabb.corners() {
        let clip = *view_projection * corner.extend(1.0);
        let y = 0.5 + 0.5 * clip.y / clip.w;
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    max_y - min_y
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn camera_vp() -> Mat4 {
        let view = Mat4::look_to_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_2, 1.0, 0.1, 100.0);
        proj * view
    }

    /// With a 90 degree vertical FOV the visible half-height at distance d is d,
    /// so a box of half-height 1 at distance 2 covers half the viewport.
    #[test]
    fn test_height_fraction_matches_fov() {
        let aabb = Aabb::new(Vec3::new(0.0, 0.0, -2.0), Vec3::new(1.0, 1.0, 0.0));
        let h = viewport_height(&camera_vp(), &aabb);
        assert!((h - 0.5).abs() < 1e-5, "got {h}");
    }

    #[test]
    fn test_height_shrinks_with_distance() {
        let vp = camera_vp();
        let near = viewport_height(&vp, &Aabb::new(Vec3::new(0.0, 0.0, -5.0), Vec3::ONE));
        let far = viewport_height(&vp, &Aabb::new(Vec3::new(0.0, 0.0, -50.0), Vec3::ONE));
        assert!(near > far);
        assert!(far > 0.0);
    }

    #[test]
    fn test_flat_box_has_zero_height() {
        let aabb = Aabb::new(Vec3::new(0.0, 0.0, -4.0), Vec3::new(3.0, 0.0, 0.0));
        assert_eq!(viewport_height(&camera_vp(), &aabb), 0.0);
    }

    /// Identity view-projection maps y straight to `0.5 + 0.5 * y`.
    #[test]
    fn test_identity_matrix() {
        let aabb = Aabb::new(Vec3::ZERO, Vec3::new(0.0, 0.5, 0.0));
        assert_eq!(viewport_height(&Mat4::IDENTITY, &aabb), 0.5);
    }
}
