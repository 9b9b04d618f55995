//! View frustum extraction and AABB visibility testing.
//!
//! Planes are extracted once per frame from the combined view-projection
//! matrix, then every registered box is tested against the same six planes.

use glam::{Mat4, Vec3, Vec4};

use crate::bounds::Aabb;

/// Plane indices into the frustum planes array.
const LEFT: usize = 0;
const RIGHT: usize = 1;
const BOTTOM: usize = 2;
const TOP: usize = 3;
const NEAR: usize = 4;
const FAR: usize = 5;

/// Signed distance below which the positive vertex counts as outside.
pub const PLANE_EPSILON: f32 = -1e-10;

/// Depth range of clip space produced by the projection matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClipDepth {
    /// `0 <= z <= w`. glam's `perspective_rh`/`perspective_lh`, wgpu, D3D, Vulkan.
    #[default]
    ZeroToOne,
    /// `-w <= z <= w`. glam's `*_gl` projections, OpenGL.
    NegativeOneToOne,
}

/// A view frustum defined by six inward-pointing planes.
#[derive(Clone, Debug, PartialEq)]
pub struct Frustum {
    /// Left, right, bottom, top, near, far. Each `Vec4(a, b, c, d)` holds a
    /// unit inward normal `(a, b, c)` and the distance term `d`.
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a combined view-projection matrix
    /// (Gribb-Hartmann).
    pub fn from_view_projection(vp: &Mat4, depth: ClipDepth) -> Self {
        let rows = [vp.row(0), vp.row(1), vp.row(2), vp.row(3)];

        let mut planes = [Vec4::ZERO; 6];
        planes[LEFT] = rows[3] + rows[0];
        planes[RIGHT] = rows[3] - rows[0];
        planes[BOTTOM] = rows[3] + rows[1];
        planes[TOP] = rows[3] - rows[1];
        planes[NEAR] = match depth {
            ClipDepth::ZeroToOne => rows[2],
            ClipDepth::NegativeOneToOne => rows[3] + rows[2],
        };
        planes[FAR] = rows[3] - rows[2];

        for plane in &mut planes {
            let len = plane.truncate().length();
            if len > 0.0 {
                *plane /= len;
            }
        }

        Self { planes }
    }

    /// The six planes in left, right, bottom, top, near, far order.
    pub fn planes(&self) -> &[Vec4; 6] {
        &self.planes
    }

    /// Returns `true` if the box intersects or lies inside the frustum.
    ///
    /// Positive-vertex test: for each plane, the corner most aligned with the
    /// plane normal is `center + extents * sign(normal)`. If that corner lies
    /// further than [`PLANE_EPSILON`] behind any plane, the box is outside.
    /// Conservative near frustum corners, never rejects a visible box.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        for plane in &self.planes {
            let normal = plane.truncate();
            let p = aabb.center + aabb.extents * sign(normal);
            if normal.dot(p) + plane.w < PLANE_EPSILON {
                return false;
            }
        }
        true
    }

    /// Returns `true` if the point is inside or on the frustum.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.intersects_aabb(&Aabb::from_point(point))
    }
}

/// Component-wise sign with `sign(0) == 0`.
fn sign(v: Vec3) -> Vec3 {
    fn s(x: f32) -> f32 {
        if x > 0.0 {
            1.0
        } else if x < 0.0 {
            -1.0
        } else {
            0.0
        }
    }
    Vec3::new(s(v.x), s(v.y), s(v.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_camera_vp() -> Mat4 {
        let view = Mat4::look_to_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let proj = Mat4::perspective_rh(std::f32::consts::FRAC_PI_4, 16.0 / 9.0, 0.1, 1000.0);
        proj * view
    }

    fn default_frustum() -> Frustum {
        Frustum::from_view_projection(&default_camera_vp(), ClipDepth::ZeroToOne)
    }

    #[test]
    fn test_object_in_front_visible() {
        let frustum = default_frustum();
        let aabb = Aabb::from_min_max(Vec3::new(-1.0, -1.0, -5.0), Vec3::new(1.0, 1.0, -3.0));
        assert!(frustum.intersects_aabb(&aabb));
    }

    #[test]
    fn test_object_behind_camera_not_visible() {
        let frustum = default_frustum();
        let aabb = Aabb::from_min_max(Vec3::new(-1.0, -1.0, 5.0), Vec3::new(1.0, 1.0, 10.0));
        assert!(!frustum.intersects_aabb(&aabb));
    }

    #[test]
    fn test_object_partially_in_frustum_is_visible() {
        let frustum = default_frustum();
        let aabb = Aabb::from_min_max(Vec3::new(-100.0, -1.0, -10.0), Vec3::new(1.0, 1.0, -5.0));
        assert!(frustum.intersects_aabb(&aabb));
    }

    #[test]
    fn test_all_six_planes_tested() {
        let frustum = default_frustum();

        let left = Aabb::from_min_max(Vec3::new(-1000.0, 0.0, -5.0), Vec3::new(-999.0, 1.0, -4.0));
        assert!(!frustum.intersects_aabb(&left));

        let right = Aabb::from_min_max(Vec3::new(999.0, 0.0, -5.0), Vec3::new(1000.0, 1.0, -4.0));
        assert!(!frustum.intersects_aabb(&right));

        let above = Aabb::from_min_max(Vec3::new(0.0, 999.0, -5.0), Vec3::new(1.0, 1000.0, -4.0));
        assert!(!frustum.intersects_aabb(&above));

        let below = Aabb::from_min_max(Vec3::new(0.0, -1000.0, -5.0), Vec3::new(1.0, -999.0, -4.0));
        assert!(!frustum.intersects_aabb(&below));

        let too_near = Aabb::from_min_max(Vec3::new(-0.01, -0.01, -0.05), Vec3::new(0.01, 0.01, -0.02));
        assert!(!frustum.intersects_aabb(&too_near));

        let beyond_far = Aabb::from_min_max(Vec3::new(0.0, 0.0, -2000.0), Vec3::new(1.0, 1.0, -1500.0));
        assert!(!frustum.intersects_aabb(&beyond_far));
    }

    /// Zero-extent boxes behave as point tests.
    #[test]
    fn test_degenerate_box_point_test() {
        let frustum = default_frustum();
        assert!(frustum.contains_point(Vec3::new(0.0, 0.0, -10.0)));
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, 10.0)));
        assert!(!frustum.contains_point(Vec3::new(500.0, 0.0, -10.0)));
    }

    #[test]
    fn test_planes_are_normalized() {
        let frustum = default_frustum();
        for plane in frustum.planes() {
            let normal_len = plane.truncate().length();
            assert!(
                (normal_len - 1.0).abs() < 1e-4,
                "plane normal not normalized: {normal_len}"
            );
        }
    }

    /// GL-style projections need the `-w <= z` near plane.
    #[test]
    fn test_gl_depth_convention() {
        let view = Mat4::look_to_rh(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);
        let proj = Mat4::perspective_rh_gl(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 100.0);
        let frustum = Frustum::from_view_projection(&(proj * view), ClipDepth::NegativeOneToOne);

        assert!(frustum.contains_point(Vec3::new(0.0, 0.0, -2.0)));
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, -0.5)));
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, -200.0)));
    }

    #[test]
    fn test_orthographic_projection() {
        let proj = Mat4::orthographic_rh(-10.0, 10.0, -10.0, 10.0, 0.0, 100.0);
        let frustum = Frustum::from_view_projection(&proj, ClipDepth::ZeroToOne);

        assert!(frustum.contains_point(Vec3::new(9.0, -9.0, -50.0)));
        assert!(!frustum.contains_point(Vec3::new(11.0, 0.0, -50.0)));
        let straddling = Aabb::new(Vec3::new(10.5, 0.0, -50.0), Vec3::ONE);
        assert!(frustum.intersects_aabb(&straddling));
    }

    /// A box whose nearest face lies exactly on a plane is kept; one just
    /// past it is culled.
    #[test]
    fn test_box_touching_plane_stays_visible() {
        let proj = Mat4::orthographic_rh(-10.0, 10.0, -10.0, 10.0, 0.0, 100.0);
        let frustum = Frustum::from_view_projection(&proj, ClipDepth::ZeroToOne);

        // Left face at x = 10, on the right plane.
        let touching_right = Aabb::new(Vec3::new(12.0, 0.0, -50.0), Vec3::new(2.0, 1.0, 1.0));
        assert!(frustum.intersects_aabb(&touching_right));
        let past_right = Aabb::new(Vec3::new(12.5, 0.0, -50.0), Vec3::new(2.0, 1.0, 1.0));
        assert!(!frustum.intersects_aabb(&past_right));

        // Far face at z = 0, on the near plane.
        let touching_near = Aabb::new(Vec3::new(0.0, 0.0, 1.0), Vec3::ONE);
        assert!(frustum.intersects_aabb(&touching_near));
        assert!(frustum.contains_point(Vec3::new(10.0, 0.0, -50.0)));
    }
}
