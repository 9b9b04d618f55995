//! Axis-aligned bounding boxes in center/extents form.

use glam::{Mat4, Vec3};

/// An axis-aligned bounding box stored as center and half-extents.
///
/// Extents are expected to be non-negative on every axis. A zero extent is
/// allowed and describes a flat box or a single point.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Aabb {
    /// Center of the box.
    pub center: Vec3,
    /// Half-size along each axis.
    pub extents: Vec3,
}

impl Aabb {
    /// A zero-sized box at the origin.
    pub const ZERO: Self = Self {
        center: Vec3::ZERO,
        extents: Vec3::ZERO,
    };

    /// Create a box from its center and half-extents.
    pub fn new(center: Vec3, extents: Vec3) -> Self {
        Self { center, extents }
    }

    /// Create a box from two corners. Components are sorted, so the corners
    /// may be passed in any order.
    pub fn from_min_max(a: Vec3, b: Vec3) -> Self {
        let min = a.min(b);
        let max = a.max(b);
        Self {
            center: (min + max) * 0.5,
            extents: (max - min) * 0.5,
        }
    }

    /// A degenerate box describing a single point.
    pub fn from_point(point: Vec3) -> Self {
        Self {
            center: point,
            extents: Vec3::ZERO,
        }
    }

    /// Minimum corner.
    pub fn min(&self) -> Vec3 {
        self.center - self.extents
    }

    /// Maximum corner.
    pub fn max(&self) -> Vec3 {
        self.center + self.extents
    }

    /// Full size along each axis.
    pub fn size(&self) -> Vec3 {
        self.extents * 2.0
    }

    /// The eight corners.
    ///
    /// Order: x varies slowest, z fastest (`min,min,min`, `min,min,max`,
    /// `min,max,min`, ... `max,max,max`).
    pub fn corners(&self) -> [Vec3; 8] {
        let lo = self.min();
        let hi = self.max();
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Returns the box enclosing this box after transforming it by an affine
    /// matrix (typically local-to-world).
    pub fn transformed(&self, matrix: &Mat4) -> Aabb {
        let mut lo = Vec3::splat(f32::INFINITY);
        let mut hi = Vec3::splat(f32::NEG_INFINITY);
        for corner in self.corners() {
            let p = matrix.transform_point3(corner);
            lo = lo.min(p);
            hi = hi.max(p);
        }
        Aabb::from_min_max(lo, hi)
    }

    /// Bitwise comparison, so that `-0.0` vs `0.0` or differing NaN payloads
    /// count as a change.
    pub fn bitwise_eq(&self, other: &Aabb) -> bool {
        let a = [self.center.to_array(), self.extents.to_array()];
        let b = [other.center.to_array(), other.extents.to_array()];
        a.iter()
            .flatten()
            .zip(b.iter().flatten())
            .all(|(x, y)| x.to_bits() == y.to_bits())
    }
}
