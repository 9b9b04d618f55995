//! Grid layout of instanced columns for the demo scene.

use glam::{Mat4, Vec3};
use nebula_config::DemoConfig;
use nebula_culling::Aabb;
use rand::Rng;

/// Radius of every column in a row.
pub(crate) const COLUMN_RADIUS: f32 = 0.05;
/// Length of a single column along x.
pub(crate) const COLUMN_LENGTH: f32 = 1.0;

/// One row of `number` columns laid out along local +z.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ColumnRow {
    pub position: Vec3,
    pub number: u32,
    /// Gap between neighbouring columns.
    pub space: f32,
}

impl ColumnRow {
    /// Distance between column centers.
    fn step(&self) -> f32 {
        self.space + COLUMN_RADIUS * 2.0
    }

    /// Box around every column, in the row's local space.
    pub fn local_bounds(&self) -> Aabb {
        let length = COLUMN_RADIUS + self.number.saturating_sub(1) as f32 * self.step();
        Aabb::new(
            Vec3::new(0.0, 0.0, length * 0.5),
            Vec3::new(COLUMN_LENGTH * 0.5, COLUMN_RADIUS, length * 0.5),
        )
    }

    pub fn local_to_world(&self) -> Mat4 {
        Mat4::from_translation(self.position)
    }
}

/// Lay out `instance_count` rows on a grid: x advances by `x_step` and wraps
/// back to 0 past `x_max`, moving z forward by `z_step`.
pub(crate) fn spawn_grid(config: &DemoConfig, rng: &mut impl Rng) -> Vec<ColumnRow> {
    let mut rows = Vec::with_capacity(config.instance_count);
    let (mut x, mut z) = (0.0_f32, 0.0_f32);
    for _ in 0..config.instance_count {
        let y = if config.y_jitter > 0.0 {
            rng.gen_range(-config.y_jitter..config.y_jitter)
        } else {
            0.0
        };
        rows.push(random_row(Vec3::new(x, y, z), rng));

        x += config.x_step;
        if x > config.x_max {
            x = 0.0;
            z += config.z_step;
        }
    }
    rows
}

/// A row at `position` with a random column count and spacing.
pub(crate) fn random_row(position: Vec3, rng: &mut impl Rng) -> ColumnRow {
    ColumnRow {
        position,
        number: rng.gen_range(13..120),
        space: rng.gen_range(0.05..0.2),
    }
}

/// Center of the populated area, used as the camera orbit pivot.
pub(crate) fn grid_center(rows: &[ColumnRow]) -> Vec3 {
    if rows.is_empty() {
        return Vec3::ZERO;
    }
    let (min, max) = rows.iter().fold(
        (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
        |(min, max), row| (min.min(row.position), max.max(row.position)),
    );
    (min + max) * 0.5
}
