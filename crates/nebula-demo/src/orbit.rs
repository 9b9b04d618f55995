//! Camera circling the demo scene.

use glam::{Mat4, Vec3};
use nebula_config::CameraConfig;
use nebula_culling::ReferenceCamera;

pub(crate) struct OrbitCamera {
    pivot: Vec3,
    radius: f32,
    height: f32,
    speed_rad_s: f32,
    projection: Mat4,
    angle: f32,
}

impl OrbitCamera {
    pub fn new(config: &CameraConfig, pivot: Vec3) -> Self {
        Self {
            pivot,
            radius: config.orbit_radius,
            height: config.orbit_height,
            speed_rad_s: config.orbit_speed_deg_s.to_radians(),
            projection: Mat4::perspective_rh(
                config.fov_y_degrees.to_radians(),
                config.aspect,
                config.near,
                config.far,
            ),
            angle: 0.0,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.angle = (self.angle + self.speed_rad_s * dt) % std::f32::consts::TAU;
    }

    pub fn eye(&self) -> Vec3 {
        let (sin, cos) = self.angle.sin_cos();
        self.pivot + Vec3::new(cos * self.radius, self.height, sin * self.radius)
    }

    pub fn reference_camera(&self) -> ReferenceCamera {
        ReferenceCamera::new(Mat4::look_at_rh(self.eye(), self.pivot, Vec3::Y), self.projection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_on_positive_x() {
        let camera = OrbitCamera::new(&CameraConfig::default(), Vec3::ZERO);
        let eye = camera.eye();
        assert!((eye.x - 60.0).abs() < 1e-4);
        assert!((eye.y - 8.0).abs() < 1e-4);
        assert!(eye.z.abs() < 1e-4);
    }

    #[test]
    fn test_quarter_turn() {
        let config = CameraConfig {
            orbit_speed_deg_s: 90.0,
            ..CameraConfig::default()
        };
        let mut camera = OrbitCamera::new(&config, Vec3::new(10.0, 0.0, 0.0));
        camera.advance(1.0);
        let eye = camera.eye();
        assert!((eye.x - 10.0).abs() < 1e-3);
        assert!((eye.z - 60.0).abs() < 1e-3);
    }

    #[test]
    fn test_pivot_is_in_view() {
        let camera = OrbitCamera::new(&CameraConfig::default(), Vec3::ZERO);
        let vp = camera.reference_camera().view_projection();
        let frustum = nebula_culling::Frustum::from_view_projection(&vp, nebula_culling::ClipDepth::ZeroToOne);
        assert!(frustum.contains_point(Vec3::ZERO));
    }
}
