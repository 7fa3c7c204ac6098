use foundation::math::{Mat4, Vec3};
use foundation::viewport::Viewport;

/// Perspective camera supplied by the scene graph.
///
/// Defaults match the world map: 45° vertical field of view, near 0.1,
/// far 2000, looking at the origin.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_rad: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 500.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y_rad: 45f64.to_radians(),
            aspect: 1.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

impl PerspectiveCamera {
    pub fn new(fov_y_deg: f64, near: f64, far: f64) -> Self {
        Self {
            fov_y_rad: fov_y_deg.to_radians(),
            near,
            far,
            ..Self::default()
        }
    }

    /// Aspect ratio from the viewport; degenerate sizes fall back to 1.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.aspect = viewport.aspect();
    }

    pub fn look_at(&mut self, position: Vec3, target: Vec3) {
        self.position = position;
        self.target = target;
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize()
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_rad, self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection().mul(&self.view())
    }

    /// World point to normalized device coordinates.
    pub fn project(&self, world: Vec3) -> Option<Vec3> {
        self.view_proj().project_point(world)
    }
}

#[cfg(test)]
mod tests {
    use super::PerspectiveCamera;
    use foundation::math::Vec3;
    use foundation::viewport::Viewport;

    #[test]
    fn origin_projects_to_center() {
        let mut camera = PerspectiveCamera::default();
        camera.set_viewport(Viewport::new(800.0, 600.0));
        let ndc = camera.project(Vec3::ZERO).expect("visible");
        assert!(ndc.x.abs() < 1e-12 && ndc.y.abs() < 1e-12);
        assert!(ndc.z < 1.0);
    }

    #[test]
    fn point_above_center_projects_up() {
        let mut camera = PerspectiveCamera::default();
        camera.set_viewport(Viewport::new(800.0, 600.0));
        let ndc = camera.project(Vec3::new(0.0, 50.0, 0.0)).expect("visible");
        assert!(ndc.y > 0.0);
    }

    #[test]
    fn forward_points_at_target() {
        let mut camera = PerspectiveCamera::default();
        camera.look_at(Vec3::new(10.0, 0.0, 0.0), Vec3::ZERO);
        assert_eq!(camera.forward(), Vec3::new(-1.0, 0.0, 0.0));
    }

    #[test]
    fn degenerate_viewport_keeps_square_aspect() {
        let mut camera = PerspectiveCamera::default();
        camera.set_viewport(Viewport::new(0.0, 600.0));
        assert_eq!(camera.aspect, 1.0);
    }
}
