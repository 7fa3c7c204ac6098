use foundation::math::Vec3;
use foundation::viewport::Viewport;
use scene::camera::PerspectiveCamera;
use serde::Serialize;

/// Camera pose derived from the orbit state. Recomputed on demand, never stored.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraPlacement {
    pub eye: Vec3,
    pub target: Vec3,
    pub fov_y_deg: f64,
    pub near: f64,
    pub far: f64,
}

impl CameraPlacement {
    pub fn apply(&self, camera: &mut PerspectiveCamera) {
        camera.look_at(self.eye, self.target);
        camera.fov_y_rad = self.fov_y_deg.to_radians();
        camera.near = self.near;
        camera.far = self.far;
    }

    pub fn to_camera(&self, viewport: Viewport) -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(self.fov_y_deg, self.near, self.far);
        camera.set_viewport(viewport);
        self.apply(&mut camera);
        camera
    }

    pub fn eye_array(&self) -> [f64; 3] {
        [self.eye.x, self.eye.y, self.eye.z]
    }
}

impl Serialize for CameraPlacement {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("CameraPlacement", 2)?;
        s.serialize_field("eye", &self.eye_array())?;
        s.serialize_field("target", &[self.target.x, self.target.y, self.target.z])?;
        s.end()
    }
}
