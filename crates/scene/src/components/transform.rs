use foundation::math::{Mat4, Vec3};

/// Local transform relative to the parent node.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation_y_rad: f64,
    pub scale: Vec3,
}

impl Transform {
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation_y_rad: 0.0,
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn translate(position: Vec3) -> Self {
        Self {
            position,
            ..Self::identity()
        }
    }

    pub fn with_rotation_y(mut self, angle_rad: f64) -> Self {
        self.rotation_y_rad = angle_rad;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// `T * R * S`, the usual scene-graph order.
    pub fn matrix(&self) -> Mat4 {
        Mat4::translation(self.position)
            .mul(&Mat4::rotation_y(self.rotation_y_rad))
            .mul(&Mat4::scale(self.scale))
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::Transform;
    use foundation::math::Vec3;

    #[test]
    fn identity_is_origin() {
        let transform = Transform::identity();
        assert_eq!(transform.position, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(transform.matrix().transform_point(Vec3::Y), Vec3::Y);
    }

    #[test]
    fn scale_applies_before_translation() {
        let t = Transform::translate(Vec3::new(5.0, 0.0, 0.0)).with_scale(Vec3::new(2.0, 2.0, 2.0));
        assert_eq!(t.matrix().transform_point(Vec3::new(1.0, 1.0, 0.0)), Vec3::new(7.0, 2.0, 0.0));
    }
}
