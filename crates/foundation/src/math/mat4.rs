use super::Vec3;

/// Column-major 4x4 matrix: `m[col][row]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4 {
    pub m: [[f64; 4]; 4],
}

impl Mat4 {
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub fn from_cols(m: [[f64; 4]; 4]) -> Self {
        Self { m }
    }

    pub fn translation(t: Vec3) -> Self {
        let mut out = Self::IDENTITY;
        out.m[3] = [t.x, t.y, t.z, 1.0];
        out
    }

    pub fn scale(s: Vec3) -> Self {
        let mut out = Self::IDENTITY;
        out.m[0][0] = s.x;
        out.m[1][1] = s.y;
        out.m[2][2] = s.z;
        out
    }

    /// Rotation around +Y (right-handed).
    pub fn rotation_y(angle_rad: f64) -> Self {
        let (s, c) = angle_rad.sin_cos();
        let mut out = Self::IDENTITY;
        out.m[0] = [c, 0.0, -s, 0.0];
        out.m[2] = [s, 0.0, c, 0.0];
        out
    }

    /// Right-handed view matrix.
    pub fn look_at_rh(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let f = (target - eye).normalize();
        let s = f.cross(up).normalize();
        let u = s.cross(f);

        Self::from_cols([
            [s.x, u.x, -f.x, 0.0],
            [s.y, u.y, -f.y, 0.0],
            [s.z, u.z, -f.z, 0.0],
            [-s.dot(eye), -u.dot(eye), f.dot(eye), 1.0],
        ])
    }

    /// Right-handed perspective with OpenGL depth range: NDC z in `[-1, 1]`.
    ///
    /// Points behind the eye land at `ndc.z > 1` after the perspective divide.
    pub fn perspective_rh_gl(fov_y_rad: f64, aspect: f64, near: f64, far: f64) -> Self {
        let f = 1.0 / (0.5 * fov_y_rad).tan();
        let aspect = aspect.max(1e-6);

        Self::from_cols([
            [f / aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, (far + near) / (near - far), -1.0],
            [0.0, 0.0, (2.0 * far * near) / (near - far), 0.0],
        ])
    }

    pub fn mul(&self, b: &Self) -> Self {
        let a = &self.m;
        let mut c = [[0.0f64; 4]; 4];
        for (col, out_col) in c.iter_mut().enumerate() {
            for (row, out) in out_col.iter_mut().enumerate() {
                *out = a[0][row] * b.m[col][0]
                    + a[1][row] * b.m[col][1]
                    + a[2][row] * b.m[col][2]
                    + a[3][row] * b.m[col][3];
            }
        }
        Self { m: c }
    }

    pub fn mul_vec4(&self, v: [f64; 4]) -> [f64; 4] {
        let m = &self.m;
        let mut out = [0.0f64; 4];
        for (row, o) in out.iter_mut().enumerate() {
            *o = m[0][row] * v[0] + m[1][row] * v[1] + m[2][row] * v[2] + m[3][row] * v[3];
        }
        out
    }

    /// Affine point transform (ignores the projective row).
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let v = self.mul_vec4([p.x, p.y, p.z, 1.0]);
        Vec3::new(v[0], v[1], v[2])
    }

    pub fn translation_part(&self) -> Vec3 {
        Vec3::new(self.m[3][0], self.m[3][1], self.m[3][2])
    }

    /// Clip-space transform followed by the perspective divide.
    ///
    /// Returns `None` when `w` vanishes or the result is not finite.
    pub fn project_point(&self, p: Vec3) -> Option<Vec3> {
        let clip = self.mul_vec4([p.x, p.y, p.z, 1.0]);
        if !clip.iter().all(|c| c.is_finite()) || clip[3].abs() < 1e-12 {
            return None;
        }
        let ndc = Vec3::new(clip[0] / clip[3], clip[1] / clip[3], clip[2] / clip[3]);
        ndc.is_finite().then_some(ndc)
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::Mat4;
    use crate::math::Vec3;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn view_proj(eye: Vec3) -> Mat4 {
        let view = Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh_gl(45f64.to_radians(), 800.0 / 600.0, 0.1, 2000.0);
        proj.mul(&view)
    }

    #[test]
    fn identity_mul_is_noop() {
        let t = Mat4::translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(Mat4::IDENTITY.mul(&t), t);
        assert_eq!(t.mul(&Mat4::IDENTITY), t);
    }

    #[test]
    fn translation_then_scale_composes() {
        let m = Mat4::translation(Vec3::new(10.0, 0.0, 0.0)).mul(&Mat4::scale(Vec3::new(2.0, 2.0, 2.0)));
        assert_eq!(m.transform_point(Vec3::new(1.0, 1.0, 1.0)), Vec3::new(12.0, 2.0, 2.0));
    }

    #[test]
    fn rotation_y_turns_x_into_negative_z() {
        let p = Mat4::rotation_y(std::f64::consts::FRAC_PI_2).transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert_close(p.x, 0.0, 1e-12);
        assert_close(p.z, -1.0, 1e-12);
    }

    #[test]
    fn target_projects_to_screen_center() {
        let ndc = view_proj(Vec3::new(0.0, 0.0, 500.0))
            .project_point(Vec3::ZERO)
            .expect("in front");
        assert_close(ndc.x, 0.0, 1e-12);
        assert_close(ndc.y, 0.0, 1e-12);
        assert!(ndc.z < 1.0 && ndc.z > -1.0);
    }

    #[test]
    fn point_behind_eye_has_depth_beyond_one() {
        let ndc = view_proj(Vec3::new(0.0, 0.0, 500.0))
            .project_point(Vec3::new(0.0, 0.0, 900.0))
            .expect("finite");
        assert!(ndc.z > 1.0, "ndc.z = {}", ndc.z);
    }

    #[test]
    fn point_in_eye_plane_is_degenerate() {
        let vp = view_proj(Vec3::new(0.0, 0.0, 500.0));
        assert!(vp.project_point(Vec3::new(0.0, 0.0, 500.0)).is_none());
    }
}
