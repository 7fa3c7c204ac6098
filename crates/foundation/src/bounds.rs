use crate::math::{Mat4, Vec3};

/// Axis-aligned bounding box.
///
/// The empty box has `min = +inf`, `max = -inf`; it absorbs nothing and
/// reports zero extents.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb3 {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb3 {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Aabb3 { min, max }
    }

    pub fn empty() -> Self {
        Aabb3 {
            min: Vec3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Vec3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Box of the given full extents centered on the origin.
    pub fn centered(size: Vec3) -> Self {
        let half = size.scale(0.5);
        Aabb3::new(-half, half)
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn expand_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&self, other: &Aabb3) -> Aabb3 {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        Aabb3::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        self.max - self.min
    }

    pub fn height(&self) -> f64 {
        self.size().y
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Bounds of the eight transformed corners.
    pub fn transformed(&self, m: &Mat4) -> Aabb3 {
        if self.is_empty() {
            return *self;
        }
        let mut out = Aabb3::empty();
        for c in self.corners() {
            out.expand_point(m.transform_point(c));
        }
        out
    }
}

impl Default for Aabb3 {
    fn default() -> Self {
        Aabb3::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb3;
    use crate::math::{Mat4, Vec3};

    #[test]
    fn empty_box_has_zero_height() {
        let b = Aabb3::empty();
        assert!(b.is_empty());
        assert_eq!(b.height(), 0.0);
    }

    #[test]
    fn union_ignores_empty() {
        let a = Aabb3::centered(Vec3::new(2.0, 4.0, 2.0));
        assert_eq!(a.union(&Aabb3::empty()), a);
        assert_eq!(Aabb3::empty().union(&a), a);
        assert_eq!(a.height(), 4.0);
    }

    #[test]
    fn transformed_follows_translation_and_scale() {
        let a = Aabb3::centered(Vec3::new(2.0, 2.0, 2.0));
        let m = Mat4::translation(Vec3::new(0.0, 10.0, 0.0)).mul(&Mat4::scale(Vec3::new(1.0, 3.0, 1.0)));
        let t = a.transformed(&m);
        assert_eq!(t.min, Vec3::new(-1.0, 7.0, -1.0));
        assert_eq!(t.max, Vec3::new(1.0, 13.0, 1.0));
    }
}
