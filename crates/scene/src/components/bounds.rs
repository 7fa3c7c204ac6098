use foundation::bounds::Aabb3;
use foundation::math::Vec3;

/// Geometry bounds of a mesh in its own local space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ComponentBounds {
    pub local: Aabb3,
}

impl ComponentBounds {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            local: Aabb3::new(min, max),
        }
    }

    /// Box of the given full size, centered on the mesh origin.
    pub fn sized(size: Vec3) -> Self {
        Self {
            local: Aabb3::centered(size),
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        let (min, max) = (self.local.min, self.local.max);
        point.x >= min.x
            && point.x <= max.x
            && point.y >= min.y
            && point.y <= max.y
            && point.z >= min.z
            && point.z <= max.z
    }
}

#[cfg(test)]
mod tests {
    use super::ComponentBounds;
    use foundation::math::Vec3;

    #[test]
    fn contains_point_inside() {
        let bounds = ComponentBounds::new(Vec3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(bounds.contains(Vec3::new(0.5, 0.0, -0.5)));
    }

    #[test]
    fn rejects_point_outside() {
        let bounds = ComponentBounds::sized(Vec3::new(2.0, 2.0, 2.0));
        assert!(!bounds.contains(Vec3::new(2.0, 0.0, 0.0)));
    }
}
