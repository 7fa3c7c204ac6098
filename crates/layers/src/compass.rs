use foundation::math::{Vec2, Vec3};
use foundation::viewport::Viewport;
use serde::{Deserialize, Serialize};

use crate::projection::{HiddenReason, Projector};

/// Extra visibility gates for compass (N/S/E/W) markers.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompassRules {
    pub margin_px: f64,
    /// Half-angle of the cone around the camera forward axis.
    pub max_angle_rad: f64,
    /// Minimum distance to any viewport edge, as a fraction of `min(w, h)`.
    pub edge_fraction: f64,
    pub min_distance: f64,
    pub max_distance: f64,
    pub opacity: f64,
}

impl Default for CompassRules {
    fn default() -> Self {
        Self {
            margin_px: 30.0,
            max_angle_rad: std::f64::consts::PI / 18.0,
            edge_fraction: 0.3,
            min_distance: 300.0,
            max_distance: 5000.0,
            opacity: 0.8,
        }
    }
}

impl CompassRules {
    /// First rule the marker fails, if any.
    pub fn reject<P: Projector + ?Sized>(
        &self,
        camera: &P,
        world: Vec3,
        screen: Vec2,
        viewport: Viewport,
        distance: f64,
    ) -> Option<HiddenReason> {
        let to_anchor = (world - camera.position()).normalize();
        if camera.forward().angle_to(to_anchor) > self.max_angle_rad {
            return Some(HiddenReason::OutsideCone);
        }

        let threshold = viewport.min_side() * self.edge_fraction;
        let edge = screen
            .x
            .min(viewport.width - screen.x)
            .min(screen.y)
            .min(viewport.height - screen.y);
        if edge < threshold {
            return Some(HiddenReason::NearEdge);
        }

        if distance < self.min_distance || distance > self.max_distance {
            return Some(HiddenReason::OutOfRange);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelKind;
    use crate::projection::{FrameView, Placement, place};
    use scene::camera::PerspectiveCamera;

    fn camera() -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::default();
        camera.far = 10_000.0;
        camera.set_viewport(Viewport::new(800.0, 600.0));
        camera.look_at(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        camera
    }

    fn compass(world: Vec3) -> Placement {
        let view = FrameView::new(Viewport::new(800.0, 600.0));
        place(world, &camera(), &view, LabelKind::Compass, &CompassRules::default())
    }

    #[test]
    fn marker_straight_ahead_is_shown_with_fixed_opacity() {
        let p = compass(Vec3::new(0.0, 0.0, -1200.0));
        let layout = p.layout().expect("shown");
        assert_eq!(layout.text_opacity, 0.8);
    }

    #[test]
    fn marker_off_axis_is_hidden() {
        // ~14 degrees off the forward axis, still inside the frustum.
        let p = compass(Vec3::new(300.0, 0.0, -1200.0));
        assert_eq!(p, Placement::hidden(HiddenReason::OutsideCone));
    }

    #[test]
    fn marker_too_close_or_far_is_hidden() {
        assert_eq!(compass(Vec3::new(0.0, 0.0, -200.0)), Placement::hidden(HiddenReason::OutOfRange));
        assert_eq!(compass(Vec3::new(0.0, 0.0, -6000.0)), Placement::hidden(HiddenReason::OutOfRange));
    }

    #[test]
    fn near_edge_rule_uses_min_side() {
        let rules = CompassRules::default();
        let viewport = Viewport::new(800.0, 600.0);
        // 180 px threshold; 150 px from the top edge.
        let reason = rules.reject(&camera(), Vec3::new(0.0, 0.0, -1200.0), Vec2::new(400.0, 150.0), viewport, 1200.0);
        assert_eq!(reason, Some(HiddenReason::NearEdge));
        let reason = rules.reject(&camera(), Vec3::new(0.0, 0.0, -1200.0), Vec2::new(400.0, 300.0), viewport, 1200.0);
        assert_eq!(reason, None);
    }
}
