use serde::{Deserialize, Serialize};

/// Tuning for the orbit controller. Every field has a default, so a partial
/// JSON section is enough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitConfig {
    /// Radians of orbit per pixel of horizontal drag.
    pub drag_speed: f64,
    /// Radians per frame while auto-rotating.
    pub rotation_speed: f64,
    pub auto_rotate: bool,
    pub initial_angle: f64,

    pub wheel_zoom_step: f64,
    pub wheel_elevation_step: f64,
    pub button_zoom_step: f64,
    pub button_elevation_step: f64,
    pub label_size_step: f64,

    pub min_zoom: f64,
    pub max_zoom: f64,
    pub min_elevation: f64,
    pub max_elevation: f64,
    pub min_label_size: f64,
    pub max_label_size: f64,

    pub base_radius: f64,
    pub base_height: f64,
    pub fov_y_deg: f64,
    pub near: f64,
    pub far: f64,
}

impl Default for OrbitConfig {
    fn default() -> Self {
        Self {
            drag_speed: 0.005,
            rotation_speed: 0.002,
            auto_rotate: true,
            initial_angle: 0.0,

            wheel_zoom_step: 0.1,
            wheel_elevation_step: 15.0,
            button_zoom_step: 0.2,
            button_elevation_step: 30.0,
            label_size_step: 0.1,

            min_zoom: 0.3,
            max_zoom: 2.5,
            min_elevation: -300.0,
            max_elevation: 200.0,
            min_label_size: 0.5,
            max_label_size: 2.0,

            base_radius: 336.0,
            base_height: 126.0,
            fov_y_deg: 45.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

impl OrbitConfig {
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        clamp_finite(zoom, self.min_zoom, self.max_zoom, 1.0)
    }

    pub fn clamp_elevation(&self, elevation: f64) -> f64 {
        clamp_finite(elevation, self.min_elevation, self.max_elevation, 0.0)
    }

    pub fn clamp_label_size(&self, size: f64) -> f64 {
        clamp_finite(size, self.min_label_size, self.max_label_size, 1.0)
    }
}

fn clamp_finite(value: f64, min: f64, max: f64, fallback: f64) -> f64 {
    let value = if value.is_finite() { value } else { fallback };
    value.max(min).min(max)
}

#[cfg(test)]
mod tests {
    use super::OrbitConfig;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: OrbitConfig = serde_json::from_str(r#"{ "max_zoom": 3.0, "auto_rotate": false }"#).unwrap();
        assert_eq!(cfg.max_zoom, 3.0);
        assert!(!cfg.auto_rotate);
        assert_eq!(cfg.min_zoom, 0.3);
        assert_eq!(cfg.base_radius, 336.0);
    }

    #[test]
    fn clamps_reject_non_finite_values() {
        let cfg = OrbitConfig::default();
        assert_eq!(cfg.clamp_zoom(f64::NAN), 1.0);
        assert_eq!(cfg.clamp_zoom(9.0), 2.5);
        assert_eq!(cfg.clamp_elevation(f64::NEG_INFINITY), 0.0);
        assert_eq!(cfg.clamp_elevation(-900.0), -300.0);
        assert_eq!(cfg.clamp_label_size(0.1), 0.5);
    }
}
