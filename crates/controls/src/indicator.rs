use serde::Serialize;

use crate::config::OrbitConfig;
use crate::orbit::OrbitState;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElevationTone {
    Below,
    Ground,
    Above,
}

/// Text and slider fill for the zoom and elevation indicators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Indicator {
    pub zoom_text: String,
    pub zoom_fill_percent: f64,
    pub elevation_text: String,
    pub elevation_tone: ElevationTone,
    pub elevation_fill_percent: f64,
}

impl Indicator {
    pub fn from_state(state: &OrbitState, config: &OrbitConfig) -> Self {
        let (elevation_text, elevation_tone) = elevation_label(state.elevation_offset);
        Self {
            zoom_text: format!("{}%", zoom_percent(state.zoom_level)),
            zoom_fill_percent: fill_percent(state.zoom_level, config.min_zoom, config.max_zoom),
            elevation_text,
            elevation_tone,
            elevation_fill_percent: fill_percent(
                state.elevation_offset,
                config.min_elevation,
                config.max_elevation,
            ),
        }
    }
}

/// Half-up rounding, so `-7.5` becomes `-7`.
fn round_half_up(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

pub fn zoom_percent(zoom_level: f64) -> i64 {
    round_half_up(zoom_level * 100.0)
}

pub fn elevation_label(elevation_offset: f64) -> (String, ElevationTone) {
    let n = round_half_up(elevation_offset);
    match n.signum() {
        -1 => (format!("{}m below", n.abs()), ElevationTone::Below),
        1 => (format!("{n}m above"), ElevationTone::Above),
        _ => ("0m (ground)".to_string(), ElevationTone::Ground),
    }
}

fn fill_percent(value: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    if range <= 0.0 {
        return 0.0;
    }
    ((value - min) / range * 100.0).clamp(0.0, 100.0)
}
