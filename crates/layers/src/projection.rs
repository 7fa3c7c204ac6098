//! Screen-space projection and distance/zoom scaling of labels.
//!
//! Everything here is a pure function of the camera, the frame parameters
//! and the anchor's world position, so a frame can be replayed exactly.

use foundation::math::{Vec2, Vec3};
use foundation::viewport::Viewport;
use scene::camera::PerspectiveCamera;
use serde::Serialize;

use crate::compass::CompassRules;
use crate::labels::LabelKind;
use crate::overlay::Padding;

pub const BASE_FONT_PX: f64 = 14.0;

/// Camera capability needed to place labels.
pub trait Projector {
    fn position(&self) -> Vec3;
    fn forward(&self) -> Vec3;
    /// Normalized device coordinates; `None` for a degenerate projection.
    /// Points behind the camera report `z > 1`.
    fn project_ndc(&self, world: Vec3) -> Option<Vec3>;
}

impl Projector for PerspectiveCamera {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn forward(&self) -> Vec3 {
        PerspectiveCamera::forward(self)
    }

    fn project_ndc(&self, world: Vec3) -> Option<Vec3> {
        self.project(world)
    }
}

/// Per-frame parameters, passed explicitly instead of read from globals.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameView {
    pub viewport: Viewport,
    pub zoom_level: f64,
    pub is_fullscreen: bool,
    pub label_size: f64,
}

impl FrameView {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    pub fn with_zoom(mut self, zoom_level: f64) -> Self {
        self.zoom_level = zoom_level;
        self
    }

    pub fn fullscreen(mut self, is_fullscreen: bool) -> Self {
        self.is_fullscreen = is_fullscreen;
        self
    }

    pub fn with_label_size(mut self, label_size: f64) -> Self {
        self.label_size = label_size;
        self
    }

    /// Zoom used for scaling; non-positive or non-finite input is neutral.
    pub fn effective_zoom(&self) -> f64 {
        if self.zoom_level.is_finite() && self.zoom_level > 0.0 {
            self.zoom_level
        } else {
            1.0
        }
    }

    fn effective_label_size(&self) -> f64 {
        if self.label_size.is_finite() && self.label_size > 0.0 {
            self.label_size
        } else {
            1.0
        }
    }
}

impl Default for FrameView {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            zoom_level: 1.0,
            is_fullscreen: false,
            label_size: 1.0,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenReason {
    Disabled,
    TargetMissing,
    Degenerate,
    BehindCamera,
    OffScreen,
    OutsideCone,
    NearEdge,
    OutOfRange,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct LabelLayout {
    pub screen_px: [f64; 2],
    pub font_px: f64,
    pub padding: Padding,
    pub text_opacity: f64,
    pub background_opacity: f64,
    pub border: bool,
    pub distance: f64,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Placement {
    Hidden { reason: HiddenReason },
    Shown(LabelLayout),
}

impl Placement {
    pub fn hidden(reason: HiddenReason) -> Self {
        Self::Hidden { reason }
    }

    pub fn is_shown(&self) -> bool {
        matches!(self, Self::Shown(_))
    }

    pub fn layout(&self) -> Option<&LabelLayout> {
        match self {
            Self::Shown(layout) => Some(layout),
            Self::Hidden { .. } => None,
        }
    }
}

pub fn screen_from_ndc(ndc: Vec3, viewport: Viewport) -> Vec2 {
    Vec2::new(
        (ndc.x * 0.5 + 0.5) * viewport.width,
        (-ndc.y * 0.5 + 0.5) * viewport.height,
    )
}

pub fn distance_scale(distance: f64) -> f64 {
    (800.0 / distance).clamp(0.5, 1.2)
}

pub fn font_size_px(distance: f64, zoom: f64, is_fullscreen: bool, label_size: f64) -> f64 {
    let fullscreen_multiplier = if is_fullscreen { 1.0 } else { 0.5 };
    let final_scale = distance_scale(distance) * zoom * zoom * fullscreen_multiplier;
    let mut font = BASE_FONT_PX * final_scale;
    if zoom <= 0.4 {
        font *= 0.6;
    } else if zoom >= 2.0 {
        font *= 1.5;
    }
    font * label_size
}

pub fn padding(zoom: f64) -> Padding {
    Padding {
        vertical_px: (2.5 * zoom).clamp(1.0, 5.0),
        horizontal_px: (8.0 * zoom).clamp(4.0, 16.0),
    }
}

pub fn background_opacity(zoom: f64) -> f64 {
    (0.7 * zoom).clamp(0.5, 0.9)
}

pub fn text_opacity(distance: f64, zoom: f64) -> f64 {
    ((500.0 / distance).clamp(0.3, 1.0) * zoom.sqrt()).min(1.0)
}

pub fn has_border(zoom: f64) -> bool {
    zoom > 1.5
}

/// Place one label whose anchor sits at `world`.
pub fn place<P: Projector + ?Sized>(
    world: Vec3,
    camera: &P,
    view: &FrameView,
    kind: LabelKind,
    compass: &CompassRules,
) -> Placement {
    let Some(ndc) = camera.project_ndc(world) else {
        return Placement::hidden(HiddenReason::Degenerate);
    };
    if ndc.z >= 1.0 {
        return Placement::hidden(HiddenReason::BehindCamera);
    }

    let screen = screen_from_ndc(ndc, view.viewport);
    let margin = match kind {
        LabelKind::Standard => 0.0,
        LabelKind::Compass => compass.margin_px,
    };
    let Viewport { width, height } = view.viewport;
    let in_bounds = screen.x > margin
        && screen.x < width - margin
        && screen.y > margin
        && screen.y < height - margin;
    if !in_bounds {
        return Placement::hidden(HiddenReason::OffScreen);
    }

    let distance = camera.position().distance(world);
    if !distance.is_finite() || distance <= 0.0 {
        return Placement::hidden(HiddenReason::Degenerate);
    }

    let zoom = view.effective_zoom();
    let text_opacity = match kind {
        LabelKind::Standard => text_opacity(distance, zoom),
        LabelKind::Compass => {
            if let Some(reason) = compass.reject(camera, world, screen, view.viewport, distance) {
                return Placement::hidden(reason);
            }
            compass.opacity
        }
    };

    Placement::Shown(LabelLayout {
        screen_px: [screen.x, screen.y],
        font_px: font_size_px(distance, zoom, view.is_fullscreen, view.effective_label_size()),
        padding: padding(zoom),
        text_opacity,
        background_opacity: background_opacity(zoom),
        border: has_border(zoom),
        distance,
    })
}
