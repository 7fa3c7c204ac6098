//! Orbit camera controller for the world map.
//!
//! - Horizontal drag orbits the camera around the origin
//! - Auto-rotation advances the orbit each frame while idle
//! - Wheel and buttons change zoom, elevation and label size, clamped on
//!   every change

use foundation::math::{Vec2, Vec3};
use foundation::viewport::Viewport;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::OrbitConfig;
use crate::indicator::{self, Indicator};
use crate::input::{Button, ControlInput, InputOutcome};
use crate::placement::CameraPlacement;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlsError {
    #[error("no viewport container; orbit controls are disabled")]
    MissingContainer,
}

/// Mutable orbit state. `angle` is never normalized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrbitState {
    pub angle: f64,
    pub zoom_level: f64,
    pub elevation_offset: f64,
    pub label_size: f64,
    pub dragging: bool,
    pub last_pointer_x: f64,
    pub auto_rotate: bool,
}

impl OrbitState {
    pub fn new(config: &OrbitConfig) -> Self {
        Self {
            angle: config.initial_angle,
            zoom_level: config.clamp_zoom(1.0),
            elevation_offset: config.clamp_elevation(0.0),
            label_size: config.clamp_label_size(1.0),
            dragging: false,
            last_pointer_x: 0.0,
            auto_rotate: config.auto_rotate,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OrbitController {
    config: OrbitConfig,
    state: OrbitState,
    viewport: Option<Viewport>,
}

impl OrbitController {
    /// Attach to a viewport. Without one the controller is inert: input is
    /// ignored and the camera stays at the initial angle.
    pub fn attach(config: OrbitConfig, viewport: Option<Viewport>) -> Self {
        let mut state = OrbitState::new(&config);
        if viewport.is_none() {
            warn!(error = %ControlsError::MissingContainer, "orbit controls not attached");
            state.auto_rotate = false;
        }
        Self {
            config,
            state,
            viewport,
        }
    }

    /// Like [`attach`](Self::attach) but reports the missing container.
    pub fn try_attach(config: OrbitConfig, viewport: Option<Viewport>) -> Result<Self, ControlsError> {
        match viewport {
            Some(v) => Ok(Self::attach(config, Some(v))),
            None => Err(ControlsError::MissingContainer),
        }
    }

    pub fn is_interactive(&self) -> bool {
        self.viewport.is_some()
    }

    pub fn config(&self) -> &OrbitConfig {
        &self.config
    }

    pub fn state(&self) -> &OrbitState {
        &self.state
    }

    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Track container resizes.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if let Some(v) = self.viewport.as_mut() {
            *v = viewport;
        }
    }

    pub fn zoom_level(&self) -> f64 {
        self.state.zoom_level
    }

    pub fn elevation_offset(&self) -> f64 {
        self.state.elevation_offset
    }

    pub fn label_size(&self) -> f64 {
        self.state.label_size
    }

    pub fn angle(&self) -> f64 {
        self.state.angle
    }

    pub fn is_dragging(&self) -> bool {
        self.state.dragging
    }

    pub fn zoom_percent(&self) -> i64 {
        indicator::zoom_percent(self.state.zoom_level)
    }

    pub fn elevation_label(&self) -> String {
        indicator::elevation_label(self.state.elevation_offset).0
    }

    pub fn indicator(&self) -> Indicator {
        Indicator::from_state(&self.state, &self.config)
    }

    pub fn handle(&mut self, input: ControlInput) -> InputOutcome {
        let Some(viewport) = self.viewport else {
            return InputOutcome::Ignored;
        };

        let outcome = match input {
            ControlInput::PointerDown { x, y } => self.pointer_down(viewport, x, y),
            ControlInput::PointerMove { x, .. } => self.pointer_move(x),
            ControlInput::PointerUp => self.pointer_up(),
            ControlInput::Wheel { delta_y, modifier } => self.wheel(delta_y, modifier),
            ControlInput::Button(button) => self.button(button),
        };
        if !matches!(outcome, InputOutcome::Ignored | InputOutcome::Rotated { .. }) {
            debug!(?outcome, "orbit input");
        }
        outcome
    }

    fn pointer_down(&mut self, viewport: Viewport, x: f64, y: f64) -> InputOutcome {
        if !viewport.contains(Vec2::new(x, y)) {
            return InputOutcome::Ignored;
        }
        self.state.dragging = true;
        self.state.last_pointer_x = x;
        InputOutcome::DragStarted
    }

    fn pointer_move(&mut self, x: f64) -> InputOutcome {
        if !self.state.dragging || !x.is_finite() {
            return InputOutcome::Ignored;
        }
        let delta = (self.state.last_pointer_x - x) * self.config.drag_speed;
        self.state.angle += delta;
        self.state.last_pointer_x = x;
        InputOutcome::Rotated { delta }
    }

    fn pointer_up(&mut self) -> InputOutcome {
        if !self.state.dragging {
            return InputOutcome::Ignored;
        }
        self.state.dragging = false;
        InputOutcome::DragEnded
    }

    fn wheel(&mut self, delta_y: f64, modifier: bool) -> InputOutcome {
        if delta_y == 0.0 || !delta_y.is_finite() {
            return InputOutcome::Ignored;
        }
        let direction = if delta_y < 0.0 { 1.0 } else { -1.0 };
        if modifier {
            self.change_elevation(direction * self.config.wheel_elevation_step)
        } else {
            self.change_zoom(direction * self.config.wheel_zoom_step)
        }
    }

    fn button(&mut self, button: Button) -> InputOutcome {
        let zoom_step = self.config.button_zoom_step;
        let elevation_step = self.config.button_elevation_step;
        let size_step = self.config.label_size_step;
        match button {
            Button::ZoomIn => self.change_zoom(zoom_step),
            Button::ZoomOut => self.change_zoom(-zoom_step),
            Button::ElevationUp => self.change_elevation(elevation_step),
            Button::ElevationDown => self.change_elevation(-elevation_step),
            Button::LabelBigger => self.change_label_size(size_step),
            Button::LabelSmaller => self.change_label_size(-size_step),
            Button::ToggleAutoRotate => {
                self.state.auto_rotate = !self.state.auto_rotate;
                InputOutcome::AutoRotate {
                    enabled: self.state.auto_rotate,
                }
            }
        }
    }

    fn change_zoom(&mut self, step: f64) -> InputOutcome {
        self.state.zoom_level = self.config.clamp_zoom(self.state.zoom_level + step);
        InputOutcome::Zoomed {
            zoom_level: self.state.zoom_level,
        }
    }

    fn change_elevation(&mut self, step: f64) -> InputOutcome {
        self.state.elevation_offset = self
            .config
            .clamp_elevation(self.state.elevation_offset + step);
        InputOutcome::Elevated {
            elevation_offset: self.state.elevation_offset,
        }
    }

    fn change_label_size(&mut self, step: f64) -> InputOutcome {
        self.resize_labels(self.state.label_size + step)
    }

    /// Absolute label size, as set by a slider. Same rounding and range as the
    /// step buttons.
    pub fn set_label_size(&mut self, size: f64) -> InputOutcome {
        if !self.is_interactive() || !size.is_finite() {
            return InputOutcome::Ignored;
        }
        self.resize_labels(size)
    }

    fn resize_labels(&mut self, size: f64) -> InputOutcome {
        // One decimal place, so repeated steps land on 0.1 multiples.
        let next = (size * 10.0).round() / 10.0;
        self.state.label_size = self.config.clamp_label_size(next);
        InputOutcome::LabelResized {
            label_size: self.state.label_size,
        }
    }

    pub fn set_auto_rotate(&mut self, enabled: bool) {
        if self.is_interactive() {
            self.state.auto_rotate = enabled;
        }
    }

    /// Advance one display frame. Returns whether the orbit moved.
    pub fn update(&mut self, label_hovered: bool) -> bool {
        if !self.is_interactive() || self.state.dragging || !self.state.auto_rotate || label_hovered {
            return false;
        }
        self.state.angle += self.config.rotation_speed;
        true
    }

    pub fn placement(&self) -> CameraPlacement {
        let cfg = &self.config;
        let zoom = self.state.zoom_level.max(1e-6);
        let radius = cfg.base_radius / zoom;
        let height = cfg.base_height / zoom + self.state.elevation_offset;
        let (sin, cos) = self.state.angle.sin_cos();
        CameraPlacement {
            eye: Vec3::new(radius * cos, height, radius * sin),
            target: Vec3::ZERO,
            fov_y_deg: cfg.fov_y_deg,
            near: cfg.near,
            far: cfg.far,
        }
    }
}
