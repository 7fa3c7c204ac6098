use serde::Serialize;

/// On-screen buttons and their keyboard shortcuts.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    ZoomIn,
    ZoomOut,
    ElevationUp,
    ElevationDown,
    LabelSmaller,
    LabelBigger,
    ToggleAutoRotate,
}

impl Button {
    /// `KeyboardEvent.key` to button.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "+" | "=" => Some(Self::ZoomIn),
            "-" | "_" => Some(Self::ZoomOut),
            "PageUp" => Some(Self::ElevationUp),
            "PageDown" => Some(Self::ElevationDown),
            " " => Some(Self::ToggleAutoRotate),
            _ => None,
        }
    }
}

/// Viewer input, already resolved to container-relative pixels.
///
/// The first finger of a touch gesture is reported as a pointer.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum ControlInput {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    /// `delta_y < 0` zooms in (or raises the camera with `modifier`).
    Wheel { delta_y: f64, modifier: bool },
    Button(Button),
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputOutcome {
    Ignored,
    DragStarted,
    Rotated { delta: f64 },
    DragEnded,
    Zoomed { zoom_level: f64 },
    Elevated { elevation_offset: f64 },
    LabelResized { label_size: f64 },
    AutoRotate { enabled: bool },
}

impl InputOutcome {
    /// Whether the host should refresh its indicators.
    pub fn changes_indicator(&self) -> bool {
        matches!(
            self,
            Self::Zoomed { .. } | Self::Elevated { .. } | Self::LabelResized { .. } | Self::AutoRotate { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::Button;

    #[test]
    fn key_bindings() {
        assert_eq!(Button::from_key("+"), Some(Button::ZoomIn));
        assert_eq!(Button::from_key("="), Some(Button::ZoomIn));
        assert_eq!(Button::from_key("_"), Some(Button::ZoomOut));
        assert_eq!(Button::from_key("PageDown"), Some(Button::ElevationDown));
        assert_eq!(Button::from_key(" "), Some(Button::ToggleAutoRotate));
        assert_eq!(Button::from_key("a"), None);
    }
}
