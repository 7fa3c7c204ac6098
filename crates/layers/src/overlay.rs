use std::cell::RefCell;
use std::rc::Rc;

use foundation::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::labels::{LabelId, LabelKind};

/// Label text color: a packed `0xRRGGBB` value or any CSS color string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelColor {
    Hex(u32),
    Css(String),
}

impl LabelColor {
    pub fn to_css(&self) -> String {
        match self {
            Self::Hex(rgb) => format!("#{:06x}", rgb & 0x00ff_ffff),
            Self::Css(s) if s.trim().is_empty() => "white".to_string(),
            Self::Css(s) => s.clone(),
        }
    }
}

impl Default for LabelColor {
    fn default() -> Self {
        Self::Css(String::new())
    }
}

impl From<u32> for LabelColor {
    fn from(rgb: u32) -> Self {
        Self::Hex(rgb)
    }
}

impl From<&str> for LabelColor {
    fn from(css: &str) -> Self {
        Self::Css(css.to_string())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize)]
pub struct Padding {
    pub vertical_px: f64,
    pub horizontal_px: f64,
}

/// One on-screen overlay element driven by the label system.
pub trait RenderTarget {
    fn set_visible(&mut self, visible: bool);
    /// Center of the element in container pixels.
    fn set_position(&mut self, screen: Vec2);
    fn set_size(&mut self, font_px: f64, padding: Padding);
    fn set_opacity(&mut self, text: f64, background: f64);
    fn set_border(&mut self, border: bool);
    fn set_highlight(&mut self, highlighted: bool);
    /// Remove the element from its container. Called once, at teardown.
    fn dispose(&mut self);
}

/// Factory for overlay elements inside the host's overlay layer.
pub trait OverlayContainer {
    type Target: RenderTarget;

    /// `id` is the label the element will belong to, so hosts can route
    /// pointer events back to it.
    fn create(&mut self, id: LabelId, text: &str, color: &LabelColor, kind: LabelKind) -> Self::Target;
}

/// Last style written to an in-memory overlay element.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct OverlayStyle {
    pub text: String,
    pub color: String,
    pub visible: bool,
    pub screen_px: [f64; 2],
    pub font_px: f64,
    pub padding: Padding,
    pub text_opacity: f64,
    pub background_opacity: f64,
    pub border: bool,
    pub highlighted: bool,
}

type Slots = Rc<RefCell<Vec<Option<OverlayStyle>>>>;

/// Headless overlay that records element state; used by the probe tool and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryOverlay {
    slots: Slots,
}

impl MemoryOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Elements created and not yet disposed.
    pub fn live_count(&self) -> usize {
        self.slots.borrow().iter().filter(|s| s.is_some()).count()
    }

    pub fn style(&self, index: usize) -> Option<OverlayStyle> {
        self.slots.borrow().get(index).cloned().flatten()
    }

    pub fn styles(&self) -> Vec<OverlayStyle> {
        self.slots.borrow().iter().flatten().cloned().collect()
    }
}

#[derive(Debug)]
pub struct MemoryTarget {
    slot: usize,
    slots: Slots,
}

impl MemoryTarget {
    fn with(&self, f: impl FnOnce(&mut OverlayStyle)) {
        if let Some(Some(style)) = self.slots.borrow_mut().get_mut(self.slot) {
            f(style);
        }
    }
}

impl OverlayContainer for MemoryOverlay {
    type Target = MemoryTarget;

    fn create(&mut self, _id: LabelId, text: &str, color: &LabelColor, _kind: LabelKind) -> MemoryTarget {
        let mut slots = self.slots.borrow_mut();
        slots.push(Some(OverlayStyle {
            text: text.to_string(),
            color: color.to_css(),
            ..OverlayStyle::default()
        }));
        MemoryTarget {
            slot: slots.len() - 1,
            slots: Rc::clone(&self.slots),
        }
    }
}

impl RenderTarget for MemoryTarget {
    fn set_visible(&mut self, visible: bool) {
        self.with(|s| s.visible = visible);
    }

    fn set_position(&mut self, screen: Vec2) {
        self.with(|s| s.screen_px = [screen.x, screen.y]);
    }

    fn set_size(&mut self, font_px: f64, padding: Padding) {
        self.with(|s| {
            s.font_px = font_px;
            s.padding = padding;
        });
    }

    fn set_opacity(&mut self, text: f64, background: f64) {
        self.with(|s| {
            s.text_opacity = text;
            s.background_opacity = background;
        });
    }

    fn set_border(&mut self, border: bool) {
        self.with(|s| s.border = border);
    }

    fn set_highlight(&mut self, highlighted: bool) {
        self.with(|s| s.highlighted = highlighted);
    }

    fn dispose(&mut self) {
        if let Some(slot) = self.slots.borrow_mut().get_mut(self.slot) {
            *slot = None;
        }
    }
}
