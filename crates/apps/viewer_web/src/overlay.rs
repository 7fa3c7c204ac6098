use foundation::math::Vec2;
use layers::{LabelColor, LabelId, LabelKind, OverlayContainer, Padding, RenderTarget};
use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlElement};

pub const LABEL_ID_ATTR: &str = "data-label-id";

const LAYER_STYLE: &str = "position:absolute;left:0;top:0;width:100%;height:100%;\
pointer-events:none;overflow:hidden;";
const LABEL_STYLE: &str = "position:absolute;left:0;top:0;display:none;white-space:nowrap;\
pointer-events:auto;cursor:pointer;border-radius:4px;font-family:sans-serif;\
background-color:rgba(0,0,0,0.7);";
const COMPASS_STYLE: &str = "border-radius:50%;width:30px;height:30px;\
align-items:center;justify-content:center;font-weight:bold;";
const HIGHLIGHT_BACKGROUND: &str = "rgba(20, 20, 30, 0.85)";

/// An element that can take itself out of the page.
pub trait Detach {
    fn detach(&self);
}

impl Detach for HtmlElement {
    fn detach(&self) {
        self.remove();
    }
}

/// Owns a mounted element and detaches it once, on `remove` or drop.
pub struct LayerGuard<T: Detach> {
    element: T,
    attached: bool,
}

impl<T: Detach> LayerGuard<T> {
    pub fn new(element: T) -> Self {
        Self {
            element,
            attached: true,
        }
    }

    pub fn element(&self) -> &T {
        &self.element
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn remove(&mut self) {
        if self.attached {
            self.attached = false;
            self.element.detach();
        }
    }
}

impl<T: Detach> Drop for LayerGuard<T> {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Transparent layer over the viewport holding one `div` per label.
///
/// The layer leaves the page when the overlay is dropped.
pub struct DomOverlay {
    document: Document,
    layer: LayerGuard<HtmlElement>,
}

impl DomOverlay {
    pub fn attach(document: &Document, container: &HtmlElement) -> Result<Self, JsValue> {
        let layer: HtmlElement = document.create_element("div")?.dyn_into()?;
        layer.set_class_name("atlas-label-layer");
        layer.set_attribute("style", LAYER_STYLE)?;
        container.append_child(&layer)?;
        Ok(Self {
            document: document.clone(),
            layer: LayerGuard::new(layer),
        })
    }

    pub fn layer(&self) -> &HtmlElement {
        self.layer.element()
    }

    fn create_element(&self, id: LabelId, text: &str, color: &str, kind: LabelKind) -> Result<HtmlElement, JsValue> {
        let el: HtmlElement = self.document.create_element("div")?.dyn_into()?;
        el.set_text_content(Some(text));
        el.set_attribute(LABEL_ID_ATTR, &id.0.to_string())?;
        let mut style = String::from(LABEL_STYLE);
        match kind {
            LabelKind::Standard => el.set_class_name("label3d"),
            LabelKind::Compass => {
                el.set_class_name("label3d compass-label");
                style.push_str(COMPASS_STYLE);
            }
        }
        style.push_str(&format!("color:{color};"));
        el.set_attribute("style", &style)?;
        self.layer.element().append_child(&el)?;
        Ok(el)
    }
}

impl OverlayContainer for DomOverlay {
    type Target = DomLabel;

    fn create(&mut self, id: LabelId, text: &str, color: &LabelColor, kind: LabelKind) -> DomLabel {
        let color = color.to_css();
        let element = match self.create_element(id, text, &color, kind) {
            Ok(el) => Some(el),
            Err(err) => {
                warn!(label = %text, error = ?err, "label element not created");
                None
            }
        };
        DomLabel {
            element,
            color,
            background: 0.7,
            highlighted: false,
            display: match kind {
                LabelKind::Standard => "block",
                LabelKind::Compass => "flex",
            },
        }
    }
}

/// A label `div`. Inert if the element could not be created.
pub struct DomLabel {
    element: Option<HtmlElement>,
    color: String,
    background: f64,
    highlighted: bool,
    display: &'static str,
}

impl DomLabel {
    fn set(&self, property: &str, value: &str) {
        if let Some(el) = &self.element {
            let _ = el.style().set_property(property, value);
        }
    }
}

impl RenderTarget for DomLabel {
    fn set_visible(&mut self, visible: bool) {
        self.set("display", if visible { self.display } else { "none" });
    }

    fn set_position(&mut self, screen: Vec2) {
        self.set("transform", &transform_css(screen));
    }

    fn set_size(&mut self, font_px: f64, padding: Padding) {
        self.set("font-size", &px(font_px));
        self.set("padding", &padding_css(padding));
    }

    fn set_opacity(&mut self, text: f64, background: f64) {
        self.set("opacity", &text.to_string());
        self.background = background;
        self.set("background-color", &label_background(self.highlighted, background));
    }

    fn set_border(&mut self, border: bool) {
        self.set("border", border_css(border));
    }

    fn set_highlight(&mut self, highlighted: bool) {
        if let Some(el) = &self.element {
            let _ = el.class_list().toggle_with_force("label3d-glow", highlighted);
        }
        self.highlighted = highlighted;
        self.set("background-color", &label_background(highlighted, self.background));
        if highlighted {
            self.set("color", "white");
        } else {
            let color = self.color.clone();
            self.set("color", &color);
        }
    }

    fn dispose(&mut self) {
        if let Some(el) = self.element.take() {
            el.remove();
        }
    }
}

pub fn px(v: f64) -> String {
    format!("{v}px")
}

pub fn transform_css(screen: Vec2) -> String {
    format!("translate(-50%, -50%) translate({}px, {}px)", screen.x, screen.y)
}

pub fn padding_css(padding: Padding) -> String {
    format!("{}px {}px", padding.vertical_px, padding.horizontal_px)
}

pub fn background_css(opacity: f64) -> String {
    format!("rgba(0, 0, 0, {opacity})")
}

/// The hover background wins over the per-frame opacity until the pointer leaves.
pub fn label_background(highlighted: bool, opacity: f64) -> String {
    if highlighted {
        HIGHLIGHT_BACKGROUND.to_string()
    } else {
        background_css(opacity)
    }
}

pub fn border_css(border: bool) -> &'static str {
    if border {
        "1px solid rgba(255, 255, 255, 0.5)"
    } else {
        "none"
    }
}

/// Label id carried by an overlay element, if any.
pub fn parse_label_id(attr: &str) -> Option<LabelId> {
    attr.parse().ok().map(LabelId)
}
