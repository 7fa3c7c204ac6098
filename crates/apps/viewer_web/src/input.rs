use controls::{Button, ControlInput};
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlElement, KeyboardEvent, MouseEvent, TouchEvent, WheelEvent};

/// Client coordinates to container-relative pixels.
pub fn local_point(container: &HtmlElement, client_x: f64, client_y: f64) -> (f64, f64) {
    let rect = container.get_bounding_client_rect();
    (client_x - rect.left(), client_y - rect.top())
}

pub fn mouse_down(container: &HtmlElement, event: &MouseEvent) -> ControlInput {
    let (x, y) = local_point(container, f64::from(event.client_x()), f64::from(event.client_y()));
    ControlInput::PointerDown { x, y }
}

pub fn mouse_move(container: &HtmlElement, event: &MouseEvent) -> ControlInput {
    let (x, y) = local_point(container, f64::from(event.client_x()), f64::from(event.client_y()));
    ControlInput::PointerMove { x, y }
}

/// First finger only.
pub fn touch_point(container: &HtmlElement, event: &TouchEvent) -> Option<(f64, f64)> {
    let touch = event.touches().get(0)?;
    Some(local_point(container, f64::from(touch.client_x()), f64::from(touch.client_y())))
}

pub fn wheel(event: &WheelEvent) -> ControlInput {
    ControlInput::Wheel {
        delta_y: event.delta_y(),
        modifier: event.shift_key(),
    }
}

/// Shortcut for a key press, unless it was typed into a form field.
pub fn key(event: &KeyboardEvent) -> Option<ControlInput> {
    if event.ctrl_key() || event.meta_key() || event.alt_key() || typed_into_field(event) {
        return None;
    }
    Button::from_key(&event.key()).map(ControlInput::Button)
}

fn typed_into_field(event: &KeyboardEvent) -> bool {
    let Some(target) = event.target() else {
        return false;
    };
    let Ok(el) = target.dyn_into::<Element>() else {
        return false;
    };
    let editable = el
        .dyn_ref::<HtmlElement>()
        .is_some_and(HtmlElement::is_content_editable);
    is_text_entry(&el.tag_name(), editable)
}

/// Elements that consume typed characters themselves.
pub fn is_text_entry(tag_name: &str, content_editable: bool) -> bool {
    content_editable
        || ["INPUT", "TEXTAREA", "SELECT"]
            .iter()
            .any(|t| tag_name.eq_ignore_ascii_case(t))
}
