use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use console_error_panic_hook::set_once;
use controls::{Button, ControlInput, ControlsError, InputOutcome, OrbitController};
use foundation::math::Vec3;
use foundation::viewport::Viewport;
use formats::{ManifestError, ViewerConfig, ViewerManifest};
use gloo_net::http::Request;
use js_sys::{Function, Promise};
use layers::{FrameView, LabelColor, LabelId, LabelSystem};
use runtime::{EventBus, Frame, FrameStages};
use scene::camera::PerspectiveCamera;
use scene::components::ComponentBounds;
use scene::{NodeId, World};
use serde::Serialize;
use tracing::{debug, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;
use web_sys::{Document, Element, HtmlElement, KeyboardEvent, MouseEvent, TouchEvent, WheelEvent};

mod animation;
mod input;
mod listeners;
mod overlay;

use animation::AnimationLoop;
use listeners::ListenerSet;
use overlay::{DomOverlay, LABEL_ID_ATTR, LayerGuard, parse_label_id};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ViewerEvent {
    LabelHover { text: String, hovered: bool },
    LabelClick { text: String },
    Control { outcome: InputOutcome },
}

#[derive(Default)]
struct Callbacks {
    render: Option<Function>,
    scene: Option<Function>,
    event: Option<Function>,
}

struct Viewer {
    document: Document,
    container: HtmlElement,
    world: World,
    nodes: HashMap<String, NodeId>,
    camera: PerspectiveCamera,
    controller: OrbitController,
    labels: LabelSystem<DomOverlay>,
    events: EventBus<ViewerEvent>,
    frame: Frame,
    callbacks: Callbacks,
}

impl Viewer {
    fn viewport(&self) -> Viewport {
        Viewport::new(
            f64::from(self.container.client_width()),
            f64::from(self.container.client_height()),
        )
    }

    fn is_fullscreen(&self) -> bool {
        self.document.fullscreen_element().is_some()
    }

    fn handle_input(&mut self, input: ControlInput) -> InputOutcome {
        let outcome = self.controller.handle(input);
        self.record(outcome);
        outcome
    }

    fn record(&mut self, outcome: InputOutcome) {
        if outcome.changes_indicator() {
            self.events.emit(self.frame, ViewerEvent::Control { outcome });
        }
    }

    fn label_hover(&mut self, id: LabelId, hovered: bool) {
        let Some(text) = self.labels.anchor(id).map(|a| a.text.clone()) else {
            return;
        };
        self.labels.set_hovered(id, hovered);
        self.events.emit(self.frame, ViewerEvent::LabelHover { text, hovered });
    }

    fn label_click(&mut self, id: LabelId) {
        if let Some(text) = self.labels.anchor(id).map(|a| a.text.clone()) {
            info!(label = %text, "label clicked");
            self.events.emit(self.frame, ViewerEvent::LabelClick { text });
        }
    }

    fn node(&self, key: &str) -> Result<NodeId, JsValue> {
        self.nodes
            .get(key)
            .copied()
            .filter(|n| self.world.contains(*n))
            .ok_or_else(|| JsValue::from_str(&format!("unknown node {key:?}")))
    }

    fn insert_node(&mut self, key: String, node: NodeId, position: Vec3) {
        self.world.set_position(node, position);
        self.world.set_name(node, key.clone());
        self.nodes.insert(key, node);
    }

    fn parent(&self, parent: Option<String>) -> Result<Option<NodeId>, JsValue> {
        parent.map(|key| self.node(&key)).transpose()
    }

    fn apply_manifest(&mut self, manifest: &ViewerManifest) -> Result<usize, ManifestError> {
        let build = formats::build_world(manifest)?;
        self.labels.teardown();
        self.labels.set_config(manifest.config.labels);
        self.controller = OrbitController::attach(manifest.config.orbit.clone(), self.controller.viewport());
        let ids = formats::register_labels(manifest, &build, &mut self.labels);
        self.world = build.world;
        self.nodes = build.nodes;
        info!(
            name = manifest.name.as_deref().unwrap_or("unnamed"),
            nodes = self.nodes.len(),
            labels = ids.len(),
            "manifest applied"
        );
        Ok(ids.len())
    }
}

impl FrameStages for Viewer {
    fn update_camera(&mut self, frame: Frame) {
        self.frame = frame;
        let viewport = self.viewport();
        self.controller.set_viewport(viewport);
        self.controller.update(self.labels.is_hovered());
        self.controller.placement().apply(&mut self.camera);
        self.camera.set_viewport(viewport);
    }

    fn update_scene(&mut self, frame: Frame) {
        if let Some(cb) = &self.callbacks.scene
            && let Err(e) = cb.call1(&JsValue::NULL, &JsValue::from_f64(frame.time.seconds()))
        {
            warn!(error = ?e, "scene callback failed");
        }
    }

    fn project_labels(&mut self, _frame: Frame) {
        let view = FrameView {
            viewport: self.viewport(),
            zoom_level: self.controller.zoom_level(),
            is_fullscreen: self.is_fullscreen(),
            label_size: self.controller.label_size(),
        };
        self.labels.update_all(&self.world, &self.camera, &view);
    }

    fn render(&mut self, _frame: Frame) {
        if let Some(cb) = &self.callbacks.render {
            let eye = self.camera.position;
            if let Err(e) = cb.call3(
                &JsValue::NULL,
                &JsValue::from_f64(eye.x),
                &JsValue::from_f64(eye.y),
                &JsValue::from_f64(eye.z),
            ) {
                warn!(error = ?e, "render callback failed");
            }
        }
        let events = self.events.drain();
        if let Some(cb) = &self.callbacks.event {
            for event in events {
                if let Ok(json) = serde_json::to_string(&event.payload)
                    && let Err(e) = cb.call1(&JsValue::NULL, &JsValue::from_str(&json))
                {
                    warn!(error = ?e, "event callback failed");
                }
            }
        }
    }
}

struct Mounted {
    viewer: Rc<RefCell<Viewer>>,
    listeners: ListenerSet,
    animation: AnimationLoop,
    layer: LayerGuard<HtmlElement>,
}

impl Mounted {
    /// Safe from inside a frame callback: the layer goes even when the
    /// viewer is borrowed by the running frame.
    fn teardown(mut self) {
        self.animation.stop();
        let detached = self.listeners.detach_all();
        match self.viewer.try_borrow_mut() {
            Ok(mut viewer) => viewer.labels.teardown(),
            Err(_) => debug!("viewer busy at unmount, labels leave with the layer"),
        }
        self.layer.remove();
        info!(detached, "visualization unmounted");
    }
}

/// JS handle for one mounted world map.
#[wasm_bindgen]
pub struct Visualization {
    mounted: Option<Mounted>,
}

#[wasm_bindgen]
impl Visualization {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Visualization {
        Visualization { mounted: None }
    }

    /// Attach to the element with `container_id`. Mounting again first
    /// tears down the previous mount.
    pub fn mount(&mut self, container_id: &str, config_json: Option<String>) -> Result<(), JsValue> {
        self.teardown();

        let config: ViewerConfig = match config_json.as_deref() {
            Some(json) => serde_json::from_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => ViewerConfig::default(),
        };
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let document = window.document().ok_or_else(|| JsValue::from_str("no document"))?;
        let container: Option<HtmlElement> = document
            .get_element_by_id(container_id)
            .and_then(|el| el.dyn_into().ok());
        let Some(container) = container else {
            warn!(container = container_id, error = %ControlsError::MissingContainer, "visualization not mounted");
            return Err(JsValue::from_str(&format!("container #{container_id} not found")));
        };

        let viewport = Viewport::new(
            f64::from(container.client_width()),
            f64::from(container.client_height()),
        );
        let overlay = DomOverlay::attach(&document, &container)?;
        let layer = LayerGuard::new(overlay.layer().clone());
        let controller = OrbitController::attach(config.orbit, Some(viewport));
        let camera = controller.placement().to_camera(viewport);

        let viewer = Rc::new(RefCell::new(Viewer {
            document,
            container: container.clone(),
            world: World::new(),
            nodes: HashMap::new(),
            camera,
            controller,
            labels: LabelSystem::new(overlay, config.labels),
            events: EventBus::new(),
            frame: Frame::new(0, 1.0 / 60.0),
            callbacks: Callbacks::default(),
        }));

        let listeners = wire_listeners(&window, &container, layer.element(), &viewer)?;
        let animation = AnimationLoop::start(window, Rc::clone(&viewer))?;
        info!(container = container_id, listeners = listeners.len(), "visualization mounted");

        self.mounted = Some(Mounted {
            viewer,
            listeners,
            animation,
            layer,
        });
        Ok(())
    }

    /// Stop the frame loop, detach every listener, remove all overlay elements.
    pub fn teardown(&mut self) {
        if let Some(mounted) = self.mounted.take() {
            mounted.teardown();
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Called every frame with the camera eye `(x, y, z)`.
    pub fn set_render_callback(&mut self, callback: Function) -> Result<(), JsValue> {
        self.with_viewer(|v| v.callbacks.render = Some(callback))
    }

    /// Called every frame with the frame time in seconds, before labels are projected.
    pub fn set_scene_callback(&mut self, callback: Function) -> Result<(), JsValue> {
        self.with_viewer(|v| v.callbacks.scene = Some(callback))
    }

    /// Called with a JSON string per viewer event (hover, click, control change).
    pub fn set_event_callback(&mut self, callback: Function) -> Result<(), JsValue> {
        self.with_viewer(|v| v.callbacks.event = Some(callback))
    }

    pub fn add_group(&mut self, key: String, parent: Option<String>, x: f64, y: f64, z: f64) -> Result<(), JsValue> {
        self.with_viewer(|v| {
            if v.nodes.contains_key(&key) {
                return Err(JsValue::from_str(&format!("duplicate node {key:?}")));
            }
            let parent = v.parent(parent)?;
            let node = v.world.spawn_group(parent);
            v.insert_node(key, node, Vec3::new(x, y, z));
            Ok(())
        })?
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_mesh(
        &mut self,
        key: String,
        parent: Option<String>,
        x: f64,
        y: f64,
        z: f64,
        size_x: f64,
        size_y: f64,
        size_z: f64,
    ) -> Result<(), JsValue> {
        self.with_viewer(|v| {
            if v.nodes.contains_key(&key) {
                return Err(JsValue::from_str(&format!("duplicate node {key:?}")));
            }
            let parent = v.parent(parent)?;
            let bounds = ComponentBounds::sized(Vec3::new(size_x, size_y, size_z));
            let node = v.world.spawn_mesh(parent, bounds);
            v.insert_node(key, node, Vec3::new(x, y, z));
            Ok(())
        })?
    }

    pub fn set_node_position(&mut self, key: &str, x: f64, y: f64, z: f64) -> Result<(), JsValue> {
        self.with_viewer(|v| {
            let node = v.node(key)?;
            v.world.set_position(node, Vec3::new(x, y, z));
            Ok(())
        })?
    }

    /// Remove a node and its subtree; their labels hide.
    pub fn remove_node(&mut self, key: &str) -> Result<(), JsValue> {
        self.with_viewer(|v| {
            let node = v.node(key)?;
            v.world.despawn(node);
            let world = &v.world;
            v.nodes.retain(|_, n| world.contains(*n));
            Ok(())
        })?
    }

    /// `color` is a number (`0xRRGGBB`) or a CSS string. Returns the label
    /// id, or `undefined` when the target node is unknown.
    pub fn add_label(&mut self, target: &str, text: String, color: JsValue) -> Result<Option<f64>, JsValue> {
        self.register_label(target, text, color, false)
    }

    pub fn add_compass_label(&mut self, target: &str, text: String, color: JsValue) -> Result<Option<f64>, JsValue> {
        self.register_label(target, text, color, true)
    }

    pub fn set_label_visible(&mut self, id: f64, visible: bool) -> Result<bool, JsValue> {
        self.with_viewer(|v| v.labels.set_visible(LabelId(id as u64), visible))
    }

    /// Fetch a viewer manifest and replace the scene and labels with it.
    /// Resolves to the number of labels registered.
    pub fn load_manifest(&self, url: String) -> Promise {
        let viewer = self.mounted.as_ref().map(|m| Rc::clone(&m.viewer));
        future_to_promise(async move {
            let viewer = viewer.ok_or_else(|| JsValue::from_str("not mounted"))?;
            let manifest = fetch_manifest(&url).await?;
            let mut viewer = viewer
                .try_borrow_mut()
                .map_err(|_| JsValue::from_str("viewer busy"))?;
            let count = viewer
                .apply_manifest(&manifest)
                .map_err(|e| JsValue::from_str(&e.to_string()))?;
            Ok(JsValue::from_f64(count as f64))
        })
    }

    pub fn zoom_in(&mut self) -> Result<(), JsValue> {
        self.press(Button::ZoomIn)
    }

    pub fn zoom_out(&mut self) -> Result<(), JsValue> {
        self.press(Button::ZoomOut)
    }

    pub fn elevation_up(&mut self) -> Result<(), JsValue> {
        self.press(Button::ElevationUp)
    }

    pub fn elevation_down(&mut self) -> Result<(), JsValue> {
        self.press(Button::ElevationDown)
    }

    pub fn label_bigger(&mut self) -> Result<(), JsValue> {
        self.press(Button::LabelBigger)
    }

    pub fn label_smaller(&mut self) -> Result<(), JsValue> {
        self.press(Button::LabelSmaller)
    }

    pub fn toggle_auto_rotate(&mut self) -> Result<(), JsValue> {
        self.press(Button::ToggleAutoRotate)
    }

    /// Slider input. Returns the size actually applied.
    pub fn set_label_size(&mut self, size: f64) -> Result<f64, JsValue> {
        self.with_viewer(|v| {
            let outcome = v.controller.set_label_size(size);
            v.record(outcome);
            v.controller.label_size()
        })
    }

    pub fn label_size(&self) -> Result<f64, JsValue> {
        self.read_viewer(|v| v.controller.label_size())
    }

    /// Enter fullscreen on the container, or leave it. Returns whether
    /// fullscreen was requested.
    pub fn toggle_fullscreen(&mut self) -> Result<bool, JsValue> {
        self.with_viewer(|v| {
            if v.is_fullscreen() {
                v.document.exit_fullscreen();
                Ok(false)
            } else {
                v.container.request_fullscreen()?;
                Ok(true)
            }
        })?
    }

    pub fn zoom_level(&self) -> Result<f64, JsValue> {
        self.read_viewer(|v| v.controller.zoom_level())
    }

    pub fn elevation_offset(&self) -> Result<f64, JsValue> {
        self.read_viewer(|v| v.controller.elevation_offset())
    }

    /// Zoom and elevation indicator as JSON.
    pub fn indicator_json(&self) -> Result<String, JsValue> {
        let indicator = self.read_viewer(|v| v.controller.indicator())?;
        serde_json::to_string(&indicator).map_err(|e| JsValue::from_str(&e.to_string()))
    }
}

impl Visualization {
    fn with_viewer<R>(&self, f: impl FnOnce(&mut Viewer) -> R) -> Result<R, JsValue> {
        let mounted = self.mounted.as_ref().ok_or_else(|| JsValue::from_str("not mounted"))?;
        let mut viewer = mounted
            .viewer
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("viewer busy"))?;
        Ok(f(&mut viewer))
    }

    fn read_viewer<R>(&self, f: impl FnOnce(&Viewer) -> R) -> Result<R, JsValue> {
        let mounted = self.mounted.as_ref().ok_or_else(|| JsValue::from_str("not mounted"))?;
        let viewer = mounted
            .viewer
            .try_borrow()
            .map_err(|_| JsValue::from_str("viewer busy"))?;
        Ok(f(&viewer))
    }

    fn press(&mut self, button: Button) -> Result<(), JsValue> {
        self.with_viewer(|v| {
            v.handle_input(ControlInput::Button(button));
        })
    }

    fn register_label(&mut self, target: &str, text: String, color: JsValue, compass: bool) -> Result<Option<f64>, JsValue> {
        let color = js_color(&color);
        self.with_viewer(|v| {
            let node = v.nodes.get(target).copied();
            let result = if compass {
                v.labels.register_compass(&v.world, node, text, color)
            } else {
                v.labels.register(&v.world, node, text, color)
            };
            result.ok().map(|id| id.0 as f64)
        })
    }
}

impl Default for Visualization {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Visualization {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn js_color(value: &JsValue) -> LabelColor {
    if let Some(n) = value.as_f64() {
        LabelColor::Hex(n as u32)
    } else if let Some(s) = value.as_string() {
        LabelColor::Css(s)
    } else {
        LabelColor::default()
    }
}

fn label_under(event: &web_sys::Event) -> Option<LabelId> {
    let target: Element = event.target()?.dyn_into().ok()?;
    let label = target.closest(&format!("[{LABEL_ID_ATTR}]")).ok()??;
    parse_label_id(&label.get_attribute(LABEL_ID_ATTR)?)
}

fn wire_listeners(
    window: &web_sys::Window,
    container: &HtmlElement,
    layer: &HtmlElement,
    viewer: &Rc<RefCell<Viewer>>,
) -> Result<ListenerSet, JsValue> {
    let mut set: ListenerSet = ListenerSet::new();

    let v = Rc::clone(viewer);
    set.listen::<MouseEvent, _>(container.as_ref(), "mousedown", true, move |e| {
        if let Ok(mut v) = v.try_borrow_mut() {
            let input = input::mouse_down(&v.container, &e);
            v.handle_input(input);
        }
    })?;
    let v = Rc::clone(viewer);
    set.listen::<MouseEvent, _>(window.as_ref(), "mousemove", true, move |e| {
        if let Ok(mut v) = v.try_borrow_mut() {
            let input = input::mouse_move(&v.container, &e);
            v.handle_input(input);
        }
    })?;
    let v = Rc::clone(viewer);
    set.listen::<MouseEvent, _>(window.as_ref(), "mouseup", true, move |_e| {
        if let Ok(mut v) = v.try_borrow_mut() {
            v.handle_input(ControlInput::PointerUp);
        }
    })?;

    let v = Rc::clone(viewer);
    set.listen::<TouchEvent, _>(container.as_ref(), "touchstart", true, move |e| {
        if let Ok(mut v) = v.try_borrow_mut()
            && let Some((x, y)) = input::touch_point(&v.container, &e)
        {
            v.handle_input(ControlInput::PointerDown { x, y });
        }
    })?;
    let v = Rc::clone(viewer);
    set.listen::<TouchEvent, _>(window.as_ref(), "touchmove", true, move |e| {
        if let Ok(mut v) = v.try_borrow_mut()
            && let Some((x, y)) = input::touch_point(&v.container, &e)
        {
            v.handle_input(ControlInput::PointerMove { x, y });
        }
    })?;
    let v = Rc::clone(viewer);
    set.listen::<TouchEvent, _>(window.as_ref(), "touchend", true, move |_e| {
        if let Ok(mut v) = v.try_borrow_mut() {
            v.handle_input(ControlInput::PointerUp);
        }
    })?;

    let v = Rc::clone(viewer);
    set.listen::<WheelEvent, _>(container.as_ref(), "wheel", false, move |e| {
        e.prevent_default();
        if let Ok(mut v) = v.try_borrow_mut() {
            v.handle_input(input::wheel(&e));
        }
    })?;
    let v = Rc::clone(viewer);
    set.listen::<KeyboardEvent, _>(window.as_ref(), "keydown", false, move |e| {
        let Some(input) = input::key(&e) else {
            return;
        };
        if let Ok(mut v) = v.try_borrow_mut()
            && v.handle_input(input) != InputOutcome::Ignored
        {
            e.prevent_default();
        }
    })?;

    let v = Rc::clone(viewer);
    set.listen::<web_sys::Event, _>(layer.as_ref(), "mouseover", true, move |e| {
        if let (Some(id), Ok(mut v)) = (label_under(&e), v.try_borrow_mut()) {
            v.label_hover(id, true);
        }
    })?;
    let v = Rc::clone(viewer);
    set.listen::<web_sys::Event, _>(layer.as_ref(), "mouseout", true, move |e| {
        if let (Some(id), Ok(mut v)) = (label_under(&e), v.try_borrow_mut()) {
            v.label_hover(id, false);
        }
    })?;
    let v = Rc::clone(viewer);
    set.listen::<web_sys::Event, _>(layer.as_ref(), "click", true, move |e| {
        if let (Some(id), Ok(mut v)) = (label_under(&e), v.try_borrow_mut()) {
            v.label_click(id);
        }
    })?;

    Ok(set)
}

async fn fetch_manifest(url: &str) -> Result<ViewerManifest, JsValue> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    if !resp.ok() {
        return Err(JsValue::from_str(&format!("HTTP {} fetching {url}", resp.status())));
    }
    let text = resp
        .text()
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    ViewerManifest::from_json_str(&text).map_err(|e| {
        warn!(url, error = %e, "manifest rejected");
        JsValue::from_str(&e.to_string())
    })
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::ViewerEvent;
    use controls::InputOutcome;

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_string(&ViewerEvent::LabelClick { text: "Atlantis".into() }).unwrap();
        assert_eq!(json, r#"{"type":"label_click","text":"Atlantis"}"#);

        let json = serde_json::to_string(&ViewerEvent::Control {
            outcome: InputOutcome::Zoomed { zoom_level: 1.2 },
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"control","outcome":{"kind":"zoomed","zoom_level":1.2}}"#);
    }
}
