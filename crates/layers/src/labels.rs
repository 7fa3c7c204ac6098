use foundation::bounds::Aabb3;
use foundation::math::{Vec2, Vec3};
use scene::components::NodeKind;
use scene::{NodeId, World};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::compass::CompassRules;
use crate::overlay::{LabelColor, OverlayContainer, RenderTarget};
use crate::projection::{self, FrameView, HiddenReason, Placement, Projector};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LabelId(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelKind {
    #[default]
    Standard,
    Compass,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LabelError {
    #[error("label {text:?} has no valid target object")]
    InvalidTarget { text: String },
}

/// Scene-graph capability used to resolve anchors.
pub trait SceneQuery {
    fn contains(&self, node: NodeId) -> bool;
    /// Groups report their own position; meshes their resolved world position.
    fn anchor_position(&self, node: NodeId) -> Option<Vec3>;
    fn world_bounds(&self, node: NodeId) -> Option<Aabb3>;
}

impl SceneQuery for World {
    fn contains(&self, node: NodeId) -> bool {
        World::contains(self, node)
    }

    fn anchor_position(&self, node: NodeId) -> Option<Vec3> {
        match self.kind(node)? {
            NodeKind::Group => self.transform(node).map(|t| t.position),
            NodeKind::Mesh => self.world_position(node),
        }
    }

    fn world_bounds(&self, node: NodeId) -> Option<Aabb3> {
        World::world_bounds(self, node)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Gap between the top of the target's bounds and the label anchor.
    pub clearance: f64,
    pub compass: CompassRules,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            clearance: 10.0,
            compass: CompassRules::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabelAnchor {
    pub id: LabelId,
    pub target: NodeId,
    pub text: String,
    pub color: LabelColor,
    pub local_offset: Vec3,
    pub visible: bool,
    pub kind: LabelKind,
}

struct Entry<T> {
    anchor: LabelAnchor,
    overlay: T,
    placement: Placement,
}

/// Registry of text labels bound to scene nodes, reprojected every frame.
pub struct LabelSystem<C: OverlayContainer> {
    container: C,
    config: LabelConfig,
    entries: Vec<Entry<C::Target>>,
    next_id: u64,
    hovered: Option<LabelId>,
}

impl<C: OverlayContainer> LabelSystem<C> {
    pub fn new(container: C, config: LabelConfig) -> Self {
        Self {
            container,
            config,
            entries: Vec::new(),
            next_id: 1,
            hovered: None,
        }
    }

    pub fn config(&self) -> &LabelConfig {
        &self.config
    }

    /// Applies to later registrations; compass rules apply from the next update.
    pub fn set_config(&mut self, config: LabelConfig) {
        self.config = config;
    }

    pub fn container(&self) -> &C {
        &self.container
    }

    pub fn register<S: SceneQuery + ?Sized>(
        &mut self,
        scene: &S,
        target: Option<NodeId>,
        text: impl Into<String>,
        color: LabelColor,
    ) -> Result<LabelId, LabelError> {
        self.register_kind(scene, target, text.into(), color, LabelKind::Standard)
    }

    pub fn register_compass<S: SceneQuery + ?Sized>(
        &mut self,
        scene: &S,
        target: Option<NodeId>,
        text: impl Into<String>,
        color: LabelColor,
    ) -> Result<LabelId, LabelError> {
        self.register_kind(scene, target, text.into(), color, LabelKind::Compass)
    }

    fn register_kind<S: SceneQuery + ?Sized>(
        &mut self,
        scene: &S,
        target: Option<NodeId>,
        text: String,
        color: LabelColor,
        kind: LabelKind,
    ) -> Result<LabelId, LabelError> {
        let Some(target) = target.filter(|node| scene.contains(*node)) else {
            let err = LabelError::InvalidTarget { text };
            warn!(error = %err, "label skipped");
            return Err(err);
        };

        let height = scene
            .world_bounds(target)
            .map(|b| b.height())
            .unwrap_or(0.0);
        let local_offset = Vec3::new(0.0, height * 0.5 + self.config.clearance, 0.0);

        let id = LabelId(self.next_id);
        self.next_id += 1;
        let mut overlay = self.container.create(id, &text, &color, kind);
        overlay.set_visible(false);
        debug!(label = %text, id = id.0, ?kind, offset_y = local_offset.y, "label registered");

        self.entries.push(Entry {
            anchor: LabelAnchor {
                id,
                target,
                text,
                color,
                local_offset,
                visible: true,
                kind,
            },
            overlay,
            placement: Placement::hidden(HiddenReason::Disabled),
        });
        Ok(id)
    }

    /// Reproject every anchor through `camera` and write overlay styles.
    pub fn update_all<S, P>(&mut self, scene: &S, camera: &P, view: &FrameView)
    where
        S: SceneQuery + ?Sized,
        P: Projector + ?Sized,
    {
        let compass = self.config.compass;
        for entry in &mut self.entries {
            let anchor = &entry.anchor;
            let placement = if !anchor.visible {
                Placement::hidden(HiddenReason::Disabled)
            } else {
                match scene.anchor_position(anchor.target) {
                    Some(base) => projection::place(
                        base + anchor.local_offset,
                        camera,
                        view,
                        anchor.kind,
                        &compass,
                    ),
                    None => Placement::hidden(HiddenReason::TargetMissing),
                }
            };
            apply(&mut entry.overlay, &placement);
            entry.placement = placement;
        }
    }

    /// Dispose every overlay element and forget all anchors.
    pub fn teardown(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        let count = self.entries.len();
        for entry in &mut self.entries {
            entry.overlay.dispose();
        }
        self.entries.clear();
        self.hovered = None;
        debug!(count, "labels torn down");
    }

    pub fn set_visible(&mut self, id: LabelId, visible: bool) -> bool {
        match self.entry_mut(id) {
            Some(entry) => {
                entry.anchor.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn anchor(&self, id: LabelId) -> Option<&LabelAnchor> {
        self.entry(id).map(|e| &e.anchor)
    }

    /// Result of the last `update_all` for this label.
    pub fn placement(&self, id: LabelId) -> Option<&Placement> {
        self.entry(id).map(|e| &e.placement)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LabelAnchor, &Placement)> {
        self.entries.iter().map(|e| (&e.anchor, &e.placement))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn find(&self, text: &str) -> Option<LabelId> {
        self.entries
            .iter()
            .find(|e| e.anchor.text == text)
            .map(|e| e.anchor.id)
    }

    /// Pointer enter (`true`) or leave (`false`) on a label.
    pub fn set_hovered(&mut self, id: LabelId, hovered: bool) {
        if hovered {
            if self.hovered == Some(id) {
                return;
            }
            if let Some(prev) = self.hovered.take() {
                if let Some(entry) = self.entry_mut(prev) {
                    entry.overlay.set_highlight(false);
                }
            }
            if let Some(entry) = self.entry_mut(id) {
                entry.overlay.set_highlight(true);
                debug!(label = %entry.anchor.text, "label hovered");
                self.hovered = Some(id);
            }
        } else if self.hovered == Some(id) {
            self.hovered = None;
            if let Some(entry) = self.entry_mut(id) {
                entry.overlay.set_highlight(false);
            }
        }
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered.is_some()
    }

    pub fn hovered(&self) -> Option<LabelId> {
        self.hovered
    }

    fn entry(&self, id: LabelId) -> Option<&Entry<C::Target>> {
        self.entries.iter().find(|e| e.anchor.id == id)
    }

    fn entry_mut(&mut self, id: LabelId) -> Option<&mut Entry<C::Target>> {
        self.entries.iter_mut().find(|e| e.anchor.id == id)
    }
}

impl<C: OverlayContainer> Drop for LabelSystem<C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn apply<T: RenderTarget>(overlay: &mut T, placement: &Placement) {
    match placement {
        Placement::Hidden { .. } => overlay.set_visible(false),
        Placement::Shown(layout) => {
            overlay.set_position(Vec2::new(layout.screen_px[0], layout.screen_px[1]));
            overlay.set_size(layout.font_px, layout.padding);
            overlay.set_opacity(layout.text_opacity, layout.background_opacity);
            overlay.set_border(layout.border);
            overlay.set_visible(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::MemoryOverlay;
    use foundation::viewport::Viewport;
    use pretty_assertions::assert_eq;
    use scene::camera::PerspectiveCamera;
    use scene::components::ComponentBounds;

    /// Orthographic stand-in: screen follows x/y directly, depth from z.
    struct FlatProjector {
        position: Vec3,
    }

    impl Projector for FlatProjector {
        fn position(&self) -> Vec3 {
            self.position
        }

        fn forward(&self) -> Vec3 {
            Vec3::new(0.0, 0.0, -1.0)
        }

        fn project_ndc(&self, world: Vec3) -> Option<Vec3> {
            let z = if world.z < self.position.z { 0.5 } else { 2.0 };
            Some(Vec3::new(world.x / 400.0, world.y / 300.0, z))
        }
    }

    fn view() -> FrameView {
        FrameView::new(Viewport::new(800.0, 600.0))
    }

    fn camera() -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::default();
        camera.set_viewport(Viewport::new(800.0, 600.0));
        camera
    }

    fn system() -> (LabelSystem<MemoryOverlay>, MemoryOverlay) {
        let overlay = MemoryOverlay::new();
        (LabelSystem::new(overlay.clone(), LabelConfig::default()), overlay)
    }

    #[test]
    fn register_offsets_anchor_above_bounds() {
        let mut world = World::new();
        let mesh = world.spawn_mesh(None, ComponentBounds::sized(Vec3::new(20.0, 40.0, 20.0)));
        let (mut labels, overlay) = system();

        let id = labels
            .register(&world, Some(mesh), "Crystal Spire", LabelColor::Hex(0xaaddff))
            .expect("registered");

        let anchor = labels.anchor(id).expect("anchor");
        assert_eq!(anchor.local_offset, Vec3::new(0.0, 30.0, 0.0));
        assert!(anchor.visible);
        assert_eq!(overlay.live_count(), 1);
        let style = overlay.style(0).expect("style");
        assert_eq!(style.color, "#aaddff");
        assert!(!style.visible);
    }

    #[test]
    fn register_without_target_creates_nothing() {
        let mut world = World::new();
        let gone = world.spawn_group(None);
        world.despawn(gone);
        let (mut labels, overlay) = system();

        let err = labels.register(&world, None, "Nowhere", LabelColor::default());
        assert_eq!(err, Err(LabelError::InvalidTarget { text: "Nowhere".into() }));
        assert!(labels.register(&world, Some(gone), "Ghost", LabelColor::default()).is_err());
        assert!(labels.is_empty());
        assert_eq!(overlay.live_count(), 0);
    }

    #[test]
    fn anchor_at_origin_is_centered_in_viewport() {
        let mut world = World::new();
        let group = world.spawn_group(None);
        let (mut labels, overlay) = system();
        // Registered with clearance 0 so the anchor is exactly the origin.
        labels.config.clearance = 0.0;
        labels.register(&world, Some(group), "Origin", LabelColor::default()).unwrap();

        labels.update_all(&world, &camera(), &view());

        let style = overlay.style(0).expect("style");
        assert!(style.visible);
        assert!((style.screen_px[0] - 400.0).abs() < 1e-9);
        assert!((style.screen_px[1] - 300.0).abs() < 1e-9);
        assert!((style.font_px - 8.4).abs() < 1e-9);

        labels.update_all(&world, &camera(), &view().with_zoom(0.3));
        let low = overlay.style(0).expect("style");
        assert!((low.font_px - 14.0 * 1.2 * 0.09 * 0.5 * 0.6).abs() < 1e-9);
    }

    #[test]
    fn group_anchor_uses_own_position_not_parent() {
        let mut world = World::new();
        let root = world.spawn_group(None);
        world.set_position(root, Vec3::new(1000.0, 0.0, 0.0));
        let child = world.spawn_group(Some(root));
        world.set_position(child, Vec3::new(-20.0, 5.0, 0.0));
        let mesh = world.spawn_mesh(Some(root), ComponentBounds::sized(Vec3::new(1.0, 1.0, 1.0)));

        assert_eq!(world.anchor_position(child), Some(Vec3::new(-20.0, 5.0, 0.0)));
        assert_eq!(world.anchor_position(mesh), Some(Vec3::new(1000.0, 0.0, 0.0)));
    }

    #[test]
    fn disabled_anchor_stays_hidden() {
        let mut world = World::new();
        let group = world.spawn_group(None);
        let (mut labels, overlay) = system();
        let id = labels.register(&world, Some(group), "Hidden", LabelColor::default()).unwrap();
        labels.set_visible(id, false);

        let projector = FlatProjector { position: Vec3::new(0.0, 0.0, 100.0) };
        labels.update_all(&world, &projector, &view());

        assert!(!overlay.style(0).expect("style").visible);
        assert_eq!(labels.placement(id), Some(&Placement::hidden(HiddenReason::Disabled)));
    }

    #[test]
    fn anchor_behind_projector_is_hidden() {
        let mut world = World::new();
        let group = world.spawn_group(None);
        world.set_position(group, Vec3::new(0.0, 0.0, 200.0));
        let (mut labels, overlay) = system();
        let id = labels.register(&world, Some(group), "Behind", LabelColor::default()).unwrap();

        labels.update_all(&world, &FlatProjector { position: Vec3::new(0.0, 0.0, 100.0) }, &view());

        assert!(!overlay.style(0).expect("style").visible);
        assert_eq!(labels.placement(id), Some(&Placement::hidden(HiddenReason::BehindCamera)));
    }

    #[test]
    fn despawned_target_hides_label() {
        let mut world = World::new();
        let group = world.spawn_group(None);
        let (mut labels, overlay) = system();
        let id = labels.register(&world, Some(group), "Sunken", LabelColor::default()).unwrap();
        labels.update_all(&world, &camera(), &view());
        assert!(overlay.style(0).expect("style").visible);

        world.despawn(group);
        labels.update_all(&world, &camera(), &view());
        assert!(!overlay.style(0).expect("style").visible);
        assert_eq!(labels.placement(id), Some(&Placement::hidden(HiddenReason::TargetMissing)));
    }

    #[test]
    fn update_is_idempotent() {
        let mut world = World::new();
        let group = world.spawn_group(None);
        world.set_position(group, Vec3::new(40.0, -10.0, 0.0));
        let (mut labels, overlay) = system();
        labels.register(&world, Some(group), "Twice", LabelColor::default()).unwrap();

        labels.update_all(&world, &camera(), &view().with_zoom(1.7));
        let first = overlay.styles();
        labels.update_all(&world, &camera(), &view().with_zoom(1.7));
        assert_eq!(overlay.styles(), first);
        assert!(first[0].border);
    }

    #[test]
    fn teardown_disposes_everything_and_is_repeatable() {
        let mut world = World::new();
        let (mut labels, overlay) = system();
        for name in ["North Isle", "Sky Harbor", "Ember Peak"] {
            let node = world.spawn_group(None);
            labels.register(&world, Some(node), name, LabelColor::default()).unwrap();
        }
        assert_eq!(overlay.live_count(), 3);

        labels.teardown();
        assert_eq!(overlay.live_count(), 0);
        assert!(labels.is_empty());
        labels.teardown();
        labels.update_all(&world, &camera(), &view());
        assert_eq!(overlay.live_count(), 0);
    }

    #[test]
    fn drop_tears_down() {
        let overlay = MemoryOverlay::new();
        {
            let mut world = World::new();
            let group = world.spawn_group(None);
            let mut labels = LabelSystem::new(overlay.clone(), LabelConfig::default());
            labels.register(&world, Some(group), "Temporary", LabelColor::default()).unwrap();
            assert_eq!(overlay.live_count(), 1);
        }
        assert_eq!(overlay.live_count(), 0);
    }

    #[test]
    fn hover_tracks_single_label() {
        let mut world = World::new();
        let a = world.spawn_group(None);
        let b = world.spawn_group(None);
        let (mut labels, overlay) = system();
        let la = labels.register(&world, Some(a), "A", LabelColor::default()).unwrap();
        let lb = labels.register(&world, Some(b), "B", LabelColor::default()).unwrap();

        labels.set_hovered(la, true);
        assert!(labels.is_hovered());
        assert!(overlay.style(0).expect("a").highlighted);

        labels.set_hovered(lb, true);
        assert_eq!(labels.hovered(), Some(lb));
        assert!(!overlay.style(0).expect("a").highlighted);

        labels.set_hovered(la, false);
        assert_eq!(labels.hovered(), Some(lb));
        labels.set_hovered(lb, false);
        assert!(!labels.is_hovered());
        assert_eq!(labels.find("B"), Some(lb));
    }

    #[test]
    fn compass_labels_use_compass_rules() {
        let mut world = World::new();
        let marker = world.spawn_group(None);
        world.set_position(marker, Vec3::new(0.0, 0.0, -700.0));
        let (mut labels, overlay) = system();
        labels.config.clearance = 0.0;
        labels.register_compass(&world, Some(marker), "N", LabelColor::default()).unwrap();
        assert_eq!(labels.iter().next().map(|(a, _)| a.kind), Some(LabelKind::Compass));

        labels.update_all(&world, &camera(), &view());
        let style = overlay.style(0).expect("style");
        assert!(style.visible);
        assert_eq!(style.text_opacity, 0.8);
    }
}
