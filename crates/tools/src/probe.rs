use std::collections::VecDeque;

use controls::{CameraPlacement, InputOutcome, OrbitController};
use formats::{ManifestError, ViewerManifest, build_world, register_labels};
use foundation::viewport::Viewport;
use layers::{FrameView, LabelId, LabelKind, LabelSystem, MemoryOverlay, Placement};
use runtime::{EventBus, Frame, FrameLoop, FrameStages};
use scene::World;
use scene::camera::PerspectiveCamera;
use serde::Serialize;
use tracing::{debug, warn};

use crate::script::{Script, Step};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelRecord {
    pub id: LabelId,
    pub text: String,
    pub kind: LabelKind,
    pub placement: Placement,
}

/// What one simulated frame produced, emitted as one JSON line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRecord {
    pub frame: u64,
    pub time_s: f64,
    pub camera: CameraPlacement,
    pub zoom_level: f64,
    pub elevation_offset: f64,
    pub label_size: f64,
    pub hovered: Option<LabelId>,
    pub outcomes: Vec<InputOutcome>,
    pub labels: Vec<LabelRecord>,
}

/// Headless viewer: the browser pipeline over an in-memory overlay.
pub struct Probe {
    world: World,
    labels: LabelSystem<MemoryOverlay>,
    controller: OrbitController,
    camera: PerspectiveCamera,
    viewport: Viewport,
    fullscreen: bool,
    timeline: VecDeque<(u64, Step)>,
    outcomes: EventBus<InputOutcome>,
    records: Vec<FrameRecord>,
}

impl Probe {
    pub fn new(
        manifest: &ViewerManifest,
        viewport: Viewport,
        fullscreen: bool,
        script: &Script,
    ) -> Result<Self, ManifestError> {
        let build = build_world(manifest)?;
        let mut labels = LabelSystem::new(MemoryOverlay::new(), manifest.config.labels);
        let registered = register_labels(manifest, &build, &mut labels);
        debug!(nodes = build.nodes.len(), labels = registered.len(), "probe scene ready");

        let controller = OrbitController::attach(manifest.config.orbit.clone(), Some(viewport));
        let camera = controller.placement().to_camera(viewport);
        Ok(Self {
            world: build.world,
            labels,
            controller,
            camera,
            viewport,
            fullscreen,
            timeline: script.timeline().into(),
            outcomes: EventBus::new(),
            records: Vec::new(),
        })
    }

    /// Run `frames` frames at `dt_s` and hand back their records.
    pub fn run(&mut self, frames: u64, dt_s: f64) -> Vec<FrameRecord> {
        let mut frame_loop = FrameLoop::new(dt_s);
        for _ in 0..frames {
            frame_loop.tick(self);
        }
        if !self.timeline.is_empty() {
            warn!(pending = self.timeline.len(), "script steps past the last frame were dropped");
            self.timeline.clear();
        }
        std::mem::take(&mut self.records)
    }

    pub fn controller(&self) -> &OrbitController {
        &self.controller
    }

    pub fn labels(&self) -> &LabelSystem<MemoryOverlay> {
        &self.labels
    }

    fn apply_step(&mut self, frame: Frame, step: Step) {
        match step {
            Step::Input(input) => {
                let outcome = self.controller.handle(input);
                if outcome != InputOutcome::Ignored {
                    self.outcomes.emit(frame, outcome);
                }
            }
            Step::Hover(text) => match self.labels.find(&text) {
                Some(id) => self.labels.set_hovered(id, true),
                None => warn!(label = %text, "hover target not found"),
            },
            Step::Unhover => {
                if let Some(id) = self.labels.hovered() {
                    self.labels.set_hovered(id, false);
                }
            }
            Step::Wait(_) => {}
        }
    }
}

impl FrameStages for Probe {
    fn update_camera(&mut self, frame: Frame) {
        while self.timeline.front().is_some_and(|(at, _)| *at <= frame.index) {
            if let Some((_, step)) = self.timeline.pop_front() {
                self.apply_step(frame, step);
            }
        }
        self.controller.update(self.labels.is_hovered());
        self.controller.placement().apply(&mut self.camera);
    }

    fn project_labels(&mut self, _frame: Frame) {
        let view = FrameView::new(self.viewport)
            .with_zoom(self.controller.zoom_level())
            .fullscreen(self.fullscreen)
            .with_label_size(self.controller.label_size());
        self.labels.update_all(&self.world, &self.camera, &view);
    }

    fn render(&mut self, frame: Frame) {
        let labels = self
            .labels
            .iter()
            .map(|(anchor, placement)| LabelRecord {
                id: anchor.id,
                text: anchor.text.clone(),
                kind: anchor.kind,
                placement: *placement,
            })
            .collect();
        self.records.push(FrameRecord {
            frame: frame.index,
            time_s: frame.time.seconds(),
            camera: self.controller.placement(),
            zoom_level: self.controller.zoom_level(),
            elevation_offset: self.controller.elevation_offset(),
            label_size: self.controller.label_size(),
            hovered: self.labels.hovered(),
            outcomes: self.outcomes.drain().into_iter().map(|e| e.payload).collect(),
            labels,
        });
    }
}
