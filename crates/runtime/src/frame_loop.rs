use crate::frame::Frame;

/// Host handle for a scheduled frame callback (`requestAnimationFrame` id).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameHandle(pub i32);

/// The per-frame pipeline, run in declaration order.
///
/// Camera placement must be final before labels are reprojected, and labels
/// must be written before the host rasterizes the frame.
pub trait FrameStages {
    fn update_camera(&mut self, frame: Frame);

    /// External scene mutation (particles, boats).
    fn update_scene(&mut self, _frame: Frame) {}

    fn project_labels(&mut self, frame: Frame);

    fn render(&mut self, _frame: Frame) {}
}

/// Drives `FrameStages` once per display refresh and owns the pending
/// callback handle so teardown can cancel it.
#[derive(Debug)]
pub struct FrameLoop {
    frame: Frame,
    pending: Option<FrameHandle>,
    stopped: bool,
}

impl FrameLoop {
    pub fn new(dt_s: f64) -> Self {
        Self {
            frame: Frame::new(0, dt_s),
            pending: None,
            stopped: false,
        }
    }

    /// The frame the next `tick` will run.
    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn is_running(&self) -> bool {
        !self.stopped
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }

    /// Run one frame. Returns `None` once the loop has been stopped.
    pub fn tick<S: FrameStages + ?Sized>(&mut self, stages: &mut S) -> Option<Frame> {
        if self.stopped {
            return None;
        }
        self.pending = None;

        let frame = self.frame;
        stages.update_camera(frame);
        stages.update_scene(frame);
        stages.project_labels(frame);
        stages.render(frame);

        self.frame = frame.next();
        Some(frame)
    }

    /// Record the handle of the next scheduled callback. Ignored after `stop`.
    pub fn set_pending(&mut self, handle: FrameHandle) {
        if !self.stopped {
            self.pending = Some(handle);
        }
    }

    /// Stop the loop and hand back the handle that still needs cancelling.
    pub fn stop(&mut self) -> Option<FrameHandle> {
        self.stopped = true;
        self.pending.take()
    }
}

#[cfg(test)]
mod tests {
    use super::{FrameHandle, FrameLoop, FrameStages};
    use crate::frame::Frame;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<(&'static str, u64)>,
    }

    impl FrameStages for Recorder {
        fn update_camera(&mut self, frame: Frame) {
            self.calls.push(("camera", frame.index));
        }

        fn update_scene(&mut self, frame: Frame) {
            self.calls.push(("scene", frame.index));
        }

        fn project_labels(&mut self, frame: Frame) {
            self.calls.push(("labels", frame.index));
        }

        fn render(&mut self, frame: Frame) {
            self.calls.push(("render", frame.index));
        }
    }

    #[test]
    fn stages_run_in_pipeline_order() {
        let mut lp = FrameLoop::new(1.0 / 60.0);
        let mut rec = Recorder::default();
        lp.tick(&mut rec);
        lp.tick(&mut rec);

        assert_eq!(
            rec.calls,
            vec![
                ("camera", 0),
                ("scene", 0),
                ("labels", 0),
                ("render", 0),
                ("camera", 1),
                ("scene", 1),
                ("labels", 1),
                ("render", 1),
            ]
        );
        assert_eq!(lp.frame().index, 2);
    }

    #[test]
    fn stop_returns_pending_handle_once() {
        let mut lp = FrameLoop::new(1.0 / 60.0);
        lp.set_pending(FrameHandle(42));
        assert_eq!(lp.stop(), Some(FrameHandle(42)));
        assert_eq!(lp.stop(), None);
        assert!(!lp.is_running());
    }

    #[test]
    fn stopped_loop_runs_nothing() {
        let mut lp = FrameLoop::new(1.0 / 60.0);
        let mut rec = Recorder::default();
        lp.stop();
        lp.set_pending(FrameHandle(1));

        assert!(lp.tick(&mut rec).is_none());
        assert!(rec.calls.is_empty());
        assert!(lp.pending().is_none());
    }
}
