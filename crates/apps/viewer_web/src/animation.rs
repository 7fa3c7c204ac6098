use std::cell::RefCell;
use std::rc::Rc;

use runtime::{FrameHandle, FrameLoop, FrameStages};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::Window;

type RafClosure = Closure<dyn FnMut(f64)>;

/// `requestAnimationFrame` driver for a [`FrameLoop`]. One callback is
/// pending at a time.
pub struct AnimationLoop {
    frames: Rc<RefCell<FrameLoop>>,
    callback: Rc<RefCell<Option<RafClosure>>>,
    window: Window,
}

impl AnimationLoop {
    pub fn start<S>(window: Window, stages: Rc<RefCell<S>>) -> Result<Self, JsValue>
    where
        S: FrameStages + 'static,
    {
        let frames = Rc::new(RefCell::new(FrameLoop::new(1.0 / 60.0)));
        let callback: Rc<RefCell<Option<RafClosure>>> = Rc::new(RefCell::new(None));

        let tick_frames = Rc::clone(&frames);
        let tick_callback = Rc::clone(&callback);
        let tick_window = window.clone();
        *callback.borrow_mut() = Some(Closure::new(move |_timestamp: f64| {
            let ran = match stages.try_borrow_mut() {
                Ok(mut stages) => tick_frames.borrow_mut().tick(&mut *stages).is_some(),
                Err(_) => tick_frames.borrow().is_running(),
            };
            if ran {
                schedule(&tick_window, &tick_callback, &tick_frames);
            }
        }));

        schedule(&window, &callback, &frames);
        Ok(Self {
            frames,
            callback,
            window,
        })
    }

    pub fn is_running(&self) -> bool {
        self.frames.borrow().is_running()
    }

    pub fn frame_index(&self) -> u64 {
        self.frames.borrow().frame().index
    }

    /// Cancel the pending frame and release the callback.
    pub fn stop(&mut self) {
        let pending = self.frames.borrow_mut().stop();
        if let Some(FrameHandle(handle)) = pending {
            let _ = self.window.cancel_animation_frame(handle);
        }
        self.callback.borrow_mut().take();
    }
}

impl Drop for AnimationLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn schedule(window: &Window, callback: &Rc<RefCell<Option<RafClosure>>>, frames: &Rc<RefCell<FrameLoop>>) {
    let Ok(slot) = callback.try_borrow() else {
        return;
    };
    let Some(cb) = slot.as_ref() else {
        return;
    };
    if let Ok(handle) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
        frames.borrow_mut().set_pending(FrameHandle(handle));
    }
}
