use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::Window;

use crate::error::Result;

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut(f64)>>>>;

/// `requestAnimationFrame` loop with an explicit stop.
///
/// The callback reschedules itself through the shared slot; `stop` cancels
/// the pending frame and drops the closure, which breaks the cycle.
pub struct AnimationFrameLoop {
    window: Window,
    callback: FrameCallback,
    handle: Rc<Cell<Option<i32>>>,
}

impl AnimationFrameLoop {
    /// `tick` receives the frame timestamp in milliseconds.
    pub fn start(window: Window, mut tick: impl FnMut(f64) + 'static) -> Result<Self> {
        let callback: FrameCallback = Rc::new(RefCell::new(None));
        let handle = Rc::new(Cell::new(None));

        let slot = callback.clone();
        let next_handle = handle.clone();
        let win = window.clone();
        *callback.borrow_mut() = Some(Closure::wrap(Box::new(move |timestamp: f64| {
            next_handle.set(None);
            tick(timestamp);
            // schedule next
            if let Some(cb) = slot.borrow().as_ref() {
                match win.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    Ok(id) => next_handle.set(Some(id)),
                    Err(err) => log::warn!("requestAnimationFrame failed: {err:?}"),
                }
            }
        }) as Box<dyn FnMut(f64)>));

        let id = match callback.borrow().as_ref() {
            Some(cb) => window.request_animation_frame(cb.as_ref().unchecked_ref())?,
            None => 0,
        };
        handle.set(Some(id));
        log::debug!("frame loop started");
        Ok(Self {
            window,
            callback,
            handle,
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.get().is_some()
    }

    pub fn stop(&mut self) {
        if let Some(id) = self.handle.take() {
            let _ = self.window.cancel_animation_frame(id);
            log::debug!("frame loop stopped");
        }
        self.callback.borrow_mut().take();
    }
}

impl Drop for AnimationFrameLoop {
    fn drop(&mut self) {
        self.stop();
    }
}
