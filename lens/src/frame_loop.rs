//! Per-frame render loop with cooperative cancellation.
//!
//! Each tick drains queued collaborator events into the engine, then paints.
//! The loop is owned through a [`CancelToken`]: once cancelled, the next tick
//! does nothing and schedules no further frame, so no callback ever reaches a
//! torn-down view.

#[cfg(test)]
#[path = "frame_loop_test.rs"]
mod frame_loop_test;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, trace, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::closure::Closure;

use crate::engine::{Action, Engine, EngineCore};
use crate::events::{CollaboratorEvent, EventQueue};

/// Shared cancellation flag for a frame loop.
///
/// Clones observe the same flag. Cancelling is synchronous: a tick that runs
/// after `cancel()` returns sees it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Rc<Cell<bool>>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Idempotent.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}

/// What a frame loop drives each tick.
pub trait FrameSink {
    fn apply_event(&mut self, event: CollaboratorEvent) -> Vec<Action>;
    fn render(&mut self);
}

impl FrameSink for Engine {
    fn apply_event(&mut self, event: CollaboratorEvent) -> Vec<Action> {
        Engine::apply_event(self, event)
    }

    fn render(&mut self) {
        Engine::render(self);
    }
}

/// Headless sink: applies events and builds the scene without painting.
impl FrameSink for EngineCore {
    fn apply_event(&mut self, event: CollaboratorEvent) -> Vec<Action> {
        EngineCore::apply_event(self, event)
    }

    fn render(&mut self) {
        let scene = self.scene();
        trace!(markers = scene.markers.len(), strokes = scene.strokes.len(), "headless frame");
    }
}

/// Outcome of one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Tick {
    /// The frame was drawn; the host should handle `actions` and schedule another.
    Continue { actions: Vec<Action> },
    /// The loop was cancelled. Nothing ran.
    Stopped,
}

/// The loop body, independent of how frames are scheduled.
pub struct RenderLoop {
    queue: EventQueue,
    token: CancelToken,
    frames: u64,
}

impl RenderLoop {
    #[must_use]
    pub fn new(queue: EventQueue) -> Self {
        Self { queue, token: CancelToken::new(), frames: 0 }
    }

    /// A token that stops this loop.
    #[must_use]
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Frames drawn so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run one frame: drain events in arrival order, then paint.
    pub fn tick(&mut self, sink: &mut impl FrameSink) -> Tick {
        if self.token.is_cancelled() {
            self.queue.close();
            return Tick::Stopped;
        }
        let mut actions = Vec::new();
        for event in self.queue.drain() {
            actions.extend(sink.apply_event(event));
        }
        sink.render();
        self.frames += 1;
        Tick::Continue { actions }
    }
}

type FrameCallback = Closure<dyn FnMut()>;

/// Drive `engine` from `requestAnimationFrame` until the returned token is cancelled.
///
/// `on_actions` receives whatever the drained events produced, once per frame.
///
/// # Errors
///
/// Returns an error if there is no window or the first frame cannot be requested.
pub fn run_in_browser(
    engine: Rc<RefCell<Engine>>,
    queue: EventQueue,
    mut on_actions: impl FnMut(Vec<Action>) + 'static,
) -> Result<CancelToken, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let mut render_loop = RenderLoop::new(queue);
    let token = render_loop.token();

    let holder: Rc<RefCell<Option<FrameCallback>>> = Rc::new(RefCell::new(None));
    let next = Rc::clone(&holder);
    let raf_window = window.clone();

    *holder.borrow_mut() = Some(Closure::wrap(Box::new(move || {
        let tick = render_loop.tick(&mut *engine.borrow_mut());
        match tick {
            Tick::Stopped => {
                debug!(frames = render_loop.frames(), "frame loop stopped");
                drop(next.borrow_mut().take());
            }
            Tick::Continue { actions } => {
                if !actions.is_empty() {
                    on_actions(actions);
                }
                if let Some(callback) = next.borrow().as_ref()
                    && let Err(err) = raf_window.request_animation_frame(callback.as_ref().unchecked_ref())
                {
                    warn!(error = ?err, "failed to request next frame");
                }
            }
        }
    }) as Box<dyn FnMut()>));

    if let Some(callback) = holder.borrow().as_ref() {
        window.request_animation_frame(callback.as_ref().unchecked_ref())?;
    }
    Ok(token)
}
