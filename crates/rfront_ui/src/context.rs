use crate::canvas::Canvas;
use crate::element::Element;
use crate::event::UiEvent;
use crate::list::List;
use crate::timer::Timers;

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Everything one front-end UI needs in a single place: the widget tree,
/// the timer table and the stop flag. The front-end owns the actual loop
/// and calls ['UiContext::run_frame'] once per iteration with the events
/// it drained and the framebuffer it is about to present; the returned
/// duration is how long it may sleep (or wait for events) before the
/// next iteration.
pub struct UiContext {
    pub root: List,
    timers: Rc<RefCell<Timers>>,
    stop: Rc<Cell<bool>>,
}

impl UiContext {
    pub fn new() -> Self {
        Self {
            root: List::new(),
            timers: Rc::new(RefCell::new(Timers::new())),
            stop: Rc::new(Cell::new(false)),
        }
    }

    /// The shared timer table widgets register their callbacks in.
    pub fn timers(&self) -> Rc<RefCell<Timers>> {
        Rc::clone(&self.timers)
    }

    /// A clone of the stop flag, for quit menu actions and the like.
    pub fn stop_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.stop)
    }

    pub fn request_stop(&self) {
        self.stop.set(true);
    }

    pub fn should_stop(&self) -> bool {
        self.stop.get()
    }

    /// One loop iteration: route the drained events, repaint the tree,
    /// run due timers. 'dt' is the wall-clock time since the last call.
    pub fn run_frame(
        &mut self,
        events: impl IntoIterator<Item = UiEvent>,
        canvas: &mut Canvas,
        dt: Duration,
        min_wait: Duration,
    ) -> Duration {
        for event in events {
            match event {
                UiEvent::Mouse(event) => {
                    self.root.mouse_event(&event);
                }
                UiEvent::Key(event) => {
                    self.root.key_event(&event);
                }
                UiEvent::Quit => self.stop.set(true),
            }
        }
        self.root.draw(canvas, true);
        self.timers.borrow_mut().run(dt, min_wait)
    }
}

impl Default for UiContext {
    fn default() -> Self {
        Self::new()
    }
}
