use crate::canvas::{Canvas, Rect, TextStyle};
use crate::element::Element;
use crate::event::{Key, KeyEvent, MouseButton, MouseEvent, MouseKind};
use crate::timer::{Tick, TimerHandle, Timers};

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// How long a press keeps the button drawn in its pressed state.
const PRESS_FEEDBACK: std::time::Duration = std::time::Duration::from_millis(150);

pub struct Button {
    rect: Rect,
    label: String,
    visible: bool,
    /// Lit by a press, cleared by a one-shot timer so keyboard presses
    /// give the same visual feedback as clicks.
    pressed: Rc<Cell<bool>>,
    timers: Rc<RefCell<Timers>>,
    press_timer: Option<TimerHandle>,
    on_press: Box<dyn FnMut()>,
}

impl Button {
    pub fn new(
        rect: Rect,
        label: impl Into<String>,
        timers: Rc<RefCell<Timers>>,
        on_press: impl FnMut() + 'static,
    ) -> Self {
        Self {
            rect,
            label: label.into(),
            visible: true,
            pressed: Rc::new(Cell::new(false)),
            timers,
            press_timer: None,
            on_press: Box::new(on_press),
        }
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    fn press(&mut self) {
        self.pressed.set(true);

        let mut timers = self.timers.borrow_mut();
        if let Some(handle) = self.press_timer.take() {
            if timers.contains(handle) {
                timers.remove(handle);
            }
        }
        let pressed = Rc::clone(&self.pressed);
        self.press_timer = Some(timers.add(PRESS_FEEDBACK, move || {
            pressed.set(false);
            Tick::Stop
        }));
        drop(timers);

        (self.on_press)();
    }
}

impl Element for Button {
    fn draw(&mut self, canvas: &mut Canvas, has_focus: bool) {
        if !self.visible {
            return;
        }
        let theme = canvas.theme;
        let (bg, fg) = if self.pressed.get() {
            (theme.selection, theme.foreground)
        } else {
            (theme.background, theme.foreground)
        };
        let border = if has_focus { theme.focus } else { theme.border };

        canvas.fill_rect(self.rect, bg);
        canvas.frame_rect(self.rect, border);

        let metrics = canvas.metrics();
        let label_w = (self.label.chars().count() * metrics.cell_w) as i32;
        let x = self.rect.x + (self.rect.w as i32 - label_w) / 2;
        let y = self.rect.y + (self.rect.h as i32 - metrics.cell_h as i32) / 2;
        canvas.draw_string(x, y, &self.label, TextStyle {
            fg,
            bg,
            transparent_bg: true,
            transparent_fg: false,
        });
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, on: bool) {
        self.visible = on;
    }

    fn mouse_event(&mut self, event: &MouseEvent) -> bool {
        if !self.visible {
            return false;
        }
        match event.kind {
            MouseKind::ButtonDown { button: MouseButton::Left, .. }
                if self.rect.contains(event.x, event.y) =>
            {
                self.press();
                true
            }
            _ => false,
        }
    }

    fn key_event(&mut self, event: &KeyEvent) -> bool {
        match event.key {
            Key::Enter | Key::Space => {
                self.press();
                true
            }
            _ => false,
        }
    }

    fn takes_keys(&self) -> bool {
        true
    }
}

impl Drop for Button {
    fn drop(&mut self) {
        if let Some(handle) = self.press_timer.take() {
            let mut timers = self.timers.borrow_mut();
            if timers.contains(handle) {
                timers.remove(handle);
            }
        }
    }
}
