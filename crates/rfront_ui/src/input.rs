use crate::canvas::{Canvas, Metrics, Rect, TextStyle};
use crate::element::Element;
use crate::event::{Key, KeyEvent, MouseButton, MouseEvent, MouseKind};
use crate::timer::{Tick, TimerHandle, Timers};

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

/// Single line text box. Insertion is restricted to printable ASCII
/// since that's all the front-end fonts cover; the caret follows edits
/// and scrolls the view horizontally when the text outgrows the box.
pub struct Input {
    rect: Rect,
    metrics: Metrics,
    text: String,
    /// Caret position in characters, 0..=len.
    caret: usize,
    /// First visible column.
    scroll: usize,
    max_len: usize,
    visible: bool,
    blink_on: Rc<Cell<bool>>,
    timers: Rc<RefCell<Timers>>,
    blink_timer: TimerHandle,
}

impl Input {
    pub fn new(
        rect: Rect,
        metrics: Metrics,
        max_len: usize,
        blink_period: Duration,
        timers: Rc<RefCell<Timers>>,
    ) -> Self {
        let blink_on = Rc::new(Cell::new(true));
        let flag = Rc::clone(&blink_on);
        let blink_timer = timers.borrow_mut().add(blink_period, move || {
            flag.set(!flag.get());
            Tick::Continue
        });
        Self {
            rect,
            metrics,
            text: String::new(),
            caret: 0,
            scroll: 0,
            max_len,
            visible: true,
            blink_on,
            timers,
            blink_timer,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the contents, dropping anything the font can't show so
    /// the text stays one byte per column.
    pub fn set_text(&mut self, text: &str) {
        self.text = text
            .chars()
            .filter(|ch| ch.is_ascii() && !ch.is_ascii_control())
            .take(self.max_len)
            .collect();
        self.caret = self.text.len();
        self.scroll = 0;
        self.follow_caret();
    }

    /// Columns that fit the box, one held back for the caret.
    fn columns(&self) -> usize {
        (self.rect.w as usize / self.metrics.cell_w).saturating_sub(1).max(1)
    }

    fn follow_caret(&mut self) {
        let columns = self.columns();
        if self.caret < self.scroll {
            self.scroll = self.caret;
        } else if self.caret >= self.scroll + columns {
            self.scroll = self.caret - columns + 1;
        }
    }

    fn insert(&mut self, ch: char) {
        if !ch.is_ascii() || ch.is_ascii_control() {
            return;
        }
        if self.text.chars().count() >= self.max_len {
            return;
        }
        self.text.insert(self.caret, ch);
        self.caret += 1;
        self.follow_caret();
    }
}

impl Element for Input {
    fn draw(&mut self, canvas: &mut Canvas, has_focus: bool) {
        if !self.visible {
            return;
        }
        let theme = canvas.theme;
        let border = if has_focus { theme.focus } else { theme.border };
        canvas.fill_rect(self.rect, theme.background);
        canvas.frame_rect(self.rect, border);

        let columns = self.columns();
        let shown: String = self.text.chars().skip(self.scroll).take(columns).collect();
        let pad = ((self.rect.w as usize % self.metrics.cell_w) / 2).max(1) as i32;
        let x = self.rect.x + pad;
        let y = self.rect.y + (self.rect.h as i32 - self.metrics.cell_h as i32) / 2;
        canvas.draw_string(x, y, &shown, TextStyle {
            fg: theme.foreground,
            bg: theme.background,
            transparent_bg: true,
            transparent_fg: false,
        });

        if has_focus && self.blink_on.get() {
            let col = (self.caret - self.scroll) as i32;
            let caret_rect = Rect::new(
                x + col * self.metrics.cell_w as i32,
                y,
                self.metrics.cell_w as u32,
                self.metrics.cell_h as u32,
            );
            canvas.fill_rect(caret_rect, theme.foreground);
            if let Some(ch) = self.text.chars().nth(self.caret) {
                canvas.draw_string(caret_rect.x, caret_rect.y, &ch.to_string(), TextStyle {
                    fg: theme.background,
                    bg: theme.foreground,
                    transparent_bg: true,
                    transparent_fg: false,
                });
            }
        }
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
                let col = (event.x - self.rect.x).max(0) as usize / self.metrics.cell_w;
                self.caret = (self.scroll + col).min(self.text.chars().count());
                self.blink_on.set(true);
                true
            }
            _ => false,
        }
    }

    fn key_event(&mut self, event: &KeyEvent) -> bool {
        let len = self.text.chars().count();
        match event.key {
            Key::Char(ch) => self.insert(ch),
            Key::Space => self.insert(' '),
            Key::Backspace => {
                if self.caret > 0 {
                    self.caret -= 1;
                    self.text.remove(self.caret);
                }
            }
            Key::Delete => {
                if self.caret < len {
                    self.text.remove(self.caret);
                }
            }
            Key::Left => self.caret = self.caret.saturating_sub(1),
            Key::Right => self.caret = (self.caret + 1).min(len),
            Key::Home => self.caret = 0,
            Key::End => self.caret = len,
            _ => return false,
        }
        self.follow_caret();
        // Keep the caret solid while the user is typing.
        self.blink_on.set(true);
        true
    }

    fn takes_keys(&self) -> bool {
        true
    }
}

impl Drop for Input {
    fn drop(&mut self) {
        let mut timers = self.timers.borrow_mut();
        if timers.contains(self.blink_timer) {
            timers.remove(self.blink_timer);
        }
    }
}
