use crate::canvas::{Canvas, Rect};
use crate::element::Element;
use crate::event::{MouseButton, MouseEvent, MouseKind};

/// Smallest thumb drawn, so it stays grabbable on long lists.
const MIN_THUMB: u32 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

/// Maps an abstract (total items, window size, position) triple onto a
/// pixel thumb and back. Purely mouse driven; when the window covers
/// everything the bar is drawn full and ignores interaction.
pub struct ScrollBar {
    rect: Rect,
    orientation: Orientation,
    total: usize,
    window: usize,
    pos: usize,
    visible: bool,
    /// Pointer offset into the thumb while dragging.
    dragging: Option<i32>,
    on_scroll: Box<dyn FnMut(usize)>,
}

impl ScrollBar {
    pub fn new(
        rect: Rect,
        orientation: Orientation,
        on_scroll: impl FnMut(usize) + 'static,
    ) -> Self {
        Self {
            rect,
            orientation,
            total: 0,
            window: 0,
            pos: 0,
            visible: true,
            dragging: None,
            on_scroll: Box::new(on_scroll),
        }
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_state(&mut self, total: usize, window: usize, pos: usize) {
        self.total = total;
        self.window = window;
        self.pos = pos.min(self.max_pos());
    }

    fn max_pos(&self) -> usize {
        self.total.saturating_sub(self.window)
    }

    fn track_len(&self) -> u32 {
        match self.orientation {
            Orientation::Horizontal => self.rect.w,
            Orientation::Vertical => self.rect.h,
        }
    }

    fn along(&self, event: &MouseEvent) -> i32 {
        match self.orientation {
            Orientation::Horizontal => event.x - self.rect.x,
            Orientation::Vertical => event.y - self.rect.y,
        }
    }

    /// Thumb offset and length along the track.
    fn thumb(&self) -> (i32, u32) {
        let track = self.track_len();
        if self.window >= self.total || self.total == 0 {
            return (0, track);
        }
        let ratio = self.window as f32 / self.total as f32;
        let len = ((track as f32 * ratio) as u32).clamp(MIN_THUMB.min(track), track);
        let span = (track - len) as f32;
        let offset = (self.pos as f32 / self.max_pos() as f32 * span) as i32;
        (offset, len)
    }

    fn set_pos(&mut self, pos: usize) {
        let pos = pos.min(self.max_pos());
        if pos != self.pos {
            self.pos = pos;
            (self.on_scroll)(pos);
        }
    }

    fn drag_to(&mut self, along: i32, grab: i32) {
        let (_, len) = self.thumb();
        let span = (self.track_len() - len) as f32;
        if span <= 0.0 {
            return;
        }
        let offset = (along - grab).clamp(0, span as i32);
        let pos = (offset as f32 / span * self.max_pos() as f32).round() as usize;
        self.set_pos(pos);
    }
}

impl Element for ScrollBar {
    fn draw(&mut self, canvas: &mut Canvas, _has_focus: bool) {
        if !self.visible {
            return;
        }
        let theme = canvas.theme;
        canvas.fill_rect(self.rect, theme.background);
        canvas.frame_rect(self.rect, theme.border);

        let (offset, len) = self.thumb();
        let thumb = match self.orientation {
            Orientation::Horizontal => {
                Rect::new(self.rect.x + offset, self.rect.y, len, self.rect.h)
            }
            Orientation::Vertical => {
                Rect::new(self.rect.x, self.rect.y + offset, self.rect.w, len)
            }
        };
        canvas.fill_rect(thumb, theme.selection);
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, on: bool) {
        self.visible = on;
        if !on {
            self.dragging = None;
        }
    }

    fn mouse_event(&mut self, event: &MouseEvent) -> bool {
        if !self.visible {
            return false;
        }
        match event.kind {
            MouseKind::ButtonDown { button: MouseButton::Left, .. }
                if self.rect.contains(event.x, event.y) =>
            {
                if self.window >= self.total {
                    // Nothing to scroll; the click still lands on us.
                    return true;
                }
                let along = self.along(event);
                let (offset, len) = self.thumb();
                if along >= offset && along < offset + len as i32 {
                    self.dragging = Some(along - offset);
                } else if along < offset {
                    // Page towards the click.
                    let pos = self.pos.saturating_sub(self.window);
                    self.set_pos(pos);
                } else {
                    self.set_pos(self.pos + self.window);
                }
                true
            }
            MouseKind::ButtonUp { button: MouseButton::Left } if self.dragging.is_some() => {
                self.dragging = None;
                true
            }
            MouseKind::Motion => {
                if let Some(grab) = self.dragging {
                    let along = self.along(event);
                    self.drag_to(along, grab);
                }
                // Motion is never claimed; others may track it too.
                false
            }
            _ => false,
        }
    }
}
