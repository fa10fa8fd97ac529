use crate::canvas::Canvas;
use crate::element::Element;
use crate::event::{Key, KeyEvent, MouseEvent, MouseKind};

/// The focus-chain container. Children draw in insertion order and are
/// hit-tested in reverse, so widgets added later (dialogs, overlays) are
/// on top for the mouse while still rendering above what they cover.
/// At most one child holds keyboard focus, tracked as an index so a
/// removed or hidden child can never leave a dangling reference.
pub struct List {
    children: Vec<Box<dyn Element>>,
    focus: Option<usize>,
    /// Focus to restore once a modal child goes away. The inner option
    /// remembers that "nothing was focused" is also a state to restore.
    saved_focus: Option<Option<usize>>,
    visible: bool,
    global_keys: Option<Box<dyn FnMut(&KeyEvent) -> bool>>,
}

impl List {
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            focus: None,
            saved_focus: None,
            visible: true,
            global_keys: None,
        }
    }

    pub fn add(&mut self, child: Box<dyn Element>) -> usize {
        self.children.push(child);
        self.children.len() - 1
    }

    /// Keys nobody in the chain wanted end up here. Front-ends hang
    /// their hotkeys on this.
    pub fn set_global_keys(&mut self, handler: impl FnMut(&KeyEvent) -> bool + 'static) {
        self.global_keys = Some(Box::new(handler));
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn child_mut(&mut self, index: usize) -> &mut dyn Element {
        &mut *self.children[index]
    }

    pub fn set_child_visible(&mut self, index: usize, on: bool) {
        self.children[index].set_visible(on);
        if !on && self.focus == Some(index) {
            self.apply_focus(None);
        }
    }

    /// The focused child, ignoring focus left on a child that has since
    /// been hidden.
    pub fn focus(&self) -> Option<usize> {
        self.focus.filter(|&index| self.children[index].visible())
    }

    pub fn clear_focus(&mut self) {
        self.apply_focus(None);
    }

    pub fn focus_first(&mut self) {
        let first = (0..self.children.len()).find(|&index| self.focusable(index));
        self.apply_focus(first);
    }

    pub fn focus_last(&mut self) {
        let last = (0..self.children.len()).rev().find(|&index| self.focusable(index));
        self.apply_focus(last);
    }

    fn focusable(&self, index: usize) -> bool {
        let child = &self.children[index];
        child.visible() && child.takes_keys()
    }

    fn apply_focus(&mut self, new: Option<usize>) {
        if new == self.focus {
            return;
        }
        if let Some(old) = self.focus {
            self.children[old].focus_changed(false);
        }
        self.focus = new;
        if let Some(new) = new {
            self.children[new].focus_changed(true);
        }
    }

    /// Advance focus to the next focusable child, wrapping. With nothing
    /// focusable, focus ends up empty.
    fn cycle_focus(&mut self) {
        let count = self.children.len();
        let start = self.focus().map(|index| index + 1).unwrap_or(0);
        let next = (0..count)
            .map(|step| (start + step) % count)
            .find(|&index| self.focusable(index));
        self.apply_focus(next);
    }

    /// Topmost visible modal child, if any.
    fn modal_child(&self) -> Option<usize> {
        (0..self.children.len())
            .rev()
            .find(|&index| self.children[index].visible() && self.children[index].is_modal())
    }

    /// Keep focus pinned on a visible modal child, remembering and later
    /// restoring whatever was focused before it appeared.
    fn sync_modal(&mut self) {
        match self.modal_child() {
            Some(modal) => {
                if self.focus != Some(modal) {
                    if self.saved_focus.is_none() {
                        self.saved_focus = Some(self.focus);
                    }
                    self.apply_focus(Some(modal));
                }
            }
            None => {
                if let Some(saved) = self.saved_focus.take() {
                    let saved = saved.filter(|&index| self.focusable(index));
                    self.apply_focus(saved);
                }
            }
        }
    }
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl Element for List {
    fn draw(&mut self, canvas: &mut Canvas, has_focus: bool) {
        if !self.visible {
            return;
        }
        self.sync_modal();
        let focus = self.focus();
        for (index, child) in self.children.iter_mut().enumerate() {
            child.draw(canvas, has_focus && focus == Some(index));
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
        self.sync_modal();

        if let Some(modal) = self.modal_child() {
            let handled = self.children[modal].mouse_event(event);
            // Clicks never reach past a modal child, wherever they land.
            return handled || !matches!(event.kind, MouseKind::Motion);
        }

        let is_click = matches!(event.kind, MouseKind::ButtonDown { .. });
        for index in (0..self.children.len()).rev() {
            if !self.children[index].visible() {
                continue;
            }
            if self.children[index].mouse_event(event) {
                if is_click && self.focusable(index) {
                    self.apply_focus(Some(index));
                }
                return true;
            }
        }
        if is_click {
            // An unclaimed click drops focus but stays unclaimed for
            // whoever owns this list.
            self.apply_focus(None);
        }
        false
    }

    fn key_event(&mut self, event: &KeyEvent) -> bool {
        if !self.visible {
            return false;
        }
        self.sync_modal();

        if let Some(modal) = self.modal_child() {
            if self.children[modal].key_event(event) {
                return true;
            }
            // Tab must not escape the modal child.
            return event.key == Key::Tab;
        }

        if let Some(focus) = self.focus() {
            if self.children[focus].key_event(event) {
                return true;
            }
        }
        if event.key == Key::Tab {
            self.cycle_focus();
            return true;
        }
        match self.global_keys.as_mut() {
            Some(handler) => handler(event),
            None => false,
        }
    }

    fn takes_keys(&self) -> bool {
        true
    }

    fn focus_changed(&mut self, focused: bool) {
        if !focused {
            self.apply_focus(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Rect;
    use crate::event::MouseButton;

    use std::cell::Cell;
    use std::rc::Rc;

    /// Minimal focusable child recording what reaches it.
    struct Probe {
        rect: Rect,
        visible: bool,
        keys: bool,
        modal: bool,
        hits: Rc<Cell<u32>>,
        focus_events: Rc<Cell<i32>>,
    }

    impl Probe {
        fn new(rect: Rect, keys: bool) -> Self {
            Self {
                rect,
                visible: true,
                keys,
                modal: false,
                hits: Rc::new(Cell::new(0)),
                focus_events: Rc::new(Cell::new(0)),
            }
        }
    }

    impl Element for Probe {
        fn draw(&mut self, _: &mut Canvas, _: bool) {}

        fn visible(&self) -> bool {
            self.visible
        }

        fn set_visible(&mut self, on: bool) {
            self.visible = on;
        }

        fn mouse_event(&mut self, event: &MouseEvent) -> bool {
            if matches!(event.kind, MouseKind::ButtonDown { .. })
                && self.rect.contains(event.x, event.y)
            {
                self.hits.set(self.hits.get() + 1);
                return true;
            }
            false
        }

        fn key_event(&mut self, _: &KeyEvent) -> bool {
            false
        }

        fn takes_keys(&self) -> bool {
            self.keys
        }

        fn focus_changed(&mut self, focused: bool) {
            self.focus_events.set(self.focus_events.get() + if focused { 1 } else { -1 });
        }

        fn is_modal(&self) -> bool {
            self.modal
        }
    }

    fn click(x: i32, y: i32) -> MouseEvent {
        MouseEvent {
            x,
            y,
            kind: MouseKind::ButtonDown { button: MouseButton::Left, clicks: 1 },
        }
    }

    #[test]
    fn tab_cycles_visible_key_takers_and_wraps() {
        let mut list = List::new();
        list.add(Box::new(Probe::new(Rect::new(0, 0, 10, 10), true)));
        list.add(Box::new(Probe::new(Rect::new(0, 10, 10, 10), false)));
        list.add(Box::new(Probe::new(Rect::new(0, 20, 10, 10), true)));

        assert!(list.key_event(&KeyEvent::new(Key::Tab)));
        assert_eq!(list.focus(), Some(0));
        list.key_event(&KeyEvent::new(Key::Tab));
        assert_eq!(list.focus(), Some(2));
        list.key_event(&KeyEvent::new(Key::Tab));
        assert_eq!(list.focus(), Some(0));
    }

    #[test]
    fn hidden_children_are_skipped_and_focus_drops_with_visibility() {
        let mut list = List::new();
        list.add(Box::new(Probe::new(Rect::new(0, 0, 10, 10), true)));
        list.add(Box::new(Probe::new(Rect::new(0, 10, 10, 10), true)));

        list.focus_first();
        assert_eq!(list.focus(), Some(0));

        list.set_child_visible(0, false);
        assert_eq!(list.focus(), None);

        list.key_event(&KeyEvent::new(Key::Tab));
        assert_eq!(list.focus(), Some(1));
    }

    #[test]
    fn clicks_test_in_reverse_add_order() {
        let mut list = List::new();
        let bottom = Probe::new(Rect::new(0, 0, 20, 20), true);
        let top = Probe::new(Rect::new(0, 0, 20, 20), true);
        let bottom_hits = Rc::clone(&bottom.hits);
        let top_hits = Rc::clone(&top.hits);
        list.add(Box::new(bottom));
        list.add(Box::new(top));

        assert!(list.mouse_event(&click(5, 5)));
        assert_eq!(top_hits.get(), 1);
        assert_eq!(bottom_hits.get(), 0);
        assert_eq!(list.focus(), Some(1));
    }

    #[test]
    fn unclaimed_click_clears_focus_without_being_consumed() {
        let mut list = List::new();
        list.add(Box::new(Probe::new(Rect::new(0, 0, 10, 10), true)));
        list.focus_first();

        assert!(!list.mouse_event(&click(50, 50)));
        assert_eq!(list.focus(), None);
    }

    #[test]
    fn modal_child_captures_events_and_restores_focus() {
        let mut list = List::new();
        list.add(Box::new(Probe::new(Rect::new(0, 0, 10, 10), true)));
        let mut dialog = Probe::new(Rect::new(20, 20, 10, 10), true);
        dialog.modal = true;
        dialog.visible = false;
        let dialog_idx = list.add(Box::new(dialog));

        list.focus_first();
        assert_eq!(list.focus(), Some(0));

        list.set_child_visible(dialog_idx, true);
        assert!(list.key_event(&KeyEvent::new(Key::Tab)));
        assert_eq!(list.focus(), Some(dialog_idx));

        // A click outside the dialog is swallowed, not routed below.
        assert!(list.mouse_event(&click(5, 5)));

        list.set_child_visible(dialog_idx, false);
        list.key_event(&KeyEvent::new(Key::Char('x')));
        assert_eq!(list.focus(), Some(0));
    }

    #[test]
    fn focus_changes_are_announced_to_children() {
        let mut list = List::new();
        let probe = Probe::new(Rect::new(0, 0, 10, 10), true);
        let events = Rc::clone(&probe.focus_events);
        list.add(Box::new(probe));

        list.focus_first();
        assert_eq!(events.get(), 1);
        list.clear_focus();
        assert_eq!(events.get(), 0);
    }
}
