use crate::canvas::{Canvas, Metrics, Rect, TextStyle};
use crate::element::Element;
use crate::event::{Key, KeyEvent, MouseButton, MouseEvent, MouseKind};

use std::cell::Cell;
use std::rc::Rc;

const HPAD: i32 = 4;
const ROW_PAD: usize = 2;
/// Gap between menu bar titles, in cells.
const TITLE_GAP: usize = 2;

/// One menu row. Separators are never selectable; everything else obeys
/// its enabled flag.
pub enum MenuItem {
    Action {
        label: String,
        on_select: Box<dyn FnMut()>,
    },
    Separator,
    Submenu {
        label: String,
        menu: Menu,
    },
    /// Writes 'value' into the shared 'target' when picked, then runs
    /// the optional callback.
    Choice {
        label: String,
        value: usize,
        target: Rc<Cell<usize>>,
        on_select: Option<Box<dyn FnMut()>>,
    },
}

impl MenuItem {
    fn label(&self) -> &str {
        match self {
            MenuItem::Action { label, .. } => label,
            MenuItem::Separator => "",
            MenuItem::Submenu { label, .. } => label,
            MenuItem::Choice { label, .. } => label,
        }
    }
}

struct Entry {
    item: MenuItem,
    enabled: bool,
}

/// A vertical menu. Lives either inside a ['MenuBar'], cascading out of
/// another menu, or on its own in a ['List'].
pub struct Menu {
    origin: (i32, i32),
    metrics: Metrics,
    entries: Vec<Entry>,
    selected: Option<usize>,
    /// Keyboard control currently sits in the selected entry's submenu.
    in_submenu: bool,
    visible: bool,
}

impl Menu {
    pub fn new(x: i32, y: i32, metrics: Metrics) -> Self {
        Self {
            origin: (x, y),
            metrics,
            entries: Vec::new(),
            selected: None,
            in_submenu: false,
            visible: true,
        }
    }

    pub fn add_action(&mut self, label: impl Into<String>, on_select: impl FnMut() + 'static) -> usize {
        self.push(MenuItem::Action {
            label: label.into(),
            on_select: Box::new(on_select),
        })
    }

    pub fn add_separator(&mut self) -> usize {
        self.push(MenuItem::Separator)
    }

    pub fn add_submenu(&mut self, label: impl Into<String>, menu: Menu) -> usize {
        self.push(MenuItem::Submenu {
            label: label.into(),
            menu,
        })
    }

    pub fn add_choice(
        &mut self,
        label: impl Into<String>,
        value: usize,
        target: Rc<Cell<usize>>,
        on_select: Option<Box<dyn FnMut()>>,
    ) -> usize {
        self.push(MenuItem::Choice {
            label: label.into(),
            value,
            target,
            on_select,
        })
    }

    fn push(&mut self, item: MenuItem) -> usize {
        let enabled = !matches!(item, MenuItem::Separator);
        self.entries.push(Entry { item, enabled });
        self.entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Enable or disable an entry. Disabling the selected entry moves
    /// the selection back to the first enabled one. Separators stay
    /// unselectable whatever the caller asks.
    pub fn set_enabled(&mut self, index: usize, on: bool) {
        if matches!(self.entries[index].item, MenuItem::Separator) {
            return;
        }
        self.entries[index].enabled = on;
        if !on && self.selected == Some(index) {
            self.in_submenu = false;
            self.select_first_enabled();
        }
    }

    pub fn set_origin(&mut self, x: i32, y: i32) {
        self.origin = (x, y);
    }

    fn first_enabled(&self) -> Option<usize> {
        (0..self.entries.len()).find(|&index| self.entries[index].enabled)
    }

    fn select_first_enabled(&mut self) {
        self.selected = self.first_enabled();
    }

    /// Nearest enabled entry strictly before/after 'from'.
    fn enabled_towards(&self, from: usize, step: isize) -> Option<usize> {
        let mut index = from as isize + step;
        while index >= 0 && (index as usize) < self.entries.len() {
            if self.entries[index as usize].enabled {
                return Some(index as usize);
            }
            index += step;
        }
        None
    }

    fn row_h(&self) -> usize {
        self.metrics.cell_h + ROW_PAD
    }

    fn width_cols(&self) -> usize {
        let widest = self
            .entries
            .iter()
            .map(|entry| entry.item.label().chars().count())
            .max()
            .unwrap_or(0);
        // Room for the choice marker and the submenu arrow.
        widest + 4
    }

    fn rect(&self) -> Rect {
        Rect::new(
            self.origin.0,
            self.origin.1,
            (self.width_cols() * self.metrics.cell_w) as u32 + 2 * HPAD as u32,
            (self.entries.len() * self.row_h()) as u32,
        )
    }

    fn row_at(&self, x: i32, y: i32) -> Option<usize> {
        if !self.rect().contains(x, y) {
            return None;
        }
        Some((y - self.origin.1) as usize / self.row_h())
    }

    fn submenu_open(&self) -> bool {
        matches!(
            self.selected.map(|index| &self.entries[index]),
            Some(Entry { item: MenuItem::Submenu { .. }, enabled: true })
        )
    }

    fn open_submenu(&mut self, index: usize) {
        self.in_submenu = true;
        let (x, y) = self.submenu_origin(index);
        if let MenuItem::Submenu { menu, .. } = &mut self.entries[index].item {
            menu.set_origin(x, y);
            menu.focus_changed(true);
        }
    }

    fn close_submenu(&mut self) {
        if !self.in_submenu {
            return;
        }
        self.in_submenu = false;
        if let Some(index) = self.selected {
            if let MenuItem::Submenu { menu, .. } = &mut self.entries[index].item {
                menu.focus_changed(false);
            }
        }
    }

    /// Child menus cascade immediately to the right of their entry.
    fn submenu_origin(&self, index: usize) -> (i32, i32) {
        let rect = self.rect();
        (
            rect.x + rect.w as i32,
            rect.y + (index * self.row_h()) as i32,
        )
    }

    fn activate(&mut self, index: usize) {
        if !self.entries[index].enabled {
            return;
        }
        match &mut self.entries[index].item {
            MenuItem::Action { on_select, .. } => on_select(),
            MenuItem::Separator => (),
            MenuItem::Submenu { .. } => self.open_submenu(index),
            MenuItem::Choice { value, target, on_select, .. } => {
                target.set(*value);
                if let Some(on_select) = on_select {
                    on_select();
                }
            }
        }
    }
}

impl Element for Menu {
    fn draw(&mut self, canvas: &mut Canvas, has_focus: bool) {
        if !self.visible {
            return;
        }
        let rect = self.rect();
        canvas.fill_rect(rect, canvas.theme.background);
        canvas.frame_rect(rect, canvas.theme.border);

        let row_h = self.row_h();
        for (index, entry) in self.entries.iter().enumerate() {
            let y = rect.y + (index * row_h) as i32;
            let row = Rect::new(rect.x + 1, y, rect.w - 2, row_h as u32);

            if let MenuItem::Separator = entry.item {
                let mid = y + row_h as i32 / 2;
                canvas.fill_rect(Rect::new(rect.x, mid, rect.w, 1), canvas.theme.border);
                continue;
            }

            let selected = has_focus && self.selected == Some(index);
            let bg = if selected {
                canvas.theme.selection
            } else {
                canvas.theme.background
            };
            if selected {
                canvas.fill_rect(row, bg);
            }
            let fg = if entry.enabled {
                canvas.theme.foreground
            } else {
                canvas.theme.disabled
            };
            let style = TextStyle {
                fg,
                bg,
                transparent_bg: true,
                transparent_fg: false,
            };

            let text_y = y + (row_h - self.metrics.cell_h) as i32 / 2;
            let marker_w = 2 * self.metrics.cell_w as i32;
            if let MenuItem::Choice { value, target, .. } = &entry.item {
                if target.get() == *value {
                    canvas.draw_string(rect.x + HPAD, text_y, "*", style);
                }
            }
            canvas.draw_string(rect.x + HPAD + marker_w, text_y, entry.item.label(), style);
            if let MenuItem::Submenu { .. } = entry.item {
                let arrow_x = rect.x + rect.w as i32 - HPAD - self.metrics.cell_w as i32;
                canvas.draw_string(arrow_x, text_y, ">", style);
            }
        }

        // The cascading child is on screen whenever its entry is picked.
        if self.submenu_open() {
            let index = self.selected.unwrap();
            let (x, y) = self.submenu_origin(index);
            let in_submenu = self.in_submenu;
            if let MenuItem::Submenu { menu, .. } = &mut self.entries[index].item {
                menu.set_origin(x, y);
                menu.draw(canvas, has_focus && in_submenu);
            }
        }
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, on: bool) {
        self.visible = on;
        if !on {
            self.close_submenu();
            self.selected = None;
        }
    }

    fn mouse_event(&mut self, event: &MouseEvent) -> bool {
        if !self.visible {
            return false;
        }
        if self.submenu_open() {
            let index = self.selected.unwrap();
            let claimed = match &mut self.entries[index].item {
                MenuItem::Submenu { menu, .. } => menu.mouse_event(event),
                _ => false,
            };
            if claimed {
                self.in_submenu = true;
                return true;
            }
        }
        match event.kind {
            MouseKind::Motion => {
                if let Some(row) = self.row_at(event.x, event.y) {
                    if self.entries[row].enabled && self.selected != Some(row) {
                        self.close_submenu();
                        self.selected = Some(row);
                    }
                }
                false
            }
            MouseKind::ButtonDown { button: MouseButton::Left, .. } => {
                match self.row_at(event.x, event.y) {
                    Some(row) => {
                        if self.entries[row].enabled {
                            self.close_submenu();
                            self.selected = Some(row);
                            self.activate(row);
                        }
                        true
                    }
                    None => false,
                }
            }
            _ => false,
        }
    }

    fn key_event(&mut self, event: &KeyEvent) -> bool {
        if self.in_submenu {
            let index = match self.selected {
                Some(index) => index,
                None => {
                    self.in_submenu = false;
                    return false;
                }
            };
            let handled = match &mut self.entries[index].item {
                MenuItem::Submenu { menu, .. } => menu.key_event(event),
                _ => false,
            };
            if handled {
                return true;
            }
            return match event.key {
                // The child hit its top or the user backed out; control
                // returns here with the submenu entry still selected.
                Key::Left | Key::Escape | Key::Up => {
                    self.close_submenu();
                    true
                }
                _ => false,
            };
        }

        match event.key {
            Key::Up => match self.selected.and_then(|from| self.enabled_towards(from, -1)) {
                Some(prev) => {
                    self.selected = Some(prev);
                    true
                }
                // Topmost enabled entry: hand control back to the parent.
                None => false,
            },
            Key::Down => {
                let next = match self.selected {
                    Some(from) => self.enabled_towards(from, 1),
                    None => self.first_enabled(),
                };
                if let Some(next) = next {
                    self.selected = Some(next);
                }
                true
            }
            Key::Enter | Key::Space => {
                if let Some(index) = self.selected {
                    self.activate(index);
                }
                true
            }
            Key::Right => match self.selected {
                Some(index)
                    if self.entries[index].enabled
                        && matches!(self.entries[index].item, MenuItem::Submenu { .. }) =>
                {
                    self.open_submenu(index);
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }

    fn takes_keys(&self) -> bool {
        true
    }

    fn focus_changed(&mut self, focused: bool) {
        if focused {
            if self.selected.is_none() {
                self.select_first_enabled();
            }
        } else {
            self.close_submenu();
            self.selected = None;
        }
    }
}

struct BarEntry {
    title: String,
    menu: Menu,
    enabled: bool,
}

/// Horizontal bar of titles, each dropping a ['Menu'] below itself.
pub struct MenuBar {
    rect: Rect,
    metrics: Metrics,
    menus: Vec<BarEntry>,
    selected: Option<usize>,
    open: bool,
    visible: bool,
}

impl MenuBar {
    pub fn new(rect: Rect, metrics: Metrics) -> Self {
        Self {
            rect,
            metrics,
            menus: Vec::new(),
            selected: None,
            open: false,
            visible: true,
        }
    }

    pub fn add_menu(&mut self, title: impl Into<String>, menu: Menu) -> usize {
        self.menus.push(BarEntry {
            title: title.into(),
            menu,
            enabled: true,
        });
        self.menus.len() - 1
    }

    pub fn set_enabled(&mut self, index: usize, on: bool) {
        self.menus[index].enabled = on;
        if !on && self.selected == Some(index) {
            self.close();
            self.selected = (0..self.menus.len()).find(|&i| self.menus[i].enabled);
        }
    }

    pub fn menu_mut(&mut self, index: usize) -> &mut Menu {
        &mut self.menus[index].menu
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Pixel span of a title on the bar.
    fn title_span(&self, index: usize) -> (i32, u32) {
        let mut x = self.rect.x + HPAD;
        for entry in &self.menus[..index] {
            let cols = entry.title.chars().count() + TITLE_GAP;
            x += (cols * self.metrics.cell_w) as i32;
        }
        let w = (self.menus[index].title.chars().count() * self.metrics.cell_w) as u32;
        (x, w)
    }

    fn title_at(&self, x: i32, y: i32) -> Option<usize> {
        if !self.rect.contains(x, y) {
            return None;
        }
        (0..self.menus.len()).find(|&index| {
            let (tx, tw) = self.title_span(index);
            x >= tx && x < tx + tw as i32
        })
    }

    fn enabled_towards(&self, from: usize, step: isize) -> Option<usize> {
        let mut index = from as isize + step;
        while index >= 0 && (index as usize) < self.menus.len() {
            if self.menus[index as usize].enabled {
                return Some(index as usize);
            }
            index += step;
        }
        None
    }

    fn open_selected(&mut self) {
        let Some(index) = self.selected else {
            return;
        };
        if !self.menus[index].enabled {
            return;
        }
        let (x, _) = self.title_span(index);
        let y = self.rect.y + self.rect.h as i32;
        self.open = true;
        let menu = &mut self.menus[index].menu;
        menu.set_origin(x, y);
        menu.set_visible(true);
        menu.focus_changed(true);
    }

    fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        if let Some(index) = self.selected {
            self.menus[index].menu.focus_changed(false);
        }
    }

    fn move_selection(&mut self, step: isize) {
        let next = match self.selected {
            Some(from) => self.enabled_towards(from, step),
            None => (0..self.menus.len()).find(|&i| self.menus[i].enabled),
        };
        // At either end the selection stays put.
        let Some(next) = next else {
            return;
        };
        if self.selected == Some(next) {
            return;
        }
        let was_open = self.open;
        self.close();
        self.selected = Some(next);
        if was_open {
            self.open_selected();
        }
    }
}

impl Element for MenuBar {
    fn draw(&mut self, canvas: &mut Canvas, has_focus: bool) {
        if !self.visible {
            return;
        }
        canvas.fill_rect(self.rect, canvas.theme.background);
        canvas.fill_rect(
            Rect::new(
                self.rect.x,
                self.rect.y + self.rect.h as i32 - 1,
                self.rect.w,
                1,
            ),
            canvas.theme.border,
        );

        for index in 0..self.menus.len() {
            let (x, w) = self.title_span(index);
            let picked = self.selected == Some(index) && (has_focus || self.open);
            let bg = if picked {
                canvas.theme.selection
            } else {
                canvas.theme.background
            };
            if picked {
                canvas.fill_rect(Rect::new(x - 2, self.rect.y, w + 4, self.rect.h), bg);
            }
            let fg = if self.menus[index].enabled {
                canvas.theme.foreground
            } else {
                canvas.theme.disabled
            };
            let y = self.rect.y + (self.rect.h as i32 - self.metrics.cell_h as i32) / 2;
            canvas.draw_string(x, y, &self.menus[index].title, TextStyle {
                fg,
                bg,
                transparent_bg: true,
                transparent_fg: false,
            });
        }

        if self.open {
            if let Some(index) = self.selected {
                self.menus[index].menu.draw(canvas, has_focus);
            }
        }
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, on: bool) {
        self.visible = on;
        if !on {
            self.close();
            self.selected = None;
        }
    }

    fn mouse_event(&mut self, event: &MouseEvent) -> bool {
        if !self.visible {
            return false;
        }
        if self.open {
            if let Some(index) = self.selected {
                if self.menus[index].menu.mouse_event(event) {
                    return true;
                }
            }
        }
        match event.kind {
            MouseKind::ButtonDown { button: MouseButton::Left, .. } => {
                match self.title_at(event.x, event.y) {
                    Some(index) if self.menus[index].enabled => {
                        if self.selected == Some(index) && self.open {
                            self.close();
                        } else {
                            self.close();
                            self.selected = Some(index);
                            self.open_selected();
                        }
                        true
                    }
                    Some(_) => true,
                    None => {
                        // A click elsewhere folds the bar back up.
                        self.close();
                        false
                    }
                }
            }
            MouseKind::Motion => {
                if self.open {
                    if let Some(index) = self.title_at(event.x, event.y) {
                        if self.menus[index].enabled && self.selected != Some(index) {
                            self.close();
                            self.selected = Some(index);
                            self.open_selected();
                        }
                    }
                }
                false
            }
            _ => false,
        }
    }

    fn key_event(&mut self, event: &KeyEvent) -> bool {
        if self.open {
            if let Some(index) = self.selected {
                if self.menus[index].menu.key_event(event) {
                    return true;
                }
            }
            return match event.key {
                // The menu declined Up at its top row: the bar takes
                // keyboard control back.
                Key::Up | Key::Escape => {
                    self.close();
                    true
                }
                Key::Left => {
                    self.move_selection(-1);
                    true
                }
                Key::Right => {
                    self.move_selection(1);
                    true
                }
                _ => false,
            };
        }

        match event.key {
            Key::Left => {
                self.move_selection(-1);
                true
            }
            Key::Right => {
                self.move_selection(1);
                true
            }
            Key::Down | Key::Enter | Key::Space => {
                if self.selected.is_none() {
                    self.selected = (0..self.menus.len()).find(|&i| self.menus[i].enabled);
                }
                self.open_selected();
                true
            }
            _ => false,
        }
    }

    fn takes_keys(&self) -> bool {
        true
    }

    fn focus_changed(&mut self, focused: bool) {
        if focused {
            if self.selected.is_none() {
                self.selected = (0..self.menus.len()).find(|&i| self.menus[i].enabled);
            }
        } else {
            self.close();
            self.selected = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::RefCell;

    fn metrics() -> Metrics {
        Metrics { cell_w: 8, cell_h: 8 }
    }

    fn key(menu: &mut Menu, key: Key) -> bool {
        menu.key_event(&KeyEvent::new(key))
    }

    #[test]
    fn focus_selects_the_first_enabled_entry() {
        let mut menu = Menu::new(0, 0, metrics());
        menu.add_action("load", || ());
        menu.add_action("save", || ());
        menu.set_enabled(0, false);

        menu.focus_changed(true);
        assert_eq!(menu.selected(), Some(1));

        menu.focus_changed(false);
        assert_eq!(menu.selected(), None);
    }

    #[test]
    fn navigation_skips_disabled_entries() {
        let mut menu = Menu::new(0, 0, metrics());
        menu.add_action("a", || ());
        menu.add_separator();
        menu.add_action("b", || ());
        menu.add_action("c", || ());
        menu.set_enabled(2, false);

        menu.focus_changed(true);
        assert_eq!(menu.selected(), Some(0));

        assert!(key(&mut menu, Key::Down));
        assert_eq!(menu.selected(), Some(3));

        // Nothing below; selection stays, the key is still consumed.
        assert!(key(&mut menu, Key::Down));
        assert_eq!(menu.selected(), Some(3));

        assert!(key(&mut menu, Key::Up));
        assert_eq!(menu.selected(), Some(0));

        // Up from the top is released to the parent.
        assert!(!key(&mut menu, Key::Up));
        assert_eq!(menu.selected(), Some(0));
    }

    #[test]
    fn action_and_choice_entries_fire_on_enter() {
        let fired = Rc::new(Cell::new(0));
        let seen = Rc::clone(&fired);
        let value = Rc::new(Cell::new(0));

        let mut menu = Menu::new(0, 0, metrics());
        menu.add_action("go", move || seen.set(seen.get() + 1));
        menu.add_choice("x2", 2, Rc::clone(&value), None);

        menu.focus_changed(true);
        assert!(key(&mut menu, Key::Enter));
        assert_eq!(fired.get(), 1);

        key(&mut menu, Key::Down);
        assert!(key(&mut menu, Key::Space));
        assert_eq!(value.get(), 2);
    }

    #[test]
    fn disabling_the_selected_entry_reselects() {
        let mut menu = Menu::new(0, 0, metrics());
        menu.add_action("a", || ());
        menu.add_action("b", || ());

        menu.focus_changed(true);
        key(&mut menu, Key::Down);
        assert_eq!(menu.selected(), Some(1));

        menu.set_enabled(1, false);
        assert_eq!(menu.selected(), Some(0));

        menu.set_enabled(0, false);
        assert_eq!(menu.selected(), None);
    }

    #[test]
    fn selection_invariant_holds_under_random_navigation() {
        let mut menu = Menu::new(0, 0, metrics());
        for i in 0..6 {
            menu.add_action(format!("entry {i}"), || ());
        }
        menu.set_enabled(0, false);
        menu.set_enabled(3, false);
        menu.set_enabled(5, false);

        menu.focus_changed(true);
        let moves = [Key::Down, Key::Down, Key::Up, Key::Down, Key::Up, Key::Up, Key::Down];
        for step in moves {
            menu.key_event(&KeyEvent::new(step));
            let selected = menu.selected().unwrap();
            assert!(menu.entries[selected].enabled);
        }
    }

    #[test]
    fn submenu_descends_and_releases() {
        let picked = Rc::new(Cell::new(false));
        let seen = Rc::clone(&picked);

        let mut sub = Menu::new(0, 0, metrics());
        sub.add_action("inner", move || seen.set(true));

        let mut menu = Menu::new(0, 0, metrics());
        menu.add_submenu("more", sub);

        menu.focus_changed(true);
        assert!(key(&mut menu, Key::Enter));
        assert!(menu.in_submenu);

        assert!(key(&mut menu, Key::Enter));
        assert!(picked.get());

        // Up at the submenu's top hands control back.
        assert!(key(&mut menu, Key::Up));
        assert!(!menu.in_submenu);
        assert_eq!(menu.selected(), Some(0));
    }

    #[test]
    fn bar_opens_menus_and_takes_control_back() {
        let fired = Rc::new(RefCell::new(Vec::new()));

        let mut bar = MenuBar::new(Rect::new(0, 0, 320, 12), metrics());
        for name in ["file", "view"] {
            let mut menu = Menu::new(0, 0, metrics());
            let log = Rc::clone(&fired);
            menu.add_action("first", move || log.borrow_mut().push(name));
            bar.add_menu(name, menu);
        }

        bar.focus_changed(true);
        assert_eq!(bar.selected(), Some(0));

        assert!(bar.key_event(&KeyEvent::new(Key::Down)));
        assert!(bar.is_open());

        assert!(bar.key_event(&KeyEvent::new(Key::Enter)));
        assert_eq!(*fired.borrow(), ["file"]);

        // Moving right while open opens the neighbour instead.
        assert!(bar.key_event(&KeyEvent::new(Key::Right)));
        assert_eq!(bar.selected(), Some(1));
        assert!(bar.is_open());

        assert!(bar.key_event(&KeyEvent::new(Key::Up)));
        assert!(!bar.is_open());
    }
}
