use crate::canvas::{Canvas, Metrics, Rect, Strip, TextStyle};
use crate::element::Element;
use crate::event::{Key, KeyEvent, MouseButton, MouseEvent, MouseKind};

use rfront_filesel::FileSelector;
use rfront_util::{Handle, Pool};

use std::path::Path;

const ROW_PAD: usize = 2;
/// Rows scrolled per wheel notch.
const WHEEL_STEP: isize = 3;
/// Label of the synthetic "no file" row offered by the save dialog.
const EMPTY_LABEL: &str = "--EMPTY--";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Row {
    /// The ".." entry leading to the parent directory.
    Parent,
    /// Synthetic row picking "no file at all".
    Empty,
    Dir(usize),
    File(usize),
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ChooserOptions {
    /// Offer a ".." row (off only when browsing is pinned to one tree).
    pub show_parent: bool,
    /// Offer the synthetic empty row.
    pub allow_empty: bool,
}

/// Scrollable, horizontally pannable directory listing over a
/// ['FileSelector']. Only the rows in view have their text rendered, and
/// each rendered strip is kept until its row scrolls out or the listing
/// changes, so scrolling costs the window delta rather than the
/// directory size.
pub struct FileChooser {
    rect: Rect,
    metrics: Metrics,
    selector: FileSelector,
    options: ChooserOptions,
    entries: Vec<Row>,
    /// Index of the top visible row.
    first: usize,
    /// Cursor; always within the visible window.
    current: usize,
    /// Shared pan column applied to every visible row.
    pan: usize,
    strips: Pool<Strip>,
    /// One cached strip per visible row slot.
    slots: Vec<Option<Handle>>,
    on_pick: Box<dyn FnMut(&Path)>,
    last_error: Option<String>,
    visible: bool,
}

impl FileChooser {
    pub fn new(
        rect: Rect,
        metrics: Metrics,
        selector: FileSelector,
        options: ChooserOptions,
        on_pick: impl FnMut(&Path) + 'static,
    ) -> Self {
        let mut chooser = Self {
            rect,
            metrics,
            selector,
            options,
            entries: Vec::new(),
            first: 0,
            current: 0,
            pan: 0,
            strips: Pool::new(),
            slots: Vec::new(),
            on_pick: Box::new(on_pick),
            last_error: None,
            visible: true,
        };
        chooser.rebuild();
        chooser
    }

    pub fn selector(&self) -> &FileSelector {
        &self.selector
    }

    /// The most recent navigation failure, handed over for display.
    pub fn take_error(&mut self) -> Option<String> {
        self.last_error.take()
    }

    /// Move the selector somewhere else ('None' means home) and rebuild.
    pub fn enter(&mut self, path: Option<&Path>) {
        let result = self.selector.change_dir(path);
        self.after_navigation(result);
    }

    fn row_h(&self) -> usize {
        self.metrics.cell_h + ROW_PAD
    }

    /// Visible row capacity inside the frame.
    fn rows_view(&self) -> usize {
        ((self.rect.h as usize).saturating_sub(2) / self.row_h()).max(1)
    }

    fn window_len(&self) -> usize {
        self.rows_view().min(self.entries.len())
    }

    fn last(&self) -> usize {
        self.first + self.window_len().saturating_sub(1)
    }

    /// Flat row list in display order, cursor and cache reset.
    fn rebuild(&mut self) {
        self.entries.clear();
        if self.options.show_parent {
            self.entries.push(Row::Parent);
        }
        if self.options.allow_empty {
            self.entries.push(Row::Empty);
        }
        self.entries
            .extend((0..self.selector.directories().len()).map(Row::Dir));
        self.entries
            .extend((0..self.selector.files().len()).map(Row::File));

        self.first = 0;
        self.current = 0;
        self.pan = 0;
        self.strips.clear();
        self.slots = vec![None; self.rows_view() + 1];
    }

    fn label(&self, row: Row) -> String {
        match row {
            Row::Parent => "..".to_string(),
            Row::Empty => EMPTY_LABEL.to_string(),
            Row::Dir(index) => format!("{}/", self.selector.directories()[index]),
            Row::File(index) => self.selector.files()[index].clone(),
        }
    }

    fn max_label_cols(&self) -> usize {
        self.entries
            .iter()
            .map(|&row| self.label(row).chars().count())
            .max()
            .unwrap_or(0)
    }

    /// Move the cursor by 'delta' rows. Within the window only the
    /// cursor moves; past it the window recenters on the target, so a
    /// long jump still only re-renders one window's worth of rows.
    fn move_by(&mut self, delta: isize) {
        if self.entries.is_empty() {
            return;
        }
        let len = self.entries.len();
        let target = (self.current as isize + delta).clamp(0, len as isize - 1) as usize;
        let window = self.window_len();
        if target < self.first || target > self.last() {
            let centered = target
                .saturating_sub(window / 2)
                .min(len - window);
            self.slide_to(centered);
        }
        self.current = target;
    }

    /// Shift the visible window, recycling strips that stay in view and
    /// freeing the ones that scroll out.
    fn slide_to(&mut self, new_first: usize) {
        let shift = new_first as isize - self.first as isize;
        self.first = new_first;
        if shift == 0 {
            return;
        }
        if shift.unsigned_abs() >= self.slots.len() {
            for slot in &mut self.slots {
                if let Some(handle) = slot.take() {
                    self.strips.remove(handle);
                }
            }
            return;
        }
        if shift > 0 {
            for _ in 0..shift {
                if let Some(handle) = self.slots.remove(0) {
                    self.strips.remove(handle);
                }
                self.slots.push(None);
            }
        } else {
            for _ in 0..-shift {
                if let Some(handle) = self.slots.pop().flatten() {
                    self.strips.remove(handle);
                }
                self.slots.insert(0, None);
            }
        }
    }

    fn activate(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        match self.entries[self.current] {
            Row::Parent => {
                let result = self.selector.change_to_parent();
                self.after_navigation(result);
            }
            Row::Dir(index) => {
                let path = self
                    .selector
                    .current_dir()
                    .join(&self.selector.directories()[index]);
                let result = self.selector.change_dir(Some(&path));
                self.after_navigation(result);
            }
            Row::File(index) => {
                let path = self
                    .selector
                    .current_dir()
                    .join(&self.selector.files()[index]);
                (self.on_pick)(&path);
            }
            Row::Empty => (self.on_pick)(Path::new("")),
        }
    }

    fn after_navigation(&mut self, result: Result<(), rfront_filesel::Error>) {
        match result {
            Ok(()) => self.rebuild(),
            Err(err) => {
                warn!("directory change failed: {err}");
                self.last_error = Some(err.to_string());
            }
        }
    }

    fn render_strip(&self, label: &str, canvas: &Canvas) -> Strip {
        let width = (label.chars().count() * self.metrics.cell_w).max(1);
        let mut strip = Strip::filled(width, self.metrics.cell_h, canvas.theme.background);
        canvas.text.draw_string(
            strip.pixels_mut(),
            width,
            0,
            0,
            label,
            TextStyle::opaque(canvas.theme.foreground, canvas.theme.background),
        );
        strip
    }
}

impl Element for FileChooser {
    fn draw(&mut self, canvas: &mut Canvas, has_focus: bool) {
        if !self.visible {
            return;
        }
        let theme = canvas.theme;
        let border = if has_focus { theme.focus } else { theme.border };
        canvas.fill_rect(self.rect, theme.background);
        canvas.frame_rect(self.rect, border);

        let row_h = self.row_h();
        let text_x = self.rect.x + 2;
        let inner_w = (self.rect.w as usize).saturating_sub(4);
        let cols = inner_w / self.metrics.cell_w;
        let pan_px = self.pan * self.metrics.cell_w;

        for offset in 0..self.window_len() {
            let index = self.first + offset;
            let row = self.entries[index];
            let y = self.rect.y + 1 + (offset * row_h) as i32;

            if index == self.current && has_focus {
                // The highlighted row is drawn live; the cache keeps the
                // plain rendering for when the cursor moves on.
                canvas.fill_rect(
                    Rect::new(self.rect.x + 1, y, self.rect.w - 2, row_h as u32),
                    theme.selection,
                );
                let label = self.label(row);
                let shown: String = label.chars().skip(self.pan).take(cols).collect();
                canvas.draw_string(text_x, y + 1, &shown, TextStyle {
                    fg: theme.foreground,
                    bg: theme.selection,
                    transparent_bg: true,
                    transparent_fg: false,
                });
                continue;
            }

            let handle = match self.slots[offset] {
                Some(handle) => handle,
                None => {
                    let strip = self.render_strip(&self.label(row), canvas);
                    let handle = self.strips.insert(strip);
                    self.slots[offset] = Some(handle);
                    handle
                }
            };
            if let Some(strip) = self.strips.get(handle) {
                canvas.blit(text_x, y + 1, strip, pan_px, cols * self.metrics.cell_w);
            }
        }
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, on: bool) {
        self.visible = on;
        if on {
            // A reopened chooser starts from the top of a fresh listing.
            self.rebuild();
        }
    }

    fn mouse_event(&mut self, event: &MouseEvent) -> bool {
        if !self.visible {
            return false;
        }
        match event.kind {
            MouseKind::Wheel { delta } if self.rect.contains(event.x, event.y) => {
                self.move_by(-delta as isize * WHEEL_STEP);
                true
            }
            MouseKind::ButtonDown { button: MouseButton::Left, clicks }
                if self.rect.contains(event.x, event.y) =>
            {
                let offset = (event.y - self.rect.y - 1).max(0) as usize / self.row_h();
                if offset < self.window_len() {
                    self.current = self.first + offset;
                    if clicks >= 2 {
                        self.activate();
                    }
                }
                true
            }
            _ => false,
        }
    }

    fn key_event(&mut self, event: &KeyEvent) -> bool {
        let rows = self.rows_view() as isize;
        let len = self.entries.len() as isize;
        match event.key {
            Key::Up => self.move_by(-1),
            Key::Down => self.move_by(1),
            Key::PageUp => self.move_by(-rows),
            Key::PageDown => self.move_by(rows),
            Key::Home => self.move_by(-len),
            Key::End => self.move_by(len),
            Key::Left => self.pan = self.pan.saturating_sub(1),
            Key::Right => {
                self.pan = (self.pan + 1).min(self.max_label_cols().saturating_sub(1));
            }
            Key::Enter | Key::Space => self.activate(),
            _ => return false,
        }
        true
    }

    fn takes_keys(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rfront_filesel::FileSelector;

    use std::cell::RefCell;
    use std::fs::{self, File};
    use std::path::PathBuf;
    use std::rc::Rc;

    fn metrics() -> Metrics {
        Metrics { cell_w: 8, cell_h: 8 }
    }

    /// Frame tall enough for exactly 'rows' rows.
    fn rect_for_rows(rows: usize) -> Rect {
        Rect::new(0, 0, 200, (rows * 10 + 2) as u32)
    }

    fn tree_with_files(count: usize) -> tempfile::TempDir {
        let tree = tempfile::tempdir().unwrap();
        for i in 0..count {
            File::create(tree.path().join(format!("game{i:02}.rom"))).unwrap();
        }
        tree
    }

    fn chooser_on(
        tree: &tempfile::TempDir,
        rows: usize,
        options: ChooserOptions,
    ) -> (FileChooser, Rc<RefCell<Vec<PathBuf>>>) {
        let picked = Rc::new(RefCell::new(Vec::new()));
        let out = Rc::clone(&picked);
        let selector = FileSelector::new(Some(tree.path()), r"\.rom$").unwrap();
        let chooser = FileChooser::new(
            rect_for_rows(rows),
            metrics(),
            selector,
            options,
            move |path: &Path| out.borrow_mut().push(path.to_path_buf()),
        );
        (chooser, picked)
    }

    fn assert_window_invariant(chooser: &FileChooser) {
        let window = chooser.window_len();
        assert_eq!(window, chooser.rows_view().min(chooser.entries.len()));
        if chooser.entries.is_empty() {
            return;
        }
        assert!(chooser.first <= chooser.current);
        assert!(chooser.current <= chooser.last());
        assert!(chooser.last() < chooser.entries.len());
    }

    #[test]
    fn window_slides_to_keep_the_cursor_visible() {
        let tree = tree_with_files(20);
        let (mut chooser, _) = chooser_on(&tree, 13, ChooserOptions::default());
        assert_eq!(chooser.entries.len(), 20);

        for _ in 0..15 {
            chooser.key_event(&KeyEvent::new(Key::Down));
        }
        assert_eq!(chooser.first, 7);
        assert_eq!(chooser.last(), 19);
        assert_eq!(chooser.current, 15);
    }

    #[test]
    fn a_single_long_jump_lands_in_the_same_window() {
        let tree = tree_with_files(20);
        let (mut chooser, _) = chooser_on(&tree, 13, ChooserOptions::default());

        chooser.move_by(15);
        assert_eq!((chooser.first, chooser.last(), chooser.current), (7, 19, 15));
    }

    #[test]
    fn window_invariant_survives_arbitrary_navigation() {
        let tree = tree_with_files(29);
        let (mut chooser, _) = chooser_on(
            &tree,
            7,
            ChooserOptions { show_parent: true, allow_empty: true },
        );

        let moves = [
            Key::Down, Key::PageDown, Key::PageDown, Key::End, Key::Up,
            Key::PageUp, Key::Home, Key::Down, Key::PageDown, Key::Up,
        ];
        for step in moves {
            chooser.key_event(&KeyEvent::new(step));
            assert_window_invariant(&chooser);
        }
    }

    #[test]
    fn synthetic_rows_come_first() {
        let tree = tree_with_files(2);
        fs::create_dir(tree.path().join("sub")).unwrap();
        let (chooser, _) = chooser_on(
            &tree,
            13,
            ChooserOptions { show_parent: true, allow_empty: true },
        );

        assert_eq!(chooser.entries[0], Row::Parent);
        assert_eq!(chooser.entries[1], Row::Empty);
        assert_eq!(chooser.entries[2], Row::Dir(0));
        assert_eq!(chooser.entries[3], Row::File(0));
    }

    #[test]
    fn picking_a_file_reports_the_full_path() {
        let tree = tree_with_files(3);
        let (mut chooser, picked) = chooser_on(&tree, 13, ChooserOptions::default());

        chooser.key_event(&KeyEvent::new(Key::Down));
        chooser.key_event(&KeyEvent::new(Key::Enter));

        assert_eq!(*picked.borrow(), [tree.path().join("game01.rom")]);
        // Picking a file must not move the selector anywhere.
        assert_eq!(chooser.selector().current_dir(), tree.path());
    }

    #[test]
    fn picking_the_empty_row_reports_an_empty_path() {
        let tree = tree_with_files(1);
        let (mut chooser, picked) = chooser_on(
            &tree,
            13,
            ChooserOptions { show_parent: false, allow_empty: true },
        );

        chooser.key_event(&KeyEvent::new(Key::Space));
        assert_eq!(*picked.borrow(), [PathBuf::new()]);
    }

    #[test]
    fn entering_a_directory_rebuilds_at_the_top() {
        let tree = tree_with_files(8);
        fs::create_dir(tree.path().join("deeper")).unwrap();
        File::create(tree.path().join("deeper").join("inner.rom")).unwrap();

        let (mut chooser, _) = chooser_on(
            &tree,
            4,
            ChooserOptions { show_parent: true, allow_empty: false },
        );

        // Move onto the directory row, then descend.
        chooser.key_event(&KeyEvent::new(Key::Down));
        chooser.key_event(&KeyEvent::new(Key::Enter));

        assert_eq!(chooser.selector().current_dir(), tree.path().join("deeper"));
        assert_eq!(chooser.current, 0);
        assert_eq!(chooser.first, 0);
        assert_window_invariant(&chooser);

        // And ".." brings us back up.
        chooser.key_event(&KeyEvent::new(Key::Enter));
        assert_eq!(chooser.selector().current_dir(), tree.path());
    }

    #[test]
    fn double_click_activates_like_enter() {
        let tree = tree_with_files(3);
        let (mut chooser, picked) = chooser_on(&tree, 13, ChooserOptions::default());

        let row_1_y = 1 + 10 + 2;
        let single = MouseEvent {
            x: 10,
            y: row_1_y,
            kind: MouseKind::ButtonDown { button: MouseButton::Left, clicks: 1 },
        };
        assert!(chooser.mouse_event(&single));
        assert_eq!(chooser.current, 1);
        assert!(picked.borrow().is_empty());

        let double = MouseEvent {
            x: 10,
            y: row_1_y,
            kind: MouseKind::ButtonDown { button: MouseButton::Left, clicks: 2 },
        };
        assert!(chooser.mouse_event(&double));
        assert_eq!(*picked.borrow(), [tree.path().join("game01.rom")]);
    }

    #[test]
    fn pan_is_clamped_to_the_longest_label() {
        let tree = tree_with_files(1);
        let (mut chooser, _) = chooser_on(&tree, 13, ChooserOptions::default());

        // "game00.rom" is 10 columns wide.
        for _ in 0..30 {
            chooser.key_event(&KeyEvent::new(Key::Right));
        }
        assert_eq!(chooser.pan, 9);
        chooser.key_event(&KeyEvent::new(Key::Left));
        assert_eq!(chooser.pan, 8);
    }

    #[test]
    fn entering_an_unfit_path_falls_back_to_home() {
        let tree = tree_with_files(2);
        let (mut chooser, _) = chooser_on(&tree, 13, ChooserOptions::default());

        chooser.enter(Some(Path::new("/no/such/place")));

        assert!(chooser.take_error().is_none());
        assert_ne!(chooser.selector().current_dir(), tree.path());
        assert_eq!(chooser.current, 0);
        assert_window_invariant(&chooser);
    }
}
