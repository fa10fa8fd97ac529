//! The stock dialogs built out of the widget set: file open/save, the
//! modal error box and the transient status line.

use crate::button::Button;
use crate::canvas::{Canvas, Metrics, Rect, TextStyle};
use crate::chooser::{ChooserOptions, FileChooser};
use crate::element::{Element, Shared};
use crate::event::{Key, KeyEvent, MouseEvent, MouseKind};
use crate::input::Input;
use crate::list::List;
use crate::theme::Theme;
use crate::timer::{Tick, TimerHandle, Timers};

use rfront_filesel::{DirStore, FileSelector};

use std::cell::{Cell, RefCell};
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

fn title_h(metrics: Metrics) -> u32 {
    metrics.cell_h as u32 + 4
}

fn button_h(metrics: Metrics) -> u32 {
    metrics.cell_h as u32 + 6
}

fn button_w(metrics: Metrics, label: &str) -> u32 {
    ((label.chars().count() + 2) * metrics.cell_w) as u32
}

fn draw_dialog_frame(canvas: &mut Canvas, rect: Rect, metrics: Metrics, title: &str) {
    let theme = canvas.theme;
    canvas.fill_rect(rect, theme.background);
    canvas.frame_rect(rect, theme.border);
    canvas.fill_rect(
        Rect::new(rect.x, rect.y, rect.w, title_h(metrics)),
        theme.selection,
    );
    let x = rect.x + (rect.w as i32 - (title.chars().count() * metrics.cell_w) as i32) / 2;
    canvas.draw_string(x, rect.y + 2, title, TextStyle {
        fg: theme.foreground,
        bg: theme.selection,
        transparent_bg: true,
        transparent_fg: false,
    });
}

/// File picker dialog: a chooser over the whole filesystem plus a cancel
/// button. The directory it was left in is remembered under 'store_key'
/// and becomes the starting point next time.
pub struct OpenDialog {
    rect: Rect,
    metrics: Metrics,
    title: String,
    inner: List,
    chooser: Rc<RefCell<FileChooser>>,
    store: Option<DirStore>,
    store_key: String,
    close_requested: Rc<Cell<bool>>,
    visible: bool,
}

impl OpenDialog {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rect: Rect,
        metrics: Metrics,
        title: impl Into<String>,
        filter: &str,
        store: Option<DirStore>,
        store_key: impl Into<String>,
        timers: Rc<RefCell<Timers>>,
        mut on_pick: impl FnMut(&Path) + 'static,
    ) -> Result<Self, rfront_filesel::Error> {
        let store_key = store_key.into();
        let initial = store.as_ref().and_then(|store| store.load(&store_key));
        let selector = FileSelector::new(initial.as_deref(), filter)?;

        let close_requested = Rc::new(Cell::new(false));

        let chooser_rect = Rect::new(
            rect.x + 2,
            rect.y + title_h(metrics) as i32 + 2,
            rect.w - 4,
            rect.h - title_h(metrics) - button_h(metrics) - 8,
        );
        let close = Rc::clone(&close_requested);
        let chooser = Rc::new(RefCell::new(FileChooser::new(
            chooser_rect,
            metrics,
            selector,
            ChooserOptions { show_parent: true, allow_empty: false },
            move |path: &Path| {
                on_pick(path);
                close.set(true);
            },
        )));

        let cancel_w = button_w(metrics, "Cancel");
        let cancel_rect = Rect::new(
            rect.x + (rect.w as i32 - cancel_w as i32) / 2,
            rect.y + rect.h as i32 - button_h(metrics) as i32 - 3,
            cancel_w,
            button_h(metrics),
        );
        let close = Rc::clone(&close_requested);
        let cancel = Button::new(cancel_rect, "Cancel", timers, move || close.set(true));

        let mut inner = List::new();
        inner.add(Box::new(Shared::new(Rc::clone(&chooser))));
        inner.add(Box::new(cancel));
        inner.focus_first();

        Ok(Self {
            rect,
            metrics,
            title: title.into(),
            inner,
            chooser,
            store,
            store_key,
            close_requested,
            visible: false,
        })
    }

    pub fn chooser(&self) -> Rc<RefCell<FileChooser>> {
        Rc::clone(&self.chooser)
    }

    /// A navigation failure waiting to be shown, if any.
    pub fn take_error(&mut self) -> Option<String> {
        self.chooser.borrow_mut().take_error()
    }

    fn persist_directory(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let dir = self.chooser.borrow().selector().current_dir().to_path_buf();
        if let Err(err) = store.store(&self.store_key, &dir) {
            warn!("failed to remember {}: {err}", dir.display());
        }
    }

    fn drain_close_request(&mut self) {
        if self.close_requested.replace(false) {
            self.set_visible(false);
        }
    }
}

impl Element for OpenDialog {
    fn draw(&mut self, canvas: &mut Canvas, has_focus: bool) {
        if !self.visible {
            return;
        }
        draw_dialog_frame(canvas, self.rect, self.metrics, &self.title);
        self.inner.draw(canvas, has_focus);
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, on: bool) {
        if self.visible == on {
            return;
        }
        self.visible = on;
        if on {
            if let Some(dir) = self.store.as_ref().and_then(|store| store.load(&self.store_key)) {
                self.chooser.borrow_mut().enter(Some(&dir));
            }
            self.inner.focus_first();
        } else {
            self.persist_directory();
        }
    }

    fn mouse_event(&mut self, event: &MouseEvent) -> bool {
        if !self.visible {
            return false;
        }
        let handled = self.inner.mouse_event(event);
        self.drain_close_request();
        // Clicks inside the frame never fall through to what's below.
        handled
            || (!matches!(event.kind, MouseKind::Motion)
                && self.rect.contains(event.x, event.y))
    }

    fn key_event(&mut self, event: &KeyEvent) -> bool {
        if event.key == Key::Escape {
            self.set_visible(false);
            return true;
        }
        let handled = self.inner.key_event(event);
        self.drain_close_request();
        handled
    }

    fn takes_keys(&self) -> bool {
        true
    }
}

/// Save dialog: chooser, filename input and save/cancel buttons. Picking
/// a file copies its name into the input; save hands back the chooser's
/// directory joined with whatever the input holds, or the empty path for
/// an empty name.
pub struct SaveDialog {
    rect: Rect,
    metrics: Metrics,
    title: String,
    inner: List,
    chooser: Rc<RefCell<FileChooser>>,
    input: Rc<RefCell<Input>>,
    store: Option<DirStore>,
    store_key: String,
    close_requested: Rc<Cell<bool>>,
    visible: bool,
}

impl SaveDialog {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rect: Rect,
        metrics: Metrics,
        title: impl Into<String>,
        filter: &str,
        store: Option<DirStore>,
        store_key: impl Into<String>,
        theme: &Theme,
        timers: Rc<RefCell<Timers>>,
        mut on_save: impl FnMut(&Path) + 'static,
    ) -> Result<Self, rfront_filesel::Error> {
        let store_key = store_key.into();
        let initial = store.as_ref().and_then(|store| store.load(&store_key));
        let selector = FileSelector::new(initial.as_deref(), filter)?;

        let close_requested = Rc::new(Cell::new(false));

        let input_h = metrics.cell_h as u32 + 6;
        let chooser_rect = Rect::new(
            rect.x + 2,
            rect.y + title_h(metrics) as i32 + 2,
            rect.w - 4,
            rect.h - title_h(metrics) - input_h - button_h(metrics) - 12,
        );
        let input_rect = Rect::new(
            rect.x + 2,
            chooser_rect.y + chooser_rect.h as i32 + 2,
            rect.w - 4,
            input_h,
        );

        let input = Rc::new(RefCell::new(Input::new(
            input_rect,
            metrics,
            255,
            theme.blink_period(),
            Rc::clone(&timers),
        )));

        let name_sink = Rc::clone(&input);
        let chooser = Rc::new(RefCell::new(FileChooser::new(
            chooser_rect,
            metrics,
            selector,
            ChooserOptions { show_parent: true, allow_empty: true },
            move |path: &Path| {
                let name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                name_sink.borrow_mut().set_text(&name);
            },
        )));

        let save_w = button_w(metrics, "Save");
        let cancel_w = button_w(metrics, "Cancel");
        let buttons_y = rect.y + rect.h as i32 - button_h(metrics) as i32 - 3;
        let gap = metrics.cell_w as i32;
        let total = save_w as i32 + gap + cancel_w as i32;
        let save_x = rect.x + (rect.w as i32 - total) / 2;

        let result_input = Rc::clone(&input);
        let result_chooser = Rc::clone(&chooser);
        let close = Rc::clone(&close_requested);
        let save = Button::new(
            Rect::new(save_x, buttons_y, save_w, button_h(metrics)),
            "Save",
            Rc::clone(&timers),
            move || {
                let name = result_input.borrow().text().to_string();
                if name.is_empty() {
                    on_save(Path::new(""));
                } else {
                    let path = result_chooser.borrow().selector().current_dir().join(&name);
                    on_save(&path);
                }
                close.set(true);
            },
        );

        let close = Rc::clone(&close_requested);
        let cancel = Button::new(
            Rect::new(save_x + save_w as i32 + gap, buttons_y, cancel_w, button_h(metrics)),
            "Cancel",
            timers,
            move || close.set(true),
        );

        let mut inner = List::new();
        inner.add(Box::new(Shared::new(Rc::clone(&chooser))));
        inner.add(Box::new(Shared::new(Rc::clone(&input))));
        inner.add(Box::new(save));
        inner.add(Box::new(cancel));
        inner.focus_first();

        Ok(Self {
            rect,
            metrics,
            title: title.into(),
            inner,
            chooser,
            input,
            store,
            store_key,
            close_requested,
            visible: false,
        })
    }

    pub fn chooser(&self) -> Rc<RefCell<FileChooser>> {
        Rc::clone(&self.chooser)
    }

    pub fn input(&self) -> Rc<RefCell<Input>> {
        Rc::clone(&self.input)
    }

    pub fn take_error(&mut self) -> Option<String> {
        self.chooser.borrow_mut().take_error()
    }

    fn persist_directory(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let dir = self.chooser.borrow().selector().current_dir().to_path_buf();
        if let Err(err) = store.store(&self.store_key, &dir) {
            warn!("failed to remember {}: {err}", dir.display());
        }
    }

    fn drain_close_request(&mut self) {
        if self.close_requested.replace(false) {
            self.set_visible(false);
        }
    }
}

impl Element for SaveDialog {
    fn draw(&mut self, canvas: &mut Canvas, has_focus: bool) {
        if !self.visible {
            return;
        }
        draw_dialog_frame(canvas, self.rect, self.metrics, &self.title);
        self.inner.draw(canvas, has_focus);
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, on: bool) {
        if self.visible == on {
            return;
        }
        self.visible = on;
        if on {
            if let Some(dir) = self.store.as_ref().and_then(|store| store.load(&self.store_key)) {
                self.chooser.borrow_mut().enter(Some(&dir));
            }
            self.input.borrow_mut().set_text("");
            self.inner.focus_first();
        } else {
            self.persist_directory();
        }
    }

    fn mouse_event(&mut self, event: &MouseEvent) -> bool {
        if !self.visible {
            return false;
        }
        let handled = self.inner.mouse_event(event);
        self.drain_close_request();
        handled
            || (!matches!(event.kind, MouseKind::Motion)
                && self.rect.contains(event.x, event.y))
    }

    fn key_event(&mut self, event: &KeyEvent) -> bool {
        if event.key == Key::Escape {
            self.set_visible(false);
            return true;
        }
        let handled = self.inner.key_event(event);
        self.drain_close_request();
        handled
    }

    fn takes_keys(&self) -> bool {
        true
    }
}

/// Modal message box. While visible its owning ['List'] routes
/// everything here, so Tab can't wander off and stray clicks don't reach
/// the widgets underneath.
pub struct ErrorDialog {
    rect: Rect,
    metrics: Metrics,
    heading: String,
    lines: Vec<String>,
    ok: Button,
    dismissed: Rc<Cell<bool>>,
    visible: bool,
}

impl ErrorDialog {
    pub fn new(rect: Rect, metrics: Metrics, timers: Rc<RefCell<Timers>>) -> Self {
        let dismissed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&dismissed);

        let ok_w = button_w(metrics, "Ok");
        let ok_rect = Rect::new(
            rect.x + (rect.w as i32 - ok_w as i32) / 2,
            rect.y + rect.h as i32 - button_h(metrics) as i32 - 3,
            ok_w,
            button_h(metrics),
        );
        let ok = Button::new(ok_rect, "Ok", timers, move || flag.set(true));

        Self {
            rect,
            metrics,
            heading: String::new(),
            lines: Vec::new(),
            ok,
            dismissed,
            visible: false,
        }
    }

    /// Fill in the message and pop the dialog up.
    pub fn show(&mut self, heading: impl Into<String>, text: &str) {
        self.heading = heading.into();
        let cols = ((self.rect.w as usize).saturating_sub(8) / self.metrics.cell_w).max(1);
        self.lines = wrap_text(text, cols);
        self.visible = true;
    }

    fn drain_dismissal(&mut self) {
        if self.dismissed.replace(false) {
            self.visible = false;
        }
    }
}

impl Element for ErrorDialog {
    fn draw(&mut self, canvas: &mut Canvas, has_focus: bool) {
        if !self.visible {
            return;
        }
        draw_dialog_frame(canvas, self.rect, self.metrics, &self.heading);
        let line_h = (self.metrics.cell_h + 2) as i32;
        let mut y = self.rect.y + title_h(self.metrics) as i32 + 3;
        for line in &self.lines {
            canvas.draw_string(self.rect.x + 4, y, line, TextStyle {
                fg: canvas.theme.foreground,
                bg: canvas.theme.background,
                transparent_bg: true,
                transparent_fg: false,
            });
            y += line_h;
        }
        self.ok.draw(canvas, has_focus);
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
        let handled = self.ok.mouse_event(event);
        self.drain_dismissal();
        handled
            || (!matches!(event.kind, MouseKind::Motion)
                && self.rect.contains(event.x, event.y))
    }

    fn key_event(&mut self, event: &KeyEvent) -> bool {
        match event.key {
            Key::Enter | Key::Space | Key::Escape => {
                self.visible = false;
                true
            }
            _ => false,
        }
    }

    fn takes_keys(&self) -> bool {
        true
    }

    fn is_modal(&self) -> bool {
        true
    }
}

/// One-line transient message strip along the bottom of the screen.
/// Messages clear themselves after the theme's status timeout.
pub struct StatusBar {
    rect: Rect,
    text: Rc<RefCell<String>>,
    timeout: Duration,
    timers: Rc<RefCell<Timers>>,
    clear_timer: Option<TimerHandle>,
    visible: bool,
}

impl StatusBar {
    pub fn new(rect: Rect, timeout: Duration, timers: Rc<RefCell<Timers>>) -> Self {
        Self {
            rect,
            text: Rc::new(RefCell::new(String::new())),
            timeout,
            timers,
            clear_timer: None,
            visible: true,
        }
    }

    pub fn show(&mut self, message: impl Into<String>) {
        *self.text.borrow_mut() = message.into();

        let mut timers = self.timers.borrow_mut();
        if let Some(handle) = self.clear_timer.take() {
            if timers.contains(handle) {
                timers.remove(handle);
            }
        }
        let text = Rc::clone(&self.text);
        self.clear_timer = Some(timers.add(self.timeout, move || {
            text.borrow_mut().clear();
            Tick::Stop
        }));
    }

    pub fn text(&self) -> String {
        self.text.borrow().clone()
    }
}

impl Element for StatusBar {
    fn draw(&mut self, canvas: &mut Canvas, _has_focus: bool) {
        if !self.visible {
            return;
        }
        let theme = canvas.theme;
        canvas.fill_rect(self.rect, theme.background);
        canvas.fill_rect(Rect::new(self.rect.x, self.rect.y, self.rect.w, 1), theme.border);
        let text = self.text.borrow();
        if !text.is_empty() {
            let y = self.rect.y + 2;
            canvas.draw_string(self.rect.x + 3, y, &text, TextStyle {
                fg: theme.foreground,
                bg: theme.background,
                transparent_bg: true,
                transparent_fg: false,
            });
        }
    }

    fn visible(&self) -> bool {
        self.visible
    }

    fn set_visible(&mut self, on: bool) {
        self.visible = on;
    }

    fn mouse_event(&mut self, _event: &MouseEvent) -> bool {
        false
    }
}

impl Drop for StatusBar {
    fn drop(&mut self) {
        if let Some(handle) = self.clear_timer.take() {
            let mut timers = self.timers.borrow_mut();
            if timers.contains(handle) {
                timers.remove(handle);
            }
        }
    }
}

fn wrap_text(text: &str, cols: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > cols {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        // A single overlong word is split hard.
        if word.chars().count() > cols {
            for ch in word.chars() {
                if line.chars().count() >= cols {
                    lines.push(std::mem::take(&mut line));
                }
                line.push(ch);
            }
        } else {
            line.push_str(word);
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs::File;
    use std::path::PathBuf;

    fn metrics() -> Metrics {
        Metrics { cell_w: 8, cell_h: 8 }
    }

    fn timers() -> Rc<RefCell<Timers>> {
        Rc::new(RefCell::new(Timers::new()))
    }

    fn rom_tree() -> tempfile::TempDir {
        let tree = tempfile::tempdir().unwrap();
        File::create(tree.path().join("a.rom")).unwrap();
        File::create(tree.path().join("b.rom")).unwrap();
        tree
    }

    #[test]
    fn open_dialog_picks_close_and_remember_the_directory() {
        let tree = rom_tree();
        let state = tempfile::tempdir().unwrap();
        let picked = Rc::new(RefCell::new(Vec::<PathBuf>::new()));
        let out = Rc::clone(&picked);

        let mut dialog = OpenDialog::new(
            Rect::new(0, 0, 300, 200),
            metrics(),
            "Open ROM",
            r"\.rom$",
            Some(DirStore::at(state.path())),
            "rom",
            timers(),
            move |path| out.borrow_mut().push(path.to_path_buf()),
        )
        .unwrap();

        dialog.chooser().borrow_mut().enter(Some(tree.path()));
        dialog.set_visible(true);

        // First row is "..", second is a.rom.
        dialog.key_event(&KeyEvent::new(Key::Down));
        dialog.key_event(&KeyEvent::new(Key::Enter));

        assert_eq!(*picked.borrow(), [tree.path().join("a.rom")]);
        assert!(!dialog.visible());

        // The directory must have been written through the store.
        let store = DirStore::at(state.path());
        assert_eq!(store.load("rom"), Some(tree.path().to_path_buf()));
    }

    #[test]
    fn open_dialog_escape_cancels_without_picking() {
        let tree = rom_tree();
        let picked = Rc::new(RefCell::new(Vec::<PathBuf>::new()));
        let out = Rc::clone(&picked);

        let mut dialog = OpenDialog::new(
            Rect::new(0, 0, 300, 200),
            metrics(),
            "Open ROM",
            r"\.rom$",
            None,
            "rom",
            timers(),
            move |path| out.borrow_mut().push(path.to_path_buf()),
        )
        .unwrap();

        dialog.chooser().borrow_mut().enter(Some(tree.path()));
        dialog.set_visible(true);

        assert!(dialog.key_event(&KeyEvent::new(Key::Escape)));
        assert!(!dialog.visible());
        assert!(picked.borrow().is_empty());
    }

    #[test]
    fn save_dialog_joins_directory_and_typed_name() {
        let tree = rom_tree();
        let saved = Rc::new(RefCell::new(Vec::<PathBuf>::new()));
        let out = Rc::clone(&saved);

        let mut dialog = SaveDialog::new(
            Rect::new(0, 0, 300, 220),
            metrics(),
            "Save state",
            r"\.sav$",
            None,
            "sav",
            &Theme::default(),
            timers(),
            move |path| out.borrow_mut().push(path.to_path_buf()),
        )
        .unwrap();

        dialog.chooser().borrow_mut().enter(Some(tree.path()));
        dialog.set_visible(true);

        dialog.input().borrow_mut().set_text("slot1.sav");

        // Tab past the input to the save button and press it.
        dialog.key_event(&KeyEvent::new(Key::Tab));
        dialog.key_event(&KeyEvent::new(Key::Tab));
        dialog.key_event(&KeyEvent::new(Key::Enter));

        assert_eq!(*saved.borrow(), [tree.path().join("slot1.sav")]);
        assert!(!dialog.visible());
    }

    #[test]
    fn save_dialog_picking_a_file_fills_the_input() {
        let tree = rom_tree();
        let mut dialog = SaveDialog::new(
            Rect::new(0, 0, 300, 220),
            metrics(),
            "Save state",
            r"\.rom$",
            None,
            "sav",
            &Theme::default(),
            timers(),
            |_| (),
        )
        .unwrap();

        dialog.chooser().borrow_mut().enter(Some(tree.path()));
        dialog.set_visible(true);

        // Rows: "..", "--EMPTY--", a.rom. Land on a.rom and pick it.
        dialog.key_event(&KeyEvent::new(Key::Down));
        dialog.key_event(&KeyEvent::new(Key::Down));
        dialog.key_event(&KeyEvent::new(Key::Enter));

        assert_eq!(dialog.input().borrow().text(), "a.rom");
        assert!(dialog.visible());

        // The synthetic empty row clears it again.
        dialog.key_event(&KeyEvent::new(Key::Up));
        dialog.key_event(&KeyEvent::new(Key::Enter));
        assert_eq!(dialog.input().borrow().text(), "");
    }

    #[test]
    fn error_dialog_dismisses_on_enter_and_ok() {
        let mut dialog = ErrorDialog::new(Rect::new(0, 0, 200, 100), metrics(), timers());
        assert!(!dialog.visible());

        dialog.show("Error", "directory is gone");
        assert!(dialog.visible());
        assert!(dialog.is_modal());

        assert!(dialog.key_event(&KeyEvent::new(Key::Enter)));
        assert!(!dialog.visible());

        dialog.show("Error", "again");
        let ok_rect = dialog.ok.rect();
        let click = MouseEvent {
            x: ok_rect.x + 2,
            y: ok_rect.y + 2,
            kind: MouseKind::ButtonDown {
                button: crate::event::MouseButton::Left,
                clicks: 1,
            },
        };
        assert!(dialog.mouse_event(&click));
        assert!(!dialog.visible());
    }

    #[test]
    fn status_bar_clears_after_the_timeout() {
        let timers = timers();
        let mut status = StatusBar::new(
            Rect::new(0, 190, 320, 10),
            Duration::from_millis(100),
            Rc::clone(&timers),
        );

        status.show("state saved");
        assert_eq!(status.text(), "state saved");

        timers.borrow_mut().run(Duration::from_millis(50), Duration::ZERO);
        assert_eq!(status.text(), "state saved");

        // A new message re-arms the timeout from scratch.
        status.show("state loaded");
        timers.borrow_mut().run(Duration::from_millis(60), Duration::ZERO);
        assert_eq!(status.text(), "state loaded");
        timers.borrow_mut().run(Duration::from_millis(40), Duration::ZERO);
        assert_eq!(status.text(), "");
    }

    #[test]
    fn wrap_text_respects_the_column_limit() {
        let lines = wrap_text("a directory with a very long name vanished", 12);
        assert!(lines.iter().all(|line| line.chars().count() <= 12));
        assert_eq!(lines.concat().replace(' ', ""),
            "adirectorywithaverylongnamevanished");
    }
}
