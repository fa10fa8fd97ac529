//! Input events, already translated into framebuffer coordinates by the
//! front-end. Only key presses are routed; releases are the front-end's
//! business (hotkeys, controller mapping).

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MouseKind {
    Motion,
    ButtonDown {
        button: MouseButton,
        /// Consecutive-click count as reported by the event source, so
        /// widgets don't keep their own double-click clocks.
        clicks: u8,
    },
    ButtonUp {
        button: MouseButton,
    },
    /// Positive is away from the user (scroll up).
    Wheel {
        delta: i32,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MouseEvent {
    pub x: i32,
    pub y: i32,
    pub kind: MouseKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Tab,
    Enter,
    Space,
    Escape,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    Backspace,
    Delete,
    Char(char),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self { key }
    }
}

/// One drained event from the front-end's queue.
pub enum UiEvent {
    Mouse(MouseEvent),
    Key(KeyEvent),
    Quit,
}
