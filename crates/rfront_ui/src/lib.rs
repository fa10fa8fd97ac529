//! Widget toolkit shared by the console front-ends. Widgets paint into a
//! caller-owned framebuffer and consume input events that the front-end
//! has already translated into framebuffer coordinates; windowing,
//! texture upload and glyph rasterization all stay on the other side of
//! the ['TextPainter'] and ['UiEvent'] seams.

#[macro_use]
extern crate log;

mod button;
mod canvas;
mod chooser;
mod context;
mod dialog;
mod element;
mod event;
mod input;
mod list;
mod menu;
mod scrollbar;
mod theme;
mod timer;

pub use button::Button;
pub use canvas::{Canvas, Metrics, Pixel, Rect, Strip, TextPainter, TextStyle};
pub use chooser::{ChooserOptions, FileChooser};
pub use context::UiContext;
pub use dialog::{ErrorDialog, OpenDialog, SaveDialog, StatusBar};
pub use element::{Element, Shared};
pub use event::{Key, KeyEvent, MouseButton, MouseEvent, MouseKind, UiEvent};
pub use input::Input;
pub use list::List;
pub use menu::{Menu, MenuBar, MenuItem};
pub use scrollbar::{Orientation, ScrollBar};
pub use theme::Theme;
pub use timer::{Tick, TimerHandle, Timers};
