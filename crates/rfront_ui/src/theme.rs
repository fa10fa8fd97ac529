use crate::canvas::Pixel;

use directories_next::ProjectDirs;
use serde::{Deserialize, Serialize};

use std::fs;
use std::path::Path;
use std::time::Duration;

/// Widget colors and timing knobs, stored as 'theme.toml' in the
/// application config directory. Colors are logical pixel values in
/// whatever format the front-end renders (the defaults assume RGB565).
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub background: Pixel,
    pub foreground: Pixel,
    pub border: Pixel,
    pub focus: Pixel,
    pub selection: Pixel,
    pub disabled: Pixel,
    /// Caret blink half-period in milliseconds.
    pub blink_ms: u64,
    /// How long status bar messages stay up, in milliseconds.
    pub status_ms: u64,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: 0x0861,
            foreground: 0xe71c,
            border: 0x5acb,
            focus: 0x07ff,
            selection: 0x2a7d,
            disabled: 0x4208,
            blink_ms: 400,
            status_ms: 3000,
        }
    }
}

impl Theme {
    /// Try to load the theme for 'app' from its config directory. Any
    /// failure degrades to the defaults; a missing file isn't worth a
    /// warning, a present but broken one is.
    pub fn from_file_or_default(app: &str) -> Self {
        let Some(dir) = ProjectDirs::from(app, "", "") else {
            return Self::default();
        };
        let path = dir.config_dir().join("theme.toml");
        if !path.exists() {
            return Self::default();
        }
        Self::from_file(&path).unwrap_or_else(|msg| {
            warn!("{msg}, using default theme");
            Self::default()
        })
    }

    fn from_file(path: &Path) -> Result<Self, String> {
        let text = fs::read_to_string(path)
            .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
        toml::from_str(&text).map_err(|err| format!("failed to parse {}: {err}", path.display()))
    }

    pub fn blink_period(&self) -> Duration {
        Duration::from_millis(self.blink_ms)
    }

    pub fn status_timeout(&self) -> Duration {
        Duration::from_millis(self.status_ms)
    }
}
