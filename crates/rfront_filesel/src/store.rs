use crate::selector::is_valid_dir;

use directories_next::ProjectDirs;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Single-path state file written by older releases. Read but never
/// written; new state always goes to the keyed files.
const LEGACY_FILE: &str = "cdir";

/// Remembers the directory each file chooser was left in. Every chooser
/// owns a short key ("rom", "bios", ...) mapping to a text file in the
/// application state directory holding one absolute path per line.
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    /// Store rooted in the default state directory for 'app'.
    pub fn new(app: &str) -> Option<Self> {
        let project = ProjectDirs::from(app, "", "")?;
        Some(Self::at(project.data_dir()))
    }

    /// Store rooted at an explicit directory.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The remembered directory for 'key', if one was saved and still
    /// names a listable directory.
    pub fn load(&self, key: &str) -> Option<PathBuf> {
        read_path_file(&self.dir.join(format!("lastdir.{key}")))
            .or_else(|| read_path_file(&self.dir.join(LEGACY_FILE)))
    }

    pub fn store(&self, key: &str, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(format!("lastdir.{key}"));
        fs::write(path, format!("{}\n", dir.display()))
    }
}

fn read_path_file(path: &Path) -> Option<PathBuf> {
    let text = fs::read_to_string(path).ok()?;
    let line = text.lines().next()?.trim_end();
    let dir = PathBuf::from(line);
    if !is_valid_dir(&dir) {
        warn!("stale directory in {}: {line}", path.display());
        return None;
    }
    Some(dir)
}
