use crate::Error;

use directories_next::UserDirs;
use regex::Regex;

use std::fs;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

/// Entries matching this are left out of both listings.
const HIDDEN_PATTERN: &str = r"^\.";

/// Checks that 'path' is fit to be a selector's current directory: an
/// absolute path to an existing directory, with no '..' segments and no
/// trailing separator. The filesystem root is exempt from the trailing
/// separator rule.
pub fn is_valid_dir(path: &Path) -> bool {
    if !path.is_absolute() {
        return false;
    }
    if path.components().any(|c| c == Component::ParentDir) {
        return false;
    }
    let ends_in_separator = path
        .to_string_lossy()
        .ends_with(MAIN_SEPARATOR);
    if ends_in_separator && path.parent().is_some() {
        return false;
    }
    fs::metadata(path).map(|meta| meta.is_dir()).unwrap_or(false)
}

fn home_dir() -> Result<PathBuf, Error> {
    let dirs = UserDirs::new().ok_or(Error::NoHome)?;
    let home = dirs.home_dir().to_path_buf();
    if !is_valid_dir(&home) {
        return Err(Error::NoHome);
    }
    Ok(home)
}

pub struct FileSelector {
    dir: PathBuf,
    dirs: Vec<String>,
    files: Vec<String>,
    filter: Regex,
    hidden: Regex,
}

impl FileSelector {
    /// Create a selector showing 'initial', or the home directory if
    /// 'initial' is absent or unfit. An unfit home directory or a filter
    /// pattern that fails to compile is not recoverable.
    pub fn new(initial: Option<&Path>, filter: &str) -> Result<Self, Error> {
        let mut selector = Self {
            dir: PathBuf::new(),
            dirs: Vec::new(),
            files: Vec::new(),
            filter: Regex::new(filter)?,
            hidden: Regex::new(HIDDEN_PATTERN)?,
        };
        match selector.change_dir(initial) {
            Err(Error::Scan { path, source }) => {
                warn!("can't list {}: {source}, starting in home directory", path.display());
                selector.change_dir(None)?;
            }
            Err(err) => return Err(err),
            Ok(()) => (),
        }
        Ok(selector)
    }

    /// The directory the listings describe. Always satisfies
    /// ['is_valid_dir'].
    pub fn current_dir(&self) -> &Path {
        &self.dir
    }

    /// Subdirectory names, sorted. Hidden entries are left out.
    pub fn directories(&self) -> &[String] {
        &self.dirs
    }

    /// Names of regular files matching the filter, sorted.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    /// Move the selector to 'path' and rebuild both listings. An unfit
    /// path falls back to the home directory; 'None' asks for the home
    /// directory outright. A directory that turns out to be unreadable is
    /// reported as ['Error::Scan'] and leaves the selector where it was.
    pub fn change_dir(&mut self, path: Option<&Path>) -> Result<(), Error> {
        let target = match path {
            Some(path) if is_valid_dir(path) => path.to_path_buf(),
            Some(path) => {
                warn!("not a listable directory: {}, using home instead", path.display());
                home_dir()?
            }
            None => home_dir()?,
        };
        // Build the new listings aside so a failed scan can't leave the
        // selector half updated.
        let (dirs, files) = self.scan(&target)?;
        self.dir = target;
        self.dirs = dirs;
        self.files = files;
        Ok(())
    }

    /// Move to the parent of the current directory. At the filesystem
    /// root this is a no-op rescan of the root itself.
    pub fn change_to_parent(&mut self) -> Result<(), Error> {
        let parent = match self.dir.parent() {
            Some(parent) => parent.to_path_buf(),
            None => self.dir.clone(),
        };
        self.change_dir(Some(&parent))
    }

    fn scan(&self, path: &Path) -> Result<(Vec<String>, Vec<String>), Error> {
        let entries = fs::read_dir(path).map_err(|source| Error::Scan {
            path: path.to_path_buf(),
            source,
        })?;

        let mut dirs = Vec::new();
        let mut files = Vec::new();

        for entry in entries {
            let Ok(entry) = entry else {
                continue;
            };
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.hidden.is_match(&name) {
                continue;
            }
            if file_type.is_dir() {
                dirs.push(name);
            } else if file_type.is_file() && self.filter.is_match(&name) {
                files.push(name);
            }
        }

        dirs.sort();
        files.sort();

        Ok((dirs, files))
    }
}
