//! Directory scanning and filtering behind every file chooser dialog.
//!
//! ['FileSelector'] keeps a validated current directory together with
//! sorted listings of its subdirectories and matching files. ['DirStore']
//! persists the directory a chooser was left in between runs.

#[macro_use]
extern crate log;

mod selector;
mod store;

use thiserror::Error;

use std::io;
use std::path::PathBuf;

pub use selector::{is_valid_dir, FileSelector};
pub use store::DirStore;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid file filter pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The home directory fallback itself failed. There is no further
    /// fallback, so the caller is expected to give up.
    #[error("no usable home directory")]
    NoHome,

    #[error("failed to read directory {path}: {source}")]
    Scan { path: PathBuf, source: io::Error },
}
