//! Image selection sources.
//!
//! A [`Picker`] produces the image the user chose, or nothing at all:
//! cancelling a picker is `Ok(None)`, not an error, and callers are expected
//! to treat it as a silent no-op. Denied media permissions are the one real
//! failure a picker can report.
//!
//! The picked image arrives as an [`ImageHandle`] — a locator, not bytes.
//! Reading happens exactly once, when the pipeline consumes the handle.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PickerError {
    #[error("media library access denied: {0}")]
    PermissionDenied(String),
}

/// Locator for a picked image. Consumed once by the upload pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageHandle {
    path: PathBuf,
}

impl ImageHandle {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full source bytes. Takes `self`: a handle feeds exactly one
    /// upload, and the picked file may be a temp copy gone by the next one.
    pub fn into_bytes(self) -> io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }
}

/// Trait for image selection sources.
pub trait Picker: Send + Sync {
    /// Ask the source for an image. `Ok(None)` means the user backed out.
    fn pick(&self) -> Result<Option<ImageHandle>, PickerError>;
}

/// Picker that always selects a fixed path. The CLI's `upload <image>`
/// argument is a pick that already happened.
pub struct PathPicker {
    path: PathBuf,
}

impl PathPicker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Picker for PathPicker {
    fn pick(&self) -> Result<Option<ImageHandle>, PickerError> {
        Ok(Some(ImageHandle::from_path(self.path.clone())))
    }
}
