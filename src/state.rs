/// Durable last-known state.
///
/// Exactly one blob is kept: the raw payload of the last changed cycle for
/// spreadsheet sources, or `"<cases>,<deaths>"` for the scraped source. It
/// is read once at startup and written once per changed cycle. There is no
/// history.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::StateError;

pub const DEFAULT_STATE_PATH: &str = "latest.csv";

/// Read/write of the single last-known-state blob.
pub trait StateStore {
    /// `Ok(None)` when nothing has been persisted yet.
    fn load(&self) -> Result<Option<Vec<u8>>, StateError>;

    fn save(&self, blob: &[u8]) -> Result<(), StateError>;
}

/// Blob stored in a single file, replaced atomically on save.
pub struct FileStateStore {
    path: PathBuf,
}

impl FileStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StateError {
        StateError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl StateStore for FileStateStore {
    fn load(&self) -> Result<Option<Vec<u8>>, StateError> {
        match fs::read(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, blob: &[u8]) -> Result<(), StateError> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, blob).map_err(|e| self.io_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))
    }
}
