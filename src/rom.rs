//! Program image loading.
//!
//! A ROM is a raw binary: the bytes are copied to 0x200 unchanged. Size
//! limits are enforced when the machine is built, not here.

use std::path::Path;
use thiserror::Error;

/// Load a ROM file from disk.
pub fn load_rom<P: AsRef<Path>>(path: P) -> Result<Vec<u8>, RomError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| RomError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    if bytes.is_empty() {
        return Err(RomError::Empty(path.display().to_string()));
    }

    log::debug!("loaded {} bytes from {}", bytes.len(), path.display());
    Ok(bytes)
}

/// Errors that can occur loading a ROM.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RomError {
    #[error("cannot read {path}: {message}")]
    Io { path: String, message: String },

    #[error("{0} is empty")]
    Empty(String),
}
