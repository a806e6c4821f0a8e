//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// input holds fewer bytes than the requested dimensions need
    #[error("input is truncated: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// width or height is zero or too large for the format
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// RefPack stream is malformed
    #[error("invalid refpack stream: {0}")]
    InvalidRefPack(String),

    /// palette length is not a whole number of entries
    #[error("invalid palette of {0} bytes")]
    InvalidPalette(usize),

    /// the primitive cannot handle this bit depth
    #[error("unsupported bit depth {0}")]
    UnsupportedBitDepth(u8),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;

/// Fails with [`Error::Truncated`] when `data` is shorter than `expected`
pub(crate) fn ensure_len(data: &[u8], expected: usize) -> Result<()> {
    if data.len() < expected {
        return Err(Error::Truncated {
            expected,
            actual: data.len(),
        });
    }
    Ok(())
}

/// Fails with [`Error::InvalidDimensions`] on an empty image
pub(crate) fn ensure_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 || width > 0x8000 || height > 0x8000 {
        return Err(Error::InvalidDimensions { width, height });
    }
    Ok(())
}
