//! Error types that can be emitted from this library

use miette::Diagnostic;
use thiserror::Error;

/// Error type for library
#[derive(Error, Diagnostic, Debug)]
pub enum Error {
    /// Transparent wrapper for [`std::io::Error`]
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Transparent wrapper for [`binrw::Error`]
    #[error(transparent)]
    BinRWError(#[from] binrw::Error),

    /// A pixel, swizzle or compression primitive failed
    #[error(transparent)]
    #[diagnostic(code(eagfx::codec))]
    CodecPrimitiveFailure(#[from] eagfx_codec::error::Error),

    /// input holds fewer than four bytes
    #[error("input is empty, no signature could be read")]
    #[diagnostic(code(eagfx::empty_input))]
    EmptyInput,

    /// signature is not one of the known shape signatures
    #[error("unsupported signature {:?}", String::from_utf8_lossy(.0))]
    #[diagnostic(
        code(eagfx::unsupported_signature),
        help("old shapes start with SHPI/SHPP/SHPS/SHPX/SHPM/SHPG/SHPA, new shapes with ShpF/ShpS/ShpX/ShpP/ShpM/ShpG")
    )]
    UnsupportedSignature([u8; 4]),

    /// declared file size matches the real size in neither byte order
    #[error("declared size {declared_le} (le) / {declared_be} (be) does not match actual size {actual}")]
    #[diagnostic(code(eagfx::size_mismatch))]
    SizeMismatch {
        declared_le: u32,
        declared_be: u32,
        actual: u64,
    },

    /// no decoder or encoder exists for this image type
    #[error("image type {0} is not supported for preview or import")]
    #[diagnostic(code(eagfx::unsupported_image_type))]
    UnsupportedImageType(u8),

    /// re-encoded payload does not fit in the original region
    #[error("encoded data is {encoded} bytes, the entry only holds {limit}")]
    #[diagnostic(code(eagfx::encoded_too_large))]
    EncodedTooLarge { encoded: usize, limit: usize },

    /// padding failed to bring the payload up to the original length
    #[error("encoded data is {encoded} bytes after padding, expected {limit}")]
    EncodedTooShortAfterPad { encoded: usize, limit: usize },

    /// no palette could be located for an indexed image
    #[error("no palette found")]
    PaletteNotFound,

    /// attachment record type outside the known set
    #[error("unknown attachment record type {0}")]
    UnknownAttachmentType(u8),

    /// unable to find requested entry
    #[error("unable to find requested entry")]
    EntryNotFound(#[from] EntryNotFoundError),

    /// attachment index out of range for the entry
    #[error("entry {entry} has no attachment {attachment}")]
    AttachmentNotFound { entry: usize, attachment: usize },

    /// {0}
    #[error("{0}")]
    CustomError(String),
}

/// Error type to provide further information when an entry has not been found
#[derive(Error, Diagnostic, Debug)]
#[error("unable to find requested entry")]
pub enum EntryNotFoundError {
    /// at index {0}
    #[error("at index {0}")]
    Index(usize),

    /// by tag {0}
    #[error("by tag {0}")]
    Tag(String),
}

/// Generic result type with crate's Error as its error variant
pub type Result<T> = core::result::Result<T, Error>;
