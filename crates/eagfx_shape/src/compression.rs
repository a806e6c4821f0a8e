//! Whole file compression handling.

use std::io::{Read, Write};

use eagfx_codec::refpack;
use flate2::{read::ZlibDecoder, write::ZlibEncoder, Compression};
use tracing::{debug, instrument, trace};

use crate::error::Result;

/// Identifies the wrapper around a whole shape file
///
/// Save-as keeps the method the file was opened with unless
/// [`crate::write::SaveOptions`] overrides it.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CompressionMethod {
    /// Stores the data as it is
    #[default]
    None,

    /// RefPack, detected by the `10 FB` family of magic bytes
    RefPack,

    /// Zlib stream
    Zlib,
}

impl CompressionMethod {
    /// Detect the wrapper from the leading bytes of a file
    pub fn detect(data: &[u8]) -> CompressionMethod {
        if refpack::is_refpack(data) {
            CompressionMethod::RefPack
        } else if data.len() >= 2
            && data[0] == 0x78
            && (u16::from(data[0]) << 8 | u16::from(data[1])) % 31 == 0
        {
            CompressionMethod::Zlib
        } else {
            CompressionMethod::None
        }
    }
}

/// Unwrap `data`, returning the plain shape bytes and the detected method
#[instrument(skip(data), fields(size = data.len()), err)]
pub(crate) fn decompress(data: Vec<u8>) -> Result<(Vec<u8>, CompressionMethod)> {
    let method = CompressionMethod::detect(&data);
    let plain = match method {
        CompressionMethod::None => data,
        CompressionMethod::RefPack => {
            trace!(declared = refpack::decompressed_size(&data)?, "unwrapping RefPack");
            refpack::decompress(&data)?
        }
        CompressionMethod::Zlib => {
            let mut out = Vec::new();
            ZlibDecoder::new(data.as_slice()).read_to_end(&mut out)?;
            out
        }
    };
    debug!(?method, size = plain.len(), "unwrapped shape");
    Ok((plain, method))
}

/// Wrap plain shape bytes with `method`
#[instrument(skip(data), fields(size = data.len()), err)]
pub(crate) fn compress(data: &[u8], method: CompressionMethod) -> Result<Vec<u8>> {
    Ok(match method {
        CompressionMethod::None => data.to_vec(),
        CompressionMethod::RefPack => refpack::compress(data),
        CompressionMethod::Zlib => {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(data)?;
            encoder.finish()?
        }
    })
}
