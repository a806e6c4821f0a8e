//! DXT (BC1 to BC3) block compression.

use squish::{Format as SquishFormat, Params};
use tracing::instrument;

use crate::error::{ensure_dimensions, ensure_len, Result};

/// Block compression family of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockFormat {
    /// DXT1, 8 bytes per 4x4 block
    Dxt1,
    /// DXT3, 16 bytes per 4x4 block with explicit alpha
    Dxt3,
    /// DXT5, 16 bytes per 4x4 block with interpolated alpha
    Dxt5,
}

impl BlockFormat {
    /// Bytes per 4x4 block
    pub const fn block_bytes(self) -> usize {
        match self {
            BlockFormat::Dxt1 => 8,
            BlockFormat::Dxt3 | BlockFormat::Dxt5 => 16,
        }
    }

    /// Number of blocks along each axis for an image of this size
    pub const fn blocks(width: u32, height: u32) -> (u32, u32) {
        ((width + 3) / 4, (height + 3) / 4)
    }

    /// Size of the compressed image in bytes
    pub const fn compressed_size(self, width: u32, height: u32) -> usize {
        let (bw, bh) = Self::blocks(width, height);
        bw as usize * bh as usize * self.block_bytes()
    }

    fn squish(self) -> SquishFormat {
        match self {
            BlockFormat::Dxt1 => SquishFormat::Bc1,
            BlockFormat::Dxt3 => SquishFormat::Bc2,
            BlockFormat::Dxt5 => SquishFormat::Bc3,
        }
    }
}

/// Decompress a DXT image into RGBA8888
#[instrument(skip(data), err)]
pub fn decode_block_compressed(
    data: &[u8],
    width: u32,
    height: u32,
    format: BlockFormat,
) -> Result<Vec<u8>> {
    ensure_dimensions(width, height)?;
    let size = format.compressed_size(width, height);
    ensure_len(data, size)?;

    let mut output = vec![0u8; width as usize * height as usize * 4];
    format
        .squish()
        .decompress(&data[..size], width as usize, height as usize, &mut output);
    Ok(output)
}

/// Compress an RGBA8888 image into DXT blocks
#[instrument(skip(rgba), err)]
pub fn encode_block_compressed(
    rgba: &[u8],
    width: u32,
    height: u32,
    format: BlockFormat,
) -> Result<Vec<u8>> {
    ensure_dimensions(width, height)?;
    ensure_len(rgba, width as usize * height as usize * 4)?;

    let squish = format.squish();
    let mut output = vec![0u8; squish.compressed_size(width as usize, height as usize)];
    squish.compress(
        &rgba[..width as usize * height as usize * 4],
        width as usize,
        height as usize,
        Params::default(),
        &mut output,
    );
    Ok(output)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::block::{decode_block_compressed, encode_block_compressed, BlockFormat};
    use crate::error::Result;

    #[test]
    fn compressed_sizes() {
        assert_eq!(BlockFormat::Dxt1.compressed_size(64, 64), 2048);
        assert_eq!(BlockFormat::Dxt5.compressed_size(64, 64), 4096);
        assert_eq!(BlockFormat::Dxt1.compressed_size(2, 2), 8);
    }

    #[test]
    fn solid_block_survives_compression() -> Result<()> {
        let rgba = [0xFF, 0x00, 0x00, 0xFF].repeat(16);
        let data = encode_block_compressed(&rgba, 4, 4, BlockFormat::Dxt1)?;
        assert_eq!(data.len(), 8);

        let decoded = decode_block_compressed(&data, 4, 4, BlockFormat::Dxt1)?;
        assert_eq!(decoded, rgba);
        Ok(())
    }
}
