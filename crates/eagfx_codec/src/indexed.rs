//! Indexed colour expansion and generation.

use tracing::instrument;

use crate::error::{ensure_dimensions, ensure_len, Error, Result};
use crate::pixel::{decode_colors, encode_colors, to_quads, PixelFormat};
use crate::quantize::{map_to_palette, median_cut};
use crate::ByteOrder;

/// Order of the two pixels packed into one byte of a 4 bit image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NibbleOrder {
    /// First pixel in the low nibble (PC, PlayStation, PSP)
    #[default]
    LowFirst,
    /// First pixel in the high nibble (GameCube, N64)
    HighFirst,
}

/// Layout of the palette indices of an indexed image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexFormat {
    pub bits: u8,
    pub nibble_order: NibbleOrder,
}

impl IndexFormat {
    pub const I4: IndexFormat = IndexFormat {
        bits: 4,
        nibble_order: NibbleOrder::LowFirst,
    };
    pub const I4_HIGH_FIRST: IndexFormat = IndexFormat {
        bits: 4,
        nibble_order: NibbleOrder::HighFirst,
    };
    pub const I8: IndexFormat = IndexFormat {
        bits: 8,
        nibble_order: NibbleOrder::LowFirst,
    };

    /// Largest number of palette entries the indices can address
    pub const fn colors(self) -> usize {
        1 << self.bits
    }

    /// Bytes taken by `pixels` indices
    pub const fn stride(self, pixels: usize) -> usize {
        (pixels * self.bits as usize + 7) / 8
    }
}

/// An indexed image produced by [`encode_indexed`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexedImage {
    /// Packed palette indices
    pub indices: Vec<u8>,
    /// Palette entries in the requested palette layout
    pub palette: Vec<u8>,
}

/// Decode a palette into RGBA quadruples
pub fn decode_palette(palette: &[u8], format: PixelFormat, order: ByteOrder) -> Result<Vec<[u8; 4]>> {
    let bits = format.bits_per_pixel() as usize;
    let count = palette.len() * 8 / bits;
    if count == 0 {
        return Err(Error::InvalidPalette(palette.len()));
    }
    Ok(decode_colors(palette, count, format, order))
}

fn unpack_indices(data: &[u8], pixels: usize, format: IndexFormat) -> Result<Vec<u8>> {
    match format.bits {
        8 => Ok(data[..pixels].to_vec()),
        4 => Ok((0..pixels)
            .map(|i| {
                let byte = data[i / 2];
                let first = i % 2 == 0;
                match (format.nibble_order, first) {
                    (NibbleOrder::LowFirst, true) | (NibbleOrder::HighFirst, false) => byte & 0x0F,
                    _ => byte >> 4,
                }
            })
            .collect()),
        bits => Err(Error::UnsupportedBitDepth(bits)),
    }
}

fn pack_indices(indices: &[u8], format: IndexFormat) -> Result<Vec<u8>> {
    match format.bits {
        8 => Ok(indices.to_vec()),
        4 => Ok(indices
            .chunks(2)
            .map(|pair| {
                let first = pair[0] & 0x0F;
                let second = pair.get(1).copied().unwrap_or(0) & 0x0F;
                match format.nibble_order {
                    NibbleOrder::LowFirst => first | (second << 4),
                    NibbleOrder::HighFirst => (first << 4) | second,
                }
            })
            .collect()),
        bits => Err(Error::UnsupportedBitDepth(bits)),
    }
}

/// Expand an indexed image into RGBA8888
///
/// Indices past the end of the palette decode as transparent black.
#[instrument(skip(data, palette), err)]
pub fn decode_indexed(
    data: &[u8],
    palette: &[u8],
    width: u32,
    height: u32,
    format: IndexFormat,
    palette_format: PixelFormat,
    order: ByteOrder,
) -> Result<Vec<u8>> {
    ensure_dimensions(width, height)?;
    let pixels = width as usize * height as usize;
    ensure_len(data, format.stride(pixels))?;

    let colors = decode_palette(palette, palette_format, order)?;
    let indices = unpack_indices(data, pixels, format)?;

    Ok(indices
        .into_iter()
        .flat_map(|i| colors.get(i as usize).copied().unwrap_or([0, 0, 0, 0]))
        .collect())
}

/// Convert an RGBA8888 image into palette indices
///
/// With `fixed_palette` the pixels are mapped onto that palette, which is
/// returned unchanged. Otherwise a palette is generated by median cut and
/// encoded in `palette_format`. The generated palette holds `max_colors`
/// entries, capped at what the indices can address.
#[allow(clippy::too_many_arguments)]
#[instrument(skip(rgba, fixed_palette), err)]
pub fn encode_indexed(
    rgba: &[u8],
    width: u32,
    height: u32,
    format: IndexFormat,
    palette_format: PixelFormat,
    order: ByteOrder,
    fixed_palette: Option<&[u8]>,
    max_colors: usize,
) -> Result<IndexedImage> {
    ensure_dimensions(width, height)?;
    let pixels = width as usize * height as usize;
    ensure_len(rgba, pixels * 4)?;

    let colors = to_quads(&rgba[..pixels * 4]);

    let (entries, palette) = match fixed_palette {
        Some(bytes) => {
            let mut entries = decode_palette(bytes, palette_format, order)?;
            entries.truncate(format.colors());
            (entries, bytes.to_vec())
        }
        None => {
            let limit = max_colors.clamp(1, format.colors());
            let mut entries = median_cut(&colors, limit);
            let generated = entries.len();
            entries.resize(limit, [0, 0, 0, 0xFF]);
            let palette = encode_colors(&entries, palette_format, order);
            entries.truncate(generated);
            (entries, palette)
        }
    };

    let indices = map_to_palette(&colors, &entries);
    Ok(IndexedImage {
        indices: pack_indices(&indices, format)?,
        palette,
    })
}
