//! Nintendo 64 texel formats.
//!
//! All N64 data is big endian. Textures loaded straight from TMEM keep odd
//! rows with their 32 bit words swapped inside each 64 bit group, see
//! [`deinterleave_tmem`].

use tracing::instrument;

use crate::error::{ensure_dimensions, ensure_len, Result};
use crate::indexed::{decode_indexed, encode_indexed, IndexFormat};
use crate::pixel::{decode_direct, encode_direct, to_quads, PixelFormat};
use crate::ByteOrder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum N64Format {
    Rgba5551,
    Rgba8888,
    /// 4 bit intensity, 4 bit alpha
    Ia8,
    /// 8 bit intensity, 8 bit alpha
    Ia16,
    I4,
    I8,
    Ci4,
    Ci8,
}

impl N64Format {
    pub const fn bits_per_pixel(self) -> u8 {
        match self {
            N64Format::I4 | N64Format::Ci4 => 4,
            N64Format::Ia8 | N64Format::I8 | N64Format::Ci8 => 8,
            N64Format::Rgba5551 | N64Format::Ia16 => 16,
            N64Format::Rgba8888 => 32,
        }
    }

    /// Index layout for the colour indexed formats
    pub const fn index_format(self) -> Option<IndexFormat> {
        match self {
            N64Format::Ci4 => Some(IndexFormat::I4_HIGH_FIRST),
            N64Format::Ci8 => Some(IndexFormat::I8),
            _ => None,
        }
    }

    const fn pixel_format(self) -> Option<PixelFormat> {
        match self {
            N64Format::Rgba5551 => Some(PixelFormat::Rgba5551),
            N64Format::Rgba8888 => Some(PixelFormat::Rgba8888),
            N64Format::Ia16 => Some(PixelFormat::La88),
            N64Format::I4 => Some(PixelFormat::L4),
            N64Format::I8 => Some(PixelFormat::L8),
            N64Format::Ia8 | N64Format::Ci4 | N64Format::Ci8 => None,
        }
    }

    pub const fn size(self, width: u32, height: u32) -> usize {
        (width as usize * height as usize * self.bits_per_pixel() as usize + 7) / 8
    }
}

/// Undo the TMEM odd row word swap. Applying it twice restores the input.
pub fn deinterleave_tmem(data: &[u8], width: u32, height: u32, bpp: u8) -> Vec<u8> {
    let mut out = data.to_vec();
    let row = (width as usize * bpp as usize + 7) / 8;
    if row < 8 {
        return out;
    }
    for y in (1..height as usize).step_by(2) {
        let start = y * row;
        let Some(line) = out.get_mut(start..start + row) else {
            break;
        };
        for group in line.chunks_exact_mut(8) {
            group.rotate_left(4);
        }
    }
    out
}

/// Decode linear (already deinterleaved) N64 texels into RGBA8888
///
/// `palette` carries the colour table and its format for the CI formats and
/// is ignored otherwise.
#[instrument(skip(data, palette), err)]
pub fn decode_n64(
    data: &[u8],
    width: u32,
    height: u32,
    format: N64Format,
    palette: Option<(&[u8], PixelFormat)>,
) -> Result<Vec<u8>> {
    ensure_dimensions(width, height)?;
    ensure_len(data, format.size(width, height))?;

    if let Some(index) = format.index_format() {
        let (colors, palette_format) = palette.unwrap_or((&[], PixelFormat::Rgba5551));
        return decode_indexed(
            data,
            colors,
            width,
            height,
            index,
            palette_format,
            ByteOrder::Big,
        );
    }

    match format.pixel_format() {
        Some(pixel) => decode_direct(data, width, height, pixel, ByteOrder::Big),
        None => Ok(data[..format.size(width, height)]
            .iter()
            .flat_map(|&b| {
                let i = (b >> 4) * 0x11;
                [i, i, i, (b & 0x0F) * 0x11]
            })
            .collect()),
    }
}

/// Encode RGBA8888 into linear N64 texels, returning the texels and, for the
/// CI formats, the palette (`fixed_palette` unchanged when given, otherwise
/// `max_colors` generated entries)
#[instrument(skip(rgba, fixed_palette), err)]
pub fn encode_n64(
    rgba: &[u8],
    width: u32,
    height: u32,
    format: N64Format,
    palette_format: PixelFormat,
    fixed_palette: Option<&[u8]>,
    max_colors: usize,
) -> Result<(Vec<u8>, Option<Vec<u8>>)> {
    if let Some(index) = format.index_format() {
        let image = encode_indexed(
            rgba,
            width,
            height,
            index,
            palette_format,
            ByteOrder::Big,
            fixed_palette,
            max_colors,
        )?;
        return Ok((image.indices, Some(image.palette)));
    }

    match format.pixel_format() {
        Some(pixel) => Ok((encode_direct(rgba, width, height, pixel, ByteOrder::Big)?, None)),
        None => {
            ensure_dimensions(width, height)?;
            let pixels = width as usize * height as usize;
            ensure_len(rgba, pixels * 4)?;
            let texels = to_quads(&rgba[..pixels * 4])
                .into_iter()
                .map(|[r, g, b, a]| {
                    let i = ((r as u32 + g as u32 + b as u32) / 3) as u8;
                    (i & 0xF0) | (a >> 4)
                })
                .collect();
            Ok((texels, None))
        }
    }
}
