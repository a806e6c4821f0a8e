//! Packed 4:2:2 YUV, BT.601 full range.

use tracing::instrument;

use crate::error::{ensure_dimensions, ensure_len, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum YuvLayout {
    /// Y0 U Y1 V
    Yuy2,
    /// U Y0 V Y1
    Uyvy,
}

impl YuvLayout {
    /// Bytes per row, two pixels share one 4 byte group
    pub const fn stride(width: u32) -> usize {
        (width as usize + 1) / 2 * 4
    }

    pub const fn size(width: u32, height: u32) -> usize {
        Self::stride(width) * height as usize
    }

    /// Positions of Y0, U, Y1, V inside a group
    const fn offsets(self) -> [usize; 4] {
        match self {
            YuvLayout::Yuy2 => [0, 1, 2, 3],
            YuvLayout::Uyvy => [1, 0, 3, 2],
        }
    }
}

fn clamp(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

fn to_rgb(y: u8, u: u8, v: u8) -> [u8; 4] {
    let (y, u, v) = (y as f32, u as f32 - 128.0, v as f32 - 128.0);
    [
        clamp(y + 1.402 * v),
        clamp(y - 0.344_136 * u - 0.714_136 * v),
        clamp(y + 1.772 * u),
        0xFF,
    ]
}

fn to_yuv([r, g, b, _]: [u8; 4]) -> (f32, f32, f32) {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    (
        0.299 * r + 0.587 * g + 0.114 * b,
        -0.168_736 * r - 0.331_264 * g + 0.5 * b + 128.0,
        0.5 * r - 0.418_688 * g - 0.081_312 * b + 128.0,
    )
}

#[instrument(skip(data), err)]
pub fn decode_yuv(data: &[u8], width: u32, height: u32, layout: YuvLayout) -> Result<Vec<u8>> {
    ensure_dimensions(width, height)?;
    ensure_len(data, YuvLayout::size(width, height))?;

    let [oy0, ou, oy1, ov] = layout.offsets();
    let mut out = Vec::with_capacity(width as usize * height as usize * 4);
    for row in data.chunks_exact(YuvLayout::stride(width)).take(height as usize) {
        for (pair, group) in row.chunks_exact(4).enumerate() {
            let (u, v) = (group[ou], group[ov]);
            out.extend_from_slice(&to_rgb(group[oy0], u, v));
            if pair * 2 + 1 < width as usize {
                out.extend_from_slice(&to_rgb(group[oy1], u, v));
            }
        }
    }
    Ok(out)
}

#[instrument(skip(rgba), err)]
pub fn encode_yuv(rgba: &[u8], width: u32, height: u32, layout: YuvLayout) -> Result<Vec<u8>> {
    ensure_dimensions(width, height)?;
    let row_bytes = width as usize * 4;
    ensure_len(rgba, row_bytes * height as usize)?;

    let [oy0, ou, oy1, ov] = layout.offsets();
    let mut out = vec![0u8; YuvLayout::size(width, height)];
    for (row, dst) in rgba
        .chunks_exact(row_bytes)
        .take(height as usize)
        .zip(out.chunks_exact_mut(YuvLayout::stride(width)))
    {
        for (pixels, group) in row.chunks(8).zip(dst.chunks_exact_mut(4)) {
            let first = [pixels[0], pixels[1], pixels[2], pixels[3]];
            let second = match pixels.get(4..8) {
                Some(p) => [p[0], p[1], p[2], p[3]],
                None => first,
            };
            let (y0, u0, v0) = to_yuv(first);
            let (y1, u1, v1) = to_yuv(second);
            group[oy0] = clamp(y0);
            group[oy1] = clamp(y1);
            group[ou] = clamp((u0 + u1) / 2.0);
            group[ov] = clamp((v0 + v1) / 2.0);
        }
    }
    Ok(out)
}
