//! Platform specific pixel and palette reordering.
//!
//! Every transform is described as a map from a linear element position to
//! its swizzled position, the same map drives both directions. Bytes past the
//! end of the first image level are carried over untouched.

use tracing::{debug, instrument};

use crate::error::{ensure_dimensions, Error, Result};

/// Console family whose swizzle pattern a texture follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwizzlePlatform {
    /// Xbox, PC and PS3 Morton (Z-order) layout
    Morton,
    /// PSP 16 byte by 8 row tiles
    Psp,
    /// PlayStation 2 GS memory layout for 4 and 8 bit textures
    Ps2,
    /// GameCube and Wii block tiling
    GameCube,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Swizzle,
    Unswizzle,
}

fn remap(
    data: &[u8],
    units_w: usize,
    units_h: usize,
    unit: usize,
    direction: Direction,
    map: impl Fn(usize, usize) -> usize,
) -> Vec<u8> {
    let mut out = data.to_vec();
    for y in 0..units_h {
        for x in 0..units_w {
            let linear = (y * units_w + x) * unit;
            let swizzled = map(x, y) * unit;
            let (src, dst) = match direction {
                Direction::Swizzle => (linear, swizzled),
                Direction::Unswizzle => (swizzled, linear),
            };
            if src + unit <= data.len() && dst + unit <= out.len() {
                out[dst..dst + unit].copy_from_slice(&data[src..src + unit]);
            }
        }
    }
    out
}

fn morton_index(x: usize, y: usize, width: usize, height: usize) -> usize {
    let bits = width.min(height).trailing_zeros();
    let mut index = 0;
    for i in 0..bits {
        index |= ((x >> i) & 1) << (2 * i);
        index |= ((y >> i) & 1) << (2 * i + 1);
    }
    if width > height {
        index | ((x >> bits) << (2 * bits))
    } else {
        index | ((y >> bits) << (2 * bits))
    }
}

fn morton(data: &[u8], width: u32, height: u32, bpp: u8, direction: Direction) -> Vec<u8> {
    let (w, h) = (width as usize, height as usize);
    if !w.is_power_of_two() || !h.is_power_of_two() || bpp < 8 {
        debug!(width, height, bpp, "morton layout needs power of two byte aligned texels");
        return data.to_vec();
    }
    remap(data, w, h, bpp as usize / 8, direction, |x, y| {
        morton_index(x, y, w, h)
    })
}

fn psp(data: &[u8], width: u32, height: u32, bpp: u8, direction: Direction) -> Vec<u8> {
    let width_bytes = (width as usize * bpp as usize).div_ceil(8);
    let row_blocks = width_bytes.div_ceil(16);
    remap(data, width_bytes, height as usize, 1, direction, |x, y| {
        let (block_x, block_y) = (x / 16, y / 8);
        let block = block_x + block_y * row_blocks;
        block * 16 * 8 + (x % 16) + (y % 8) * 16
    })
}

fn ps2_index8(x: usize, y: usize, width: usize) -> usize {
    let block_location = (y & !0xF) * width + (x & !0xF) * 2;
    let swap_selector = (((y + 2) >> 2) & 0x1) * 4;
    let pos_y = (((y & !3) >> 1) + (y & 1)) & 0x7;
    let column_location = pos_y * width * 2 + ((x + swap_selector) & 0x7) * 4;
    let byte_num = ((y >> 1) & 1) + ((x >> 2) & 2);
    block_location + column_location + byte_num
}

fn nibbles_to_bytes(data: &[u8], pixels: usize) -> Vec<u8> {
    (0..pixels)
        .map(|i| {
            let byte = data.get(i / 2).copied().unwrap_or(0);
            if i % 2 == 0 {
                byte & 0x0F
            } else {
                byte >> 4
            }
        })
        .collect()
}

fn bytes_to_nibbles(data: &[u8]) -> Vec<u8> {
    data.chunks(2)
        .map(|p| (p[0] & 0x0F) | (p.get(1).copied().unwrap_or(0) << 4))
        .collect()
}

fn ps2(data: &[u8], width: u32, height: u32, bpp: u8, direction: Direction) -> Vec<u8> {
    let (w, h) = (width as usize, height as usize);
    match bpp {
        8 => remap(data, w, h, 1, direction, |x, y| ps2_index8(x, y, w)),
        4 => {
            let pixels = w * h;
            let expanded = nibbles_to_bytes(data, pixels);
            let moved = remap(&expanded, w, h, 1, direction, |x, y| ps2_index8(x, y, w));
            let mut out = bytes_to_nibbles(&moved);
            if data.len() > out.len() {
                out.extend_from_slice(&data[out.len()..]);
            }
            out
        }
        _ => {
            debug!(bpp, "ps2 layout only reorders 4 and 8 bit textures");
            data.to_vec()
        }
    }
}

fn gamecube_block(bpp: u8) -> (usize, usize) {
    match bpp {
        4 => (8, 8),
        8 => (8, 4),
        _ => (4, 4),
    }
}

fn gamecube(data: &[u8], width: u32, height: u32, bpp: u8, direction: Direction) -> Vec<u8> {
    let (block_w, block_h) = gamecube_block(bpp);
    let block_w_bytes = (block_w * bpp as usize).div_ceil(8);
    let width_bytes = (width as usize * bpp as usize).div_ceil(8);
    let blocks_x = width_bytes.div_ceil(block_w_bytes);
    remap(data, width_bytes, height as usize, 1, direction, |x, y| {
        let block = (y / block_h) * blocks_x + x / block_w_bytes;
        block * block_w_bytes * block_h + (y % block_h) * block_w_bytes + x % block_w_bytes
    })
}

impl SwizzlePlatform {
    fn apply(
        self,
        data: &[u8],
        width: u32,
        height: u32,
        bpp: u8,
        direction: Direction,
    ) -> Result<Vec<u8>> {
        ensure_dimensions(width, height)?;
        if bpp == 0 || bpp > 128 {
            return Err(Error::UnsupportedBitDepth(bpp));
        }
        Ok(match self {
            SwizzlePlatform::Morton => morton(data, width, height, bpp, direction),
            SwizzlePlatform::Psp => psp(data, width, height, bpp, direction),
            SwizzlePlatform::Ps2 => ps2(data, width, height, bpp, direction),
            SwizzlePlatform::GameCube => gamecube(data, width, height, bpp, direction),
        })
    }

    /// Reorder linear texels into this platform's layout
    #[instrument(skip(data), err)]
    pub fn swizzle(self, data: &[u8], width: u32, height: u32, bpp: u8) -> Result<Vec<u8>> {
        self.apply(data, width, height, bpp, Direction::Swizzle)
    }

    /// Reorder texels from this platform's layout into linear rows
    #[instrument(skip(data), err)]
    pub fn unswizzle(self, data: &[u8], width: u32, height: u32, bpp: u8) -> Result<Vec<u8>> {
        self.apply(data, width, height, bpp, Direction::Unswizzle)
    }
}

fn ps2_palette_index(i: usize) -> usize {
    (i & !0x18) | ((i & 0x08) << 1) | ((i & 0x10) >> 1)
}

fn ps2_palette(palette: &[u8]) -> Vec<u8> {
    if palette.len() % 256 != 0 {
        return palette.to_vec();
    }
    let entry = palette.len() / 256;
    let mut out = palette.to_vec();
    for i in 0..256 {
        let j = ps2_palette_index(i);
        out[j * entry..(j + 1) * entry].copy_from_slice(&palette[i * entry..(i + 1) * entry]);
    }
    out
}

/// Reorder a linear 256 entry palette into the PlayStation 2 CLUT layout
///
/// Palettes of any other size are returned unchanged.
pub fn swizzle_palette(palette: &[u8]) -> Vec<u8> {
    ps2_palette(palette)
}

/// Reorder a PlayStation 2 CLUT into a linear palette
pub fn unswizzle_palette(palette: &[u8]) -> Vec<u8> {
    ps2_palette(palette)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::error::Result;
    use crate::swizzle::{swizzle_palette, unswizzle_palette, SwizzlePlatform};

    fn ramp(len: usize) -> Vec<u8> {
        (0..len).map(|v| v as u8).collect()
    }

    #[test]
    fn morton_4x4_order() -> Result<()> {
        let linear = ramp(16);
        let swizzled = SwizzlePlatform::Morton.swizzle(&linear, 4, 4, 8)?;
        assert_eq!(
            swizzled,
            vec![0, 1, 4, 5, 2, 3, 6, 7, 8, 9, 12, 13, 10, 11, 14, 15]
        );
        Ok(())
    }

    #[test]
    fn every_platform_restores_linear_layout() -> Result<()> {
        for platform in [
            SwizzlePlatform::Morton,
            SwizzlePlatform::Psp,
            SwizzlePlatform::Ps2,
            SwizzlePlatform::GameCube,
        ] {
            for bpp in [4u8, 8, 16, 32] {
                let linear = ramp(32 * 32 * bpp as usize / 8);
                let swizzled = platform.swizzle(&linear, 32, 32, bpp)?;
                let restored = platform.unswizzle(&swizzled, 32, 32, bpp)?;
                assert_eq!(restored, linear, "{platform:?} at {bpp} bpp");
            }
        }
        Ok(())
    }

    #[test]
    fn psp_moves_second_row_into_first_tile() -> Result<()> {
        let linear = ramp(32 * 8);
        let swizzled = SwizzlePlatform::Psp.swizzle(&linear, 32, 8, 8)?;
        assert_eq!(&swizzled[16..32], &linear[32..48]);
        Ok(())
    }

    #[test]
    fn palette_swap_is_an_involution() {
        let palette = ramp(1024);
        let swizzled = swizzle_palette(&palette);
        assert_eq!(&swizzled[8 * 4..9 * 4], &palette[16 * 4..17 * 4]);
        assert_eq!(unswizzle_palette(&swizzled), palette);
    }

    #[test]
    fn small_palette_is_untouched() {
        let palette = ramp(64);
        assert_eq!(swizzle_palette(&palette), palette);
    }
}
