//! Direct (non-indexed) pixel translation between stored layouts and RGBA8888.

use byteorder::{BigEndian, ByteOrder as _, LittleEndian};
use tracing::instrument;

use crate::error::{ensure_dimensions, ensure_len, Result};
use crate::ByteOrder;

/// Stored layout of one direct pixel or palette entry.
///
/// Packed 16 and 32 bit layouts name the channels from the most significant
/// bit of the word downwards, the word itself is read with the caller's
/// [`ByteOrder`]. Byte layouts (`Rgba8888`, `Rgb888`, ...) list the bytes in
/// memory order and ignore the byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Bytes R, G, B, A
    Rgba8888,
    /// Bytes R, G, B, A with the PlayStation 2 alpha range of `0..=0x80`
    Ps2Rgba8888,
    /// 32 bit word `AAAAAAAA RRRRRRRR GGGGGGGG BBBBBBBB`
    Argb8888,
    /// 32 bit word `AAAAAAAA BBBBBBBB GGGGGGGG RRRRRRRR`
    Abgr8888,
    /// Bytes R, G, B
    Rgb888,
    /// Bytes B, G, R
    Bgr888,
    /// 16 bit word `RRRRRGGG GGGBBBBB`
    Rgb565,
    /// 16 bit word `BBBBBGGG GGGRRRRR`
    Bgr565,
    /// 16 bit word `ARRRRRGG GGGBBBBB`
    Argb1555,
    /// 16 bit word `ABBBBBGG GGGRRRRR`
    Abgr1555,
    /// 16 bit word `RRRRRGGG GGBBBBBA`
    Rgba5551,
    /// 16 bit word `AAAARRRR GGGGBBBB`
    Argb4444,
    /// 16 bit word `AAAABBBB GGGGRRRR`
    Abgr4444,
    /// GameCube RGB5A3: opaque RGB555 when the top bit is set, otherwise A3 RGB444
    Rgb5a3,
    /// 8 bit luminance
    L8,
    /// 8 bit alpha over white
    A8,
    /// 16 bit word `LLLLLLLL AAAAAAAA`
    La88,
    /// 16 bit word `AAAAAAAA LLLLLLLL`
    Al88,
    /// 4 bit luminance, high nibble first
    L4,
}

#[derive(Debug, Clone, Copy)]
struct Channel {
    shift: u32,
    width: u32,
}

impl Channel {
    const fn new(shift: u32, width: u32) -> Self {
        Self { shift, width }
    }

    fn mask(self) -> u32 {
        (1 << self.width) - 1
    }

    fn expand(self, word: u32) -> u8 {
        let mask = self.mask();
        let value = (word >> self.shift) & mask;
        ((value * 255 + mask / 2) / mask) as u8
    }

    fn pack(self, value: u8) -> u32 {
        let mask = self.mask();
        ((value as u32 * mask + 127) / 255) << self.shift
    }
}

#[derive(Debug, Clone, Copy)]
struct Packed {
    r: Channel,
    g: Channel,
    b: Channel,
    a: Option<Channel>,
}

impl Packed {
    const fn new(r: Channel, g: Channel, b: Channel, a: Option<Channel>) -> Self {
        Self { r, g, b, a }
    }

    fn unpack(self, word: u32) -> [u8; 4] {
        [
            self.r.expand(word),
            self.g.expand(word),
            self.b.expand(word),
            self.a.map_or(0xFF, |a| a.expand(word)),
        ]
    }

    fn pack(self, [r, g, b, a]: [u8; 4]) -> u32 {
        self.r.pack(r) | self.g.pack(g) | self.b.pack(b) | self.a.map_or(0, |c| c.pack(a))
    }
}

impl PixelFormat {
    /// Number of bits one pixel occupies
    pub const fn bits_per_pixel(self) -> u8 {
        use PixelFormat::*;
        match self {
            Rgba8888 | Ps2Rgba8888 | Argb8888 | Abgr8888 => 32,
            Rgb888 | Bgr888 => 24,
            Rgb565 | Bgr565 | Argb1555 | Abgr1555 | Rgba5551 | Argb4444 | Abgr4444 | Rgb5a3
            | La88 | Al88 => 16,
            L8 | A8 => 8,
            L4 => 4,
        }
    }

    /// Number of stored bytes for `pixels` pixels, rounded up to whole bytes
    pub const fn stride(self, pixels: usize) -> usize {
        (pixels * self.bits_per_pixel() as usize + 7) / 8
    }

    fn packed(self) -> Option<Packed> {
        use PixelFormat::*;
        let c = Channel::new;
        Some(match self {
            Argb8888 => Packed::new(c(16, 8), c(8, 8), c(0, 8), Some(c(24, 8))),
            Abgr8888 => Packed::new(c(0, 8), c(8, 8), c(16, 8), Some(c(24, 8))),
            Rgb565 => Packed::new(c(11, 5), c(5, 6), c(0, 5), None),
            Bgr565 => Packed::new(c(0, 5), c(5, 6), c(11, 5), None),
            Argb1555 => Packed::new(c(10, 5), c(5, 5), c(0, 5), Some(c(15, 1))),
            Abgr1555 => Packed::new(c(0, 5), c(5, 5), c(10, 5), Some(c(15, 1))),
            Rgba5551 => Packed::new(c(11, 5), c(6, 5), c(1, 5), Some(c(0, 1))),
            Argb4444 => Packed::new(c(8, 4), c(4, 4), c(0, 4), Some(c(12, 4))),
            Abgr4444 => Packed::new(c(0, 4), c(4, 4), c(8, 4), Some(c(12, 4))),
            _ => return None,
        })
    }
}

fn read_word(bytes: &[u8], order: ByteOrder) -> u32 {
    match (bytes.len(), order) {
        (2, ByteOrder::Little) => LittleEndian::read_u16(bytes) as u32,
        (2, ByteOrder::Big) => BigEndian::read_u16(bytes) as u32,
        (_, ByteOrder::Little) => LittleEndian::read_u32(bytes),
        (_, ByteOrder::Big) => BigEndian::read_u32(bytes),
    }
}

fn write_word(out: &mut Vec<u8>, word: u32, bytes: usize, order: ByteOrder) {
    let mut buf = [0u8; 4];
    match (bytes, order) {
        (2, ByteOrder::Little) => LittleEndian::write_u16(&mut buf, word as u16),
        (2, ByteOrder::Big) => BigEndian::write_u16(&mut buf, word as u16),
        (_, ByteOrder::Little) => LittleEndian::write_u32(&mut buf, word),
        (_, ByteOrder::Big) => BigEndian::write_u32(&mut buf, word),
    }
    out.extend_from_slice(&buf[..bytes]);
}

fn luminance([r, g, b, _]: [u8; 4]) -> u8 {
    ((r as u32 * 299 + g as u32 * 587 + b as u32 * 114 + 500) / 1000) as u8
}

/// Decode `count` colours from `data` into RGBA quadruples
///
/// The caller guarantees `data` holds at least `format.stride(count)` bytes.
pub(crate) fn decode_colors(
    data: &[u8],
    count: usize,
    format: PixelFormat,
    order: ByteOrder,
) -> Vec<[u8; 4]> {
    use PixelFormat::*;

    if format == L4 {
        return (0..count)
            .map(|i| {
                let byte = data[i / 2];
                let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0F };
                let l = nibble * 0x11;
                [l, l, l, 0xFF]
            })
            .collect();
    }

    let size = (format.bits_per_pixel() / 8) as usize;
    data.chunks_exact(size)
        .take(count)
        .map(|px| match format {
            Rgba8888 => [px[0], px[1], px[2], px[3]],
            Ps2Rgba8888 => [px[0], px[1], px[2], (px[3] as u32 * 2).min(0xFF) as u8],
            Rgb888 => [px[0], px[1], px[2], 0xFF],
            Bgr888 => [px[2], px[1], px[0], 0xFF],
            L8 => [px[0], px[0], px[0], 0xFF],
            A8 => [0xFF, 0xFF, 0xFF, px[0]],
            La88 => {
                let word = read_word(px, order);
                let l = (word >> 8) as u8;
                [l, l, l, word as u8]
            }
            Al88 => {
                let word = read_word(px, order);
                let l = word as u8;
                [l, l, l, (word >> 8) as u8]
            }
            Rgb5a3 => {
                let word = read_word(px, order);
                if word & 0x8000 != 0 {
                    Packed::new(
                        Channel::new(10, 5),
                        Channel::new(5, 5),
                        Channel::new(0, 5),
                        None,
                    )
                    .unpack(word)
                } else {
                    Packed::new(
                        Channel::new(8, 4),
                        Channel::new(4, 4),
                        Channel::new(0, 4),
                        Some(Channel::new(12, 3)),
                    )
                    .unpack(word)
                }
            }
            _ => match format.packed() {
                Some(packed) => packed.unpack(read_word(px, order)),
                None => [0, 0, 0, 0xFF],
            },
        })
        .collect()
}

/// Encode RGBA quadruples into `format`
pub(crate) fn encode_colors(colors: &[[u8; 4]], format: PixelFormat, order: ByteOrder) -> Vec<u8> {
    use PixelFormat::*;

    let mut out = Vec::with_capacity(format.stride(colors.len()));

    if format == L4 {
        for pair in colors.chunks(2) {
            let hi = luminance(pair[0]) >> 4;
            let lo = pair.get(1).map_or(0, |c| luminance(*c) >> 4);
            out.push((hi << 4) | lo);
        }
        return out;
    }

    let size = (format.bits_per_pixel() / 8) as usize;
    for &color in colors {
        let [r, g, b, a] = color;
        match format {
            Rgba8888 => out.extend_from_slice(&[r, g, b, a]),
            Ps2Rgba8888 => out.extend_from_slice(&[r, g, b, ((a as u32 + 1) / 2) as u8]),
            Rgb888 => out.extend_from_slice(&[r, g, b]),
            Bgr888 => out.extend_from_slice(&[b, g, r]),
            L8 => out.push(luminance(color)),
            A8 => out.push(a),
            La88 => write_word(&mut out, (luminance(color) as u32) << 8 | a as u32, 2, order),
            Al88 => write_word(&mut out, (a as u32) << 8 | luminance(color) as u32, 2, order),
            Rgb5a3 => {
                let word = if a >= 0xE0 {
                    0x8000
                        | Channel::new(10, 5).pack(r)
                        | Channel::new(5, 5).pack(g)
                        | Channel::new(0, 5).pack(b)
                } else {
                    Channel::new(12, 3).pack(a)
                        | Channel::new(8, 4).pack(r)
                        | Channel::new(4, 4).pack(g)
                        | Channel::new(0, 4).pack(b)
                };
                write_word(&mut out, word, 2, order);
            }
            _ => {
                if let Some(packed) = format.packed() {
                    write_word(&mut out, packed.pack(color), size, order);
                }
            }
        }
    }
    out
}

pub(crate) fn to_quads(rgba: &[u8]) -> Vec<[u8; 4]> {
    rgba.chunks_exact(4)
        .map(|px| [px[0], px[1], px[2], px[3]])
        .collect()
}

/// Decode a direct colour image into RGBA8888
#[instrument(skip(data), err)]
pub fn decode_direct(
    data: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
    order: ByteOrder,
) -> Result<Vec<u8>> {
    ensure_dimensions(width, height)?;
    let pixels = width as usize * height as usize;
    ensure_len(data, format.stride(pixels))?;

    Ok(decode_colors(data, pixels, format, order)
        .into_iter()
        .flatten()
        .collect())
}

/// Encode an RGBA8888 image into a direct colour layout
#[instrument(skip(rgba), err)]
pub fn encode_direct(
    rgba: &[u8],
    width: u32,
    height: u32,
    format: PixelFormat,
    order: ByteOrder,
) -> Result<Vec<u8>> {
    ensure_dimensions(width, height)?;
    let pixels = width as usize * height as usize;
    ensure_len(rgba, pixels * 4)?;

    Ok(encode_colors(&to_quads(&rgba[..pixels * 4]), format, order))
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::error::Result;
    use crate::pixel::{decode_direct, encode_direct, PixelFormat};
    use crate::ByteOrder;

    #[test]
    fn decode_argb8888_little_endian() -> Result<()> {
        let data = [0x30, 0x20, 0x10, 0x80];
        let rgba = decode_direct(&data, 1, 1, PixelFormat::Argb8888, ByteOrder::Little)?;
        assert_eq!(rgba, vec![0x10, 0x20, 0x30, 0x80]);
        Ok(())
    }

    #[test]
    fn decode_rgb565_big_endian() -> Result<()> {
        let data = [0xF8, 0x00, 0x07, 0xE0, 0x00, 0x1F];
        let rgba = decode_direct(&data, 3, 1, PixelFormat::Rgb565, ByteOrder::Big)?;
        assert_eq!(
            rgba,
            vec![0xFF, 0, 0, 0xFF, 0, 0xFF, 0, 0xFF, 0, 0, 0xFF, 0xFF]
        );
        Ok(())
    }

    #[test]
    fn decode_ps2_alpha_is_scaled() -> Result<()> {
        let data = [1, 2, 3, 0x80];
        let rgba = decode_direct(&data, 1, 1, PixelFormat::Ps2Rgba8888, ByteOrder::Little)?;
        assert_eq!(rgba, vec![1, 2, 3, 0xFF]);
        Ok(())
    }

    #[test]
    fn decode_rgb5a3_both_modes() -> Result<()> {
        // opaque white, then fully transparent black
        let data = [0xFF, 0xFF, 0x00, 0x00];
        let rgba = decode_direct(&data, 2, 1, PixelFormat::Rgb5a3, ByteOrder::Big)?;
        assert_eq!(rgba, vec![0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0]);
        Ok(())
    }

    #[test]
    fn encode_argb1555_keeps_primaries() -> Result<()> {
        let rgba = [0xFF, 0, 0, 0xFF, 0, 0, 0xFF, 0];
        let data = encode_direct(&rgba, 2, 1, PixelFormat::Argb1555, ByteOrder::Little)?;
        assert_eq!(data, vec![0x00, 0xFC, 0x1F, 0x00]);
        Ok(())
    }

    #[test]
    fn decode_l4_high_nibble_first() -> Result<()> {
        let rgba = decode_direct(&[0xF0], 2, 1, PixelFormat::L4, ByteOrder::Big)?;
        assert_eq!(rgba, vec![0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0xFF]);
        Ok(())
    }

    #[test]
    fn decode_rejects_short_input() {
        let result = decode_direct(&[0; 3], 1, 1, PixelFormat::Argb8888, ByteOrder::Little);
        assert!(result.is_err());
    }
}
