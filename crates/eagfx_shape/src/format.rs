//! Image type and palette layout tables.
//!
//! Record types are looked up with the compression bit already cleared.
//!
//! | Codes     | Family                                                     |
//! |-----------|------------------------------------------------------------|
//! | 1 - 7     | PlayStation 2 (indexed, 16/24/32 bit, luminance)           |
//! | 12 - 19   | Nintendo 64, big endian, TMEM row interleave when swizzled |
//! | 22 - 23   | GST, PS2 indexed with the PS2 swizzle always applied       |
//! | 26 - 27   | YUY2 / UYVY                                                |
//! | 33 - 59   | palettes (see [`PALETTE_TYPES`])                           |
//! | 64 - 69   | PSP                                                        |
//! | 87 - 95   | GameCube / Wii, big endian                                 |
//! | 96 - 98   | DXT1 / DXT3 / DXT5                                         |
//! | 109 - 127 | PC                                                         |

use eagfx_codec::{BlockFormat, ByteOrder, IndexFormat, N64Format, PixelFormat, YuvLayout};
use tracing::warn;

/// Record types that hold a palette
pub const PALETTE_TYPES: [u8; 10] = [33, 34, 35, 36, 41, 42, 45, 46, 58, 59];

/// Palette record types that may be stored in the PS2 CLUT order
pub const SWIZZLE_PALETTE_TYPES: [u8; 2] = [33, 35];

pub const METAL_BIN: u8 = 105;
pub const COMMENT: u8 = 111;
pub const IMG_NAME: u8 = 112;
pub const HOT_SPOT: u8 = 124;

pub fn is_palette_type(code: u8) -> bool {
    PALETTE_TYPES.contains(&code)
}

/// How the pixels of an image type are stored
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Encoding {
    Direct(PixelFormat),
    Indexed(IndexFormat),
    Block(BlockFormat),
    /// GameCube CMPR
    Cmpr,
    N64(N64Format),
    /// Indexed with the PS2 swizzle always applied
    Gst(IndexFormat),
    Yuv(YuvLayout),
    /// A palette record, previewed as a strip of its colours
    Palette,
    /// Known layout without a codec
    Unsupported,
}

/// Description of an image type code
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ImageFormat {
    pub code: u8,
    pub name: &'static str,
    pub bits_per_pixel: u8,
    pub encoding: Encoding,
    /// Fixed pixel word order, `None` follows the file's data byte order
    pub order: Option<ByteOrder>,
    /// Whether the code is in the table at all
    pub known: bool,
}

impl ImageFormat {
    const fn new(code: u8, name: &'static str, bits_per_pixel: u8, encoding: Encoding) -> Self {
        Self {
            code,
            name,
            bits_per_pixel,
            encoding,
            order: None,
            known: true,
        }
    }

    const fn big(mut self) -> Self {
        self.order = Some(ByteOrder::Big);
        self
    }

    pub const fn is_indexed(&self) -> bool {
        matches!(
            self.encoding,
            Encoding::Indexed(_) | Encoding::Gst(_) | Encoding::N64(N64Format::Ci4 | N64Format::Ci8)
        )
    }

    /// Whether the generic platform unswizzle applies; the GST, N64 and CMPR
    /// families handle their own layout
    pub const fn uses_platform_swizzle(&self) -> bool {
        !matches!(
            self.encoding,
            Encoding::Gst(_) | Encoding::N64(_) | Encoding::Cmpr | Encoding::Palette
        )
    }

    /// Whether re-encoding from RGBA is supported
    pub const fn importable(&self) -> bool {
        self.known && !matches!(self.encoding, Encoding::Palette | Encoding::Unsupported)
    }
}

/// Look up an image type, falling back to an 8 bit luminance layout for
/// unknown codes
pub fn image_format(code: u8) -> ImageFormat {
    use Encoding::*;
    use PixelFormat as P;

    let code = code & 0x7F;
    match code {
        1 => ImageFormat::new(code, "PS2 4-bit indexed", 4, Indexed(IndexFormat::I4)),
        2 => ImageFormat::new(code, "PS2 8-bit indexed", 8, Indexed(IndexFormat::I8)),
        3 => ImageFormat::new(code, "PS2 16-bit ABGR1555", 16, Direct(P::Abgr1555)),
        4 => ImageFormat::new(code, "PS2 24-bit RGB888", 24, Direct(P::Rgb888)),
        5 => ImageFormat::new(code, "PS2 32-bit RGBA8888", 32, Direct(P::Ps2Rgba8888)),
        6 => ImageFormat::new(code, "PS2 8-bit luminance", 8, Direct(P::L8)),
        7 => ImageFormat::new(code, "PS2 16-bit luminance alpha", 16, Direct(P::La88)),

        12 => ImageFormat::new(code, "N64 RGBA5551", 16, N64(N64Format::Rgba5551)).big(),
        13 => ImageFormat::new(code, "N64 IA8", 8, N64(N64Format::Ia8)).big(),
        14 => ImageFormat::new(code, "N64 CI4", 4, N64(N64Format::Ci4)).big(),
        15 => ImageFormat::new(code, "N64 CI8", 8, N64(N64Format::Ci8)).big(),
        16 => ImageFormat::new(code, "N64 RGBA8888", 32, N64(N64Format::Rgba8888)).big(),
        17 => ImageFormat::new(code, "N64 I4", 4, N64(N64Format::I4)).big(),
        18 => ImageFormat::new(code, "N64 I8", 8, N64(N64Format::I8)).big(),
        19 => ImageFormat::new(code, "N64 IA16", 16, N64(N64Format::Ia16)).big(),

        22 => ImageFormat::new(code, "GST 4-bit indexed", 4, Gst(IndexFormat::I4)),
        23 => ImageFormat::new(code, "GST 8-bit indexed", 8, Gst(IndexFormat::I8)),

        26 => ImageFormat::new(code, "YUY2", 16, Yuv(YuvLayout::Yuy2)),
        27 => ImageFormat::new(code, "UYVY", 16, Yuv(YuvLayout::Uyvy)),

        33 => ImageFormat::new(code, "palette RGBA8888 (PS2)", 32, Palette),
        34 => ImageFormat::new(code, "palette RGB888", 24, Palette),
        35 => ImageFormat::new(code, "palette ABGR1555 (PS2)", 16, Palette),
        36 => ImageFormat::new(code, "palette RGB888", 24, Palette),
        41 => ImageFormat::new(code, "palette RGB565", 16, Palette),
        42 => ImageFormat::new(code, "palette ARGB8888", 32, Palette),
        45 => ImageFormat::new(code, "palette ARGB1555", 16, Palette),
        46 => ImageFormat::new(code, "palette ARGB4444", 16, Palette),
        58 => ImageFormat::new(code, "palette RGBA8888", 32, Palette),
        59 => ImageFormat::new(code, "palette RGB5A3", 16, Palette).big(),

        64 => ImageFormat::new(code, "PSP 4-bit indexed", 4, Indexed(IndexFormat::I4)),
        65 => ImageFormat::new(code, "PSP 8-bit indexed", 8, Indexed(IndexFormat::I8)),
        66 => ImageFormat::new(code, "PSP 32-bit ABGR8888", 32, Direct(P::Abgr8888)),
        67 => ImageFormat::new(code, "PSP 16-bit ABGR1555", 16, Direct(P::Abgr1555)),
        68 => ImageFormat::new(code, "PSP 16-bit ABGR4444", 16, Direct(P::Abgr4444)),
        69 => ImageFormat::new(code, "PSP 16-bit BGR565", 16, Direct(P::Bgr565)),

        87 => ImageFormat::new(code, "GC I8", 8, Direct(P::L8)).big(),
        88 => ImageFormat::new(code, "GC CMPR", 4, Cmpr).big(),
        89 => ImageFormat::new(code, "GC RGB5A3", 16, Direct(P::Rgb5a3)).big(),
        90 => ImageFormat::new(code, "GC RGB565", 16, Direct(P::Rgb565)).big(),
        91 => ImageFormat::new(code, "GC CI4", 4, Indexed(IndexFormat::I4_HIGH_FIRST)).big(),
        92 => ImageFormat::new(code, "GC CI8", 8, Indexed(IndexFormat::I8)).big(),
        93 => ImageFormat::new(code, "GC IA8", 16, Direct(P::Al88)).big(),
        94 => ImageFormat::new(code, "GC I4", 4, Direct(P::L4)).big(),
        95 => ImageFormat::new(code, "GC RGBA32", 32, Unsupported).big(),

        96 => ImageFormat::new(code, "DXT1", 4, Block(BlockFormat::Dxt1)),
        97 => ImageFormat::new(code, "DXT3", 8, Block(BlockFormat::Dxt3)),
        98 => ImageFormat::new(code, "DXT5", 8, Block(BlockFormat::Dxt5)),

        109 => ImageFormat::new(code, "16-bit ARGB4444", 16, Direct(P::Argb4444)),
        120 => ImageFormat::new(code, "16-bit RGB565", 16, Direct(P::Rgb565)),
        123 => ImageFormat::new(code, "8-bit indexed", 8, Indexed(IndexFormat::I8)),
        125 => ImageFormat::new(code, "32-bit ARGB8888", 32, Direct(P::Argb8888)),
        126 => ImageFormat::new(code, "16-bit ARGB1555", 16, Direct(P::Argb1555)),
        127 => ImageFormat::new(code, "24-bit BGR888", 24, Direct(P::Bgr888)),

        _ => {
            warn!(code, "unknown image type, using the 8-bit luminance layout");
            ImageFormat {
                known: false,
                ..ImageFormat::new(code, "unknown", 8, Direct(P::L8))
            }
        }
    }
}

/// Palette layout for a palette record of `len` bytes
///
/// Record types 34, 42, 45 and 58 are inferred from the few files that use
/// them.
pub fn palette_format(record_type: u8, len: usize) -> (PixelFormat, Option<ByteOrder>) {
    use PixelFormat as P;

    let format = match (record_type, len) {
        (0, _) => P::Rgba8888,
        (33, _) => P::Ps2Rgba8888,
        (34 | 36, _) => P::Rgb888,
        (35, _) => P::Abgr1555,
        (41, _) => P::Rgb565,
        (42, 1024) => P::Argb8888,
        (42, 768) => P::Rgb888,
        (42, _) => P::Argb1555,
        (45, 1024) => P::Argb8888,
        (45, _) => P::Argb1555,
        (46, _) => P::Argb4444,
        (58, 1024) => P::Rgba8888,
        (58, _) => P::Abgr1555,
        (59, _) => return (P::Rgb5a3, Some(ByteOrder::Big)),
        (_, 1024) => {
            warn!(record_type, "unknown palette type, reading RGBA8888");
            P::Rgba8888
        }
        _ => {
            warn!(record_type, len, "unknown palette type, reading ARGB1555");
            P::Argb1555
        }
    };
    (format, None)
}

/// Built in fallback palette: a 256 entry grey ramp in RGBA8888
pub fn default_palette() -> Vec<u8> {
    (0..=255u8).flat_map(|v| [v, v, v, 0xFF]).collect()
}
