//! Pixel level codecs for the texture payloads stored in EA shape archives.
//!
//! The shape container only describes where an image lives and what layout it
//! uses; the bytes themselves go through the primitives in this crate:
//!
//! | Module        | Purpose                                                       |
//! |---------------|---------------------------------------------------------------|
//! | [`pixel`]     | Direct colour layouts (RGBA8888, RGB565, ARGB1555, RGB5A3 ...) |
//! | [`indexed`]   | 4 and 8 bit palette indexed images, palette generation        |
//! | [`block`]     | DXT1, DXT3 and DXT5 block compression                         |
//! | [`gamecube`]  | GameCube CMPR                                                 |
//! | [`n64`]       | Nintendo 64 texel formats                                     |
//! | [`yuv`]       | YUY2 and UYVY                                                 |
//! | [`swizzle`]   | Morton, PSP, PS2 and GameCube texture tiling                  |
//! | [`refpack`]   | RefPack LZ compression                                        |
//! | [`mipmap`]    | Mip chain sizes and downscaling                               |
//! | [`quantize`]  | Median cut colour quantization                                |
//!
//! Every decoder produces tightly packed RGBA8888 and every encoder consumes
//! it.

pub mod block;
pub mod error;
pub mod gamecube;
pub mod indexed;
pub mod mipmap;
pub mod n64;
pub mod pixel;
pub mod quantize;
pub mod refpack;
pub mod swizzle;
pub mod yuv;

pub use block::BlockFormat;
pub use indexed::{IndexFormat, IndexedImage, NibbleOrder};
pub use n64::N64Format;
pub use pixel::PixelFormat;
pub use swizzle::SwizzlePlatform;
pub use yuv::YuvLayout;

/// Byte order of multi byte pixel words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}
