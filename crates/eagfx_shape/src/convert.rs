//! Decoding entries to RGBA8888 and encoding RGBA8888 back into entries.
//!
//! Decode runs decompression, then the platform unswizzle, then the pixel
//! decoder for the image type. Encode runs the same steps backwards and keeps
//! the payload at exactly its original length so the file never moves.

use std::borrow::Cow;

use bon::Builder;
use eagfx_codec::{
    block, gamecube, indexed, mipmap, n64, pixel, refpack, swizzle, yuv, BlockFormat, ByteOrder,
    PixelFormat, SwizzlePlatform, YuvLayout,
};
use tracing::{debug, instrument, trace, warn};

use crate::error::{Error, Result};
use crate::format::{Encoding, ImageFormat, SWIZZLE_PALETTE_TYPES};
use crate::palette::{PaletteInfo, PaletteSource};
use crate::read::ShapeArchive;
use crate::types::pixel_order;

/// Options for re-encoding an image on import
#[derive(Debug, Clone, Copy, Builder)]
pub struct EncodeOptions {
    /// Regenerate the mipmap levels the entry declares
    #[builder(default = true)]
    pub generate_mipmaps: bool,

    /// Generate a new palette for indexed images instead of mapping onto the
    /// existing one
    #[builder(default = true)]
    pub quantize_palette: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Output of [`ShapeArchive::encode_entry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeResult {
    /// Image payload, exactly as long as the entry's current payload
    pub image: Vec<u8>,
    /// Palette in stored order, empty unless one was generated
    pub palette: Vec<u8>,
    pub palette_source: Option<PaletteSource>,
    pub palette_produced: bool,
}

const MAX_MIPMAP_LEVELS: u32 = 15;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Direction {
    Swizzle,
    Unswizzle,
}

/// Bytes taken by one level of an image
pub fn level_size(format: &ImageFormat, width: u32, height: u32) -> usize {
    match format.encoding {
        Encoding::Block(block) => block.compressed_size(width, height),
        Encoding::Cmpr => gamecube::cmpr_size(width, height),
        Encoding::Yuv(_) => YuvLayout::size(width, height),
        _ => mipmap::linear_size(width, height, format.bits_per_pixel),
    }
}

/// Pad `data` up to `limit` bytes, failing when it is already longer
fn fit_exact(mut data: Vec<u8>, limit: usize) -> Result<Vec<u8>> {
    if data.len() > limit {
        return Err(Error::EncodedTooLarge {
            encoded: data.len(),
            limit,
        });
    }
    if data.len() < limit {
        debug!(
            "{}, padding with zeros",
            Error::EncodedTooShortAfterPad {
                encoded: data.len(),
                limit,
            }
        );
        data.resize(limit, 0);
    }
    Ok(data)
}

#[allow(clippy::too_many_arguments)]
fn encode_level(
    rgba: &[u8],
    width: u32,
    height: u32,
    format: &ImageFormat,
    order: ByteOrder,
    palette: Option<(PixelFormat, ByteOrder)>,
    fixed_palette: Option<&[u8]>,
    max_colors: usize,
) -> Result<(Vec<u8>, Option<Vec<u8>>)> {
    let (palette_format, palette_order) = palette.unwrap_or((PixelFormat::Rgba8888, order));
    let generated = fixed_palette.is_none();

    Ok(match format.encoding {
        Encoding::Direct(pf) => (pixel::encode_direct(rgba, width, height, pf, order)?, None),
        Encoding::Indexed(ix) | Encoding::Gst(ix) => {
            let image = indexed::encode_indexed(
                rgba,
                width,
                height,
                ix,
                palette_format,
                palette_order,
                fixed_palette,
                max_colors,
            )?;
            (image.indices, generated.then_some(image.palette))
        }
        Encoding::Block(bf) => (block::encode_block_compressed(rgba, width, height, bf)?, None),
        Encoding::Cmpr => (gamecube::encode_cmpr(rgba, width, height)?, None),
        Encoding::N64(nf) => {
            let (texels, palette) =
                n64::encode_n64(
                rgba,
                width,
                height,
                nf,
                palette_format,
                fixed_palette,
                max_colors,
            )?;
            (texels, palette.filter(|_| generated))
        }
        Encoding::Yuv(layout) => (yuv::encode_yuv(rgba, width, height, layout)?, None),
        Encoding::Palette | Encoding::Unsupported => {
            return Err(Error::UnsupportedImageType(format.code))
        }
    })
}

impl ShapeArchive {
    fn pixel_order_for(&self, format: &ImageFormat) -> ByteOrder {
        format
            .order
            .unwrap_or_else(|| pixel_order(self.byte_orders().data))
    }

    fn palette_layout(&self, palette: &PaletteInfo) -> (PixelFormat, ByteOrder) {
        let (format, order) = palette.format();
        (
            format,
            order.unwrap_or_else(|| pixel_order(self.byte_orders().data)),
        )
    }

    /// Apply or undo the tiling an image is stored with
    fn transform_layout(
        &self,
        data: &[u8],
        format: &ImageFormat,
        swizzled: bool,
        width: u32,
        height: u32,
        direction: Direction,
    ) -> Result<Vec<u8>> {
        let apply = |platform: SwizzlePlatform, w: u32, h: u32, bpp: u8| match direction {
            Direction::Swizzle => platform.swizzle(data, w, h, bpp),
            Direction::Unswizzle => platform.unswizzle(data, w, h, bpp),
        };

        Ok(match format.encoding {
            Encoding::Gst(index) => apply(SwizzlePlatform::Ps2, width, height, index.bits)?,
            Encoding::N64(nf) if swizzled => {
                n64::deinterleave_tmem(data, width, height, nf.bits_per_pixel())
            }
            _ if !swizzled || !format.uses_platform_swizzle() => data.to_vec(),
            _ => match self.signature().platform() {
                None => {
                    warn!(
                        signature = self.signature().as_str(),
                        "swizzle flag set on a platform without tiling, ignoring it"
                    );
                    data.to_vec()
                }
                Some(platform) => match format.encoding {
                    Encoding::Block(bf) => {
                        let (bw, bh) = BlockFormat::blocks(width, height);
                        apply(platform, bw, bh, (bf.block_bytes() * 8) as u8)?
                    }
                    _ => apply(platform, width, height, format.bits_per_pixel)?,
                },
            },
        })
    }

    fn decode_palette_preview(&self, index: usize, data: &[u8]) -> Result<Vec<u8>> {
        let entry = self.by_index(index)?;
        let record_type = entry.record_type();
        let info = PaletteInfo {
            source: PaletteSource::Sibling { entry: index },
            record_type,
            data: data.to_vec(),
            swizzled: SWIZZLE_PALETTE_TYPES.contains(&record_type)
                && entry.header.palette_swizzled(),
        };
        let (format, order) = self.palette_layout(&info);
        let colors = indexed::decode_palette(&info.linear_data(), format, order)?;
        Ok(colors.into_iter().flatten().collect())
    }

    /// Decode an entry into RGBA8888
    ///
    /// Palette records decode to a single row of their colours.
    #[instrument(skip(self), err)]
    pub fn decode_entry(&self, index: usize) -> Result<Vec<u8>> {
        let entry = self.by_index(index)?;
        let format = entry.image_format();
        let code = entry.record_type();
        if !format.known || format.encoding == Encoding::Unsupported {
            return Err(Error::UnsupportedImageType(code));
        }

        let flags = entry.flags();
        let raw = if flags.compressed {
            Cow::Owned(refpack::decompress(&entry.raw_data)?)
        } else {
            Cow::Borrowed(entry.raw_data.as_slice())
        };

        if format.encoding == Encoding::Palette {
            return self.decode_palette_preview(index, &raw);
        }

        let (width, height) = (entry.width(), entry.height());
        let order = self.pixel_order_for(&format);
        let top = &raw[..level_size(&format, width, height).min(raw.len())];
        let top = self.transform_layout(
            top,
            &format,
            flags.swizzled,
            width,
            height,
            Direction::Unswizzle,
        )?;
        trace!(index, code, size = top.len(), "decoding top level");

        Ok(match format.encoding {
            Encoding::Direct(pf) => pixel::decode_direct(&top, width, height, pf, order)?,
            Encoding::Indexed(ix) | Encoding::Gst(ix) => {
                let palette = self.resolve_palette(index)?;
                let (pf, po) = self.palette_layout(&palette);
                indexed::decode_indexed(&top, &palette.linear_data(), width, height, ix, pf, po)?
            }
            Encoding::Block(bf) => block::decode_block_compressed(&top, width, height, bf)?,
            Encoding::Cmpr => gamecube::decode_cmpr(&top, width, height)?,
            Encoding::N64(nf) => {
                let palette = match nf.index_format() {
                    Some(_) => {
                        let palette = self.resolve_palette(index)?;
                        let (pf, _) = self.palette_layout(&palette);
                        Some((palette.linear_data(), pf))
                    }
                    None => None,
                };
                n64::decode_n64(
                    &top,
                    width,
                    height,
                    nf,
                    palette.as_ref().map(|(data, pf)| (data.as_slice(), *pf)),
                )?
            }
            Encoding::Yuv(layout) => yuv::decode_yuv(&top, width, height, layout)?,
            Encoding::Palette | Encoding::Unsupported => {
                return Err(Error::UnsupportedImageType(code))
            }
        })
    }

    /// Encode RGBA8888 into the layout of an entry without modifying it
    ///
    /// The image keeps the entry's type, flags and payload length. Fails with
    /// [`Error::EncodedTooLarge`] when the result does not fit.
    #[instrument(skip(self, rgba), err)]
    pub fn encode_entry(
        &self,
        index: usize,
        rgba: &[u8],
        options: &EncodeOptions,
    ) -> Result<EncodeResult> {
        let entry = self.by_index(index)?;
        let format = entry.image_format();
        if !format.importable() {
            return Err(Error::UnsupportedImageType(entry.record_type()));
        }

        let flags = entry.flags();
        let order = self.pixel_order_for(&format);
        let palette = if format.is_indexed() {
            Some(self.resolve_palette(index)?)
        } else {
            None
        };
        let palette_layout = palette.as_ref().map(|p| self.palette_layout(p));
        // the built in palette is never stored, so indices must address it
        let mut fixed = match &palette {
            Some(p) if !options.quantize_palette || p.source == PaletteSource::Default => {
                Some(p.linear_data())
            }
            _ => None,
        };
        // a generated palette has to fit the record it replaces
        let max_colors = match (&palette, palette_layout) {
            (Some(p), Some((pf, po))) => indexed::decode_palette(&p.data, pf, po)?.len(),
            _ => 0,
        };
        let mut generated: Option<Vec<u8>> = None;

        let levels = if options.generate_mipmaps {
            entry.mipmap_count().min(MAX_MIPMAP_LEVELS)
        } else {
            0
        };
        let (mut width, mut height) = (entry.width(), entry.height());
        let mut level = Cow::Borrowed(rgba);
        let mut image = Vec::with_capacity(entry.raw_data.len());

        for n in 0..=levels {
            if n > 0 {
                let (next, w, h) = mipmap::downscale_half(&level, width, height);
                level = Cow::Owned(next);
                (width, height) = (w, h);
            }

            let (bytes, produced) = encode_level(
                &level,
                width,
                height,
                &format,
                order,
                palette_layout,
                fixed.as_deref(),
                max_colors,
            )?;
            if let Some(produced) = produced {
                // later levels map onto the palette generated for the top one
                fixed = Some(produced.clone());
                generated = Some(produced);
            }

            let bytes = self.transform_layout(
                &bytes,
                &format,
                flags.swizzled,
                width,
                height,
                Direction::Swizzle,
            )?;
            trace!(level = n, width, height, size = bytes.len(), "encoded level");
            image.extend_from_slice(&bytes);
        }

        if flags.compressed {
            image = refpack::compress(&image);
        }
        let image = fit_exact(image, entry.raw_data.len())?;

        let palette_bytes = match (&generated, &palette) {
            (Some(generated), Some(info)) => {
                let stored = if info.swizzled {
                    swizzle::swizzle_palette(generated)
                } else {
                    generated.clone()
                };
                fit_exact(stored, info.data.len())?
            }
            _ => Vec::new(),
        };

        Ok(EncodeResult {
            image,
            palette: palette_bytes,
            palette_source: palette.map(|p| p.source),
            palette_produced: generated.is_some(),
        })
    }

    /// Replace an entry's payload with `rgba` re-encoded in the entry's layout
    ///
    /// Nothing is modified when encoding fails. A generated palette replaces
    /// the palette record it was resolved from.
    #[instrument(skip(self, rgba), err)]
    pub fn import_rgba(
        &mut self,
        index: usize,
        rgba: &[u8],
        options: &EncodeOptions,
    ) -> Result<EncodeResult> {
        let result = self.encode_entry(index, rgba, options)?;

        if result.palette_produced {
            match result.palette_source {
                Some(PaletteSource::Attachment { entry, attachment }) => {
                    let target = self
                        .by_index_mut(entry)?
                        .attachments
                        .get_mut(attachment)
                        .ok_or(Error::AttachmentNotFound { entry, attachment })?;
                    target.data = result.palette.clone();
                    target.replaced = true;
                }
                Some(PaletteSource::Sibling { entry }) => {
                    let target = self.by_index_mut(entry)?;
                    target.raw_data = result.palette.clone();
                    target.imported = true;
                }
                _ => warn!(index, "generated palette has no record to replace"),
            }
            // other entries may share the palette
            for entry in self.entries.iter_mut() {
                entry.preview = None;
            }
        }

        let entry = self.by_index_mut(index)?;
        entry.raw_data = result.image.clone();
        entry.imported = true;
        entry.preview = None;
        Ok(result)
    }

    /// Decoded RGBA8888 of an entry, decoding it on first use
    pub fn preview(&mut self, index: usize) -> Result<&[u8]> {
        if self.by_index(index)?.preview.is_none() {
            let rgba = self.decode_entry(index)?;
            self.by_index_mut(index)?.preview = Some(rgba);
        }
        Ok(self.by_index(index)?.preview.as_deref().unwrap_or_default())
    }

    /// Decode every entry's preview. Failures are logged and leave that
    /// entry without a preview. Returns the number of entries decoded.
    #[instrument(skip(self))]
    pub fn convert_previews(&mut self) -> usize {
        let mut converted = 0;
        for index in 0..self.len() {
            let preview = match self.decode_entry(index) {
                Ok(rgba) => {
                    converted += 1;
                    Some(rgba)
                }
                Err(error) => {
                    warn!(index, %error, "preview not supported");
                    None
                }
            };
            self.entries[index].preview = preview;
        }
        converted
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::convert::{fit_exact, level_size, EncodeOptions};
    use crate::error::{Error, Result};
    use crate::format::image_format;

    #[test]
    fn pad_to_original_length() -> Result<()> {
        assert_eq!(fit_exact(vec![1, 2], 4)?, vec![1, 2, 0, 0]);
        assert_eq!(fit_exact(vec![1, 2], 2)?, vec![1, 2]);
        assert!(matches!(
            fit_exact(vec![0; 12], 2),
            Err(Error::EncodedTooLarge {
                encoded: 12,
                limit: 2
            })
        ));
        Ok(())
    }

    #[test]
    fn level_sizes() {
        assert_eq!(level_size(&image_format(2), 64, 64), 4096);
        assert_eq!(level_size(&image_format(1), 3, 3), 5);
        assert_eq!(level_size(&image_format(96), 2, 2), 8);
        assert_eq!(level_size(&image_format(88), 4, 4), 32);
        assert_eq!(level_size(&image_format(26), 3, 2), 16);
    }

    #[test]
    fn encode_options_default_on() {
        let options = EncodeOptions::default();
        assert!(options.generate_mipmaps);
        assert!(options.quantize_palette);
        let options = EncodeOptions::builder().generate_mipmaps(false).build();
        assert!(!options.generate_mipmaps);
    }
}
