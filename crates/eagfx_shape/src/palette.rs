//! Palette lookup for indexed images.
//!
//! An entry uses, in order: its own palette attachment, the first palette
//! record in the directory, or a built in grey ramp.

use eagfx_codec::{swizzle, ByteOrder, PixelFormat};
use tracing::{instrument, warn};

use crate::attachment::AttachmentKind;
use crate::error::{Error, Result};
use crate::format::{default_palette, palette_format, SWIZZLE_PALETTE_TYPES};
use crate::read::ShapeArchive;

/// Where a palette was found
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PaletteSource {
    Attachment { entry: usize, attachment: usize },
    /// A palette record listed in the directory
    Sibling { entry: usize },
    /// The built in grey ramp
    Default,
}

/// Resolved palette for an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteInfo {
    pub source: PaletteSource,
    /// Palette record type, 0 for the built in palette
    pub record_type: u8,
    /// Palette bytes as stored
    pub data: Vec<u8>,
    /// Stored in the PS2 CLUT order
    pub swizzled: bool,
}

impl PaletteInfo {
    fn default_palette() -> Self {
        Self {
            source: PaletteSource::Default,
            record_type: 0,
            data: default_palette(),
            swizzled: false,
        }
    }

    /// Colour layout of the palette entries and their fixed byte order, if any
    pub fn format(&self) -> (PixelFormat, Option<ByteOrder>) {
        palette_format(self.record_type, self.data.len())
    }

    /// Palette bytes in linear order
    pub fn linear_data(&self) -> Vec<u8> {
        if self.swizzled {
            swizzle::unswizzle_palette(&self.data)
        } else {
            self.data.clone()
        }
    }
}

fn is_swizzled(record_type: u8, indicator: bool) -> bool {
    indicator && SWIZZLE_PALETTE_TYPES.contains(&record_type)
}

impl ShapeArchive {
    /// Find the palette an indexed entry decodes with
    #[instrument(skip(self), err)]
    pub fn resolve_palette(&self, index: usize) -> Result<PaletteInfo> {
        let entry = self.by_index(index)?;

        if let Some(attachment) = entry.palette_attachment() {
            if let AttachmentKind::Palette(header) = &attachment.kind {
                let record_type = attachment.record_type & 0x7F;
                return Ok(PaletteInfo {
                    source: PaletteSource::Attachment {
                        entry: index,
                        attachment: attachment.index,
                    },
                    record_type,
                    data: attachment.data.clone(),
                    swizzled: is_swizzled(record_type, header.swizzled),
                });
            }
        }

        if let Some(sibling) = self.entries().iter().find(|e| e.is_palette()) {
            let record_type = sibling.record_type();
            return Ok(PaletteInfo {
                source: PaletteSource::Sibling {
                    entry: sibling.index,
                },
                record_type,
                data: sibling.raw_data.clone(),
                swizzled: is_swizzled(record_type, sibling.header.palette_swizzled()),
            });
        }

        warn!(index, "{}, using the built in grey palette", Error::PaletteNotFound);
        Ok(PaletteInfo::default_palette())
    }
}
