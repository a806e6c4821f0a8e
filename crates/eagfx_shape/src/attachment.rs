//! Sub records trailing the image data of an entry.
//!
//! Each attachment starts with its record type and a block size giving the
//! distance to the next attachment, 0 for the last one. The run is bounded by
//! the owning entry's end offset.

use tracing::{debug, instrument, trace, warn};

use crate::error::{Error, Result};
use crate::format::{self, COMMENT, HOT_SPOT, IMG_NAME, METAL_BIN};
use crate::reader::ShapeReader;
use crate::types::ShapeVariant;

/// Palette attachment header fields
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PaletteHeader {
    pub width: u16,
    pub height: u16,
    pub entries: u32,
    /// Old shapes only
    pub unknown: u16,
    pub default_x: u32,
    pub default_y: u32,
    /// High bit of the default x field
    pub swizzled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AttachmentKind {
    /// Platform specific binary blob
    MetalBin { data_size: u32, flags: u32 },
    Comment { length: u32 },
    ImgName,
    HotSpot { count: u32 },
    Palette(PaletteHeader),
    Unknown,
}

impl AttachmentKind {
    pub const fn name(&self) -> &'static str {
        match self {
            AttachmentKind::MetalBin { .. } => "MetalBin",
            AttachmentKind::Comment { .. } => "Comment",
            AttachmentKind::ImgName => "ImgName",
            AttachmentKind::HotSpot { .. } => "HotSpot",
            AttachmentKind::Palette(_) => "Palette",
            AttachmentKind::Unknown => "Unknown",
        }
    }
}

/// Smallest attachment header, the common prefix
pub const fn min_header_size(variant: ShapeVariant) -> u64 {
    match variant {
        ShapeVariant::Old => 4,
        ShapeVariant::New => 8,
    }
}

fn header_size(code: u8, variant: ShapeVariant) -> u64 {
    let old = variant == ShapeVariant::Old;
    match code {
        METAL_BIN => 16,
        COMMENT | HOT_SPOT => {
            if old {
                8
            } else {
                12
            }
        }
        code if format::is_palette_type(code) => {
            if old {
                16
            } else {
                24
            }
        }
        _ => min_header_size(variant),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttachmentEntry {
    /// Position in the owning entry's attachment list
    pub index: usize,
    pub record_type: u8,
    /// New shapes only
    pub flags: u32,
    pub block_size: u32,
    pub start_offset: u64,
    pub end_offset: u64,
    pub header_size: u64,
    pub kind: AttachmentKind,
    pub data: Vec<u8>,
    /// Set when `data` was replaced by an import
    pub replaced: bool,
}

impl AttachmentEntry {
    pub fn tag(&self) -> &'static str {
        self.kind.name()
    }

    /// Offset of the payload in the decompressed file
    pub fn data_offset(&self) -> u64 {
        self.start_offset + self.header_size
    }

    pub fn is_palette(&self) -> bool {
        matches!(self.kind, AttachmentKind::Palette(_))
    }

    pub fn comment_text(&self) -> Option<String> {
        match self.kind {
            AttachmentKind::Comment { length } => {
                let text = &self.data[..(length as usize).min(self.data.len())];
                Some(c_str_lossy(text))
            }
            _ => None,
        }
    }

    pub fn image_name(&self) -> Option<String> {
        match self.kind {
            AttachmentKind::ImgName => Some(c_str_lossy(&self.data)),
            _ => None,
        }
    }
}

fn c_str_lossy(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..end]).into_owned()
}

fn read_kind(reader: &mut ShapeReader, code: u8, variant: ShapeVariant) -> Result<AttachmentKind> {
    let old = variant == ShapeVariant::Old;
    Ok(match code {
        METAL_BIN if old => AttachmentKind::MetalBin {
            data_size: reader.read_u16()? as u32,
            flags: reader.read_u16()? as u32,
        },
        METAL_BIN => AttachmentKind::MetalBin {
            data_size: reader.read_u32()?,
            flags: reader.read_u32()?,
        },
        COMMENT => AttachmentKind::Comment {
            length: reader.read_u32()?,
        },
        IMG_NAME => AttachmentKind::ImgName,
        HOT_SPOT => AttachmentKind::HotSpot {
            count: reader.read_u32()?,
        },
        code if format::is_palette_type(code) => {
            let header = if old {
                let width = reader.read_u16()?;
                let height = reader.read_u16()?;
                let entries = reader.read_u16()? as u32;
                let unknown = reader.read_u16()?;
                let default_x = reader.read_u16()? as u32;
                let default_y = reader.read_u16()? as u32;
                PaletteHeader {
                    width,
                    height,
                    entries,
                    unknown,
                    default_x,
                    default_y,
                    swizzled: default_x & 0x8000 != 0,
                }
            } else {
                let width = reader.read_u16()?;
                let height = reader.read_u16()?;
                let entries = reader.read_u32()?;
                let default_x = reader.read_u32()?;
                let default_y = reader.read_u32()?;
                PaletteHeader {
                    width,
                    height,
                    entries,
                    unknown: 0,
                    default_x,
                    default_y,
                    swizzled: default_x & 0x8000_0000 != 0,
                }
            };
            AttachmentKind::Palette(header)
        }
        code => {
            warn!("{}, keeping it as raw data", Error::UnknownAttachmentType(code));
            AttachmentKind::Unknown
        }
    })
}

/// Walk the attachment run starting at `offset` up to `entry_end`
#[instrument(skip(reader), err)]
pub(crate) fn read_attachments(
    reader: &mut ShapeReader,
    variant: ShapeVariant,
    mut offset: u64,
    entry_end: u64,
) -> Result<Vec<AttachmentEntry>> {
    let mut attachments = Vec::new();

    while entry_end.saturating_sub(offset) >= min_header_size(variant) {
        reader.seek(offset)?;
        let code = reader.peek_u8()?;
        let header_size = header_size(code, variant);
        if offset + header_size > entry_end {
            warn!(offset, code, "attachment header runs past the entry end");
            break;
        }

        let record_type = reader.read_u8()?;
        let (flags, block_size) = match variant {
            ShapeVariant::Old => (0, reader.read_u24()?),
            ShapeVariant::New => (reader.read_u24()?, reader.read_u32()?),
        };
        let kind = read_kind(reader, code, variant)?;

        let step = match block_size as u64 {
            0 => 0,
            size if size < header_size => {
                debug!(offset, size, header_size, "attachment block size smaller than its header");
                header_size
            }
            size => size,
        };
        let end_offset = match step {
            0 => entry_end,
            step => (offset + step).min(entry_end),
        };
        let data = reader
            .slice(offset + header_size, end_offset - (offset + header_size))?
            .to_vec();

        trace!(offset, end_offset, record_type, kind = kind.name(), "attachment");
        attachments.push(AttachmentEntry {
            index: attachments.len(),
            record_type,
            flags,
            block_size,
            start_offset: offset,
            end_offset,
            header_size,
            kind,
            data,
            replaced: false,
        });

        if end_offset >= entry_end {
            break;
        }
        offset = end_offset;
    }

    Ok(attachments)
}
