//! Catalogued directory entries.

use crate::attachment::AttachmentEntry;
use crate::error::{Error, Result};
use crate::format::{self, ImageFormat};
use crate::types::{EntryFlags, EntryHeader};

/// One image or data record listed in the directory
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryEntry {
    /// Position in the directory
    pub index: usize,
    pub tag: String,
    /// Tag as stored, to be used when `tag` was decoded lossily
    pub tag_raw: Vec<u8>,
    pub start_offset: u64,
    /// Start of the next entry, or the total size for the last one
    pub end_offset: u64,
    /// Size column of new shape directories, informational only
    pub declared_size: Option<u32>,
    pub header: EntryHeader,
    pub raw_data_offset: u64,
    pub raw_data: Vec<u8>,
    /// End of the primary image block, where attachments begin
    pub image_end_offset: u64,
    /// False when the block size is 0 and no attachments follow
    pub next_record_exists: bool,
    pub attachments: Vec<AttachmentEntry>,
    /// Decoded RGBA8888, filled by conversion
    pub preview: Option<Vec<u8>>,
    /// Set when `raw_data` was replaced by an import
    pub imported: bool,
    /// Another entry shares this entry's start offset
    pub referenced: bool,
}

impl DirectoryEntry {
    /// Image type with the compression bit cleared
    pub fn record_type(&self) -> u8 {
        self.header.record_type()
    }

    pub fn image_format(&self) -> ImageFormat {
        format::image_format(self.record_type())
    }

    pub fn is_palette(&self) -> bool {
        format::is_palette_type(self.record_type())
    }

    pub fn flags(&self) -> EntryFlags {
        self.header.flags()
    }

    pub fn is_compressed(&self) -> bool {
        self.flags().compressed
    }

    pub fn width(&self) -> u32 {
        self.header.width() as u32
    }

    pub fn height(&self) -> u32 {
        self.header.height() as u32
    }

    pub fn bits_per_pixel(&self) -> u8 {
        self.image_format().bits_per_pixel
    }

    pub fn mipmap_count(&self) -> u32 {
        self.header.mipmap_count()
    }

    /// CRC-32 of the raw payload
    pub fn crc32(&self) -> u32 {
        crc::Crc::<u32>::new(&crc::CRC_32_ISO_HDLC).checksum(&self.raw_data)
    }

    pub fn attachment(&self, index: usize) -> Result<&AttachmentEntry> {
        self.attachments
            .get(index)
            .ok_or(Error::AttachmentNotFound {
                entry: self.index,
                attachment: index,
            })
    }

    /// First palette attachment, if any
    pub fn palette_attachment(&self) -> Option<&AttachmentEntry> {
        self.attachments.iter().find(|a| a.is_palette())
    }

    pub fn comment(&self) -> Option<String> {
        self.attachments.iter().find_map(|a| a.comment_text())
    }

    pub fn image_name(&self) -> Option<String> {
        self.attachments.iter().find_map(|a| a.image_name())
    }
}
