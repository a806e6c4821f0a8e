//! Display metadata for an opened archive.

use crate::attachment::AttachmentEntry;
use crate::compression::CompressionMethod;
use crate::entry::DirectoryEntry;
use crate::read::{HeaderExtra, ShapeArchive};
use crate::types::{EntryFlags, ShapeVariant};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct AttachmentSummary {
    pub index: usize,
    pub record_type: u8,
    pub kind: &'static str,
    pub start_offset: u64,
    pub end_offset: u64,
    pub size: usize,
    /// Comment or image name text
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EntrySummary {
    pub index: usize,
    pub tag: String,
    pub record_type: u8,
    pub format: &'static str,
    pub width: u32,
    pub height: u32,
    pub center: (u32, u32),
    pub default_position: (u32, u32),
    pub mipmaps: u32,
    pub flags: EntryFlags,
    pub start_offset: u64,
    pub end_offset: u64,
    pub raw_size: usize,
    pub crc32: u32,
    pub referenced: bool,
    pub attachments: Vec<AttachmentSummary>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ArchiveSummary {
    pub signature: &'static str,
    pub variant: ShapeVariant,
    pub compression: CompressionMethod,
    pub declared_size: u32,
    pub entry_count: u32,
    /// Old shapes only
    pub version: Option<String>,
    pub directory_size: u64,
    pub entries: Vec<EntrySummary>,
}

impl From<&AttachmentEntry> for AttachmentSummary {
    fn from(attachment: &AttachmentEntry) -> Self {
        Self {
            index: attachment.index,
            record_type: attachment.record_type,
            kind: attachment.tag(),
            start_offset: attachment.start_offset,
            end_offset: attachment.end_offset,
            size: attachment.data.len(),
            text: attachment
                .comment_text()
                .or_else(|| attachment.image_name()),
        }
    }
}

impl From<&DirectoryEntry> for EntrySummary {
    fn from(entry: &DirectoryEntry) -> Self {
        Self {
            index: entry.index,
            tag: entry.tag.clone(),
            record_type: entry.record_type(),
            format: entry.image_format().name,
            width: entry.width(),
            height: entry.height(),
            center: entry.header.center(),
            default_position: entry.header.default_position(),
            mipmaps: entry.mipmap_count(),
            flags: entry.flags(),
            start_offset: entry.start_offset,
            end_offset: entry.end_offset,
            raw_size: entry.raw_data.len(),
            crc32: entry.crc32(),
            referenced: entry.referenced,
            attachments: entry.attachments.iter().map(Into::into).collect(),
        }
    }
}

impl ShapeArchive {
    pub fn summary(&self) -> ArchiveSummary {
        ArchiveSummary {
            signature: self.signature().as_str(),
            variant: self.variant(),
            compression: self.compression(),
            declared_size: self.declared_size(),
            entry_count: self.entry_count(),
            version: match self.header_extra() {
                HeaderExtra::Version(version) => Some(String::from_utf8_lossy(&version).into_owned()),
                HeaderExtra::HeaderSize(_) => None,
            },
            directory_size: self.directory_size(),
            entries: self.entries().iter().map(Into::into).collect(),
        }
    }
}
