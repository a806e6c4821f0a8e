//! Types for reading shape archives
//!

use std::io::Read;

use binrw::Endian;
use indexmap::IndexMap;
use tracing::{debug, instrument, trace, warn};

use crate::{
    attachment::read_attachments,
    compression::{self, CompressionMethod},
    entry::DirectoryEntry,
    error::{EntryNotFoundError, Error, Result},
    reader::ShapeReader,
    types::{
        ByteOrders, EntryHeader, NewDirectoryRow, NewEntryHeader, NewFileHeader, OldDirectoryRow,
        OldEntryHeader, OldFileHeader, ShapeVariant, Signature,
    },
};

/// Marker some titles append 12 bytes before the end, leaving the declared
/// size short of the real one
pub const CHECKSUM_TRAILER: &[u8; 4] = b"CKSM";

const FILE_HEADER_SIZE: u64 = 16;

/// Header fields that differ between the two layouts
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HeaderExtra {
    /// Old shapes carry a format version tag such as `G354`
    Version([u8; 4]),
    /// New shapes carry the size of header plus directory
    HeaderSize(u32),
}

struct DirectoryRow {
    tag_raw: Vec<u8>,
    offset: u32,
    size: Option<u32>,
}

/// Shape archive reader
///
/// ```no_run
/// fn list_shape_contents(reader: impl std::io::Read) -> eagfx_shape::error::Result<()> {
///     let shape = eagfx_shape::ShapeArchive::new(reader)?;
///
///     for entry in shape.entries() {
///         println!("{} {}x{} type {}", entry.tag, entry.width(), entry.height(), entry.record_type());
///     }
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ShapeArchive {
    data: Vec<u8>,
    compression: CompressionMethod,
    signature: Signature,
    byte_orders: ByteOrders,
    declared_size: u32,
    total_size: u64,
    entry_count: u32,
    extra: HeaderExtra,
    directory_size: u64,
    pub(crate) entries: Vec<DirectoryEntry>,
    tags: IndexMap<Box<str>, usize>,
}

impl ShapeArchive {
    /// Read a whole shape file, unwrapping RefPack or Zlib compression first.
    pub fn new<R: Read>(mut reader: R) -> Result<ShapeArchive> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Parse a shape file held in memory.
    #[instrument(skip(data), fields(size = data.len()), err)]
    pub fn from_bytes(data: Vec<u8>) -> Result<ShapeArchive> {
        if data.len() < 4 {
            return Err(Error::EmptyInput);
        }
        let (data, compression) = compression::decompress(data)?;
        let Some(signature) = data.get(..4) else {
            return Err(Error::EmptyInput);
        };
        let signature = Signature::from_bytes([signature[0], signature[1], signature[2], signature[3]])?;
        let byte_orders = signature.byte_orders();
        debug!(signature = signature.as_str(), ?byte_orders, ?compression, "opening shape");

        let mut reader = ShapeReader::new(&data, byte_orders.header);
        let (declared_size, entry_count, extra) = match signature.variant() {
            ShapeVariant::Old => {
                let header: OldFileHeader = reader.read()?;
                (header.total_size, header.entry_count, HeaderExtra::Version(header.version))
            }
            ShapeVariant::New => {
                let header: NewFileHeader = reader.read()?;
                (
                    header.total_size,
                    header.entry_count,
                    HeaderExtra::HeaderSize(header.header_size),
                )
            }
        };
        let total_size = Self::validate_size(&data, byte_orders.header)?;

        reader.set_endian(byte_orders.directory);
        let rows = Self::read_directory(&mut reader, signature.variant(), entry_count)?;
        let directory_size = match extra {
            HeaderExtra::Version(_) => FILE_HEADER_SIZE + 8 * entry_count as u64,
            HeaderExtra::HeaderSize(size) => size as u64,
        };

        reader.set_endian(byte_orders.data);
        let entries = Self::read_entries(&mut reader, signature.variant(), rows, total_size)?;

        let mut tags = IndexMap::with_capacity(entries.len());
        for entry in &entries {
            tags.entry(entry.tag.clone().into_boxed_str())
                .or_insert(entry.index);
        }

        Ok(ShapeArchive {
            compression,
            signature,
            byte_orders,
            declared_size,
            total_size,
            entry_count,
            extra,
            directory_size,
            entries,
            tags,
            data,
        })
    }

    /// Accept the declared size in either byte order, or a mismatch when the
    /// checksum trailer is present. Returns the size entry extents run up to.
    fn validate_size(data: &[u8], header_order: Endian) -> Result<u64> {
        let actual = data.len() as u64;
        let field = [data[4], data[5], data[6], data[7]];
        let declared_le = u32::from_le_bytes(field);
        let declared_be = u32::from_be_bytes(field);

        if declared_le as u64 == actual || declared_be as u64 == actual {
            return Ok(actual);
        }

        let declared = match header_order {
            Endian::Little => declared_le,
            Endian::Big => declared_be,
        } as u64;
        if actual >= 12 && &data[data.len() - 12..data.len() - 8] == CHECKSUM_TRAILER {
            warn!(declared, actual, "declared size differs, accepted because of the checksum trailer");
            return Ok(declared.min(actual));
        }

        Err(Error::SizeMismatch {
            declared_le,
            declared_be,
            actual,
        })
    }

    fn read_directory(
        reader: &mut ShapeReader,
        variant: ShapeVariant,
        count: u32,
    ) -> Result<Vec<DirectoryRow>> {
        reader.seek(FILE_HEADER_SIZE)?;
        (0..count)
            .map(|_| match variant {
                ShapeVariant::Old => {
                    let row: OldDirectoryRow = reader.read()?;
                    Ok(DirectoryRow {
                        tag_raw: row.tag.to_vec(),
                        offset: row.offset,
                        size: None,
                    })
                }
                ShapeVariant::New => {
                    let row: NewDirectoryRow = reader.read()?;
                    Ok(DirectoryRow {
                        tag_raw: row.tag.0,
                        offset: row.offset,
                        size: Some(row.size),
                    })
                }
            })
            .collect()
    }

    /// End offset of each entry: the next start, or the total size for the
    /// last. Out of order directories use the nearest greater start.
    fn end_offsets(starts: &[u64], total_size: u64) -> Vec<u64> {
        starts
            .iter()
            .enumerate()
            .map(|(i, &start)| match starts.get(i + 1) {
                Some(&next) if next > start => next,
                _ => starts
                    .iter()
                    .copied()
                    .filter(|&other| other > start)
                    .min()
                    .unwrap_or(total_size)
                    .max(start),
            })
            .collect()
    }

    fn read_entries(
        reader: &mut ShapeReader,
        variant: ShapeVariant,
        rows: Vec<DirectoryRow>,
        total_size: u64,
    ) -> Result<Vec<DirectoryEntry>> {
        let starts: Vec<u64> = rows.iter().map(|r| r.offset as u64).collect();
        let ends = Self::end_offsets(&starts, total_size);

        let mut entries = Vec::with_capacity(rows.len());
        for (index, (row, end_offset)) in rows.into_iter().zip(ends).enumerate() {
            let start_offset = row.offset as u64;
            reader.seek(start_offset)?;
            let header = match variant {
                ShapeVariant::Old => EntryHeader::Old(reader.read::<OldEntryHeader>()?),
                ShapeVariant::New => EntryHeader::New(reader.read::<NewEntryHeader>()?),
            };

            let raw_data_offset = start_offset + header.size();
            let available = end_offset.saturating_sub(raw_data_offset);
            let block_size = header.block_size() as u64;
            let next_record_exists = block_size != 0;
            let raw_len = if next_record_exists {
                let len = block_size.saturating_sub(header.size());
                if len > available {
                    debug!(index, block_size, available, "block size runs past the entry end");
                }
                len.min(available)
            } else {
                available
            };
            let raw_data = reader.slice(raw_data_offset, raw_len)?.to_vec();

            let tag = String::from_utf8_lossy(&row.tag_raw)
                .trim_end_matches('\0')
                .to_owned();
            trace!(index, tag, start_offset, end_offset, raw_len, "entry");

            entries.push(DirectoryEntry {
                index,
                tag,
                tag_raw: row.tag_raw,
                start_offset,
                end_offset,
                declared_size: row.size,
                header,
                raw_data_offset,
                raw_data,
                image_end_offset: 0,
                next_record_exists,
                attachments: Vec::new(),
                preview: None,
                imported: false,
                referenced: starts.iter().filter(|&&s| s == start_offset).count() > 1,
            });
        }

        for entry in entries.iter_mut() {
            entry.image_end_offset = entry.raw_data_offset + entry.raw_data.len() as u64;
            if entry.next_record_exists {
                entry.attachments =
                    read_attachments(reader, variant, entry.image_end_offset, entry.end_offset)?;
            }
        }

        Ok(entries)
    }
}

/// Accessors for the parsed header and catalog
impl ShapeArchive {
    pub fn signature(&self) -> Signature {
        self.signature
    }

    pub fn variant(&self) -> ShapeVariant {
        self.signature.variant()
    }

    pub fn byte_orders(&self) -> ByteOrders {
        self.byte_orders
    }

    /// Whole file compression the archive was opened with
    pub fn compression(&self) -> CompressionMethod {
        self.compression
    }

    /// Total size field in the header byte order
    pub fn declared_size(&self) -> u32 {
        self.declared_size
    }

    /// Offset the last entry extends to
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    pub fn entry_count(&self) -> u32 {
        self.entry_count
    }

    pub fn header_extra(&self) -> HeaderExtra {
        self.extra
    }

    /// Bytes taken by the file header and directory
    pub fn directory_size(&self) -> u64 {
        self.directory_size
    }

    /// Decompressed file contents as opened
    pub fn source(&self) -> &[u8] {
        &self.data
    }

    /// Number of entries in the directory
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    /// Returns an iterator over the entry tags in directory order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.tag.as_str())
    }

    /// Get the index of the first entry with `tag`, if it's present.
    #[inline(always)]
    pub fn index_for_tag(&self, tag: &str) -> Option<usize> {
        self.tags.get(tag).copied()
    }

    /// Get an entry by index
    pub fn by_index(&self, index: usize) -> Result<&DirectoryEntry> {
        self.entries
            .get(index)
            .ok_or(Error::EntryNotFound(EntryNotFoundError::Index(index)))
    }

    /// Search for the first entry with `tag`
    pub fn by_tag(&self, tag: &str) -> Result<&DirectoryEntry> {
        let Some(index) = self.index_for_tag(tag) else {
            return Err(Error::EntryNotFound(EntryNotFoundError::Tag(tag.to_owned())));
        };
        self.by_index(index)
    }

    pub(crate) fn by_index_mut(&mut self, index: usize) -> Result<&mut DirectoryEntry> {
        self.entries
            .get_mut(index)
            .ok_or(Error::EntryNotFound(EntryNotFoundError::Index(index)))
    }
}
