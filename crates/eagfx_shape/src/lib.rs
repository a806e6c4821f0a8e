//! This library handles reading, converting and re-saving **shape** texture archives used by
//! EA titles (`.fsh`, `.ssh`, `.psh`, `.xsh`, `.msh`, `.gsh` and the newer `Shp*` family).
//!
//! # Shape Archive Format Documentation
//!
//! A shape file is a small container holding a directory of images. Each image record may be
//! followed by any number of attachment records (palettes, comments, names, hot spots) which
//! share the image's byte range. The whole file may additionally be wrapped in RefPack or zlib
//! compression, which is removed transparently on open.
//!
//! ## Signatures
//!
//! | Signature | Variant | Platform tiling  | Header / Directory / Data order |
//! |-----------|---------|------------------|---------------------------------|
//! | `SHPI`    | Old     | Morton           | LE / LE / LE                    |
//! | `SHPP`    | Old     | none             | LE / LE / LE                    |
//! | `SHPS`    | Old     | PS2              | LE / LE / LE                    |
//! | `SHPX`    | Old     | Morton           | LE / LE / LE                    |
//! | `SHPM`    | Old     | PSP              | LE / LE / LE                    |
//! | `SHPG`    | Old     | GameCube         | BE / BE / BE                    |
//! | `SHPA`    | Old     | Morton           | LE / BE / BE                    |
//! | `ShpF`    | New     | Morton           | LE / LE / LE                    |
//! | `ShpS`    | New     | PS2              | LE / LE / LE                    |
//! | `ShpX`    | New     | Morton           | BE / BE / LE                    |
//! | `ShpP`    | New     | Morton           | BE / BE / BE                    |
//! | `ShpM`    | New     | PSP              | LE / LE / LE                    |
//! | `ShpG`    | New     | GameCube         | BE / BE / BE                    |
//!
//! Tiling is only undone for entries whose swizzle flag is set.
//!
//! ## Old File Header
//!
//! | Offset (bytes) | Field        | Description                                         |
//! |----------------|--------------|-----------------------------------------------------|
//! | 0x0000         | Signature    | 4 bytes: one of the old signatures above            |
//! | 0x0004         | Total Size   | 4 bytes: size of the file, either byte order        |
//! | 0x0008         | Entry Count  | 4 bytes: number of directory rows                   |
//! | 0x000C         | Version      | 4 bytes: ASCII tag such as `G354`                   |
//!
//! Each directory row is a 4 byte tag followed by a 4 byte absolute entry offset.
//!
//! ## New File Header
//!
//! | Offset (bytes) | Field        | Description                                         |
//! |----------------|--------------|-----------------------------------------------------|
//! | 0x0000         | Signature    | 4 bytes: one of the new signatures above            |
//! | 0x0004         | Total Size   | 4 bytes: size of the file                           |
//! | 0x0008         | Entry Count  | 4 bytes: number of directory rows                   |
//! | 0x000C         | Header Size  | 4 bytes: size of the header and directory           |
//!
//! Each directory row is a 4 byte offset, a 4 byte size and a NUL terminated tag.
//!
//! ## Entry Header
//!
//! Old entries carry a 16 byte header:
//!
//! | Offset | Field        | Description                                               |
//! |--------|--------------|-----------------------------------------------------------|
//! | 0x00   | Record Type  | 1 byte: image type, bit `0x80` marks RefPack payloads     |
//! | 0x01   | Block Size   | 3 bytes: distance to the next record, `0` for none        |
//! | 0x04   | Width        | 2 bytes                                                   |
//! | 0x06   | Height       | 2 bytes                                                   |
//! | 0x08   | Center X     | 2 bytes                                                   |
//! | 0x0A   | Center Y     | 2 bytes                                                   |
//! | 0x0C   | Default X    | 2 bytes: low 12 bits position, high 4 bits flags          |
//! | 0x0E   | Default Y    | 2 bytes: low 12 bits position, high 4 bits mip count      |
//!
//! New entries carry a 40 byte header with 32 bit fields for block size, data offset, data
//! size, dimensions, center, default position and mip count, plus 24 bits of flags.
//!
//! ## Attachments
//!
//! | Code             | Kind      | Payload                                       |
//! |------------------|-----------|-----------------------------------------------|
//! | 33 - 59 (some)   | Palette   | palette entries in the record's pixel format  |
//! | 105              | Metal bin | auxiliary alpha/metal data                    |
//! | 111              | Comment   | length prefixed text                          |
//! | 112              | Image name| NUL terminated text                           |
//! | 124              | Hot spots | count followed by rectangles                  |
//!

pub mod attachment;
pub mod compression;
pub mod convert;
pub mod entry;
pub mod error;
pub mod format;
pub mod palette;
pub mod read;
pub(crate) mod reader;
pub mod summary;
pub mod types;
pub mod write;

pub use attachment::AttachmentEntry;
pub use compression::CompressionMethod;
pub use convert::{EncodeOptions, EncodeResult};
pub use entry::DirectoryEntry;
pub use palette::PaletteInfo;
pub use read::ShapeArchive;
pub use summary::ArchiveSummary;
pub use types::{ShapeVariant, Signature};
pub use write::{SaveOptions, ShapeWriter};
