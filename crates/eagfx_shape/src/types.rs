//! Base types for structure of shape files.

use binrw::helpers::{read_u24, write_u24};
use binrw::{BinRead, BinWrite, Endian, NullString};
use eagfx_codec::{ByteOrder, SwizzlePlatform};

use crate::error::{Error, Result};

/// Header and directory layout family selected by the signature
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ShapeVariant {
    /// `SHPx` files: 4 character tags and 16 byte entry headers
    Old,
    /// `Shpx` files: string tags and 40 byte entry headers
    New,
}

/// Four character file signature
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Signature {
    /// `SHPI`, PC
    Shpi,
    /// `SHPP`, PlayStation
    Shpp,
    /// `SHPS`, PlayStation 2
    Shps,
    /// `SHPX`, Xbox
    Shpx,
    /// `SHPM`, PSP
    Shpm,
    /// `SHPG`, GameCube and Wii
    Shpg,
    /// `SHPA`, PlayStation 3
    Shpa,
    /// `ShpF`, PC
    NewPc,
    /// `ShpS`, PlayStation 2
    NewPs2,
    /// `ShpX`, Xbox 360
    NewXbox,
    /// `ShpP`, PlayStation 3
    NewPs3,
    /// `ShpM`, PSP
    NewPsp,
    /// `ShpG`, Wii
    NewWii,
}

/// Byte order of each section of a file
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ByteOrders {
    /// File header
    pub header: Endian,
    /// Directory rows
    pub directory: Endian,
    /// Entry headers, attachments and pixel words
    pub data: Endian,
}

const fn endian(big: bool) -> Endian {
    if big {
        Endian::Big
    } else {
        Endian::Little
    }
}

/// Pixel word order for a section byte order
pub fn pixel_order(endian: Endian) -> ByteOrder {
    match endian {
        Endian::Big => ByteOrder::Big,
        Endian::Little => ByteOrder::Little,
    }
}

impl Signature {
    pub const ALL: [Signature; 13] = [
        Signature::Shpi,
        Signature::Shpp,
        Signature::Shps,
        Signature::Shpx,
        Signature::Shpm,
        Signature::Shpg,
        Signature::Shpa,
        Signature::NewPc,
        Signature::NewPs2,
        Signature::NewXbox,
        Signature::NewPs3,
        Signature::NewPsp,
        Signature::NewWii,
    ];

    pub const fn bytes(self) -> &'static [u8; 4] {
        match self {
            Signature::Shpi => b"SHPI",
            Signature::Shpp => b"SHPP",
            Signature::Shps => b"SHPS",
            Signature::Shpx => b"SHPX",
            Signature::Shpm => b"SHPM",
            Signature::Shpg => b"SHPG",
            Signature::Shpa => b"SHPA",
            Signature::NewPc => b"ShpF",
            Signature::NewPs2 => b"ShpS",
            Signature::NewXbox => b"ShpX",
            Signature::NewPs3 => b"ShpP",
            Signature::NewPsp => b"ShpM",
            Signature::NewWii => b"ShpG",
        }
    }

    pub fn as_str(self) -> &'static str {
        // all signatures are ascii
        std::str::from_utf8(self.bytes()).unwrap_or("????")
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Result<Signature> {
        Self::ALL
            .into_iter()
            .find(|s| *s.bytes() == bytes)
            .ok_or(Error::UnsupportedSignature(bytes))
    }

    pub const fn variant(self) -> ShapeVariant {
        match self {
            Signature::Shpi
            | Signature::Shpp
            | Signature::Shps
            | Signature::Shpx
            | Signature::Shpm
            | Signature::Shpg
            | Signature::Shpa => ShapeVariant::Old,
            _ => ShapeVariant::New,
        }
    }

    pub const fn byte_orders(self) -> ByteOrders {
        use Signature::*;
        ByteOrders {
            header: endian(matches!(self, Shpg | NewXbox | NewPs3 | NewWii)),
            directory: endian(matches!(self, Shpg | Shpa | NewXbox | NewPs3 | NewWii)),
            data: endian(matches!(self, Shpg | Shpa | NewPs3 | NewWii)),
        }
    }

    /// Texture tiling used by the platform, `None` when the platform stores
    /// images linearly
    pub const fn platform(self) -> Option<SwizzlePlatform> {
        use Signature::*;
        match self {
            Shpi | Shpx | Shpa | NewPc | NewXbox | NewPs3 => Some(SwizzlePlatform::Morton),
            Shps | NewPs2 => Some(SwizzlePlatform::Ps2),
            Shpm | NewPsp => Some(SwizzlePlatform::Psp),
            Shpg | NewWii => Some(SwizzlePlatform::GameCube),
            Shpp => None,
        }
    }
}

/// Old shape file header
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
pub struct OldFileHeader {
    pub signature: [u8; 4],
    pub total_size: u32,
    pub entry_count: u32,
    /// Format version tag, for example `G354`
    pub version: [u8; 4],
}

/// New shape file header
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
pub struct NewFileHeader {
    pub signature: [u8; 4],
    pub total_size: u32,
    pub entry_count: u32,
    /// Size of this header plus the directory
    pub header_size: u32,
}

/// Old shape directory row
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq)]
pub struct OldDirectoryRow {
    pub tag: [u8; 4],
    pub offset: u32,
}

/// New shape directory row
#[derive(BinRead, BinWrite, Debug, Clone, PartialEq)]
pub struct NewDirectoryRow {
    pub offset: u32,
    /// Informational only, extents come from the neighbouring rows
    pub size: u32,
    pub tag: NullString,
}

pub const OLD_ENTRY_HEADER_SIZE: u64 = 16;
pub const NEW_ENTRY_HEADER_SIZE: u64 = 40;

pub const RECORD_TYPE_MASK: u8 = 0x7F;
pub const COMPRESSED_FLAG: u8 = 0x80;

pub const OLD_FLAG_RESERVED: u8 = 0x1;
pub const OLD_FLAG_SWIZZLED: u8 = 0x2;
pub const OLD_FLAG_TRANSPOSED: u8 = 0x4;
pub const OLD_FLAG_PALETTE_SWIZZLED: u8 = 0x8;

pub const NEW_FLAG_SWIZZLED: u32 = 0x1;
pub const NEW_FLAG_TRANSPOSED: u32 = 0x2;
pub const NEW_FLAG_RESERVED: u32 = 0x4;
pub const NEW_PALETTE_SWIZZLED: u32 = 0x8000_0000;

/// Split a packed 16 bit field into its low 12 bits and high nibble
pub const fn unpack_12_4(packed: u16) -> (u16, u8) {
    (packed & 0x0FFF, (packed >> 12) as u8)
}

/// Old shape entry header
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq, Default)]
pub struct OldEntryHeader {
    /// Image type in the low 7 bits, compression flag in bit 7
    pub record_type: u8,
    /// Offset from this header to the first attachment, 0 when none follow
    #[br(parse_with = read_u24)]
    #[bw(write_with = write_u24)]
    pub block_size: u32,
    pub width: u16,
    pub height: u16,
    pub center_x: u16,
    pub center_y: u16,
    /// Default x in the low 12 bits, flags in the high nibble
    pub default_x_packed: u16,
    /// Default y in the low 12 bits, mipmap count in the high nibble
    pub default_y_packed: u16,
}

impl OldEntryHeader {
    pub const fn default_x(&self) -> u16 {
        unpack_12_4(self.default_x_packed).0
    }

    pub const fn flags(&self) -> u8 {
        unpack_12_4(self.default_x_packed).1
    }

    pub const fn default_y(&self) -> u16 {
        unpack_12_4(self.default_y_packed).0
    }

    pub const fn mipmap_count(&self) -> u8 {
        unpack_12_4(self.default_y_packed).1
    }
}

/// New shape entry header
#[derive(BinRead, BinWrite, Debug, Copy, Clone, PartialEq, Default)]
pub struct NewEntryHeader {
    pub record_type: u8,
    #[br(parse_with = read_u24)]
    #[bw(write_with = write_u24)]
    pub flags: u32,
    pub block_size: u32,
    pub data_offset: u32,
    pub data_size: u32,
    pub width: u16,
    pub height: u16,
    pub center_x: u32,
    pub center_y: u32,
    pub default_x: u32,
    pub default_y: u32,
    pub mipmap_count: u32,
}

/// Entry header in either layout
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum EntryHeader {
    Old(OldEntryHeader),
    New(NewEntryHeader),
}

impl EntryHeader {
    pub const fn size(&self) -> u64 {
        match self {
            EntryHeader::Old(_) => OLD_ENTRY_HEADER_SIZE,
            EntryHeader::New(_) => NEW_ENTRY_HEADER_SIZE,
        }
    }

    /// Stored record type including the compression bit
    pub const fn record_type_raw(&self) -> u8 {
        match self {
            EntryHeader::Old(h) => h.record_type,
            EntryHeader::New(h) => h.record_type,
        }
    }

    /// Image type code with the compression bit cleared
    pub const fn record_type(&self) -> u8 {
        self.record_type_raw() & RECORD_TYPE_MASK
    }

    pub const fn block_size(&self) -> u32 {
        match self {
            EntryHeader::Old(h) => h.block_size,
            EntryHeader::New(h) => h.block_size,
        }
    }

    pub const fn width(&self) -> u16 {
        match self {
            EntryHeader::Old(h) => h.width,
            EntryHeader::New(h) => h.width,
        }
    }

    pub const fn height(&self) -> u16 {
        match self {
            EntryHeader::Old(h) => h.height,
            EntryHeader::New(h) => h.height,
        }
    }

    pub const fn center(&self) -> (u32, u32) {
        match self {
            EntryHeader::Old(h) => (h.center_x as u32, h.center_y as u32),
            EntryHeader::New(h) => (h.center_x, h.center_y),
        }
    }

    pub const fn default_position(&self) -> (u32, u32) {
        match self {
            EntryHeader::Old(h) => (h.default_x() as u32, h.default_y() as u32),
            EntryHeader::New(h) => (h.default_x & 0x7FFF_FFFF, h.default_y),
        }
    }

    pub const fn mipmap_count(&self) -> u32 {
        match self {
            EntryHeader::Old(h) => h.mipmap_count() as u32,
            EntryHeader::New(h) => h.mipmap_count,
        }
    }

    pub const fn flags(&self) -> EntryFlags {
        match self {
            EntryHeader::Old(h) => EntryFlags {
                compressed: h.record_type & COMPRESSED_FLAG != 0,
                swizzled: h.flags() & OLD_FLAG_SWIZZLED != 0,
                transposed: h.flags() & OLD_FLAG_TRANSPOSED != 0,
                reserved: h.flags() & OLD_FLAG_RESERVED != 0,
            },
            EntryHeader::New(h) => EntryFlags {
                compressed: h.record_type & COMPRESSED_FLAG != 0,
                swizzled: h.flags & NEW_FLAG_SWIZZLED != 0,
                transposed: h.flags & NEW_FLAG_TRANSPOSED != 0,
                reserved: h.flags & NEW_FLAG_RESERVED != 0,
            },
        }
    }

    /// Platform palette swizzle indicator, meaningful on palette records
    pub const fn palette_swizzled(&self) -> bool {
        match self {
            EntryHeader::Old(h) => h.flags() & OLD_FLAG_PALETTE_SWIZZLED != 0,
            EntryHeader::New(h) => h.default_x & NEW_PALETTE_SWIZZLED != 0,
        }
    }
}

/// Flags decoded from an entry header
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct EntryFlags {
    pub compressed: bool,
    pub swizzled: bool,
    pub transposed: bool,
    pub reserved: bool,
}
