//! Builders for small shape files used across the integration tests and benches.
#![allow(dead_code)]

use binrw::Endian;
use byteorder::{BigEndian, LittleEndian, WriteBytesExt};
use eagfx_shape::error::Result;
use eagfx_shape::{ShapeVariant, Signature};

#[derive(Debug, Clone, Copy)]
pub enum Field {
    U16(u16),
    U32(u32),
}

fn put_u16(out: &mut Vec<u8>, value: u16, endian: Endian) -> Result<()> {
    match endian {
        Endian::Little => out.write_u16::<LittleEndian>(value)?,
        Endian::Big => out.write_u16::<BigEndian>(value)?,
    }
    Ok(())
}

fn put_u24(out: &mut Vec<u8>, value: u32, endian: Endian) -> Result<()> {
    match endian {
        Endian::Little => out.write_u24::<LittleEndian>(value)?,
        Endian::Big => out.write_u24::<BigEndian>(value)?,
    }
    Ok(())
}

fn put_u32(out: &mut Vec<u8>, value: u32, endian: Endian) -> Result<()> {
    match endian {
        Endian::Little => out.write_u32::<LittleEndian>(value)?,
        Endian::Big => out.write_u32::<BigEndian>(value)?,
    }
    Ok(())
}

/// Record following an entry's image data
#[derive(Debug, Clone)]
pub struct Attachment {
    pub record_type: u8,
    pub fields: Vec<Field>,
    pub payload: Vec<u8>,
}

impl Attachment {
    pub fn comment(text: &str) -> Self {
        let mut payload = text.as_bytes().to_vec();
        payload.push(0);
        Self {
            record_type: 111,
            fields: vec![Field::U32(text.len() as u32)],
            payload,
        }
    }

    pub fn image_name(name: &str) -> Self {
        let mut payload = name.as_bytes().to_vec();
        payload.push(0);
        Self {
            record_type: 112,
            fields: Vec::new(),
            payload,
        }
    }

    pub fn unknown(record_type: u8, payload: &[u8]) -> Self {
        Self {
            record_type,
            fields: Vec::new(),
            payload: payload.to_vec(),
        }
    }

    pub fn palette(variant: ShapeVariant, record_type: u8, entries: u16, data: &[u8]) -> Self {
        let fields = match variant {
            ShapeVariant::Old => vec![
                Field::U16(entries),
                Field::U16(1),
                Field::U16(entries),
                Field::U16(0),
                Field::U16(0),
                Field::U16(0),
            ],
            ShapeVariant::New => vec![
                Field::U16(entries),
                Field::U16(1),
                Field::U32(entries as u32),
                Field::U32(0),
                Field::U32(0),
            ],
        };
        Self {
            record_type,
            fields,
            payload: data.to_vec(),
        }
    }

    /// Set the high bit of a palette's default x field
    pub fn swizzled(mut self, variant: ShapeVariant) -> Self {
        match variant {
            ShapeVariant::Old => self.fields[4] = Field::U16(0x8000),
            ShapeVariant::New => self.fields[3] = Field::U32(0x8000_0000),
        }
        self
    }

    fn header_len(&self, variant: ShapeVariant) -> usize {
        let prefix = match variant {
            ShapeVariant::Old => 4,
            ShapeVariant::New => 8,
        };
        prefix
            + self
                .fields
                .iter()
                .map(|f| match f {
                    Field::U16(_) => 2,
                    Field::U32(_) => 4,
                })
                .sum::<usize>()
    }

    fn write(&self, out: &mut Vec<u8>, variant: ShapeVariant, endian: Endian, last: bool) -> Result<()> {
        let block = if last {
            0
        } else {
            (self.header_len(variant) + self.payload.len()) as u32
        };
        out.push(self.record_type);
        match variant {
            ShapeVariant::Old => put_u24(out, block, endian)?,
            ShapeVariant::New => {
                put_u24(out, 0, endian)?;
                put_u32(out, block, endian)?;
            }
        }
        for field in &self.fields {
            match *field {
                Field::U16(v) => put_u16(out, v, endian)?,
                Field::U32(v) => put_u32(out, v, endian)?,
            }
        }
        out.extend_from_slice(&self.payload);
        Ok(())
    }
}

/// One directory entry and the records stored at its offset
#[derive(Debug, Clone)]
pub struct Entry {
    pub tag: String,
    pub record_type: u8,
    pub width: u16,
    pub height: u16,
    /// Old shapes: the high nibble of default x. New shapes: the flag field.
    pub flags: u32,
    pub mipmaps: u8,
    pub payload: Vec<u8>,
    pub attachments: Vec<Attachment>,
    /// Write a zero block size even when attachments follow
    pub unchained: bool,
}

impl Entry {
    pub fn new(tag: &str, record_type: u8, width: u16, height: u16, payload: Vec<u8>) -> Self {
        Self {
            tag: tag.to_owned(),
            record_type,
            width,
            height,
            flags: 0,
            mipmaps: 0,
            payload,
            attachments: Vec::new(),
            unchained: false,
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_mipmaps(mut self, mipmaps: u8) -> Self {
        self.mipmaps = mipmaps;
        self
    }

    pub fn unchained(mut self) -> Self {
        self.unchained = true;
        self
    }

    fn write(&self, out: &mut Vec<u8>, variant: ShapeVariant, endian: Endian) -> Result<()> {
        let header_len = match variant {
            ShapeVariant::Old => 16,
            ShapeVariant::New => 40,
        };
        let block = if self.attachments.is_empty() || self.unchained {
            0
        } else {
            (header_len + self.payload.len()) as u32
        };

        out.push(self.record_type);
        match variant {
            ShapeVariant::Old => {
                put_u24(out, block, endian)?;
                put_u16(out, self.width, endian)?;
                put_u16(out, self.height, endian)?;
                put_u16(out, 0, endian)?;
                put_u16(out, 0, endian)?;
                put_u16(out, ((self.flags as u16) & 0xF) << 12, endian)?;
                put_u16(out, ((self.mipmaps as u16) & 0xF) << 12, endian)?;
            }
            ShapeVariant::New => {
                put_u24(out, self.flags, endian)?;
                put_u32(out, block, endian)?;
                put_u32(out, header_len as u32, endian)?;
                put_u32(out, self.payload.len() as u32, endian)?;
                put_u16(out, self.width, endian)?;
                put_u16(out, self.height, endian)?;
                put_u32(out, 0, endian)?;
                put_u32(out, 0, endian)?;
                put_u32(out, 0, endian)?;
                put_u32(out, 0, endian)?;
                put_u32(out, self.mipmaps as u32, endian)?;
            }
        }
        out.extend_from_slice(&self.payload);

        let count = self.attachments.len();
        for (i, attachment) in self.attachments.iter().enumerate() {
            attachment.write(out, variant, endian, i + 1 == count)?;
        }
        Ok(())
    }
}

/// Builds a complete shape file
#[derive(Debug, Clone)]
pub struct ShapeBuilder {
    pub signature: [u8; 4],
    pub entries: Vec<Entry>,
    /// Overrides the total size field
    pub declared_size: Option<u32>,
    /// Appends a `CKSM` trailer after the declared size
    pub checksum_trailer: bool,
}

impl ShapeBuilder {
    pub fn new(signature: &[u8; 4]) -> Self {
        Self {
            signature: *signature,
            entries: Vec::new(),
            declared_size: None,
            checksum_trailer: false,
        }
    }

    pub fn entry(mut self, entry: Entry) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn declared_size(mut self, size: u32) -> Self {
        self.declared_size = Some(size);
        self
    }

    pub fn checksum_trailer(mut self) -> Self {
        self.checksum_trailer = true;
        self
    }

    pub fn build(&self) -> Result<Vec<u8>> {
        let signature = Signature::from_bytes(self.signature)?;
        let variant = signature.variant();
        let orders = signature.byte_orders();

        let mut records = Vec::new();
        let mut offsets = Vec::new();
        let directory_len: usize = match variant {
            ShapeVariant::Old => 8 * self.entries.len(),
            ShapeVariant::New => self.entries.iter().map(|e| 9 + e.tag.len()).sum(),
        };
        let base = 16 + directory_len;
        for entry in &self.entries {
            offsets.push((base + records.len()) as u32);
            entry.write(&mut records, variant, orders.data)?;
        }

        let body_len = base + records.len();
        let declared = self.declared_size.unwrap_or(body_len as u32);

        let mut out = Vec::with_capacity(body_len + 12);
        out.extend_from_slice(&self.signature);
        put_u32(&mut out, declared, orders.header)?;
        put_u32(&mut out, self.entries.len() as u32, orders.header)?;
        match variant {
            ShapeVariant::Old => out.extend_from_slice(b"G354"),
            ShapeVariant::New => put_u32(&mut out, base as u32, orders.header)?,
        }

        for (entry, offset) in self.entries.iter().zip(&offsets) {
            match variant {
                ShapeVariant::Old => {
                    let mut tag = [0u8; 4];
                    for (dst, src) in tag.iter_mut().zip(entry.tag.bytes()) {
                        *dst = src;
                    }
                    out.extend_from_slice(&tag);
                    put_u32(&mut out, *offset, orders.directory)?;
                }
                ShapeVariant::New => {
                    put_u32(&mut out, *offset, orders.directory)?;
                    put_u32(&mut out, entry.payload.len() as u32, orders.directory)?;
                    out.extend_from_slice(entry.tag.as_bytes());
                    out.push(0);
                }
            }
        }
        out.extend_from_slice(&records);

        if self.checksum_trailer {
            out.extend_from_slice(b"CKSM");
            out.extend_from_slice(&[0xAB; 8]);
        }
        Ok(out)
    }
}

/// `count` RGB888 palette entries, all distinct
pub fn rgb_palette(count: usize) -> Vec<u8> {
    (0..count)
        .flat_map(|i| [i as u8, 255 - i as u8, (i / 2) as u8 ^ 0x55])
        .collect()
}

/// 256 entry PS2 RGBA palette whose stored slot `s` has red `s` and half alpha
pub fn ps2_clut() -> Vec<u8> {
    (0..=255u8).flat_map(|s| [s, 0x40, 0x20, 0x80]).collect()
}
