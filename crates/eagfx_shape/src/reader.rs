//! Endian aware reads over an in-memory shape.

use std::io::{Cursor, Seek, SeekFrom};

use binrw::{helpers::read_u24, BinRead, Endian};

use crate::error::{Error, Result};

/// Seekable view over the decompressed bytes of a shape file
pub(crate) struct ShapeReader<'a> {
    cursor: Cursor<&'a [u8]>,
    endian: Endian,
}

impl<'a> ShapeReader<'a> {
    pub fn new(data: &'a [u8], endian: Endian) -> Self {
        Self {
            cursor: Cursor::new(data),
            endian,
        }
    }

    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    pub fn seek(&mut self, offset: u64) -> Result<()> {
        self.cursor.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Read a structure in the current byte order
    pub fn read<T>(&mut self) -> Result<T>
    where
        T: for<'b> BinRead<Args<'b> = ()>,
    {
        Ok(T::read_options(&mut self.cursor, self.endian, ())?)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.read()
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.read()
    }

    pub fn read_u24(&mut self) -> Result<u32> {
        Ok(read_u24(&mut self.cursor, self.endian, ())?)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.read()
    }

    /// Look at the next byte without consuming it
    pub fn peek_u8(&self) -> Result<u8> {
        self.cursor
            .get_ref()
            .get(self.cursor.position() as usize)
            .copied()
            .ok_or_else(|| {
                Error::CustomError(format!("unexpected end of data at {}", self.position()))
            })
    }

    /// Borrow `len` bytes starting at `offset` without moving the cursor
    pub fn slice(&self, offset: u64, len: u64) -> Result<&'a [u8]> {
        let data: &'a [u8] = *self.cursor.get_ref();
        let start = offset as usize;
        let end = start.saturating_add(len as usize);
        data.get(start..end).ok_or_else(|| {
            Error::CustomError(format!(
                "range {start}..{end} is outside of the {} byte file",
                data.len()
            ))
        })
    }
}
