//! Types for writing shape archives
//!

use std::io::Write;

use bon::Builder;
use tracing::{debug, instrument};

use crate::compression::{self, CompressionMethod};
use crate::error::{Error, Result};
use crate::read::ShapeArchive;

/// Options for how the shape file should be written
#[derive(Debug, Clone, Copy, Default, Builder)]
pub struct SaveOptions {
    /// Whole file compression, the method the archive was opened with when unset
    pub compression: Option<CompressionMethod>,
}

/// Shape archive writer
///
/// Saving copies the file as it was opened and overwrites the payload of
/// every imported entry and replaced palette in place, so offsets and sizes
/// never change.
///
/// ```no_run
/// # fn doit() -> eagfx_shape::error::Result<()>
/// # {
/// use eagfx_shape::{ShapeArchive, ShapeWriter};
/// use eagfx_shape::write::SaveOptions;
///
/// let shape = ShapeArchive::new(std::fs::File::open("title.fsh")?)?;
///
/// let _bytes = ShapeWriter::new(Vec::new(), SaveOptions::builder()
///            .compression(eagfx_shape::CompressionMethod::None)
///            .build())
///     .write(&shape)?;
/// # Ok(())
/// # }
/// ```
pub struct ShapeWriter<W: Write> {
    inner: W,
    options: SaveOptions,
}

fn overwrite(buffer: &mut [u8], offset: u64, data: &[u8]) -> Result<()> {
    let start = offset as usize;
    let end = start + data.len();
    let len = buffer.len();
    buffer
        .get_mut(start..end)
        .ok_or_else(|| {
            Error::CustomError(format!("region {start}..{end} is outside of the {len} byte file"))
        })?
        .copy_from_slice(data);
    Ok(())
}

impl<W: Write> ShapeWriter<W> {
    pub fn new(inner: W, options: SaveOptions) -> ShapeWriter<W> {
        ShapeWriter { inner, options }
    }

    /// Decompressed file bytes with all imported regions applied
    pub fn render(archive: &ShapeArchive) -> Result<Vec<u8>> {
        let mut buffer = archive.source().to_vec();
        for entry in archive.entries() {
            if entry.imported {
                debug!(index = entry.index, offset = entry.raw_data_offset, "writing imported entry");
                overwrite(&mut buffer, entry.raw_data_offset, &entry.raw_data)?;
            }
            for attachment in entry.attachments.iter().filter(|a| a.replaced) {
                debug!(
                    index = entry.index,
                    attachment = attachment.index,
                    offset = attachment.data_offset(),
                    "writing replaced attachment"
                );
                overwrite(&mut buffer, attachment.data_offset(), &attachment.data)?;
            }
        }
        Ok(buffer)
    }

    /// Write the archive and return the inner writer
    #[instrument(skip_all, err)]
    pub fn write(mut self, archive: &ShapeArchive) -> Result<W> {
        let buffer = Self::render(archive)?;
        let method = self.options.compression.unwrap_or(archive.compression());
        self.inner
            .write_all(&compression::compress(&buffer, method)?)?;
        Ok(self.inner)
    }
}
