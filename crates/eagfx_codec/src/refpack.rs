//! RefPack, the LZ77 variant used to compress whole containers and single
//! image records.
//!
//! A stream starts with a two byte magic (`0x10 0xFB` family) followed by the
//! big endian decompressed size, then a run of commands that each carry up to
//! three literal bytes followed by a back reference, or a literal block.

use std::collections::HashMap;

use byteorder::{BigEndian, ByteOrder as _};
use tracing::{debug, instrument};

use crate::error::{Error, Result};

const MAX_OFFSET: usize = 131_072;
const MAX_COPY: usize = 1028;
const MAX_LITERAL_BLOCK: usize = 112;
const CHAIN_DEPTH: usize = 32;
/// Upper bound on the pre-allocated output, as a multiple of the input
const MAX_RATIO: usize = 16;

/// Whether `data` starts with a RefPack header
pub fn is_refpack(data: &[u8]) -> bool {
    data.len() >= 5 && data[1] == 0xFB && data[0] & 0x3E == 0x10
}

fn byte(data: &[u8], pos: usize) -> Result<usize> {
    data.get(pos)
        .map(|b| *b as usize)
        .ok_or_else(|| Error::InvalidRefPack(format!("command truncated at {pos}")))
}

/// Decompressed size declared in the header of a RefPack stream
pub fn decompressed_size(data: &[u8]) -> Result<usize> {
    header(data).map(|(size, _)| size)
}

fn header(data: &[u8]) -> Result<(usize, usize)> {
    if !is_refpack(data) {
        return Err(Error::InvalidRefPack("missing header".into()));
    }
    let size_len = if data[0] & 0x80 != 0 { 4 } else { 3 };
    let mut pos = 2;
    if data[0] & 0x01 != 0 {
        pos += size_len;
    }
    if pos + size_len > data.len() {
        return Err(Error::InvalidRefPack("header truncated".into()));
    }
    let size = BigEndian::read_uint(&data[pos..pos + size_len], size_len) as usize;
    Ok((size, pos + size_len))
}

/// Decompress a RefPack stream
#[instrument(skip(data), fields(size = data.len()), err)]
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let (size, mut pos) = header(data)?;
    // the declared size is untrusted, grow past this if the stream needs it
    let mut out: Vec<u8> = Vec::with_capacity(size.min(data.len().saturating_mul(MAX_RATIO)));

    while pos < data.len() {
        let b0 = byte(data, pos)?;
        let mut stop = false;
        let (literal, copy, offset, consumed) = if b0 < 0x80 {
            let b1 = byte(data, pos + 1)?;
            (b0 & 3, ((b0 & 0x1C) >> 2) + 3, ((b0 & 0x60) << 3) + b1 + 1, 2)
        } else if b0 < 0xC0 {
            let b1 = byte(data, pos + 1)?;
            let b2 = byte(data, pos + 2)?;
            (b1 >> 6, (b0 & 0x3F) + 4, ((b1 & 0x3F) << 8) + b2 + 1, 3)
        } else if b0 < 0xE0 {
            let b1 = byte(data, pos + 1)?;
            let b2 = byte(data, pos + 2)?;
            let b3 = byte(data, pos + 3)?;
            (
                b0 & 3,
                ((b0 & 0x0C) << 6) + b3 + 5,
                ((b0 & 0x10) << 12) + (b1 << 8) + b2 + 1,
                4,
            )
        } else if b0 < 0xFC {
            (((b0 & 0x1F) << 2) + 4, 0, 0, 1)
        } else {
            stop = true;
            (b0 & 3, 0, 0, 1)
        };
        pos += consumed;

        let literals = data
            .get(pos..pos + literal)
            .ok_or_else(|| Error::InvalidRefPack(format!("literals truncated at {pos}")))?;
        out.extend_from_slice(literals);
        pos += literal;

        if copy > 0 {
            if offset > out.len() {
                return Err(Error::InvalidRefPack(format!(
                    "back reference {offset} past start of output ({})",
                    out.len()
                )));
            }
            let start = out.len() - offset;
            for i in 0..copy {
                let b = out[start + i];
                out.push(b);
            }
        }

        if stop {
            break;
        }
    }

    if out.len() != size {
        debug!(declared = size, actual = out.len(), "refpack size differs from header");
    }
    Ok(out)
}

fn flush_literals(out: &mut Vec<u8>, literals: &[u8]) -> usize {
    let mut rest = literals;
    while rest.len() > 3 {
        let take = (rest.len() & !3).min(MAX_LITERAL_BLOCK);
        out.push(0xE0 | ((take - 4) >> 2) as u8);
        out.extend_from_slice(&rest[..take]);
        rest = &rest[take..];
    }
    rest.len()
}

fn encodable(length: usize, offset: usize) -> bool {
    (offset <= 1024 && length >= 3)
        || (offset <= 16_384 && length >= 4)
        || (offset <= MAX_OFFSET && length >= 5)
}

fn push_copy(out: &mut Vec<u8>, literals: &[u8], length: usize, offset: usize) {
    let r = literals.len();
    let o = offset - 1;
    if offset <= 1024 && length <= 10 {
        out.push((((o >> 8) << 5) | ((length - 3) << 2) | r) as u8);
        out.push((o & 0xFF) as u8);
    } else if offset <= 16_384 && length <= 67 {
        out.push((0x80 | (length - 4)) as u8);
        out.push(((r << 6) | (o >> 8)) as u8);
        out.push((o & 0xFF) as u8);
    } else {
        let l = length - 5;
        out.push((0xC0 | ((o >> 16) << 4) | ((l >> 8) << 2) | r) as u8);
        out.push(((o >> 8) & 0xFF) as u8);
        out.push((o & 0xFF) as u8);
        out.push((l & 0xFF) as u8);
    }
    out.extend_from_slice(literals);
}

/// Compress `data` into a RefPack stream
#[instrument(skip(data), fields(size = data.len()))]
pub fn compress(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() / 2 + 16);
    if data.len() > 0xFF_FFFF {
        out.extend_from_slice(&[0x90, 0xFB]);
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    } else {
        out.extend_from_slice(&[0x10, 0xFB]);
        out.extend_from_slice(&(data.len() as u32).to_be_bytes()[1..]);
    }

    let mut chains: HashMap<[u8; 3], Vec<usize>> = HashMap::new();
    let mut pos = 0;
    let mut literal_start = 0;

    while pos + 3 <= data.len() {
        let key = [data[pos], data[pos + 1], data[pos + 2]];
        let limit = (data.len() - pos).min(MAX_COPY);

        let mut best = (0usize, 0usize);
        if let Some(chain) = chains.get(&key) {
            for &candidate in chain.iter().rev().take(CHAIN_DEPTH) {
                let offset = pos - candidate;
                if offset > MAX_OFFSET {
                    break;
                }
                let length = (0..limit)
                    .take_while(|&i| data[candidate + i] == data[pos + i])
                    .count();
                if length > best.0 && encodable(length, offset) {
                    best = (length, offset);
                }
            }
        }

        let (length, offset) = best;
        if length == 0 {
            chains.entry(key).or_default().push(pos);
            pos += 1;
            continue;
        }

        let carried = flush_literals(&mut out, &data[literal_start..pos]);
        push_copy(&mut out, &data[pos - carried..pos], length, offset);

        for p in pos..(pos + length).min(data.len().saturating_sub(2)) {
            chains
                .entry([data[p], data[p + 1], data[p + 2]])
                .or_default()
                .push(p);
        }
        pos += length;
        literal_start = pos;
    }

    let carried = flush_literals(&mut out, &data[literal_start..]);
    out.push(0xFC | carried as u8);
    out.extend_from_slice(&data[data.len() - carried..]);
    out
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::error::Result;
    use crate::refpack::{compress, decompress, decompressed_size, is_refpack};

    #[test]
    fn decompress_short_copy() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            0x10, 0xFB, 0x00, 0x00, 0x09,
            0x0F, 0x02, b'a', b'b', b'c',
            0xFC,
        ];
        assert!(is_refpack(&input));
        assert_eq!(decompressed_size(&input)?, 9);
        assert_eq!(decompress(&input)?, b"abcabcabc".to_vec());
        Ok(())
    }

    #[test]
    fn decompress_literal_block() -> Result<()> {
        #[rustfmt::skip]
        let input = [
            0x10, 0xFB, 0x00, 0x00, 0x05,
            0xE0, b'h', b'e', b'l', b'l',
            0xFD, b'o',
        ];
        assert_eq!(decompress(&input)?, b"hello".to_vec());
        Ok(())
    }

    #[test]
    fn rejects_reference_before_start() {
        let input = [0x10, 0xFB, 0x00, 0x00, 0x03, 0x00, 0x05, 0xFC];
        assert!(decompress(&input).is_err());
    }

    #[test]
    fn declared_size_does_not_drive_allocation() -> Result<()> {
        // four byte size field claiming 4 GiB, then an empty stop command
        let input = [0x90, 0xFB, 0xFF, 0xFF, 0xFF, 0xFF, 0xFC];
        assert_eq!(decompressed_size(&input)?, 0xFFFF_FFFF);
        let out = decompress(&input)?;
        assert!(out.is_empty());
        assert!(out.capacity() <= input.len() * 16);
        Ok(())
    }

    #[test]
    fn compress_then_decompress() -> Result<()> {
        let mut data = b"The quick brown fox jumps over the lazy dog. ".repeat(40);
        data.extend((0..2000u32).map(|v| (v * 7 % 251) as u8));
        data.extend(std::iter::repeat(0xAB).take(3000));

        let packed = compress(&data);
        assert!(packed.len() < data.len());
        assert_eq!(decompress(&packed)?, data);
        Ok(())
    }

    #[test]
    fn compress_tiny_inputs() -> Result<()> {
        for data in [&b""[..], b"a", b"ab", b"abc", b"abcd"] {
            assert_eq!(decompress(&compress(data))?, data.to_vec());
        }
        Ok(())
    }
}
