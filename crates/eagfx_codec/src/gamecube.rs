//! GameCube CMPR, DXT1 blocks arranged in 8x8 tiles with big endian colour
//! words and reversed index order.

use tracing::instrument;

use crate::block::{decode_block_compressed, encode_block_compressed, BlockFormat};
use crate::error::{ensure_dimensions, ensure_len, Result};

const BLOCK: usize = 8;

/// Size in bytes of a CMPR image, padded to whole 8x8 tiles
pub const fn cmpr_size(width: u32, height: u32) -> usize {
    let tiles_w = (width as usize + 7) / 8;
    let tiles_h = (height as usize + 7) / 8;
    tiles_w * tiles_h * 4 * BLOCK
}

fn reverse_indices(byte: u8) -> u8 {
    (byte >> 6) | ((byte >> 2) & 0x0C) | ((byte << 2) & 0x30) | (byte << 6)
}

/// Swap between CMPR and DXT1 block encodings, the operation is an involution
fn convert_block(src: &[u8], dst: &mut [u8]) {
    dst[0] = src[1];
    dst[1] = src[0];
    dst[2] = src[3];
    dst[3] = src[2];
    for i in 4..BLOCK {
        dst[i] = reverse_indices(src[i]);
    }
}

/// Visit every (tiled offset, linear offset) pair of blocks that falls inside the image
fn for_each_block(width: u32, height: u32, mut visit: impl FnMut(usize, usize)) {
    let (blocks_w, blocks_h) = BlockFormat::blocks(width, height);
    let (blocks_w, blocks_h) = (blocks_w as usize, blocks_h as usize);
    let tiles_w = (width as usize + 7) / 8;
    let tiles_h = (height as usize + 7) / 8;

    let mut tiled = 0;
    for ty in 0..tiles_h {
        for tx in 0..tiles_w {
            for sub in 0..4 {
                let bx = tx * 2 + sub % 2;
                let by = ty * 2 + sub / 2;
                if bx < blocks_w && by < blocks_h {
                    visit(tiled, (by * blocks_w + bx) * BLOCK);
                }
                tiled += BLOCK;
            }
        }
    }
}

/// Decode a CMPR image into RGBA8888
#[instrument(skip(data), err)]
pub fn decode_cmpr(data: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    ensure_dimensions(width, height)?;
    ensure_len(data, cmpr_size(width, height))?;

    let mut linear = vec![0u8; BlockFormat::Dxt1.compressed_size(width, height)];
    for_each_block(width, height, |tiled, lin| {
        convert_block(&data[tiled..tiled + BLOCK], &mut linear[lin..lin + BLOCK]);
    });
    decode_block_compressed(&linear, width, height, BlockFormat::Dxt1)
}

/// Encode an RGBA8888 image into CMPR
#[instrument(skip(rgba), err)]
pub fn encode_cmpr(rgba: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let linear = encode_block_compressed(rgba, width, height, BlockFormat::Dxt1)?;

    let mut tiled = vec![0u8; cmpr_size(width, height)];
    for_each_block(width, height, |t, lin| {
        convert_block(&linear[lin..lin + BLOCK], &mut tiled[t..t + BLOCK]);
    });
    Ok(tiled)
}
