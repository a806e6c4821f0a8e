use eagfx_codec::error::Result;
use eagfx_codec::{
    block, gamecube, indexed, refpack, BlockFormat, ByteOrder, IndexFormat, PixelFormat,
    SwizzlePlatform,
};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

fn checker(width: u32, height: u32) -> Vec<u8> {
    (0..width * height)
        .flat_map(|i| {
            let (x, y) = (i % width, i / width);
            if (x / 4 + y / 4) % 2 == 0 {
                [0xFF, 0xFF, 0xFF, 0xFF]
            } else {
                [0x00, 0x00, 0x00, 0xFF]
            }
        })
        .collect()
}

#[traced_test]
#[test]
fn swizzles_are_reversible() -> Result<()> {
    let data: Vec<u8> = (0..32 * 32 * 4).map(|i| (i * 31 % 251) as u8).collect();

    for platform in [
        SwizzlePlatform::Morton,
        SwizzlePlatform::Psp,
        SwizzlePlatform::Ps2,
        SwizzlePlatform::GameCube,
    ] {
        for bpp in [8, 32] {
            let len = 32 * 32 * bpp as usize / 8;
            let tiled = platform.swizzle(&data[..len], 32, 32, bpp)?;
            assert_eq!(tiled.len(), len);
            assert_eq!(platform.unswizzle(&tiled, 32, 32, bpp)?, &data[..len], "{platform:?} {bpp}");
        }
    }
    Ok(())
}

#[test]
fn dxt_keeps_flat_blocks_exact() -> Result<()> {
    let rgba = checker(16, 16);
    for format in [BlockFormat::Dxt1, BlockFormat::Dxt3, BlockFormat::Dxt5] {
        let packed = block::encode_block_compressed(&rgba, 16, 16, format)?;
        assert_eq!(packed.len(), format.compressed_size(16, 16));
        assert_eq!(block::decode_block_compressed(&packed, 16, 16, format)?, rgba);
    }
    Ok(())
}

#[test]
fn cmpr_keeps_flat_blocks_exact() -> Result<()> {
    let rgba = checker(16, 16);
    let packed = gamecube::encode_cmpr(&rgba, 16, 16)?;
    assert_eq!(packed.len(), gamecube::cmpr_size(16, 16));
    assert_eq!(gamecube::decode_cmpr(&packed, 16, 16)?, rgba);
    Ok(())
}

#[test]
fn indexed_with_few_colours_is_exact() -> Result<()> {
    let rgba = checker(8, 8);
    let image = indexed::encode_indexed(
        &rgba,
        8,
        8,
        IndexFormat::I4,
        PixelFormat::Argb1555,
        ByteOrder::Big,
        None,
        16,
    )?;
    assert_eq!(image.indices.len(), 32);
    assert_eq!(image.palette.len(), 32);

    let decoded = indexed::decode_indexed(
        &image.indices,
        &image.palette,
        8,
        8,
        IndexFormat::I4,
        PixelFormat::Argb1555,
        ByteOrder::Big,
    )?;
    assert_eq!(decoded, rgba);
    Ok(())
}

#[test]
fn refpack_handles_long_repeats() -> Result<()> {
    let mut data = Vec::new();
    for i in 0..64u32 {
        data.extend_from_slice(b"shape archive ");
        data.extend_from_slice(&i.to_le_bytes());
        data.extend(std::iter::repeat(0xCD).take(1500));
    }

    let packed = refpack::compress(&data);
    assert!(refpack::is_refpack(&packed));
    assert!(packed.len() < data.len() / 10);
    assert_eq!(refpack::decompressed_size(&packed)?, data.len());
    assert_eq!(refpack::decompress(&packed)?, data);
    Ok(())
}
