mod common;

use std::io::{Cursor, Write};

use common::{ps2_clut, rgb_palette, Attachment, Entry, ShapeBuilder};
use eagfx_shape::attachment::AttachmentKind;
use eagfx_shape::error::{Error, Result};
use eagfx_shape::palette::PaletteSource;
use eagfx_shape::{CompressionMethod, ShapeArchive, ShapeVariant, Signature};
use flate2::{write::ZlibEncoder, Compression};
use pretty_assertions::assert_eq;
use tracing_test::traced_test;

fn indexed_ramp(width: usize, height: usize) -> Vec<u8> {
    (0..width * height).map(|i| i as u8).collect()
}

#[traced_test]
#[test]
fn ps2_indexed_entry_decodes_to_rgba() -> Result<()> {
    let data = ShapeBuilder::new(b"SHPS")
        .entry(Entry::new("img0", 2, 64, 64, indexed_ramp(64, 64)))
        .build()?;

    let shape = ShapeArchive::from_bytes(data)?;
    assert_eq!(shape.signature(), Signature::Shps);
    assert_eq!(shape.variant(), ShapeVariant::Old);
    assert_eq!(shape.len(), 1);

    let entry = shape.by_index(0)?;
    assert_eq!(entry.record_type(), 2);
    assert_eq!((entry.width(), entry.height()), (64, 64));
    assert_eq!(entry.raw_data.len(), 64 * 64);

    let rgba = shape.decode_entry(0)?;
    assert_eq!(rgba.len(), 64 * 64 * 4);
    // no palette anywhere, so the grey ramp is used
    assert_eq!(&rgba[4 * 7..4 * 8], &[7, 7, 7, 0xFF]);
    assert!(logs_contain("no palette found"));
    Ok(())
}

#[test]
fn short_input_is_empty() {
    for data in [vec![], vec![b'S'], vec![b'S', b'H', b'P']] {
        assert!(matches!(ShapeArchive::from_bytes(data), Err(Error::EmptyInput)));
    }
}

#[test]
fn unknown_signature_is_rejected() {
    let result = ShapeArchive::from_bytes(b"RIFF\x10\x00\x00\x00\x00\x00\x00\x00G354".to_vec());
    assert!(matches!(
        result,
        Err(Error::UnsupportedSignature(sig)) if &sig == b"RIFF"
    ));
}

#[test]
fn mismatched_size_is_rejected() -> Result<()> {
    let data = ShapeBuilder::new(b"SHPI")
        .entry(Entry::new("a", 123, 4, 4, vec![0; 16]))
        .declared_size(4096)
        .build()?;
    let actual = data.len() as u64;

    match ShapeArchive::from_bytes(data) {
        Err(Error::SizeMismatch {
            declared_le,
            actual: seen,
            ..
        }) => {
            assert_eq!(declared_le, 4096);
            assert_eq!(seen, actual);
        }
        other => panic!("expected a size mismatch, got {other:?}"),
    }
    Ok(())
}

#[traced_test]
#[test]
fn checksum_trailer_allows_size_mismatch() -> Result<()> {
    let data = ShapeBuilder::new(b"SHPI")
        .entry(Entry::new("a", 123, 4, 4, vec![0; 16]))
        .checksum_trailer()
        .build()?;
    let actual = data.len() as u64;

    let shape = ShapeArchive::from_bytes(data)?;
    assert_eq!(shape.declared_size() as u64, actual - 12);
    assert_eq!(shape.total_size(), actual - 12);
    // the trailer is not part of the last entry
    assert_eq!(shape.by_index(0)?.raw_data.len(), 16);
    assert!(logs_contain("checksum trailer"));
    Ok(())
}

#[test]
fn big_endian_shape() -> Result<()> {
    #[rustfmt::skip]
    let payload = vec![
        0xFC, 0x00, 0x00, 0x00,
        0x83, 0xE0, 0xFF, 0xFF,
    ];
    let data = ShapeBuilder::new(b"SHPG")
        .entry(Entry::new("gc", 89, 2, 2, payload))
        .build()?;

    let shape = ShapeArchive::from_bytes(data)?;
    assert_eq!(shape.signature(), Signature::Shpg);
    let entry = shape.by_index(0)?;
    assert_eq!((entry.width(), entry.height()), (2, 2));

    let rgba = shape.decode_entry(0)?;
    assert_eq!(rgba.len(), 16);
    // RGB5A3 opaque red, then A3 RGB444 transparent black
    assert_eq!(&rgba[..4], &[0xFF, 0, 0, 0xFF]);
    assert_eq!(rgba[7], 0);
    Ok(())
}

#[traced_test]
#[test]
fn unknown_attachment_does_not_stop_parsing() -> Result<()> {
    let data = ShapeBuilder::new(b"SHPI")
        .entry(
            Entry::new("logo", 123, 4, 4, indexed_ramp(4, 4))
                .with_attachment(Attachment::comment("hello"))
                .with_attachment(Attachment::unknown(0x50, &[1, 2, 3, 4]))
                .with_attachment(Attachment::image_name("logo_large")),
        )
        .entry(Entry::new("next", 123, 2, 2, vec![9; 4]))
        .build()?;

    let shape = ShapeArchive::from_bytes(data)?;
    let entry = shape.by_index(0)?;
    let kinds: Vec<&str> = entry.attachments.iter().map(|a| a.tag()).collect();
    assert_eq!(kinds.len(), 3);
    assert!(matches!(entry.attachments[0].kind, AttachmentKind::Comment { length: 5 }));
    assert_eq!(entry.attachments[1].kind, AttachmentKind::Unknown);
    assert_eq!(entry.attachments[1].data, vec![1, 2, 3, 4]);
    assert_eq!(entry.comment().as_deref(), Some("hello"));
    assert_eq!(entry.image_name().as_deref(), Some("logo_large"));
    assert!(logs_contain("unknown attachment record type 80"));

    // the entry after it is untouched
    assert_eq!(shape.by_tag("next")?.raw_data, vec![9; 4]);
    Ok(())
}

#[test]
fn zero_block_size_has_no_attachments() -> Result<()> {
    let data = ShapeBuilder::new(b"SHPI")
        .entry(
            Entry::new("a", 123, 4, 4, indexed_ramp(4, 4))
                .with_attachment(Attachment::comment("ignored"))
                .unchained(),
        )
        .build()?;

    let shape = ShapeArchive::from_bytes(data)?;
    let entry = shape.by_index(0)?;
    assert!(!entry.next_record_exists);
    assert!(entry.attachments.is_empty());
    // everything up to the end belongs to the image
    assert_eq!(entry.raw_data.len() as u64, entry.end_offset - entry.raw_data_offset);
    Ok(())
}

#[test]
fn entry_extents_cover_the_file() -> Result<()> {
    let data = ShapeBuilder::new(b"SHPI")
        .entry(
            Entry::new("a", 123, 4, 4, indexed_ramp(4, 4))
                .with_attachment(Attachment::comment("first")),
        )
        .entry(Entry::new("b", 120, 4, 2, vec![0x11; 16]))
        .entry(
            Entry::new("c", 125, 2, 2, vec![0x22; 16])
                .with_attachment(Attachment::image_name("c")),
        )
        .build()?;
    let size = data.len() as u64;

    let shape = ShapeArchive::from_bytes(data)?;
    let mut covered = 0;
    for entry in shape.entries() {
        assert!(entry.start_offset <= entry.end_offset);
        assert!(entry.raw_data_offset + entry.raw_data.len() as u64 <= entry.end_offset);
        for attachment in &entry.attachments {
            assert!(attachment.start_offset >= entry.image_end_offset);
            assert!(attachment.end_offset <= entry.end_offset);
        }
        covered += entry.end_offset - entry.start_offset;
    }
    assert_eq!(covered, size - shape.by_index(0)?.start_offset);
    assert_eq!(shape.by_index(2)?.end_offset, size);
    Ok(())
}

#[test]
fn tags_resolve_to_the_first_entry() -> Result<()> {
    let data = ShapeBuilder::new(b"SHPI")
        .entry(Entry::new("dup", 123, 2, 2, vec![1; 4]))
        .entry(Entry::new("dup", 123, 2, 2, vec![2; 4]))
        .entry(Entry::new("solo", 123, 2, 2, vec![3; 4]))
        .build()?;

    let shape = ShapeArchive::from_bytes(data)?;
    assert_eq!(shape.tags().collect::<Vec<_>>(), vec!["dup", "dup", "solo"]);
    assert_eq!(shape.index_for_tag("dup"), Some(0));
    assert_eq!(shape.by_tag("solo")?.raw_data, vec![3; 4]);
    assert!(matches!(shape.by_tag("none"), Err(Error::EntryNotFound(_))));
    assert!(matches!(shape.by_index(3), Err(Error::EntryNotFound(_))));
    Ok(())
}

#[traced_test]
#[test]
fn attached_palette_is_preferred() -> Result<()> {
    let palette = rgb_palette(256);
    let data = ShapeBuilder::new(b"SHPI")
        .entry(Entry::new("!pal", 34, 256, 1, rgb_palette(256).into_iter().rev().collect()))
        .entry(
            Entry::new("img", 123, 4, 4, indexed_ramp(4, 4)).with_attachment(Attachment::palette(
                ShapeVariant::Old,
                34,
                256,
                &palette,
            )),
        )
        .entry(Entry::new("bare", 123, 2, 2, vec![1; 4]))
        .build()?;

    let shape = ShapeArchive::from_bytes(data)?;
    let attached = shape.resolve_palette(1)?;
    assert_eq!(
        attached.source,
        PaletteSource::Attachment {
            entry: 1,
            attachment: 0
        }
    );
    assert_eq!(attached.data, palette);

    let sibling = shape.resolve_palette(2)?;
    assert_eq!(sibling.source, PaletteSource::Sibling { entry: 0 });

    let rgba = shape.decode_entry(1)?;
    assert_eq!(&rgba[4..8], &[palette[3], palette[4], palette[5], 0xFF]);
    Ok(())
}

#[test]
fn new_shape_layout() -> Result<()> {
    #[rustfmt::skip]
    let payload = vec![
        // ARGB8888 words, little endian
        0x30, 0x20, 0x10, 0xFF,
        0x00, 0x00, 0xFF, 0x80,
    ];
    let data = ShapeBuilder::new(b"ShpF")
        .entry(
            Entry::new("texture_one", 125, 2, 1, payload)
                .with_attachment(Attachment::comment("made by hand")),
        )
        .build()?;

    let shape = ShapeArchive::from_bytes(data)?;
    assert_eq!(shape.variant(), ShapeVariant::New);
    let entry = shape.by_tag("texture_one")?;
    assert_eq!(entry.header.size(), 40);
    assert_eq!(entry.declared_size, Some(8));
    assert_eq!(entry.comment().as_deref(), Some("made by hand"));

    let rgba = shape.decode_entry(0)?;
    assert_eq!(rgba, vec![0x10, 0x20, 0x30, 0xFF, 0xFF, 0x00, 0x00, 0x80]);
    Ok(())
}

#[test]
fn compressed_files_open_transparently() -> Result<()> {
    let plain = ShapeBuilder::new(b"SHPI")
        .entry(Entry::new("a", 123, 8, 8, indexed_ramp(8, 8)))
        .entry(Entry::new("b", 123, 8, 8, vec![0; 64]))
        .build()?;
    let expected = ShapeArchive::from_bytes(plain.clone())?;

    let refpacked = eagfx_codec::refpack::compress(&plain);
    let shape = ShapeArchive::from_bytes(refpacked)?;
    assert_eq!(shape.compression(), CompressionMethod::RefPack);
    assert_eq!(shape.source(), plain.as_slice());
    assert_eq!(shape.entries(), expected.entries());

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&plain)?;
    let shape = ShapeArchive::new(Cursor::new(encoder.finish()?))?;
    assert_eq!(shape.compression(), CompressionMethod::Zlib);
    assert_eq!(shape.entries(), expected.entries());
    Ok(())
}

#[test]
fn summary_lists_entries() -> Result<()> {
    let data = ShapeBuilder::new(b"SHPI")
        .entry(
            Entry::new("a", 123, 4, 4, indexed_ramp(4, 4))
                .with_mipmaps(1)
                .with_attachment(Attachment::comment("note")),
        )
        .build()?;

    let summary = ShapeArchive::from_bytes(data)?.summary();
    assert_eq!(summary.signature, "SHPI");
    assert_eq!(summary.version.as_deref(), Some("G354"));
    assert_eq!(summary.entries.len(), 1);
    assert_eq!(summary.entries[0].mipmaps, 1);
    assert_eq!(summary.entries[0].format, "8-bit indexed");
    assert_eq!(summary.entries[0].attachments[0].text.as_deref(), Some("note"));
    Ok(())
}

#[test]
fn swizzled_ps2_palette_is_read_in_clut_order() -> Result<()> {
    let data = ShapeBuilder::new(b"SHPS")
        .entry(
            Entry::new("clut", 2, 16, 16, indexed_ramp(16, 16)).with_attachment(
                Attachment::palette(ShapeVariant::Old, 33, 256, &ps2_clut())
                    .swizzled(ShapeVariant::Old),
            ),
        )
        .build()?;
    let shape = ShapeArchive::from_bytes(data)?;

    let palette = shape.resolve_palette(0)?;
    assert!(palette.swizzled);
    assert_eq!(palette.data, ps2_clut());
    assert_eq!(&palette.linear_data()[8 * 4..9 * 4], &[16, 0x40, 0x20, 0x80]);
    assert_eq!(shape.resolve_palette(0)?, palette);

    let rgba = shape.decode_entry(0)?;
    let pixel = |i: usize| &rgba[i * 4..i * 4 + 4];
    assert_eq!(pixel(0), &[0, 0x40, 0x20, 0xFF]);
    assert_eq!(pixel(8), &[16, 0x40, 0x20, 0xFF]);
    assert_eq!(pixel(16), &[8, 0x40, 0x20, 0xFF]);
    assert_eq!(pixel(40), &[48, 0x40, 0x20, 0xFF]);
    Ok(())
}

#[test]
fn swizzle_bit_only_applies_to_ps2_palettes() -> Result<()> {
    let palette = rgb_palette(256);
    let data = ShapeBuilder::new(b"SHPI")
        .entry(
            Entry::new("img", 123, 16, 16, indexed_ramp(16, 16)).with_attachment(
                Attachment::palette(ShapeVariant::Old, 34, 256, &palette)
                    .swizzled(ShapeVariant::Old),
            ),
        )
        .build()?;
    let shape = ShapeArchive::from_bytes(data)?;

    let resolved = shape.resolve_palette(0)?;
    assert!(!resolved.swizzled);
    assert_eq!(resolved.linear_data(), palette);

    let rgba = shape.decode_entry(0)?;
    assert_eq!(&rgba[8 * 4..9 * 4], &[palette[24], palette[25], palette[26], 0xFF]);
    Ok(())
}

#[test]
fn palette_resolution_is_stable() -> Result<()> {
    let data = ShapeBuilder::new(b"SHPI")
        .entry(Entry::new("!pal", 34, 256, 1, rgb_palette(256)))
        .entry(Entry::new("img", 123, 4, 4, indexed_ramp(4, 4)))
        .build()?;
    let shape = ShapeArchive::from_bytes(data)?;

    let first = shape.resolve_palette(1)?;
    assert_eq!(shape.resolve_palette(1)?, first);
    assert_eq!(shape.decode_entry(1)?, shape.decode_entry(1)?);
    Ok(())
}
