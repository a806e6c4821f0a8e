use clap::{Args, ValueEnum};
use eagfx_shape::{CompressionMethod, EncodeOptions, SaveOptions, ShapeWriter};
use miette::{miette, Context, IntoDiagnostic, Result};
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Compression {
    None,
    Refpack,
    Zlib,
}

impl From<Compression> for CompressionMethod {
    fn from(value: Compression) -> Self {
        match value {
            Compression::None => CompressionMethod::None,
            Compression::Refpack => CompressionMethod::RefPack,
            Compression::Zlib => CompressionMethod::Zlib,
        }
    }
}

#[derive(Args)]
pub struct ImportArgs {
    /// An input shape file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Tag or index of the entry to replace
    #[arg(short, long)]
    entry: String,

    /// PNG with the new image, it must match the entry's dimensions
    #[arg(short, long, value_name = "PNG")]
    image: PathBuf,

    /// A target shape file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Keep the existing mipmap levels' space zeroed instead of regenerating them
    #[arg(long, default_value_t = false)]
    no_mipmaps: bool,

    /// Map onto the existing palette instead of generating a new one
    #[arg(long, default_value_t = false)]
    keep_palette: bool,

    /// Whole file compression of the output, defaults to the input's
    #[arg(long, value_enum)]
    compression: Option<Compression>,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl ImportArgs {
    pub fn handle(&self) -> Result<()> {
        let mut shape = super::open(&self.file)?;
        let index = super::select_entry(&shape, &self.entry)?;
        let (width, height) = {
            let entry = shape.by_index(index)?;
            (entry.width(), entry.height())
        };

        let image = image::open(&self.image)
            .into_diagnostic()
            .context(format!("reading {}", self.image.display()))?
            .to_rgba8();
        if image.dimensions() != (width, height) {
            return Err(miette!(
                "{} is {}x{}, entry {} is {}x{}",
                self.image.display(),
                image.width(),
                image.height(),
                self.entry,
                width,
                height
            ));
        }

        let options = EncodeOptions::builder()
            .generate_mipmaps(!self.no_mipmaps)
            .quantize_palette(!self.keep_palette)
            .build();
        let result = shape
            .import_rgba(index, image.as_raw(), &options)
            .context(format!("importing into entry {}", self.entry))?;
        if result.palette_produced {
            info!("palette replaced ({:?})", result.palette_source);
        }

        let out = super::create(&self.output, self.overwrite)?;
        ShapeWriter::new(
            out,
            SaveOptions::builder()
                .maybe_compression(self.compression.map(Into::into))
                .build(),
        )
        .write(&shape)
        .context(format!("writing {}", self.output.display()))?;

        info!("wrote {}", self.output.display());
        Ok(())
    }
}
