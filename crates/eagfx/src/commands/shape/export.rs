use clap::Args;
use eagfx_shape::ShapeArchive;
use image::RgbaImage;
use miette::{miette, Context, IntoDiagnostic, Result};
use std::{
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Args)]
pub struct ExportArgs {
    /// An input shape file, or a directory searched for shape files
    #[arg(short, long, value_name = "PATH")]
    file: PathBuf,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// Only write raw payloads, skip the PNG previews
    #[arg(long, default_value_t = false)]
    raw_only: bool,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl ExportArgs {
    pub fn handle(&self) -> Result<()> {
        if !self.file.is_dir() {
            return self.export(&self.file, &self.directory);
        }

        let files = WalkDir::new(&self.file)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| !e.file_type().is_dir() && super::is_shape_file(e.path()))
            .collect::<Vec<_>>();

        if files.is_empty() {
            return Err(miette!("no shape files found in {}", self.file.display()));
        }

        for file in files {
            let relative = file.path().strip_prefix(&self.file).into_diagnostic()?;
            let target = self.directory.join(relative);
            if let Err(error) = self.export(file.path(), &target) {
                warn!("skipping {}: {:?}", file.path().display(), error);
            }
        }
        Ok(())
    }

    fn write(&self, path: &Path, data: &[u8]) -> Result<()> {
        info!("writing {}", path.display());
        let mut out = super::create(path, self.overwrite)?;
        out.write_all(data)
            .into_diagnostic()
            .context(format!("writing {}", path.display()))
    }

    fn export(&self, file: &Path, directory: &Path) -> Result<()> {
        let mut shape = super::open(file)?;
        std::fs::create_dir_all(directory)
            .into_diagnostic()
            .context(format!("creating {}", directory.display()))?;

        if !self.raw_only {
            let converted = shape.convert_previews();
            info!("decoded {converted} of {} entries", shape.len());
        }

        for entry in shape.entries() {
            let stem = super::file_stem(entry.index, &entry.tag);
            self.write(&directory.join(format!("{stem}.bin")), &entry.raw_data)?;

            for attachment in &entry.attachments {
                let name = format!("{stem}.{}.{}.bin", attachment.index, attachment.tag());
                self.write(&directory.join(name), &attachment.data)?;
            }

            if let Some(preview) = &entry.preview {
                self.write_png(&shape, entry.index, preview, &directory.join(format!("{stem}.png")))?;
            }
        }
        Ok(())
    }

    fn write_png(&self, shape: &ShapeArchive, index: usize, rgba: &[u8], path: &Path) -> Result<()> {
        let entry = shape.by_index(index)?;
        // palette records preview as a single row of colours
        let (width, height) = if entry.is_palette() {
            ((rgba.len() / 4) as u32, 1)
        } else {
            (entry.width(), entry.height())
        };
        let image = RgbaImage::from_raw(width, height, rgba.to_vec())
            .ok_or(miette!("preview of entry {index} does not match {width}x{height}"))?;

        if path.exists() && !self.overwrite {
            return Err(miette!("{} already exists", path.display()));
        }
        info!("writing {}", path.display());
        image
            .save(path)
            .into_diagnostic()
            .context(format!("writing {}", path.display()))
    }
}
