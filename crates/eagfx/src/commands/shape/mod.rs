use std::{fs::File, path::Path};

use eagfx_shape::ShapeArchive;
use miette::{miette, Context, IntoDiagnostic, Result};

pub mod export;
pub mod import;
pub mod info;

/// Extensions shape archives are usually stored with
pub const SHAPE_EXTENSIONS: [&str; 8] = ["fsh", "ssh", "psh", "xsh", "msh", "gsh", "qfs", "shp"];

#[derive(clap::Subcommand)]
pub enum ShapeCommands {
    /// Print the header, directory and attachments of a shape file
    Info(info::InfoArgs),
    /// Export raw payloads and PNG previews into a directory
    Export(export::ExportArgs),
    /// Replace an entry with a PNG and save the result
    Import(import::ImportArgs),
}

impl ShapeCommands {
    pub fn handle(&self) -> Result<()> {
        match self {
            ShapeCommands::Info(info) => info.handle(),
            ShapeCommands::Export(export) => export.handle(),
            ShapeCommands::Import(import) => import.handle(),
        }
    }
}

pub(crate) fn open(path: &Path) -> Result<ShapeArchive> {
    let f = File::open(path)
        .into_diagnostic()
        .context(format!("path: {}", path.display()))?;
    ShapeArchive::new(f).context(format!("reading {}", path.display()))
}

/// Find an entry by index or tag
pub(crate) fn select_entry(shape: &ShapeArchive, selector: &str) -> Result<usize> {
    if let Some(index) = shape.index_for_tag(selector) {
        return Ok(index);
    }
    match selector.parse::<usize>() {
        Ok(index) if index < shape.len() => Ok(index),
        _ => Err(miette!("no entry with tag or index {selector}")),
    }
}

pub(crate) fn is_shape_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |e| {
            SHAPE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str())
        })
}

/// Make a tag usable as part of a file name
pub(crate) fn file_stem(index: usize, tag: &str) -> String {
    let tag: String = tag
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    format!("{index:03}_{tag}")
}

pub(crate) fn create(path: &Path, overwrite: bool) -> Result<File> {
    if !overwrite {
        File::create_new(path)
            .into_diagnostic()
            .context(format!("creating {}", path.display()))
    } else {
        File::create(path)
            .into_diagnostic()
            .context(format!("creating {}", path.display()))
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::{file_stem, is_shape_file};

    #[test]
    fn file_names() {
        assert_eq!(file_stem(3, "!pal"), "003__pal");
        assert_eq!(file_stem(12, "car0"), "012_car0");
        assert!(is_shape_file(Path::new("data/TITLE.FSH")));
        assert!(!is_shape_file(Path::new("data/readme.txt")));
    }
}
