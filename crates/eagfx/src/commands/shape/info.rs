use clap::Args;
use eagfx_shape::summary::{ArchiveSummary, EntrySummary};
use itertools::Itertools;
use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use std::{fmt::Display, path::PathBuf};

#[derive(Args)]
pub struct InfoArgs {
    /// An input shape file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Print the summary as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

struct Listing<'a>(&'a ArchiveSummary);

fn flag_names(entry: &EntrySummary) -> String {
    let flags = entry.flags;
    [
        (flags.compressed, "compressed"),
        (flags.swizzled, "swizzled"),
        (flags.transposed, "transposed"),
        (flags.reserved, "reserved"),
        (entry.referenced, "referenced"),
    ]
    .into_iter()
    .filter(|(set, _)| *set)
    .map(|(_, name)| name)
    .join(",")
}

impl Display for Listing<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let summary = self.0;
        writeln!(
            f,
            "{} {:?} shape, {} entries, {} bytes, {:?} wrapper",
            summary.signature.bold(),
            summary.variant,
            summary.entry_count,
            summary.declared_size,
            summary.compression
        )?;
        if let Some(version) = &summary.version {
            writeln!(f, "version {}", version)?;
        }

        for entry in &summary.entries {
            writeln!(
                f,
                "{:>4} {:<12} {:>3} {:<28} {:>4}x{:<4} mips {:<2} {:#010x}..{:#010x} crc {:08x} {}",
                entry.index,
                entry.tag.green(),
                entry.record_type,
                entry.format,
                entry.width,
                entry.height,
                entry.mipmaps,
                entry.start_offset,
                entry.end_offset,
                entry.crc32,
                flag_names(entry).yellow()
            )?;
            for attachment in &entry.attachments {
                write!(
                    f,
                    "       {} {:>3} {:<9} {:#010x}..{:#010x}",
                    "+".dimmed(),
                    attachment.record_type,
                    attachment.kind,
                    attachment.start_offset,
                    attachment.end_offset
                )?;
                match &attachment.text {
                    Some(text) => writeln!(f, " {:?}", text)?,
                    None => writeln!(f)?,
                }
            }
        }
        Ok(())
    }
}

impl InfoArgs {
    pub fn handle(&self) -> Result<()> {
        let shape = super::open(&self.file)?;
        let summary = shape.summary();

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary).into_diagnostic()?
            );
        } else {
            print!("{}", Listing(&summary));
        }
        Ok(())
    }
}
