//! Main entry point for the zipstream CLI application.
//!
//! Members are addressed by the offset of their local file header, from a
//! local file or an HTTP URL.

use anyhow::{Context, Result, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use zipstream::{
    Cli, EntryKind, ExtractError, ExtractOptions, HttpRangeReader, LocalFileHeader,
    LocalFileReader, Progress, ReadAt, ZipExtractor,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let options = ExtractOptions {
        chunk_size: cli.chunk_size,
        skip_crc32: cli.no_verify,
    };

    if cli.is_http_url() {
        // Handle remote ZIP file via HTTP Range requests
        let reader = Arc::new(HttpRangeReader::new(cli.file.clone())?);
        let transferred_before = reader.transferred_bytes();

        process_zip(Arc::clone(&reader), &cli, options)?;

        // Display network transfer statistics for HTTP sources
        if !cli.is_quiet() {
            let transferred = reader.transferred_bytes() - transferred_before;
            eprintln!("\nTotal bytes transferred: {}", format_size(transferred));
        }
    } else {
        let reader = LocalFileReader::new(Path::new(&cli.file))
            .with_context(|| format!("cannot open `{}`", cli.file))?;
        process_zip(reader, &cli, options)?;
    }

    Ok(())
}

/// List or extract every member named on the command line.
fn process_zip<R: ReadAt>(reader: R, cli: &Cli, options: ExtractOptions) -> Result<()> {
    let extractor = ZipExtractor::new(reader).with_options(options);

    let headers = cli
        .offsets
        .iter()
        .map(|&offset| {
            extractor
                .local_header(offset)
                .with_context(|| format!("cannot read member at offset {offset}"))
        })
        .collect::<Result<Vec<_>>>()?;

    if cli.list || cli.verbose {
        list_members(&headers, cli.verbose);
        return Ok(());
    }

    let multiple_files = cli.pipe && headers.len() > 1;
    for header in &headers {
        extract_member(&extractor, header, cli, multiple_files)?;
    }

    Ok(())
}

/// Print member headers, either names only or as a table.
fn list_members(headers: &[LocalFileHeader], verbose: bool) {
    if !verbose {
        for header in headers {
            println!("{}", header.file_name);
        }
        return;
    }

    println!(
        "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  {:>8}  Name",
        "Length", "Size", "Cmpr", "Date", "Time", "CRC-32"
    );
    println!("{}", "-".repeat(80));

    for header in headers {
        let entry = header.to_entry();
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();
        let ratio = if header.uncompressed_size > 0 {
            format!(
                "{:>4}%",
                100u64.saturating_sub(header.compressed_size * 100 / header.uncompressed_size)
            )
        } else {
            "  0%".to_string()
        };
        println!(
            "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {:08x}  {}",
            header.uncompressed_size,
            header.compressed_size,
            ratio,
            year,
            month,
            day,
            hour,
            minute,
            header.crc32,
            header.file_name
        );
    }
}

/// Extract a single member, to stdout or to disk.
fn extract_member<R: ReadAt>(
    extractor: &ZipExtractor<R>,
    header: &LocalFileHeader,
    cli: &Cli,
    show_filename: bool,
) -> Result<()> {
    let entry = header.to_entry();
    let verify = !cli.no_verify && header.has_crc32();

    if cli.pipe {
        if entry.kind == EntryKind::Directory {
            return Ok(());
        }
        let stdout = std::io::stdout();
        let mut stdout = stdout.lock();
        if show_filename {
            writeln!(stdout, "--- {} ---", entry.path)?;
        }
        let crc = extractor.extract_to_writer(&entry, &mut stdout, None)?;
        if verify {
            entry.verify_crc32(crc)?;
        }
        return Ok(());
    }

    if cli.junk_paths && entry.kind == EntryKind::Directory {
        return Ok(());
    }

    let output_path = output_path(&entry.path, cli)?;

    if !cli.is_quiet() {
        println!("  extracting: {}", entry.path);
    }

    let bar = if cli.is_quiet() || entry.kind != EntryKind::File {
        None
    } else {
        Some(byte_bar()?)
    };
    let mut bar_progress = bar.clone().map(BarProgress);
    let progress = bar_progress.as_mut().map(|p| p as &mut dyn Progress);

    let result = extractor.extract_to_path(&entry, &output_path, progress);
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    match result {
        Ok(crc) => {
            if verify {
                entry.verify_crc32(crc)?;
            }
            Ok(())
        }
        Err(ExtractError::DestinationExists { path }) if cli.never_overwrite => {
            if !cli.is_very_quiet() {
                eprintln!("Skipping: {} (exists)", path.display());
            }
            Ok(())
        }
        Err(e) => Err(e).with_context(|| format!("cannot extract {}", entry.path)),
    }
}

/// Destination for a member, refusing names that would escape the target
/// directory.
fn output_path(name: &str, cli: &Cli) -> Result<PathBuf> {
    let relative = Path::new(name);
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
    {
        bail!("refusing unsafe member path `{name}`");
    }

    let file_name = if cli.junk_paths {
        // Junk paths: use only the base filename, ignore directory structure
        relative
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| relative.to_path_buf())
    } else {
        relative.to_path_buf()
    };

    Ok(match cli.extract_dir {
        Some(ref dir) => PathBuf::from(dir).join(file_name),
        None => file_name,
    })
}

fn byte_bar() -> Result<ProgressBar> {
    let bar = ProgressBar::new(0);
    bar.set_style(ProgressStyle::with_template(
        "  {bar:40.cyan/blue} {bytes}/{total_bytes} ({bytes_per_sec})",
    )?);
    Ok(bar)
}

/// Drives an indicatif bar from the extraction's progress counter.
struct BarProgress(ProgressBar);

impl Progress for BarProgress {
    fn total(&self) -> u64 {
        self.0.length().unwrap_or(0)
    }

    fn set_total(&mut self, total: u64) {
        self.0.set_length(total);
    }

    fn completed(&self) -> u64 {
        self.0.position()
    }

    fn set_completed(&mut self, completed: u64) {
        self.0.set_position(completed);
    }
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
