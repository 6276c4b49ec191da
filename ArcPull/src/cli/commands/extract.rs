//! CLI command for extracting an archive

use std::ops::ControlFlow;
use std::path::Path;
use std::time::Instant;

use crate::paths::sanitize_entry_path;
use crate::{ExtractOptions, ExtractionProgress};

use super::{matches_entry, open_archive};
use crate::cli::progress::{LOOKING_GLASS, PACKAGE, bytes_bar, print_done, print_step};

pub fn execute(
    source: &Path,
    destination: &Path,
    filter: Option<&str>,
    file: Option<&str>,
    options: &ExtractOptions,
    progress: bool,
) -> anyhow::Result<()> {
    let started = Instant::now();

    if progress {
        print_step(1, 2, LOOKING_GLASS, &format!("Reading {}...", source.display()));
    }
    let archive = open_archive(source, options.password.as_deref())?;

    // Single entry extraction
    if let Some(name) = file {
        let entry = archive.entry(name)?;
        let dest = destination.join(sanitize_entry_path(entry.file_name())?);

        if dest.exists() && !options.overwrite {
            tracing::warn!("Skipping {}: {} already exists", entry.file_name(), dest.display());
            println!("Skipped {} (already exists, use --overwrite to replace)", dest.display());
            return Ok(());
        }

        if progress {
            print_step(2, 2, PACKAGE, &format!("Extracting {name}..."));
            let pb = bytes_bar(entry.size(), name);
            let mut on_progress = |p: &ExtractionProgress| {
                pb.inc(p.bytes_delivered);
                ControlFlow::Continue(())
            };
            entry.extract_to_path(&dest, options.preserve_timestamps, Some(&mut on_progress))?;
            pb.finish_and_clear();
            print_done(started.elapsed());
        } else {
            entry.extract_to_path(&dest, options.preserve_timestamps, None)?;
            println!("Extracted {}", dest.display());
        }
        return Ok(());
    }

    // Filtered extraction
    if let Some(pattern) = filter {
        if progress {
            print_step(2, 2, PACKAGE, &format!("Extracting entries matching {pattern}..."));
        }

        let summary = archive.extract_with(
            |entry| {
                if !matches_entry(pattern, entry.file_name()) {
                    return None;
                }
                match sanitize_entry_path(entry.file_name()) {
                    Ok(relative) => Some(destination.join(relative)),
                    Err(e) => {
                        tracing::warn!("{e}");
                        None
                    }
                }
            },
            options,
        )?;

        if summary.files == 0 && summary.folders == 0 {
            println!("No entries match pattern: {pattern}");
            return Ok(());
        }

        println!(
            "Extracted {} files ({} bytes), {} skipped",
            summary.files, summary.bytes, summary.skipped
        );
        if progress {
            print_done(started.elapsed());
        }
        return Ok(());
    }

    // Full extraction
    if progress {
        print_step(
            2,
            2,
            PACKAGE,
            &format!("Extracting {} entries to {}...", archive.len(), destination.display()),
        );

        let pb = bytes_bar(0, "Extracting");
        let summary = archive.extract_all_with_progress(destination, options, &mut |p| {
            pb.set_length(p.bytes_total);
            pb.set_position(p.bytes_done);
            let short_name = Path::new(p.file_name)
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or(p.file_name);
            pb.set_message(format!("[{}/{}] {short_name}", p.current, p.total));
        })?;
        pb.finish_and_clear();

        println!(
            "{} files, {} folders, {} skipped",
            summary.files, summary.folders, summary.skipped
        );
        print_done(started.elapsed());
    } else {
        let summary = archive.extract_all(destination, options)?;
        println!(
            "Extracted {} files to {} ({} skipped)",
            summary.files,
            destination.display(),
            summary.skipped
        );
    }

    Ok(())
}
