//! CLI command for batch extraction

use std::path::Path;
use std::time::Instant;

use crate::ExtractOptions;
use crate::batch::{batch_extract, find_archive_files};
use crate::cli::progress::{LOOKING_GLASS, TRUCK, print_done, print_step, simple_bar};

pub fn execute(
    source: &Path,
    destination: &Path,
    options: &ExtractOptions,
    progress: bool,
) -> anyhow::Result<()> {
    let started = Instant::now();

    if progress {
        print_step(1, 2, LOOKING_GLASS, &format!("Searching {}...", source.display()));
    }
    let archives = find_archive_files(source);
    if archives.is_empty() {
        println!("No archives found in {}", source.display());
        return Ok(());
    }

    if progress {
        print_step(2, 2, TRUCK, &format!("Extracting {} archives...", archives.len()));
    }

    let result = if progress {
        let pb = simple_bar(archives.len() as u64, "Extracting");
        let result = batch_extract(&archives, source, destination, options, |p| {
            pb.set_position(p.current as u64);
            pb.set_message(p.current_archive.clone());
        });
        pb.finish_and_clear();
        result
    } else {
        batch_extract(&archives, source, destination, options, |_| {})
    };

    for line in &result.results {
        println!("{line}");
    }
    println!(
        "{} extracted, {} failed",
        result.success_count, result.fail_count
    );
    if progress {
        print_done(started.elapsed());
    }

    if result.fail_count > 0 {
        anyhow::bail!("{} of {} archives failed", result.fail_count, archives.len());
    }
    Ok(())
}
