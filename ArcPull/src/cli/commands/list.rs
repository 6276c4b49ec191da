//! CLI command for listing archive contents

use std::path::Path;

use crate::ArchiveEntry;

use super::{format_size, matches_entry, open_archive};

pub fn execute(
    source: &Path,
    detailed: bool,
    json: bool,
    filter: Option<&str>,
    count: bool,
    password: Option<&str>,
) -> anyhow::Result<()> {
    let archive = open_archive(source, password)?;
    let entries = archive.entries()?;

    // Filter if pattern provided
    let filtered: Vec<&ArchiveEntry<'_>> = entries
        .iter()
        .filter(|e| filter.is_none_or(|pattern| matches_entry(pattern, e.file_name())))
        .collect();

    if count {
        println!("{}", filtered.len());
        return Ok(());
    }

    if json {
        let metadata: Vec<_> = filtered.iter().map(|e| e.metadata()).collect();
        println!("{}", serde_json::to_string_pretty(&metadata)?);
        return Ok(());
    }

    if !detailed {
        for entry in &filtered {
            println!("{}", entry.file_name());
        }
        return Ok(());
    }

    println!(
        "{:>10}  {:>10}  {:>6}  {:<19}  {:<5}  PATH",
        "SIZE", "PACKED", "RATIO", "MODIFIED", "FLAGS"
    );

    for entry in &filtered {
        let ratio = if entry.size() > 0 {
            (entry.packed_size() as f64 / entry.size() as f64) * 100.0
        } else {
            100.0
        };
        let modified = entry
            .last_write_time()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();

        println!(
            "{:>10}  {:>10}  {:>5.1}%  {:<19}  {:<5}  {}",
            format_size(entry.size()),
            format_size(entry.packed_size()),
            ratio,
            modified,
            flags(entry),
            entry.file_name()
        );
    }

    let files: Vec<_> = filtered.iter().filter(|e| !e.is_folder()).collect();
    let total_size: u64 = files.iter().map(|e| e.size()).sum();
    let total_packed: u64 = files.iter().map(|e| e.packed_size()).sum();
    let overall_ratio = if total_size > 0 {
        (total_packed as f64 / total_size as f64) * 100.0
    } else {
        100.0
    };

    println!();
    println!(
        "{} files, {} folders, {} total ({} packed, {:.1}% ratio)",
        files.len(),
        filtered.len() - files.len(),
        format_size(total_size),
        format_size(total_packed),
        overall_ratio
    );

    Ok(())
}

/// `D` folder, `E` encrypted, `<`/`>` continues from/into another volume
fn flags(entry: &ArchiveEntry<'_>) -> String {
    [
        (entry.is_folder(), 'D'),
        (entry.is_encrypted(), 'E'),
        (entry.is_split_before(), '<'),
        (entry.is_split_after(), '>'),
    ]
    .iter()
    .map(|&(set, c)| if set { c } else { '-' })
    .collect()
}
