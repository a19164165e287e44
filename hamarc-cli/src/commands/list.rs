//! List command implementation.

use crate::utils::print_entries;
use hamarc_archive::{FileEntry, HamArchive};
use serde::Serialize;
use std::path::Path;

/// JSON serializable entry data for archive listings.
#[derive(Debug, Serialize)]
struct EntryJson<'a> {
    name: &'a str,
    size: u64,
    encoded_size: u64,
    offset: u64,
}

impl<'a> From<&'a FileEntry> for EntryJson<'a> {
    fn from(entry: &'a FileEntry) -> Self {
        Self {
            name: &entry.name,
            size: entry.plain_size,
            encoded_size: entry.enc_size,
            offset: entry.offset,
        }
    }
}

/// JSON output for archive listing.
#[derive(Debug, Serialize)]
struct ArchiveListJson<'a> {
    archive: String,
    bytes_per_chunk: u64,
    file_count: u64,
    free_header_slack: u64,
    entries: Vec<EntryJson<'a>>,
}

pub fn cmd_list(archive: &Path, long: bool, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let ham = HamArchive::open(archive)?;

    if json {
        let header = ham.header();
        let listing = ArchiveListJson {
            archive: archive.display().to_string(),
            bytes_per_chunk: header.bytes_per_chunk,
            file_count: header.file_count,
            free_header_slack: header.free_header_slack,
            entries: ham.list().iter().map(EntryJson::from).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if long {
        println!("Archive: {}", archive.display());
        println!(
            "Chunk: {} bytes -> {} encoded",
            ham.config().bytes_per_chunk,
            ham.config().enc_bytes_per_chunk
        );
        println!();
    }
    print_entries(ham.list(), long);
    Ok(())
}
