// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL (JSON Lines) file utilities.
//!
//! Backs the transaction journal: one JSON record per line, appended with
//! fsync, replayed on startup and rewritten on compaction.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;

/// Appends a record to a JSONL file with fsync for durability.
pub fn append<T: Serialize>(path: &Path, record: &T) -> Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    let json = serde_json::to_string(record)?;
    writeln!(file, "{json}")?;
    file.sync_all()?;

    Ok(())
}

/// Reads all records from a JSONL file.
///
/// Skips empty lines and returns an empty vec if the file doesn't exist.
/// Fails on the first malformed line.
pub fn read_all<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let mut records = Vec::new();
    for line in lines(path)? {
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

/// Reads all records, skipping lines that fail to parse.
///
/// A crash mid-append can leave a torn last line; the rest of the file is
/// still usable. Returns the records and the number of skipped lines.
pub fn read_all_lossy<T: DeserializeOwned>(path: &Path) -> Result<(Vec<T>, usize)> {
    let mut records = Vec::new();
    let mut skipped = 0;
    for (lineno, line) in lines(path)?.into_iter().enumerate() {
        match serde_json::from_str(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(path = %path.display(), line = lineno + 1, error = %e, "skipping malformed journal line");
                skipped += 1;
            }
        }
    }
    Ok((records, skipped))
}

/// Writes all records to a JSONL file, replacing existing content.
///
/// Writes a sibling temp file and renames it over the target, so a crash
/// leaves either the old or the new content.
pub fn write_all<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let tmp = path.with_extension("jsonl.tmp");
    {
        let mut file = File::create(&tmp)?;
        for record in records {
            let json = serde_json::to_string(record)?;
            writeln!(file, "{json}")?;
        }
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;

    Ok(())
}

fn lines(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if !line.trim().is_empty() {
            out.push(line);
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "jsonl_tests.rs"]
mod tests;
