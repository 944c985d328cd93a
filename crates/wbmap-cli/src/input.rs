//! Reading column headers from the command line inputs.

use std::io::{self, BufRead};
use std::path::Path;

use anyhow::{Context, Result};

/// Argument value that selects standard input.
pub const STDIN_SOURCE: &str = "-";

/// Header row of a CSV file.
pub fn read_csv_headers(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("open {}", path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("read header row of {}", path.display()))?;
    Ok(headers.iter().map(ToString::to_string).collect())
}

/// One header per line. Blank lines are skipped.
pub fn read_header_lines<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
    let mut headers = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let header = line.trim_end_matches('\r');
        if !header.trim().is_empty() {
            headers.push(header.to_string());
        }
    }
    Ok(headers)
}

/// Reads headers from `source`: a CSV path, or [`STDIN_SOURCE`].
pub fn read_headers(source: &str) -> Result<Vec<String>> {
    if source == STDIN_SOURCE {
        let stdin = io::stdin();
        return read_header_lines(stdin.lock()).context("read headers from stdin");
    }
    read_csv_headers(Path::new(source))
}
