//! File-based persistence of walk output.
//!
//! Full results are stored as one JSON document. Daily records can also be
//! written as JSON Lines (`.jsonl`, one record per line) for streaming into
//! other tools.
//!
//! # Usage
//!
//! ```ignore
//! use basketbook::persistence;
//! use std::path::Path;
//!
//! let results = engine.results()?;
//! results.save_json(Path::new("basket.json"))?;
//! persistence::save_records(&results.records(), Path::new("basket.jsonl"))?;
//!
//! let loaded = basketbook::BasketResults::load_json(Path::new("basket.json"))?;
//! ```

use std::io::{self, BufRead, Write};
use std::path::Path;

use crate::accrual::DailyRecord;
use crate::results::BasketResults;

fn invalid_data(e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, e.to_string())
}

/// Save daily records in JSON Lines format.
pub fn save_records(records: &[DailyRecord], path: &Path) -> io::Result<()> {
    let file = std::fs::File::create(path)?;
    let mut writer = io::BufWriter::new(file);

    for record in records {
        let json = serde_json::to_string(record).map_err(io::Error::other)?;
        writeln!(writer, "{json}")?;
    }

    writer.flush()
}

/// Load daily records from a JSON Lines file. Empty lines are skipped.
pub fn load_records(path: &Path) -> io::Result<Vec<DailyRecord>> {
    let file = std::fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    let mut records = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: DailyRecord = serde_json::from_str(line)
            .map_err(|e| invalid_data(format!("line {}: {e}", line_num + 1)))?;
        records.push(record);
    }

    Ok(records)
}

impl BasketResults {
    /// Write the full results as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> io::Result<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = io::BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).map_err(io::Error::other)?;
        writeln!(writer)?;
        writer.flush()
    }

    /// Read results written by [`BasketResults::save_json`].
    pub fn load_json(path: &Path) -> io::Result<Self> {
        let file = std::fs::File::open(path)?;
        serde_json::from_reader(io::BufReader::new(file)).map_err(invalid_data)
    }
}
