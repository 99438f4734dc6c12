//! CSV loaders for closing prices and funding observations.
//!
//! Price files are wide: a `date` column followed by one column per symbol.
//! Empty cells are missing prices.
//!
//! ```text
//! date,AAPL,MSFT,TSLA
//! 2025-01-02,243.85,418.58,379.28
//! 2025-01-03,243.36,423.35,
//! ```
//!
//! Funding files are long: `date,rate` with one daily rate per row.

use std::io::Read;
use std::path::Path;

use basketbook::{Date, PriceSeries, Symbol};
use serde::Deserialize;

use crate::error::{Error, Result};

/// Load a wide price table from `path`.
pub fn load_prices(path: &Path) -> Result<PriceSeries> {
    let rdr = reader_builder().from_path(path).map_err(|e| csv_error(path, e))?;
    parse_prices(rdr, path)
}

/// Parse a wide price table from any reader.
pub fn read_prices<R: Read>(reader: R) -> Result<PriceSeries> {
    parse_prices(reader_builder().from_reader(reader), Path::new("<input>"))
}

fn parse_prices<R: Read>(mut rdr: csv::Reader<R>, path: &Path) -> Result<PriceSeries> {
    let headers = rdr.headers().map_err(|e| csv_error(path, e))?.clone();
    let mut names = headers.iter();
    match names.next() {
        Some(first) if first.eq_ignore_ascii_case("date") => {}
        _ => return Err(Error::Prices("first column must be 'date'".into())),
    }
    let symbols = names
        .map(|name| {
            Symbol::try_new(name)
                .ok_or_else(|| Error::Prices(format!("invalid symbol in header: '{name}'")))
        })
        .collect::<Result<Vec<Symbol>>>()?;
    if symbols.is_empty() {
        return Err(Error::Prices("no symbol columns".into()));
    }

    let mut dates = Vec::new();
    let mut columns: Vec<Vec<Option<f64>>> = vec![Vec::new(); symbols.len()];
    for (line, rec) in rdr.records().enumerate() {
        let rec = rec.map_err(|e| csv_error(path, e))?;
        let row = line + 2;
        let date: Date = rec[0]
            .parse()
            .map_err(|e| Error::Prices(format!("row {row}: bad date '{}': {e}", &rec[0])))?;
        dates.push(date);

        for (i, column) in columns.iter_mut().enumerate() {
            let cell = &rec[i + 1];
            let price = if cell.is_empty() {
                None
            } else {
                Some(cell.parse::<f64>().map_err(|e| {
                    Error::Prices(format!("row {row}, {}: bad price '{cell}': {e}", symbols[i]))
                })?)
            };
            column.push(price);
        }
    }

    log::debug!("loaded {} dates x {} symbols", dates.len(), symbols.len());
    PriceSeries::new(dates, symbols.into_iter().zip(columns).collect())
        .map_err(|e| Error::Prices(format!("{}: {e}", path.display())))
}

#[derive(Debug, Deserialize)]
struct FundingRow {
    date: Date,
    rate: f64,
}

/// Load `date,rate` funding observations from `path`.
pub fn load_funding(path: &Path) -> Result<Vec<(Date, f64)>> {
    let rdr = reader_builder().from_path(path).map_err(|e| csv_error(path, e))?;
    parse_funding(rdr, path)
}

/// Parse `date,rate` funding observations from any reader.
pub fn read_funding<R: Read>(reader: R) -> Result<Vec<(Date, f64)>> {
    parse_funding(reader_builder().from_reader(reader), Path::new("<input>"))
}

fn parse_funding<R: Read>(mut rdr: csv::Reader<R>, path: &Path) -> Result<Vec<(Date, f64)>> {
    let mut out = Vec::new();
    for rec in rdr.deserialize() {
        let row: FundingRow = rec.map_err(|e| csv_error(path, e))?;
        out.push((row.date, row.rate));
    }
    Ok(out)
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.trim(csv::Trim::All);
    builder
}

fn csv_error(path: &Path, source: csv::Error) -> Error {
    Error::Csv {
        path: path.to_path_buf(),
        source,
    }
}
