//! Time-series store: the closing-price table and the funding-rate curve.
//!
//! Both are materialized once, validated, and never mutated afterwards.
//! The engine reads prices row by row (one row per date) and consumes the
//! funding curve already aligned to the same date index.

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::types::{Date, Symbol};

/// Date-indexed table of closing prices, one column per symbol.
///
/// Cells may be missing (`None`) for dates on which an instrument did not
/// trade. Present prices are finite and strictly positive.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawPriceSeries"))]
pub struct PriceSeries {
    dates: Vec<Date>,
    symbols: Vec<Symbol>,
    /// Row-major: `rows[t][column]`
    rows: Vec<Vec<Option<f64>>>,
}

impl PriceSeries {
    /// Build a price table from a date index and per-symbol columns.
    ///
    /// Fails if the index is empty, dates are not strictly increasing,
    /// a symbol appears twice, a column length differs from the index,
    /// or a present price is not finite and positive.
    pub fn new(dates: Vec<Date>, columns: Vec<(Symbol, Vec<Option<f64>>)>) -> Result<Self> {
        if dates.is_empty() {
            return Err(Error::InvalidPriceTable("date index is empty".into()));
        }
        if let Some(w) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(Error::InvalidPriceTable(format!(
                "dates must be strictly increasing: {} followed by {}",
                w[0], w[1]
            )));
        }

        let mut seen: FxHashMap<Symbol, ()> = FxHashMap::default();
        for (sym, column) in &columns {
            if seen.insert(*sym, ()).is_some() {
                return Err(Error::InvalidPriceTable(format!("duplicate column: {sym}")));
            }
            if column.len() != dates.len() {
                return Err(Error::InvalidPriceTable(format!(
                    "column {sym} has {} values for {} dates",
                    column.len(),
                    dates.len()
                )));
            }
            let bad = column.iter().copied().enumerate().find_map(|(i, cell)| match cell {
                Some(p) if !(p.is_finite() && p > 0.0) => Some((i, p)),
                _ => None,
            });
            if let Some((i, p)) = bad {
                return Err(Error::InvalidPriceTable(format!(
                    "price for {sym} on {} must be finite and positive, got {p}",
                    dates[i]
                )));
            }
        }

        let symbols: Vec<Symbol> = columns.iter().map(|(s, _)| *s).collect();
        let rows = (0..dates.len())
            .map(|t| columns.iter().map(|(_, col)| col[t]).collect())
            .collect();

        Ok(Self {
            dates,
            symbols,
            rows,
        })
    }

    /// Build a price table where every cell is present.
    pub fn from_closes(dates: Vec<Date>, columns: Vec<(Symbol, Vec<f64>)>) -> Result<Self> {
        let columns = columns
            .into_iter()
            .map(|(sym, col)| (sym, col.into_iter().map(Some).collect()))
            .collect();
        Self::new(dates, columns)
    }

    /// The date index.
    #[inline]
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Column symbols, in column order.
    #[inline]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Number of dates.
    #[inline]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Always false for a constructed table (at least one row is required).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Position of `date` in the index.
    pub fn index_of(&self, date: Date) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Column position of `symbol`.
    pub fn column_of(&self, symbol: &Symbol) -> Option<usize> {
        self.symbols.iter().position(|s| s == symbol)
    }

    /// All prices on row `t`, in column order.
    #[inline]
    pub fn row(&self, t: usize) -> &[Option<f64>] {
        &self.rows[t]
    }

    /// Price of `symbol` on `date`, if both exist and the cell is present.
    pub fn price(&self, date: Date, symbol: &Symbol) -> Option<f64> {
        let t = self.index_of(date)?;
        let c = self.column_of(symbol)?;
        self.rows[t][c]
    }

    /// Copy of one symbol's column.
    pub fn column(&self, symbol: &Symbol) -> Option<Vec<Option<f64>>> {
        let c = self.column_of(symbol)?;
        Some(self.rows.iter().map(|row| row[c]).collect())
    }
}

/// Unchecked serialized form of [`PriceSeries`]; deserialization validates it
/// through [`PriceSeries::new`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawPriceSeries {
    dates: Vec<Date>,
    symbols: Vec<Symbol>,
    rows: Vec<Vec<Option<f64>>>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawPriceSeries> for PriceSeries {
    type Error = Error;

    fn try_from(raw: RawPriceSeries) -> Result<Self> {
        if raw.rows.len() != raw.dates.len() {
            return Err(Error::InvalidPriceTable(format!(
                "{} rows for {} dates",
                raw.rows.len(),
                raw.dates.len()
            )));
        }
        let width = raw.symbols.len();
        if let Some((t, row)) = raw.rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            return Err(Error::InvalidPriceTable(format!(
                "row {t} has {} values for {width} symbols",
                row.len()
            )));
        }
        let columns = raw
            .symbols
            .iter()
            .enumerate()
            .map(|(c, sym)| (*sym, raw.rows.iter().map(|row| row[c]).collect()))
            .collect();
        PriceSeries::new(raw.dates, columns)
    }
}

/// Gross price relative `P(t) / P(t-1)`, or `None` if either cell is missing.
#[inline]
pub fn price_relative(prev: Option<f64>, current: Option<f64>) -> Option<f64> {
    match (prev, current) {
        (Some(p0), Some(p1)) => Some(p1 / p0),
        _ => None,
    }
}

/// Daily financing rate input.
///
/// Rates are already per-day fractions (e.g. `0.05 / 252`), never annualized.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FundingRate {
    /// The same rate on every date.
    Constant(f64),
    /// Sparse observations, aligned onto the price index on construction.
    Series(Vec<(Date, f64)>),
}

impl Default for FundingRate {
    fn default() -> Self {
        FundingRate::Constant(0.0)
    }
}

impl FundingRate {
    /// Align the funding input onto `dates`.
    ///
    /// Series observations are matched on exact dates (observations on dates
    /// outside the index are dropped), forward-filled, and any leading gap
    /// before the first matched observation is zero.
    pub fn align(&self, dates: &[Date]) -> Result<Vec<f64>> {
        match self {
            FundingRate::Constant(rate) => {
                check_rate(*rate, None)?;
                Ok(vec![*rate; dates.len()])
            }
            FundingRate::Series(points) => {
                let mut by_date: FxHashMap<Date, f64> = FxHashMap::default();
                for &(date, rate) in points {
                    check_rate(rate, Some(date))?;
                    by_date.insert(date, rate);
                }

                let mut dropped = by_date.len();
                let mut last = 0.0;
                let aligned = dates
                    .iter()
                    .map(|d| {
                        if let Some(&rate) = by_date.get(d) {
                            dropped -= 1;
                            last = rate;
                        }
                        last
                    })
                    .collect();

                if dropped > 0 {
                    log::warn!("{dropped} funding observation(s) fall outside the price index and were ignored");
                }
                Ok(aligned)
            }
        }
    }
}

fn check_rate(rate: f64, date: Option<Date>) -> Result<()> {
    if rate.is_finite() {
        return Ok(());
    }
    Err(Error::InvalidConfig(match date {
        Some(d) => format!("funding rate on {d} must be finite, got {rate}"),
        None => format!("funding rate must be finite, got {rate}"),
    }))
}
