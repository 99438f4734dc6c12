//! Weight normalization and the date-indexed weight ledger.

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::types::{Date, Symbol};

/// Relative tolerance when testing whether signed weights already sum to one.
pub const SUM_RTOL: f64 = 1e-5;
/// Absolute tolerance when testing whether signed weights already sum to one.
pub const SUM_ATOL: f64 = 1e-8;
/// Gross exposure at or below this is treated as zero.
pub const GROSS_EPSILON: f64 = 1e-12;

/// Normalize raw weights to unit gross exposure.
///
/// - Gross exposure `Σ|w|` of zero: weights are returned unchanged.
/// - Signed sum already within tolerance of 1: returned unchanged.
/// - Otherwise every weight is divided by the gross exposure, so signs and
///   relative magnitudes are preserved and `Σ|w| = 1`.
pub fn normalize(weights: &[f64]) -> Vec<f64> {
    let gross: f64 = weights.iter().map(|w| w.abs()).sum();
    if gross <= GROSS_EPSILON {
        log::warn!("weights have zero gross exposure; basket will carry no exposure");
        return weights.to_vec();
    }

    let signed: f64 = weights.iter().sum();
    if (signed - 1.0).abs() <= SUM_ATOL + SUM_RTOL {
        return weights.to_vec();
    }

    weights.iter().map(|w| w / gross).collect()
}

/// Map a `(symbol, weight)` list onto the column order of `symbols`.
///
/// Symbols absent from `weights` get zero. Later duplicates override earlier
/// ones. Every symbol in `weights` must be one of `symbols`; otherwise the
/// full, sorted list of unknown symbols is returned as an error.
pub fn align_weights(symbols: &[Symbol], weights: &[(Symbol, f64)]) -> Result<Vec<f64>> {
    let columns: FxHashMap<Symbol, usize> =
        symbols.iter().enumerate().map(|(i, s)| (*s, i)).collect();

    let mut unknown: Vec<Symbol> = weights
        .iter()
        .map(|(s, _)| *s)
        .filter(|s| !columns.contains_key(s))
        .collect();
    if !unknown.is_empty() {
        unknown.sort();
        unknown.dedup();
        return Err(Error::UnknownSymbols(unknown));
    }

    if let Some((sym, w)) = weights.iter().find(|(_, w)| !w.is_finite()) {
        return Err(Error::InvalidConfig(format!("weight for {sym} must be finite, got {w}")));
    }

    let mut aligned = vec![0.0; symbols.len()];
    for (sym, w) in weights {
        aligned[columns[sym]] = *w;
    }
    Ok(aligned)
}

/// Date-indexed table of signed weights, one column per symbol.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeightLedger {
    symbols: Vec<Symbol>,
    dates: Vec<Date>,
    rows: Vec<Vec<f64>>,
}

impl WeightLedger {
    /// Build a ledger from rows aligned with `dates` and `symbols`.
    pub(crate) fn from_rows(symbols: Vec<Symbol>, dates: Vec<Date>, rows: Vec<Vec<f64>>) -> Self {
        debug_assert_eq!(dates.len(), rows.len());
        Self {
            symbols,
            dates,
            rows,
        }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Weights on row `t`, in column order.
    pub fn row(&self, t: usize) -> &[f64] {
        &self.rows[t]
    }

    /// Weights on `date`, in column order.
    pub fn on(&self, date: Date) -> Option<&[f64]> {
        let t = self.dates.binary_search(&date).ok()?;
        Some(&self.rows[t])
    }

    /// Weight of `symbol` on `date`.
    pub fn get(&self, date: Date, symbol: &Symbol) -> Option<f64> {
        let c = self.symbols.iter().position(|s| s == symbol)?;
        self.on(date).map(|row| row[c])
    }

    /// Weights on `date` as `(symbol, weight)` pairs.
    pub fn pairs_on(&self, date: Date) -> Option<Vec<(Symbol, f64)>> {
        let row = self.on(date)?;
        Some(self.symbols.iter().copied().zip(row.iter().copied()).collect())
    }

    /// Gross exposure `Σ|w|` on row `t`.
    pub fn gross_exposure(&self, t: usize) -> f64 {
        self.rows[t].iter().map(|w| w.abs()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn normalize_keeps_unit_sum() {
        let w = [0.4, 0.4, 0.2];
        assert_eq!(normalize(&w), w.to_vec());
    }

    #[test]
    fn normalize_within_tolerance_is_untouched() {
        let w = [0.5, 0.5 + 5e-6];
        assert_eq!(normalize(&w), w.to_vec());
    }

    #[test]
    fn normalize_divides_by_gross_not_signed_sum() {
        let w = normalize(&[0.6, -0.2]);
        // gross = 0.8
        assert!(approx(w[0], 0.75));
        assert!(approx(w[1], -0.25));
    }

    #[test]
    fn normalize_rescales_long_only() {
        let w = normalize(&[2.0, 1.0, 1.0]);
        assert!(approx(w[0], 0.5));
        assert!(approx(w[1], 0.25));
        assert!(approx(w.iter().sum::<f64>(), 1.0));
    }

    #[test]
    fn normalize_zero_gross_is_noop() {
        assert_eq!(normalize(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn align_fills_missing_with_zero() {
        let syms = [Symbol::new("A"), Symbol::new("B"), Symbol::new("C")];
        let w = align_weights(&syms, &[(Symbol::new("C"), 0.3), (Symbol::new("A"), 0.7)]).unwrap();
        assert_eq!(w, vec![0.7, 0.0, 0.3]);
    }

    #[test]
    fn align_reports_all_unknown_symbols() {
        let syms = [Symbol::new("A")];
        let err = align_weights(
            &syms,
            &[
                (Symbol::new("Z"), 0.1),
                (Symbol::new("A"), 0.5),
                (Symbol::new("Y"), 0.4),
            ],
        )
        .unwrap_err();
        assert_eq!(err, Error::UnknownSymbols(vec![Symbol::new("Y"), Symbol::new("Z")]));
    }

    #[test]
    fn align_rejects_non_finite() {
        let syms = [Symbol::new("A")];
        assert!(align_weights(&syms, &[(Symbol::new("A"), f64::NAN)]).is_err());
    }

    #[test]
    fn ledger_lookup() {
        let d0 = Date::from_ymd_opt(2025, 1, 2).unwrap();
        let d1 = Date::from_ymd_opt(2025, 1, 3).unwrap();
        let ledger = WeightLedger::from_rows(
            vec![Symbol::new("A"), Symbol::new("B")],
            vec![d0, d1],
            vec![vec![0.5, 0.5], vec![0.6, -0.4]],
        );
        assert_eq!(ledger.get(d1, &Symbol::new("B")), Some(-0.4));
        assert_eq!(ledger.row(0), &[0.5, 0.5]);
        assert!(approx(ledger.gross_exposure(1), 1.0));
        assert_eq!(ledger.pairs_on(d0).unwrap()[0], (Symbol::new("A"), 0.5));
    }
}
