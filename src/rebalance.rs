//! Rebalance events, turnover, and execution cost.

use crate::types::Date;

/// Models execution cost for basket rebalancing.
///
/// Cost is a flat basis-point charge on turnover, the gross value of
/// exposure changed by the rebalance.
///
/// ```
/// use basketbook::CostModel;
///
/// let model = CostModel { execution_bps: 2.0 };
/// // 2 bps on 30.0 of turnover
/// assert!((model.compute_cost(30.0) - 0.006).abs() < 1e-12);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CostModel {
    /// Execution cost in basis points of turnover (1 bps = 0.01%)
    pub execution_bps: f64,
}

impl CostModel {
    /// A zero-cost model.
    pub fn zero() -> Self {
        Self { execution_bps: 0.0 }
    }

    /// Cost for the given turnover. Always non-negative.
    pub fn compute_cost(&self, turnover: f64) -> f64 {
        turnover.abs() * self.execution_bps / 10_000.0
    }
}

/// Turnover of moving from `previous` to `target` weights at `nav`:
/// `0.5 · Σ|target_i - previous_i| · nav`.
pub fn turnover(previous: &[f64], target: &[f64], nav: f64) -> f64 {
    debug_assert_eq!(previous.len(), target.len());
    let l1: f64 = previous
        .iter()
        .zip(target)
        .map(|(p, t)| (t - p).abs())
        .sum();
    0.5 * l1 * nav
}

/// A scheduled rebalance, replayed during the accrual walk.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalanceEvent {
    pub date: Date,
    /// Row of `date` in the price index
    pub index: usize,
    /// Normalized target weights in column order
    pub weights: Vec<f64>,
}

/// What a replayed rebalance booked.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RebalanceBooking {
    pub date: Date,
    /// Weights overwritten by the rebalance (the previous date's row)
    pub previous_weights: Vec<f64>,
    /// Normalized target weights now in force
    pub target_weights: Vec<f64>,
    /// NAV on the previous date, the base for turnover
    pub reference_nav: f64,
    pub turnover: f64,
    /// Signed PnL impact (non-positive)
    pub cost: f64,
}
