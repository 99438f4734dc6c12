//! Daily accrual step.
//!
//! One step takes the committed record for `t-1`, the prices on `t-1` and `t`,
//! and the funding rate for `t`, and produces the record for `t`:
//!
//! | Component   | Formula (all on `t-1` weights `w` and `NAV(t-1)`)            |
//! |-------------|--------------------------------------------------------------|
//! | Price       | `Σ w_i · r_i · NAV`                                          |
//! | Dividend    | `Σ sign(w_i) · dy_i · dt · |w_i| · NAV · (1 - wh_i)`         |
//! | Funding     | `-NAV · funding(t)`                                          |
//! | Borrow      | `-Σ |min(w_i, 0)| · NAV · bps_i / 10_000 · (252 · dt)`       |
//! | Structuring | `-NAV · bps / 10_000 · (252 · dt)`                           |
//!
//! Weights then drift with prices: `v_i = w_i · NAV · P_i(t)/P_i(t-1)`,
//! `w_i(t) = v_i / Σ v_j`. Missing prices give a zero return and no drift.
//!
//! The step is a pure function: nothing here touches engine state.

use crate::config::{BasketParameters, FeeSchedule};
use crate::day_count::PERIODS_PER_YEAR;
use crate::error::{Error, Result};
use crate::series::price_relative;
use crate::types::{Date, Symbol};

/// The PnL components booked on one date, per basket unit.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PnlRow {
    pub price: f64,
    pub dividend: f64,
    pub funding: f64,
    pub borrow: f64,
    pub structuring: f64,
    /// Execution cost of rebalances booked on this date (accumulates)
    pub rebalance_cost: f64,
}

impl PnlRow {
    /// Sum of the five accrual components (excludes rebalance cost).
    #[inline]
    pub fn accrual_total(&self) -> f64 {
        self.price + self.dividend + self.funding + self.borrow + self.structuring
    }

    /// Sum of all six columns: equals `NAV(t) - NAV(t-1)`.
    #[inline]
    pub fn total(&self) -> f64 {
        self.accrual_total() + self.rebalance_cost
    }

    /// Value of one component.
    pub fn component(&self, component: PnlComponent) -> f64 {
        match component {
            PnlComponent::Price => self.price,
            PnlComponent::Dividend => self.dividend,
            PnlComponent::Funding => self.funding,
            PnlComponent::Borrow => self.borrow,
            PnlComponent::Structuring => self.structuring,
            PnlComponent::RebalanceCost => self.rebalance_cost,
        }
    }

    /// Element-wise sum.
    pub fn add(&self, other: &PnlRow) -> PnlRow {
        PnlRow {
            price: self.price + other.price,
            dividend: self.dividend + other.dividend,
            funding: self.funding + other.funding,
            borrow: self.borrow + other.borrow,
            structuring: self.structuring + other.structuring,
            rebalance_cost: self.rebalance_cost + other.rebalance_cost,
        }
    }

    /// Every column multiplied by `factor`.
    pub fn scale(&self, factor: f64) -> PnlRow {
        PnlRow {
            price: self.price * factor,
            dividend: self.dividend * factor,
            funding: self.funding * factor,
            borrow: self.borrow * factor,
            structuring: self.structuring * factor,
            rebalance_cost: self.rebalance_cost * factor,
        }
    }
}

/// Column of the PnL breakdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PnlComponent {
    Price,
    Dividend,
    Funding,
    Borrow,
    Structuring,
    RebalanceCost,
}

impl PnlComponent {
    /// All columns in report order.
    pub const ALL: [PnlComponent; 6] = [
        PnlComponent::Price,
        PnlComponent::Dividend,
        PnlComponent::Funding,
        PnlComponent::Borrow,
        PnlComponent::Structuring,
        PnlComponent::RebalanceCost,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PnlComponent::Price => "Price",
            PnlComponent::Dividend => "Dividend",
            PnlComponent::Funding => "Funding",
            PnlComponent::Borrow => "Borrow",
            PnlComponent::Structuring => "Structuring",
            PnlComponent::RebalanceCost => "RebalanceCost",
        }
    }
}

impl std::fmt::Display for PnlComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Committed state for one date.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DailyRecord {
    pub date: Date,
    /// NAV per unit at the close of `date`
    pub nav: f64,
    /// Weights carried into the next date, in column order
    pub weights: Vec<f64>,
    pub pnl: PnlRow,
}

impl DailyRecord {
    /// The record for the first date: initial NAV, seeded weights, no PnL.
    pub fn opening(date: Date, nav: f64, weights: Vec<f64>) -> Self {
        Self {
            date,
            nav,
            weights,
            pnl: PnlRow::default(),
        }
    }
}

/// Per-column rates resolved once from the fee schedule and basket parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct AccrualRates {
    /// Annual dividend yield per column
    pub dividend_yield: Vec<f64>,
    /// Effective withholding per column
    pub withholding: Vec<f64>,
    /// Annual borrow rate per column as a fraction (`bps / 10_000`)
    pub borrow_rate: Vec<f64>,
    /// Annual structuring rate as a fraction (`bps / 10_000`)
    pub structuring_rate: f64,
}

impl AccrualRates {
    pub fn resolve(symbols: &[Symbol], params: &BasketParameters, fees: &FeeSchedule) -> Self {
        Self {
            dividend_yield: symbols.iter().map(|s| params.dividend_yield(s)).collect(),
            withholding: symbols.iter().map(|s| params.withholding(s, fees)).collect(),
            borrow_rate: symbols.iter().map(|s| fees.borrow_fee(s) / 10_000.0).collect(),
            structuring_rate: fees.structuring_fee_bps / 10_000.0,
        }
    }
}

/// Market inputs for one step.
#[derive(Clone, Copy, Debug)]
pub struct MarketStep<'a> {
    pub date: Date,
    pub prev_prices: &'a [Option<f64>],
    pub prices: &'a [Option<f64>],
    /// Daily funding rate for `date`
    pub funding_rate: f64,
    /// Accrual fraction from the previous date to `date`
    pub dt: f64,
}

/// Advance one date. See the module docs for the formulas.
///
/// Fails with [`Error::DegenerateBasket`] if the drifted basket value sums to
/// zero or is not finite; nothing is returned for that date.
pub fn accrue(prev: &DailyRecord, step: &MarketStep<'_>, rates: &AccrualRates) -> Result<DailyRecord> {
    let nav = prev.nav;
    let w = &prev.weights;

    let pnl = PnlRow {
        price: price_pnl(w, step, nav),
        dividend: dividend_pnl(w, rates, step.dt, nav),
        funding: -nav * step.funding_rate,
        borrow: borrow_pnl(w, rates, step.dt, nav),
        structuring: -nav * rates.structuring_rate * (PERIODS_PER_YEAR * step.dt),
        rebalance_cost: 0.0,
    };

    let weights = drift_weights(w, step, nav)?;

    let record = DailyRecord {
        date: step.date,
        nav: nav + pnl.accrual_total(),
        weights,
        pnl,
    };
    log::trace!(
        "{} nav={:.6} price={:.6} div={:.6} fund={:.6} borrow={:.6} struct={:.6}",
        record.date,
        record.nav,
        pnl.price,
        pnl.dividend,
        pnl.funding,
        pnl.borrow,
        pnl.structuring
    );
    Ok(record)
}

fn price_pnl(w: &[f64], step: &MarketStep<'_>, nav: f64) -> f64 {
    w.iter()
        .zip(step.prev_prices.iter().zip(step.prices))
        .map(|(wi, (p0, p1))| {
            let r = price_relative(*p0, *p1).map_or(0.0, |rel| rel - 1.0);
            wi * r * nav
        })
        .sum()
}

fn dividend_pnl(w: &[f64], rates: &AccrualRates, dt: f64, nav: f64) -> f64 {
    w.iter()
        .zip(rates.dividend_yield.iter().zip(&rates.withholding))
        .map(|(wi, (dy, wh))| {
            // Shorts pay what longs receive.
            sign(*wi) * dy * dt * wi.abs() * nav * (1.0 - wh)
        })
        .sum()
}

fn borrow_pnl(w: &[f64], rates: &AccrualRates, dt: f64, nav: f64) -> f64 {
    let cost: f64 = w
        .iter()
        .zip(&rates.borrow_rate)
        .map(|(wi, rate)| wi.min(0.0).abs() * nav * rate * (PERIODS_PER_YEAR * dt))
        .sum();
    -cost
}

/// Drift weights with price relatives and renormalize by the signed aggregate.
pub fn drift_weights(w: &[f64], step: &MarketStep<'_>, nav: f64) -> Result<Vec<f64>> {
    let values: Vec<f64> = w
        .iter()
        .zip(step.prev_prices.iter().zip(step.prices))
        .map(|(wi, (p0, p1))| wi * nav * price_relative(*p0, *p1).unwrap_or(1.0))
        .collect();

    let aggregate: f64 = values.iter().sum();
    if aggregate == 0.0 || !aggregate.is_finite() {
        return Err(Error::DegenerateBasket {
            date: step.date,
            aggregate,
        });
    }
    Ok(values.into_iter().map(|v| v / aggregate).collect())
}

/// `sign(0) = 0`, unlike `f64::signum`.
#[inline]
fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f64 = 1.0 / 252.0;

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn zero_rates(n: usize) -> AccrualRates {
        AccrualRates {
            dividend_yield: vec![0.0; n],
            withholding: vec![0.0; n],
            borrow_rate: vec![0.0; n],
            structuring_rate: 0.0,
        }
    }

    fn step<'a>(p0: &'a [Option<f64>], p1: &'a [Option<f64>], funding: f64) -> MarketStep<'a> {
        MarketStep {
            date: d(3),
            prev_prices: p0,
            prices: p1,
            funding_rate: funding,
            dt: DT,
        }
    }

    #[test]
    fn price_pnl_is_weighted_return_on_nav() {
        let prev = DailyRecord::opening(d(2), 100.0, vec![0.5, 0.5]);
        let p0 = [Some(100.0), Some(50.0)];
        let p1 = [Some(110.0), Some(50.0)];
        let rec = accrue(&prev, &step(&p0, &p1, 0.0), &zero_rates(2)).unwrap();
        assert!((rec.pnl.price - 5.0).abs() < 1e-12);
        assert!((rec.nav - 105.0).abs() < 1e-12);
    }

    #[test]
    fn missing_price_contributes_nothing_and_does_not_drift() {
        let prev = DailyRecord::opening(d(2), 100.0, vec![0.5, 0.5]);
        let p0 = [Some(100.0), Some(50.0)];
        let p1 = [None, Some(50.0)];
        let rec = accrue(&prev, &step(&p0, &p1, 0.0), &zero_rates(2)).unwrap();
        assert_eq!(rec.pnl.price, 0.0);
        assert_eq!(rec.weights, vec![0.5, 0.5]);
    }

    #[test]
    fn funding_charges_whole_nav() {
        let prev = DailyRecord::opening(d(2), 100.0, vec![1.0]);
        let p = [Some(10.0)];
        let rec = accrue(&prev, &step(&p, &p, 0.001), &zero_rates(1)).unwrap();
        assert!((rec.pnl.funding + 0.1).abs() < 1e-12);
    }

    #[test]
    fn dividend_sign_follows_weight() {
        let prev = DailyRecord::opening(d(2), 100.0, vec![0.6, -0.4]);
        let rates = AccrualRates {
            dividend_yield: vec![0.0252, 0.0252],
            withholding: vec![0.0, 0.5],
            ..zero_rates(2)
        };
        let p = [Some(1.0), Some(1.0)];
        let rec = accrue(&prev, &step(&p, &p, 0.0), &rates).unwrap();
        // long: 0.0252/252 * 0.6 * 100 = 0.006 ; short: -0.0252/252 * 0.4 * 100 * 0.5 = -0.002
        assert!((rec.pnl.dividend - 0.004).abs() < 1e-12);
    }

    #[test]
    fn borrow_applies_only_to_shorts() {
        let prev = DailyRecord::opening(d(2), 100.0, vec![1.2, -0.2]);
        let rates = AccrualRates {
            borrow_rate: vec![0.0150, 0.0150],
            ..zero_rates(2)
        };
        let p = [Some(1.0), Some(1.0)];
        let rec = accrue(&prev, &step(&p, &p, 0.0), &rates).unwrap();
        // 0.2 * 100 * 0.015 * (252 / 252)
        assert!((rec.pnl.borrow + 0.3).abs() < 1e-12);
    }

    #[test]
    fn structuring_scales_with_day_count() {
        let prev = DailyRecord::opening(d(2), 200.0, vec![1.0]);
        let rates = AccrualRates {
            structuring_rate: 0.0005,
            ..zero_rates(1)
        };
        let p = [Some(1.0)];
        let rec = accrue(&prev, &step(&p, &p, 0.0), &rates).unwrap();
        assert!((rec.pnl.structuring + 0.1).abs() < 1e-12);
    }

    #[test]
    fn drift_renormalizes_by_signed_value() {
        let prev = DailyRecord::opening(d(2), 100.0, vec![0.5, 0.5]);
        let p0 = [Some(100.0), Some(100.0)];
        let p1 = [Some(200.0), Some(100.0)];
        let rec = accrue(&prev, &step(&p0, &p1, 0.0), &zero_rates(2)).unwrap();
        // values 100 and 50 -> 2/3, 1/3
        assert!((rec.weights[0] - 2.0 / 3.0).abs() < 1e-12);
        assert!((rec.weights[1] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn zero_aggregate_is_degenerate() {
        let prev = DailyRecord::opening(d(2), 100.0, vec![0.5, -0.5]);
        let p = [Some(10.0), Some(10.0)];
        let err = accrue(&prev, &step(&p, &p, 0.0), &zero_rates(2)).unwrap_err();
        assert!(matches!(err, Error::DegenerateBasket { date, .. } if date == d(3)));
    }

    #[test]
    fn row_totals() {
        let row = PnlRow {
            price: 1.0,
            dividend: 0.5,
            funding: -0.25,
            borrow: -0.125,
            structuring: -0.0625,
            rebalance_cost: -0.03125,
        };
        assert!((row.accrual_total() - 1.0625).abs() < 1e-12);
        assert!((row.total() - 1.03125).abs() < 1e-12);
        assert_eq!(row.component(PnlComponent::Borrow), -0.125);
        assert_eq!(row.add(&row).price, 2.0);
        assert_eq!(row.scale(2.0).dividend, 1.0);
    }
}
