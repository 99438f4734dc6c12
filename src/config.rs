//! Fee schedule and basket parameters.
//!
//! Both are plain value types owned by the engine for its whole lifetime;
//! changing them means building a new engine.

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::rebalance::CostModel;
use crate::types::Symbol;

/// Reference per-unit NAV when none is configured.
pub const DEFAULT_INITIAL_NAV: f64 = 100.0;

/// Reference notional when none is configured.
pub const DEFAULT_INITIAL_NOTIONAL: f64 = 1_000_000.0;

/// Fees charged by the basket sponsor and the executing desk.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FeeSchedule {
    /// Structuring fee on NAV, basis points per year
    pub structuring_fee_bps: f64,
    /// Execution cost per unit of rebalance turnover, basis points
    pub execution_cost_bps: f64,
    /// Withholding tax applied to dividends when no per-symbol override exists (0.15 = 15%)
    pub default_withholding: f64,
    /// Annualized borrow fee for short holdings, basis points per symbol
    pub borrow_fee_bps: FxHashMap<Symbol, f64>,
}

impl FeeSchedule {
    /// A fee-free schedule.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn with_structuring_fee_bps(mut self, bps: f64) -> Self {
        self.structuring_fee_bps = bps;
        self
    }

    pub fn with_execution_cost_bps(mut self, bps: f64) -> Self {
        self.execution_cost_bps = bps;
        self
    }

    pub fn with_default_withholding(mut self, fraction: f64) -> Self {
        self.default_withholding = fraction;
        self
    }

    pub fn with_borrow_fee_bps(mut self, symbol: Symbol, bps: f64) -> Self {
        self.borrow_fee_bps.insert(symbol, bps);
        self
    }

    /// Execution cost model charged on rebalance turnover.
    pub fn cost_model(&self) -> CostModel {
        CostModel {
            execution_bps: self.execution_cost_bps,
        }
    }

    /// Borrow fee for `symbol` (bps per year), zero if not configured.
    #[inline]
    pub fn borrow_fee(&self, symbol: &Symbol) -> f64 {
        self.borrow_fee_bps.get(symbol).copied().unwrap_or(0.0)
    }

    /// Validate value ranges.
    pub fn validate(&self) -> Result<()> {
        non_negative("structuring_fee_bps", self.structuring_fee_bps)?;
        non_negative("execution_cost_bps", self.execution_cost_bps)?;
        fraction("default_withholding", self.default_withholding)?;
        for (sym, &bps) in &self.borrow_fee_bps {
            non_negative(&format!("borrow_fee_bps[{sym}]"), bps)?;
        }
        Ok(())
    }
}

/// Basket-level economic parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BasketParameters {
    /// NAV per unit on the first date
    pub initial_nav: f64,
    /// Reference notional; scales per-unit PnL into absolute amounts for reporting only
    pub initial_notional: f64,
    /// Annualized dividend yield per symbol (0.005 = 0.5%)
    pub dividend_yield: FxHashMap<Symbol, f64>,
    /// Per-symbol withholding, takes precedence over [`FeeSchedule::default_withholding`]
    pub withholding_override: FxHashMap<Symbol, f64>,
}

impl Default for BasketParameters {
    fn default() -> Self {
        Self {
            initial_nav: DEFAULT_INITIAL_NAV,
            initial_notional: DEFAULT_INITIAL_NOTIONAL,
            dividend_yield: FxHashMap::default(),
            withholding_override: FxHashMap::default(),
        }
    }
}

impl BasketParameters {
    pub fn with_initial_nav(mut self, nav: f64) -> Self {
        self.initial_nav = nav;
        self
    }

    pub fn with_initial_notional(mut self, notional: f64) -> Self {
        self.initial_notional = notional;
        self
    }

    pub fn with_dividend_yield(mut self, symbol: Symbol, yield_ann: f64) -> Self {
        self.dividend_yield.insert(symbol, yield_ann);
        self
    }

    pub fn with_withholding(mut self, symbol: Symbol, fraction: f64) -> Self {
        self.withholding_override.insert(symbol, fraction);
        self
    }

    /// Annual dividend yield for `symbol`, zero if not configured.
    #[inline]
    pub fn dividend_yield(&self, symbol: &Symbol) -> f64 {
        self.dividend_yield.get(symbol).copied().unwrap_or(0.0)
    }

    /// Effective withholding for `symbol`: the override if set, else the fee schedule default.
    #[inline]
    pub fn withholding(&self, symbol: &Symbol, fees: &FeeSchedule) -> f64 {
        self.withholding_override
            .get(symbol)
            .copied()
            .unwrap_or(fees.default_withholding)
    }

    /// Per-unit to absolute scaling: `initial_notional / initial_nav`.
    #[inline]
    pub fn notional_scale(&self) -> f64 {
        self.initial_notional / self.initial_nav
    }

    /// Validate value ranges.
    pub fn validate(&self) -> Result<()> {
        positive("initial_nav", self.initial_nav)?;
        positive("initial_notional", self.initial_notional)?;
        for (sym, &y) in &self.dividend_yield {
            non_negative(&format!("dividend_yield[{sym}]"), y)?;
        }
        for (sym, &w) in &self.withholding_override {
            fraction(&format!("withholding_override[{sym}]"), w)?;
        }
        Ok(())
    }
}

fn positive(name: &str, v: f64) -> Result<()> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("{name} must be finite and > 0, got {v}")))
    }
}

fn non_negative(name: &str, v: f64) -> Result<()> {
    if v.is_finite() && v >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("{name} must be finite and >= 0, got {v}")))
    }
}

fn fraction(name: &str, v: f64) -> Result<()> {
    if v.is_finite() && (0.0..=1.0).contains(&v) {
        Ok(())
    } else {
        Err(Error::InvalidConfig(format!("{name} must be in [0, 1], got {v}")))
    }
}
