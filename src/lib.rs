//! # basketbook
//!
//! A deterministic NAV simulator for delta-one equity baskets with daily PnL attribution.
//!
//! ## Features
//!
//! - **Weight drift**: holdings move with prices between rebalances
//! - **Accruals**: dividends net of withholding, funding, short borrow, structuring fee
//! - **Rebalances**: scheduled target weights with a turnover-based execution cost
//! - **Attribution**: every NAV change decomposes exactly into six PnL components
//! - **Deterministic replay**: scheduling a rebalance after a run replays the walk
//!
//! ## Quick Start
//!
//! ```
//! use basketbook::{BasketEngine, Date, FeeSchedule, PriceSeries, Symbol};
//!
//! let dates: Vec<Date> = (6..=10).map(|d| Date::from_ymd_opt(2025, 1, d).unwrap()).collect();
//! let prices = PriceSeries::from_closes(
//!     dates.clone(),
//!     vec![
//!         (Symbol::new("AAPL"), vec![100.0, 102.0, 101.0, 103.0, 104.0]),
//!         (Symbol::new("MSFT"), vec![400.0, 404.0, 402.0, 406.0, 410.0]),
//!     ],
//! )
//! .unwrap();
//!
//! let mut engine = BasketEngine::builder(
//!     prices,
//!     &[(Symbol::new("AAPL"), 0.6), (Symbol::new("MSFT"), 0.4)],
//! )
//! .fees(FeeSchedule::zero().with_execution_cost_bps(2.0))
//! .build()
//! .unwrap();
//!
//! engine.rebalance(dates[2], &[(Symbol::new("AAPL"), 0.5), (Symbol::new("MSFT"), 0.5)]).unwrap();
//! engine.run().unwrap();
//!
//! let results = engine.results().unwrap();
//! assert_eq!(results.rebalances.len(), 1);
//! assert!(results.pnl_breakdown.totals().rebalance_cost < 0.0);
//! assert!(results.max_conservation_error() < 1e-9);
//! ```
//!
//! ## Conventions
//!
//! | Quantity | Convention |
//! |----------|------------|
//! | Weights | fraction of NAV, normalized so gross exposure is 1 |
//! | Fees | basis points (1 bps = 0.01%) |
//! | Yields, funding | decimal fractions (0.05 = 5%) |
//! | Accrual period | `1/252` per index step by default, see [`DayCountConvention`] |
//!
//! Short positions earn negative dividend PnL and pay borrow; the
//! structuring fee is charged on full NAV.
//!
//! ## Feature flags
//!
//! - `serde`: `Serialize`/`Deserialize` on configuration and result types
//! - `persistence`: JSON and JSON Lines save/load of results (implies `serde`)

pub mod accrual;
mod config;
pub mod day_count;
mod engine;
mod error;
pub mod metrics;
#[cfg(feature = "persistence")]
pub mod persistence;
pub mod rebalance;
mod results;
mod series;
mod types;
pub mod weights;

// Re-export public API
pub use accrual::{DailyRecord, PnlComponent, PnlRow};
pub use config::{BasketParameters, DEFAULT_INITIAL_NAV, DEFAULT_INITIAL_NOTIONAL, FeeSchedule};
pub use day_count::{DayCount, DayCountConvention, PERIODS_PER_YEAR};
pub use engine::{BasketEngine, EngineBuilder};
pub use error::{Error, Result};
pub use metrics::{Metrics, compute_metrics};
pub use rebalance::{CostModel, RebalanceBooking, RebalanceEvent, turnover};
pub use results::{Attribution, BasketResults, NavSeries, PnlBreakdown};
pub use series::{FundingRate, PriceSeries, price_relative};
pub use types::{Date, SYMBOL_CAPACITY, Symbol};
pub use weights::{WeightLedger, normalize};
