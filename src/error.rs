//! Error types for basket construction, rebalancing, and simulation.

use crate::types::{Date, Symbol, join_symbols};

/// All errors returned by the basket engine.
///
/// Every error is raised before the affected row is committed, so a failed
/// call never leaves a partially written NAV, PnL, or weight row behind.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    /// Weights reference symbols that are not columns of the price table.
    #[error("unknown symbols in weights: {}", join_symbols(.0))]
    UnknownSymbols(Vec<Symbol>),

    /// A rebalance targeted a date that is not in the price index.
    #[error("date not found in price index: {0}")]
    DateNotFound(Date),

    /// The price table violates its shape or value invariants.
    #[error("invalid price table: {0}")]
    InvalidPriceTable(String),

    /// A fee, parameter, or funding input is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The drifted basket value collapsed to zero (or became non-finite).
    #[error("degenerate basket on {date}: drifted aggregate value is {aggregate}")]
    DegenerateBasket { date: Date, aggregate: f64 },

    /// Results were requested before the first `run()`.
    #[error("engine has not been run")]
    NotRun,
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
