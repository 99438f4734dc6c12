//! basketbook-cli: command-line runner for the basketbook NAV simulator.
//!
//! Reads a wide CSV price table, a TOML config (fees, parameters, funding),
//! and an optional JSON rebalance schedule; runs the accrual walk and prints
//! NAV, PnL attribution, and performance metrics, with an optional JSON
//! results file and JSONL audit trail.

pub mod audit;
pub mod config;
pub mod error;
pub mod prices;
pub mod report;
pub mod runner;
pub mod schedule;
