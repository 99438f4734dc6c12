//! Rebalance schedule (schedule.json) loading and validation.

use std::path::Path;

use basketbook::{BasketEngine, Date, Symbol};
use rustc_hash::FxHashSet;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Rebalances to replay during a run.
#[derive(Debug, Clone, Deserialize)]
pub struct RebalanceSchedule {
    pub rebalances: Vec<ScheduledRebalance>,
}

/// One rebalance: a date and its raw target weights.
#[derive(Debug, Clone, Deserialize)]
pub struct ScheduledRebalance {
    pub date: Date,
    pub weights: Vec<TargetWeight>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetWeight {
    pub symbol: String,
    pub weight: f64,
}

impl RebalanceSchedule {
    /// Load and validate a schedule file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ScheduleRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json(&contents)
    }

    /// Parse from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let schedule: RebalanceSchedule = serde_json::from_str(json)?;
        schedule.validate()?;
        Ok(schedule)
    }

    /// Validate each entry. Whether symbols and dates exist in the price
    /// table is checked by the engine when the schedule is applied.
    fn validate(&self) -> Result<()> {
        for entry in &self.rebalances {
            if entry.weights.is_empty() {
                return Err(Error::Schedule(format!("{}: weights list is empty", entry.date)));
            }

            let mut seen = FxHashSet::default();
            for t in &entry.weights {
                if Symbol::try_new(&t.symbol).is_none() {
                    return Err(Error::Schedule(format!(
                        "{}: invalid symbol '{}'",
                        entry.date, t.symbol
                    )));
                }
                if !seen.insert(t.symbol.as_str()) {
                    return Err(Error::Schedule(format!(
                        "{}: duplicate symbol {}",
                        entry.date, t.symbol
                    )));
                }
                if !t.weight.is_finite() {
                    return Err(Error::Schedule(format!(
                        "{}: weight for {} is not finite",
                        entry.date, t.symbol
                    )));
                }
            }

            let gross: f64 = entry.weights.iter().map(|t| t.weight.abs()).sum();
            if gross == 0.0 {
                return Err(Error::Schedule(format!(
                    "{}: target has zero gross exposure",
                    entry.date
                )));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rebalances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rebalances.is_empty()
    }

    /// Schedule every rebalance on `engine`, in file order.
    pub fn apply(&self, engine: &mut BasketEngine) -> Result<()> {
        for entry in &self.rebalances {
            engine.rebalance(entry.date, &entry.target_pairs())?;
        }
        Ok(())
    }
}

impl ScheduledRebalance {
    /// `(Symbol, weight)` pairs for the engine.
    pub fn target_pairs(&self) -> Vec<(Symbol, f64)> {
        self.weights
            .iter()
            .filter_map(|t| Symbol::try_new(&t.symbol).map(|s| (s, t.weight)))
            .collect()
    }
}
