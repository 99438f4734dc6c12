//! TOML configuration loading and validation.

use std::path::{Path, PathBuf};

use basketbook::{BasketParameters, DayCountConvention, FeeSchedule, PERIODS_PER_YEAR, Symbol};
use rustc_hash::FxHashMap;
use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration. Every table is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub basket: BasketConfig,
    pub fees: FeesConfig,
    pub funding: FundingConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BasketConfig {
    #[serde(default = "default_initial_nav")]
    pub initial_nav: f64,
    #[serde(default = "default_initial_notional")]
    pub initial_notional: f64,
    #[serde(default)]
    pub day_count: DayCountConvention,
    /// Initial raw weights per symbol; empty means equal weight across the price table
    #[serde(default)]
    pub weights: FxHashMap<String, f64>,
    /// Annual dividend yield per symbol
    #[serde(default)]
    pub dividend_yield: FxHashMap<String, f64>,
    /// Per-symbol withholding overrides
    #[serde(default)]
    pub withholding: FxHashMap<String, f64>,
}

impl Default for BasketConfig {
    fn default() -> Self {
        Self {
            initial_nav: default_initial_nav(),
            initial_notional: default_initial_notional(),
            day_count: DayCountConvention::default(),
            weights: FxHashMap::default(),
            dividend_yield: FxHashMap::default(),
            withholding: FxHashMap::default(),
        }
    }
}

fn default_initial_nav() -> f64 {
    basketbook::DEFAULT_INITIAL_NAV
}
fn default_initial_notional() -> f64 {
    basketbook::DEFAULT_INITIAL_NOTIONAL
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeesConfig {
    pub structuring_fee_bps: f64,
    pub execution_cost_bps: f64,
    pub default_withholding: f64,
    pub borrow_fee_bps: FxHashMap<String, f64>,
}

/// Funding input. At most one of `rate`, `annual_rate`, `file` may be set;
/// none means zero funding.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FundingConfig {
    /// Constant daily rate (0.0002 = 2 bps per day)
    pub rate: Option<f64>,
    /// Constant annual rate, converted to daily by dividing by 252
    pub annual_rate: Option<f64>,
    /// CSV of `date,rate` daily observations
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub dir: String,
    #[serde(default = "default_audit_file")]
    pub audit_file: String,
    /// Number of trailing NAV rows printed by `run`
    #[serde(default = "default_tail")]
    pub tail: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            audit_file: default_audit_file(),
            tail: default_tail(),
        }
    }
}

fn default_output_dir() -> String {
    "./output".into()
}
fn default_audit_file() -> String {
    "audit.jsonl".into()
}
fn default_tail() -> usize {
    10
}

/// The constant or file-backed funding source after validation.
#[derive(Debug, Clone, PartialEq)]
pub enum FundingSource {
    Constant(f64),
    File(PathBuf),
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate symbols, value ranges, and funding exclusivity.
    fn validate(&self) -> Result<()> {
        self.initial_weights()?;
        self.parameters()?.validate()?;
        self.fee_schedule()?.validate()?;
        self.funding_source()?;
        Ok(())
    }

    /// Initial weights in symbol order, or `None` for equal weight.
    pub fn initial_weights(&self) -> Result<Option<Vec<(Symbol, f64)>>> {
        if self.basket.weights.is_empty() {
            return Ok(None);
        }
        let mut pairs = self
            .basket
            .weights
            .iter()
            .map(|(name, &w)| Ok((symbol(name, "basket.weights")?, finite("basket.weights", w)?)))
            .collect::<Result<Vec<_>>>()?;
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(Some(pairs))
    }

    /// Basket parameters for the engine.
    pub fn parameters(&self) -> Result<BasketParameters> {
        let mut params = BasketParameters::default()
            .with_initial_nav(self.basket.initial_nav)
            .with_initial_notional(self.basket.initial_notional);
        for (name, &y) in &self.basket.dividend_yield {
            params = params.with_dividend_yield(symbol(name, "basket.dividend_yield")?, y);
        }
        for (name, &w) in &self.basket.withholding {
            params = params.with_withholding(symbol(name, "basket.withholding")?, w);
        }
        Ok(params)
    }

    /// Fee schedule for the engine.
    pub fn fee_schedule(&self) -> Result<FeeSchedule> {
        let mut fees = FeeSchedule::zero()
            .with_structuring_fee_bps(self.fees.structuring_fee_bps)
            .with_execution_cost_bps(self.fees.execution_cost_bps)
            .with_default_withholding(self.fees.default_withholding);
        for (name, &bps) in &self.fees.borrow_fee_bps {
            fees = fees.with_borrow_fee_bps(symbol(name, "fees.borrow_fee_bps")?, bps);
        }
        Ok(fees)
    }

    /// Resolve the `[funding]` table.
    pub fn funding_source(&self) -> Result<FundingSource> {
        let f = &self.funding;
        match (f.rate, f.annual_rate, &f.file) {
            (None, None, None) => Ok(FundingSource::Constant(0.0)),
            (Some(r), None, None) => Ok(FundingSource::Constant(finite("funding.rate", r)?)),
            (None, Some(r), None) => Ok(FundingSource::Constant(
                finite("funding.annual_rate", r)? / PERIODS_PER_YEAR,
            )),
            (None, None, Some(path)) => Ok(FundingSource::File(path.clone())),
            _ => Err(Error::Config(
                "funding: set at most one of rate, annual_rate, file".into(),
            )),
        }
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> PathBuf {
        Path::new(&self.output.dir).join(&self.output.audit_file)
    }
}

fn symbol(name: &str, table: &str) -> Result<Symbol> {
    Symbol::try_new(name).ok_or_else(|| {
        Error::Config(format!(
            "{table}: '{name}' is not a valid symbol (1..={} bytes)",
            basketbook::SYMBOL_CAPACITY
        ))
    })
}

fn finite(name: &str, v: f64) -> Result<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(Error::Config(format!("{name} must be finite, got {v}")))
    }
}
