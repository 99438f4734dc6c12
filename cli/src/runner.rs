//! Run orchestrator: load inputs → build engine → replay schedule → report.

use std::path::{Path, PathBuf};

use basketbook::{BasketEngine, BasketResults, Date, FundingRate, PriceSeries, Symbol};
use log::{info, warn};

use crate::audit::{self, AuditLog};
use crate::config::{Config, FundingSource};
use crate::error::Result;
use crate::prices;
use crate::schedule::RebalanceSchedule;

/// Options for a `run` or `validate` invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub prices_file: PathBuf,
    pub schedule_file: Option<PathBuf>,
    /// Write full results as JSON here
    pub output_file: Option<PathBuf>,
    /// Append to the audit trail configured in `[output]`
    pub audit: bool,
}

/// Everything a run needs, loaded and validated.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub prices: PriceSeries,
    pub funding: FundingRate,
    pub schedule: Option<RebalanceSchedule>,
}

/// Summary printed by `validate`.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationSummary {
    pub symbols: usize,
    pub dates: usize,
    pub first_date: Date,
    pub last_date: Date,
    pub missing_prices: usize,
    pub rebalances: usize,
    pub day_count: &'static str,
}

impl std::fmt::Display for ValidationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Inputs OK")?;
        writeln!(f, "  Symbols:         {}", self.symbols)?;
        writeln!(
            f,
            "  Dates:           {} ({} .. {})",
            self.dates, self.first_date, self.last_date
        )?;
        writeln!(f, "  Missing prices:  {}", self.missing_prices)?;
        writeln!(f, "  Rebalances:      {}", self.rebalances)?;
        writeln!(f, "  Day count:       {}", self.day_count)
    }
}

/// Load prices, funding, and the optional schedule.
pub fn load_inputs(config: &Config, opts: &RunOptions) -> Result<Inputs> {
    let prices = prices::load_prices(&opts.prices_file)?;
    let funding = match config.funding_source()? {
        FundingSource::Constant(rate) => FundingRate::Constant(rate),
        FundingSource::File(path) => FundingRate::Series(prices::load_funding(&path)?),
    };
    let schedule = opts
        .schedule_file
        .as_deref()
        .map(RebalanceSchedule::load)
        .transpose()?;
    Ok(Inputs {
        prices,
        funding,
        schedule,
    })
}

/// Build the engine and schedule every rebalance on it.
pub fn build_engine(config: &Config, inputs: Inputs) -> Result<BasketEngine> {
    let weights = match config.initial_weights()? {
        Some(w) => w,
        None => {
            info!("no [basket.weights] configured; using equal weights");
            equal_weights(inputs.prices.symbols())
        }
    };

    let mut engine = BasketEngine::builder(inputs.prices, &weights)
        .funding(inputs.funding)
        .parameters(config.parameters()?)
        .fees(config.fee_schedule()?)
        .day_count(config.basket.day_count)
        .build()?;

    if let Some(schedule) = &inputs.schedule {
        schedule.apply(&mut engine)?;
    }
    Ok(engine)
}

fn equal_weights(symbols: &[Symbol]) -> Vec<(Symbol, f64)> {
    let w = 1.0 / symbols.len() as f64;
    symbols.iter().map(|s| (*s, w)).collect()
}

/// Load and check every input without simulating.
pub fn validate(config: &Config, opts: &RunOptions) -> Result<ValidationSummary> {
    let inputs = load_inputs(config, opts)?;
    let prices = &inputs.prices;
    let missing_prices: usize = (0..prices.len())
        .map(|t| prices.row(t).iter().filter(|p| p.is_none()).count())
        .sum();

    let summary = ValidationSummary {
        symbols: prices.symbols().len(),
        dates: prices.len(),
        first_date: prices.dates()[0],
        last_date: prices.dates()[prices.len() - 1],
        missing_prices,
        rebalances: inputs.schedule.as_ref().map_or(0, RebalanceSchedule::len),
        day_count: basketbook::DayCount::name(&config.basket.day_count),
    };

    let engine = build_engine(config, inputs)?;
    info!(
        "validated {} symbols x {} dates, {} rebalances scheduled",
        summary.symbols,
        summary.dates,
        engine.schedule().len()
    );
    Ok(summary)
}

/// Execute a full run and return its results.
pub fn run(config: &Config, opts: &RunOptions) -> Result<BasketResults> {
    let inputs = load_inputs(config, opts)?;

    let mut audit = if opts.audit {
        Some(AuditLog::open(&config.audit_path())?)
    } else {
        None
    };
    if let Some(audit) = audit.as_mut() {
        audit::log_run_started(
            audit,
            &display(&opts.prices_file),
            opts.schedule_file.as_deref().map(display).as_deref(),
            inputs.prices.symbols().len(),
            inputs.prices.len(),
        )?;
    }

    let outcome = build_engine(config, inputs).and_then(|mut engine| {
        engine.run()?;
        Ok(engine.results()?)
    });

    let results = match outcome {
        Ok(results) => results,
        Err(e) => {
            if let Some(audit) = audit.as_mut() {
                if let Err(log_err) = audit::log_run_failed(audit, &e.to_string()) {
                    warn!("failed to record run failure in audit log: {log_err}");
                }
            }
            return Err(e);
        }
    };

    if let Some(audit) = audit.as_mut() {
        for booking in &results.rebalances {
            audit::log_rebalance(audit, booking)?;
        }
        audit::log_run_completed(audit, &results.attribution())?;
    }

    if let Some(path) = &opts.output_file {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        results.save_json(path)?;
        info!("results written to {}", path.display());
    }

    Ok(results)
}

fn display(path: &Path) -> String {
    path.display().to_string()
}
