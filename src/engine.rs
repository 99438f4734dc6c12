//! The basket engine: construction, the accrual walk, and rebalancing.
//!
//! The walk is a fold over the date index. Each step produces an immutable
//! [`DailyRecord`] from the previous one; scheduled rebalances are replayed
//! in date order inside the fold, after that date's drift, so a rebalance and
//! a drift step on the same date always resolve the same way.
//!
//! # Example
//!
//! ```
//! use basketbook::{BasketEngine, Date, PriceSeries, Symbol};
//!
//! let dates: Vec<Date> = (2..=6).map(|d| Date::from_ymd_opt(2025, 1, d).unwrap()).collect();
//! let prices = PriceSeries::from_closes(
//!     dates.clone(),
//!     vec![
//!         (Symbol::new("AAPL"), vec![100.0, 101.0, 102.0, 101.0, 103.0]),
//!         (Symbol::new("MSFT"), vec![400.0, 398.0, 402.0, 404.0, 401.0]),
//!     ],
//! )
//! .unwrap();
//!
//! let mut engine = BasketEngine::new(
//!     prices,
//!     &[(Symbol::new("AAPL"), 0.5), (Symbol::new("MSFT"), 0.5)],
//! )
//! .unwrap();
//! engine.run().unwrap();
//!
//! let results = engine.results().unwrap();
//! assert_eq!(results.nav.first(), Some(100.0));
//! assert!(results.max_conservation_error() < 1e-9);
//! ```

use crate::accrual::{AccrualRates, DailyRecord, MarketStep, accrue};
use crate::config::{BasketParameters, FeeSchedule};
use crate::day_count::{DayCount, DayCountConvention};
use crate::error::{Error, Result};
use crate::rebalance::{CostModel, RebalanceBooking, RebalanceEvent, turnover};
use crate::results::BasketResults;
use crate::series::{FundingRate, PriceSeries};
use crate::types::{Date, Symbol};
use crate::weights::{align_weights, normalize};

/// Builder for [`BasketEngine`] with optional funding, fees, parameters, and day count.
#[derive(Debug)]
pub struct EngineBuilder {
    prices: PriceSeries,
    initial_weights: Vec<(Symbol, f64)>,
    funding: FundingRate,
    params: BasketParameters,
    fees: FeeSchedule,
    day_count: Box<dyn DayCount>,
}

impl EngineBuilder {
    pub fn funding(mut self, funding: FundingRate) -> Self {
        self.funding = funding;
        self
    }

    pub fn parameters(mut self, params: BasketParameters) -> Self {
        self.params = params;
        self
    }

    pub fn fees(mut self, fees: FeeSchedule) -> Self {
        self.fees = fees;
        self
    }

    pub fn day_count(mut self, day_count: impl DayCount + 'static) -> Self {
        self.day_count = Box::new(day_count);
        self
    }

    /// Validate inputs and allocate the engine.
    pub fn build(self) -> Result<BasketEngine> {
        self.params.validate()?;
        self.fees.validate()?;

        let symbols = self.prices.symbols().to_vec();
        let raw = align_weights(&symbols, &self.initial_weights)?;
        let funding = self.funding.align(self.prices.dates())?;
        let rates = AccrualRates::resolve(&symbols, &self.params, &self.fees);

        log::debug!(
            "basket engine: {} symbols x {} dates, day count {}",
            symbols.len(),
            self.prices.len(),
            self.day_count.name()
        );

        Ok(BasketEngine {
            cost_model: self.fees.cost_model(),
            initial_weights: normalize(&raw),
            prices: self.prices,
            funding,
            params: self.params,
            fees: self.fees,
            day_count: self.day_count,
            rates,
            schedule: Vec::new(),
            records: Vec::new(),
            bookings: Vec::new(),
        })
    }
}

/// Delta-one basket simulator.
///
/// Owns its price table, configuration, rebalance schedule, and the records
/// of the last walk. Independent engines share nothing and can run on
/// separate threads.
#[derive(Debug)]
pub struct BasketEngine {
    prices: PriceSeries,
    /// Funding rate per index date
    funding: Vec<f64>,
    params: BasketParameters,
    fees: FeeSchedule,
    cost_model: CostModel,
    day_count: Box<dyn DayCount>,
    rates: AccrualRates,
    /// Normalized initial weights, column order
    initial_weights: Vec<f64>,
    /// Sorted by index; same-date events keep submission order
    schedule: Vec<RebalanceEvent>,
    /// Output of the last walk; empty until `run()`
    records: Vec<DailyRecord>,
    bookings: Vec<RebalanceBooking>,
}

impl BasketEngine {
    /// Start building an engine over `prices` with the given initial weights.
    pub fn builder(prices: PriceSeries, initial_weights: &[(Symbol, f64)]) -> EngineBuilder {
        EngineBuilder {
            prices,
            initial_weights: initial_weights.to_vec(),
            funding: FundingRate::default(),
            params: BasketParameters::default(),
            fees: FeeSchedule::default(),
            day_count: Box::new(DayCountConvention::default()),
        }
    }

    /// Engine with zero funding, default parameters, and no fees.
    pub fn new(prices: PriceSeries, initial_weights: &[(Symbol, f64)]) -> Result<Self> {
        Self::builder(prices, initial_weights).build()
    }

    /// Engine with every input supplied, in the collaborator-facing argument order.
    pub fn with_config(
        prices: PriceSeries,
        initial_weights: &[(Symbol, f64)],
        funding: FundingRate,
        params: BasketParameters,
        fees: FeeSchedule,
    ) -> Result<Self> {
        Self::builder(prices, initial_weights)
            .funding(funding)
            .parameters(params)
            .fees(fees)
            .build()
    }

    // === Queries ===

    pub fn prices(&self) -> &PriceSeries {
        &self.prices
    }

    pub fn symbols(&self) -> &[Symbol] {
        self.prices.symbols()
    }

    pub fn parameters(&self) -> &BasketParameters {
        &self.params
    }

    pub fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    /// Funding rate per index date after alignment.
    pub fn funding_rates(&self) -> &[f64] {
        &self.funding
    }

    /// Normalized initial weights, in column order.
    pub fn initial_weights(&self) -> &[f64] {
        &self.initial_weights
    }

    /// Scheduled rebalances in replay order.
    pub fn schedule(&self) -> &[RebalanceEvent] {
        &self.schedule
    }

    /// True once `run()` has committed a walk.
    pub fn has_run(&self) -> bool {
        !self.records.is_empty()
    }

    // === Operations ===

    /// Walk the full date index, replacing any previous output.
    ///
    /// Deterministic: running twice on an unchanged engine yields identical records.
    pub fn run(&mut self) -> Result<()> {
        let (records, bookings) = self.walk(&self.schedule)?;
        if let Some(last) = records.last() {
            log::info!(
                "basket run complete: {} dates, {} rebalances, final nav {:.6}",
                records.len(),
                bookings.len(),
                last.nav
            );
        }
        self.records = records;
        self.bookings = bookings;
        Ok(())
    }

    /// Schedule a rebalance to `target_weights` on `date`.
    ///
    /// The target is normalized and becomes the weight row for `date`; an
    /// execution cost proportional to turnover against the previous date's
    /// row is booked on `date`. A rebalance on the first date only reseeds the
    /// opening weights.
    ///
    /// If the engine has already run, the walk is replayed so results reflect
    /// the new event immediately. On error nothing is changed.
    pub fn rebalance(&mut self, date: Date, target_weights: &[(Symbol, f64)]) -> Result<()> {
        let index = self.prices.index_of(date).ok_or(Error::DateNotFound(date))?;
        let raw = align_weights(self.prices.symbols(), target_weights)?;
        let event = RebalanceEvent {
            date,
            index,
            weights: normalize(&raw),
        };

        let mut schedule = self.schedule.clone();
        let pos = schedule.partition_point(|e| e.index <= index);
        schedule.insert(pos, event);

        if self.has_run() {
            let (records, bookings) = self.walk(&schedule)?;
            self.records = records;
            self.bookings = bookings;
        }
        self.schedule = schedule;
        log::debug!("rebalance scheduled on {date}");
        Ok(())
    }

    /// Snapshot of NAV, PnL breakdown, weights, and rebalance bookings.
    pub fn results(&self) -> Result<BasketResults> {
        if !self.has_run() {
            return Err(Error::NotRun);
        }
        Ok(BasketResults::from_records(
            self.prices.symbols().to_vec(),
            &self.records,
            self.bookings.clone(),
            self.params.notional_scale(),
        ))
    }

    // === Internal ===

    /// Fold over the date index with `schedule` replayed in order.
    fn walk(&self, schedule: &[RebalanceEvent]) -> Result<(Vec<DailyRecord>, Vec<RebalanceBooking>)> {
        let dates = self.prices.dates();
        let mut records: Vec<DailyRecord> = Vec::with_capacity(dates.len());
        let mut bookings = Vec::new();
        let mut events = schedule.iter().peekable();

        let mut opening = DailyRecord::opening(
            dates[0],
            self.params.initial_nav,
            self.initial_weights.clone(),
        );
        while let Some(event) = events.next_if(|e| e.index == 0) {
            opening.weights = event.weights.clone();
        }
        records.push(opening);

        for t in 1..dates.len() {
            let prev = &records[t - 1];
            let step = MarketStep {
                date: dates[t],
                prev_prices: self.prices.row(t - 1),
                prices: self.prices.row(t),
                funding_rate: self.funding[t],
                dt: self.day_count.year_fraction(dates[t - 1], dates[t]),
            };
            let mut record = accrue(prev, &step, &self.rates)?;

            while let Some(event) = events.next_if(|e| e.index == t) {
                let booking = self.book(prev, event);
                record.nav += booking.cost;
                record.pnl.rebalance_cost += booking.cost;
                record.weights = booking.target_weights.clone();
                bookings.push(booking);
            }

            records.push(record);
        }

        Ok((records, bookings))
    }

    fn book(&self, prev: &DailyRecord, event: &RebalanceEvent) -> RebalanceBooking {
        let turnover = turnover(&prev.weights, &event.weights, prev.nav);
        let cost = -self.cost_model.compute_cost(turnover);
        log::info!(
            "rebalance on {}: turnover {:.6}, cost {:.6}",
            event.date,
            turnover,
            cost
        );
        RebalanceBooking {
            date: event.date,
            previous_weights: prev.weights.clone(),
            target_weights: event.weights.clone(),
            reference_nav: prev.nav,
            turnover,
            cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(n: usize) -> Vec<Date> {
        let start = Date::from_ymd_opt(2025, 1, 6).unwrap();
        (0..n).map(|i| start + chrono::Days::new(i as u64)).collect()
    }

    fn sym(s: &str) -> Symbol {
        Symbol::new(s)
    }

    fn flat_prices(n: usize) -> PriceSeries {
        PriceSeries::from_closes(
            dates(n),
            vec![
                (sym("A"), vec![100.0; n]),
                (sym("B"), vec![50.0; n]),
                (sym("C"), vec![20.0; n]),
            ],
        )
        .unwrap()
    }

    fn abc() -> Vec<(Symbol, f64)> {
        vec![(sym("A"), 0.4), (sym("B"), 0.4), (sym("C"), 0.2)]
    }

    #[test]
    fn construction_rejects_unknown_symbols() {
        let err = BasketEngine::new(flat_prices(3), &[(sym("A"), 0.5), (sym("ZZZ"), 0.5)])
            .unwrap_err();
        assert_eq!(err, Error::UnknownSymbols(vec![sym("ZZZ")]));
    }

    #[test]
    fn construction_normalizes_initial_weights() {
        let engine = BasketEngine::new(flat_prices(3), &[(sym("A"), 2.0), (sym("B"), 2.0)]).unwrap();
        assert_eq!(engine.initial_weights(), &[0.5, 0.5, 0.0]);
    }

    #[test]
    fn construction_rejects_bad_config() {
        let err = BasketEngine::builder(flat_prices(3), &abc())
            .parameters(BasketParameters::default().with_initial_nav(-1.0))
            .build();
        assert!(matches!(err, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn results_before_run_fail() {
        let engine = BasketEngine::new(flat_prices(3), &abc()).unwrap();
        assert_eq!(engine.results().unwrap_err(), Error::NotRun);
    }

    #[test]
    fn flat_prices_keep_nav() {
        let mut engine = BasketEngine::new(flat_prices(5), &abc()).unwrap();
        engine.run().unwrap();
        let res = engine.results().unwrap();
        assert!(res.nav.values().iter().all(|v| (v - 100.0).abs() < 1e-12));
    }

    #[test]
    fn rebalance_unknown_date_leaves_engine_untouched() {
        let mut engine = BasketEngine::new(flat_prices(3), &abc()).unwrap();
        let missing = Date::from_ymd_opt(2030, 1, 1).unwrap();
        assert_eq!(
            engine.rebalance(missing, &abc()).unwrap_err(),
            Error::DateNotFound(missing)
        );
        assert!(engine.schedule().is_empty());
    }

    #[test]
    fn rebalance_unknown_symbol_rejected() {
        let mut engine = BasketEngine::new(flat_prices(3), &abc()).unwrap();
        let err = engine.rebalance(dates(3)[1], &[(sym("Q"), 1.0)]).unwrap_err();
        assert_eq!(err, Error::UnknownSymbols(vec![sym("Q")]));
    }

    #[test]
    fn rebalance_on_first_date_only_seeds_weights() {
        let mut engine = BasketEngine::builder(flat_prices(3), &abc())
            .fees(FeeSchedule::zero().with_execution_cost_bps(10.0))
            .build()
            .unwrap();
        engine.rebalance(dates(3)[0], &[(sym("A"), 1.0)]).unwrap();
        engine.run().unwrap();

        let res = engine.results().unwrap();
        assert_eq!(res.weights.row(0), &[1.0, 0.0, 0.0]);
        assert!(res.rebalances.is_empty());
        assert_eq!(res.nav.values()[0], 100.0);
    }

    #[test]
    fn rebalance_after_run_replays() {
        let mut engine = BasketEngine::builder(flat_prices(4), &abc())
            .fees(FeeSchedule::zero().with_execution_cost_bps(2.0))
            .build()
            .unwrap();
        engine.run().unwrap();
        let before = engine.results().unwrap();

        engine.rebalance(dates(4)[2], &[(sym("A"), 1.0)]).unwrap();
        let after = engine.results().unwrap();

        assert_eq!(after.rebalances.len(), 1);
        assert!(after.nav.values()[2] < before.nav.values()[2]);
        assert_eq!(after.weights.row(2), &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn run_is_deterministic() {
        let mut engine = BasketEngine::new(flat_prices(5), &abc()).unwrap();
        engine.rebalance(dates(5)[3], &[(sym("B"), 1.0)]).unwrap();
        engine.run().unwrap();
        let first = engine.results().unwrap();
        engine.run().unwrap();
        assert_eq!(first, engine.results().unwrap());
    }

    #[test]
    fn degenerate_basket_fails_run_without_committing() {
        let mut engine = BasketEngine::new(flat_prices(3), &[(sym("A"), 0.5), (sym("B"), -0.5)]).unwrap();
        assert!(matches!(engine.run(), Err(Error::DegenerateBasket { .. })));
        assert!(!engine.has_run());
    }

    #[test]
    fn engine_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<BasketEngine>();
    }
}
