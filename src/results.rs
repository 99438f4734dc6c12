//! Read-only snapshots of a completed walk.

use crate::accrual::{DailyRecord, PnlComponent, PnlRow};
use crate::day_count::PERIODS_PER_YEAR;
use crate::metrics::{Metrics, compute_metrics};
use crate::rebalance::RebalanceBooking;
use crate::types::{Date, Symbol};
use crate::weights::WeightLedger;

/// NAV per unit, by date.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NavSeries {
    dates: Vec<Date>,
    values: Vec<f64>,
}

impl NavSeries {
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// NAV on `date`.
    pub fn get(&self, date: Date) -> Option<f64> {
        let t = self.dates.binary_search(&date).ok()?;
        Some(self.values[t])
    }

    pub fn first(&self) -> Option<f64> {
        self.values.first().copied()
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// `(date, nav)` pairs in date order.
    pub fn iter(&self) -> impl Iterator<Item = (Date, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Simple period returns `NAV(t)/NAV(t-1) - 1`, one per date after the first.
    pub fn returns(&self) -> Vec<f64> {
        self.values.windows(2).map(|w| w[1] / w[0] - 1.0).collect()
    }
}

/// PnL components by date. Row 0 is always zero.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PnlBreakdown {
    dates: Vec<Date>,
    rows: Vec<PnlRow>,
}

impl PnlBreakdown {
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    pub fn rows(&self) -> &[PnlRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row for `date`.
    pub fn get(&self, date: Date) -> Option<&PnlRow> {
        let t = self.dates.binary_search(&date).ok()?;
        Some(&self.rows[t])
    }

    /// One column across all dates.
    pub fn column(&self, component: PnlComponent) -> Vec<f64> {
        self.rows.iter().map(|r| r.component(component)).collect()
    }

    /// Column sums over the whole walk.
    pub fn totals(&self) -> PnlRow {
        self.rows.iter().fold(PnlRow::default(), |acc, r| acc.add(r))
    }
}

/// Cumulative PnL attribution over a walk.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribution {
    /// Per-unit totals by component
    pub per_unit: PnlRow,
    /// Absolute totals: per-unit scaled by `initial_notional / initial_nav`
    pub absolute: PnlRow,
    pub initial_nav: f64,
    pub final_nav: f64,
    /// `final_nav / initial_nav - 1`
    pub total_return: f64,
}

impl std::fmt::Display for Attribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "PnL Attribution")?;
        writeln!(f, "  {:<14} {:>14} {:>18}", "Component", "Per unit", "Absolute")?;
        for c in PnlComponent::ALL {
            writeln!(
                f,
                "  {:<14} {:>14.6} {:>18.2}",
                c.name(),
                self.per_unit.component(c),
                self.absolute.component(c)
            )?;
        }
        writeln!(
            f,
            "  {:<14} {:>14.6} {:>18.2}",
            "Total",
            self.per_unit.total(),
            self.absolute.total()
        )?;
        writeln!(
            f,
            "  NAV {:.6} -> {:.6} ({:+.4}%)",
            self.initial_nav,
            self.final_nav,
            self.total_return * 100.0
        )
    }
}

/// Snapshot returned by [`crate::BasketEngine::results`].
///
/// Every table is an independent copy; mutating it does not affect the engine.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BasketResults {
    pub nav: NavSeries,
    pub pnl_breakdown: PnlBreakdown,
    pub weights: WeightLedger,
    /// Rebalances booked during the walk, in replay order
    pub rebalances: Vec<RebalanceBooking>,
    /// `initial_notional / initial_nav`
    pub notional_scale: f64,
}

impl BasketResults {
    pub(crate) fn from_records(
        symbols: Vec<Symbol>,
        records: &[DailyRecord],
        rebalances: Vec<RebalanceBooking>,
        notional_scale: f64,
    ) -> Self {
        let dates: Vec<Date> = records.iter().map(|r| r.date).collect();
        Self {
            nav: NavSeries {
                dates: dates.clone(),
                values: records.iter().map(|r| r.nav).collect(),
            },
            pnl_breakdown: PnlBreakdown {
                dates: dates.clone(),
                rows: records.iter().map(|r| r.pnl).collect(),
            },
            weights: WeightLedger::from_rows(
                symbols,
                dates,
                records.iter().map(|r| r.weights.clone()).collect(),
            ),
            rebalances,
            notional_scale,
        }
    }

    /// Rebuild the per-date records.
    pub fn records(&self) -> Vec<DailyRecord> {
        (0..self.nav.len())
            .map(|t| DailyRecord {
                date: self.nav.dates[t],
                nav: self.nav.values[t],
                weights: self.weights.row(t).to_vec(),
                pnl: self.pnl_breakdown.rows[t],
            })
            .collect()
    }

    /// Worst `|ΔNAV(t) - Σ PnL(t)|` across dates. Zero up to float error.
    pub fn max_conservation_error(&self) -> f64 {
        self.nav
            .values
            .windows(2)
            .zip(self.pnl_breakdown.rows.iter().skip(1))
            .map(|(w, row)| ((w[1] - w[0]) - row.total()).abs())
            .fold(0.0, f64::max)
    }

    /// Cumulative attribution by component.
    pub fn attribution(&self) -> Attribution {
        let per_unit = self.pnl_breakdown.totals();
        let initial_nav = self.nav.first().unwrap_or_default();
        let final_nav = self.nav.last().unwrap_or_default();
        let total_return = if initial_nav != 0.0 {
            final_nav / initial_nav - 1.0
        } else {
            0.0
        };
        Attribution {
            absolute: per_unit.scale(self.notional_scale),
            per_unit,
            initial_nav,
            final_nav,
            total_return,
        }
    }

    /// Performance metrics of the NAV path (daily periods, zero risk-free).
    ///
    /// `None` for a single-date walk.
    pub fn metrics(&self) -> Option<Metrics> {
        compute_metrics(self.nav.values(), PERIODS_PER_YEAR, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> Date {
        Date::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn sample() -> BasketResults {
        let records = vec![
            DailyRecord::opening(d(2), 100.0, vec![1.0]),
            DailyRecord {
                date: d(3),
                nav: 101.0,
                weights: vec![1.0],
                pnl: PnlRow {
                    price: 1.5,
                    funding: -0.5,
                    ..PnlRow::default()
                },
            },
            DailyRecord {
                date: d(6),
                nav: 100.5,
                weights: vec![1.0],
                pnl: PnlRow {
                    price: -0.4,
                    rebalance_cost: -0.1,
                    ..PnlRow::default()
                },
            },
        ];
        BasketResults::from_records(vec![Symbol::new("A")], &records, Vec::new(), 10_000.0)
    }

    #[test]
    fn nav_accessors() {
        let res = sample();
        assert_eq!(res.nav.get(d(3)), Some(101.0));
        assert_eq!(res.nav.first(), Some(100.0));
        assert_eq!(res.nav.last(), Some(100.5));
        assert_eq!(res.nav.returns().len(), 2);
        assert!((res.nav.returns()[0] - 0.01).abs() < 1e-12);
    }

    #[test]
    fn breakdown_accessors() {
        let res = sample();
        assert_eq!(res.pnl_breakdown.get(d(2)), Some(&PnlRow::default()));
        assert_eq!(res.pnl_breakdown.column(PnlComponent::Price), vec![0.0, 1.5, -0.4]);
        let totals = res.pnl_breakdown.totals();
        assert!((totals.price - 1.1).abs() < 1e-12);
        assert!((totals.rebalance_cost + 0.1).abs() < 1e-12);
    }

    #[test]
    fn conservation_holds_on_sample() {
        assert!(sample().max_conservation_error() < 1e-12);
    }

    #[test]
    fn attribution_scales_to_notional() {
        let attr = sample().attribution();
        assert!((attr.per_unit.total() - 0.5).abs() < 1e-12);
        assert!((attr.absolute.total() - 5_000.0).abs() < 1e-6);
        assert!((attr.total_return - 0.005).abs() < 1e-12);
        let text = format!("{attr}");
        assert!(text.contains("RebalanceCost"));
        assert!(text.contains("Total"));
    }

    #[test]
    fn records_roundtrip() {
        let res = sample();
        let records = res.records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].nav, 100.5);
        assert_eq!(records[1].pnl.funding, -0.5);
    }
}
