//! Plain-text report of a completed run.

use std::fmt::Write;

use basketbook::{BasketResults, PnlComponent};

/// Render the NAV tail, rebalances, attribution, and metrics.
///
/// `tail` limits the NAV table to the last `tail` dates (0 hides it).
pub fn render(results: &BasketResults, tail: usize) -> String {
    let mut out = String::new();
    let n = results.nav.len();

    if tail > 0 {
        let skip = n.saturating_sub(tail);
        let _ = writeln!(out, "NAV (last {} of {} dates)", n - skip, n);
        let _ = writeln!(
            out,
            "  {:<10} {:>12} {:>11} {:>11} {:>11}",
            "Date", "NAV", "Price", "Accruals", "Rebalance"
        );
        for (t, (date, nav)) in results.nav.iter().enumerate().skip(skip) {
            let row = &results.pnl_breakdown.rows()[t];
            let accruals = row.accrual_total() - row.component(PnlComponent::Price);
            let _ = writeln!(
                out,
                "  {:<10} {:>12.6} {:>+11.6} {:>+11.6} {:>+11.6}",
                date.to_string(),
                nav,
                row.price,
                accruals,
                row.rebalance_cost
            );
        }
        out.push('\n');
    }

    if !results.rebalances.is_empty() {
        let _ = writeln!(out, "Rebalances");
        for b in &results.rebalances {
            let _ = writeln!(
                out,
                "  {}  turnover {:>12.6}  cost {:>+10.6}",
                b.date, b.turnover, b.cost
            );
        }
        out.push('\n');
    }

    let _ = write!(out, "{}", results.attribution());
    if let Some(metrics) = results.metrics() {
        out.push('\n');
        let _ = write!(out, "{metrics}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use basketbook::{BasketEngine, Date, FeeSchedule, PriceSeries, Symbol};

    fn results() -> BasketResults {
        let dates: Vec<Date> = (6..=10).map(|d| Date::from_ymd_opt(2025, 1, d).unwrap()).collect();
        let prices = PriceSeries::from_closes(
            dates.clone(),
            vec![
                (Symbol::new("AAPL"), vec![100.0, 101.0, 102.0, 101.5, 103.0]),
                (Symbol::new("MSFT"), vec![400.0, 399.0, 401.0, 405.0, 404.0]),
            ],
        )
        .unwrap();
        let mut engine = BasketEngine::builder(
            prices,
            &[(Symbol::new("AAPL"), 0.5), (Symbol::new("MSFT"), 0.5)],
        )
        .fees(FeeSchedule::zero().with_execution_cost_bps(2.0))
        .build()
        .unwrap();
        engine
            .rebalance(dates[2], &[(Symbol::new("AAPL"), 1.0)])
            .unwrap();
        engine.run().unwrap();
        engine.results().unwrap()
    }

    #[test]
    fn render_includes_every_section() {
        let text = render(&results(), 3);
        assert!(text.contains("NAV (last 3 of 5 dates)"));
        assert!(text.contains("2025-01-10"));
        assert!(!text.contains("2025-01-07 "));
        assert!(text.contains("Rebalances"));
        assert!(text.contains("PnL Attribution"));
        assert!(text.contains("NAV Metrics"));
    }

    #[test]
    fn zero_tail_hides_nav_table() {
        let text = render(&results(), 0);
        assert!(!text.contains("NAV (last"));
        assert!(text.contains("PnL Attribution"));
    }
}
