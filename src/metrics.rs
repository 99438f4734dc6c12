//! Performance statistics of a NAV path.

/// Summary statistics of a NAV path.
///
/// Returns are simple period returns `NAV(t)/NAV(t-1) - 1`. Annualization
/// uses `periods_per_year` (252 for the daily walk).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Metrics {
    /// `final / initial - 1`
    pub total_return: f64,
    /// Compound annual growth rate
    pub cagr: f64,
    /// Annualized sample standard deviation of returns
    pub volatility: f64,
    /// Annualized `(mean - risk_free) / stdev`
    pub sharpe: f64,
    /// Annualized `(mean - risk_free) / downside deviation`
    pub sortino: f64,
    /// Largest peak-to-trough fall of NAV, as a positive fraction
    pub max_drawdown: f64,
    /// `cagr / max_drawdown`
    pub calmar: f64,
    /// Number of return periods (dates - 1)
    pub num_periods: usize,
    pub winning_periods: usize,
    pub losing_periods: usize,
    /// Largest single-period gain
    pub best_period: f64,
    /// Largest single-period loss (most negative return)
    pub worst_period: f64,
}

impl std::fmt::Display for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "NAV Metrics")?;
        writeln!(f, "  Total return:    {:>8.2}%", self.total_return * 100.0)?;
        writeln!(f, "  CAGR:            {:>8.2}%", self.cagr * 100.0)?;
        writeln!(f, "  Volatility:      {:>8.2}%", self.volatility * 100.0)?;
        writeln!(f, "  Sharpe:          {:>8.2}", self.sharpe)?;
        writeln!(f, "  Sortino:         {:>8.2}", self.sortino)?;
        writeln!(f, "  Max drawdown:    {:>8.2}%", self.max_drawdown * 100.0)?;
        writeln!(f, "  Calmar:          {:>8.2}", self.calmar)?;
        writeln!(
            f,
            "  Best/Worst day:  {:>+8.2}% / {:+.2}%",
            self.best_period * 100.0,
            self.worst_period * 100.0
        )?;
        writeln!(
            f,
            "  Up/Down/Total:   {}/{}/{}",
            self.winning_periods, self.losing_periods, self.num_periods
        )
    }
}

/// Compute metrics from a NAV path.
///
/// * `nav` - NAV per date, first entry is the starting value
/// * `periods_per_year` - annualization factor
/// * `risk_free` - risk-free rate per period
///
/// Returns `None` with fewer than two points or a non-positive starting NAV.
pub fn compute_metrics(nav: &[f64], periods_per_year: f64, risk_free: f64) -> Option<Metrics> {
    let (&start, &end) = (nav.first()?, nav.last()?);
    if nav.len() < 2 || start <= 0.0 {
        return None;
    }

    let returns: Vec<f64> = nav.windows(2).map(|w| w[1] / w[0] - 1.0).collect();
    let n = returns.len();

    let total_return = end / start - 1.0;
    let years = n as f64 / periods_per_year;
    let cagr = if total_return <= -1.0 {
        -1.0
    } else if years > 0.0 {
        (1.0 + total_return).powf(1.0 / years) - 1.0
    } else {
        0.0
    };

    let mean = returns.iter().sum::<f64>() / n as f64;
    let excess_mean = mean - risk_free;
    let denom = n.saturating_sub(1).max(1) as f64;

    let stdev = if n > 1 {
        (returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / denom).sqrt()
    } else {
        0.0
    };
    let downside = if n > 1 {
        (returns
            .iter()
            .map(|r| (r - risk_free).min(0.0).powi(2))
            .sum::<f64>()
            / denom)
            .sqrt()
    } else {
        0.0
    };

    let annualize = periods_per_year.sqrt();
    let ratio = |num: f64, den: f64| if den > 0.0 { num * annualize / den } else { 0.0 };

    let max_drawdown = max_drawdown(nav);
    let calmar = if max_drawdown > 0.0 {
        cagr / max_drawdown
    } else {
        0.0
    };

    Some(Metrics {
        total_return,
        cagr,
        volatility: stdev * annualize,
        sharpe: ratio(excess_mean, stdev),
        sortino: ratio(excess_mean, downside),
        max_drawdown,
        calmar,
        num_periods: n,
        winning_periods: returns.iter().filter(|&&r| r > 0.0).count(),
        losing_periods: returns.iter().filter(|&&r| r < 0.0).count(),
        best_period: returns.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        worst_period: returns.iter().copied().fold(f64::INFINITY, f64::min),
    })
}

/// Largest `(peak - nav) / peak` along the path.
pub fn max_drawdown(nav: &[f64]) -> f64 {
    let mut peak = f64::NEG_INFINITY;
    let mut worst = 0.0_f64;
    for &v in nav {
        peak = peak.max(v);
        if peak > 0.0 {
            worst = worst.max((peak - v) / peak);
        }
    }
    worst
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_short_paths() {
        assert!(compute_metrics(&[], 252.0, 0.0).is_none());
        assert!(compute_metrics(&[100.0], 252.0, 0.0).is_none());
        assert!(compute_metrics(&[0.0, 1.0], 252.0, 0.0).is_none());
    }

    #[test]
    fn single_period() {
        let m = compute_metrics(&[100.0, 105.0], 252.0, 0.0).unwrap();
        assert!((m.total_return - 0.05).abs() < 1e-12);
        assert_eq!(m.num_periods, 1);
        assert_eq!(m.winning_periods, 1);
        assert_eq!(m.volatility, 0.0);
        assert_eq!(m.sharpe, 0.0);
    }

    #[test]
    fn one_year_of_constant_growth() {
        let mut nav = vec![100.0];
        for _ in 0..12 {
            let last = *nav.last().unwrap();
            nav.push(last * 1.01);
        }
        let m = compute_metrics(&nav, 12.0, 0.0).unwrap();
        assert!((m.total_return - 0.126_825_03).abs() < 1e-6);
        assert!((m.cagr - m.total_return).abs() < 1e-9);
        assert_eq!(m.max_drawdown, 0.0);
        assert_eq!(m.losing_periods, 0);
    }

    #[test]
    fn drawdown_peak_to_trough() {
        // 100 -> 110 -> 88 -> 92.4
        let nav = [100.0, 110.0, 88.0, 92.4];
        assert!((max_drawdown(&nav) - 0.2).abs() < 1e-12);
        let m = compute_metrics(&nav, 252.0, 0.0).unwrap();
        assert!((m.max_drawdown - 0.2).abs() < 1e-12);
        assert!((m.worst_period + 0.2).abs() < 1e-12);
        assert!((m.best_period - 0.1).abs() < 1e-12);
        assert!((m.calmar - m.cagr / m.max_drawdown).abs() < 1e-12);
    }

    #[test]
    fn sortino_at_least_sharpe_when_mostly_up() {
        let nav = [100.0, 102.0, 105.06, 106.11, 105.58, 107.16];
        let m = compute_metrics(&nav, 252.0, 0.0).unwrap();
        assert!(m.sharpe > 0.0);
        assert!(m.sortino >= m.sharpe);
    }

    #[test]
    fn flat_nav_counts_neither_up_nor_down() {
        let m = compute_metrics(&[100.0, 100.0, 100.0], 252.0, 0.0).unwrap();
        assert_eq!(m.winning_periods, 0);
        assert_eq!(m.losing_periods, 0);
        assert_eq!(m.num_periods, 2);
        assert_eq!(m.total_return, 0.0);
    }

    #[test]
    fn display_format() {
        let m = compute_metrics(&[100.0, 101.0, 100.5], 252.0, 0.0).unwrap();
        let s = format!("{m}");
        assert!(s.contains("Total return:"));
        assert!(s.contains("Max drawdown:"));
        assert!(s.contains("Up/Down/Total:   1/1/2"));
    }
}
