//! Day-count conventions: map a pair of index dates to an accrual fraction.

use crate::types::Date;

/// Trading periods per year. Annualized fee rates are converted with `PERIODS_PER_YEAR * dt`.
pub const PERIODS_PER_YEAR: f64 = 252.0;

/// Accrual fraction between two consecutive index dates.
pub trait DayCount: std::fmt::Debug + Send + Sync {
    /// Year fraction accrued from `start` to `end`.
    fn year_fraction(&self, start: Date, end: Date) -> f64;

    /// Short name for logs and reports.
    fn name(&self) -> &'static str;
}

/// Built-in conventions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum DayCountConvention {
    /// Every step accrues `1/252`, whatever the calendar gap.
    #[default]
    Fixed252,
    /// Calendar days between the dates over 365.
    Actual365,
}

impl DayCount for DayCountConvention {
    fn year_fraction(&self, start: Date, end: Date) -> f64 {
        match self {
            DayCountConvention::Fixed252 => 1.0 / PERIODS_PER_YEAR,
            DayCountConvention::Actual365 => (end - start).num_days() as f64 / 365.0,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            DayCountConvention::Fixed252 => "fixed/252",
            DayCountConvention::Actual365 => "act/365",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32, day: u32) -> Date {
        Date::from_ymd_opt(2025, m, day).unwrap()
    }

    #[test]
    fn fixed_ignores_calendar_gaps() {
        let dc = DayCountConvention::Fixed252;
        // Friday to Monday is still one step
        assert_eq!(dc.year_fraction(d(1, 3), d(1, 6)), 1.0 / 252.0);
        assert_eq!(dc.year_fraction(d(1, 6), d(1, 7)), 1.0 / 252.0);
    }

    #[test]
    fn actual_365_counts_days() {
        let dc = DayCountConvention::Actual365;
        assert_eq!(dc.year_fraction(d(1, 3), d(1, 6)), 3.0 / 365.0);
        assert_eq!(dc.name(), "act/365");
    }

    #[test]
    fn default_is_fixed() {
        assert_eq!(DayCountConvention::default(), DayCountConvention::Fixed252);
    }
}
