//! Day-over-day cost spike detection
//!
//! Compares the most recent day of a cost series against the mean of the
//! seven days before it and ranks the services that made up the last day.

use rust_decimal::Decimal;

use crate::models::{DailyCostRecord, SpikeVerdict, TopService};

/// Days in the trailing baseline
pub const TRAILING_WINDOW_DAYS: usize = 7;

/// Shortest series that yields a verdict (baseline plus the day under test)
pub const MIN_HISTORY_DAYS: usize = TRAILING_WINDOW_DAYS + 1;

/// Services listed in a verdict
pub const TOP_SERVICES: usize = 5;

/// Evaluate a date-ascending cost series
///
/// Returns `None` when the series is shorter than [`MIN_HISTORY_DAYS`].
pub fn evaluate(series: &[DailyCostRecord]) -> Option<SpikeVerdict> {
    if series.len() < MIN_HISTORY_DAYS {
        return None;
    }

    let (last, history) = series.split_last()?;
    let baseline = &history[history.len() - TRAILING_WINDOW_DAYS..];

    let trailing_average =
        baseline.iter().map(|day| day.total).sum::<Decimal>() / Decimal::from(TRAILING_WINDOW_DAYS);
    let absolute_delta = last.total - trailing_average;
    // A baseline too small to divide by reads as no baseline
    let percent_delta = if trailing_average > Decimal::ZERO {
        absolute_delta
            .checked_div(trailing_average)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };

    Some(SpikeVerdict {
        yesterday_cost: last.total,
        trailing_average,
        absolute_delta,
        percent_delta,
        top_services: top_services(last),
    })
}

/// Most expensive services of a single day, ties kept in reported order
fn top_services(day: &DailyCostRecord) -> Vec<TopService> {
    let mut ranked: Vec<TopService> = day
        .by_service
        .iter()
        .map(|s| TopService {
            service: s.service.clone(),
            yesterday_cost: s.cost,
        })
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| b.yesterday_cost.cmp(&a.yesterday_cost));
    ranked.truncate(TOP_SERVICES);
    ranked
}

/// Relative and absolute thresholds a verdict must both reach to alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpikeThresholds {
    percent_threshold: Decimal,
    minimum_dollars: Decimal,
}

impl Default for SpikeThresholds {
    fn default() -> Self {
        Self::new(Decimal::from(30), Decimal::from(20))
    }
}

impl SpikeThresholds {
    /// Create thresholds
    pub fn new(percent_threshold: Decimal, minimum_dollars: Decimal) -> Self {
        Self {
            percent_threshold,
            minimum_dollars,
        }
    }

    /// Minimum percentage increase
    pub fn percent_threshold(&self) -> Decimal {
        self.percent_threshold
    }

    /// Minimum dollar increase
    pub fn minimum_dollars(&self) -> Decimal {
        self.minimum_dollars
    }

    /// Whether a verdict clears both thresholds
    pub fn is_alertworthy(&self, verdict: &SpikeVerdict) -> bool {
        verdict.percent_delta >= self.percent_threshold
            && verdict.absolute_delta >= self.minimum_dollars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ServiceCost;
    use chrono::{Duration, NaiveDate};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn series_from_totals(totals: &[i64]) -> Vec<DailyCostRecord> {
        totals
            .iter()
            .enumerate()
            .map(|(i, t)| {
                DailyCostRecord::from_total(start() + Duration::days(i as i64), Decimal::from(*t))
            })
            .collect()
    }

    fn verdict(percent_delta: i64, absolute_delta: i64) -> SpikeVerdict {
        SpikeVerdict {
            yesterday_cost: Decimal::ZERO,
            trailing_average: Decimal::ZERO,
            absolute_delta: Decimal::from(absolute_delta),
            percent_delta: Decimal::from(percent_delta),
            top_services: vec![],
        }
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(7)]
    fn test_short_series_has_no_verdict(#[case] len: usize) {
        let series = series_from_totals(&vec![10; len]);
        assert!(evaluate(&series).is_none());
    }

    #[test]
    fn test_doubling_day() {
        let series = series_from_totals(&[10, 10, 10, 10, 10, 10, 10, 20]);
        let verdict = evaluate(&series).unwrap();

        assert_eq!(verdict.yesterday_cost, Decimal::from(20));
        assert_eq!(verdict.trailing_average, Decimal::from(10));
        assert_eq!(verdict.absolute_delta, Decimal::from(10));
        assert_eq!(verdict.percent_delta, Decimal::from(100));

        // 100% clears the relative bar but $10 is under the $20 floor
        assert!(!SpikeThresholds::default().is_alertworthy(&verdict));
    }

    #[test]
    fn test_baseline_is_exactly_the_seven_days_before_last() {
        // The leading 1000 must not leak into the baseline
        let series = series_from_totals(&[1000, 1, 2, 3, 4, 5, 6, 7, 50]);
        let verdict = evaluate(&series).unwrap();

        assert_eq!(verdict.trailing_average, Decimal::from(4));
        assert_eq!(verdict.absolute_delta, Decimal::from(46));
        assert_eq!(verdict.percent_delta, Decimal::from(1150));
    }

    #[test]
    fn test_zero_baseline_has_no_percentage() {
        let series = series_from_totals(&[0, 0, 0, 0, 0, 0, 0, 35]);
        let verdict = evaluate(&series).unwrap();

        assert_eq!(verdict.trailing_average, Decimal::ZERO);
        assert_eq!(verdict.absolute_delta, Decimal::from(35));
        assert_eq!(verdict.percent_delta, Decimal::ZERO);
    }

    #[test]
    fn test_vanishing_baseline_does_not_overflow() {
        let mut series = series_from_totals(&[0, 0, 0, 0, 0, 0, 0, 50]);
        series[6].total = Decimal::new(7, 28);

        let verdict = evaluate(&series).unwrap();

        assert_eq!(verdict.trailing_average, Decimal::new(1, 28));
        assert!(verdict.absolute_delta > Decimal::from(49));
        assert_eq!(verdict.percent_delta, Decimal::ZERO);
        assert!(!SpikeThresholds::default().is_alertworthy(&verdict));
    }

    #[test]
    fn test_cost_drop_is_negative() {
        let series = series_from_totals(&[40, 40, 40, 40, 40, 40, 40, 10]);
        let verdict = evaluate(&series).unwrap();

        assert_eq!(verdict.absolute_delta, Decimal::from(-30));
        assert_eq!(verdict.percent_delta, Decimal::from(-75));
        assert!(!SpikeThresholds::default().is_alertworthy(&verdict));
    }

    #[test]
    fn test_top_services_only_from_last_day() {
        let mut series = series_from_totals(&[10, 10, 10, 10, 10, 10, 10]);
        let day7 = start() + Duration::days(6);
        series[6] = DailyCostRecord::from_breakdown(
            day7,
            vec![ServiceCost::new("Amazon Redshift", Decimal::from(500))],
        );
        series.push(DailyCostRecord::from_breakdown(
            day7 + Duration::days(1),
            vec![
                ServiceCost::new("Amazon S3", Decimal::new(150, 2)),
                ServiceCost::new("Amazon EC2", Decimal::from(12)),
                ServiceCost::new("AWS Lambda", Decimal::new(300, 2)),
            ],
        ));

        let verdict = evaluate(&series).unwrap();
        let names: Vec<_> = verdict.top_services.iter().map(|s| s.service.as_str()).collect();

        assert_eq!(names, vec!["Amazon EC2", "AWS Lambda", "Amazon S3"]);
    }

    #[test]
    fn test_top_services_capped_at_five_with_stable_ties() {
        let mut series = series_from_totals(&[10, 10, 10, 10, 10, 10, 10]);
        series.push(DailyCostRecord::from_breakdown(
            start() + Duration::days(7),
            vec![
                ServiceCost::new("a", Decimal::from(1)),
                ServiceCost::new("b", Decimal::from(5)),
                ServiceCost::new("c", Decimal::from(5)),
                ServiceCost::new("d", Decimal::from(2)),
                ServiceCost::new("e", Decimal::from(5)),
                ServiceCost::new("f", Decimal::from(3)),
                ServiceCost::new("g", Decimal::from(0)),
            ],
        ));

        let verdict = evaluate(&series).unwrap();
        let ranked: Vec<_> = verdict
            .top_services
            .iter()
            .map(|s| (s.service.as_str(), s.yesterday_cost))
            .collect();

        assert_eq!(
            ranked,
            vec![
                ("b", Decimal::from(5)),
                ("c", Decimal::from(5)),
                ("e", Decimal::from(5)),
                ("f", Decimal::from(3)),
                ("d", Decimal::from(2)),
            ]
        );
    }

    #[test]
    fn test_total_only_last_day_has_no_top_services() {
        let series = series_from_totals(&[10, 10, 10, 10, 10, 10, 10, 90]);
        assert!(evaluate(&series).unwrap().top_services.is_empty());
    }

    #[rstest]
    #[case(30, 20, true)]
    #[case(100, 25, true)]
    #[case(29, 500, false)]
    #[case(300, 19, false)]
    #[case(10, 5, false)]
    fn test_alertworthy_needs_both_thresholds(
        #[case] percent_delta: i64,
        #[case] absolute_delta: i64,
        #[case] expected: bool,
    ) {
        let thresholds = SpikeThresholds::default();
        assert_eq!(
            thresholds.is_alertworthy(&verdict(percent_delta, absolute_delta)),
            expected
        );
    }

    #[test]
    fn test_custom_thresholds() {
        let thresholds = SpikeThresholds::new(Decimal::from(50), Decimal::from(5));
        let series = series_from_totals(&[10, 10, 10, 10, 10, 10, 10, 20]);
        assert!(thresholds.is_alertworthy(&evaluate(&series).unwrap()));
    }
}
