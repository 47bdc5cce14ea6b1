use crate::error::{OverwatchError, Result};
use crate::model::{JobBatch, MetricsReport, RunConfig};
use crate::timestamp;

const SECONDS_PER_HOUR: f64 = 3600.0;
const HOURS_PER_DAY: f64 = 24.0;
const DAYS_PER_WEEK: f64 = 7.0;

/// Decimal places kept on the average crawl duration.
const AVERAGE_PLACES: u32 = 2;
/// Significant digits kept on the crawls-per-hour quotient.
const QUOTIENT_SIGNIFICANT_DIGITS: u32 = 4;

/// Round `value * factor` half away from zero, deciding ties on the exact
/// product rather than the rounded one. `factor` must be a power of ten no
/// larger than 1e22 so it is exact.
fn round_scaled(value: f64, factor: f64) -> f64 {
    let scaled = value * factor;
    if scaled.fract().abs() != 0.5 {
        return scaled.round();
    }
    // error of the multiplication; zero on a true tie
    match value.mul_add(factor, -scaled) {
        e if e > 0.0 => scaled.ceil(),
        e if e < 0.0 => scaled.floor(),
        _ => scaled.round(),
    }
}

/// Round half away from zero to `places` decimal places of the exact binary
/// value, so `0.015` (stored just below it) becomes `0.01`.
pub fn round_to_places(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(places as i32);
    round_scaled(value, factor) / factor
}

/// Round half away from zero to `digits` significant digits.
pub fn round_to_significant(value: f64, digits: u32) -> f64 {
    if value == 0.0 || !value.is_finite() || digits == 0 {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let shift = digits as i32 - 1 - magnitude;
    if shift >= 0 {
        let factor = 10f64.powi(shift);
        round_scaled(value, factor) / factor
    } else {
        let factor = 10f64.powi(-shift);
        (value / factor).round() * factor
    }
}

/// Duration statistics over a batch, before any throughput projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DurationStats {
    pub average: f64,
    pub longest: f64,
    pub shortest: f64,
    pub total: f64,
    pub count: usize,
}

/// Jobs-per-period projections derived from an average duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throughput {
    pub single_per_hour: f64,
    pub fleet_per_hour: f64,
    pub single_per_day: f64,
    pub fleet_per_day: f64,
    pub single_per_week: f64,
    pub fleet_per_week: f64,
}

/// Per-job durations in seconds, in batch order.
pub fn job_durations(batch: &JobBatch) -> Result<Vec<f64>> {
    batch.jobs.iter().map(|job| job.duration_secs()).collect()
}

/// Wall-clock span from the earliest start to the latest end in the batch.
///
/// Ties keep the first job seen. Overlapping jobs are counted once.
pub fn total_span_secs(batch: &JobBatch) -> Result<f64> {
    let (first, rest) = batch.jobs.split_first().ok_or(OverwatchError::EmptyBatch)?;
    let mut earliest = first.start;
    let mut latest = first.end;
    for job in rest {
        if job.start < earliest {
            earliest = job.start;
        }
        if job.end > latest {
            latest = job.end;
        }
    }
    Ok(timestamp::duration_secs(earliest, latest))
}

pub fn duration_stats(batch: &JobBatch) -> Result<DurationStats> {
    if batch.is_empty() {
        return Err(OverwatchError::EmptyBatch);
    }
    let durations = job_durations(batch)?;
    let mean = durations.iter().sum::<f64>() / durations.len() as f64;
    let longest = durations.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let shortest = durations.iter().copied().fold(f64::INFINITY, f64::min);

    Ok(DurationStats {
        average: round_to_places(mean, AVERAGE_PLACES),
        longest,
        shortest,
        total: total_span_secs(batch)?,
        count: batch.len(),
    })
}

/// Project crawls per hour, day and week from an (already rounded) average duration.
pub fn throughput(average_duration: f64, concurrency: usize) -> Result<Throughput> {
    if average_duration == 0.0 {
        return Err(OverwatchError::DivisionByZero);
    }
    let single_per_hour = round_to_significant(
        SECONDS_PER_HOUR / average_duration,
        QUOTIENT_SIGNIFICANT_DIGITS,
    );
    let fleet_per_hour = single_per_hour * concurrency as f64;
    let single_per_day = single_per_hour * HOURS_PER_DAY;
    let fleet_per_day = fleet_per_hour * HOURS_PER_DAY;

    Ok(Throughput {
        single_per_hour,
        fleet_per_hour,
        single_per_day,
        fleet_per_day,
        single_per_week: single_per_day * DAYS_PER_WEEK,
        fleet_per_week: fleet_per_day * DAYS_PER_WEEK,
    })
}

/// Turns a batch of finished jobs into a [`MetricsReport`] for a fixed worker count.
#[derive(Debug, Clone, Copy)]
pub struct MetricsCalculator {
    concurrency: usize,
}

impl MetricsCalculator {
    pub fn new(cfg: &RunConfig) -> Self {
        Self::with_concurrency(cfg.concurrency)
    }

    pub fn with_concurrency(concurrency: usize) -> Self {
        Self { concurrency }
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn compute(&self, batch: &JobBatch) -> Result<MetricsReport> {
        let stats = duration_stats(batch)?;
        let rates = throughput(stats.average, self.concurrency)?;
        tracing::debug!(
            jobs = stats.count,
            average = stats.average,
            span = stats.total,
            "computed duration statistics"
        );

        Ok(MetricsReport {
            average_duration: stats.average,
            longest_duration: stats.longest,
            shortest_duration: stats.shortest,
            total_duration: stats.total,
            single_per_hour: rates.single_per_hour,
            fleet_per_hour: rates.fleet_per_hour,
            single_per_day: rates.single_per_day,
            fleet_per_day: rates.fleet_per_day,
            single_per_week: rates.single_per_week,
            fleet_per_week: rates.fleet_per_week,
            completed_count: stats.count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::JobRecord;
    use crate::timestamp::parse_timestamp;

    fn job(id: &str, start: &str, end: &str) -> JobRecord {
        JobRecord {
            id: id.to_string(),
            spider: None,
            start: parse_timestamp(start).unwrap(),
            end: parse_timestamp(end).unwrap(),
        }
    }

    /// Three crawls of 241.547793s, 233.489018s and 258.652448s spanning
    /// 10:28:08.004732 to 10:33:51.420786.
    fn outlier_batch() -> JobBatch {
        JobBatch::new(vec![
            job("a", "2016-04-29 10:28:08.004732", "2016-04-29 10:32:09.552525"),
            job("b", "2016-04-29 10:28:30.000000", "2016-04-29 10:32:23.489018"),
            job("c", "2016-04-29 10:29:32.768338", "2016-04-29 10:33:51.420786"),
        ])
    }

    fn assert_close(actual: f64, expected: f64) {
        let tolerance = 1e-9 * expected.abs().max(1.0);
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn rounds_to_places_half_up() {
        assert_eq!(round_to_places(244.563086, 2), 244.56);
        assert_eq!(round_to_places(0.125, 2), 0.13);
        assert_eq!(round_to_places(1.5, 0), 2.0);
        assert_eq!(round_to_places(-1.25, 1), -1.3);
    }

    #[test]
    fn rounds_on_exact_value_not_scaled_product() {
        // 0.015 and 1.005 are stored slightly below the decimal tie
        assert_eq!(round_to_places(0.015, 2), 0.01);
        assert_eq!(round_to_places(-0.015, 2), -0.01);
        assert_eq!(round_to_places(1.005, 2), 1.0);
        // 0.375 is exact, so it is a real tie and goes up
        assert_eq!(round_to_places(0.375, 2), 0.38);
        // 0.0015 is stored slightly above
        assert_eq!(round_to_significant(0.0015, 1), 0.002);
    }

    #[test]
    fn rounds_to_significant_digits() {
        assert_eq!(round_to_significant(14.720314, 4), 14.72);
        assert_eq!(round_to_significant(0.0123456, 3), 0.0123);
        assert_eq!(round_to_significant(123456.0, 2), 120000.0);
        assert_eq!(round_to_significant(0.0, 4), 0.0);
    }

    #[test]
    fn durations_follow_batch_order() {
        let durations = job_durations(&outlier_batch()).unwrap();
        assert_eq!(durations, vec![241.547793, 233.489018, 258.652448]);
    }

    #[test]
    fn reference_batch_statistics() {
        let stats = duration_stats(&outlier_batch()).unwrap();
        assert_eq!(stats.average, 244.56);
        assert_eq!(stats.total, 343.416054);
        assert_eq!(stats.longest, 258.652448);
        assert_eq!(stats.shortest, 233.489018);
        assert_eq!(stats.count, 3);
    }

    #[test]
    fn span_is_not_sum_of_durations() {
        let batch = JobBatch::new(vec![
            job("a", "2016-01-01 00:00:00.000000", "2016-01-01 01:00:00.000000"),
            job("b", "2016-01-01 00:30:00.000000", "2016-01-01 01:30:00.000000"),
        ]);
        assert_eq!(total_span_secs(&batch).unwrap(), 5400.0);
    }

    #[test]
    fn span_takes_start_and_end_from_different_jobs() {
        let batch = JobBatch::new(vec![
            job("late", "2016-01-01 02:00:00.000000", "2016-01-01 02:10:00.000000"),
            job("early", "2016-01-01 00:00:00.000000", "2016-01-01 00:05:00.000000"),
        ]);
        assert_eq!(total_span_secs(&batch).unwrap(), 7800.0);
    }

    #[test]
    fn reference_throughput() {
        let rates = throughput(244.56, 50).unwrap();
        assert_eq!(rates.single_per_hour, 14.72);
        assert_eq!(rates.fleet_per_hour, 736.0);
        assert_close(rates.single_per_day, 353.28);
        assert_close(rates.fleet_per_day, 17664.0);
        assert_close(rates.single_per_week, 2472.96);
        assert_close(rates.fleet_per_week, 123648.0);
    }

    #[test]
    fn throughput_identities_hold_exactly() {
        for (average, concurrency) in [(244.56, 50), (1.0, 1), (97.31, 7), (3599.99, 0)] {
            let r = throughput(average, concurrency).unwrap();
            assert_eq!(r.fleet_per_hour, r.single_per_hour * concurrency as f64);
            assert_eq!(r.single_per_day, r.single_per_hour * 24.0);
            assert_eq!(r.fleet_per_day, r.fleet_per_hour * 24.0);
            assert_eq!(r.single_per_week, r.single_per_day * 7.0);
            assert_eq!(r.fleet_per_week, r.fleet_per_day * 7.0);
        }
    }

    #[test]
    fn zero_average_is_division_by_zero() {
        assert!(matches!(throughput(0.0, 50), Err(OverwatchError::DivisionByZero)));
    }

    #[test]
    fn instant_jobs_fail_instead_of_producing_infinity() {
        let batch = JobBatch::new(vec![job(
            "instant",
            "2016-01-01 00:00:00.000000",
            "2016-01-01 00:00:00.000000",
        )]);
        let calc = MetricsCalculator::with_concurrency(50);
        assert!(matches!(calc.compute(&batch), Err(OverwatchError::DivisionByZero)));
    }

    #[test]
    fn empty_batch_is_rejected() {
        let calc = MetricsCalculator::with_concurrency(50);
        assert!(matches!(
            calc.compute(&JobBatch::default()),
            Err(OverwatchError::EmptyBatch)
        ));
        assert!(matches!(
            total_span_secs(&JobBatch::default()),
            Err(OverwatchError::EmptyBatch)
        ));
    }

    #[test]
    fn negative_job_aborts_report() {
        let batch = JobBatch::new(vec![
            job("ok", "2016-01-01 00:00:00.000000", "2016-01-01 00:01:00.000000"),
            job("bad", "2016-01-01 00:05:00.000000", "2016-01-01 00:04:00.000000"),
        ]);
        let calc = MetricsCalculator::with_concurrency(2);
        assert!(matches!(
            calc.compute(&batch),
            Err(OverwatchError::NegativeDuration { ref id }) if id == "bad"
        ));
    }

    #[test]
    fn full_report_for_reference_batch() {
        let report = MetricsCalculator::with_concurrency(50)
            .compute(&outlier_batch())
            .unwrap();
        assert_eq!(report.completed_count, 3);
        assert_eq!(report.average_duration, 244.56);
        assert_eq!(report.total_duration, 343.416054);
        assert_eq!(report.fleet_per_hour, 736.0);
        assert_close(report.fleet_per_week, 123648.0);
    }

    #[test]
    fn report_ordering_properties() {
        let batches = [
            outlier_batch(),
            JobBatch::new(vec![job(
                "solo",
                "2016-01-01 00:00:00.000000",
                "2016-01-01 00:00:12.345678",
            )]),
            JobBatch::new(vec![
                job("a", "2016-01-01 00:00:00.000000", "2016-01-01 00:00:01.000000"),
                job("b", "2016-01-01 00:00:00.500000", "2016-01-01 00:10:00.000000"),
                job("c", "2016-01-02 00:00:00.000000", "2016-01-02 00:00:30.250000"),
            ]),
        ];
        let calc = MetricsCalculator::with_concurrency(4);
        for batch in &batches {
            let report = calc.compute(batch).unwrap();
            assert_eq!(report.completed_count, batch.len());
            // average is rounded to 2 places, so allow half a cent either side
            assert!(report.shortest_duration - 0.005 <= report.average_duration);
            assert!(report.average_duration <= report.longest_duration + 0.005);
            assert!(report.total_duration >= report.longest_duration);
        }
    }
}
