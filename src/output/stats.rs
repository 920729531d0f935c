//! Run summary
//!
//! Collects the headline numbers of a finished harvest and prints them.

use crate::harvester::RunResult;
use chrono::{DateTime, Utc};

/// Headline numbers of a finished harvest
#[derive(Debug, Clone)]
pub struct HarvestSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Size of the generated identifier plan
    pub planned: usize,

    /// Identifiers actually dispatched (less than `planned` if interrupted)
    pub attempted: usize,

    pub succeeded: usize,
    pub no_data: usize,
    pub failed: usize,
    pub images: usize,
    pub batches: usize,
}

impl HarvestSummary {
    pub fn from_run(
        result: &RunResult,
        planned: usize,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        Self {
            started_at,
            finished_at,
            planned,
            attempted: result.attempted(),
            succeeded: result.succeeded(),
            no_data: result.no_data(),
            failed: result.failed(),
            images: result.images(),
            batches: result.batches.len(),
        }
    }

    pub fn duration_seconds(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds()
    }

    /// Share of attempted identifiers that produced a record, in percent
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            return 0.0;
        }
        (self.succeeded as f64 / self.attempted as f64) * 100.0
    }
}

/// Prints the summary to stdout
pub fn print_summary(summary: &HarvestSummary) {
    println!("=== Harvest Summary ===\n");

    println!("Run:");
    println!("  Started: {}", summary.started_at.to_rfc3339());
    println!("  Finished: {}", summary.finished_at.to_rfc3339());
    println!("  Duration: {}s", summary.duration_seconds());
    println!("  Batches: {}", summary.batches);
    println!();

    println!("Identifiers:");
    println!("  Planned: {}", summary.planned);
    println!("  Attempted: {}", summary.attempted);
    println!("  With data: {}", summary.succeeded);
    println!("  Without data: {}", summary.no_data);
    println!("  Failed: {}", summary.failed);
    println!("  Profile images: {}", summary.images);
    println!();

    println!(
        "Scraped {} students successfully out of {} attempts ({:.1}%)",
        summary.succeeded,
        summary.attempted,
        summary.success_rate()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvester::BatchReport;
    use chrono::Duration;

    fn run_result() -> RunResult {
        RunResult {
            records: Vec::new(),
            batches: vec![
                BatchReport {
                    batch_number: 1,
                    attempted: 4,
                    succeeded: 0,
                    no_data: 3,
                    failed: 1,
                    images: 0,
                },
                BatchReport {
                    batch_number: 2,
                    attempted: 2,
                    no_data: 2,
                    ..Default::default()
                },
            ],
        }
    }

    #[test]
    fn test_summary_totals() {
        let started = Utc::now();
        let summary =
            HarvestSummary::from_run(&run_result(), 10, started, started + Duration::seconds(42));

        assert_eq!(summary.planned, 10);
        assert_eq!(summary.attempted, 6);
        assert_eq!(summary.no_data, 5);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.batches, 2);
        assert_eq!(summary.duration_seconds(), 42);
    }

    #[test]
    fn test_success_rate_zero_attempts() {
        let now = Utc::now();
        let summary = HarvestSummary::from_run(&RunResult::default(), 0, now, now);
        assert_eq!(summary.success_rate(), 0.0);
    }
}
