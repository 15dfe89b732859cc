//! Pass/fail statistics and time-bucketed run counts.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Duration, NaiveDate};

use crate::entity::{test_report, test_suite};
use crate::models::{AggregatedReport, DailyCount, RunStatus, SuiteAggregate, WeeklyCount};

#[derive(Default)]
struct Tally {
    total: u64,
    passed: u64,
    failed: u64,
    execution_time: f64,
}

impl Tally {
    fn add(&mut self, run: &test_report::Model) {
        self.total += 1;
        match RunStatus::parse(&run.status) {
            Some(RunStatus::Pass) => self.passed += 1,
            Some(RunStatus::Fail) => self.failed += 1,
            None => {}
        }
        self.execution_time += run.execution_time;
    }

    /// Percentage of passing runs; 0 for an empty set.
    fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64 * 100.0
        }
    }

    fn avg_execution_time(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.execution_time / self.total as f64
        }
    }

    fn report(&self) -> AggregatedReport {
        AggregatedReport {
            total_tests: self.total,
            passed_tests: self.passed,
            failed_tests: self.failed,
            pass_rate: self.pass_rate(),
            avg_execution_time: self.avg_execution_time(),
        }
    }
}

/// Report from counts and a summed execution time computed elsewhere.
pub fn from_totals(total: u64, passed: u64, failed: u64, execution_time: f64) -> AggregatedReport {
    Tally {
        total,
        passed,
        failed,
        execution_time,
    }
    .report()
}

/// Totals per suite, in suite order. Suites without runs are omitted.
pub fn by_suite(
    suites: &[test_suite::Model],
    runs: &[test_report::Model],
) -> Vec<SuiteAggregate> {
    let mut tallies: HashMap<i32, Tally> = HashMap::new();
    for run in runs {
        if let Some(suite_id) = run.test_suite_id {
            tallies.entry(suite_id).or_default().add(run);
        }
    }

    suites
        .iter()
        .filter_map(|suite| {
            let tally = tallies.get(&suite.id)?;
            Some(SuiteAggregate {
                suite_id: suite.id,
                suite_name: suite.suite_name.clone(),
                total_tests: tally.total,
                passed_tests: tally.passed,
                failed_tests: tally.failed,
                pass_rate: tally.pass_rate(),
                avg_execution_time: tally.avg_execution_time(),
            })
        })
        .collect()
}

fn count_by<F>(runs: &[test_report::Model], bucket: F) -> BTreeMap<NaiveDate, u64>
where
    F: Fn(NaiveDate) -> NaiveDate,
{
    let mut counts = BTreeMap::new();
    for run in runs {
        *counts.entry(bucket(run.timestamp.date_naive())).or_insert(0) += 1;
    }
    counts
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Runs per UTC calendar day, ascending.
pub fn per_day(runs: &[test_report::Model]) -> Vec<DailyCount> {
    count_by(runs, |d| d)
        .into_iter()
        .map(|(date, count)| DailyCount {
            date: date.format("%Y-%m-%d").to_string(),
            count,
        })
        .collect()
}

/// Runs per ISO week, ascending, keyed by the week's Monday.
pub fn per_week(runs: &[test_report::Model]) -> Vec<WeeklyCount> {
    count_by(runs, week_start)
        .into_iter()
        .map(|(week, count)| WeeklyCount {
            week: week.format("%Y-%m-%d").to_string(),
            count,
        })
        .collect()
}
