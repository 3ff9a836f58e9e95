//! Aggregating trial results for display and JSON output.

use std::fmt as StdFmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use serde::Serialize;

use crate::driver::TrialResult;
use crate::workload::{OperationMode, Target};

/// Measured trials of one (target, mode) combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialSummary {
    /// Registries driven.
    pub target: Target,
    /// Operation selection.
    pub mode: OperationMode,
    /// Number of trials summarized.
    pub trials: usize,
    /// Tasks per trial.
    pub tasks: usize,
    /// Iterations per task.
    pub iterations: usize,
    /// Fastest trial, nanoseconds.
    pub min_ns: u64,
    /// Median trial, nanoseconds.
    pub median_ns: u64,
    /// Slowest trial, nanoseconds.
    pub max_ns: u64,
    /// Mean of per-trial throughput.
    pub mean_ops_per_sec: f64,
    /// Abnormal task exits across all trials.
    pub abnormal_exits: usize,
}

fn nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Median of a sorted slice; midpoint of the middle pair for even lengths.
fn median(sorted: &[u64]) -> u64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        sorted[mid - 1].midpoint(sorted[mid])
    }
}

impl TrialSummary {
    /// Summarize `results`, which must all share a target and mode.
    ///
    /// Returns `None` for an empty slice.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_results(results: &[TrialResult]) -> Option<Self> {
        let first = results.first()?;

        let mut elapsed: Vec<u64> = results.iter().map(|r| nanos(r.elapsed)).collect();
        elapsed.sort_unstable();

        let mean_ops_per_sec =
            results.iter().map(TrialResult::ops_per_sec).sum::<f64>() / results.len() as f64;

        Some(Self {
            target: first.target,
            mode: first.mode,
            trials: results.len(),
            tasks: first.tasks,
            iterations: first.iterations,
            min_ns: elapsed[0],
            median_ns: median(&elapsed),
            max_ns: elapsed[elapsed.len() - 1],
            mean_ops_per_sec,
            abnormal_exits: results.iter().map(|r| r.abnormal_exits).sum(),
        })
    }
}

impl StdFmt::Display for TrialSummary {
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        write!(
            f,
            "{:<10} {:<7} median {:>10.3} ms  min {:>10.3} ms  max {:>10.3} ms  {:>14.0} ops/s",
            self.target.name(),
            self.mode.to_string(),
            self.median_ns as f64 / 1_000_000.0,
            self.min_ns as f64 / 1_000_000.0,
            self.max_ns as f64 / 1_000_000.0,
            self.mean_ops_per_sec,
        )?;
        if self.abnormal_exits > 0 {
            write!(f, "  ({} abnormal exits)", self.abnormal_exits)?;
        }
        Ok(())
    }
}

/// Everything one `course_bench` run measured.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchReport {
    /// Worker pool size.
    pub threads: usize,
    /// Courses in the seed list.
    pub courses: usize,
    /// One entry per measured combination.
    pub summaries: Vec<TrialSummary>,
    /// Whether the run was interrupted before every combination finished.
    pub cancelled: bool,
}

impl BenchReport {
    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Serialization failure from `serde_json`.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty-printed JSON to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// I/O or serialization failure.
    pub fn write_json(&self, path: &Path) -> io::Result<()> {
        let mut out = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut out, self)?;
        out.write_all(b"\n")?;
        out.flush()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::workload::{Operation, TaskStats};

    fn result(ms: u64, gets: u64) -> TrialResult {
        TrialResult {
            target: Target::Concurrent,
            mode: OperationMode::Fixed(Operation::Get),
            tasks: 10,
            iterations: 50,
            elapsed: Duration::from_millis(ms),
            stats: TaskStats {
                gets,
                get_hits: gets,
                ..TaskStats::default()
            },
            abnormal_exits: 0,
        }
    }

    #[test]
    fn empty_results_have_no_summary() {
        assert!(TrialSummary::from_results(&[]).is_none());
    }

    #[test]
    fn summary_orders_and_takes_median() {
        let summary =
            TrialSummary::from_results(&[result(30, 500), result(10, 500), result(20, 500)])
                .unwrap();
        assert_eq!(summary.trials, 3);
        assert_eq!(summary.min_ns, 10_000_000);
        assert_eq!(summary.median_ns, 20_000_000);
        assert_eq!(summary.max_ns, 30_000_000);
        assert!(summary.mean_ops_per_sec > 0.0);
    }

    #[test]
    fn even_count_median_is_midpoint() {
        assert_eq!(median(&[10, 20, 40, 50]), 30);
    }

    #[test]
    fn report_serializes_modes_and_targets() {
        let report = BenchReport {
            threads: 4,
            courses: 50,
            summaries: vec![TrialSummary::from_results(&[result(5, 500)]).unwrap()],
            cancelled: false,
        };
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        let summary = &json["summaries"][0];
        assert_eq!(summary["target"], "concurrent");
        assert_eq!(summary["mode"]["kind"], "fixed");
        assert_eq!(summary["mode"]["operation"], "get");
        assert_eq!(json["cancelled"], false);
    }
}
