//! Benchmark configuration.
//!
//! Every knob has a default and can be overridden from the environment:
//!
//! | Variable | Meaning | Default |
//! |----------|---------|---------|
//! | `COURSE_BENCH_TASKS` | workload tasks per trial | 10 |
//! | `COURSE_BENCH_THREADS` | worker pool size | available parallelism |
//! | `COURSE_BENCH_ITERATIONS` | iterations per task | seed list size |
//! | `COURSE_BENCH_WARMUP` | unmeasured trials per combination | 20 |
//! | `COURSE_BENCH_TRIALS` | measured trials per combination | 20 |
//! | `COURSE_BENCH_SEED` | base RNG seed | entropy |
//! | `COURSE_BENCH_SAMPLE` | synthetic catalog size when no file is given | 200 |
//! | `COURSE_BENCH_COURSES` | course list file | synthetic catalog |
//! | `COURSE_BENCH_TARGETS` | comma list of `locked`, `concurrent`, `both` | `locked,concurrent` |
//! | `COURSE_BENCH_MODES` | comma list of `add`, `get`, `update`, `remove`, `random` | all five |
//! | `COURSE_BENCH_OUTPUT` | JSON report path | none |

use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ConfigError;
use crate::workload::{OperationMode, Target};

/// Settings for the worker pool and the tasks it runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverConfig {
    /// Worker threads. `None` sizes the pool to the hardware.
    pub threads: Option<NonZeroUsize>,
    /// Base RNG seed; task `i` uses `seed + i`. `None` seeds from entropy.
    pub rng_seed: Option<u64>,
}

impl DriverConfig {
    /// Pool size after applying the hardware default.
    #[must_use]
    pub fn resolved_threads(&self) -> usize {
        self.threads
            .or_else(|| std::thread::available_parallelism().ok())
            .map_or(1, NonZeroUsize::get)
    }
}

/// Full configuration for the `course_bench` binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    /// Pool and RNG settings.
    pub driver: DriverConfig,
    /// Tasks spawned per trial.
    pub tasks: usize,
    /// Iterations per task. `None` means one per seed course.
    pub iterations: Option<usize>,
    /// Unmeasured trials before measuring.
    pub warmup: usize,
    /// Measured trials.
    pub trials: usize,
    /// Synthetic catalog size used when `courses` is `None`.
    pub sample_size: usize,
    /// Course list file.
    pub courses: Option<PathBuf>,
    /// Registries to benchmark, one combination each.
    pub targets: Vec<Target>,
    /// Operation modes to benchmark.
    pub modes: Vec<OperationMode>,
    /// Where to write the JSON report.
    pub output: Option<PathBuf>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            driver: DriverConfig::default(),
            tasks: 10,
            iterations: None,
            warmup: 20,
            trials: 20,
            sample_size: 200,
            courses: None,
            targets: vec![Target::Locked, Target::Concurrent],
            modes: OperationMode::ALL.to_vec(),
            output: None,
        }
    }
}

impl BenchConfig {
    /// Defaults overridden by `COURSE_BENCH_*` environment variables.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] for a value that does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] for a value that does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(n) = parse_var::<usize, _>(&lookup, "COURSE_BENCH_TASKS")? {
            config.tasks = n;
        }
        if let Some(n) = parse_var::<NonZeroUsize, _>(&lookup, "COURSE_BENCH_THREADS")? {
            config.driver.threads = Some(n);
        }
        if let Some(n) = parse_var::<usize, _>(&lookup, "COURSE_BENCH_ITERATIONS")? {
            config.iterations = Some(n);
        }
        if let Some(n) = parse_var::<usize, _>(&lookup, "COURSE_BENCH_WARMUP")? {
            config.warmup = n;
        }
        if let Some(n) = parse_var::<usize, _>(&lookup, "COURSE_BENCH_TRIALS")? {
            config.trials = n;
        }
        if let Some(n) = parse_var::<u64, _>(&lookup, "COURSE_BENCH_SEED")? {
            config.driver.rng_seed = Some(n);
        }
        if let Some(n) = parse_var::<usize, _>(&lookup, "COURSE_BENCH_SAMPLE")? {
            config.sample_size = n;
        }
        if let Some(path) = lookup("COURSE_BENCH_COURSES").filter(|p| !p.is_empty()) {
            config.courses = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("COURSE_BENCH_OUTPUT").filter(|p| !p.is_empty()) {
            config.output = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup("COURSE_BENCH_TARGETS") {
            config.targets = parse_list(&raw, "COURSE_BENCH_TARGETS", Target::from_name)?;
        }
        if let Some(raw) = lookup("COURSE_BENCH_MODES") {
            config.modes = parse_list(&raw, "COURSE_BENCH_MODES", OperationMode::from_name)?;
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&'static str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::Invalid { var, value: raw })
}

fn parse_list<T>(
    raw: &str,
    var: &'static str,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Vec<T>, ConfigError> {
    let items: Option<Vec<T>> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| parse(&s.to_ascii_lowercase()))
        .collect();

    match items {
        Some(items) if !items.is_empty() => Ok(items),
        _ => Err(ConfigError::Invalid {
            var,
            value: raw.to_owned(),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::workload::Operation;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: HashMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, (*v).to_owned())).collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn defaults_without_env() {
        let config = BenchConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, BenchConfig::default());
        assert_eq!(config.tasks, 10);
        assert_eq!(config.modes.len(), 5);
        assert!(config.driver.resolved_threads() >= 1);
    }

    #[test]
    fn overrides_are_applied() {
        let config = BenchConfig::from_lookup(lookup(&[
            ("COURSE_BENCH_TASKS", "4"),
            ("COURSE_BENCH_THREADS", "2"),
            ("COURSE_BENCH_ITERATIONS", " 75 "),
            ("COURSE_BENCH_SEED", "42"),
            ("COURSE_BENCH_COURSES", "courses.txt"),
            ("COURSE_BENCH_TARGETS", "both"),
            ("COURSE_BENCH_MODES", "get, Random"),
        ]))
        .unwrap();

        assert_eq!(config.tasks, 4);
        assert_eq!(config.driver.resolved_threads(), 2);
        assert_eq!(config.iterations, Some(75));
        assert_eq!(config.driver.rng_seed, Some(42));
        assert_eq!(config.courses, Some(PathBuf::from("courses.txt")));
        assert_eq!(config.targets, vec![Target::Both]);
        assert_eq!(
            config.modes,
            vec![OperationMode::Fixed(Operation::Get), OperationMode::Randomized]
        );
    }

    #[test]
    fn bad_number_is_rejected() {
        let err = BenchConfig::from_lookup(lookup(&[("COURSE_BENCH_TRIALS", "lots")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                var: "COURSE_BENCH_TRIALS",
                value: "lots".to_owned()
            }
        );
    }

    #[test]
    fn zero_threads_is_rejected() {
        assert!(BenchConfig::from_lookup(lookup(&[("COURSE_BENCH_THREADS", "0")])).is_err());
    }

    #[test]
    fn unknown_target_is_rejected() {
        assert!(BenchConfig::from_lookup(lookup(&[("COURSE_BENCH_TARGETS", "locked,hashmap")])).is_err());
        assert!(BenchConfig::from_lookup(lookup(&[("COURSE_BENCH_MODES", " , ")])).is_err());
    }
}
