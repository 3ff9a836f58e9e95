//! Course registry benchmark.
//!
//! Runs every configured (target, mode) combination: warmup trials first,
//! then measured trials, each on freshly seeded registries. Prints a summary
//! line per combination and optionally writes a JSON report.
//!
//! Run with:
//! ```bash
//! # Synthetic catalog, defaults
//! cargo run --release --bin course_bench
//!
//! # Own course list ("CODE - Name" per line), JSON report
//! COURSE_BENCH_OUTPUT=results.json cargo run --release --bin course_bench -- courses.txt
//!
//! # With tracing (writes to logs/course_bench.json)
//! RUST_LOG=course_registry=debug cargo run --release --features tracing --bin course_bench
//! ```
//!
//! Ctrl-C cancels the current trial; results measured so far are still
//! reported.

use std::process::ExitCode;

use course_registry::report::{BenchReport, TrialSummary};
use course_registry::seed::{load_courses, sample_courses};
use course_registry::{BenchConfig, BenchmarkDriver, Course, DriverError, TrialSpec};

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[cfg(feature = "tracing")]
type TracingGuard = tracing_appender::non_blocking::WorkerGuard;

#[cfg(not(feature = "tracing"))]
type TracingGuard = ();

// =============================================================================
// Tracing Initialization (JSON to file)
// =============================================================================

#[cfg(feature = "tracing")]
fn init_json_tracing() -> TracingGuard {
    use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = "logs";
    let filter_str =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "course_registry=info".to_string());

    let _ = std::fs::create_dir_all(log_dir);

    let file_appender = tracing_appender::rolling::never(log_dir, "course_bench.json");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_target(true)
        .with_ansi(false)
        .json()
        .with_filter(EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new("info")));

    let _ = tracing_subscriber::registry().with(file_layer).try_init();

    println!("Tracing enabled: logs/course_bench.json (filter: {filter_str})");

    guard
}

#[cfg(not(feature = "tracing"))]
fn init_json_tracing() -> TracingGuard {}

// =============================================================================
// Main
// =============================================================================

fn main() -> ExitCode {
    let _guard = init_json_tracing();

    let mut config = match BenchConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(path) = std::env::args_os().nth(1) {
        config.courses = Some(path.into());
    }

    let courses = match load_seed(&config) {
        Ok(courses) => courses,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run(&config, courses) {
        Ok(report) => finish(&config, &report),
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn load_seed(config: &BenchConfig) -> Result<Vec<Course>, course_registry::SeedError> {
    match &config.courses {
        Some(path) => load_courses(path),
        None => Ok(sample_courses(config.sample_size)),
    }
}

fn run(config: &BenchConfig, courses: Vec<Course>) -> Result<BenchReport, DriverError> {
    let mut driver = BenchmarkDriver::new(courses, &config.driver)?;

    let interrupt = driver.interrupt_handle();
    if let Err(e) = ctrlc::set_handler(move || interrupt.raise()) {
        eprintln!("warning: could not install Ctrl-C handler: {e}");
    }

    println!("Course Registry Benchmark");
    println!("=========================\n");
    println!(
        "{} courses, {} tasks/trial, {} worker threads, {} warmup + {} measured trials\n",
        driver.courses().len(),
        config.tasks,
        driver.threads(),
        config.warmup,
        config.trials
    );

    let mut report = BenchReport {
        threads: driver.threads(),
        courses: driver.courses().len(),
        summaries: Vec::new(),
        cancelled: false,
    };

    'combos: for &mode in &config.modes {
        for &target in &config.targets {
            let spec = TrialSpec {
                target,
                mode,
                tasks: config.tasks,
                iterations: config.iterations,
            };

            let mut results = Vec::with_capacity(config.trials);
            for trial in 0..config.warmup + config.trials {
                match driver.run_trial(&spec) {
                    Ok(result) if trial >= config.warmup => results.push(result),
                    Ok(_) => {}
                    Err(DriverError::Cancelled(partial)) => {
                        println!(
                            "\n{target} / {mode}: cancelled ({} of {} tasks outstanding)",
                            partial.outstanding, partial.tasks
                        );
                        report.cancelled = true;
                        report.summaries.extend(TrialSummary::from_results(&results));
                        break 'combos;
                    }
                    Err(e) => return Err(e),
                }
            }

            if let Some(summary) = TrialSummary::from_results(&results) {
                println!("{summary}");
                report.summaries.push(summary);
            }
        }
    }

    driver.shutdown();
    Ok(report)
}

fn finish(config: &BenchConfig, report: &BenchReport) -> ExitCode {
    if let Some(path) = &config.output {
        if let Err(e) = report.write_json(path) {
            eprintln!("error: failed to write {}: {e}", path.display());
            return ExitCode::FAILURE;
        }
        println!("\nReport written to {}", path.display());
    }

    if report.cancelled {
        ExitCode::from(130)
    } else {
        ExitCode::SUCCESS
    }
}
