//! Tracing setup shared by the integration tests.
//!
//! ```rust,ignore
//! mod common;
//!
//! #[test]
//! fn contended_updates() {
//!     common::init_tracing();
//!     // ...
//! }
//! ```
//!
//! Library events only appear when the tests are built with
//! `--features tracing`; events emitted by the tests themselves always do.
//!
//! # Configuration
//!
//! - `RUST_LOG`: filter directives, e.g.
//!   `course_registry=debug,course_registry::registry::locked=trace`
//! - `COURSE_REGISTRY_LOG_DIR`: log directory (default `logs/`)
//! - `COURSE_REGISTRY_LOG_CONSOLE`: `0` disables console output
//!
//! Events are appended to `course_registry.jsonl` in the log directory, one
//! JSON object per line:
//!
//! ```bash
//! # Lock waits given up after an interrupt
//! jq 'select(.fields.message | test("cancelled"))' logs/course_registry.jsonl
//!
//! # Everything from one worker thread
//! jq 'select(.threadName == "course-worker-3")' logs/course_registry.jsonl
//! ```

#![allow(dead_code)]

use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::{Mutex, Once};

use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

static INIT: Once = Once::new();

/// Install console and NDJSON file logging. Only the first call has an effect.
pub fn init_tracing() {
    INIT.call_once(|| setup_tracing(&TracingConfig::from_env()));
}

/// Where and how test logs are written.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub log_dir: PathBuf,
    pub log_file: &'static str,
    pub console: bool,
    /// Used when `RUST_LOG` is unset.
    pub default_level: Level,
}

impl TracingConfig {
    pub fn from_env() -> Self {
        Self {
            log_dir: env::var_os("COURSE_REGISTRY_LOG_DIR")
                .map_or_else(|| PathBuf::from("logs"), PathBuf::from),
            log_file: "course_registry.jsonl",
            console: !env::var("COURSE_REGISTRY_LOG_CONSOLE").is_ok_and(|v| v == "0"),
            default_level: Level::INFO,
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_level.to_string()))
    }
}

#[expect(clippy::expect_used)]
fn setup_tracing(config: &TracingConfig) {
    std::fs::create_dir_all(&config.log_dir).expect("Failed to create log directory");

    // Append: nextest runs each test in its own process.
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_dir.join(config.log_file))
        .expect("Failed to open log file");

    let console_layer = config.console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_thread_names(true)
            .with_target(true)
            .with_line_number(true)
            .with_ansi(true)
            .compact()
            .with_filter(config.filter())
    });

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(file))
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(FmtSpan::CLOSE)
        .json()
        .with_filter(config.filter());

    let _ = Registry::default()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}
