//! Zero-cost tracing helpers.
//!
//! With the `tracing` feature these macros forward to the `tracing` crate.
//! Without it (the default) they expand to nothing, so lock waits and the
//! workload hot loop pay nothing for logging during a measured trial.
//!
//! ```bash
//! # Plain benchmark run
//! cargo run --release --bin course_bench
//!
//! # With logs for the driver and lock waits
//! RUST_LOG=course_registry=debug cargo run --release --features tracing --bin course_bench
//! ```
//!
//! Arguments are never evaluated when the feature is off, so do not put
//! side effects inside them.

#![allow(unused_macros, unused_imports)]

/// Trace-level logging. No-op without `tracing`.
#[cfg(feature = "tracing")]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

/// Debug-level logging. No-op without `tracing`.
#[cfg(feature = "tracing")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

/// Info-level logging. No-op without `tracing`.
#[cfg(feature = "tracing")]
macro_rules! info_log {
    ($($arg:tt)*) => {
        tracing::info!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! info_log {
    ($($arg:tt)*) => {};
}

/// Warn-level logging. No-op without `tracing`.
#[cfg(feature = "tracing")]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        tracing::warn!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! warn_log {
    ($($arg:tt)*) => {};
}

/// Error-level logging. No-op without `tracing`.
#[cfg(feature = "tracing")]
macro_rules! error_log {
    ($($arg:tt)*) => {
        tracing::error!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! error_log {
    ($($arg:tt)*) => {};
}

pub(crate) use debug_log;
pub(crate) use error_log;
pub(crate) use info_log;
pub(crate) use trace_log;
pub(crate) use warn_log;
