//! Error types for registries, the workload driver, seed loading and configuration.
//!
//! A missing course is never an error: `get` reports it as `None` and
//! `update`/`remove` treat it as a no-op. The variants here cover the two
//! conditions that do surface to callers:
//!
//! - **Cancellation**: a wait (for a registry lock or the completion latch)
//!   was interrupted. Always propagated, never swallowed.
//! - **Contract violations**: e.g. an empty course code, rejected at the
//!   call boundary before any lock is touched.

use std::fmt as StdFmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
//  RegistryError
// ============================================================================

/// Errors returned by [`CourseRegistry`](crate::registry::CourseRegistry) operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// The course code was empty.
    EmptyCode,

    /// The operation stopped because its
    /// [`Interrupt`](crate::interrupt::Interrupt) was raised, either while
    /// waiting for a registry lock or between workload iterations.
    /// Registry state is unchanged by the interrupted call.
    Cancelled,
}

impl RegistryError {
    /// Returns `true` for [`RegistryError::Cancelled`].
    #[must_use]
    pub const fn is_cancelled(self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl StdFmt::Display for RegistryError {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        match self {
            Self::EmptyCode => write!(f, "course code must not be empty"),
            Self::Cancelled => write!(f, "operation cancelled by interrupt"),
        }
    }
}

impl std::error::Error for RegistryError {}

// ============================================================================
//  WaitCancelled
// ============================================================================

/// A [`CountdownLatch`](crate::latch::CountdownLatch) wait was abandoned
/// because its interrupt was raised before the count reached zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitCancelled {
    /// Latch count when the wait gave up.
    pub outstanding: usize,
}

impl StdFmt::Display for WaitCancelled {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        write!(
            f,
            "interrupted while waiting for {} outstanding task(s)",
            self.outstanding
        )
    }
}

impl std::error::Error for WaitCancelled {}

// ============================================================================
//  DriverError
// ============================================================================

/// What was known about a trial when it was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartialTrial {
    /// Time from the first spawn until the driver observed the interrupt.
    pub elapsed: Duration,

    /// Number of tasks the trial spawned.
    pub tasks: usize,

    /// Completion-latch count at the moment the driver stopped waiting.
    pub outstanding: usize,
}

/// Errors returned by [`BenchmarkDriver`](crate::driver::BenchmarkDriver).
#[derive(Debug)]
pub enum DriverError {
    /// The seed list was empty; there is nothing for tasks to pick from.
    EmptySeed,

    /// A workload was requested with zero tasks.
    NoTasks,

    /// The worker pool could not be created.
    PoolBuild(rayon::ThreadPoolBuildError),

    /// Seeding a registry failed.
    Registry(RegistryError),

    /// The trial was interrupted before every task finished cleanly.
    Cancelled(PartialTrial),
}

impl StdFmt::Display for DriverError {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        match self {
            Self::EmptySeed => write!(f, "seed course list is empty"),

            Self::NoTasks => write!(f, "workload needs at least one task"),

            Self::PoolBuild(e) => write!(f, "failed to build worker pool: {e}"),

            Self::Registry(e) => write!(f, "registry error: {e}"),

            Self::Cancelled(partial) => write!(
                f,
                "trial cancelled after {:?} with {} of {} tasks outstanding",
                partial.elapsed, partial.outstanding, partial.tasks
            ),
        }
    }
}

impl std::error::Error for DriverError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::PoolBuild(e) => Some(e),
            Self::Registry(e) => Some(e),
            Self::EmptySeed | Self::NoTasks | Self::Cancelled(_) => None,
        }
    }
}

impl From<RegistryError> for DriverError {
    fn from(e: RegistryError) -> Self {
        Self::Registry(e)
    }
}

impl From<rayon::ThreadPoolBuildError> for DriverError {
    fn from(e: rayon::ThreadPoolBuildError) -> Self {
        Self::PoolBuild(e)
    }
}

// ============================================================================
//  SeedError
// ============================================================================

/// Failure to read a course list from disk.
#[derive(Debug)]
pub struct SeedError {
    path: PathBuf,
    source: io::Error,
}

impl SeedError {
    pub(crate) const fn new(path: PathBuf, source: io::Error) -> Self {
        Self { path, source }
    }

    /// The file that could not be read.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl StdFmt::Display for SeedError {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        write!(f, "failed to read course list {}", self.path.display())
    }
}

impl std::error::Error for SeedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

// ============================================================================
//  ConfigError
// ============================================================================

/// An environment variable held a value that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `var` was set to `value`, which is not valid for it.
    Invalid {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },
}

impl StdFmt::Display for ConfigError {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        match self {
            Self::Invalid { var, value } => write!(f, "invalid value for {var}: {value:?}"),
        }
    }
}

impl std::error::Error for ConfigError {}
