//! # `course_registry`
//!
//! Two concurrency strategies for a shared, mutable course registry, and a
//! multi-client workload that drives them identically so their throughput
//! can be compared.
//!
//! | Registry | Concurrency control |
//! |----------|---------------------|
//! | [`LockedRegistry`] | One reader/writer lock over a `HashMap` |
//! | [`ConcurrentRegistry`] | Sharded `DashMap`, atomic compute-if-present for `update` |
//!
//! ## Quick Start
//!
//! ```rust
//! use course_registry::{ConcurrentRegistry, Course, CourseRegistry, LockedRegistry};
//!
//! let locked = LockedRegistry::new();
//! let concurrent = ConcurrentRegistry::new();
//!
//! for registry in [&locked as &dyn CourseRegistry, &concurrent] {
//!     registry.add(Course::new("CSC102", "Data Structures"))?;
//!     registry.update("CSC102", "Advanced Data Structures")?;
//!     let course = registry.get("CSC102")?.expect("just added");
//!     assert_eq!(course.name(), "Advanced Data Structures");
//! }
//! # Ok::<(), course_registry::RegistryError>(())
//! ```
//!
//! ## Workloads
//!
//! A [`BenchmarkDriver`] seeds both registries from the same course list,
//! spawns [`WorkloadTask`]s onto a worker pool sized to the hardware, and
//! times each trial from first spawn to the [`CountdownLatch`] opening.
//! Tasks either repeat one [`Operation`] or draw one at random each
//! iteration ([`OperationMode`]), against one registry or both ([`Target`]).
//!
//! ## Cancellation
//!
//! Raising the driver's [`Interrupt`] makes lock waits in [`LockedRegistry`],
//! running tasks, and the driver's own wait give up with a cancellation
//! error. Every task still decrements the latch, so nothing waits forever.
//!
//! ## Logging
//!
//! Build with `--features tracing` to get `tracing` events from lock waits,
//! tasks and the driver. Without the feature the logging macros compile to
//! nothing.

#![deny(missing_docs)]

pub mod config;
pub mod driver;
pub mod error;
pub mod interrupt;
pub mod latch;
pub mod record;
pub mod registry;
pub mod report;
pub mod seed;
pub mod workload;

mod tracing_helpers;

pub use config::{BenchConfig, DriverConfig};
pub use driver::{BenchmarkDriver, TrialResult, TrialSpec};
pub use error::{
    ConfigError, DriverError, PartialTrial, RegistryError, SeedError, WaitCancelled,
};
pub use interrupt::Interrupt;
pub use latch::{CompletionGuard, CountdownLatch};
pub use record::Course;
pub use registry::{ConcurrentRegistry, CourseRegistry, LockedRegistry};
pub use workload::{
    Operation, OperationMode, Registries, TaskStats, Target, TrialTally, WorkloadTask,
};
