//! Trial driver.
//!
//! [`BenchmarkDriver`] owns the seed list, the pair of registries and a
//! fixed-size worker pool. A trial spawns `tasks` [`WorkloadTask`]s onto the
//! pool, waits on a [`CountdownLatch`] until every task has finished, and
//! reports the wall-clock time between the first spawn and the latch opening.
//!
//! ```rust
//! use course_registry::{BenchmarkDriver, DriverConfig, Operation, OperationMode, Target};
//! use course_registry::seed::sample_courses;
//!
//! let driver = BenchmarkDriver::new(sample_courses(50), &DriverConfig::default()).unwrap();
//! let result = driver
//!     .run_workload(Target::Both, 10, None, OperationMode::Fixed(Operation::Get))
//!     .unwrap();
//! assert_eq!(result.operations(), 10 * 50 * 2);
//! ```
//!
//! # Cancellation
//!
//! Raising the driver's [`Interrupt`] (see [`BenchmarkDriver::interrupt_handle`])
//! stops a trial early: queued tasks exit before their first iteration,
//! running tasks exit at their next iteration or lock wait, and the driver
//! stops waiting and returns [`DriverError::Cancelled`] with the latch count
//! it last saw. The interrupt is permanent; later trials on the same driver
//! are cancelled immediately.

use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::DriverConfig;
use crate::error::{DriverError, PartialTrial};
use crate::interrupt::Interrupt;
use crate::latch::CountdownLatch;
use crate::record::Course;
use crate::tracing_helpers::{debug_log, error_log, info_log, warn_log};
use crate::workload::{
    OperationMode, Registries, TallySnapshot, TaskStats, Target, TrialTally, WorkloadTask,
};

/// Parameters for one trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialSpec {
    /// Registries the tasks drive.
    pub target: Target,
    /// Operation selection for every task.
    pub mode: OperationMode,
    /// Number of concurrent tasks.
    pub tasks: usize,
    /// Iterations per task; `None` means the seed list's size.
    pub iterations: Option<usize>,
}

/// Outcome of a trial in which no task was cancelled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialResult {
    /// Registries the tasks drove.
    pub target: Target,
    /// Operation selection.
    pub mode: OperationMode,
    /// Tasks spawned.
    pub tasks: usize,
    /// Iterations each task was asked to run.
    pub iterations: usize,
    /// First spawn until the completion latch opened.
    pub elapsed: Duration,
    /// Merged stats of tasks that finished cleanly.
    pub stats: TaskStats,
    /// Tasks that panicked or stopped on a non-cancellation error.
    pub abnormal_exits: usize,
}

impl TrialResult {
    /// Registry operations performed.
    #[must_use]
    pub const fn operations(&self) -> u64 {
        self.stats.total()
    }

    /// Registry operations per second of wall-clock time.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn ops_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.operations() as f64 / secs
        } else {
            0.0
        }
    }
}

/// What [`BenchmarkDriver::execute`] saw once every job had finished.
#[derive(Debug)]
struct Finished {
    elapsed: Duration,
    counts: TallySnapshot,
    abnormal_exits: usize,
}

/// Seeds registries, runs trials on a worker pool, times them.
#[derive(Debug)]
pub struct BenchmarkDriver {
    seed: Arc<[Course]>,
    registries: Registries,
    pool: ThreadPool,
    interrupt: Interrupt,
    rng_seed: Option<u64>,
}

impl BenchmarkDriver {
    /// Build the pool and two identically seeded registries.
    ///
    /// # Errors
    ///
    /// [`DriverError::EmptySeed`] for an empty `seed`,
    /// [`DriverError::PoolBuild`] if the pool cannot start, or a seeding
    /// [`DriverError::Registry`] error.
    pub fn new(seed: Vec<Course>, config: &DriverConfig) -> Result<Self, DriverError> {
        if seed.is_empty() {
            return Err(DriverError::EmptySeed);
        }

        let interrupt = Interrupt::new();
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.resolved_threads())
            .thread_name(|i| format!("course-worker-{i}"))
            .panic_handler(|_payload| {
                error_log!("workload task panicked");
            })
            .build()?;

        let seed: Arc<[Course]> = seed.into();
        let registries = Registries::seeded(&seed, &interrupt)?;
        info_log!(
            threads = pool.current_num_threads(),
            courses = seed.len(),
            "driver ready"
        );

        Ok(Self {
            seed,
            registries,
            pool,
            interrupt,
            rng_seed: config.rng_seed,
        })
    }

    /// Replace the seed list and reseed fresh registries from it.
    ///
    /// # Errors
    ///
    /// [`DriverError::EmptySeed`] for an empty list, or a seeding error.
    /// On error the previous seed and registries are kept.
    pub fn seed(&mut self, courses: Vec<Course>) -> Result<(), DriverError> {
        if courses.is_empty() {
            return Err(DriverError::EmptySeed);
        }
        let seed: Arc<[Course]> = courses.into();
        self.registries = Registries::seeded(&seed, &self.interrupt)?;
        self.seed = seed;
        Ok(())
    }

    /// Discard the registries and reseed fresh ones from the current seed list.
    ///
    /// # Errors
    ///
    /// A seeding error.
    pub fn reset(&mut self) -> Result<(), DriverError> {
        self.registries = Registries::seeded(&self.seed, &self.interrupt)?;
        Ok(())
    }

    /// The seed list.
    #[must_use]
    pub fn courses(&self) -> &[Course] {
        &self.seed
    }

    /// The registries the next trial will drive.
    #[must_use]
    pub const fn registries(&self) -> &Registries {
        &self.registries
    }

    /// Worker pool size.
    #[must_use]
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Handle that cancels running and future trials when raised.
    #[must_use]
    pub fn interrupt_handle(&self) -> Interrupt {
        self.interrupt.clone()
    }

    /// Reseed, then run `spec`.
    ///
    /// # Errors
    ///
    /// As for [`reset`](Self::reset) and [`run_workload`](Self::run_workload).
    pub fn run_trial(&mut self, spec: &TrialSpec) -> Result<TrialResult, DriverError> {
        self.reset()?;
        self.run_workload(spec.target, spec.tasks, spec.iterations, spec.mode)
    }

    /// Spawn `tasks` workload tasks against the current registries and wait
    /// for all of them.
    ///
    /// Registries are not reset first; consecutive calls see each other's
    /// mutations.
    ///
    /// # Errors
    ///
    /// [`DriverError::NoTasks`] for `tasks == 0`;
    /// [`DriverError::Cancelled`] if the interrupt was raised before the
    /// latch opened or any task reported cancellation.
    pub fn run_workload(
        &self,
        target: Target,
        tasks: usize,
        iterations: Option<usize>,
        mode: OperationMode,
    ) -> Result<TrialResult, DriverError> {
        let iterations = iterations.unwrap_or(self.seed.len());
        debug_log!(%target, %mode, tasks, iterations, "starting workload");

        let finished = self.execute(tasks, |i, latch, tally| {
            let mut task =
                WorkloadTask::new(self.registries.clone(), Arc::clone(&self.seed), latch)
                    .target(target)
                    .mode(mode)
                    .iterations(iterations)
                    .interrupt(self.interrupt.clone())
                    .tally(tally);
            if let Some(base) = self.rng_seed {
                task = task.rng_seed(base.wrapping_add(i as u64));
            }
            move || {
                let _ = task.run();
            }
        })?;

        Ok(TrialResult {
            target,
            mode,
            tasks,
            iterations,
            elapsed: finished.elapsed,
            stats: finished.counts.stats,
            abnormal_exits: finished.abnormal_exits,
        })
    }

    /// Spawn one job per task onto the pool and wait on their shared latch.
    ///
    /// `make_job(i, latch, tally)` builds job `i`. Each job must decrement
    /// `latch` exactly once and should record its outcome in `tally`; a job
    /// that never records counts as an abnormal exit.
    fn execute<F, J>(&self, tasks: usize, mut make_job: F) -> Result<Finished, DriverError>
    where
        F: FnMut(usize, Arc<CountdownLatch>, Arc<TrialTally>) -> J,
        J: FnOnce() + Send + 'static,
    {
        if tasks == 0 {
            return Err(DriverError::NoTasks);
        }
        let latch = Arc::new(CountdownLatch::new(tasks));
        let tally = Arc::new(TrialTally::new());

        let start = Instant::now();
        for i in 0..tasks {
            self.pool
                .spawn(make_job(i, Arc::clone(&latch), Arc::clone(&tally)));
        }

        let waited = latch.wait_interruptible(&self.interrupt);
        let elapsed = start.elapsed();
        let counts = tally.snapshot();

        if waited.is_err() || counts.cancelled > 0 {
            let partial = PartialTrial {
                elapsed,
                tasks,
                outstanding: latch.count(),
            };
            warn_log!(
                outstanding = partial.outstanding,
                cancelled = counts.cancelled,
                "workload cancelled"
            );
            return Err(DriverError::Cancelled(partial));
        }

        let abnormal_exits = tasks - counts.reported() + counts.failed;
        if abnormal_exits > 0 {
            warn_log!(abnormal_exits, "workload tasks exited abnormally");
        }
        debug_log!(?elapsed, ops = counts.stats.total(), "workload finished");

        Ok(Finished {
            elapsed,
            counts,
            abnormal_exits,
        })
    }

    /// Cancel outstanding work and tear down the pool.
    ///
    /// Queued tasks exit without running iterations; running tasks stop at
    /// their next interrupt check. Each still decrements its latch.
    pub fn shutdown(self) {
        self.interrupt.raise();
        drop(self.pool);
    }
}
