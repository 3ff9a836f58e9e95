//! Simulated clients.
//!
//! A [`WorkloadTask`] stands in for one client: for a bounded number of
//! iterations it picks a course uniformly at random from the shared seed
//! list, picks an [`Operation`] (fixed for the task, or drawn fresh each
//! iteration), and applies it to the registries selected by its [`Target`].
//! With [`Target::Both`] the same operation on the same course is applied to
//! the locked registry and then the concurrent one, so a single-task run
//! leaves the two in identical states.
//!
//! Completion is signalled through a [`CountdownLatch`]: the task takes a
//! [`CompletionGuard`](crate::latch::CompletionGuard) before doing anything
//! else, so the latch is decremented exactly once whether the task finishes,
//! is cancelled, or panics.

use std::collections::BTreeMap;
use std::fmt as StdFmt;
use std::hint::black_box;
use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::error::RegistryError;
use crate::interrupt::Interrupt;
use crate::latch::CountdownLatch;
use crate::record::Course;
use crate::registry::{ConcurrentRegistry, CourseRegistry, LockedRegistry};
use crate::tracing_helpers::trace_log;

/// Appended to a seed course's name by [`Operation::Update`].
pub const UPDATE_SUFFIX: &str = " Updated";

// ============================================================================
//  Operation / OperationMode / Target
// ============================================================================

/// One registry operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Insert (or re-insert) the seed course.
    Add,
    /// Look the course up by code.
    Get,
    /// Rename to the seed name plus [`UPDATE_SUFFIX`].
    Update,
    /// Delete by code.
    Remove,
}

impl Operation {
    /// Every operation, in declaration order.
    pub const ALL: [Self; 4] = [Self::Add, Self::Get, Self::Update, Self::Remove];

    /// Lower-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Get => "get",
            Self::Update => "update",
            Self::Remove => "remove",
        }
    }

    /// Parse a lower-case name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Uniformly random operation.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }

    /// Apply this operation for `course` against `registry`.
    ///
    /// Returns `Some(found)` for [`Operation::Get`], `None` otherwise.
    ///
    /// # Errors
    ///
    /// Whatever the registry returns.
    pub fn apply<R: CourseRegistry + ?Sized>(
        self,
        registry: &R,
        course: &Course,
    ) -> Result<Option<bool>, RegistryError> {
        match self {
            Self::Add => registry.add(course.clone()).map(|()| None),
            Self::Get => {
                let found = black_box(registry.get(course.code())?);
                Ok(Some(found.is_some()))
            }
            Self::Update => {
                let new_name = format!("{}{UPDATE_SUFFIX}", course.name());
                registry.update(course.code(), &new_name).map(|()| None)
            }
            Self::Remove => registry.remove(course.code()).map(|()| None),
        }
    }
}

impl StdFmt::Display for Operation {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.write_str(self.name())
    }
}

/// How a task chooses its operation each iteration.
///
/// Both variants are first-class: the fixed mode isolates one operation's
/// cost, the randomized mode models a mixed client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "operation")]
pub enum OperationMode {
    /// Every iteration performs this operation.
    Fixed(Operation),
    /// Every iteration draws an operation uniformly at random.
    Randomized,
}

impl OperationMode {
    /// The four fixed modes followed by the randomized one.
    pub const ALL: [Self; 5] = [
        Self::Fixed(Operation::Add),
        Self::Fixed(Operation::Get),
        Self::Fixed(Operation::Update),
        Self::Fixed(Operation::Remove),
        Self::Randomized,
    ];

    /// Operation for the next iteration.
    pub fn pick<R: Rng + ?Sized>(self, rng: &mut R) -> Operation {
        match self {
            Self::Fixed(op) => op,
            Self::Randomized => Operation::random(rng),
        }
    }

    /// Parse an operation name or `random`.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "random" {
            return Some(Self::Randomized);
        }
        Operation::from_name(name).map(Self::Fixed)
    }
}

impl StdFmt::Display for OperationMode {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        match self {
            Self::Fixed(op) => write!(f, "{op}"),
            Self::Randomized => f.write_str("random"),
        }
    }
}

/// Which registries a task drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Only the [`LockedRegistry`].
    Locked,
    /// Only the [`ConcurrentRegistry`].
    Concurrent,
    /// Both, locked first, for cross-checking.
    Both,
}

impl Target {
    /// Lower-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Concurrent => "concurrent",
            Self::Both => "both",
        }
    }

    /// Parse a lower-case name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        [Self::Locked, Self::Concurrent, Self::Both]
            .into_iter()
            .find(|t| t.name() == name)
    }
}

impl StdFmt::Display for Target {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
//  Registries
// ============================================================================

/// The pair of registries under test, shared by every task of a trial.
#[derive(Debug, Clone)]
pub struct Registries {
    /// Registry behind one `RwLock`.
    pub locked: Arc<LockedRegistry>,
    /// Registry behind a sharded map.
    pub concurrent: Arc<ConcurrentRegistry>,
}

/// Per-code disagreement between the two registries: `(locked, concurrent)` names.
pub type Divergence = BTreeMap<String, (Option<String>, Option<String>)>;

impl Registries {
    /// Two empty registries. The locked one's waits observe `interrupt`.
    #[must_use]
    pub fn new(interrupt: &Interrupt) -> Self {
        Self {
            locked: Arc::new(LockedRegistry::with_interrupt(interrupt.clone())),
            concurrent: Arc::new(ConcurrentRegistry::new()),
        }
    }

    /// Two registries seeded identically with `courses`.
    ///
    /// # Errors
    ///
    /// The first registry error hit while seeding.
    pub fn seeded(courses: &[Course], interrupt: &Interrupt) -> Result<Self, RegistryError> {
        let registries = Self {
            locked: Arc::new(LockedRegistry::with_interrupt(interrupt.clone())),
            concurrent: Arc::new(ConcurrentRegistry::with_capacity(courses.len())),
        };
        registries.locked.seed(courses)?;
        registries.concurrent.seed(courses)?;
        Ok(registries)
    }

    /// Codes whose presence or name differs between the two registries.
    ///
    /// Only meaningful while no task is running.
    #[must_use]
    pub fn divergence(&self) -> Divergence {
        let mut locked = self.locked.snapshot();
        let concurrent = self.concurrent.snapshot();
        let mut out = Divergence::new();

        for (code, name) in concurrent {
            match locked.remove(&code) {
                Some(other) if other == name => {}
                other => {
                    out.insert(code, (other, Some(name)));
                }
            }
        }
        for (code, name) in locked {
            out.insert(code, (Some(name), None));
        }
        out
    }
}

// ============================================================================
//  TaskStats / TrialTally
// ============================================================================

/// Registry operations performed by one task (or merged over a trial).
///
/// With [`Target::Both`] each iteration counts once per registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskStats {
    /// `add` calls.
    pub adds: u64,
    /// `get` calls.
    pub gets: u64,
    /// `update` calls.
    pub updates: u64,
    /// `remove` calls.
    pub removes: u64,
    /// `get` calls that found the course.
    pub get_hits: u64,
    /// `get` calls that did not.
    pub get_misses: u64,
}

impl TaskStats {
    fn record(&mut self, op: Operation, found: Option<bool>) {
        match op {
            Operation::Add => self.adds += 1,
            Operation::Get => self.gets += 1,
            Operation::Update => self.updates += 1,
            Operation::Remove => self.removes += 1,
        }
        match found {
            Some(true) => self.get_hits += 1,
            Some(false) => self.get_misses += 1,
            None => {}
        }
    }

    /// Total registry operations.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.adds + self.gets + self.updates + self.removes
    }

    /// Add `other`'s counts into `self`.
    pub const fn merge(&mut self, other: &Self) {
        self.adds += other.adds;
        self.gets += other.gets;
        self.updates += other.updates;
        self.removes += other.removes;
        self.get_hits += other.get_hits;
        self.get_misses += other.get_misses;
    }
}

/// Point-in-time copy of a [`TrialTally`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TallySnapshot {
    /// Merged stats of tasks that finished cleanly.
    pub stats: TaskStats,
    /// Tasks that finished all their iterations.
    pub succeeded: usize,
    /// Tasks that stopped on [`RegistryError::Cancelled`].
    pub cancelled: usize,
    /// Tasks that stopped on any other error.
    pub failed: usize,
}

impl TallySnapshot {
    /// Tasks that reported an outcome.
    #[must_use]
    pub const fn reported(&self) -> usize {
        self.succeeded + self.cancelled + self.failed
    }
}

/// Shared sink for task outcomes.
///
/// Tasks record into it before their completion guard drops, so once the
/// latch opens every non-panicking task has been counted.
#[derive(Debug, Default)]
pub struct TrialTally {
    inner: Mutex<TallySnapshot>,
}

impl TrialTally {
    /// Empty tally.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one task outcome.
    pub fn record(&self, outcome: &Result<TaskStats, RegistryError>) {
        let mut inner = self.inner.lock();
        match outcome {
            Ok(stats) => {
                inner.stats.merge(stats);
                inner.succeeded += 1;
            }
            Err(RegistryError::Cancelled) => inner.cancelled += 1,
            Err(_) => inner.failed += 1,
        }
    }

    /// Copy of the current counts.
    #[must_use]
    pub fn snapshot(&self) -> TallySnapshot {
        *self.inner.lock()
    }
}

// ============================================================================
//  WorkloadTask
// ============================================================================

/// One simulated client.
#[derive(Debug)]
pub struct WorkloadTask {
    registries: Registries,
    seed: Arc<[Course]>,
    completion: Arc<CountdownLatch>,
    target: Target,
    mode: OperationMode,
    iterations: usize,
    rng: StdRng,
    interrupt: Interrupt,
    tally: Option<Arc<TrialTally>>,
}

impl WorkloadTask {
    /// A task over `seed` that decrements `completion` when done.
    ///
    /// Defaults: [`Target::Both`], [`OperationMode::Randomized`], one
    /// iteration per seed course, entropy-seeded RNG, never interrupted,
    /// no tally.
    #[must_use]
    pub fn new(
        registries: Registries,
        seed: Arc<[Course]>,
        completion: Arc<CountdownLatch>,
    ) -> Self {
        let iterations = seed.len();
        Self {
            registries,
            seed,
            completion,
            target: Target::Both,
            mode: OperationMode::Randomized,
            iterations,
            rng: StdRng::from_entropy(),
            interrupt: Interrupt::new(),
            tally: None,
        }
    }

    /// Registries to drive.
    #[must_use]
    pub fn target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    /// Operation selection.
    #[must_use]
    pub fn mode(mut self, mode: OperationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Number of iterations.
    #[must_use]
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Deterministic RNG seed.
    #[must_use]
    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Interrupt checked before every iteration.
    #[must_use]
    pub fn interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Where to record the outcome.
    #[must_use]
    pub fn tally(mut self, tally: Arc<TrialTally>) -> Self {
        self.tally = Some(tally);
        self
    }

    /// Run every iteration, then signal completion.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Cancelled`] if the interrupt was raised before the
    /// last iteration or a lock wait was interrupted; remaining iterations
    /// are skipped. The latch is decremented either way.
    pub fn run(mut self) -> Result<TaskStats, RegistryError> {
        let completion = Arc::clone(&self.completion);
        let _done = completion.guard();

        let outcome = self.drive();
        if let Some(tally) = &self.tally {
            tally.record(&outcome);
        }
        outcome
    }

    fn drive(&mut self) -> Result<TaskStats, RegistryError> {
        let mut stats = TaskStats::default();
        if self.seed.is_empty() {
            return Ok(stats);
        }

        for _ in 0..self.iterations {
            if self.interrupt.is_raised() {
                trace_log!(done = stats.total(), "task interrupted");
                return Err(RegistryError::Cancelled);
            }

            let course = &self.seed[self.rng.gen_range(0..self.seed.len())];
            let op = self.mode.pick(&mut self.rng);
            Self::apply(&self.registries, self.target, op, course, &mut stats)?;
        }
        Ok(stats)
    }

    fn apply(
        registries: &Registries,
        target: Target,
        op: Operation,
        course: &Course,
        stats: &mut TaskStats,
    ) -> Result<(), RegistryError> {
        if matches!(target, Target::Locked | Target::Both) {
            stats.record(op, op.apply(registries.locked.as_ref(), course)?);
        }
        if matches!(target, Target::Concurrent | Target::Both) {
            stats.record(op, op.apply(registries.concurrent.as_ref(), course)?);
        }
        Ok(())
    }
}
