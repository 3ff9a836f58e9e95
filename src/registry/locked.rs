//! Registry guarded by a single reader/writer lock.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{CourseRegistry, check_code};
use crate::error::RegistryError;
use crate::interrupt::Interrupt;
use crate::record::Course;
use crate::tracing_helpers::{debug_log, trace_log};

/// How long a contended acquisition waits before rechecking its interrupt.
pub const LOCK_POLL: Duration = Duration::from_millis(1);

type Courses = HashMap<String, Course>;

/// A `HashMap` behind one `RwLock` covering the entire structure.
///
/// `get` takes shared access; `add`, `update` and `remove` take exclusive
/// access. Any number of readers proceed together, and all of them wait
/// while a writer holds the lock.
///
/// A contended acquisition waits in [`LOCK_POLL`] slices and gives up with
/// [`RegistryError::Cancelled`] once the registry's [`Interrupt`] is raised.
/// The lock is only ever held through a guard, so it is released on every
/// exit path.
#[derive(Debug, Default)]
pub struct LockedRegistry {
    courses: RwLock<Courses>,
    interrupt: Interrupt,
}

impl LockedRegistry {
    /// Create an empty registry whose lock waits are never interrupted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry whose lock waits observe `interrupt`.
    #[must_use]
    pub fn with_interrupt(interrupt: Interrupt) -> Self {
        Self {
            courses: RwLock::new(HashMap::new()),
            interrupt,
        }
    }

    /// The interrupt observed by lock waits.
    #[must_use]
    pub const fn interrupt(&self) -> &Interrupt {
        &self.interrupt
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Courses>, RegistryError> {
        if let Some(guard) = self.courses.try_read() {
            return Ok(guard);
        }

        trace_log!("read lock contended");
        loop {
            if self.interrupt.is_raised() {
                debug_log!("read lock wait interrupted");
                return Err(RegistryError::Cancelled);
            }
            if let Some(guard) = self.courses.try_read_for(LOCK_POLL) {
                return Ok(guard);
            }
        }
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Courses>, RegistryError> {
        if let Some(guard) = self.courses.try_write() {
            return Ok(guard);
        }

        trace_log!("write lock contended");
        loop {
            if self.interrupt.is_raised() {
                debug_log!("write lock wait interrupted");
                return Err(RegistryError::Cancelled);
            }
            if let Some(guard) = self.courses.try_write_for(LOCK_POLL) {
                return Ok(guard);
            }
        }
    }
}

impl CourseRegistry for LockedRegistry {
    fn add(&self, course: Course) -> Result<(), RegistryError> {
        check_code(course.code())?;
        let mut courses = self.write()?;
        courses.insert(course.code().to_owned(), course);
        Ok(())
    }

    fn get(&self, code: &str) -> Result<Option<Course>, RegistryError> {
        check_code(code)?;
        let courses = self.read()?;
        Ok(courses.get(code).cloned())
    }

    fn update(&self, code: &str, new_name: &str) -> Result<(), RegistryError> {
        check_code(code)?;
        // Exclusive for the lookup too: the check and the rename must not
        // straddle a concurrent remove/add of the same code.
        let mut courses = self.write()?;
        if let Some(course) = courses.get_mut(code) {
            course.set_name(new_name);
        }
        Ok(())
    }

    fn remove(&self, code: &str) -> Result<(), RegistryError> {
        check_code(code)?;
        let mut courses = self.write()?;
        courses.remove(code);
        Ok(())
    }

    fn len(&self) -> usize {
        self.courses.read().len()
    }

    fn snapshot(&self) -> BTreeMap<String, String> {
        self.courses
            .read()
            .iter()
            .map(|(code, course)| (code.clone(), course.name().to_owned()))
            .collect()
    }
}
