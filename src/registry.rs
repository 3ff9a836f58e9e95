//! The course registry contract and its two implementations.
//!
//! | Implementation | Concurrency control |
//! |----------------|---------------------|
//! | [`LockedRegistry`] | One `RwLock` over the whole map. Interruptible waits. |
//! | [`ConcurrentRegistry`] | `DashMap` shards; compound updates under the shard lock. |
//!
//! Both give the same observable semantics:
//!
//! - at most one course per code at any instant;
//! - `get` returns an owned copy, so a reader never sees a half-written name;
//! - `update` on a missing code is a no-op and never creates an entry;
//! - `remove` on a missing code is a no-op.

use std::collections::BTreeMap;

use crate::error::RegistryError;
use crate::record::Course;

mod concurrent;
mod locked;

pub use concurrent::ConcurrentRegistry;
pub use locked::{LOCK_POLL, LockedRegistry};

/// Shared mapping from course code to [`Course`].
pub trait CourseRegistry: Send + Sync {
    /// Insert `course`, replacing any course with the same code.
    ///
    /// # Errors
    ///
    /// [`RegistryError::EmptyCode`] for an empty code;
    /// [`RegistryError::Cancelled`] if interrupted while waiting for access.
    fn add(&self, course: Course) -> Result<(), RegistryError>;

    /// Copy of the course stored under `code`, if any.
    ///
    /// # Errors
    ///
    /// As for [`add`](Self::add).
    fn get(&self, code: &str) -> Result<Option<Course>, RegistryError>;

    /// Rename the course stored under `code`. No-op if absent.
    ///
    /// The presence check and the mutation are one atomic step: a concurrent
    /// `remove` either happens entirely before (no-op) or entirely after.
    ///
    /// # Errors
    ///
    /// As for [`add`](Self::add).
    fn update(&self, code: &str, new_name: &str) -> Result<(), RegistryError>;

    /// Delete the course stored under `code`. No-op if absent.
    ///
    /// # Errors
    ///
    /// As for [`add`](Self::add).
    fn remove(&self, code: &str) -> Result<(), RegistryError>;

    /// Number of stored courses.
    fn len(&self) -> usize;

    /// Whether no courses are stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted `code -> name` view of the contents.
    ///
    /// Only a consistent picture when no writers are running.
    fn snapshot(&self) -> BTreeMap<String, String>;

    /// Add every course in `courses`, in order.
    ///
    /// # Errors
    ///
    /// The first error returned by [`add`](Self::add).
    fn seed(&self, courses: &[Course]) -> Result<(), RegistryError> {
        for course in courses {
            self.add(course.clone())?;
        }
        Ok(())
    }
}

/// Reject empty codes before touching any shared state.
#[inline]
pub(crate) const fn check_code(code: &str) -> Result<(), RegistryError> {
    if code.is_empty() {
        Err(RegistryError::EmptyCode)
    } else {
        Ok(())
    }
}
