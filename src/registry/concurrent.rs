//! Registry backed by a sharded concurrent hash map.

use std::collections::BTreeMap;

use dashmap::DashMap;

use super::{CourseRegistry, check_code};
use crate::error::RegistryError;
use crate::record::Course;

/// A [`DashMap`] from code to [`Course`].
///
/// Each operation locks only the shard that owns the code. `add`, `get` and
/// `remove` are single map operations. `update` goes through
/// [`DashMap::get_mut`], which keeps the shard write-locked from the lookup
/// until the rename is done, so a concurrent `remove` of the same code is
/// ordered entirely before or entirely after it. `update` never inserts.
///
/// Nothing here waits on a registry-wide lock, so no operation reports
/// [`RegistryError::Cancelled`].
#[derive(Debug, Default)]
pub struct ConcurrentRegistry {
    courses: DashMap<String, Course>,
}

impl ConcurrentRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with at least `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            courses: DashMap::with_capacity(capacity),
        }
    }
}

impl CourseRegistry for ConcurrentRegistry {
    fn add(&self, course: Course) -> Result<(), RegistryError> {
        check_code(course.code())?;
        self.courses.insert(course.code().to_owned(), course);
        Ok(())
    }

    fn get(&self, code: &str) -> Result<Option<Course>, RegistryError> {
        check_code(code)?;
        Ok(self.courses.get(code).map(|entry| entry.value().clone()))
    }

    fn update(&self, code: &str, new_name: &str) -> Result<(), RegistryError> {
        check_code(code)?;
        // Compute-if-present: the shard stays write-locked until `entry` drops.
        if let Some(mut entry) = self.courses.get_mut(code) {
            entry.value_mut().set_name(new_name);
        }
        Ok(())
    }

    fn remove(&self, code: &str) -> Result<(), RegistryError> {
        check_code(code)?;
        self.courses.remove(code);
        Ok(())
    }

    fn len(&self) -> usize {
        self.courses.len()
    }

    fn snapshot(&self) -> BTreeMap<String, String> {
        self.courses
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().name().to_owned()))
            .collect()
    }
}
