//! The course record stored in every registry.

use std::fmt as StdFmt;

/// A course: an immutable code used as the registry key, and a mutable name.
///
/// Each registry owns its own copies. The seed list handed to workload tasks
/// is never mutated; tasks clone from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Course {
    code: String,
    name: String,
}

impl Course {
    /// Create a course.
    #[must_use]
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    /// The course code.
    #[must_use]
    #[inline]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The course name.
    #[must_use]
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replace the name. Registries only call this with exclusive access
    /// to the entry.
    #[inline]
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Consume the course, returning `(code, name)`.
    #[must_use]
    pub fn into_parts(self) -> (String, String) {
        (self.code, self.name)
    }
}

impl StdFmt::Display for Course {
    fn fmt(&self, f: &mut StdFmt::Formatter<'_>) -> StdFmt::Result {
        write!(f, "{} - {}", self.code, self.name)
    }
}
