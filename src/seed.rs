//! Course list input.
//!
//! One course per line, code and name separated by `" - "`:
//!
//! ```text
//! CSC101 - Intro to Computer Science
//! CSC102 - Data Structures
//! ```
//!
//! Trailing empty fields are dropped before counting, so `CODE - Name - `
//! still reads as two parts. Lines that do not split into exactly two parts
//! are skipped, as are lines whose code or name is empty after trimming.

use std::fs;
use std::path::Path;

use crate::error::SeedError;
use crate::record::Course;
use crate::tracing_helpers::debug_log;

/// Separator between code and name.
pub const DELIMITER: &str = " - ";

/// Parse one line, or `None` if it is malformed.
#[must_use]
pub fn parse_line(line: &str) -> Option<Course> {
    let mut parts: Vec<&str> = line.split(DELIMITER).collect();
    while parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    let [code, name] = parts[..] else {
        return None;
    };
    let (code, name) = (code.trim(), name.trim());
    if code.is_empty() || name.is_empty() {
        return None;
    }
    Some(Course::new(code, name))
}

/// Parse every well-formed line of `text`, keeping file order.
#[must_use]
pub fn parse_courses(text: &str) -> Vec<Course> {
    text.lines().filter_map(parse_line).collect()
}

/// Read and parse a course list file.
///
/// # Errors
///
/// [`SeedError`] if the file cannot be read.
pub fn load_courses(path: impl AsRef<Path>) -> Result<Vec<Course>, SeedError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| SeedError::new(path.to_path_buf(), e))?;
    let courses = parse_courses(&text);
    debug_log!(path = %path.display(), count = courses.len(), "loaded course list");
    Ok(courses)
}

/// Synthetic catalog `CSC100 - Course 0`, `CSC101 - Course 1`, ...
#[must_use]
pub fn sample_courses(n: usize) -> Vec<Course> {
    (0..n)
        .map(|i| Course::new(format!("CSC{}", 100 + i), format!("Course {i}")))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_lines() {
        let text = "CSC101 - Intro to Computer Science\nCSC102  -  Data Structures \n";
        let courses = parse_courses(text);
        assert_eq!(
            courses,
            vec![
                Course::new("CSC101", "Intro to Computer Science"),
                Course::new("CSC102", "Data Structures"),
            ]
        );
    }

    #[test]
    fn skips_malformed_lines() {
        let text = "\
CSC101 - Intro
no delimiter here
CSC200 - Topics - Extra
 - Missing code
CSC104 - 
CSC103 - Algorithms
";
        let codes: Vec<_> = parse_courses(text)
            .iter()
            .map(|c| c.code().to_owned())
            .collect();
        assert_eq!(codes, ["CSC101", "CSC103"]);
    }

    #[test]
    fn trailing_empty_fields_are_dropped() {
        assert_eq!(
            parse_line("CSC104 - Topics - "),
            Some(Course::new("CSC104", "Topics"))
        );
        assert_eq!(
            parse_line("CSC105 - Seminar -   - "),
            None,
            "a whitespace field before the trailing one still counts"
        );
        assert_eq!(parse_line("CSC106 - Topics - Extra - "), None);
    }

    #[test]
    fn hyphen_without_spaces_is_part_of_the_name() {
        let course = parse_line("MAT210 - Multi-variable Calculus").unwrap();
        assert_eq!(course.name(), "Multi-variable Calculus");
    }

    #[test]
    fn sample_catalog_has_unique_codes() {
        let courses = sample_courses(50);
        let mut codes: Vec<_> = courses.iter().map(Course::code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 50);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_courses("definitely/not/here.txt").unwrap_err();
        assert!(err.to_string().contains("here.txt"));
    }
}
