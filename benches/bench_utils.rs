//! Shared helpers for benchmarks.
//!
//! Course lists and access patterns are deterministic across benches so that
//! locked and concurrent runs see exactly the same work.

#![allow(dead_code)]
#![expect(clippy::cast_possible_truncation)]

use course_registry::seed::sample_courses;
use course_registry::{Course, Operation};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// `n` courses with codes `CSC100`, `CSC101`, ...
pub fn courses(n: usize) -> Vec<Course> {
    sample_courses(n)
}

/// Codes of `courses`, in order, for benches that only look things up.
pub fn codes(courses: &[Course]) -> Vec<String> {
    courses.iter().map(|c| c.code().to_owned()).collect()
}

/// Uniform random indices.
///
/// Drawn from the high bits of the LCG state; the low bits cycle with a
/// short period and would make small `n` a fixed rotation.
pub fn uniform_indices(n: usize, count: usize, seed: u64) -> Vec<usize> {
    let mut indices = Vec::with_capacity(count);
    let mut state = seed;

    for _ in 0..count {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1);
        indices.push(((state >> 33) as usize) % n);
    }
    indices
}

/// Operations drawn uniformly from all four, independent of any index stream.
pub fn random_ops(count: usize, seed: u64) -> Vec<Operation> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count).map(|_| Operation::random(&mut rng)).collect()
}

/// Indices where a small hot set of `hot` courses takes `hot_percent`% of accesses.
///
/// Models a registration rush on a few popular courses.
pub fn hot_indices(n: usize, count: usize, hot: usize, hot_percent: u64, seed: u64) -> Vec<usize> {
    assert!(hot > 0 && hot <= n, "hot set must be within 1..=n");

    let mut indices = Vec::with_capacity(count);
    let mut state = seed;

    for _ in 0..count {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1);
        let roll = (state >> 33) % 100;
        let pick = (state >> 40) as usize;
        indices.push(if roll < hot_percent { pick % hot } else { pick % n });
    }
    indices
}
