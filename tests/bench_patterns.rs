//! Sanity checks for the access patterns the benchmarks replay.
//!
//! The mixed-workload benches pair an index stream with an operation
//! stream. If the two move in lockstep, every course only ever sees one
//! kind of operation and updates never race removes on the same code.

#[path = "../benches/bench_utils.rs"]
mod bench_utils;

use bench_utils::{hot_indices, random_ops, uniform_indices};
use course_registry::Operation;
use std::collections::{BTreeSet, HashMap};

const N: usize = 1_000;
const OPS: usize = 20_000;

/// Distinct operations each course index receives.
fn ops_per_course(indices: &[usize], ops: &[Operation]) -> HashMap<usize, BTreeSet<Operation>> {
    let mut seen: HashMap<usize, BTreeSet<Operation>> = HashMap::new();
    for (&idx, &op) in indices.iter().zip(ops) {
        seen.entry(idx).or_default().insert(op);
    }
    seen
}

#[test]
fn small_range_indices_are_not_a_rotation() {
    let indices = uniform_indices(4, 64, 11);
    let rotation = indices.windows(2).all(|w| w[1] == (w[0] + 1) % 4);
    assert!(!rotation, "{indices:?}");
    assert!(indices.iter().all(|&i| i < 4));
}

#[test]
fn every_operation_reaches_shared_courses_uniform() {
    let seen = ops_per_course(&uniform_indices(N, OPS, 7), &random_ops(OPS, 11));

    let mixed = seen.values().filter(|ops| ops.len() > 1).count();
    assert!(
        mixed > N / 2,
        "only {mixed} of {} courses saw more than one operation",
        seen.len()
    );

    for op in Operation::ALL {
        assert!(
            seen.values().any(|ops| ops.contains(&op) && ops.len() > 1),
            "{op} never shares a course with another operation"
        );
    }

    // Update and remove must actually contend on the same codes.
    let contended = seen
        .values()
        .filter(|ops| ops.contains(&Operation::Update) && ops.contains(&Operation::Remove))
        .count();
    assert!(contended > 0);
}

#[test]
fn every_operation_reaches_shared_courses_hot_set() {
    let seen = ops_per_course(&hot_indices(N, OPS, 8, 90, 7), &random_ops(OPS, 11));

    for hot in 0..8 {
        let ops = seen.get(&hot).map_or(0, BTreeSet::len);
        assert_eq!(ops, Operation::ALL.len(), "hot course {hot} saw {ops} operation kinds");
    }
}

#[test]
fn random_ops_cover_all_four() {
    let ops: BTreeSet<Operation> = random_ops(1_000, 3).into_iter().collect();
    assert_eq!(ops.len(), Operation::ALL.len());
}
