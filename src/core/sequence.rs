/// Lazy sequence plumbing — pull-based producers and checked truncation.
///
/// Generators hand out possibly infinite iterators and declare separately how
/// many items a consumer may take. [`take_exact`] is the only sanctioned way
/// to cut a sequence down to that count.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::iter;
use thiserror::Error;

use crate::schema::target::TargetKind;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PatternError {
    #[error("{sequence} sequence ended after {produced} of {expected} declared items")]
    SequenceExhausted {
        sequence: &'static str,
        expected: usize,
        produced: usize,
    },
    #[error("spawn time at index {index} is not finite ({time})")]
    NonFiniteTime { index: usize, time: f32 },
    #[error("invalid {pattern} parameter: {reason}")]
    InvalidParameter {
        pattern: &'static str,
        reason: String,
    },
}

/// A pull-based, restartable-by-requery, possibly infinite producer.
pub type Sequence<'a, T> = Box<dyn Iterator<Item = T> + Send + 'a>;

/// Pull exactly `count` items from `seq`.
///
/// Never pulls more than `count`; fails if the sequence runs dry first.
pub fn take_exact<T>(
    seq: Sequence<'_, T>,
    count: usize,
    sequence: &'static str,
) -> Result<Vec<T>, PatternError> {
    let items: Vec<T> = seq.take(count).collect();
    if items.len() != count {
        return Err(PatternError::SequenceExhausted {
            sequence,
            expected: count,
            produced: items.len(),
        });
    }
    Ok(items)
}

/// Infinite repetition of `value`.
pub fn constant<'a, T: Clone + Send + 'a>(value: T) -> Sequence<'a, T> {
    Box::new(iter::repeat(value))
}

/// Default trajectory offsets: always the origin.
pub fn zero_offsets<'a>() -> Sequence<'a, Vec3> {
    constant(Vec3::ZERO)
}

/// Default trajectory rotations: always identity.
pub fn identity_rotations<'a>() -> Sequence<'a, Quat> {
    constant(Quat::IDENTITY)
}

/// Default targets: nobody.
pub fn no_targets<'a>() -> Sequence<'a, TargetKind> {
    constant(TargetKind::None)
}

/// A value emitted `repeat` times in a row before a periodic table advances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repeated<T> {
    pub value: T,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

fn default_repeat() -> u32 {
    1
}

impl<T> Repeated<T> {
    pub fn new(value: T, repeat: u32) -> Self {
        Self { value, repeat }
    }
}

/// Cycle through `entries` forever, emitting each value `repeat` times.
///
/// Entries with a zero repeat are skipped. If nothing remains the sequence
/// is empty rather than spinning forever.
pub fn periodic<'a, T: Clone + Send + Sync + 'a>(entries: &'a [Repeated<T>]) -> Sequence<'a, T> {
    if entries.iter().all(|entry| entry.repeat == 0) {
        return Box::new(iter::empty());
    }
    Box::new(
        entries
            .iter()
            .cycle()
            .flat_map(|entry| iter::repeat(entry.value.clone()).take(entry.repeat as usize)),
    )
}

/// Interpolation parameter for sample `index` of `count` evenly spaced
/// samples covering `[0, 1]` inclusively. A single sample resolves to 0.
pub fn unit_fraction(index: usize, count: usize) -> f32 {
    if count <= 1 {
        0.0
    } else {
        index as f32 / (count - 1) as f32
    }
}
