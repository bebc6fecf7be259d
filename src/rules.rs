//! Rotation arithmetic and shared constraints used by the family builders.

use std::collections::BTreeSet;

use crate::domain::{Shape, ShapeKind};
use crate::error::BuildError;

const FULL_TURN: i64 = 360;

/// Most shape kinds a single question may reference.
pub const MAX_SHAPE_KINDS: usize = 2;

/// `(value + step) mod 360`, always in `[0, 360)`.
pub fn apply_rotation(value: u16, step: i32) -> u16 {
  (i64::from(value) + i64::from(step)).rem_euclid(FULL_TURN) as u16
}

/// Clockwise turn taking `from` to `to`, in `[0, 360)`.
pub fn rotation_step(from: u16, to: u16) -> i32 {
  (i64::from(to) - i64::from(from)).rem_euclid(FULL_TURN) as i32
}

pub fn shape_kinds<'a, I>(shapes: I) -> BTreeSet<ShapeKind>
where
  I: IntoIterator<Item = &'a Shape>,
{
  shapes.into_iter().map(|s| s.kind).collect()
}

pub fn check_shape_budget<'a, I>(shapes: I) -> Result<(), BuildError>
where
  I: IntoIterator<Item = &'a Shape>,
{
  let kinds = shape_kinds(shapes).len();
  if kinds > MAX_SHAPE_KINDS {
    return Err(BuildError::ShapeBudget { kinds });
  }
  Ok(())
}

/// Takes candidates in order, skipping the correct value and anything already taken,
/// until `wanted` distinct distractors are collected. May return fewer.
pub fn distinct_distractors<T, I>(correct: &T, candidates: I, wanted: usize) -> Vec<T>
where
  T: PartialEq,
  I: IntoIterator<Item = T>,
{
  let mut picked: Vec<T> = Vec::with_capacity(wanted);
  for candidate in candidates {
    if picked.len() == wanted {
      break;
    }
    if &candidate == correct || picked.contains(&candidate) {
      continue;
    }
    picked.push(candidate);
  }
  picked
}
