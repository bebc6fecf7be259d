//! SEQUENCE: a run of shapes turning by a fixed step; the missing item comes last.

use rand::Rng;

use super::{assemble, bounded_step, malformed, pick_schema, shuffle_options, DISTRACTOR_COUNT};
use crate::domain::{AnswerOption, Difficulty, Direction, MissingPosition, PatternFamily, Question, Shape, Stem};
use crate::error::BuildError;
use crate::rules::{apply_rotation, distinct_distractors};
use crate::seeds::SequenceSchema;
use crate::util::fill_template;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Distractor {
  /// Last item turned the opposite way.
  WrongDirection,
  /// Last item unchanged.
  RepeatLast,
  /// Last item turned twice.
  WrongStep,
  /// Correct answer backed off by 45°.
  NearMiss,
}

const NEAR_MISS_OFFSET: i32 = -45;

/// Offsets from the correct answer tried when the tier's candidates collapse.
const FALLBACK_OFFSETS: [i32; 3] = [45, 135, 180];

fn candidate_order(difficulty: Difficulty) -> &'static [Distractor] {
  use Distractor::*;
  match difficulty {
    Difficulty::Easy => &[WrongDirection, RepeatLast, WrongStep],
    Difficulty::Medium => &[WrongDirection, WrongStep, NearMiss, RepeatLast],
    Difficulty::Hard => &[NearMiss, WrongStep, WrongDirection, RepeatLast],
  }
}

pub fn build<R: Rng + ?Sized>(
  rng: &mut R,
  pool: &[SequenceSchema],
  difficulty: Difficulty,
) -> Result<Question, BuildError> {
  let schema = pick_schema(rng, pool, PatternFamily::Sequence, difficulty)?;
  let step = bounded_step(schema, schema.step)?;

  if schema.start_values.len() < 2 {
    return Err(malformed(schema, "needs at least two visible items"));
  }
  if step.rem_euclid(360) == 0 {
    return Err(malformed(schema, "step must turn the shape"));
  }
  for pair in schema.start_values.windows(2) {
    if apply_rotation(pair[0], step) != apply_rotation(pair[1], 0) {
      return Err(malformed(schema, format!("{}° does not follow {}° by {}°", pair[1], pair[0], step)));
    }
  }

  let items: Vec<Shape> = schema
    .start_values
    .iter()
    .map(|&r| Shape::new(schema.shape, apply_rotation(r, 0)).with_fill(schema.fill))
    .collect();
  let Some(&last) = items.last() else {
    return Err(malformed(schema, "empty run"));
  };
  let correct = last.rotated(step);

  let candidates = candidate_order(difficulty)
    .iter()
    .map(|d| match d {
      Distractor::WrongDirection => last.rotated(-step),
      Distractor::RepeatLast => last,
      Distractor::WrongStep => last.rotated(2 * step),
      Distractor::NearMiss => correct.rotated(NEAR_MISS_OFFSET),
    })
    .chain(FALLBACK_OFFSETS.iter().map(|&offset| correct.rotated(offset)));

  let distractors = distinct_distractors(&correct, candidates, DISTRACTOR_COUNT);
  if distractors.len() < DISTRACTOR_COUNT {
    return Err(BuildError::NotEnoughDistractors { found: distractors.len() });
  }

  let (options, correct_index) = shuffle_options(
    rng,
    AnswerOption::Shape(correct),
    distractors.into_iter().map(AnswerOption::Shape).collect(),
  )?;

  let step_text = step.to_string();
  let explanation = fill_template(&schema.explanation, &[("step", step_text.as_str())]);
  let stem = Stem::Sequence {
    direction: Direction::LeftToRight,
    items,
    missing_position: MissingPosition::End,
  };
  assemble(&schema.id, difficulty, stem, options, correct_index, explanation)
}
