//! ANALOGY: A is to B as C is to ?. The turn taking A to B is applied to C.

use rand::Rng;

use super::{assemble, bounded_step, malformed, pick_schema, shuffle_options, DISTRACTOR_COUNT};
use crate::domain::{AnalogySlot, AnswerOption, Difficulty, PatternFamily, Question, Stem};
use crate::error::BuildError;
use crate::rules::{distinct_distractors, rotation_step};
use crate::seeds::AnalogySchema;
use crate::util::fill_template;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Distractor {
  /// C left as it is.
  RepeatC,
  /// C turned the opposite way.
  WrongDirection,
  /// C given B's rotation outright.
  CopyB,
  /// C turned twice.
  DoubleStep,
  NearMiss(i32),
}

const FALLBACK_OFFSETS: [i32; 3] = [90, 135, 180];

fn candidate_order(difficulty: Difficulty) -> &'static [Distractor] {
  use Distractor::*;
  match difficulty {
    Difficulty::Easy => &[RepeatC, WrongDirection, CopyB, DoubleStep],
    Difficulty::Medium => &[WrongDirection, DoubleStep, NearMiss(45), RepeatC],
    Difficulty::Hard => &[NearMiss(-45), NearMiss(45), WrongDirection, DoubleStep],
  }
}

pub fn build<R: Rng + ?Sized>(
  rng: &mut R,
  pool: &[AnalogySchema],
  difficulty: Difficulty,
) -> Result<Question, BuildError> {
  let schema = pick_schema(rng, pool, PatternFamily::Analogy, difficulty)?;
  let a = schema.a.rotated(0);
  let b = a.rotated(bounded_step(schema, schema.step)?);
  let c = schema.c.rotated(0);

  let step = rotation_step(a.rotation, b.rotation);
  if step == 0 {
    return Err(malformed(schema, "A and B must differ"));
  }
  let correct = c.rotated(step);

  let candidates = candidate_order(difficulty)
    .iter()
    .map(|d| match *d {
      Distractor::RepeatC => c,
      Distractor::WrongDirection => c.rotated(-step),
      Distractor::CopyB => c.with_rotation(b.rotation),
      Distractor::DoubleStep => c.rotated(2 * step),
      Distractor::NearMiss(offset) => correct.rotated(offset),
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
  let stem = Stem::Analogy { a, b, c, missing: AnalogySlot::D };
  assemble(&schema.id, difficulty, stem, options, correct_index, explanation)
}
