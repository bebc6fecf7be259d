//! COMPOSITION: overlay two shapes. UNION is the only operation.
//!
//! Composites are kept in sorted order so equal overlays compare equal.

use rand::Rng;

use super::{assemble, bounded_step, pick_schema, shuffle_options, sorted, DISTRACTOR_COUNT};
use crate::domain::{AnswerOption, CompositionOp, Difficulty, PatternFamily, Question, Stem};
use crate::error::BuildError;
use crate::rules::distinct_distractors;
use crate::seeds::CompositionSchema;
use crate::util::fill_template;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Distractor {
  DropFirst,
  DropSecond,
  /// Both inputs plus the schema's extra shape.
  OverUnion,
  PerturbFirst,
  PerturbSecond,
}

fn candidate_order(difficulty: Difficulty) -> &'static [Distractor] {
  use Distractor::*;
  match difficulty {
    Difficulty::Easy => &[DropSecond, DropFirst, OverUnion],
    Difficulty::Medium => &[PerturbSecond, DropFirst, OverUnion, DropSecond],
    Difficulty::Hard => &[PerturbFirst, PerturbSecond, OverUnion, DropFirst],
  }
}

pub fn build<R: Rng + ?Sized>(
  rng: &mut R,
  pool: &[CompositionSchema],
  difficulty: Difficulty,
) -> Result<Question, BuildError> {
  let schema = pick_schema(rng, pool, PatternFamily::Composition, difficulty)?;
  let first = schema.inputs[0].rotated(0);
  let second = schema.inputs[1].rotated(0);
  let extra = schema.extra.rotated(0);
  let turn = bounded_step(schema, schema.perturb_step)?;

  let correct = sorted(&[first, second]);
  let candidates = candidate_order(difficulty).iter().map(|d| match d {
    Distractor::DropFirst => vec![second],
    Distractor::DropSecond => vec![first],
    Distractor::OverUnion => sorted(&[first, second, extra]),
    Distractor::PerturbFirst => sorted(&[first.rotated(turn), second]),
    Distractor::PerturbSecond => sorted(&[first, second.rotated(turn)]),
  });

  let distractors = distinct_distractors(&correct, candidates, DISTRACTOR_COUNT);
  if distractors.len() < DISTRACTOR_COUNT {
    return Err(BuildError::NotEnoughDistractors { found: distractors.len() });
  }

  let (options, correct_index) = shuffle_options(
    rng,
    AnswerOption::Composite { composite: correct },
    distractors.into_iter().map(|composite| AnswerOption::Composite { composite }).collect(),
  )?;

  let explanation = fill_template(&schema.explanation, &[("operation", "union")]);
  let stem = Stem::Composition {
    operation: CompositionOp::Union,
    inputs: vec![first, second],
  };
  assemble(&schema.id, difficulty, stem, options, correct_index, explanation)
}
