//! Family builders.
//!
//! Each builder picks a schema for the requested tier, lays out the stem, computes
//! the correct answer, derives three distractors and shuffles the four options.
//! A `BuildError` means "could not construct": the orchestrator resamples.

use std::iter;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::domain::{AnswerOption, Difficulty, PatternFamily, Question, Shape, Stem};
use crate::error::BuildError;
use crate::rules;
use crate::seeds::{PatternCatalog, TieredSchema};

pub mod analogy;
pub mod composition;
pub mod matrix;
pub mod odd_one_out;
pub mod sequence;

pub const OPTION_COUNT: usize = 4;
pub const DISTRACTOR_COUNT: usize = OPTION_COUNT - 1;

/// Dispatches to the builder for `family`.
pub fn build<R: Rng + ?Sized>(
  rng: &mut R,
  catalog: &PatternCatalog,
  family: PatternFamily,
  difficulty: Difficulty,
) -> Result<Question, BuildError> {
  match family {
    PatternFamily::Sequence => sequence::build(rng, &catalog.sequence, difficulty),
    PatternFamily::OddOneOut => odd_one_out::build(rng, &catalog.odd_one_out, difficulty),
    PatternFamily::Matrix => matrix::build(rng, &catalog.matrix, difficulty),
    PatternFamily::Analogy => analogy::build(rng, &catalog.analogy, difficulty),
    PatternFamily::Composition => composition::build(rng, &catalog.composition, difficulty),
  }
}

pub(crate) fn pick_schema<'a, T, R>(
  rng: &mut R,
  pool: &'a [T],
  family: PatternFamily,
  difficulty: Difficulty,
) -> Result<&'a T, BuildError>
where
  T: TieredSchema,
  R: Rng + ?Sized,
{
  let tier: Vec<&T> = pool.iter().filter(|s| s.difficulty() == difficulty).collect();
  tier.choose(rng).copied().ok_or(BuildError::NoSchema { family, difficulty })
}

pub(crate) fn malformed<T: TieredSchema>(schema: &T, reason: impl Into<String>) -> BuildError {
  BuildError::MalformedSchema { id: schema.id().to_string(), reason: reason.into() }
}

/// Schema steps must stay within one revolution either way.
pub(crate) fn bounded_step<T: TieredSchema>(schema: &T, step: i32) -> Result<i32, BuildError> {
  if (-359..=359).contains(&step) {
    Ok(step)
  } else {
    Err(malformed(schema, format!("step {step}° is outside (-360°, 360°)")))
  }
}

/// Shuffles the correct option in among exactly three distractors.
/// Returns the options and the index the correct one landed on.
pub(crate) fn shuffle_options<R: Rng + ?Sized>(
  rng: &mut R,
  correct: AnswerOption,
  distractors: Vec<AnswerOption>,
) -> Result<(Vec<AnswerOption>, usize), BuildError> {
  if distractors.len() != DISTRACTOR_COUNT {
    return Err(BuildError::NotEnoughDistractors { found: distractors.len() });
  }

  let mut slots: Vec<(bool, AnswerOption)> = iter::once((true, correct))
    .chain(distractors.into_iter().map(|d| (false, d)))
    .collect();
  slots.shuffle(rng);

  let correct_index = slots.iter().position(|(is_correct, _)| *is_correct).unwrap_or_default();
  let options = slots.into_iter().map(|(_, option)| option).collect();
  Ok((options, correct_index))
}

/// Final assembly shared by every builder: rejects colliding options and
/// questions that reference too many shape kinds.
pub(crate) fn assemble(
  pattern_id: &str,
  difficulty: Difficulty,
  stem: Stem,
  options: Vec<AnswerOption>,
  correct_index: usize,
  explanation: String,
) -> Result<Question, BuildError> {
  for first in 0..options.len() {
    for second in first + 1..options.len() {
      if same_option(&options[first], &options[second]) {
        return Err(BuildError::OptionCollision { first, second });
      }
    }
  }

  let question = Question {
    pattern_family: stem.family(),
    stem,
    options,
    correct_index,
    difficulty,
    explanation,
    pattern_id: pattern_id.to_string(),
  };
  rules::check_shape_budget(question.shapes())?;
  Ok(question)
}

/// Composite overlays compare as multisets.
fn same_option(a: &AnswerOption, b: &AnswerOption) -> bool {
  match (a, b) {
    (AnswerOption::Composite { composite: x }, AnswerOption::Composite { composite: y }) => {
      sorted(x) == sorted(y)
    }
    _ => a == b,
  }
}

pub(crate) fn sorted(shapes: &[Shape]) -> Vec<Shape> {
  let mut out = shapes.to_vec();
  out.sort_unstable();
  out
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Direction, MissingPosition, ShapeKind};
  use crate::seeds::seed_catalog;
  use rand::rngs::StdRng;
  use rand::SeedableRng;

  fn tri(rotation: u16) -> Shape {
    Shape::new(ShapeKind::Triangle, rotation)
  }

  #[test]
  fn every_builtin_schema_builds() {
    let catalog = seed_catalog();
    let mut rng = StdRng::seed_from_u64(7);
    for family in PatternFamily::ALL {
      for difficulty in Difficulty::ALL {
        for _ in 0..25 {
          let q = build(&mut rng, &catalog, family, difficulty)
            .unwrap_or_else(|e| panic!("{family}/{difficulty}: {e}"));
          assert_eq!(q.pattern_family, family);
          assert_eq!(q.difficulty, difficulty);
          assert_eq!(q.options.len(), OPTION_COUNT);
          assert!(q.correct_index < OPTION_COUNT);
        }
      }
    }
  }

  #[test]
  fn missing_tier_is_reported() {
    let mut catalog = seed_catalog();
    catalog.analogy.retain(|s| s.difficulty != Difficulty::Hard);
    let mut rng = StdRng::seed_from_u64(1);
    let err = build(&mut rng, &catalog, PatternFamily::Analogy, Difficulty::Hard).unwrap_err();
    assert_eq!(
      err,
      BuildError::NoSchema { family: PatternFamily::Analogy, difficulty: Difficulty::Hard }
    );
  }

  #[test]
  fn shuffle_tracks_correct_option() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..20 {
      let (options, idx) = shuffle_options(
        &mut rng,
        AnswerOption::Shape(tri(270)),
        vec![AnswerOption::Shape(tri(0)), AnswerOption::Shape(tri(90)), AnswerOption::Shape(tri(180))],
      )
      .unwrap();
      assert_eq!(options[idx], AnswerOption::Shape(tri(270)));
    }
  }

  #[test]
  fn shuffle_requires_three_distractors() {
    let mut rng = StdRng::seed_from_u64(3);
    let err = shuffle_options(&mut rng, AnswerOption::Shape(tri(0)), vec![AnswerOption::Shape(tri(90))]);
    assert_eq!(err.unwrap_err(), BuildError::NotEnoughDistractors { found: 1 });
  }

  #[test]
  fn assemble_rejects_reordered_composites() {
    let stem = Stem::Composition {
      operation: crate::domain::CompositionOp::Union,
      inputs: vec![tri(0), tri(180)],
    };
    let options = vec![
      AnswerOption::Composite { composite: vec![tri(0), tri(180)] },
      AnswerOption::Composite { composite: vec![tri(180), tri(0)] },
      AnswerOption::Composite { composite: vec![tri(0)] },
      AnswerOption::Composite { composite: vec![tri(180)] },
    ];
    let err = assemble("test", Difficulty::Easy, stem, options, 0, String::new()).unwrap_err();
    assert_eq!(err, BuildError::OptionCollision { first: 0, second: 1 });
  }

  #[test]
  fn assemble_enforces_shape_budget() {
    let stem = Stem::Sequence {
      direction: Direction::LeftToRight,
      items: vec![tri(0), Shape::new(ShapeKind::Square, 0)],
      missing_position: MissingPosition::End,
    };
    let options = vec![
      AnswerOption::Shape(Shape::new(ShapeKind::Circle, 0)),
      AnswerOption::Shape(tri(90)),
      AnswerOption::Shape(tri(180)),
      AnswerOption::Shape(tri(270)),
    ];
    let err = assemble("test", Difficulty::Easy, stem, options, 0, String::new()).unwrap_err();
    assert_eq!(err, BuildError::ShapeBudget { kinds: 3 });
  }
}
