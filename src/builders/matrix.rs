//! MATRIX: a 3×3 grid of turning shapes with one blank cell.
//!
//! The row rule always fixes the blank. Templates with a column rule must land on
//! the same value; when they don't the template is rejected rather than repaired.

use rand::Rng;

use super::{assemble, bounded_step, malformed, pick_schema, shuffle_options, DISTRACTOR_COUNT};
use crate::domain::{AnswerOption, Difficulty, PatternFamily, Question, Shape, Stem};
use crate::error::BuildError;
use crate::rules::{apply_rotation, distinct_distractors};
use crate::seeds::MatrixTemplate;
use crate::util::fill_template;

const GRID: usize = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Distractor {
  /// Row neighbour copied without turning.
  RepeatNeighbour,
  /// Row neighbour turned against the rule.
  WrongDirection,
  /// Row neighbour turned twice.
  DoubleStep,
  /// Column neighbour copied.
  CopyAbove,
  /// Correct answer off by the given degrees.
  NearMiss(i32),
}

fn candidate_order(difficulty: Difficulty) -> &'static [Distractor] {
  use Distractor::*;
  match difficulty {
    Difficulty::Easy => &[RepeatNeighbour, WrongDirection, DoubleStep],
    Difficulty::Medium => &[NearMiss(45), DoubleStep, CopyAbove, WrongDirection],
    Difficulty::Hard => &[NearMiss(-45), NearMiss(45), DoubleStep, WrongDirection],
  }
}

pub fn build<R: Rng + ?Sized>(
  rng: &mut R,
  pool: &[MatrixTemplate],
  difficulty: Difficulty,
) -> Result<Question, BuildError> {
  let template = pick_schema(rng, pool, PatternFamily::Matrix, difficulty)?;
  let [mr, mc] = template.missing;
  if mr >= GRID || mc >= GRID {
    return Err(malformed(template, format!("blank cell [{mr}, {mc}] is outside the grid")));
  }
  if difficulty != Difficulty::Easy && template.col_step.is_none() {
    return Err(malformed(template, "medium and hard templates need a column rule"));
  }
  let row_step = bounded_step(template, template.row_step)?;
  let col_step = template.col_step.map(|s| bounded_step(template, s)).transpose()?;

  let at = |r: usize, c: usize| apply_rotation(template.rows[r][c], 0);
  let shape_at = |rotation: u16| Shape::new(template.shape, rotation).with_fill(template.fill);

  let mut cells: [[Option<Shape>; GRID]; GRID] = [[None; GRID]; GRID];
  for (r, row) in cells.iter_mut().enumerate() {
    for (c, cell) in row.iter_mut().enumerate() {
      if [r, c] != template.missing {
        *cell = Some(shape_at(at(r, c)));
      }
    }
  }

  // Work from the left neighbour when there is one, otherwise back from the right.
  let (row_neighbour, row_dir) = if mc > 0 { (at(mr, mc - 1), 1) } else { (at(mr, mc + 1), -1) };
  let row_turn = row_dir * row_step;
  let row_target = apply_rotation(row_neighbour, row_turn);

  let (col_neighbour, col_dir) = if mr > 0 { (at(mr - 1, mc), 1) } else { (at(mr + 1, mc), -1) };
  if let Some(col_step) = col_step {
    let col_target = apply_rotation(col_neighbour, col_dir * col_step);
    if col_target != row_target {
      return Err(BuildError::RuleConflict { row: row_target, column: col_target });
    }
  }

  let candidates = candidate_order(difficulty).iter().map(|d| match *d {
    Distractor::RepeatNeighbour => row_neighbour,
    Distractor::WrongDirection => apply_rotation(row_neighbour, -row_turn),
    Distractor::DoubleStep => apply_rotation(row_neighbour, 2 * row_turn),
    Distractor::CopyAbove => col_neighbour,
    Distractor::NearMiss(offset) => apply_rotation(row_target, offset),
  });
  let distractors = distinct_distractors(&row_target, candidates, DISTRACTOR_COUNT);
  if distractors.len() < DISTRACTOR_COUNT {
    return Err(BuildError::NotEnoughDistractors { found: distractors.len() });
  }

  let (options, correct_index) = shuffle_options(
    rng,
    AnswerOption::Shape(shape_at(row_target)),
    distractors.into_iter().map(|r| AnswerOption::Shape(shape_at(r))).collect(),
  )?;

  let row_text = template.row_step.to_string();
  let col_text = template.col_step.map(|s| s.to_string()).unwrap_or_default();
  let explanation = fill_template(
    &template.explanation,
    &[("row_step", row_text.as_str()), ("col_step", col_text.as_str())],
  );

  let stem = Stem::Matrix {
    grid_size: [GRID, GRID],
    cells,
    missing_cell: template.missing,
  };
  assemble(&template.id, difficulty, stem, options, correct_index, explanation)
}
