//! Independent re-derivation of every question before it is released.
//!
//! Nothing here trusts the builder's bookkeeping. The expected answer is worked out
//! from the stem alone, with this module's own rotation arithmetic, and then matched
//! against the options. `correct_index` is only compared at the very end.

use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{AnswerOption, CompositionOp, Question, Shape, ShapeKind, Stem};
use crate::error::ValidationError;

const OPTION_COUNT: usize = 4;
const MAX_KINDS: usize = 2;

/// Accepts a question only if its stem yields exactly one matching option and
/// that option sits at `correct_index`.
pub fn validate(question: &Question) -> Result<(), ValidationError> {
    let options = &question.options;
    if options.len() != OPTION_COUNT {
        return Err(ValidationError::OptionCount(options.len()));
    }
    if question.correct_index >= OPTION_COUNT {
        return Err(ValidationError::CorrectIndexOutOfRange(question.correct_index));
    }

    let stem_family = question.stem.family();
    if stem_family != question.pattern_family {
        return Err(ValidationError::FamilyMismatch {
            declared: question.pattern_family,
            stem: stem_family,
        });
    }

    if let Some(bad) = question.shapes().into_iter().find(|s| s.rotation >= 360) {
        return Err(ValidationError::MalformedStem(format!(
            "rotation {}° is outside [0, 360)",
            bad.rotation
        )));
    }

    check_distinct(options)?;

    let kinds: BTreeSet<ShapeKind> = question.shapes().into_iter().map(|s| s.kind).collect();
    if kinds.len() > MAX_KINDS {
        return Err(ValidationError::ShapeBudgetExceeded(kinds.len()));
    }

    let derived = match &question.stem {
        Stem::Sequence { items, .. } => sequence_answer(items, options)?,
        Stem::OddOneOut { items } => odd_one_out_answer(items, options)?,
        Stem::Matrix {
            grid_size,
            cells,
            missing_cell,
        } => matrix_answer(*grid_size, cells, *missing_cell, options)?,
        Stem::Analogy { a, b, c, .. } => analogy_answer(a, b, c, options)?,
        Stem::Composition { operation, inputs } => composition_answer(*operation, inputs, options)?,
    };

    if derived != question.correct_index {
        return Err(ValidationError::CorrectIndexMismatch {
            derived,
            recorded: question.correct_index,
        });
    }
    Ok(())
}

// -------- arithmetic --------

fn turn(degrees: u16, by: i32) -> u16 {
    let raw = (i64::from(degrees) + i64::from(by)) % 360;
    if raw < 0 {
        (raw + 360) as u16
    } else {
        raw as u16
    }
}

/// Clockwise degrees from `from` to `to`; both already range-checked.
fn delta(from: u16, to: u16) -> i32 {
    let d = i32::from(to) - i32::from(from);
    if d < 0 {
        d + 360
    } else {
        d
    }
}

/// Same kind, fill and reflection; rotation may differ.
fn same_look(a: &Shape, b: &Shape) -> bool {
    a.kind == b.kind && a.fill == b.fill && a.reflection == b.reflection
}

fn multiset(shapes: &[Shape]) -> BTreeMap<Shape, usize> {
    let mut counts = BTreeMap::new();
    for s in shapes {
        *counts.entry(*s).or_insert(0) += 1;
    }
    counts
}

// -------- option integrity --------

#[derive(PartialEq, Eq)]
enum OptionKey {
    Reference(usize),
    Overlay(BTreeMap<Shape, usize>),
    Single(Shape),
}

fn key(option: &AnswerOption) -> OptionKey {
    match option {
        AnswerOption::Reference { ref_index } => OptionKey::Reference(*ref_index),
        AnswerOption::Composite { composite } => OptionKey::Overlay(multiset(composite)),
        AnswerOption::Shape(s) => OptionKey::Single(*s),
    }
}

fn check_distinct(options: &[AnswerOption]) -> Result<(), ValidationError> {
    let keys: Vec<OptionKey> = options.iter().map(key).collect();
    for first in 0..keys.len() {
        for second in first + 1..keys.len() {
            if keys[first] == keys[second] {
                return Err(ValidationError::DuplicateOptions { first, second });
            }
        }
    }
    Ok(())
}

fn single_match<F>(options: &[AnswerOption], is_answer: F) -> Result<usize, ValidationError>
where
    F: Fn(&AnswerOption) -> bool,
{
    let matches: Vec<usize> = options
        .iter()
        .enumerate()
        .filter(|(_, o)| is_answer(o))
        .map(|(i, _)| i)
        .collect();
    match matches.as_slice() {
        [] => Err(ValidationError::NoMatchingOption),
        [only] => Ok(*only),
        _ => Err(ValidationError::AmbiguousAnswer { matches }),
    }
}

fn expect_single_shapes(options: &[AnswerOption]) -> Result<(), ValidationError> {
    for (index, option) in options.iter().enumerate() {
        if !matches!(option, AnswerOption::Shape(_)) {
            return Err(ValidationError::OptionKind { index, expected: "shape" });
        }
    }
    Ok(())
}

// -------- per-family re-derivation --------

fn sequence_answer(items: &[Shape], options: &[AnswerOption]) -> Result<usize, ValidationError> {
    let (first, second, last) = match items {
        [first, second, .., last] => (first, second, last),
        [first, second] => (first, second, second),
        _ => {
            return Err(ValidationError::NoDerivableRule(
                "a sequence needs at least two items".into(),
            ))
        }
    };
    if items.iter().any(|s| !same_look(s, first)) {
        return Err(ValidationError::NoDerivableRule(
            "sequence items differ in more than rotation".into(),
        ));
    }

    let step = delta(first.rotation, second.rotation);
    if step == 0 {
        return Err(ValidationError::NoDerivableRule("sequence items do not turn".into()));
    }
    if items.windows(2).any(|w| delta(w[0].rotation, w[1].rotation) != step) {
        return Err(ValidationError::NoDerivableRule(
            "turn between sequence items is not constant".into(),
        ));
    }

    let expected = Shape {
        rotation: turn(last.rotation, step),
        ..*last
    };
    expect_single_shapes(options)?;
    single_match(options, |o| matches!(o, AnswerOption::Shape(s) if *s == expected))
}

fn odd_one_out_answer(items: &[Shape], options: &[AnswerOption]) -> Result<usize, ValidationError> {
    if items.len() != OPTION_COUNT {
        return Err(ValidationError::MalformedStem(format!(
            "odd-one-out needs exactly four items, found {}",
            items.len()
        )));
    }
    for (index, option) in options.iter().enumerate() {
        match option {
            AnswerOption::Reference { ref_index } if *ref_index < items.len() => {}
            AnswerOption::Reference { ref_index } => {
                return Err(ValidationError::MalformedStem(format!(
                    "option {index} points at missing item {ref_index}"
                )))
            }
            _ => return Err(ValidationError::OptionKind { index, expected: "reference" }),
        }
    }

    let lone = lone_item(items)?;
    single_match(options, |o| {
        matches!(o, AnswerOption::Reference { ref_index } if *ref_index == lone)
    })
}

/// The one item that a 3/1 split in some attribute singles out.
fn lone_item(items: &[Shape]) -> Result<usize, ValidationError> {
    let attributes: [fn(&Shape) -> u32; 4] = [
        |s| s.kind as u32,
        |s| s.fill as u32,
        |s| s.reflection as u32,
        |s| u32::from(s.rotation),
    ];

    let mut nominated = BTreeSet::new();
    for attribute in attributes {
        let mut groups: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
        for (i, item) in items.iter().enumerate() {
            groups.entry(attribute(item)).or_default().push(i);
        }
        if groups.len() == 2 {
            if let Some(lone) = groups.values().find(|g| g.len() == 1) {
                nominated.insert(lone[0]);
            }
        }
    }

    let mut nominated = nominated.into_iter();
    match (nominated.next(), nominated.next()) {
        (Some(only), None) => Ok(only),
        (None, _) => Err(ValidationError::NoDerivableRule(
            "no attribute singles out one item".into(),
        )),
        (Some(_), Some(_)) => Err(ValidationError::NoDerivableRule(
            "different attributes single out different items".into(),
        )),
    }
}

/// A step every adjacent pair agrees on, if there is one.
fn consistent_step(pairs: &[(u16, u16)]) -> Option<i32> {
    let (&(a, b), rest) = pairs.split_first()?;
    let step = delta(a, b);
    rest.iter().all(|&(a, b)| delta(a, b) == step).then_some(step)
}

/// Step and target read off the blank's own row or column.
///
/// `line` holds the three rotations along it and `at` the blank's position. A blank
/// in the middle leaves only the two ends, so the step comes from `across` (what the
/// parallel lines agree on) and must carry the first end onto the last.
fn local_rule(line: [Option<u16>; 3], at: usize, across: Option<i32>) -> Option<(i32, u16)> {
    match at {
        0 => {
            let (a, b) = (line[1]?, line[2]?);
            let step = delta(a, b);
            Some((step, turn(a, -step)))
        }
        2 => {
            let (a, b) = (line[0]?, line[1]?);
            let step = delta(a, b);
            Some((step, turn(b, step)))
        }
        _ => {
            let (a, b) = (line[0]?, line[2]?);
            let step = across?;
            (turn(a, 2 * step) == b).then(|| (step, turn(a, step)))
        }
    }
}

fn matrix_answer(
    grid_size: [usize; 2],
    cells: &[[Option<Shape>; 3]; 3],
    missing: [usize; 2],
    options: &[AnswerOption],
) -> Result<usize, ValidationError> {
    if grid_size != [3, 3] {
        return Err(ValidationError::MalformedStem(format!(
            "grid size {grid_size:?} is not 3x3"
        )));
    }
    let blanks: Vec<[usize; 2]> = (0..3)
        .flat_map(|r| (0..3).map(move |c| [r, c]))
        .filter(|&[r, c]| cells[r][c].is_none())
        .collect();
    if blanks != [missing] {
        return Err(ValidationError::MalformedStem(format!(
            "expected a single blank at {missing:?}, found blanks at {blanks:?}"
        )));
    }

    let known: Vec<&Shape> = cells.iter().flatten().flatten().collect();
    let reference = *known
        .first()
        .ok_or_else(|| ValidationError::MalformedStem("grid has no shapes".into()))?;
    if known.iter().any(|s| !same_look(s, reference)) {
        return Err(ValidationError::NoDerivableRule(
            "grid cells differ in more than rotation".into(),
        ));
    }

    let rot = |r: usize, c: usize| cells[r][c].map(|s| s.rotation);
    let horizontal: Vec<(u16, u16)> = (0..3)
        .flat_map(|r| (0..2).filter_map(move |c| Some((rot(r, c)?, rot(r, c + 1)?))))
        .collect();
    let vertical: Vec<(u16, u16)> = (0..2)
        .flat_map(|r| (0..3).filter_map(move |c| Some((rot(r, c)?, rot(r + 1, c)?))))
        .collect();

    let [r, c] = missing;
    let row_line = [rot(r, 0), rot(r, 1), rot(r, 2)];
    let col_line = [rot(0, c), rot(1, c), rot(2, c)];

    let (row_step, row_target) = local_rule(row_line, c, consistent_step(&horizontal))
        .ok_or_else(|| ValidationError::NoDerivableRule("the blank's row has no rule".into()))?;
    if let Some((_, column)) = local_rule(col_line, r, consistent_step(&vertical)) {
        if column != row_target {
            return Err(ValidationError::MatrixRuleConflict { row: row_target, column });
        }
    }
    if horizontal.iter().any(|&(a, b)| delta(a, b) != row_step) {
        return Err(ValidationError::NoDerivableRule(
            "rows do not all turn by the same step".into(),
        ));
    }

    let expected = Shape {
        rotation: row_target,
        ..*reference
    };
    expect_single_shapes(options)?;
    single_match(options, |o| matches!(o, AnswerOption::Shape(s) if *s == expected))
}

fn analogy_answer(
    a: &Shape,
    b: &Shape,
    c: &Shape,
    options: &[AnswerOption],
) -> Result<usize, ValidationError> {
    if !same_look(a, b) {
        return Err(ValidationError::NoDerivableRule(
            "A and B differ in more than rotation".into(),
        ));
    }
    let step = delta(a.rotation, b.rotation);
    if step == 0 {
        return Err(ValidationError::NoDerivableRule("A and B are identical".into()));
    }

    let expected = Shape {
        rotation: turn(c.rotation, step),
        ..*c
    };
    expect_single_shapes(options)?;
    single_match(options, |o| matches!(o, AnswerOption::Shape(s) if *s == expected))
}

fn composition_answer(
    operation: CompositionOp,
    inputs: &[Shape],
    options: &[AnswerOption],
) -> Result<usize, ValidationError> {
    if inputs.len() != 2 {
        return Err(ValidationError::MalformedStem(format!(
            "composition needs exactly two inputs, found {}",
            inputs.len()
        )));
    }
    let expected = match operation {
        CompositionOp::Union => multiset(inputs),
    };

    for (index, option) in options.iter().enumerate() {
        match option {
            AnswerOption::Composite { composite } if !composite.is_empty() => {}
            _ => return Err(ValidationError::OptionKind { index, expected: "composite" }),
        }
    }
    single_match(options, |o| {
        matches!(o, AnswerOption::Composite { composite } if multiset(composite) == expected)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        AnalogySlot, Difficulty, Direction, Fill, MissingPosition, PatternFamily,
    };

    fn tri(rotation: u16) -> Shape {
        Shape::new(ShapeKind::Triangle, rotation)
    }

    fn shapes(rotations: [u16; 4]) -> Vec<AnswerOption> {
        rotations.iter().map(|&r| AnswerOption::Shape(tri(r))).collect()
    }

    fn sequence_question() -> Question {
        Question {
            pattern_family: PatternFamily::Sequence,
            stem: Stem::Sequence {
                direction: Direction::LeftToRight,
                items: vec![tri(0), tri(90), tri(180)],
                missing_position: MissingPosition::End,
            },
            options: shapes([90, 270, 180, 0]),
            correct_index: 1,
            difficulty: Difficulty::Easy,
            explanation: String::new(),
            pattern_id: String::new(),
        }
    }

    fn matrix_question(cells: [[Option<Shape>; 3]; 3], missing: [usize; 2], options: [u16; 4], correct_index: usize) -> Question {
        Question {
            pattern_family: PatternFamily::Matrix,
            stem: Stem::Matrix {
                grid_size: [3, 3],
                cells,
                missing_cell: missing,
            },
            options: shapes(options),
            correct_index,
            difficulty: Difficulty::Easy,
            explanation: String::new(),
            pattern_id: String::new(),
        }
    }

    fn odd_question(items: Vec<Shape>, correct_index: usize) -> Question {
        Question {
            pattern_family: PatternFamily::OddOneOut,
            stem: Stem::OddOneOut { items },
            options: (0..4).map(|ref_index| AnswerOption::Reference { ref_index }).collect(),
            correct_index,
            difficulty: Difficulty::Easy,
            explanation: String::new(),
            pattern_id: String::new(),
        }
    }

    #[test]
    fn accepts_hand_built_sequence() {
        assert_eq!(validate(&sequence_question()), Ok(()));
    }

    #[test]
    fn flags_wrong_bookkeeping() {
        let mut q = sequence_question();
        q.correct_index = 2;
        assert_eq!(
            validate(&q),
            Err(ValidationError::CorrectIndexMismatch { derived: 1, recorded: 2 })
        );
    }

    #[test]
    fn flags_option_count_and_bounds() {
        let mut q = sequence_question();
        q.options.pop();
        assert_eq!(validate(&q), Err(ValidationError::OptionCount(3)));

        let mut q = sequence_question();
        q.correct_index = 4;
        assert_eq!(validate(&q), Err(ValidationError::CorrectIndexOutOfRange(4)));
    }

    #[test]
    fn flags_duplicates() {
        let mut q = sequence_question();
        q.options = shapes([90, 270, 90, 0]);
        assert_eq!(
            validate(&q),
            Err(ValidationError::DuplicateOptions { first: 0, second: 2 })
        );
    }

    #[test]
    fn flags_missing_answer() {
        let mut q = sequence_question();
        q.options = shapes([90, 45, 180, 0]);
        assert_eq!(validate(&q), Err(ValidationError::NoMatchingOption));
    }

    #[test]
    fn flags_family_mismatch() {
        let mut q = sequence_question();
        q.pattern_family = PatternFamily::Analogy;
        assert_eq!(
            validate(&q),
            Err(ValidationError::FamilyMismatch {
                declared: PatternFamily::Analogy,
                stem: PatternFamily::Sequence,
            })
        );
    }

    #[test]
    fn flags_three_shape_kinds() {
        let mut q = sequence_question();
        q.options[0] = AnswerOption::Shape(Shape::new(ShapeKind::Circle, 0));
        q.options[2] = AnswerOption::Shape(Shape::new(ShapeKind::Square, 0));
        assert_eq!(validate(&q), Err(ValidationError::ShapeBudgetExceeded(3)));
    }

    #[test]
    fn flags_out_of_range_rotation() {
        let mut q = sequence_question();
        q.options[0] = AnswerOption::Shape(tri(400));
        assert!(matches!(validate(&q), Err(ValidationError::MalformedStem(_))));
    }

    #[test]
    fn sequence_with_uneven_turns_has_no_rule() {
        let mut q = sequence_question();
        q.stem = Stem::Sequence {
            direction: Direction::LeftToRight,
            items: vec![tri(0), tri(90), tri(270)],
            missing_position: MissingPosition::End,
        };
        assert!(matches!(validate(&q), Err(ValidationError::NoDerivableRule(_))));
    }

    #[test]
    fn matrix_rows_and_columns_agree() {
        let cells = [
            [Some(tri(0)), Some(tri(90)), None],
            [Some(tri(90)), Some(tri(180)), Some(tri(270))],
            [Some(tri(180)), Some(tri(270)), Some(tri(0))],
        ];
        assert_eq!(validate(&matrix_question(cells, [0, 2], [90, 180, 0, 270], 1)), Ok(()));
    }

    #[test]
    fn matrix_blank_row_and_column_must_agree() {
        // Row 0 turns 0 -> 90 and says 180; column 2 turns 0 -> 90 and says 270.
        let cells = [
            [Some(tri(0)), Some(tri(90)), None],
            [Some(tri(90)), Some(tri(180)), Some(tri(0))],
            [Some(tri(180)), Some(tri(270)), Some(tri(90))],
        ];
        let q = matrix_question(cells, [0, 2], [270, 0, 90, 45], 0);
        assert_eq!(
            validate(&q),
            Err(ValidationError::MatrixRuleConflict { row: 180, column: 270 })
        );
    }

    #[test]
    fn matrix_conflict_with_regular_rows() {
        let cells = [
            [Some(tri(0)), Some(tri(90)), None],
            [Some(tri(90)), Some(tri(180)), Some(tri(270))],
            [Some(tri(0)), Some(tri(90)), Some(tri(180))],
        ];
        let q = matrix_question(cells, [0, 2], [180, 0, 90, 270], 0);
        assert_eq!(
            validate(&q),
            Err(ValidationError::MatrixRuleConflict { row: 180, column: 0 })
        );
    }

    #[test]
    fn matrix_middle_blank_uses_parallel_lines() {
        let cells = [
            [Some(tri(0)), Some(tri(90)), Some(tri(180))],
            [Some(tri(180)), None, Some(tri(0))],
            [Some(tri(0)), Some(tri(90)), Some(tri(180))],
        ];
        let q = matrix_question(cells, [1, 1], [90, 270, 0, 180], 1);
        assert_eq!(validate(&q), Ok(()));
    }

    #[test]
    fn matrix_rows_must_share_one_step() {
        // The last pair in the bottom row breaks the row rule.
        let cells = [
            [Some(tri(0)), Some(tri(90)), Some(tri(180))],
            [Some(tri(90)), Some(tri(180)), None],
            [Some(tri(180)), Some(tri(270)), Some(tri(90))],
        ];
        let q = matrix_question(cells, [1, 2], [270, 0, 90, 180], 0);
        assert!(matches!(validate(&q), Err(ValidationError::NoDerivableRule(_))));
    }

    #[test]
    fn matrix_without_any_rule_is_rejected() {
        let cells = [
            [Some(tri(0)), Some(tri(90)), Some(tri(270))],
            [Some(tri(90)), Some(tri(0)), None],
            [Some(tri(180)), Some(tri(270)), Some(tri(90))],
        ];
        let q = matrix_question(cells, [1, 2], [270, 0, 90, 180], 0);
        assert!(matches!(validate(&q), Err(ValidationError::NoDerivableRule(_))));
    }

    #[test]
    fn matrix_needs_exactly_one_blank() {
        let cells = [
            [Some(tri(0)), None, None],
            [Some(tri(90)), Some(tri(180)), Some(tri(270))],
            [Some(tri(180)), Some(tri(270)), Some(tri(0))],
        ];
        let q = matrix_question(cells, [0, 2], [90, 180, 0, 270], 1);
        assert!(matches!(validate(&q), Err(ValidationError::MalformedStem(_))));
    }

    #[test]
    fn odd_one_out_finds_lone_rotation() {
        let q = odd_question(vec![tri(90), tri(90), tri(180), tri(90)], 2);
        assert_eq!(validate(&q), Ok(()));
    }

    #[test]
    fn odd_one_out_ignores_all_distinct_rotations() {
        let solid = |r| tri(r).with_fill(Fill::Solid);
        let q = odd_question(vec![tri(0), solid(90), tri(180), tri(270)], 1);
        assert_eq!(validate(&q), Ok(()));
    }

    #[test]
    fn odd_one_out_rejects_two_candidates() {
        // rotation singles out item 0, fill singles out item 3
        let q = odd_question(
            vec![tri(180), tri(90), tri(90), tri(90).with_fill(Fill::Solid)],
            0,
        );
        assert!(matches!(validate(&q), Err(ValidationError::NoDerivableRule(_))));
    }

    #[test]
    fn odd_one_out_needs_reference_options() {
        let mut q = odd_question(vec![tri(90), tri(90), tri(180), tri(90)], 2);
        q.options[3] = AnswerOption::Shape(tri(0));
        assert_eq!(
            validate(&q),
            Err(ValidationError::OptionKind { index: 3, expected: "reference" })
        );
    }

    #[test]
    fn analogy_applies_a_to_b_turn() {
        let q = Question {
            pattern_family: PatternFamily::Analogy,
            stem: Stem::Analogy {
                a: tri(0),
                b: tri(90),
                c: tri(90).with_fill(Fill::Solid),
                missing: AnalogySlot::D,
            },
            options: vec![
                AnswerOption::Shape(tri(90).with_fill(Fill::Solid)),
                AnswerOption::Shape(tri(180)),
                AnswerOption::Shape(tri(180).with_fill(Fill::Solid)),
                AnswerOption::Shape(tri(270).with_fill(Fill::Solid)),
            ],
            correct_index: 2,
            difficulty: Difficulty::Easy,
            explanation: String::new(),
            pattern_id: String::new(),
        };
        assert_eq!(validate(&q), Ok(()));
    }

    #[test]
    fn composition_compares_as_multiset() {
        let composite = |shapes: Vec<Shape>| AnswerOption::Composite { composite: shapes };
        let q = Question {
            pattern_family: PatternFamily::Composition,
            stem: Stem::Composition {
                operation: CompositionOp::Union,
                inputs: vec![tri(0), tri(180)],
            },
            options: vec![
                composite(vec![tri(0)]),
                composite(vec![tri(180), tri(0)]),
                composite(vec![tri(0), tri(180), tri(90)]),
                composite(vec![tri(180)]),
            ],
            correct_index: 1,
            difficulty: Difficulty::Easy,
            explanation: String::new(),
            pattern_id: String::new(),
        };
        assert_eq!(validate(&q), Ok(()));

        let mut dup = q.clone();
        dup.options[0] = composite(vec![tri(0), tri(180)]);
        assert_eq!(
            validate(&dup),
            Err(ValidationError::DuplicateOptions { first: 0, second: 1 })
        );
    }

    #[test]
    fn turn_wraps_negative() {
        assert_eq!(turn(0, -90), 270);
        assert_eq!(turn(270, 90), 0);
        assert_eq!(delta(270, 0), 90);
    }
}
