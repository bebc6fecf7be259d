//! ODD_ONE_OUT: four items, three share an invariant and one breaks it.
//! Options are back-references to stem positions, always `[0, 1, 2, 3]`.

use rand::seq::SliceRandom;
use rand::Rng;

use super::{assemble, malformed, pick_schema, OPTION_COUNT};
use crate::domain::{AnswerOption, Difficulty, PatternFamily, Question, Shape, Stem};
use crate::error::BuildError;
use crate::rules::apply_rotation;
use crate::seeds::{Invariant, OddOneOutSchema};
use crate::util::fill_template;

pub fn build<R: Rng + ?Sized>(
  rng: &mut R,
  pool: &[OddOneOutSchema],
  difficulty: Difficulty,
) -> Result<Question, BuildError> {
  let schema = pick_schema(rng, pool, PatternFamily::OddOneOut, difficulty)?;
  let base = schema.base.rotated(0);
  let odd = schema.odd.rotated(0);

  if !differs_only_in(&base, &odd, schema.invariant) {
    return Err(malformed(schema, format!("odd item must differ from base in {} only", schema.invariant.as_str())));
  }

  let mut slots: Vec<(bool, Shape)> = vec![(false, base); OPTION_COUNT - 1];
  slots.push((true, odd));

  if !schema.rotation_pool.is_empty() {
    if schema.invariant == Invariant::Rotation {
      return Err(malformed(schema, "rotation pool cannot vary the invariant itself"));
    }
    let mut rotations: Vec<u16> = schema.rotation_pool.iter().map(|&r| apply_rotation(r, 0)).collect();
    rotations.sort_unstable();
    rotations.dedup();
    if rotations.len() < OPTION_COUNT {
      return Err(malformed(schema, "rotation pool needs four distinct values"));
    }
    let dealt: Vec<u16> = rotations.choose_multiple(rng, OPTION_COUNT).copied().collect();
    for ((_, item), rotation) in slots.iter_mut().zip(dealt) {
      *item = item.with_rotation(rotation);
    }
  }

  slots.shuffle(rng);
  let correct_index = slots.iter().position(|(is_odd, _)| *is_odd).unwrap_or_default();
  let items: Vec<Shape> = slots.into_iter().map(|(_, item)| item).collect();
  let options = (0..OPTION_COUNT).map(|ref_index| AnswerOption::Reference { ref_index }).collect();

  let (common, odd_value) = describe(&base, &odd, schema.invariant);
  let explanation = fill_template(
    &schema.explanation,
    &[
      ("invariant", schema.invariant.as_str()),
      ("common", common.as_str()),
      ("odd", odd_value.as_str()),
    ],
  );

  assemble(&schema.id, difficulty, Stem::OddOneOut { items }, options, correct_index, explanation)
}

fn differs_only_in(base: &Shape, odd: &Shape, invariant: Invariant) -> bool {
  match invariant {
    Invariant::Rotation => base.rotation != odd.rotation && base.with_rotation(odd.rotation) == *odd,
    Invariant::Fill => base.fill != odd.fill && base.with_fill(odd.fill) == *odd,
    Invariant::Shape => base.kind != odd.kind && Shape { kind: odd.kind, ..*base } == *odd,
  }
}

fn describe(base: &Shape, odd: &Shape, invariant: Invariant) -> (String, String) {
  match invariant {
    Invariant::Rotation => (format!("{}°", base.rotation), format!("{}°", odd.rotation)),
    Invariant::Fill => (base.fill.to_string(), odd.fill.to_string()),
    Invariant::Shape => (base.kind.to_string(), odd.kind.to_string()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Fill, ShapeKind};
  use crate::seeds::seed_catalog;
  use rand::rngs::StdRng;
  use rand::SeedableRng;
  use std::collections::HashSet;

  #[test]
  fn easy_rotation_odd_item_is_referenced() {
    let catalog = seed_catalog();
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..20 {
      let q = build(&mut rng, &catalog.odd_one_out, Difficulty::Easy).unwrap();
      let Stem::OddOneOut { items } = &q.stem else { panic!("wrong stem") };
      assert_eq!(items.len(), 4);
      assert_eq!(items.iter().filter(|s| s.rotation == 90).count(), 3);
      assert_eq!(items[q.correct_index].rotation, 180);
      assert_eq!(q.options[q.correct_index], AnswerOption::Reference { ref_index: q.correct_index });
    }
  }

  #[test]
  fn medium_fill_deals_distinct_rotations() {
    let catalog = seed_catalog();
    let mut rng = StdRng::seed_from_u64(12);
    let q = build(&mut rng, &catalog.odd_one_out, Difficulty::Medium).unwrap();
    let Stem::OddOneOut { items } = &q.stem else { panic!("wrong stem") };
    let rotations: HashSet<u16> = items.iter().map(|s| s.rotation).collect();
    assert_eq!(rotations.len(), 4);
    assert_eq!(items[q.correct_index].fill, Fill::Solid);
    assert_eq!(items.iter().filter(|s| s.fill == Fill::Outline).count(), 3);
  }

  #[test]
  fn odd_differing_in_two_dimensions_is_malformed() {
    let pool = vec![OddOneOutSchema {
      id: "bad".into(),
      difficulty: Difficulty::Easy,
      invariant: Invariant::Fill,
      base: Shape::new(ShapeKind::Triangle, 0),
      odd: Shape::new(ShapeKind::Triangle, 90).with_fill(Fill::Solid),
      rotation_pool: Vec::new(),
      explanation: String::new(),
    }];
    let mut rng = StdRng::seed_from_u64(2);
    assert!(matches!(
      build(&mut rng, &pool, Difficulty::Easy),
      Err(BuildError::MalformedSchema { .. })
    ));
  }

  #[test]
  fn explanation_names_the_invariant() {
    let catalog = seed_catalog();
    let mut rng = StdRng::seed_from_u64(4);
    let q = build(&mut rng, &catalog.odd_one_out, Difficulty::Easy).unwrap();
    assert!(q.explanation.contains("rotation"));
    assert!(q.explanation.contains("180°"));
  }
}
