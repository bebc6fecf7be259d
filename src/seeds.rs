//! Pattern schema store: the seed schemas every builder draws from.
//!
//! The built-in catalog is plain Rust data, built once per process and shared
//! read-only. A TOML file may replace it wholesale (see `config`).

use std::sync::{Arc, OnceLock};

use serde::Deserialize;

use crate::domain::{Difficulty, Fill, PatternFamily, Shape, ShapeKind};

/// Attribute dimension three ODD_ONE_OUT items share and one violates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Invariant {
  Rotation,
  Fill,
  Shape,
}

impl Invariant {
  pub fn as_str(self) -> &'static str {
    match self {
      Invariant::Rotation => "rotation",
      Invariant::Fill => "fill",
      Invariant::Shape => "shape",
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SequenceSchema {
  pub id: String,
  pub difficulty: Difficulty,
  pub shape: ShapeKind,
  #[serde(default)] pub fill: Fill,
  /// Rotations of the visible run, in order.
  pub start_values: Vec<u16>,
  pub step: i32,
  pub explanation: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct OddOneOutSchema {
  pub id: String,
  pub difficulty: Difficulty,
  pub invariant: Invariant,
  /// Shape shared by the three common items.
  pub base: Shape,
  /// Differs from `base` in the invariant dimension only.
  pub odd: Shape,
  /// Distinct rotations dealt one per item so rotation never singles anything out.
  /// Empty means every item keeps its own rotation.
  #[serde(default)] pub rotation_pool: Vec<u16>,
  pub explanation: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MatrixTemplate {
  pub id: String,
  pub difficulty: Difficulty,
  pub shape: ShapeKind,
  #[serde(default)] pub fill: Fill,
  /// Row-major rotations. The value stored at `missing` is discarded.
  pub rows: [[u16; 3]; 3],
  /// `[row, col]` of the blank cell.
  pub missing: [usize; 2],
  pub row_step: i32,
  /// Column rule; when present it must agree with the row rule on the blank cell.
  #[serde(default)] pub col_step: Option<i32>,
  pub explanation: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AnalogySchema {
  pub id: String,
  pub difficulty: Difficulty,
  pub a: Shape,
  pub c: Shape,
  pub step: i32,
  pub explanation: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CompositionSchema {
  pub id: String,
  pub difficulty: Difficulty,
  pub inputs: [Shape; 2],
  /// Added on top of both inputs for the over-union distractor.
  pub extra: Shape,
  /// Turn applied to one input for the perturbed distractors.
  pub perturb_step: i32,
  pub explanation: String,
}

/// Common accessors so builders can pick a schema for a tier generically.
pub trait TieredSchema {
  fn id(&self) -> &str;
  fn difficulty(&self) -> Difficulty;
}

macro_rules! tiered {
  ($($ty:ty),*) => {$(
    impl TieredSchema for $ty {
      fn id(&self) -> &str { &self.id }
      fn difficulty(&self) -> Difficulty { self.difficulty }
    }
  )*};
}
tiered!(SequenceSchema, OddOneOutSchema, MatrixTemplate, AnalogySchema, CompositionSchema);

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PatternCatalog {
  #[serde(default)] pub sequence: Vec<SequenceSchema>,
  #[serde(default)] pub odd_one_out: Vec<OddOneOutSchema>,
  #[serde(default)] pub matrix: Vec<MatrixTemplate>,
  #[serde(default)] pub analogy: Vec<AnalogySchema>,
  #[serde(default)] pub composition: Vec<CompositionSchema>,
}

impl PatternCatalog {
  /// Number of schemas a family offers at a tier.
  pub fn count(&self, family: PatternFamily, difficulty: Difficulty) -> usize {
    fn tier<T: TieredSchema>(pool: &[T], d: Difficulty) -> usize {
      pool.iter().filter(|s| s.difficulty() == d).count()
    }
    match family {
      PatternFamily::Sequence => tier(&self.sequence, difficulty),
      PatternFamily::OddOneOut => tier(&self.odd_one_out, difficulty),
      PatternFamily::Matrix => tier(&self.matrix, difficulty),
      PatternFamily::Analogy => tier(&self.analogy, difficulty),
      PatternFamily::Composition => tier(&self.composition, difficulty),
    }
  }
}

static BUILTIN: OnceLock<Arc<PatternCatalog>> = OnceLock::new();

/// Process-wide built-in catalog.
pub fn builtin_catalog() -> Arc<PatternCatalog> {
  BUILTIN.get_or_init(|| Arc::new(seed_catalog())).clone()
}

fn triangle(rotation: u16) -> Shape {
  Shape::new(ShapeKind::Triangle, rotation)
}

fn square(rotation: u16) -> Shape {
  Shape::new(ShapeKind::Square, rotation)
}

/// Built-in schemas. Every entry yields three distinct distractors.
pub fn seed_catalog() -> PatternCatalog {
  PatternCatalog {
    sequence: vec![
      SequenceSchema {
        id: "seq-easy-quarter-turns".into(),
        difficulty: Difficulty::Easy,
        shape: ShapeKind::Triangle,
        fill: Fill::Outline,
        start_values: vec![0, 90, 180],
        step: 90,
        explanation: "The shape rotates {step}° clockwise each step.".into(),
      },
      SequenceSchema {
        id: "seq-easy-quarter-turns-late".into(),
        difficulty: Difficulty::Easy,
        shape: ShapeKind::Triangle,
        fill: Fill::Solid,
        start_values: vec![90, 180, 270],
        step: 90,
        explanation: "The shape rotates {step}° clockwise each step.".into(),
      },
      SequenceSchema {
        id: "seq-medium-anticlockwise".into(),
        difficulty: Difficulty::Medium,
        shape: ShapeKind::Triangle,
        fill: Fill::Solid,
        start_values: vec![0, 270, 180, 90],
        step: -90,
        explanation: "The shape rotates 90° anticlockwise each step.".into(),
      },
      SequenceSchema {
        id: "seq-medium-offset-quarters".into(),
        difficulty: Difficulty::Medium,
        shape: ShapeKind::Triangle,
        fill: Fill::Outline,
        start_values: vec![45, 135, 225],
        step: 90,
        explanation: "The shape rotates {step}° clockwise each step.".into(),
      },
      SequenceSchema {
        id: "seq-hard-eighth-turns".into(),
        difficulty: Difficulty::Hard,
        shape: ShapeKind::Triangle,
        fill: Fill::Outline,
        start_values: vec![0, 45, 90, 135],
        step: 45,
        explanation: "The shape rotates {step}° clockwise each step.".into(),
      },
      SequenceSchema {
        id: "seq-hard-anticlockwise-eighths".into(),
        difficulty: Difficulty::Hard,
        shape: ShapeKind::Triangle,
        fill: Fill::Solid,
        start_values: vec![90, 45, 0],
        step: -45,
        explanation: "The shape rotates 45° anticlockwise each step.".into(),
      },
    ],
    odd_one_out: vec![
      OddOneOutSchema {
        id: "ooo-easy-rotation".into(),
        difficulty: Difficulty::Easy,
        invariant: Invariant::Rotation,
        base: triangle(90),
        odd: triangle(180),
        rotation_pool: Vec::new(),
        explanation: "Three shapes share the same {invariant} ({common}). The odd one is {odd}.".into(),
      },
      OddOneOutSchema {
        id: "ooo-medium-fill".into(),
        difficulty: Difficulty::Medium,
        invariant: Invariant::Fill,
        base: triangle(0),
        odd: triangle(0).with_fill(Fill::Solid),
        rotation_pool: vec![0, 90, 180, 270],
        explanation: "Ignore the rotation: three shapes share the same {invariant} ({common}). The odd one is {odd}.".into(),
      },
      OddOneOutSchema {
        id: "ooo-hard-shape".into(),
        difficulty: Difficulty::Hard,
        invariant: Invariant::Shape,
        base: triangle(0),
        odd: square(0),
        rotation_pool: vec![0, 45, 90, 135, 180, 225, 270, 315],
        explanation: "Ignore the rotation: three items are the same {invariant} ({common}). The odd one is a {odd}.".into(),
      },
      OddOneOutSchema {
        id: "ooo-hard-fill-squares".into(),
        difficulty: Difficulty::Hard,
        invariant: Invariant::Fill,
        base: square(0).with_fill(Fill::Solid),
        odd: square(0),
        rotation_pool: vec![0, 15, 30, 45, 60, 75],
        explanation: "Ignore the rotation: three shapes share the same {invariant} ({common}). The odd one is {odd}.".into(),
      },
    ],
    matrix: vec![
      MatrixTemplate {
        id: "mx-easy-quarter-rows".into(),
        difficulty: Difficulty::Easy,
        shape: ShapeKind::Triangle,
        fill: Fill::Outline,
        rows: [[0, 90, 180], [90, 180, 270], [180, 270, 0]],
        missing: [0, 2],
        row_step: 90,
        col_step: None,
        explanation: "The shape rotates {row_step}° clockwise across each row.".into(),
      },
      MatrixTemplate {
        id: "mx-medium-rows-and-columns".into(),
        difficulty: Difficulty::Medium,
        shape: ShapeKind::Triangle,
        fill: Fill::Solid,
        rows: [[0, 90, 180], [180, 270, 0], [0, 90, 180]],
        missing: [1, 1],
        row_step: 90,
        col_step: Some(180),
        explanation: "The shape turns {row_step}° across each row and {col_step}° down each column.".into(),
      },
      MatrixTemplate {
        id: "mx-hard-eighths".into(),
        difficulty: Difficulty::Hard,
        shape: ShapeKind::Triangle,
        fill: Fill::Outline,
        rows: [[0, 45, 90], [90, 135, 180], [180, 225, 270]],
        missing: [2, 0],
        row_step: 45,
        col_step: Some(90),
        explanation: "The shape turns {row_step}° across each row and {col_step}° down each column.".into(),
      },
      MatrixTemplate {
        id: "mx-hard-reverse-rows".into(),
        difficulty: Difficulty::Hard,
        shape: ShapeKind::Triangle,
        fill: Fill::Solid,
        rows: [[270, 180, 90], [315, 225, 135], [0, 270, 180]],
        missing: [1, 2],
        row_step: -90,
        col_step: Some(45),
        explanation: "The shape turns 90° anticlockwise across each row and {col_step}° clockwise down each column.".into(),
      },
    ],
    analogy: vec![
      AnalogySchema {
        id: "an-easy-quarter".into(),
        difficulty: Difficulty::Easy,
        a: triangle(0),
        c: triangle(90).with_fill(Fill::Solid),
        step: 90,
        explanation: "A turns {step}° clockwise to make B, so C turns {step}° to make D.".into(),
      },
      AnalogySchema {
        id: "an-medium-half".into(),
        difficulty: Difficulty::Medium,
        a: triangle(0),
        c: triangle(90).with_fill(Fill::Solid),
        step: 180,
        explanation: "A turns {step}° clockwise to make B, so C turns {step}° to make D.".into(),
      },
      AnalogySchema {
        id: "an-medium-anticlockwise".into(),
        difficulty: Difficulty::Medium,
        a: triangle(90),
        c: triangle(180).with_fill(Fill::Solid),
        step: -90,
        explanation: "A turns 90° anticlockwise to make B, so C turns 90° anticlockwise to make D.".into(),
      },
      AnalogySchema {
        id: "an-hard-eighth".into(),
        difficulty: Difficulty::Hard,
        a: triangle(0),
        c: triangle(270).with_fill(Fill::Solid),
        step: 45,
        explanation: "A turns {step}° clockwise to make B, so C turns {step}° to make D.".into(),
      },
      AnalogySchema {
        id: "an-hard-three-eighths".into(),
        difficulty: Difficulty::Hard,
        a: triangle(45),
        c: triangle(0).with_fill(Fill::Solid),
        step: 135,
        explanation: "A turns {step}° clockwise to make B, so C turns {step}° to make D.".into(),
      },
    ],
    composition: vec![
      CompositionSchema {
        id: "cp-easy-opposed-triangles".into(),
        difficulty: Difficulty::Easy,
        inputs: [triangle(0), triangle(180)],
        extra: triangle(90),
        perturb_step: 90,
        explanation: "Overlay both shapes exactly as they are: nothing added, nothing turned.".into(),
      },
      CompositionSchema {
        id: "cp-medium-square-and-triangle".into(),
        difficulty: Difficulty::Medium,
        inputs: [square(0), triangle(0).with_fill(Fill::Solid)],
        extra: triangle(180).with_fill(Fill::Solid),
        perturb_step: 90,
        explanation: "Overlay both shapes exactly as they are: nothing added, nothing turned.".into(),
      },
      CompositionSchema {
        id: "cp-hard-diagonal-triangles".into(),
        difficulty: Difficulty::Hard,
        inputs: [triangle(45), triangle(225)],
        extra: triangle(135),
        perturb_step: 90,
        explanation: "Overlay both shapes exactly as they are: nothing added, nothing turned.".into(),
      },
      CompositionSchema {
        id: "cp-hard-square-and-triangle".into(),
        difficulty: Difficulty::Hard,
        inputs: [square(0), triangle(90)],
        extra: triangle(270),
        perturb_step: 45,
        explanation: "Overlay both shapes exactly as they are: nothing added, nothing turned.".into(),
      },
    ],
  }
}
