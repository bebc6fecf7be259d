//! Domain models: shape descriptors, difficulty tiers, pattern families, stems,
//! answer options and the canonical question handed to renderers and controllers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GenerateError;

/// Geometric primitive drawn inside a tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeKind {
  Triangle,
  Square,
  Circle,
}

impl fmt::Display for ShapeKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ShapeKind::Triangle => "triangle",
      ShapeKind::Square => "square",
      ShapeKind::Circle => "circle",
    };
    f.write_str(name)
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reflection {
  None,
  Horizontal,
  Vertical,
}
impl Default for Reflection {
  fn default() -> Self { Reflection::None }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fill {
  Outline,
  Solid,
}
impl Default for Fill {
  fn default() -> Self { Fill::Outline }
}

impl fmt::Display for Fill {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self { Fill::Outline => "outline", Fill::Solid => "solid" })
  }
}

/// Immutable shape descriptor. Equality is structural over all four attributes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Shape {
  #[serde(rename = "shape")]
  pub kind: ShapeKind,
  /// Integer degrees in `[0, 360)`.
  pub rotation: u16,
  #[serde(default)] pub reflection: Reflection,
  #[serde(default)] pub fill: Fill,
}

impl Shape {
  /// Outline shape with no reflection.
  pub const fn new(kind: ShapeKind, rotation: u16) -> Self {
    Self { kind, rotation, reflection: Reflection::None, fill: Fill::Outline }
  }

  pub const fn with_fill(self, fill: Fill) -> Self {
    Self { fill, ..self }
  }

  pub const fn with_rotation(self, rotation: u16) -> Self {
    Self { rotation, ..self }
  }

  /// Same shape turned by `step` degrees (negative turns anticlockwise).
  pub fn rotated(self, step: i32) -> Self {
    self.with_rotation(crate::rules::apply_rotation(self.rotation, step))
  }
}

/// Requested difficulty tier. Callers that omit it get `Easy`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}
impl Default for Difficulty {
  fn default() -> Self { Difficulty::Easy }
}

impl Difficulty {
  pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

  pub fn as_str(self) -> &'static str {
    match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Difficulty {
  type Err = GenerateError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Difficulty::ALL
      .into_iter()
      .find(|d| d.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| GenerateError::InvalidDifficulty(s.to_string()))
  }
}

/// The five question archetypes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatternFamily {
  Sequence,
  OddOneOut,
  Matrix,
  Analogy,
  Composition,
}

impl PatternFamily {
  pub const ALL: [PatternFamily; 5] = [
    PatternFamily::Sequence,
    PatternFamily::OddOneOut,
    PatternFamily::Matrix,
    PatternFamily::Analogy,
    PatternFamily::Composition,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      PatternFamily::Sequence => "SEQUENCE",
      PatternFamily::OddOneOut => "ODD_ONE_OUT",
      PatternFamily::Matrix => "MATRIX",
      PatternFamily::Analogy => "ANALOGY",
      PatternFamily::Composition => "COMPOSITION",
    }
  }
}

impl fmt::Display for PatternFamily {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PatternFamily {
  type Err = GenerateError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    PatternFamily::ALL
      .into_iter()
      .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| GenerateError::UnknownFamily(s.to_string()))
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
  LeftToRight,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPosition {
  End,
}

/// Marker for the hidden fourth term of an analogy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalogySlot {
  #[serde(rename = "D")]
  D,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompositionOp {
  Union,
}

/// Visual prompt of a question, one variant per pattern family.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stem {
  /// Visible run of shapes; the missing element follows the last one.
  Sequence {
    direction: Direction,
    items: Vec<Shape>,
    missing_position: MissingPosition,
  },
  /// Four shapes, three sharing an invariant and one violating it.
  OddOneOut { items: Vec<Shape> },
  /// 3×3 grid with exactly one `None` cell at `missing_cell` (`[row, col]`).
  Matrix {
    grid_size: [usize; 2],
    cells: [[Option<Shape>; 3]; 3],
    missing_cell: [usize; 2],
  },
  /// A is to B as C is to D.
  Analogy {
    a: Shape,
    b: Shape,
    c: Shape,
    missing: AnalogySlot,
  },
  /// Overlay of the two inputs under `operation`.
  Composition {
    operation: CompositionOp,
    inputs: Vec<Shape>,
  },
}

impl Stem {
  pub fn family(&self) -> PatternFamily {
    match self {
      Stem::Sequence { .. } => PatternFamily::Sequence,
      Stem::OddOneOut { .. } => PatternFamily::OddOneOut,
      Stem::Matrix { .. } => PatternFamily::Matrix,
      Stem::Analogy { .. } => PatternFamily::Analogy,
      Stem::Composition { .. } => PatternFamily::Composition,
    }
  }

  /// Every shape drawn in the stem.
  pub fn shapes(&self) -> Vec<&Shape> {
    match self {
      Stem::Sequence { items, .. } | Stem::OddOneOut { items } => items.iter().collect(),
      Stem::Matrix { cells, .. } => cells.iter().flatten().flatten().collect(),
      Stem::Analogy { a, b, c, .. } => vec![a, b, c],
      Stem::Composition { inputs, .. } => inputs.iter().collect(),
    }
  }
}

/// One of the four answer choices.
///
/// ODD_ONE_OUT options point back into the stem; COMPOSITION options are overlays.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerOption {
  Reference { ref_index: usize },
  Composite { composite: Vec<Shape> },
  Shape(Shape),
}

impl AnswerOption {
  pub fn shapes(&self) -> Vec<&Shape> {
    match self {
      AnswerOption::Reference { .. } => Vec::new(),
      AnswerOption::Composite { composite } => composite.iter().collect(),
      AnswerOption::Shape(shape) => vec![shape],
    }
  }
}

/// Canonical generator output. Field names are the rendering contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
  pub pattern_family: PatternFamily,
  pub stem: Stem,
  pub options: Vec<AnswerOption>,
  pub correct_index: usize,
  pub difficulty: Difficulty,
  pub explanation: String,
  /// Id of the schema the question was built from.
  #[serde(default)] pub pattern_id: String,
}

impl Question {
  /// Stem shapes followed by option shapes.
  pub fn shapes(&self) -> Vec<&Shape> {
    let mut all = self.stem.shapes();
    all.extend(self.options.iter().flat_map(AnswerOption::shapes));
    all
  }
}

/// What the controller hands to the persistence sink after a learner answers.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
  pub pattern_family: PatternFamily,
  pub difficulty: Difficulty,
  pub selected_index: usize,
  pub correct_index: usize,
  pub correct: bool,
  #[serde(default)] pub response_ms: Option<u64>,
  pub explanation: String,
  #[serde(default)] pub pattern_id: String,
}
