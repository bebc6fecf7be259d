//! Core answer checking used by the HTTP layer, plus the mastery rule the
//! progress layer applies to stored attempts.
//!
//! A question coming back from the client is untrusted: it is re-validated
//! before the selection is scored against it.

use tracing::{info, instrument};

use crate::domain::{AttemptRecord, Difficulty, PatternFamily, Question};
use crate::error::AnswerError;
use crate::validator::validate;

/// Score a learner's selection and produce the record handed to persistence.
#[instrument(level = "info", skip(question), fields(family = %question.pattern_family, difficulty = %question.difficulty))]
pub fn check_answer(
  question: &Question,
  selected_index: usize,
  response_ms: Option<u64>,
) -> Result<AttemptRecord, AnswerError> {
  validate(question)?;
  if selected_index >= question.options.len() {
    return Err(AnswerError::InvalidSelection(selected_index));
  }

  let correct = selected_index == question.correct_index;
  info!(
    target: "attempt",
    family = %question.pattern_family,
    difficulty = %question.difficulty,
    selected_index,
    correct,
    response_ms = response_ms.unwrap_or_default(),
    "Attempt scored"
  );

  Ok(AttemptRecord {
    pattern_family: question.pattern_family,
    difficulty: question.difficulty,
    selected_index,
    correct_index: question.correct_index,
    correct,
    response_ms,
    explanation: question.explanation.clone(),
    pattern_id: question.pattern_id.clone(),
  })
}

/// Attempts needed at a tier before it can count as mastered.
pub const MASTERY_MIN_ATTEMPTS: usize = 10;
/// Share of correct attempts needed for mastery.
pub const MASTERY_ACCURACY: f64 = 0.80;

/// `(attempts, accuracy)` for one family at one tier. Accuracy is 0 with no attempts.
pub fn level_stats(records: &[AttemptRecord], family: PatternFamily, difficulty: Difficulty) -> (usize, f64) {
  let (total, correct) = records
    .iter()
    .filter(|r| r.pattern_family == family && r.difficulty == difficulty)
    .fold((0usize, 0usize), |(n, ok), r| (n + 1, ok + usize::from(r.correct)));
  match total {
    0 => (0, 0.0),
    n => (n, correct as f64 / n as f64),
  }
}

pub fn is_mastered(records: &[AttemptRecord], family: PatternFamily, difficulty: Difficulty) -> bool {
  let (attempts, accuracy) = level_stats(records, family, difficulty);
  attempts >= MASTERY_MIN_ATTEMPTS && accuracy >= MASTERY_ACCURACY
}

/// Highest tier open to the learner: one past the last of the consecutively
/// mastered tiers from easy upwards, capped at hard.
pub fn unlocked_difficulty(records: &[AttemptRecord], family: PatternFamily) -> Difficulty {
  let mut unlocked = Difficulty::Easy;
  for (i, &tier) in Difficulty::ALL.iter().enumerate() {
    if !is_mastered(records, family, tier) {
      break;
    }
    unlocked = Difficulty::ALL.get(i + 1).copied().unwrap_or(tier);
  }
  unlocked
}
