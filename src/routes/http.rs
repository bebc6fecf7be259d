//! HTTP endpoint handlers. These are thin wrappers that forward to the generator and core logic.
//! Each handler is instrumented and logs its parameters and basic result info.

use std::sync::Arc;
use axum::{extract::{State, Query}, Json, response::IntoResponse};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{info, instrument};

use crate::domain::{AttemptRecord, Question};
use crate::error::ApiError;
use crate::logic::check_answer;
use crate::protocol::*;
use crate::state::AppState;
use crate::validator::validate;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state), fields(difficulty = ?q.difficulty, family = ?q.family, seed = ?q.seed))]
pub async fn http_get_question(
  State(state): State<Arc<AppState>>,
  Query(q): Query<QuestionQuery>,
) -> Result<Json<Question>, ApiError> {
  let difficulty = q.difficulty.unwrap_or_else(|| "easy".into());
  let mut rng = match q.seed {
    Some(seed) => StdRng::seed_from_u64(seed),
    None => StdRng::from_entropy(),
  };

  let question = match q.family.as_deref() {
    Some(family) => state.generator.generate_for_family_named(&mut rng, family, &difficulty)?,
    None => state.generator.generate_named(&mut rng, &difficulty)?,
  };
  info!(
    target: "generator",
    family = %question.pattern_family,
    difficulty = %question.difficulty,
    "HTTP question served"
  );
  Ok(Json(question))
}

/// Takes raw JSON so shape errors (unknown family, stem type, ...) still answer with `ValidateOut`.
#[instrument(level = "info", skip(body), fields(family = ?body.get("pattern_family")))]
pub async fn http_post_validate(Json(body): Json<serde_json::Value>) -> impl IntoResponse {
  let question = match serde_json::from_value::<Question>(body) {
    Ok(q) => q,
    Err(e) => {
      info!(target: "nvr_backend", error = %e, "Submitted question is not well-formed");
      return Json(ValidateOut { valid: false, error: Some(e.to_string()) });
    }
  };
  let out = match validate(&question) {
    Ok(()) => ValidateOut { valid: true, error: None },
    Err(e) => {
      info!(target: "nvr_backend", error = %e, "Submitted question rejected");
      ValidateOut { valid: false, error: Some(e.to_string()) }
    }
  };
  Json(out)
}

#[instrument(level = "info", skip(body), fields(family = %body.question.pattern_family, selected = body.selected_index))]
pub async fn http_post_answer(Json(body): Json<AnswerIn>) -> Result<Json<AttemptRecord>, ApiError> {
  let record = check_answer(&body.question, body.selected_index, body.response_ms)?;
  Ok(Json(record))
}
