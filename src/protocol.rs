//! Public protocol structs for the HTTP endpoints (serde ready).
//! Questions travel in their canonical `Question` shape; only the envelopes live here.

use serde::{Deserialize, Serialize};

use crate::domain::Question;

#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

/// Query string for `GET /api/v1/question`.
#[derive(Debug, Default, Deserialize)]
pub struct QuestionQuery {
    /// Defaults to easy.
    pub difficulty: Option<String>,
    /// Restricts generation to one family when present.
    pub family: Option<String>,
    /// Makes generation reproducible.
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct ValidateOut {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerIn {
    pub question: Question,
    #[serde(rename = "selectedIndex")]
    pub selected_index: usize,
    #[serde(rename = "responseMs", default)]
    pub response_ms: Option<u64>,
}
