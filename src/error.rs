//! Error taxonomy for generation, validation, answer checking and configuration,
//! plus the mapping of those errors onto HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::domain::{Difficulty, PatternFamily};

/// A builder could not construct a candidate. Always recoverable by resampling.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("no {family} schema configured for {difficulty} difficulty")]
    NoSchema {
        family: PatternFamily,
        difficulty: Difficulty,
    },

    #[error("only {found} unique distractors available, 3 required")]
    NotEnoughDistractors { found: usize },

    #[error("options {first} and {second} collide")]
    OptionCollision { first: usize, second: usize },

    #[error("row rule targets {row}° but column rule targets {column}°")]
    RuleConflict { row: u16, column: u16 },

    #[error("{kinds} distinct shape kinds referenced, at most 2 allowed")]
    ShapeBudget { kinds: usize },

    #[error("schema '{id}' is malformed: {reason}")]
    MalformedSchema { id: String, reason: String },
}

/// A finished question failed independent re-derivation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("expected 4 options, found {0}")]
    OptionCount(usize),

    #[error("options {first} and {second} are identical")]
    DuplicateOptions { first: usize, second: usize },

    #[error("correct_index {0} is outside 0..=3")]
    CorrectIndexOutOfRange(usize),

    #[error("pattern_family {declared} does not match a {stem} stem")]
    FamilyMismatch {
        declared: PatternFamily,
        stem: PatternFamily,
    },

    #[error("option {index} is not a {expected} option")]
    OptionKind { index: usize, expected: &'static str },

    #[error("malformed stem: {0}")]
    MalformedStem(String),

    #[error("no rule derivable from stem: {0}")]
    NoDerivableRule(String),

    #[error("no option matches the derived answer")]
    NoMatchingOption,

    #[error("options {matches:?} all match the derived answer")]
    AmbiguousAnswer { matches: Vec<usize> },

    #[error("derived answer is option {derived} but correct_index is {recorded}")]
    CorrectIndexMismatch { derived: usize, recorded: usize },

    #[error("row rule targets {row}° but column rule targets {column}°")]
    MatrixRuleConflict { row: u16, column: u16 },

    #[error("{0} distinct shape kinds referenced, at most 2 allowed")]
    ShapeBudgetExceeded(usize),
}

/// Errors surfaced by the public generation entry points.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error("unsupported difficulty '{0}' (expected easy, medium or hard)")]
    InvalidDifficulty(String),

    #[error("unknown pattern family '{0}'")]
    UnknownFamily(String),

    #[error("generator exhausted after {attempts} attempts (last rejection: {})", last_rejection.as_deref().unwrap_or("none"))]
    Exhausted {
        attempts: usize,
        last_rejection: Option<String>,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnswerError {
    #[error("selected index {0} is outside 0..=3")]
    InvalidSelection(usize),

    #[error("question failed validation: {0}")]
    InvalidQuestion(#[from] ValidationError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid family weights: {0}")]
    Weights(String),
}

/// HTTP-facing error
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Generator exhausted: {0}")]
    Exhausted(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl From<GenerateError> for ApiError {
    fn from(e: GenerateError) -> Self {
        match e {
            GenerateError::Exhausted { .. } => ApiError::Exhausted(e.to_string()),
            GenerateError::InvalidDifficulty(_) | GenerateError::UnknownFamily(_) => {
                ApiError::BadRequest(e.to_string())
            }
        }
    }
}

impl From<AnswerError> for ApiError {
    fn from(e: AnswerError) -> Self {
        match e {
            AnswerError::InvalidSelection(_) => ApiError::BadRequest(e.to_string()),
            AnswerError::InvalidQuestion(_) => ApiError::Validation(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            ApiError::Exhausted(_) => (StatusCode::INTERNAL_SERVER_ERROR, "GENERATOR_EXHAUSTED"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
