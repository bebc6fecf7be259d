//! Non-verbal reasoning question generator.
//!
//! Builds rotation-based puzzles in five pattern families, validates each one
//! independently, and serves them over a small HTTP API.

pub mod builders;
pub mod config;
pub mod domain;
pub mod error;
pub mod generator;
pub mod logic;
pub mod protocol;
pub mod routes;
pub mod rules;
pub mod seeds;
pub mod state;
pub mod telemetry;
pub mod util;
pub mod validator;

pub use domain::{AnswerOption, AttemptRecord, Difficulty, PatternFamily, Question, Shape, Stem};
pub use error::{GenerateError, ValidationError};
pub use generator::{generate, generate_for_family, Generator, MAX_GENERATION_ATTEMPTS};
pub use validator::validate;
