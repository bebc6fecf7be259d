//! Loading generator configuration (family weights + optional schema catalog) from TOML.
//!
//! ```toml
//! [weights.easy]
//! sequence = 35
//! odd_one_out = 30
//! matrix = 15
//! analogy = 10
//! composition = 10
//!
//! [[catalog.sequence]]
//! id = "seq-custom"
//! difficulty = "easy"
//! shape = "triangle"
//! start_values = [0, 90, 180]
//! step = 90
//! explanation = "The shape rotates {step}° clockwise each step."
//! ```
//!
//! Missing tiers fall back to the built-in weights. A `catalog` table replaces the
//! built-in schemas wholesale.

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::{Difficulty, PatternFamily};
use crate::error::ConfigError;
use crate::seeds::PatternCatalog;

/// Relative family weights within one difficulty tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct TierWeights {
  #[serde(default)] pub sequence: u32,
  #[serde(default)] pub odd_one_out: u32,
  #[serde(default)] pub matrix: u32,
  #[serde(default)] pub analogy: u32,
  #[serde(default)] pub composition: u32,
}

impl TierWeights {
  pub const fn new(sequence: u32, odd_one_out: u32, matrix: u32, analogy: u32, composition: u32) -> Self {
    Self { sequence, odd_one_out, matrix, analogy, composition }
  }

  pub fn weight(&self, family: PatternFamily) -> u32 {
    match family {
      PatternFamily::Sequence => self.sequence,
      PatternFamily::OddOneOut => self.odd_one_out,
      PatternFamily::Matrix => self.matrix,
      PatternFamily::Analogy => self.analogy,
      PatternFamily::Composition => self.composition,
    }
  }

  /// Summed in `u64` so five `u32` weights can never overflow.
  pub fn total(&self) -> u64 {
    PatternFamily::ALL.iter().map(|&f| u64::from(self.weight(f))).sum()
  }

  /// `(family, weight)` pairs in canonical family order.
  pub fn entries(&self) -> [(PatternFamily, u32); 5] {
    PatternFamily::ALL.map(|f| (f, self.weight(f)))
  }
}

/// Per-tier family mix. Defaults lean easy tiers towards sequences and
/// hard tiers towards matrices and analogies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct FamilyWeights {
  #[serde(default = "default_easy")] pub easy: TierWeights,
  #[serde(default = "default_medium")] pub medium: TierWeights,
  #[serde(default = "default_hard")] pub hard: TierWeights,
}

fn default_easy() -> TierWeights { TierWeights::new(35, 30, 15, 10, 10) }
fn default_medium() -> TierWeights { TierWeights::new(25, 20, 20, 20, 15) }
fn default_hard() -> TierWeights { TierWeights::new(15, 15, 25, 25, 20) }

impl Default for FamilyWeights {
  fn default() -> Self {
    Self { easy: default_easy(), medium: default_medium(), hard: default_hard() }
  }
}

impl FamilyWeights {
  pub fn tier(&self, difficulty: Difficulty) -> &TierWeights {
    match difficulty {
      Difficulty::Easy => &self.easy,
      Difficulty::Medium => &self.medium,
      Difficulty::Hard => &self.hard,
    }
  }

  /// Expected share of `family` among questions generated at `difficulty`.
  pub fn share(&self, difficulty: Difficulty, family: PatternFamily) -> f64 {
    let tier = self.tier(difficulty);
    match tier.total() {
      0 => 1.0 / PatternFamily::ALL.len() as f64,
      total => f64::from(tier.weight(family)) / total as f64,
    }
  }

  /// Every tier needs at least one positive weight.
  pub fn validate(&self) -> Result<(), ConfigError> {
    for d in Difficulty::ALL {
      if self.tier(d).total() == 0 {
        return Err(ConfigError::Weights(format!("all weights are zero for {d}")));
      }
    }
    Ok(())
  }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct NvrConfig {
  #[serde(default)]
  pub weights: FamilyWeights,
  #[serde(default)]
  pub catalog: Option<PatternCatalog>,
}

pub fn load_config(path: &str) -> Result<NvrConfig, ConfigError> {
  let raw = std::fs::read_to_string(path)
    .map_err(|source| ConfigError::Io { path: path.to_string(), source })?;
  parse_config(path, &raw)
}

fn parse_config(path: &str, raw: &str) -> Result<NvrConfig, ConfigError> {
  let cfg = toml::from_str::<NvrConfig>(raw)
    .map_err(|source| ConfigError::Parse { path: path.to_string(), source })?;
  cfg.weights.validate()?;
  Ok(cfg)
}

/// Attempt to load `NvrConfig` from NVR_CONFIG_PATH. On any IO/parse/weight error, returns None.
pub fn load_config_from_env() -> Option<NvrConfig> {
  let path = std::env::var("NVR_CONFIG_PATH").ok()?;
  match load_config(&path) {
    Ok(cfg) => {
      info!(
        target: "nvr_backend",
        %path,
        custom_catalog = cfg.catalog.is_some(),
        "Loaded generator config (TOML)"
      );
      Some(cfg)
    }
    Err(e) => {
      error!(target: "nvr_backend", %path, error = %e, "Failed to load TOML config");
      None
    }
  }
}
