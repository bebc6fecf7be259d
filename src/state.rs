//! Application state: the generator shared by all handlers.
//!
//! Built once at startup from NVR_CONFIG_PATH when set, otherwise from the
//! built-in schemas and default family weights.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{load_config_from_env, NvrConfig};
use crate::domain::{Difficulty, PatternFamily};
use crate::generator::Generator;
use crate::seeds::builtin_catalog;

pub struct AppState {
    pub generator: Generator,
}

impl AppState {
    pub fn new() -> Self {
        Self::from_config(load_config_from_env().unwrap_or_default())
    }

    pub fn from_config(cfg: NvrConfig) -> Self {
        let catalog = match cfg.catalog {
            Some(catalog) => Arc::new(catalog),
            None => builtin_catalog(),
        };
        let generator = Generator::new(catalog, cfg.weights);
        log_inventory(&generator);
        Self { generator }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

fn log_inventory(generator: &Generator) {
    let catalog = generator.catalog();
    for difficulty in Difficulty::ALL {
        let counts: Vec<String> = PatternFamily::ALL
            .iter()
            .map(|&f| format!("{f}={}", catalog.count(f, difficulty)))
            .collect();
        info!(target: "nvr_backend", %difficulty, schemas = %counts.join(","), "Schema inventory");

        for family in PatternFamily::ALL {
            let weighted = generator.weights().tier(difficulty).weight(family) > 0;
            if weighted && catalog.count(family, difficulty) == 0 {
                warn!(
                    target: "nvr_backend",
                    %difficulty,
                    %family,
                    "Family is weighted but has no schemas; its draws will be retried"
                );
            }
        }
    }
}
