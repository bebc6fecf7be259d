//! Question generation: weighted family choice, build, validate, retry.
//!
//! Every candidate passes through the independent validator before it is
//! returned. Builder and validator rejections are both recoverable; after
//! `MAX_GENERATION_ATTEMPTS` the generator gives up with `Exhausted`.

use std::sync::{Arc, OnceLock};

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, error, instrument, warn};

use crate::builders;
use crate::config::FamilyWeights;
use crate::domain::{Difficulty, PatternFamily, Question};
use crate::error::GenerateError;
use crate::seeds::{builtin_catalog, PatternCatalog};
use crate::validator::validate;

pub const MAX_GENERATION_ATTEMPTS: usize = 20;

#[derive(Clone, Debug)]
pub struct Generator {
    catalog: Arc<PatternCatalog>,
    weights: FamilyWeights,
}

static GLOBAL: OnceLock<Generator> = OnceLock::new();

impl Generator {
    pub fn new(catalog: Arc<PatternCatalog>, weights: FamilyWeights) -> Self {
        Self { catalog, weights }
    }

    /// Built-in schemas with the default family mix.
    pub fn builtin() -> Self {
        Self::new(builtin_catalog(), FamilyWeights::default())
    }

    /// Shared built-in generator used by the free functions below.
    pub fn global() -> &'static Generator {
        GLOBAL.get_or_init(Generator::builtin)
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    pub fn weights(&self) -> &FamilyWeights {
        &self.weights
    }

    pub fn sample_family<R: Rng + ?Sized>(&self, rng: &mut R, difficulty: Difficulty) -> PatternFamily {
        let entries = self.weights.tier(difficulty).entries();
        match WeightedIndex::new(entries.iter().map(|(_, w)| u64::from(*w))) {
            Ok(dist) => entries[dist.sample(rng)].0,
            Err(e) => {
                warn!(target: "generator", %difficulty, error = %e, "Unusable family weights; sampling uniformly");
                *PatternFamily::ALL.choose(rng).unwrap_or(&PatternFamily::Sequence)
            }
        }
    }

    /// A validated question at `difficulty`, family drawn from the tier's weights.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R, difficulty: Difficulty) -> Result<Question, GenerateError> {
        self.run(rng, None, difficulty)
    }

    /// A validated question of a fixed family.
    pub fn generate_for_family<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        family: PatternFamily,
        difficulty: Difficulty,
    ) -> Result<Question, GenerateError> {
        self.run(rng, Some(family), difficulty)
    }

    /// Parses the difficulty first; an invalid one fails before any attempt.
    pub fn generate_named<R: Rng + ?Sized>(&self, rng: &mut R, difficulty: &str) -> Result<Question, GenerateError> {
        let difficulty: Difficulty = difficulty.parse()?;
        self.generate(rng, difficulty)
    }

    pub fn generate_for_family_named<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        family: &str,
        difficulty: &str,
    ) -> Result<Question, GenerateError> {
        let family: PatternFamily = family.parse()?;
        let difficulty: Difficulty = difficulty.parse()?;
        self.generate_for_family(rng, family, difficulty)
    }

    #[instrument(level = "debug", skip(self, rng, fixed), fields(family = ?fixed))]
    fn run<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        fixed: Option<PatternFamily>,
        difficulty: Difficulty,
    ) -> Result<Question, GenerateError> {
        let mut last_rejection = None;

        for attempt in 1..=MAX_GENERATION_ATTEMPTS {
            let family = match fixed {
                Some(f) => f,
                None => self.sample_family(rng, difficulty),
            };

            let question = match builders::build(rng, &self.catalog, family, difficulty) {
                Ok(q) => q,
                Err(e) => {
                    debug!(target: "generator", attempt, %family, error = %e, "Builder rejected candidate");
                    last_rejection = Some(e.to_string());
                    continue;
                }
            };

            match validate(&question) {
                Ok(()) => {
                    debug!(target: "generator", attempt, %family, correct_index = question.correct_index, "Question accepted");
                    return Ok(question);
                }
                Err(e) => {
                    warn!(target: "generator", attempt, %family, error = %e, "Validator rejected candidate");
                    last_rejection = Some(e.to_string());
                }
            }
        }

        error!(
            target: "generator",
            attempts = MAX_GENERATION_ATTEMPTS,
            last_rejection = last_rejection.as_deref().unwrap_or("none"),
            "Generator exhausted"
        );
        Err(GenerateError::Exhausted {
            attempts: MAX_GENERATION_ATTEMPTS,
            last_rejection,
        })
    }
}

/// Generate one question with the built-in generator and a thread-local RNG.
pub fn generate(difficulty: &str) -> Result<Question, GenerateError> {
    Generator::global().generate_named(&mut rand::thread_rng(), difficulty)
}

/// As [`generate`], restricted to one pattern family.
pub fn generate_for_family(family: &str, difficulty: &str) -> Result<Question, GenerateError> {
    Generator::global().generate_for_family_named(&mut rand::thread_rng(), family, difficulty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TierWeights;
    use crate::domain::{AnswerOption, Shape, ShapeKind, Stem};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn tri(rotation: u16) -> Shape {
        Shape::new(ShapeKind::Triangle, rotation)
    }

    #[test]
    fn invalid_difficulty_fails_fast() {
        assert_eq!(
            generate("extreme"),
            Err(GenerateError::InvalidDifficulty("extreme".into()))
        );
        assert!(matches!(
            generate_for_family("SPIRAL", "easy"),
            Err(GenerateError::UnknownFamily(_))
        ));
    }

    #[test]
    fn free_functions_return_validated_questions() {
        for d in ["easy", "medium", "hard"] {
            let q = generate(d).unwrap();
            assert_eq!(q.difficulty.as_str(), d);
            assert_eq!(validate(&q), Ok(()));
        }
    }

    #[test]
    fn easy_odd_one_out_scenario() {
        let mut rng = StdRng::seed_from_u64(2);
        let q = Generator::builtin()
            .generate_for_family(&mut rng, PatternFamily::OddOneOut, Difficulty::Easy)
            .unwrap();
        let Stem::OddOneOut { items } = &q.stem else { panic!("wrong stem") };
        assert_eq!(items.iter().filter(|s| **s == tri(90)).count(), 3);
        assert_eq!(items[q.correct_index], tri(180));
        assert_eq!(q.options[q.correct_index], AnswerOption::Reference { ref_index: q.correct_index });
    }

    #[test]
    fn easy_matrix_scenario() {
        let mut rng = StdRng::seed_from_u64(3);
        let q = Generator::builtin()
            .generate_for_family(&mut rng, PatternFamily::Matrix, Difficulty::Easy)
            .unwrap();
        let Stem::Matrix { missing_cell, .. } = &q.stem else { panic!("wrong stem") };
        assert_eq!(*missing_cell, [0, 2]);
        assert_eq!(q.options[q.correct_index], AnswerOption::Shape(tri(180)));
    }

    #[test]
    fn easy_composition_scenario() {
        let mut rng = StdRng::seed_from_u64(4);
        let q = Generator::builtin()
            .generate_for_family(&mut rng, PatternFamily::Composition, Difficulty::Easy)
            .unwrap();
        let AnswerOption::Composite { composite } = &q.options[q.correct_index] else {
            panic!("not a composite")
        };
        let mut got = composite.clone();
        got.sort();
        assert_eq!(got, vec![tri(0), tri(180)]);
    }

    #[test]
    fn family_mix_tracks_weights() {
        let generator = Generator::builtin();
        let mut rng = StdRng::seed_from_u64(2024);
        let samples = 2000;
        for d in Difficulty::ALL {
            let mut counts: HashMap<PatternFamily, usize> = HashMap::new();
            for _ in 0..samples {
                let q = generator.generate(&mut rng, d).unwrap();
                *counts.entry(q.pattern_family).or_default() += 1;
            }
            for f in PatternFamily::ALL {
                let observed = *counts.get(&f).unwrap_or(&0) as f64 / samples as f64;
                let expected = generator.weights().share(d, f);
                assert!(
                    (observed - expected).abs() <= 0.05,
                    "{d} {f}: observed {observed:.3}, expected {expected:.3}"
                );
            }
        }
    }

    #[test]
    fn zero_weight_family_never_appears() {
        let mut weights = FamilyWeights::default();
        weights.easy = TierWeights::new(0, 1, 0, 0, 0);
        let generator = Generator::new(builtin_catalog(), weights);
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..50 {
            assert_eq!(generator.sample_family(&mut rng, Difficulty::Easy), PatternFamily::OddOneOut);
        }
    }

    #[test]
    fn huge_weights_still_sample() {
        let mut weights = FamilyWeights::default();
        weights.medium = TierWeights::new(u32::MAX, u32::MAX, 0, 0, u32::MAX);
        let generator = Generator::new(builtin_catalog(), weights);
        let mut rng = StdRng::seed_from_u64(13);
        for _ in 0..50 {
            let f = generator.sample_family(&mut rng, Difficulty::Medium);
            assert!(!matches!(f, PatternFamily::Matrix | PatternFamily::Analogy));
        }
    }

    #[test]
    fn all_zero_weights_sample_uniformly() {
        let mut weights = FamilyWeights::default();
        weights.hard = TierWeights::new(0, 0, 0, 0, 0);
        let generator = Generator::new(builtin_catalog(), weights);
        let mut rng = StdRng::seed_from_u64(8);
        let seen: std::collections::HashSet<PatternFamily> =
            (0..200).map(|_| generator.sample_family(&mut rng, Difficulty::Hard)).collect();
        assert_eq!(seen.len(), PatternFamily::ALL.len());
    }

    #[test]
    fn empty_catalog_exhausts() {
        let generator = Generator::new(Arc::new(PatternCatalog::default()), FamilyWeights::default());
        let mut rng = StdRng::seed_from_u64(0);
        match generator.generate(&mut rng, Difficulty::Medium) {
            Err(GenerateError::Exhausted { attempts, last_rejection }) => {
                assert_eq!(attempts, MAX_GENERATION_ATTEMPTS);
                assert!(last_rejection.unwrap().contains("schema"));
            }
            other => panic!("expected exhaustion, got {other:?}"),
        }
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let generator = Generator::builtin();
        let a = generator.generate(&mut StdRng::seed_from_u64(77), Difficulty::Hard).unwrap();
        let b = generator.generate(&mut StdRng::seed_from_u64(77), Difficulty::Hard).unwrap();
        assert_eq!(a, b);
    }
}
