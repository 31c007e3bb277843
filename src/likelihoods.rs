//! Calibrated per-entity answer likelihoods.
//!
//! The fixed likelihood pairs in [`AnswerModel`] treat every entity-trait
//! edge identically. This module refines them: each (entity, question)
//! cell carries a Beta distribution over "the player answers yes here",
//! seeded from the catalog and sharpened by finished games where the true
//! character is known. The posterior means feed the belief update as
//! per-entity yes-probabilities.
//!
//! [`AnswerModel`]: crate::types::AnswerModel

use serde::{Deserialize, Serialize};
use statrs::function::gamma::{digamma, ln_gamma};

use crate::{
    Result,
    catalog::Catalog,
    error::Error,
    identifiers::{EntityId, QuestionId},
    types::Answer,
};

/// Pseudo-count mass backing the catalog's claim about a trait edge.
///
/// A holder cell starts at Beta(9, 1), mean 0.9; a non-holder cell at
/// Beta(1, 9), mean 0.1. One contradicting answer moves the mean
/// noticeably without erasing the prior.
const SEED_STRONG: f64 = 9.0;
const SEED_WEAK: f64 = 1.0;

/// Beta distribution parameters for one entity-question cell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaParams {
    pub alpha: f64,
    pub beta: f64,
}

impl BetaParams {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }
    }

    /// Expected yes-probability.
    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    /// Fold in one graded answer of the given strength and weight.
    pub fn observe(&mut self, strength: f64, weight: f64) {
        self.alpha += weight * strength;
        self.beta += weight * (1.0 - strength);
    }

    /// Differential entropy in nats. Lower means more settled.
    pub fn entropy(&self) -> f64 {
        let (a, b) = (self.alpha, self.beta);
        let ln_beta_fn = ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b);
        ln_beta_fn - (a - 1.0) * digamma(a) - (b - 1.0) * digamma(b)
            + (a + b - 2.0) * digamma(a + b)
    }
}

/// Per-entity yes-probabilities for every question, learned from games.
///
/// Cells are stored row-major by entity, matching the catalog's index
/// order, so lookups are plain arithmetic on the hot path.
#[derive(Debug, Clone)]
pub struct CalibrationMap {
    cells: Vec<BetaParams>,
    entity_count: usize,
    question_count: usize,
}

impl CalibrationMap {
    /// Seed a fresh map from the catalog's trait edges.
    pub fn seeded(catalog: &Catalog) -> Self {
        let entity_count = catalog.entity_count();
        let question_count = catalog.question_count();
        let mut cells = Vec::with_capacity(entity_count * question_count);

        for entity_ix in 0..entity_count {
            for question_ix in 0..question_count {
                let holds = catalog.question(question_ix).holders()[entity_ix];
                cells.push(if holds {
                    BetaParams::new(SEED_STRONG, SEED_WEAK)
                } else {
                    BetaParams::new(SEED_WEAK, SEED_STRONG)
                });
            }
        }

        Self {
            cells,
            entity_count,
            question_count,
        }
    }

    fn cell_index(&self, entity_ix: usize, question_ix: usize) -> usize {
        entity_ix * self.question_count + question_ix
    }

    pub fn cell(&self, entity_ix: usize, question_ix: usize) -> &BetaParams {
        &self.cells[self.cell_index(entity_ix, question_ix)]
    }

    /// Posterior mean yes-probability for one cell.
    pub fn mean(&self, entity_ix: usize, question_ix: usize) -> f64 {
        self.cell(entity_ix, question_ix).mean()
    }

    /// Yes-probability column for one question, in entity index order.
    pub fn yes_probabilities(&self, question_ix: usize) -> Vec<f64> {
        (0..self.entity_count)
            .map(|entity_ix| self.mean(entity_ix, question_ix))
            .collect()
    }

    /// Fold one graded answer into a cell.
    pub fn observe(&mut self, entity_ix: usize, question_ix: usize, strength: f64, weight: f64) {
        let index = self.cell_index(entity_ix, question_ix);
        self.cells[index].observe(strength, weight);
    }

    /// Absorb a finished game where the true entity is known.
    ///
    /// Every asked question updates the true entity's cell with the
    /// answer's strength at unit weight. Unknown answers count as 0.5,
    /// drifting the cell gently toward indifference.
    pub fn learn_from_game(&mut self, entity_ix: usize, asked: &[(usize, Answer)]) {
        for &(question_ix, answer) in asked {
            self.observe(entity_ix, question_ix, answer.strength(), 1.0);
        }
    }

    /// The `k` least-settled cells, ranked by descending Beta entropy.
    ///
    /// These are the entity-question edges the system knows least about,
    /// useful for deciding where more game data would help.
    pub fn least_settled(&self, k: usize) -> Vec<(usize, usize, f64)> {
        let mut ranked: Vec<(usize, usize, f64)> = (0..self.entity_count)
            .flat_map(|entity_ix| {
                (0..self.question_count).map(move |question_ix| (entity_ix, question_ix))
            })
            .map(|(entity_ix, question_ix)| {
                (
                    entity_ix,
                    question_ix,
                    self.cell(entity_ix, question_ix).entropy(),
                )
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.2.partial_cmp(&a.2)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
                .then(a.1.cmp(&b.1))
        });
        ranked.truncate(k);
        ranked
    }

    pub fn entity_count(&self) -> usize {
        self.entity_count
    }

    pub fn question_count(&self) -> usize {
        self.question_count
    }
}

/// Versioned snapshot of a calibration map.
///
/// Cells are stored row-major with the id lists they were built against,
/// so a snapshot taken with one catalog is rejected rather than silently
/// misapplied to another.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedCalibration {
    pub version: u32,
    entities: Vec<EntityId>,
    questions: Vec<QuestionId>,
    alphas: Vec<f64>,
    betas: Vec<f64>,
}

impl SavedCalibration {
    pub const VERSION: u32 = 1;

    /// Capture a calibration map together with the catalog ids it indexes.
    pub fn from_map(map: &CalibrationMap, catalog: &Catalog) -> Self {
        Self {
            version: Self::VERSION,
            entities: catalog
                .entities()
                .iter()
                .map(|entity| entity.id().clone())
                .collect(),
            questions: catalog
                .questions()
                .iter()
                .map(|question| question.id().clone())
                .collect(),
            alphas: map.cells.iter().map(|cell| cell.alpha).collect(),
            betas: map.cells.iter().map(|cell| cell.beta).collect(),
        }
    }

    /// Rebuild the map, verifying the snapshot matches the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedSnapshotVersion`] for snapshots from
    /// an incompatible release and [`Error::InvalidConfiguration`] when
    /// the id lists no longer line up with the catalog.
    pub fn into_map(self, catalog: &Catalog) -> Result<CalibrationMap> {
        if self.version != Self::VERSION {
            return Err(Error::UnsupportedSnapshotVersion {
                found: self.version,
                expected: Self::VERSION,
            });
        }

        let ids_match = self.entities.len() == catalog.entity_count()
            && self.questions.len() == catalog.question_count()
            && self
                .entities
                .iter()
                .zip(catalog.entities())
                .all(|(saved, entity)| saved == entity.id())
            && self
                .questions
                .iter()
                .zip(catalog.questions())
                .all(|(saved, question)| saved == question.id());
        if !ids_match || self.alphas.len() != self.entities.len() * self.questions.len() {
            return Err(Error::InvalidConfiguration {
                message: "calibration snapshot does not match the loaded catalog".to_string(),
            });
        }

        Ok(CalibrationMap {
            cells: self
                .alphas
                .iter()
                .zip(&self.betas)
                .map(|(&alpha, &beta)| BetaParams::new(alpha, beta))
                .collect(),
            entity_count: self.entities.len(),
            question_count: self.questions.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};
    use rand_distr::{Beta as BetaSampler, Distribution};
    use statrs::distribution::{Beta as BetaDensity, Continuous};

    use super::*;
    use crate::catalog::{EntityDef, QuestionDef};

    fn catalog() -> Catalog {
        Catalog::from_parts(
            vec![
                EntityDef {
                    id: "holder".to_string(),
                    traits: vec!["color_red".to_string()],
                },
                EntityDef {
                    id: "other".to_string(),
                    traits: vec![],
                },
            ],
            vec![QuestionDef {
                id: "q_red".to_string(),
                trait_id: "color_red".to_string(),
                text: "Red?".to_string(),
            }],
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_seeding_reflects_catalog_edges() {
        let map = CalibrationMap::seeded(&catalog());
        assert!((map.mean(0, 0) - 0.9).abs() < 1e-9);
        assert!((map.mean(1, 0) - 0.1).abs() < 1e-9);
        assert_eq!(map.yes_probabilities(0), vec![map.mean(0, 0), map.mean(1, 0)]);
    }

    #[test]
    fn test_observe_moves_the_mean() {
        let mut map = CalibrationMap::seeded(&catalog());

        // A confident yes on a holder cell: Beta(9,1) -> Beta(10,1).
        map.observe(0, 0, 1.0, 1.0);
        assert!((map.mean(0, 0) - 10.0 / 11.0).abs() < 1e-9);

        // A graded answer splits its weight across both counts.
        map.observe(1, 0, 0.75, 1.0);
        let cell = map.cell(1, 0);
        assert!((cell.alpha - 1.75).abs() < 1e-9);
        assert!((cell.beta - 9.25).abs() < 1e-9);
    }

    #[test]
    fn test_learn_from_game_uses_answer_strengths() {
        let mut map = CalibrationMap::seeded(&catalog());
        map.learn_from_game(0, &[(0, Answer::ProbablyNo)]);

        let cell = map.cell(0, 0);
        assert!((cell.alpha - 9.25).abs() < 1e-9);
        assert!((cell.beta - 1.75).abs() < 1e-9);
    }

    #[test]
    fn test_entropy_ranks_uniform_above_peaked() {
        let uniform = BetaParams::new(1.0, 1.0);
        let peaked = BetaParams::new(9.0, 1.0);
        assert!(uniform.entropy().abs() < 1e-9);
        assert!(peaked.entropy() < uniform.entropy());
    }

    #[test]
    fn test_entropy_matches_monte_carlo_estimate() {
        let params = BetaParams::new(3.2, 1.7);
        let analytic = params.entropy();

        let mut rng = StdRng::seed_from_u64(42);
        let sampler = BetaSampler::new(3.2, 1.7).expect("beta parameters valid");
        let density = BetaDensity::new(3.2, 1.7).expect("beta parameters valid");

        let samples = 50_000;
        let mut mc = 0.0;
        for _ in 0..samples {
            let draw: f64 = sampler.sample(&mut rng);
            mc -= density.ln_pdf(draw);
        }
        mc /= samples as f64;

        assert!(
            (mc - analytic).abs() < 1e-2,
            "Monte Carlo entropy ({mc}) should match analytic value ({analytic})"
        );
    }

    #[test]
    fn test_least_settled_prefers_unobserved_cells() {
        let mut map = CalibrationMap::seeded(&catalog());
        for _ in 0..20 {
            map.observe(0, 0, 1.0, 1.0);
        }

        // Both seeded cells are Beta(9,1)/Beta(1,9) and tie; the heavily
        // observed cell has sharpened and drops out of the top spot.
        let ranked = map.least_settled(1);
        assert_eq!(ranked.len(), 1);
        assert_ne!((ranked[0].0, ranked[0].1), (0, 0));
    }

    #[test]
    fn test_snapshot_roundtrip_and_mismatch() {
        let catalog = catalog();
        let mut map = CalibrationMap::seeded(&catalog);
        map.observe(0, 0, 1.0, 2.0);

        let saved = SavedCalibration::from_map(&map, &catalog);
        let bytes = rmp_serde::to_vec(&saved).unwrap();
        let loaded: SavedCalibration = rmp_serde::from_slice(&bytes).unwrap();
        let restored = loaded.into_map(&catalog).unwrap();
        assert!((restored.mean(0, 0) - map.mean(0, 0)).abs() < 1e-12);

        // A snapshot from a different catalog is rejected.
        let other_catalog = Catalog::from_parts(
            vec![EntityDef {
                id: "someone_else".to_string(),
                traits: vec!["color_red".to_string()],
            }],
            vec![QuestionDef {
                id: "q_red".to_string(),
                trait_id: "color_red".to_string(),
                text: String::new(),
            }],
            None,
        )
        .unwrap();
        let saved = SavedCalibration::from_map(&map, &catalog);
        assert!(matches!(
            saved.into_map(&other_catalog),
            Err(Error::InvalidConfiguration { .. })
        ));

        // Version skew is caught before any shape checks.
        let mut saved = SavedCalibration::from_map(&map, &catalog);
        saved.version = 9;
        assert!(matches!(
            saved.into_map(&catalog),
            Err(Error::UnsupportedSnapshotVersion { found: 9, .. })
        ));
    }
}
