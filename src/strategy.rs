//! Declarative weighting rules applied on top of information gain.
//!
//! Raw expected information gain treats every question alike. The strategy
//! table encodes the domain knowledge that makes games feel natural: broad
//! category sweeps early, franchise questions while the field is wide, rare
//! traits when they can clinch a game, and personality trivia kept out of
//! the opening. Rules are plain data, so a config file can reshape the whole
//! policy without touching selection code.

use serde::{Deserialize, Serialize};

use crate::{
    catalog::{Catalog, TraitCategory},
    types::Phase,
};

/// Predicate deciding which questions a [`WeightRule`] applies to.
///
/// Matchers are evaluated once against the catalog when the table is
/// compiled; only the discriminating flag stays dynamic per turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitMatcher {
    /// Every question.
    Any,
    /// Questions whose trait belongs to one category.
    Category(TraitCategory),
    /// Questions whose trait belongs to any of the listed categories.
    AnyCategory(Vec<TraitCategory>),
    /// Questions in a category that takes part in broad opening sweeps.
    BroadCategory,
    /// Questions whose trait id contains any of the given fragments.
    IdContainsAny(Vec<String>),
    /// Questions whose trait is held by exactly this many entities.
    HoldersExactly(usize),
    /// Questions whose trait is held by a count in this inclusive range.
    HoldersBetween(usize, usize),
    /// Questions whose trait is held by more than this share of the catalog.
    HolderShareAbove(f64),
}

impl TraitMatcher {
    fn matches(&self, catalog: &Catalog, question_ix: usize) -> bool {
        let question = catalog.question(question_ix);
        match self {
            TraitMatcher::Any => true,
            TraitMatcher::Category(category) => question.category() == *category,
            TraitMatcher::AnyCategory(categories) => categories.contains(&question.category()),
            TraitMatcher::BroadCategory => question.category().is_broad(),
            TraitMatcher::IdContainsAny(fragments) => fragments
                .iter()
                .any(|fragment| question.trait_id().as_str().contains(fragment.as_str())),
            TraitMatcher::HoldersExactly(count) => question.holder_count() == *count,
            TraitMatcher::HoldersBetween(low, high) => {
                (*low..=*high).contains(&question.holder_count())
            }
            TraitMatcher::HolderShareAbove(share) => {
                question.holder_share(catalog.entity_count()) > *share
            }
        }
    }
}

/// One weighting rule: a matcher, the phases it is active in, an optional
/// discriminating requirement, and the multiplier it contributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightRule {
    /// Phases this rule is active in. Empty means every phase.
    #[serde(default)]
    pub phases: Vec<Phase>,
    /// Which questions the rule applies to.
    pub matches: TraitMatcher,
    /// If set, the question's discriminating flag must equal this value.
    /// A question is discriminating when its trait splits the current top
    /// candidates instead of covering all or none of them.
    #[serde(default)]
    pub requires_discriminating: Option<bool>,
    /// Multiplier contributed when the rule applies. Rules compose
    /// multiplicatively.
    pub multiplier: f64,
}

impl WeightRule {
    fn applies_in(&self, phase: Phase) -> bool {
        self.phases.is_empty() || self.phases.contains(&phase)
    }
}

/// Ordered collection of weighting rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyTable {
    pub rules: Vec<WeightRule>,
}

impl StrategyTable {
    /// Compile the table against a catalog, resolving every matcher into a
    /// per-question bitmap.
    pub fn compile(&self, catalog: &Catalog) -> CompiledStrategy {
        let rules = self
            .rules
            .iter()
            .map(|rule| CompiledRule {
                phases: rule.phases.clone(),
                mask: (0..catalog.question_count())
                    .map(|ix| rule.matches.matches(catalog, ix))
                    .collect(),
                requires_discriminating: rule.requires_discriminating,
                multiplier: rule.multiplier,
            })
            .collect();
        CompiledStrategy { rules }
    }
}

impl Default for StrategyTable {
    /// The stock weighting policy.
    ///
    /// Ordered roughly by intent: phase-shaped boosts first, then rarity
    /// tiers, then the penalty for near-universal traits. The rarity tiers
    /// are disjoint so at most one of them fires per question.
    fn default() -> Self {
        let rule = |phases: &[Phase],
                    matches: TraitMatcher,
                    requires_discriminating: Option<bool>,
                    multiplier: f64| WeightRule {
            phases: phases.to_vec(),
            matches,
            requires_discriminating,
            multiplier,
        };

        StrategyTable {
            rules: vec![
                // Franchise membership collapses the field fastest while it
                // is still wide.
                rule(
                    &[Phase::Early, Phase::Mid],
                    TraitMatcher::Category(TraitCategory::Franchise),
                    None,
                    5.0,
                ),
                // Visual detail questions play well mid-game.
                rule(
                    &[Phase::Mid],
                    TraitMatcher::IdContainsAny(vec!["color".to_string(), "hair".to_string()]),
                    None,
                    4.0,
                ),
                // Broad categories open the game.
                rule(&[Phase::Early], TraitMatcher::BroadCategory, None, 3.0),
                // Late game: ability details that split the survivors.
                rule(
                    &[Phase::Late],
                    TraitMatcher::Category(TraitCategory::Abilities),
                    Some(true),
                    3.0,
                ),
                // Anything that splits the current top candidates is worth
                // extra at any point.
                rule(&[], TraitMatcher::Any, Some(true), 1.8),
                // Personality trivia that does not discriminate wastes the
                // opening questions.
                rule(
                    &[Phase::Early],
                    TraitMatcher::Category(TraitCategory::Personality),
                    Some(false),
                    0.3,
                ),
                // Rarity tiers: near-unique traits can clinch a game.
                rule(&[], TraitMatcher::HoldersExactly(1), None, 3.0),
                rule(&[], TraitMatcher::HoldersExactly(2), None, 2.5),
                rule(&[], TraitMatcher::HoldersExactly(3), None, 2.0),
                rule(&[], TraitMatcher::HoldersBetween(4, 5), None, 1.5),
                // Near-universal traits barely split anything.
                rule(&[], TraitMatcher::HolderShareAbove(0.7), None, 0.5),
            ],
        }
    }
}

/// A strategy table resolved against one catalog.
#[derive(Debug, Clone)]
pub struct CompiledStrategy {
    rules: Vec<CompiledRule>,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    phases: Vec<Phase>,
    mask: Vec<bool>,
    requires_discriminating: Option<bool>,
    multiplier: f64,
}

impl CompiledStrategy {
    /// Combined multiplier for one question in the given phase.
    pub fn multiplier(&self, question_ix: usize, phase: Phase, discriminating: bool) -> f64 {
        let mut combined = 1.0;
        for rule in &self.rules {
            if !rule.applies_in(phase) {
                continue;
            }
            if !rule.mask.get(question_ix).copied().unwrap_or(false) {
                continue;
            }
            if let Some(required) = rule.requires_discriminating
                && discriminating != required
            {
                continue;
            }
            combined *= rule.multiplier;
        }
        combined
    }
}

impl CompiledRule {
    fn applies_in(&self, phase: Phase) -> bool {
        self.phases.is_empty() || self.phases.contains(&phase)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::catalog::{EntityDef, QuestionDef};

    fn catalog() -> Catalog {
        let entity = |id: &str, traits: &[&str]| EntityDef {
            id: id.to_string(),
            traits: traits.iter().map(|t| t.to_string()).collect(),
        };
        let question = |id: &str, trait_id: &str| QuestionDef {
            id: id.to_string(),
            trait_id: trait_id.to_string(),
            text: String::new(),
        };
        Catalog::from_parts(
            vec![
                entity("A", &["franchise_mario", "source_video_game", "appearance_hair_red"]),
                entity("B", &["source_video_game", "personality_cheerful"]),
                entity("C", &["source_video_game"]),
                entity("D", &["source_video_game"]),
            ],
            vec![
                question("q_franchise", "franchise_mario"),
                question("q_source", "source_video_game"),
                question("q_hair", "appearance_hair_red"),
                question("q_personality", "personality_cheerful"),
            ],
            Some(HashMap::new()),
        )
        .unwrap()
    }

    #[test]
    fn test_franchise_boost_early_and_mid_only() {
        let compiled = StrategyTable::default().compile(&catalog());
        // q_franchise: franchise x5, holders exactly 1 -> x3
        assert!((compiled.multiplier(0, Phase::Early, false) - 15.0).abs() < 1e-9);
        assert!((compiled.multiplier(0, Phase::Mid, false) - 15.0).abs() < 1e-9);
        // Late phase keeps only the rarity tier.
        assert!((compiled.multiplier(0, Phase::Late, false) - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_universal_trait_is_penalized() {
        let compiled = StrategyTable::default().compile(&catalog());
        // q_source: held by 4/4 entities, so the universality penalty (x0.5)
        // fires. In this tiny catalog the 4-5 holder rarity tier (x1.5) also
        // matches. Early adds the broad sweep (x3): 3 * 1.5 * 0.5.
        assert!((compiled.multiplier(1, Phase::Early, false) - 2.25).abs() < 1e-9);
        assert!((compiled.multiplier(1, Phase::Late, false) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_hair_boost_is_mid_phase() {
        let compiled = StrategyTable::default().compile(&catalog());
        // q_hair: broad category (appearance), holders exactly 1 -> x3.
        // Early: 3 (broad) * 3 (rarity); mid adds the x4 visual boost.
        assert!((compiled.multiplier(2, Phase::Early, false) - 9.0).abs() < 1e-9);
        assert!((compiled.multiplier(2, Phase::Mid, false) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_discriminating_flag_gates_rules() {
        let compiled = StrategyTable::default().compile(&catalog());
        // Discriminating questions pick up the x1.8 bonus on top of the rest.
        let plain = compiled.multiplier(0, Phase::Early, false);
        let discriminating = compiled.multiplier(0, Phase::Early, true);
        assert!((discriminating / plain - 1.8).abs() < 1e-9);

        // Early non-discriminating personality trivia is pushed down:
        // broad x3, rarity(1) x3, penalty x0.3.
        let personality = compiled.multiplier(3, Phase::Early, false);
        assert!((personality - 2.7).abs() < 1e-9);
        // The penalty lifts as soon as the question discriminates.
        let personality_disc = compiled.multiplier(3, Phase::Early, true);
        assert!((personality_disc - 16.2).abs() < 1e-9);
    }

    #[test]
    fn test_table_round_trips_through_json() {
        let table = StrategyTable::default();
        let json = serde_json::to_string(&table).unwrap();
        let restored: StrategyTable = serde_json::from_str(&json).unwrap();
        assert_eq!(table, restored);
    }
}
