//! Catalog of guessable entities, their binary traits, and the questions
//! that probe them.
//!
//! The catalog is loaded once at startup from three JSON files and is
//! immutable for the lifetime of the process:
//! - `entities.json`: entities and the traits each one holds
//! - `questions.json`: questions, each tied to exactly one trait
//! - `priors.json` (optional): unnormalized prior weights per entity
//!
//! Loading precomputes a holder bitmap per question so belief updates and
//! question scoring never touch the trait sets on the hot path.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    fs::File,
    io::BufReader,
    path::Path,
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{
    identifiers::{EntityId, QuestionId, TraitId},
    utils::{NormalizationFallback, normalize_weights_with_options},
};

/// File name for the entity table inside a data directory.
pub const ENTITIES_FILE: &str = "entities.json";

/// File name for the question table inside a data directory.
pub const QUESTIONS_FILE: &str = "questions.json";

/// File name for the optional prior weights inside a data directory.
pub const PRIORS_FILE: &str = "priors.json";

/// Semantic grouping of traits, resolved from the trait id prefix at load
/// time so the rest of the engine never inspects raw strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum TraitCategory {
    Source,
    World,
    Setting,
    Identity,
    Role,
    Affiliation,
    Abilities,
    Appearance,
    Personality,
    Franchise,
    Other,
}

impl TraitCategory {
    /// Resolve a category from a trait id such as `appearance_has_hat`.
    ///
    /// The prefix is everything before the first underscore; unrecognised
    /// prefixes fall back to [`TraitCategory::Other`].
    pub fn of_trait(trait_id: &TraitId) -> Self {
        let prefix = trait_id
            .as_str()
            .split('_')
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match prefix.as_str() {
            "source" => TraitCategory::Source,
            "world" => TraitCategory::World,
            "setting" => TraitCategory::Setting,
            "identity" => TraitCategory::Identity,
            "role" => TraitCategory::Role,
            "affiliation" => TraitCategory::Affiliation,
            "ability" | "abilities" => TraitCategory::Abilities,
            "appearance" => TraitCategory::Appearance,
            "personality" => TraitCategory::Personality,
            "franchise" => TraitCategory::Franchise,
            _ => TraitCategory::Other,
        }
    }

    /// Whether this category takes part in the broad opening sweep, the
    /// wide who/what/where questions that carve up the field before detail
    /// questions become worthwhile.
    pub fn is_broad(&self) -> bool {
        !matches!(self, TraitCategory::Franchise | TraitCategory::Other)
    }
}

impl fmt::Display for TraitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TraitCategory::Source => "source",
            TraitCategory::World => "world",
            TraitCategory::Setting => "setting",
            TraitCategory::Identity => "identity",
            TraitCategory::Role => "role",
            TraitCategory::Affiliation => "affiliation",
            TraitCategory::Abilities => "abilities",
            TraitCategory::Appearance => "appearance",
            TraitCategory::Personality => "personality",
            TraitCategory::Franchise => "franchise",
            TraitCategory::Other => "other",
        };
        f.write_str(label)
    }
}

impl FromStr for TraitCategory {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "source" => Ok(TraitCategory::Source),
            "world" => Ok(TraitCategory::World),
            "setting" => Ok(TraitCategory::Setting),
            "identity" => Ok(TraitCategory::Identity),
            "role" => Ok(TraitCategory::Role),
            "affiliation" => Ok(TraitCategory::Affiliation),
            "abilities" => Ok(TraitCategory::Abilities),
            "appearance" => Ok(TraitCategory::Appearance),
            "personality" => Ok(TraitCategory::Personality),
            "franchise" => Ok(TraitCategory::Franchise),
            "other" => Ok(TraitCategory::Other),
            _ => Err(crate::Error::ParseCategory {
                input: s.to_string(),
                expected:
                    "source, world, setting, identity, role, affiliation, abilities, appearance, \
                     personality, franchise, other"
                        .to_string(),
            }),
        }
    }
}

/// Wire format for one entity in `entities.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDef {
    pub id: String,
    pub traits: Vec<String>,
}

/// Wire format for one question in `questions.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionDef {
    pub id: String,
    #[serde(rename = "trait")]
    pub trait_id: String,
    pub text: String,
}

#[derive(Debug, Deserialize)]
struct EntityFile {
    entities: Vec<EntityDef>,
}

#[derive(Debug, Deserialize)]
struct QuestionFile {
    questions: Vec<QuestionDef>,
}

#[derive(Debug, Deserialize)]
struct PriorFile {
    priors: HashMap<String, f64>,
}

/// A guessable entity and the set of traits it holds.
#[derive(Debug, Clone)]
pub struct Entity {
    id: EntityId,
    traits: HashSet<TraitId>,
}

impl Entity {
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn traits(&self) -> &HashSet<TraitId> {
        &self.traits
    }

    pub fn has_trait(&self, trait_id: &TraitId) -> bool {
        self.traits.contains(trait_id)
    }
}

/// A question with its resolved trait, category, and holder bitmap.
#[derive(Debug, Clone)]
pub struct Question {
    id: QuestionId,
    trait_id: TraitId,
    text: String,
    category: TraitCategory,
    holders: Vec<bool>,
    holder_count: usize,
}

impl Question {
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    pub fn trait_id(&self) -> &TraitId {
        &self.trait_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn category(&self) -> TraitCategory {
        self.category
    }

    /// Bitmap over entity indexes: true where the entity holds the trait.
    pub fn holders(&self) -> &[bool] {
        &self.holders
    }

    /// Number of entities in the catalog holding this question's trait.
    pub fn holder_count(&self) -> usize {
        self.holder_count
    }

    /// Share of the catalog holding this question's trait.
    pub fn holder_share(&self, entity_count: usize) -> f64 {
        if entity_count == 0 {
            0.0
        } else {
            self.holder_count as f64 / entity_count as f64
        }
    }
}

/// Immutable catalog shared by every game in a session.
#[derive(Debug, Clone)]
pub struct Catalog {
    entities: Vec<Entity>,
    entity_index: HashMap<EntityId, usize>,
    questions: Vec<Question>,
    question_index: HashMap<QuestionId, usize>,
    trait_index: HashMap<TraitId, usize>,
    priors: Vec<f64>,
}

impl Catalog {
    /// Load a catalog from a data directory using the conventional file names.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::CatalogFileMissing`] if the entity or question
    /// table is absent (both absences reported in one error), plus the
    /// validation errors of [`Catalog::from_parts`]. A missing `priors.json`
    /// is not an error; priors default to uniform.
    pub fn load(data_dir: &Path) -> crate::Result<Self> {
        let entities_path = data_dir.join(ENTITIES_FILE);
        let questions_path = data_dir.join(QUESTIONS_FILE);
        let priors_path = data_dir.join(PRIORS_FILE);

        let missing: Vec<String> = [&entities_path, &questions_path]
            .iter()
            .filter(|path| !path.exists())
            .map(|path| path.display().to_string())
            .collect();
        if !missing.is_empty() {
            return Err(crate::Error::CatalogFileMissing {
                path: missing.join(", "),
            });
        }

        let entities: EntityFile = read_json(&entities_path)?;
        let questions: QuestionFile = read_json(&questions_path)?;
        let priors = if priors_path.exists() {
            let file: PriorFile = read_json(&priors_path)?;
            Some(file.priors)
        } else {
            None
        };

        Self::from_parts(entities.entities, questions.questions, priors)
    }

    /// Build a catalog from already-parsed tables.
    ///
    /// This is the construction path shared by [`Catalog::load`] and tests.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::EmptyCatalog`] if either table is empty
    /// - [`crate::Error::DuplicateId`] on repeated entity or question ids
    ///
    /// Prior entries naming unknown entities are reported on stderr and
    /// skipped; they are data drift, not a reason to refuse startup.
    pub fn from_parts(
        entity_defs: Vec<EntityDef>,
        question_defs: Vec<QuestionDef>,
        prior_weights: Option<HashMap<String, f64>>,
    ) -> crate::Result<Self> {
        if entity_defs.is_empty() {
            return Err(crate::Error::EmptyCatalog {
                table: "entities".to_string(),
            });
        }
        if question_defs.is_empty() {
            return Err(crate::Error::EmptyCatalog {
                table: "questions".to_string(),
            });
        }

        let mut entities = Vec::with_capacity(entity_defs.len());
        let mut entity_index = HashMap::with_capacity(entity_defs.len());
        for def in entity_defs {
            let id = EntityId::new(def.id);
            if entity_index.contains_key(&id) {
                return Err(crate::Error::DuplicateId {
                    kind: "entity",
                    id: id.into_inner(),
                });
            }
            entity_index.insert(id.clone(), entities.len());
            entities.push(Entity {
                id,
                traits: def.traits.into_iter().map(TraitId::new).collect(),
            });
        }

        let mut questions = Vec::with_capacity(question_defs.len());
        let mut question_index = HashMap::with_capacity(question_defs.len());
        let mut trait_index = HashMap::new();
        for def in question_defs {
            let id = QuestionId::new(def.id);
            if question_index.contains_key(&id) {
                return Err(crate::Error::DuplicateId {
                    kind: "question",
                    id: id.into_inner(),
                });
            }
            let trait_id = TraitId::new(def.trait_id);
            let category = TraitCategory::of_trait(&trait_id);

            let holders: Vec<bool> = entities
                .iter()
                .map(|entity| entity.has_trait(&trait_id))
                .collect();
            let holder_count = holders.iter().filter(|held| **held).count();

            question_index.insert(id.clone(), questions.len());
            // First question wins when several probe the same trait.
            trait_index.entry(trait_id.clone()).or_insert(questions.len());
            questions.push(Question {
                id,
                trait_id,
                text: def.text,
                category,
                holders,
                holder_count,
            });
        }

        let priors = build_priors(&entities, &entity_index, prior_weights);

        Ok(Self {
            entities,
            entity_index,
            questions,
            question_index,
            trait_index,
            priors,
        })
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Normalized prior distribution over entities, aligned with entity indexes.
    pub fn priors(&self) -> &[f64] {
        &self.priors
    }

    pub fn entity(&self, index: usize) -> &Entity {
        &self.entities[index]
    }

    pub fn question(&self, index: usize) -> &Question {
        &self.questions[index]
    }

    pub fn entity_ix(&self, id: &EntityId) -> Option<usize> {
        self.entity_index.get(id).copied()
    }

    pub fn question_ix(&self, id: &QuestionId) -> Option<usize> {
        self.question_index.get(id).copied()
    }

    /// Index of the question probing `trait_id`, if any question does.
    pub fn question_ix_for_trait(&self, trait_id: &TraitId) -> Option<usize> {
        self.trait_index.get(trait_id).copied()
    }

    /// Resolve a free-form player-typed name to an entity.
    ///
    /// Matching runs in three passes over lowercased names: exact match,
    /// then substring containment in either direction, then best word
    /// overlap. Returns `None` when nothing overlaps at all.
    pub fn find_entity(&self, query: &str) -> Option<&Entity> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        if let Some(entity) = self
            .entities
            .iter()
            .find(|entity| entity.id.as_str().to_lowercase() == needle)
        {
            return Some(entity);
        }

        if let Some(entity) = self.entities.iter().find(|entity| {
            let name = entity.id.as_str().to_lowercase();
            name.contains(&needle) || needle.contains(&name)
        }) {
            return Some(entity);
        }

        let query_words: HashSet<&str> = needle.split_whitespace().collect();
        self.entities
            .iter()
            .map(|entity| {
                let name = entity.id.as_str().to_lowercase();
                let overlap = name
                    .split_whitespace()
                    .filter(|word| query_words.contains(word))
                    .count();
                (entity, overlap)
            })
            .filter(|(_, overlap)| *overlap > 0)
            .max_by_key(|(_, overlap)| *overlap)
            .map(|(entity, _)| entity)
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> crate::Result<T> {
    let file = File::open(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            crate::Error::CatalogFileMissing {
                path: path.display().to_string(),
            }
        } else {
            crate::Error::Io {
                operation: format!("open catalog file {path:?}"),
                source,
            }
        }
    })?;
    let value = serde_json::from_reader(BufReader::new(file))?;
    Ok(value)
}

fn build_priors(
    entities: &[Entity],
    entity_index: &HashMap<EntityId, usize>,
    prior_weights: Option<HashMap<String, f64>>,
) -> Vec<f64> {
    let mut weights = vec![1.0; entities.len()];

    if let Some(prior_weights) = prior_weights {
        for (name, weight) in prior_weights {
            match entity_index.get(name.as_str()) {
                Some(&index) if weight.is_finite() && weight >= 0.0 => {
                    weights[index] = weight;
                }
                Some(_) => {
                    eprintln!("Warning: ignoring invalid prior weight {weight} for '{name}'");
                }
                None => {
                    eprintln!("Warning: prior entry '{name}' does not match any entity, skipping");
                }
            }
        }
    }

    normalize_weights_with_options(weights, NormalizationFallback::Uniform, None)
        .unwrap_or_default()
}
