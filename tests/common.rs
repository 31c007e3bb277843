//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::Arc;

use inquest::catalog::{Catalog, EntityDef, QuestionDef};

pub fn entity(id: &str, traits: &[&str]) -> EntityDef {
    EntityDef {
        id: id.to_string(),
        traits: traits.iter().map(|t| t.to_string()).collect(),
    }
}

pub fn question(id: &str, trait_id: &str, text: &str) -> QuestionDef {
    QuestionDef {
        id: id.to_string(),
        trait_id: trait_id.to_string(),
        text: text.to_string(),
    }
}

/// Two entities separated by two complementary traits.
pub fn two_entity_catalog() -> Arc<Catalog> {
    Arc::new(
        Catalog::from_parts(
            vec![entity("alpha", &["has_x"]), entity("beta", &["has_y"])],
            vec![
                question("q_x", "has_x", "Does it have X?"),
                question("q_y", "has_y", "Does it have Y?"),
            ],
            None,
        )
        .expect("valid catalog"),
    )
}

/// Eight entities over animal-flavoured traits, fully separable.
pub fn animal_catalog() -> Arc<Catalog> {
    let entities = vec![
        entity("robin", &["world_animal", "abilities_flight", "color_red"]),
        entity("eagle", &["world_animal", "abilities_flight", "size_big"]),
        entity("shark", &["world_animal", "world_aquatic", "size_big"]),
        entity("salmon", &["world_animal", "world_aquatic", "color_red"]),
        entity("tiger", &["world_animal", "size_big", "color_orange"]),
        entity("ant", &["world_animal", "size_tiny"]),
        entity("oak", &["world_plant", "size_big"]),
        entity("moss", &["world_plant", "size_tiny"]),
    ];
    let traits = [
        "world_animal",
        "world_plant",
        "world_aquatic",
        "abilities_flight",
        "size_big",
        "size_tiny",
        "color_red",
        "color_orange",
    ];
    let questions = traits
        .iter()
        .map(|t| question(&format!("q_{t}"), t, &format!("Is it {t}?")))
        .collect();
    Arc::new(Catalog::from_parts(entities, questions, None).expect("valid catalog"))
}
