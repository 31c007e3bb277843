//! Domain identifier types for catalog entities, questions, and traits.
//!
//! These types provide type-safe wrappers around the string identifiers used
//! throughout the guessing engine, so an entity name can never be passed
//! where a trait id is expected.

use std::{borrow::Borrow, fmt};

use serde::{Deserialize, Serialize};

/// Unique identifier for a catalog entity (a guessable character).
///
/// Entity ids are the display names from the entity table and are unique
/// within one catalog.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(String);

impl EntityId {
    /// Create a new entity identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use inquest::identifiers::EntityId;
    ///
    /// let entity = EntityId::new("Mario");
    /// assert_eq!(entity.as_str(), "Mario");
    /// ```
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert the identifier into its inner String.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<&str> for EntityId {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialEq<EntityId> for &str {
    fn eq(&self, other: &EntityId) -> bool {
        *self == other.as_str()
    }
}

impl Borrow<str> for EntityId {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Unique identifier for a question in the catalog.
///
/// Questions are what the engine returns from selection; each maps to
/// exactly one trait, but a trait may be covered by several questions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuestionId(String);

impl QuestionId {
    /// Create a new question identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use inquest::identifiers::QuestionId;
    ///
    /// let question = QuestionId::new("q_wears_hat");
    /// assert_eq!(question.as_str(), "q_wears_hat");
    /// ```
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert the identifier into its inner String.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<&str> for QuestionId {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialEq<QuestionId> for &str {
    fn eq(&self, other: &QuestionId) -> bool {
        *self == other.as_str()
    }
}

impl Borrow<str> for QuestionId {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl From<String> for QuestionId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for QuestionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for QuestionId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Unique identifier for a binary trait.
///
/// Trait ids carry a category prefix in the source data (for example
/// `appearance_has_hat`); the catalog resolves the prefix into a typed
/// category at load time. History learning and the RL action space are
/// keyed by trait, not by question.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TraitId(String);

impl TraitId {
    /// Create a new trait identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use inquest::identifiers::TraitId;
    ///
    /// let trait_id = TraitId::new("appearance_has_hat");
    /// assert_eq!(trait_id.as_str(), "appearance_has_hat");
    /// ```
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert the identifier into its inner String.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TraitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<&str> for TraitId {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl PartialEq<TraitId> for &str {
    fn eq(&self, other: &TraitId) -> bool {
        *self == other.as_str()
    }
}

impl Borrow<str> for TraitId {
    fn borrow(&self) -> &str {
        self.as_str()
    }
}

impl From<String> for TraitId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for TraitId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl AsRef<str> for TraitId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
