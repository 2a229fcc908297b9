//! Domain types shared by the parser, the search engine and the reply composer.

use serde::{Deserialize, Serialize};

pub type FoodId = String;

/// Size code used for both serving and piece lookups.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SizeBucket {
    Small,
    Medium,
    Large,
}

/// Optional gram (or ml) weights per size.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SizeTable {
    #[serde(default)]
    pub small: Option<u32>,
    #[serde(default)]
    pub medium: Option<u32>,
    #[serde(default)]
    pub large: Option<u32>,
}

impl SizeTable {
    pub fn get(&self, bucket: SizeBucket) -> Option<u32> {
        match bucket {
            SizeBucket::Small => self.small,
            SizeBucket::Medium => self.medium,
            SizeBucket::Large => self.large,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.small.is_none() && self.medium.is_none() && self.large.is_none()
    }
}

/// A food as stored in the repository.
///
/// `ingredients` is ordered; the first entry is the primary ingredient and
/// drives relevance clustering. `see_also` foods are mentioned in replies but
/// never averaged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoodDocument {
    #[serde(default)]
    pub uuid: FoodId,
    pub name: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub liquid: bool,
    #[serde(default)]
    pub servings: SizeTable,
    #[serde(default)]
    pub pieces: SizeTable,
    #[serde(default)]
    pub see_also: bool,
}

impl FoodDocument {
    pub fn primary_ingredient(&self) -> Option<&str> {
        self.ingredients.first().map(String::as_str)
    }

    /// The projection that goes into the search index.
    pub fn search_document(&self) -> SearchDocument {
        SearchDocument {
            uuid: self.uuid.clone(),
            description: self.name.clone(),
            ingredients: self.ingredients.clone(),
        }
    }
}

/// One nutrition measurement, ratios in grams per gram of food.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct NutritionObservation {
    #[serde(default)]
    pub cho_ratio: Option<f64>,
    #[serde(default)]
    pub protein_ratio: Option<f64>,
    #[serde(default)]
    pub fiber_ratio: Option<f64>,
    #[serde(default)]
    pub fat_ratio: Option<f64>,
}

impl NutritionObservation {
    pub fn is_empty(&self) -> bool {
        self.cho_ratio.is_none()
            && self.protein_ratio.is_none()
            && self.fiber_ratio.is_none()
            && self.fat_ratio.is_none()
    }

    /// Multiplies every present ratio by `factor`.
    #[must_use]
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            cho_ratio: self.cho_ratio.map(|v| v * factor),
            protein_ratio: self.protein_ratio.map(|v| v * factor),
            fiber_ratio: self.fiber_ratio.map(|v| v * factor),
            fat_ratio: self.fat_ratio.map(|v| v * factor),
        }
    }
}

/// Document shape stored in the search index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchDocument {
    pub uuid: FoodId,
    pub description: String,
    pub ingredients: Vec<String>,
}

impl SearchDocument {
    pub fn primary_ingredient(&self) -> Option<&str> {
        self.ingredients.first().map(String::as_str)
    }
}

/// A clustered search result.
///
/// `relative_score` is `score / max_score` over the retained cluster, so it
/// lies in (0, 1] and never increases along the result list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: FoodId,
    pub score: f32,
    pub relative_score: f32,
    pub source: SearchDocument,
}

/// Index partition. Variant indexes only hold foods that define the matching
/// size table.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    #[default]
    Base,
    Servings,
    Pieces,
}

impl Variant {
    pub const ALL: [Variant; 3] = [Variant::Base, Variant::Servings, Variant::Pieces];

    pub const BASE_INDEX: &'static str = "food";

    pub fn suffix(self) -> Option<&'static str> {
        match self {
            Variant::Base => None,
            Variant::Servings => Some("servings"),
            Variant::Pieces => Some("pieces"),
        }
    }

    /// `food`, `food_servings`, `food_pieces`, optionally prefixed.
    pub fn index_name(self, prefix: Option<&str>) -> String {
        let base = format!("{}{}", prefix.unwrap_or(""), Self::BASE_INDEX);
        match self.suffix() {
            Some(suffix) => format!("{base}_{suffix}"),
            None => base,
        }
    }
}

/// Administrative operations on an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexCommand {
    /// Create the index if it does not exist.
    Init,
    /// Drop all documents, keeping the index.
    Reset,
    /// Remove the index entirely.
    Delete,
}

/// Relevance parameters for a search query.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct QueryOptions {
    pub min_score: f32,
    pub max_diff: f32,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self { min_score: 0.5, max_diff: 0.3 }
    }
}

/// Structured reading of a user message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParsedIntent {
    pub food_phrase: String,
    pub amount_grams: Option<u32>,
    pub piece_count: Option<u32>,
    pub size_bucket: Option<SizeBucket>,
    pub serving_requested: Option<u32>,
    pub details_requested: bool,
}

impl ParsedIntent {
    pub fn has_quantity(&self) -> bool {
        self.amount_grams.is_some() || self.piece_count.is_some() || self.serving_requested.is_some()
    }
}

/// Mean of one macro-nutrient over all non-null observations.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct MacroStats {
    pub cho: Option<f64>,
    pub protein: Option<f64>,
    pub fiber: Option<f64>,
    pub fat: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct AggregateStats {
    pub means: MacroStats,
    /// `1 - min(cho) / max(cho)`, absent with fewer than two cho values or a zero maximum.
    pub cho_variation: Option<f64>,
}

impl AggregateStats {
    pub fn has_data(&self) -> bool {
        self.means.cho.is_some()
            || self.means.protein.is_some()
            || self.means.fiber.is_some()
            || self.means.fat.is_some()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    pub message: String,
    pub reply: String,
}

/// Append-only exchange history of one conversation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Transcript {
    pub turns: Vec<Turn>,
}

impl Transcript {
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last_reply(&self) -> Option<&str> {
        self.turns.last().map(|t| t.reply.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_names_follow_variant_and_prefix() {
        assert_eq!(Variant::Base.index_name(None), "food");
        assert_eq!(Variant::Servings.index_name(None), "food_servings");
        assert_eq!(Variant::Pieces.index_name(Some("test_")), "test_food_pieces");
    }

    #[test]
    fn size_table_lookup() {
        let t = SizeTable { small: Some(50), medium: None, large: Some(120) };
        assert_eq!(t.get(SizeBucket::Small), Some(50));
        assert_eq!(t.get(SizeBucket::Medium), None);
        assert!(!t.is_empty());
        assert!(SizeTable::default().is_empty());
    }

    #[test]
    fn observation_scaling_keeps_missing_values() {
        let o = NutritionObservation { cho_ratio: Some(0.5), fat_ratio: None, ..Default::default() };
        let s = o.scaled(0.8);
        assert!((s.cho_ratio.unwrap_or_default() - 0.4).abs() < 1e-12);
        assert_eq!(s.fat_ratio, None);
    }
}
