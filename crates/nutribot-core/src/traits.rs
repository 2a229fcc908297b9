use crate::error::Result;
use crate::types::{FoodDocument, IndexCommand, NutritionObservation, QueryOptions, SearchDocument, SearchHit, Transcript, Variant};

/// Read side of the search collaborator.
///
/// Implementations return hits already filtered by `min_score`, clustered on
/// the top hit's primary ingredient and cut at `1 - max_diff` relative score.
/// A missing or empty index yields an empty list.
pub trait FoodSearch: Send + Sync {
    fn query(&self, text: &str, variant: Variant, options: QueryOptions) -> Result<Vec<SearchHit>>;
}

/// Write side of the search collaborator.
pub trait FoodIndexer: Send + Sync {
    /// Indexes `document`, replacing any document with the same uuid.
    fn add(&self, document: &SearchDocument, variant: Variant) -> Result<()>;
    fn delete(&self, id: &str, variant: Variant) -> Result<()>;
    fn manage(&self, command: IndexCommand, variant: Variant) -> Result<()>;
}

pub trait FoodRepository: Send + Sync {
    fn get_by_uuid(&self, id: &str) -> Result<FoodDocument>;
    fn list_observations(&self, food_id: &str) -> Result<Vec<NutritionObservation>>;
}

/// Per-conversation exchange history.
pub trait TranscriptStore: Send + Sync {
    fn append(&self, conversation_id: &str, message: &str, reply: &str) -> Result<()>;
    /// Unknown conversations yield an empty transcript.
    fn get(&self, conversation_id: &str) -> Result<Transcript>;
}
