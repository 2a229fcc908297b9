//! nutribot-text
//!
//! Tantivy-backed food search: one index per variant (`food`, `food_servings`,
//! `food_pieces`), typo-tolerant AND queries over food descriptions and
//! relevance clustering on the primary ingredient of the best hit.

pub mod tantivy_utils;
pub mod query;
pub mod relevance;
pub mod index;
pub mod search;

pub use index::TantivyFoodIndex;
pub use query::clean_query;
pub use relevance::cluster;
