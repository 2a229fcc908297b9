//! Relevance clustering over raw engine hits.
//!
//! 1. hits scoring below `min_score` are dropped;
//! 2. the primary ingredient of the best remaining hit becomes the cluster key
//!    and hits with a different primary ingredient are dropped;
//! 3. `relative_score = score / max_score`, hits below `1 - max_diff` are dropped.

use std::cmp::Ordering;

use nutribot_core::types::{QueryOptions, SearchDocument, SearchHit};

/// Raw engine result before clustering.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
	pub score: f32,
	pub document: SearchDocument,
}

pub fn cluster(mut hits: Vec<ScoredDocument>, options: QueryOptions) -> Vec<SearchHit> {
	hits.retain(|h| h.score >= options.min_score);
	// Stable: equal scores keep engine order.
	hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

	let Some(top) = hits.first() else { return Vec::new() };
	let key = top.document.primary_ingredient().map(str::to_owned);
	let max_score = top.score;
	if max_score <= 0.0 {
		return Vec::new();
	}
	let threshold = 1.0 - options.max_diff;

	hits.into_iter()
		.filter(|h| h.document.primary_ingredient() == key.as_deref())
		.map(|h| (h.score / max_score, h))
		.filter(|(relative, _)| *relative >= threshold)
		.map(|(relative_score, h)| SearchHit { id: h.document.uuid.clone(), score: h.score, relative_score, source: h.document })
		.collect()
}
