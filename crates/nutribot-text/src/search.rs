use tantivy::collector::TopDocs;
use tantivy::TantivyDocument;
use tracing::debug;

use nutribot_core::error::Result;
use nutribot_core::traits::FoodSearch;
use nutribot_core::types::{QueryOptions, SearchHit, Variant};

use crate::index::{engine_err, FoodFields, TantivyFoodIndex};
use crate::query::{build_food_query, clean_query};
use crate::relevance::{cluster, ScoredDocument};
use crate::tantivy_utils::analyze;

impl TantivyFoodIndex {
	/// Unclustered hits for `text`, best first.
	pub fn raw_search(&self, text: &str, variant: Variant) -> Result<Vec<ScoredDocument>> {
		let cleaned = clean_query(text);
		let Some(index) = self.existing(variant)? else {
			debug!(index = %self.index_name(variant), "index missing, no hits");
			return Ok(Vec::new());
		};
		let terms = analyze(&index, &cleaned).map_err(engine_err)?;
		if terms.is_empty() { return Ok(Vec::new()); }

		let fields = FoodFields::resolve(&index.schema())?;
		let query = build_food_query(fields.description, &terms, self.fuzzy_boost);
		let reader = index.reader().map_err(engine_err)?;
		let searcher = reader.searcher();
		let top_docs = searcher.search(&query, &TopDocs::with_limit(self.limit)).map_err(engine_err)?;

		let mut hits = Vec::with_capacity(top_docs.len());
		for (score, address) in top_docs {
			let doc: TantivyDocument = searcher.doc(address).map_err(engine_err)?;
			hits.push(ScoredDocument { score, document: fields.read(&doc) });
		}
		debug!(index = %self.index_name(variant), query = %cleaned, ?terms, hits = hits.len(), "raw search");
		Ok(hits)
	}
}

impl FoodSearch for TantivyFoodIndex {
	fn query(&self, text: &str, variant: Variant, options: QueryOptions) -> Result<Vec<SearchHit>> {
		let hits = cluster(self.raw_search(text, variant)?, options);
		debug!(query = text, ?variant, kept = hits.len(), "clustered search");
		Ok(hits)
	}
}
