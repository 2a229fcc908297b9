use tantivy::query::{BooleanQuery, BoostQuery, FuzzyTermQuery, Occur, Query, TermQuery};
use tantivy::schema::{Field, IndexRecordOption};
use tantivy::Term;

const ARTICLES: &[&str] = &["con", "coi", "la", "le", "gli", "i", "alle", "all'", "l'"];
const CONTRACTED_ARTICLES: &[&str] = &["all'", "l'"];

/// Drops standalone articles and strips contracted articles glued to the
/// following word (`all'arrabbiata` -> `arrabbiata`).
pub fn clean_query(text: &str) -> String {
	text.split_whitespace()
		.filter(|w| !ARTICLES.contains(&w.to_lowercase().as_str()))
		.map(|w| {
			let lower = w.to_lowercase();
			CONTRACTED_ARTICLES
				.iter()
				.find(|a| lower.starts_with(*a))
				.map_or(w, |a| &w[a.len()..])
		})
		.filter(|w| !w.is_empty())
		.collect::<Vec<_>>()
		.join(" ")
}

/// Edit distance allowed for a term, the "AUTO" fuzziness rule.
pub fn auto_distance(term: &str) -> u8 {
	match term.chars().count() {
		0..=2 => 0,
		3..=5 => 1,
		_ => 2,
	}
}

/// One clause per term, all required. Each clause matches the exact term
/// (BM25 scored) or, at a small fixed weight, any term within the AUTO
/// edit distance.
pub fn build_food_query(field: Field, terms: &[String], fuzzy_boost: f32) -> BooleanQuery {
	let clauses: Vec<(Occur, Box<dyn Query>)> = terms
		.iter()
		.map(|t| {
			let term = Term::from_field_text(field, t);
			let exact: Box<dyn Query> = Box::new(TermQuery::new(term.clone(), IndexRecordOption::WithFreqs));
			let distance = auto_distance(t);
			if distance == 0 {
				return (Occur::Must, exact);
			}
			let fuzzy: Box<dyn Query> = Box::new(BoostQuery::new(Box::new(FuzzyTermQuery::new(term, distance, true)), fuzzy_boost));
			let either: Box<dyn Query> = Box::new(BooleanQuery::new(vec![(Occur::Should, exact), (Occur::Should, fuzzy)]));
			(Occur::Must, either)
		})
		.collect();
	BooleanQuery::new(clauses)
}
