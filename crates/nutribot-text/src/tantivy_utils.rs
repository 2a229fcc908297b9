use tantivy::schema::{Schema, TextFieldIndexing, TextOptions, IndexRecordOption, STRING, STORED};
use tantivy::tokenizer::{AsciiFoldingFilter, LowerCaser, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

pub const FOOD_TOKENIZER: &str = "food_text";

pub const UUID_FIELD: &str = "uuid";
pub const DESCRIPTION_FIELD: &str = "description";
pub const INGREDIENTS_FIELD: &str = "ingredients";

/// Italian function words that carry no food identity.
pub const STOP_WORDS: &[&str] = &[
	"a","ad","al","alla","alle","allo","agli","ai","all","con","col","coi","da","dal","dalla","dei","del","della","delle","dello","degli","di","e","ed","il","in","la","le","lo","gli","i","l","nel","nella","per","su","sul","sulla","un","una","uno",
];

pub fn build_schema() -> Schema {
	let mut schema_builder = Schema::builder();
	let _uuid_field = schema_builder.add_text_field(UUID_FIELD, STRING | STORED);
	let description_indexing = TextFieldIndexing::default().set_tokenizer(FOOD_TOKENIZER).set_index_option(IndexRecordOption::WithFreqsAndPositions);
	let description_options = TextOptions::default().set_indexing_options(description_indexing).set_stored();
	let _description_field = schema_builder.add_text_field(DESCRIPTION_FIELD, description_options);
	// Multi-valued, kept verbatim: the first value is the cluster key.
	let _ingredients_field = schema_builder.add_text_field(INGREDIENTS_FIELD, STRING | STORED);
	schema_builder.build()
}

pub fn register_tokenizer(index: &Index) {
	let tokenizer = TextAnalyzer::builder(SimpleTokenizer::default())
		.filter(LowerCaser)
		.filter(AsciiFoldingFilter)
		.filter(StopWordFilter::remove(STOP_WORDS.iter().map(|s| s.to_string())))
		.build();
	index.tokenizers().register(FOOD_TOKENIZER, tokenizer);
}

/// Runs `text` through the description analyzer, returning the indexed terms.
pub fn analyze(index: &Index, text: &str) -> tantivy::Result<Vec<String>> {
	let schema = index.schema();
	let field = schema.get_field(DESCRIPTION_FIELD)?;
	let mut analyzer = index.tokenizer_for_field(field)?;
	let mut stream = analyzer.token_stream(text);
	let mut terms = Vec::new();
	while stream.advance() { terms.push(stream.token().text.clone()); }
	Ok(terms)
}
