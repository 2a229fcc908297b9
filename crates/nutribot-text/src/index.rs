use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use tantivy::schema::{Field, Schema, Value};
use tantivy::{Index, IndexWriter, TantivyDocument, Term};
use tracing::{debug, info};

use nutribot_core::error::{Error, Result};
use nutribot_core::traits::FoodIndexer;
use nutribot_core::types::{FoodDocument, IndexCommand, SearchDocument, Variant};

use crate::tantivy_utils::{build_schema, register_tokenizer, DESCRIPTION_FIELD, INGREDIENTS_FIELD, UUID_FIELD};

const WRITER_MEMORY_BUDGET: usize = 50_000_000;

pub(crate) fn engine_err(e: impl std::fmt::Display) -> Error {
	Error::unavailable("search", e)
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> Error {
	Error::Operation("search index registry lock poisoned".to_string())
}

/// Resolved schema fields of a food index.
pub(crate) struct FoodFields {
	pub uuid: Field,
	pub description: Field,
	pub ingredients: Field,
}

impl FoodFields {
	pub fn resolve(schema: &Schema) -> Result<Self> {
		Ok(Self {
			uuid: schema.get_field(UUID_FIELD).map_err(engine_err)?,
			description: schema.get_field(DESCRIPTION_FIELD).map_err(engine_err)?,
			ingredients: schema.get_field(INGREDIENTS_FIELD).map_err(engine_err)?,
		})
	}

	pub fn read(&self, doc: &TantivyDocument) -> SearchDocument {
		let text = |field| doc.get_first(field).and_then(|v| v.as_str()).unwrap_or("").to_string();
		SearchDocument {
			uuid: text(self.uuid),
			description: text(self.description),
			ingredients: doc.get_all(self.ingredients).filter_map(|v| v.as_str().map(str::to_string)).collect(),
		}
	}

	fn write(&self, document: &SearchDocument) -> TantivyDocument {
		let mut doc = TantivyDocument::default();
		doc.add_text(self.uuid, &document.uuid);
		doc.add_text(self.description, &document.description);
		for ingredient in &document.ingredients { doc.add_text(self.ingredients, ingredient); }
		doc
	}
}

/// The variants a food is indexed under: always the base index, plus the
/// serving and piece partitions when the matching size table is populated.
pub fn variants_for(food: &FoodDocument) -> Vec<Variant> {
	let mut variants = vec![Variant::Base];
	if !food.servings.is_empty() { variants.push(Variant::Servings); }
	if !food.pieces.is_empty() { variants.push(Variant::Pieces); }
	variants
}

/// Search documents grouped by the variant indexes they belong to, in catalog order.
pub fn variant_batches(foods: &[FoodDocument]) -> HashMap<Variant, Vec<SearchDocument>> {
	let mut batches: HashMap<Variant, Vec<SearchDocument>> = HashMap::new();
	for food in foods {
		for variant in variants_for(food) { batches.entry(variant).or_default().push(food.search_document()); }
	}
	batches
}

/// Food search indexes, one tantivy index per variant.
///
/// With a root directory each index lives under `<root>/<index name>`;
/// otherwise indexes are kept in RAM for the lifetime of the value.
pub struct TantivyFoodIndex {
	root: Option<PathBuf>,
	prefix: Option<String>,
	pub(crate) fuzzy_boost: f32,
	pub(crate) limit: usize,
	indexes: RwLock<HashMap<Variant, Index>>,
}

impl TantivyFoodIndex {
	pub fn open(root: PathBuf, prefix: Option<String>) -> Result<Self> {
		std::fs::create_dir_all(&root).map_err(engine_err)?;
		Ok(Self::with_root(Some(root), prefix))
	}

	pub fn in_memory(prefix: Option<String>) -> Self {
		Self::with_root(None, prefix)
	}

	fn with_root(root: Option<PathBuf>, prefix: Option<String>) -> Self {
		Self { root, prefix, fuzzy_boost: 0.1, limit: 50, indexes: RwLock::new(HashMap::new()) }
	}

	#[must_use]
	pub fn with_fuzzy_boost(mut self, fuzzy_boost: f32) -> Self { self.fuzzy_boost = fuzzy_boost; self }

	#[must_use]
	pub fn with_limit(mut self, limit: usize) -> Self { self.limit = limit.max(1); self }

	pub fn index_name(&self, variant: Variant) -> String {
		variant.index_name(self.prefix.as_deref())
	}

	fn index_path(&self, variant: Variant) -> Option<PathBuf> {
		self.root.as_ref().map(|r| r.join(self.index_name(variant)))
	}

	/// The index for `variant` if it exists, opening it from disk on first use.
	pub(crate) fn existing(&self, variant: Variant) -> Result<Option<Index>> {
		if let Some(index) = self.indexes.read().map_err(poisoned)?.get(&variant) {
			return Ok(Some(index.clone()));
		}
		let Some(path) = self.index_path(variant).filter(|p| p.join("meta.json").exists()) else { return Ok(None) };
		let index = Index::open_in_dir(&path).map_err(engine_err)?;
		register_tokenizer(&index);
		debug!(index = %self.index_name(variant), "opened index");
		let mut indexes = self.indexes.write().map_err(poisoned)?;
		Ok(Some(indexes.entry(variant).or_insert(index).clone()))
	}

	fn ensure(&self, variant: Variant) -> Result<Index> {
		if let Some(index) = self.existing(variant)? { return Ok(index); }
		let index = match self.index_path(variant) {
			Some(path) => {
				std::fs::create_dir_all(&path).map_err(engine_err)?;
				Index::create_in_dir(&path, build_schema()).map_err(engine_err)?
			}
			None => Index::create_in_ram(build_schema()),
		};
		register_tokenizer(&index);
		info!(index = %self.index_name(variant), "created index");
		let mut indexes = self.indexes.write().map_err(poisoned)?;
		Ok(indexes.entry(variant).or_insert(index).clone())
	}

	/// Upserts a batch of documents with a single commit.
	pub fn add_batch(&self, documents: &[SearchDocument], variant: Variant) -> Result<usize> {
		let index = self.ensure(variant)?;
		let fields = FoodFields::resolve(&index.schema())?;
		let mut writer: IndexWriter = index.writer(WRITER_MEMORY_BUDGET).map_err(engine_err)?;
		for document in documents {
			writer.delete_term(Term::from_field_text(fields.uuid, &document.uuid));
			writer.add_document(fields.write(document)).map_err(engine_err)?;
		}
		writer.commit().map_err(engine_err)?;
		debug!(index = %self.index_name(variant), count = documents.len(), "documents indexed");
		Ok(documents.len())
	}

	/// Indexes every food under the variants it qualifies for.
	/// Returns the number of documents written per variant.
	pub fn index_foods(&self, foods: &[FoodDocument]) -> Result<HashMap<Variant, usize>> {
		let mut counts = HashMap::new();
		for (variant, documents) in variant_batches(foods) {
			counts.insert(variant, self.add_batch(&documents, variant)?);
		}
		Ok(counts)
	}

	/// Number of live documents, zero for a missing index.
	pub fn num_docs(&self, variant: Variant) -> Result<u64> {
		let Some(index) = self.existing(variant)? else { return Ok(0) };
		let reader = index.reader().map_err(engine_err)?;
		Ok(reader.searcher().num_docs())
	}
}

impl FoodIndexer for TantivyFoodIndex {
	fn add(&self, document: &SearchDocument, variant: Variant) -> Result<()> {
		self.add_batch(std::slice::from_ref(document), variant).map(|_| ())
	}

	fn delete(&self, id: &str, variant: Variant) -> Result<()> {
		let Some(index) = self.existing(variant)? else { return Ok(()) };
		let fields = FoodFields::resolve(&index.schema())?;
		let mut writer: IndexWriter = index.writer(WRITER_MEMORY_BUDGET).map_err(engine_err)?;
		writer.delete_term(Term::from_field_text(fields.uuid, id));
		writer.commit().map_err(engine_err)?;
		debug!(index = %self.index_name(variant), id, "document deleted");
		Ok(())
	}

	fn manage(&self, command: IndexCommand, variant: Variant) -> Result<()> {
		match command {
			IndexCommand::Init => self.ensure(variant).map(|_| ()),
			IndexCommand::Reset => {
				let index = self.ensure(variant)?;
				let mut writer: IndexWriter = index.writer(WRITER_MEMORY_BUDGET).map_err(engine_err)?;
				writer.delete_all_documents().map_err(engine_err)?;
				writer.commit().map_err(engine_err)?;
				info!(index = %self.index_name(variant), "index reset");
				Ok(())
			}
			IndexCommand::Delete => {
				self.indexes.write().map_err(poisoned)?.remove(&variant);
				if let Some(path) = self.index_path(variant).filter(|p| p.exists()) {
					std::fs::remove_dir_all(&path).map_err(engine_err)?;
				}
				info!(index = %self.index_name(variant), "index deleted");
				Ok(())
			}
		}
	}
}
