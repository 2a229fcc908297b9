use nutribot_core::traits::{FoodIndexer, FoodSearch};
use nutribot_core::types::{FoodDocument, IndexCommand, QueryOptions, SizeTable, Variant};
use nutribot_text::index::{variant_batches, variants_for};
use nutribot_text::TantivyFoodIndex;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn food(uuid: &str, name: &str, ingredients: &[&str]) -> FoodDocument {
    FoodDocument {
        uuid: uuid.to_string(),
        name: name.to_string(),
        ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
        liquid: false,
        servings: SizeTable::default(),
        pieces: SizeTable::default(),
        see_also: false,
    }
}

fn catalog() -> Vec<FoodDocument> {
    let mut arancini = food("arancini", "Arancini di riso", &["riso", "carne"]);
    arancini.pieces = SizeTable { small: None, medium: Some(120), large: None };
    let mut pasta = food("pasta-pomodoro", "Pasta al pomodoro", &["pasta", "pomodoro"]);
    pasta.servings = SizeTable { small: Some(60), medium: Some(80), large: Some(120) };
    vec![
        food("caprese", "Insalata caprese", &["mozzarella", "pomodoro", "basilico"]),
        food("riso-classica", "Insalata di riso classica", &["riso", "tonno"]),
        food("riso-vegetariana", "Insalata di riso vegetariana", &["riso", "verdure"]),
        food("riso-pollo", "Insalata di riso con pollo", &["riso", "pollo"]),
        arancini,
        pasta,
        food("pasta-arrabbiata", "Pasta all'arrabbiata", &["pasta", "peperoncino"]),
        food("cornflakes", "Cornflakes", &["mais"]),
    ]
}

fn loaded_index() -> TantivyFoodIndex {
    let index = TantivyFoodIndex::in_memory(Some("test_".to_string()));
    index.index_foods(&catalog()).expect("index foods");
    index
}

fn any_score(max_diff: f32) -> QueryOptions {
    QueryOptions { min_score: 0.0, max_diff }
}

fn ids(hits: &[nutribot_core::types::SearchHit]) -> Vec<&str> {
    hits.iter().map(|h| h.id.as_str()).collect()
}

#[test]
fn exact_name_matches_one_food() {
    let index = loaded_index();
    let hits = index.query("insalata caprese", Variant::Base, any_score(0.3)).expect("query");
    assert_eq!(ids(&hits), vec!["caprese"]);
    assert!((hits[0].relative_score - 1.0).abs() < f32::EPSILON);
    assert_eq!(hits[0].source.ingredients[0], "mozzarella");
}

#[test]
fn unknown_food_has_no_hits() {
    let index = loaded_index();
    let hits = index.query("girasole", Variant::Base, any_score(0.3)).expect("query");
    assert!(hits.is_empty());
}

#[test]
fn all_terms_are_required() {
    let index = loaded_index();
    let hits = index.query("insalata di riso", Variant::Base, any_score(1.0)).expect("query");
    let mut found = ids(&hits);
    found.sort_unstable();
    assert_eq!(found, vec!["riso-classica", "riso-pollo", "riso-vegetariana"]);
    assert!(hits.iter().all(|h| h.source.ingredients[0] == "riso"));
}

#[test]
fn cluster_follows_the_best_hit() {
    let index = loaded_index();
    let hits = index.query("insalata", Variant::Base, any_score(1.0)).expect("query");
    assert_eq!(ids(&hits), vec!["caprese"]);
}

#[test]
fn typos_are_tolerated() {
    let index = loaded_index();
    let hits = index.query("insalata caprse", Variant::Base, any_score(0.3)).expect("query");
    assert_eq!(ids(&hits), vec!["caprese"]);
}

#[test]
fn articles_do_not_block_matches() {
    let index = loaded_index();
    let hits = index.query("pasta all'arrabbiata", Variant::Base, any_score(0.3)).expect("query");
    assert_eq!(ids(&hits), vec!["pasta-arrabbiata"]);
}

#[test]
fn variants_only_hold_foods_with_sizes() {
    let index = loaded_index();
    assert_eq!(index.num_docs(Variant::Base).expect("base"), 8);
    assert_eq!(index.num_docs(Variant::Servings).expect("servings"), 1);
    assert_eq!(index.num_docs(Variant::Pieces).expect("pieces"), 1);

    let hits = index.query("pasta", Variant::Servings, any_score(1.0)).expect("query");
    assert_eq!(ids(&hits), vec!["pasta-pomodoro"]);
    assert_eq!(variants_for(&catalog()[4]), vec![Variant::Base, Variant::Pieces]);
}

#[test]
fn batches_group_documents_by_variant() {
    let batches = variant_batches(&catalog());
    let uuids = |variant| batches[&variant].iter().map(|d| d.uuid.as_str()).collect::<Vec<_>>();
    assert_eq!(batches.len(), 3);
    assert_eq!(uuids(Variant::Base).len(), 8);
    assert_eq!(uuids(Variant::Base)[0], "caprese");
    assert_eq!(uuids(Variant::Servings), vec!["pasta-pomodoro"]);
    assert_eq!(uuids(Variant::Pieces), vec!["arancini"]);
    assert_eq!(batches[&Variant::Pieces][0].ingredients, vec!["riso".to_string(), "carne".to_string()]);
}

#[test]
fn missing_index_is_empty_not_an_error() {
    let index = TantivyFoodIndex::in_memory(None);
    let hits = index.query("pasta", Variant::Pieces, QueryOptions::default()).expect("query");
    assert!(hits.is_empty());
}

#[test]
fn add_replaces_and_delete_removes() {
    let index = loaded_index();
    let mut renamed = food("caprese", "Insalata caprese di bufala", &["mozzarella"]);
    renamed.see_also = true;
    index.add(&renamed.search_document(), Variant::Base).expect("upsert");
    assert_eq!(index.num_docs(Variant::Base).expect("count"), 8);

    let hits = index.query("caprese bufala", Variant::Base, any_score(0.3)).expect("query");
    assert_eq!(hits[0].source.description, "Insalata caprese di bufala");

    index.delete("caprese", Variant::Base).expect("delete");
    let hits = index.query("insalata caprese", Variant::Base, any_score(0.3)).expect("query");
    assert!(hits.is_empty());
    index.delete("caprese", Variant::Pieces).expect("delete on missing index");
}

#[test]
fn on_disk_indexes_survive_reopen_and_can_be_managed() {
    let tmp = TempDir::new().expect("tempdir");
    {
        let index = TantivyFoodIndex::open(tmp.path().to_path_buf(), Some("test_".to_string())).expect("open");
        index.index_foods(&catalog()).expect("index");
    }
    assert!(tmp.path().join("test_food").join("meta.json").exists());
    assert!(tmp.path().join("test_food_servings").exists());

    let index = TantivyFoodIndex::open(tmp.path().to_path_buf(), Some("test_".to_string())).expect("reopen");
    let hits = index.query("cornflakes", Variant::Base, any_score(0.3)).expect("query");
    assert_eq!(ids(&hits), vec!["cornflakes"]);

    index.manage(IndexCommand::Reset, Variant::Base).expect("reset");
    assert_eq!(index.num_docs(Variant::Base).expect("count"), 0);

    index.manage(IndexCommand::Delete, Variant::Servings).expect("delete index");
    assert!(!tmp.path().join("test_food_servings").exists());
    assert_eq!(index.num_docs(Variant::Servings).expect("count"), 0);

    index.manage(IndexCommand::Init, Variant::Servings).expect("init");
    assert!(tmp.path().join("test_food_servings").join("meta.json").exists());
}
