//! JSON food catalog, loaded into memory and served as a `FoodRepository`.
//!
//! A catalog file holds either `{"foods": [...]}` or a bare array of entries.
//! Each entry is a `FoodDocument` plus an `observations` list.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::traits::FoodRepository;
use crate::types::{FoodDocument, NutritionObservation};

/// Name marker for foods whose nutrition values vary a lot ("varia molto").
pub const HIGH_VARIABILITY_MARKER: &str = "(v.m.)";

/// Factors a single observation is expanded into for marked foods.
pub const HIGH_VARIABILITY_FACTORS: [f64; 3] = [0.8, 1.0, 1.2];

/// Namespace for ids derived from food names.
const FOOD_NAMESPACE: uuid::Uuid = uuid::Uuid::from_u128(0x6e75_7472_6962_4f74_8c1d_2f0a_b3e4_5d96);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub food: FoodDocument,
    #[serde(default)]
    pub observations: Vec<NutritionObservation>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Wrapped { foods: Vec<CatalogEntry> },
    Bare(Vec<CatalogEntry>),
}

impl CatalogFile {
    fn into_entries(self) -> Vec<CatalogEntry> {
        match self {
            CatalogFile::Wrapped { foods } | CatalogFile::Bare(foods) => foods,
        }
    }
}

#[derive(Debug, Default)]
pub struct FoodCatalog {
    foods: Vec<FoodDocument>,
    by_uuid: HashMap<String, usize>,
    observations: HashMap<String, Vec<NutritionObservation>>,
}

impl FoodCatalog {
    /// Builds a catalog from raw entries, skipping the ones that cannot be used.
    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        let mut catalog = Self::default();
        for (position, entry) in entries.into_iter().enumerate() {
            match normalize(entry) {
                Ok(entry) => catalog.insert(entry),
                Err(reason) => warn!(position, %reason, "skipping catalog entry"),
            }
        }
        catalog
    }

    /// Loads a single JSON file or every `*.json` under a directory.
    pub fn load(path: &Path) -> Result<Self> {
        let files = if path.is_dir() { list_json_files(path) } else { vec![path.to_path_buf()] };
        if files.is_empty() {
            warn!(path = %path.display(), "no catalog files found");
        }
        let mut entries = Vec::new();
        for file in &files {
            debug!(file = %file.display(), "reading catalog file");
            let content = fs::read_to_string(file)
                .map_err(|e| Error::NotFound(format!("{}: {e}", file.display())))?;
            let parsed: CatalogFile = serde_json::from_str(&content)
                .map_err(|e| Error::Operation(format!("invalid catalog {}: {e}", file.display())))?;
            entries.extend(parsed.into_entries());
        }
        let catalog = Self::from_entries(entries);
        info!(files = files.len(), foods = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    pub fn insert(&mut self, entry: CatalogEntry) {
        let uuid = entry.food.uuid.clone();
        match self.by_uuid.get(&uuid) {
            Some(&i) => self.foods[i] = entry.food,
            None => {
                self.by_uuid.insert(uuid.clone(), self.foods.len());
                self.foods.push(entry.food);
            }
        }
        self.observations.insert(uuid, entry.observations);
    }

    pub fn foods(&self) -> &[FoodDocument] {
        &self.foods
    }

    pub fn len(&self) -> usize {
        self.foods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }
}

impl FoodRepository for FoodCatalog {
    fn get_by_uuid(&self, id: &str) -> Result<FoodDocument> {
        self.by_uuid
            .get(id)
            .map(|&i| self.foods[i].clone())
            .ok_or_else(|| Error::NotFound(format!("food {id}")))
    }

    fn list_observations(&self, food_id: &str) -> Result<Vec<NutritionObservation>> {
        if !self.by_uuid.contains_key(food_id) {
            return Err(Error::NotFound(format!("food {food_id}")));
        }
        Ok(self.observations.get(food_id).cloned().unwrap_or_default())
    }
}

fn normalize(mut entry: CatalogEntry) -> std::result::Result<CatalogEntry, String> {
    entry.food.name = entry.food.name.trim().to_string();
    if entry.food.name.contains(HIGH_VARIABILITY_MARKER) {
        entry.food.name = entry.food.name.replace(HIGH_VARIABILITY_MARKER, "").split_whitespace().collect::<Vec<_>>().join(" ");
        entry.observations = entry
            .observations
            .iter()
            .flat_map(|o| HIGH_VARIABILITY_FACTORS.iter().map(move |&f| o.scaled(f)))
            .collect();
    }
    if entry.food.name.is_empty() {
        return Err("empty name".to_string());
    }
    entry.food.ingredients = entry
        .food
        .ingredients
        .iter()
        .map(|i| i.trim().to_lowercase())
        .filter(|i| !i.is_empty())
        .collect();
    if entry.food.ingredients.is_empty() {
        return Err(format!("no primary ingredient for \"{}\"", entry.food.name));
    }
    entry.observations.retain(|o| !o.is_empty());
    if entry.observations.is_empty() {
        return Err(format!("no nutrition values for \"{}\"", entry.food.name));
    }
    if entry.food.uuid.trim().is_empty() {
        entry.food.uuid = stable_uuid(&entry.food).to_string();
    }
    Ok(entry)
}

/// Name-based id, identical across loads of the same catalog entry.
fn stable_uuid(food: &FoodDocument) -> uuid::Uuid {
    let key = format!("{}|{}", food.name.to_lowercase(), food.ingredients.join(","));
    uuid::Uuid::new_v5(&FOOD_NAMESPACE, key.as_bytes())
}

fn list_json_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    files
}
