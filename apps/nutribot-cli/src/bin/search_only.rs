use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use nutribot_core::config::{expand_path, Config};
use nutribot_core::traits::FoodSearch;
use nutribot_core::types::{QueryOptions, Variant};
use nutribot_text::TantivyFoodIndex;

/// Query the food indexes directly and print raw and clustered hits.
#[derive(Parser, Debug)]
#[command(name = "nutribot-search", version)]
struct Cli {
    /// Food description, e.g. "insalata di riso"
    query: String,

    /// Index directory (defaults to data.index_dir)
    #[arg(long)]
    index_dir: Option<PathBuf>,

    /// Search the serving or piece partition instead of the base index
    #[arg(long, value_parser = ["servings", "pieces"])]
    variant: Option<String>,

    #[arg(long)]
    min_score: Option<f32>,

    #[arg(long)]
    max_diff: Option<f32>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let settings = Config::load()?.settings()?;

    let index_dir = cli.index_dir.unwrap_or_else(|| expand_path(&settings.data.index_dir));
    let variant = match cli.variant.as_deref() {
        Some("servings") => Variant::Servings,
        Some("pieces") => Variant::Pieces,
        _ => Variant::Base,
    };
    let defaults = settings.search.query_options();
    let options = QueryOptions {
        min_score: cli.min_score.unwrap_or(defaults.min_score),
        max_diff: cli.max_diff.unwrap_or(defaults.max_diff),
    };

    let index = TantivyFoodIndex::open(index_dir.clone(), settings.data.index_prefix.clone())?
        .with_fuzzy_boost(settings.search.fuzzy_boost)
        .with_limit(settings.search.limit);
    println!("🔍 nutribot-search\n==================");
    println!("Query: {}", cli.query);
    println!("Index: {} ({})", index.index_name(variant), index_dir.display());
    println!("min_score={}  max_diff={}", options.min_score, options.max_diff);

    let raw = index.raw_search(&cli.query, variant)?;
    println!("\n📄 {} raw hits", raw.len());
    for (i, hit) in raw.iter().enumerate() {
        println!("  {}. score={:.4}  {}  [{}]", i + 1, hit.score, hit.document.description, hit.document.ingredients.join(", "));
    }

    let hits = index.query(&cli.query, variant, options)?;
    println!("\n✅ {} clustered hits", hits.len());
    for (i, hit) in hits.iter().enumerate() {
        println!("  {}. score={:.4}  relative={:.4}  id={}  {}", i + 1, hit.score, hit.relative_score, hit.id, hit.source.description);
    }
    Ok(())
}
