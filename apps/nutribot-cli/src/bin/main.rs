use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use nutribot_bot::{Bot, InMemoryTranscriptStore, Sessions};
use nutribot_core::catalog::FoodCatalog;
use nutribot_core::config::{expand_path, Config, Settings};
use nutribot_core::traits::FoodIndexer;
use nutribot_core::types::{IndexCommand, Variant};
use nutribot_text::index::variant_batches;
use nutribot_text::TantivyFoodIndex;

const BATCH_SIZE: usize = 500;

#[derive(Parser, Debug)]
#[command(name = "nutribot", version, about = "Carbohydrate answers for Italian food questions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the food catalog into the search indexes
    Ingest {
        /// Catalog file or directory (defaults to data.catalog_path)
        catalog: Option<PathBuf>,
        /// Empty every index before loading
        #[arg(long)]
        reset: bool,
    },
    /// Run an administrative command on the indexes
    Manage {
        #[arg(value_enum)]
        command: ManageCommand,
        /// Limit the command to one index (all three by default)
        #[arg(long, value_enum)]
        variant: Option<VariantArg>,
    },
    /// Answer a single message
    Ask {
        /// The question, e.g. "80g pasta al pomodoro"
        message: Vec<String>,
    },
    /// Interactive conversation on stdin
    Chat {
        #[arg(long, default_value = "cli")]
        conversation: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum ManageCommand {
    Init,
    Reset,
    Delete,
}

impl From<ManageCommand> for IndexCommand {
    fn from(c: ManageCommand) -> Self {
        match c {
            ManageCommand::Init => IndexCommand::Init,
            ManageCommand::Reset => IndexCommand::Reset,
            ManageCommand::Delete => IndexCommand::Delete,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum VariantArg {
    Base,
    Servings,
    Pieces,
}

impl From<VariantArg> for Variant {
    fn from(v: VariantArg) -> Self {
        match v {
            VariantArg::Base => Variant::Base,
            VariantArg::Servings => Variant::Servings,
            VariantArg::Pieces => Variant::Pieces,
        }
    }
}

fn open_index(settings: &Settings) -> anyhow::Result<TantivyFoodIndex> {
    let dir = expand_path(&settings.data.index_dir);
    let index = TantivyFoodIndex::open(dir.clone(), settings.data.index_prefix.clone())
        .with_context(|| format!("opening indexes under {}", dir.display()))?;
    Ok(index.with_fuzzy_boost(settings.search.fuzzy_boost).with_limit(settings.search.limit))
}

fn load_catalog(path: Option<PathBuf>, settings: &Settings) -> anyhow::Result<FoodCatalog> {
    let path = path.unwrap_or_else(|| expand_path(&settings.data.catalog_path));
    FoodCatalog::load(&path).with_context(|| format!("loading catalog from {}", path.display()))
}

fn ingest(settings: &Settings, catalog_path: Option<PathBuf>, reset: bool) -> anyhow::Result<()> {
    let catalog = load_catalog(catalog_path, settings)?;
    let index = open_index(settings)?;
    if reset {
        for variant in Variant::ALL { index.manage(IndexCommand::Reset, variant)?; }
    }

    let batches = variant_batches(catalog.foods());
    let total: usize = batches.values().map(Vec::len).sum();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} documents ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    for variant in Variant::ALL {
        let Some(documents) = batches.get(&variant) else { continue };
        pb.set_message(index.index_name(variant));
        for chunk in documents.chunks(BATCH_SIZE) {
            index.add_batch(chunk, variant)?;
            pb.inc(chunk.len() as u64);
        }
    }
    pb.finish_with_message("done");
    println!("✅ Ingest complete ({} foods, {} documents)", catalog.len(), total);
    for variant in Variant::ALL {
        println!("  {}: {} documents", index.index_name(variant), index.num_docs(variant)?);
    }
    Ok(())
}

fn manage(settings: &Settings, command: ManageCommand, variant: Option<VariantArg>) -> anyhow::Result<()> {
    let index = open_index(settings)?;
    let variants = variant.map_or_else(|| Variant::ALL.to_vec(), |v| vec![v.into()]);
    for variant in variants {
        index.manage(command.into(), variant)?;
        println!("{:?} {} ok", command, index.index_name(variant));
    }
    Ok(())
}

fn sessions(settings: &Settings) -> anyhow::Result<Sessions<TantivyFoodIndex, FoodCatalog>> {
    let bot = Bot::from_settings(open_index(settings)?, load_catalog(None, settings)?, settings);
    Ok(Sessions::new(bot, Arc::new(InMemoryTranscriptStore::new())))
}

fn chat(settings: &Settings, conversation: &str) -> anyhow::Result<()> {
    let sessions = sessions(settings)?;
    println!("🍝 nutribot: chiedimi di un alimento (riga vuota per uscire)");
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() { break; }
        let transcript = sessions.converse(conversation, &line)?;
        writeln!(stdout, "{}\n", transcript.last_reply().unwrap_or_default())?;
        stdout.flush()?;
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let settings = config.settings()?;

    match cli.command {
        Command::Ingest { catalog, reset } => ingest(&settings, catalog, reset)?,
        Command::Manage { command, variant } => manage(&settings, command, variant)?,
        Command::Ask { message } => {
            let message = message.join(" ");
            if message.trim().is_empty() { anyhow::bail!("Usage: nutribot ask \"<message>\""); }
            let transcript = sessions(&settings)?.converse("cli", &message)?;
            println!("{}", transcript.last_reply().unwrap_or_default());
        }
        Command::Chat { conversation } => chat(&settings, &conversation)?,
    }
    Ok(())
}
