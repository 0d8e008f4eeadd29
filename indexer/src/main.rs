use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use lemma_core::{
    BuildOutcome, DocumentSource, DocumentStore, IndexBuilder, IndexConfig, IndexStore, Language, NormalizationPipeline,
    QueryEngine, ReindexPolicy, SnowballLemmatizer,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct InputDoc {
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    path: Option<String>,
}

#[derive(Serialize)]
struct Hit {
    doc_id: u64,
    match_count: u64,
    title: Option<String>,
    path: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LanguageArg {
    Russian,
    English,
    Auto,
}

impl From<LanguageArg> for Language {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::Russian => Language::Russian,
            LanguageArg::English => Language::English,
            LanguageArg::Auto => Language::Auto,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Reject,
    Rebuild,
    Append,
}

impl From<PolicyArg> for ReindexPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Reject => ReindexPolicy::Reject,
            PolicyArg::Rebuild => ReindexPolicy::Rebuild,
            PolicyArg::Append => ReindexPolicy::Append,
        }
    }
}

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query a lemmatized inverted index", long_about = None)]
struct Cli {
    /// JSON config file; flags below override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Index database directory
    #[arg(long, global = true)]
    index: Option<PathBuf>,
    /// Document database directory
    #[arg(long, global = true)]
    docs: Option<PathBuf>,
    /// Lemmatizer language
    #[arg(long, global = true, value_enum)]
    language: Option<LanguageArg>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add one document to the document store
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        path: Option<String>,
    },
    /// Load documents from JSON/JSONL files or a directory of them
    Import {
        #[arg(long)]
        input: PathBuf,
    },
    /// Index every stored document
    Build {
        /// What to do when the index already has postings
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,
    },
    /// Search for documents containing any of the words
    Search {
        #[arg(required = true)]
        words: Vec<String>,
        /// Maximum number of hits to print
        #[arg(long, default_value_t = 10)]
        k: usize,
    },
    /// Print index statistics
    Stats,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Add { title, description, path } => {
            let docs = DocumentStore::open(&config)?;
            let id = docs.insert(&title, &description, path.as_deref())?;
            docs.flush()?;
            println!("{id}");
            Ok(())
        }
        Commands::Import { input } => import(&config, &input),
        Commands::Build { policy } => build(&config, policy.map(Into::into).unwrap_or(config.reindex)),
        Commands::Search { words, k } => search(&config, &words, k),
        Commands::Stats => {
            let store = IndexStore::open(&config)?;
            println!("{}", serde_json::to_string_pretty(&store.stats())?);
            if let Some(info) = store.build_info()? {
                println!("{}", serde_json::to_string_pretty(&info)?);
            }
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<IndexConfig> {
    let mut config = match &cli.config {
        Some(path) => IndexConfig::from_file(path).with_context(|| format!("reading config {}", path.display()))?,
        None => IndexConfig::default(),
    };
    if let Some(index) = &cli.index {
        config.index_path = index.clone();
    }
    if let Some(docs) = &cli.docs {
        config.docs_path = docs.clone();
    }
    if let Some(language) = cli.language {
        config.language = language.into();
    }
    config.validate()?;
    Ok(config)
}

fn pipeline(config: &IndexConfig) -> NormalizationPipeline {
    NormalizationPipeline::new(Arc::new(SnowballLemmatizer::new(config.language)))
}

fn build(config: &IndexConfig, policy: ReindexPolicy) -> Result<()> {
    let docs = DocumentStore::open(config)?;
    let store = Arc::new(IndexStore::open(config)?);
    let builder = IndexBuilder::new(store, pipeline(config)).with_policy(policy);
    match builder.build_from(&docs)? {
        BuildOutcome::Indexed { documents, postings } => println!("indexed {documents} documents, {postings} postings"),
        BuildOutcome::Empty => println!("document store is empty, nothing to index"),
    }
    Ok(())
}

fn search(config: &IndexConfig, words: &[String], k: usize) -> Result<()> {
    let store = Arc::new(IndexStore::open(config)?);
    let engine = QueryEngine::new(store, pipeline(config));
    let hits = engine.search(words)?;
    // Hits only carry ids; titles come from the document store when it is there.
    let docs = lookup_store(config);
    let mut out = Vec::with_capacity(hits.len().min(k));
    for (doc_id, match_count) in hits.into_iter().take(k) {
        let doc = match &docs {
            Some(d) => d.get(doc_id)?,
            None => None,
        };
        out.push(Hit {
            doc_id,
            match_count,
            title: doc.as_ref().map(|d| d.title.clone()),
            path: doc.and_then(|d| d.path),
        });
    }
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

fn lookup_store(config: &IndexConfig) -> Option<DocumentStore> {
    if !config.docs_path.exists() {
        tracing::debug!(path = %config.docs_path.display(), "no document store, printing ids only");
        return None;
    }
    match DocumentStore::open(config) {
        Ok(d) => Some(d),
        Err(err) => {
            tracing::warn!(path = %config.docs_path.display(), %err, "document store unavailable, printing ids only");
            None
        }
    }
}

fn import(config: &IndexConfig, input: &Path) -> Result<()> {
    let mut files: Vec<PathBuf> = Vec::new();
    if input.is_dir() {
        for entry in WalkDir::new(input).into_iter().filter_map(|e| e.ok()) {
            let p = entry.path();
            if p.is_file() {
                if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                    if matches!(ext, "json" | "jsonl") {
                        files.push(p.to_path_buf());
                    }
                }
            }
        }
        files.sort();
    } else if input.is_file() {
        files.push(input.to_path_buf());
    } else {
        anyhow::bail!("input {} does not exist", input.display());
    }

    let docs = DocumentStore::open(config)?;
    let mut added = 0usize;
    for file in files {
        let batch = if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            read_jsonl(&file)?
        } else {
            read_json(&file)?
        };
        for doc in batch {
            match docs.insert(&doc.title, &doc.description, doc.path.as_deref()) {
                Ok(_) => added += 1,
                Err(lemma_core::IndexError::DuplicateTitle { title, existing }) => {
                    tracing::warn!(%title, existing, "skipping duplicate title");
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
    docs.flush()?;
    tracing::info!(added, total = docs.list_documents()?.len(), "import complete");
    println!("imported {added} documents");
    Ok(())
}

fn read_jsonl(file: &Path) -> Result<Vec<InputDoc>> {
    let reader = BufReader::new(File::open(file)?);
    let mut out = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        out.push(serde_json::from_str(&line).with_context(|| format!("parsing {}", file.display()))?);
    }
    Ok(out)
}

fn read_json(file: &Path) -> Result<Vec<InputDoc>> {
    let reader = BufReader::new(File::open(file)?);
    let json: serde_json::Value = serde_json::from_reader(reader)?;
    match json {
        serde_json::Value::Array(_) => Ok(serde_json::from_value(json)?),
        serde_json::Value::Object(_) => Ok(vec![serde_json::from_value(json)?]),
        _ => Ok(Vec::new()),
    }
}
