use snipvec_common::{AppConfig, logger};
use snipvec_llm::{chunk_text, split_on_marker, split_paragraphs, Embedder, OllamaClient};
use snipvec_vector::{VectorRecord, VectorStore};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "snipvec")]
#[command(about = "snipvec - text snippets with embeddings, searched by cosine similarity", long_about = None)]
struct Cli {
    /// Journal file of the vector store (overrides STORE_PATH)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Log level (overrides LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a document, embed every chunk and store it
    Ingest {
        /// Document to ingest
        file: PathBuf,

        /// Chunk separator (defaults to CHUNK_SEPARATOR; blank lines when absent from the file)
        #[arg(long)]
        separator: Option<String>,

        /// Record ids become `<prefix>-<index>` instead of random ids
        #[arg(long)]
        id_prefix: Option<String>,

        /// Further split chunks longer than this many tokens
        #[arg(long)]
        max_tokens: Option<usize>,
    },

    /// Embed a question and print the closest snippets
    Query {
        question: String,

        /// Minimum similarity score (defaults to SEARCH_THRESHOLD)
        #[arg(long, allow_hyphen_values = true)]
        threshold: Option<f64>,

        /// Maximum number of results (defaults to SEARCH_MAX_RESULTS)
        #[arg(long)]
        max: Option<usize>,
    },

    /// Print one record as JSON
    Get { id: String },

    /// List stored records
    List,

    /// Rewrite the journal with one line per record
    Compact,

    /// Check that the embedding service is reachable
    Ping,
}

fn split_document(text: &str, separator: &str, max_tokens: Option<usize>) -> Vec<String> {
    let chunks = if !separator.is_empty() && text.contains(separator) {
        split_on_marker(text, separator)
    } else {
        split_paragraphs(text)
    };

    match max_tokens {
        Some(max_tokens) => chunks
            .iter()
            .flat_map(|chunk| chunk_text(chunk, max_tokens, max_tokens / 10))
            .map(|c| c.text.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect(),
        None => chunks,
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}

async fn ingest(
    config: &AppConfig,
    store: &mut VectorStore,
    embedder: &dyn Embedder,
    file: PathBuf,
    separator: Option<String>,
    id_prefix: Option<String>,
    max_tokens: Option<usize>,
) -> Result<()> {
    let text = std::fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let separator = separator.unwrap_or_else(|| config.chunk_separator.clone());
    let chunks = split_document(&text, &separator, max_tokens);
    let source = file.display().to_string();

    tracing::info!("Ingesting {} chunks from {}", chunks.len(), source);

    let mut saved = 0;
    for (idx, chunk) in chunks.into_iter().enumerate() {
        let embedding = match embedder.embed(&config.embedding_model, &chunk).await {
            Ok(embedding) => embedding,
            Err(e) => {
                tracing::warn!("Skipping chunk {}: {}", idx, e);
                continue;
            }
        };

        let mut record = VectorRecord::new(chunk, embedding)
            .with_metadata("source", source.clone())
            .with_metadata("chunk", idx)
            .with_created_at(chrono::Utc::now());
        if let Some(prefix) = &id_prefix {
            record = record.with_id(format!("{}-{}", prefix, idx));
        }

        let record = store.save(record)?;
        tracing::debug!("Stored chunk {} as {}", idx, record.id);
        saved += 1;
    }

    println!("Stored {} chunks from {}", saved, source);
    Ok(())
}

async fn query(
    config: &AppConfig,
    store: &VectorStore,
    embedder: &dyn Embedder,
    question: &str,
    threshold: f64,
    max: usize,
) -> Result<()> {
    let embedding = embedder.embed(&config.embedding_model, question).await?;

    let results = match store.search_top_n(&embedding, threshold, max) {
        Ok(results) => results,
        Err(e) if e.is_empty_store() => {
            println!("The store is empty; ingest a document first.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if results.is_empty() {
        println!("No snippet scored at least {}", threshold);
    }
    for result in results {
        println!("[{:.4}] {}", result.score, result.prompt());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(store) = cli.store {
        config.store_path = store;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    config.ensure_directories()?;

    logger::setup_logging(&config.log_dir, &config.log_level)?;
    tracing::debug!("Configuration loaded: {:?}", config);

    let mut store: VectorStore = VectorStore::new();
    store.initialize(&config.store_path)?;

    match cli.command {
        Commands::Ingest { file, separator, id_prefix, max_tokens } => {
            let client = OllamaClient::new(&config.ollama_base_url)?;
            ingest(&config, &mut store, &client, file, separator, id_prefix, max_tokens).await?;
        }
        Commands::Query { question, threshold, max } => {
            let threshold = threshold.unwrap_or(config.search_threshold);
            let max = max.unwrap_or(config.search_max_results);
            let client = OllamaClient::new(&config.ollama_base_url)?;
            query(&config, &store, &client, &question, threshold, max).await?;
        }
        Commands::Get { id } => {
            let record = store.get(&id)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::List => {
            let count = store.count()?;
            if count == 0 {
                println!("The store is empty.");
            } else {
                for record in store.get_all()? {
                    println!("{}\t{}\t{}", record.id, record.dimension(), first_line(&record.prompt));
                }
                println!("{} records", count);
            }
        }
        Commands::Compact => {
            store.compact()?;
            println!("Compacted {}", config.store_path.display());
        }
        Commands::Ping => {
            let client = OllamaClient::new(&config.ollama_base_url)?;
            if client.test_connection().await? {
                println!("Ollama reachable at {}", client.base_url());
            } else {
                anyhow::bail!("Ollama at {} answered with an error", client.base_url());
            }
        }
    }

    Ok(())
}
