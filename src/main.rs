use clap::Parser;
use kdam::{BarExt, tqdm};
use tracing_subscriber::EnvFilter;

pub mod chunking;
pub mod cli;
pub mod context;
pub mod embedder;
pub mod embedding;
pub mod error;
pub mod ingestion;
pub mod item;
pub mod keywords;
pub mod retrieval;
pub mod seed;
pub mod store;

use chunking::{ChunkingConfig, MIN_CHUNK_CHARS, chunk_text};
use cli::{ChunkArgs, Cli, Command, KeywordsArgs, SearchArgs};
use embedder::{EmbedderConfig, EmbeddingProvider};
use ingestion::ExtractedDocument;
use item::{ItemKind, KnowledgeItem};
use seed::SeedData;
use store::KnowledgeStore;

/// Curated evidence records compiled into the binary; used when --seed is absent.
const DEFAULT_SEED: &str = include_str!("../data/evidence.json");

fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if let Ok(env) = std::env::var("NUTRIRAG_LOG") {
        EnvFilter::new(env)
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn main() -> error::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    match cli.command {
        Command::Search(args) => {
            cmd_search(&args)?;
        }
        Command::Chunk(args) => {
            cmd_chunk(&args)?;
        }
        Command::Keywords(args) => {
            cmd_keywords(&args)?;
        }
        Command::Completions(args) => {
            args.generate();
        }
    }

    Ok(())
}

fn cmd_search(args: &SearchArgs) -> error::Result<()> {
    let mut config = EmbedderConfig::from_env();
    if let Some(ref base_url) = args.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(ref model) = args.model {
        config.model = model.clone();
    }
    if let Some(ref api_key) = args.api_key {
        config.api_key = Some(api_key.clone());
    }

    let seed = match args.seed {
        Some(ref path) => SeedData::from_path(path)?,
        None => SeedData::from_json(DEFAULT_SEED)?,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| {
            error::Error::Config(format!("failed to start tokio runtime: {e}"))
        })?;

    runtime.block_on(async move {
        let provider = EmbeddingProvider::openai(config);
        let mut store = KnowledgeStore::new();

        ingestion::seed_knowledge_base(&mut store, &provider, &seed).await?;

        for path in &args.ingest {
            ingest_file(&mut store, &provider, path).await?;
        }

        let results =
            retrieval::retrieve(&args.query, args.count, &store, &provider)
                .await?;

        if args.json {
            print_json(&args.query, &results)?;
        } else if args.show_context {
            print!("{}", context::format_context(&results));
        } else {
            print_human(&results);
        }

        Ok(())
    })
}

async fn ingest_file(
    store: &mut KnowledgeStore,
    provider: &EmbeddingProvider,
    path: &std::path::Path,
) -> error::Result<()> {
    let text = std::fs::read_to_string(path)?;
    let file_name = match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => path.display().to_string(),
    };

    eprintln!("Ingesting '{file_name}'...");

    let document = ExtractedDocument {
        file_name,
        page_count: 0,
        text,
    };

    let mut bar = tqdm!(total = 0, desc = "embedding", unit = "chunk");
    let report = ingestion::ingest_document(
        store,
        provider,
        &document,
        &ChunkingConfig::default(),
        |done, total| {
            bar.total = total;
            let _ = bar.update_to(done);
        },
    )
    .await?;
    eprintln!();

    eprintln!("  {} chunk(s) inserted", report.items);
    if report.fallbacks > 0 {
        eprintln!(
            "  Warning: {} chunk(s) stored with zero-vector fallback embeddings",
            report.fallbacks
        );
    }
    Ok(())
}

fn print_human(results: &[KnowledgeItem]) {
    if results.is_empty() {
        println!("No matching knowledge found.");
        return;
    }

    for (position, item) in results.iter().enumerate() {
        println!(
            "{:>3}. [{}] {}",
            position + 1,
            kind_label(item.kind()),
            item.id
        );
        for line in item.content.lines().filter(|line| !line.trim().is_empty())
        {
            println!("     {line}");
        }
        let sources: Vec<&str> =
            item.sources().iter().map(|s| s.name.as_str()).collect();
        if !sources.is_empty() {
            println!("     Sources: {}", sources.join(", "));
        }
    }
    println!("\n{} result(s)", results.len());
}

fn kind_label(kind: ItemKind) -> &'static str {
    match kind {
        ItemKind::Fact => "FACT",
        ItemKind::Myth => "MYTH",
        ItemKind::Document => "PDF",
    }
}

fn print_json(query: &str, results: &[KnowledgeItem]) -> error::Result<()> {
    let rendered = serde_json::to_string_pretty(&serde_json::json!({
        "query": query,
        "result_count": results.len(),
        "results": results,
    }))?;
    println!("{rendered}");
    Ok(())
}

fn cmd_chunk(args: &ChunkArgs) -> error::Result<()> {
    let text = std::fs::read_to_string(&args.file)?;
    let config = ChunkingConfig {
        target_size: args.chunk_size,
        overlap_size: args.overlap,
    };
    let chunks = chunk_text(&text, &config);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&chunks)?);
    } else if chunks.is_empty() {
        println!(
            "No chunks produced (text shorter than {MIN_CHUNK_CHARS} characters)."
        );
    } else {
        let total = chunks.len();
        for (index, chunk) in chunks.iter().enumerate() {
            println!(
                "--- Chunk {}/{} ({} chars) ---",
                index + 1,
                total,
                chunk.chars().count()
            );
            println!("{chunk}");
            if index + 1 < total {
                println!();
            }
        }
    }
    Ok(())
}

fn cmd_keywords(args: &KeywordsArgs) -> error::Result<()> {
    let extracted = keywords::extract_keywords(&args.text, args.count);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&extracted)?);
    } else {
        for keyword in &extracted {
            println!("{keyword}");
        }
    }
    Ok(())
}
