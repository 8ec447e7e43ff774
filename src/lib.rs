//! nutrirag - hybrid retrieval for a nutrition evidence chatbot.
//!
//! nutrirag keeps an in-memory knowledge base of curated facts, myth
//! corrections, and uploaded document chunks, embeds them through any
//! OpenAI-compatible embeddings endpoint, and answers free-text queries by
//! merging two independent rankings: cosine similarity over embeddings and
//! weighted keyword overlap. A failing embedding service degrades retrieval
//! to keyword matching instead of failing the query.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//!
//! use nutrirag::{EmbedderConfig, EmbeddingProvider, KnowledgeStore, SeedData};
//! use nutrirag::{context, ingestion, retrieval};
//!
//! # async fn run() -> nutrirag::Result<()> {
//! let mut store = KnowledgeStore::new();
//! let provider = EmbeddingProvider::openai(EmbedderConfig::from_env());
//!
//! let seed = SeedData::from_path(Path::new("data/evidence.json"))?;
//! ingestion::seed_knowledge_base(&mut store, &provider, &seed).await?;
//!
//! let results = retrieval::retrieve("are carbs bad for you", 3, &store, &provider).await?;
//! println!("{}", context::format_context(&results));
//! # Ok(())
//! # }
//! ```

pub mod chunking;
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

pub use chunking::ChunkingConfig;
pub use embedder::{EmbedderConfig, EmbeddingBackend, EmbeddingProvider};
pub use embedding::Embedding;
pub use error::{Error, Result};
pub use item::{ItemKind, ItemMetadata, KnowledgeItem, SourceRef};
pub use seed::SeedData;
pub use store::KnowledgeStore;
