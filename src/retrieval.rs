//! Hybrid retrieval over the knowledge store.

use std::collections::HashSet;

use rayon::prelude::*;
use tracing::debug;

use crate::{
    embedder::EmbeddingProvider,
    embedding::{Embedding, cosine_similarity},
    error::{Error, Result},
    item::KnowledgeItem,
    keywords::{DEFAULT_MAX_KEYWORDS, extract_keywords},
    store::KnowledgeStore,
};

/// Minimum cosine similarity for an item to count as semantically related.
/// Matches below or at this value are treated as noise.
pub const SIMILARITY_THRESHOLD: f32 = 0.3;

/// Default number of items handed to the prompt builder.
pub const DEFAULT_TOP_K: usize = 3;

/// Execute the hybrid retrieval pipeline.
///
/// 1. Semantic pass: cosine similarity between the query embedding and every
///    embedded item, keeping scores above [`SIMILARITY_THRESHOLD`] (top
///    `2 * top_k`)
/// 2. Keyword pass: weighted keyword overlap over all items, embedded or not
///    (top `top_k`)
/// 3. Merge semantic results first, then keyword results, dropping duplicate
///    ids and cutting off at `top_k`
///
/// A degraded embedding service only silences the semantic pass; keyword
/// matches still come back.
pub async fn retrieve(
    query: &str,
    top_k: usize,
    store: &KnowledgeStore,
    provider: &EmbeddingProvider,
) -> Result<Vec<KnowledgeItem>> {
    if query.trim().is_empty() {
        return Err(Error::InvalidInput("query must not be empty".into()));
    }
    if top_k == 0 || store.is_empty() {
        return Ok(vec![]);
    }

    // Stage 1: semantic candidates. A fallback (zero) query embedding scores
    // 0.0 against everything and yields no candidates.
    let query_embedding = provider.embed(query).await?;
    let semantic = semantic_candidates(&query_embedding, store, top_k.saturating_mul(2));

    // Stage 2: keyword candidates.
    let keyword = keyword_candidates(query, store, top_k);
    debug!(
        semantic = semantic.len(),
        keyword = keyword.len(),
        "retrieval candidates"
    );

    // Stage 3: merge, semantic first.
    let items = store.all();
    let ranked = semantic
        .iter()
        .map(|&(index, _)| index)
        .chain(keyword.iter().map(|&(index, _)| index));

    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for index in ranked {
        let item = &items[index];
        if seen.insert(item.id.as_str()) {
            merged.push(item.clone());
            if merged.len() == top_k {
                break;
            }
        }
    }
    Ok(merged)
}

/// Store indices with similarity above the threshold, best first.
/// Items without an embedding never appear here.
fn semantic_candidates(
    query_embedding: &Embedding,
    store: &KnowledgeStore,
    limit: usize,
) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = store
        .all()
        .par_iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let embedding = item.embedding.as_ref()?;
            let similarity = cosine_similarity(query_embedding.vector(), embedding.vector());
            (similarity > SIMILARITY_THRESHOLD).then_some((index, similarity))
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}

/// Store indices scored by query keyword overlap, best first.
///
/// A keyword listed on the item counts double; a plain substring hit in the
/// content counts once. Items scoring zero are dropped.
fn keyword_candidates(query: &str, store: &KnowledgeStore, limit: usize) -> Vec<(usize, u32)> {
    let keywords = extract_keywords(query, DEFAULT_MAX_KEYWORDS);
    if keywords.is_empty() {
        return vec![];
    }

    let mut scored: Vec<(usize, u32)> = Vec::new();
    for (index, item) in store.all().iter().enumerate() {
        let content = item.content.to_lowercase();
        let mut score = 0u32;
        for keyword in &keywords {
            if item.keywords.iter().any(|k| k == keyword) {
                score += 2;
            }
            if content.contains(keyword.as_str()) {
                score += 1;
            }
        }
        if score > 0 {
            scored.push((index, score));
        }
    }

    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.truncate(limit);
    scored
}
