//! Curated seed records for the knowledge base.
//!
//! The evidence pack ships as JSON (see `data/evidence.json`): myth records
//! with their debunks and citations, plus short nutrition facts. Records are
//! folded into [`KnowledgeItem`]s here; embeddings are attached later by the
//! ingestion layer.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{
    error::Result,
    item::{ItemMetadata, KnowledgeItem, SourceRef},
    keywords::{DEFAULT_MAX_KEYWORDS, extract_keywords},
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    #[serde(default)]
    pub myths: Vec<MythRecord>,
    #[serde(default)]
    pub facts: Vec<FactRecord>,
}

/// A common nutrition myth with its evidence-backed correction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MythRecord {
    pub key: String,
    pub myth: String,
    pub debunk: String,
    #[serde(default)]
    pub why_believe: Option<String>,
    pub science: String,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
    #[serde(default)]
    pub swaps: Vec<String>,
    #[serde(default)]
    pub safety_note: Option<String>,
}

/// A short, citable nutrition fact.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactRecord {
    pub key: String,
    pub content: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

impl SeedData {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    /// All records as knowledge items, myths first, in record order.
    pub fn items(&self) -> Vec<KnowledgeItem> {
        self.myths
            .iter()
            .map(MythRecord::to_item)
            .chain(self.facts.iter().map(FactRecord::to_item))
            .collect()
    }
}

impl MythRecord {
    /// Folds the record into one retrievable passage. The content carries
    /// the myth, its debunk, the science, and the suggested swaps so a
    /// single embedding covers all of them.
    pub fn to_item(&self) -> KnowledgeItem {
        let content = format!(
            "Myth: {}\n\nDebunk: {}\n\nScience: {}\n\nSwaps: {}",
            self.myth,
            self.debunk,
            self.science,
            self.swaps.join(", ")
        );
        let keywords = extract_keywords(
            &format!("{} {} {}", self.myth, self.debunk, self.science),
            DEFAULT_MAX_KEYWORDS,
        );
        KnowledgeItem::new(
            format!("myth-{}", self.key),
            content,
            keywords,
            ItemMetadata::Myth {
                myth: self.myth.clone(),
                debunk: self.debunk.clone(),
                science: self.science.clone(),
                swaps: self.swaps.clone(),
                sources: self.sources.clone(),
            },
        )
    }
}

impl FactRecord {
    pub fn to_item(&self) -> KnowledgeItem {
        KnowledgeItem::new(
            format!("fact-{}", self.key),
            self.content.clone(),
            extract_keywords(&self.content, DEFAULT_MAX_KEYWORDS),
            ItemMetadata::Fact {
                topic: self.topic.clone(),
                sources: self.sources.clone(),
            },
        )
    }
}
