//! Knowledge item model shared by the store, retrieval, and formatting layers.

use serde::{Deserialize, Serialize};

use crate::embedding::Embedding;

/// A citation attached to curated knowledge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub text: String,
}

/// Category of a knowledge item, used for filtering and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Fact,
    Myth,
    Document,
}

/// Structured metadata carried alongside an item's content.
///
/// Curated entries (facts and myth corrections) keep their citations here;
/// document chunks keep their position within the source file instead.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ItemMetadata {
    Fact {
        topic: Option<String>,
        sources: Vec<SourceRef>,
    },
    Myth {
        myth: String,
        debunk: String,
        science: String,
        swaps: Vec<String>,
        sources: Vec<SourceRef>,
    },
    Document {
        file_name: String,
        page_count: usize,
        chunk_index: usize,
        total_chunks: usize,
    },
}

/// One retrievable unit of knowledge.
///
/// The embedding is populated lazily (items are valid without one) and is
/// never serialized; persisted snapshots carry only text and metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeItem {
    pub id: String,
    pub content: String,
    pub keywords: Vec<String>,
    pub metadata: ItemMetadata,
    #[serde(skip)]
    pub embedding: Option<Embedding>,
}

impl KnowledgeItem {
    pub fn new(
        id: impl Into<String>,
        content: impl Into<String>,
        keywords: Vec<String>,
        metadata: ItemMetadata,
    ) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            keywords,
            metadata,
            embedding: None,
        }
    }

    pub fn kind(&self) -> ItemKind {
        match self.metadata {
            ItemMetadata::Fact { .. } => ItemKind::Fact,
            ItemMetadata::Myth { .. } => ItemKind::Myth,
            ItemMetadata::Document { .. } => ItemKind::Document,
        }
    }

    /// Citations for curated items; document chunks cite their file instead.
    pub fn sources(&self) -> &[SourceRef] {
        match &self.metadata {
            ItemMetadata::Fact { sources, .. } | ItemMetadata::Myth { sources, .. } => sources,
            ItemMetadata::Document { .. } => &[],
        }
    }

    /// True for chunks extracted from the named file.
    pub fn is_document_from(&self, source: &str) -> bool {
        match &self.metadata {
            ItemMetadata::Document { file_name, .. } => file_name == source,
            _ => false,
        }
    }

    /// Name of the file this item came from, if it is a document chunk.
    pub fn document_source(&self) -> Option<&str> {
        match &self.metadata {
            ItemMetadata::Document { file_name, .. } => Some(file_name),
            _ => None,
        }
    }

    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }
}
