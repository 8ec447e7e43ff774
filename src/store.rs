//! In-memory knowledge base with stable insertion order.
//!
//! The store is the single source of truth for retrieval: items keep the
//! order they were added in, ids are unique, and batch inserts are atomic
//! (either every item lands or none do).

use std::collections::HashSet;

use crate::{
    embedding::Embedding,
    error::{Error, Result},
    item::KnowledgeItem,
};

#[derive(Debug, Default)]
pub struct KnowledgeStore {
    items: Vec<KnowledgeItem>,
    ids: HashSet<String>,
}

impl KnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn get(&self, id: &str) -> Option<&KnowledgeItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// All items in insertion order.
    pub fn all(&self) -> &[KnowledgeItem] {
        &self.items
    }

    /// Adds a single item, rejecting blank content and duplicate ids.
    pub fn insert(&mut self, item: KnowledgeItem) -> Result<()> {
        self.validate(&item)?;
        self.ids.insert(item.id.clone());
        self.items.push(item);
        Ok(())
    }

    /// Adds a batch atomically: all items are validated (against the store
    /// and against each other) before any of them is appended.
    pub fn insert_batch(&mut self, batch: Vec<KnowledgeItem>) -> Result<usize> {
        let mut pending = HashSet::new();
        for item in &batch {
            self.validate(item)?;
            if !pending.insert(item.id.as_str()) {
                return Err(Error::DuplicateId(item.id.clone()));
            }
        }
        drop(pending);

        let added = batch.len();
        for item in batch {
            self.ids.insert(item.id.clone());
            self.items.push(item);
        }
        Ok(added)
    }

    /// Attaches an embedding to an existing item.
    ///
    /// Returns `Ok(true)` when the vector was stored, `Ok(false)` when the
    /// item already had one (the existing vector is kept).
    pub fn attach_embedding(&mut self, id: &str, embedding: Embedding) -> Result<bool> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| Error::NotFound {
                kind: "knowledge item",
                name: id.to_string(),
            })?;
        if item.embedding.is_some() {
            return Ok(false);
        }
        item.embedding = Some(embedding);
        Ok(true)
    }

    /// Removes every document chunk extracted from `source`, leaving curated
    /// items and chunks from other files untouched. Returns the removed count.
    pub fn remove_by_source(&mut self, source: &str) -> usize {
        let before = self.items.len();
        let ids = &mut self.ids;
        self.items.retain(|item| {
            let matches = item.is_document_from(source);
            if matches {
                ids.remove(&item.id);
            }
            !matches
        });
        before - self.items.len()
    }

    /// Distinct document sources in first-ingested order.
    pub fn list_sources(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut sources = Vec::new();
        for item in &self.items {
            if let Some(name) = item.document_source()
                && seen.insert(name)
            {
                sources.push(name.to_string());
            }
        }
        sources
    }

    fn validate(&self, item: &KnowledgeItem) -> Result<()> {
        if item.content.trim().is_empty() {
            return Err(Error::InvalidInput(format!(
                "knowledge item '{}' has empty content",
                item.id
            )));
        }
        if self.ids.contains(&item.id) {
            return Err(Error::DuplicateId(item.id.clone()));
        }
        Ok(())
    }
}
