//! Batched ingestion of documents and seed records into the knowledge store.
//!
//! Documents arrive as already-extracted plain text (parsing binary formats
//! is the caller's problem), get chunked, keyworded, embedded in bounded
//! batches, and inserted batch by batch. A batch is fully settled before its
//! items land in the store, so a reader never observes a half-embedded batch.

use tracing::debug;

use crate::{
    chunking::{ChunkingConfig, chunk_text},
    embedder::EmbeddingProvider,
    error::{Error, Result},
    item::{ItemMetadata, KnowledgeItem},
    keywords::{CHUNK_MAX_KEYWORDS, extract_keywords},
    seed::SeedData,
    store::KnowledgeStore,
};

/// How many chunk embeddings are requested per service call.
pub const EMBED_BATCH_SIZE: usize = 10;

/// Plain text handed over by an external document parser.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub file_name: String,
    pub page_count: usize,
    pub text: String,
}

/// Outcome of one document ingestion.
#[derive(Debug, Clone)]
pub struct IngestReport {
    pub source: String,
    /// Number of chunks inserted.
    pub items: usize,
    /// How many of those carry a zero-vector fallback embedding.
    pub fallbacks: usize,
}

/// Chunk, embed, and insert one document.
///
/// 1. Split the text into overlapping chunks and extract chunk keywords
/// 2. Reject the whole document if any chunk id already exists (re-ingesting
///    a file under the same name), before spending anything on embeddings
/// 3. Embed in batches of [`EMBED_BATCH_SIZE`]; each batch is inserted once
///    all its embeddings have settled, then `progress(processed, total)` is
///    invoked exactly once
///
/// A failing embedding service does not abort ingestion: affected chunks are
/// stored with fallback embeddings and counted in the report.
pub async fn ingest_document(
    store: &mut KnowledgeStore,
    provider: &EmbeddingProvider,
    document: &ExtractedDocument,
    config: &ChunkingConfig,
    mut progress: impl FnMut(usize, usize),
) -> Result<IngestReport> {
    if document.text.trim().is_empty() {
        return Err(Error::InvalidInput(format!(
            "document '{}' contains no text",
            document.file_name
        )));
    }

    let chunks = chunk_text(&document.text, config);
    let total = chunks.len();

    let items: Vec<KnowledgeItem> = chunks
        .into_iter()
        .enumerate()
        .map(|(index, chunk)| {
            let keywords = extract_keywords(&chunk, CHUNK_MAX_KEYWORDS);
            KnowledgeItem::new(
                format!("pdf-{}-chunk-{}", document.file_name, index),
                chunk,
                keywords,
                ItemMetadata::Document {
                    file_name: document.file_name.clone(),
                    page_count: document.page_count,
                    chunk_index: index,
                    total_chunks: total,
                },
            )
        })
        .collect();

    for item in &items {
        if store.contains(&item.id) {
            return Err(Error::DuplicateId(item.id.clone()));
        }
    }

    let mut remaining = items.into_iter();
    let mut processed = 0;
    let mut fallbacks = 0;
    loop {
        let mut batch: Vec<KnowledgeItem> =
            remaining.by_ref().take(EMBED_BATCH_SIZE).collect();
        if batch.is_empty() {
            break;
        }

        let texts: Vec<String> = batch.iter().map(|item| item.content.clone()).collect();
        let embeddings = provider.embed_batch(&texts).await?;
        for (item, embedding) in batch.iter_mut().zip(embeddings) {
            if embedding.is_fallback() {
                fallbacks += 1;
            }
            item.embedding = Some(embedding);
        }

        processed += store.insert_batch(batch)?;
        progress(processed, total);
    }

    Ok(IngestReport {
        source: document.file_name.clone(),
        items: total,
        fallbacks,
    })
}

/// Inserts the curated seed records, then backfills their embeddings.
/// Returns the number of items inserted.
pub async fn seed_knowledge_base(
    store: &mut KnowledgeStore,
    provider: &EmbeddingProvider,
    seed: &SeedData,
) -> Result<usize> {
    let inserted = store.insert_batch(seed.items())?;
    debug!(inserted, "seeded evidence records");
    embed_missing(store, provider).await?;
    Ok(inserted)
}

/// Attaches embeddings to every item that lacks one, in batches.
///
/// Fallback vectors are not attached: an item the service could not embed
/// stays unembedded so a later pass can retry once the service recovers.
/// Returns how many items received a real embedding.
pub async fn embed_missing(
    store: &mut KnowledgeStore,
    provider: &EmbeddingProvider,
) -> Result<usize> {
    let todo: Vec<(String, String)> = store
        .all()
        .iter()
        .filter(|item| !item.has_embedding())
        .map(|item| (item.id.clone(), item.content.clone()))
        .collect();
    debug!(missing = todo.len(), "backfilling embeddings");

    let mut attached = 0;
    for batch in todo.chunks(EMBED_BATCH_SIZE) {
        let texts: Vec<String> = batch.iter().map(|(_, content)| content.clone()).collect();
        let embeddings = provider.embed_batch(&texts).await?;
        for ((id, _), embedding) in batch.iter().zip(embeddings) {
            if embedding.is_fallback() {
                continue;
            }
            if store.attach_embedding(id, embedding)? {
                attached += 1;
            }
        }
    }
    Ok(attached)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    };

    use async_trait::async_trait;

    use super::*;
    use crate::embedder::EmbeddingBackend;

    struct StubBackend {
        fail: AtomicBool,
        calls: AtomicUsize,
        batch_sizes: Mutex<Vec<usize>>,
    }

    impl StubBackend {
        fn new() -> Self {
            Self {
                fail: AtomicBool::new(false),
                calls: AtomicUsize::new(0),
                batch_sizes: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EmbeddingBackend for StubBackend {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.batch_sizes.lock().unwrap().push(texts.len());
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::EmbeddingService("stub offline".into()));
            }
            Ok(texts
                .iter()
                .map(|t| vec![t.len() as f32, 1.0, 2.0, 3.0])
                .collect())
        }

        fn dimension(&self) -> usize {
            4
        }
    }

    fn provider() -> (EmbeddingProvider, Arc<StubBackend>) {
        let backend = Arc::new(StubBackend::new());
        (EmbeddingProvider::new(backend.clone()), backend)
    }

    /// 101-character sentences, so 50 of them make a ~5KB document.
    fn filler_text(sentences: usize) -> String {
        (0..sentences)
            .map(|i| {
                format!(
                    "Passage {i:02} talks about food item number {i:02} plus \
                     filler filler filler filler filler filler filler end."
                )
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn report_doc(sentences: usize) -> ExtractedDocument {
        ExtractedDocument {
            file_name: "report.txt".to_string(),
            page_count: 5,
            text: filler_text(sentences),
        }
    }

    #[tokio::test]
    async fn five_kilobyte_document_becomes_three_chunks() {
        let mut store = KnowledgeStore::new();
        let (provider, _backend) = provider();
        let mut progress_calls = Vec::new();

        let report = ingest_document(
            &mut store,
            &provider,
            &report_doc(50),
            &ChunkingConfig::default(),
            |done, total| progress_calls.push((done, total)),
        )
        .await
        .unwrap();

        assert_eq!(report.items, 3);
        assert_eq!(report.fallbacks, 0);
        assert_eq!(report.source, "report.txt");
        assert_eq!(progress_calls, [(3, 3)]);

        for index in 0..3 {
            let item = store.get(&format!("pdf-report.txt-chunk-{index}")).unwrap();
            let length = item.content.chars().count();
            assert!((50..=2300).contains(&length));
            assert!(!item.keywords.is_empty());
            match &item.metadata {
                ItemMetadata::Document {
                    file_name,
                    page_count,
                    chunk_index,
                    total_chunks,
                } => {
                    assert_eq!(file_name, "report.txt");
                    assert_eq!(*page_count, 5);
                    assert_eq!(*chunk_index, index);
                    assert_eq!(*total_chunks, 3);
                }
                other => panic!("expected document metadata, got {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn progress_fires_once_per_batch_in_order() {
        let mut store = KnowledgeStore::new();
        let (provider, backend) = provider();
        // 25 single-sentence chunks: batches of 10, 10, 5.
        let text = (0..25)
            .map(|i| format!("Sentence number {i:02} speaks of item {i:02} in passing end."))
            .collect::<Vec<_>>()
            .join(" ");
        let doc = ExtractedDocument {
            file_name: "long.txt".to_string(),
            page_count: 1,
            text,
        };
        let config = ChunkingConfig {
            target_size: 60,
            overlap_size: 0,
        };
        let mut progress_calls = Vec::new();

        let report = ingest_document(&mut store, &provider, &doc, &config, |done, total| {
            progress_calls.push((done, total))
        })
        .await
        .unwrap();

        assert_eq!(report.items, 25);
        assert_eq!(progress_calls, [(10, 25), (20, 25), (25, 25)]);
        assert_eq!(*backend.batch_sizes.lock().unwrap(), [10, 10, 5]);
        assert_eq!(store.len(), 25);
    }

    #[tokio::test]
    async fn reingesting_a_file_is_rejected_before_any_embedding() {
        let mut store = KnowledgeStore::new();
        let (provider, backend) = provider();
        let doc = report_doc(50);

        ingest_document(
            &mut store,
            &provider,
            &doc,
            &ChunkingConfig::default(),
            |_, _| {},
        )
        .await
        .unwrap();
        let calls_after_first = backend.calls.load(Ordering::SeqCst);

        let err = ingest_document(
            &mut store,
            &provider,
            &doc,
            &ChunkingConfig::default(),
            |_, _| {},
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::DuplicateId(_)));
        assert_eq!(store.len(), 3);
        // The duplicate check runs before the embedding spend.
        assert_eq!(backend.calls.load(Ordering::SeqCst), calls_after_first);
    }

    #[tokio::test]
    async fn offline_service_ingests_with_fallback_embeddings() {
        let mut store = KnowledgeStore::new();
        let (provider, backend) = provider();
        backend.fail.store(true, Ordering::SeqCst);

        let report = ingest_document(
            &mut store,
            &provider,
            &report_doc(50),
            &ChunkingConfig::default(),
            |_, _| {},
        )
        .await
        .unwrap();

        assert_eq!(report.items, 3);
        assert_eq!(report.fallbacks, 3);
        for item in store.all() {
            let embedding = item.embedding.as_ref().unwrap();
            assert!(embedding.is_fallback());
        }
    }

    #[tokio::test]
    async fn blank_document_is_invalid() {
        let mut store = KnowledgeStore::new();
        let (provider, backend) = provider();
        let doc = ExtractedDocument {
            file_name: "empty.txt".to_string(),
            page_count: 0,
            text: "  \n ".to_string(),
        };

        let err = ingest_document(
            &mut store,
            &provider,
            &doc,
            &ChunkingConfig::default(),
            |_, _| {},
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn document_below_minimum_chunk_size_inserts_nothing() {
        let mut store = KnowledgeStore::new();
        let (provider, _backend) = provider();
        let doc = ExtractedDocument {
            file_name: "tiny.txt".to_string(),
            page_count: 1,
            text: "Too small to keep.".to_string(),
        };
        let mut progress_calls = Vec::new();

        let report = ingest_document(
            &mut store,
            &provider,
            &doc,
            &ChunkingConfig::default(),
            |done, total| progress_calls.push((done, total)),
        )
        .await
        .unwrap();

        assert_eq!(report.items, 0);
        assert!(store.is_empty());
        assert!(progress_calls.is_empty());
    }

    #[tokio::test]
    async fn seeding_inserts_records_and_embeds_them() {
        let mut store = KnowledgeStore::new();
        let (provider, backend) = provider();
        let seed = SeedData::from_json(
            r#"{
                "myths": [{
                    "key": "detox-teas",
                    "myth": "Detox teas cleanse your liver",
                    "debunk": "Your liver and kidneys already remove waste.",
                    "science": "No trial shows any added clearance.",
                    "swaps": ["Detox tea -> Herbal tea"]
                }],
                "facts": [{
                    "key": "fiber-intake",
                    "content": "Adults should aim for 30g of fiber per day."
                }]
            }"#,
        )
        .unwrap();

        let inserted = seed_knowledge_base(&mut store, &provider, &seed)
            .await
            .unwrap();

        assert_eq!(inserted, 2);
        assert_eq!(store.len(), 2);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        for item in store.all() {
            assert!(item.embedding.as_ref().is_some_and(|e| !e.is_fallback()));
        }
    }

    #[tokio::test]
    async fn embed_missing_retries_after_recovery() {
        let mut store = KnowledgeStore::new();
        let (provider, backend) = provider();
        let seed = SeedData::from_json(
            r#"{"facts": [{"key": "hydration", "content": "Most adults need 2-3 liters of water daily."}]}"#,
        )
        .unwrap();

        backend.fail.store(true, Ordering::SeqCst);
        let inserted = seed_knowledge_base(&mut store, &provider, &seed)
            .await
            .unwrap();
        assert_eq!(inserted, 1);
        // The fallback is not attached, leaving the item eligible for retry.
        assert!(!store.get("fact-hydration").unwrap().has_embedding());

        backend.fail.store(false, Ordering::SeqCst);
        let attached = embed_missing(&mut store, &provider).await.unwrap();
        assert_eq!(attached, 1);
        assert!(
            store
                .get("fact-hydration")
                .unwrap()
                .embedding
                .as_ref()
                .is_some_and(|e| !e.is_fallback())
        );
    }
}
