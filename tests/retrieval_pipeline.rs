use std::sync::Arc;

use async_trait::async_trait;
use nutrirag::{
    EmbeddingBackend, EmbeddingProvider, Error, ItemMetadata, KnowledgeStore,
    SeedData,
    chunking::ChunkingConfig,
    context::format_context,
    ingestion::{ExtractedDocument, ingest_document, seed_knowledge_base},
    retrieval::retrieve,
};

const DIM: usize = 8;
const TOPICS: [&str; DIM] = [
    "carb",
    "detox",
    "fat",
    "gluten",
    "breakfast",
    "protein",
    "fiber",
    "grain",
];

/// Deterministic stand-in for the embedding service: one dimension per
/// nutrition topic, valued by how often the topic occurs in the text.
/// Texts about the same topic come out colinear, unrelated texts orthogonal.
struct TopicBackend;

#[async_trait]
impl EmbeddingBackend for TopicBackend {
    async fn embed_batch(
        &self,
        texts: &[String],
    ) -> nutrirag::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| topic_vector(text)).collect())
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

fn topic_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    TOPICS
        .iter()
        .map(|topic| lower.matches(topic).count() as f32)
        .collect()
}

/// Embedding service that is unreachable: every request errors out.
struct OfflineBackend;

#[async_trait]
impl EmbeddingBackend for OfflineBackend {
    async fn embed_batch(
        &self,
        _texts: &[String],
    ) -> nutrirag::Result<Vec<Vec<f32>>> {
        Err(Error::EmbeddingService("connection refused".into()))
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

fn evidence_pack() -> SeedData {
    SeedData::from_json(include_str!("../data/evidence.json"))
        .expect("built-in evidence pack parses")
}

fn report_document() -> ExtractedDocument {
    let sentences: Vec<String> = (0..50)
        .map(|i| {
            format!(
                "Daily protein intake supports muscle repair and recovery \
                 for active adults in training block number {i:02}."
            )
        })
        .collect();
    ExtractedDocument {
        file_name: "report.txt".to_string(),
        page_count: 2,
        text: sentences.join(" "),
    }
}

#[test]
fn built_in_evidence_pack_is_complete() {
    let seed = evidence_pack();
    assert_eq!(seed.myths.len(), 5);
    assert_eq!(seed.facts.len(), 5);

    let mut store = KnowledgeStore::new();
    let inserted = store
        .insert_batch(seed.items())
        .expect("pack has unique ids and non-empty contents");
    assert_eq!(inserted, 10);
    assert!(store.contains("myth-carbs-are-bad"));
    assert!(store.contains("fact-fiber-intake"));
}

#[tokio::test]
async fn carb_myth_query_surfaces_the_debunk(
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = EmbeddingProvider::new(Arc::new(TopicBackend));
    let mut store = KnowledgeStore::new();
    seed_knowledge_base(&mut store, &provider, &evidence_pack()).await?;

    let results = retrieve("are carbs bad for you", 3, &store, &provider).await?;

    assert!(!results.is_empty());
    assert_eq!(results[0].id, "myth-carbs-are-bad");

    let context = format_context(&results);
    assert!(context.starts_with("Relevant knowledge from evidence base:"));
    assert!(context.contains("[MYTH] Myth: Carbs are always bad"));
    assert!(context.contains("Sources: NHS, Mayo Clinic"));
    Ok(())
}

#[tokio::test]
async fn ingested_report_is_retrievable_with_chunk_citations(
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = EmbeddingProvider::new(Arc::new(TopicBackend));
    let mut store = KnowledgeStore::new();
    seed_knowledge_base(&mut store, &provider, &evidence_pack()).await?;

    let report = ingest_document(
        &mut store,
        &provider,
        &report_document(),
        &ChunkingConfig::default(),
        |_, _| {},
    )
    .await?;

    assert_eq!(report.items, 3);
    assert_eq!(report.fallbacks, 0);
    assert_eq!(store.len(), 13);

    for index in 0..3 {
        let item = store
            .get(&format!("pdf-report.txt-chunk-{index}"))
            .expect("chunk item");
        let chars = item.content.chars().count();
        assert!((50..=2300).contains(&chars), "chunk of {chars} chars");
        match &item.metadata {
            ItemMetadata::Document {
                file_name,
                chunk_index,
                total_chunks,
                ..
            } => {
                assert_eq!(file_name, "report.txt");
                assert_eq!(*chunk_index, index);
                assert_eq!(*total_chunks, 3);
            }
            other => panic!("expected document metadata, got {other:?}"),
        }
    }

    let results =
        retrieve("how much protein do I need", 3, &store, &provider).await?;
    let context = format_context(&results);
    assert!(context.contains("[PDF: report.txt, Chunk 1/3]"));
    Ok(())
}

#[tokio::test]
async fn offline_service_still_answers_from_keywords(
) -> Result<(), Box<dyn std::error::Error>> {
    let provider = EmbeddingProvider::new(Arc::new(OfflineBackend));
    let mut store = KnowledgeStore::new();
    seed_knowledge_base(&mut store, &provider, &evidence_pack()).await?;

    // Nothing got a usable embedding, so this can only come from keywords.
    assert!(store.all().iter().all(|item| !item.has_embedding()));

    let results =
        retrieve("how much fiber per day is enough", 3, &store, &provider)
            .await?;
    let ids: Vec<&str> = results.iter().map(|item| item.id.as_str()).collect();
    assert!(ids.contains(&"fact-fiber-intake"), "got {ids:?}");
    Ok(())
}
