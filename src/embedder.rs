//! Remote embedding access with an exact-text cache and graceful degradation.
//!
//! [`EmbeddingProvider`] is the only entry point the rest of the crate uses.
//! It never surfaces transport failures to callers: when the backend errors,
//! it logs a warning and hands back a zero-vector [`Embedding::Fallback`] so
//! retrieval can continue on keyword matching alone. Fallback vectors are
//! never cached, so the next request retries the service.

use std::{
    collections::HashMap,
    env,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::{
    embedding::Embedding,
    error::{Error, Result},
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_DIMENSION: usize = 1536;

const BASE_URL_ENV: &str = "NUTRIRAG_EMBED_URL";
const MODEL_ENV: &str = "NUTRIRAG_EMBED_MODEL";
const API_KEY_ENV: &str = "NUTRIRAG_API_KEY";
const API_KEY_FALLBACK_ENV: &str = "OPENAI_API_KEY";

/// Connection settings for an OpenAI-compatible embeddings endpoint.
#[derive(Debug, Clone)]
pub struct EmbedderConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub dimension: usize,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            dimension: DEFAULT_DIMENSION,
        }
    }
}

impl EmbedderConfig {
    /// Reads settings from the environment. `NUTRIRAG_API_KEY` wins over
    /// `OPENAI_API_KEY`; unset variables keep the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = env::var(BASE_URL_ENV)
            && !url.is_empty()
        {
            config.base_url = url;
        }
        if let Ok(model) = env::var(MODEL_ENV)
            && !model.is_empty()
        {
            config.model = model;
        }
        config.api_key = env::var(API_KEY_ENV)
            .or_else(|_| env::var(API_KEY_FALLBACK_ENV))
            .ok()
            .filter(|key| !key.is_empty());
        config
    }
}

/// Source of raw embedding vectors.
///
/// Implementations return one vector per input text, in input order, or an
/// error for the whole batch. [`EmbeddingProvider`] handles caching and
/// fallback on top of this.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    fn dimension(&self) -> usize;
}

/// Client for the `POST {base_url}/embeddings` endpoint of OpenAI-compatible
/// services.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    config: EmbedderConfig,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(config: EmbedderConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl EmbeddingBackend for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let url = format!("{}/embeddings", self.config.base_url.trim_end_matches('/'));
        let mut request = self.client.post(&url).json(&json!({
            "model": self.config.model,
            "input": texts,
        }));
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::EmbeddingService(format!(
                "request failed with {status}: {body}"
            )));
        }

        let payload: EmbeddingResponse = response.json().await?;
        if payload.data.len() != texts.len() {
            return Err(Error::EmbeddingService(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                payload.data.len()
            )));
        }

        // Services may reorder results; the index field is authoritative.
        let mut data = payload.data;
        data.sort_by_key(|entry| entry.index);

        let mut vectors = Vec::with_capacity(data.len());
        for entry in data {
            if entry.embedding.len() != self.config.dimension {
                return Err(Error::DimensionMismatch {
                    expected: self.config.dimension,
                    got: entry.embedding.len(),
                });
            }
            vectors.push(entry.embedding);
        }
        Ok(vectors)
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }
}

/// Caching facade over an [`EmbeddingBackend`].
pub struct EmbeddingProvider {
    backend: Arc<dyn EmbeddingBackend>,
    cache: Mutex<HashMap<String, Vec<f32>>>,
}

impl EmbeddingProvider {
    pub fn new(backend: Arc<dyn EmbeddingBackend>) -> Self {
        Self {
            backend,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn openai(config: EmbedderConfig) -> Self {
        Self::new(Arc::new(OpenAiEmbedder::new(config)))
    }

    pub fn dimension(&self) -> usize {
        self.backend.dimension()
    }

    /// Number of distinct texts with cached vectors.
    pub fn cache_len(&self) -> usize {
        self.cache().len()
    }

    /// Embeds one text, consulting the cache first.
    ///
    /// Blank input is the only error path. A failing backend produces a
    /// zero-vector [`Embedding::Fallback`] instead of an error.
    pub async fn embed(&self, text: &str) -> Result<Embedding> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("cannot embed empty text".into()));
        }
        if let Some(vector) = self.cache().get(text).cloned() {
            return Ok(Embedding::Real(vector));
        }

        let request = [text.to_string()];
        match self.backend.embed_batch(&request).await {
            Ok(vectors) => match vectors.into_iter().next() {
                Some(vector) => {
                    self.cache().insert(text.to_string(), vector.clone());
                    Ok(Embedding::Real(vector))
                }
                None => {
                    warn!("embedding service returned no vector, using fallback");
                    Ok(Embedding::fallback(self.dimension()))
                }
            },
            Err(error) => {
                warn!(%error, "embedding request failed, using zero-vector fallback");
                Ok(Embedding::fallback(self.dimension()))
            }
        }
    }

    /// Embeds many texts with one backend call for the cache misses.
    ///
    /// Results line up with the input order. Cached texts never touch the
    /// backend; if the call for the misses fails, only those positions
    /// degrade to fallback vectors.
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        for (position, text) in texts.iter().enumerate() {
            if text.trim().is_empty() {
                return Err(Error::InvalidInput(format!(
                    "cannot embed empty text at position {position}"
                )));
            }
        }

        let mut results: Vec<Option<Embedding>> = vec![None; texts.len()];
        let mut misses = Vec::new();
        {
            let cache = self.cache();
            for (position, text) in texts.iter().enumerate() {
                match cache.get(text.as_str()) {
                    Some(vector) => results[position] = Some(Embedding::Real(vector.clone())),
                    None => misses.push(position),
                }
            }
        }

        if !misses.is_empty() {
            let request: Vec<String> = misses.iter().map(|&i| texts[i].clone()).collect();
            match self.backend.embed_batch(&request).await {
                Ok(vectors) if vectors.len() == misses.len() => {
                    let mut cache = self.cache();
                    for (&position, vector) in misses.iter().zip(vectors) {
                        cache.insert(texts[position].clone(), vector.clone());
                        results[position] = Some(Embedding::Real(vector));
                    }
                }
                Ok(vectors) => {
                    warn!(
                        expected = misses.len(),
                        got = vectors.len(),
                        "embedding service returned a partial batch, using fallbacks"
                    );
                    for &position in &misses {
                        results[position] = Some(Embedding::fallback(self.dimension()));
                    }
                }
                Err(error) => {
                    warn!(
                        %error,
                        misses = misses.len(),
                        "embedding request failed, using zero-vector fallbacks"
                    );
                    for &position in &misses {
                        results[position] = Some(Embedding::fallback(self.dimension()));
                    }
                }
            }
        }

        Ok(results.into_iter().flatten().collect())
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, Vec<f32>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
