//! Thin adapter over the Elasticsearch REST API.
//!
//! Concentrates every HTTP interaction with the cluster behind a minimal API:
//! index (re)creation, `_bulk` indexing and `_search`. Non-success responses
//! are logged with a body snippet and surfaced as [`RagError::Elastic`].

use std::time::{Duration, Instant};

use reqwest::{Client, Response, StatusCode, header};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error, info, instrument};

use crate::config::StoreConfig;
use crate::errors::RagError;
use crate::query::{SPARSE_FIELD, SparseQuery};
use crate::record::{IndexedDocument, PassageSource, RankedPassage};
use crate::store::{PassageStore, StoreFuture};

/// Index mapping for passage documents.
pub fn index_mapping(text_analyzer: &str) -> Value {
    json!({
        "mappings": {
            "properties": {
                "text": { "type": "text", "analyzer": text_analyzer },
                "title": {
                    "type": "text",
                    "analyzer": text_analyzer,
                    "fields": { "keyword": { "type": "keyword" } }
                },
                "url": { "type": "keyword" },
                "updated": { "type": "date" },
                SPARSE_FIELD: { "type": "rank_features" }
            }
        }
    })
}

pub struct ElasticFacade {
    client: Client,
    base_url: String,
    index: String,
    text_analyzer: String,
}

impl ElasticFacade {
    /// Creates a new facade from the given configuration.
    pub fn new(cfg: &StoreConfig) -> Result<Self, RagError> {
        cfg.validate()?;

        let mut headers = header::HeaderMap::new();
        if let Some(key) = &cfg.api_key {
            let value = header::HeaderValue::from_str(&format!("ApiKey {key}"))
                .map_err(|e| RagError::Config(format!("invalid ELASTICSEARCH_API_KEY: {e}")))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: cfg.url.trim().trim_end_matches('/').to_string(),
            index: cfg.index.clone(),
            text_analyzer: cfg.text_analyzer.clone(),
        })
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    fn index_url(&self) -> String {
        format!("{}/{}", self.base_url, self.index)
    }

    /// Passes 2xx responses through, converts everything else into [`RagError::Elastic`].
    async fn ensure_success(resp: Response, url: &str, started: Instant) -> Result<Response, RagError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let snippet: String = body.trim().chars().take(300).collect();
        error!(
            %status,
            %url,
            %snippet,
            latency_ms = started.elapsed().as_millis(),
            "elasticsearch returned non-success status"
        );
        Err(RagError::Elastic {
            status,
            url: url.to_string(),
            snippet,
        })
    }

    #[instrument(skip_all, fields(index = %self.index, clauses = query.clauses.len(), size = query.size))]
    async fn search_impl(&self, query: &SparseQuery) -> Result<Vec<RankedPassage>, RagError> {
        let url = format!("{}/_search", self.index_url());
        let started = Instant::now();

        let resp = self
            .client
            .post(&url)
            .json(&query.to_es_body())
            .send()
            .await?;
        let resp = Self::ensure_success(resp, &url, started).await?;

        let parsed: SearchResponse = resp
            .json()
            .await
            .map_err(|e| RagError::Decode(format!("search response: {e}")))?;

        let out: Vec<RankedPassage> = parsed
            .hits
            .hits
            .into_iter()
            .map(|h| RankedPassage {
                text: h.source.text,
                title: h.source.title,
                url: h.source.url,
                score: h.score.unwrap_or_default(),
            })
            .collect();

        debug!(
            hits = out.len(),
            latency_ms = started.elapsed().as_millis(),
            "search completed"
        );
        Ok(out)
    }

    #[instrument(skip_all, fields(index = %self.index))]
    async fn recreate_impl(&self) -> Result<(), RagError> {
        let url = self.index_url();
        let started = Instant::now();

        let head = self.client.head(&url).send().await?;
        match head.status() {
            StatusCode::NOT_FOUND => debug!("index does not exist yet"),
            s if s.is_success() => {
                info!("Deleting existing index '{}'", self.index);
                let resp = self.client.delete(&url).send().await?;
                Self::ensure_success(resp, &url, started).await?;
            }
            _ => {
                Self::ensure_success(head, &url, started).await?;
            }
        }

        info!("Creating index '{}' (analyzer={})", self.index, self.text_analyzer);
        let resp = self
            .client
            .put(&url)
            .json(&index_mapping(&self.text_analyzer))
            .send()
            .await?;
        Self::ensure_success(resp, &url, started).await?;
        Ok(())
    }

    #[instrument(skip_all, fields(index = %self.index, docs = docs.len()))]
    async fn bulk_impl(&self, docs: &[IndexedDocument]) -> Result<usize, RagError> {
        if docs.is_empty() {
            debug!("No documents provided for bulk indexing");
            return Ok(0);
        }

        let url = format!("{}/_bulk", self.base_url);
        let started = Instant::now();

        let action = serde_json::to_string(&json!({ "index": { "_index": self.index } }))?;
        let mut body = String::new();
        for doc in docs {
            body.push_str(&action);
            body.push('\n');
            body.push_str(&serde_json::to_string(doc)?);
            body.push('\n');
        }

        let resp = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, "application/x-ndjson")
            .body(body)
            .send()
            .await?;
        let resp = Self::ensure_success(resp, &url, started).await?;

        let parsed: BulkResponse = resp
            .json()
            .await
            .map_err(|e| RagError::Decode(format!("bulk response: {e}")))?;

        if parsed.errors {
            let failed: Vec<&BulkItemResult> = parsed
                .items
                .iter()
                .filter_map(|item| item.values().next())
                .filter(|r| r.error.is_some())
                .collect();
            let first_reason = failed
                .first()
                .and_then(|r| r.error.as_ref())
                .map(|e| e.to_string())
                .unwrap_or_default();
            return Err(RagError::BulkRejected {
                failed: failed.len(),
                total: docs.len(),
                first_reason,
            });
        }

        info!(
            "Indexed {} documents to '{}' in {} ms",
            docs.len(),
            self.index,
            started.elapsed().as_millis()
        );
        Ok(docs.len())
    }
}

impl PassageStore for ElasticFacade {
    fn search<'a>(&'a self, query: &'a SparseQuery) -> StoreFuture<'a, Vec<RankedPassage>> {
        Box::pin(self.search_impl(query))
    }

    fn recreate_index(&self) -> StoreFuture<'_, ()> {
        Box::pin(self.recreate_impl())
    }

    fn bulk_index<'a>(&'a self, docs: &'a [IndexedDocument]) -> StoreFuture<'a, usize> {
        Box::pin(self.bulk_impl(docs))
    }
}

/* ---- response payloads ---- */

#[derive(Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Deserialize)]
struct SearchHit {
    #[serde(rename = "_score")]
    score: Option<f32>,
    #[serde(rename = "_source", default)]
    source: PassageSource,
}

#[derive(Deserialize)]
struct BulkResponse {
    errors: bool,
    #[serde(default)]
    items: Vec<std::collections::HashMap<String, BulkItemResult>>,
}

#[derive(Deserialize)]
struct BulkItemResult {
    #[serde(default)]
    error: Option<Value>,
}
