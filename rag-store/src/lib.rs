//! Sparse-feature passage store: ingestion + retrieval over Elasticsearch.
//!
//! This crate provides a clean API to:
//! - Turn a sparse vector into a boosted-term query and fetch ranked passages
//! - Split Scrapbox pages into overlapping chunks, encode and bulk-index them
//!
//! The design is flat (no deep nesting) and splits responsibilities into focused modules.

mod chunker;
mod config;
mod elastic_facade;
mod errors;
mod ingest;
mod inmemory;
mod query;
mod record;
mod retrieve;
mod scrapbox;
mod store;

pub use chunker::ChunkSplitter;
pub use config::{IngestConfig, StoreConfig};
pub use elastic_facade::{ElasticFacade, index_mapping};
pub use errors::RagError;
pub use ingest::{IngestReport, Processor, index_pages, run_batch};
pub use inmemory::InMemoryStore;
pub use query::{BoostedTerm, SPARSE_FIELD, SparseQuery};
pub use record::{IndexedDocument, RankedPassage, SourceLine, SourcePage};
pub use retrieve::DEFAULT_TOP_K;
pub use scrapbox::ScrapboxClient;
pub use store::{PassageStore, StoreFuture};

use std::sync::Arc;

use splade_encoder::SparseVector;
use tracing::trace;

/// High-level facade over a [`PassageStore`].
///
/// This is the single entry point recommended for application code.
#[derive(Clone)]
pub struct RagStore {
    store: Arc<dyn PassageStore>,
}

impl RagStore {
    /// Connects to Elasticsearch with the given configuration.
    ///
    /// # Errors
    /// Returns `RagError::Config` if the client initialization fails.
    pub fn new(cfg: &StoreConfig) -> Result<Self, RagError> {
        trace!("RagStore::new index={}", cfg.index);
        Ok(Self::with_store(Arc::new(ElasticFacade::new(cfg)?)))
    }

    /// Wraps an already built store (in-memory, test doubles).
    pub fn with_store(store: Arc<dyn PassageStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn PassageStore {
        self.store.as_ref()
    }

    /// Top-`top_k` passages for a sparse vector, in store order.
    ///
    /// # Errors
    /// Store failures, unmodified.
    pub async fn search(
        &self,
        vector: &SparseVector,
        top_k: usize,
    ) -> Result<Vec<RankedPassage>, RagError> {
        retrieve::search_by_vector(self.store.as_ref(), vector, top_k).await
    }
}
