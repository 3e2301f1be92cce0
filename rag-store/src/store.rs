//! Passage store seam.

use std::{future::Future, pin::Pin};

use crate::errors::RagError;
use crate::query::SparseQuery;
use crate::record::{IndexedDocument, RankedPassage};

pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RagError>> + Send + 'a>>;

/// Inverted-index style store holding sparse-feature documents.
///
/// Implement this trait to plug in a different backend; the Elasticsearch
/// facade is the production one, the in-memory store backs tests and demos.
pub trait PassageStore: Send + Sync {
    /// Runs a boosted-term query. Hits come back in store order.
    fn search<'a>(&'a self, query: &'a SparseQuery) -> StoreFuture<'a, Vec<RankedPassage>>;

    /// Drops the index if present and creates it with the passage mapping.
    fn recreate_index(&self) -> StoreFuture<'_, ()>;

    /// Indexes a batch; returns the number of accepted documents.
    fn bulk_index<'a>(&'a self, docs: &'a [IndexedDocument]) -> StoreFuture<'a, usize>;
}
