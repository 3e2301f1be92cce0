//! Retrieval helper: sparse-vector search.

use splade_encoder::SparseVector;
use tracing::{debug, trace};

use crate::errors::RagError;
use crate::query::SparseQuery;
use crate::record::RankedPassage;
use crate::store::PassageStore;

/// Default number of passages requested per query.
pub const DEFAULT_TOP_K: usize = 5;

/// Runs a boosted-term query built from `vector`.
///
/// An empty vector yields an empty result and the store is not contacted.
/// Store errors are returned unchanged.
pub async fn search_by_vector(
    store: &dyn PassageStore,
    vector: &SparseVector,
    top_k: usize,
) -> Result<Vec<RankedPassage>, RagError> {
    let Some(query) = SparseQuery::from_vector(vector, top_k) else {
        debug!("empty sparse vector, skipping search");
        return Ok(Vec::new());
    };
    trace!(clauses = query.clauses.len(), top_k, "retrieve::search_by_vector");
    store.search(&query).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::IndexedDocument;
    use crate::store::StoreFuture;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingStore {
        searches: AtomicUsize,
    }

    impl PassageStore for CountingStore {
        fn search<'a>(&'a self, query: &'a SparseQuery) -> StoreFuture<'a, Vec<RankedPassage>> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            let size = query.size;
            Box::pin(async move {
                Ok(vec![RankedPassage {
                    text: format!("size={size}"),
                    title: "t".into(),
                    url: "u".into(),
                    score: 1.0,
                }])
            })
        }

        fn recreate_index(&self) -> StoreFuture<'_, ()> {
            Box::pin(async { Ok(()) })
        }

        fn bulk_index<'a>(&'a self, docs: &'a [IndexedDocument]) -> StoreFuture<'a, usize> {
            Box::pin(async move { Ok(docs.len()) })
        }
    }

    #[tokio::test]
    async fn empty_vector_never_reaches_the_store() {
        let store = CountingStore::default();
        let hits = search_by_vector(&store, &SparseVector::new(), DEFAULT_TOP_K)
            .await
            .unwrap();
        assert!(hits.is_empty());
        assert_eq!(store.searches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn non_empty_vector_requests_top_k() {
        let store = CountingStore::default();
        let v: SparseVector = vec![("東京", 1.0)].into_iter().collect();
        let hits = search_by_vector(&store, &v, 7).await.unwrap();
        assert_eq!(hits[0].text, "size=7");
        assert_eq!(store.searches.load(Ordering::SeqCst), 1);
    }
}
