//! Process-local passage store.
//!
//! Scores a document as the sum of `boost * weight` over the query terms it
//! carries (linear `rank_feature`). Documents sharing no term are not hits.

use std::sync::RwLock;

use crate::errors::RagError;
use crate::query::SparseQuery;
use crate::record::{IndexedDocument, RankedPassage};
use crate::store::{PassageStore, StoreFuture};

#[derive(Default)]
pub struct InMemoryStore {
    docs: RwLock<Vec<IndexedDocument>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.read().map(|d| d.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock_err() -> RagError {
        RagError::Source("in-memory store lock poisoned".into())
    }

    fn search_sync(&self, query: &SparseQuery) -> Result<Vec<RankedPassage>, RagError> {
        let docs = self.docs.read().map_err(|_| Self::lock_err())?;

        let mut hits: Vec<RankedPassage> = docs
            .iter()
            .filter_map(|doc| {
                let mut matched = false;
                let mut score = 0.0f32;
                for clause in &query.clauses {
                    if let Some(w) = doc.sparse_vector.get(&clause.term) {
                        matched = true;
                        score += clause.boost * w;
                    }
                }
                matched.then(|| RankedPassage {
                    text: doc.text.clone(),
                    title: doc.title.clone(),
                    url: doc.url.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(query.size);
        Ok(hits)
    }
}

impl PassageStore for InMemoryStore {
    fn search<'a>(&'a self, query: &'a SparseQuery) -> StoreFuture<'a, Vec<RankedPassage>> {
        Box::pin(async move { self.search_sync(query) })
    }

    fn recreate_index(&self) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            self.docs.write().map_err(|_| Self::lock_err())?.clear();
            Ok(())
        })
    }

    fn bulk_index<'a>(&'a self, docs: &'a [IndexedDocument]) -> StoreFuture<'a, usize> {
        Box::pin(async move {
            self.docs
                .write()
                .map_err(|_| Self::lock_err())?
                .extend_from_slice(docs);
            Ok(docs.len())
        })
    }
}
