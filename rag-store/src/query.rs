//! Sparse vector → disjunctive boosted-term query.
//!
//! Each `(term, weight)` becomes one `rank_feature` clause on
//! `sparse_vector.<term>` boosted by `weight`; clauses are OR-ed through
//! `bool.should`, so a passage scores by the features it shares with the query.

use serde_json::{Value, json};
use splade_encoder::SparseVector;

/// Name of the `rank_features` field in the index mapping.
pub const SPARSE_FIELD: &str = "sparse_vector";

#[derive(Clone, Debug, PartialEq)]
pub struct BoostedTerm {
    pub term: String,
    pub boost: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SparseQuery {
    pub clauses: Vec<BoostedTerm>,
    pub size: usize,
}

impl SparseQuery {
    /// `None` for an empty vector: there is nothing to match, and the caller
    /// must not contact the store.
    pub fn from_vector(vector: &SparseVector, top_k: usize) -> Option<Self> {
        if vector.is_empty() {
            return None;
        }
        let clauses = vector
            .iter()
            .map(|(term, boost)| BoostedTerm {
                term: term.to_owned(),
                boost,
            })
            .collect();
        Some(Self {
            clauses,
            size: top_k,
        })
    }

    /// Elasticsearch `_search` request body.
    pub fn to_es_body(&self) -> Value {
        let should: Vec<Value> = self
            .clauses
            .iter()
            .map(|c| {
                json!({
                    "rank_feature": {
                        "field": format!("{SPARSE_FIELD}.{}", c.term),
                        "boost": c.boost,
                    }
                })
            })
            .collect();

        json!({
            "query": { "bool": { "should": should } },
            "size": self.size,
        })
    }
}
