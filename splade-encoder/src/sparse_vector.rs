//! Sparse term-weight vector.
//!
//! Keys are either vocabulary tokens (normal mode) or decimal token ids
//! (debug mode). Every stored weight is finite and strictly positive; entries
//! that are not are dropped on construction, so a vector can never carry a
//! zero weight into the index.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// How pooled vocabulary entries are keyed in the output vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TermKeys {
    /// Vocabulary token strings, e.g. `"東京"`.
    #[default]
    Tokens,
    /// Decimal token ids, e.g. `"1234"`. Used by the debug endpoint.
    Ids,
}

/// Mapping term -> weight. Ordered by key for stable serialization.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SparseVector {
    weights: BTreeMap<String, f32>,
}

impl SparseVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn get(&self, term: &str) -> Option<f32> {
        self.weights.get(term).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.weights.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn into_inner(self) -> BTreeMap<String, f32> {
        self.weights
    }

    /// Entries sorted by descending weight, at most `n`.
    pub fn top_terms(&self, n: usize) -> Vec<(&str, f32)> {
        let mut all: Vec<_> = self.iter().collect();
        all.sort_by(|a, b| b.1.total_cmp(&a.1));
        all.truncate(n);
        all
    }
}

/// Duplicate keys keep the larger weight, matching max-pooling semantics.
impl<K: Into<String>> FromIterator<(K, f32)> for SparseVector {
    fn from_iter<I: IntoIterator<Item = (K, f32)>>(iter: I) -> Self {
        let mut weights = BTreeMap::new();
        for (k, w) in iter {
            if !(w.is_finite() && w > 0.0) {
                continue;
            }
            weights
                .entry(k.into())
                .and_modify(|cur: &mut f32| *cur = cur.max(w))
                .or_insert(w);
        }
        Self { weights }
    }
}

impl<'de> Deserialize<'de> for SparseVector {
    fn deserialize<D: Deserializer<'de>>(de: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, f32>::deserialize(de)?;
        Ok(raw.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn drops_non_positive_and_non_finite_weights() {
        let v: SparseVector = vec![
            ("a", 0.5),
            ("b", 0.0),
            ("c", -1.0),
            ("d", f32::NAN),
            ("e", f32::INFINITY),
        ]
        .into_iter()
        .collect();
        assert_eq!(v.len(), 1);
        assert_eq!(v.get("a"), Some(0.5));
    }

    #[test]
    fn duplicate_keys_keep_max() {
        let v: SparseVector = vec![("x", 0.2), ("x", 0.9), ("x", 0.4)].into_iter().collect();
        assert_eq!(v.get("x"), Some(0.9));
    }

    #[test]
    fn serializes_as_plain_object() {
        let v: SparseVector = vec![("東京", 1.5), ("天気", 0.25)].into_iter().collect();
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json, serde_json::json!({"東京": 1.5, "天気": 0.25}));
    }

    #[test]
    fn deserialize_filters_zero_weights() {
        let v: SparseVector = serde_json::from_str(r#"{"a": 0.0, "b": 2.0}"#).unwrap();
        assert_eq!(v.len(), 1);
        assert!(v.get("a").is_none());
    }

    #[test]
    fn top_terms_orders_by_weight() {
        let v: SparseVector = vec![("a", 0.1), ("b", 3.0), ("c", 1.0)].into_iter().collect();
        let top = v.top_terms(2);
        assert_eq!(top, vec![("b", 3.0), ("c", 1.0)]);
    }

    proptest! {
        #[test]
        fn stored_weights_are_positive_and_duplicates_keep_max(
            entries in proptest::collection::vec(("[a-c]{1,2}", proptest::num::f32::ANY), 0..40)
        ) {
            let v: SparseVector = entries.iter().cloned().collect();

            for (term, w) in v.iter() {
                prop_assert!(w.is_finite() && w > 0.0);
                let best = entries
                    .iter()
                    .filter(|(k, x)| k == term && x.is_finite() && *x > 0.0)
                    .map(|(_, x)| *x)
                    .fold(f32::MIN, f32::max);
                prop_assert_eq!(w, best);
            }

            let expected_keys = entries
                .iter()
                .filter(|(_, x)| x.is_finite() && *x > 0.0)
                .map(|(k, _)| k.as_str())
                .collect::<std::collections::BTreeSet<_>>();
            prop_assert_eq!(v.len(), expected_keys.len());
        }
    }
}
