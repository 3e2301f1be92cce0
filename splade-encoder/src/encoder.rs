//! SPLADE pooling: `w_v = max_i ( ln(1 + relu(logit_{i,v})) * mask_i )`.

use tracing::{debug, trace};

use crate::error::{EncoderError, Result};
use crate::scorer::{TokenScorer, TokenScores};
use crate::sparse_vector::{SparseVector, TermKeys};

/// Pools masked-LM logits into `(vocab_id, weight)` pairs with weight > 0.
///
/// Padding positions (mask `0`) never contribute. Since `ln(1 + relu(x)) >= 0`,
/// starting each slot at zero and skipping masked rows is equivalent to
/// multiplying by the mask before the max.
pub fn splade_pool(scores: &TokenScores) -> Result<Vec<(u32, f32)>> {
    let (rows, vocab) = scores.logits.dim();
    if rows != scores.attention_mask.len() {
        return Err(EncoderError::Shape(format!(
            "logits have {rows} positions but attention mask has {}",
            scores.attention_mask.len()
        )));
    }

    let mut pooled = vec![0.0f32; vocab];
    for (row, &mask) in scores.logits.outer_iter().zip(&scores.attention_mask) {
        if mask == 0 {
            continue;
        }
        for (slot, &logit) in pooled.iter_mut().zip(row.iter()) {
            // f32::max returns the non-NaN operand, so NaN logits collapse to 0.
            let w = logit.max(0.0).ln_1p();
            if w > *slot {
                *slot = w;
            }
        }
    }

    Ok(pooled
        .into_iter()
        .enumerate()
        .filter(|(_, w)| *w > 0.0)
        .map(|(id, w)| (id as u32, w))
        .collect())
}

/// Synchronous SPLADE encoder over any [`TokenScorer`].
pub struct SpladeEncoder<S> {
    scorer: S,
}

impl<S: TokenScorer> SpladeEncoder<S> {
    pub fn new(scorer: S) -> Self {
        Self { scorer }
    }

    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// Encodes `text` into a sparse vector keyed per `keys`.
    ///
    /// An empty string yields an empty vector without touching the model.
    pub fn encode(&self, text: &str, keys: TermKeys) -> Result<SparseVector> {
        if text.is_empty() {
            return Ok(SparseVector::new());
        }

        let scores = self.scorer.score(text)?;
        let pooled = splade_pool(&scores)?;

        let vector: SparseVector = match keys {
            TermKeys::Ids => pooled
                .into_iter()
                .map(|(id, w)| (id.to_string(), w))
                .collect(),
            TermKeys::Tokens => {
                let mut unknown = 0usize;
                let v: SparseVector = pooled
                    .into_iter()
                    .filter_map(|(id, w)| match self.scorer.token_for_id(id) {
                        Some(tok) => Some((tok, w)),
                        None => {
                            unknown += 1;
                            None
                        }
                    })
                    .collect();
                if unknown > 0 {
                    trace!(unknown, "pooled ids outside tokenizer vocab were skipped");
                }
                v
            }
        };

        debug!(
            model = self.scorer.model_id(),
            chars = text.chars().count(),
            terms = vector.len(),
            top = ?vector.top_terms(5),
            "sparse encoding done"
        );
        Ok(vector)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tract_onnx::prelude::tract_ndarray::Array2;

    /// Scorer with a fixed vocabulary and fixed logits; counts calls.
    pub(crate) struct FixedScorer {
        pub vocab: Vec<&'static str>,
        pub logits: Array2<f32>,
        pub mask: Vec<i64>,
        pub calls: AtomicUsize,
    }

    impl FixedScorer {
        pub(crate) fn new(vocab: Vec<&'static str>, rows: Vec<Vec<f32>>, mask: Vec<i64>) -> Self {
            let n = rows.len();
            let width = vocab.len();
            let flat: Vec<f32> = rows.into_iter().flatten().collect();
            Self {
                vocab,
                logits: Array2::from_shape_vec((n, width), flat).unwrap(),
                mask,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl TokenScorer for FixedScorer {
        fn score(&self, _text: &str) -> Result<TokenScores> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(TokenScores {
                logits: self.logits.clone(),
                attention_mask: self.mask.clone(),
            })
        }

        fn token_for_id(&self, id: u32) -> Option<String> {
            self.vocab.get(id as usize).map(|s| s.to_string())
        }

        fn model_id(&self) -> &str {
            "fixed"
        }
    }

    fn sample() -> FixedScorer {
        FixedScorer::new(
            vec!["[CLS]", "東京", "天気", "雨"],
            vec![
                vec![-3.0, 0.5, -1.0, 0.0],
                vec![-2.0, 2.0, 1.0, -0.5],
                // padding row: large logits must be ignored
                vec![9.0, 9.0, 9.0, 9.0],
            ],
            vec![1, 1, 0],
        )
    }

    #[test]
    fn pools_log_relu_max_over_unmasked_positions() {
        let pooled = splade_pool(&sample().score("x").unwrap()).unwrap();
        assert_eq!(pooled.len(), 2);
        assert_eq!(pooled[0].0, 1);
        assert!((pooled[0].1 - 2.0f32.ln_1p()).abs() < 1e-6);
        assert_eq!(pooled[1].0, 2);
        assert!((pooled[1].1 - 1.0f32.ln_1p()).abs() < 1e-6);
    }

    #[test]
    fn encodes_with_token_keys() {
        let enc = SpladeEncoder::new(sample());
        let v = enc.encode("東京の天気", TermKeys::Tokens).unwrap();
        assert_eq!(v.len(), 2);
        assert!(v.get("東京").unwrap() > v.get("天気").unwrap());
        assert!(v.get("[CLS]").is_none());
        assert!(v.get("雨").is_none());
    }

    #[test]
    fn encodes_with_id_keys() {
        let enc = SpladeEncoder::new(sample());
        let v = enc.encode("東京の天気", TermKeys::Ids).unwrap();
        let keys: Vec<_> = v.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(keys, vec!["1", "2"]);
    }

    #[test]
    fn empty_text_skips_the_model() {
        let enc = SpladeEncoder::new(sample());
        let v = enc.encode("", TermKeys::Tokens).unwrap();
        assert!(v.is_empty());
        assert_eq!(enc.scorer().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn all_negative_logits_give_empty_vector() {
        let enc = SpladeEncoder::new(FixedScorer::new(
            vec!["a", "b"],
            vec![vec![-1.0, -0.1]],
            vec![1],
        ));
        assert!(enc.encode("zzz", TermKeys::Tokens).unwrap().is_empty());
    }

    #[test]
    fn mask_length_mismatch_is_a_shape_error() {
        let enc = SpladeEncoder::new(FixedScorer::new(vec!["a"], vec![vec![1.0]], vec![1, 1]));
        let err = enc.encode("a", TermKeys::Tokens).unwrap_err();
        assert!(matches!(err, EncoderError::Shape(_)));
    }

    #[test]
    fn ids_outside_vocab_are_skipped_in_token_mode() {
        let mut scorer = FixedScorer::new(vec!["a", "b"], vec![vec![1.0, 1.0]], vec![1]);
        scorer.vocab.truncate(1);
        let v = SpladeEncoder::new(scorer).encode("a", TermKeys::Tokens).unwrap();
        assert_eq!(v.len(), 1);
        assert!(v.get("a").is_some());
    }
}
