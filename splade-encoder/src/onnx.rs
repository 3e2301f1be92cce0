//! Masked-LM scorer backed by an ONNX export run through tract.

use std::path::Path;
use std::sync::Arc;

use tract_onnx::prelude::*;
use tracing::info;

use crate::error::{EncoderError, Result};
use crate::scorer::{TokenScorer, TokenScores};
use crate::tokenize::SpladeTokenizer;

type TractModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// ONNX masked-LM head: `[1, seq] ids/mask(/types) -> [1, seq, vocab]` logits.
pub struct OnnxMaskedLm {
    model: Arc<TractModel>,
    tokenizer: SpladeTokenizer,
    model_id: String,
    /// Some exports take `token_type_ids` as a third input, some do not.
    with_token_types: bool,
}

impl OnnxMaskedLm {
    pub fn load(
        model_path: impl AsRef<Path>,
        tokenizer: SpladeTokenizer,
        model_id: impl Into<String>,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        let load_err = |e: TractError| EncoderError::ModelLoad(format!("{}: {e}", model_path.display()));

        let graph = tract_onnx::onnx().model_for_path(model_path).map_err(load_err)?;
        let input_count = graph.input_outlets().map_err(load_err)?.len();
        if !(2..=3).contains(&input_count) {
            return Err(EncoderError::ModelLoad(format!(
                "expected 2 or 3 model inputs, found {input_count}"
            )));
        }

        let model = graph
            .into_optimized()
            .map_err(load_err)?
            .into_runnable()
            .map_err(load_err)?;

        let model_id = model_id.into();
        info!(
            model = %model_id,
            path = %model_path.display(),
            inputs = input_count,
            vocab = tokenizer.vocab_size(),
            "SPLADE model loaded"
        );

        Ok(Self {
            model: Arc::new(model),
            tokenizer,
            model_id,
            with_token_types: input_count == 3,
        })
    }
}

impl TokenScorer for OnnxMaskedLm {
    fn score(&self, text: &str) -> Result<TokenScores> {
        let input = self.tokenizer.encode(text)?;
        let seq_len = input.input_ids.len();
        let shape_err = |e: TractError| EncoderError::Shape(e.to_string());

        let mut inputs: TVec<TValue> = tvec![
            Tensor::from_shape(&[1, seq_len], &input.input_ids)
                .map_err(shape_err)?
                .into(),
            Tensor::from_shape(&[1, seq_len], &input.attention_mask)
                .map_err(shape_err)?
                .into(),
        ];
        if self.with_token_types {
            inputs.push(
                Tensor::from_shape(&[1, seq_len], &input.token_type_ids)
                    .map_err(shape_err)?
                    .into(),
            );
        }

        let outputs = self
            .model
            .run(inputs)
            .map_err(|e| EncoderError::Inference(e.to_string()))?;
        let first = outputs
            .first()
            .ok_or_else(|| EncoderError::Shape("model returned no outputs".into()))?;

        let logits = first
            .to_array_view::<f32>()
            .map_err(shape_err)?
            .into_dimensionality::<tract_ndarray::Ix3>()
            .map_err(|e| EncoderError::Shape(format!("expected [batch, seq, vocab]: {e}")))?
            .index_axis(tract_ndarray::Axis(0), 0)
            .to_owned();

        Ok(TokenScores {
            logits,
            attention_mask: input.attention_mask,
        })
    }

    fn token_for_id(&self, id: u32) -> Option<String> {
        self.tokenizer.token_for_id(id)
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
