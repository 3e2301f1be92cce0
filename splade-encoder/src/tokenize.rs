//! `tokenizer.json` wrapper producing model-ready id/mask/type vectors.

use std::path::Path;

use tokenizers::Tokenizer;

use crate::error::{EncoderError, Result};

pub struct SpladeTokenizer {
    tokenizer: Tokenizer,
    max_length: usize,
}

/// Tokenized input ready for model inference (batch of one).
#[derive(Debug, Clone, PartialEq)]
pub struct TokenizedInput {
    pub input_ids: Vec<i64>,
    pub attention_mask: Vec<i64>,
    pub token_type_ids: Vec<i64>,
}

impl SpladeTokenizer {
    pub fn from_file(path: impl AsRef<Path>, max_length: usize) -> Result<Self> {
        let tokenizer = Tokenizer::from_file(path.as_ref())
            .map_err(|e| EncoderError::Tokenizer(format!("{}: {e}", path.as_ref().display())))?;
        Ok(Self::new(tokenizer, max_length))
    }

    pub fn new(tokenizer: Tokenizer, max_length: usize) -> Self {
        Self {
            tokenizer,
            max_length: max_length.max(2),
        }
    }

    pub fn encode(&self, text: &str) -> Result<TokenizedInput> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EncoderError::Tokenizer(e.to_string()))?;

        Ok(truncate(
            TokenizedInput {
                input_ids: encoding.get_ids().iter().map(|&id| id as i64).collect(),
                attention_mask: encoding
                    .get_attention_mask()
                    .iter()
                    .map(|&m| m as i64)
                    .collect(),
                token_type_ids: encoding.get_type_ids().iter().map(|&t| t as i64).collect(),
            },
            self.max_length,
        ))
    }

    pub fn token_for_id(&self, id: u32) -> Option<String> {
        self.tokenizer.id_to_token(id)
    }

    pub fn vocab_size(&self) -> usize {
        self.tokenizer.get_vocab_size(true)
    }
}

/// Cuts the sequence to `max_length`, keeping the trailing special token in place.
fn truncate(mut input: TokenizedInput, max_length: usize) -> TokenizedInput {
    let len = input.input_ids.len();
    if len <= max_length {
        return input;
    }
    for v in [
        &mut input.input_ids,
        &mut input.attention_mask,
        &mut input.token_type_ids,
    ] {
        let last = v[len - 1];
        v.truncate(max_length - 1);
        v.push(last);
    }
    input
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(n: i64) -> TokenizedInput {
        TokenizedInput {
            input_ids: (0..n).collect(),
            attention_mask: vec![1; n as usize],
            token_type_ids: vec![0; n as usize],
        }
    }

    #[test]
    fn short_input_is_untouched() {
        assert_eq!(truncate(seq(4), 8), seq(4));
    }

    #[test]
    fn long_input_keeps_trailing_separator() {
        let out = truncate(seq(10), 4);
        assert_eq!(out.input_ids, vec![0, 1, 2, 9]);
        assert_eq!(out.attention_mask.len(), 4);
        assert_eq!(out.token_type_ids.len(), 4);
    }
}
