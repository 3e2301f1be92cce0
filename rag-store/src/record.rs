//! Core data models used by the library.

use serde::{Deserialize, Serialize};
use splade_encoder::SparseVector;

/// One retrieved passage, in store order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedPassage {
    pub text: String,
    pub title: String,
    pub url: String,
    /// Store-assigned relevance score; opaque, higher is better.
    pub score: f32,
}

/// Document as stored in the index: one chunk of one page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub title: String,
    pub text: String,
    pub url: String,
    /// Last page update, epoch milliseconds.
    pub updated: i64,
    pub sparse_vector: SparseVector,
}

/// `_source` fields read back at search time. The vector is not needed.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct PassageSource {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

/// Full page as returned by the Scrapbox page API.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SourcePage {
    #[serde(default)]
    pub title: String,
    /// Epoch seconds.
    #[serde(default)]
    pub updated: i64,
    #[serde(default)]
    pub lines: Vec<SourceLine>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SourceLine {
    #[serde(default)]
    pub text: String,
}

impl SourcePage {
    /// Page body: line texts joined with `\n`.
    pub fn full_text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
