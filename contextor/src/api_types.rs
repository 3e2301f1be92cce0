//! Public API types re-used by external crates (e.g., the HTTP API layer).

use rag_store::RankedPassage;
use serde::Serialize;

/// Final answer together with the passages it was synthesized from.
///
/// # Example
/// ```
/// use contextor::QaAnswer;
/// let qa = QaAnswer { answer: "晴れです".into(), sources: vec![] };
/// assert!(qa.sources.is_empty());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QaAnswer {
    pub answer: String,
    /// Retrieved passages in store order.
    pub sources: Vec<RankedPassage>,
}
