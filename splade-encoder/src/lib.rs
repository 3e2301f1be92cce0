//! SPLADE sparse encoder.
//!
//! Turns text into a sparse term-weight vector by running a masked-LM over
//! the tokenized input and pooling `ln(1 + relu(logits))` with a max over
//! the unmasked positions. Vectors are keyed by vocabulary token, or by
//! token id in debug mode.
//!
//! Two backends implement [`SparseEncoding`]:
//! - [`LocalSpladeEncoder`]: ONNX inference in-process (tract + tokenizers);
//! - [`RemoteSpladeEncoder`]: another encoder service over HTTP.
//!
//! [`EncoderConfig::from_env`] picks one based on `SPLADE_API_URL`.

pub mod config;
pub mod encoder;
pub mod error;
pub mod onnx;
pub mod provider;
pub mod scorer;
pub mod sparse_vector;
pub mod tokenize;

pub use config::{EncoderBackend, EncoderConfig};
pub use encoder::{SpladeEncoder, splade_pool};
pub use error::EncoderError;
pub use provider::{EncodeFuture, LocalSpladeEncoder, RemoteSpladeEncoder, SparseEncoding};
pub use scorer::{TokenScorer, TokenScores};
pub use sparse_vector::{SparseVector, TermKeys};
