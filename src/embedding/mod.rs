//! Text-to-vector embedding functions.
//!
//! The index owns an [`Embedder`] and calls it on every upsert and query, so
//! stored and queried vectors always come from the same function.

mod hashing;
mod onnx;

pub use hashing::{HASHING_MODEL_ID, HashingEmbedder};
pub use onnx::{EMBEDDING_DIMS, OnnxEmbedder};

use crate::errors::Error;

/// A pluggable embedding function.
///
/// `embed` takes `&mut self` because ONNX sessions mutate internal state
/// while running. Implementations must be deterministic for a given model:
/// the same text always yields the same vector.
pub trait Embedder: Send {
    /// Identifier recorded with each collection (e.g. a HuggingFace model id).
    fn model_id(&self) -> &str;

    /// Length of every vector returned by `embed`.
    fn dimensions(&self) -> usize;

    /// Embed a single text.
    ///
    /// # Errors
    ///
    /// Returns `Error::Embedding` for empty or unembeddable input, or the
    /// underlying runtime error if inference fails.
    fn embed(&mut self, text: &str) -> Result<Vec<f32>, Error>;
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn model_id(&self) -> &str {
        (**self).model_id()
    }

    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn embed(&mut self, text: &str) -> Result<Vec<f32>, Error> {
        (**self).embed(text)
    }
}

pub(crate) fn reject_blank(text: &str) -> Result<(), Error> {
    if text.trim().is_empty() {
        return Err(Error::Embedding(
            "cannot embed empty or whitespace-only text".to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn l2_normalize(vec: &[f32]) -> Vec<f32> {
    let norm: f32 = vec.iter().map(|&x| x * x).sum::<f32>().sqrt();
    let norm = norm.max(1e-9);

    vec.iter().map(|&x| x / norm).collect()
}
