//! Feature-hashing embedder.
//!
//! Maps each lowercased alphanumeric token to a signed bucket chosen by
//! SHA-256, then L2-normalizes. Lexical rather than semantic, but needs no
//! model download and is stable across processes and platforms.

use sha2::{Digest, Sha256};

use super::{Embedder, l2_normalize, reject_blank};
use crate::errors::Error;

/// Model identifier recorded for collections built with [`HashingEmbedder`].
pub const HASHING_MODEL_ID: &str = "feature-hashing/sha256-unigram";

/// Deterministic bag-of-words embedder.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    /// `dimensions` is clamped to at least 1.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(super::EMBEDDING_DIMS)
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}

fn hash_token_into(vector: &mut [f32], token: &str) {
    let digest = Sha256::digest(token.as_bytes());
    let bucket = u64::from_le_bytes([
        digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
    ]);
    let idx = (bucket % vector.len() as u64) as usize;
    let sign = if digest[8] & 1 == 0 { 1.0f32 } else { -1.0f32 };
    vector[idx] += sign;
}

impl Embedder for HashingEmbedder {
    fn model_id(&self) -> &str {
        HASHING_MODEL_ID
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&mut self, text: &str) -> Result<Vec<f32>, Error> {
        reject_blank(text)?;

        let mut vector = vec![0.0f32; self.dimensions];
        let mut seen = 0usize;
        for token in tokens(text) {
            hash_token_into(&mut vector, &token);
            seen += 1;
        }

        if seen == 0 {
            return Err(Error::Embedding(format!(
                "text contains no alphanumeric tokens: {:?}",
                text
            )));
        }

        Ok(l2_normalize(&vector))
    }
}
