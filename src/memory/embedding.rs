//! Embedding capability used for semantic alignment.
//!
//! The memory store never interprets meaning text itself; it asks an
//! [`EmbeddingFunction`] for a vector and compares directions. Implementations
//! must be deterministic for equal input and return a fixed dimension.

use sha2::{Digest, Sha256};

/// Converts meaning text into a fixed-dimension vector.
pub trait EmbeddingFunction: Send + Sync {
    /// Embed a single text.
    fn embed_query(&self, input: &str) -> Result<Vec<f64>, anyhow::Error>;

    /// Dimension of every vector this function returns.
    fn dimension(&self) -> usize;

    /// Embed several texts.
    fn embed_documents(&self, inputs: &[String]) -> Result<Vec<Vec<f64>>, anyhow::Error> {
        inputs.iter().map(|text| self.embed_query(text)).collect()
    }
}

/// Default dimension for [`HashingEmbedder`].
pub const DEFAULT_HASHING_DIMENSION: usize = 64;

/// Bag-of-words feature-hashing embedder.
///
/// Each lowercased whitespace token is hashed with SHA-256; the first eight
/// bytes pick a bucket and the ninth byte picks a sign. The result is L2
/// normalised. Texts sharing vocabulary point in similar directions, which
/// is all alignment scoring needs.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    /// Create an embedder producing `dimension`-sized vectors (minimum 1).
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIMENSION)
    }
}

impl EmbeddingFunction for HashingEmbedder {
    fn embed_query(&self, input: &str) -> Result<Vec<f64>, anyhow::Error> {
        let mut vector = vec![0.0; self.dimension];
        for token in input.split_whitespace() {
            let digest = Sha256::digest(token.to_lowercase().as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        let norm = vector.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            for x in vector.iter_mut() {
                *x /= norm;
            }
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
