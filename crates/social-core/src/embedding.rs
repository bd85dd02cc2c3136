//! Seeded Embeddings
//!
//! Stand-in for a semantic embedding: a pseudo-random vector seeded by a
//! fixed hash of the exact text, so equal text yields an equal vector across
//! calls, restarts and platforms.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use social_events::Embedding;

/// Produces deterministic vectors of a fixed dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedEmbedder {
    dim: usize,
}

impl SeedEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    /// Vector for `text`, values in [0, 1).
    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut rng = ChaCha8Rng::seed_from_u64(fnv1a(text.as_bytes()));
        (0..self.dim).map(|_| rng.gen::<f32>()).collect()
    }

    /// The `(text, vector)` pair a memory store expects.
    pub fn embed(&self, text: &str) -> Embedding {
        Embedding {
            key: text.to_string(),
            vector: self.vector(text),
        }
    }
}

/// 64-bit FNV-1a.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, &b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}
