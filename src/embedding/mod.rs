//! Query embedding for the semantic cache tier.
//!
//! The router treats the real sentence-embedding model as an external
//! collaborator; what ships in-tree is a deterministic feature-hashing
//! projection that maps text to a fixed-dimension unit vector. It is
//! cheap, dependency-free, and stable across processes, which is what
//! the cache key space needs. Swapping in a real model only means
//! replacing [`QueryEmbedder::embed`]'s inner projection.
//!
//! The projection is CPU-bound and synchronous, so `embed` dispatches it
//! onto the blocking worker pool rather than stalling the I/O loop.

pub mod error;

pub use error::EmbeddingError;

use sha2::{Digest, Sha256};

/// Default embedder name.
pub const DEFAULT_EMBEDDER: &str = "hashed-bow";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EmbedderMode {
    Disabled,
    Hashed,
}

/// Fixed-dimension text embedder with an on/off capability.
#[derive(Debug, Clone)]
pub struct QueryEmbedder {
    mode: EmbedderMode,
    dim: usize,
}

impl QueryEmbedder {
    /// Builds an embedder from its configured name and dimension.
    ///
    /// `off`, `disabled`, `none`, or an empty name produce a disabled
    /// embedder. A `hashed-bow-<D>` name carries a fixed dimension that
    /// overrides the configured one.
    pub fn from_config(name: &str, dim: usize) -> Self {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "" | "off" | "disabled" | "none" => Self {
                mode: EmbedderMode::Disabled,
                dim,
            },
            _ => {
                let dim = name
                    .strip_prefix("hashed-bow-")
                    .and_then(|suffix| suffix.parse::<usize>().ok())
                    .filter(|d| *d > 0)
                    .unwrap_or(dim);
                Self {
                    mode: EmbedderMode::Hashed,
                    dim,
                }
            }
        }
    }

    /// Returns a disabled embedder.
    pub fn disabled(dim: usize) -> Self {
        Self {
            mode: EmbedderMode::Disabled,
            dim,
        }
    }

    /// Whether this embedder can produce vectors.
    pub fn enabled(&self) -> bool {
        self.mode == EmbedderMode::Hashed
    }

    /// Output vector dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Embeds `text` into a unit vector of [`Self::dim`] components.
    ///
    /// Runs on the blocking worker pool. Fails with
    /// [`EmbeddingError::Disabled`] when the embedder is off; the caller
    /// bypasses the semantic tier on any error.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if self.mode == EmbedderMode::Disabled {
            return Err(EmbeddingError::Disabled);
        }
        let text = text.trim().to_string();
        if text.is_empty() {
            return Err(EmbeddingError::EmptyInput);
        }

        let dim = self.dim;
        tokio::task::spawn_blocking(move || hashed_projection(&text, dim))
            .await
            .map_err(|e| EmbeddingError::TaskFailed {
                reason: e.to_string(),
            })
    }
}

/// Signed feature-hashing projection over lowercase alphanumeric tokens,
/// L2-normalized.
fn hashed_projection(text: &str, dim: usize) -> Vec<f32> {
    let mut vector = vec![0f32; dim];
    let lowered = text.to_lowercase();
    for token in lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let digest = Sha256::digest(token.as_bytes());
        let bucket = u64::from_le_bytes(
            digest[0..8]
                .try_into()
                .expect("SHA-256 digest always holds at least 8 bytes"),
        ) as usize
            % dim;
        let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign;
    }

    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

/// Cosine similarity between two vectors.
///
/// Returns -1.0 for mismatched lengths or zero-norm inputs so degenerate
/// comparisons always read as a miss against any threshold in [0, 1].
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return -1.0;
    }
    let mut dot = 0f32;
    let mut norm_a = 0f32;
    let mut norm_b = 0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a <= 0.0 || norm_b <= 0.0 {
        return -1.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
