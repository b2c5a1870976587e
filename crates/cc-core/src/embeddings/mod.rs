//! Semantic Embeddings Module
//!
//! Provides local embedding generation using fastembed (ONNX-based).
//! No external API calls required — the embedding provider contract in
//! SPEC_FULL.md §6 is realized entirely in-process.
//!
//! Used by the salience scorer's novelty dimension (§4.2) and the System-2
//! context bundle's related-memory retrieval (§4.3).

mod local;

pub use local::{
    cosine_similarity, dot_product, euclidean_distance, matryoshka_truncate, Embedding,
    EmbeddingError, EmbeddingService, BATCH_SIZE, EMBEDDING_DIMENSIONS, MAX_TEXT_LENGTH,
};
