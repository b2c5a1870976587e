//! Search Module
//!
//! Recall support for the System-2 context bundle and novelty scoring:
//! - Vector search over embeddings using HNSW (USearch)
//! - Hybrid fusion (RRF / linear combination) of keyword and semantic result
//!   lists, per SPEC_FULL.md §3's hybrid recall supplement

mod hybrid;
mod vector;

pub use vector::{
    VectorIndex, VectorIndexConfig, VectorIndexStats, VectorSearchError, DEFAULT_CONNECTIVITY,
    DEFAULT_DIMENSIONS,
};

pub use hybrid::{linear_combination, reciprocal_rank_fusion, HybridSearchConfig, HybridSearcher};
