//! Consolidator (C10, §4.6)
//!
//! Clusters recent episodic rows by topic similarity, abstracts each
//! cluster through the deliberation contract, and writes one
//! ConsolidationLogEntry per cluster (idempotent by source-set hash) plus
//! Reflections for clusters whose importance clears a threshold.

mod abstraction;
mod cluster;
mod consolidator;

pub use abstraction::{AbstractionOutput, Abstractor, NullAbstractor, TemplatedAbstractor};
pub use cluster::{cluster_by_similarity, ClusterItem};
pub use consolidator::{ConsolidationRun, Consolidator, ConsolidatorConfig};
