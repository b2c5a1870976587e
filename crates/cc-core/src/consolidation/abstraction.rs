//! The deliberation contract Consolidator clusters go through (§4.6 step 2,
//! §6): cluster items in, one natural-language abstraction plus a
//! confidence out. Shares its error type with the System-2 deliberation
//! seam (`thought::deliberation::DeliberationError`) since both are the
//! same external-call contract applied to different inputs.

use super::cluster::ClusterItem;
use crate::thought::DeliberationError;

pub struct AbstractionOutput {
    pub text: String,
    pub confidence: f32,
}

pub trait Abstractor: Send + Sync {
    fn summarize(&self, cluster: &[ClusterItem]) -> Result<AbstractionOutput, DeliberationError>;
}

/// Offline/no-provider fallback: joins the cluster's texts into a templated
/// summary rather than reaching out to a model. Confidence is fixed low
/// enough that it rarely clears a Reflection's importance threshold on its
/// own.
pub struct TemplatedAbstractor;

impl Abstractor for TemplatedAbstractor {
    fn summarize(&self, cluster: &[ClusterItem]) -> Result<AbstractionOutput, DeliberationError> {
        if cluster.is_empty() {
            return Err(DeliberationError::Unavailable("empty cluster".to_string()));
        }
        let sample = cluster.iter().take(3).map(|c| c.text.as_str()).collect::<Vec<_>>().join("; ");
        Ok(AbstractionOutput {
            text: format!("recurring pattern across {} items: {sample}", cluster.len()),
            confidence: 0.4,
        })
    }
}

/// Gating stand-in used when no real deliberation provider is configured:
/// always declines rather than inventing a templated abstraction (§4.6,
/// "consolidation still writes no ConsolidationLogEntry rows").
pub struct NullAbstractor;

impl Abstractor for NullAbstractor {
    fn summarize(&self, _cluster: &[ClusterItem]) -> Result<AbstractionOutput, DeliberationError> {
        Err(DeliberationError::Unavailable("no deliberation contract configured".to_string()))
    }
}
