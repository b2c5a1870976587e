//! Topic clustering by embedding similarity (§4.6 step 1). Degrades to
//! lexical overlap when the `embeddings` feature is unavailable, the same
//! graceful-degradation contract the salience scorer's novelty dimension
//! uses (§4.2).

#[cfg(feature = "embeddings")]
use crate::embeddings::cosine_similarity;

/// One episodic row eligible for clustering: a conversation turn, emotion,
/// or thought within the lookback window.
#[derive(Debug, Clone)]
pub struct ClusterItem {
    pub id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    pub importance: f32,
}

fn similarity(a: &ClusterItem, b: &ClusterItem) -> f32 {
    #[cfg(feature = "embeddings")]
    {
        if !a.embedding.is_empty() && !b.embedding.is_empty() {
            return cosine_similarity(&a.embedding, &b.embedding);
        }
    }
    lexical_overlap(&a.text, &b.text)
}

fn lexical_overlap(a: &str, b: &str) -> f32 {
    let a_tokens: std::collections::HashSet<&str> = a.split_whitespace().collect();
    let b_tokens: std::collections::HashSet<&str> = b.split_whitespace().collect();
    if a_tokens.is_empty() || b_tokens.is_empty() {
        return 0.0;
    }
    let intersection = a_tokens.intersection(&b_tokens).count();
    let union = a_tokens.union(&b_tokens).count();
    intersection as f32 / union.max(1) as f32
}

/// Greedily group items whose similarity to a cluster's first (seed) member
/// clears `similarity_threshold`. Clusters below `min_cluster_size` are
/// dropped, per §4.6: "a cluster must contain at least `min_cluster_size`
/// items."
pub fn cluster_by_similarity(items: &[ClusterItem], similarity_threshold: f32, min_cluster_size: usize) -> Vec<Vec<ClusterItem>> {
    let mut unassigned: Vec<ClusterItem> = items.to_vec();
    let mut clusters = Vec::new();

    while !unassigned.is_empty() {
        let seed = unassigned.remove(0);
        let mut cluster = vec![seed.clone()];

        unassigned.retain(|candidate| {
            if similarity(&seed, candidate) >= similarity_threshold {
                cluster.push(candidate.clone());
                false
            } else {
                true
            }
        });

        if cluster.len() >= min_cluster_size {
            clusters.push(cluster);
        }
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, text: &str) -> ClusterItem {
        ClusterItem { id: id.to_string(), text: text.to_string(), embedding: Vec::new(), importance: 1.0 }
    }

    #[test]
    fn overlapping_text_forms_one_cluster() {
        let items = vec![
            item("a", "checked in about the quarterly report"),
            item("b", "asked again about the quarterly report"),
            item("c", "completely unrelated topic about gardening"),
        ];
        let clusters = cluster_by_similarity(&items, 0.3, 2);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 2);
    }

    #[test]
    fn clusters_below_min_size_are_dropped() {
        let items = vec![item("a", "alpha beta"), item("b", "gamma delta")];
        let clusters = cluster_by_similarity(&items, 0.9, 2);
        assert!(clusters.is_empty());
    }
}
