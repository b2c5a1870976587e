//! Consolidator driver (C10, §4.6): turns clusters into ConsolidationLogEntry
//! rows and, above an importance threshold, Reflections.

use super::abstraction::Abstractor;
use super::cluster::{cluster_by_similarity, ClusterItem};
use crate::domain::{ConsolidationLogEntry, Reflection, ReflectionType};

pub struct ConsolidatorConfig {
    pub similarity_threshold: f32,
    pub min_cluster_size: usize,
    pub reflection_importance_threshold: f32,
}

pub struct ConsolidationRun {
    pub entries: Vec<ConsolidationLogEntry>,
    pub reflections: Vec<Reflection>,
}

pub struct Consolidator {
    abstractor: Box<dyn Abstractor>,
    config: ConsolidatorConfig,
}

impl Consolidator {
    pub fn new(abstractor: Box<dyn Abstractor>, config: ConsolidatorConfig) -> Self {
        Self { abstractor, config }
    }

    /// Cluster `items`, abstract each cluster, and emit one ConsolidationLogEntry
    /// per cluster plus Reflections for clusters whose summed importance
    /// clears the threshold. The caller is responsible for the idempotent
    /// insert (`Storage::insert_consolidation_entry_if_new` dedupes by
    /// `source_set_hash`); this function is pure and may be called
    /// repeatedly over the same input without side effects of its own.
    pub fn run(&self, items: &[ClusterItem]) -> ConsolidationRun {
        let clusters = cluster_by_similarity(items, self.config.similarity_threshold, self.config.min_cluster_size);

        let mut entries = Vec::new();
        let mut reflections = Vec::new();

        for cluster in clusters {
            let Ok(abstraction) = self.abstractor.summarize(&cluster) else {
                tracing::warn!("abstraction failed for a cluster, skipping");
                continue;
            };

            let source_ids: Vec<String> = cluster.iter().map(|c| c.id.clone()).collect();
            let importance_sum: f32 = cluster.iter().map(|c| c.importance).sum();
            let source_set_hash = ConsolidationLogEntry::hash_source_ids(&source_ids);

            entries.push(ConsolidationLogEntry {
                id: uuid::Uuid::new_v4().to_string(),
                source_type: "episodic".to_string(),
                source_count: cluster.len() as u32,
                topic_cluster: abstraction.text.clone(),
                abstraction: abstraction.text.clone(),
                target_type: "knowledge_node".to_string(),
                target_id: uuid::Uuid::new_v4().to_string(),
                confidence: abstraction.confidence,
                source_ids: source_ids.clone(),
                source_set_hash,
                created_at: chrono::Utc::now(),
            });

            if importance_sum > self.config.reflection_importance_threshold {
                reflections.push(Reflection::new(
                    ReflectionType::Insight,
                    abstraction.text,
                    format!("consolidated from {} episodic items", cluster.len()),
                    importance_sum,
                    source_ids,
                ));
            }
        }

        ConsolidationRun { entries, reflections }
    }

    /// A Reflection may itself enter a later cluster; when it does, its
    /// child inherits a deeper `depth_level` (§4.6 step 4).
    pub fn nest_reflection(&self, parent: &Reflection, items: &[ClusterItem]) -> Option<Reflection> {
        let cluster = cluster_by_similarity(items, self.config.similarity_threshold, self.config.min_cluster_size).into_iter().next()?;
        let abstraction = self.abstractor.summarize(&cluster).ok()?;
        let importance_sum: f32 = cluster.iter().map(|c| c.importance).sum();
        Some(Reflection::nested_from(parent, abstraction.text, importance_sum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidation::abstraction::TemplatedAbstractor;

    fn config() -> ConsolidatorConfig {
        ConsolidatorConfig { similarity_threshold: 0.3, min_cluster_size: 2, reflection_importance_threshold: 1.5 }
    }

    fn item(id: &str, text: &str, importance: f32) -> ClusterItem {
        ClusterItem { id: id.to_string(), text: text.to_string(), embedding: Vec::new(), importance }
    }

    #[test]
    fn clustered_items_produce_one_log_entry() {
        let consolidator = Consolidator::new(Box::new(TemplatedAbstractor), config());
        let items = vec![
            item("a", "asked about the budget report", 1.0),
            item("b", "asked again about the budget report", 1.0),
        ];
        let run = consolidator.run(&items);
        assert_eq!(run.entries.len(), 1);
        assert_eq!(run.entries[0].source_count, 2);
    }

    #[test]
    fn high_importance_cluster_yields_a_reflection() {
        let consolidator = Consolidator::new(Box::new(TemplatedAbstractor), config());
        let items = vec![
            item("a", "felt anxious about the deadline", 1.0),
            item("b", "felt anxious about the deadline again", 1.0),
        ];
        let run = consolidator.run(&items);
        assert_eq!(run.reflections.len(), 1);
    }

    #[test]
    fn rerunning_same_cluster_yields_same_source_hash() {
        let consolidator = Consolidator::new(Box::new(TemplatedAbstractor), config());
        let items = vec![item("a", "same topic", 1.0), item("b", "same topic here too", 1.0)];
        let first = consolidator.run(&items);
        let second = consolidator.run(&items);
        assert_eq!(first.entries[0].source_set_hash, second.entries[0].source_set_hash);
    }
}
