//! Scenario 6 (consolidation idempotence): a lookback window that clusters
//! into two groups produces one ConsolidationLogEntry per cluster; running
//! the Consolidator again over the same input adds nothing.

use cc_core::consolidation::{ClusterItem, Consolidator, ConsolidatorConfig, TemplatedAbstractor};
use cc_e2e_tests::harness::TestDatabaseManager;

fn items() -> Vec<ClusterItem> {
    let mut items = Vec::new();
    for i in 0..7 {
        items.push(ClusterItem {
            id: format!("hydration-{i}"),
            text: "remember to drink water today".to_string(),
            embedding: vec![],
            importance: 0.3,
        });
    }
    for i in 0..5 {
        items.push(ClusterItem {
            id: format!("work-{i}"),
            text: "finish the quarterly report draft".to_string(),
            embedding: vec![],
            importance: 0.3,
        });
    }
    items
}

#[test]
fn rerunning_consolidation_over_same_data_adds_no_rows() {
    let db = TestDatabaseManager::new();
    let consolidator = Consolidator::new(
        Box::new(TemplatedAbstractor),
        ConsolidatorConfig {
            similarity_threshold: 0.3,
            min_cluster_size: 3,
            reflection_importance_threshold: 100.0,
        },
    );

    let items = items();

    let first_run = consolidator.run(&items);
    assert_eq!(first_run.entries.len(), 2, "expected one entry per cluster");
    for entry in &first_run.entries {
        let inserted = db
            .storage
            .insert_consolidation_entry_if_new(entry)
            .expect("insert_consolidation_entry_if_new failed");
        assert!(inserted, "first run should insert every entry");
    }
    assert_eq!(db.storage.consolidation_entry_count().unwrap(), 2);

    let second_run = consolidator.run(&items);
    assert_eq!(second_run.entries.len(), 2, "clustering is deterministic over unchanged input");
    for entry in &second_run.entries {
        let inserted = db
            .storage
            .insert_consolidation_entry_if_new(entry)
            .expect("insert_consolidation_entry_if_new failed");
        assert!(!inserted, "same source set should be rejected as a duplicate");
    }
    assert_eq!(db.storage.consolidation_entry_count().unwrap(), 2, "no additional rows after the second run");
}
