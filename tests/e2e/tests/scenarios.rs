//! End-to-end scenario tests exercising `vestige-core` through its public
//! `tools::` facade and a real SQLite-backed `Storage`, crossing module
//! boundaries the way a caller actually would.
//!
//! Most individual mechanisms (FSRS scheduling, hybrid search fusion, STC
//! capture, the memory state machine, prospective-memory triggers) already
//! carry focused unit tests alongside their implementation. These scenarios
//! instead check that the pieces compose correctly end to end.

use vestige_e2e_tests::harness::TestDatabaseManager;
use vestige_e2e_tests::mocks::TestDataFactory;
use vestige_core::{tools, IngestInput, MemoryState, Rating, RecallInput, SearchMode, SourceType, VestigeConfig};

/// S1: a node ingested, reviewed repeatedly with `Good`, lands in a
/// well-learned state: stability rises, storage strength approaches 1, and
/// `next_review` moves further into the future each time.
#[test]
fn scenario_s1_fsrs_review_lifecycle() {
    let db = TestDatabaseManager::new_temp();
    let node = TestDataFactory::create_memory(&db.storage, "The mitochondria is the powerhouse of the cell")
        .expect("ingest should succeed");

    assert_eq!(node.reps, 0);
    assert!((node.storage_strength - 0.0).abs() < 1e-9 || node.storage_strength >= 0.0);

    let mut previous_interval = None;
    let mut current = node;
    for _ in 0..4 {
        current = tools::review(&db.storage, &current.id, Rating::Good).expect("review should succeed");
        let next = current.next_review.expect("a reviewed node has a next_review");
        let last = current.last_review.expect("a reviewed node has a last_review");
        let interval = next - last;

        if let Some(prev) = previous_interval {
            assert!(interval >= prev, "FSRS intervals should not shrink on consecutive Good reviews");
        }
        previous_interval = Some(interval);
    }

    assert_eq!(current.reps, 4);
    assert_eq!(current.lapses, 0);
    assert!(current.storage_strength > 0.0);
    assert!((current.retrieval_strength - 1.0).abs() < 1e-9);
}

/// A lapse (`Rating::Again`) halves retrieval strength, floored at 0.1, and
/// leaves storage strength untouched, per the dual-strength coupling rule.
#[test]
fn scenario_s1_lapse_drops_retrieval_strength_not_storage() {
    let db = TestDatabaseManager::new_temp();
    let node = TestDataFactory::create_memory(&db.storage, "A fact that will be forgotten").unwrap();

    let after_good = tools::review(&db.storage, &node.id, Rating::Good).unwrap();
    let storage_before_lapse = after_good.storage_strength;

    let after_lapse = tools::review(&db.storage, &after_good.id, Rating::Again).unwrap();

    assert_eq!(after_lapse.lapses, 1);
    assert!((after_lapse.storage_strength - storage_before_lapse).abs() < 1e-9);
    assert!(after_lapse.retrieval_strength <= (1.0_f64 * 0.5).max(0.1) + 1e-9);
    assert!(after_lapse.retrieval_strength >= 0.1 - 1e-9);
}

/// S2: hybrid recall over a topically clustered corpus returns exact
/// keyword matches for their own topic ahead of unrelated clusters.
#[test]
fn scenario_s2_hybrid_search_ranks_topical_matches() {
    let db = TestDatabaseManager::new_temp();
    let config = VestigeConfig::default();
    let _scenario = TestDataFactory::create_search_scenario(&db.storage);

    let input = RecallInput {
        query: "programming language".to_string(),
        limit: 5,
        search_mode: SearchMode::Keyword,
        ..Default::default()
    };

    let results = tools::recall(&db.storage, None, input, &config).expect("recall should succeed");

    assert!(!results.results.is_empty(), "keyword recall should find at least one programming match");
    let top_content = results.results[0].node.content.to_lowercase();
    assert!(
        top_content.contains("rust") || top_content.contains("programming"),
        "top hit should be programming-related, got: {top_content:?}"
    );
}

/// Paging through recall results respects `limit`/`offset` and reports
/// `has_more` accurately across pages.
#[test]
fn scenario_s2_recall_pagination_is_consistent() {
    let db = TestDatabaseManager::new_temp();
    let config = VestigeConfig::default();
    TestDataFactory::create_batch_with_config(
        &db.storage,
        vestige_e2e_tests::mocks::BatchConfig {
            count: 7,
            content_prefix: "paged memory about rust".to_string(),
            ..Default::default()
        },
    );

    let page1 = tools::recall(
        &db.storage,
        None,
        RecallInput { query: "rust".to_string(), limit: 3, offset: 0, search_mode: SearchMode::Keyword, ..Default::default() },
        &config,
    )
    .unwrap();
    assert_eq!(page1.results.len(), 3);
    assert!(page1.has_more);

    let page2 = tools::recall(
        &db.storage,
        None,
        RecallInput { query: "rust".to_string(), limit: 3, offset: 3, search_mode: SearchMode::Keyword, ..Default::default() },
        &config,
    )
    .unwrap();
    assert_eq!(page2.results.len(), 3);

    let ids1: Vec<_> = page1.results.iter().map(|r| r.node.id.clone()).collect();
    let ids2: Vec<_> = page2.results.iter().map(|r| r.node.id.clone()).collect();
    assert!(ids1.iter().all(|id| !ids2.contains(id)), "pages should not overlap");
}

/// A full ingest -> review -> promote -> consolidate -> state journey,
/// checking each stage hands a consistent node to the next.
#[test]
fn scenario_full_ingest_review_consolidate_journey() {
    let mut db = TestDatabaseManager::new_temp();
    let config = VestigeConfig::default();

    let node = tools::ingest(
        &db.storage,
        IngestInput { content: "Spaced repetition improves long-term retention".to_string(), source_type: SourceType::Fact, ..Default::default() },
    )
    .unwrap();

    let reviewed = tools::review(&db.storage, &node.id, Rating::Good).unwrap();
    assert!(reviewed.stability > 0.0);

    let promoted = tools::promote_memory(&db.storage, &reviewed.id).unwrap();
    assert!(promoted.retention_strength > reviewed.retention_strength || (promoted.retention_strength - 1.0).abs() < 1e-9);

    let state = tools::get_memory_state(&db.storage, &promoted.id).unwrap();
    assert_eq!(state, MemoryState::Active, "a freshly promoted node should be Active");

    db.seed_nodes(3);
    let consolidation_result = tools::consolidate(&db.storage, &config).unwrap();
    assert!(consolidation_result.processed >= 1);

    let stats = tools::stats(&db.storage).unwrap();
    assert_eq!(stats.total_nodes, 4);
}

/// `find_tagged`/`tag_stats` see a memory marked important via
/// `trigger_importance`, and not memories that never crossed the threshold.
#[test]
fn scenario_trigger_importance_surfaces_in_tagged_queries() {
    let db = TestDatabaseManager::new_temp();
    let important = TestDataFactory::create_memory(&db.storage, "A critical production incident").unwrap();
    let _ordinary = TestDataFactory::create_memory(&db.storage, "An ordinary note").unwrap();

    tools::trigger_importance(&db.storage, &important.id, "explicit_mark").unwrap();

    let tagged = tools::find_tagged(&db.storage, 0.0, 10).unwrap();
    assert_eq!(tagged.len(), 1);
    assert_eq!(tagged[0].0.id, important.id);

    let stats = tools::tag_stats(&db.storage).unwrap();
    assert_eq!(stats.tagged_count, 1);
    assert_eq!(stats.total_count, 2);
}
