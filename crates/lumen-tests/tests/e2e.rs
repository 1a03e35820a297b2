//! End-to-end tests for the Lumen trust engine.
//!
//! Each test imports the helper community into a real store, runs the batch
//! scorer, and checks what the directory would display: scores, grades,
//! trust graphs and reconciled relations.

use std::sync::Arc;

use lumen_core::cancel::Cancellation;
use lumen_core::config::ReputationConfig;
use lumen_core::relation::{Category, RelationTables};
use lumen_core::traits::ReputationStore;
use lumen_core::types::{Grade, Rating, Score};
use lumen_store::{MemoryStore, RocksStore};
use lumen_tests::helpers::*;
use lumen_trust::{ReputationService, ScoreBatch};

const STAMP: i64 = 1_700_000_000;

/// Import the community into a fresh RocksDB store and score it.
fn scored_rocks() -> (ReputationService<RocksStore>, tempfile::TempDir) {
    let (store, dir) = rocks_store();
    store.import(&community()).unwrap();
    let service = ReputationService::with_defaults(Arc::new(store));
    service.run_batch(&Cancellation::new()).unwrap();
    (service, dir)
}

fn batch_at<S: ReputationStore + ?Sized>(store: &S, stamp: i64) -> lumen_trust::BatchReport {
    let tables = RelationTables::default();
    ScoreBatch::new(store, &tables, &ReputationConfig::default())
        .run_at(stamp, &Cancellation::new())
        .unwrap()
}

fn persisted(store: &dyn ReputationStore, seeds: &str) -> Vec<Option<Score>> {
    seeds.chars().map(|c| store.persisted_score(&id(c)).unwrap()).collect()
}

// ---------------------------------------------------------------------------
// Batch scoring
// ---------------------------------------------------------------------------

#[test]
fn batch_report_counts() {
    let (store, _dir) = rocks_store();
    store.import(&community()).unwrap();
    let report = batch_at(&store, STAMP);

    assert_eq!(report.ratings_seen, 6);
    assert_eq!(report.scored, 4);
    assert_eq!(report.skipped_missing, 1, "G is rated but not in the directory");
    assert_eq!(report.written, 3);
    assert_eq!(report.connections, 3);
    assert_eq!(store.last_scored_at().unwrap(), Some(STAMP));
}

#[test]
fn heavy_rater_dominates_the_weighted_score() {
    let (service, _dir) = scored_rocks();
    let t = service.get_score(&raw('T'), &Cancellation::new()).unwrap().unwrap();

    assert_eq!(t.base_score, 2.5);
    assert!(t.weighted_score > 3.5, "whale's A outweighs the light D: {}", t.weighted_score);
    assert_eq!(t.grade, Grade::A);
    assert_eq!((t.counts.a, t.counts.d, t.total_ratings), (1, 1, 2));
}

#[test]
fn confirmed_connections_are_persisted() {
    let (service, _dir) = scored_rocks();
    let counts = service.store().connection_counts().unwrap();
    assert_eq!(counts.get(&id('W')), Some(&2));
    assert_eq!(counts.get(&id('X')), Some(&1));
    assert_eq!(counts.get(&id('Y')), Some(&1));
    assert_eq!(counts.get(&id('L')), None, "plain declarations never confirm");
}

#[test]
fn missing_ratee_gets_no_row() {
    let (service, _dir) = scored_rocks();
    assert!(service.store().persisted_score(&id('G')).unwrap().is_none());
    assert!(service.get_score(&raw('G'), &Cancellation::new()).unwrap().is_none());
}

#[test]
fn rerun_on_unchanged_snapshot_is_idempotent() {
    let (store, _dir) = rocks_store();
    store.import(&community()).unwrap();

    batch_at(&store, STAMP);
    let first = persisted(&store, "TWLXYG");
    batch_at(&store, STAMP);
    let second = persisted(&store, "TWLXYG");
    assert_eq!(first, second);
}

#[test]
fn account_that_loses_all_ratings_loses_its_score() {
    let (rocks, _dir) = rocks_store();
    let memory = MemoryStore::new();
    let stores: [&dyn ReputationStore; 2] = [&rocks, &memory];

    rocks.import(&community()).unwrap();
    memory.import(&community());
    for store in stores {
        batch_at(store, STAMP);
        assert!(store.persisted_score(&id('T')).unwrap().is_some());
    }

    let mut unrated = community();
    unrated
        .relations
        .retain(|r| !(r.target == raw('T') && Rating::parse(&r.relation_type).is_some()));
    rocks.import(&unrated).unwrap();
    memory.import(&unrated);

    for store in stores {
        let report = batch_at(store, STAMP + 60);
        assert_eq!(report.written, 2);
        assert_eq!(store.persisted_score(&id('T')).unwrap(), None);
        assert_eq!(
            store.persisted_score(&id('W')).unwrap().map(|s| s.calculated_at),
            Some(STAMP + 60)
        );
    }

    let service = ReputationService::with_defaults(Arc::new(rocks));
    assert!(service.get_score(&raw('T'), &Cancellation::new()).unwrap().is_none());
    assert!(service.get_graph(&raw('T'), &Cancellation::new()).unwrap().is_none());
}

#[test]
fn memory_and_rocks_stores_agree() {
    let (rocks, _dir) = rocks_store();
    rocks.import(&community()).unwrap();
    let memory = MemoryStore::new();
    memory.import(&community());

    assert_eq!(batch_at(&rocks, STAMP), batch_at(&memory, STAMP));
    assert_eq!(persisted(&rocks, "TWLXYG"), persisted(&memory, "TWLXYG"));
}

#[test]
fn scores_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let store = RocksStore::open(dir.path()).unwrap();
        store.import(&community()).unwrap();
        batch_at(&store, STAMP);
        store.flush().unwrap();
    }
    let service = ReputationService::with_defaults(Arc::new(RocksStore::open(dir.path()).unwrap()));
    let w = service.get_score(&raw('W'), &Cancellation::new()).unwrap().unwrap();
    assert_eq!(w.grade, Grade::AMinus);
    assert_eq!(w.calculated_at.map(|t| t.timestamp()), Some(STAMP));
}

// ---------------------------------------------------------------------------
// Trust graph
// ---------------------------------------------------------------------------

#[test]
fn graph_orders_levels_and_excludes_inner_accounts() {
    let (service, _dir) = scored_rocks();
    let graph = service.get_graph(&raw('T'), &Cancellation::new()).unwrap().unwrap();

    assert_eq!(graph.target_name, "Target");
    let level1: Vec<&str> = graph.level1.iter().map(|n| n.account.as_str()).collect();
    assert_eq!(level1, vec![raw('W').as_str(), raw('L').as_str()]);
    assert_eq!(graph.level1[0].rating, Rating::A);
    assert_eq!(graph.level1[1].name, id('L').placeholder_name());

    let level2: Vec<&str> = graph.level2.iter().map(|n| n.account.as_str()).collect();
    assert_eq!(level2, vec![raw('X').as_str(), raw('Y').as_str()], "T rated W but is the target");
    assert!(graph.level2.iter().all(|n| n.distance == 2));
}

#[test]
fn graph_nodes_carry_weights_and_own_scores() {
    let (service, _dir) = scored_rocks();
    let graph = service.get_graph(&raw('T'), &Cancellation::new()).unwrap().unwrap();

    let whale = &graph.level1[0];
    assert_eq!(whale.connections, 2);
    assert!(whale.weight > 12.0 && whale.weight < 12.2, "weight {}", whale.weight);
    assert_eq!(whale.own_grade, Some(Grade::AMinus));

    let light = &graph.level1[1];
    assert_eq!(light.weight, 1.0);
    assert_eq!(light.own_grade, Some(Grade::B));
}

#[test]
fn unrated_account_has_no_graph() {
    let (service, _dir) = scored_rocks();
    assert!(service.get_graph(&raw('Y'), &Cancellation::new()).unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Relations
// ---------------------------------------------------------------------------

#[test]
fn relations_collapse_confirmed_pairs() {
    let (service, _dir) = scored_rocks();
    let view = service.get_relations(&raw('W'), &Cancellation::new()).unwrap().unwrap();

    assert_eq!(view.total, 2);
    assert_eq!(view.confirmed, 2);
    let categories: Vec<Category> = view.groups.iter().map(|g| g.category).collect();
    assert_eq!(categories, vec![Category::Family, Category::Work]);
    assert_eq!(view.groups[0].relations[0].other, id('X'));
    assert_eq!(view.groups[1].relations[0].other, id('Y'));
}

#[test]
fn one_way_plain_relation_is_shown_unconfirmed() {
    let (service, _dir) = scored_rocks();
    let view = service.get_relations(&raw('T'), &Cancellation::new()).unwrap().unwrap();
    assert_eq!(view.total, 1);
    let love = &view.groups[0].relations[0];
    assert_eq!(love.relation_type, "Love");
    assert!(!love.is_mutual && !love.is_confirmed);
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[test]
fn cancelled_request_fails_without_partial_result() {
    let (service, _dir) = scored_rocks();
    let cancel = Cancellation::new();
    cancel.cancel();
    let err = service.get_graph(&raw('T'), &cancel).unwrap_err();
    assert!(err.to_string().contains("cancelled"));
}
