//! Reputation façade used by the presentation layer.
//!
//! Accepts raw account identifiers; a malformed identifier is treated like
//! an account with no data. Absence (`Ok(None)`) is a normal display state;
//! errors are upstream failures with operation context attached.

use std::sync::Arc;

use lumen_core::cancel::Cancellation;
use lumen_core::config::ReputationConfig;
use lumen_core::error::{ReputationError, StoreResultExt};
use lumen_core::relation::RelationTables;
use lumen_core::traits::ReputationStore;
use lumen_core::types::AccountId;
use tracing::debug;

use crate::batch::{BatchReport, ScoreBatch};
use crate::graph::TrustGraphBuilder;
use crate::relations::{ConfirmedIndex, Reconciler};
use crate::view::{GraphView, RelationsView, ScoreView};
use crate::weight::WeightCalculator;

/// Composes the engine components over one store.
pub struct ReputationService<S: ?Sized> {
    store: Arc<S>,
    tables: RelationTables,
    config: ReputationConfig,
}

impl<S: ReputationStore + ?Sized> ReputationService<S> {
    pub fn new(
        store: Arc<S>,
        tables: RelationTables,
        config: ReputationConfig,
    ) -> Result<Self, ReputationError> {
        config.validate()?;
        Ok(Self { store, tables, config })
    }

    /// Service with the standard relation tables and default configuration.
    pub fn with_defaults(store: Arc<S>) -> Self {
        Self {
            store,
            tables: RelationTables::default(),
            config: ReputationConfig::default(),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn config(&self) -> &ReputationConfig {
        &self.config
    }

    /// Persisted score of `account`, or `None` when it has no ratings.
    pub fn get_score(
        &self,
        account: &str,
        cancel: &Cancellation,
    ) -> Result<Option<ScoreView>, ReputationError> {
        let Some(id) = AccountId::parse(account) else {
            debug!(account, "service: malformed account id");
            return Ok(None);
        };
        cancel.check("persisted_score")?;
        let score = self
            .store
            .persisted_score(&id)
            .op_for("persisted_score", id.as_str())?;
        Ok(score.as_ref().and_then(ScoreView::from_score))
    }

    /// Trust graph of `account`, or `None` when nobody rated it or its
    /// raters; callers then fall back to [`get_score`](Self::get_score).
    pub fn get_graph(
        &self,
        account: &str,
        cancel: &Cancellation,
    ) -> Result<Option<GraphView>, ReputationError> {
        let Some(id) = AccountId::parse(account) else {
            debug!(account, "service: malformed account id");
            return Ok(None);
        };
        let builder = TrustGraphBuilder::new(self.store.as_ref(), WeightCalculator::new(&self.config));
        let graph = builder.build_graph(&id, cancel)?;
        if graph.is_empty() {
            return Ok(None);
        }
        Ok(Some(GraphView::from(&graph)))
    }

    /// Reconciled relationships of `account` for its profile page.
    pub fn get_relations(
        &self,
        account: &str,
        cancel: &Cancellation,
    ) -> Result<Option<RelationsView>, ReputationError> {
        let Some(id) = AccountId::parse(account) else {
            return Ok(None);
        };
        cancel.check("declarations_for")?;
        let declarations = self
            .store
            .declarations_for(&id)
            .op_for("declarations_for", id.as_str())?;
        let confirmed = ConfirmedIndex::derive(&declarations, &self.tables);
        let groups = Reconciler::new(&self.tables).reconcile(&id, &declarations, &confirmed);
        Ok(Some(RelationsView::new(id.to_string(), &groups)))
    }

    /// Recompute and persist every score.
    pub fn run_batch(&self, cancel: &Cancellation) -> Result<BatchReport, ReputationError> {
        ScoreBatch::new(self.store.as_ref(), &self.tables, &self.config).run(cancel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockStore, id, rater, raw, score};
    use lumen_core::error::StoreError;
    use lumen_core::relation::Category;
    use lumen_core::types::{Direction, RelationshipDeclaration};
    use std::collections::HashMap;

    fn service(store: MockStore) -> ReputationService<MockStore> {
        ReputationService::with_defaults(Arc::new(store))
    }

    #[test]
    fn rejects_invalid_config() {
        let err = ReputationService::new(
            Arc::new(MockStore::new()),
            RelationTables::default(),
            ReputationConfig { max_weight: 0.0 },
        );
        assert!(matches!(err, Err(ReputationError::Config(_))));
    }

    #[test]
    fn get_score_returns_view() {
        let mut store = MockStore::new();
        store.expect_persisted_score().returning(|a| Ok(Some(score(a.clone(), 3.1, 2))));
        let view = service(store).get_score(&raw('A'), &Cancellation::new()).unwrap().unwrap();
        assert_eq!(view.grade.as_str(), "A-");
        assert_eq!(view.account, raw('A'));
    }

    #[test]
    fn get_score_absent_without_row_or_ratings() {
        let mut store = MockStore::new();
        store.expect_persisted_score().returning(|a| {
            if *a == id('Z') { Ok(Some(score(a.clone(), 0.0, 0))) } else { Ok(None) }
        });
        let svc = service(store);
        assert!(svc.get_score(&raw('A'), &Cancellation::new()).unwrap().is_none());
        assert!(svc.get_score(&raw('Z'), &Cancellation::new()).unwrap().is_none());
    }

    #[test]
    fn malformed_account_is_absent_without_store_calls() {
        let store = MockStore::new();
        let svc = service(store);
        assert!(svc.get_score("nope", &Cancellation::new()).unwrap().is_none());
        assert!(svc.get_graph("nope", &Cancellation::new()).unwrap().is_none());
        assert!(svc.get_relations("nope", &Cancellation::new()).unwrap().is_none());
    }

    #[test]
    fn get_score_propagates_store_failure() {
        let mut store = MockStore::new();
        store
            .expect_persisted_score()
            .returning(|_| Err(StoreError::Backend("down".into())));
        let err = service(store).get_score(&raw('A'), &Cancellation::new()).unwrap_err();
        assert!(err.to_string().contains("persisted_score failed for"));
    }

    #[test]
    fn empty_graph_is_absent() {
        let mut store = MockStore::new();
        store.expect_account_name().returning(|_| Ok(None));
        store.expect_persisted_score().returning(|a| Ok(Some(score(a.clone(), 2.0, 1))));
        store.expect_direct_raters().returning(|_| Ok(Vec::new()));
        store.expect_connection_counts().returning(|| Ok(HashMap::new()));
        let svc = service(store);
        assert!(svc.get_graph(&raw('T'), &Cancellation::new()).unwrap().is_none());
    }

    #[test]
    fn graph_with_raters_is_returned() {
        let mut store = MockStore::new();
        store.expect_account_name().returning(|_| Ok(Some("Target".into())));
        store.expect_persisted_score().returning(|a| Ok(Some(score(a.clone(), 3.7, 1))));
        store
            .expect_direct_raters()
            .returning(|_| Ok(vec![rater(&raw('A'), "A", 10.0, &raw('T'))]));
        store.expect_connection_counts().returning(|| Ok(HashMap::new()));
        store.expect_raters_of_raters().returning(|_, _| Ok(Vec::new()));

        let view = service(store).get_graph(&raw('T'), &Cancellation::new()).unwrap().unwrap();
        assert_eq!(view.target_name, "Target");
        assert_eq!(view.level1.len(), 1);
        assert_eq!(view.score.map(|s| s.grade.as_str()), Some("A"));
    }

    #[test]
    fn relations_are_reconciled() {
        let mut store = MockStore::new();
        store.expect_declarations_for().returning(|_| {
            Ok(vec![
                RelationshipDeclaration::new(raw('A'), raw('B'), "PartOf", Direction::Outgoing),
                RelationshipDeclaration::new(raw('B'), raw('A'), "MyPart", Direction::Incoming),
                RelationshipDeclaration::new(raw('A'), raw('C'), "FactionMember", Direction::Outgoing),
            ])
        });
        let view = service(store).get_relations(&raw('A'), &Cancellation::new()).unwrap().unwrap();
        assert_eq!(view.total, 1);
        assert_eq!(view.confirmed, 1);
        assert_eq!(view.groups.len(), 1);
        assert_eq!(view.groups[0].category, Category::Network);
    }
}
