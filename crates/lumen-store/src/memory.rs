//! In-memory [`ReputationStore`] for tests and demos.
//!
//! Iteration order matches [`RocksStore`]'s key order.
//!
//! [`RocksStore`]: crate::rocks::RocksStore

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use lumen_core::error::StoreError;
use lumen_core::traits::ReputationStore;
use lumen_core::types::{
    AccountId, AccountRecord, Direction, RaterInfo, RatingEdge, RelationshipDeclaration, Score,
};
use parking_lot::RwLock;

use crate::rows;
use crate::snapshot::{ImportReport, Snapshot, StoredRelation};

#[derive(Default)]
struct Inner {
    accounts: BTreeMap<AccountId, AccountRecord>,
    relations: BTreeSet<StoredRelation>,
    scores: BTreeMap<AccountId, Score>,
    connections: HashMap<AccountId, u32>,
    last_scored_at: Option<i64>,
}

impl Inner {
    fn replace_scores(&mut self, scores: &[Score]) {
        self.scores = scores.iter().map(|s| (s.account.clone(), s.clone())).collect();
        if let Some(stamp) = scores.iter().map(|s| s.calculated_at).max() {
            self.last_scored_at = Some(stamp);
        }
    }

    fn raters_of(&self, target: &str) -> Vec<RaterInfo> {
        self.relations
            .iter()
            .filter(|r| r.target == target && rows::is_rating(&r.relation_type))
            .map(|r| {
                let source = AccountId::parse(&r.source);
                let record = source.as_ref().and_then(|id| self.accounts.get(id)).cloned();
                let own = source.as_ref().and_then(|id| self.scores.get(id)).map(|s| s.weighted_score);
                rows::rater(r, record, own)
            })
            .collect()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace accounts and relations with the snapshot's.
    pub fn import(&self, snapshot: &Snapshot) -> ImportReport {
        let valid = snapshot.validated();
        let mut inner = self.inner.write();
        inner.accounts = valid
            .accounts
            .into_iter()
            .map(|record| (record.account.clone(), record))
            .collect();
        inner.relations = valid.relations.into_iter().collect();
        ImportReport {
            accounts: inner.accounts.len(),
            relations: inner.relations.len(),
            skipped: valid.skipped,
        }
    }

    pub fn remove_account(&self, account: &AccountId) {
        self.inner.write().accounts.remove(account);
    }

    /// Unix seconds of the last score write.
    pub fn last_scored_at(&self) -> Option<i64> {
        self.inner.read().last_scored_at
    }
}

impl ReputationStore for MemoryStore {
    fn rating_edges(&self) -> Result<Vec<RatingEdge>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .relations
            .iter()
            .filter(|r| rows::is_rating(&r.relation_type))
            .map(|r| RatingEdge::new(r.source.as_str(), r.target.as_str(), r.relation_type.as_str()))
            .collect())
    }

    fn portfolios(&self) -> Result<HashMap<AccountId, f64>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .accounts
            .values()
            .map(|r| (r.account.clone(), r.portfolio))
            .collect())
    }

    fn connection_counts(&self) -> Result<HashMap<AccountId, u32>, StoreError> {
        Ok(self.inner.read().connections.clone())
    }

    fn all_declarations(&self) -> Result<Vec<RelationshipDeclaration>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .relations
            .iter()
            .filter(|r| !rows::is_rating(&r.relation_type))
            .map(|r| rows::declaration(r, Direction::Outgoing))
            .collect())
    }

    fn declarations_for(
        &self,
        account: &AccountId,
    ) -> Result<Vec<RelationshipDeclaration>, StoreError> {
        let inner = self.inner.read();
        let visible = || inner.relations.iter().filter(|r| !rows::is_rating(&r.relation_type));
        let outgoing = visible()
            .filter(|r| r.source == account.as_str())
            .map(|r| rows::declaration(r, Direction::Outgoing));
        let incoming = visible()
            .filter(|r| r.target == account.as_str())
            .map(|r| rows::declaration(r, Direction::Incoming));
        Ok(outgoing.chain(incoming).collect())
    }

    fn direct_raters(&self, target: &AccountId) -> Result<Vec<RaterInfo>, StoreError> {
        Ok(self.inner.read().raters_of(target.as_str()))
    }

    fn raters_of_raters(
        &self,
        level1: &[AccountId],
        exclude: &HashSet<AccountId>,
    ) -> Result<Vec<RaterInfo>, StoreError> {
        let inner = self.inner.read();
        Ok(level1
            .iter()
            .flat_map(|l1| inner.raters_of(l1.as_str()))
            .filter(|r| AccountId::parse(&r.account).is_none_or(|id| !exclude.contains(&id)))
            .collect())
    }

    fn account_name(&self, account: &AccountId) -> Result<Option<String>, StoreError> {
        Ok(self.inner.read().accounts.get(account).and_then(|r| r.name.clone()))
    }

    fn persisted_score(&self, account: &AccountId) -> Result<Option<Score>, StoreError> {
        Ok(self.inner.read().scores.get(account).cloned())
    }

    fn existing_accounts(
        &self,
        accounts: &[AccountId],
    ) -> Result<HashSet<AccountId>, StoreError> {
        let inner = self.inner.read();
        Ok(accounts
            .iter()
            .filter(|a| inner.accounts.contains_key(*a))
            .cloned()
            .collect())
    }

    fn write_scores(&self, scores: &[Score]) -> Result<(), StoreError> {
        self.inner.write().replace_scores(scores);
        Ok(())
    }

    fn write_connection_counts(&self, counts: &HashMap<AccountId, u32>) -> Result<(), StoreError> {
        self.inner.write().connections = counts.clone();
        Ok(())
    }

    fn commit_batch(
        &self,
        scores: &[Score],
        counts: &HashMap<AccountId, u32>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        inner.replace_scores(scores);
        inner.connections = counts.clone();
        Ok(())
    }
}
