//! Store interface consumed by the trust engine.
//!
//! [`ReputationStore`] is the contract between the engine (lumen-trust) and
//! persistence (lumen-store). Reads return fresh snapshots; nothing is
//! cached across calls. Absence is `Ok(None)` or an empty collection, never
//! an error.

use std::collections::{HashMap, HashSet};

use crate::error::StoreError;
use crate::types::{AccountId, RaterInfo, RatingEdge, RelationshipDeclaration, Score};

/// Read/write access to ledger-derived reputation data.
pub trait ReputationStore: Send + Sync {
    /// Every rating declaration (relation types `A`–`D`) on the ledger.
    fn rating_edges(&self) -> Result<Vec<RatingEdge>, StoreError>;

    /// Portfolio value per account. Accounts without a value are absent.
    fn portfolios(&self) -> Result<HashMap<AccountId, f64>, StoreError>;

    /// Confirmed-connection count per account, as last written by the batch
    /// job.
    fn connection_counts(&self) -> Result<HashMap<AccountId, u32>, StoreError>;

    /// Every non-rating relationship declaration, seen from its source
    /// ([`Direction::Outgoing`](crate::types::Direction::Outgoing)).
    fn all_declarations(&self) -> Result<Vec<RelationshipDeclaration>, StoreError>;

    /// Every non-rating declaration touching `account`, from both ends.
    fn declarations_for(
        &self,
        account: &AccountId,
    ) -> Result<Vec<RelationshipDeclaration>, StoreError>;

    /// Accounts that rated `target`, with their rating, portfolio and own
    /// score.
    fn direct_raters(&self, target: &AccountId) -> Result<Vec<RaterInfo>, StoreError>;

    /// Accounts that rated any of `level1`, skipping `exclude`. Callers must
    /// not rely on the exclusion being applied.
    fn raters_of_raters(
        &self,
        level1: &[AccountId],
        exclude: &HashSet<AccountId>,
    ) -> Result<Vec<RaterInfo>, StoreError>;

    /// Registered display name of an account.
    fn account_name(&self, account: &AccountId) -> Result<Option<String>, StoreError>;

    /// Persisted score of an account.
    fn persisted_score(&self, account: &AccountId) -> Result<Option<Score>, StoreError>;

    /// The subset of `accounts` that currently exist in the directory.
    fn existing_accounts(
        &self,
        accounts: &[AccountId],
    ) -> Result<HashSet<AccountId>, StoreError>;

    /// Whether a single account exists.
    ///
    /// Default implementation delegates to
    /// [`existing_accounts`](Self::existing_accounts).
    fn account_exists(&self, account: &AccountId) -> Result<bool, StoreError> {
        Ok(self.existing_accounts(std::slice::from_ref(account))?.contains(account))
    }

    /// Replace every persisted score with `scores` in one atomic write.
    /// Accounts missing from `scores` lose their row.
    fn write_scores(&self, scores: &[Score]) -> Result<(), StoreError>;

    /// Replace all connection counts in one atomic write.
    fn write_connection_counts(&self, counts: &HashMap<AccountId, u32>) -> Result<(), StoreError>;

    /// Persist the output of one batch run: scores and connection counts.
    ///
    /// The default writes scores first and counts only once the scores are
    /// stored. Backends that can write both atomically should override it.
    fn commit_batch(
        &self,
        scores: &[Score],
        counts: &HashMap<AccountId, u32>,
    ) -> Result<(), StoreError> {
        self.write_scores(scores)?;
        self.write_connection_counts(counts)
    }
}
