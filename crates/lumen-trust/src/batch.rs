//! Full-population score batch.
//!
//! One run loads the whole snapshot, derives confirmed connection counts,
//! aggregates scores, drops scores of accounts that no longer exist, and
//! commits the survivors together with the connection counts. A commit
//! replaces every score row and count, so accounts that lost all their
//! ratings lose their row too, and re-running on an unchanged snapshot is
//! idempotent apart from `calculated_at`. A failed commit aborts the run;
//! nothing is retried here.

use std::collections::BTreeMap;

use chrono::Utc;
use lumen_core::cancel::Cancellation;
use lumen_core::config::ReputationConfig;
use lumen_core::error::{ReputationError, StoreResultExt};
use lumen_core::relation::RelationTables;
use lumen_core::traits::ReputationStore;
use lumen_core::types::{AccountId, Score};
use serde::Serialize;
use tracing::{debug, info};

use crate::aggregate::calculate_scores;
use crate::relations::ConfirmedIndex;
use crate::weight::WeightCalculator;

/// Outcome of one batch run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    /// Rating edges read from the store, valid or not.
    pub ratings_seen: usize,
    /// Accounts that received a score.
    pub scored: usize,
    /// Scores dropped because their account no longer exists.
    pub skipped_missing: usize,
    /// Score rows written.
    pub written: usize,
    /// Accounts with at least one confirmed connection.
    pub connections: usize,
    /// Unix seconds stamped on every written row.
    pub calculated_at: i64,
}

/// The batch scoring job.
pub struct ScoreBatch<'a, S: ?Sized> {
    store: &'a S,
    tables: &'a RelationTables,
    weights: WeightCalculator,
}

impl<'a, S: ReputationStore + ?Sized> ScoreBatch<'a, S> {
    pub fn new(store: &'a S, tables: &'a RelationTables, config: &ReputationConfig) -> Self {
        Self { store, tables, weights: WeightCalculator::new(config) }
    }

    /// Run the batch stamped with the current time.
    pub fn run(&self, cancel: &Cancellation) -> Result<BatchReport, ReputationError> {
        self.run_at(Utc::now().timestamp(), cancel)
    }

    /// Run the batch stamped with `calculated_at`.
    pub fn run_at(
        &self,
        calculated_at: i64,
        cancel: &Cancellation,
    ) -> Result<BatchReport, ReputationError> {
        cancel.check("all_declarations")?;
        let declarations = self.store.all_declarations().op("all_declarations")?;
        let connections = ConfirmedIndex::derive(&declarations, self.tables).connection_counts();

        cancel.check("rating_edges")?;
        let edges = self.store.rating_edges().op("rating_edges")?;
        cancel.check("portfolios")?;
        let portfolios = self.store.portfolios().op("portfolios")?;

        let scores = calculate_scores(&edges, &portfolios, &connections, &self.weights, calculated_at);
        let scored = scores.len();

        cancel.check("existing_accounts")?;
        let (rows, skipped_missing) = self.retain_existing(scores)?;

        cancel.check("commit_batch")?;
        self.store.commit_batch(&rows, &connections).op("commit_batch")?;

        let report = BatchReport {
            ratings_seen: edges.len(),
            scored,
            skipped_missing,
            written: rows.len(),
            connections: connections.len(),
            calculated_at,
        };
        info!(
            ratings = report.ratings_seen,
            scored = report.scored,
            skipped = report.skipped_missing,
            written = report.written,
            connections = report.connections,
            "batch: scores written"
        );
        Ok(report)
    }

    /// Referential-integrity filter: keep scores whose account still exists.
    fn retain_existing(
        &self,
        scores: BTreeMap<AccountId, Score>,
    ) -> Result<(Vec<Score>, usize), ReputationError> {
        let ids: Vec<AccountId> = scores.keys().cloned().collect();
        let existing = self.store.existing_accounts(&ids).op("existing_accounts")?;

        let mut skipped = 0usize;
        let rows = scores
            .into_values()
            .filter(|score| {
                let keep = existing.contains(&score.account);
                if !keep {
                    skipped += 1;
                    debug!(account = %score.account, "batch: skipping score for missing account");
                }
                keep
            })
            .collect();
        Ok((rows, skipped))
    }
}
