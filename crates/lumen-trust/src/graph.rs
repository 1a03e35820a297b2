//! Per-request trust graph construction.
//!
//! Level 1 holds the direct raters of a target account, level 2 the raters
//! of those raters. The exclusion set (target plus every level-1 account) is
//! built before the second-level read, and level 2 is filtered through it
//! regardless of what the store already excluded.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use lumen_core::cancel::Cancellation;
use lumen_core::error::{ReputationError, StoreResultExt};
use lumen_core::traits::ReputationStore;
use lumen_core::types::{AccountId, Graph, GraphNode, RaterInfo, Rating};
use ordered_float::OrderedFloat;
use tracing::debug;

use crate::weight::WeightCalculator;

/// Builds [`Graph`]s from a store. Read-only; safe to share across requests.
pub struct TrustGraphBuilder<'a, S: ?Sized> {
    store: &'a S,
    weights: WeightCalculator,
}

impl<'a, S: ReputationStore + ?Sized> TrustGraphBuilder<'a, S> {
    pub fn new(store: &'a S, weights: WeightCalculator) -> Self {
        Self { store, weights }
    }

    /// Assemble the two-level graph around `target`.
    ///
    /// Always returns a graph, possibly with both levels empty; deciding
    /// what an empty graph means is up to the caller.
    pub fn build_graph(
        &self,
        target: &AccountId,
        cancel: &Cancellation,
    ) -> Result<Graph, ReputationError> {
        cancel.check("account_name")?;
        let target_name = self
            .store
            .account_name(target)
            .op_for("account_name", target.as_str())?
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| target.placeholder_name());

        cancel.check("persisted_score")?;
        let score = self
            .store
            .persisted_score(target)
            .op_for("persisted_score", target.as_str())?;

        cancel.check("direct_raters")?;
        let direct = self
            .store
            .direct_raters(target)
            .op_for("direct_raters", target.as_str())?;

        cancel.check("connection_counts")?;
        let connections = self.store.connection_counts().op("connection_counts")?;

        let target_only: HashSet<AccountId> = HashSet::from([target.clone()]);
        let mut level1 = self.nodes(direct, &target_only, &connections, 1);
        sort_nodes(&mut level1);

        let level1_ids: Vec<AccountId> = level1.iter().map(|n| n.account.clone()).collect();
        let exclude = exclusion_set(target, &level1_ids);

        let mut level2 = if level1_ids.is_empty() {
            Vec::new()
        } else {
            cancel.check("raters_of_raters")?;
            let second = self
                .store
                .raters_of_raters(&level1_ids, &exclude)
                .op_for("raters_of_raters", target.as_str())?;
            self.nodes(second, &exclude, &connections, 2)
        };
        sort_nodes(&mut level2);

        debug!(
            %target,
            level1 = level1.len(),
            level2 = level2.len(),
            has_score = score.is_some(),
            "graph: built"
        );

        Ok(Graph {
            target: target.clone(),
            target_name,
            score,
            level1,
            level2,
        })
    }

    /// Turn raw raters into nodes: drop malformed records and excluded
    /// accounts, keep the first record per account, attach weights.
    fn nodes(
        &self,
        raters: Vec<RaterInfo>,
        exclude: &HashSet<AccountId>,
        connections: &HashMap<AccountId, u32>,
        distance: u8,
    ) -> Vec<GraphNode> {
        let parsed = raters.into_iter().filter_map(|r| {
            let account = AccountId::parse(&r.account)?;
            let rating = Rating::parse(&r.rating)?;
            Some((account, rating, r))
        });
        let allowed = parsed.filter(|(account, _, _)| !exclude.contains(account));

        first_per_account(allowed)
            .into_iter()
            .map(|(account, rating, info)| {
                let portfolio = if info.portfolio.is_finite() { info.portfolio.max(0.0) } else { 0.0 };
                let links = connections.get(&account).copied().unwrap_or(0);
                let name = info
                    .name
                    .filter(|n| !n.trim().is_empty())
                    .unwrap_or_else(|| account.placeholder_name());
                GraphNode {
                    weight: self.weights.weight(portfolio, links),
                    account,
                    name,
                    rating,
                    portfolio,
                    connections: links,
                    own_score: info.own_score,
                    distance,
                }
            })
            .collect()
    }
}

/// Target plus every level-1 account.
fn exclusion_set(target: &AccountId, level1: &[AccountId]) -> HashSet<AccountId> {
    let mut exclude: HashSet<AccountId> = level1.iter().cloned().collect();
    exclude.insert(target.clone());
    exclude
}

/// Keep the first record of every account, preserving order.
fn first_per_account<I>(records: I) -> Vec<(AccountId, Rating, RaterInfo)>
where
    I: IntoIterator<Item = (AccountId, Rating, RaterInfo)>,
{
    let records: Vec<_> = records.into_iter().collect();
    let mut first: HashMap<&AccountId, usize> = HashMap::new();
    for (i, (account, _, _)) in records.iter().enumerate() {
        first.entry(account).or_insert(i);
    }
    let keep: HashSet<usize> = first.into_values().collect();
    records
        .into_iter()
        .enumerate()
        .filter(|(i, _)| keep.contains(i))
        .map(|(_, record)| record)
        .collect()
}

/// Rating priority descending, then weight descending.
fn sort_nodes(nodes: &mut [GraphNode]) {
    nodes.sort_by(display_order);
}

fn display_order(a: &GraphNode, b: &GraphNode) -> Ordering {
    b.rating
        .priority()
        .cmp(&a.rating.priority())
        .then_with(|| OrderedFloat(b.weight).cmp(&OrderedFloat(a.weight)))
}
