//! Score aggregation over a full rating snapshot.
//!
//! Pure computation, no storage. Ratee groups are disjoint, so the result
//! does not depend on edge order beyond floating-point summation order,
//! which follows the input order and is therefore reproducible for an
//! unchanged snapshot.

use std::collections::{BTreeMap, HashMap};

use lumen_core::types::{AccountId, Rating, RatingEdge, Score};
use tracing::debug;

use crate::weight::WeightCalculator;

/// Running sums for one ratee.
#[derive(Debug, Default)]
struct Tally {
    counts: [u32; 4],
    value_sum: f64,
    weighted_sum: f64,
    weight_sum: f64,
}

impl Tally {
    fn add(&mut self, rating: Rating, weight: f64) {
        let slot = match rating {
            Rating::A => 0,
            Rating::B => 1,
            Rating::C => 2,
            Rating::D => 3,
        };
        self.counts[slot] += 1;
        self.value_sum += rating.value();
        self.weighted_sum += rating.value() * weight;
        self.weight_sum += weight;
    }

    fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    fn into_score(self, account: AccountId, calculated_at: i64) -> Score {
        let total = self.total();
        let base_score = self.value_sum / f64::from(total);
        let weighted_score = if self.weight_sum > 0.0 {
            self.weighted_sum / self.weight_sum
        } else {
            0.0
        };
        Score {
            account,
            weighted_score,
            base_score,
            count_a: self.counts[0],
            count_b: self.counts[1],
            count_c: self.counts[2],
            count_d: self.counts[3],
            total_ratings: total,
            total_weight: self.weight_sum,
            calculated_at,
        }
    }
}

/// Compute a [`Score`] for every ratee with at least one valid rating.
///
/// - Edges whose letter is not `A`–`D`, or whose rater or ratee is not a
///   valid account identifier, are dropped.
/// - A rater missing from `portfolios` or `connections` counts as portfolio
///   `0` / `0` connections, i.e. minimum weight.
/// - Ratees without valid edges do not appear in the result.
pub fn calculate_scores(
    edges: &[RatingEdge],
    portfolios: &HashMap<AccountId, f64>,
    connections: &HashMap<AccountId, u32>,
    weights: &WeightCalculator,
    calculated_at: i64,
) -> BTreeMap<AccountId, Score> {
    let mut tallies: BTreeMap<AccountId, Tally> = BTreeMap::new();
    let mut dropped = 0usize;

    for edge in edges {
        let (Some(rater), Some(ratee), Some(rating)) = (
            AccountId::parse(&edge.rater),
            AccountId::parse(&edge.ratee),
            Rating::parse(&edge.rating),
        ) else {
            dropped += 1;
            continue;
        };

        let portfolio = portfolios.get(&rater).copied().unwrap_or(0.0);
        let links = connections.get(&rater).copied().unwrap_or(0);
        let weight = weights.weight(portfolio, links);

        tallies.entry(ratee).or_default().add(rating, weight);
    }

    if dropped > 0 {
        debug!(dropped, "aggregate: skipped malformed rating edges");
    }

    tallies
        .into_iter()
        .map(|(account, tally)| {
            let score = tally.into_score(account.clone(), calculated_at);
            (account, score)
        })
        .collect()
}
