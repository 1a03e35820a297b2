//! # lumen-trust — Trust reputation and graph engine.
//!
//! Turns raw peer ratings and relationship declarations into:
//! - **Reconciled relations**: deduplicated, category-grouped relationships
//!   per account, with complementary pairs and mutual symmetric declarations
//!   marked as confirmed ([`relations`]).
//! - **Rater weights**: `log10(portfolio + 1) * sqrt(connections + 1)`,
//!   clamped to `[1, max_weight]` ([`weight`]).
//! - **Scores**: simple and weighted rating averages per account, computed
//!   in full batches ([`aggregate`], [`batch`]).
//! - **Trust graphs**: two levels of raters around one account, built per
//!   request ([`graph`]).
//!
//! [`ReputationService`] composes these for the presentation layer.

pub mod aggregate;
pub mod batch;
pub mod graph;
pub mod relations;
pub mod service;
pub mod view;
pub mod weight;

#[cfg(test)]
mod testing;

pub use aggregate::calculate_scores;
pub use batch::{BatchReport, ScoreBatch};
pub use graph::TrustGraphBuilder;
pub use relations::{ConfirmedIndex, RelationGroups, Reconciler, connection_counts};
pub use service::ReputationService;
pub use view::{GraphView, NodeView, RelationsView, ScoreView};
pub use weight::WeightCalculator;
