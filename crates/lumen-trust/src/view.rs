//! Display-facing shapes handed to the presentation layer.

use chrono::{DateTime, Utc};
use lumen_core::relation::Category;
use lumen_core::types::{Grade, Graph, GraphNode, Rating, Score};
use serde::Serialize;

use crate::relations::{Relation, RelationGroups};

/// Letter counts of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatingCounts {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub d: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreView {
    pub account: String,
    pub weighted_score: f64,
    pub base_score: f64,
    pub grade: Grade,
    pub counts: RatingCounts,
    pub total_ratings: u32,
    pub total_weight: f64,
    pub calculated_at: Option<DateTime<Utc>>,
}

impl ScoreView {
    /// Convert a persisted score. A row without ratings has no view.
    pub fn from_score(score: &Score) -> Option<Self> {
        if score.total_ratings == 0 {
            return None;
        }
        Some(Self {
            account: score.account.to_string(),
            weighted_score: score.weighted_score,
            base_score: score.base_score,
            grade: score.grade(),
            counts: RatingCounts {
                a: score.count(Rating::A),
                b: score.count(Rating::B),
                c: score.count(Rating::C),
                d: score.count(Rating::D),
            },
            total_ratings: score.total_ratings,
            total_weight: score.total_weight,
            calculated_at: score.calculated_at(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub account: String,
    pub name: String,
    pub rating: Rating,
    pub weight: f64,
    pub portfolio: f64,
    pub connections: u32,
    pub own_score: Option<f64>,
    /// Grade of the rater's own score, when it has one.
    pub own_grade: Option<Grade>,
    pub distance: u8,
}

impl From<&GraphNode> for NodeView {
    fn from(node: &GraphNode) -> Self {
        Self {
            account: node.account.to_string(),
            name: node.name.clone(),
            rating: node.rating,
            weight: node.weight,
            portfolio: node.portfolio,
            connections: node.connections,
            own_score: node.own_score,
            own_grade: node.own_score.filter(|s| *s > 0.0).map(Grade::from_score),
            distance: node.distance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphView {
    pub target: String,
    pub target_name: String,
    pub score: Option<ScoreView>,
    pub level1: Vec<NodeView>,
    pub level2: Vec<NodeView>,
}

impl From<&Graph> for GraphView {
    fn from(graph: &Graph) -> Self {
        Self {
            target: graph.target.to_string(),
            target_name: graph.target_name.clone(),
            score: graph.score.as_ref().and_then(ScoreView::from_score),
            level1: graph.level1.iter().map(NodeView::from).collect(),
            level2: graph.level2.iter().map(NodeView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationGroupView {
    pub category: Category,
    pub relations: Vec<Relation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationsView {
    pub account: String,
    pub groups: Vec<RelationGroupView>,
    pub total: usize,
    pub confirmed: usize,
}

impl RelationsView {
    pub fn new(account: String, groups: &RelationGroups) -> Self {
        Self {
            account,
            groups: groups
                .iter()
                .map(|(category, relations)| RelationGroupView {
                    category,
                    relations: relations.to_vec(),
                })
                .collect(),
            total: groups.total(),
            confirmed: groups.confirmed(),
        }
    }
}
