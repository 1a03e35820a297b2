//! Row conversions shared by the store implementations.

use lumen_core::types::{AccountRecord, Direction, RaterInfo, Rating, RelationshipDeclaration};

use crate::snapshot::StoredRelation;

/// Ratings share the relations table with every other declaration.
pub(crate) fn is_rating(relation_type: &str) -> bool {
    Rating::parse(relation_type).is_some()
}

pub(crate) fn declaration(relation: &StoredRelation, direction: Direction) -> RelationshipDeclaration {
    RelationshipDeclaration {
        source: relation.source.clone(),
        target: relation.target.clone(),
        relation_type: relation.relation_type.clone(),
        relation_index: relation.relation_index,
        direction,
    }
}

/// Rater of `relation.target`, enriched with the rater's directory entry
/// and own weighted score.
pub(crate) fn rater(
    relation: &StoredRelation,
    record: Option<AccountRecord>,
    own_score: Option<f64>,
) -> RaterInfo {
    let (name, portfolio) = match record {
        Some(r) => (r.name, r.portfolio),
        None => (None, 0.0),
    };
    RaterInfo {
        account: relation.source.clone(),
        name,
        rating: relation.relation_type.clone(),
        portfolio,
        own_score,
        rated: relation.target.clone(),
    }
}
