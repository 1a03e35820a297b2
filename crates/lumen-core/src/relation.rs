//! Relationship type tables.
//!
//! Every relation type string found on the ledger resolves once to a
//! [`RelationKind`] through [`RelationTables`]. The tables are immutable
//! configuration: build them once (usually [`RelationTables::default`]) and
//! hand them to the reconciler. Tests can build alternative tables with
//! [`RelationTables::builder`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::Rating;

/// Display category of a relationship.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Family,
    Work,
    Network,
    Ownership,
    Social,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Family => "family",
            Self::Work => "work",
            Self::Network => "network",
            Self::Ownership => "ownership",
            Self::Social => "social",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a relation type is reconciled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RelationKind {
    /// One half of a pair describing the same link from each side
    /// (e.g. `Employer` / `Employee`).
    Complementary { complement: String, category: Category },
    /// Meaningful only when both parties declare it (e.g. `Spouse`).
    Symmetric { category: Category },
    /// Shown as declared, in either direction.
    Plain { category: Category },
    /// A peer rating letter; never shown as a relation.
    Rating(Rating),
}

impl RelationKind {
    /// Display category, or `None` for rating letters.
    pub fn category(&self) -> Option<Category> {
        match self {
            Self::Complementary { category, .. }
            | Self::Symmetric { category }
            | Self::Plain { category } => Some(*category),
            Self::Rating(_) => None,
        }
    }
}

/// Lookup tables resolving relation type strings to [`RelationKind`].
#[derive(Clone, Debug)]
pub struct RelationTables {
    kinds: HashMap<String, RelationKind>,
}

impl RelationTables {
    /// Start an empty table set. Rating letters are always resolved.
    pub fn builder() -> RelationTablesBuilder {
        RelationTablesBuilder { kinds: HashMap::new() }
    }

    /// Resolve a relation type. Unknown types yield `None`.
    pub fn resolve(&self, relation_type: &str) -> Option<&RelationKind> {
        self.kinds.get(relation_type)
    }

    /// Whether `a` and `b` form a complementary pair.
    pub fn are_complements(&self, a: &str, b: &str) -> bool {
        matches!(
            self.resolve(a),
            Some(RelationKind::Complementary { complement, .. }) if complement == b
        )
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for RelationTables {
    /// The ledger's standard relation vocabulary.
    fn default() -> Self {
        use Category::*;
        Self::builder()
            .complementary("MyPart", "PartOf", Network)
            .complementary("Guardian", "Ward", Family)
            .complementary("Owner", "OwnershipFull", Ownership)
            .complementary("OwnerMajority", "OwnershipMajority", Ownership)
            .complementary("OwnerMinority", "OwnershipMinority", Ownership)
            .complementary("Employer", "Employee", Work)
            .complementary("Contractor", "Client", Work)
            .symmetric("Spouse", Family)
            .symmetric("OneFamily", Family)
            .symmetric("Partnership", Work)
            .symmetric("Collaboration", Work)
            .symmetric("FactionMember", Social)
            .plain("Love", Family)
            .plain("Sympathy", Family)
            .plain("Divorce", Family)
            .plain("RecommendToMTLA", Network)
            .plain("WelcomeGuest", Social)
            .build()
    }
}

/// Builder for [`RelationTables`].
#[derive(Debug)]
pub struct RelationTablesBuilder {
    kinds: HashMap<String, RelationKind>,
}

impl RelationTablesBuilder {
    /// Register a complementary pair. Both sides share one category.
    pub fn complementary(mut self, a: &str, b: &str, category: Category) -> Self {
        self.kinds.insert(
            a.to_owned(),
            RelationKind::Complementary { complement: b.to_owned(), category },
        );
        self.kinds.insert(
            b.to_owned(),
            RelationKind::Complementary { complement: a.to_owned(), category },
        );
        self
    }

    pub fn symmetric(mut self, relation_type: &str, category: Category) -> Self {
        self.kinds.insert(relation_type.to_owned(), RelationKind::Symmetric { category });
        self
    }

    pub fn plain(mut self, relation_type: &str, category: Category) -> Self {
        self.kinds.insert(relation_type.to_owned(), RelationKind::Plain { category });
        self
    }

    pub fn build(mut self) -> RelationTables {
        for rating in Rating::ALL {
            self.kinds.insert(rating.as_str().to_owned(), RelationKind::Rating(rating));
        }
        RelationTables { kinds: self.kinds }
    }
}
