//! Core data types: accounts, ratings, scores, relationship declarations and
//! trust-graph nodes.
//!
//! Raw records read from the ledger snapshot (`RatingEdge`,
//! `RelationshipDeclaration`, `RaterInfo`) carry account identifiers and
//! rating letters as plain strings. The engine parses them with
//! [`AccountId::parse`] and [`Rating::parse`] and silently drops anything
//! that does not parse.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{
    ACCOUNT_ID_LEN, ACCOUNT_ID_PREFIX, GRADE_THRESHOLDS, PLACEHOLDER_EDGE_CHARS,
};

// ---------------------------------------------------------------------------
// AccountId
// ---------------------------------------------------------------------------

/// A validated ledger account identifier.
///
/// Always 56 characters, starting with `G`, drawn from the RFC 4648 base32
/// alphabet (`A`–`Z`, `2`–`7`).
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
    bincode::Encode, bincode::Decode,
)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Parse and validate an identifier. Returns `None` for malformed input.
    ///
    /// # Examples
    ///
    /// ```
    /// use lumen_core::types::AccountId;
    ///
    /// let id = "G".to_string() + &"A".repeat(55);
    /// assert!(AccountId::parse(&id).is_some());
    /// assert!(AccountId::parse("not-an-account").is_none());
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.len() != ACCOUNT_ID_LEN || !raw.starts_with(ACCOUNT_ID_PREFIX) {
            return None;
        }
        if !raw.bytes().all(|b| b.is_ascii_uppercase() || (b'2'..=b'7').contains(&b)) {
            return None;
        }
        Some(Self(raw.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short display name used when an account has no registered name,
    /// e.g. `GABC…WXYZ`.
    pub fn placeholder_name(&self) -> String {
        let head = &self.0[..PLACEHOLDER_EDGE_CHARS];
        let tail = &self.0[self.0.len() - PLACEHOLDER_EDGE_CHARS..];
        format!("{head}…{tail}")
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for AccountId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid account id: {value}"))
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.0
    }
}

// ---------------------------------------------------------------------------
// Rating
// ---------------------------------------------------------------------------

/// A peer rating letter.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash,
    bincode::Encode, bincode::Decode,
)]
pub enum Rating {
    A,
    B,
    C,
    D,
}

impl Rating {
    pub const ALL: [Rating; 4] = [Rating::A, Rating::B, Rating::C, Rating::D];

    /// Parse a rating letter. Anything but exactly `A`, `B`, `C` or `D`
    /// yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "A" => Some(Self::A),
            "B" => Some(Self::B),
            "C" => Some(Self::C),
            "D" => Some(Self::D),
            _ => None,
        }
    }

    /// Numeric value used in score averages: A=4, B=3, C=2, D=1.
    pub fn value(self) -> f64 {
        match self {
            Self::A => 4.0,
            Self::B => 3.0,
            Self::C => 2.0,
            Self::D => 1.0,
        }
    }

    /// Display priority; higher sorts first.
    pub fn priority(self) -> u8 {
        match self {
            Self::A => 4,
            Self::B => 3,
            Self::C => 2,
            Self::D => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown rating letter: {s}"))
    }
}

// ---------------------------------------------------------------------------
// Grade
// ---------------------------------------------------------------------------

/// Letter grade derived from a score in `[0, 4]`.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Grade {
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl Grade {
    /// Map a score to a grade. Thresholds are closed at the lower end.
    ///
    /// # Examples
    ///
    /// ```
    /// use lumen_core::types::Grade;
    ///
    /// assert_eq!(Grade::from_score(3.5), Grade::A);
    /// assert_eq!(Grade::from_score(3.49), Grade::AMinus);
    /// assert_eq!(Grade::from_score(0.01), Grade::D);
    /// assert_eq!(Grade::from_score(0.0), Grade::NotAvailable);
    /// ```
    pub fn from_score(score: f64) -> Self {
        const LADDER: [Grade; 6] =
            [Grade::A, Grade::AMinus, Grade::BPlus, Grade::B, Grade::CPlus, Grade::C];
        for (threshold, grade) in GRADE_THRESHOLDS.iter().zip(LADDER) {
            if score >= *threshold {
                return grade;
            }
        }
        if score > 0.0 { Grade::D } else { Grade::NotAvailable }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::AMinus => "A-",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::CPlus => "C+",
            Self::C => "C",
            Self::D => "D",
            Self::NotAvailable => "N/A",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// Persisted reputation score of one account.
///
/// # Invariants
///
/// * `total_ratings == count_a + count_b + count_c + count_d`
/// * `total_ratings > 0` for every persisted row
/// * `weighted_score` and `base_score` lie in `[0, 4]`
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq,
    bincode::Encode, bincode::Decode,
)]
pub struct Score {
    pub account: AccountId,
    /// `Σ(value · weight) / Σ(weight)`; zero when the total weight is zero.
    pub weighted_score: f64,
    /// Unweighted mean of the rating values.
    pub base_score: f64,
    pub count_a: u32,
    pub count_b: u32,
    pub count_c: u32,
    pub count_d: u32,
    pub total_ratings: u32,
    pub total_weight: f64,
    /// Unix seconds of the batch run that produced this row.
    pub calculated_at: i64,
}

impl Score {
    /// Grade of the weighted score; `N/A` when there are no ratings.
    pub fn grade(&self) -> Grade {
        if self.total_ratings == 0 {
            return Grade::NotAvailable;
        }
        Grade::from_score(self.weighted_score)
    }

    /// Number of ratings carrying the given letter.
    pub fn count(&self, rating: Rating) -> u32 {
        match rating {
            Rating::A => self.count_a,
            Rating::B => self.count_b,
            Rating::C => self.count_c,
            Rating::D => self.count_d,
        }
    }

    pub fn calculated_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.calculated_at, 0)
    }
}

// ---------------------------------------------------------------------------
// Raw ledger records
// ---------------------------------------------------------------------------

/// A rating declaration as read from the ledger snapshot.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RatingEdge {
    pub rater: String,
    pub ratee: String,
    pub rating: String,
}

impl RatingEdge {
    pub fn new(rater: impl Into<String>, ratee: impl Into<String>, rating: impl Into<String>) -> Self {
        Self { rater: rater.into(), ratee: ratee.into(), rating: rating.into() }
    }
}

/// Which end of a stored declaration the viewing account is on.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// The viewing account is the declaration's source.
    Outgoing,
    /// The viewing account is the declaration's target.
    Incoming,
}

/// A relationship declaration. `source` and `target` always keep the stored
/// orientation; `direction` records which end the fetching account sits on.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct RelationshipDeclaration {
    pub source: String,
    pub target: String,
    pub relation_type: String,
    pub relation_index: u32,
    pub direction: Direction,
}

impl RelationshipDeclaration {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relation_type: impl Into<String>,
        direction: Direction,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation_type: relation_type.into(),
            relation_index: 0,
            direction,
        }
    }
}

/// A rater as returned by the store for graph construction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RaterInfo {
    pub account: String,
    pub name: Option<String>,
    pub rating: String,
    /// Total portfolio value of the rater.
    pub portfolio: f64,
    /// The rater's own persisted weighted score, if any.
    pub own_score: Option<f64>,
    /// The account this rater rated.
    pub rated: String,
}

/// Directory entry of an account held by the store.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq,
    bincode::Encode, bincode::Decode,
)]
pub struct AccountRecord {
    pub account: AccountId,
    pub name: Option<String>,
    pub portfolio: f64,
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// A rater node in a trust graph. `distance` is 1 for direct raters of the
/// target and 2 for raters of those raters.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub account: AccountId,
    pub name: String,
    pub rating: Rating,
    pub weight: f64,
    pub portfolio: f64,
    pub connections: u32,
    pub own_score: Option<f64>,
    pub distance: u8,
}

/// Two-level trust graph around one target account.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Graph {
    pub target: AccountId,
    pub target_name: String,
    pub score: Option<Score>,
    pub level1: Vec<GraphNode>,
    pub level2: Vec<GraphNode>,
}

impl Graph {
    pub fn is_empty(&self) -> bool {
        self.level1.is_empty() && self.level2.is_empty()
    }
}
