//! JSON ledger snapshots.
//!
//! A snapshot is the full set of directory accounts and relationship
//! declarations (ratings included, as relation types `A`–`D`) at one point in
//! time. Loading a snapshot into a store replaces its accounts and relations;
//! scores and connection counts are left for the next batch run.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use lumen_core::types::{AccountId, AccountRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot io: {0}")] Io(#[from] std::io::Error),
    #[error("snapshot json: {0}")] Json(#[from] serde_json::Error),
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SnapshotAccount {
    pub account: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub portfolio: f64,
}

/// One stored declaration `source → target` of `relation_type`. An account
/// may repeat the same declaration under different indices.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoredRelation {
    pub source: String,
    pub target: String,
    pub relation_type: String,
    #[serde(default)]
    pub relation_index: u32,
}

impl StoredRelation {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        relation_type: impl Into<String>,
        relation_index: u32,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            relation_type: relation_type.into(),
            relation_index,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    #[serde(default)]
    pub accounts: Vec<SnapshotAccount>,
    #[serde(default)]
    pub relations: Vec<StoredRelation>,
}

/// Snapshot content after validation.
#[derive(Debug, Default)]
pub struct Validated {
    pub accounts: Vec<AccountRecord>,
    pub relations: Vec<StoredRelation>,
    pub skipped: usize,
}

/// Counts reported by a snapshot import.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub accounts: usize,
    pub relations: usize,
    pub skipped: usize,
}

impl Snapshot {
    pub fn from_reader(reader: impl Read) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Drop records a store cannot key: malformed account identifiers, self
    /// references, and empty relation types or types containing NUL.
    /// Later duplicates of an account replace earlier ones.
    pub fn validated(&self) -> Validated {
        let mut out = Validated::default();
        let mut seen: HashMap<AccountId, usize> = HashMap::new();

        for entry in &self.accounts {
            let Some(account) = AccountId::parse(&entry.account) else {
                out.skipped += 1;
                continue;
            };
            let record = AccountRecord {
                account: account.clone(),
                name: entry.name.clone().filter(|n| !n.trim().is_empty()),
                portfolio: entry.portfolio,
            };
            match seen.get(&account) {
                Some(&i) => out.accounts[i] = record,
                None => {
                    seen.insert(account, out.accounts.len());
                    out.accounts.push(record);
                }
            }
        }

        for relation in &self.relations {
            let ids = AccountId::parse(&relation.source).zip(AccountId::parse(&relation.target));
            let keyable = !relation.relation_type.is_empty() && !relation.relation_type.contains('\0');
            match ids {
                Some((source, target)) if keyable && source != target => {
                    out.relations.push(StoredRelation {
                        source: source.to_string(),
                        target: target.to_string(),
                        relation_type: relation.relation_type.clone(),
                        relation_index: relation.relation_index,
                    });
                }
                _ => out.skipped += 1,
            }
        }

        if out.skipped > 0 {
            debug!(skipped = out.skipped, "snapshot: dropped unusable records");
        }
        out
    }
}
