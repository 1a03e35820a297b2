//! RocksDB-backed reputation storage.
//!
//! Column families:
//! - `accounts`: account id → bincode [`AccountRecord`]
//! - `relations_out`: `source \0 target \0 type \0 index(BE)` → empty
//! - `relations_in`: `target \0 source \0 type \0 index(BE)` → empty
//! - `scores`: account id → bincode [`Score`]
//! - `connections`: account id → count (u32 BE)
//! - `metadata`: schema version and last score run
//!
//! Every multi-row mutation goes through one [`WriteBatch`].

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};

use lumen_core::error::StoreError;
use lumen_core::traits::ReputationStore;
use lumen_core::types::{
    AccountId, AccountRecord, Direction, RaterInfo, RatingEdge, RelationshipDeclaration, Score,
};

use crate::rows;
use crate::snapshot::{ImportReport, Snapshot, StoredRelation};

// --- Column family names ---

const CF_ACCOUNTS: &str = "accounts";
const CF_RELATIONS_OUT: &str = "relations_out";
const CF_RELATIONS_IN: &str = "relations_in";
const CF_SCORES: &str = "scores";
const CF_CONNECTIONS: &str = "connections";
const CF_METADATA: &str = "metadata";

const ALL_CFS: &[&str] = &[
    CF_ACCOUNTS,
    CF_RELATIONS_OUT,
    CF_RELATIONS_IN,
    CF_SCORES,
    CF_CONNECTIONS,
    CF_METADATA,
];

// --- Metadata keys ---

const META_SCHEMA_VERSION: &[u8] = b"schema_version";
const META_LAST_SCORED_AT: &[u8] = b"last_scored_at";

const SCHEMA_VERSION: u32 = 1;

fn backend(e: rocksdb::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn encode<T: bincode::Encode>(value: &T) -> Result<Vec<u8>, StoreError> {
    bincode::encode_to_vec(value, bincode::config::standard())
        .map_err(|e| StoreError::Codec(e.to_string()))
}

fn decode<T: bincode::Decode<()>>(bytes: &[u8]) -> Result<T, StoreError> {
    let (value, _) = bincode::decode_from_slice(bytes, bincode::config::standard())
        .map_err(|e| StoreError::Codec(e.to_string()))?;
    Ok(value)
}

/// Relation key: `first \0 second \0 type \0 index(BE)`.
fn relation_key(first: &str, second: &str, relation_type: &str, index: u32) -> Vec<u8> {
    let mut key = Vec::with_capacity(first.len() + second.len() + relation_type.len() + 7);
    key.extend_from_slice(first.as_bytes());
    key.push(0);
    key.extend_from_slice(second.as_bytes());
    key.push(0);
    key.extend_from_slice(relation_type.as_bytes());
    key.push(0);
    key.extend_from_slice(&index.to_be_bytes());
    key
}

/// Split a relation key into `(first, second, type, index)`.
fn parse_relation_key(
    table: &'static str,
    key: &[u8],
) -> Result<(String, String, String, u32), StoreError> {
    let corrupt = |detail: &str| StoreError::Corrupt { table, detail: detail.to_owned() };
    let mut parts = key.splitn(4, |b| *b == 0);
    let mut text = || -> Result<String, StoreError> {
        let part = parts.next().ok_or_else(|| corrupt("truncated key"))?;
        String::from_utf8(part.to_vec()).map_err(|_| corrupt("non-utf8 key"))
    };
    let first = text()?;
    let second = text()?;
    let relation_type = text()?;
    let index_bytes: [u8; 4] = parts
        .next()
        .and_then(|b| b.try_into().ok())
        .ok_or_else(|| corrupt("bad relation index"))?;
    Ok((first, second, relation_type, u32::from_be_bytes(index_bytes)))
}

fn account_prefix(account: &AccountId) -> Vec<u8> {
    let mut prefix = account.as_str().as_bytes().to_vec();
    prefix.push(0);
    prefix
}

/// RocksDB-backed [`ReputationStore`].
pub struct RocksStore {
    db: DB,
}

impl RocksStore {
    /// Open or create a database at `path`, creating missing column families.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path.as_ref(), cf_descriptors).map_err(backend)?;
        let store = Self { db };
        store.check_schema()?;
        Ok(store)
    }

    /// Replace all accounts and relations with the snapshot's content.
    pub fn import(&self, snapshot: &Snapshot) -> Result<ImportReport, StoreError> {
        let valid = snapshot.validated();
        let cf_accounts = self.cf_handle(CF_ACCOUNTS)?;
        let cf_out = self.cf_handle(CF_RELATIONS_OUT)?;
        let cf_in = self.cf_handle(CF_RELATIONS_IN)?;

        let mut batch = WriteBatch::default();
        for cf in [cf_accounts, cf_out, cf_in] {
            self.clear_into(&mut batch, cf)?;
        }
        for record in &valid.accounts {
            batch.put_cf(cf_accounts, record.account.as_str(), encode(record)?);
        }
        let mut relations = HashSet::new();
        for r in &valid.relations {
            if !relations.insert((&r.source, &r.target, &r.relation_type, r.relation_index)) {
                continue;
            }
            batch.put_cf(cf_out, relation_key(&r.source, &r.target, &r.relation_type, r.relation_index), []);
            batch.put_cf(cf_in, relation_key(&r.target, &r.source, &r.relation_type, r.relation_index), []);
        }
        self.db.write(batch).map_err(backend)?;

        let report = ImportReport {
            accounts: valid.accounts.len(),
            relations: relations.len(),
            skipped: valid.skipped,
        };
        tracing::info!(
            accounts = report.accounts,
            relations = report.relations,
            skipped = report.skipped,
            "store: snapshot imported"
        );
        Ok(report)
    }

    /// Unix seconds of the last score write, if any.
    pub fn last_scored_at(&self) -> Result<Option<i64>, StoreError> {
        let cf = self.cf_handle(CF_METADATA)?;
        match self.db.get_cf(cf, META_LAST_SCORED_AT).map_err(backend)? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.as_slice().try_into().map_err(|_| StoreError::Corrupt {
                    table: CF_METADATA,
                    detail: "invalid last_scored_at length".into(),
                })?;
                Ok(Some(i64::from_be_bytes(raw)))
            }
            None => Ok(None),
        }
    }

    /// Flush memtables to disk.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush().map_err(backend)
    }

    // --- Internal helpers ---

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::MissingColumnFamily(name.to_owned()))
    }

    /// Write the schema version on first open; reject unknown versions.
    fn check_schema(&self) -> Result<(), StoreError> {
        let cf = self.cf_handle(CF_METADATA)?;
        match self.db.get_cf(cf, META_SCHEMA_VERSION).map_err(backend)? {
            None => self
                .db
                .put_cf(cf, META_SCHEMA_VERSION, SCHEMA_VERSION.to_be_bytes())
                .map_err(backend),
            Some(bytes) if bytes.as_slice() == SCHEMA_VERSION.to_be_bytes() => Ok(()),
            Some(_) => Err(StoreError::Corrupt {
                table: CF_METADATA,
                detail: "unsupported schema version".into(),
            }),
        }
    }

    /// Queue replacement of the whole scores table, plus the last-scored stamp.
    fn queue_scores(&self, batch: &mut WriteBatch, scores: &[Score]) -> Result<(), StoreError> {
        let cf_scores = self.cf_handle(CF_SCORES)?;
        let cf_meta = self.cf_handle(CF_METADATA)?;
        self.clear_into(batch, cf_scores)?;
        for score in scores {
            batch.put_cf(cf_scores, score.account.as_str(), encode(score)?);
        }
        if let Some(stamp) = scores.iter().map(|s| s.calculated_at).max() {
            batch.put_cf(cf_meta, META_LAST_SCORED_AT, stamp.to_be_bytes());
        }
        Ok(())
    }

    /// Queue replacement of the whole connections table.
    fn queue_connection_counts(
        &self,
        batch: &mut WriteBatch,
        counts: &HashMap<AccountId, u32>,
    ) -> Result<(), StoreError> {
        let cf = self.cf_handle(CF_CONNECTIONS)?;
        self.clear_into(batch, cf)?;
        for (account, count) in counts {
            batch.put_cf(cf, account.as_str(), count.to_be_bytes());
        }
        Ok(())
    }

    /// Queue deletion of every key in `cf`.
    fn clear_into(&self, batch: &mut WriteBatch, cf: &ColumnFamily) -> Result<(), StoreError> {
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, _) = item.map_err(backend)?;
            batch.delete_cf(cf, key);
        }
        Ok(())
    }

    /// All relations in `table`, in key order, as stored orientation.
    fn scan_relations(&self, table: &'static str) -> Result<Vec<StoredRelation>, StoreError> {
        let cf = self.cf_handle(table)?;
        let mut out = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, _) = item.map_err(backend)?;
            out.push(Self::stored(table, &key)?);
        }
        Ok(out)
    }

    /// Relations in `table` whose first key component is `account`.
    fn relations_with_prefix(
        &self,
        table: &'static str,
        account: &AccountId,
    ) -> Result<Vec<StoredRelation>, StoreError> {
        let cf = self.cf_handle(table)?;
        let prefix = account_prefix(account);
        let mode = IteratorMode::From(&prefix, rocksdb::Direction::Forward);

        let mut out = Vec::new();
        for item in self.db.iterator_cf(cf, mode) {
            let (key, _) = item.map_err(backend)?;
            if !key.starts_with(&prefix) {
                break;
            }
            out.push(Self::stored(table, &key)?);
        }
        Ok(out)
    }

    /// Decode a key of either relations table into stored orientation.
    fn stored(table: &'static str, key: &[u8]) -> Result<StoredRelation, StoreError> {
        let (first, second, relation_type, index) = parse_relation_key(table, key)?;
        let (source, target) = if table == CF_RELATIONS_IN { (second, first) } else { (first, second) };
        Ok(StoredRelation::new(source, target, relation_type, index))
    }

    fn account_record(&self, account: &AccountId) -> Result<Option<AccountRecord>, StoreError> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        self.db
            .get_cf(cf, account.as_str())
            .map_err(backend)?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn raters_of(&self, target: &AccountId) -> Result<Vec<RaterInfo>, StoreError> {
        let mut out = Vec::new();
        for relation in self.relations_with_prefix(CF_RELATIONS_IN, target)? {
            if !rows::is_rating(&relation.relation_type) {
                continue;
            }
            let (record, own) = match AccountId::parse(&relation.source) {
                Some(source) => (
                    self.account_record(&source)?,
                    self.persisted_score(&source)?.map(|s| s.weighted_score),
                ),
                None => (None, None),
            };
            out.push(rows::rater(&relation, record, own));
        }
        Ok(out)
    }
}

impl ReputationStore for RocksStore {
    fn rating_edges(&self) -> Result<Vec<RatingEdge>, StoreError> {
        Ok(self
            .scan_relations(CF_RELATIONS_OUT)?
            .into_iter()
            .filter(|r| rows::is_rating(&r.relation_type))
            .map(|r| RatingEdge::new(r.source, r.target, r.relation_type))
            .collect())
    }

    fn portfolios(&self) -> Result<HashMap<AccountId, f64>, StoreError> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        let mut out = HashMap::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item.map_err(backend)?;
            let record: AccountRecord = decode(&value)?;
            out.insert(record.account, record.portfolio);
        }
        Ok(out)
    }

    fn connection_counts(&self) -> Result<HashMap<AccountId, u32>, StoreError> {
        let cf = self.cf_handle(CF_CONNECTIONS)?;
        let mut out = HashMap::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (key, value) = item.map_err(backend)?;
            let corrupt = |detail: &str| StoreError::Corrupt { table: CF_CONNECTIONS, detail: detail.to_owned() };
            let account = std::str::from_utf8(&key)
                .ok()
                .and_then(AccountId::parse)
                .ok_or_else(|| corrupt("invalid account key"))?;
            let count: [u8; 4] = value.as_ref().try_into().map_err(|_| corrupt("invalid count length"))?;
            out.insert(account, u32::from_be_bytes(count));
        }
        Ok(out)
    }

    fn all_declarations(&self) -> Result<Vec<RelationshipDeclaration>, StoreError> {
        Ok(self
            .scan_relations(CF_RELATIONS_OUT)?
            .iter()
            .filter(|r| !rows::is_rating(&r.relation_type))
            .map(|r| rows::declaration(r, Direction::Outgoing))
            .collect())
    }

    fn declarations_for(
        &self,
        account: &AccountId,
    ) -> Result<Vec<RelationshipDeclaration>, StoreError> {
        let outgoing = self.relations_with_prefix(CF_RELATIONS_OUT, account)?;
        let incoming = self.relations_with_prefix(CF_RELATIONS_IN, account)?;
        let tagged = outgoing
            .iter()
            .map(|r| (r, Direction::Outgoing))
            .chain(incoming.iter().map(|r| (r, Direction::Incoming)));
        Ok(tagged
            .filter(|(r, _)| !rows::is_rating(&r.relation_type))
            .map(|(r, direction)| rows::declaration(r, direction))
            .collect())
    }

    fn direct_raters(&self, target: &AccountId) -> Result<Vec<RaterInfo>, StoreError> {
        self.raters_of(target)
    }

    fn raters_of_raters(
        &self,
        level1: &[AccountId],
        exclude: &HashSet<AccountId>,
    ) -> Result<Vec<RaterInfo>, StoreError> {
        let mut out = Vec::new();
        for account in level1 {
            let raters = self.raters_of(account)?;
            out.extend(
                raters
                    .into_iter()
                    .filter(|r| AccountId::parse(&r.account).is_none_or(|id| !exclude.contains(&id))),
            );
        }
        Ok(out)
    }

    fn account_name(&self, account: &AccountId) -> Result<Option<String>, StoreError> {
        Ok(self.account_record(account)?.and_then(|r| r.name))
    }

    fn persisted_score(&self, account: &AccountId) -> Result<Option<Score>, StoreError> {
        let cf = self.cf_handle(CF_SCORES)?;
        self.db
            .get_cf(cf, account.as_str())
            .map_err(backend)?
            .map(|bytes| decode(&bytes))
            .transpose()
    }

    fn existing_accounts(
        &self,
        accounts: &[AccountId],
    ) -> Result<HashSet<AccountId>, StoreError> {
        let cf = self.cf_handle(CF_ACCOUNTS)?;
        let mut out = HashSet::new();
        for account in accounts {
            if self.db.get_pinned_cf(cf, account.as_str()).map_err(backend)?.is_some() {
                out.insert(account.clone());
            }
        }
        Ok(out)
    }

    fn write_scores(&self, scores: &[Score]) -> Result<(), StoreError> {
        let mut batch = WriteBatch::default();
        self.queue_scores(&mut batch, scores)?;
        self.db.write(batch).map_err(backend)?;
        tracing::debug!(rows = scores.len(), "store: scores written");
        Ok(())
    }

    fn write_connection_counts(&self, counts: &HashMap<AccountId, u32>) -> Result<(), StoreError> {
        let mut batch = WriteBatch::default();
        self.queue_connection_counts(&mut batch, counts)?;
        self.db.write(batch).map_err(backend)
    }

    fn commit_batch(
        &self,
        scores: &[Score],
        counts: &HashMap<AccountId, u32>,
    ) -> Result<(), StoreError> {
        let mut batch = WriteBatch::default();
        self.queue_scores(&mut batch, scores)?;
        self.queue_connection_counts(&mut batch, counts)?;
        self.db.write(batch).map_err(backend)?;
        tracing::debug!(rows = scores.len(), connections = counts.len(), "store: batch committed");
        Ok(())
    }
}
