//! Shared builders for snapshots and stores.

use lumen_core::types::AccountId;
use lumen_store::snapshot::SnapshotAccount;
use lumen_store::{RocksStore, Snapshot, StoredRelation};

/// A valid account identifier built from one base32 character.
pub fn raw(seed: char) -> String {
    format!("G{}", seed.to_string().repeat(55))
}

pub fn id(seed: char) -> AccountId {
    AccountId::parse(&raw(seed)).expect("seed must be a base32 character")
}

pub fn account(seed: char, name: Option<&str>, portfolio: f64) -> SnapshotAccount {
    SnapshotAccount {
        account: raw(seed),
        name: name.map(str::to_owned),
        portfolio,
    }
}

/// A declaration `source → target`; ratings are relations typed `A`–`D`.
pub fn relation(source: char, target: char, relation_type: &str) -> StoredRelation {
    StoredRelation::new(raw(source), raw(target), relation_type, 0)
}

/// A small community:
///
/// - `W` (whale, large portfolio, married to `X`) rates `T` A.
/// - `L` (light, no portfolio) rates `T` D.
/// - `X` rates `W` B, `Y` rates `L` C, `T` rates `W` A.
/// - `G` is rated by `W` but absent from the directory.
/// - `W` employs `Y`, and `Y` acknowledges it.
pub fn community() -> Snapshot {
    Snapshot {
        accounts: vec![
            account('T', Some("Target"), 50.0),
            account('W', Some("Whale"), 10_000_000.0),
            account('L', None, 0.0),
            account('X', Some("Xavier"), 1_000.0),
            account('Y', Some("Yolanda"), 200.0),
        ],
        relations: vec![
            relation('W', 'T', "A"),
            relation('L', 'T', "D"),
            relation('X', 'W', "B"),
            relation('Y', 'L', "C"),
            relation('T', 'W', "A"),
            relation('W', 'G', "B"),
            relation('W', 'X', "Spouse"),
            relation('X', 'W', "Spouse"),
            relation('W', 'Y', "Employer"),
            relation('Y', 'W', "Employee"),
            relation('L', 'T', "Love"),
        ],
    }
}

/// A RocksDB store in a fresh temporary directory.
pub fn rocks_store() -> (RocksStore, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = RocksStore::open(dir.path()).expect("open store");
    (store, dir)
}
