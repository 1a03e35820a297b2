//! Shared test fixtures.

use std::collections::{HashMap, HashSet};

use lumen_core::error::StoreError;
use lumen_core::traits::ReputationStore;
use lumen_core::types::{AccountId, RaterInfo, RatingEdge, RelationshipDeclaration, Score};

mockall::mock! {
    pub Store {}

    impl ReputationStore for Store {
        fn rating_edges(&self) -> Result<Vec<RatingEdge>, StoreError>;
        fn portfolios(&self) -> Result<HashMap<AccountId, f64>, StoreError>;
        fn connection_counts(&self) -> Result<HashMap<AccountId, u32>, StoreError>;
        fn all_declarations(&self) -> Result<Vec<RelationshipDeclaration>, StoreError>;
        fn declarations_for(&self, account: &AccountId) -> Result<Vec<RelationshipDeclaration>, StoreError>;
        fn direct_raters(&self, target: &AccountId) -> Result<Vec<RaterInfo>, StoreError>;
        fn raters_of_raters(
            &self,
            level1: &[AccountId],
            exclude: &HashSet<AccountId>,
        ) -> Result<Vec<RaterInfo>, StoreError>;
        fn account_name(&self, account: &AccountId) -> Result<Option<String>, StoreError>;
        fn persisted_score(&self, account: &AccountId) -> Result<Option<Score>, StoreError>;
        fn existing_accounts(&self, accounts: &[AccountId]) -> Result<HashSet<AccountId>, StoreError>;
        fn write_scores(&self, scores: &[Score]) -> Result<(), StoreError>;
        fn write_connection_counts(&self, counts: &HashMap<AccountId, u32>) -> Result<(), StoreError>;
    }
}

pub fn raw(seed: char) -> String {
    format!("G{}", seed.to_string().repeat(55))
}

pub fn id(seed: char) -> AccountId {
    AccountId::parse(&raw(seed)).unwrap()
}

pub fn rater(account: &str, rating: &str, portfolio: f64, rated: &str) -> RaterInfo {
    RaterInfo {
        account: account.to_owned(),
        name: None,
        rating: rating.to_owned(),
        portfolio,
        own_score: None,
        rated: rated.to_owned(),
    }
}

pub fn score(account: AccountId, weighted: f64, total: u32) -> Score {
    Score {
        account,
        weighted_score: weighted,
        base_score: weighted,
        count_a: total,
        count_b: 0,
        count_c: 0,
        count_d: 0,
        total_ratings: total,
        total_weight: f64::from(total),
        calculated_at: 1_700_000_000,
    }
}
