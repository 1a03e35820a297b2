//! Error types for the Lumen trust engine.
//!
//! Absence of data (no score row, an empty graph) is never an error; it is
//! modelled as `Option::None` by the callers. Malformed records are dropped
//! by the engine rather than reported.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("backend: {0}")] Backend(String),
    #[error("codec: {0}")] Codec(String),
    #[error("missing column family: {0}")] MissingColumnFamily(String),
    #[error("corrupt record in {table}: {detail}")] Corrupt { table: &'static str, detail: String },
}

#[derive(Error, Debug)]
pub enum ReputationError {
    #[error("{op} failed{}: {source}", account_suffix(.account))]
    Store {
        op: &'static str,
        account: Option<String>,
        #[source]
        source: StoreError,
    },
    #[error("operation cancelled: {0}")] Cancelled(&'static str),
    #[error("invalid configuration: {0}")] Config(String),
}

impl ReputationError {
    /// Wrap a store failure with the operation that issued it.
    pub fn store(op: &'static str, source: StoreError) -> Self {
        Self::Store { op, account: None, source }
    }

    /// Wrap a store failure with the operation and the account it concerned.
    pub fn store_for(op: &'static str, account: impl Into<String>, source: StoreError) -> Self {
        Self::Store { op, account: Some(account.into()), source }
    }
}

fn account_suffix(account: &Option<String>) -> String {
    match account {
        Some(id) => format!(" for {id}"),
        None => String::new(),
    }
}

/// Extension for attaching operation context to store results.
pub trait StoreResultExt<T> {
    fn op(self, op: &'static str) -> Result<T, ReputationError>;
    fn op_for(self, op: &'static str, account: &str) -> Result<T, ReputationError>;
}

impl<T> StoreResultExt<T> for Result<T, StoreError> {
    fn op(self, op: &'static str) -> Result<T, ReputationError> {
        self.map_err(|e| ReputationError::store(op, e))
    }

    fn op_for(self, op: &'static str, account: &str) -> Result<T, ReputationError> {
        self.map_err(|e| ReputationError::store_for(op, account, e))
    }
}
