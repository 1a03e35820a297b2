//! # lumen-core
//! Foundation types, relation tables, and store traits for the Lumen trust
//! engine.

pub mod cancel;
pub mod config;
pub mod constants;
pub mod error;
pub mod relation;
pub mod traits;
pub mod types;

pub use cancel::Cancellation;
pub use config::ReputationConfig;
pub use error::{ReputationError, StoreError};
pub use relation::{Category, RelationKind, RelationTables};
pub use traits::ReputationStore;
pub use types::{AccountId, Grade, Rating, Score};
