//! Integration test suite for the Lumen trust engine.
//!
//! Tests drive the full pipeline (snapshot import, batch scoring, graph and
//! relation queries) through the real stores.

pub mod helpers;
