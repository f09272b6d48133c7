//! Shared foundation for the licibot workspace: configuration, the
//! pipeline error taxonomy, the procurement schema whitelist, and the
//! domain types exchanged between the assistant pipeline and its
//! collaborators (database executor, HTTP API, CLI).

pub mod config;
pub mod domain;
pub mod errors;
pub mod schema;
