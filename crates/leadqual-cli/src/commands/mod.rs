//! CLI command handlers
//!
//! Each handler returns the process exit code on success.

pub mod agent;
pub mod delete;
pub mod ingest;
pub mod query;
pub mod serve;
pub mod status;
