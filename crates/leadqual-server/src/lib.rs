//! Leadqual HTTP Server
//!
//! Exposes the qualification pipeline and the multi-agent router over HTTP.

mod error;
mod routes;
mod server;

pub use error::ApiError;
pub use server::{build_app, start_server, AppState};
