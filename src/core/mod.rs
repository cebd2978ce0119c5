//! Core utilities shared by every import job
//!
//! - `config`: credentials from `.env` / environment and datastore selection
//! - `http`: auth headers for the stats API and the hosted datastore
//! - `logging`: tracing subscriber setup

pub mod config;
pub mod http;
pub mod logging;

pub use config::{ApiCredentials, BackendChoice, StoreCredentials, StoreTarget};
pub use http::{bearer_header_map, datastore_header_map};
