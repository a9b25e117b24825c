//! services/api/src/lib.rs
//!
//! Library root for the API service. The `api` binary wires these modules
//! together; the `openapi` binary only needs `web::rest::ApiDoc`.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
