//! Remote tabular query API client.
//!
//! This crate is the single source of truth for the query API wire contract:
//! column metadata, select rows, lookup search, insert and update.
//!
//! No grid concepts. Calls are blocking; async callers wrap them.

mod api;
mod client;
mod credentials;
mod error;
mod types;

pub use api::QueryApi;
pub use client::HttpQueryApi;
pub use credentials::{credentials_file_path, load_credentials, save_credentials, ServerCredentials};
pub use error::QueryError;
pub use types::{
    FieldValue, Filter, FilterOp, LookupInfo, LookupSearchRequest, LookupSearchResponse,
    QueryColumn, QueryRow, SchemaQuery, SelectRowsRequest, SelectRowsResponse,
};
