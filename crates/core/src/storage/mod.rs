//! Storage gateway abstraction.
//!
//! Three remote calls back the upload pipeline: credential issuance,
//! direct transfer to object storage, and confirmation. Listing and
//! deletion of confirmed assets live here too.

mod http;
mod types;

pub use http::HttpStorageGateway;
pub use types::*;
