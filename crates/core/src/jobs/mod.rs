//! Edit-job gateway abstraction.
//!
//! Start, fetch, and latest-job lookups against the compute backend. The
//! polling state machine that samples these lives in [`crate::tracker`].

mod http;
mod types;

pub use http::HttpJobGateway;
pub use types::*;
