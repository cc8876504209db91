//! Multi-file upload pipeline.
//!
//! The orchestrator turns a batch of local files into confirmed remote
//! assets via the three-step protocol, with per-file independent
//! success/failure and strictly sequential processing.

mod orchestrator;
mod types;

pub use orchestrator::UploadOrchestrator;
pub use types::*;
