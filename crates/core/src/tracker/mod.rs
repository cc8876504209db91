//! Job polling state machine.
//!
//! Owns the cached job snapshot, starts a fixed-cadence sampler against
//! the job gateway, and halts itself on terminal statuses or external
//! cancellation.

mod poller;

pub use poller::{JobTracker, PollHandle, TrackerSnapshot, DEFAULT_POLL_INTERVAL};
