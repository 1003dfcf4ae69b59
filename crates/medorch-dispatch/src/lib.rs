//! Multi-source batch lookup over external worker processes.
//!
//! A batch of lookup keys is partitioned per source, every `(source, key)`
//! pair is handed to one external worker concurrently, and the outcomes are
//! merged back into one record per key in input order. A failing worker only
//! ever fails its own slot.

pub mod collaborator;
pub mod dispatcher;
pub mod error;
pub mod merge;
pub mod outcome;
pub mod partition;
pub mod source;
pub mod worker;

mod process;

pub use collaborator::Collaborator;
pub use dispatcher::{DispatchedOutcome, Dispatcher};
pub use error::{DispatchError, UpstreamError};
pub use merge::{merge_outcomes, MergedRecord};
pub use outcome::{WorkerFailure, WorkerOutcome};
pub use partition::partition;
pub use source::SourceId;
pub use worker::{interpret_worker_output, ProcessWorker, Worker, WorkerOutput};
