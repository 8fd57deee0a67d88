//! Repository aggregation
//!
//! Turns remote metadata and activity history into a [`RepositorySnapshot`].
//! An aggregation either yields a complete snapshot or a single error.

pub mod error;
pub mod orchestrator;
pub mod snapshot;

pub use error::{AggregateError, AggregateResult};
pub use orchestrator::Aggregator;
pub use snapshot::{RepositorySnapshot, RepositorySummary};
