//! Collector Error Types

use std::time::Duration;
use thiserror::Error;
use crate::source::{ResourceKind, SourceError};

/// Result type for collection operations
pub type CollectResult<T> = Result<T, CollectError>;

/// Errors that abort a collection. No partial results are returned.
#[derive(Debug, Error)]
pub enum CollectError {
    /// A page fetch failed
    #[error("Failed to fetch {kind} page {page}: {source}")]
    Page {
        kind: ResourceKind,
        page: u32,
        #[source]
        source: SourceError,
    },

    /// A non-paginated request failed
    #[error("Failed to fetch {what}: {source}")]
    Request {
        what: &'static str,
        #[source]
        source: SourceError,
    },

    /// The listing has more pages than the configured cap
    #[error("{kind} listing has {pages} pages, more than the limit of {limit}\n\nRaise [collector] max-pages or --max-pages to collect it.")]
    PageLimitExceeded {
        kind: ResourceKind,
        pages: u32,
        limit: u32,
    },

    /// A `prev` link was missing or did not point at the preceding page
    #[error("Inconsistent pagination in {kind}: page {page} {}", describe_prev(.prev))]
    InconsistentPagination {
        kind: ResourceKind,
        page: u32,
        prev: Option<u32>,
    },

    /// The cumulative collection deadline passed
    #[error("Collection did not finish within {0:?}")]
    DeadlineExceeded(Duration),

    /// Cancellation was requested
    #[error("Collection was cancelled")]
    Cancelled,
}

impl CollectError {
    pub fn page(kind: ResourceKind, page: u32, source: SourceError) -> Self {
        Self::Page { kind, page, source }
    }

    pub fn request(what: &'static str, source: SourceError) -> Self {
        Self::Request { what, source }
    }

    /// The underlying source error, if the failure came from the source
    pub fn source_error(&self) -> Option<&SourceError> {
        match self {
            Self::Page { source, .. } | Self::Request { source, .. } => Some(source),
            _ => None,
        }
    }
}

fn describe_prev(prev: &Option<u32>) -> String {
    match prev {
        Some(prev) => format!("links back to page {}", prev),
        None => "has no link to the previous page".to_string(),
    }
}
