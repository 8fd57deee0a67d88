//! Collector configuration

use std::time::Duration;

/// Limits and pacing for paginated collection
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorConfig {
    /// Fixed pause between successive backward page fetches
    pub page_delay: Duration,
    /// Maximum number of pages a single listing may span
    pub max_pages: u32,
    /// Cumulative time budget for one collection, `None` for unbounded
    pub deadline: Option<Duration>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            page_delay: Duration::from_secs(1),
            max_pages: 500,
            deadline: Some(Duration::from_secs(600)),
        }
    }
}

impl CollectorConfig {
    /// No delay and no deadline, for tests and replayed sources
    pub fn unthrottled() -> Self {
        Self {
            page_delay: Duration::ZERO,
            deadline: None,
            ..Self::default()
        }
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Validate collector configuration parameters
    pub fn validate(&self) -> Result<(), String> {
        if self.max_pages == 0 {
            return Err("Max pages must be greater than 0".to_string());
        }

        if let Some(deadline) = self.deadline {
            if deadline.is_zero() {
                return Err("Deadline must be greater than 0 (omit it to disable)".to_string());
            }
            if deadline < self.page_delay {
                return Err("Deadline must be at least as long as the page delay".to_string());
            }
        }

        Ok(())
    }
}
