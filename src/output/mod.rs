//! Output formatting and display module

pub mod colours;
pub mod format;
pub mod reports;

pub use colours::ColourManager;
pub use format::CompactFormat;
pub use reports::{format_activity_table, format_compact_table, format_summaries};
