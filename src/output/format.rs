//! Compact one-line output
//!
//! Used for the per-repository lines printed by `aggregate`, suitable for
//! scripts and quick scanning.

/// Trait for types that can be formatted compactly
pub trait CompactFormat {
    /// Convert the type to a single line without trailing newline
    fn to_compact_format(&self) -> String;
}

impl CompactFormat for crate::aggregation::RepositorySummary {
    fn to_compact_format(&self) -> String {
        format!("{}/{} | Stars: {}", self.owner_name, self.name, self.total_stars)
    }
}
