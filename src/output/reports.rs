//! Report generation and formatting

use prettytable::{format, Cell, Row, Table};

use crate::aggregation::{RepositorySnapshot, RepositorySummary};

/// Format a compact table with headers and rows using prettytable-rs clean format.
/// Cells that parse as numbers are right-aligned.
pub fn format_compact_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);

    table.add_row(Row::new(headers.iter().map(|header| Cell::new(header)).collect()));

    for row in rows {
        let cells = row
            .iter()
            .map(|cell| {
                if cell.parse::<u64>().is_ok() {
                    Cell::new(cell).style_spec("r")
                } else {
                    Cell::new(cell)
                }
            })
            .collect();
        table.add_row(Row::new(cells));
    }

    // 2-space indent
    let mut result = String::new();
    for line in table.to_string().lines() {
        result.push_str("  ");
        result.push_str(line);
        result.push('\n');
    }

    result
}

/// Stored repositories, in the order given
pub fn format_summaries(summaries: &[RepositorySummary]) -> String {
    let rows: Vec<Vec<String>> = summaries
        .iter()
        .enumerate()
        .map(|(rank, s)| {
            vec![
                (rank + 1).to_string(),
                format!("{}/{}", s.owner_name, s.name),
                s.total_stars.to_string(),
            ]
        })
        .collect();

    format_compact_table(&["#", "Repository", "Stars"], &rows)
}

/// Window counts of one snapshot
pub fn format_activity_table(snapshot: &RepositorySnapshot) -> String {
    let row = |label: &str, total: u64, counts: &crate::activity::WindowCounts| {
        vec![
            label.to_string(),
            total.to_string(),
            counts.last_week.to_string(),
            counts.last_4_weeks.to_string(),
            counts.last_12_months.to_string(),
        ]
    };

    format_compact_table(
        &["", "Total", "Last week", "Last 4 weeks", "Last 12 months"],
        &[
            row("Stars", snapshot.total_stars, &snapshot.star_counts),
            row("Commits", snapshot.total_commits, &snapshot.commit_counts),
        ],
    )
}
