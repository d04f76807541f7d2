//! Report number generation
//!
//! Report numbers are human-readable and sequential, scoped per category
//! and calendar day: `<category-prefix><yy><mm><dd><seq>`, with the
//! sequence zero-padded to four digits (e.g. `HEM2608070001`). The sequence
//! itself is allocated by the report store.

use chrono::{Datelike, NaiveDate};

/// Formats a report number from its parts
pub fn format_report_number(category_prefix: &str, date: NaiveDate, sequence: u32) -> String {
    format!(
        "{}{:02}{:02}{:02}{:04}",
        category_prefix,
        date.year() % 100,
        date.month(),
        date.day(),
        sequence
    )
}
