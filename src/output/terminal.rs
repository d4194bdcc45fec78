//! Failure table layout.
//!
//! Every field is quoted and right-aligned to its column, fields are joined
//! with commas so the table also pastes into a spreadsheet.

/// Failure table columns and their minimum widths.
pub const FAILURE_COLUMNS: [(&str, usize); 6] = [
    ("index", 8),
    ("kind", 10),
    ("network_name", 22),
    ("cidr", 18),
    // A quoted Neutron UUID fills it exactly.
    ("network_id", 38),
    ("error", 0),
];

/// Quote `value` and right-align it to at least `width` characters.
pub fn format_field<T: ToString>(value: T, width: usize) -> String {
    format!("{:>width$}", format!("\"{}\"", value.to_string()))
}

/// One table line, value `n` padded to the width of column `n`.
pub fn table_line<I, T>(values: I) -> String
where
    I: IntoIterator<Item = T>,
    T: ToString,
{
    values
        .into_iter()
        .zip(FAILURE_COLUMNS.iter())
        .map(|(value, (_, width))| format_field(value, *width))
        .collect::<Vec<_>>()
        .join(",")
}

/// The column titles laid out like the rows below them.
pub fn header_line() -> String {
    table_line(FAILURE_COLUMNS.iter().map(|(title, _)| title))
}
