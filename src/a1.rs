//! A1 notation helpers.

/// Converts a 1-based column index to its letter label.
///
/// `1 -> "A"`, `26 -> "Z"`, `27 -> "AA"`. Index 0 has no label and yields an
/// empty string.
pub fn column_letter(index: usize) -> String {
    let mut n = index;
    let mut letters = Vec::new();

    while n > 0 {
        let remainder = (n - 1) % 26;
        letters.push(b'A' + remainder as u8);
        n = (n - 1) / 26;
    }

    letters.iter().rev().map(|&b| b as char).collect()
}

/// Same as [`column_letter`] for a 0-based index (`0 -> "A"`).
pub fn column_letter_zero_based(index: usize) -> String {
    column_letter(index + 1)
}

/// Quotes a sheet title for use in a range: `Data` -> `'Data'`, `Bob's` -> `'Bob''s'`.
pub fn quote_sheet_title(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// Prefixes `range` with the quoted sheet title. An empty range addresses the whole sheet.
pub fn qualified_range(title: &str, range: &str) -> String {
    if range.is_empty() {
        quote_sheet_title(title)
    } else {
        format!("{}!{}", quote_sheet_title(title), range)
    }
}

/// `A<first_row>:<last column><last_row>` for a block `columns` wide.
pub fn block_range(first_row: usize, last_row: usize, columns: usize) -> String {
    format!("A{}:{}{}", first_row, column_letter(columns), last_row)
}
