//! A1-style cell address helpers shared by both translation directions

/// Extract the column reference of a cell address ("AB12" -> "AB")
///
/// The reference is the maximal leading run of alphabetic characters. An
/// address that starts with anything else has no column reference.
pub fn column_reference(address: &str) -> Option<&str> {
    let end = address
        .char_indices()
        .find(|(_, ch)| !ch.is_alphabetic())
        .map(|(i, _)| i)
        .unwrap_or(address.len());

    if end == 0 { None } else { Some(&address[..end]) }
}

/// Convert column number to letters (0 -> A, 25 -> Z, 26 -> AA)
pub fn col_to_letter(mut col: u32) -> String {
    let mut result = String::new();
    loop {
        result.insert(0, (b'A' + (col % 26) as u8) as char);
        if col < 26 {
            break;
        }
        col = col / 26 - 1;
    }
    result
}

/// Format 0-based (row, col) as an Excel-style address ("A1")
pub fn cell_address(row: u32, col: u32) -> String {
    format!("{}{}", col_to_letter(col), row + 1)
}

/// Parse a cell reference like "A1" or "$B$2" into (row, col) as 0-based indices
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    let mut col = 0u32;
    let mut row_str = String::new();

    for ch in cell_ref.trim().chars() {
        if ch == '$' {
            continue;
        }
        if ch.is_ascii_alphabetic() && row_str.is_empty() {
            col = col
                .checked_mul(26)?
                .checked_add(ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1)?;
        } else if ch.is_ascii_digit() {
            row_str.push(ch);
        } else {
            return None;
        }
    }

    if col == 0 || row_str.is_empty() {
        return None;
    }

    let row = row_str.parse::<u32>().ok()?;
    if row == 0 {
        return None;
    }

    // Convert to 0-based
    Some((row - 1, col - 1))
}

/// Parse a cell range like "A1:B2" into (start_row, start_col, end_row, end_col)
///
/// A sheet qualifier ("Sheet1!A1:B2") is dropped and a single cell is
/// treated as a one-cell range.
pub fn parse_cell_range(range: &str) -> Option<(u32, u32, u32, u32)> {
    let range = range.rsplit_once('!').map_or(range, |(_, r)| r);

    match range.split_once(':') {
        Some((start, end)) => {
            let (start_row, start_col) = parse_cell_ref(start)?;
            let (end_row, end_col) = parse_cell_ref(end)?;
            Some((
                start_row.min(end_row),
                start_col.min(end_col),
                start_row.max(end_row),
                start_col.max(end_col),
            ))
        }
        None => {
            let (row, col) = parse_cell_ref(range)?;
            Some((row, col, row, col))
        }
    }
}
