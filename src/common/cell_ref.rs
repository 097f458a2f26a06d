//! A1-style cell reference helpers.
//!
//! All coordinates in this module are 1-based: column 1 is `A`, row 1 is the
//! first row of the sheet.

use crate::error::{PivotError, Result};

/// Number of columns in a worksheet (`A` through `XFD`).
pub const TOTAL_COLUMNS: u32 = 16_384;

/// Number of rows in a worksheet.
pub const TOTAL_ROWS: u32 = 1_048_576;

/// Convert a 1-based column number to its column name (1 = A, 27 = AA).
///
/// Returns an empty string for 0.
pub fn column_index_to_name(mut col: u32) -> String {
    let mut name = Vec::with_capacity(3);

    while col > 0 {
        col -= 1;
        name.push(b'A' + (col % 26) as u8);
        col /= 26;
    }

    name.reverse();
    // Only ASCII uppercase letters are ever pushed
    String::from_utf8(name).unwrap_or_default()
}

/// Convert a column name to its 1-based column number (A = 1, AA = 27).
///
/// Case insensitive. Returns `None` for empty or non-alphabetic input.
pub fn column_name_to_index(name: &str) -> Option<u32> {
    if name.is_empty() {
        return None;
    }

    let mut result: u32 = 0;
    for ch in name.bytes() {
        if !ch.is_ascii_alphabetic() {
            return None;
        }
        let digit = (ch.to_ascii_uppercase() - b'A') as u32 + 1;
        result = result.checked_mul(26)?.checked_add(digit)?;
    }

    Some(result)
}

/// Parse a cell name such as `B7` into 1-based `(col, row)`.
///
/// Letters must precede digits and both parts must be present. Columns past
/// `XFD` and rows past the sheet limit are rejected.
pub fn cell_name_to_coordinates(cell: &str) -> Result<(u32, u32)> {
    let split = cell
        .bytes()
        .position(|b| b.is_ascii_digit())
        .ok_or_else(|| PivotError::InvalidCellReference(cell.to_string()))?;
    let (col_str, row_str) = cell.split_at(split);

    if !row_str.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PivotError::InvalidCellReference(cell.to_string()));
    }

    let col = column_name_to_index(col_str)
        .filter(|col| *col <= TOTAL_COLUMNS)
        .ok_or_else(|| PivotError::InvalidCellReference(cell.to_string()))?;
    let row = atoi_simd::parse::<u32>(row_str.as_bytes())
        .ok()
        .filter(|row| (1..=TOTAL_ROWS).contains(row))
        .ok_or_else(|| PivotError::InvalidCellReference(cell.to_string()))?;

    Ok((col, row))
}

/// Build a cell name from 1-based `(col, row)`.
pub fn coordinates_to_cell_name(col: u32, row: u32) -> Result<String> {
    if col == 0 || col > TOTAL_COLUMNS || row == 0 || row > TOTAL_ROWS {
        return Err(PivotError::InvalidCellReference(format!(
            "({}, {})",
            col, row
        )));
    }

    let mut name = column_index_to_name(col);
    name.push_str(itoa::Buffer::new().format(row));
    Ok(name)
}

/// Parse an area such as `A1:E31` into `[x1, y1, x2, y2]`.
///
/// Corners are returned as written; ordering is the caller's concern.
pub fn area_ref_to_coordinates(area: &str) -> Result<[u32; 4]> {
    let mut corners = area.split(':');
    let (first, second) = match (corners.next(), corners.next(), corners.next()) {
        (Some(first), Some(second), None) => (first, second),
        _ => {
            return Err(PivotError::InvalidParameter(format!(
                "'{}' is not a cell range",
                area
            )));
        },
    };

    let (x1, y1) = cell_name_to_coordinates(first)
        .map_err(|e| PivotError::InvalidParameter(e.to_string()))?;
    let (x2, y2) = cell_name_to_coordinates(second)
        .map_err(|e| PivotError::InvalidParameter(e.to_string()))?;

    Ok([x1, y1, x2, y2])
}
