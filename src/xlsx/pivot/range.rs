//! Range normalisation for pivot data and placement ranges.

use crate::common::cell_ref::{area_ref_to_coordinates, coordinates_to_cell_name};
use crate::error::{PivotError, Result};

/// A rectangular, sheet-qualified cell range with ordered corners.
///
/// Coordinates are 1-based and satisfy `x1 <= x2`, `y1 <= y2`. The box always
/// covers at least two cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangeBox {
    sheet: String,
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
}

impl RangeBox {
    pub fn sheet(&self) -> &str {
        &self.sheet
    }

    /// `[x1, y1, x2, y2]`
    pub fn coordinates(&self) -> [u32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    /// Number of columns covered.
    pub fn width(&self) -> u32 {
        self.x2 - self.x1 + 1
    }

    /// First row of the box (the header row of a data range).
    pub fn top_row(&self) -> u32 {
        self.y1
    }

    /// Columns covered, left to right.
    pub fn columns(&self) -> std::ops::RangeInclusive<u32> {
        self.x1..=self.x2
    }

    /// Address without sheet or `$` markers, e.g. `A1:E31`.
    pub fn reference(&self) -> Result<String> {
        let first = coordinates_to_cell_name(self.x1, self.y1)?;
        let last = coordinates_to_cell_name(self.x2, self.y2)?;
        Ok(format!("{}:{}", first, last))
    }
}

/// Parse a range such as `Sheet1!$E$31:$A$1` into a normalised [`RangeBox`].
///
/// `$` markers are ignored and a single-quoted sheet name is unquoted. Corners
/// are reordered per axis, so `C1:B3` becomes `B1:C3`.
///
/// # Errors
///
/// - [`PivotError::MissingParameter`] for an empty string
/// - [`PivotError::InvalidParameter`] when there is not exactly one `!`, the
///   address is not two valid cell names, or both corners are the same cell
pub fn normalize_range(range: &str) -> Result<RangeBox> {
    if range.is_empty() {
        return Err(PivotError::MissingParameter(String::new()));
    }

    if memchr::memchr_iter(b'!', range.as_bytes()).count() != 1 {
        return Err(PivotError::InvalidParameter(format!(
            "'{}' must be written as Sheet!A1:B2",
            range
        )));
    }
    let (sheet, address) = range
        .split_once('!')
        .ok_or_else(|| PivotError::InvalidParameter(range.to_string()))?;

    let address = address.replace('$', "");
    let [mut x1, mut y1, mut x2, mut y2] = area_ref_to_coordinates(&address)?;

    if x1 == x2 && y1 == y2 {
        return Err(PivotError::InvalidParameter(format!(
            "'{}' covers a single cell",
            range
        )));
    }

    if x2 < x1 {
        std::mem::swap(&mut x1, &mut x2);
    }
    if y2 < y1 {
        std::mem::swap(&mut y1, &mut y2);
    }

    Ok(RangeBox {
        sheet: unquote_sheet_name(sheet),
        x1,
        y1,
        x2,
        y2,
    })
}

fn unquote_sheet_name(sheet: &str) -> String {
    match sheet.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')) {
        Some(inner) => inner.replace("''", "'"),
        None => sheet.to_string(),
    }
}
