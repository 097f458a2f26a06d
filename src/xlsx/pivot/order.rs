//! Source field order: the header row of the data range.
//!
//! The position of a name in the [`FieldOrder`] is its zero-based column
//! offset within the data range. Every axis list refers to pivot fields by
//! this position, so it is modelled as [`FieldIndex`], which can only be
//! obtained from the order it indexes into.

use crate::common::cell_ref::coordinates_to_cell_name;
use crate::error::{PivotError, Result};

use super::ids::PivotHost;
use super::range::{RangeBox, normalize_range};

/// Position of a field within a [`FieldOrder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldIndex(usize);

impl FieldIndex {
    pub fn get(self) -> usize {
        self.0
    }
}

/// Ordered field names of the data range, one per column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldOrder {
    names: Vec<String>,
}

impl FieldOrder {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Names paired with their positions.
    pub fn iter(&self) -> impl Iterator<Item = (FieldIndex, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(pos, name)| (FieldIndex(pos), name.as_str()))
    }

    /// Position of the first field named exactly `name`.
    pub fn position(&self, name: &str) -> Option<FieldIndex> {
        self.names.iter().position(|n| n == name).map(FieldIndex)
    }

    /// Checked conversion of a raw position.
    pub fn index(&self, pos: usize) -> Result<FieldIndex> {
        if pos < self.names.len() {
            Ok(FieldIndex(pos))
        } else {
            Err(PivotError::FieldIndexOutOfRange {
                index: pos,
                len: self.names.len(),
            })
        }
    }

    pub fn name(&self, index: FieldIndex) -> Option<&str> {
        self.names.get(index.0).map(String::as_str)
    }
}

/// Data range after defined-name resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    range: RangeBox,
    defined_name: Option<String>,
}

impl DataSource {
    pub fn new(range: RangeBox, defined_name: Option<String>) -> Self {
        Self {
            range,
            defined_name,
        }
    }

    pub fn range(&self) -> &RangeBox {
        &self.range
    }

    /// Defined name the range was resolved from, if any.
    pub fn defined_name(&self) -> Option<&str> {
        self.defined_name.as_deref()
    }
}

/// Resolve the data range of a request.
///
/// When `data_range` is a defined name visible from `scope_sheet`, its target
/// is used and the name is remembered; otherwise `data_range` is parsed as a
/// literal range. Range errors name the `DataRange` parameter.
pub fn resolve_data_source<H: PivotHost + ?Sized>(
    host: &H,
    data_range: &str,
    scope_sheet: &str,
) -> Result<DataSource> {
    let (range, defined_name) = match host
        .defined_name_ref(data_range, scope_sheet)
        .filter(|target| !target.is_empty())
    {
        Some(target) => (normalize_range(&target), Some(data_range.to_string())),
        None => (normalize_range(data_range), None),
    };

    Ok(DataSource {
        range: range.map_err(|e| e.in_parameter("DataRange"))?,
        defined_name,
    })
}

/// Read the header row of the data range, left to right.
///
/// Cell lookup errors from the host are returned as they are.
pub fn resolve_field_order<H: PivotHost + ?Sized>(host: &H, source: &DataSource) -> Result<FieldOrder> {
    let range = source.range();
    let mut names = Vec::with_capacity(range.width() as usize);

    for col in range.columns() {
        let cell = coordinates_to_cell_name(col, range.top_row())?;
        names.push(host.cell_value(range.sheet(), &cell)?);
    }

    Ok(FieldOrder::new(names))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> FieldOrder {
        FieldOrder::new(
            ["Month", "Year", "Type", "Sales", "Region"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    #[test]
    fn test_position_is_column_offset() {
        let order = order();
        for (offset, name) in ["Month", "Year", "Type", "Sales", "Region"].iter().enumerate() {
            assert_eq!(order.position(name).map(FieldIndex::get), Some(offset));
        }
        assert_eq!(order.position("month"), None);
    }

    #[test]
    fn test_position_first_match_wins() {
        let order = FieldOrder::new(vec!["A".into(), "B".into(), "A".into()]);
        assert_eq!(order.position("A").map(FieldIndex::get), Some(0));
    }

    #[test]
    fn test_index_is_bounded() {
        let order = order();
        assert_eq!(order.index(4).unwrap().get(), 4);
        assert!(matches!(
            order.index(5),
            Err(PivotError::FieldIndexOutOfRange { index: 5, len: 5 })
        ));
        assert_eq!(order.name(order.index(3).unwrap()), Some("Sales"));
    }

    #[test]
    fn test_iter_pairs_positions() {
        let order = order();
        let collected: Vec<(usize, &str)> = order.iter().map(|(i, n)| (i.get(), n)).collect();
        assert_eq!(collected[0], (0, "Month"));
        assert_eq!(collected[4], (4, "Region"));
    }
}
