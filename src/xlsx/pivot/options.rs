//! Pivot table request options.
//!
//! [`PivotTableOptions`] describes one pivot table: where the source data
//! lives, where the table is placed, which fields go on which axis and how the
//! table is laid out. It can be built in code or loaded from YAML.

use serde::{Deserialize, Serialize};

use crate::error::{PivotError, Result};

/// Maximum number of characters kept in a field display name.
pub const MAX_FIELD_LENGTH: usize = 255;

/// Built-in style applied when no style name is given.
pub const DEFAULT_PIVOT_STYLE: &str = "PivotStyleLight16";

/// Version written to the created/refreshed/updated version attributes.
pub const PIVOT_TABLE_VERSION: u8 = 3;

/// Settings of one field placed on an axis.
///
/// `subtotal` is only meaningful for data fields and accepts any casing of
/// `average`, `count`, `countNums`, `max`, `min`, `product`, `stdDev`,
/// `stdDevp`, `sum`, `var` and `varp`. Anything else aggregates by sum.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotTableField {
    /// Header name of the source column
    pub data: String,
    /// Display name, truncated to [`MAX_FIELD_LENGTH`] characters
    pub name: String,
    pub subtotal: String,
    pub compact: bool,
    pub outline: bool,
    pub default_subtotal: bool,
}

impl PivotTableField {
    /// Field for the source column named `data`.
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_subtotal(mut self, subtotal: impl Into<String>) -> Self {
        self.subtotal = subtotal.into();
        self
    }

    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    pub fn with_outline(mut self, outline: bool) -> Self {
        self.outline = outline;
        self
    }

    pub fn with_default_subtotal(mut self, default_subtotal: bool) -> Self {
        self.default_subtotal = default_subtotal;
        self
    }
}

/// Full description of a pivot table to add.
///
/// A field should appear on at most one of `rows`, `columns` and `filter`.
/// When it appears on several, rows win over filter and filter wins over
/// columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PivotTableOptions {
    /// Source range such as `Sheet1!$A$1:$E$31`, or a defined name
    pub data_range: String,
    /// Placement range such as `Sheet1!$G$2:$M$34`
    pub pivot_table_range: String,
    pub rows: Vec<PivotTableField>,
    pub columns: Vec<PivotTableField>,
    pub data: Vec<PivotTableField>,
    pub filter: Vec<PivotTableField>,
    pub row_grand_totals: bool,
    pub col_grand_totals: bool,
    pub show_drill: bool,
    pub use_auto_formatting: bool,
    pub page_over_then_down: bool,
    pub merge_item: bool,
    pub compact_data: bool,
    pub show_error: bool,
    pub show_row_headers: bool,
    pub show_col_headers: bool,
    pub show_row_stripes: bool,
    pub show_col_stripes: bool,
    pub show_last_column: bool,
    /// Empty selects [`DEFAULT_PIVOT_STYLE`]
    pub pivot_table_style_name: String,
}

impl PivotTableOptions {
    /// Options with the two ranges set and everything else defaulted.
    pub fn new(data_range: impl Into<String>, pivot_table_range: impl Into<String>) -> Self {
        Self {
            data_range: data_range.into(),
            pivot_table_range: pivot_table_range.into(),
            ..Self::default()
        }
    }

    /// Load options from a YAML document.
    ///
    /// # Example
    ///
    /// ```
    /// use xlpivot::xlsx::pivot::PivotTableOptions;
    ///
    /// let opts = PivotTableOptions::from_yaml_str(
    ///     "data_range: Sheet1!$A$1:$E$31\n\
    ///      pivot_table_range: Sheet1!$G$2:$M$34\n\
    ///      rows:\n  - data: Month\n\
    ///      data:\n  - data: Sales\n    name: Summarize\n    subtotal: Sum\n",
    /// )?;
    /// assert_eq!(opts.rows[0].data, "Month");
    /// assert_eq!(opts.data[0].name, "Summarize");
    /// # Ok::<(), xlpivot::PivotError>(())
    /// ```
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_saphyr::from_str(yaml).map_err(|e| PivotError::Config(e.to_string()))
    }

    /// Style name to write, falling back to [`DEFAULT_PIVOT_STYLE`].
    pub fn style_name(&self) -> &str {
        if self.pivot_table_style_name.is_empty() {
            DEFAULT_PIVOT_STYLE
        } else {
            &self.pivot_table_style_name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_name_default() {
        let mut opts = PivotTableOptions::new("Sheet1!A1:B2", "Sheet1!D1:E5");
        assert_eq!(opts.style_name(), DEFAULT_PIVOT_STYLE);

        opts.pivot_table_style_name = "PivotStyleMedium9".to_string();
        assert_eq!(opts.style_name(), "PivotStyleMedium9");
    }

    #[test]
    fn test_field_builder() {
        let field = PivotTableField::new("Sales")
            .with_name("Summarize")
            .with_subtotal("Average")
            .with_compact(true)
            .with_default_subtotal(true);
        assert_eq!(field.data, "Sales");
        assert_eq!(field.name, "Summarize");
        assert_eq!(field.subtotal, "Average");
        assert!(field.compact);
        assert!(!field.outline);
        assert!(field.default_subtotal);
    }

    #[test]
    fn test_from_yaml_str() {
        let yaml = "\
data_range: Sheet1!$A$1:$E$31
pivot_table_range: Sheet1!$G$2:$M$34
rows:
  - data: Month
    default_subtotal: true
  - data: Year
filter:
  - data: Region
columns:
  - data: Type
data:
  - data: Sales
    name: Summarize
    subtotal: Sum
row_grand_totals: true
show_row_headers: true
pivot_table_style_name: PivotStyleDark2
";
        let opts = PivotTableOptions::from_yaml_str(yaml).unwrap();
        assert_eq!(opts.data_range, "Sheet1!$A$1:$E$31");
        assert_eq!(opts.rows.len(), 2);
        assert!(opts.rows[0].default_subtotal);
        assert!(!opts.rows[1].default_subtotal);
        assert_eq!(opts.filter[0].data, "Region");
        assert_eq!(opts.data[0].subtotal, "Sum");
        assert!(opts.row_grand_totals);
        assert!(!opts.col_grand_totals);
        assert_eq!(opts.style_name(), "PivotStyleDark2");
    }

    #[test]
    fn test_from_yaml_str_rejects_bad_types() {
        let err = PivotTableOptions::from_yaml_str("rows: 12\n").unwrap_err();
        assert!(matches!(err, PivotError::Config(_)));
    }
}
