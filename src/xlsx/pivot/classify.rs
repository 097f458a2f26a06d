//! Axis classification of source fields.
//!
//! A field is looked up by exact name in each axis list of the request. When
//! it is declared on several axes the first match in the order rows, filter,
//! columns, data decides its axis. Whether it is also a data field is decided
//! separately.

use super::fields::AxisType;
use super::options::{MAX_FIELD_LENGTH, PivotTableField, PivotTableOptions};

/// Axis a source field ends up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisRole {
    Row,
    Filter,
    Column,
    /// Only declared as a data field
    Data,
    Unused,
}

impl AxisRole {
    /// Axis attribute of the matching pivot field.
    pub fn axis_type(&self) -> Option<AxisType> {
        match self {
            Self::Row => Some(AxisType::AxisRow),
            Self::Filter => Some(AxisType::AxisPage),
            Self::Column => Some(AxisType::AxisCol),
            Self::Data | Self::Unused => None,
        }
    }
}

/// Layout flags of a row or column field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldLayout {
    pub compact: bool,
    pub outline: bool,
    pub default_subtotal: bool,
}

impl From<&PivotTableField> for FieldLayout {
    fn from(field: &PivotTableField) -> Self {
        Self {
            compact: field.compact,
            outline: field.outline,
            default_subtotal: field.default_subtotal,
        }
    }
}

/// Outcome of classifying one source field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldClass {
    pub role: AxisRole,
    /// Declared in the data list, independently of `role`
    pub is_data_field: bool,
    /// Layout from the list that decided `role`; all `false` when absent
    pub layout: FieldLayout,
    /// Display name from the list that decided `role`
    pub display_name: String,
}

/// First field declared for the source column `name`.
pub fn find_field<'a>(fields: &'a [PivotTableField], name: &str) -> Option<&'a PivotTableField> {
    fields.iter().find(|field| field.data == name)
}

/// Truncate a display name to [`MAX_FIELD_LENGTH`] characters.
pub fn display_name(name: &str) -> String {
    match name.char_indices().nth(MAX_FIELD_LENGTH) {
        Some((cut, _)) => name[..cut].to_string(),
        None => name.to_string(),
    }
}

/// Classify the source field `name` against the request's axis lists.
pub fn classify_field(name: &str, opts: &PivotTableOptions) -> FieldClass {
    let row = find_field(&opts.rows, name);
    let filter = find_field(&opts.filter, name);
    let column = find_field(&opts.columns, name);
    let is_data_field = find_field(&opts.data, name).is_some();

    let declared = [row, filter, column].iter().filter(|f| f.is_some()).count();
    if declared > 1 {
        log::warn!(
            "field '{}' is declared on {} of rows/filter/columns; using the first in that order",
            name,
            declared
        );
    }

    let (role, decided_by) = match (row, filter, column) {
        (Some(field), _, _) => (AxisRole::Row, Some(field)),
        (None, Some(field), _) => (AxisRole::Filter, Some(field)),
        (None, None, Some(field)) => (AxisRole::Column, Some(field)),
        (None, None, None) if is_data_field => (AxisRole::Data, None),
        (None, None, None) => (AxisRole::Unused, None),
    };

    FieldClass {
        role,
        is_data_field,
        layout: decided_by.map(FieldLayout::from).unwrap_or_default(),
        display_name: decided_by
            .map(|field| display_name(&field.name))
            .unwrap_or_default(),
    }
}

/// Whether the cache must itemize values of `name`.
///
/// True when the field is classified on rows or columns and the declaration
/// that decided it switches the default subtotal off.
pub fn is_itemized(name: &str, opts: &PivotTableOptions) -> bool {
    let class = classify_field(name, opts);
    matches!(class.role, AxisRole::Row | AxisRole::Column) && !class.layout.default_subtotal
}
