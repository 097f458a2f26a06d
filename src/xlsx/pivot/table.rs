//! Pivot table definition.
//!
//! The pivot field list mirrors the field order one to one. Row, column, page
//! and data lists point back into it by [`FieldIndex`].

use smallvec::smallvec;

use crate::error::Result;

use super::classify::{AxisRole, FieldClass, classify_field, display_name};
use super::fields::{
    AxisFieldList, AxisFieldRef, DataField, FieldItem, PageField, PivotField, RowColItem, Subtotal,
};
use super::ids::{TableSequenceId, WorkbookCacheRegistryId};
use super::options::{PIVOT_TABLE_VERSION, PivotTableField, PivotTableOptions};
use super::order::{FieldIndex, FieldOrder};
use super::range::normalize_range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub reference: String,
    pub first_header_row: u32,
    pub first_data_row: u32,
    pub first_data_col: u32,
}

impl Location {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            first_header_row: 1,
            first_data_row: 1,
            first_data_col: 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PivotTableStyle {
    pub name: String,
    pub show_row_headers: bool,
    pub show_col_headers: bool,
    pub show_row_stripes: bool,
    pub show_col_stripes: bool,
    pub show_last_column: bool,
}

impl From<&PivotTableOptions> for PivotTableStyle {
    fn from(opts: &PivotTableOptions) -> Self {
        Self {
            name: opts.style_name().to_string(),
            show_row_headers: opts.show_row_headers,
            show_col_headers: opts.show_col_headers,
            show_row_stripes: opts.show_row_stripes,
            show_col_stripes: opts.show_col_stripes,
            show_last_column: opts.show_last_column,
        }
    }
}

/// In-memory pivot table definition, ready to serialize.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotTableDefinition {
    pub name: String,
    pub cache_id: WorkbookCacheRegistryId,
    pub data_caption: String,
    pub row_grand_totals: bool,
    pub col_grand_totals: bool,
    pub show_drill: bool,
    pub use_auto_formatting: bool,
    pub page_over_then_down: bool,
    pub merge_item: bool,
    pub compact_data: bool,
    pub show_error: bool,
    pub created_version: u8,
    pub updated_version: u8,
    pub min_refreshable_version: u8,
    pub location: Location,
    pub pivot_fields: Vec<PivotField>,
    pub row_fields: AxisFieldList,
    /// `None` leaves the column field block out entirely
    pub col_fields: Option<AxisFieldList>,
    pub page_fields: Vec<PageField>,
    pub data_fields: Vec<DataField>,
    pub row_items: Vec<RowColItem>,
    pub col_items: Vec<RowColItem>,
    pub style: PivotTableStyle,
}

/// Display name of the table with the given sequence number.
pub fn table_name(table_seq: TableSequenceId) -> String {
    format!("Pivot Table{}", table_seq)
}

/// Build the table definition.
///
/// The placement range is parsed again here; a failure names the
/// `PivotTableRange` parameter.
pub fn build_table_definition(
    table_seq: TableSequenceId,
    cache_id: WorkbookCacheRegistryId,
    opts: &PivotTableOptions,
    order: &FieldOrder,
) -> Result<PivotTableDefinition> {
    let placement =
        normalize_range(&opts.pivot_table_range).map_err(|e| e.in_parameter("PivotTableRange"))?;

    Ok(PivotTableDefinition {
        name: table_name(table_seq),
        cache_id,
        data_caption: "Values".to_string(),
        row_grand_totals: opts.row_grand_totals,
        col_grand_totals: opts.col_grand_totals,
        show_drill: opts.show_drill,
        use_auto_formatting: opts.use_auto_formatting,
        page_over_then_down: opts.page_over_then_down,
        merge_item: opts.merge_item,
        compact_data: opts.compact_data,
        show_error: opts.show_error,
        created_version: PIVOT_TABLE_VERSION,
        updated_version: PIVOT_TABLE_VERSION,
        min_refreshable_version: PIVOT_TABLE_VERSION,
        location: Location::new(placement.reference()?),
        pivot_fields: build_pivot_fields(order, opts),
        row_fields: axis_positions(&opts.rows, order)
            .map(AxisFieldRef::Field)
            .collect(),
        col_fields: build_col_fields(order, opts),
        page_fields: build_page_fields(order, opts),
        data_fields: build_data_fields(order, opts),
        row_items: vec![RowColItem { x: smallvec![0, 0] }],
        col_items: vec![RowColItem::default()],
        style: PivotTableStyle::from(opts),
    })
}

/// One pivot field per entry of `order`.
pub fn build_pivot_fields(order: &FieldOrder, opts: &PivotTableOptions) -> Vec<PivotField> {
    order
        .iter()
        .map(|(_, name)| pivot_field(classify_field(name, opts)))
        .collect()
}

fn pivot_field(class: FieldClass) -> PivotField {
    let name = Some(class.display_name).filter(|n| !n.is_empty());

    match class.role {
        AxisRole::Row | AxisRole::Column => PivotField {
            name,
            axis: class.role.axis_type(),
            data_field: class.is_data_field,
            compact: Some(class.layout.compact),
            outline: Some(class.layout.outline),
            default_subtotal: Some(class.layout.default_subtotal),
            items: vec![if class.layout.default_subtotal {
                FieldItem::Default
            } else {
                FieldItem::Index(0)
            }],
        },
        AxisRole::Filter => PivotField {
            name,
            axis: class.role.axis_type(),
            data_field: class.is_data_field,
            items: vec![FieldItem::Default],
            ..PivotField::default()
        },
        AxisRole::Data => PivotField {
            data_field: true,
            ..PivotField::default()
        },
        AxisRole::Unused => PivotField::default(),
    }
}

/// Positions of declared fields, in declaration order.
///
/// Declarations that do not name a header column are skipped.
fn axis_positions<'a>(
    fields: &'a [PivotTableField],
    order: &'a FieldOrder,
) -> impl Iterator<Item = FieldIndex> + 'a {
    fields.iter().filter_map(move |field| field_position(field, order))
}

fn field_position(field: &PivotTableField, order: &FieldOrder) -> Option<FieldIndex> {
    let position = order.position(&field.data);
    if position.is_none() {
        log::warn!("pivot field '{}' is not in the data range header; skipped", field.data);
    }
    position
}

/// Column field list, with the values field appended when there are several
/// data fields.
fn build_col_fields(order: &FieldOrder, opts: &PivotTableOptions) -> Option<AxisFieldList> {
    let multiple_data = opts.data.len() > 1;

    if opts.columns.is_empty() {
        return multiple_data.then(|| smallvec![AxisFieldRef::Values]);
    }

    let mut fields: AxisFieldList = axis_positions(&opts.columns, order)
        .map(AxisFieldRef::Field)
        .collect();
    if multiple_data {
        fields.push(AxisFieldRef::Values);
    }
    Some(fields)
}

fn build_page_fields(order: &FieldOrder, opts: &PivotTableOptions) -> Vec<PageField> {
    opts.filter
        .iter()
        .filter_map(|field| {
            field_position(field, order).map(|fld| PageField {
                fld,
                name: Some(display_name(&field.name)).filter(|n| !n.is_empty()),
            })
        })
        .collect()
}

fn build_data_fields(order: &FieldOrder, opts: &PivotTableOptions) -> Vec<DataField> {
    opts.data
        .iter()
        .filter_map(|field| {
            field_position(field, order).map(|fld| DataField {
                name: Some(display_name(&field.name)).filter(|n| !n.is_empty()),
                fld,
                subtotal: Subtotal::from_name(&field.subtotal),
            })
        })
        .collect()
}
