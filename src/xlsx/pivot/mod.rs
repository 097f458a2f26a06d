//! Pivot table composition.
//!
//! A pivot table is two parts plus their links: a cache definition describing
//! the source data and a table definition describing layout and aggregation.
//! [`add_pivot_table`] builds both from [`PivotTableOptions`] and writes them
//! into a [`PivotHost`].

pub mod add;
pub mod cache;
pub mod classify;
pub mod fields;
pub mod ids;
pub mod link;
pub mod options;
pub mod order;
pub mod range;
pub mod reader;
pub mod table;
pub mod writer;

pub use add::{AddedPivotTable, StagedPivotTable, add_pivot_table, commit_pivot_table, stage_pivot_table};
pub use cache::{CacheSource, PivotCacheDefinition, PivotCacheField};
pub use classify::{AxisRole, FieldClass, classify_field};
pub use fields::{AxisFieldRef, AxisType, DataField, FieldItem, PageField, PivotField, RowColItem, Subtotal};
pub use ids::{CacheSequenceId, PartKind, PivotHost, TableSequenceId, WorkbookCacheRegistryId};
pub use link::PivotIds;
pub use options::{DEFAULT_PIVOT_STYLE, MAX_FIELD_LENGTH, PivotTableField, PivotTableOptions};
pub use order::{DataSource, FieldIndex, FieldOrder};
pub use range::{RangeBox, normalize_range};
pub use reader::{
    PivotCacheSummary, PivotTableSummary, read_pivot_cache_definition, read_pivot_table_definition,
};
pub use table::{Location, PivotTableDefinition, PivotTableStyle};
pub use writer::{write_pivot_cache_definition, write_pivot_table};
