//! xlpivot - pivot table composition for SpreadsheetML packages
//!
//! This library builds the parts that make up an Excel pivot table and links
//! them into a workbook package: the pivot cache definition, the pivot table
//! definition, their relationships, the workbook pivot cache registry entry
//! and the content type overrides.
//!
//! # Features
//!
//! - **Range normalisation**: `Sheet1!$E$31:$A$1` style ranges with reversed
//!   corners and defined names
//! - **Field classification**: row, column, filter and data axes with a fixed
//!   precedence when a field is declared twice
//! - **Staged writes**: both definitions are built and serialized before the
//!   first part is written
//! - **Read-back**: generated parts can be parsed back into summaries
//!
//! # Example
//!
//! ```
//! use xlpivot::xlsx::Workbook;
//! use xlpivot::xlsx::pivot::{PivotTableField, PivotTableOptions};
//!
//! # fn main() -> xlpivot::Result<()> {
//! let mut wb = Workbook::create()?;
//! wb.add_sheet("Sheet1")?;
//! wb.set_row_values("Sheet1", "A1", &["Month", "Year", "Type", "Sales", "Region"])?;
//!
//! let opts = PivotTableOptions {
//!     rows: vec![PivotTableField::new("Month").with_default_subtotal(true)],
//!     filter: vec![PivotTableField::new("Region")],
//!     columns: vec![PivotTableField::new("Type")],
//!     data: vec![PivotTableField::new("Sales").with_name("Summarize").with_subtotal("Sum")],
//!     row_grand_totals: true,
//!     col_grand_totals: true,
//!     show_row_headers: true,
//!     ..PivotTableOptions::new("Sheet1!$A$1:$E$31", "Sheet1!$G$2:$M$34")
//! };
//! wb.add_pivot_table(&opts)?;
//!
//! let parts = wb.to_parts()?;
//! assert!(parts.contains_key("xl/pivotTables/pivotTable1.xml"));
//! assert!(parts.contains_key("xl/pivotCache/pivotCacheDefinition1.xml"));
//! # Ok(())
//! # }
//! ```

/// XML and cell reference helpers
pub mod common;

/// Error types
pub mod error;

/// Open Packaging Conventions plumbing
///
/// Part names, relationships, content types and the in-memory part registry.
pub mod opc;

/// Workbook model and pivot tables
pub mod xlsx;

pub use error::{PivotError, Result};
pub use xlsx::{SharedWorkbook, Workbook};
