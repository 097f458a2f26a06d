//! SpreadsheetML workbook model and pivot table support.

pub mod pivot;
pub mod shared;
pub mod workbook;

pub use shared::SharedWorkbook;
pub use workbook::{DefinedName, PivotCacheEntry, Workbook};
