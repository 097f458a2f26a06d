//! Thread-safe workbook handle.

use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::Result;
use crate::xlsx::pivot::add::AddedPivotTable;
use crate::xlsx::pivot::options::PivotTableOptions;
use crate::xlsx::workbook::Workbook;

/// A [`Workbook`] shared between threads.
///
/// Adding a pivot table holds the write lock from identifier allocation to
/// the last content type registration, so concurrent callers never observe
/// the same part counts or registry IDs.
#[derive(Debug, Clone)]
pub struct SharedWorkbook {
    inner: Arc<RwLock<Workbook>>,
}

impl SharedWorkbook {
    pub fn new(workbook: Workbook) -> Self {
        Self {
            inner: Arc::new(RwLock::new(workbook)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, Workbook> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, Workbook> {
        self.inner.write()
    }

    /// Add a pivot table under the write lock.
    pub fn add_pivot_table(&self, opts: &PivotTableOptions) -> Result<AddedPivotTable> {
        self.inner.write().add_pivot_table(opts)
    }

    /// Take the workbook back if no other handle is alive.
    pub fn try_unwrap(self) -> std::result::Result<Workbook, Self> {
        Arc::try_unwrap(self.inner)
            .map(RwLock::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl From<Workbook> for SharedWorkbook {
    fn from(workbook: Workbook) -> Self {
        Self::new(workbook)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xlsx::pivot::options::PivotTableField;
    use std::thread;

    #[test]
    fn test_concurrent_adds_get_distinct_ids() {
        let mut wb = Workbook::create().unwrap();
        wb.add_sheet("Sheet1").unwrap();
        wb.set_row_values("Sheet1", "A1", &["Month", "Sales"]).unwrap();
        let shared = SharedWorkbook::new(wb);

        let opts = PivotTableOptions {
            rows: vec![PivotTableField::new("Month")],
            data: vec![PivotTableField::new("Sales")],
            ..PivotTableOptions::new("Sheet1!$A$1:$B$10", "Sheet1!$D$1:$F$10")
        };

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = shared.clone();
                let opts = opts.clone();
                thread::spawn(move || shared.add_pivot_table(&opts).unwrap())
            })
            .collect();
        let mut tables: Vec<u32> = handles
            .into_iter()
            .map(|h| h.join().unwrap().ids.table.get())
            .collect();
        tables.sort_unstable();
        assert_eq!(tables, (1..=8u32).collect::<Vec<_>>());

        let wb = shared.try_unwrap().unwrap();
        let mut registry: Vec<u32> = wb.pivot_caches().iter().map(|e| e.cache_id.get()).collect();
        registry.sort_unstable();
        assert_eq!(registry, (2..=9u32).collect::<Vec<_>>());
        assert_eq!(wb.pivot_tables().unwrap().len(), 8);
    }
}
