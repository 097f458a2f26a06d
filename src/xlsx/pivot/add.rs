//! The add-pivot-table pipeline.
//!
//! Adding a pivot table happens in two steps. [`stage_pivot_table`] validates
//! the request, resolves the field order, allocates identifiers and builds
//! and serializes both definitions without touching the host.
//! [`commit_pivot_table`] then writes parts, relationships, the registry
//! entry and content types. A commit is refused before its first write when
//! the host would now allocate different identifiers than the staged ones,
//! e.g. because another staged table was committed in between. A staging failure leaves the host unchanged; a
//! failure part way through the commit is returned as is and earlier writes
//! stay in place.

use log::debug;

use crate::error::{PivotError, Result};
use crate::opc::PackURI;

use super::cache::{PivotCacheDefinition, build_cache_definition};
use super::ids::PivotHost;
use super::link::{
    PivotIds, allocate_ids, link_cache_to_workbook, link_sheet_to_table, link_table_to_cache,
    peek_ids, register_content_types,
};
use super::options::PivotTableOptions;
use super::order::{DataSource, FieldOrder, resolve_data_source, resolve_field_order};
use super::range::{RangeBox, normalize_range};
use super::table::{PivotTableDefinition, build_table_definition};
use super::writer::{write_pivot_cache_definition, write_pivot_table};

/// A request whose ranges and sheets have been checked.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    pub placement: RangeBox,
    pub source: DataSource,
    /// Partname of the sheet receiving the table
    pub sheet_part: PackURI,
}

/// Check ranges and sheets of a request.
///
/// The placement range is parsed first, then the data range (after
/// defined-name resolution against the placement sheet). The data sheet and
/// then the placement sheet must exist.
pub fn validate<H: PivotHost + ?Sized>(host: &H, opts: &PivotTableOptions) -> Result<ValidatedRequest> {
    let placement =
        normalize_range(&opts.pivot_table_range).map_err(|e| e.in_parameter("PivotTableRange"))?;
    let source = resolve_data_source(host, &opts.data_range, placement.sheet())?;

    let data_sheet = source.range().sheet();
    if host.sheet_part(data_sheet).is_none() {
        return Err(PivotError::UnknownSheet(data_sheet.to_string()));
    }
    let sheet_part = host
        .sheet_part(placement.sheet())
        .ok_or_else(|| PivotError::UnknownSheet(placement.sheet().to_string()))?;

    Ok(ValidatedRequest {
        placement,
        source,
        sheet_part,
    })
}

/// Everything needed to write one pivot table, built but not yet written.
#[derive(Debug, Clone)]
pub struct StagedPivotTable {
    ids: PivotIds,
    sheet_part: PackURI,
    order: FieldOrder,
    cache: PivotCacheDefinition,
    table: PivotTableDefinition,
    cache_xml: String,
    table_xml: String,
}

impl StagedPivotTable {
    pub fn ids(&self) -> &PivotIds {
        &self.ids
    }

    pub fn sheet_part(&self) -> &PackURI {
        &self.sheet_part
    }

    pub fn field_order(&self) -> &FieldOrder {
        &self.order
    }

    pub fn cache(&self) -> &PivotCacheDefinition {
        &self.cache
    }

    pub fn table(&self) -> &PivotTableDefinition {
        &self.table
    }

    pub fn cache_xml(&self) -> &str {
        &self.cache_xml
    }

    pub fn table_xml(&self) -> &str {
        &self.table_xml
    }
}

/// Outcome of a committed pivot table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedPivotTable {
    pub ids: PivotIds,
    pub table_part: PackURI,
    pub cache_part: PackURI,
    /// Workbook relationship recorded in the registry entry
    pub workbook_rel_id: String,
    /// Sheet relationship pointing at the table part
    pub sheet_rel_id: String,
}

/// Validate a request and build both definitions without writing anything.
pub fn stage_pivot_table<H: PivotHost + ?Sized>(
    host: &H,
    opts: &PivotTableOptions,
) -> Result<StagedPivotTable> {
    let request = validate(host, opts)?;
    let order = resolve_field_order(host, &request.source)?;
    let ids = allocate_ids(host)?;

    let cache = build_cache_definition(&request.source, &order, opts)?;
    let table = build_table_definition(ids.table, ids.registry, opts, &order)?;
    let cache_xml = write_pivot_cache_definition(&cache)?;
    let table_xml = write_pivot_table(&table)?;

    Ok(StagedPivotTable {
        ids,
        sheet_part: request.sheet_part,
        order,
        cache,
        table,
        cache_xml,
        table_xml,
    })
}

/// Write a staged pivot table into the host.
///
/// # Errors
///
/// [`PivotError::StaleStage`] when the host has changed since staging so that
/// the staged identifiers are no longer the next ones. Nothing is written in
/// that case; stage the request again.
pub fn commit_pivot_table<H: PivotHost + ?Sized>(
    host: &mut H,
    staged: StagedPivotTable,
) -> Result<AddedPivotTable> {
    let ids = staged.ids;
    let current = peek_ids(host)?;
    if current != ids {
        return Err(PivotError::StaleStage(format!(
            "staged with {} but the workbook now allocates {}",
            ids, current
        )));
    }
    let cache_part = ids.cache_part()?;
    let table_part = ids.table_part()?;

    host.save_part(cache_part.clone(), staged.cache_xml.into_bytes())?;
    let workbook_rel_id = link_cache_to_workbook(host, &ids)?;
    link_table_to_cache(host, &ids)?;
    host.save_part(table_part.clone(), staged.table_xml.into_bytes())?;
    let sheet_rel_id = link_sheet_to_table(host, &staged.sheet_part, &ids)?;
    register_content_types(host, &ids)?;

    debug!("added {} ({}) with cache {}", staged.table.name, table_part, cache_part);

    Ok(AddedPivotTable {
        ids,
        table_part,
        cache_part,
        workbook_rel_id,
        sheet_rel_id,
    })
}

/// Add a pivot table to `host`.
pub fn add_pivot_table<H: PivotHost + ?Sized>(
    host: &mut H,
    opts: &PivotTableOptions,
) -> Result<AddedPivotTable> {
    let staged = stage_pivot_table(host, opts)?;
    commit_pivot_table(host, staged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::cell_ref::cell_name_to_coordinates;
    use crate::xlsx::pivot::ids::{PartKind, WorkbookCacheRegistryId};
    use crate::xlsx::pivot::options::PivotTableField;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    /// Host that records every write and can fail a named operation.
    #[derive(Default)]
    struct RecordingHost {
        headers: HashMap<String, Vec<String>>,
        names: HashMap<String, String>,
        parts: Vec<String>,
        cache_ids: Vec<u32>,
        writes: Vec<String>,
        fail_on: Option<&'static str>,
        broken_cells: bool,
    }

    impl RecordingHost {
        fn new() -> Self {
            let mut host = Self::default();
            host.headers.insert(
                "Sheet1".to_string(),
                ["Month", "Year", "Type", "Sales", "Region"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            );
            host.headers.insert("Sheet2".to_string(), Vec::new());
            host
        }

        fn check(&mut self, op: &'static str, record: String) -> Result<()> {
            if self.fail_on == Some(op) {
                return Err(PivotError::Relationship(format!("{} failed", op)));
            }
            self.writes.push(record);
            Ok(())
        }
    }

    impl PivotHost for RecordingHost {
        fn defined_name_ref(&self, name: &str, _scope_sheet: &str) -> Option<String> {
            self.names.get(name).cloned()
        }

        fn cell_value(&self, sheet: &str, cell: &str) -> Result<String> {
            if self.broken_cells {
                return Err(PivotError::InvalidCellReference(format!("{}!{}", sheet, cell)));
            }
            let (col, _) = cell_name_to_coordinates(cell)?;
            let header = self
                .headers
                .get(sheet)
                .ok_or_else(|| PivotError::UnknownSheet(sheet.to_string()))?;
            Ok(header.get(col as usize - 1).cloned().unwrap_or_default())
        }

        fn sheet_part(&self, sheet: &str) -> Option<PackURI> {
            let pos = ["Sheet1", "Sheet2"].iter().position(|s| *s == sheet)?;
            Some(PackURI::new(format!("/xl/worksheets/sheet{}.xml", pos + 1)).unwrap())
        }

        fn workbook_part(&self) -> PackURI {
            PackURI::new("/xl/workbook.xml").unwrap()
        }

        fn count_parts(&self, pattern: &str) -> usize {
            self.parts.iter().filter(|p| p.contains(pattern)).count()
        }

        fn pivot_cache_ids(&self) -> Vec<u32> {
            self.cache_ids.clone()
        }

        fn add_relationship(&mut self, source: &PackURI, _reltype: &str, target: &str) -> Result<String> {
            self.check("rel", format!("rel {} -> {}", source, target))?;
            Ok("rId1".to_string())
        }

        fn register_pivot_cache(&mut self, cache_id: WorkbookCacheRegistryId, r_id: &str) -> Result<()> {
            self.check("registry", format!("registry {} {}", cache_id, r_id))?;
            self.cache_ids.push(cache_id.get());
            Ok(())
        }

        fn add_content_type_part(&mut self, sequence: u32, kind: PartKind) -> Result<()> {
            self.check("content_type", format!("content type {} {}", kind.tag(), sequence))
        }

        fn save_part(&mut self, partname: PackURI, _blob: Vec<u8>) -> Result<()> {
            self.check("save", format!("save {}", partname))?;
            self.parts.push(partname.as_str().to_string());
            Ok(())
        }
    }

    fn opts() -> PivotTableOptions {
        PivotTableOptions {
            rows: vec![PivotTableField::new("Month")],
            filter: vec![PivotTableField::new("Region")],
            columns: vec![PivotTableField::new("Type")],
            data: vec![
                PivotTableField::new("Sales")
                    .with_name("Summarize")
                    .with_subtotal("Sum"),
            ],
            ..PivotTableOptions::new("Sheet1!$A$1:$E$31", "Sheet1!$G$2:$M$34")
        }
    }

    #[test]
    fn test_commit_order() {
        let mut host = RecordingHost::new();
        let added = add_pivot_table(&mut host, &opts()).unwrap();

        assert_eq!(added.ids.table.get(), 1);
        assert_eq!(added.ids.cache.get(), 1);
        assert_eq!(added.ids.registry.get(), 2);
        assert_eq!(
            host.writes,
            vec![
                "save /xl/pivotCache/pivotCacheDefinition1.xml",
                "rel /xl/workbook.xml -> /xl/pivotCache/pivotCacheDefinition1.xml",
                "registry 2 rId1",
                "rel /xl/pivotTables/pivotTable1.xml -> ../pivotCache/pivotCacheDefinition1.xml",
                "save /xl/pivotTables/pivotTable1.xml",
                "rel /xl/worksheets/sheet1.xml -> ../pivotTables/pivotTable1.xml",
                "content type pivotTable 1",
                "content type pivotCache 1",
            ]
        );
    }

    #[test]
    fn test_second_table_gets_next_ids() {
        let mut host = RecordingHost::new();
        add_pivot_table(&mut host, &opts()).unwrap();
        let added = add_pivot_table(&mut host, &opts()).unwrap();
        assert_eq!(added.ids.table.get(), 2);
        assert_eq!(added.ids.cache.get(), 2);
        assert_eq!(added.ids.registry.get(), 3);
    }

    #[test]
    fn test_validation_order() {
        let host = RecordingHost::new();

        let mut bad = opts();
        bad.pivot_table_range = String::new();
        bad.data_range = "nonsense".to_string();
        let err = validate(&host, &bad).unwrap_err();
        assert_eq!(err.to_string(), "parameter 'PivotTableRange' is required");

        let mut bad = opts();
        bad.data_range = "Sheet1$A$1:$E$31".to_string();
        let err = validate(&host, &bad).unwrap_err();
        assert!(err.to_string().starts_with("parameter 'DataRange' parsing error"));

        let mut bad = opts();
        bad.data_range = "Sheet9!$A$1:$E$31".to_string();
        bad.pivot_table_range = "Sheet8!$G$2:$M$34".to_string();
        let err = validate(&host, &bad).unwrap_err();
        assert_eq!(err.to_string(), "sheet Sheet9 does not exist");

        let mut bad = opts();
        bad.pivot_table_range = "Sheet8!$G$2:$M$34".to_string();
        let err = validate(&host, &bad).unwrap_err();
        assert_eq!(err.to_string(), "sheet Sheet8 does not exist");
    }

    #[test]
    fn test_defined_name_resolves_against_placement_sheet() {
        let mut host = RecordingHost::new();
        host.names
            .insert("SalesData".to_string(), "Sheet1!$A$1:$E$31".to_string());
        let opts = PivotTableOptions {
            data_range: "SalesData".to_string(),
            ..opts()
        };
        let request = validate(&host, &opts).unwrap();
        assert_eq!(request.source.defined_name(), Some("SalesData"));
        assert_eq!(request.source.range().sheet(), "Sheet1");
    }

    #[test]
    fn test_stage_does_not_write() {
        let host = RecordingHost::new();
        let staged = stage_pivot_table(&host, &opts()).unwrap();
        assert!(host.writes.is_empty());
        assert_eq!(staged.field_order().len(), 5);
        assert_eq!(staged.table().name, "Pivot Table1");
        assert_eq!(staged.cache().cache_fields.len(), 5);
        assert!(staged.table_xml().contains(r#"cacheId="2""#));
        assert!(staged.cache_xml().contains(r#"<worksheetSource ref="A1:E31" sheet="Sheet1"/>"#));
        assert_eq!(staged.sheet_part().as_str(), "/xl/worksheets/sheet1.xml");
    }

    #[test]
    fn test_failed_validation_leaves_host_untouched() {
        let mut host = RecordingHost::new();
        let mut bad = opts();
        bad.pivot_table_range = "Sheet1!$G$2:$G$2".to_string();
        assert!(matches!(
            add_pivot_table(&mut host, &bad),
            Err(PivotError::InvalidParameter(_))
        ));
        assert!(host.writes.is_empty());
    }

    #[test]
    fn test_commit_failure_is_not_rolled_back() {
        let mut host = RecordingHost::new();
        host.fail_on = Some("registry");

        let err = add_pivot_table(&mut host, &opts()).unwrap_err();
        assert_eq!(err.to_string(), "Invalid relationship: registry failed");
        // cache part and workbook relationship remain
        assert_eq!(host.writes.len(), 2);
        assert_eq!(host.parts, vec!["/xl/pivotCache/pivotCacheDefinition1.xml"]);
    }

    #[test]
    fn test_commit_of_outdated_stage_is_refused() {
        let mut host = RecordingHost::new();
        let first = stage_pivot_table(&host, &opts()).unwrap();
        let second = stage_pivot_table(&host, &opts()).unwrap();
        assert_eq!(first.ids(), second.ids());

        commit_pivot_table(&mut host, first).unwrap();
        let writes = host.writes.len();

        let err = commit_pivot_table(&mut host, second).unwrap_err();
        assert!(matches!(err, PivotError::StaleStage(_)));
        assert_eq!(
            err.to_string(),
            "staged pivot table is stale: staged with pivot table 1, pivot cache 1, registry id 2 \
             but the workbook now allocates pivot table 2, pivot cache 2, registry id 3"
        );
        assert_eq!(host.writes.len(), writes);
        assert_eq!(host.cache_ids, vec![2]);

        // staging again picks up the new identifiers
        let again = stage_pivot_table(&host, &opts()).unwrap();
        let added = commit_pivot_table(&mut host, again).unwrap();
        assert_eq!(added.ids.table.get(), 2);
        assert_eq!(added.ids.registry.get(), 3);
    }

    #[test]
    fn test_exhausted_registry_is_an_error() {
        let mut host = RecordingHost::new();
        host.cache_ids.push(u32::MAX);

        let err = add_pivot_table(&mut host, &opts()).unwrap_err();
        assert!(matches!(err, PivotError::RegistryExhausted(u32::MAX)));
        assert!(host.writes.is_empty());
    }

    #[test]
    fn test_cell_lookup_errors_propagate() {
        let mut host = RecordingHost::new();
        host.broken_cells = true;
        let err = add_pivot_table(&mut host, &opts()).unwrap_err();
        assert!(matches!(err, PivotError::InvalidCellReference(ref cell) if cell == "Sheet1!A1"));
        assert!(host.writes.is_empty());
    }
}
