//! Identifier allocation and part linking.
//!
//! Sequence numbers for pivot table and pivot cache parts come from the host
//! (existing count + 1 by default). The workbook registry ID is one past the
//! largest registered ID, never lower than 2.

use log::debug;

use crate::error::{PivotError, Result};
use crate::opc::PackURI;
use crate::opc::constants::relationship_type as rt;

use super::ids::{CacheSequenceId, PartKind, PivotHost, TableSequenceId, WorkbookCacheRegistryId};

/// The three identifiers of one new pivot table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PivotIds {
    pub table: TableSequenceId,
    pub cache: CacheSequenceId,
    pub registry: WorkbookCacheRegistryId,
}

impl PivotIds {
    pub fn table_part(&self) -> Result<PackURI> {
        PartKind::PivotTable.partname(self.table.get())
    }

    pub fn cache_part(&self) -> Result<PackURI> {
        PartKind::PivotCache.partname(self.cache.get())
    }
}

impl std::fmt::Display for PivotIds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pivot table {}, pivot cache {}, registry id {}",
            self.table, self.cache, self.registry
        )
    }
}

/// Identifiers `host` would hand out next.
pub fn peek_ids<H: PivotHost + ?Sized>(host: &H) -> Result<PivotIds> {
    Ok(PivotIds {
        table: TableSequenceId::new(host.next_sequence(PartKind::PivotTable)),
        cache: CacheSequenceId::new(host.next_sequence(PartKind::PivotCache)),
        registry: next_registry_id(&host.pivot_cache_ids())?,
    })
}

/// Allocate identifiers against the current state of `host`.
pub fn allocate_ids<H: PivotHost + ?Sized>(host: &H) -> Result<PivotIds> {
    let ids = peek_ids(host)?;
    debug!("allocated {}", ids);
    Ok(ids)
}

/// Registry ID following `existing`.
///
/// # Errors
///
/// [`PivotError::RegistryExhausted`] when `existing` already holds `u32::MAX`.
pub fn next_registry_id(existing: &[u32]) -> Result<WorkbookCacheRegistryId> {
    let max = existing.iter().copied().fold(1, u32::max);
    max.checked_add(1)
        .map(WorkbookCacheRegistryId::new)
        .ok_or(PivotError::RegistryExhausted(max))
}

/// Workbook relationship target of a cache part.
pub fn workbook_cache_target(cache: CacheSequenceId) -> String {
    format!("/xl/pivotCache/pivotCacheDefinition{}.xml", cache)
}

/// Table relationship target of a cache part.
pub fn table_cache_target(cache: CacheSequenceId) -> String {
    format!("../pivotCache/pivotCacheDefinition{}.xml", cache)
}

/// Sheet relationship target of a table part.
pub fn sheet_table_target(table: TableSequenceId) -> String {
    format!("../pivotTables/pivotTable{}.xml", table)
}

/// Relate the workbook to the cache part and add the registry entry.
///
/// Returns the workbook relationship ID recorded in the registry.
pub fn link_cache_to_workbook<H: PivotHost + ?Sized>(host: &mut H, ids: &PivotIds) -> Result<String> {
    let workbook = host.workbook_part();
    let r_id = host.add_relationship(
        &workbook,
        rt::PIVOT_CACHE_DEFINITION,
        &workbook_cache_target(ids.cache),
    )?;
    host.register_pivot_cache(ids.registry, &r_id)?;
    debug!("registered pivot cache {} as {} ({})", ids.cache, ids.registry, r_id);
    Ok(r_id)
}

/// Relate a table part to its cache part.
pub fn link_table_to_cache<H: PivotHost + ?Sized>(host: &mut H, ids: &PivotIds) -> Result<()> {
    let table_part = ids.table_part()?;
    // The rId is never referenced from the table XML
    let _ = host.add_relationship(
        &table_part,
        rt::PIVOT_CACHE_DEFINITION,
        &table_cache_target(ids.cache),
    )?;
    Ok(())
}

/// Relate the host sheet to a table part.
pub fn link_sheet_to_table<H: PivotHost + ?Sized>(
    host: &mut H,
    sheet_part: &PackURI,
    ids: &PivotIds,
) -> Result<String> {
    let r_id = host.add_relationship(sheet_part, rt::PIVOT_TABLE, &sheet_table_target(ids.table))?;
    debug!("related {} to pivot table {} as {}", sheet_part, ids.table, r_id);
    Ok(r_id)
}

/// Register content types for the table and cache parts, in that order.
pub fn register_content_types<H: PivotHost + ?Sized>(host: &mut H, ids: &PivotIds) -> Result<()> {
    host.add_content_type_part(ids.table.get(), PartKind::PivotTable)?;
    host.add_content_type_part(ids.cache.get(), PartKind::PivotCache)?;
    Ok(())
}
