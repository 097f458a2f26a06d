//! Pivot cache schema.
//!
//! The cache definition records where the source data lives and one field
//! per header column. Records are not written; the consumer refreshes the
//! cache on load.

use crate::error::Result;

use super::classify::is_itemized;
use super::options::{PIVOT_TABLE_VERSION, PivotTableOptions};
use super::order::{DataSource, FieldOrder};

/// Where the cache reads its data from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheSource {
    /// Literal sheet and `A1:E31` style reference
    Range { sheet: String, reference: String },
    /// Defined name the data range was given as
    Name(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotCacheField {
    pub name: String,
    pub num_fmt_id: u32,
    /// Placeholder shared items; one empty string for itemized fields
    pub shared_items: Vec<String>,
}

impl PivotCacheField {
    pub fn is_itemized(&self) -> bool {
        !self.shared_items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotCacheDefinition {
    pub save_data: bool,
    pub refresh_on_load: bool,
    pub created_version: u8,
    pub refreshed_version: u8,
    pub min_refreshable_version: u8,
    pub source: CacheSource,
    pub cache_fields: Vec<PivotCacheField>,
}

impl PivotCacheDefinition {
    /// Empty definition reading from `source`.
    pub fn new(source: CacheSource) -> Self {
        Self {
            save_data: false,
            refresh_on_load: true,
            created_version: PIVOT_TABLE_VERSION,
            refreshed_version: PIVOT_TABLE_VERSION,
            min_refreshable_version: PIVOT_TABLE_VERSION,
            source,
            cache_fields: Vec::new(),
        }
    }
}

/// Build the cache definition for a resolved data source.
///
/// One cache field is emitted per entry of `order`, in order. A field
/// declared on rows or columns with its default subtotal off gets one
/// placeholder shared item.
pub fn build_cache_definition(
    source: &DataSource,
    order: &FieldOrder,
    opts: &PivotTableOptions,
) -> Result<PivotCacheDefinition> {
    let cache_source = match source.defined_name() {
        Some(name) => CacheSource::Name(name.to_string()),
        None => CacheSource::Range {
            sheet: source.range().sheet().to_string(),
            reference: source.range().reference()?,
        },
    };

    let mut cache = PivotCacheDefinition::new(cache_source);
    cache.cache_fields = order
        .iter()
        .map(|(_, name)| PivotCacheField {
            name: name.to_string(),
            num_fmt_id: 0,
            shared_items: if is_itemized(name, opts) {
                vec![String::new()]
            } else {
                Vec::new()
            },
        })
        .collect();

    Ok(cache)
}
