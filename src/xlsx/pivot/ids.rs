//! Identifier spaces and the host capabilities a pivot table is built against.
//!
//! A pivot table touches three unrelated numbering domains:
//!
//! - the pivot table part sequence (`pivotTable<N>.xml`),
//! - the pivot cache part sequence (`pivotCacheDefinition<M>.xml`),
//! - the workbook's own pivot cache registry (`<pivotCache cacheId=..>`).
//!
//! Each gets its own newtype so they cannot be mixed up.

use crate::error::{PivotError, Result};
use crate::opc::PackURI;
use crate::opc::constants::content_type as ct;

macro_rules! sequence_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub fn new(value: u32) -> Self {
                Self(value)
            }

            pub fn get(self) -> u32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

sequence_id!(
    /// Suffix of the pivot table part name and the table's display name.
    TableSequenceId
);
sequence_id!(
    /// Suffix of the pivot cache definition part name.
    CacheSequenceId
);
sequence_id!(
    /// `cacheId` of an entry in the workbook's pivot cache list.
    WorkbookCacheRegistryId
);

/// Kind of pivot part stored in the package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PartKind {
    PivotTable,
    PivotCache,
}

impl PartKind {
    /// Tag used when registering content types.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::PivotTable => "pivotTable",
            Self::PivotCache => "pivotCache",
        }
    }

    /// Name prefix shared by every part of this kind (no leading slash).
    pub fn part_prefix(&self) -> &'static str {
        match self {
            Self::PivotTable => "xl/pivotTables/pivotTable",
            Self::PivotCache => "xl/pivotCache/pivotCacheDefinition",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::PivotTable => ct::SML_PIVOT_TABLE,
            Self::PivotCache => ct::SML_PIVOT_CACHE_DEFINITION,
        }
    }

    /// Partname of the `sequence`-th part of this kind.
    pub fn partname(&self, sequence: u32) -> Result<PackURI> {
        let mut uri = String::with_capacity(48);
        uri.push('/');
        uri.push_str(self.part_prefix());
        uri.push_str(itoa::Buffer::new().format(sequence));
        uri.push_str(".xml");
        PackURI::new(uri).map_err(PivotError::Relationship)
    }
}

/// Workbook-side collaborator of the pivot pipeline.
///
/// Everything the pipeline needs from the surrounding document goes through
/// this trait: cell and name lookups, sheet discovery, part storage,
/// relationship and content type allocation. [`crate::xlsx::Workbook`] is the
/// in-crate implementation.
///
/// Sequence numbers come from [`PivotHost::next_sequence`]. The default counts
/// existing parts of the kind and adds one, so a gap left by a deleted part is
/// reused. Implementations may substitute an atomic counter.
pub trait PivotHost {
    /// Target of a defined name as seen from `scope_sheet`, if one exists.
    fn defined_name_ref(&self, name: &str, scope_sheet: &str) -> Option<String>;

    /// Value of one cell, as displayed text.
    fn cell_value(&self, sheet: &str, cell: &str) -> Result<String>;

    /// Partname of a sheet, or `None` when the sheet does not exist.
    fn sheet_part(&self, sheet: &str) -> Option<PackURI>;

    /// Partname of the workbook part.
    fn workbook_part(&self) -> PackURI;

    /// Number of stored parts whose name contains `pattern`.
    fn count_parts(&self, pattern: &str) -> usize;

    /// IDs already present in the workbook's pivot cache list.
    fn pivot_cache_ids(&self) -> Vec<u32>;

    /// Next sequence number for a part kind.
    fn next_sequence(&self, kind: PartKind) -> u32 {
        self.count_parts(kind.part_prefix()) as u32 + 1
    }

    /// Create a relationship from `source` and return its rId.
    fn add_relationship(&mut self, source: &PackURI, reltype: &str, target: &str) -> Result<String>;

    /// Add an entry to the workbook's pivot cache list.
    fn register_pivot_cache(&mut self, cache_id: WorkbookCacheRegistryId, r_id: &str) -> Result<()>;

    /// Register the content type of the `sequence`-th part of `kind`.
    fn add_content_type_part(&mut self, sequence: u32, kind: PartKind) -> Result<()>;

    /// Store a part blob.
    fn save_part(&mut self, partname: PackURI, blob: Vec<u8>) -> Result<()>;
}
