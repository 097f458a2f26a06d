/// Open Packaging Conventions plumbing used by pivot tables.
///
/// This module provides the pieces of OPC a pivot table needs to be linked
/// into a SpreadsheetML package:
///
/// - Part naming (`PackURI`)
/// - Relationships between parts (`Relationships`)
/// - The `[Content_Types].xml` registry (`ContentTypes`)
/// - An in-memory part registry (`Package`)
pub mod constants;
pub mod content_types;
pub mod package;
pub mod packuri;
pub mod rel;

pub use content_types::ContentTypes;
pub use package::Package;
pub use packuri::PackURI;
pub use rel::{Relationship, Relationships};
