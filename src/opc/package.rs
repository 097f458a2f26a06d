/// In-memory package: parts, per-source relationships and content types.
///
/// `Package` is the registry every pivot artifact ends up in. It stores part
/// blobs by partname, keeps one [`Relationships`] collection per source part
/// and owns the `[Content_Types].xml` registry. Rendering to archive members
/// is done by [`Package::to_parts`]; archiving itself is left to the caller.
use crate::error::{PivotError, Result};
use crate::opc::content_types::ContentTypes;
use crate::opc::packuri::{CONTENT_TYPES_URI, PackURI};
use crate::opc::rel::Relationships;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct Package {
    /// Part blobs indexed by partname
    parts: BTreeMap<PackURI, Vec<u8>>,

    /// Relationships indexed by source partname
    rels: BTreeMap<PackURI, Relationships>,

    content_types: ContentTypes,
}

impl Package {
    /// Create a new empty package.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a part, replacing any previous blob with the same name.
    pub fn put_part(&mut self, partname: PackURI, blob: Vec<u8>) {
        self.parts.insert(partname, blob);
    }

    /// Get a part's blob by partname.
    pub fn part(&self, partname: &str) -> Option<&[u8]> {
        let uri = PackURI::new(partname).ok()?;
        self.parts.get(&uri).map(Vec::as_slice)
    }

    /// Iterate over all stored partnames.
    pub fn partnames(&self) -> impl Iterator<Item = &PackURI> {
        self.parts.keys()
    }

    /// Number of stored parts whose name contains `pattern`.
    pub fn count_parts_matching(&self, pattern: &str) -> usize {
        self.parts
            .keys()
            .filter(|partname| partname.as_str().contains(pattern))
            .count()
    }

    /// Relationships owned by a source part, if any exist.
    pub fn rels(&self, source: &str) -> Option<&Relationships> {
        let uri = PackURI::new(source).ok()?;
        self.rels.get(&uri)
    }

    /// Relate a source part to a target and return the relationship ID.
    pub fn relate(&mut self, source: &str, reltype: &str, target_ref: &str) -> Result<String> {
        let source_uri = PackURI::new(source).map_err(PivotError::Relationship)?;
        let base_uri = source_uri.base_uri().to_string();
        let rels = self
            .rels
            .entry(source_uri)
            .or_insert_with(|| Relationships::new(base_uri));
        Ok(rels.get_or_add(reltype, target_ref))
    }

    pub fn content_types(&self) -> &ContentTypes {
        &self.content_types
    }

    pub fn content_types_mut(&mut self) -> &mut ContentTypes {
        &mut self.content_types
    }

    /// Render every archive member: stored parts, one `.rels` per source with
    /// relationships, and `[Content_Types].xml`. Keys are member names
    /// (no leading slash).
    pub fn to_parts(&self) -> Result<BTreeMap<String, Vec<u8>>> {
        let mut members = BTreeMap::new();

        for (partname, blob) in &self.parts {
            members.insert(partname.membername().to_string(), blob.clone());
        }

        for (source, rels) in &self.rels {
            if rels.is_empty() {
                continue;
            }
            let rels_uri = source.rels_uri().map_err(PivotError::Relationship)?;
            members.insert(
                rels_uri.membername().to_string(),
                rels.to_xml()?.into_bytes(),
            );
        }

        members.insert(
            CONTENT_TYPES_URI[1..].to_string(),
            self.content_types.to_xml()?.into_bytes(),
        );

        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opc::constants::relationship_type as rt;

    #[test]
    fn test_parts_and_counts() {
        let mut pkg = Package::new();
        pkg.put_part(PackURI::new("/xl/pivotTables/pivotTable1.xml").unwrap(), b"<a/>".to_vec());
        pkg.put_part(PackURI::new("/xl/pivotTables/pivotTable2.xml").unwrap(), b"<b/>".to_vec());
        pkg.put_part(PackURI::new("/xl/workbook.xml").unwrap(), b"<w/>".to_vec());

        assert!(pkg.part("/xl/workbook.xml").is_some());
        assert!(pkg.part("xl/workbook.xml").is_none());
        assert_eq!(pkg.count_parts_matching("xl/pivotTables/pivotTable"), 2);
        assert_eq!(pkg.part("/xl/pivotTables/pivotTable2.xml"), Some(&b"<b/>"[..]));
    }

    #[test]
    fn test_relate_and_render() {
        let mut pkg = Package::new();
        let r_id = pkg
            .relate("/xl/worksheets/sheet1.xml", rt::PIVOT_TABLE, "../pivotTables/pivotTable1.xml")
            .unwrap();
        assert_eq!(r_id, "rId1");
        assert!(pkg.relate("relative.xml", rt::PIVOT_TABLE, "x.xml").is_err());

        let members = pkg.to_parts().unwrap();
        assert!(members.contains_key("xl/worksheets/_rels/sheet1.xml.rels"));
        assert!(members.contains_key("[Content_Types].xml"));
    }
}
