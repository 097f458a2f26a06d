//! The `[Content_Types].xml` registry.
//!
//! Maps file extensions (Default) and individual partnames (Override) to
//! content types.

use crate::common::xml::{XML_HEADER, escape_xml};
use crate::opc::constants::{content_type as ct, namespace};
use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;

/// Default and Override content type entries of a package.
#[derive(Debug, Clone)]
pub struct ContentTypes {
    /// Content types by extension
    defaults: BTreeMap<String, String>,

    /// Content types by partname
    overrides: BTreeMap<String, String>,
}

impl ContentTypes {
    /// Registry holding the standard `rels` and `xml` defaults.
    pub fn new() -> Self {
        let mut defaults = BTreeMap::new();
        defaults.insert("rels".to_string(), ct::OPC_RELATIONSHIPS.to_string());
        defaults.insert("xml".to_string(), ct::XML.to_string());

        Self {
            defaults,
            overrides: BTreeMap::new(),
        }
    }

    /// Register a partname-specific content type.
    ///
    /// Returns `false` when the partname was already registered with the same
    /// content type.
    pub fn add_override(&mut self, partname: &str, content_type: &str) -> bool {
        self.overrides
            .insert(partname.to_string(), content_type.to_string())
            .is_none_or(|previous| previous != content_type)
    }

    /// Content type registered for a partname, falling back to its extension.
    pub fn content_type(&self, partname: &str) -> Option<&str> {
        if let Some(ct) = self.overrides.get(partname) {
            return Some(ct);
        }
        let ext = partname.rsplit_once('.').map(|(_, ext)| ext)?;
        self.defaults.get(ext).map(String::as_str)
    }

    /// Generate the XML for `[Content_Types].xml`.
    pub fn to_xml(&self) -> Result<String, std::fmt::Error> {
        let mut xml = String::with_capacity(512 + self.overrides.len() * 160);

        xml.push_str(XML_HEADER);
        xml.push('\n');
        write!(xml, r#"<Types xmlns="{}">"#, namespace::OPC_CONTENT_TYPES)?;

        for (ext, content_type) in &self.defaults {
            write!(
                xml,
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                escape_xml(ext),
                escape_xml(content_type)
            )?;
        }

        for (partname, content_type) in &self.overrides {
            write!(
                xml,
                r#"<Override PartName="{}" ContentType="{}"/>"#,
                escape_xml(partname),
                escape_xml(content_type)
            )?;
        }

        xml.push_str("</Types>");
        Ok(xml)
    }
}

impl Default for ContentTypes {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_types_xml() {
        let mut cts = ContentTypes::new();
        assert!(cts.add_override("/xl/pivotTables/pivotTable1.xml", ct::SML_PIVOT_TABLE));
        assert!(!cts.add_override("/xl/pivotTables/pivotTable1.xml", ct::SML_PIVOT_TABLE));

        let xml = cts.to_xml().unwrap();
        assert!(xml.contains(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#));
        assert!(xml.contains(r#"<Override PartName="/xl/pivotTables/pivotTable1.xml""#));
    }

    #[test]
    fn test_content_type_lookup() {
        let mut cts = ContentTypes::new();
        cts.add_override("/xl/workbook.xml", ct::SML_SHEET_MAIN);

        assert_eq!(cts.content_type("/xl/workbook.xml"), Some(ct::SML_SHEET_MAIN));
        assert_eq!(cts.content_type("/xl/other.xml"), Some(ct::XML));
        assert_eq!(cts.content_type("/xl/media/image1.png"), None);
    }
}
