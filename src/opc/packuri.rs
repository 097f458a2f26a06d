/// The PackURI value type: a partname within a package.
///
/// PackURIs always begin with a forward slash and use forward slashes as path
/// separators, e.g. `/xl/pivotTables/pivotTable1.xml`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackURI {
    uri: String,
}

impl PackURI {
    /// Create a new PackURI; the string must begin with a forward slash.
    pub fn new<S: Into<String>>(uri: S) -> Result<Self, String> {
        let uri = uri.into();
        if !uri.starts_with('/') {
            return Err(format!("PackURI must begin with slash, got '{}'", uri));
        }
        Ok(PackURI { uri })
    }

    /// Resolve a relative reference (like `../pivotTables/pivotTable1.xml`)
    /// against a base URI (like `/xl/worksheets`).
    pub fn from_rel_ref(base_uri: &str, relative_ref: &str) -> Result<Self, String> {
        if relative_ref.starts_with('/') {
            return Self::new(Self::normalize_path(relative_ref));
        }
        let joined = if base_uri.ends_with('/') {
            format!("{}{}", base_uri, relative_ref)
        } else {
            format!("{}/{}", base_uri, relative_ref)
        };
        Self::new(Self::normalize_path(&joined))
    }

    /// Directory portion, e.g. `/xl/pivotTables` for `/xl/pivotTables/pivotTable1.xml`.
    pub fn base_uri(&self) -> &str {
        match self.uri.rfind('/') {
            Some(0) | None => "/",
            Some(pos) => &self.uri[..pos],
        }
    }

    /// Filename portion, e.g. `pivotTable1.xml`.
    pub fn filename(&self) -> &str {
        match self.uri.rfind('/') {
            Some(pos) => &self.uri[pos + 1..],
            None => "",
        }
    }

    /// URI with the leading slash stripped (the archive member name).
    pub fn membername(&self) -> &str {
        &self.uri[1..]
    }

    /// Relative reference from `base_uri` to this part.
    ///
    /// `/xl/pivotCache/pivotCacheDefinition1.xml` seen from `/xl/pivotTables`
    /// is `../pivotCache/pivotCacheDefinition1.xml`.
    pub fn relative_ref(&self, base_uri: &str) -> String {
        if base_uri == "/" {
            return self.membername().to_string();
        }

        let from_parts: Vec<&str> = base_uri.split('/').filter(|s| !s.is_empty()).collect();
        let to_parts: Vec<&str> = self.uri.split('/').filter(|s| !s.is_empty()).collect();

        let common = from_parts
            .iter()
            .zip(to_parts.iter())
            .take_while(|(a, b)| a == b)
            .count();

        let mut segments: Vec<&str> = vec![".."; from_parts.len() - common];
        segments.extend_from_slice(&to_parts[common..]);
        segments.join("/")
    }

    /// PackURI of the `.rels` part belonging to this part.
    ///
    /// `/xl/_rels/workbook.xml.rels` for `/xl/workbook.xml`.
    pub fn rels_uri(&self) -> Result<PackURI, String> {
        let base_uri = self.base_uri();
        if base_uri == "/" {
            Self::new(format!("/_rels/{}.rels", self.filename()))
        } else {
            Self::new(format!("{}/_rels/{}.rels", base_uri, self.filename()))
        }
    }

    /// Full URI string.
    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// Resolve `..` and `.` segments.
    fn normalize_path(path: &str) -> String {
        let mut parts: Vec<&str> = Vec::new();

        for part in path.split('/') {
            match part {
                "" | "." => {},
                ".." => {
                    parts.pop();
                },
                _ => parts.push(part),
            }
        }

        format!("/{}", parts.join("/"))
    }
}

impl std::fmt::Display for PackURI {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

impl AsRef<str> for PackURI {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

/// The URI for the [Content_Types].xml part
pub const CONTENT_TYPES_URI: &str = "/[Content_Types].xml";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packuri_new() {
        assert!(PackURI::new("/xl/workbook.xml").is_ok());
        assert!(PackURI::new("xl/workbook.xml").is_err());
    }

    #[test]
    fn test_components() {
        let uri = PackURI::new("/xl/pivotTables/pivotTable3.xml").unwrap();
        assert_eq!(uri.base_uri(), "/xl/pivotTables");
        assert_eq!(uri.filename(), "pivotTable3.xml");
        assert_eq!(uri.membername(), "xl/pivotTables/pivotTable3.xml");
    }

    #[test]
    fn test_rels_uri() {
        let uri = PackURI::new("/xl/worksheets/sheet1.xml").unwrap();
        assert_eq!(
            uri.rels_uri().unwrap().as_str(),
            "/xl/worksheets/_rels/sheet1.xml.rels"
        );
    }

    #[test]
    fn test_relative_ref() {
        let cache = PackURI::new("/xl/pivotCache/pivotCacheDefinition2.xml").unwrap();
        assert_eq!(
            cache.relative_ref("/xl/pivotTables"),
            "../pivotCache/pivotCacheDefinition2.xml"
        );
        assert_eq!(cache.relative_ref("/xl"), "pivotCache/pivotCacheDefinition2.xml");
    }

    #[test]
    fn test_from_rel_ref() {
        let uri = PackURI::from_rel_ref("/xl/worksheets", "../pivotTables/pivotTable1.xml").unwrap();
        assert_eq!(uri.as_str(), "/xl/pivotTables/pivotTable1.xml");

        let uri = PackURI::from_rel_ref("/xl", "/xl/pivotCache/pivotCacheDefinition1.xml").unwrap();
        assert_eq!(uri.as_str(), "/xl/pivotCache/pivotCacheDefinition1.xml");
    }
}
