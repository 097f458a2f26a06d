/// Relationships between parts of a package.
///
/// Every source part owns one [`Relationships`] collection, serialized as the
/// part's `_rels/<name>.rels` companion.
use crate::common::xml::{XML_HEADER, escape_xml};
use crate::opc::constants::namespace;
use crate::opc::packuri::PackURI;
use std::collections::HashMap;
use std::fmt::Write as FmtWrite;

/// A single relationship from a source part to a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1", "rId2")
    r_id: String,

    /// Relationship type URI
    reltype: String,

    /// Target reference, relative to the source's directory or absolute
    target_ref: String,

    /// Directory of the source part
    base_uri: String,
}

impl Relationship {
    pub fn new(r_id: String, reltype: String, target_ref: String, base_uri: String) -> Self {
        Self {
            r_id,
            reltype,
            target_ref,
            base_uri,
        }
    }

    #[inline]
    pub fn r_id(&self) -> &str {
        &self.r_id
    }

    #[inline]
    pub fn reltype(&self) -> &str {
        &self.reltype
    }

    #[inline]
    pub fn target_ref(&self) -> &str {
        &self.target_ref
    }

    /// Absolute partname of the target.
    pub fn target_partname(&self) -> Result<PackURI, String> {
        PackURI::from_rel_ref(&self.base_uri, &self.target_ref)
    }
}

/// Collection of relationships from a single source.
#[derive(Debug, Clone)]
pub struct Relationships {
    base_uri: String,
    rels: HashMap<String, Relationship>,
}

impl Relationships {
    /// Create an empty collection for a source living in `base_uri`.
    pub fn new(base_uri: String) -> Self {
        Self {
            base_uri,
            rels: HashMap::new(),
        }
    }

    /// Insert a relationship with a known ID, replacing any previous one.
    pub fn add_relationship(&mut self, reltype: String, target_ref: String, r_id: String) {
        let rel = Relationship::new(r_id.clone(), reltype, target_ref, self.base_uri.clone());
        self.rels.insert(r_id, rel);
    }

    /// Get a relationship by its ID.
    #[inline]
    pub fn get(&self, r_id: &str) -> Option<&Relationship> {
        self.rels.get(r_id)
    }

    /// Get or add a relationship to a target and return its rId.
    ///
    /// An existing relationship of the same type and target is reused;
    /// otherwise the next available rId is allocated.
    pub fn get_or_add(&mut self, reltype: &str, target_ref: &str) -> String {
        if let Some(rel) = self
            .rels
            .values()
            .find(|rel| rel.reltype() == reltype && rel.target_ref() == target_ref)
        {
            return rel.r_id().to_string();
        }

        let r_id = self.next_r_id();
        self.add_relationship(reltype.to_string(), target_ref.to_string(), r_id.clone());
        r_id
    }

    /// Next available relationship ID, filling gaps first.
    fn next_r_id(&self) -> String {
        let mut used_numbers: Vec<u32> = self
            .rels
            .keys()
            .filter_map(|r_id| {
                r_id.strip_prefix("rId")
                    .and_then(|digits| atoi_simd::parse::<u32>(digits.as_bytes()).ok())
            })
            .collect();
        used_numbers.sort_unstable();

        let mut next_num = 1u32;
        for &num in &used_numbers {
            match num.cmp(&next_num) {
                std::cmp::Ordering::Equal => next_num += 1,
                std::cmp::Ordering::Greater => break,
                std::cmp::Ordering::Less => {},
            }
        }

        format!("rId{}", next_num)
    }

    /// Relationships of one type, ordered by rId.
    pub fn of_type<'a>(&'a self, reltype: &'a str) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.sorted().into_iter().filter(move |rel| rel.reltype() == reltype)
    }

    /// All relationships ordered by their numeric rId.
    pub fn sorted(&self) -> Vec<&Relationship> {
        let mut rels: Vec<&Relationship> = self.rels.values().collect();
        rels.sort_by_key(|rel| {
            rel.r_id()
                .strip_prefix("rId")
                .and_then(|digits| atoi_simd::parse::<u32>(digits.as_bytes()).ok())
                .unwrap_or(u32::MAX)
        });
        rels
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rels.is_empty()
    }

    /// Serialize to the XML of a `.rels` part.
    pub fn to_xml(&self) -> Result<String, std::fmt::Error> {
        let mut xml = String::with_capacity(256 + self.rels.len() * 160);

        xml.push_str(XML_HEADER);
        xml.push('\n');
        write!(xml, r#"<Relationships xmlns="{}">"#, namespace::OPC_RELATIONSHIPS)?;

        for rel in self.sorted() {
            write!(
                xml,
                r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                escape_xml(rel.r_id()),
                escape_xml(rel.reltype()),
                escape_xml(rel.target_ref())
            )?;
        }

        xml.push_str("</Relationships>");
        Ok(xml)
    }
}
