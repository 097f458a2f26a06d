//! Read-back of pivot table and pivot cache definitions.
//!
//! Only the structure this crate writes is recovered: names, the cache link,
//! the location, the per-axis field lists and the cache source. It uses
//! quick-xml for streaming parsing.

use quick_xml::Reader;
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};

use crate::common::xml::parse_xml_bool;
use crate::error::{PivotError, Result};

use super::fields::{AxisType, Subtotal};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PivotFieldSummary {
    pub name: Option<String>,
    pub axis: Option<AxisType>,
    pub data_field: bool,
    pub item_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataFieldSummary {
    pub name: Option<String>,
    pub fld: u32,
    pub subtotal: Subtotal,
}

/// What a `pivotTableDefinition` part says about its table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PivotTableSummary {
    pub name: String,
    pub cache_id: u32,
    pub location: String,
    pub style_name: Option<String>,
    pub pivot_fields: Vec<PivotFieldSummary>,
    pub row_fields: Vec<i32>,
    /// `None` when the part has no `colFields` element
    pub col_fields: Option<Vec<i32>>,
    pub page_fields: Vec<u32>,
    pub data_fields: Vec<DataFieldSummary>,
}

impl PivotTableSummary {
    /// Display names of the pivot fields, in field order.
    pub fn pivot_field_names(&self) -> Vec<Option<&str>> {
        self.pivot_fields.iter().map(|f| f.name.as_deref()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheFieldSummary {
    pub name: String,
    pub shared_item_count: u32,
}

/// What a `pivotCacheDefinition` part says about its source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PivotCacheSummary {
    pub source_sheet: Option<String>,
    pub source_ref: Option<String>,
    pub source_name: Option<String>,
    pub refresh_on_load: bool,
    pub cache_fields: Vec<CacheFieldSummary>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Other,
    RowFields,
    ColFields,
}

fn attr(e: &BytesStart, decoder: Decoder, name: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == name)
        .and_then(|a| a.decode_and_unescape_value(decoder).ok())
        .map(|v| v.into_owned())
}

fn attr_num<T: std::str::FromStr>(e: &BytesStart, decoder: Decoder, name: &[u8]) -> Option<T> {
    attr(e, decoder, name).and_then(|v| v.parse().ok())
}

/// Parse a `pivotTableDefinition` part.
pub fn read_pivot_table_definition(xml: &str) -> Result<PivotTableSummary> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut table = PivotTableSummary::default();
    let mut seen_root = false;
    let mut section = Section::Other;
    let mut buf = Vec::with_capacity(1024);

    loop {
        buf.clear();
        let decoder = reader.decoder();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"rowFields" => section = Section::RowFields,
                b"colFields" => {
                    section = Section::ColFields;
                    table.col_fields = Some(Vec::new());
                },
                _ => seen_root |= read_table_element(&mut table, e, decoder, section),
            },
            Ok(Event::Empty(ref e)) => {
                if e.local_name().as_ref() == b"colFields" {
                    table.col_fields = Some(Vec::new());
                }
                seen_root |= read_table_element(&mut table, e, decoder, section);
            },
            Ok(Event::End(ref e)) => {
                if matches!(e.local_name().as_ref(), b"rowFields" | b"colFields") {
                    section = Section::Other;
                }
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(PivotError::Xml(format!("XML parsing error: {}", e))),
            _ => {},
        }
    }

    if !seen_root {
        return Err(PivotError::Xml("missing pivotTableDefinition element".to_string()));
    }

    Ok(table)
}

/// Record one element of a table definition. Returns `true` for the root.
fn read_table_element(
    table: &mut PivotTableSummary,
    e: &BytesStart,
    decoder: Decoder,
    section: Section,
) -> bool {
    match e.local_name().as_ref() {
        b"pivotTableDefinition" => {
            table.name = attr(e, decoder, b"name").unwrap_or_default();
            table.cache_id = attr_num(e, decoder, b"cacheId").unwrap_or_default();
            return true;
        },
        b"location" => {
            table.location = attr(e, decoder, b"ref").unwrap_or_default();
        },
        b"pivotField" => {
            table.pivot_fields.push(PivotFieldSummary {
                name: attr(e, decoder, b"name"),
                axis: attr(e, decoder, b"axis").and_then(|a| AxisType::parse_str(&a)),
                data_field: attr(e, decoder, b"dataField").is_some_and(|v| parse_xml_bool(&v)),
                item_count: 0,
            });
        },
        b"item" => {
            if let Some(field) = table.pivot_fields.last_mut() {
                field.item_count += 1;
            }
        },
        b"field" => {
            let x: i32 = attr_num(e, decoder, b"x").unwrap_or_default();
            match section {
                Section::RowFields => table.row_fields.push(x),
                Section::ColFields => table.col_fields.get_or_insert_with(Vec::new).push(x),
                Section::Other => {},
            }
        },
        b"pageField" => {
            table
                .page_fields
                .push(attr_num(e, decoder, b"fld").unwrap_or_default());
        },
        b"dataField" => {
            table.data_fields.push(DataFieldSummary {
                name: attr(e, decoder, b"name"),
                fld: attr_num(e, decoder, b"fld").unwrap_or_default(),
                subtotal: attr(e, decoder, b"subtotal")
                    .and_then(|s| Subtotal::parse_str(&s))
                    .unwrap_or_default(),
            });
        },
        b"pivotTableStyleInfo" => {
            table.style_name = attr(e, decoder, b"name");
        },
        _ => {},
    }
    false
}

/// Parse a `pivotCacheDefinition` part.
pub fn read_pivot_cache_definition(xml: &str) -> Result<PivotCacheSummary> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut cache = PivotCacheSummary::default();
    let mut seen_root = false;
    let mut buf = Vec::with_capacity(1024);

    loop {
        buf.clear();
        let decoder = reader.decoder();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"pivotCacheDefinition" => {
                    seen_root = true;
                    cache.refresh_on_load = attr(e, decoder, b"refreshOnLoad")
                        .is_some_and(|v| parse_xml_bool(&v));
                },
                b"worksheetSource" => {
                    cache.source_sheet = attr(e, decoder, b"sheet");
                    cache.source_ref = attr(e, decoder, b"ref");
                    cache.source_name = attr(e, decoder, b"name");
                },
                b"cacheField" => {
                    cache.cache_fields.push(CacheFieldSummary {
                        name: attr(e, decoder, b"name").unwrap_or_default(),
                        shared_item_count: 0,
                    });
                },
                b"sharedItems" => {
                    if let Some(field) = cache.cache_fields.last_mut() {
                        field.shared_item_count = attr_num(e, decoder, b"count").unwrap_or_default();
                    }
                },
                _ => {},
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(PivotError::Xml(format!("XML parsing error: {}", e))),
            _ => {},
        }
    }

    if !seen_root {
        return Err(PivotError::Xml("missing pivotCacheDefinition element".to_string()));
    }

    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TABLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<pivotTableDefinition xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" name="Pivot Table1" cacheId="2" dataCaption="Values"><location ref="G2:M34" firstHeaderRow="1" firstDataRow="1" firstDataCol="1"/><pivotFields count="3"><pivotField name="Mon" axis="axisRow" compact="0" outline="0" defaultSubtotal="0"><items count="1"><item x="0"/></items></pivotField><pivotField dataField="1"/><pivotField axis="axisPage"><items count="1"><item t="default"/></items></pivotField></pivotFields><rowFields count="1"><field x="0"/></rowFields><rowItems count="1"><i><x/><x/></i></rowItems><colFields count="1"><field x="-2"/></colFields><colItems count="1"><i/></colItems><pageFields count="1"><pageField fld="2"/></pageFields><dataFields count="1"><dataField name="Sum &amp; Total" fld="1" subtotal="average"/></dataFields><pivotTableStyleInfo name="PivotStyleLight16" showRowHeaders="0"/></pivotTableDefinition>"#;

    #[test]
    fn test_read_pivot_table_definition() {
        let table = read_pivot_table_definition(TABLE).unwrap();

        assert_eq!(table.name, "Pivot Table1");
        assert_eq!(table.cache_id, 2);
        assert_eq!(table.location, "G2:M34");
        assert_eq!(table.pivot_field_names(), vec![Some("Mon"), None, None]);
        assert_eq!(table.pivot_fields[0].axis, Some(AxisType::AxisRow));
        assert_eq!(table.pivot_fields[0].item_count, 1);
        assert!(table.pivot_fields[1].data_field);
        assert_eq!(table.pivot_fields[2].axis, Some(AxisType::AxisPage));
        assert_eq!(table.row_fields, vec![0]);
        assert_eq!(table.col_fields, Some(vec![-2]));
        assert_eq!(table.page_fields, vec![2]);
        assert_eq!(
            table.data_fields,
            vec![DataFieldSummary {
                name: Some("Sum & Total".to_string()),
                fld: 1,
                subtotal: Subtotal::Average,
            }]
        );
        assert_eq!(table.style_name.as_deref(), Some("PivotStyleLight16"));
    }

    #[test]
    fn test_read_without_col_fields() {
        let xml = TABLE.replace(r#"<colFields count="1"><field x="-2"/></colFields>"#, "");
        let table = read_pivot_table_definition(&xml).unwrap();
        assert_eq!(table.col_fields, None);
        assert_eq!(table.row_fields, vec![0]);
    }

    #[test]
    fn test_read_pivot_cache_definition() {
        let xml = r#"<pivotCacheDefinition xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" saveData="0" refreshOnLoad="1"><cacheSource type="worksheet"><worksheetSource ref="A1:E31" sheet="Sheet1"/></cacheSource><cacheFields count="2"><cacheField name="Month" numFmtId="0"><sharedItems count="1"><s v=""/></sharedItems></cacheField><cacheField name="Year" numFmtId="0"><sharedItems/></cacheField></cacheFields></pivotCacheDefinition>"#;
        let cache = read_pivot_cache_definition(xml).unwrap();

        assert_eq!(cache.source_sheet.as_deref(), Some("Sheet1"));
        assert_eq!(cache.source_ref.as_deref(), Some("A1:E31"));
        assert_eq!(cache.source_name, None);
        assert!(cache.refresh_on_load);
        assert_eq!(
            cache.cache_fields,
            vec![
                CacheFieldSummary {
                    name: "Month".to_string(),
                    shared_item_count: 1,
                },
                CacheFieldSummary {
                    name: "Year".to_string(),
                    shared_item_count: 0,
                },
            ]
        );
    }

    #[test]
    fn test_missing_root_is_an_error() {
        assert!(matches!(
            read_pivot_table_definition("<worksheet/>"),
            Err(PivotError::Xml(_))
        ));
        assert!(read_pivot_cache_definition("not xml <").is_err());
    }
}
