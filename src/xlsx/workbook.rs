//! In-memory workbook that pivot tables are added to.
//!
//! [`Workbook`] keeps sheets with their cell values, defined names, the
//! workbook pivot cache registry and a [`Package`] holding every generated
//! part. It implements [`PivotHost`], so pivot tables are added with
//! [`Workbook::add_pivot_table`].

use std::collections::BTreeMap;
use std::fmt::Write as FmtWrite;

use log::debug;

use crate::common::cell_ref::{cell_name_to_coordinates, coordinates_to_cell_name};
use crate::common::xml::{XML_HEADER, escape_xml};
use crate::error::{PivotError, Result};
use crate::opc::constants::{content_type as ct, namespace, relationship_type as rt};
use crate::opc::{Package, PackURI};
use crate::xlsx::pivot::add::{AddedPivotTable, add_pivot_table};
use crate::xlsx::pivot::ids::{PartKind, PivotHost, WorkbookCacheRegistryId};
use crate::xlsx::pivot::options::PivotTableOptions;
use crate::xlsx::pivot::reader::{PivotTableSummary, read_pivot_table_definition};

const WORKBOOK_PART: &str = "/xl/workbook.xml";

/// A named range, optionally scoped to one sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinedName {
    pub name: String,
    pub reference: String,
    /// 1-based sheet ID for sheet-scoped names
    pub local_sheet_id: Option<u32>,
}

/// Entry of the workbook's `<pivotCaches>` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotCacheEntry {
    pub cache_id: WorkbookCacheRegistryId,
    pub r_id: String,
}

#[derive(Debug, Clone)]
struct Sheet {
    name: String,
    sheet_id: u32,
    r_id: String,
    partname: PackURI,
    /// Values keyed by (row, col), 1-based
    cells: BTreeMap<(u32, u32), String>,
}

/// Workbook model: sheets, cells, defined names and the part package.
#[derive(Debug, Clone)]
pub struct Workbook {
    workbook_part: PackURI,
    sheets: Vec<Sheet>,
    defined_names: Vec<DefinedName>,
    pivot_caches: Vec<PivotCacheEntry>,
    package: Package,
}

impl Workbook {
    /// Create an empty workbook without sheets.
    ///
    /// # Examples
    ///
    /// ```
    /// use xlpivot::xlsx::Workbook;
    ///
    /// let mut wb = Workbook::create()?;
    /// wb.add_sheet("Sheet1")?;
    /// wb.set_cell_value("Sheet1", "A1", "Month")?;
    /// assert_eq!(wb.cell_value("Sheet1", "A1")?, "Month");
    /// # Ok::<(), xlpivot::PivotError>(())
    /// ```
    pub fn create() -> Result<Self> {
        let workbook_part = PackURI::new(WORKBOOK_PART).map_err(PivotError::Relationship)?;
        let mut package = Package::new();
        package.relate("/", rt::OFFICE_DOCUMENT, workbook_part.membername())?;
        package
            .content_types_mut()
            .add_override(workbook_part.as_str(), ct::SML_SHEET_MAIN);

        Ok(Self {
            workbook_part,
            sheets: Vec::new(),
            defined_names: Vec::new(),
            pivot_caches: Vec::new(),
            package,
        })
    }

    /// Append a worksheet and return its 1-based sheet ID.
    pub fn add_sheet(&mut self, name: &str) -> Result<u32> {
        if name.is_empty() {
            return Err(PivotError::MissingParameter("name".to_string()));
        }
        if self.sheet(name).is_some() {
            return Err(PivotError::InvalidParameter(format!(
                "sheet {} already exists",
                name
            )));
        }

        let sheet_id = self.sheets.len() as u32 + 1;
        let partname = PackURI::new(format!("/xl/worksheets/sheet{}.xml", sheet_id))
            .map_err(PivotError::Relationship)?;
        let r_id = self.package.relate(
            self.workbook_part.as_str(),
            rt::WORKSHEET,
            &partname.relative_ref(self.workbook_part.base_uri()),
        )?;
        self.package
            .content_types_mut()
            .add_override(partname.as_str(), ct::SML_WORKSHEET);

        self.sheets.push(Sheet {
            name: name.to_string(),
            sheet_id,
            r_id,
            partname,
            cells: BTreeMap::new(),
        });
        Ok(sheet_id)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }

    fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut Sheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| PivotError::UnknownSheet(name.to_string()))
    }

    /// Set the value of one cell.
    pub fn set_cell_value(&mut self, sheet: &str, cell: &str, value: impl Into<String>) -> Result<()> {
        let (col, row) = cell_name_to_coordinates(cell)?;
        self.sheet_mut(sheet)?.cells.insert((row, col), value.into());
        Ok(())
    }

    /// Write `values` into consecutive cells of one row, starting at `cell`.
    pub fn set_row_values<S: AsRef<str>>(&mut self, sheet: &str, cell: &str, values: &[S]) -> Result<()> {
        let (col, row) = cell_name_to_coordinates(cell)?;
        let sheet = self.sheet_mut(sheet)?;
        for (offset, value) in values.iter().enumerate() {
            let col = col + offset as u32;
            // validates the column
            coordinates_to_cell_name(col, row)?;
            sheet.cells.insert((row, col), value.as_ref().to_string());
        }
        Ok(())
    }

    /// Value of one cell; empty when the cell was never set.
    pub fn cell_value(&self, sheet: &str, cell: &str) -> Result<String> {
        let (col, row) = cell_name_to_coordinates(cell)?;
        let sheet = self
            .sheet(sheet)
            .ok_or_else(|| PivotError::UnknownSheet(sheet.to_string()))?;
        Ok(sheet.cells.get(&(row, col)).cloned().unwrap_or_default())
    }

    /// Define a workbook-scoped name.
    pub fn define_name(&mut self, name: &str, reference: &str) {
        self.defined_names.push(DefinedName {
            name: name.to_string(),
            reference: reference.to_string(),
            local_sheet_id: None,
        });
    }

    /// Define a name visible only from `sheet`.
    pub fn define_name_local(&mut self, name: &str, reference: &str, sheet: &str) -> Result<()> {
        let sheet_id = self
            .sheet(sheet)
            .map(|s| s.sheet_id)
            .ok_or_else(|| PivotError::UnknownSheet(sheet.to_string()))?;
        self.defined_names.push(DefinedName {
            name: name.to_string(),
            reference: reference.to_string(),
            local_sheet_id: Some(sheet_id),
        });
        Ok(())
    }

    pub fn defined_names(&self) -> &[DefinedName] {
        &self.defined_names
    }

    pub fn pivot_caches(&self) -> &[PivotCacheEntry] {
        &self.pivot_caches
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Add a pivot table described by `opts`.
    ///
    /// # Examples
    ///
    /// ```
    /// use xlpivot::xlsx::Workbook;
    /// use xlpivot::xlsx::pivot::{PivotTableField, PivotTableOptions};
    ///
    /// let mut wb = Workbook::create()?;
    /// wb.add_sheet("Sheet1")?;
    /// wb.set_row_values("Sheet1", "A1", &["Month", "Year", "Sales"])?;
    ///
    /// let opts = PivotTableOptions {
    ///     rows: vec![PivotTableField::new("Month")],
    ///     data: vec![PivotTableField::new("Sales").with_subtotal("Sum")],
    ///     ..PivotTableOptions::new("Sheet1!$A$1:$C$20", "Sheet1!$E$2:$H$20")
    /// };
    /// let added = wb.add_pivot_table(&opts)?;
    /// assert_eq!(added.table_part.as_str(), "/xl/pivotTables/pivotTable1.xml");
    /// # Ok::<(), xlpivot::PivotError>(())
    /// ```
    pub fn add_pivot_table(&mut self, opts: &PivotTableOptions) -> Result<AddedPivotTable> {
        add_pivot_table(self, opts)
    }

    /// Summaries of every pivot table part in the package.
    pub fn pivot_tables(&self) -> Result<Vec<PivotTableSummary>> {
        self.package
            .partnames()
            .filter(|p| p.as_str().contains(PartKind::PivotTable.part_prefix()))
            .filter_map(|p| self.package.part(p.as_str()))
            .map(|blob| {
                let xml = std::str::from_utf8(blob).map_err(|e| PivotError::Xml(e.to_string()))?;
                read_pivot_table_definition(xml)
            })
            .collect()
    }

    /// Generate `xl/workbook.xml`.
    pub fn workbook_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(1024);

        xml.push_str(XML_HEADER);
        write!(
            xml,
            r#"<workbook xmlns="{}" xmlns:r="{}">"#,
            namespace::SML_MAIN,
            namespace::OFC_RELATIONSHIPS
        )?;

        xml.push_str("<sheets>");
        for sheet in &self.sheets {
            write!(
                xml,
                r#"<sheet name="{}" sheetId="{}" r:id="{}"/>"#,
                escape_xml(&sheet.name),
                sheet.sheet_id,
                sheet.r_id
            )?;
        }
        xml.push_str("</sheets>");

        if !self.defined_names.is_empty() {
            xml.push_str("<definedNames>");
            for defined_name in &self.defined_names {
                write!(xml, r#"<definedName name="{}""#, escape_xml(&defined_name.name))?;
                if let Some(sheet_id) = defined_name.local_sheet_id {
                    write!(xml, r#" localSheetId="{}""#, sheet_id - 1)?;
                }
                write!(xml, ">{}</definedName>", escape_xml(&defined_name.reference))?;
            }
            xml.push_str("</definedNames>");
        }

        if !self.pivot_caches.is_empty() {
            xml.push_str("<pivotCaches>");
            for entry in &self.pivot_caches {
                write!(
                    xml,
                    r#"<pivotCache cacheId="{}" r:id="{}"/>"#,
                    entry.cache_id, entry.r_id
                )?;
            }
            xml.push_str("</pivotCaches>");
        }

        xml.push_str("</workbook>");

        Ok(xml)
    }

    /// Generate the worksheet part of `sheet`.
    pub fn worksheet_xml(&self, sheet: &str) -> Result<String> {
        let sheet = self
            .sheet(sheet)
            .ok_or_else(|| PivotError::UnknownSheet(sheet.to_string()))?;
        write_worksheet(sheet)
    }

    /// Render every archive member of the workbook, keyed by member name.
    pub fn to_parts(&self) -> Result<BTreeMap<String, Vec<u8>>> {
        let mut members = self.package.to_parts()?;
        members.insert(
            self.workbook_part.membername().to_string(),
            self.workbook_xml()?.into_bytes(),
        );
        for sheet in &self.sheets {
            members.insert(
                sheet.partname.membername().to_string(),
                write_worksheet(sheet)?.into_bytes(),
            );
        }
        Ok(members)
    }
}

fn write_worksheet(sheet: &Sheet) -> Result<String> {
    let mut xml = String::with_capacity(512 + sheet.cells.len() * 48);

    xml.push_str(XML_HEADER);
    write!(xml, r#"<worksheet xmlns="{}">"#, namespace::SML_MAIN)?;
    xml.push_str("<sheetData>");

    let mut current_row = None;
    for (&(row, col), value) in &sheet.cells {
        if current_row != Some(row) {
            if current_row.is_some() {
                xml.push_str("</row>");
            }
            write!(xml, r#"<row r="{}">"#, row)?;
            current_row = Some(row);
        }

        let cell_ref = coordinates_to_cell_name(col, row)?;
        if is_numeric_value(value) {
            write!(xml, r#"<c r="{}"><v>{}</v></c>"#, cell_ref, value)?;
        } else {
            write!(
                xml,
                r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                cell_ref,
                escape_xml(value)
            )?;
        }
    }
    if current_row.is_some() {
        xml.push_str("</row>");
    }

    xml.push_str("</sheetData></worksheet>");
    Ok(xml)
}

/// Finite decimal numbers are stored as `<v>`; everything else (including
/// `NaN` and `inf`) as an inline string.
fn is_numeric_value(value: &str) -> bool {
    value.parse::<f64>().is_ok_and(f64::is_finite)
}

impl PivotHost for Workbook {
    /// A name scoped to `scope_sheet` wins over a workbook-scoped one.
    fn defined_name_ref(&self, name: &str, scope_sheet: &str) -> Option<String> {
        let scope_id = self.sheet(scope_sheet).map(|s| s.sheet_id);
        let matching = || self.defined_names.iter().filter(move |d| d.name == name);

        matching()
            .find(|d| d.local_sheet_id.is_some() && d.local_sheet_id == scope_id)
            .or_else(|| matching().find(|d| d.local_sheet_id.is_none()))
            .map(|d| d.reference.trim_start_matches('=').to_string())
    }

    fn cell_value(&self, sheet: &str, cell: &str) -> Result<String> {
        Workbook::cell_value(self, sheet, cell)
    }

    fn sheet_part(&self, sheet: &str) -> Option<PackURI> {
        self.sheet(sheet).map(|s| s.partname.clone())
    }

    fn workbook_part(&self) -> PackURI {
        self.workbook_part.clone()
    }

    fn count_parts(&self, pattern: &str) -> usize {
        self.package.count_parts_matching(pattern)
    }

    fn pivot_cache_ids(&self) -> Vec<u32> {
        self.pivot_caches.iter().map(|e| e.cache_id.get()).collect()
    }

    fn add_relationship(&mut self, source: &PackURI, reltype: &str, target: &str) -> Result<String> {
        self.package.relate(source.as_str(), reltype, target)
    }

    fn register_pivot_cache(&mut self, cache_id: WorkbookCacheRegistryId, r_id: &str) -> Result<()> {
        if self.pivot_caches.iter().any(|e| e.cache_id == cache_id) {
            return Err(PivotError::Relationship(format!(
                "pivot cache {} is already registered",
                cache_id
            )));
        }
        self.pivot_caches.push(PivotCacheEntry {
            cache_id,
            r_id: r_id.to_string(),
        });
        Ok(())
    }

    fn add_content_type_part(&mut self, sequence: u32, kind: PartKind) -> Result<()> {
        let partname = kind.partname(sequence)?;
        if !self
            .package
            .content_types_mut()
            .add_override(partname.as_str(), kind.content_type())
        {
            debug!("content type of {} already registered", partname);
        }
        Ok(())
    }

    fn save_part(&mut self, partname: PackURI, blob: Vec<u8>) -> Result<()> {
        self.package.put_part(partname, blob);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workbook() -> Workbook {
        let mut wb = Workbook::create().unwrap();
        wb.add_sheet("Sheet1").unwrap();
        wb.add_sheet("Sheet2").unwrap();
        wb
    }

    #[test]
    fn test_sheets_and_cells() {
        let mut wb = workbook();
        assert_eq!(wb.sheet_names(), vec!["Sheet1", "Sheet2"]);
        assert!(wb.add_sheet("Sheet1").is_err());

        wb.set_row_values("Sheet1", "B2", &["Month", "Year"]).unwrap();
        assert_eq!(wb.cell_value("Sheet1", "C2").unwrap(), "Year");
        assert_eq!(wb.cell_value("Sheet1", "D2").unwrap(), "");
        assert!(matches!(
            wb.cell_value("Sheet3", "A1"),
            Err(PivotError::UnknownSheet(_))
        ));
        assert!(wb.set_cell_value("Sheet1", "A0", "x").is_err());

        assert_eq!(
            wb.sheet_part("Sheet2").unwrap().as_str(),
            "/xl/worksheets/sheet2.xml"
        );
        assert_eq!(wb.sheet_part("Sheet3"), None);
    }

    #[test]
    fn test_defined_name_scope() {
        let mut wb = workbook();
        wb.define_name("Data", "=Sheet1!$A$1:$B$5");
        wb.define_name_local("Data", "Sheet2!$A$1:$C$9", "Sheet2").unwrap();

        assert_eq!(
            wb.defined_name_ref("Data", "Sheet1").as_deref(),
            Some("Sheet1!$A$1:$B$5")
        );
        assert_eq!(
            wb.defined_name_ref("Data", "Sheet2").as_deref(),
            Some("Sheet2!$A$1:$C$9")
        );
        assert_eq!(wb.defined_name_ref("Other", "Sheet1"), None);
        assert!(wb.define_name_local("X", "Sheet1!A1:B2", "Nope").is_err());
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut wb = workbook();
        wb.register_pivot_cache(WorkbookCacheRegistryId::new(2), "rId3").unwrap();
        assert!(
            wb.register_pivot_cache(WorkbookCacheRegistryId::new(2), "rId4")
                .is_err()
        );
        assert_eq!(wb.pivot_cache_ids(), vec![2]);
    }

    #[test]
    fn test_workbook_xml() {
        let mut wb = workbook();
        wb.define_name_local("Data", "Sheet2!$A$1:$C$9", "Sheet2").unwrap();
        wb.register_pivot_cache(WorkbookCacheRegistryId::new(2), "rId3").unwrap();

        let xml = wb.workbook_xml().unwrap();
        assert!(xml.contains(r#"<sheet name="Sheet1" sheetId="1" r:id="rId1"/>"#));
        assert!(xml.contains(r#"<sheet name="Sheet2" sheetId="2" r:id="rId2"/>"#));
        assert!(xml.contains(
            r#"<definedName name="Data" localSheetId="1">Sheet2!$A$1:$C$9</definedName>"#
        ));
        assert!(xml.contains(r#"<pivotCaches><pivotCache cacheId="2" r:id="rId3"/></pivotCaches>"#));
    }

    #[test]
    fn test_worksheet_xml() {
        let mut wb = workbook();
        wb.set_row_values("Sheet1", "A1", &["Month", "Sales"]).unwrap();
        wb.set_row_values("Sheet1", "A2", &["Jan", "1200"]).unwrap();

        let xml = wb.worksheet_xml("Sheet1").unwrap();
        assert!(xml.contains(
            r#"<row r="1"><c r="A1" t="inlineStr"><is><t>Month</t></is></c><c r="B1" t="inlineStr"><is><t>Sales</t></is></c></row>"#
        ));
        assert!(xml.contains(r#"<c r="B2"><v>1200</v></c></row>"#));
    }

    #[test]
    fn test_non_finite_values_are_strings() {
        let mut wb = workbook();
        wb.set_row_values("Sheet1", "A1", &["NaN", "inf", "-Infinity", "1e3"]).unwrap();

        let xml = wb.worksheet_xml("Sheet1").unwrap();
        assert!(xml.contains(r#"<c r="A1" t="inlineStr"><is><t>NaN</t></is></c>"#));
        assert!(xml.contains(r#"<c r="B1" t="inlineStr"><is><t>inf</t></is></c>"#));
        assert!(xml.contains(r#"<c r="C1" t="inlineStr"><is><t>-Infinity</t></is></c>"#));
        assert!(xml.contains(r#"<c r="D1"><v>1e3</v></c>"#));
        assert!(!xml.contains("<v>NaN</v>"));
    }

    #[test]
    fn test_to_parts_of_empty_workbook() {
        let wb = workbook();
        let parts = wb.to_parts().unwrap();
        let names: Vec<&str> = parts.keys().map(String::as_str).collect();
        assert_eq!(
            names,
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "xl/_rels/workbook.xml.rels",
                "xl/workbook.xml",
                "xl/worksheets/sheet1.xml",
                "xl/worksheets/sheet2.xml",
            ]
        );
    }
}
