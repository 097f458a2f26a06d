use crate::common::xml::{XML_HEADER, escape_xml, xml_bool};
use crate::error::Result;
use crate::opc::constants::namespace;
use std::fmt::Write as FmtWrite;

use super::cache::{CacheSource, PivotCacheDefinition, PivotCacheField};
use super::fields::{AxisFieldRef, DataField, FieldItem, PageField, PivotField, RowColItem};
use super::table::{Location, PivotTableDefinition, PivotTableStyle};

pub fn write_pivot_table(def: &PivotTableDefinition) -> Result<String> {
    let mut xml = String::with_capacity(4096);

    xml.push_str(XML_HEADER);
    xml.push('\n');
    write!(
        &mut xml,
        r#"<pivotTableDefinition xmlns="{}" name="{}" cacheId="{}" dataCaption="{}""#,
        namespace::SML_MAIN,
        escape_xml(&def.name),
        def.cache_id,
        escape_xml(&def.data_caption)
    )?;
    write!(
        &mut xml,
        r#" rowGrandTotals="{}" colGrandTotals="{}" showDrill="{}" useAutoFormatting="{}" pageOverThenDown="{}" mergeItem="{}" compactData="{}" showError="{}""#,
        xml_bool(def.row_grand_totals),
        xml_bool(def.col_grand_totals),
        xml_bool(def.show_drill),
        xml_bool(def.use_auto_formatting),
        xml_bool(def.page_over_then_down),
        xml_bool(def.merge_item),
        xml_bool(def.compact_data),
        xml_bool(def.show_error)
    )?;
    write!(
        &mut xml,
        r#" updatedVersion="{}" minRefreshableVersion="{}" createdVersion="{}">"#,
        def.updated_version, def.min_refreshable_version, def.created_version
    )?;

    write_location(&mut xml, &def.location)?;
    write_pivot_fields(&mut xml, &def.pivot_fields)?;

    if !def.row_fields.is_empty() {
        write_axis_fields(&mut xml, "rowFields", &def.row_fields)?;
    }
    if !def.row_items.is_empty() {
        write_row_col_items(&mut xml, "rowItems", &def.row_items)?;
    }
    if let Some(col_fields) = &def.col_fields {
        write_axis_fields(&mut xml, "colFields", col_fields)?;
    }
    if !def.col_items.is_empty() {
        write_row_col_items(&mut xml, "colItems", &def.col_items)?;
    }
    if !def.page_fields.is_empty() {
        write_page_fields(&mut xml, &def.page_fields)?;
    }
    if !def.data_fields.is_empty() {
        write_data_fields(&mut xml, &def.data_fields)?;
    }

    write_pivot_table_style(&mut xml, &def.style)?;

    xml.push_str("</pivotTableDefinition>");

    Ok(xml)
}

fn write_location(xml: &mut String, location: &Location) -> Result<()> {
    write!(
        xml,
        r#"<location ref="{}" firstHeaderRow="{}" firstDataRow="{}" firstDataCol="{}"/>"#,
        escape_xml(&location.reference),
        location.first_header_row,
        location.first_data_row,
        location.first_data_col
    )?;
    Ok(())
}

fn write_pivot_fields(xml: &mut String, fields: &[PivotField]) -> Result<()> {
    write!(xml, r#"<pivotFields count="{}">"#, fields.len())?;

    for field in fields {
        xml.push_str("<pivotField");

        if let Some(name) = &field.name {
            write!(xml, r#" name="{}""#, escape_xml(name))?;
        }
        if let Some(axis) = &field.axis {
            write!(xml, r#" axis="{}""#, axis.as_str())?;
        }
        if field.data_field {
            xml.push_str(r#" dataField="1""#);
        }
        if let Some(compact) = field.compact {
            write!(xml, r#" compact="{}""#, xml_bool(compact))?;
        }
        if let Some(outline) = field.outline {
            write!(xml, r#" outline="{}""#, xml_bool(outline))?;
        }
        if let Some(default_subtotal) = field.default_subtotal {
            write!(xml, r#" defaultSubtotal="{}""#, xml_bool(default_subtotal))?;
        }

        if field.items.is_empty() {
            xml.push_str("/>");
        } else {
            xml.push('>');
            write_field_items(xml, &field.items)?;
            xml.push_str("</pivotField>");
        }
    }

    xml.push_str("</pivotFields>");
    Ok(())
}

fn write_field_items(xml: &mut String, items: &[FieldItem]) -> Result<()> {
    write!(xml, r#"<items count="{}">"#, items.len())?;

    for item in items {
        match item {
            FieldItem::Index(x) => write!(xml, r#"<item x="{}"/>"#, x)?,
            FieldItem::Default => xml.push_str(r#"<item t="default"/>"#),
        }
    }

    xml.push_str("</items>");
    Ok(())
}

fn write_axis_fields(xml: &mut String, tag_name: &str, fields: &[AxisFieldRef]) -> Result<()> {
    write!(xml, r#"<{} count="{}">"#, tag_name, fields.len())?;
    for field in fields {
        write!(xml, r#"<field x="{}"/>"#, field.x())?;
    }
    write!(xml, "</{}>", tag_name)?;
    Ok(())
}

fn write_row_col_items(xml: &mut String, tag_name: &str, items: &[RowColItem]) -> Result<()> {
    write!(xml, r#"<{} count="{}">"#, tag_name, items.len())?;

    for item in items {
        if item.x.is_empty() {
            xml.push_str("<i/>");
            continue;
        }

        xml.push_str("<i>");
        for &x_val in &item.x {
            if x_val == 0 {
                xml.push_str("<x/>");
            } else {
                write!(xml, r#"<x v="{}"/>"#, x_val)?;
            }
        }
        xml.push_str("</i>");
    }

    write!(xml, "</{}>", tag_name)?;
    Ok(())
}

fn write_page_fields(xml: &mut String, page_fields: &[PageField]) -> Result<()> {
    write!(xml, r#"<pageFields count="{}">"#, page_fields.len())?;

    for field in page_fields {
        write!(xml, r#"<pageField fld="{}""#, field.fld.get())?;
        if let Some(name) = &field.name {
            write!(xml, r#" name="{}""#, escape_xml(name))?;
        }
        xml.push_str("/>");
    }

    xml.push_str("</pageFields>");
    Ok(())
}

fn write_data_fields(xml: &mut String, data_fields: &[DataField]) -> Result<()> {
    write!(xml, r#"<dataFields count="{}">"#, data_fields.len())?;

    for field in data_fields {
        xml.push_str("<dataField");
        if let Some(name) = &field.name {
            write!(xml, r#" name="{}""#, escape_xml(name))?;
        }
        write!(
            xml,
            r#" fld="{}" subtotal="{}"/>"#,
            field.fld.get(),
            field.subtotal.as_str()
        )?;
    }

    xml.push_str("</dataFields>");
    Ok(())
}

fn write_pivot_table_style(xml: &mut String, style: &PivotTableStyle) -> Result<()> {
    write!(
        xml,
        r#"<pivotTableStyleInfo name="{}" showRowHeaders="{}" showColHeaders="{}" showRowStripes="{}" showColStripes="{}" showLastColumn="{}"/>"#,
        escape_xml(&style.name),
        xml_bool(style.show_row_headers),
        xml_bool(style.show_col_headers),
        xml_bool(style.show_row_stripes),
        xml_bool(style.show_col_stripes),
        xml_bool(style.show_last_column)
    )?;
    Ok(())
}

pub fn write_pivot_cache_definition(cache_def: &PivotCacheDefinition) -> Result<String> {
    let mut xml = String::with_capacity(2048);

    xml.push_str(XML_HEADER);
    xml.push('\n');
    write!(
        xml,
        r#"<pivotCacheDefinition xmlns="{}" xmlns:r="{}" saveData="{}" refreshOnLoad="{}""#,
        namespace::SML_MAIN,
        namespace::OFC_RELATIONSHIPS,
        xml_bool(cache_def.save_data),
        xml_bool(cache_def.refresh_on_load)
    )?;
    write!(
        xml,
        r#" createdVersion="{}" refreshedVersion="{}" minRefreshableVersion="{}">"#,
        cache_def.created_version, cache_def.refreshed_version, cache_def.min_refreshable_version
    )?;

    xml.push_str(r#"<cacheSource type="worksheet"><worksheetSource"#);
    match &cache_def.source {
        CacheSource::Range { sheet, reference } => {
            write!(
                xml,
                r#" ref="{}" sheet="{}""#,
                escape_xml(reference),
                escape_xml(sheet)
            )?;
        },
        CacheSource::Name(name) => {
            write!(xml, r#" name="{}""#, escape_xml(name))?;
        },
    }
    xml.push_str("/></cacheSource>");

    write_cache_fields(&mut xml, &cache_def.cache_fields)?;

    xml.push_str("</pivotCacheDefinition>");

    Ok(xml)
}

fn write_cache_fields(xml: &mut String, fields: &[PivotCacheField]) -> Result<()> {
    write!(xml, r#"<cacheFields count="{}">"#, fields.len())?;

    for field in fields {
        write!(
            xml,
            r#"<cacheField name="{}" numFmtId="{}">"#,
            escape_xml(&field.name),
            field.num_fmt_id
        )?;
        write_shared_items(xml, &field.shared_items)?;
        xml.push_str("</cacheField>");
    }

    xml.push_str("</cacheFields>");
    Ok(())
}

fn write_shared_items(xml: &mut String, items: &[String]) -> Result<()> {
    if items.is_empty() {
        xml.push_str("<sharedItems/>");
        return Ok(());
    }

    write!(xml, r#"<sharedItems count="{}">"#, items.len())?;
    for item in items {
        write!(xml, r#"<s v="{}"/>"#, escape_xml(item))?;
    }
    xml.push_str("</sharedItems>");
    Ok(())
}
