//! XML text helpers shared by the part writers and the read-back parser.

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;

// Static initialization: automaton is built only once, thread-safe
static XML_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'"])
        .expect("Failed to build XML escaper")
});

/// XML declaration written at the top of every generated part.
pub const XML_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Escape XML special characters for use in attribute values and text.
///
/// # Examples
///
/// ```
/// use xlpivot::common::xml::escape_xml;
/// assert_eq!(escape_xml("Sales & Costs"), "Sales &amp; Costs");
/// assert_eq!(escape_xml("\"Q1\" <draft>"), "&quot;Q1&quot; &lt;draft&gt;");
/// ```
#[inline]
pub fn escape_xml(s: &str) -> String {
    XML_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
}

/// SpreadsheetML boolean attribute value.
#[inline]
pub fn xml_bool(value: bool) -> &'static str {
    if value { "1" } else { "0" }
}

/// Parse a SpreadsheetML boolean attribute value (`1`/`0`/`true`/`false`).
pub fn parse_xml_bool(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_field_names() {
        let escaped = escape_xml(r#"Revenue <net> & 'gross'"#);
        assert_eq!(escaped, "Revenue &lt;net&gt; &amp; &apos;gross&apos;");
        assert_eq!(escape_xml("Sales"), "Sales");
    }

    #[test]
    fn test_xml_bool() {
        assert_eq!(xml_bool(true), "1");
        assert_eq!(xml_bool(false), "0");
        assert!(parse_xml_bool("1"));
        assert!(parse_xml_bool("TRUE"));
        assert!(!parse_xml_bool("0"));
        assert!(!parse_xml_bool(""));
    }
}
