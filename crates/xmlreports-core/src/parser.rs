//! XML document parser.
//!
//! Documents have a fixed positional layout under the root element:
//!
//! ```xml
//! <root>
//!   <var name="id" value="4f1c..."/>
//!   <var name="level" value="42"/>
//!   <objects>
//!     <object name="aZ3"/>
//!     <object name="k"/>
//!   </objects>
//! </root>
//! ```
//!
//! The first element child carries the identifier in its `value` attribute, the
//! second the level, and every element child of the third is one object whose
//! `name` attribute is extracted. Only positions and attributes matter; tag
//! names are not checked. Element children after the third are ignored.

use crate::error::ParseError;
use crate::record::DocumentRecord;
use std::fs;
use std::path::Path;

/// Attribute holding the identifier and level values
const VALUE_ATTR: &str = "value";
/// Attribute holding each object's name
const NAME_ATTR: &str = "name";

/// Read and parse one document from disk.
///
/// # Errors
///
/// [`ParseError::Io`] if the file cannot be read, [`ParseError::MalformedDocument`]
/// if it is not UTF-8 XML with the expected three slots.
pub fn parse_document(path: &Path) -> Result<DocumentRecord, ParseError> {
    let bytes = fs::read(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = std::str::from_utf8(&bytes)
        .map_err(|e| ParseError::malformed(path, format!("not UTF-8: {e}")))?;
    parse_document_str(text, path)
}

/// Parse one document already in memory. `origin` is only used in errors.
///
/// # Errors
///
/// [`ParseError::MalformedDocument`] if the text is not well-formed XML or
/// lacks the identifier / level / objects slots.
pub fn parse_document_str(xml: &str, origin: &Path) -> Result<DocumentRecord, ParseError> {
    let doc = roxmltree::Document::parse(xml)
        .map_err(|e| ParseError::malformed(origin, format!("XML parse error: {e}")))?;

    let mut slots = doc.root_element().children().filter(roxmltree::Node::is_element);

    let id_node = slots
        .next()
        .ok_or_else(|| ParseError::malformed(origin, "missing identifier element"))?;
    let id = id_node
        .attribute(VALUE_ATTR)
        .ok_or_else(|| ParseError::malformed(origin, "identifier element has no value"))?;

    let level_node = slots
        .next()
        .ok_or_else(|| ParseError::malformed(origin, "missing level element"))?;
    let level = level_node
        .attribute(VALUE_ATTR)
        .ok_or_else(|| ParseError::malformed(origin, "level element has no value"))?;
    if level.trim().parse::<i64>().is_err() {
        return Err(ParseError::malformed(
            origin,
            format!("level {level:?} is not an integer"),
        ));
    }

    let objects_node = slots
        .next()
        .ok_or_else(|| ParseError::malformed(origin, "missing objects element"))?;
    let objects = objects_node
        .children()
        .filter(roxmltree::Node::is_element)
        .enumerate()
        .map(|(i, object)| {
            object
                .attribute(NAME_ATTR)
                .map(str::to_string)
                .ok_or_else(|| ParseError::malformed(origin, format!("object {i} has no name")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DocumentRecord {
        id: id.to_string(),
        level: level.to_string(),
        objects,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"<root><var name="id" value="abc123" /><var name="level" value="42" /><objects><object name="a" /><object name="b" /><object name="c" /></objects></root>"#;

    fn origin() -> &'static Path {
        Path::new("file0.xml")
    }

    fn reason(err: ParseError) -> String {
        match err {
            ParseError::MalformedDocument { reason, .. } => reason,
            other => panic!("expected MalformedDocument, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_sample() {
        let record = parse_document_str(SAMPLE, origin()).unwrap();
        assert_eq!(record, DocumentRecord::new("abc123", "42", ["a", "b", "c"]));
    }

    #[test]
    fn test_whitespace_and_comments_between_slots() {
        let xml = r#"<?xml version="1.0"?>
<root>
  <!-- generated -->
  <var name="id" value="X"/>
  <var name="level" value="3"/>
  <objects>
    <object name="only"/>
  </objects>
</root>"#;
        let record = parse_document_str(xml, origin()).unwrap();
        assert_eq!(record.objects, ["only"]);
    }

    #[test]
    fn test_tag_names_are_not_checked() {
        let xml = r#"<doc><a value="X"/><b value="1"/><c><d name="n"/></c></doc>"#;
        let record = parse_document_str(xml, origin()).unwrap();
        assert_eq!(record, DocumentRecord::new("X", "1", ["n"]));
    }

    #[test]
    fn test_empty_objects_container() {
        let xml = r#"<root><var value="X"/><var value="1"/><objects/></root>"#;
        let record = parse_document_str(xml, origin()).unwrap();
        assert!(record.objects.is_empty());
    }

    #[test]
    fn test_missing_objects_slot() {
        let xml = r#"<root><var value="X"/><var value="1"/></root>"#;
        let err = parse_document_str(xml, origin()).unwrap_err();
        assert!(reason(err).contains("objects"));
    }

    #[test]
    fn test_missing_value_attribute() {
        let xml = r#"<root><var name="id"/><var value="1"/><objects/></root>"#;
        let err = parse_document_str(xml, origin()).unwrap_err();
        assert!(reason(err).contains("identifier"));
    }

    #[test]
    fn test_non_integer_level() {
        let xml = r#"<root><var value="X"/><var value="high"/><objects/></root>"#;
        let err = parse_document_str(xml, origin()).unwrap_err();
        assert!(reason(err).contains("not an integer"));
    }

    #[test]
    fn test_object_without_name() {
        let xml = r#"<root><var value="X"/><var value="1"/><objects><object name="a"/><object/></objects></root>"#;
        let err = parse_document_str(xml, origin()).unwrap_err();
        assert!(reason(err).contains("object 1"));
    }

    #[test]
    fn test_not_xml() {
        let err = parse_document_str("id,level\nX,1\n", origin()).unwrap_err();
        assert!(reason(err).contains("XML parse error"));
    }

    #[test]
    fn test_parse_document_from_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("file0.xml");
        std::fs::write(&path, SAMPLE).unwrap();

        let record = parse_document(&path).unwrap();
        assert_eq!(record.id, "abc123");
    }

    #[test]
    fn test_unreadable_document_is_io() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.xml");

        let err = parse_document(&path).unwrap_err();
        assert!(matches!(err, ParseError::Io { .. }));
        assert_eq!(err.path(), path.as_path());
    }

    #[test]
    fn test_invalid_utf8_is_malformed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("latin1.xml");
        std::fs::write(&path, [0x3c, 0xff, 0xfe, 0x3e]).unwrap();

        let err = parse_document(&path).unwrap_err();
        assert!(reason(err).contains("UTF-8"));
    }
}
