//! XML loading for the posts export.
//!
//! The document is read into a small tree: attributes and child elements share
//! one mapping per element, and a name that repeats under the same parent is
//! collected into a [`XmlValue::List`]. [`row_records`] then flattens the
//! `row` children of the root into [`RawRecord`]s.

use crate::constants::{ROOT_ELEMENT, ROW_ELEMENT};
use crate::error::{PostsError, Result};
use crate::types::RawRecord;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Key under which an element's own text is stored when it also has
/// attributes or children.
pub const TEXT_KEY: &str = "_";

#[derive(Debug, Clone, PartialEq)]
pub enum XmlValue {
    /// Element with no attributes and no children
    Text(String),
    Element(XmlElement),
    /// Repeated sibling elements with the same name
    List(Vec<XmlValue>),
}

impl XmlValue {
    /// Views a value as a sequence: lists are returned as-is, any single value
    /// becomes a one-element sequence.
    pub fn into_sequence(self) -> Vec<XmlValue> {
        match self {
            XmlValue::List(items) => items,
            single => vec![single],
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            XmlValue::Text(text) => Some(text),
            XmlValue::List(items) => items.first().and_then(XmlValue::as_text),
            XmlValue::Element(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    fields: BTreeMap<String, XmlValue>,
}

impl XmlElement {
    pub fn get(&self, key: &str) -> Option<&XmlValue> {
        self.fields.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Inserts a field, turning a repeated key into a list.
    pub fn insert(&mut self, key: String, value: XmlValue) {
        match self.fields.entry(key) {
            Entry::Vacant(slot) => {
                slot.insert(value);
            }
            Entry::Occupied(mut slot) => match slot.get_mut() {
                XmlValue::List(items) => items.push(value),
                existing => {
                    let first = std::mem::replace(existing, XmlValue::List(Vec::new()));
                    *existing = XmlValue::List(vec![first, value]);
                }
            },
        }
    }

    /// The scalar fields of this element as a flat string map.
    pub fn text_fields(&self) -> RawRecord {
        self.fields
            .iter()
            .filter(|(key, _)| key.as_str() != TEXT_KEY)
            .filter_map(|(key, value)| value.as_text().map(|text| (key.clone(), text.to_string())))
            .collect()
    }
}

/// A parsed document: the root element's name and its content.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub root_name: String,
    pub root: XmlValue,
}

struct OpenElement {
    name: String,
    element: XmlElement,
    text: String,
}

impl OpenElement {
    fn start(start: &BytesStart<'_>) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut element = XmlElement::default();
        for attr in start.attributes() {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.unescape_value()?.into_owned();
            element.insert(key, XmlValue::Text(value));
        }
        Ok(Self {
            name,
            element,
            text: String::new(),
        })
    }

    fn finish(self) -> (String, XmlValue) {
        let OpenElement {
            name,
            mut element,
            text,
        } = self;
        if element.is_empty() {
            return (name, XmlValue::Text(text));
        }
        if !text.trim().is_empty() {
            element.insert(TEXT_KEY.to_string(), XmlValue::Text(text));
        }
        (name, XmlValue::Element(element))
    }
}

/// Parses XML text into an [`XmlDocument`].
pub fn parse_xml(content: &str) -> Result<XmlDocument> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<OpenElement> = Vec::new();
    let mut document: Option<XmlDocument> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(PostsError::Parse(format!(
                    "error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
        };

        match event {
            Event::Start(start) => stack.push(OpenElement::start(&start)?),
            Event::Empty(start) => {
                let (name, value) = OpenElement::start(&start)?.finish();
                attach(&mut stack, &mut document, name, value)?;
            }
            Event::Text(text) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(cdata) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            Event::End(_) => {
                let open = stack.pop().ok_or_else(|| {
                    PostsError::Parse("closing tag without a matching opening tag".to_string())
                })?;
                let (name, value) = open.finish();
                attach(&mut stack, &mut document, name, value)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(PostsError::Parse(format!(
            "unexpected end of document, <{}> is not closed",
            open.name
        )));
    }

    document.ok_or_else(|| PostsError::Parse("document has no root element".to_string()))
}

fn attach(
    stack: &mut [OpenElement],
    document: &mut Option<XmlDocument>,
    name: String,
    value: XmlValue,
) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.element.insert(name, value),
        None if document.is_some() => {
            return Err(PostsError::Parse(format!(
                "second root element <{name}> after the document root"
            )))
        }
        None => {
            *document = Some(XmlDocument {
                root_name: name,
                root: value,
            })
        }
    }
    Ok(())
}

/// Reads and parses the XML file at `path`.
pub fn load_xml(path: &Path) -> Result<XmlDocument> {
    let content = fs::read_to_string(path).map_err(|source| PostsError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Read {} bytes from {}", content.len(), path.display());
    parse_xml(&content)
}

/// Flattens the `row` children of the `posts` root into raw records.
///
/// Documents with another root, or without any `row` element, are rejected
/// so a different or mis-shaped export can never replace the stored posts.
pub fn row_records(document: XmlDocument) -> Result<Vec<RawRecord>> {
    let XmlDocument { root_name, root } = document;
    if root_name != ROOT_ELEMENT {
        return Err(PostsError::Parse(format!(
            "expected <{ROOT_ELEMENT}> as the document root, found <{root_name}>"
        )));
    }
    let rows = match root {
        XmlValue::Element(mut element) => element.fields.remove(ROW_ELEMENT),
        _ => None,
    }
    .ok_or_else(|| {
        PostsError::Parse(format!("no <{ROW_ELEMENT}> elements under <{root_name}>"))
    })?;

    let records: Vec<RawRecord> = rows
        .into_sequence()
        .into_iter()
        .map(|row| match row {
            XmlValue::Element(element) => element.text_fields(),
            XmlValue::Text(text) => {
                if !text.is_empty() {
                    warn!("<{ROW_ELEMENT}> element carries only text, treating it as empty");
                }
                RawRecord::new()
            }
            XmlValue::List(_) => RawRecord::new(),
        })
        .collect();

    info!("Parsed {} rows from <{}>", records.len(), root_name);
    Ok(records)
}

/// Loads the export at `path` and returns its rows.
pub fn load_rows(path: &Path) -> Result<Vec<RawRecord>> {
    row_records(load_xml(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attributes_and_children_share_one_mapping() {
        let doc = parse_xml(
            r#"<posts><row Id="1" Score="3"><Title>Hello</Title></row></posts>"#,
        )
        .unwrap();
        assert_eq!(doc.root_name, "posts");

        let records = row_records(doc).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["Id"], "1");
        assert_eq!(records[0]["Score"], "3");
        assert_eq!(records[0]["Title"], "Hello");
    }

    #[test]
    fn test_single_row_becomes_one_element_sequence() {
        let doc = parse_xml(r#"<posts><row Id="7"/></posts>"#).unwrap();
        let XmlValue::Element(root) = &doc.root else {
            panic!("root should be an element");
        };
        assert!(matches!(root.get("row"), Some(XmlValue::Element(_))));

        let rows = root.get("row").cloned().unwrap().into_sequence();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_repeated_rows_are_collected_in_document_order() {
        let doc = parse_xml(
            r#"<?xml version="1.0" encoding="utf-8"?>
            <posts>
              <row Id="1" />
              <row Id="2" />
              <row Id="3" />
            </posts>"#,
        )
        .unwrap();
        let ids: Vec<String> = row_records(doc)
            .unwrap()
            .into_iter()
            .map(|r| r["Id"].clone())
            .collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_attribute_entities_are_unescaped_once() {
        let doc = parse_xml(r#"<posts><row Tags="&lt;rust&gt;&lt;xml&gt;" /></posts>"#).unwrap();
        let records = row_records(doc).unwrap();
        assert_eq!(records[0]["Tags"], "<rust><xml>");
    }

    #[test]
    fn test_mismatched_tags_are_a_parse_error() {
        let err = parse_xml("<posts><row></posts>").unwrap_err();
        assert!(matches!(err, PostsError::Parse(_)));
    }

    #[test]
    fn test_unclosed_root_is_a_parse_error() {
        let err = parse_xml("<posts><row Id=\"1\"/>").unwrap_err();
        assert!(matches!(err, PostsError::Parse(_)));
    }

    #[test]
    fn test_document_without_rows_is_rejected() {
        let doc = parse_xml("<posts><comment Id=\"1\"/></posts>").unwrap();
        let err = row_records(doc).unwrap_err();
        assert!(err.to_string().contains("no <row> elements under <posts>"));
    }

    #[test]
    fn test_rows_under_another_root_are_rejected() {
        let doc = parse_xml(r#"<comments><row Id="1" PostId="7"/></comments>"#).unwrap();
        let err = row_records(doc).unwrap_err();
        assert!(matches!(err, PostsError::Parse(_)));
        assert!(err.to_string().contains("found <comments>"));
    }

    #[test]
    fn test_missing_file_is_a_file_read_error() {
        let err = load_xml(Path::new("/no/such/dir/Posts.xml")).unwrap_err();
        assert!(matches!(err, PostsError::FileRead { .. }));
    }
}
