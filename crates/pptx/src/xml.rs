//! Minimal element tree over quick-xml events.
//!
//! Element and attribute names are stored without their namespace prefix,
//! so `p:sp` is `sp` and `r:embed` is `embed`. Text is kept verbatim since
//! whitespace inside `a:t` is significant.

use deck_core::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// An XML element with its attributes, children and direct text.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub name: String,
    attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    text: String,
}

impl Element {
    /// Parse a document and return its root element.
    pub fn parse(xml: &str) -> Result<Element> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<Element> = Vec::new();
        let mut root: Option<Element> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => stack.push(Element::from_start(e)),
                Ok(Event::Empty(ref e)) => {
                    let element = Element::from_start(e);
                    attach(&mut stack, &mut root, element);
                }
                Ok(Event::End(_)) => {
                    if let Some(element) = stack.pop() {
                        attach(&mut stack, &mut root, element);
                    }
                }
                Ok(Event::Text(ref e)) => {
                    if let Some(current) = stack.last_mut() {
                        let text = e.unescape().map_err(|err| {
                            Error::XmlError(format!(
                                "Bad text at position {}: {}",
                                reader.buffer_position(),
                                err
                            ))
                        })?;
                        current.text.push_str(&text);
                    }
                }
                Ok(Event::CData(ref e)) => {
                    if let Some(current) = stack.last_mut() {
                        current.text.push_str(&String::from_utf8_lossy(e));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::XmlError(format!(
                        "Error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                _ => {}
            }
        }

        if !stack.is_empty() {
            return Err(Error::XmlError("Unexpected end of document".to_string()));
        }
        root.ok_or_else(|| Error::XmlError("Document has no root element".to_string()))
    }

    fn from_start(e: &BytesStart) -> Self {
        let name = String::from_utf8_lossy(local_name(e.name().as_ref())).to_string();
        let attributes = e
            .attributes()
            .flatten()
            .map(|attr| {
                let key = String::from_utf8_lossy(local_name(attr.key.as_ref())).to_string();
                let value = attr
                    .unescape_value()
                    .map(|v| v.to_string())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string());
                (key, value)
            })
            .collect();
        Self {
            name,
            attributes,
            children: Vec::new(),
            text: String::new(),
        }
    }

    /// Attribute value by local name.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Attribute parsed as an integer. Unparseable values count as absent.
    pub fn attr_i64(&self, key: &str) -> Option<i64> {
        self.attr(key).and_then(|v| v.trim().parse().ok())
    }

    /// First child with the given local name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given local name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follow a chain of child names.
    pub fn path(&self, names: &[&str]) -> Option<&Element> {
        names.iter().try_fold(self, |node, name| node.child(name))
    }

    /// Text directly inside this element.
    pub fn text(&self) -> &str {
        &self.text
    }
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

/// Extract the local name from a potentially namespaced XML name.
pub fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_name() {
        assert_eq!(local_name(b"p:sp"), b"sp");
        assert_eq!(local_name(b"a:t"), b"t");
        assert_eq!(local_name(b"sp"), b"sp");
    }

    #[test]
    fn test_parse_tree_strips_prefixes() {
        let xml = r#"<?xml version="1.0"?>
            <p:sld xmlns:p="urn:p" xmlns:a="urn:a" xmlns:r="urn:r">
              <p:pic><p:blipFill><a:blip r:embed="rId4"/></p:blipFill></p:pic>
            </p:sld>"#;
        let root = Element::parse(xml).unwrap();
        assert_eq!(root.name, "sld");
        let blip = root.path(&["pic", "blipFill", "blip"]).unwrap();
        assert_eq!(blip.attr("embed"), Some("rId4"));
    }

    #[test]
    fn test_text_keeps_whitespace_and_entities() {
        let root = Element::parse("<a:r><a:t> Tom &amp; Jerry </a:t></a:r>").unwrap();
        assert_eq!(root.child("t").unwrap().text(), " Tom & Jerry ");
    }

    #[test]
    fn test_children_in_document_order() {
        let root = Element::parse("<p><r>1</r><br/><r>2</r></p>").unwrap();
        let names: Vec<&str> = root.children.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["r", "br", "r"]);
        assert_eq!(root.children_named("r").count(), 2);
    }

    #[test]
    fn test_numeric_attributes() {
        let root = Element::parse(r#"<a:off x="914400" y="oops"/>"#).unwrap();
        assert_eq!(root.attr_i64("x"), Some(914_400));
        assert_eq!(root.attr_i64("y"), None);
        assert_eq!(root.attr_i64("z"), None);
    }

    #[test]
    fn test_unclosed_document_is_an_error() {
        assert!(Element::parse("<a><b></b>").is_err());
        assert!(Element::parse("").is_err());
    }
}
