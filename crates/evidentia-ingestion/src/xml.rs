//! Minimal owned XML element tree built on quick-xml events.
//!
//! Record parsers work on one article subtree at a time, so a batch is
//! first read into this tree (syntax errors fail the whole batch) and then
//! walked per article (missing elements only affect that article).
//! Element and attribute names are stored without namespace prefixes.

use evidentia_common::EvidentiaError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Deepest element nesting accepted. PubMed and Atom documents stay well under 20.
pub const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Direct child elements.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// Direct child elements with the given name.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlElement> + 'a {
        self.elements().filter(move |e| e.name == name)
    }

    /// First direct child with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.name == name)
    }

    /// All descendants (not self) with the given name, in document order.
    pub fn descendants<'a>(&'a self, name: &str) -> Vec<&'a XmlElement> {
        let mut out = Vec::new();
        collect_descendants(self, name, &mut out);
        out
    }

    /// First descendant with the given name.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        self.elements().find_map(|e| {
            if e.name == name {
                Some(e)
            } else {
                e.find(name)
            }
        })
    }

    /// First match for `A/B/C`: any descendant `A`, then direct children `B`, `C`.
    pub fn find_path(&self, path: &str) -> Option<&XmlElement> {
        let mut steps = path.split('/');
        let head = steps.next()?;
        let rest: Vec<&str> = steps.collect();
        self.descendants(head).into_iter().find_map(|start| {
            rest.iter().try_fold(start, |node, step| node.child(step))
        })
    }

    /// Concatenated text of this element and its descendants, with runs of
    /// whitespace collapsed to single spaces.
    pub fn text(&self) -> String {
        let mut raw = String::new();
        collect_text(self, &mut raw);
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Text of the first direct child with the given name, if non-empty.
    pub fn child_text(&self, name: &str) -> Option<String> {
        self.child(name).map(XmlElement::text).filter(|t| !t.is_empty())
    }
}

fn collect_descendants<'a>(el: &'a XmlElement, name: &str, out: &mut Vec<&'a XmlElement>) {
    for child in el.elements() {
        if child.name == name {
            out.push(child);
        }
        collect_descendants(child, name, out);
    }
}

fn collect_text(el: &XmlElement, out: &mut String) {
    for node in &el.children {
        match node {
            XmlNode::Text(t) => out.push_str(t),
            XmlNode::Element(e) => collect_text(e, out),
        }
    }
}

fn element_from(start: &BytesStart) -> Result<XmlElement, EvidentiaError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| EvidentiaError::Xml(format!("bad attribute in <{name}>: {e}")))?;
        let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| EvidentiaError::Xml(format!("bad attribute value in <{name}>: {e}")))?
            .into_owned();
        attributes.push((key, value));
    }
    Ok(XmlElement { name, attributes, children: Vec::new() })
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    el: XmlElement,
) -> Result<(), EvidentiaError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(el));
        Ok(())
    } else if root.is_none() {
        *root = Some(el);
        Ok(())
    } else {
        Err(EvidentiaError::Xml(format!("second root element <{}>", el.name)))
    }
}

/// Parse a complete document and return its root element.
pub fn parse_document(xml: &str) -> Result<XmlElement, EvidentiaError> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(EvidentiaError::Xml(format!(
                        "nesting deeper than {MAX_DEPTH} elements"
                    )));
                }
                stack.push(element_from(e)?);
            }
            Ok(Event::Empty(ref e)) => {
                let el = element_from(e)?;
                attach(&mut stack, &mut root, el)?;
            }
            Ok(Event::End(_)) => {
                let el = stack
                    .pop()
                    .ok_or_else(|| EvidentiaError::Xml("unbalanced end tag".to_string()))?;
                attach(&mut stack, &mut root, el)?;
            }
            Ok(Event::Text(ref e)) => {
                if let Some(parent) = stack.last_mut() {
                    // Unknown entities are kept verbatim rather than failing the batch
                    let text = e
                        .unescape()
                        .map(|t| t.into_owned())
                        .unwrap_or_else(|_| String::from_utf8_lossy(e).into_owned());
                    parent.children.push(XmlNode::Text(text));
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(XmlNode::Text(String::from_utf8_lossy(e).into_owned()));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(EvidentiaError::Xml(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            // declarations, comments, processing instructions, doctype
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(EvidentiaError::Xml(format!("document ended inside <{}>", open.name)));
    }
    root.ok_or_else(|| EvidentiaError::Xml("document has no root element".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0"?>
<!DOCTYPE Set>
<Set>
  <Item kind="a">First <i>inline</i> text</Item>
  <Group>
    <Item kind="b">Second</Item>
    <Leaf/>
  </Group>
  <Journal><Title>Nature</Title></Journal>
</Set>"#;

    #[test]
    fn test_parse_and_navigate() {
        let root = parse_document(DOC).unwrap();
        assert_eq!(root.name, "Set");
        let items = root.descendants("Item");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].attr("kind"), Some("a"));
        assert_eq!(items[1].text(), "Second");
        assert!(root.find("Leaf").is_some());
        assert_eq!(root.children_named("Item").count(), 1);
    }

    #[test]
    fn test_mixed_content_text_is_joined() {
        let root = parse_document(DOC).unwrap();
        assert_eq!(root.find("Item").unwrap().text(), "First inline text");
    }

    #[test]
    fn test_find_path() {
        let root = parse_document(DOC).unwrap();
        assert_eq!(root.find_path("Journal/Title").unwrap().text(), "Nature");
        assert!(root.find_path("Group/Title").is_none());
    }

    #[test]
    fn test_namespace_prefixes_dropped() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
            <entry><arxiv:doi>10.1/x</arxiv:doi></entry></feed>"#;
        let root = parse_document(xml).unwrap();
        assert_eq!(root.find_path("entry/doi").unwrap().text(), "10.1/x");
    }

    #[test]
    fn test_entities_and_cdata() {
        let xml = "<a>Fish &amp; chips <![CDATA[<raw>]]></a>";
        let root = parse_document(xml).unwrap();
        assert_eq!(root.text(), "Fish & chips <raw>");
    }

    #[test]
    fn test_truncated_document_is_error() {
        let err = parse_document("<a><b>text</b>").unwrap_err();
        assert!(matches!(err, EvidentiaError::Xml(_)));
    }

    #[test]
    fn test_mismatched_tags_is_error() {
        assert!(parse_document("<a><b></a></b>").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let at_limit = "<a>".repeat(MAX_DEPTH) + &"</a>".repeat(MAX_DEPTH);
        assert!(parse_document(&at_limit).is_ok());

        let too_deep = "<a>".repeat(MAX_DEPTH + 1) + &"</a>".repeat(MAX_DEPTH + 1);
        let err = parse_document(&too_deep).unwrap_err();
        assert!(matches!(err, EvidentiaError::Xml(ref m) if m.contains("nesting")));
    }

    #[test]
    fn test_empty_input_is_error() {
        assert!(parse_document("").is_err());
        assert!(parse_document("   ").is_err());
    }
}
