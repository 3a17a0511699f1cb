//! XML document trees
//!
//! This is the backend XML layer the rest of the crate builds on: a plain
//! element tree with ordered attributes, parsed with a quick-xml reader and
//! serialized with a quick-xml writer. Schema documents are read through it
//! and runtime nodes serialize into it.

use crate::error::{Error, Result};
use crate::namespaces::NamespaceContext;
use indexmap::IndexMap;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// XML Element in the document tree
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Element name as written, including any prefix
    pub name: String,
    /// Element attributes, in document (or insertion) order
    pub attributes: IndexMap<String, String>,
    /// Text content (if any)
    pub text: Option<String>,
    /// Child elements
    pub children: Vec<Element>,
    /// Namespace declarations in scope for this element
    pub namespaces: NamespaceContext,
}

impl Element {
    /// Create a new element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: IndexMap::new(),
            text: None,
            children: Vec::new(),
            namespaces: NamespaceContext::new(),
        }
    }

    /// Get the local name of the element
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map(|(_, local)| local)
            .unwrap_or(&self.name)
    }

    /// Get the prefix of the element, if any
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Get an attribute value by name
    pub fn get_attribute(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.attributes.get(name) {
            return Some(value);
        }
        // Fall back to the local part of prefixed attribute names
        self.attributes
            .iter()
            .find(|(key, _)| key.split_once(':').map(|(_, local)| local) == Some(name))
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute value, keeping the position of an existing one
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    /// Add a child element
    pub fn add_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Set text content
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    /// Find child elements by local name
    pub fn find_children(&self, local_name: &str) -> Vec<&Element> {
        self.children
            .iter()
            .filter(|e| e.local_name() == local_name)
            .collect()
    }

    /// Concatenated text of the first child with the given local name
    pub fn child_text(&self, local_name: &str) -> Option<&str> {
        self.children
            .iter()
            .find(|e| e.local_name() == local_name)
            .and_then(|e| e.text.as_deref())
    }

    /// Serialize this element as a standalone XML string
    pub fn to_xml_string(&self, options: &WriteOptions) -> Result<String> {
        let bytes = write_tree(self, options)?;
        String::from_utf8(bytes).map_err(|e| Error::Xml(format!("output is not UTF-8: {}", e)))
    }
}

/// Formatting options owned by the serializer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Indent nested elements on their own lines
    pub pretty: bool,
    /// Spaces per nesting level when `pretty` is set
    pub indent: usize,
    /// Emit an `<?xml version="1.0" encoding="UTF-8"?>` declaration
    pub declaration: bool,
    /// Content of a `<!DOCTYPE ...>` declaration, if any
    pub doctype: Option<String>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            pretty: false,
            indent: 2,
            declaration: false,
            doctype: None,
        }
    }
}

impl WriteOptions {
    /// Compact output without a declaration
    pub fn compact() -> Self {
        Self::default()
    }

    /// Indented output with an XML declaration
    pub fn pretty() -> Self {
        Self {
            pretty: true,
            declaration: true,
            ..Self::default()
        }
    }

    /// Set whether to emit the XML declaration
    pub fn with_declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }

    /// Set the indentation width
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Set the doctype content
    pub fn with_doctype(mut self, doctype: impl Into<String>) -> Self {
        self.doctype = Some(doctype.into());
        self
    }
}

fn xml_error(e: quick_xml::Error) -> Error {
    Error::Xml(e.to_string())
}

fn write_tree(root: &Element, options: &WriteOptions) -> Result<Vec<u8>> {
    let mut writer = if options.pretty {
        Writer::new_with_indent(Vec::new(), b' ', options.indent)
    } else {
        Writer::new(Vec::new())
    };

    if options.declaration {
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_error)?;
    }

    if let Some(ref doctype) = options.doctype {
        writer
            .write_event(Event::DocType(BytesText::from_escaped(doctype.as_str())))
            .map_err(xml_error)?;
    }

    write_element(&mut writer, root)?;

    let mut bytes = writer.into_inner();
    if options.pretty {
        bytes.push(b'\n');
    }
    Ok(bytes)
}

fn write_element(writer: &mut Writer<Vec<u8>>, element: &Element) -> Result<()> {
    let mut start = BytesStart::new(element.name.as_str());
    for (key, value) in &element.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if element.children.is_empty() && element.text.is_none() {
        writer.write_event(Event::Empty(start)).map_err(xml_error)?;
        return Ok(());
    }

    writer.write_event(Event::Start(start)).map_err(xml_error)?;

    if let Some(ref text) = element.text {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_error)?;
    }

    for child in &element.children {
        write_element(writer, child)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new(element.name.as_str())))
        .map_err(xml_error)?;

    Ok(())
}

/// XML Document representation
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Root element of the document
    pub root: Option<Element>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self { root: None }
    }

    /// Parse an XML document from a string
    pub fn from_string(xml: &str) -> Result<Self> {
        Self::parse(xml.as_bytes())
    }

    /// Parse an XML document from bytes
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);

        let mut doc = Document::new();
        let mut element_stack: Vec<Element> = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => {
                    let element = Self::parse_element(&e, element_stack.last())?;
                    element_stack.push(element);
                }
                Ok(Event::End(_)) => {
                    if let Some(current) = element_stack.pop() {
                        Self::attach(&mut doc, &mut element_stack, current)?;
                    }
                }
                Ok(Event::Empty(e)) => {
                    let element = Self::parse_element(&e, element_stack.last())?;
                    Self::attach(&mut doc, &mut element_stack, element)?;
                }
                Ok(Event::Text(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = e
                            .unescape()
                            .map_err(|e| Error::Xml(format!("failed to unescape text: {}", e)))?;
                        Self::append_text(current, &text);
                    }
                }
                Ok(Event::CData(e)) => {
                    if let Some(current) = element_stack.last_mut() {
                        let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                        Self::append_text(current, &text);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::Xml(format!(
                        "error parsing XML at position {}: {}",
                        reader.buffer_position(),
                        e
                    )))
                }
                _ => {} // Comments, processing instructions, declarations
            }
            buf.clear();
        }

        if !element_stack.is_empty() {
            return Err(Error::Xml("unexpected end of document".to_string()));
        }

        Ok(doc)
    }

    fn attach(doc: &mut Document, stack: &mut [Element], element: Element) -> Result<()> {
        if let Some(parent) = stack.last_mut() {
            parent.add_child(element);
        } else if doc.root.is_some() {
            return Err(Error::Xml("document has more than one root element".to_string()));
        } else {
            doc.root = Some(element);
        }
        Ok(())
    }

    /// Whitespace-only runs are indentation and dropped; other text is kept verbatim
    fn append_text(element: &mut Element, text: &str) {
        if text.trim().is_empty() {
            return;
        }
        match element.text {
            Some(ref mut existing) => existing.push_str(text),
            None => element.text = Some(text.to_string()),
        }
    }

    /// Parse element from BytesStart event
    fn parse_element(start: &BytesStart, parent: Option<&Element>) -> Result<Element> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| Error::Xml(format!("invalid element name: {}", e)))?
            .to_string();

        let mut element = Element::new(name);

        for attr_result in start.attributes() {
            let attr = attr_result
                .map_err(|e| Error::Xml(format!("failed to parse attribute: {}", e)))?;

            let attr_name = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| Error::Xml(format!("invalid attribute name: {}", e)))?
                .to_string();

            let attr_value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(format!("failed to unescape attribute value: {}", e)))?
                .to_string();

            if attr_name == "xmlns" {
                element.namespaces.set_default_namespace(attr_value);
            } else if let Some(prefix) = attr_name.strip_prefix("xmlns:") {
                element.namespaces.add_prefix(prefix, attr_value);
            } else {
                element.attributes.insert(attr_name, attr_value);
            }
        }

        if let Some(parent) = parent {
            element.namespaces.inherit(&parent.namespaces);
        }

        Ok(element)
    }

    /// Get the root element
    pub fn root(&self) -> Option<&Element> {
        self.root.as_ref()
    }

    /// Serialize the document
    pub fn to_xml_string(&self, options: &WriteOptions) -> Result<String> {
        match self.root {
            Some(ref root) => root.to_xml_string(options),
            None => Err(Error::Xml("document has no root element".to_string())),
        }
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
