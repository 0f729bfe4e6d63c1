//! SVG document reader using quick-xml.

use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::detect::detect_format_from_bytes;
use crate::error::{Error, Result};
use crate::model::{Element, Node, SvgDocument};

use super::classifier::{Classification, Classifier};
use super::options::ParseOptions;

/// Elements whose whitespace-only character data is significant.
const TEXT_CONTENT: &[&str] = &["text", "flowRoot", "title", "desc", "style", "script"];

/// SVG document parser.
pub struct SvgParser {
    doc: SvgDocument,
    options: ParseOptions,
}

impl SvgParser {
    /// Open an SVG or SVGZ file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open an SVG or SVGZ file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::InputNotFound(path.to_path_buf()));
        }
        let data = std::fs::read(path)?;
        log::debug!("Read {} bytes from {}", data.len(), path.display());
        Self::from_bytes_with_options(&data, options)
    }

    /// Parse an SVG from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Parse an SVG from bytes with custom options.
    pub fn from_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Self> {
        let format = detect_format_from_bytes(data)?;

        let doc = if format.compressed {
            let mut xml = Vec::new();
            GzDecoder::new(data).read_to_end(&mut xml)?;
            if detect_format_from_bytes(&xml)?.compressed {
                return Err(Error::UnknownFormat);
            }
            let mut doc = read_document(&xml)?;
            doc.compressed = true;
            doc
        } else {
            read_document(data)?
        };

        log::debug!("Parsed {} document with {} elements", format, doc.element_count());
        Ok(Self { doc, options })
    }

    /// Parse an SVG from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, ParseOptions::default())
    }

    /// Parse an SVG from a reader with custom options.
    pub fn from_reader_with_options<R: Read>(mut reader: R, options: ParseOptions) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes_with_options(&data, options)
    }

    /// The parsed tree.
    pub fn document(&self) -> &SvgDocument {
        &self.doc
    }

    /// Take ownership of the parsed tree.
    pub fn into_document(self) -> SvgDocument {
        self.doc
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Classify the document without modifying it.
    pub fn classify(&self) -> Result<Classification> {
        Classifier::new(&self.doc, &self.options).classify()
    }
}

/// Read an uncompressed XML document into an owned tree.
///
/// Whitespace-only character data is dropped except inside text content
/// and under `xml:space="preserve"`.
pub fn read_document(data: &[u8]) -> Result<SvgDocument> {
    let data = data.strip_prefix(&[0xef, 0xbb, 0xbf]).unwrap_or(data);
    let text = std::str::from_utf8(data)
        .map_err(|e| Error::MalformedDocument(format!("invalid UTF-8: {}", e)))?;

    let mut reader = Reader::from_str(text);
    let mut builder = TreeBuilder::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => builder.open(element_from(&e)?),
            Event::Empty(e) => builder.push(Node::Element(element_from(&e)?))?,
            Event::End(_) => builder.close()?,
            Event::Text(e) => {
                let text = e.unescape()?.into_owned();
                builder.push_text(text)?;
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                builder.push(Node::CData(text))?;
            }
            Event::Comment(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                builder.push(Node::Comment(text))?;
            }
            Event::PI(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                builder.push(Node::ProcessingInstruction(text))?;
            }
            Event::DocType(e) => {
                let text = String::from_utf8_lossy(&e).into_owned();
                builder.push(Node::DocType(text))?;
            }
            Event::Decl(_) => {}
            Event::Eof => break,
        }
    }

    builder.finish()
}

fn element_from(start: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        element.attributes.insert(key, value);
    }
    Ok(element)
}

#[derive(Default)]
struct TreeBuilder {
    prolog: Vec<Node>,
    stack: Vec<(Element, bool)>,
    root: Option<Element>,
}

impl TreeBuilder {
    fn open(&mut self, element: Element) {
        let inherited = self.stack.last().map_or(false, |(_, keep)| *keep);
        let keep = inherited
            || element.svg_name().map_or(false, |n| TEXT_CONTENT.contains(&n))
            || element.attr("xml:space") == Some("preserve");
        self.stack.push((element, keep));
    }

    fn close(&mut self) -> Result<()> {
        let (element, _) = self
            .stack
            .pop()
            .ok_or_else(|| Error::MalformedDocument("unexpected end tag".to_string()))?;
        self.push(Node::Element(element))
    }

    fn push_text(&mut self, text: String) -> Result<()> {
        match self.stack.last() {
            None => Ok(()),
            Some((_, keep)) if !keep && text.trim().is_empty() => Ok(()),
            Some(_) => self.push(Node::Text(text)),
        }
    }

    fn push(&mut self, node: Node) -> Result<()> {
        if let Some((parent, _)) = self.stack.last_mut() {
            parent.children.push(node);
            return Ok(());
        }
        match node {
            Node::Element(element) => {
                if self.root.is_some() {
                    return Err(Error::MalformedDocument(
                        "more than one root element".to_string(),
                    ));
                }
                self.root = Some(element);
            }
            Node::Text(_) => {}
            other if self.root.is_none() => self.prolog.push(other),
            other => log::debug!("Dropping trailing {:?}", other),
        }
        Ok(())
    }

    fn finish(self) -> Result<SvgDocument> {
        if let Some((open, _)) = self.stack.last() {
            return Err(Error::MalformedDocument(format!(
                "unclosed element <{}>",
                open.name
            )));
        }
        let root = self
            .root
            .ok_or_else(|| Error::MalformedDocument("no root element".to_string()))?;
        if root.local_name() != "svg" {
            return Err(Error::MalformedDocument(format!(
                "root element is <{}>, expected <svg>",
                root.name
            )));
        }
        Ok(SvgDocument {
            prolog: self.prolog,
            root,
            compressed: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const SIMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!-- Created with Inkscape -->
<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50" viewBox="0 0 100 50">
  <g id="layer1" transform="translate(1,2)">
    <rect x="0" y="0" width="10" height="10"/>
    <text x="5" y="5">Hello <tspan>A &amp; B</tspan></text>
  </g>
</svg>
"#;

    #[test]
    fn test_read_simple_document() {
        let doc = read_document(SIMPLE.as_bytes()).unwrap();
        assert_eq!(doc.root.name, "svg");
        assert_eq!(doc.prolog, vec![Node::Comment(" Created with Inkscape ".into())]);

        let g = doc.element_at(&[0]).unwrap();
        assert_eq!(g.attr("id"), Some("layer1"));
        // Indentation between graphics elements is dropped
        assert_eq!(g.children.len(), 2);

        let text = doc.element_at(&[0, 1]).unwrap();
        assert_eq!(text.text_content(), "Hello A & B");
    }

    #[test]
    fn test_attribute_order_preserved() {
        let doc = read_document(SIMPLE.as_bytes()).unwrap();
        let keys: Vec<&str> = doc.root.attributes.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["xmlns", "width", "height", "viewBox"]);
    }

    #[test]
    fn test_whitespace_kept_inside_text() {
        let xml = r#"<svg><text><tspan>a</tspan> <tspan>b</tspan></text></svg>"#;
        let doc = read_document(xml.as_bytes()).unwrap();
        let text = doc.element_at(&[0]).unwrap();
        assert_eq!(text.children.len(), 3);
        assert_eq!(text.text_content(), "a b");
    }

    #[test]
    fn test_unclosed_element() {
        let err = read_document(b"<svg><g>").unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }

    #[test]
    fn test_mismatched_end_tag() {
        let err = read_document(b"<svg><g></svg>").unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }

    #[test]
    fn test_non_svg_root() {
        let err = read_document(b"<html></html>").unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }

    #[test]
    fn test_compressed_input() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(SIMPLE.as_bytes()).unwrap();
        let data = encoder.finish().unwrap();

        let parser = SvgParser::from_bytes(&data).unwrap();
        assert!(parser.document().compressed);
        assert_eq!(parser.document().element_count(), 5);
    }

    #[test]
    fn test_not_svg() {
        assert!(matches!(
            SvgParser::from_bytes(b"plain text").err(),
            Some(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = SvgParser::open("/nonexistent/figure.svg").err().unwrap();
        assert!(matches!(err, Error::InputNotFound(_)));
    }
}
