//! SVG format detection and validation.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// SVG container information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvgFormat {
    /// Whether the document is gzip-compressed (`.svgz`)
    pub compressed: bool,
}

impl std::fmt::Display for SvgFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.compressed {
            write!(f, "SVGZ")
        } else {
            write!(f, "SVG")
        }
    }
}

/// gzip magic bytes.
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
/// UTF-8 byte order mark.
const UTF8_BOM: &[u8] = &[0xef, 0xbb, 0xbf];
/// How many bytes of the head are inspected.
const SNIFF_LEN: usize = 4096;

/// Detect SVG format from a file path.
///
/// # Example
/// ```no_run
/// use typsvg::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("figure.svg").unwrap();
/// println!("{}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<SvgFormat> {
    let file = File::open(path)?;
    let mut head = Vec::with_capacity(SNIFF_LEN);
    BufReader::new(file)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut head)?;
    detect_format_from_bytes(&head)
}

/// Detect SVG format from the leading bytes of a document.
///
/// Plain documents must start (after an optional BOM and whitespace) with
/// markup, and an `<svg` tag must appear in the inspected head. Compressed
/// documents are recognized by the gzip magic alone.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<SvgFormat> {
    if data.starts_with(GZIP_MAGIC) {
        return Ok(SvgFormat { compressed: true });
    }

    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let head = &data[..data.len().min(SNIFF_LEN)];
    let text = String::from_utf8_lossy(head);
    let trimmed = text.trim_start();

    if !trimmed.starts_with('<') {
        return Err(Error::UnknownFormat);
    }
    if !contains_svg_tag(trimmed) {
        return Err(Error::UnknownFormat);
    }

    Ok(SvgFormat { compressed: false })
}

/// Look for `<svg` or a prefixed `<x:svg` start tag.
fn contains_svg_tag(text: &str) -> bool {
    text.match_indices('<').any(|(pos, _)| {
        let rest = &text[pos + 1..];
        let name_end = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        name == "svg" || name.ends_with(":svg")
    })
}

/// Check if a file looks like an SVG document.
pub fn is_svg<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

/// Check if bytes look like an SVG document.
pub fn is_svg_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}
