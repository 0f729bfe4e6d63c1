//! # typsvg
//!
//! Split Inkscape SVG figures into graphics and a Typst text overlay.
//!
//! Each figure becomes a `<name>_clean.svg` with every text element
//! removed and a `<name>.typ` script that draws the cleaned SVG and places
//! the labels back on top, typeset with the host document's fonts.
//!
//! ## Quick Start
//!
//! ```no_run
//! use typsvg::{convert_file, ConvertOptions};
//!
//! fn main() -> typsvg::Result<()> {
//!     // Writes figure_clean.svg and figure.typ next to the input
//!     let result = convert_file("figure.svg", &ConvertOptions::default())?;
//!     println!("{} labels", result.stats.placements);
//!     Ok(())
//! }
//! ```
//!
//! In the Typst document:
//!
//! ```text
//! #import "figure.typ": diagram
//! #figure(diagram(width: 80%), caption: [...])
//! ```
//!
//! ## Features
//!
//! - **Exact placement**: nested transforms, viewBox scaling, rotation
//!   and text anchors are composed into absolute positions
//! - **Inkscape texture**: tspans, flowed text, `sodipodi:role="line"`
//!   and `.svgz` input
//! - **Safe output**: both files are written atomically
//! - **Batch mode**: several figures converted in parallel with Rayon

pub mod convert;
pub mod detect;
pub mod error;
pub mod geometry;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use convert::{convert_file, convert_files, ConvertOptions, ConvertResult, OutputPaths};
pub use detect::{detect_format_from_bytes, detect_format_from_path, is_svg, SvgFormat};
pub use error::{Error, Result};
pub use geometry::{BoundingBox, Point, Transform, Viewport};
pub use model::{Alignment, Figure, FigureSize, Frame, PlacementRecord, SvgDocument, TextRun};
pub use parser::{Classification, ErrorMode, ParseOptions, SvgParser};
pub use render::{
    FontFamilyMode, JsonFormat, RenderOptions, SplitResult, SplitStats, TextMode,
};

use std::path::{Path, PathBuf};

/// Split an SVG file in memory.
///
/// # Example
///
/// ```no_run
/// use typsvg::split_file;
///
/// let result = split_file("figure.svg").unwrap();
/// println!("{}", result.script);
/// ```
pub fn split_file<P: AsRef<Path>>(path: P) -> Result<SplitResult> {
    convert::split_file(path, &ConvertOptions::default())
}

/// Split an SVG file with custom options.
pub fn split_file_with_options<P: AsRef<Path>>(
    path: P,
    options: &ConvertOptions,
) -> Result<SplitResult> {
    convert::split_file(path, options)
}

/// Split SVG (or gzip-compressed SVG) bytes.
///
/// # Example
///
/// ```no_run
/// use typsvg::split_bytes;
///
/// let data = std::fs::read("figure.svg").unwrap();
/// let result = split_bytes(&data).unwrap();
/// let clean = result.clean_svg().unwrap();
/// ```
pub fn split_bytes(data: &[u8]) -> Result<SplitResult> {
    convert::split_bytes(data, &ConvertOptions::default())
}

/// Split bytes with custom options.
pub fn split_bytes_with_options(data: &[u8], options: &ConvertOptions) -> Result<SplitResult> {
    convert::split_bytes(data, options)
}

/// Extract the label text of an SVG file.
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    let parser = SvgParser::open(path)?;
    Ok(parser.classify()?.plain_text())
}

/// Builder for splitting figures.
///
/// # Example
///
/// ```no_run
/// use typsvg::{Frame, Typsvg};
///
/// let result = Typsvg::new()
///     .with_function_name("plot")
///     .with_frame(Frame::Viewport)
///     .lenient()
///     .convert("figure.svg")?;
/// # Ok::<(), typsvg::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Typsvg {
    options: ConvertOptions,
}

impl Typsvg {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Degrade unsupported transforms to identity instead of failing.
    pub fn lenient(mut self) -> Self {
        self.options.parse = self.options.parse.lenient();
        self
    }

    /// Replace the parsing options.
    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.options.parse = options;
        self
    }

    /// Replace the rendering options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.options.render = options;
        self
    }

    /// Name of the generated Typst function.
    pub fn with_function_name(mut self, name: impl Into<String>) -> Self {
        self.options.render = self.options.render.with_function_name(name);
        self
    }

    /// Rectangle the figure occupies.
    pub fn with_frame(mut self, frame: Frame) -> Self {
        self.options.render = self.options.render.with_frame(frame);
        self
    }

    /// Escape label text instead of passing it through as markup.
    pub fn literal(mut self) -> Self {
        self.options.render = self.options.render.literal();
        self
    }

    /// Forward font families to the script.
    pub fn keep_font_family(mut self) -> Self {
        self.options.render = self
            .options
            .render
            .with_font_family_mode(FontFamilyMode::PassThrough);
        self
    }

    /// Write outputs into a different directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options = self.options.with_output_dir(dir);
        self
    }

    /// The accumulated options.
    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Split a file in memory.
    pub fn split<P: AsRef<Path>>(&self, path: P) -> Result<SplitResult> {
        convert::split_file(path, &self.options)
    }

    /// Split bytes in memory.
    pub fn split_bytes(&self, data: &[u8]) -> Result<SplitResult> {
        convert::split_bytes(data, &self.options)
    }

    /// Split a file and write both outputs.
    pub fn convert<P: AsRef<Path>>(&self, path: P) -> Result<ConvertResult> {
        convert::convert_file(path, &self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIGURE: &[u8] = br#"<svg width="100" height="50">
  <path d="M 0,0 L 100,50"/>
  <text x="10" y="20" style="font-size:10px">a &lt; b</text>
</svg>"#;

    #[test]
    fn test_typsvg_builder() {
        let builder = Typsvg::new()
            .lenient()
            .literal()
            .keep_font_family()
            .with_function_name("plot")
            .with_frame(Frame::Viewport)
            .with_output_dir("out");

        let options = builder.options();
        assert!(options.parse.is_lenient());
        assert_eq!(options.render.text_mode, TextMode::Literal);
        assert_eq!(options.render.font_family_mode, FontFamilyMode::PassThrough);
        assert_eq!(options.render.function_name, "plot");
        assert_eq!(options.render.frame, Frame::Viewport);
        assert_eq!(options.output_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn test_split_bytes() {
        let result = split_bytes(FIGURE).unwrap();
        assert_eq!(result.plain_text(), "a < b");
        assert_eq!(result.stats.text_removed, 1);
        assert!(result.script.starts_with("// Generated by typsvg\n"));
        assert!(result.script.contains("#let diagram("));

        let clean = String::from_utf8(result.clean_svg().unwrap()).unwrap();
        assert!(!clean.contains("<text"));
        assert!(clean.contains("<path"));
    }

    #[test]
    fn test_builder_literal_escapes() {
        let result = Typsvg::new().literal().split_bytes(FIGURE).unwrap();
        assert!(result.script.contains(r"a \< b"));
    }

    #[test]
    fn test_split_bytes_empty_data() {
        let data: [u8; 0] = [];
        assert!(split_bytes(&data).is_err());
    }

    #[test]
    fn test_split_bytes_unknown_format() {
        let data = b"<!DOCTYPE html><html></html>";
        assert!(matches!(split_bytes(data), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_no_graphics_is_degenerate() {
        let data = br#"<svg width="10" height="10"><text x="1" y="1">only</text></svg>"#;
        assert!(matches!(
            split_bytes(data),
            Err(Error::DegenerateGeometry { .. })
        ));

        let options = ConvertOptions::new()
            .with_render_options(RenderOptions::new().with_frame(Frame::Viewport));
        let result = split_bytes_with_options(data, &options).unwrap();
        assert_eq!(result.figure.placements.len(), 1);
    }
}
