//! Error types for typsvg library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for typsvg operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while splitting an SVG figure.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input path does not resolve to a readable file.
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// The data is neither SVG nor gzip-compressed SVG.
    #[error("Unknown file format: not an SVG document")]
    UnknownFormat,

    /// XML parse failure.
    #[error("Malformed SVG document: {0}")]
    MalformedDocument(String),

    /// The root element defines no width/height and no viewBox.
    #[error("SVG root has no width/height or viewBox attribute")]
    MissingViewport,

    /// A transform list names a function outside the supported set.
    #[error("Unsupported transform function: {0}")]
    UnsupportedTransform(String),

    /// A transform list has bad syntax or arguments.
    #[error("Malformed transform: {0}")]
    MalformedTransform(String),

    /// The figure frame has no area, e.g. a figure with no graphics.
    #[error("Degenerate figure geometry ({width} x {height})")]
    DegenerateGeometry {
        /// Frame width in canvas pixels
        width: f64,
        /// Frame height in canvas pixels
        height: f64,
    },

    /// An element the classifier cannot categorize. Non-fatal: reported
    /// as a diagnostic and treated as graphics.
    #[error("Unsupported element: <{0}>")]
    UnsupportedElement(String),

    /// Error while producing an output artifact.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether this error only describes a diagnostic and never aborts
    /// the pipeline.
    pub fn is_diagnostic(&self) -> bool {
        matches!(self, Error::UnsupportedElement(_))
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        match err {
            quick_xml::Error::Io(e) => Error::Io(io::Error::new(e.kind(), e.to_string())),
            _ => Error::MalformedDocument(err.to_string()),
        }
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::MalformedDocument(err.to_string())
    }
}
