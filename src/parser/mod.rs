//! SVG reading and classification.

mod classifier;
mod options;
mod svg_parser;

pub use classifier::{
    classify_element, Classification, Classifier, ClassifyStats, ElementClass, StripPlan,
};
pub use options::{ErrorMode, ParseOptions};
pub use svg_parser::{read_document, SvgParser};
