//! Document model types.
//!
//! The owned SVG tree that the pipeline parses, classifies and strips, and
//! the intermediate records (text runs, placements, figure) that bridge
//! classification and script emission.

mod document;
mod figure;
mod placement;
mod style;
mod text;

pub use document::{Element, Node, NodePath, SvgDocument};
pub use figure::{Figure, FigureSize, Frame};
pub use placement::{Alignment, FontSpec, PlacementRecord};
pub use style::{
    baseline_shift, declarations, is_display_none, parse_style_attribute, property, Color,
    FontStyle, ResolvedStyle, TextAnchor, DEFAULT_FONT_SIZE,
};
pub use text::{normalize_whitespace, TextRun};
