//! Output side of the pipeline: stripping text from the tree, placing the
//! removed runs, and writing the cleaned SVG and the Typst script.

mod json;
mod options;
mod placement;
mod result;
mod strip;
mod svg;
mod typst;

pub use json::{to_json, JsonFormat};
pub use options::{FontFamilyMode, RenderOptions, TextMode, DEFAULT_FUNCTION_NAME};
pub use placement::{build_figure, frame_rect, place_run, place_runs, CoordinateConvention};
pub use result::{SplitResult, SplitStats};
pub use strip::{strip_text, StripStats};
pub use svg::{to_svg_bytes, to_svg_string};
pub use typst::{escape_markup, to_typst, TypstWriter};
