//! Text runs extracted from text-bearing elements.

use super::ResolvedStyle;
use crate::geometry::{Point, Transform};
use serde::{Deserialize, Serialize};

/// A contiguous span of text sharing one resolved style.
///
/// Runs are produced in document order. A run either starts a new line
/// at an absolute anchor (`starts_line`) or flows on after the previous
/// run of the same line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// Index of the owning text element among all text elements
    pub node: usize,

    /// Line index within the owning element
    pub line: usize,

    /// Whether this run begins a line at `anchor`
    pub starts_line: bool,

    /// Effective transform from the text element's user space to canvas
    /// pixels
    pub transform: Transform,

    /// Line anchor in the text element's user space, dx/dy included
    pub anchor: Point,

    /// `dx` of this run and the `dy` accumulated along the line so far,
    /// user units
    pub offset: Point,

    /// Baseline shift in user units, positive raises
    pub baseline_shift: f64,

    pub style: ResolvedStyle,

    /// Whitespace-normalized text
    pub text: String,
}

impl TextRun {
    /// Anchor mapped to canvas pixels.
    pub fn canvas_anchor(&self) -> Point {
        self.transform.apply(self.anchor)
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Collapse whitespace the way SVG does for `xml:space="default"`:
/// newlines are removed, tabs become spaces and runs of spaces collapse.
/// With `preserve`, newlines and tabs only become spaces.
pub fn normalize_whitespace(text: &str, preserve: bool) -> String {
    if preserve {
        return text
            .chars()
            .map(|c| if matches!(c, '\n' | '\r' | '\t') { ' ' } else { c })
            .collect();
    }

    let mut out = String::with_capacity(text.len());
    let mut last_space = false;
    for c in text.chars() {
        match c {
            '\n' | '\r' => {}
            ' ' | '\t' => {
                if !last_space {
                    out.push(' ');
                }
                last_space = true;
            }
            _ => {
                out.push(c);
                last_space = false;
            }
        }
    }
    out
}
