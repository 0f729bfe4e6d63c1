//! Placement records: one positioned text instruction per text run.

use super::{Color, FontStyle, TextAnchor};
use crate::geometry::Point;
use serde::{Deserialize, Serialize};

/// Horizontal alignment of a placed label relative to its anchor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

impl Alignment {
    /// Typst alignment value.
    pub fn token(&self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
        }
    }
}

impl From<TextAnchor> for Alignment {
    fn from(anchor: TextAnchor) -> Self {
        match anchor {
            TextAnchor::Start => Alignment::Left,
            TextAnchor::Middle => Alignment::Center,
            TextAnchor::End => Alignment::Right,
        }
    }
}

/// Font attributes forwarded to the target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    /// Size in points, transform scale included
    pub size_pt: f64,

    /// Family names exactly as found in the source
    pub family: Vec<String>,

    pub weight: u16,

    pub style: FontStyle,

    pub fill: Option<Color>,
}

/// Absolute instruction for re-rendering one text run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementRecord {
    /// Line anchor in points, relative to the figure frame, in the target
    /// coordinate convention
    pub position: Point,

    /// Rotation in degrees, target convention
    pub rotation_deg: f64,

    pub alignment: Alignment,

    pub font: FontSpec,

    /// Horizontal stretch relative to the font size (1.0 = none)
    pub stretch_x: f64,

    /// Local dx/dy of a flowing run, points
    pub offset: Point,

    /// Baseline shift in points, positive raises
    pub baseline_shift: f64,

    /// Literal text
    pub text: String,

    /// Flows on after the previous record instead of starting a line
    pub continues_line: bool,
}

impl PlacementRecord {
    pub fn is_rotated(&self) -> bool {
        self.rotation_deg.abs() > 1e-9
    }
}
