//! The split figure: geometry summary plus placements.

use super::PlacementRecord;
use crate::geometry::{BoundingBox, Viewport, PX_TO_PT};
use serde::{Deserialize, Serialize};

/// Natural size of the figure and its aspect-preserving rescaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FigureSize {
    /// Natural width in points
    pub width_pt: f64,
    /// Natural height in points
    pub height_pt: f64,
}

impl FigureSize {
    pub fn new(width_pt: f64, height_pt: f64) -> Self {
        Self {
            width_pt,
            height_pt,
        }
    }

    /// Size of a canvas-pixel frame in points.
    pub fn from_frame(frame: &BoundingBox) -> Self {
        Self::new(frame.width() * PX_TO_PT, frame.height() * PX_TO_PT)
    }

    /// Height divided by width.
    pub fn aspect_ratio(&self) -> f64 {
        self.height_pt / self.width_pt
    }

    /// Resolve a requested size.
    ///
    /// With one dimension the other follows the aspect ratio; with none the
    /// natural size is used; with both they are taken as given.
    pub fn resolve(&self, width: Option<f64>, height: Option<f64>) -> (f64, f64) {
        match (width, height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, w * self.height_pt / self.width_pt),
            (None, Some(h)) => (h * self.width_pt / self.height_pt, h),
            (None, None) => (self.width_pt, self.height_pt),
        }
    }
}

/// Which rectangle the companion figure occupies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frame {
    /// Bounding box of the graphics
    #[default]
    Graphics,
    /// The document viewport (page)
    Viewport,
}

/// Everything the companion script needs about one figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    /// Root coordinate system
    pub viewport: Viewport,

    /// Graphics bounds in canvas pixels
    pub bbox: BoundingBox,

    /// Frame rectangle in canvas pixels
    pub frame: BoundingBox,

    /// Natural size of the frame
    pub size: FigureSize,

    /// Placements in document order
    pub placements: Vec<PlacementRecord>,
}

impl Figure {
    /// Concatenated text of all placements.
    pub fn plain_text(&self) -> String {
        self.placements.iter().map(|p| p.text.as_str()).collect()
    }

    /// Number of placement statements (lines) in the script.
    pub fn line_count(&self) -> usize {
        self.placements.iter().filter(|p| !p.continues_line).count()
    }
}
