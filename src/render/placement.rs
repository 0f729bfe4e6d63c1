//! Placement emitter: text runs to absolute placement records.

use crate::error::{Error, Result};
use crate::geometry::{BoundingBox, Point, PX_TO_PT};
use crate::model::{Figure, FigureSize, FontSpec, Frame, PlacementRecord, TextRun};
use crate::parser::Classification;

/// Mapping from canvas pixels to a target's frame-relative points.
///
/// SVG and Typst agree on a y-down axis and clockwise-positive angles, so
/// the Typst convention only translates and scales. Targets with a y-up
/// axis flip both y and the angle sign.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateConvention {
    origin: Point,
    height_pt: f64,
    flip_y: bool,
}

impl CoordinateConvention {
    /// Typst: y down, clockwise angles.
    pub fn typst(frame: &BoundingBox) -> Self {
        Self {
            origin: frame.origin(),
            height_pt: frame.height() * PX_TO_PT,
            flip_y: false,
        }
    }

    /// A y-up target such as PDF user space.
    pub fn y_up(frame: &BoundingBox) -> Self {
        Self {
            flip_y: true,
            ..Self::typst(frame)
        }
    }

    pub fn flips_y(&self) -> bool {
        self.flip_y
    }

    /// Convert a canvas point and a canvas angle (degrees) to the target.
    pub fn to_target(&self, point: Point, angle_deg: f64) -> (Point, f64) {
        let x = (point.x - self.origin.x) * PX_TO_PT;
        let y = (point.y - self.origin.y) * PX_TO_PT;
        if self.flip_y {
            (Point::new(x, self.height_pt - y), -angle_deg)
        } else {
            (Point::new(x, y), angle_deg)
        }
    }

    /// Convert a length vector already expressed in points.
    pub fn vector_to_target(&self, v: Point) -> Point {
        if self.flip_y {
            Point::new(v.x, -v.y)
        } else {
            v
        }
    }
}

/// Select the frame rectangle in canvas pixels.
pub fn frame_rect(classification: &Classification, frame: Frame) -> BoundingBox {
    match frame {
        Frame::Graphics => classification.bbox,
        Frame::Viewport => BoundingBox::from_rect(
            0.0,
            0.0,
            classification.viewport.width,
            classification.viewport.height,
        ),
    }
}

/// Build the figure: frame, natural size and one placement per run.
pub fn build_figure(classification: &Classification, frame: Frame) -> Result<Figure> {
    let rect = frame_rect(classification, frame);
    if rect.is_degenerate() {
        return Err(Error::DegenerateGeometry {
            width: rect.width(),
            height: rect.height(),
        });
    }

    let convention = CoordinateConvention::typst(&rect);
    let placements = place_runs(&classification.runs, &convention);

    Ok(Figure {
        viewport: classification.viewport,
        bbox: classification.bbox,
        frame: rect,
        size: FigureSize::from_frame(&rect),
        placements,
    })
}

/// One placement record per run, in order.
pub fn place_runs(runs: &[TextRun], convention: &CoordinateConvention) -> Vec<PlacementRecord> {
    runs.iter().map(|run| place_run(run, convention)).collect()
}

/// Place a single run.
///
/// Position and rotation come from the run's effective transform applied
/// to its line anchor. The font size follows the vertical scale, and a
/// differing horizontal scale becomes a stretch factor. Skew and mirroring
/// cannot be expressed and are only reported.
pub fn place_run(run: &TextRun, convention: &CoordinateConvention) -> PlacementRecord {
    let d = run.transform.decompose();
    if run.starts_line {
        if d.has_shear() {
            log::warn!("Skew on text {:?} is not reproduced", run.text);
        }
        if d.is_mirrored() {
            log::warn!("Mirrored text {:?} is placed unmirrored", run.text);
        }
    }

    let (position, rotation_deg) = convention.to_target(run.canvas_anchor(), d.rotation_deg);
    let scale_y = d.scale_y.abs();
    let stretch_x = if scale_y > 0.0 { d.scale_x / scale_y } else { 1.0 };
    let offset = convention.vector_to_target(Point::new(
        run.offset.x * d.scale_x * PX_TO_PT,
        run.offset.y * scale_y * PX_TO_PT,
    ));

    PlacementRecord {
        position,
        rotation_deg,
        alignment: run.style.text_anchor.into(),
        font: FontSpec {
            size_pt: run.style.font_size * scale_y * PX_TO_PT,
            family: run.style.font_family.clone(),
            weight: run.style.font_weight,
            style: run.style.font_style,
            fill: run.style.fill,
        },
        stretch_x,
        offset,
        baseline_shift: run.baseline_shift * scale_y * PX_TO_PT,
        text: run.text.clone(),
        continues_line: !run.starts_line,
    }
}
