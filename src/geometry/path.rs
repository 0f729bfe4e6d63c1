//! Shape outlines as line and Bézier segments, with exact bounds.
//!
//! Every graphics element is reduced to segments in its own user space.
//! Affine maps send Bézier curves to Bézier curves, so segments are
//! transformed by their control points and measured afterwards.

use super::{BoundingBox, Point, Transform};
use std::f64::consts::{FRAC_PI_2, PI};
use svgtypes::{PathParser, PathSegment, PointsParser};

/// Cubic approximation constant for a quarter ellipse.
const KAPPA: f64 = 0.552_284_749_830_793_4;

/// A piece of an outline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line(Point, Point),
    Quad(Point, Point, Point),
    Cubic(Point, Point, Point, Point),
}

impl Segment {
    pub fn transform(&self, t: &Transform) -> Segment {
        match *self {
            Segment::Line(p0, p1) => Segment::Line(t.apply(p0), t.apply(p1)),
            Segment::Quad(p0, p1, p2) => Segment::Quad(t.apply(p0), t.apply(p1), t.apply(p2)),
            Segment::Cubic(p0, p1, p2, p3) => {
                Segment::Cubic(t.apply(p0), t.apply(p1), t.apply(p2), t.apply(p3))
            }
        }
    }

    /// Grow `bbox` by the exact extent of this segment.
    pub fn extend_bounds(&self, bbox: &mut BoundingBox) {
        match *self {
            Segment::Line(p0, p1) => {
                bbox.include(p0);
                bbox.include(p1);
            }
            Segment::Quad(p0, p1, p2) => {
                bbox.include(p0);
                bbox.include(p2);
                for t in [
                    quad_extremum(p0.x, p1.x, p2.x),
                    quad_extremum(p0.y, p1.y, p2.y),
                ]
                .into_iter()
                .flatten()
                {
                    bbox.include(quad_at(p0, p1, p2, t));
                }
            }
            Segment::Cubic(p0, p1, p2, p3) => {
                bbox.include(p0);
                bbox.include(p3);
                let xs = cubic_extrema(p0.x, p1.x, p2.x, p3.x);
                let ys = cubic_extrema(p0.y, p1.y, p2.y, p3.y);
                for t in xs.into_iter().chain(ys).flatten() {
                    bbox.include(cubic_at(p0, p1, p2, p3, t));
                }
            }
        }
    }
}

/// Bounds of `segments` after mapping them through `t`.
pub fn transformed_bounds(segments: &[Segment], t: &Transform) -> BoundingBox {
    let mut bbox = BoundingBox::empty();
    for seg in segments {
        seg.transform(t).extend_bounds(&mut bbox);
    }
    bbox
}

fn quad_at(p0: Point, p1: Point, p2: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    Point::new(
        mt * mt * p0.x + 2.0 * mt * t * p1.x + t * t * p2.x,
        mt * mt * p0.y + 2.0 * mt * t * p1.y + t * t * p2.y,
    )
}

fn cubic_at(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> Point {
    let mt = 1.0 - t;
    let (w0, w1, w2, w3) = (mt * mt * mt, 3.0 * mt * mt * t, 3.0 * mt * t * t, t * t * t);
    Point::new(
        w0 * p0.x + w1 * p1.x + w2 * p2.x + w3 * p3.x,
        w0 * p0.y + w1 * p1.y + w2 * p2.y + w3 * p3.y,
    )
}

fn in_open_unit(t: f64) -> Option<f64> {
    (t > 0.0 && t < 1.0).then_some(t)
}

fn quad_extremum(p0: f64, p1: f64, p2: f64) -> Option<f64> {
    let denom = p0 - 2.0 * p1 + p2;
    if denom.abs() < 1e-12 {
        return None;
    }
    in_open_unit((p0 - p1) / denom)
}

/// Parameters in (0, 1) where one coordinate of a cubic has zero slope.
fn cubic_extrema(p0: f64, p1: f64, p2: f64, p3: f64) -> [Option<f64>; 2] {
    let a = -p0 + 3.0 * p1 - 3.0 * p2 + p3;
    let b = 2.0 * (p0 - 2.0 * p1 + p2);
    let c = p1 - p0;

    if a.abs() < 1e-12 {
        if b.abs() < 1e-12 {
            return [None, None];
        }
        return [in_open_unit(-c / b), None];
    }

    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return [None, None];
    }
    let sq = disc.sqrt();
    [
        in_open_unit((-b + sq) / (2.0 * a)),
        in_open_unit((-b - sq) / (2.0 * a)),
    ]
}

/// Outline of a rectangle.
pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Vec<Segment> {
    if width <= 0.0 || height <= 0.0 {
        return Vec::new();
    }
    let p0 = Point::new(x, y);
    let p1 = Point::new(x + width, y);
    let p2 = Point::new(x + width, y + height);
    let p3 = Point::new(x, y + height);
    vec![
        Segment::Line(p0, p1),
        Segment::Line(p1, p2),
        Segment::Line(p2, p3),
        Segment::Line(p3, p0),
    ]
}

/// Outline of an axis-aligned ellipse as four cubics.
pub fn ellipse(cx: f64, cy: f64, rx: f64, ry: f64) -> Vec<Segment> {
    if rx <= 0.0 || ry <= 0.0 {
        return Vec::new();
    }
    let (kx, ky) = (rx * KAPPA, ry * KAPPA);
    let right = Point::new(cx + rx, cy);
    let bottom = Point::new(cx, cy + ry);
    let left = Point::new(cx - rx, cy);
    let top = Point::new(cx, cy - ry);
    vec![
        Segment::Cubic(right, Point::new(cx + rx, cy + ky), Point::new(cx + kx, cy + ry), bottom),
        Segment::Cubic(bottom, Point::new(cx - kx, cy + ry), Point::new(cx - rx, cy + ky), left),
        Segment::Cubic(left, Point::new(cx - rx, cy - ky), Point::new(cx - kx, cy - ry), top),
        Segment::Cubic(top, Point::new(cx + kx, cy - ry), Point::new(cx + rx, cy - ky), right),
    ]
}

/// Outline of a `points` list (`polyline`, or `polygon` when `close`).
pub fn polyline(points: &str, close: bool) -> Vec<Segment> {
    let pts: Vec<Point> = PointsParser::from(points)
        .map(|(x, y)| Point::new(x, y))
        .collect();
    let mut segments: Vec<Segment> = pts.windows(2).map(|w| Segment::Line(w[0], w[1])).collect();
    if close && pts.len() > 2 {
        segments.push(Segment::Line(pts[pts.len() - 1], pts[0]));
    }
    segments
}

/// Parse path data into absolute segments.
///
/// Like renderers, stops at the first syntax error and keeps what came
/// before it.
pub fn parse_path_data(d: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut current = Point::default();
    let mut subpath_start = Point::default();
    // Reflected control points for S/T shorthands.
    let mut last_cubic_ctrl: Option<Point> = None;
    let mut last_quad_ctrl: Option<Point> = None;

    for seg in PathParser::from(d) {
        let Ok(seg) = seg else {
            log::debug!("path data error, keeping {} segments", segments.len());
            break;
        };
        let abs_pt = move |abs: bool, x: f64, y: f64| {
            if abs {
                Point::new(x, y)
            } else {
                Point::new(current.x + x, current.y + y)
            }
        };
        let mut cubic_ctrl = None;
        let mut quad_ctrl = None;

        match seg {
            PathSegment::MoveTo { abs, x, y } => {
                current = abs_pt(abs, x, y);
                subpath_start = current;
            }
            PathSegment::LineTo { abs, x, y } => {
                let p = abs_pt(abs, x, y);
                segments.push(Segment::Line(current, p));
                current = p;
            }
            PathSegment::HorizontalLineTo { abs, x } => {
                let p = Point::new(if abs { x } else { current.x + x }, current.y);
                segments.push(Segment::Line(current, p));
                current = p;
            }
            PathSegment::VerticalLineTo { abs, y } => {
                let p = Point::new(current.x, if abs { y } else { current.y + y });
                segments.push(Segment::Line(current, p));
                current = p;
            }
            PathSegment::CurveTo {
                abs,
                x1,
                y1,
                x2,
                y2,
                x,
                y,
            } => {
                let (c1, c2, p) = (abs_pt(abs, x1, y1), abs_pt(abs, x2, y2), abs_pt(abs, x, y));
                segments.push(Segment::Cubic(current, c1, c2, p));
                cubic_ctrl = Some(c2);
                current = p;
            }
            PathSegment::SmoothCurveTo { abs, x2, y2, x, y } => {
                let c1 = reflect(last_cubic_ctrl, current);
                let (c2, p) = (abs_pt(abs, x2, y2), abs_pt(abs, x, y));
                segments.push(Segment::Cubic(current, c1, c2, p));
                cubic_ctrl = Some(c2);
                current = p;
            }
            PathSegment::Quadratic { abs, x1, y1, x, y } => {
                let (c, p) = (abs_pt(abs, x1, y1), abs_pt(abs, x, y));
                segments.push(Segment::Quad(current, c, p));
                quad_ctrl = Some(c);
                current = p;
            }
            PathSegment::SmoothQuadratic { abs, x, y } => {
                let c = reflect(last_quad_ctrl, current);
                let p = abs_pt(abs, x, y);
                segments.push(Segment::Quad(current, c, p));
                quad_ctrl = Some(c);
                current = p;
            }
            PathSegment::EllipticalArc {
                abs,
                rx,
                ry,
                x_axis_rotation,
                large_arc,
                sweep,
                x,
                y,
            } => {
                let p = abs_pt(abs, x, y);
                segments.extend(arc_to_cubics(
                    current,
                    rx,
                    ry,
                    x_axis_rotation,
                    large_arc,
                    sweep,
                    p,
                ));
                current = p;
            }
            PathSegment::ClosePath { .. } => {
                if current != subpath_start {
                    segments.push(Segment::Line(current, subpath_start));
                }
                current = subpath_start;
            }
        }

        last_cubic_ctrl = cubic_ctrl;
        last_quad_ctrl = quad_ctrl;
    }

    segments
}

fn reflect(ctrl: Option<Point>, about: Point) -> Point {
    match ctrl {
        Some(c) => Point::new(2.0 * about.x - c.x, 2.0 * about.y - c.y),
        None => about,
    }
}

/// Convert an SVG elliptical arc into cubic segments of at most 90°.
///
/// Follows the endpoint-to-center conversion of the SVG implementation
/// notes, including out-of-range radii correction.
#[allow(clippy::too_many_arguments)]
pub fn arc_to_cubics(
    from: Point,
    rx: f64,
    ry: f64,
    x_axis_rotation: f64,
    large_arc: bool,
    sweep: bool,
    to: Point,
) -> Vec<Segment> {
    if from == to {
        return Vec::new();
    }
    let (mut rx, mut ry) = (rx.abs(), ry.abs());
    if rx < 1e-12 || ry < 1e-12 {
        return vec![Segment::Line(from, to)];
    }

    let (sin_phi, cos_phi) = x_axis_rotation.to_radians().sin_cos();
    let hx = (from.x - to.x) / 2.0;
    let hy = (from.y - to.y) / 2.0;
    let x1p = cos_phi * hx + sin_phi * hy;
    let y1p = -sin_phi * hx + cos_phi * hy;

    let lambda = (x1p * x1p) / (rx * rx) + (y1p * y1p) / (ry * ry);
    if lambda > 1.0 {
        let s = lambda.sqrt();
        rx *= s;
        ry *= s;
    }

    let num = rx * rx * ry * ry - rx * rx * y1p * y1p - ry * ry * x1p * x1p;
    let den = rx * rx * y1p * y1p + ry * ry * x1p * x1p;
    let mut coef = if den.abs() < 1e-12 {
        0.0
    } else {
        (num / den).max(0.0).sqrt()
    };
    if large_arc == sweep {
        coef = -coef;
    }
    let cxp = coef * rx * y1p / ry;
    let cyp = -coef * ry * x1p / rx;
    let cx = cos_phi * cxp - sin_phi * cyp + (from.x + to.x) / 2.0;
    let cy = sin_phi * cxp + cos_phi * cyp + (from.y + to.y) / 2.0;

    let theta1 = ((y1p - cyp) / ry).atan2((x1p - cxp) / rx);
    let theta2 = ((-y1p - cyp) / ry).atan2((-x1p - cxp) / rx);
    let mut delta = theta2 - theta1;
    if sweep && delta < 0.0 {
        delta += 2.0 * PI;
    } else if !sweep && delta > 0.0 {
        delta -= 2.0 * PI;
    }

    let count = (delta.abs() / FRAC_PI_2 - 1e-9).ceil().max(1.0) as usize;
    let step = delta / count as f64;
    let k = 4.0 / 3.0 * (step / 4.0).tan();

    let map = |ux: f64, uy: f64| {
        let (x, y) = (rx * ux, ry * uy);
        Point::new(cos_phi * x - sin_phi * y + cx, sin_phi * x + cos_phi * y + cy)
    };

    let mut segments = Vec::with_capacity(count);
    let mut start = from;
    for i in 0..count {
        let a0 = theta1 + step * i as f64;
        let a1 = a0 + step;
        let (s0, c0) = a0.sin_cos();
        let (s1, c1) = a1.sin_cos();
        let end = if i + 1 == count { to } else { map(c1, s1) };
        segments.push(Segment::Cubic(
            start,
            map(c0 - k * s0, s0 + k * c0),
            map(c1 + k * s1, s1 - k * c1),
            end,
        ));
        start = end;
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(segments: &[Segment]) -> BoundingBox {
        transformed_bounds(segments, &Transform::IDENTITY)
    }

    fn assert_box(b: BoundingBox, min_x: f64, min_y: f64, max_x: f64, max_y: f64, tol: f64) {
        assert!(
            (b.min_x - min_x).abs() < tol
                && (b.min_y - min_y).abs() < tol
                && (b.max_x - max_x).abs() < tol
                && (b.max_y - max_y).abs() < tol,
            "unexpected bounds {:?}",
            b
        );
    }

    #[test]
    fn test_rect_bounds() {
        assert_box(bounds(&rect(1.0, 2.0, 3.0, 4.0)), 1.0, 2.0, 4.0, 6.0, 1e-12);
        assert!(rect(0.0, 0.0, 0.0, 5.0).is_empty());
    }

    #[test]
    fn test_rotated_rect_bounds() {
        let t = Transform::rotate(45.0);
        let b = transformed_bounds(&rect(0.0, 0.0, 2.0, 2.0), &t);
        let r = 2.0 * std::f64::consts::SQRT_2;
        assert_box(b, -r / 2.0, 0.0, r / 2.0, r, 1e-9);
    }

    #[test]
    fn test_circle_bounds() {
        let b = bounds(&ellipse(10.0, 10.0, 5.0, 5.0));
        assert_box(b, 5.0, 5.0, 15.0, 15.0, 1e-9);
    }

    #[test]
    fn test_rotated_ellipse_stays_tight() {
        // An ellipse rotated by 90 degrees swaps its extents.
        let b = transformed_bounds(&ellipse(0.0, 0.0, 4.0, 1.0), &Transform::rotate(90.0));
        assert_box(b, -1.0, -4.0, 1.0, 4.0, 1e-3);
    }

    #[test]
    fn test_cubic_extrema_beyond_endpoints() {
        // The control points pull the curve above y = 0.
        let segs = parse_path_data("M0,0 C0,-10 10,-10 10,0");
        let b = bounds(&segs);
        assert_box(b, 0.0, -7.5, 10.0, 0.0, 1e-9);
    }

    #[test]
    fn test_quadratic_extremum() {
        let b = bounds(&parse_path_data("M0 0 Q5 10 10 0"));
        assert_box(b, 0.0, 0.0, 10.0, 5.0, 1e-9);
    }

    #[test]
    fn test_relative_and_shorthand_commands() {
        let segs = parse_path_data("m10 10 h5 v5 l-5 0 z");
        assert_eq!(segs.len(), 4);
        assert_box(bounds(&segs), 10.0, 10.0, 15.0, 15.0, 1e-12);

        let segs = parse_path_data("M0 0 C0 5 5 5 5 0 S10 -5 10 0");
        assert_eq!(segs.len(), 2);
        assert!(matches!(segs[1], Segment::Cubic(_, c1, _, _) if c1 == Point::new(5.0, -5.0)));
    }

    #[test]
    fn test_arc_half_circle() {
        // Upper half of a unit circle from (-1,0) to (1,0) sweeping through y = -1.
        let segs = parse_path_data("M-1 0 A1 1 0 0 1 1 0");
        assert_eq!(segs.len(), 2);
        assert_box(bounds(&segs), -1.0, -1.0, 1.0, 0.0, 1e-3);
    }

    #[test]
    fn test_arc_radii_are_scaled_up() {
        // Radii too small for the endpoints are enlarged to a half circle.
        let segs = arc_to_cubics(
            Point::new(0.0, 0.0),
            1.0,
            1.0,
            0.0,
            false,
            true,
            Point::new(10.0, 0.0),
        );
        assert_box(bounds(&segs), 0.0, -5.0, 10.0, 0.0, 1e-2);
    }

    #[test]
    fn test_degenerate_arc_is_line() {
        let segs = arc_to_cubics(
            Point::new(0.0, 0.0),
            0.0,
            3.0,
            0.0,
            false,
            false,
            Point::new(4.0, 4.0),
        );
        assert_eq!(segs, vec![Segment::Line(Point::new(0.0, 0.0), Point::new(4.0, 4.0))]);
    }

    #[test]
    fn test_polyline_and_polygon() {
        assert_eq!(polyline("0,0 10,0 10,10", false).len(), 2);
        assert_eq!(polyline("0,0 10,0 10,10", true).len(), 3);
        assert_box(bounds(&polyline("0,0 10,0 10,10", true)), 0.0, 0.0, 10.0, 10.0, 1e-12);
    }

    #[test]
    fn test_path_error_keeps_prefix() {
        let segs = parse_path_data("M0 0 L10 0 L foo");
        assert_eq!(segs.len(), 1);
    }
}
