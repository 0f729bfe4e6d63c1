//! Root coordinate system and CSS length parsing.

use super::Transform;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use svgtypes::{Align, AspectRatio};

/// CSS pixels per inch.
pub const PX_PER_IN: f64 = 96.0;

/// Points per CSS pixel (72 / 96).
pub const PX_TO_PT: f64 = 72.0 / PX_PER_IN;

/// Unit of a CSS length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LengthUnit {
    /// Unitless user units
    None,
    Px,
    Pt,
    Pc,
    Mm,
    Cm,
    In,
    Em,
    Ex,
    Percent,
}

/// A number with a unit, e.g. `210mm`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Length {
    pub value: f64,
    pub unit: LengthUnit,
}

impl Length {
    pub const fn new(value: f64, unit: LengthUnit) -> Self {
        Self { value, unit }
    }

    /// Convert an absolute length to pixels. Relative units yield `None`.
    pub fn to_px(&self) -> Option<f64> {
        let factor = match self.unit {
            LengthUnit::None | LengthUnit::Px => 1.0,
            LengthUnit::Pt => PX_PER_IN / 72.0,
            LengthUnit::Pc => PX_PER_IN / 6.0,
            LengthUnit::Mm => PX_PER_IN / 25.4,
            LengthUnit::Cm => PX_PER_IN / 2.54,
            LengthUnit::In => PX_PER_IN,
            LengthUnit::Em | LengthUnit::Ex | LengthUnit::Percent => return None,
        };
        Some(self.value * factor)
    }

    /// Convert to pixels, resolving font-relative units against
    /// `font_size` and percentages against `percent_base`.
    pub fn to_px_relative(&self, font_size: f64, percent_base: f64) -> f64 {
        match self.unit {
            LengthUnit::Em => self.value * font_size,
            LengthUnit::Ex => self.value * font_size * 0.5,
            LengthUnit::Percent => self.value / 100.0 * percent_base,
            _ => self.to_px().unwrap_or(self.value),
        }
    }

    pub fn is_absolute(&self) -> bool {
        self.to_px().is_some()
    }
}

impl From<svgtypes::LengthUnit> for LengthUnit {
    fn from(unit: svgtypes::LengthUnit) -> Self {
        use svgtypes::LengthUnit as U;
        match unit {
            U::None => LengthUnit::None,
            U::Px => LengthUnit::Px,
            U::Pt => LengthUnit::Pt,
            U::Pc => LengthUnit::Pc,
            U::Mm => LengthUnit::Mm,
            U::Cm => LengthUnit::Cm,
            U::In => LengthUnit::In,
            U::Em => LengthUnit::Em,
            U::Ex => LengthUnit::Ex,
            U::Percent => LengthUnit::Percent,
        }
    }
}

/// Parse a CSS length such as `12`, `12.5px`, `3mm` or `50%`.
pub fn parse_length(input: &str) -> Option<Length> {
    let length: svgtypes::Length = input.trim().parse().ok()?;
    Some(Length::new(length.number, length.unit.into()))
}

/// Parse a `viewBox` value: four numbers with positive width and height.
pub fn parse_view_box(input: &str) -> Option<[f64; 4]> {
    let vb: svgtypes::ViewBox = input.trim().parse().ok()?;
    Some([vb.x, vb.y, vb.w, vb.h])
}

/// Resolved viewport of an `<svg>` element.
///
/// `transform` maps the element's user units to canvas pixels, the
/// coordinate space every other geometry computation works in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Canvas width in pixels
    pub width: f64,
    /// Canvas height in pixels
    pub height: f64,
    /// `viewBox` as `[min-x, min-y, width, height]`
    pub view_box: Option<[f64; 4]>,
    /// User units to canvas pixels
    pub transform: Transform,
}

impl Viewport {
    /// Resolve a viewport from the root element's attributes.
    ///
    /// Width and height fall back to the viewBox size (one user unit per
    /// pixel); if only one of them is absolute the other follows the
    /// viewBox aspect ratio. With neither an absolute size nor a viewBox
    /// the document has no coordinate system.
    pub fn from_attributes(
        width: Option<&str>,
        height: Option<&str>,
        view_box: Option<&str>,
        preserve_aspect_ratio: Option<&str>,
    ) -> Result<Self> {
        let abs = |v: Option<&str>| v.and_then(parse_length).and_then(|l| l.to_px());
        let view_box = view_box.and_then(parse_view_box);
        let (w, h) = (abs(width), abs(height));

        let (width, height) = match (w, h, view_box) {
            (Some(w), Some(h), _) => (w, h),
            (Some(w), None, Some(vb)) => (w, w * vb[3] / vb[2]),
            (None, Some(h), Some(vb)) => (h * vb[2] / vb[3], h),
            (None, None, Some(vb)) => (vb[2], vb[3]),
            _ => return Err(Error::MissingViewport),
        };

        let transform = match view_box {
            Some(vb) => view_box_transform(vb, width, height, preserve_aspect_ratio),
            None => Transform::IDENTITY,
        };

        Ok(Self {
            width,
            height,
            view_box,
            transform,
        })
    }

    /// Canvas size in points.
    pub fn size_pt(&self) -> (f64, f64) {
        (self.width * PX_TO_PT, self.height * PX_TO_PT)
    }
}

/// Map a viewBox onto a `width` x `height` viewport following
/// `preserveAspectRatio` (default `xMidYMid meet`).
pub fn view_box_transform(
    view_box: [f64; 4],
    width: f64,
    height: f64,
    preserve_aspect_ratio: Option<&str>,
) -> Transform {
    let [vx, vy, vw, vh] = view_box;
    let sx = width / vw;
    let sy = height / vh;

    let aspect: AspectRatio = preserve_aspect_ratio
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();

    if aspect.align == Align::None {
        return Transform::scale(sx, sy).pre_concat(&Transform::translate(-vx, -vy));
    }

    let s = if aspect.slice { sx.max(sy) } else { sx.min(sy) };
    let free_w = width - vw * s;
    let free_h = height - vh * s;
    let (fx, fy) = match aspect.align {
        Align::None | Align::XMinYMin => (0.0, 0.0),
        Align::XMidYMin => (0.5, 0.0),
        Align::XMaxYMin => (1.0, 0.0),
        Align::XMinYMid => (0.0, 0.5),
        Align::XMidYMid => (0.5, 0.5),
        Align::XMaxYMid => (1.0, 0.5),
        Align::XMinYMax => (0.0, 1.0),
        Align::XMidYMax => (0.5, 1.0),
        Align::XMaxYMax => (1.0, 1.0),
    };

    Transform::translate(free_w * fx, free_h * fy)
        .pre_concat(&Transform::scale(s, s))
        .pre_concat(&Transform::translate(-vx, -vy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn test_parse_length_units() {
        assert_eq!(parse_length("12"), Some(Length::new(12.0, LengthUnit::None)));
        assert_eq!(parse_length(" 4.5px "), Some(Length::new(4.5, LengthUnit::Px)));
        assert_eq!(parse_length("-.5em"), Some(Length::new(-0.5, LengthUnit::Em)));
        assert_eq!(parse_length("50%"), Some(Length::new(50.0, LengthUnit::Percent)));
        assert_eq!(parse_length("1e2mm"), Some(Length::new(100.0, LengthUnit::Mm)));
        assert_eq!(parse_length("12furlongs"), None);
        assert_eq!(parse_length(""), None);
    }

    #[test]
    fn test_absolute_conversion() {
        assert_eq!(Length::new(72.0, LengthUnit::Pt).to_px(), Some(96.0));
        assert_eq!(Length::new(1.0, LengthUnit::In).to_px(), Some(96.0));
        assert!((Length::new(25.4, LengthUnit::Mm).to_px().unwrap() - 96.0).abs() < 1e-9);
        assert_eq!(Length::new(1.0, LengthUnit::Em).to_px(), None);
    }

    #[test]
    fn test_relative_conversion() {
        assert_eq!(Length::new(1.5, LengthUnit::Em).to_px_relative(10.0, 0.0), 15.0);
        assert_eq!(Length::new(50.0, LengthUnit::Percent).to_px_relative(0.0, 30.0), 15.0);
    }

    #[test]
    fn test_view_box_only() {
        let vp = Viewport::from_attributes(None, None, Some("0 0 200 100"), None).unwrap();
        assert_eq!((vp.width, vp.height), (200.0, 100.0));
        assert!(vp.transform.is_identity());
        assert_eq!(vp.size_pt(), (150.0, 75.0));
    }

    #[test]
    fn test_mm_with_view_box() {
        let vp = Viewport::from_attributes(
            Some("210mm"),
            Some("297mm"),
            Some("0 0 210 297"),
            None,
        )
        .unwrap();
        let p = vp.transform.apply(Point::new(210.0, 297.0));
        assert!((p.x - vp.width).abs() < 1e-9);
        assert!((p.y - vp.height).abs() < 1e-9);
    }

    #[test]
    fn test_single_dimension_follows_aspect() {
        let vp = Viewport::from_attributes(Some("400"), None, Some("0 0 200 100"), None).unwrap();
        assert_eq!((vp.width, vp.height), (400.0, 200.0));
    }

    #[test]
    fn test_percent_size_falls_back_to_view_box() {
        let vp =
            Viewport::from_attributes(Some("100%"), Some("100%"), Some("0 0 50 40"), None).unwrap();
        assert_eq!((vp.width, vp.height), (50.0, 40.0));
    }

    #[test]
    fn test_missing_viewport() {
        assert!(matches!(
            Viewport::from_attributes(None, None, None, None),
            Err(Error::MissingViewport)
        ));
        assert!(matches!(
            Viewport::from_attributes(Some("100%"), None, Some("0 0 0 10"), None),
            Err(Error::MissingViewport)
        ));
    }

    #[test]
    fn test_meet_centers_content() {
        // 100x100 box in a 200x100 viewport: scale 1, centered horizontally.
        let t = view_box_transform([0.0, 0.0, 100.0, 100.0], 200.0, 100.0, None);
        let p = t.apply(Point::new(0.0, 0.0));
        assert!((p.x - 50.0).abs() < 1e-9 && p.y.abs() < 1e-9);
    }

    #[test]
    fn test_preserve_none_stretches() {
        let t = view_box_transform([10.0, 0.0, 100.0, 100.0], 200.0, 100.0, Some("none"));
        let p = t.apply(Point::new(110.0, 100.0));
        assert!((p.x - 200.0).abs() < 1e-9 && (p.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_slice_covers_viewport() {
        let t = view_box_transform([0.0, 0.0, 100.0, 100.0], 200.0, 100.0, Some("xMinYMin slice"));
        let p = t.apply(Point::new(100.0, 100.0));
        assert!((p.x - 200.0).abs() < 1e-9 && (p.y - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_max_alignment_and_invalid_fallback() {
        let t = view_box_transform([0.0, 0.0, 100.0, 100.0], 200.0, 100.0, Some("xMaxYMax"));
        let p = t.apply(Point::new(0.0, 0.0));
        assert!((p.x - 100.0).abs() < 1e-9 && p.y.abs() < 1e-9);

        let t = view_box_transform([0.0, 0.0, 100.0, 100.0], 200.0, 100.0, Some("sideways"));
        assert!((t.apply(Point::new(0.0, 0.0)).x - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_view_box_separators() {
        assert_eq!(parse_view_box("0,0, 20 10"), Some([0.0, 0.0, 20.0, 10.0]));
        assert_eq!(parse_view_box("0 0 -1 10"), None);
        assert_eq!(parse_view_box("0 0 20"), None);
    }
}
