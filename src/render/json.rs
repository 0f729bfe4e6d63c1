//! JSON rendering for figures and split results.

use serde::Serialize;

use crate::error::{Error, Result};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize any model value to JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{BoundingBox, Point, Viewport};
    use crate::model::{Alignment, Figure, FigureSize, FontSpec, FontStyle, PlacementRecord};

    fn figure() -> Figure {
        let frame = BoundingBox::from_rect(0.0, 0.0, 200.0, 100.0);
        Figure {
            viewport: Viewport::from_attributes(Some("200"), Some("100"), None, None).unwrap(),
            bbox: frame,
            frame,
            size: FigureSize::from_frame(&frame),
            placements: vec![PlacementRecord {
                position: Point::new(37.5, 37.5),
                rotation_deg: 90.0,
                alignment: Alignment::Center,
                font: FontSpec {
                    size_pt: 12.0,
                    family: vec!["sans-serif".into()],
                    weight: 400,
                    style: FontStyle::Normal,
                    fill: None,
                },
                stretch_x: 1.0,
                offset: Point::default(),
                baseline_shift: 0.0,
                text: "Label".into(),
                continues_line: false,
            }],
        }
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&figure(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"placements\""));
        assert!(json.contains("\"Label\""));
        assert!(json.contains('\n')); // Pretty has newlines
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&figure(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n')); // Compact has no newlines
    }

    #[test]
    fn test_slices_serialize() {
        let figure = figure();
        let json = to_json(figure.placements.as_slice(), JsonFormat::Compact).unwrap();
        assert!(json.starts_with('['));
        assert!(json.contains("\"rotation_deg\":90.0"));
    }
}
