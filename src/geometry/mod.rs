//! Geometry primitives: affine transforms, viewport mapping, path bounds.

mod bbox;
pub mod path;
mod transform;
mod viewport;

pub use bbox::BoundingBox;
pub use transform::{parse_transform, Decomposition, Transform};
pub use viewport::{parse_length, Length, LengthUnit, Viewport, PX_PER_IN, PX_TO_PT};

use serde::{Deserialize, Serialize};

/// A point (or vector) in 2D.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Distance to another point.
    pub fn distance(&self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl std::ops::Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}
