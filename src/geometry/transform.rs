//! 2D affine transforms and SVG transform-list parsing.

use super::Point;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A 2D affine transform.
///
/// SVG writes the matrix as `matrix(a b c d e f)`:
/// ```text
/// [ a  c  e ]
/// [ b  d  f ]
/// [ 0  0  1 ]
/// ```
///
/// `a`..`d` hold scale/rotation/skew and `(e, f)` the translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Transform {
    /// The identity transform.
    pub const IDENTITY: Transform = Transform {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Create a transform from its six matrix entries.
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// The identity transform.
    pub const fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn translate(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    /// Rotation by `degrees`; positive angles turn +x towards +y.
    pub fn rotate(degrees: f64) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::new(cos, sin, -sin, cos, 0.0, 0.0)
    }

    /// Rotation about the pivot `(cx, cy)`.
    pub fn rotate_about(degrees: f64, cx: f64, cy: f64) -> Self {
        Self::translate(cx, cy)
            .pre_concat(&Self::rotate(degrees))
            .pre_concat(&Self::translate(-cx, -cy))
    }

    pub fn skew_x(degrees: f64) -> Self {
        Self::new(1.0, 0.0, degrees.to_radians().tan(), 1.0, 0.0, 0.0)
    }

    pub fn skew_y(degrees: f64) -> Self {
        Self::new(1.0, degrees.to_radians().tan(), 0.0, 1.0, 0.0, 0.0)
    }

    /// Matrix product `self · inner`.
    ///
    /// The result maps a point through `inner` first and `self` second,
    /// which is how an ancestor transform wraps its descendant's.
    pub fn pre_concat(&self, inner: &Transform) -> Transform {
        Transform {
            a: self.a * inner.a + self.c * inner.b,
            b: self.b * inner.a + self.d * inner.b,
            c: self.a * inner.c + self.c * inner.d,
            d: self.b * inner.c + self.d * inner.d,
            e: self.a * inner.e + self.c * inner.f + self.e,
            f: self.b * inner.e + self.d * inner.f + self.f,
        }
    }

    /// Apply `self` first, then `outer`.
    pub fn then(&self, outer: &Transform) -> Transform {
        outer.pre_concat(self)
    }

    /// Compose a root-to-node chain into one transform.
    pub fn compose<'a, I>(chain: I) -> Transform
    where
        I: IntoIterator<Item = &'a Transform>,
    {
        chain
            .into_iter()
            .fold(Transform::IDENTITY, |acc, t| acc.pre_concat(t))
    }

    /// Map a point.
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a * p.x + self.c * p.y + self.e,
            self.b * p.x + self.d * p.y + self.f,
        )
    }

    /// Map a direction vector (translation is ignored).
    pub fn apply_vector(&self, v: Point) -> Point {
        Point::new(self.a * v.x + self.c * v.y, self.b * v.x + self.d * v.y)
    }

    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Inverse transform, or `None` when the matrix is singular.
    pub fn invert(&self) -> Option<Transform> {
        let det = self.determinant();
        if det.abs() < f64::EPSILON {
            return None;
        }
        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;
        Some(Transform {
            a,
            b,
            c,
            d,
            e: -(a * self.e + c * self.f),
            f: -(b * self.e + d * self.f),
        })
    }

    /// Split into translation, rotation, scale and shear.
    ///
    /// The decomposition is QR-like and unique:
    /// `self = T(translation) · R(rotation_deg) · [[scale_x, shear], [0, scale_y]]`.
    /// `scale_x` is never negative; a mirrored transform yields a negative
    /// `scale_y`.
    pub fn decompose(&self) -> Decomposition {
        let translation = Point::new(self.e, self.f);
        let scale_x = self.a.hypot(self.b);

        if scale_x < f64::EPSILON {
            return Decomposition {
                translation,
                rotation_deg: 0.0,
                scale_x: 0.0,
                scale_y: self.d,
                shear: self.c,
            };
        }

        Decomposition {
            translation,
            rotation_deg: self.b.atan2(self.a).to_degrees(),
            scale_x,
            scale_y: self.determinant() / scale_x,
            shear: (self.a * self.c + self.b * self.d) / scale_x,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Result of [`Transform::decompose`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decomposition {
    pub translation: Point,
    /// Rotation in degrees in (-180, 180]
    pub rotation_deg: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Upper-right entry of the residual upper-triangular factor
    pub shear: f64,
}

impl Decomposition {
    /// Rebuild the transform this decomposition came from.
    pub fn recompose(&self) -> Transform {
        Transform::translate(self.translation.x, self.translation.y)
            .pre_concat(&Transform::rotate(self.rotation_deg))
            .pre_concat(&Transform::new(
                self.scale_x,
                0.0,
                self.shear,
                self.scale_y,
                0.0,
                0.0,
            ))
    }

    pub fn has_shear(&self) -> bool {
        self.shear.abs() > 1e-9
    }

    pub fn is_mirrored(&self) -> bool {
        self.scale_y < 0.0
    }
}

/// Parse an SVG `transform` attribute value.
///
/// An empty or whitespace-only list is the identity. Functions compose
/// left to right: `"translate(10) scale(2)"` scales first, then translates.
pub fn parse_transform(input: &str) -> Result<Transform> {
    let mut out = Transform::IDENTITY;
    let mut rest = input.trim_start_matches(is_list_separator);

    while !rest.is_empty() {
        let name_end = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let name = &rest[..name_end];
        if name.is_empty() {
            return Err(Error::MalformedTransform(format!(
                "expected a transform function at '{}'",
                rest
            )));
        }

        let after_name = rest[name_end..].trim_start();
        let Some(args_start) = after_name.strip_prefix('(') else {
            return Err(Error::MalformedTransform(format!(
                "missing '(' after '{}'",
                name
            )));
        };
        let Some(close) = args_start.find(')') else {
            return Err(Error::MalformedTransform(format!(
                "missing ')' in '{}'",
                name
            )));
        };

        let args = parse_numbers(&args_start[..close], name)?;
        out = out.pre_concat(&transform_function(name, &args)?);
        rest = args_start[close + 1..].trim_start_matches(is_list_separator);
    }

    Ok(out)
}

fn is_list_separator(c: char) -> bool {
    c.is_whitespace() || c == ','
}

fn parse_numbers(args: &str, name: &str) -> Result<Vec<f64>> {
    args.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| {
                    Error::MalformedTransform(format!("invalid number '{}' in '{}'", s, name))
                })
        })
        .collect()
}

fn transform_function(name: &str, args: &[f64]) -> Result<Transform> {
    let arity = |allowed: &[usize]| -> Result<()> {
        if allowed.contains(&args.len()) {
            Ok(())
        } else {
            Err(Error::MalformedTransform(format!(
                "{}() takes {:?} arguments, got {}",
                name,
                allowed,
                args.len()
            )))
        }
    };

    match name {
        "matrix" => {
            arity(&[6])?;
            Ok(Transform::new(
                args[0], args[1], args[2], args[3], args[4], args[5],
            ))
        }
        "translate" => {
            arity(&[1, 2])?;
            Ok(Transform::translate(
                args[0],
                args.get(1).copied().unwrap_or(0.0),
            ))
        }
        "scale" => {
            arity(&[1, 2])?;
            Ok(Transform::scale(args[0], args.get(1).copied().unwrap_or(args[0])))
        }
        "rotate" => {
            arity(&[1, 3])?;
            if args.len() == 3 {
                Ok(Transform::rotate_about(args[0], args[1], args[2]))
            } else {
                Ok(Transform::rotate(args[0]))
            }
        }
        "skewX" => {
            arity(&[1])?;
            Ok(Transform::skew_x(args[0]))
        }
        "skewY" => {
            arity(&[1])?;
            Ok(Transform::skew_y(args[0]))
        }
        other => Err(Error::UnsupportedTransform(other.to_string())),
    }
}
