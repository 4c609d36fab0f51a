//! Strongly-typed primitives shared across the crate.
//!
//! Geographic positions are validated on construction from user input;
//! everything downstream of the projection works in `glam::DVec2` pixels.

use std::fmt;

use glam::{DVec2, dvec2};

/// Error type for invalid numeric values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericError {
    /// Value is NaN
    NaN,
    /// Value is infinite
    Infinite,
    /// Value lies outside its allowed range
    OutOfRange { value: f64, limit: f64 },
}

impl fmt::Display for NumericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumericError::NaN => write!(f, "value is NaN"),
            NumericError::Infinite => write!(f, "value is infinite"),
            NumericError::OutOfRange { value, limit } => {
                write!(f, "value {value} exceeds +/-{limit}")
            }
        }
    }
}

impl std::error::Error for NumericError {}

fn check(val: f64, limit: f64) -> Result<f64, NumericError> {
    if val.is_nan() {
        Err(NumericError::NaN)
    } else if val.is_infinite() {
        Err(NumericError::Infinite)
    } else if val.abs() > limit {
        Err(NumericError::OutOfRange { value: val, limit })
    } else {
        Ok(val)
    }
}

/// A geographic position in degrees.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    /// Create a point without validation (const-friendly).
    /// Use `try_new` for user-provided values.
    #[inline]
    pub const fn new(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint { lat, lon }
    }

    /// Create a point, rejecting NaN, infinities and out-of-range degrees
    pub fn try_new(lat: f64, lon: f64) -> Result<GeoPoint, NumericError> {
        Ok(GeoPoint {
            lat: check(lat, 90.0)?,
            lon: check(lon, 180.0)?,
        })
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// Approximate equality in degrees
    pub fn abs_diff_eq(self, other: GeoPoint, eps: f64) -> bool {
        (self.lat - other.lat).abs() <= eps && (self.lon - other.lon).abs() <= eps
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Axis-aligned bounding rectangle in graphic pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new()
    }
}

impl Bounds {
    /// An empty rectangle that any point will expand
    pub fn new() -> Self {
        Bounds {
            min: DVec2::splat(f64::INFINITY),
            max: DVec2::splat(f64::NEG_INFINITY),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = DVec2>) -> Self {
        let mut bounds = Bounds::new();
        for p in points {
            bounds.expand_point(p);
        }
        bounds
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn expand_point(&mut self, p: DVec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&mut self, other: &Bounds) {
        if !other.is_empty() {
            self.expand_point(other.min);
            self.expand_point(other.max);
        }
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max.x - self.min.x }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max.y - self.min.y }
    }

    pub fn size(&self) -> DVec2 {
        dvec2(self.width(), self.height())
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Grow every side by `margin`
    pub fn inflate(&self, margin: f64) -> Bounds {
        if self.is_empty() {
            return *self;
        }
        Bounds {
            min: self.min - DVec2::splat(margin),
            max: self.max + DVec2::splat(margin),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geo_point_validation() {
        assert!(GeoPoint::try_new(45.0, -120.0).is_ok());
        assert_eq!(GeoPoint::try_new(f64::NAN, 0.0), Err(NumericError::NaN));
        assert_eq!(
            GeoPoint::try_new(0.0, f64::INFINITY),
            Err(NumericError::Infinite)
        );
        assert_eq!(
            GeoPoint::try_new(91.0, 0.0),
            Err(NumericError::OutOfRange {
                value: 91.0,
                limit: 90.0
            })
        );
        assert!(GeoPoint::try_new(0.0, 180.5).is_err());
    }

    #[test]
    fn numeric_error_display() {
        assert_eq!(NumericError::NaN.to_string(), "value is NaN");
        assert_eq!(
            NumericError::OutOfRange {
                value: 200.0,
                limit: 180.0
            }
            .to_string(),
            "value 200 exceeds +/-180"
        );
    }

    #[test]
    fn empty_bounds_have_no_size() {
        let b = Bounds::new();
        assert!(b.is_empty());
        assert_eq!(b.width(), 0.0);
        assert_eq!(b.size(), DVec2::ZERO);
    }

    #[test]
    fn bounds_expand_and_union() {
        let mut a = Bounds::from_points([dvec2(0.0, 0.0), dvec2(2.0, 1.0)]);
        assert_eq!(a.width(), 2.0);
        assert_eq!(a.height(), 1.0);

        let b = Bounds::from_points([dvec2(-1.0, 3.0)]);
        a.union(&b);
        assert_eq!(a.min, dvec2(-1.0, 0.0));
        assert_eq!(a.max, dvec2(2.0, 3.0));
        assert!(a.contains(dvec2(0.5, 2.0)));

        a.union(&Bounds::new());
        assert_eq!(a.max, dvec2(2.0, 3.0));
    }

    #[test]
    fn inflate_leaves_empty_bounds_empty() {
        assert!(Bounds::new().inflate(5.0).is_empty());
        let b = Bounds::from_points([DVec2::ZERO]).inflate(1.0);
        assert_eq!(b.min, dvec2(-1.0, -1.0));
        assert_eq!(b.center(), DVec2::ZERO);
    }
}
