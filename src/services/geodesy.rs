//! Geodesy primitives consumed by anchor derivation and the transform solver.

use std::f64::consts::PI;

use glam::{DAffine2, DVec2, dvec2};

use crate::render::geometry;
use crate::types::GeoPoint;

/// Web Mercator world width in pixels at scale 1
pub const TILE_SIZE: f64 = 256.0;

/// Mean earth radius in meters
pub const EARTH_RADIUS: f64 = 6_371_008.8;

/// Web Mercator latitude limit
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// Geodesic operations and the map projection.
///
/// Bearings are degrees clockwise from north, ranges are meters, pixels are
/// y-down with the world spanning `TILE_SIZE * scale` pixels.
pub trait Geodesy: Send + Sync {
    fn bearing(&self, from: GeoPoint, to: GeoPoint) -> f64;

    fn range(&self, from: GeoPoint, to: GeoPoint) -> f64;

    fn destination(&self, from: GeoPoint, bearing: f64, range: f64) -> GeoPoint;

    fn to_pixel(&self, p: GeoPoint, scale: f64) -> DVec2;

    fn to_geo(&self, px: DVec2, scale: f64) -> GeoPoint;

    /// The point `t` of the way from `a` to `b`
    fn interpolate(&self, a: GeoPoint, b: GeoPoint, t: f64) -> GeoPoint {
        self.destination(a, self.bearing(a, b), self.range(a, b) * t)
    }

    fn midpoint(&self, a: GeoPoint, b: GeoPoint) -> GeoPoint {
        self.interpolate(a, b, 0.5)
    }

    /// Move `offset` meters from `at`, square to the direction `at -> toward`.
    /// Positive offsets go to the right of that direction.
    fn perpendicular(&self, at: GeoPoint, toward: GeoPoint, offset: f64) -> GeoPoint {
        self.destination(at, self.bearing(at, toward) + 90.0, offset)
    }

    /// Signed cross-track distance of `p` from the line `a -> b`, positive on
    /// the right.
    fn cross_track(&self, a: GeoPoint, b: GeoPoint, p: GeoPoint) -> f64 {
        let d13 = self.range(a, p) / EARTH_RADIUS;
        let delta = (self.bearing(a, p) - self.bearing(a, b)).to_radians();
        (d13.sin() * delta.sin()).asin() * EARTH_RADIUS
    }

    /// Signed distance from `a` to the foot of `p` on the line `a -> b`
    fn along_track(&self, a: GeoPoint, b: GeoPoint, p: GeoPoint) -> f64 {
        let d13 = self.range(a, p) / EARTH_RADIUS;
        let dxt = self.cross_track(a, b, p) / EARTH_RADIUS;
        let delta = (self.bearing(a, p) - self.bearing(a, b)).to_radians();
        let dat = (d13.cos() / dxt.cos()).clamp(-1.0, 1.0).acos() * EARTH_RADIUS;
        if delta.cos() < 0.0 { -dat } else { dat }
    }

    /// Mirror `p` across the line `a -> b`
    fn reflect(&self, p: GeoPoint, a: GeoPoint, b: GeoPoint) -> GeoPoint {
        let foot = self.destination(a, self.bearing(a, b), self.along_track(a, b, p));
        self.perpendicular(foot, b, -self.cross_track(a, b, p))
    }

    /// Least-squares affine fit between point sets
    fn fit_affine(&self, src: &[DVec2], dst: &[DVec2]) -> DAffine2 {
        geometry::fit_affine(src, dst)
    }

    fn point_in_polygon(&self, p: DVec2, polygon: &[DVec2]) -> bool {
        geometry::point_in_polygon(p, polygon)
    }
}

/// Great-circle geodesy on a spherical earth with Web Mercator pixels.
#[derive(Debug, Clone, Copy, Default)]
pub struct Spherical;

fn normalize_lon(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lon > 0.0 { 180.0 } else { wrapped }
}

impl Geodesy for Spherical {
    fn bearing(&self, from: GeoPoint, to: GeoPoint) -> f64 {
        let (p1, p2) = (from.lat.to_radians(), to.lat.to_radians());
        let dl = (to.lon - from.lon).to_radians();
        let y = dl.sin() * p2.cos();
        let x = p1.cos() * p2.sin() - p1.sin() * p2.cos() * dl.cos();
        y.atan2(x).to_degrees().rem_euclid(360.0)
    }

    fn range(&self, from: GeoPoint, to: GeoPoint) -> f64 {
        let (p1, p2) = (from.lat.to_radians(), to.lat.to_radians());
        let dp = p2 - p1;
        let dl = (to.lon - from.lon).to_radians();
        let h = (dp / 2.0).sin().powi(2) + p1.cos() * p2.cos() * (dl / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS * h.sqrt().min(1.0).asin()
    }

    fn destination(&self, from: GeoPoint, bearing: f64, range: f64) -> GeoPoint {
        let delta = range / EARTH_RADIUS;
        let theta = bearing.to_radians();
        let p1 = from.lat.to_radians();
        let l1 = from.lon.to_radians();
        let sin_p2 = (p1.sin() * delta.cos() + p1.cos() * delta.sin() * theta.cos()).clamp(-1.0, 1.0);
        let p2 = sin_p2.asin();
        let l2 = l1
            + (theta.sin() * delta.sin() * p1.cos()).atan2(delta.cos() - p1.sin() * sin_p2);
        GeoPoint::new(p2.to_degrees(), normalize_lon(l2.to_degrees()))
    }

    fn to_pixel(&self, p: GeoPoint, scale: f64) -> DVec2 {
        let world = TILE_SIZE * scale;
        let s = p.lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians().sin();
        dvec2(
            (p.lon + 180.0) / 360.0 * world,
            (0.5 - ((1.0 + s) / (1.0 - s)).ln() / (4.0 * PI)) * world,
        )
    }

    fn to_geo(&self, px: DVec2, scale: f64) -> GeoPoint {
        let world = TILE_SIZE * scale;
        let n = PI - 2.0 * PI * px.y / world;
        GeoPoint::new(n.sinh().atan().to_degrees(), px.x / world * 360.0 - 180.0)
    }
}
