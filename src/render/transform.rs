//! Template to pixel transform solving.
//!
//! The base transform comes from a least-squares fit of the first three
//! template points onto the anchors projected at zoom 0, rescaled so the
//! template's unit x vector is `target_unit_px` long, and translated so the
//! template origin lands on pixel zero. Each index pair additionally gets a
//! "squared" sub-transform: the pair plus a synthetic perpendicular third
//! point, fitted exactly, so figures drawn in that frame stay right-angled
//! however the base is sheared.

use std::collections::BTreeMap;

use glam::{DAffine2, DVec2};

use super::geometry::{EPSILON, is_finite_affine, square_third};
use crate::errors::GraphicError;
use crate::log::debug;
use crate::services::Geodesy;
use crate::stencil::IndexPair;
use crate::types::GeoPoint;

/// A template to graphic-pixel mapping at a given pixel scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub matrix: DAffine2,
    /// Projection scale the pixels are measured at (`2^zoom`)
    pub scale_factor: f64,
}

impl AffineTransform {
    pub fn new(matrix: DAffine2, scale_factor: f64) -> Self {
        Self { matrix, scale_factor }
    }

    pub fn apply(&self, p: DVec2) -> DVec2 {
        self.matrix.transform_point2(p)
    }

    pub fn apply_vector(&self, v: DVec2) -> DVec2 {
        self.matrix.transform_vector2(v)
    }

    /// Whether the transform mirrors (negative determinant)
    pub fn is_mirrored(&self) -> bool {
        self.matrix.matrix2.determinant() < 0.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub base: AffineTransform,
    pub sub_transforms: BTreeMap<IndexPair, AffineTransform>,
    /// Geographic position of the template origin
    pub map_origin: GeoPoint,
    /// World pixel of the template origin at `scale_factor`
    pub origin_pixel: DVec2,
    pub zoom: f64,
    pub scale_factor: f64,
}

impl Solution {
    /// Graphic-local pixel of a geographic point
    pub fn to_local(&self, geo: &dyn Geodesy, p: GeoPoint) -> DVec2 {
        geo.to_pixel(p, self.scale_factor) - self.origin_pixel
    }

    /// Geographic point of a graphic-local pixel
    pub fn to_geo(&self, geo: &dyn Geodesy, local: DVec2) -> GeoPoint {
        geo.to_geo(local + self.origin_pixel, self.scale_factor)
    }

    /// The squared frame for `pair`, or the base when the pair was skipped
    pub fn frame(&self, pair: IndexPair) -> &AffineTransform {
        self.sub_transforms.get(&pair).unwrap_or(&self.base)
    }
}

/// Fit `template` onto `anchors` and build the sub-transform of every pair.
pub fn solve(
    geo: &dyn Geodesy,
    template: &[DVec2],
    anchors: &[GeoPoint],
    origin_template: DVec2,
    index_pairs: &[IndexPair],
    target_unit_px: f64,
) -> Result<Solution, GraphicError> {
    let n = template.len().min(anchors.len()).min(3);
    if n == 0 {
        return Err(GraphicError::NonFinite { stage: "fit" });
    }

    let mut src: Vec<DVec2> = template[..n].to_vec();
    let mut dst: Vec<DVec2> = anchors[..n].iter().map(|&a| geo.to_pixel(a, 1.0)).collect();
    if n == 2 {
        src.push(square_third(src[0], src[1], true));
        dst.push(square_third(dst[0], dst[1], true));
    }
    let fit = geo.fit_affine(&src, &dst);

    let observed = fit.matrix2.x_axis.length();
    if !observed.is_finite() || observed <= EPSILON {
        return Err(GraphicError::NonFinite { stage: "scale" });
    }
    let zoom = (target_unit_px / observed).log2();
    let scale_factor = zoom.exp2();
    if !zoom.is_finite() {
        return Err(GraphicError::NonFinite { stage: "scale" });
    }

    let world = DAffine2::from_scale(DVec2::splat(scale_factor)) * fit;
    let origin_pixel = world.transform_point2(origin_template);
    let base = DAffine2::from_translation(-origin_pixel) * world;
    if !is_finite_affine(&base) || !origin_pixel.is_finite() {
        return Err(GraphicError::NonFinite { stage: "base transform" });
    }
    let base = AffineTransform::new(base, scale_factor);

    let local: Vec<DVec2> = anchors
        .iter()
        .map(|&a| geo.to_pixel(a, scale_factor) - origin_pixel)
        .collect();

    // Orientation of the first three anchors on screen
    let anchors_ccw = match local.as_slice() {
        [p0, p1, p2, ..] => (*p1 - *p0).perp_dot(*p2 - *p0) < 0.0,
        _ => false,
    };

    let mut sub_transforms = BTreeMap::new();
    for &pair in index_pairs {
        let (Some(&ti), Some(&tj), Some(&pi), Some(&pj)) = (
            template.get(pair.first),
            template.get(pair.second),
            local.get(pair.first),
            local.get(pair.second),
        ) else {
            debug!(%pair, "index pair outside the anchor list, skipped");
            continue;
        };
        let right = anchors_ccw ^ pair.is_descending();
        let t3 = square_third(ti, tj, true);
        let p3 = square_third(pi, pj, right);
        let mut sub = geo.fit_affine(&[ti, tj, t3], &[pi, pj, p3]);
        sub.translation += base.apply(ti) - sub.transform_point2(ti);
        if !is_finite_affine(&sub) {
            return Err(GraphicError::NonFinite { stage: "sub-transform" });
        }
        sub_transforms.insert(pair, AffineTransform::new(sub, scale_factor));
    }

    let map_origin = geo.to_geo(origin_pixel, scale_factor);
    debug!(zoom, scale_factor, pairs = sub_transforms.len(), "solved transforms");

    Ok(Solution {
        base,
        sub_transforms,
        map_origin,
        origin_pixel,
        zoom,
        scale_factor,
    })
}
