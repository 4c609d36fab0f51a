//! Geometry functions: affine fitting, squaring, polyline walking.
//!
//! All coordinates are y-down (template and pixel space alike), so a positive
//! `perp_dot` means the second vector turns clockwise on screen.

use glam::{DAffine2, DMat2, DMat3, DVec2, DVec3, dvec2, dvec3};

/// Below this, determinants and lengths count as zero.
pub const EPSILON: f64 = 1e-12;

/// Rotate a vector a quarter turn clockwise on screen (y-down).
#[inline]
pub fn rot_cw(v: DVec2) -> DVec2 {
    v.perp()
}

/// Rotate a vector a quarter turn counter-clockwise on screen (y-down).
#[inline]
pub fn rot_ccw(v: DVec2) -> DVec2 {
    -v.perp()
}

/// The "left" normal of a direction: the unit normal whose cross product with
/// the direction is negative. On screen this is the left-hand side when
/// travelling along `dir`.
#[inline]
pub fn left_normal(dir: DVec2) -> DVec2 {
    dvec2(dir.y, -dir.x)
}

/// Synthesize a third point by turning `b` a quarter turn about itself
/// relative to `a`, keeping the distance `|a - b|`.
///
/// `right` turns clockwise on screen, which matches a +90 degree bearing turn
/// on the map.
pub fn square_third(a: DVec2, b: DVec2, right: bool) -> DVec2 {
    let v = a - b;
    b + if right { rot_cw(v) } else { rot_ccw(v) }
}

/// Least-squares affine fit mapping `src[i]` onto `dst[i]`.
///
/// Exact for three non-collinear correspondences. Degenerate input falls back
/// to a similarity through the first two distinct points, then to a pure
/// translation, then to identity.
pub fn fit_affine(src: &[DVec2], dst: &[DVec2]) -> DAffine2 {
    let n = src.len().min(dst.len());
    if n == 0 {
        return DAffine2::IDENTITY;
    }
    if n >= 3 {
        let mut normal = DMat3::ZERO;
        let mut bx = DVec3::ZERO;
        let mut by = DVec3::ZERO;
        for (s, d) in src.iter().zip(dst).take(n) {
            let v = dvec3(s.x, s.y, 1.0);
            normal = normal + DMat3::from_cols(v * v.x, v * v.y, v * v.z);
            bx += v * d.x;
            by += v * d.y;
        }
        if normal.determinant().abs() > EPSILON {
            let inv = normal.inverse();
            let cx = inv * bx;
            let cy = inv * by;
            return DAffine2::from_cols_array(&[cx.x, cy.x, cx.y, cy.y, cx.z, cy.z]);
        }
    }
    // Collinear or two-point input: best-effort similarity
    let s0 = src[0];
    let d0 = dst[0];
    match (1..n).find(|&i| (src[i] - s0).length_squared() > EPSILON) {
        Some(i) => similarity(s0, src[i], d0, dst[i]),
        None => DAffine2::from_translation(d0 - s0),
    }
}

/// The orientation-preserving similarity taking `s0 -> d0` and `s1 -> d1`.
pub fn similarity(s0: DVec2, s1: DVec2, d0: DVec2, d1: DVec2) -> DAffine2 {
    let s = s1 - s0;
    let d = d1 - d0;
    let len2 = s.length_squared();
    if len2 <= EPSILON {
        return DAffine2::from_translation(d0 - s0);
    }
    let a = (d.x * s.x + d.y * s.y) / len2;
    let b = (d.y * s.x - d.x * s.y) / len2;
    let linear = DMat2::from_cols(dvec2(a, b), dvec2(-b, a));
    DAffine2::from_mat2_translation(linear, d0 - linear * s0)
}

/// Whether every coefficient of a transform is finite
pub fn is_finite_affine(t: &DAffine2) -> bool {
    t.matrix2.x_axis.is_finite() && t.matrix2.y_axis.is_finite() && t.translation.is_finite()
}

/// Project `p` onto the infinite line through `a` and `b`.
pub fn project_onto_line(p: DVec2, a: DVec2, b: DVec2) -> DVec2 {
    let u = (b - a).normalize_or_zero();
    a + u * (p - a).dot(u)
}

/// Intersection of lines `a0 -> a1` and `b0 -> b1`, `None` when parallel.
pub fn line_intersection(a0: DVec2, a1: DVec2, b0: DVec2, b1: DVec2) -> Option<DVec2> {
    let r = a1 - a0;
    let s = b1 - b0;
    let denom = r.perp_dot(s);
    if denom.abs() <= EPSILON {
        return None;
    }
    let t = (b0 - a0).perp_dot(s) / denom;
    Some(a0 + r * t)
}

/// Even-odd point in polygon test. The polygon is implicitly closed.
pub fn point_in_polygon(p: DVec2, polygon: &[DVec2]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x = pj.x + (p.y - pj.y) * (pi.x - pj.x) / (pi.y - pj.y);
            if p.x < x {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Signed shoelace area; positive when the points run clockwise on screen.
pub fn signed_area(points: &[DVec2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        sum += points[i].perp_dot(points[(i + 1) % n]);
    }
    sum * 0.5
}

/// Area centroid of a closed polygon, falling back to the vertex average for
/// degenerate shapes.
pub fn polygon_centroid(points: &[DVec2]) -> DVec2 {
    if points.is_empty() {
        return DVec2::ZERO;
    }
    let area = signed_area(points);
    if area.abs() <= EPSILON {
        return points.iter().copied().sum::<DVec2>() / points.len() as f64;
    }
    let n = points.len();
    let mut c = DVec2::ZERO;
    for i in 0..n {
        let (p, q) = (points[i], points[(i + 1) % n]);
        c += (p + q) * p.perp_dot(q);
    }
    c / (6.0 * area)
}

/// Total length of a polyline
pub fn polyline_length(points: &[DVec2]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// The point `fraction` of the way along a polyline, with the direction of the
/// segment it falls on.
pub fn point_along(points: &[DVec2], fraction: f64) -> Option<(DVec2, DVec2)> {
    let first = *points.first()?;
    let total = polyline_length(points);
    let mut remaining = total * fraction.clamp(0.0, 1.0);
    let mut last_dir = DVec2::X;
    for w in points.windows(2) {
        let len = w[0].distance(w[1]);
        if len <= EPSILON {
            continue;
        }
        last_dir = (w[1] - w[0]) / len;
        if remaining <= len {
            return Some((w[0] + last_dir * remaining, last_dir));
        }
        remaining -= len;
    }
    let end = points.last().copied().unwrap_or(first);
    Some((end, last_dir))
}

/// A cursor that walks a polyline by arc length, carrying leftover distance
/// across vertices.
#[derive(Debug, Clone)]
pub struct PolylineWalker<'a> {
    points: &'a [DVec2],
    /// Index of the segment start the cursor is on
    segment: usize,
    /// Distance already consumed on the current segment
    offset: f64,
}

impl<'a> PolylineWalker<'a> {
    pub fn new(points: &'a [DVec2]) -> Self {
        Self {
            points,
            segment: 0,
            offset: 0.0,
        }
    }

    /// Current position
    pub fn position(&self) -> DVec2 {
        match (self.points.get(self.segment), self.points.get(self.segment + 1)) {
            (Some(&a), Some(&b)) => {
                let len = a.distance(b);
                if len <= EPSILON {
                    a
                } else {
                    a + (b - a) * (self.offset / len)
                }
            }
            (Some(&a), None) => a,
            _ => DVec2::ZERO,
        }
    }

    /// Advance by `distance`, pushing every vertex crossed into `passed`.
    pub fn advance(&mut self, distance: f64, passed: &mut Vec<DVec2>) -> DVec2 {
        let mut remaining = distance;
        while self.segment + 1 < self.points.len() {
            let a = self.points[self.segment];
            let b = self.points[self.segment + 1];
            let left = a.distance(b) - self.offset;
            if remaining < left {
                self.offset += remaining;
                return self.position();
            }
            remaining -= left;
            self.segment += 1;
            self.offset = 0.0;
            if self.segment + 1 < self.points.len() {
                passed.push(b);
            }
        }
        self.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point_eq(actual: DVec2, expected: DVec2) {
        const EPSILON: f64 = 1e-9;
        assert!(
            (actual - expected).length() < EPSILON,
            "point mismatch: {actual} != {expected}"
        );
    }

    #[test]
    fn rotations_follow_screen_convention() {
        // East rotated clockwise on a y-down screen points south.
        assert_point_eq(rot_cw(DVec2::X), dvec2(0.0, 1.0));
        assert_point_eq(rot_ccw(DVec2::X), dvec2(0.0, -1.0));
        assert!(DVec2::X.perp_dot(left_normal(DVec2::X)) < 0.0);
    }

    #[test]
    fn square_third_turns_about_second_point() {
        let a = dvec2(0.0, 0.0);
        let b = dvec2(1.0, 0.0);
        assert_point_eq(square_third(a, b, true), dvec2(1.0, -1.0));
        assert_point_eq(square_third(a, b, false), dvec2(1.0, 1.0));
    }

    #[test]
    fn fit_is_exact_for_three_points() {
        let truth = DAffine2::from_cols_array(&[2.0, 0.5, -0.3, 1.5, 10.0, -4.0]);
        let src = [dvec2(0.0, 0.0), dvec2(1.0, 0.0), dvec2(0.0, 1.0)];
        let dst: Vec<DVec2> = src.iter().map(|&p| truth.transform_point2(p)).collect();
        let fit = fit_affine(&src, &dst);
        for (s, d) in src.iter().zip(&dst) {
            assert_point_eq(fit.transform_point2(*s), *d);
        }
    }

    #[test]
    fn fit_recovers_transform_from_many_points() {
        let truth = DAffine2::from_angle_translation(0.7, dvec2(3.0, 4.0));
        let src = [
            dvec2(-0.5, -0.5),
            dvec2(0.5, -0.5),
            dvec2(0.5, 0.5),
            dvec2(-0.5, 0.5),
            dvec2(0.1, 0.2),
        ];
        let dst: Vec<DVec2> = src.iter().map(|&p| truth.transform_point2(p)).collect();
        let fit = fit_affine(&src, &dst);
        assert_point_eq(fit.transform_point2(dvec2(2.0, -1.0)), truth.transform_point2(dvec2(2.0, -1.0)));
    }

    #[test]
    fn collinear_fit_falls_back_to_similarity() {
        let src = [dvec2(0.0, 0.0), dvec2(1.0, 0.0), dvec2(2.0, 0.0)];
        let dst = [dvec2(5.0, 5.0), dvec2(5.0, 7.0), dvec2(5.0, 9.0)];
        let fit = fit_affine(&src, &dst);
        assert_point_eq(fit.transform_point2(src[1]), dst[1]);
        // Quarter turn with scale 2
        assert_point_eq(fit.transform_vector2(DVec2::Y), dvec2(-2.0, 0.0));
    }

    #[test]
    fn coincident_fit_is_translation() {
        let src = [dvec2(1.0, 1.0), dvec2(1.0, 1.0)];
        let dst = [dvec2(3.0, 0.0), dvec2(9.0, 9.0)];
        let fit = fit_affine(&src, &dst);
        assert_point_eq(fit.transform_point2(src[0]), dst[0]);
        assert_eq!(fit.matrix2, DMat2::IDENTITY);
        assert_eq!(fit_affine(&[], &[]), DAffine2::IDENTITY);
    }

    #[test]
    fn intersection_and_projection() {
        let p = line_intersection(
            dvec2(0.0, 0.0),
            dvec2(2.0, 2.0),
            dvec2(0.0, 2.0),
            dvec2(2.0, 0.0),
        );
        assert_point_eq(p.unwrap(), dvec2(1.0, 1.0));
        assert!(line_intersection(DVec2::ZERO, DVec2::X, DVec2::Y, dvec2(1.0, 1.0)).is_none());
        assert_point_eq(
            project_onto_line(dvec2(3.0, 5.0), DVec2::ZERO, dvec2(10.0, 0.0)),
            dvec2(3.0, 0.0),
        );
    }

    #[test]
    fn polygon_queries() {
        let square = [
            dvec2(0.0, 0.0),
            dvec2(4.0, 0.0),
            dvec2(4.0, 4.0),
            dvec2(0.0, 4.0),
        ];
        assert!(point_in_polygon(dvec2(2.0, 2.0), &square));
        assert!(!point_in_polygon(dvec2(5.0, 2.0), &square));
        assert_eq!(signed_area(&square), 16.0);
        assert_point_eq(polygon_centroid(&square), dvec2(2.0, 2.0));
    }

    #[test]
    fn point_along_polyline() {
        let pts = [dvec2(0.0, 0.0), dvec2(10.0, 0.0), dvec2(10.0, 10.0)];
        assert_eq!(polyline_length(&pts), 20.0);
        let (p, d) = point_along(&pts, 0.75).unwrap();
        assert_point_eq(p, dvec2(10.0, 5.0));
        assert_point_eq(d, dvec2(0.0, 1.0));
        let (p, _) = point_along(&pts, 1.0).unwrap();
        assert_point_eq(p, dvec2(10.0, 10.0));
    }

    #[test]
    fn walker_carries_leftover_across_vertices() {
        let pts = [dvec2(0.0, 0.0), dvec2(3.0, 0.0), dvec2(3.0, 4.0)];
        let mut walker = PolylineWalker::new(&pts);
        let mut passed = Vec::new();
        assert_point_eq(walker.advance(2.0, &mut passed), dvec2(2.0, 0.0));
        assert!(passed.is_empty());
        assert_point_eq(walker.advance(2.0, &mut passed), dvec2(3.0, 1.0));
        assert_eq!(passed, vec![dvec2(3.0, 0.0)]);
        // Overshooting clamps to the final vertex
        assert_point_eq(walker.advance(100.0, &mut passed), dvec2(3.0, 4.0));
    }
}
