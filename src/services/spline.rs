//! Cubic Bezier control points for smooth curves through anchor points.

use glam::DVec2;

/// Control points for one cubic segment per consecutive point pair.
///
/// Returns `(first, second)` control arrays of equal length: `n - 1` for open
/// curves and `n` for closed ones.
pub trait SplinePrimitive: Send + Sync {
    fn control_points(&self, points: &[DVec2], closed: bool) -> (Vec<DVec2>, Vec<DVec2>);
}

/// Uniform Catmull-Rom interpolation converted to Bezier form.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatmullRom;

impl SplinePrimitive for CatmullRom {
    fn control_points(&self, points: &[DVec2], closed: bool) -> (Vec<DVec2>, Vec<DVec2>) {
        let n = points.len();
        if n < 2 {
            return (Vec::new(), Vec::new());
        }
        let at = |i: isize| -> DVec2 {
            if closed {
                points[i.rem_euclid(n as isize) as usize]
            } else {
                points[i.clamp(0, n as isize - 1) as usize]
            }
        };
        let segments = if closed { n } else { n - 1 };
        let mut first = Vec::with_capacity(segments);
        let mut second = Vec::with_capacity(segments);
        for i in 0..segments as isize {
            let (p0, p1, p2, p3) = (at(i - 1), at(i), at(i + 1), at(i + 2));
            first.push(p1 + (p2 - p0) / 6.0);
            second.push(p2 - (p3 - p1) / 6.0);
        }
        (first, second)
    }
}
