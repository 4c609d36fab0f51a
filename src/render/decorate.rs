//! Decorated line and region paths.
//!
//! A decoration tiles the whole polyline with an integer number of equal
//! ticks, so the last tick is never squeezed. Each tick spans two steps:
//!
//! - `Triangular`: a flat step, then a step bulging into a triangle
//! - `SolidTriangular`: filled triangles, plus a lens "mine" on the flat step
//!   of every other tick
//! - `Square`: a flat step, then a rectangular crenel
//! - `Saw`: an apex on every step, mirrored back on the other side to close a
//!   ribbon
//! - `Echelon`: like `Triangular`, but every fifth tick is left blank and the
//!   path restarts after it

use glam::DVec2;

use super::defaults::SPLINE_SAMPLES;
use super::geometry::{EPSILON, PolylineWalker, left_normal, point_in_polygon, polyline_length};
use super::types::{PathData, PathElement, Segment, Style, SubPath};
use crate::services::SplinePrimitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorationStyle {
    Triangular,
    SolidTriangular,
    Square,
    Saw,
    Echelon,
}

impl DecorationStyle {
    /// Tick length as a multiple of the nominal tick size
    pub fn tiling(self) -> f64 {
        match self {
            DecorationStyle::Saw => 0.5,
            _ => 1.0,
        }
    }
}

/// Which side of the line the ornaments face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
    /// Toward the interior of the (implicitly closed) polygon
    Inside,
    Outside,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decoration {
    pub style: DecorationStyle,
    pub side: Side,
    /// Nominal tick size in pixels
    pub tick_size: f64,
}

/// Number of ticks laid over a line of `length`: `max(1, round(L / (S * k)))`
pub fn tick_count(length: f64, tick_size: f64, style: DecorationStyle) -> usize {
    if length <= EPSILON || tick_size <= EPSILON {
        return 0;
    }
    ((length / (tick_size * style.tiling())).round() as usize).max(1)
}

/// Straight-segment line or polygon, decorated when requested.
pub fn generate_line(points: &[DVec2], closed: bool, decoration: Option<&Decoration>) -> PathElement {
    match decoration {
        Some(d) => decorate(points, closed, d),
        None => {
            let mut path = PathData::new();
            if let Some(fig) = SubPath::polyline(points, closed && points.len() > 2) {
                path.push_figure(fig);
            }
            PathElement::outline(path)
        }
    }
}

/// Smooth curve through `points`. Decorations are laid along the flattened
/// curve.
pub fn generate_spline(
    points: &[DVec2],
    closed: bool,
    spline: &dyn SplinePrimitive,
    decoration: Option<&Decoration>,
) -> PathElement {
    if points.len() < 3 {
        return generate_line(points, closed, decoration);
    }
    let (c1, c2) = spline.control_points(points, closed);
    let mut path = PathData::new().m(points[0].x, points[0].y);
    for (i, (a, b)) in c1.iter().zip(&c2).enumerate() {
        path = path.c(*a, *b, points[(i + 1) % points.len()]);
    }
    if closed {
        path = path.z();
    }
    match decoration {
        None => PathElement::outline(path),
        Some(d) => {
            let mut flat = path.flatten(SPLINE_SAMPLES).into_iter().next().unwrap_or_default();
            if closed {
                // The flattened curve already returns to its start
                flat.pop();
            }
            decorate(&flat, closed, d)
        }
    }
}

/// Station points along the line: `2 * ticks + 1` positions, each with the
/// polyline vertices crossed on the way to it.
struct Stations {
    points: Vec<DVec2>,
    passed: Vec<Vec<DVec2>>,
}

impl Stations {
    fn walk(line: &[DVec2], steps: usize, step: f64) -> Self {
        let mut walker = PolylineWalker::new(line);
        let mut points = vec![line[0]];
        let mut passed = vec![Vec::new()];
        for k in 1..=steps {
            let mut crossed = Vec::new();
            let p = walker.advance(step, &mut crossed);
            // Pin the final station so rounding never overruns the end
            points.push(if k == steps { line[line.len() - 1] } else { p });
            passed.push(crossed);
        }
        Stations { points, passed }
    }
}

fn decorate(points: &[DVec2], closed: bool, deco: &Decoration) -> PathElement {
    let mut line = points.to_vec();
    let closed = closed && points.len() > 2;
    if closed {
        line.push(points[0]);
    }
    let length = polyline_length(&line);
    let ticks = tick_count(length, deco.tick_size, deco.style);
    if ticks == 0 || line.len() < 2 {
        return generate_line(points, closed, None);
    }

    let step = length / ticks as f64 / 2.0;
    let height = step;
    let st = Stations::walk(&line, ticks * 2, step);
    let normal = |a: DVec2, b: DVec2| side_normal(a, b, deco.side, points, step);
    let apex = |a: DVec2, b: DVec2, sign: f64| (a + b) * 0.5 + normal(a, b) * height * sign;

    let mut path = PathData::new();
    let style = match deco.style {
        DecorationStyle::Triangular | DecorationStyle::Echelon => {
            let mut fig = SubPath::new(st.points[0]);
            for t in 0..ticks {
                let (m, b) = (2 * t + 1, 2 * t + 2);
                if deco.style == DecorationStyle::Echelon && t % 5 == 4 {
                    path.push_figure(std::mem::replace(&mut fig, SubPath::new(st.points[b])));
                    continue;
                }
                line_through(&mut fig, &st.passed[m], st.points[m]);
                let tip = apex(st.points[m], st.points[b], 1.0);
                line_through(&mut fig, &[tip], tip);
                line_through(&mut fig, &st.passed[b], st.points[b]);
            }
            if !fig.segments.is_empty() {
                path.push_figure(fig);
            }
            Style::OUTLINE
        }
        DecorationStyle::SolidTriangular => {
            for w in line.windows(2) {
                if let Some(seg) = SubPath::polyline(w, false) {
                    path.push_figure(seg);
                }
            }
            for t in 0..ticks {
                let (a, m, b) = (2 * t, 2 * t + 1, 2 * t + 2);
                let tip = apex(st.points[m], st.points[b], 1.0);
                if let Some(tri) = SubPath::polyline(&[st.points[m], tip, st.points[b]], true) {
                    path.push_figure(tri);
                }
                if t % 2 == 1 {
                    path.extend(mine(st.points[a], st.points[m]));
                }
            }
            Style::FILLED
        }
        DecorationStyle::Square => {
            let mut fig = SubPath::new(st.points[0]);
            for t in 0..ticks {
                let (m, b) = (2 * t + 1, 2 * t + 2);
                line_through(&mut fig, &st.passed[m], st.points[m]);
                let n = normal(st.points[m], st.points[b]) * height;
                line_through(&mut fig, &[st.points[m] + n], st.points[b] + n);
                line_through(&mut fig, &st.passed[b], st.points[b]);
            }
            path.push_figure(fig);
            Style::OUTLINE
        }
        DecorationStyle::Saw => {
            let steps = ticks * 2;
            let mut fig = SubPath::new(st.points[0]);
            for k in 0..steps {
                let tip = apex(st.points[k], st.points[k + 1], 1.0);
                line_through(&mut fig, &[tip], tip);
                line_through(&mut fig, &st.passed[k + 1], st.points[k + 1]);
            }
            for k in (0..steps).rev() {
                let tip = apex(st.points[k], st.points[k + 1], -1.0);
                let back: Vec<DVec2> = st.passed[k + 1].iter().rev().copied().collect();
                line_through(&mut fig, &back, tip);
                line_through(&mut fig, &[], st.points[k]);
            }
            fig.closed = true;
            path.push_figure(fig);
            Style::OUTLINE
        }
    };
    PathElement::new(path, style)
}

/// Append the crossed vertices, then `to`
fn line_through(fig: &mut SubPath, crossed: &[DVec2], to: DVec2) {
    for &v in crossed {
        if fig.segments.last().map(|s| s.end()) != Some(v) {
            fig.segments.push(Segment::Line(v));
        }
    }
    if fig.segments.last().map(|s| s.end()) != Some(to) {
        fig.segments.push(Segment::Line(to));
    }
}

/// Normal of the chord `a -> b` facing the requested side.
fn side_normal(a: DVec2, b: DVec2, side: Side, polygon: &[DVec2], probe: f64) -> DVec2 {
    let left = left_normal((b - a).normalize_or_zero());
    match side {
        Side::Left => left,
        Side::Right => -left,
        Side::Inside | Side::Outside => {
            let inside = point_in_polygon((a + b) * 0.5 + left * probe * 0.5, polygon);
            if inside == (side == Side::Inside) { left } else { -left }
        }
    }
}

/// Lens made of two arcs across the middle of `a -> b`
fn mine(a: DVec2, b: DVec2) -> PathData {
    let center = (a + b) * 0.5;
    let u = (b - a).normalize_or_zero();
    let half = a.distance(b) / 3.0;
    let r = half * 1.25;
    let (p0, p1) = (center - u * half, center + u * half);
    PathData::new()
        .m(p0.x, p0.y)
        .a(r, r, 0.0, false, true, p1.x, p1.y)
        .a(r, r, 0.0, false, true, p0.x, p0.y)
        .z()
}
