//! Axis-of-advance arrow outlines.
//!
//! Input points run head to tail: `points[0]` is the back corner of one
//! arrowhead barb, `points[1]` the tip, the rest are shaft vertices ending at
//! the tail. The arrowhead is as wide as the barb is far from the shaft; the
//! body is a fixed fraction of that.

use glam::{DAffine2, DVec2};

use super::geometry::{EPSILON, left_normal, line_intersection, project_onto_line};
use super::types::{PathData, SubPath};

#[derive(Debug, Clone, PartialEq)]
pub struct Rotor {
    /// Where the arrowhead cross lines meet
    pub center: DVec2,
    pub glyph: PathData,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ArrowOutline {
    /// Closed outline: tip, barb, one body side, the other reversed, barb
    pub body: PathData,
    /// Line across the body where it meets the arrowhead
    pub neck: PathData,
    /// The barb point projected onto the first shaft segment
    pub waist: DVec2,
    /// Tail end of the shaft
    pub origin: DVec2,
    pub rotor: Option<Rotor>,
}

/// Miter factor `tan(theta / 2)` for the turn from `d_in` to `d_out`
fn miter(d_in: DVec2, d_out: DVec2) -> f64 {
    let denom = d_in.dot(d_out) + 1.0;
    if denom.abs() <= EPSILON {
        0.0
    } else {
        d_in.perp_dot(d_out) / denom
    }
}

/// Left-side offsets of every shaft vertex at `half_width`
fn left_offsets(shaft: &[DVec2], half_width: f64) -> Vec<DVec2> {
    let dirs: Vec<DVec2> = shaft.windows(2).map(|w| (w[1] - w[0]).normalize()).collect();
    (0..shaft.len())
        .map(|i| {
            let (dir, tan) = match i {
                0 => (dirs[0], 0.0),
                i if i == dirs.len() => (dirs[i - 1], 0.0),
                i => (dirs[i - 1], miter(dirs[i - 1], dirs[i])),
            };
            (left_normal(dir) + dir * tan) * half_width
        })
        .collect()
}

/// Build the outline, then map every output point through `transform`.
///
/// `body_ratio` is the body half-width relative to the arrowhead half-width.
/// Returns `None` for fewer than three points or a zero-length first segment.
pub fn generate_arrow(
    points: &[DVec2],
    flip_sides: bool,
    with_rotor: bool,
    body_ratio: f64,
    transform: &DAffine2,
) -> Option<ArrowOutline> {
    let [head, tip, rest @ ..] = points else {
        return None;
    };
    let (head, tip) = (*head, *tip);
    let next = *rest.first()?;
    let u0 = (next - tip).try_normalize()?;

    let waist = project_onto_line(head, tip, next);
    let head_half = head.distance(waist);
    let half_width = head_half * body_ratio;

    let mut shaft = vec![waist];
    for &p in rest {
        if shaft.last().is_some_and(|last| last.distance(p) > EPSILON) {
            shaft.push(p);
        }
    }
    if shaft.len() < 2 {
        shaft.push(waist + u0 * head_half);
    }
    let offsets = left_offsets(&shaft, half_width);
    let normal = left_normal(u0);

    let mut left: Vec<DVec2> = shaft.iter().zip(&offsets).map(|(p, o)| *p + *o).collect();
    let mut right: Vec<DVec2> = shaft.iter().zip(&offsets).map(|(p, o)| *p - *o).collect();
    let mut barbs = (waist + normal * head_half, waist - normal * head_half);
    if flip_sides {
        std::mem::swap(&mut left, &mut right);
        barbs = (barbs.1, barbs.0);
    }

    let mut outline = vec![tip, barbs.0];
    outline.extend(&left);
    outline.extend(right.iter().rev());
    outline.push(barbs.1);

    let mut body = PathData::new();
    body.push_figure(SubPath::polyline(&outline, true)?);
    let mut neck = PathData::new();
    neck.push_figure(SubPath::polyline(&[left[0], right[0]], false)?);

    let rotor = with_rotor
        .then(|| {
            let bl = waist + normal * head_half;
            let br = waist - normal * head_half;
            let neck_at = waist + u0 * head_half;
            let (nl, nr) = (neck_at + normal * half_width, neck_at - normal * half_width);
            let center = line_intersection(bl, nr, br, nl)?;
            Some(Rotor {
                center,
                glyph: rotor_glyph(center, u0, half_width, [(bl, nr), (br, nl)]),
            })
        })
        .flatten();

    let origin = *shaft.last()?;
    Some(ArrowOutline {
        body: body.transform(transform),
        neck: neck.transform(transform),
        waist: transform.transform_point2(waist),
        origin: transform.transform_point2(origin),
        rotor: rotor.map(|r| Rotor {
            center: transform.transform_point2(r.center),
            glyph: r.glyph.transform(transform),
        }),
    })
}

/// Cross lines, a stem toward the tail, a two-arc hub and a crossbar
fn rotor_glyph(center: DVec2, along: DVec2, half_width: f64, cross: [(DVec2, DVec2); 2]) -> PathData {
    let side = left_normal(along);
    let hub = half_width * 0.25;
    let stem_end = center + along * half_width;
    let bar = side * half_width * 0.5;
    let (h0, h1) = (center - side * hub, center + side * hub);

    let mut glyph = PathData::new();
    for (a, b) in cross {
        if let Some(line) = SubPath::polyline(&[a, b], false) {
            glyph.push_figure(line);
        }
    }
    glyph
        .m(h0.x, h0.y)
        .a(hub, hub, 0.0, false, true, h1.x, h1.y)
        .a(hub, hub, 0.0, false, true, h0.x, h0.y)
        .z()
        .m(center.x, center.y)
        .l(stem_end.x, stem_end.y)
        .m(stem_end.x - bar.x, stem_end.y - bar.y)
        .l(stem_end.x + bar.x, stem_end.y + bar.y)
}
