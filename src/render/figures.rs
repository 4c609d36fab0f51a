//! Control-template figures drawn from template points.
//!
//! Figures are laid out in template space and mapped through the base
//! transform or the squared sub-transform of one of their index pairs.
//! Arrowheads and letters always take the linear part of a squared frame so
//! they keep their shape when the base is sheared.

use glam::{DAffine2, DVec2, dvec2};

use super::defaults::FIGURE_ARROWHEAD;
use super::geometry::rot_cw;
use super::label::orient_label;
use super::transform::Solution;
use super::types::{Element, PathData, PathElement, Stroke, Style, SubPath};
use crate::render::defaults::Settings;
use crate::services::{TextMetrics, TextStyle};
use crate::stencil::{FigureKind, IndexPair};

pub struct FigureContext<'a> {
    pub template: &'a [DVec2],
    pub solution: &'a Solution,
    /// Derived anchors in graphic pixels
    pub local: &'a [DVec2],
    pub metrics: &'a dyn TextMetrics,
    pub text_style: TextStyle,
    pub settings: &'a Settings,
}

type Named = Vec<(String, Element)>;

impl FigureContext<'_> {
    fn t(&self, i: usize) -> DVec2 {
        self.template.get(i).copied().unwrap_or_default()
    }

    fn base(&self) -> &DAffine2 {
        &self.solution.base.matrix
    }

    fn frame(&self, pair: &str) -> &DAffine2 {
        match IndexPair::parse(pair) {
            Some(p) => &self.solution.frame(p).matrix,
            None => self.base(),
        }
    }

    fn polyline(&self, points: &[DVec2]) -> PathData {
        let mut path = PathData::new();
        if let Some(fig) = SubPath::polyline(points, false) {
            path.push_figure(fig);
        }
        path
    }

    /// Open arrowhead with its point on `tip`, facing `dir` (template space)
    fn arrowhead(&self, pair: &str, tip: DVec2, dir: DVec2) -> PathElement {
        let linear = self.frame(pair).matrix2;
        let at = self.base().transform_point2(tip);
        let d = dir.normalize_or(DVec2::X) * FIGURE_ARROWHEAD;
        let n = rot_cw(d) * 0.5;
        let (a, b) = (at + linear * (n - d), at + linear * (-n - d));
        PathElement::outline(PathData::new().m(a.x, a.y).l(at.x, at.y).l(b.x, b.y))
    }

    /// Centered letter at a graphic pixel, in the frame of `pair`
    fn letter(&self, text: &str, at: DVec2, pair: &str) -> Element {
        let size = self.metrics.measure(text, &self.text_style);
        orient_label(text, self.frame(pair), at, -size * 0.5, size).into()
    }

    /// Letter beside a pixel, offset by the label gap along the frame x axis
    fn letter_beside(&self, text: &str, at: DVec2, pair: &str) -> Element {
        let size = self.metrics.measure(text, &self.text_style);
        let offset = dvec2(self.settings.label_gap, -size.y * 0.5);
        orient_label(text, self.frame(pair), at, offset, size).into()
    }

    /// Letter centered above a pixel
    fn letter_above(&self, text: &str, at: DVec2, pair: &str) -> Element {
        let size = self.metrics.measure(text, &self.text_style);
        let offset = dvec2(-size.x * 0.5, -size.y - self.settings.label_gap);
        orient_label(text, self.frame(pair), at, offset, size).into()
    }
}

fn named(out: &mut Named, name: &str, element: impl Into<Element>) {
    out.push((name.to_string(), element.into()));
}

/// Zig-zag from `a` to `b` with `teeth` teeth of `amplitude` (template space)
fn zigzag(a: DVec2, b: DVec2, teeth: usize, amplitude: f64) -> Vec<DVec2> {
    let n = rot_cw((b - a).normalize_or_zero()) * amplitude;
    let steps = teeth * 2;
    (0..=steps)
        .map(|i| {
            let p = a.lerp(b, i as f64 / steps as f64);
            match i % 2 {
                _ if i == 0 || i == steps => p,
                1 => p + n,
                _ => p - n,
            }
        })
        .collect()
}

pub fn draw_figure(kind: FigureKind, cx: &FigureContext) -> Named {
    let mut out = Named::new();
    match kind {
        FigureKind::Security(letter) => security(cx, letter, &mut out),
        FigureKind::Contain => contain(cx, &mut out),
        FigureKind::Clear => clear(cx, &mut out),
        FigureKind::Roadblock => roadblock(cx, &mut out),
        FigureKind::BypassEasy | FigureKind::BypassDifficult | FigureKind::BypassImpossible => {
            bypass(cx, kind, &mut out)
        }
        FigureKind::FordEasy | FigureKind::FordDifficult => ford(cx, kind == FigureKind::FordDifficult, &mut out),
        FigureKind::TripWire => trip_wire(cx, &mut out),
        FigureKind::Withdraw => withdraw(cx, "W", &mut out),
        FigureKind::WithdrawUnderPressure => withdraw(cx, "WP", &mut out),
        FigureKind::Delay => withdraw(cx, "D", &mut out),
        FigureKind::Retirement => withdraw(cx, "R", &mut out),
        FigureKind::Block | FigureKind::Penetrate | FigureKind::Canalize => two_point(cx, kind, &mut out),
    }
    out
}

fn security(cx: &FigureContext, letter: char, out: &mut Named) {
    let (t0, t1, t2, t3) = (cx.t(0), cx.t(1), cx.t(2), cx.t(3));
    let v = cx.polyline(&[t1, t0, t2]).transform(cx.base());
    named(out, "Boundary", PathElement::outline(v));
    named(out, "Arrowhead0", cx.arrowhead("21", t1, t1 - t0));
    named(out, "Arrowhead1", cx.arrowhead("31", t2, t2 - t0));
    let at = cx
        .local
        .get(3)
        .copied()
        .unwrap_or_else(|| cx.base().transform_point2(t3));
    named(out, "Label0", cx.letter(&letter.to_string(), at, ""));
}

fn contain(cx: &FigureContext, out: &mut Named) {
    let (t0, t1, t2, t3) = (cx.t(0), cx.t(1), cx.t(2), cx.t(3));
    let r = t0.distance(t1) * 0.5;
    let arc = PathData::new().m(t0.x, t0.y).a(r, r, 0.0, false, true, t1.x, t1.y);
    named(out, "Boundary", PathElement::outline(arc.transform(cx.frame("21"))));
    named(out, "Stem", PathElement::outline(cx.polyline(&[t2, t3]).transform(cx.frame("43"))));
    named(out, "Arrowhead0", cx.arrowhead("43", t3, t3 - t2));
    let mid = cx.frame("43").transform_point2((t2 + t3) * 0.5);
    named(out, "Label0", cx.letter_beside("C", mid, "43"));
}

fn clear(cx: &FigureContext, out: &mut Named) {
    let t: Vec<DVec2> = (0..6).map(|i| cx.t(i)).collect();
    named(out, "Boundary", PathElement::outline(cx.polyline(&[t[0], t[1]]).transform(cx.base())));
    let arrows = [(t[4], t[0], "21"), (t[2], t[3], "43"), (t[5], t[1], "65")];
    for (i, (from, to, pair)) in arrows.into_iter().enumerate() {
        let stem = cx.polyline(&[from, to]).transform(cx.base());
        named(out, &format!("Stem{i}"), PathElement::outline(stem));
        named(out, &format!("Arrowhead{i}"), cx.arrowhead(pair, to, to - from));
    }
    let mid = cx.base().transform_point2((t[2] + t[3]) * 0.5);
    named(out, "Label0", cx.letter_beside("C", mid, "43"));
}

fn roadblock(cx: &FigureContext, out: &mut Named) {
    let (t0, t1, t2, t3, t4, t5) = (cx.t(0), cx.t(1), cx.t(2), cx.t(3), cx.t(4), cx.t(5));
    let mut lines = cx.polyline(&[t0, t1]);
    lines.extend(cx.polyline(&[t4, t5]));
    named(out, "Boundary", PathElement::outline(lines.transform(cx.base())));

    let half = (t1 - t0).normalize_or_zero() * 0.1;
    let corners = [t3 - half, t3 + half, t2 + half, t2 - half];
    let mut block = PathData::new();
    if let Some(fig) = SubPath::polyline(&corners, true) {
        block.push_figure(fig);
    }
    named(out, "Block", PathElement::new(block.transform(cx.frame("43")), Style::FILLED));
}

fn bypass(cx: &FigureContext, kind: FigureKind, out: &mut Named) {
    let (t0, t1, t2, t3, t4, t5) = (cx.t(0), cx.t(1), cx.t(2), cx.t(3), cx.t(4), cx.t(5));
    let g0 = t0.lerp(t1, 0.4);
    let g1 = t0.lerp(t1, 0.6);
    let mut bracket = PathData::new();
    match kind {
        FigureKind::BypassDifficult => {
            let mut pts = vec![t4, t0];
            pts.extend(zigzag(t0.lerp(t1, 0.3), t0.lerp(t1, 0.7), 4, 0.06));
            pts.extend([t1, t5]);
            bracket.extend(cx.polyline(&pts));
        }
        FigureKind::BypassImpossible => {
            let bar = rot_cw((t1 - t0).normalize_or_zero()) * 0.1;
            bracket.extend(cx.polyline(&[t4, t0, g0]));
            bracket.extend(cx.polyline(&[g1, t1, t5]));
            bracket.extend(cx.polyline(&[g0 - bar, g0 + bar]));
            bracket.extend(cx.polyline(&[g1 - bar, g1 + bar]));
        }
        _ => bracket.extend(cx.polyline(&[t4, t0, t1, t5])),
    }
    named(out, "Boundary", PathElement::outline(bracket.transform(cx.base())));
    named(out, "Arrowhead0", cx.arrowhead("21", t4, t4 - t0));
    named(out, "Arrowhead1", cx.arrowhead("65", t5, t5 - t1));
    let mid = cx.base().transform_point2((t2 + t3) * 0.5);
    named(out, "Label0", cx.letter("B", mid, "43"));
}

fn ford(cx: &FigureContext, difficult: bool, out: &mut Named) {
    let (t0, t1, t2, t3, t4, t5) = (cx.t(0), cx.t(1), cx.t(2), cx.t(3), cx.t(4), cx.t(5));
    let mut banks = cx.polyline(&[t0, t4]);
    banks.extend(cx.polyline(&[t1, t5]));
    named(out, "Boundary", PathElement::outline(banks.transform(cx.base())));
    let stem = if difficult {
        zigzag(t2, t3, 3, 0.06)
    } else {
        vec![t2, t3]
    };
    named(out, "Stem", PathElement::outline(cx.polyline(&stem).transform(cx.frame("43"))));
    named(out, "Arrowhead0", cx.arrowhead("43", t3, t3 - t2));
}

fn trip_wire(cx: &FigureContext, out: &mut Named) {
    let (t0, t1, t2, t3, t5) = (cx.t(0), cx.t(1), cx.t(2), cx.t(3), cx.t(5));
    named(out, "Boundary", PathElement::outline(cx.polyline(&[t0, t1]).transform(cx.base())));
    named(out, "Stem", PathElement::outline(cx.polyline(&[t3, t2]).transform(cx.frame("43"))));
    named(
        out,
        "Wire",
        PathElement::outline(cx.polyline(&[t2, t5]).transform(cx.base())).with_stroke(Stroke::Dashed),
    );
    let up = (t2 - t3).normalize_or_zero() * 0.1;
    let side = rot_cw(up) * 0.5;
    let mut marker = PathData::new();
    if let Some(fig) = SubPath::polyline(&[t3, t3 + up + side, t3 + up - side], true) {
        marker.push_figure(fig);
    }
    named(out, "Marker", PathElement::new(marker.transform(cx.frame("43")), Style::FILLED));
}

fn withdraw(cx: &FigureContext, letter: &str, out: &mut Named) {
    let (t0, t1, t2) = (cx.t(0), cx.t(1), cx.t(2));
    named(out, "Boundary", PathElement::outline(cx.polyline(&[t0, t1]).transform(cx.base())));
    let r = t1.distance(t2) * 0.5;
    let arc = PathData::new().m(t1.x, t1.y).a(r, r, 0.0, false, true, t2.x, t2.y);
    named(out, "Arc", PathElement::outline(arc.transform(cx.frame("32"))));
    // A clockwise half turn ends heading back along the base leg
    named(out, "Arrowhead0", cx.arrowhead("32", t2, t0 - t1));
    let mid = cx.base().transform_point2((t0 + t1) * 0.5);
    named(out, "Label0", cx.letter_above(letter, mid, "21"));
}

fn two_point(cx: &FigureContext, kind: FigureKind, out: &mut Named) {
    let (t0, t1, t2) = (cx.t(0), cx.t(1), cx.t(2));
    let mid = (t0 + t1) * 0.5;
    let reach = t2 - t1;
    let stem_end = mid + reach;
    let (front, letter) = match kind {
        FigureKind::Canalize => (cx.polyline(&[t0 + reach * 0.35, t0, t1, t1 + reach * 0.35]), "C"),
        FigureKind::Penetrate => (cx.polyline(&[t0, t1]), "P"),
        _ => (cx.polyline(&[t0, t1]), "B"),
    };
    named(out, "Boundary", PathElement::outline(front.transform(cx.base())));
    match kind {
        FigureKind::Canalize => {}
        FigureKind::Penetrate => {
            named(out, "Stem", PathElement::outline(cx.polyline(&[stem_end, mid]).transform(cx.base())));
            named(out, "Arrowhead0", cx.arrowhead("", mid, mid - stem_end));
        }
        _ => named(out, "Stem", PathElement::outline(cx.polyline(&[mid, stem_end]).transform(cx.base()))),
    }
    let at = cx.base().transform_point2(mid + reach * 0.5);
    named(out, "Label0", cx.letter_above(letter, at, ""));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::transform::AffineTransform;
    use crate::services::ProportionalMetrics;
    use crate::stencil::IndexPair;
    use crate::types::GeoPoint;
    use std::collections::BTreeMap;

    fn solution(pairs: &[&str]) -> Solution {
        let base = AffineTransform::new(DAffine2::from_scale(DVec2::splat(100.0)), 1.0);
        let sub_transforms: BTreeMap<IndexPair, AffineTransform> = pairs
            .iter()
            .filter_map(|p| IndexPair::parse(p))
            .map(|p| (p, base))
            .collect();
        Solution {
            base,
            sub_transforms,
            map_origin: GeoPoint::new(0.0, 0.0),
            origin_pixel: DVec2::ZERO,
            zoom: 0.0,
            scale_factor: 1.0,
        }
    }

    fn names(kind: FigureKind, template: &[(f64, f64)], pairs: &[&str]) -> Vec<String> {
        let template: Vec<DVec2> = template.iter().map(|&(x, y)| dvec2(x, y)).collect();
        let sol = solution(pairs);
        let settings = Settings::default();
        let local: Vec<DVec2> = template.iter().map(|t| *t * 100.0).collect();
        let cx = FigureContext {
            template: &template,
            solution: &sol,
            local: &local,
            metrics: &ProportionalMetrics,
            text_style: TextStyle::default(),
            settings: &settings,
        };
        let drawn = draw_figure(kind, &cx);
        assert!(drawn.iter().all(|(_, e)| e.is_finite()));
        drawn.into_iter().map(|(n, _)| n).collect()
    }

    const CONTAIN: &[(f64, f64)] = &[
        (-0.5, -0.5),
        (0.5, -0.5),
        (0.0, 0.5),
        (0.0, -0.5),
        (-0.5, 0.5),
        (0.5, 0.5),
    ];

    #[test]
    fn figure_element_names() {
        let security = [(0.0, 0.5), (-0.5, -0.5), (0.5, -0.5), (-0.23, -0.5)];
        insta::assert_debug_snapshot!(
            (
                names(FigureKind::Security('S'), &security, &["21", "31"]),
                names(FigureKind::Contain, CONTAIN, &["21", "43", "65"]),
                names(FigureKind::Clear, CONTAIN, &["21", "43", "65"]),
                names(FigureKind::Withdraw, &[(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5)], &["21", "32"]),
                names(FigureKind::Penetrate, &[(0.0, -0.5), (0.0, 0.5), (1.0, 0.5)], &[]),
            ),
            @r#"
        (
            [
                "Boundary",
                "Arrowhead0",
                "Arrowhead1",
                "Label0",
            ],
            [
                "Boundary",
                "Stem",
                "Arrowhead0",
                "Label0",
            ],
            [
                "Boundary",
                "Stem0",
                "Arrowhead0",
                "Stem1",
                "Arrowhead1",
                "Stem2",
                "Arrowhead2",
                "Label0",
            ],
            [
                "Boundary",
                "Arc",
                "Arrowhead0",
                "Label0",
            ],
            [
                "Boundary",
                "Stem",
                "Arrowhead0",
                "Label0",
            ],
        )
        "#
        );
    }

    #[test]
    fn arrowhead_points_at_its_tip() {
        let sol = solution(&[]);
        let settings = Settings::default();
        let cx = FigureContext {
            template: &[],
            solution: &sol,
            local: &[],
            metrics: &ProportionalMetrics,
            text_style: TextStyle::default(),
            settings: &settings,
        };
        let head = cx.arrowhead("", dvec2(1.0, 0.0), DVec2::X);
        let v = head.path.figures[0].vertices();
        assert_eq!(v[1], dvec2(100.0, 0.0));
        // Barbs trail behind the tip on both sides
        assert!(v[0].x < 100.0 && v[2].x < 100.0);
        assert!(v[0].y * v[2].y < 0.0);
    }

    #[test]
    fn every_bypass_keeps_its_arrowheads() {
        for kind in [FigureKind::BypassEasy, FigureKind::BypassDifficult, FigureKind::BypassImpossible] {
            let drawn = names(kind, CONTAIN, &["21", "43", "65"]);
            assert_eq!(drawn, ["Boundary", "Arrowhead0", "Arrowhead1", "Label0"]);
        }
    }

    #[test]
    fn zigzag_keeps_its_end_points() {
        let pts = zigzag(dvec2(0.0, 0.0), dvec2(1.0, 0.0), 3, 0.1);
        assert_eq!(pts.len(), 7);
        assert_eq!(pts[0], dvec2(0.0, 0.0));
        assert_eq!(pts[6], dvec2(1.0, 0.0));
        assert!((pts[1].y - 0.1).abs() < 1e-12);
        assert!((pts[2].y + 0.1).abs() < 1e-12);
    }
}
