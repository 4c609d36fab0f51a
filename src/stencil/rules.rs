//! Per-family anchor derivation rules.
//!
//! Every rule receives at least `min_anchors()` raw anchors and returns a new,
//! fixed-length list; the caller's vector is never touched.

use enum_dispatch::enum_dispatch;

use crate::services::Geodesy;
use crate::types::GeoPoint;

#[enum_dispatch]
pub trait DeriveAnchors {
    /// Fewest raw anchors the rule can work with
    fn min_anchors(&self) -> usize;

    /// Turn direction of a synthesized third anchor
    fn right_handed(&self) -> bool {
        false
    }

    /// Anchor pairs that get their own squared sub-transform
    fn index_pairs(&self) -> &'static [&'static str] {
        &[]
    }

    fn enrich(&self, geo: &dyn Geodesy, anchors: &[GeoPoint]) -> Vec<GeoPoint>;
}

#[enum_dispatch(DeriveAnchors)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivationRule {
    Passthrough,
    Security,
    Contain,
    TripWire,
    Withdraw,
    Arrow,
    Region,
    Line,
    TwoPoint,
}

/// Anchors used as given
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Passthrough;

impl DeriveAnchors for Passthrough {
    fn min_anchors(&self) -> usize {
        2
    }

    fn enrich(&self, _geo: &dyn Geodesy, anchors: &[GeoPoint]) -> Vec<GeoPoint> {
        anchors.to_vec()
    }
}

/// Screen, cover and guard: a V with a letter on its front leg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Security;

impl DeriveAnchors for Security {
    fn min_anchors(&self) -> usize {
        3
    }

    fn index_pairs(&self) -> &'static [&'static str] {
        &["21", "31"]
    }

    fn enrich(&self, geo: &dyn Geodesy, anchors: &[GeoPoint]) -> Vec<GeoPoint> {
        let mut out = anchors[..anchors.len().min(4)].to_vec();
        if out.len() == 3 {
            let (a0, a1, a2) = (out[0], out[1], out[2]);
            let along = geo.interpolate(a0, a1, 0.73);
            out.push(geo.destination(along, geo.bearing(a0, a2), 0.27 * geo.range(a0, a2)));
        }
        out
    }
}

/// Contain-like figures: base leg, its midpoint, and squared wings at the
/// offset of the third anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contain;

impl DeriveAnchors for Contain {
    fn min_anchors(&self) -> usize {
        3
    }

    fn right_handed(&self) -> bool {
        true
    }

    fn index_pairs(&self) -> &'static [&'static str] {
        &["21", "43", "65"]
    }

    fn enrich(&self, geo: &dyn Geodesy, anchors: &[GeoPoint]) -> Vec<GeoPoint> {
        let (a0, a1, a2) = (anchors[0], anchors[1], anchors[2]);
        let offset = geo.cross_track(a0, a1, a2);
        let mid = geo.midpoint(a0, a1);
        vec![
            a0,
            a1,
            geo.perpendicular(mid, a1, offset),
            mid,
            geo.perpendicular(a0, a1, offset),
            geo.perpendicular(a1, a0, -offset),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripWire;

impl DeriveAnchors for TripWire {
    fn min_anchors(&self) -> usize {
        3
    }

    fn right_handed(&self) -> bool {
        true
    }

    fn index_pairs(&self) -> &'static [&'static str] {
        &["21", "43"]
    }

    fn enrich(&self, geo: &dyn Geodesy, anchors: &[GeoPoint]) -> Vec<GeoPoint> {
        let (a0, a1, a2) = (anchors[0], anchors[1], anchors[2]);
        let offset = geo.cross_track(a0, a1, a2);
        let quarter = geo.interpolate(a0, a1, 0.25);
        let wire = geo.perpendicular(quarter, a1, offset);
        let far = geo.perpendicular(a1, a0, -offset);
        let run = geo.destination(wire, geo.bearing(a0, a1), 0.5 * geo.range(a0, a1));
        vec![a0, a1, wire, quarter, far, run]
    }
}

/// Withdraw family: the third anchor is squared onto the end of the base leg
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Withdraw;

impl DeriveAnchors for Withdraw {
    fn min_anchors(&self) -> usize {
        3
    }

    fn right_handed(&self) -> bool {
        true
    }

    fn index_pairs(&self) -> &'static [&'static str] {
        &["21", "32"]
    }

    fn enrich(&self, geo: &dyn Geodesy, anchors: &[GeoPoint]) -> Vec<GeoPoint> {
        let (a0, a1, a2) = (anchors[0], anchors[1], anchors[2]);
        let offset = geo.cross_track(a0, a1, a2);
        vec![a0, a1, geo.perpendicular(a1, a0, -offset)]
    }
}

/// Raw axis-of-advance anchors split into the shaft and the arrowhead width
/// point.
///
/// Anchors run tip, shaft vertices, then the tail and the width point in
/// either order: of the last two, the one nearer the tip is the width point.
/// Placing it before the tail mirrors the body sides.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowAnchors {
    /// Tip first, tail last
    pub shaft: Vec<GeoPoint>,
    pub width_point: GeoPoint,
    pub mirrored: bool,
}

impl ArrowAnchors {
    /// `None` for fewer than three anchors
    pub fn split(geo: &dyn Geodesy, anchors: &[GeoPoint]) -> Option<Self> {
        let [tip, .., a, b] = anchors else {
            return None;
        };
        let mirrored = geo.range(*tip, *a) < geo.range(*tip, *b);
        let (tail, width_point) = if mirrored { (*b, *a) } else { (*a, *b) };
        let mut shaft = anchors[..anchors.len() - 2].to_vec();
        shaft.push(tail);
        Some(ArrowAnchors {
            shaft,
            width_point,
            mirrored,
        })
    }
}

/// Axis of advance; the result is `[head, tip, tail, waist]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arrow;

impl DeriveAnchors for Arrow {
    fn min_anchors(&self) -> usize {
        3
    }

    fn enrich(&self, geo: &dyn Geodesy, anchors: &[GeoPoint]) -> Vec<GeoPoint> {
        let Some(ArrowAnchors { shaft, width_point: head, .. }) = ArrowAnchors::split(geo, anchors) else {
            return anchors.to_vec();
        };
        let (tip, next) = (shaft[0], shaft[1]);
        let tail = shaft[shaft.len() - 1];
        let waist = geo.destination(tip, geo.bearing(tip, next), geo.along_track(tip, next, head));
        vec![head, tip, tail, waist]
    }
}

/// Closed areas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region;

impl DeriveAnchors for Region {
    fn min_anchors(&self) -> usize {
        3
    }

    fn enrich(&self, _geo: &dyn Geodesy, anchors: &[GeoPoint]) -> Vec<GeoPoint> {
        anchors.to_vec()
    }
}

/// Open lines, plain or decorated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line;

impl DeriveAnchors for Line {
    fn min_anchors(&self) -> usize {
        2
    }

    fn enrich(&self, _geo: &dyn Geodesy, anchors: &[GeoPoint]) -> Vec<GeoPoint> {
        anchors.to_vec()
    }
}

/// Block, penetrate and canalize: two anchors across the front, the stem is
/// squared off to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TwoPoint;

impl DeriveAnchors for TwoPoint {
    fn min_anchors(&self) -> usize {
        2
    }

    fn right_handed(&self) -> bool {
        true
    }

    fn enrich(&self, _geo: &dyn Geodesy, anchors: &[GeoPoint]) -> Vec<GeoPoint> {
        anchors[..2].to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::Spherical;

    fn g(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon)
    }

    #[test]
    fn security_synthesizes_the_letter_point() {
        let geo = Spherical;
        let raw = [g(0.0, 0.0), g(0.01, -0.01), g(0.01, 0.01)];
        let out = DerivationRule::from(Security).enrich(&geo, &raw);
        assert_eq!(out.len(), 4);
        // The letter point stays between the two legs
        assert!(out[3].lat > 0.0 && out[3].lat < 0.0101);

        let four = [raw[0], raw[1], raw[2], g(0.005, 0.0)];
        assert_eq!(DerivationRule::from(Security).enrich(&geo, &four)[3], four[3]);
    }

    #[test]
    fn contain_squares_the_wings() {
        let geo = Spherical;
        // Base leg runs east; the third anchor is south, to the right
        let raw = [g(0.0, 0.0), g(0.0, 0.02), g(-0.01, 0.004)];
        let out = Contain.enrich(&geo, &raw);
        assert_eq!(out.len(), 6);
        assert!(out[3].abs_diff_eq(g(0.0, 0.01), 1e-9));
        assert!(out[2].abs_diff_eq(g(-0.01, 0.01), 1e-6));
        assert!(out[4].abs_diff_eq(g(-0.01, 0.0), 1e-6));
        assert!(out[5].abs_diff_eq(g(-0.01, 0.02), 1e-6));
    }

    #[test]
    fn trip_wire_runs_half_a_leg_from_the_wire() {
        let geo = Spherical;
        let raw = [g(0.0, 0.0), g(0.0, 0.04), g(-0.01, 0.03)];
        let out = TripWire.enrich(&geo, &raw);
        assert_eq!(out.len(), 6);
        assert!(out[3].abs_diff_eq(g(0.0, 0.01), 1e-9));
        assert!(out[2].abs_diff_eq(g(-0.01, 0.01), 1e-6));
        assert!(out[4].abs_diff_eq(g(-0.01, 0.04), 1e-6));
        assert!(out[5].abs_diff_eq(g(-0.01, 0.03), 1e-6));
    }

    #[test]
    fn withdraw_squares_the_third_anchor() {
        let geo = Spherical;
        let raw = [g(0.0, 0.0), g(0.0, 0.02), g(-0.01, 0.005)];
        let out = Withdraw.enrich(&geo, &raw);
        assert_eq!(out.len(), 3);
        assert!(out[2].abs_diff_eq(g(-0.01, 0.02), 1e-6));
    }

    #[test]
    fn arrow_collapses_to_head_tip_tail_waist() {
        let geo = Spherical;
        // Tip east, tail west, head barb slightly behind the tip
        let raw = [g(0.0, 0.05), g(0.0, 0.0), g(0.0, -0.05), g(0.01, 0.03)];
        let out = Arrow.enrich(&geo, &raw);
        assert_eq!(out.len(), 4);
        assert_eq!(out[0], raw[3]);
        assert_eq!(out[1], raw[0]);
        assert_eq!(out[2], raw[2]);
        assert!(out[3].abs_diff_eq(g(0.0, 0.03), 1e-5));
    }

    #[test]
    fn width_point_before_the_tail_mirrors() {
        let geo = Spherical;
        let raw = [g(0.0, 0.05), g(0.0, 0.0), g(0.006, 0.04)];
        let plain = ArrowAnchors::split(&geo, &raw).unwrap();
        assert!(!plain.mirrored);
        assert_eq!(plain.shaft, [raw[0], raw[1]]);
        assert_eq!(plain.width_point, raw[2]);

        let swapped = [raw[0], raw[2], raw[1]];
        let mirrored = ArrowAnchors::split(&geo, &swapped).unwrap();
        assert!(mirrored.mirrored);
        assert_eq!(mirrored.shaft, plain.shaft);
        assert_eq!(mirrored.width_point, plain.width_point);
        assert_eq!(Arrow.enrich(&geo, &swapped), Arrow.enrich(&geo, &raw));

        assert!(ArrowAnchors::split(&geo, &raw[..2]).is_none());
    }

    #[test]
    fn two_point_keeps_only_the_front() {
        let geo = Spherical;
        let raw = [g(0.0, 0.0), g(0.01, 0.0), g(0.02, 0.0)];
        assert_eq!(TwoPoint.enrich(&geo, &raw).len(), 2);
        assert!(DerivationRule::from(TwoPoint).right_handed());
    }
}
