//! Render types: path data, styles, labels and named elements

use std::fmt;

use glam::{DAffine2, DMat2, DVec2, dvec2};

use crate::types::Bounds;

// ============================================================================
// Path Data
// ============================================================================

/// One drawing command after the start point of a sub-path
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Segment {
    Line(DVec2),
    Arc {
        radii: DVec2,
        /// x-axis rotation in degrees
        rotation: f64,
        large_arc: bool,
        sweep: bool,
        to: DVec2,
    },
    Cubic {
        c1: DVec2,
        c2: DVec2,
        to: DVec2,
    },
}

impl Segment {
    pub fn end(&self) -> DVec2 {
        match *self {
            Segment::Line(to) | Segment::Arc { to, .. } | Segment::Cubic { to, .. } => to,
        }
    }

    fn transform(&self, t: &DAffine2) -> Segment {
        match *self {
            Segment::Line(to) => Segment::Line(t.transform_point2(to)),
            Segment::Cubic { c1, c2, to } => Segment::Cubic {
                c1: t.transform_point2(c1),
                c2: t.transform_point2(c2),
                to: t.transform_point2(to),
            },
            Segment::Arc {
                radii,
                rotation,
                large_arc,
                sweep,
                to,
            } => {
                // Exact for similarities; other transforms get the uniform
                // part of the scale.
                let m = t.matrix2;
                let det = m.determinant();
                let scale = det.abs().sqrt();
                let turn = m.x_axis.y.atan2(m.x_axis.x).to_degrees();
                Segment::Arc {
                    radii: radii * scale,
                    rotation: if det < 0.0 { turn - rotation } else { turn + rotation },
                    large_arc,
                    sweep: if det < 0.0 { !sweep } else { sweep },
                    to: t.transform_point2(to),
                }
            }
        }
    }
}

/// A start point plus ordered segments
#[derive(Debug, Clone, PartialEq)]
pub struct SubPath {
    pub start: DVec2,
    pub segments: Vec<Segment>,
    pub closed: bool,
}

impl SubPath {
    pub fn new(start: DVec2) -> Self {
        Self {
            start,
            segments: Vec::new(),
            closed: false,
        }
    }

    /// A sub-path through `points` joined by straight lines
    pub fn polyline(points: &[DVec2], closed: bool) -> Option<Self> {
        let (&first, rest) = points.split_first()?;
        Some(SubPath {
            start: first,
            segments: rest.iter().map(|&p| Segment::Line(p)).collect(),
            closed,
        })
    }

    /// Start point followed by every segment end point
    pub fn vertices(&self) -> Vec<DVec2> {
        std::iter::once(self.start)
            .chain(self.segments.iter().map(Segment::end))
            .collect()
    }

    /// Every point that shapes the sub-path, control points included
    pub fn control_points(&self) -> Vec<DVec2> {
        let mut out = vec![self.start];
        let mut prev = self.start;
        for seg in &self.segments {
            match *seg {
                Segment::Line(to) => out.push(to),
                Segment::Cubic { c1, c2, to } => out.extend([c1, c2, to]),
                Segment::Arc { radii, to, .. } => {
                    // The bulge never exceeds the larger radius from the chord.
                    let mid = (prev + to) * 0.5;
                    let r = radii.max_element();
                    out.extend([mid - DVec2::splat(r), mid + DVec2::splat(r), to]);
                }
            }
            prev = seg.end();
        }
        out
    }

    pub fn transform(&self, t: &DAffine2) -> SubPath {
        SubPath {
            start: t.transform_point2(self.start),
            segments: self.segments.iter().map(|s| s.transform(t)).collect(),
            closed: self.closed,
        }
    }
}

/// Ordered sub-paths, built fluently:
///
/// ```
/// use tacgraph::render::PathData;
/// let d = PathData::new().m(0.0, 0.0).l(10.0, 0.0).l(10.0, 10.0).z();
/// assert_eq!(d.to_string(), "M0,0 L10,0 L10,10 Z");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathData {
    pub figures: Vec<SubPath>,
}

impl PathData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move: starts a new sub-path
    pub fn m(mut self, x: f64, y: f64) -> Self {
        self.figures.push(SubPath::new(dvec2(x, y)));
        self
    }

    /// Line to
    pub fn l(mut self, x: f64, y: f64) -> Self {
        self.push(Segment::Line(dvec2(x, y)));
        self
    }

    /// Elliptical arc to
    #[allow(clippy::too_many_arguments)]
    pub fn a(mut self, rx: f64, ry: f64, rotation: f64, large_arc: bool, sweep: bool, x: f64, y: f64) -> Self {
        self.push(Segment::Arc {
            radii: dvec2(rx, ry),
            rotation,
            large_arc,
            sweep,
            to: dvec2(x, y),
        });
        self
    }

    /// Cubic Bezier to
    pub fn c(mut self, c1: DVec2, c2: DVec2, to: DVec2) -> Self {
        self.push(Segment::Cubic { c1, c2, to });
        self
    }

    /// Close the current sub-path
    pub fn z(mut self) -> Self {
        if let Some(fig) = self.figures.last_mut() {
            fig.closed = true;
        }
        self
    }

    fn push(&mut self, seg: Segment) {
        match self.figures.last_mut() {
            Some(fig) => fig.segments.push(seg),
            // A segment without a move starts at its own end point
            None => self.figures.push(SubPath::new(seg.end())),
        }
    }

    pub fn push_figure(&mut self, figure: SubPath) {
        self.figures.push(figure);
    }

    pub fn extend(&mut self, other: PathData) {
        self.figures.extend(other.figures);
    }

    pub fn is_empty(&self) -> bool {
        self.figures.is_empty()
    }

    pub fn transform(&self, t: &DAffine2) -> PathData {
        PathData {
            figures: self.figures.iter().map(|f| f.transform(t)).collect(),
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(self.figures.iter().flat_map(|f| f.control_points()))
    }

    pub fn is_finite(&self) -> bool {
        self.figures
            .iter()
            .flat_map(|f| f.control_points())
            .all(|p| p.is_finite())
    }

    /// Flatten to polylines, sampling each curved segment `steps` times.
    /// Arcs are replaced by their chords.
    pub fn flatten(&self, steps: usize) -> Vec<Vec<DVec2>> {
        let steps = steps.max(1);
        self.figures
            .iter()
            .map(|fig| {
                let mut pts = vec![fig.start];
                let mut prev = fig.start;
                for seg in &fig.segments {
                    match *seg {
                        Segment::Line(to) | Segment::Arc { to, .. } => pts.push(to),
                        Segment::Cubic { c1, c2, to } => {
                            for i in 1..=steps {
                                let t = i as f64 / steps as f64;
                                let mt = 1.0 - t;
                                pts.push(
                                    prev * (mt * mt * mt)
                                        + c1 * (3.0 * mt * mt * t)
                                        + c2 * (3.0 * mt * t * t)
                                        + to * (t * t * t),
                                );
                            }
                        }
                    }
                    prev = seg.end();
                }
                pts
            })
            .collect()
    }
}

/// Format a coordinate with at most three decimals and no trailing zeros
pub(crate) fn fmt_num(v: f64) -> String {
    let s = format!("{:.3}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" { "0".to_string() } else { s.to_string() }
}

impl fmt::Display for PathData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        let pt = |p: DVec2| format!("{},{}", fmt_num(p.x), fmt_num(p.y));
        for fig in &self.figures {
            parts.push(format!("M{}", pt(fig.start)));
            for seg in &fig.segments {
                parts.push(match *seg {
                    Segment::Line(to) => format!("L{}", pt(to)),
                    Segment::Cubic { c1, c2, to } => {
                        format!("C{} {} {}", pt(c1), pt(c2), pt(to))
                    }
                    Segment::Arc {
                        radii,
                        rotation,
                        large_arc,
                        sweep,
                        to,
                    } => format!(
                        "A{} {} {} {} {}",
                        pt(radii),
                        fmt_num(rotation),
                        large_arc as u8,
                        sweep as u8,
                        pt(to)
                    ),
                });
            }
            if fig.closed {
                parts.push("Z".to_string());
            }
        }
        f.write_str(&parts.join(" "))
    }
}

// ============================================================================
// Styles
// ============================================================================

/// Stroke pattern tag; colors belong to the host renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stroke {
    #[default]
    Solid,
    Dashed,
    None,
}

/// Fill tag; hatch colors are derived from the stroke by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Fill {
    #[default]
    None,
    Solid,
    Hatch { spacing: f64, opacity: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Style {
    pub stroke: Stroke,
    pub fill: Fill,
}

impl Style {
    pub const OUTLINE: Style = Style {
        stroke: Stroke::Solid,
        fill: Fill::None,
    };
    pub const DASHED: Style = Style {
        stroke: Stroke::Dashed,
        fill: Fill::None,
    };
    pub const FILLED: Style = Style {
        stroke: Stroke::Solid,
        fill: Fill::Solid,
    };
}

/// Path data with its style tag
#[derive(Debug, Clone, PartialEq)]
pub struct PathElement {
    pub path: PathData,
    pub style: Style,
}

impl PathElement {
    pub fn new(path: PathData, style: Style) -> Self {
        Self { path, style }
    }

    pub fn outline(path: PathData) -> Self {
        Self::new(path, Style::OUTLINE)
    }

    pub fn with_stroke(mut self, stroke: Stroke) -> Self {
        self.style.stroke = stroke;
        self
    }

    pub fn with_fill(mut self, fill: Fill) -> Self {
        self.style.fill = fill;
        self
    }

    pub fn is_closed(&self) -> bool {
        !self.path.figures.is_empty() && self.path.figures.iter().all(|f| f.closed)
    }
}

// ============================================================================
// Labels
// ============================================================================

/// Text correction keeping labels upright and left-to-right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlipState {
    #[default]
    NoFlip,
    XFlip,
    YFlip,
    BothFlip,
}

/// Positioned, oriented label text.
///
/// The text box spans `offset .. offset + size` in text space; `matrix` maps
/// text space onto graphic pixels around `position`.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub position: DVec2,
    pub matrix: DMat2,
    pub offset: DVec2,
    pub size: DVec2,
    pub flip: FlipState,
}

impl Label {
    /// Corners of the text box in graphic pixels
    pub fn corners(&self) -> [DVec2; 4] {
        let o = self.offset;
        let s = self.size;
        [o, o + dvec2(s.x, 0.0), o + s, o + dvec2(0.0, s.y)].map(|c| self.position + self.matrix * c)
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(self.corners())
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.matrix.x_axis.is_finite()
            && self.matrix.y_axis.is_finite()
            && self.offset.is_finite()
    }
}

// ============================================================================
// Elements
// ============================================================================

/// Anything the composer can place under a name
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    Path(PathElement),
    Label(Label),
}

impl Element {
    pub fn bounds(&self) -> Bounds {
        match self {
            Element::Path(p) => p.path.bounds(),
            Element::Label(l) => l.bounds(),
        }
    }

    pub fn is_finite(&self) -> bool {
        match self {
            Element::Path(p) => p.path.is_finite(),
            Element::Label(l) => l.is_finite(),
        }
    }

    pub fn as_path(&self) -> Option<&PathElement> {
        match self {
            Element::Path(p) => Some(p),
            Element::Label(_) => None,
        }
    }

    pub fn as_label(&self) -> Option<&Label> {
        match self {
            Element::Label(l) => Some(l),
            Element::Path(_) => None,
        }
    }
}

impl From<PathElement> for Element {
    fn from(p: PathElement) -> Self {
        Element::Path(p)
    }
}

impl From<Label> for Element {
    fn from(l: Label) -> Self {
        Element::Label(l)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fluent_builder_formats_svg_data() {
        let d = PathData::new()
            .m(0.0, 0.0)
            .l(10.5, 0.0)
            .a(5.0, 5.0, 0.0, false, true, 20.5, 0.0)
            .z()
            .m(1.0, 1.0)
            .c(dvec2(2.0, 2.0), dvec2(3.0, 2.0), dvec2(4.0, 1.0));
        assert_eq!(
            d.to_string(),
            "M0,0 L10.5,0 A5,5 0 0 1 20.5,0 Z M1,1 C2,2 3,2 4,1"
        );
        assert_eq!(d.figures.len(), 2);
        assert!(d.figures[0].closed);
        assert!(!d.figures[1].closed);
    }

    #[test]
    fn number_formatting() {
        assert_eq!(fmt_num(1.23456), "1.235");
        assert_eq!(fmt_num(-0.0001), "0");
        assert_eq!(fmt_num(100.0), "100");
    }

    #[test]
    fn mirror_transform_flips_arc_sweep() {
        let d = PathData::new()
            .m(0.0, 0.0)
            .a(1.0, 1.0, 0.0, false, true, 2.0, 0.0);
        let mirrored = d.transform(&DAffine2::from_scale(dvec2(2.0, -2.0)));
        match mirrored.figures[0].segments[0] {
            Segment::Arc {
                radii, sweep, to, ..
            } => {
                assert_eq!(radii, dvec2(2.0, 2.0));
                assert!(!sweep);
                assert_eq!(to, dvec2(4.0, 0.0));
            }
            other => panic!("expected arc, got {other:?}"),
        }
    }

    #[test]
    fn flatten_samples_cubics() {
        let d = PathData::new()
            .m(0.0, 0.0)
            .c(dvec2(0.0, 0.0), dvec2(4.0, 0.0), dvec2(4.0, 0.0));
        let lines = d.flatten(4);
        assert_eq!(lines[0].len(), 5);
        assert_eq!(*lines[0].last().unwrap(), dvec2(4.0, 0.0));
    }

    #[test]
    fn label_bounds_follow_matrix() {
        let label = Label {
            text: "A".into(),
            position: dvec2(10.0, 10.0),
            matrix: DMat2::from_cols(dvec2(0.0, 1.0), dvec2(-1.0, 0.0)),
            offset: dvec2(0.0, 0.0),
            size: dvec2(4.0, 2.0),
            flip: FlipState::NoFlip,
        };
        let b = label.bounds();
        assert_eq!(b.min, dvec2(8.0, 10.0));
        assert_eq!(b.max, dvec2(10.0, 14.0));
    }
}
