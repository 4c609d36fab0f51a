//! Graphic generation: from a symbol code and anchors to named elements
//!
//! This module is organized into submodules:
//! - `defaults`: Default sizes and settings
//! - `types`: Path data, styles, labels and elements
//! - `geometry`: Vector helpers and the affine fit
//! - `transform`: Base and squared sub-transform solving
//! - `decorate`: Plain and decorated line / region paths
//! - `arrow`: Axis-of-advance outlines
//! - `figures`: Control-template figures
//! - `label`: Upright label frames
//! - `context`: The ordered element map of a graphic
//! - `svg`: SVG preview output

pub mod arrow;
pub mod context;
pub mod decorate;
pub mod defaults;
pub mod figures;
pub mod geometry;
pub mod label;
pub mod svg;
pub mod transform;
pub mod types;

// Re-export commonly used items
pub use context::ElementMap;
pub use transform::{AffineTransform, Solution};
pub use types::*;

use glam::{DAffine2, DMat2, DVec2, dvec2};

use crate::errors::GraphicError;
use crate::log::debug;
use crate::services::Services;
use crate::stencil::{ArrowAnchors, ArrowVariant, Drawing, ZoneDrawing, derive};
use crate::symbol_code::SymbolCode;
use crate::types::{Bounds, GeoPoint};
use arrow::generate_arrow;
use decorate::{Decoration, DecorationStyle, Side, generate_line, generate_spline};
use figures::{FigureContext, draw_figure};
use geometry::{point_along, polygon_centroid, rot_cw};
use label::orient_label;

// ============================================================================
// Label Fields
// ============================================================================

/// Text modifier slots of a tactical graphic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelField {
    /// Unique designation
    T,
    /// Second designation
    T1,
    /// Date-time group (from)
    W,
    /// Date-time group (to)
    W1,
    /// Altitude (minimum)
    X,
    /// Altitude (maximum)
    X1,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelFields {
    pub t: String,
    pub t1: String,
    pub w: String,
    pub w1: String,
    pub x: String,
    pub x1: String,
}

impl LabelFields {
    pub fn get(&self, field: LabelField) -> &str {
        match field {
            LabelField::T => &self.t,
            LabelField::T1 => &self.t1,
            LabelField::W => &self.w,
            LabelField::W1 => &self.w1,
            LabelField::X => &self.x,
            LabelField::X1 => &self.x1,
        }
    }

    /// Set a field; returns whether the value changed
    pub fn set(&mut self, field: LabelField, value: impl Into<String>) -> bool {
        let slot = match field {
            LabelField::T => &mut self.t,
            LabelField::T1 => &mut self.t1,
            LabelField::W => &mut self.w,
            LabelField::W1 => &mut self.w1,
            LabelField::X => &mut self.x,
            LabelField::X1 => &mut self.x1,
        };
        let value = value.into();
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }
}

/// `header` followed by `designation` when there is one
fn titled(header: &str, designation: &str) -> String {
    match (header.is_empty(), designation.is_empty()) {
        (_, true) => header.to_string(),
        (true, false) => designation.to_string(),
        (false, false) => format!("{header} {designation}"),
    }
}

/// Two optional values joined by `sep`, or whichever one is set
fn range_text(from: &str, to: &str, sep: &str) -> Option<String> {
    match (from.is_empty(), to.is_empty()) {
        (true, true) => None,
        (false, true) => Some(from.to_string()),
        (true, false) => Some(to.to_string()),
        (false, false) => Some(format!("{from}{sep}{to}")),
    }
}

// ============================================================================
// Generation
// ============================================================================

/// Everything one generation needs besides the collaborators
#[derive(Debug, Clone, Copy)]
pub struct Request<'a> {
    pub symbol_code: &'a str,
    pub anchors: &'a [GeoPoint],
    pub spline: bool,
    /// Fractions along a line where its start and end labels sit
    pub label_offsets: (f64, f64),
    pub labels: &'a LabelFields,
}

/// Output of one successful generation
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub stencil_type: String,
    /// Named elements in drawing order
    pub elements: Vec<(String, Element)>,
    pub bounds: Bounds,
    /// Geographic position of graphic pixel zero
    pub origin: GeoPoint,
    pub solution: Solution,
}

/// Run the whole pipeline for one graphic.
///
/// Pure: the same request against the same services yields identical output.
pub fn generate(services: &Services, request: &Request) -> Result<Generated, GraphicError> {
    let code = SymbolCode::parse(request.symbol_code)?;
    let key = code.stencil_key();
    let template = services
        .catalog
        .lookup(&key)?
        .ok_or_else(|| GraphicError::NotCataloged { key: key.clone() })?;
    template.validate(&key)?;
    let stencil_type = template.stencil_type.clone();
    let recipe = services.registry.resolve(&stencil_type);
    debug!(%key, %stencil_type, anchors = request.anchors.len(), "generating");

    let geo = services.geodesy.as_ref();
    let derivation = derive(&stencil_type, &recipe.rule, geo, request.anchors, &template.points)?;
    let fitted = derivation.template(&template.points);
    let solution = transform::solve(
        geo,
        fitted,
        &derivation.anchors,
        DVec2::ZERO,
        &derivation.index_pairs,
        services.settings.target_unit_px,
    )?;

    let composer = Composer {
        services,
        request,
        template: fitted,
        solution: &solution,
        local: derivation
            .drawn_anchors()
            .iter()
            .map(|&a| solution.to_local(geo, a))
            .collect(),
    };
    let elements = composer.compose(recipe.drawing)?;

    if elements.iter().any(|(_, e)| !e.is_finite()) {
        debug!(
            names = ?elements.iter().filter(|(_, e)| !e.is_finite()).map(|(n, _)| n.as_str()).collect::<Vec<_>>(),
            "non-finite elements"
        );
        return Err(GraphicError::NonFinite { stage: "elements" });
    }
    let mut bounds = Bounds::new();
    for (_, element) in &elements {
        bounds.union(&element.bounds());
    }
    debug!(%stencil_type, elements = elements.len(), "generated");

    Ok(Generated {
        stencil_type,
        elements,
        bounds,
        origin: solution.map_origin,
        solution,
    })
}

/// Text frame whose x axis runs along `dir`
fn along(dir: DVec2) -> DAffine2 {
    let d = dir.normalize_or(DVec2::X);
    DAffine2::from_mat2(DMat2::from_cols(d, rot_cw(d)))
}

struct Composer<'a> {
    services: &'a Services,
    request: &'a Request<'a>,
    template: &'a [DVec2],
    solution: &'a Solution,
    /// Drawn anchors in graphic pixels
    local: Vec<DVec2>,
}

type Named = Vec<(String, Element)>;

impl Composer<'_> {
    fn compose(&self, drawing: Drawing) -> Result<Named, GraphicError> {
        let mut out = Named::new();
        match drawing {
            Drawing::Polyline => {
                out.push(("Boundary".into(), self.path(false, None).into()));
            }
            Drawing::Line { header } => self.line(header, &mut out),
            Drawing::DecoratedLine { style, side } => self.decorated_line(style, side, &mut out),
            Drawing::Zone(zone) => self.zone(&zone, &mut out),
            Drawing::Arrow { variant, flip_sides } => self.arrow(variant, flip_sides, &mut out)?,
            Drawing::Figure(kind) => {
                let cx = FigureContext {
                    template: self.template,
                    solution: self.solution,
                    local: &self.local,
                    metrics: self.services.metrics.as_ref(),
                    text_style: self.services.text_style(),
                    settings: &self.services.settings,
                };
                out.extend(draw_figure(kind, &cx));
            }
        }
        Ok(out)
    }

    fn measure(&self, text: &str) -> DVec2 {
        self.services.metrics.measure(text, &self.services.text_style())
    }

    fn gap(&self) -> f64 {
        self.services.settings.label_gap
    }

    fn path(&self, closed: bool, decoration: Option<&Decoration>) -> PathElement {
        if self.request.spline {
            generate_spline(&self.local, closed, self.services.spline.as_ref(), decoration)
        } else {
            generate_line(&self.local, closed, decoration)
        }
    }

    fn decoration(&self, style: DecorationStyle, side: Side) -> Decoration {
        Decoration {
            style,
            side,
            tick_size: self.services.settings.tick_size,
        }
    }

    fn line(&self, header: &str, out: &mut Named) {
        out.push(("Boundary".into(), self.path(false, None).into()));
        let text = titled(header, &self.request.labels.t);
        let size = self.measure(&text);
        let (start, end) = self.request.label_offsets;
        let placements = [
            ("StartLabel", start, dvec2(-size.x - self.gap(), -size.y * 0.5)),
            ("EndLabel", end, dvec2(self.gap(), -size.y * 0.5)),
        ];
        for (name, fraction, offset) in placements {
            if let Some((at, dir)) = point_along(&self.local, fraction) {
                let label = orient_label(text.clone(), &along(dir), at, offset, size);
                out.push((name.into(), label.into()));
            }
        }
    }

    fn decorated_line(&self, style: DecorationStyle, side: Side, out: &mut Named) {
        let decoration = self.decoration(style, side);
        out.push(("Boundary".into(), self.path(false, Some(&decoration)).into()));
        let Some((at, dir)) = point_along(&self.local, 0.5) else {
            return;
        };
        let labels = &self.request.labels;
        let clearance = self.gap() + decoration.tick_size * 0.5;
        for (name, text, above) in [("Label0", &labels.t, false), ("Label1", &labels.t1, true)] {
            if text.is_empty() {
                continue;
            }
            let size = self.measure(text);
            let y = if above { -size.y - clearance } else { clearance };
            let label = orient_label(text.as_str(), &along(dir), at, dvec2(-size.x * 0.5, y), size);
            out.push((name.into(), label.into()));
        }
    }

    fn zone(&self, zone: &ZoneDrawing, out: &mut Named) {
        let decoration = zone.decoration.map(|(style, side)| self.decoration(style, side));
        let mut boundary = self.path(true, decoration.as_ref());
        if zone.hatched {
            let settings = &self.services.settings;
            boundary = boundary.with_fill(Fill::Hatch {
                spacing: settings.hatch_spacing,
                opacity: settings.hatch_opacity,
            });
        }
        out.push(("Boundary".into(), boundary.into()));

        let labels = &self.request.labels;
        let mut stack = vec![("Title", titled(zone.header, &labels.t))];
        if zone.time {
            if let Some(text) = range_text(&labels.w, &labels.w1, "-") {
                stack.push(("Time", text));
            }
        }
        if zone.altitude {
            let lines: Vec<String> = [("MIN ALT", &labels.x), ("MAX ALT", &labels.x1)]
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| format!("{k}: {v}"))
                .collect();
            if !lines.is_empty() {
                stack.push(("Altitude", lines.join("\n")));
            }
        }

        let center = polygon_centroid(&self.local);
        let sizes: Vec<DVec2> = stack.iter().map(|(_, text)| self.measure(text)).collect();
        let total: f64 = sizes.iter().map(|s| s.y).sum::<f64>() + self.gap() * (sizes.len() - 1) as f64;
        let mut y = -total * 0.5;
        for ((name, text), size) in stack.into_iter().zip(sizes) {
            let offset = dvec2(-size.x * 0.5, y);
            let label = orient_label(text, &DAffine2::IDENTITY, center, offset, size);
            out.push((name.into(), label.into()));
            y += size.y + self.gap();
        }
    }

    /// Arrow points (width point, tip, then the shaft through to the tail)
    /// and whether the raw anchors mirror the body sides
    fn arrow_points(&self) -> (Vec<DVec2>, bool) {
        let geo = self.services.geodesy.as_ref();
        let head = self.local.first().copied().unwrap_or_default();
        match ArrowAnchors::split(geo, self.request.anchors) {
            Some(split) => {
                let points = std::iter::once(head)
                    .chain(split.shaft.iter().map(|&a| self.solution.to_local(geo, a)))
                    .collect();
                (points, split.mirrored)
            }
            None => {
                let points = std::iter::once(head).chain(self.local.iter().skip(1).copied()).take(3).collect();
                (points, false)
            }
        }
    }

    fn arrow(&self, variant: ArrowVariant, flip_sides: bool, out: &mut Named) -> Result<(), GraphicError> {
        let (points, mirrored) = self.arrow_points();
        let rotary = variant == ArrowVariant::RotaryWing;
        let arrow = generate_arrow(
            &points,
            flip_sides ^ mirrored,
            rotary,
            self.services.settings.arrow_body_ratio,
            &DAffine2::IDENTITY,
        )
        .ok_or(GraphicError::NonFinite { stage: "arrow" })?;

        let mut boundary = PathElement::outline(arrow.body);
        if matches!(variant, ArrowVariant::Feint | ArrowVariant::CounterAttack) {
            boundary = boundary.with_stroke(Stroke::Dashed);
        }
        out.push(("Boundary".into(), boundary.into()));

        // Shaft direction from the tip toward the tail
        let u0 = points
            .get(2)
            .zip(points.get(1))
            .map(|(next, tip)| *next - *tip)
            .unwrap_or(DVec2::X);
        let labels = &self.request.labels;
        if !labels.t.is_empty() {
            let size = self.measure(&labels.t);
            let offset = dvec2(self.gap(), -size.y * 0.5);
            let label = orient_label(labels.t.as_str(), &along(u0), arrow.waist, offset, size);
            out.push(("Label0".into(), label.into()));
        }
        if variant == ArrowVariant::CounterAttack {
            let size = self.measure("CATK");
            let tail_dir = match points.as_slice() {
                [.., a, b] => *b - *a,
                _ => u0,
            };
            let offset = dvec2(self.gap(), -size.y * 0.5);
            let label = orient_label("CATK", &along(tail_dir), arrow.origin, offset, size);
            out.push(("Label1".into(), label.into()));
        }
        match (variant, arrow.rotor) {
            (ArrowVariant::MainAttack, _) => {
                out.push(("Neck".into(), PathElement::outline(arrow.neck).into()));
            }
            (ArrowVariant::RotaryWing, Some(rotor)) => {
                out.push(("Rotor".into(), PathElement::outline(rotor.glyph).into()));
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request<'a>(code: &'a str, anchors: &'a [GeoPoint], labels: &'a LabelFields) -> Request<'a> {
        Request {
            symbol_code: code,
            anchors,
            spline: false,
            label_offsets: (0.0, 1.0),
            labels,
        }
    }

    fn names(g: &Generated) -> Vec<&str> {
        g.elements.iter().map(|(n, _)| n.as_str()).collect()
    }

    #[test]
    fn label_field_setter_reports_changes() {
        let mut fields = LabelFields::default();
        assert!(fields.set(LabelField::W, "0800"));
        assert!(!fields.set(LabelField::W, "0800"));
        assert_eq!(fields.get(LabelField::W), "0800");
        assert_eq!(fields.get(LabelField::X1), "");
    }

    #[test]
    fn label_text_helpers() {
        assert_eq!(titled("PL", "ALPHA"), "PL ALPHA");
        assert_eq!(titled("PL", ""), "PL");
        assert_eq!(range_text("0800", "", "-").as_deref(), Some("0800"));
        assert_eq!(range_text("0800", "1200", "-").as_deref(), Some("0800-1200"));
        assert_eq!(range_text("", "", "-"), None);
    }

    #[test]
    fn zone_stacks_title_time_and_altitude() {
        let services = Services::default();
        let labels = LabelFields {
            t: "KILO".into(),
            w: "0800".into(),
            x: "500FT".into(),
            x1: "3000FT".into(),
            ..LabelFields::default()
        };
        let anchors = [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.02),
            GeoPoint::new(-0.02, 0.02),
            GeoPoint::new(-0.02, 0.0),
        ];
        let g = generate(&services, &request("GFGPAAR---****X", &anchors, &labels)).unwrap();
        assert_eq!(g.stencil_type, "RestrictedOperationsZone");
        assert_eq!(names(&g), ["Boundary", "Title", "Time", "Altitude"]);
        let text = |name: &str| {
            let (_, e) = g.elements.iter().find(|(n, _)| n == name).unwrap();
            e.as_label().unwrap().text.clone()
        };
        assert_eq!(text("Title"), "ROZ KILO");
        assert_eq!(text("Time"), "0800");
        assert_eq!(text("Altitude"), "MIN ALT: 500FT\nMAX ALT: 3000FT");
        // Stacked top to bottom
        let top = |name: &str| {
            let (_, e) = g.elements.iter().find(|(n, _)| n == name).unwrap();
            e.bounds().min.y
        };
        assert!(top("Title") < top("Time") && top("Time") < top("Altitude"));
    }

    #[test]
    fn hatched_zone_boundary() {
        let services = Services::default();
        let labels = LabelFields::default();
        let anchors = [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.02),
            GeoPoint::new(-0.02, 0.01),
        ];
        let g = generate(&services, &request("GFMPOGF---****X", &anchors, &labels)).unwrap();
        let boundary = g.elements[0].1.as_path().unwrap();
        assert!(matches!(boundary.style.fill, Fill::Hatch { .. }));
        assert_eq!(names(&g), ["Boundary", "Title"]);
    }

    #[test]
    fn arrow_variants_name_their_extras() {
        let services = Services::default();
        let labels = LabelFields {
            t: "OBJ A".into(),
            ..LabelFields::default()
        };
        let anchors = [
            GeoPoint::new(0.0, 0.05),
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.006, 0.04),
        ];
        let list = |code: &str| {
            let g = generate(&services, &request(code, &anchors, &labels)).unwrap();
            names(&g).iter().map(|s| s.to_string()).collect::<Vec<_>>()
        };
        insta::assert_debug_snapshot!(
            (list("GFGPOLAGM-****X"), list("GFGPOLAR--****X"), list("GFTPK-----****X")),
            @r#"
        (
            [
                "Boundary",
                "Label0",
                "Neck",
            ],
            [
                "Boundary",
                "Label0",
                "Rotor",
            ],
            [
                "Boundary",
                "Label0",
                "Label1",
            ],
        )
        "#
        );
    }

    #[test]
    fn counter_attack_labels_its_tail() {
        let services = Services::default();
        let labels = LabelFields::default();
        let anchors = [
            GeoPoint::new(0.0, 0.05),
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.006, 0.04),
        ];
        let g = generate(&services, &request("GFTPK-----****X", &anchors, &labels)).unwrap();
        assert_eq!(g.stencil_type, "CounterAttack");
        assert_eq!(names(&g), ["Boundary", "Label1"]);

        let body = g.elements[0].1.bounds();
        let catk = g.elements[1].1.as_label().unwrap();
        assert_eq!(catk.text, "CATK");
        // Anchored on the tail, past the end of the shaft
        assert!((catk.position.x - body.min.x).abs() < 1e-6);
        assert!(catk.bounds().max.x < catk.position.x);
    }

    #[test]
    fn every_figure_starts_with_its_boundary() {
        let services = Services::default();
        let labels = LabelFields::default();
        let anchors = [
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.02),
            GeoPoint::new(-0.015, 0.01),
        ];
        for code in [
            "GFTPUS----****X",
            "GFTPJ-----****X",
            "GFTPX-----****X",
            "GFMPORP---****X",
            "GFMPBDE---****X",
            "GFMPBDD---****X",
            "GFMPBDI---****X",
            "GFMPBCE---****X",
            "GFMPBCD---****X",
            "GFMPOT----****X",
            "GFTPW-----****X",
            "GFTPWP----****X",
            "GFTPL-----****X",
            "GFTPM-----****X",
            "GFTPB-----****X",
            "GFTPP-----****X",
            "GFTPC-----****X",
        ] {
            let g = generate(&services, &request(code, &anchors, &labels)).unwrap();
            assert_eq!(g.elements[0].0, "Boundary", "{code}");
            assert!(!g.bounds.is_empty(), "{code}");
        }
    }

    #[test]
    fn malformed_template_is_a_catalog_failure() {
        let mut catalog = crate::services::BuiltinCatalog::empty();
        catalog.insert("GFGPGLP", crate::services::StencilTemplate::new("PhaseLine", &[(0.0, 0.0)]));
        let services = Services::default().with_catalog(std::sync::Arc::new(catalog));
        let labels = LabelFields::default();
        let anchors = [GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.01)];
        let err = generate(&services, &request("GFGPGLP---****X", &anchors, &labels)).unwrap_err();
        assert!(matches!(
            err,
            GraphicError::Catalog(crate::errors::CatalogError::Malformed { ref key, .. }) if key == "GFGPGLP"
        ));
        assert!(err.keeps_previous_state());
    }

    #[test]
    fn unknown_and_malformed_codes() {
        let services = Services::default();
        let labels = LabelFields::default();
        let anchors = [GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.01)];
        let err = generate(&services, &request("GFGPZZZ---****X", &anchors, &labels)).unwrap_err();
        assert!(matches!(err, GraphicError::NotCataloged { ref key } if key == "GFGPZZZ"));
        let err = generate(&services, &request("GFGP", &anchors, &labels)).unwrap_err();
        assert!(matches!(err, GraphicError::InvalidSymbolCode(_)));
        assert!(!err.keeps_previous_state());
    }
}
