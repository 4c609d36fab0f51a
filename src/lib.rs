//! Geometry core for MIL-STD-2525C multi-point tactical graphics.
//!
//! A [`Graphic`] turns a symbol code and a few geographic anchors into named,
//! styled path and label elements in graphic-local pixels:
//!
//! ```
//! use tacgraph::{GeoPoint, Graphic, Services};
//!
//! let g = Graphic::with(
//!     Services::default(),
//!     "GFGPGLP---****X",
//!     vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)],
//! );
//! assert_eq!(g.stencil_type(), Some("PhaseLine"));
//! assert_eq!(g.elements().names(), ["Boundary", "StartLabel", "EndLabel"]);
//! ```

pub mod errors;
pub mod graphic;
pub mod log;
pub mod render;
pub mod services;
pub mod stencil;
pub mod symbol_code;
pub mod types;

pub use errors::{CatalogError, GraphicError, SymbolCodeError};
pub use graphic::{Graphic, UpdateScope};
pub use render::{Element, LabelField, LabelFields, Request, generate};
pub use services::Services;
pub use symbol_code::SymbolCode;
pub use types::{Bounds, GeoPoint};

/// Render one graphic straight to an SVG preview with the default services.
///
/// Returns the SVG string on success, or an error with diagnostics.
pub fn render_svg(symbol_code: &str, anchors: &[GeoPoint], labels: &LabelFields) -> Result<String, miette::Report> {
    let services = Services::default();
    let request = Request {
        symbol_code,
        anchors,
        spline: false,
        label_offsets: (0.0, 1.0),
        labels,
    };
    let generated = generate(&services, &request)?;
    let elements = generated.elements.iter().map(|(n, e)| (n.as_str(), e));
    Ok(render::svg::render_elements(elements, generated.bounds, &services.settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_svg_reports_diagnostics() {
        let anchors = [GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)];
        let labels = LabelFields::default();
        let err = render_svg("GFGPGLP", &anchors, &labels).unwrap_err();
        assert!(err.to_string().contains("invalid symbol code"));

        let svg = render_svg("GFGPGLP---****X", &anchors, &labels).unwrap();
        assert!(svg.contains("<path id=\"Boundary\""));
    }
}
