//! SVG preview of a generated graphic
//!
//! Paths keep their style tags as SVG attributes; labels are emitted as text
//! placed through their orientation matrix. Colors are left to the viewer
//! (`currentColor`), as a host renderer would resolve them.

use std::fmt::Write;

use super::defaults::Settings;
use super::types::{Element, Fill, Label, PathElement, Stroke, fmt_num};
use crate::graphic::Graphic;
use crate::types::Bounds;

/// Margin around the graphic bounds, in pixels
const MARGIN: f64 = 8.0;

/// Render a graphic's current elements
pub fn to_svg(graphic: &Graphic) -> String {
    render_elements(graphic.elements().iter(), graphic.bounds(), &graphic.services().settings)
}

/// Render named elements inside `bounds`
pub fn render_elements<'a>(
    elements: impl IntoIterator<Item = (&'a str, &'a Element)>,
    bounds: Bounds,
    settings: &Settings,
) -> String {
    let elements: Vec<(&str, &Element)> = elements.into_iter().collect();
    let view = if bounds.is_empty() {
        Bounds::from_points([glam::DVec2::ZERO]).inflate(MARGIN)
    } else {
        bounds.inflate(MARGIN)
    };
    crate::log::debug!(elements = elements.len(), width = view.width(), height = view.height(), "svg");

    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
        fmt_num(view.min.x),
        fmt_num(view.min.y),
        fmt_num(view.width()),
        fmt_num(view.height())
    );

    let hatch = elements.iter().find_map(|(_, e)| match e.as_path()?.style.fill {
        Fill::Hatch { spacing, opacity } => Some((spacing, opacity)),
        _ => None,
    });
    if let Some((spacing, opacity)) = hatch {
        let s = fmt_num(spacing);
        let _ = writeln!(
            out,
            r#"<defs><pattern id="hatch" patternUnits="userSpaceOnUse" width="{s}" height="{s}" patternTransform="rotate(45)"><line x1="0" y1="0" x2="0" y2="{s}" stroke="currentColor" stroke-opacity="{}"/></pattern></defs>"#,
            fmt_num(opacity)
        );
    }

    for (name, element) in &elements {
        match element {
            Element::Path(p) => write_path(&mut out, name, p),
            Element::Label(l) => write_label(&mut out, name, l, settings),
        }
    }
    out.push_str("</svg>\n");
    out
}

fn write_path(out: &mut String, name: &str, p: &PathElement) {
    let fill = match p.style.fill {
        Fill::None => "none",
        Fill::Solid => "currentColor",
        Fill::Hatch { .. } => "url(#hatch)",
    };
    let stroke = match p.style.stroke {
        Stroke::None => "none",
        Stroke::Solid | Stroke::Dashed => "currentColor",
    };
    let dash = if p.style.stroke == Stroke::Dashed {
        r#" stroke-dasharray="8,4""#
    } else {
        ""
    };
    let _ = writeln!(
        out,
        r#"<path id="{}" d="{}" fill="{fill}" stroke="{stroke}" stroke-width="2"{dash}/>"#,
        escape_text(name),
        p.path
    );
}

fn write_label(out: &mut String, name: &str, label: &Label, settings: &Settings) {
    let m = label.matrix;
    let p = label.position;
    let font = settings.label_font_size;
    let _ = write!(
        out,
        r#"<text id="{}" transform="matrix({} {} {} {} {} {})" font-size="{}" fill="currentColor">"#,
        escape_text(name),
        fmt_num(m.x_axis.x),
        fmt_num(m.x_axis.y),
        fmt_num(m.y_axis.x),
        fmt_num(m.y_axis.y),
        fmt_num(p.x),
        fmt_num(p.y),
        fmt_num(font)
    );
    // Baseline of the first line sits one ascent below the box top
    let mut y = label.offset.y + font * 0.8;
    for line in label.text.split('\n') {
        let _ = write!(
            out,
            r#"<tspan x="{}" y="{}">{}</tspan>"#,
            fmt_num(label.offset.x),
            fmt_num(y),
            escape_text(line)
        );
        y += font * 1.2;
    }
    out.push_str("</text>\n");
}

/// Escape markup characters, passing character entities through unchanged
fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for (i, c) in s.char_indices() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '&' if is_entity_at(s.as_bytes(), i) => result.push('&'),
            '&' => result.push_str("&amp;"),
            _ => result.push(c),
        }
    }
    result
}

/// Whether position `i` starts an entity: `&[#]?[a-zA-Z0-9]+;`
fn is_entity_at(bytes: &[u8], i: usize) -> bool {
    let mut j = i + 1;
    if bytes.get(j) == Some(&b'#') {
        j += 1;
    }
    let start = j;
    while bytes.get(j).is_some_and(u8::is_ascii_alphanumeric) {
        j += 1;
    }
    j > start && bytes.get(j) == Some(&b';')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::LabelField;
    use crate::services::Services;
    use crate::types::GeoPoint;

    #[test]
    fn escapes_markup_but_keeps_entities() {
        assert_eq!(escape_text("A<B & C"), "A&lt;B &amp; C");
        assert_eq!(escape_text("&amp; &#176; &x"), "&amp; &#176; &amp;x");
        assert_eq!(escape_text("&;"), "&amp;;");
    }

    #[test]
    fn phase_line_preview() {
        let mut g = Graphic::with(
            Services::default(),
            "GFGPGLP---****X",
            vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)],
        );
        g.set_label(LabelField::T, "A&B");
        let svg = to_svg(&g);
        assert!(svg.starts_with("<svg "));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains(r#"<path id="Boundary" d="M"#));
        assert_eq!(svg.matches("<text ").count(), 2);
        assert!(svg.contains("PL A&amp;B"));
        assert!(!svg.contains("<pattern"));
    }

    #[test]
    fn hatched_zone_gets_a_pattern() {
        let g = Graphic::with(
            Services::default(),
            "GFMPOGR---****X",
            vec![
                GeoPoint::new(0.0, 0.0),
                GeoPoint::new(0.0, 0.02),
                GeoPoint::new(-0.02, 0.01),
            ],
        );
        let svg = to_svg(&g);
        assert!(svg.contains(r#"<pattern id="hatch""#));
        assert!(svg.contains(r#"fill="url(#hatch)""#));
    }

    #[test]
    fn empty_graphic_still_renders() {
        let g = Graphic::new(Services::default());
        let svg = to_svg(&g);
        assert!(svg.contains(r#"viewBox="-8 -8 16 16""#));
    }
}
