use camino::{Utf8Path, Utf8PathBuf};
use rayon::prelude::*;
use std::fs;
use tacgraph::render::svg::to_svg;
use tacgraph::services::{BuiltinCatalog, StencilTemplate};
use tacgraph::stencil::{DeriveAnchors, Drawing, Registry};
use tacgraph::{GeoPoint, Graphic, LabelField, Services};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo xtask <command>");
        eprintln!("Commands:");
        eprintln!("  gallery [DIR]   Render every built-in stencil to SVG (default: target/gallery)");
        std::process::exit(1);
    }

    match args[1].as_str() {
        "gallery" => {
            let manifest_dir = Utf8Path::new(env!("CARGO_MANIFEST_DIR"));
            let out = args
                .get(2)
                .map(|s| Utf8PathBuf::from(s.as_str()))
                .unwrap_or_else(|| manifest_dir.join("../target/gallery"));
            gallery(&out);
        }
        _ => {
            eprintln!("Unknown command: {}", args[1]);
            std::process::exit(1);
        }
    }
}

/// Degrees per template unit when laying sample anchors out
const SAMPLE_SPAN: f64 = 0.02;

/// Full symbol code for a catalog key: friendly, present, no modifiers
fn symbol_code(key: &str) -> String {
    let mut code: String = key
        .chars()
        .enumerate()
        .map(|(i, c)| match (i, c) {
            (1, '*') => 'F',
            (3, '*') => 'P',
            _ => c,
        })
        .collect();
    while code.len() < 10 {
        code.push('-');
    }
    code.push_str("****X");
    code
}

/// Anchors a user would click for a stencil, taken from its template
fn sample_anchors(registry: &Registry, template: &StencilTemplate) -> Vec<GeoPoint> {
    let geo = |x: f64, y: f64| GeoPoint::new(-y * SAMPLE_SPAN, x * SAMPLE_SPAN);
    let recipe = registry.resolve(&template.stencil_type);
    let pts = &template.points;
    match recipe.drawing {
        // Tip, tail, then the barb
        Drawing::Arrow { .. } if pts.len() >= 3 => {
            vec![geo(pts[1].x, pts[1].y), geo(pts[2].x, pts[2].y), geo(pts[0].x, pts[0].y)]
        }
        Drawing::Zone(_) | Drawing::Polyline => pts.iter().map(|p| geo(p.x, p.y)).collect(),
        _ => pts
            .iter()
            .take(recipe.rule.min_anchors())
            .map(|p| geo(p.x, p.y))
            .collect(),
    }
}

fn gallery(out: &Utf8Path) {
    if let Err(e) = fs::create_dir_all(out) {
        eprintln!("Failed to create {out}: {e}");
        std::process::exit(1);
    }

    let catalog = BuiltinCatalog::new();
    let registry = Registry::builtin();
    let entries = catalog.entries();

    let results: Vec<(String, Result<Utf8PathBuf, String>)> = entries
        .par_iter()
        .map(|(key, template)| {
            let code = symbol_code(key);
            let mut graphic = Graphic::with(Services::default(), &code, sample_anchors(&registry, template));
            graphic.set_label(LabelField::T, "ALPHA");
            let rendered = match graphic.last_error() {
                Some(e) => Err(e.to_string()),
                None => {
                    let path = out.join(format!("{}.svg", template.stencil_type));
                    fs::write(&path, to_svg(&graphic))
                        .map(|_| path)
                        .map_err(|e| e.to_string())
                }
            };
            (template.stencil_type.clone(), rendered)
        })
        .collect();

    let mut failed = 0;
    for (stencil_type, result) in &results {
        match result {
            Ok(path) => eprintln!("  {stencil_type:<32} {path}"),
            Err(e) => {
                failed += 1;
                eprintln!("  {stencil_type:<32} FAILED: {e}");
            }
        }
    }
    eprintln!("{} rendered, {failed} failed", results.len() - failed);
    if failed > 0 {
        std::process::exit(1);
    }
}
