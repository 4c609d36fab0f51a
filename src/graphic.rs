//! The stateful tactical graphic.
//!
//! A [`Graphic`] owns its inputs (symbol code, anchors, label fields) and the
//! elements generated from them. Every setter marks the graphic dirty and
//! regenerates straight away, unless an [`UpdateScope`] is open: then the
//! single regeneration runs when the outermost scope is dropped.
//!
//! Failed regenerations never escape. Bad input empties the graphic; a
//! failing collaborator or degenerate geometry keeps the last good elements.

use std::ops::{Deref, DerefMut};

use crate::errors::GraphicError;
use crate::log::{debug, info, warn};
use crate::render::{ElementMap, LabelField, LabelFields, Request, Solution, generate};
use crate::services::Services;
use crate::types::{Bounds, GeoPoint};

#[derive(Debug)]
pub struct Graphic {
    services: Services,
    symbol_code: String,
    stencil_type: Option<String>,
    anchors: Vec<GeoPoint>,
    spline: bool,
    label_offsets: (f64, f64),
    labels: LabelFields,
    elements: ElementMap,
    bounds: Bounds,
    origin: Option<GeoPoint>,
    solution: Option<Solution>,
    /// Zoom of the last rescale and the render scale it produced
    zoom: Option<f64>,
    render_scale: f64,
    dirty: bool,
    update_depth: usize,
    regenerating: bool,
    regenerations: u64,
    last_error: Option<GraphicError>,
}

impl Graphic {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            symbol_code: String::new(),
            stencil_type: None,
            anchors: Vec::new(),
            spline: false,
            label_offsets: (0.0, 1.0),
            labels: LabelFields::default(),
            elements: ElementMap::new(),
            bounds: Bounds::new(),
            origin: None,
            solution: None,
            zoom: None,
            render_scale: 1.0,
            dirty: false,
            update_depth: 0,
            regenerating: false,
            regenerations: 0,
            last_error: None,
        }
    }

    /// A graphic with its code and anchors set and generated once
    pub fn with(services: Services, symbol_code: &str, anchors: Vec<GeoPoint>) -> Self {
        let mut graphic = Self::new(services);
        {
            let mut scope = graphic.begin_update();
            scope.set_symbol_code(symbol_code);
            scope.set_anchors(anchors);
        }
        graphic
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn symbol_code(&self) -> &str {
        &self.symbol_code
    }

    /// Stencil type of the last successful generation
    pub fn stencil_type(&self) -> Option<&str> {
        self.stencil_type.as_deref()
    }

    pub fn anchors(&self) -> &[GeoPoint] {
        &self.anchors
    }

    pub fn is_spline(&self) -> bool {
        self.spline
    }

    pub fn label_offsets(&self) -> (f64, f64) {
        self.label_offsets
    }

    pub fn label(&self, field: LabelField) -> &str {
        self.labels.get(field)
    }

    pub fn labels(&self) -> &LabelFields {
        &self.labels
    }

    pub fn elements(&self) -> &ElementMap {
        &self.elements
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Geographic position of graphic pixel zero
    pub fn origin(&self) -> Option<GeoPoint> {
        self.origin
    }

    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    /// Projection scale the element pixels are measured at
    pub fn scale_factor(&self) -> f64 {
        self.solution.as_ref().map_or(1.0, |s| s.scale_factor)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Number of regenerations run so far, failed ones included
    pub fn regenerations(&self) -> u64 {
        self.regenerations
    }

    pub fn last_error(&self) -> Option<&GraphicError> {
        self.last_error.as_ref()
    }

    // ------------------------------------------------------------------------
    // Setters
    // ------------------------------------------------------------------------

    pub fn set_symbol_code(&mut self, code: impl Into<String>) {
        let code = code.into();
        if code != self.symbol_code {
            self.symbol_code = code;
            self.changed();
        }
    }

    /// Replace the whole anchor list
    pub fn set_anchors(&mut self, anchors: Vec<GeoPoint>) {
        if anchors != self.anchors {
            self.anchors = anchors;
            self.changed();
        }
    }

    pub fn set_spline(&mut self, spline: bool) {
        if spline != self.spline {
            self.spline = spline;
            self.changed();
        }
    }

    pub fn set_label(&mut self, field: LabelField, value: impl Into<String>) {
        if self.labels.set(field, value) {
            self.changed();
        }
    }

    /// Fractions along a line for its start and end labels
    pub fn set_label_offsets(&mut self, offsets: (f64, f64)) {
        if offsets != self.label_offsets {
            self.label_offsets = offsets;
            self.changed();
        }
    }

    fn changed(&mut self) {
        self.dirty = true;
        if self.update_depth == 0 {
            self.regenerate();
        }
    }

    // ------------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------------

    /// Defer regeneration until the returned scope (and any nested ones) drop
    pub fn begin_update(&mut self) -> UpdateScope<'_> {
        self.update_depth += 1;
        UpdateScope { graphic: self }
    }

    /// Rebuild every element from the current inputs.
    ///
    /// A call made while a regeneration is already running does nothing.
    pub fn regenerate(&mut self) {
        if self.regenerating {
            debug!("regeneration already running, skipped");
            return;
        }
        let mut running = Regenerating::start(self);
        running.graphic.rebuild();
    }

    fn rebuild(&mut self) {
        self.regenerations += 1;

        let request = Request {
            symbol_code: &self.symbol_code,
            anchors: &self.anchors,
            spline: self.spline,
            label_offsets: self.label_offsets,
            labels: &self.labels,
        };
        match generate(&self.services, &request) {
            Ok(generated) => {
                self.elements.apply(generated.elements);
                self.bounds = generated.bounds;
                self.origin = Some(generated.origin);
                self.stencil_type = Some(generated.stencil_type);
                self.solution = Some(generated.solution);
                self.last_error = None;
                // Pixels changed scale; the next rescale must recompute
                self.zoom = None;
            }
            Err(error) if error.keeps_previous_state() => {
                warn!(%error, code = %self.symbol_code, "regeneration failed, keeping previous graphic");
                self.last_error = Some(error);
            }
            Err(error) => {
                info!(%error, code = %self.symbol_code, "graphic cleared");
                self.elements.clear();
                self.bounds = Bounds::new();
                self.origin = None;
                self.stencil_type = None;
                self.solution = None;
                self.zoom = None;
                self.last_error = Some(error);
            }
        }

        self.dirty = false;
    }

    /// Scale from element pixels to map pixels at `zoom`: `2^zoom / scale_factor`.
    ///
    /// Pending changes are regenerated first; an unchanged zoom on a clean
    /// graphic returns the cached value.
    pub fn rescale(&mut self, zoom: f64) -> f64 {
        if self.zoom == Some(zoom) && !self.dirty {
            return self.render_scale;
        }
        if self.dirty && self.update_depth == 0 {
            self.regenerate();
        }
        self.render_scale = zoom.exp2() / self.scale_factor();
        self.zoom = Some(zoom);
        debug!(zoom, render_scale = self.render_scale, "rescaled");
        self.render_scale
    }
}

/// Holds the reentrancy flag while a regeneration runs; dropping it clears
/// the flag, also when a collaborator panics.
struct Regenerating<'a> {
    graphic: &'a mut Graphic,
}

impl<'a> Regenerating<'a> {
    fn start(graphic: &'a mut Graphic) -> Self {
        graphic.regenerating = true;
        Regenerating { graphic }
    }
}

impl Drop for Regenerating<'_> {
    fn drop(&mut self) {
        self.graphic.regenerating = false;
    }
}

/// Batches setter calls into one regeneration.
///
/// Derefs to the graphic so setters can be called on the scope directly.
#[must_use = "dropping the scope immediately regenerates"]
pub struct UpdateScope<'a> {
    graphic: &'a mut Graphic,
}

impl Deref for UpdateScope<'_> {
    type Target = Graphic;

    fn deref(&self) -> &Graphic {
        self.graphic
    }
}

impl DerefMut for UpdateScope<'_> {
    fn deref_mut(&mut self) -> &mut Graphic {
        self.graphic
    }
}

impl Drop for UpdateScope<'_> {
    fn drop(&mut self) {
        self.graphic.update_depth -= 1;
        if self.graphic.update_depth == 0 && self.graphic.dirty {
            self.graphic.regenerate();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::errors::CatalogError;
    use crate::services::{BuiltinCatalog, StencilCatalog, StencilTemplate};

    fn phase_line() -> Vec<GeoPoint> {
        vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 1.0)]
    }

    #[test]
    fn setters_regenerate_immediately() {
        let mut g = Graphic::new(Services::default());
        g.set_symbol_code("GFGPGLP---****X");
        assert_eq!(g.regenerations(), 1);
        // No anchors yet: cleared, not kept
        assert!(g.elements().is_empty());
        assert!(matches!(g.last_error(), Some(GraphicError::InsufficientAnchors { .. })));

        g.set_anchors(phase_line());
        assert_eq!(g.regenerations(), 2);
        assert_eq!(g.stencil_type(), Some("PhaseLine"));
        assert!(!g.is_dirty());

        // Setting the same value is not a change
        g.set_anchors(phase_line());
        assert_eq!(g.regenerations(), 2);
    }

    #[test]
    fn nested_scopes_regenerate_once() {
        let mut g = Graphic::new(Services::default());
        {
            let mut outer = g.begin_update();
            outer.set_symbol_code("GFGPGLP---****X");
            {
                let mut inner = outer.begin_update();
                inner.set_anchors(phase_line());
                inner.set_label(LabelField::T, "ALPHA");
            }
            assert_eq!(outer.regenerations(), 0);
            assert!(outer.is_dirty());
            outer.set_spline(true);
        }
        assert_eq!(g.regenerations(), 1);
        assert_eq!(g.elements().names(), ["Boundary", "StartLabel", "EndLabel"]);
    }

    #[test]
    fn scope_regenerates_on_unwind() {
        let mut g = Graphic::new(Services::default());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let mut scope = g.begin_update();
            scope.set_symbol_code("GFGPGLP---****X");
            scope.set_anchors(phase_line());
            panic!("host failure mid-update");
        }));
        assert!(result.is_err());
        assert_eq!(g.regenerations(), 1);
        assert_eq!(g.stencil_type(), Some("PhaseLine"));
    }

    #[test]
    fn reentrant_regeneration_is_ignored() {
        let mut g = Graphic::with(Services::default(), "GFGPGLP---****X", phase_line());
        let before = g.regenerations();
        g.regenerating = true;
        g.regenerate();
        assert_eq!(g.regenerations(), before);
        g.regenerating = false;
        g.regenerate();
        assert_eq!(g.regenerations(), before + 1);
    }

    /// Panics on every lookup while armed
    struct Exploding {
        inner: BuiltinCatalog,
        armed: std::sync::atomic::AtomicBool,
    }

    impl StencilCatalog for Exploding {
        fn lookup(&self, key: &str) -> Result<Option<StencilTemplate>, CatalogError> {
            if self.armed.load(std::sync::atomic::Ordering::SeqCst) {
                panic!("catalog backend crashed");
            }
            self.inner.lookup(key)
        }
    }

    #[test]
    fn panicking_collaborator_does_not_wedge_regeneration() {
        let catalog = Arc::new(Exploding {
            inner: BuiltinCatalog::new(),
            armed: true.into(),
        });
        let services = Services::default().with_catalog(catalog.clone());
        let mut g = Graphic::new(services);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            g.set_symbol_code("GFGPGLP---****X");
        }));
        assert!(result.is_err());
        assert!(!g.regenerating);

        catalog.armed.store(false, std::sync::atomic::Ordering::SeqCst);
        g.set_anchors(phase_line());
        assert_eq!(g.regenerations(), 2);
        assert_eq!(g.stencil_type(), Some("PhaseLine"));
    }

    /// Serves the built-in templates until switched off
    struct Flaky {
        inner: BuiltinCatalog,
        down: std::sync::atomic::AtomicBool,
    }

    impl StencilCatalog for Flaky {
        fn lookup(&self, key: &str) -> Result<Option<StencilTemplate>, CatalogError> {
            if self.down.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(CatalogError::Unavailable {
                    key: key.to_string(),
                    reason: "offline".into(),
                });
            }
            self.inner.lookup(key)
        }
    }

    #[test]
    fn collaborator_failure_keeps_previous_state() {
        let catalog = Arc::new(Flaky {
            inner: BuiltinCatalog::new(),
            down: false.into(),
        });
        let services = Services::default().with_catalog(catalog.clone());
        let mut g = Graphic::with(services, "GFGPGLP---****X", phase_line());
        let elements = g.elements().clone();
        let origin = g.origin();

        catalog.down.store(true, std::sync::atomic::Ordering::SeqCst);
        g.set_label(LabelField::T, "BRAVO");
        assert!(matches!(g.last_error(), Some(GraphicError::Catalog(_))));
        assert_eq!(g.elements(), &elements);
        assert_eq!(g.origin(), origin);

        catalog.down.store(false, std::sync::atomic::Ordering::SeqCst);
        g.regenerate();
        assert!(g.last_error().is_none());
        assert_ne!(g.elements(), &elements);
    }

    #[test]
    fn invalid_code_clears_the_graphic() {
        let mut g = Graphic::with(Services::default(), "GFGPGLP---****X", phase_line());
        assert!(!g.elements().is_empty());
        g.set_symbol_code("GFGPGLP");
        assert!(g.elements().is_empty());
        assert!(g.bounds().is_empty());
        assert_eq!(g.origin(), None);
        assert!(matches!(g.last_error(), Some(GraphicError::InvalidSymbolCode(_))));
    }

    #[test]
    fn rescale_reports_render_scale() {
        let mut g = Graphic::with(Services::default(), "GFGPGLP---****X", phase_line());
        let sf = g.scale_factor();
        let r = g.rescale(10.0);
        assert!((r - 1024.0 / sf).abs() < 1e-9 * r);
        let before = g.regenerations();
        assert_eq!(g.rescale(10.0), r);
        assert_eq!(g.regenerations(), before);
        // Zooming in one level doubles it
        assert!((g.rescale(11.0) - 2.0 * r).abs() < 1e-9 * r);
    }
}
