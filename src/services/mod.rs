//! Collaborators the composer depends on, bundled for injection.
//!
//! Hosts assemble one [`Services`] at start-up (usually `Services::default()`
//! with a few replacements) and hand clones of it to every graphic.

use std::sync::Arc;

pub mod catalog;
pub mod geodesy;
pub mod spline;
pub mod text;

pub use catalog::{BuiltinCatalog, StencilCatalog, StencilTemplate};
pub use geodesy::{Geodesy, Spherical};
pub use spline::{CatmullRom, SplinePrimitive};
pub use text::{ProportionalMetrics, TextMetrics, TextStyle};

use crate::render::defaults::Settings;
use crate::stencil::Registry;

#[derive(Clone)]
pub struct Services {
    pub catalog: Arc<dyn StencilCatalog>,
    pub geodesy: Arc<dyn Geodesy>,
    pub spline: Arc<dyn SplinePrimitive>,
    pub metrics: Arc<dyn TextMetrics>,
    pub registry: Arc<Registry>,
    pub settings: Settings,
}

impl Default for Services {
    fn default() -> Self {
        Self {
            catalog: Arc::new(BuiltinCatalog::new()),
            geodesy: Arc::new(Spherical),
            spline: Arc::new(CatmullRom),
            metrics: Arc::new(ProportionalMetrics),
            registry: Arc::new(Registry::builtin()),
            settings: Settings::default(),
        }
    }
}

impl Services {
    pub fn with_catalog(mut self, catalog: Arc<dyn StencilCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_geodesy(mut self, geodesy: Arc<dyn Geodesy>) -> Self {
        self.geodesy = geodesy;
        self
    }

    pub fn with_spline(mut self, spline: Arc<dyn SplinePrimitive>) -> Self {
        self.spline = spline;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn TextMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Text style used for every label
    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            font_size: self.settings.label_font_size,
            ..TextStyle::default()
        }
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("registry", &self.registry.len())
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}
