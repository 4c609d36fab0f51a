//! Stencil catalog: template points and stencil type by stencil key.

use std::collections::HashMap;

use glam::{DVec2, dvec2};

use crate::errors::CatalogError;

/// A stencil's undeformed shape in template space and its type tag.
#[derive(Debug, Clone, PartialEq)]
pub struct StencilTemplate {
    pub points: Vec<DVec2>,
    pub stencil_type: String,
}

impl StencilTemplate {
    pub fn new(stencil_type: impl Into<String>, points: &[(f64, f64)]) -> Self {
        Self {
            points: points.iter().map(|&(x, y)| dvec2(x, y)).collect(),
            stencil_type: stencil_type.into(),
        }
    }

    /// Reject templates that cannot be fitted: fewer than two points or a
    /// non-finite coordinate
    pub fn validate(&self, key: &str) -> Result<(), CatalogError> {
        let malformed = |reason: String| CatalogError::Malformed {
            key: key.to_string(),
            reason,
        };
        if self.points.len() < 2 {
            return Err(malformed(format!("{} template points, need 2", self.points.len())));
        }
        if let Some(i) = self.points.iter().position(|p| !p.is_finite()) {
            return Err(malformed(format!("template point {i} is not finite")));
        }
        Ok(())
    }
}

/// Lookup of catalog entries. A missing entry is `Ok(None)`, not an error.
pub trait StencilCatalog: Send + Sync {
    fn lookup(&self, key: &str) -> Result<Option<StencilTemplate>, CatalogError>;
}

// Template shapes shared by several stencils
const LINE: &[(f64, f64)] = &[(-0.5, 0.0), (0.5, 0.0)];
const SQUARE: &[(f64, f64)] = &[(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)];
const ARROW: &[(f64, f64)] = &[(0.3, -0.2), (0.5, 0.0), (-0.5, 0.0), (0.3, 0.0)];
const SECURITY: &[(f64, f64)] = &[(0.0, 0.5), (-0.5, -0.5), (0.5, -0.5), (-0.23, -0.5)];
const CONTAIN: &[(f64, f64)] = &[
    (-0.5, -0.5),
    (0.5, -0.5),
    (0.0, 0.5),
    (0.0, -0.5),
    (-0.5, 0.5),
    (0.5, 0.5),
];
const TRIP_WIRE: &[(f64, f64)] = &[
    (-0.5, -0.5),
    (0.5, -0.5),
    (-0.25, 0.5),
    (-0.25, -0.5),
    (0.5, 0.5),
    (0.25, 0.5),
];
const WITHDRAW: &[(f64, f64)] = &[(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5)];
const TWO_POINT: &[(f64, f64)] = &[(0.0, -0.5), (0.0, 0.5)];

/// Catalog keys use `*` for affiliation and status.
const BUILTIN: &[(&str, &str, &[(f64, f64)])] = &[
    // Command and control lines
    ("G*G*GLB", "Boundary", LINE),
    ("G*G*GLF", "ForwardLineOfOwnTroops", LINE),
    ("G*G*GLP", "PhaseLine", LINE),
    ("G*G*GLL", "LightLine", LINE),
    ("G*G*OLT", "LineOfDeparture", LINE),
    ("G*G*OLL", "LimitOfAdvance", LINE),
    ("G*G*OLF", "FinalCoordinationLine", LINE),
    ("G*G*SLR", "ReleaseLine", LINE),
    // Obstacle lines
    ("G*M*OADC", "AntitankDitchMined", LINE),
    ("G*M*SL", "FortifiedLine", LINE),
    ("G*M*OAW", "AntitankWall", LINE),
    // Areas
    ("G*G*GAA", "AssemblyArea", SQUARE),
    ("G*G*GAD", "DropZone", SQUARE),
    ("G*G*GAX", "ExtractionZone", SQUARE),
    ("G*G*GAL", "LandingZone", SQUARE),
    ("G*G*GAP", "PickupZone", SQUARE),
    ("G*M*OGB", "ObstacleBelt", SQUARE),
    ("G*M*OGZ", "ObstacleZone", SQUARE),
    ("G*M*OGF", "ObstacleFreeArea", SQUARE),
    ("G*M*OGR", "ObstacleRestrictedArea", SQUARE),
    ("G*G*AAR", "RestrictedOperationsZone", SQUARE),
    ("G*F*ACAI", "AirspaceCoordinationArea", SQUARE),
    // Axes of advance
    ("G*G*OLAGM", "AxisOfAdvanceMainAttack", ARROW),
    ("G*G*OLAGS", "AxisOfAdvanceSupportingAttack", ARROW),
    ("G*G*OLAV", "AxisOfAdvanceAviation", ARROW),
    ("G*G*OLAA", "AxisOfAdvanceAirborne", ARROW),
    ("G*G*OLAR", "AxisOfAdvanceAttackRotaryWing", ARROW),
    ("G*G*PA", "AxisOfAdvanceFeint", ARROW),
    ("G*T*K", "CounterAttack", ARROW),
    // Mission tasks
    ("G*T*US", "Screen", SECURITY),
    ("G*T*UC", "Cover", SECURITY),
    ("G*T*UG", "Guard", SECURITY),
    ("G*T*J", "Contain", CONTAIN),
    ("G*T*X", "Clear", CONTAIN),
    ("G*M*ORP", "Roadblock", CONTAIN),
    ("G*M*BDE", "BypassEasy", CONTAIN),
    ("G*M*BDD", "BypassDifficult", CONTAIN),
    ("G*M*BDI", "BypassImpossible", CONTAIN),
    ("G*M*BCE", "FordEasy", CONTAIN),
    ("G*M*BCD", "FordDifficult", CONTAIN),
    ("G*M*OT", "TripWire", TRIP_WIRE),
    ("G*T*W", "Withdraw", WITHDRAW),
    ("G*T*WP", "WithdrawUnderPressure", WITHDRAW),
    ("G*T*L", "Delay", WITHDRAW),
    ("G*T*M", "Retirement", WITHDRAW),
    ("G*T*B", "Block", TWO_POINT),
    ("G*T*P", "Penetrate", TWO_POINT),
    ("G*T*C", "Canalize", TWO_POINT),
];

/// Replace the affiliation and status positions with `*`
pub fn wildcard_key(key: &str) -> String {
    key.chars()
        .enumerate()
        .map(|(i, c)| if i == 1 || i == 3 { '*' } else { c })
        .collect()
}

/// In-memory catalog holding every stencil this crate knows how to draw.
#[derive(Debug, Clone)]
pub struct BuiltinCatalog {
    entries: HashMap<String, StencilTemplate>,
}

impl Default for BuiltinCatalog {
    fn default() -> Self {
        let mut catalog = Self::empty();
        for &(key, stencil_type, points) in BUILTIN {
            catalog.insert(key, StencilTemplate::new(stencil_type, points));
        }
        catalog
    }
}

impl BuiltinCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Add or replace an entry; the key is stored in wildcard form
    pub fn insert(&mut self, key: &str, template: StencilTemplate) -> Option<StencilTemplate> {
        self.entries.insert(wildcard_key(key), template)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries sorted by key
    pub fn entries(&self) -> Vec<(&str, &StencilTemplate)> {
        let mut out: Vec<_> = self.entries.iter().map(|(k, v)| (k.as_str(), v)).collect();
        out.sort_by(|a, b| a.0.cmp(b.0));
        out
    }
}

impl StencilCatalog for BuiltinCatalog {
    fn lookup(&self, key: &str) -> Result<Option<StencilTemplate>, CatalogError> {
        Ok(self.entries.get(&wildcard_key(key)).cloned())
    }
}
