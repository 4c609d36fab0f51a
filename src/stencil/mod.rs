//! Stencil classification and anchor derivation.
//!
//! A [`Registry`] maps every stencil type tag from the catalog to a
//! [`StencilRecipe`]: the rule that turns raw anchors into the fixed anchor
//! list the transform solver fits, and the [`Drawing`] the composer emits.
//! Unknown tags fall back to a pass-through recipe drawn as a plain line.

use std::collections::HashMap;
use std::fmt;

use glam::DVec2;

pub mod rules;

pub use rules::{ArrowAnchors, DerivationRule, DeriveAnchors};

use crate::errors::GraphicError;
use crate::log::debug;
use crate::render::decorate::{DecorationStyle, Side};
use crate::render::geometry::square_third;
use crate::services::Geodesy;
use crate::types::GeoPoint;

// ============================================================================
// Index Pairs
// ============================================================================

/// Two positions into the enriched anchor list, written 1-based as two digits
/// (`"21"` is anchors 1 and 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IndexPair {
    pub first: usize,
    pub second: usize,
}

impl IndexPair {
    pub fn new(first: usize, second: usize) -> Self {
        Self { first, second }
    }

    /// Parse the two-digit form; anything else is `None`.
    pub fn parse(s: &str) -> Option<Self> {
        let mut digits = s.chars().map(|c| c.to_digit(10));
        match (digits.next(), digits.next(), digits.next()) {
            (Some(Some(a)), Some(Some(b)), None) if a > 0 && b > 0 => {
                Some(Self::new(a as usize - 1, b as usize - 1))
            }
            _ => None,
        }
    }

    /// Digit order counts as reversed when the first digit is the larger one.
    pub fn is_descending(&self) -> bool {
        self.first > self.second
    }
}

impl fmt::Display for IndexPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.first + 1, self.second + 1)
    }
}

// ============================================================================
// Recipes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowVariant {
    MainAttack,
    SupportingAttack,
    Aviation,
    Airborne,
    RotaryWing,
    Feint,
    CounterAttack,
}

/// Template figures drawn in squared sub-transform frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FigureKind {
    /// Screen, cover and guard, with their letter
    Security(char),
    Contain,
    Clear,
    Roadblock,
    BypassEasy,
    BypassDifficult,
    BypassImpossible,
    FordEasy,
    FordDifficult,
    TripWire,
    Withdraw,
    WithdrawUnderPressure,
    Delay,
    Retirement,
    Block,
    Penetrate,
    Canalize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneDrawing {
    /// Title prefix before the unique designation
    pub header: &'static str,
    pub decoration: Option<(DecorationStyle, Side)>,
    pub hatched: bool,
    /// Shows the W/W1 date-time group
    pub time: bool,
    /// Shows the X/X1 altitude band
    pub altitude: bool,
}

/// What the composer builds from the derived anchors
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Drawing {
    /// Unknown stencil: the anchors joined by straight lines
    Polyline,
    /// Labelled control line, `header` prefixes the designation
    Line { header: &'static str },
    DecoratedLine { style: DecorationStyle, side: Side },
    Zone(ZoneDrawing),
    Arrow { variant: ArrowVariant, flip_sides: bool },
    Figure(FigureKind),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StencilRecipe {
    pub rule: DerivationRule,
    pub drawing: Drawing,
}

impl StencilRecipe {
    pub fn new(rule: impl Into<DerivationRule>, drawing: Drawing) -> Self {
        Self {
            rule: rule.into(),
            drawing,
        }
    }

    /// Recipe for tags the registry does not know
    pub fn passthrough() -> Self {
        Self::new(rules::Passthrough, Drawing::Polyline)
    }
}

/// Arrow variants drawn with the body sides swapped
fn flips_sides(stencil_type: &str) -> bool {
    ["Aviation", "Airborne", "RotaryWing"]
        .iter()
        .any(|suffix| stencil_type.ends_with(suffix))
}

fn zone(header: &'static str) -> ZoneDrawing {
    ZoneDrawing {
        header,
        decoration: None,
        hatched: false,
        time: false,
        altitude: false,
    }
}

/// Stencil type tag to recipe, built once and shared
#[derive(Debug, Clone, Default)]
pub struct Registry {
    recipes: HashMap<String, StencilRecipe>,
}

impl Registry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every stencil the built-in catalog carries
    pub fn builtin() -> Self {
        use rules::{Arrow, Contain, Line, Region, Security, TripWire, TwoPoint, Withdraw};

        let mut reg = Self::empty();

        for (tag, header) in [
            ("PhaseLine", "PL"),
            ("LightLine", "LL"),
            ("LineOfDeparture", "LD"),
            ("LimitOfAdvance", "LOA"),
            ("FinalCoordinationLine", "FCL"),
            ("ReleaseLine", "RL"),
        ] {
            reg.register(tag, StencilRecipe::new(Line, Drawing::Line { header }));
        }

        for (tag, style) in [
            ("Boundary", DecorationStyle::Echelon),
            ("ForwardLineOfOwnTroops", DecorationStyle::Triangular),
            ("AntitankDitchMined", DecorationStyle::SolidTriangular),
            ("FortifiedLine", DecorationStyle::Square),
            ("AntitankWall", DecorationStyle::Saw),
        ] {
            let drawing = Drawing::DecoratedLine {
                style,
                side: Side::Left,
            };
            reg.register(tag, StencilRecipe::new(Line, drawing));
        }

        let zones = [
            ("AssemblyArea", zone("AA")),
            ("DropZone", zone("DZ")),
            ("ExtractionZone", zone("EZ")),
            ("LandingZone", zone("LZ")),
            ("PickupZone", zone("PZ")),
            (
                "ObstacleBelt",
                ZoneDrawing {
                    decoration: Some((DecorationStyle::Triangular, Side::Inside)),
                    ..zone("BELT")
                },
            ),
            ("ObstacleZone", zone("ZONE")),
            (
                "ObstacleFreeArea",
                ZoneDrawing {
                    decoration: Some((DecorationStyle::Square, Side::Outside)),
                    hatched: true,
                    time: true,
                    ..zone("FREE")
                },
            ),
            (
                "ObstacleRestrictedArea",
                ZoneDrawing {
                    decoration: Some((DecorationStyle::Square, Side::Outside)),
                    hatched: true,
                    time: true,
                    ..zone("RESTRICTED")
                },
            ),
            (
                "RestrictedOperationsZone",
                ZoneDrawing {
                    time: true,
                    altitude: true,
                    ..zone("ROZ")
                },
            ),
            (
                "AirspaceCoordinationArea",
                ZoneDrawing {
                    time: true,
                    altitude: true,
                    ..zone("ACA")
                },
            ),
        ];
        for (tag, drawing) in zones {
            reg.register(tag, StencilRecipe::new(Region, Drawing::Zone(drawing)));
        }

        for (tag, variant) in [
            ("AxisOfAdvanceMainAttack", ArrowVariant::MainAttack),
            ("AxisOfAdvanceSupportingAttack", ArrowVariant::SupportingAttack),
            ("AxisOfAdvanceAviation", ArrowVariant::Aviation),
            ("AxisOfAdvanceAirborne", ArrowVariant::Airborne),
            ("AxisOfAdvanceAttackRotaryWing", ArrowVariant::RotaryWing),
            ("AxisOfAdvanceFeint", ArrowVariant::Feint),
            ("CounterAttack", ArrowVariant::CounterAttack),
        ] {
            let drawing = Drawing::Arrow {
                variant,
                flip_sides: flips_sides(tag),
            };
            reg.register(tag, StencilRecipe::new(Arrow, drawing));
        }

        for (tag, letter) in [("Screen", 'S'), ("Cover", 'C'), ("Guard", 'G')] {
            let drawing = Drawing::Figure(FigureKind::Security(letter));
            reg.register(tag, StencilRecipe::new(Security, drawing));
        }

        for (tag, kind) in [
            ("Contain", FigureKind::Contain),
            ("Clear", FigureKind::Clear),
            ("Roadblock", FigureKind::Roadblock),
            ("BypassEasy", FigureKind::BypassEasy),
            ("BypassDifficult", FigureKind::BypassDifficult),
            ("BypassImpossible", FigureKind::BypassImpossible),
            ("FordEasy", FigureKind::FordEasy),
            ("FordDifficult", FigureKind::FordDifficult),
        ] {
            reg.register(tag, StencilRecipe::new(Contain, Drawing::Figure(kind)));
        }

        reg.register(
            "TripWire",
            StencilRecipe::new(TripWire, Drawing::Figure(FigureKind::TripWire)),
        );

        for (tag, kind) in [
            ("Withdraw", FigureKind::Withdraw),
            ("WithdrawUnderPressure", FigureKind::WithdrawUnderPressure),
            ("Delay", FigureKind::Delay),
            ("Retirement", FigureKind::Retirement),
        ] {
            reg.register(tag, StencilRecipe::new(Withdraw, Drawing::Figure(kind)));
        }

        for (tag, kind) in [
            ("Block", FigureKind::Block),
            ("Penetrate", FigureKind::Penetrate),
            ("Canalize", FigureKind::Canalize),
        ] {
            reg.register(tag, StencilRecipe::new(TwoPoint, Drawing::Figure(kind)));
        }

        reg
    }

    pub fn register(&mut self, tag: impl Into<String>, recipe: StencilRecipe) -> Option<StencilRecipe> {
        self.recipes.insert(tag.into(), recipe)
    }

    pub fn get(&self, tag: &str) -> Option<&StencilRecipe> {
        self.recipes.get(tag)
    }

    /// The recipe for `tag`, or the pass-through recipe
    pub fn resolve(&self, tag: &str) -> StencilRecipe {
        self.get(tag).copied().unwrap_or_else(StencilRecipe::passthrough)
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Registered tags in sorted order
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.recipes.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

// ============================================================================
// Derivation
// ============================================================================

/// Result of anchor derivation
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    /// Enriched anchors; the solver fits the template onto these
    pub anchors: Vec<GeoPoint>,
    /// True when the last anchor was synthesized after enrichment
    pub synthetic_third: bool,
    pub index_pairs: Vec<IndexPair>,
    /// Template with a synthetic third point matching `anchors`
    pub template_override: Option<Vec<DVec2>>,
}

impl Derivation {
    /// Anchors the user actually placed or the rule derived, without the
    /// synthetic squaring point.
    pub fn drawn_anchors(&self) -> &[GeoPoint] {
        if self.synthetic_third {
            &self.anchors[..self.anchors.len() - 1]
        } else {
            &self.anchors
        }
    }

    /// The template to fit: the override when present
    pub fn template<'a>(&'a self, catalog: &'a [DVec2]) -> &'a [DVec2] {
        self.template_override.as_deref().unwrap_or(catalog)
    }
}

/// Third anchor squared off `anchors[1]`, turning right or left of the
/// direction `anchors[0] -> anchors[1]`.
fn synthesize_third(geo: &dyn Geodesy, a0: GeoPoint, a1: GeoPoint, right: bool) -> GeoPoint {
    let turn = if right { 90.0 } else { -90.0 };
    geo.destination(a1, geo.bearing(a1, a0) + turn, geo.range(a1, a0))
}

/// Derive the anchor list a stencil is fitted onto.
///
/// `stencil_type` only labels errors; the behaviour comes from `rule`.
pub fn derive(
    stencil_type: &str,
    rule: &DerivationRule,
    geo: &dyn Geodesy,
    anchors: &[GeoPoint],
    template: &[DVec2],
) -> Result<Derivation, GraphicError> {
    let needed = rule.min_anchors();
    let right = rule.right_handed();
    let mut raw = anchors.to_vec();
    if raw.len() < needed && raw.len() == 2 {
        debug!(stencil_type, "extending two anchors with a squared third");
        raw.push(synthesize_third(geo, raw[0], raw[1], right));
    }
    if raw.len() < needed {
        return Err(GraphicError::InsufficientAnchors {
            stencil: stencil_type.to_string(),
            needed,
            got: anchors.len(),
        });
    }

    let mut enriched = rule.enrich(geo, &raw);
    let mut synthetic_third = false;
    let mut template_override = None;
    if enriched.len() == 2 {
        enriched.push(synthesize_third(geo, enriched[0], enriched[1], right));
        synthetic_third = true;
        if let [t0, t1, ..] = template {
            let mut t = template.to_vec();
            let third = square_third(*t0, *t1, right);
            match t.get_mut(2) {
                Some(slot) => *slot = third,
                None => t.push(third),
            }
            template_override = Some(t);
        }
    }

    let index_pairs = rule
        .index_pairs()
        .iter()
        .filter_map(|s| IndexPair::parse(s))
        .collect();

    Ok(Derivation {
        anchors: enriched,
        synthetic_third,
        index_pairs,
        template_override,
    })
}
