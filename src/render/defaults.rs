//! Default sizes and settings (pixels at the graphic's own scale factor)

/// Pixel length the template's unit x vector is normalized to
pub const TARGET_UNIT_PX: f64 = 100.0;
/// Nominal length of one decoration tick
pub const TICK_SIZE: f64 = 12.0;
/// Arrow body half-width relative to the arrowhead half-width
pub const ARROW_BODY_RATIO: f64 = 0.5;
pub const LABEL_FONT_SIZE: f64 = 14.0;
/// Space between a label and the geometry it annotates
pub const LABEL_GAP: f64 = 4.0;
pub const HATCH_SPACING: f64 = 8.0;
pub const HATCH_OPACITY: f64 = 0.35;
/// Probe length used when measuring label frame angles
pub const FLIP_PROBE: f64 = 1.0;
/// Arrowhead length in template units for figure arrowheads
pub const FIGURE_ARROWHEAD: f64 = 0.12;
/// Samples per cubic when decorating a spline
pub const SPLINE_SAMPLES: usize = 16;

/// Tunable rendering settings; every field defaults to the constant above it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    pub target_unit_px: f64,
    pub tick_size: f64,
    pub arrow_body_ratio: f64,
    pub label_font_size: f64,
    pub label_gap: f64,
    pub hatch_spacing: f64,
    pub hatch_opacity: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_unit_px: TARGET_UNIT_PX,
            tick_size: TICK_SIZE,
            arrow_body_ratio: ARROW_BODY_RATIO,
            label_font_size: LABEL_FONT_SIZE,
            label_gap: LABEL_GAP,
            hatch_spacing: HATCH_SPACING,
            hatch_opacity: HATCH_OPACITY,
        }
    }
}
