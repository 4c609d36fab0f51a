//! Upright, left-to-right label frames.
//!
//! A label inherits the rotation (and any mirroring) of the frame it
//! annotates. The flip state says which text axes must be negated to undo
//! mirroring and upside-down rotation; the text box offset is folded so the
//! label still covers the same pixels afterwards.

use glam::{DAffine2, DMat2, DVec2, dvec2};

use super::defaults::FLIP_PROBE;
use super::types::{FlipState, Label};

/// Classify the frame `transform` induces at `reference`.
///
/// `h` is the screen angle of the text x axis, `v` that of text "up"; both in
/// degrees. Their difference, in quarter turns, tells mirrored frames apart.
pub fn compute_flip(transform: &DAffine2, reference: DVec2, d: f64) -> FlipState {
    let at = transform.transform_point2(reference);
    let across = transform.transform_point2(reference + dvec2(d, 0.0)) - at;
    let up = transform.transform_point2(reference - dvec2(0.0, d)) - at;
    let h = across.y.atan2(across.x).to_degrees();
    let v = up.y.atan2(up.x).to_degrees();
    let x = h.round();
    let xmy = ((h - v) / 90.0).round() as i64;
    let readable = (-90.0..=90.0).contains(&x);
    match (xmy == 1 || xmy == -3, readable) {
        (true, true) => FlipState::NoFlip,
        (true, false) => FlipState::BothFlip,
        (false, true) => FlipState::YFlip,
        (false, false) => FlipState::XFlip,
    }
}

/// Place `text` at `position` in the frame of `transform`.
///
/// `offset` and `size` describe the unflipped text box in text space.
pub fn orient_label(
    text: impl Into<String>,
    transform: &DAffine2,
    position: DVec2,
    offset: DVec2,
    size: DVec2,
) -> Label {
    let m = transform.matrix2;
    let mut x_axis = m.x_axis.normalize_or(DVec2::X);
    let mut y_axis = m.y_axis.normalize_or(DVec2::Y);
    let mut offset = offset;

    let flip = compute_flip(transform, DVec2::ZERO, FLIP_PROBE);
    if matches!(flip, FlipState::XFlip | FlipState::BothFlip) {
        x_axis = -x_axis;
        offset.x = -offset.x - size.x;
    }
    if matches!(flip, FlipState::YFlip | FlipState::BothFlip) {
        y_axis = -y_axis;
        offset.y = -offset.y - size.y;
    }

    Label {
        text: text.into(),
        position,
        matrix: DMat2::from_cols(x_axis, y_axis),
        offset,
        size,
        flip,
    }
}
