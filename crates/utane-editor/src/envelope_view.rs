//! Pure mapping from an [`EnvelopeData`] to its renderable outline.

use utane_lib::EnvelopeData;

use crate::Scaler;

/// One point of the envelope outline. `x` is in display units (through the
/// caller's [`Scaler`]), `amplitude` is on the 0-200 scale and is never
/// scaled; the vertical axis of envelope displays is fixed.
#[derive(PartialEq, Clone, Copy, Debug)]
pub struct EnvelopeAnchor {
    pub x: f64,
    pub amplitude: f64,
}

/// The envelope outline has seven anchors: a lead-in at full amplitude,
/// the five control heights, and a trailing return to full amplitude.
pub const ANCHOR_COUNT: usize = 7;

fn displayed(height: f64) -> f64 {
    100.0 - height / 2.0
}

/// Outline of a note's envelope in track display space.
///
/// The envelope starts `preutterance` ms before the note's nominal start
/// and spans the resolved consonant `length`; the five control widths are
/// offsets from those two ends (p1, p2, p5 forward from the start; p3, p4
/// backward from the end).
pub fn outline(
    note_start_ms: i64,
    envelope: &EnvelopeData,
    scaler: &impl Scaler,
) -> [EnvelopeAnchor; ANCHOR_COUNT] {
    let preutter = envelope.preutter().unwrap_or(0.0);
    let length = envelope.length().unwrap_or(0.0);
    let start = note_start_ms as f64 - preutter;
    let end = start + length;

    let &[p1, p2, p3, p4, p5] = envelope.widths();
    let [v1, v2, v3, v4, v5] = envelope.heights().map(displayed);

    let anchor = |pos: f64, amplitude: f64| EnvelopeAnchor {
        x: scaler.scale_pos(pos),
        amplitude,
    };
    [
        anchor(start, 100.0),
        anchor(start + p1, v1),
        anchor(start + p1 + p2, v2),
        anchor(start + p1 + p2 + p5, v5),
        anchor(end - p4 - p3, v3),
        anchor(end - p4, v4),
        anchor(end, 100.0),
    ]
}

/// Outline for the standalone envelope-shape editor: same five control
/// heights, but stretched into a fixed editor box instead of track time.
/// Here `y` replaces the amplitude and grows downward from `editor_height`.
pub fn editor_outline(
    editor_width: f64,
    editor_height: f64,
    envelope: &EnvelopeData,
    scaler: &impl Scaler,
) -> [EnvelopeAnchor; ANCHOR_COUNT] {
    let &[p1, p2, p3, p4, p5] = envelope.widths();
    let [v1, v2, v3, v4, v5] = envelope
        .heights()
        .map(|h| (editor_height - h) / (200.0 / editor_height));

    let anchor = |x: f64, amplitude: f64| EnvelopeAnchor { x, amplitude };
    [
        anchor(0.0, editor_height),
        anchor(scaler.scale_x(p1), v1),
        anchor(scaler.scale_x(p1 + p2), v2),
        anchor(scaler.scale_x(p1 + p2 + p5), v5),
        anchor(editor_width - scaler.scale_x(p4 + p3), v3),
        anchor(editor_width - scaler.scale_x(p4), v4),
        anchor(editor_width, editor_height),
    ]
}
