/// The amplitude ramp applied across a note, as five width/height control
/// pairs. Widths are millisecond offsets, heights are on a 0-200 relative
/// amplitude scale.
///
/// This is a value type: edits replace the whole envelope, never a single
/// field across a mutation boundary.
#[derive(PartialEq, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct EnvelopeData {
    widths: [f64; 5],
    heights: [f64; 5],
    preutter: Option<f64>,
    length: Option<f64>,
}

impl EnvelopeData {
    pub fn new(widths: [f64; 5], heights: [f64; 5]) -> Self {
        Self {
            widths,
            heights,
            preutter: None,
            length: None,
        }
    }

    /// Explicit preutterance/length overrides, from a resolved voicebank
    /// lookup. Without them the envelope starts at the note's nominal start
    /// with zero length.
    pub fn with_timing(mut self, preutter: f64, length: f64) -> Self {
        self.preutter = Some(preutter);
        self.length = Some(length);
        self
    }

    pub fn widths(&self) -> &[f64; 5] {
        &self.widths
    }
    pub fn heights(&self) -> &[f64; 5] {
        &self.heights
    }
    pub fn preutter(&self) -> Option<f64> {
        self.preutter
    }
    pub fn length(&self) -> Option<f64> {
        self.length
    }
}

impl Default for EnvelopeData {
    fn default() -> Self {
        Self::new([0.0, 5.0, 35.0, 0.0, 0.0], [0.0, 100.0, 100.0, 0.0, 100.0])
    }
}
