use smallvec::SmallVec;

/// Shape of one portamento segment.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub enum CurveType {
    /// Sigmoid; the canonical serialized tag is the empty string.
    #[default]
    #[serde(rename = "")]
    S,
    #[serde(rename = "j")]
    J,
    #[serde(rename = "r")]
    R,
    #[serde(rename = "s")]
    Linear,
}

impl CurveType {
    pub const ALL: [CurveType; 4] = [CurveType::S, CurveType::J, CurveType::R, CurveType::Linear];

    pub fn tag(self) -> &'static str {
        match self {
            CurveType::S => "",
            CurveType::J => "j",
            CurveType::R => "r",
            CurveType::Linear => "s",
        }
    }
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ty| ty.tag() == tag)
    }
}

/// Canonical serialized portamento: the pitch-transition curve leading into
/// a note, relative to that note's start.
///
/// A curve of `n` segments carries `n` widths (horizontal span of each
/// segment, ms), `n - 1` heights (vertical offset of each interior control
/// point from the curve's final pitch, in tenths of a row) and `n` shapes.
#[derive(PartialEq, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CurveData {
    /// First control point's time relative to the owning note's start.
    /// Negative when the transition begins inside the previous note.
    pub start_offset_ms: f64,
    pub widths: SmallVec<[f64; 8]>,
    pub heights: SmallVec<[f64; 8]>,
    pub shapes: SmallVec<[CurveType; 8]>,
}

impl CurveData {
    pub fn new(
        start_offset_ms: f64,
        widths: SmallVec<[f64; 8]>,
        heights: SmallVec<[f64; 8]>,
        shapes: SmallVec<[CurveType; 8]>,
    ) -> Self {
        assert!(!shapes.is_empty(), "portamento must have at least one segment");
        assert_eq!(widths.len(), shapes.len(), "one width per segment");
        assert_eq!(heights.len(), shapes.len() - 1, "one height per interior point");
        Self {
            start_offset_ms,
            widths,
            heights,
            shapes,
        }
    }

    /// The simplest legal curve: a single segment of the given shape
    /// spanning `width_ms` starting at `start_offset_ms`.
    pub fn single(start_offset_ms: f64, width_ms: f64, shape: CurveType) -> Self {
        Self::new(
            start_offset_ms,
            SmallVec::from_slice(&[width_ms]),
            SmallVec::new(),
            SmallVec::from_slice(&[shape]),
        )
    }

    pub fn segment_count(&self) -> usize {
        self.shapes.len()
    }
    pub fn total_width_ms(&self) -> f64 {
        self.widths.iter().sum()
    }
}
