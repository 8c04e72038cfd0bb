use crate::{CurveData, EnvelopeData, Range};

/// Sentinel duration meaning "no successor constrains this note"; a note
/// carrying it conceptually extends to the next note or to an unbounded
/// tail. Passed to [`Note::adjust_for_overlap`], never stored.
pub const MAX_DURATION: i64 = i64::MAX;

/// A note independent of its start position; the position is the key it is
/// stored under in a [`crate::NoteTimeline`].
#[derive(PartialEq, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Note {
    pub duration_ms: i64,

    /// Piano-roll row, 0..`pitch::NUM_ROWS`. Row 0 is the lowest pitch.
    pub pitch_row: i32,

    /// Display lyric as the user typed it.
    pub lyric: String,
    /// Resolved phoneme/alias actually sent to the synthesizer. May differ
    /// from `lyric`; rewritten by the song model on standardization.
    pub true_lyric: String,

    pub envelope: Option<EnvelopeData>,
    pub curve: Option<CurveData>,

    /// False when the note failed to commit (position collision): it is
    /// visually present but not part of the timeline.
    pub valid: bool,
}

impl Note {
    pub fn new(duration_ms: i64, pitch_row: i32, lyric: impl Into<String>) -> Self {
        debug_assert!(duration_ms >= 0, "negative note duration");
        let lyric = lyric.into();
        Self {
            duration_ms,
            pitch_row,
            true_lyric: lyric.clone(),
            lyric,
            envelope: None,
            curve: None,
            valid: true,
        }
    }

    pub fn range_with(&self, start_pos: i64) -> Range {
        Range::from_start_length(start_pos, self.duration_ms)
    }

    /// Trims the stored duration against the distance to a successor.
    /// `delta` is the neighbor delta (successor position minus this note's
    /// position); [`MAX_DURATION`] means no successor and leaves the stored
    /// duration untouched.
    pub fn adjust_for_overlap(&mut self, delta: i64) {
        if delta < self.duration_ms {
            self.duration_ms = delta.max(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_with() {
        let note = Note::new(480, 42, "ら");
        assert_eq!(note.range_with(1000), Range::new(1000, 1480));
    }

    #[test]
    fn test_adjust_for_overlap() {
        let mut note = Note::new(480, 42, "ら");
        note.adjust_for_overlap(MAX_DURATION);
        assert_eq!(note.duration_ms, 480);
        note.adjust_for_overlap(600);
        assert_eq!(note.duration_ms, 480);
        note.adjust_for_overlap(200);
        assert_eq!(note.duration_ms, 200);
        note.adjust_for_overlap(-10);
        assert_eq!(note.duration_ms, 0);
    }
}
