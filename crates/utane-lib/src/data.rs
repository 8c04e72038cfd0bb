//! Boundary payloads exchanged with the external song model, which is the
//! single source of truth for persisted note state.

use crate::{pitch, CurveData, EnvelopeData, Note};

/// One note as the song model speaks it: absolute position, pitch by name.
#[derive(PartialEq, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct NoteData {
    pub position_ms: i64,
    pub duration_ms: i64,
    /// Pitch name, e.g. "C#4".
    pub pitch: String,
    pub lyric: String,
    pub envelope: Option<EnvelopeData>,
    pub pitchbend: Option<CurveData>,
}

impl NoteData {
    /// Converts into the timeline's note form. `None` if the pitch name is
    /// outside the 84-row board.
    pub fn to_note(&self) -> Option<Note> {
        let row = pitch::pitch_to_row(&self.pitch)?;
        let mut note = Note::new(self.duration_ms.max(0), row, self.lyric.clone());
        note.envelope = self.envelope.clone();
        note.curve = self.pitchbend.clone();
        Some(note)
    }

    pub fn from_note(position_ms: i64, note: &Note) -> Self {
        Self {
            position_ms,
            duration_ms: note.duration_ms,
            pitch: pitch::row_to_pitch(note.pitch_row).unwrap_or_default(),
            lyric: note.lyric.clone(),
            envelope: note.envelope.clone(),
            pitchbend: note.curve.clone(),
        }
    }
}

/// Authoritative per-note state the song model reports back after a
/// mutation: the resolved phoneme plus regenerated envelope/portamento.
#[derive(PartialEq, Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct NoteUpdateData {
    pub position_ms: i64,
    pub true_lyric: String,
    pub envelope: EnvelopeData,
    pub pitchbend: CurveData,
}

/// Response to a removal/standardization request: the notes inside the
/// mutated span plus the untouched neighbors on either side, when present.
#[derive(PartialEq, Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct MutateResponse {
    pub notes: Vec<NoteUpdateData>,
    pub prev: Option<NoteUpdateData>,
    pub next: Option<NoteUpdateData>,
}
