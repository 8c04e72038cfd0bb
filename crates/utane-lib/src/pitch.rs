//! Conversion between piano-roll row indices and pitch names.
//!
//! The board covers 7 octaves of 12 semitones; row 0 is the lowest pitch
//! (C1) and row 83 the highest (B7). The external song model speaks pitch
//! names ("C#4"), the editing core speaks rows.

pub const ROWS_PER_OCTAVE: i32 = 12;
pub const NUM_OCTAVES: i32 = 7;
pub const NUM_ROWS: i32 = ROWS_PER_OCTAVE * NUM_OCTAVES;

const PITCH_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

pub fn row_to_pitch(row: i32) -> Option<String> {
    if !(0..NUM_ROWS).contains(&row) {
        return None;
    }
    let octave = row / ROWS_PER_OCTAVE + 1;
    let name = PITCH_NAMES[(row % ROWS_PER_OCTAVE) as usize];
    Some(format!("{name}{octave}"))
}

pub fn pitch_to_row(pitch: &str) -> Option<i32> {
    let octave_at = pitch.len().checked_sub(1)?;
    let (name, octave) = pitch.split_at(octave_at);
    let octave: i32 = octave.parse().ok()?;
    if !(1..=NUM_OCTAVES).contains(&octave) {
        return None;
    }
    let semitone = PITCH_NAMES.iter().position(|&n| n == name)? as i32;
    Some((octave - 1) * ROWS_PER_OCTAVE + semitone)
}
