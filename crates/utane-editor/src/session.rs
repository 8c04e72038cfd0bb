//! The edit session: receives user intents, drives the timeline and the
//! overlap resolver, and keeps the local note cache reconciled with the
//! external song model.
//!
//! The song model is the single source of truth. Every mutation goes to it
//! first; local state is then re-derived from its authoritative response
//! (two-phase protocol). The in-memory timeline is a cache the view layer
//! queries, never an independent store.

use ahash::HashSet;
use utane_lib::{
    pitch, CurveData, EnvelopeData, MutateResponse, Note, NoteData, NoteTimeline, Range,
    MAX_DURATION,
};

use crate::{CurveEdit, CurveModel, OverlapResolver};

/// Whether a click on an empty grid cell creates a note.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum Mode {
    Add,
    Edit,
}

/// The external song model collaborator; authoritative for persisted note
/// state. `remove_notes` and `standardize_notes` report back the notes
/// they altered plus the untouched neighbor on each side.
pub trait SongModel {
    fn add_notes(&mut self, notes: Vec<NoteData>);
    fn remove_notes(&mut self, positions: &HashSet<i64>) -> MutateResponse;
    fn modify_note(&mut self, note: NoteData);
    fn standardize_notes(&mut self, start_ms: i64, end_ms: i64) -> MutateResponse;
    fn current_mode(&self) -> Mode;
}

/// What a mutation changed, for the view layer: every position whose note
/// must be redrawn, positions whose notes left the timeline, and proposed
/// notes that failed to commit (view keeps them visible but unlinked).
#[derive(Clone, Debug, Default)]
pub struct ChangeSet {
    pub touched: Vec<i64>,
    pub removed: Vec<i64>,
    pub invalidated: Vec<i64>,
    /// The last note is gone; the caller resets its view window to a
    /// default span.
    pub timeline_emptied: bool,
}

impl ChangeSet {
    fn touch(&mut self, position: i64) {
        if !self.touched.contains(&position) {
            self.touched.push(position);
        }
    }
}

pub struct EditSession<S: SongModel> {
    timeline: NoteTimeline,
    song: S,
}

impl<S: SongModel> EditSession<S> {
    pub fn new(song: S) -> Self {
        Self {
            timeline: NoteTimeline::new(),
            song,
        }
    }

    pub fn timeline(&self) -> &NoteTimeline {
        &self.timeline
    }
    pub fn song(&self) -> &S {
        &self.song
    }

    pub fn click_creates_note(&self) -> bool {
        self.song.current_mode() == Mode::Add
    }

    /// Bulk-populates the timeline from an already-persisted track.
    /// Collisions and unknown pitches are logged and the notes reported as
    /// uncommitted; a well-formed track produces neither.
    pub fn load(&mut self, notes: Vec<NoteData>) -> ChangeSet {
        self.timeline.clear();
        let mut changes = ChangeSet::default();
        for data in &notes {
            let Some(note) = data.to_note() else {
                tracing::warn!(
                    position = data.position_ms,
                    pitch = %data.pitch,
                    "skipping loaded note with unknown pitch"
                );
                changes.invalidated.push(data.position_ms);
                continue;
            };
            match self.timeline.put(data.position_ms, note) {
                Ok(()) => changes.touch(data.position_ms),
                Err(err) => {
                    tracing::warn!(position = err.position, "two loaded notes at the same position");
                    changes.invalidated.push(err.position);
                }
            }
        }
        changes
    }

    /// Adds a brand-new note. If the position is already taken the note is
    /// reported as uncommitted and nothing changes, locally or in the song
    /// model.
    pub fn add_note(&mut self, data: NoteData) -> ChangeSet {
        let mut changes = ChangeSet::default();
        let position = data.position_ms;
        if self.timeline.contains(position) {
            changes.invalidated.push(position);
            return changes;
        }
        let Some(note) = data.to_note() else {
            tracing::warn!(pitch = %data.pitch, "rejecting note with unknown pitch");
            changes.invalidated.push(position);
            return changes;
        };

        self.song.add_notes(vec![data]);
        self.timeline
            .put(position, note)
            .unwrap_or_else(|_| unreachable!("checked above"));
        let touched = OverlapResolver::resolve_insert(&mut self.timeline, position);
        self.refresh(touched, &mut changes);
        changes
    }

    /// Commits an edit to an existing note (resize, lyric change, or a
    /// single-note drag that may have changed its position). The old entry
    /// is withdrawn first; if another note owns the target position the
    /// edited note ends up uncommitted, exactly like a failed add.
    pub fn update_note(&mut self, old_position: i64, data: NoteData) -> ChangeSet {
        let mut changes = ChangeSet::default();
        let position = data.position_ms;
        let mut region = Range::new(position, position);

        if self.timeline.contains(old_position) {
            let withdrawn: HashSet<i64> = [old_position].into_iter().collect();
            if let (Some(gap), _) = self.remove_from_song(&withdrawn) {
                region = region.merge_with(gap);
            }
        }

        match data.to_note() {
            Some(note) if !self.timeline.contains(position) => {
                self.song.add_notes(vec![data]);
                self.timeline
                    .put(position, note)
                    .unwrap_or_else(|_| unreachable!("checked above"));
                let touched = OverlapResolver::resolve_insert(&mut self.timeline, position);
                region = region.merge_with(touched);
            }
            _ => changes.invalidated.push(position),
        }

        // Refresh regardless of whether the new note was placed; the
        // withdrawal alone reshapes the neighborhood.
        self.refresh(region, &mut changes);
        changes
    }

    /// Moves a set of committed notes by a time and pitch delta, as one
    /// batch: all withdrawn from the song model first, then re-inserted at
    /// their new positions. Notes whose target position is taken are left
    /// uncommitted; the rest move.
    pub fn move_notes(&mut self, positions: &[i64], delta_ms: i64, delta_rows: i32) -> ChangeSet {
        let mut changes = ChangeSet::default();
        let committed: HashSet<i64> = positions
            .iter()
            .copied()
            .filter(|&pos| self.timeline.contains(pos))
            .collect();

        let (gap, mut withdrawn) = self.remove_from_song(&committed);
        withdrawn.sort_by_key(|&(pos, _)| pos);

        let mut region = gap;
        let mut to_add = Vec::new();
        for (old_pos, mut note) in withdrawn {
            let new_pos = old_pos + delta_ms;
            note.pitch_row = (note.pitch_row + delta_rows).clamp(0, pitch::NUM_ROWS - 1);
            note.valid = true;
            if self.timeline.put(new_pos, note).is_err() {
                changes.invalidated.push(new_pos);
                continue;
            }
            let touched = OverlapResolver::resolve_insert(&mut self.timeline, new_pos);
            region = Some(region.map_or(touched, |r| r.merge_with(touched)));
            to_add.push(NoteData::from_note(
                new_pos,
                self.timeline.get(new_pos).unwrap_or_else(|| unreachable!()),
            ));
        }

        if !to_add.is_empty() {
            self.song.add_notes(to_add);
        }
        if let Some(region) = region {
            self.refresh(region, &mut changes);
        }
        changes
    }

    /// Deletes a set of committed notes.
    pub fn delete_notes(&mut self, positions: impl IntoIterator<Item = i64>) -> ChangeSet {
        let mut changes = ChangeSet::default();
        let committed: HashSet<i64> = positions
            .into_iter()
            .filter(|&pos| self.timeline.contains(pos))
            .collect();

        let (gap, withdrawn) = self.remove_from_song(&committed);
        changes.removed.extend(withdrawn.iter().map(|&(pos, _)| pos));
        if let Some(gap) = gap {
            self.refresh(gap, &mut changes);
        }
        if self.timeline.is_empty() {
            changes.timeline_emptied = true;
        }
        changes
    }

    /// Replaces a note's envelope wholesale; the change-sink endpoint the
    /// envelope editor calls when an edit completes.
    pub fn modify_envelope(&mut self, position: i64, envelope: EnvelopeData) -> ChangeSet {
        let mut changes = ChangeSet::default();
        let Some(note) = self.timeline.get(position) else {
            desync(position);
            return changes;
        };
        let mut data = NoteData::from_note(position, note);
        data.envelope = Some(envelope.clone());
        self.song.modify_note(data);
        self.timeline
            .get_mut(position)
            .unwrap_or_else(|| unreachable!())
            .envelope = Some(envelope);
        changes.touch(position);
        changes
    }

    /// Replaces a note's portamento wholesale; the change-sink endpoint for
    /// curve edits.
    pub fn modify_pitchbend(&mut self, position: i64, pitchbend: CurveData) -> ChangeSet {
        let mut changes = ChangeSet::default();
        let Some(note) = self.timeline.get(position) else {
            desync(position);
            return changes;
        };
        let mut data = NoteData::from_note(position, note);
        data.pitchbend = Some(pitchbend.clone());
        self.song.modify_note(data);
        self.timeline
            .get_mut(position)
            .unwrap_or_else(|| unreachable!())
            .curve = Some(pitchbend);
        changes.touch(position);
        changes
    }

    /// Routes a [`CurveEdit`] emitted by a [`CurveModel`] back into the
    /// authoritative note state.
    pub fn commit_curve_edit(&mut self, position: i64, edit: &CurveEdit) -> ChangeSet {
        self.modify_pitchbend(position, edit.after.clone())
    }

    /// Builds the live, editable curve for the note at `position`,
    /// anchored on its predecessor's pitch (or its own when it has no
    /// predecessor), the pitch-continuity rule.
    pub fn curve_model_for(&self, position: i64, row_height_unit: f64) -> Option<CurveModel> {
        let note = self.timeline.get(position)?;
        let data = note.curve.as_ref()?;
        let anchor_row = self
            .timeline
            .predecessor_of(position)
            .map(|(_, pred)| pred.pitch_row)
            .unwrap_or(note.pitch_row);
        Some(CurveModel::from_data(
            data,
            position,
            anchor_row as f64 * row_height_unit,
            note.pitch_row as f64 * row_height_unit,
            row_height_unit,
        ))
    }

    /// Withdraws notes from the song model and drops them from the cache,
    /// returning the gap `[prev, next]` to re-examine (when both neighbors
    /// exist) and the withdrawn notes keyed by their old positions. The
    /// response drives the cache: a reported position the cache lacks is a
    /// desynchronization fault.
    fn remove_from_song(&mut self, positions: &HashSet<i64>) -> (Option<Range>, Vec<(i64, Note)>) {
        if positions.is_empty() {
            return (None, Vec::new());
        }
        let response = self.song.remove_notes(positions);
        let mut withdrawn = Vec::with_capacity(response.notes.len());
        for update in &response.notes {
            match self.timeline.remove(update.position_ms) {
                Some(note) => withdrawn.push((update.position_ms, note)),
                None => desync(update.position_ms),
            }
        }
        let gap = match (&response.prev, &response.next) {
            (Some(prev), Some(next)) => Some(Range::new(prev.position_ms, next.position_ms)),
            _ => None,
        };
        (gap, withdrawn)
    }

    /// Reconciles the cache from a standardization pass over the closed
    /// position range: resolved phonemes, regenerated envelopes and
    /// curves, and overlap-trimmed durations. Predecessor-side effects are
    /// applied strictly before successor-side effects.
    fn refresh(&mut self, region: Range, changes: &mut ChangeSet) {
        let response = self.song.standardize_notes(region.start, region.end);

        let mut prev: Option<i64> = None;
        if let Some(prev_data) = &response.prev {
            if let Some(note) = self.timeline.get_mut(prev_data.position_ms) {
                note.envelope = Some(prev_data.envelope.clone());
                changes.touch(prev_data.position_ms);
                prev = Some(prev_data.position_ms);
            } else {
                desync(prev_data.position_ms);
            }
        }

        let mut cur: Option<i64> = None;
        for data in &response.notes {
            let Some(note) = self.timeline.get_mut(data.position_ms) else {
                desync(data.position_ms);
                continue;
            };
            note.true_lyric = data.true_lyric.clone();
            note.envelope = Some(data.envelope.clone());
            note.curve = Some(data.pitchbend.clone());
            changes.touch(data.position_ms);

            if let Some(prev_pos) = prev {
                self.timeline
                    .get_mut(prev_pos)
                    .unwrap_or_else(|| unreachable!())
                    .adjust_for_overlap(data.position_ms - prev_pos);
            }
            prev = Some(data.position_ms);
            cur = Some(data.position_ms);
        }

        if let Some(next_data) = &response.next {
            if let Some(note) = self.timeline.get_mut(next_data.position_ms) {
                note.true_lyric = next_data.true_lyric.clone();
                note.envelope = Some(next_data.envelope.clone());
                note.curve = Some(next_data.pitchbend.clone());
                changes.touch(next_data.position_ms);
            } else {
                desync(next_data.position_ms);
            }
            if let Some(cur_pos) = cur {
                self.timeline
                    .get_mut(cur_pos)
                    .unwrap_or_else(|| unreachable!())
                    .adjust_for_overlap(next_data.position_ms - cur_pos);
            }
        } else if let Some(cur_pos) = cur {
            // No successor: the last refreshed note keeps its unbounded
            // tail until one appears.
            self.timeline
                .get_mut(cur_pos)
                .unwrap_or_else(|| unreachable!())
                .adjust_for_overlap(MAX_DURATION);
        }
    }
}

/// The song model reported a note the cache does not have. The song model
/// stays authoritative, so release builds log and continue; debug builds
/// fail fast so reconciliation bugs surface in development.
fn desync(position: i64) {
    tracing::error!(position, "song model reported a note missing from the timeline");
    debug_assert!(
        false,
        "song model reported a note missing from the timeline at {position}ms"
    );
}
