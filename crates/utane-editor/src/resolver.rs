//! Restores the no-overlap invariant after a timeline mutation.
//!
//! The timeline itself is purely structural; after every insert, move or
//! removal the resolver trims the affected neighbors and reports the
//! minimal closed range of positions whose notes were altered, so the edit
//! session can re-derive their envelopes, portamento curves and true
//! lyrics. Predecessor-side effects are always applied before
//! successor-side effects: the successor's pitch continuity depends on the
//! possibly just-trimmed predecessor.

use utane_lib::{NoteTimeline, PositionOccupied, Range};

pub struct OverlapResolver;

impl OverlapResolver {
    /// Resolves overlaps around a note just inserted at `position`.
    ///
    /// The predecessor is trimmed so it ends at `position` (clamped at
    /// zero; zero-length notes are legal placeholders). The inserted note
    /// is trimmed against its successor; the successor itself is never
    /// shortened or deleted. A note with no successor keeps its requested
    /// duration, conceptually extending into an unbounded tail.
    ///
    /// Returns the closed range of touched positions, at minimum
    /// `[position, position]`.
    pub fn resolve_insert(timeline: &mut NoteTimeline, position: i64) -> Range {
        debug_assert!(timeline.contains(position), "no note at insert position");
        let mut touched = Range::new(position, position);

        // Predecessor first.
        if let Some((pred_pos, pred)) = timeline.predecessor_of(position) {
            if pred_pos + pred.duration_ms > position {
                let pred = timeline.get_mut(pred_pos).unwrap_or_else(|| unreachable!());
                pred.duration_ms = (position - pred_pos).max(0);
                touched.start = pred_pos;
            }
        }

        // Then the successor side; the successor's curve is re-anchored on
        // this note's pitch by the session's refresh pass.
        if let Some((succ_pos, _)) = timeline.successor_of(position) {
            let note = timeline.get_mut(position).unwrap_or_else(|| unreachable!());
            if position + note.duration_ms > succ_pos {
                note.adjust_for_overlap(succ_pos - position);
                touched.end = succ_pos;
            }
        }

        touched
    }

    /// The closed gap a removal at `position` leaves behind, computed
    /// before the note is removed. Both neighbors must be re-examined: the
    /// predecessor may extend its effective duration and the successor's
    /// curve anchor pitch becomes the predecessor's pitch. `None` when
    /// either neighbor is missing.
    pub fn removal_gap(timeline: &NoteTimeline, position: i64) -> Option<Range> {
        let (pred_pos, _) = timeline.predecessor_of(position)?;
        let (succ_pos, _) = timeline.successor_of(position)?;
        Some(Range::new(pred_pos, succ_pos))
    }

    /// Moves the note at `from` to `to`, composed as remove-then-insert
    /// with no observable intermediate state. On a position collision the
    /// timeline is left exactly as it was.
    pub fn resolve_move(
        timeline: &mut NoteTimeline,
        from: i64,
        to: i64,
    ) -> Result<Range, PositionOccupied> {
        if from == to {
            return Ok(Range::new(from, from));
        }
        if timeline.contains(to) {
            return Err(PositionOccupied { position: to });
        }
        let gap = Self::removal_gap(timeline, from);
        let note = timeline
            .remove(from)
            .unwrap_or_else(|| panic!("no note at {from}ms to move"));
        timeline
            .put(to, note)
            .unwrap_or_else(|_| unreachable!("checked above"));

        let mut touched = Self::resolve_insert(timeline, to);
        if let Some(gap) = gap {
            touched = touched.merge_with(gap);
        }
        Ok(touched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utane_lib::Note;

    fn note(duration_ms: i64, pitch_row: i32) -> Note {
        Note::new(duration_ms, pitch_row, "a")
    }

    #[test]
    fn test_insert_into_empty_timeline_touches_nothing_else() {
        let mut timeline = NoteTimeline::new();
        timeline.put(1000, note(480, 40)).unwrap();
        let touched = OverlapResolver::resolve_insert(&mut timeline, 1000);
        assert_eq!(touched, Range::new(1000, 1000));
        assert_eq!(timeline.get(1000).unwrap().duration_ms, 480);
    }

    #[test]
    fn test_insert_trims_predecessor_and_self() {
        let mut timeline = NoteTimeline::new();
        timeline.put(1000, note(480, 40)).unwrap();

        // B lands inside A's tail; A is trimmed to end at B's start, and B
        // keeps its requested duration since nothing follows it.
        timeline.put(1200, note(600, 44)).unwrap();
        let touched = OverlapResolver::resolve_insert(&mut timeline, 1200);

        assert_eq!(touched, Range::new(1000, 1200));
        assert_eq!(timeline.get(1000).unwrap().duration_ms, 200);
        assert_eq!(timeline.get(1200).unwrap().duration_ms, 600);
        timeline.check_overlap();
    }

    #[test]
    fn test_insert_trims_itself_against_successor() {
        let mut timeline = NoteTimeline::new();
        timeline.put(2000, note(480, 40)).unwrap();

        timeline.put(1700, note(1000, 44)).unwrap();
        let touched = OverlapResolver::resolve_insert(&mut timeline, 1700);

        assert_eq!(touched, Range::new(1700, 2000));
        // The moved/new note is trimmed, never the successor.
        assert_eq!(timeline.get(1700).unwrap().duration_ms, 300);
        assert_eq!(timeline.get(2000).unwrap().duration_ms, 480);
        timeline.check_overlap();
    }

    #[test]
    fn test_insert_between_two_notes() {
        let mut timeline = NoteTimeline::new();
        timeline.put(0, note(1000, 40)).unwrap();
        timeline.put(1000, note(1000, 41)).unwrap();

        timeline.put(500, note(5000, 42)).unwrap();
        let touched = OverlapResolver::resolve_insert(&mut timeline, 500);

        assert_eq!(touched, Range::new(0, 1000));
        assert_eq!(timeline.get(0).unwrap().duration_ms, 500);
        assert_eq!(timeline.get(500).unwrap().duration_ms, 500);
        assert_eq!(timeline.get(1000).unwrap().duration_ms, 1000);
        timeline.check_overlap();
    }

    #[test]
    fn test_predecessor_trim_never_goes_negative() {
        let mut timeline = NoteTimeline::new();
        timeline.put(1000, note(480, 40)).unwrap();
        timeline.put(1001, note(480, 41)).unwrap();
        OverlapResolver::resolve_insert(&mut timeline, 1001);
        // Tightest possible trim; duration is clamped at zero below this.
        assert_eq!(timeline.get(1000).unwrap().duration_ms, 1);
        timeline.check_overlap();
    }

    #[test]
    fn test_removal_gap() {
        let mut timeline = NoteTimeline::new();
        timeline.put(0, note(480, 40)).unwrap();
        timeline.put(1000, note(480, 41)).unwrap();
        timeline.put(2000, note(480, 42)).unwrap();

        assert_eq!(
            OverlapResolver::removal_gap(&timeline, 1000),
            Some(Range::new(0, 2000))
        );
        // Edge notes have only one neighbor: no gap to re-examine.
        assert_eq!(OverlapResolver::removal_gap(&timeline, 0), None);
        assert_eq!(OverlapResolver::removal_gap(&timeline, 2000), None);
    }

    #[test]
    fn test_move_composes_remove_and_insert() {
        let mut timeline = NoteTimeline::new();
        timeline.put(0, note(1000, 40)).unwrap();
        timeline.put(1000, note(480, 41)).unwrap();
        timeline.put(3000, note(480, 42)).unwrap();

        let touched = OverlapResolver::resolve_move(&mut timeline, 1000, 2800).unwrap();

        // Gap [0, 3000] from the removal, plus the insert trim at 2800.
        assert_eq!(touched, Range::new(0, 3000));
        assert!(!timeline.contains(1000));
        assert_eq!(timeline.get(2800).unwrap().duration_ms, 200);
        timeline.check_overlap();
    }

    #[test]
    fn test_move_onto_occupied_position_changes_nothing() {
        let mut timeline = NoteTimeline::new();
        timeline.put(1000, note(480, 40)).unwrap();
        timeline.put(2000, note(480, 41)).unwrap();

        let err = OverlapResolver::resolve_move(&mut timeline, 1000, 2000).unwrap_err();
        assert_eq!(err, PositionOccupied { position: 2000 });
        assert_eq!(timeline.get(1000).unwrap().duration_ms, 480);
        assert_eq!(timeline.len(), 2);
    }
}
