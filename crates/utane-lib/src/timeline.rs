use std::collections::BTreeMap;
use std::ops::Bound;

use crate::{Note, Range};

/// Insert target already holds a note. Recovered locally by the caller:
/// the proposed note is marked invalid and left out of the timeline.
#[derive(PartialEq, Eq, Copy, Clone, Debug, thiserror::Error)]
#[error("position {position}ms already holds a note")]
pub struct PositionOccupied {
    pub position: i64,
}

/// The position-indexed note store: an ordered map from start position (ms)
/// to [`Note`], positions unique.
///
/// This is purely structural. It never touches curve/envelope contents and
/// never runs overlap resolution; that is the resolver's job, driven by the
/// edit session after every mutation.
#[derive(Clone, Debug, Default)]
pub struct NoteTimeline {
    notes: BTreeMap<i64, Note>,
}

impl NoteTimeline {
    pub fn new() -> Self {
        Self {
            notes: BTreeMap::new(),
        }
    }

    pub fn put(&mut self, position: i64, note: Note) -> Result<(), PositionOccupied> {
        if self.notes.contains_key(&position) {
            return Err(PositionOccupied { position });
        }
        self.notes.insert(position, note);
        Ok(())
    }

    pub fn remove(&mut self, position: i64) -> Option<Note> {
        self.notes.remove(&position)
    }

    pub fn get(&self, position: i64) -> Option<&Note> {
        self.notes.get(&position)
    }
    pub fn get_mut(&mut self, position: i64) -> Option<&mut Note> {
        self.notes.get_mut(&position)
    }
    pub fn contains(&self, position: i64) -> bool {
        self.notes.contains_key(&position)
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Nearest note strictly before `position`.
    pub fn predecessor_of(&self, position: i64) -> Option<(i64, &Note)> {
        self.notes
            .range(..position)
            .next_back()
            .map(|(&pos, note)| (pos, note))
    }

    /// Nearest note strictly after `position`.
    pub fn successor_of(&self, position: i64) -> Option<(i64, &Note)> {
        self.notes
            .range((Bound::Excluded(position), Bound::Unbounded))
            .next()
            .map(|(&pos, note)| (pos, note))
    }

    /// The note with the smallest position whose interval intersects the
    /// closed-open `bounds`. A note starting before the bounds counts if
    /// its tail reaches in; a note starting inside always counts.
    pub fn first_in_range(&self, bounds: Range) -> Option<(i64, &Note)> {
        if let Some((pos, note)) = self.predecessor_of(bounds.start) {
            if pos + note.duration_ms > bounds.start {
                return Some((pos, note));
            }
        }
        self.notes
            .range(bounds.start..bounds.end)
            .next()
            .map(|(&pos, note)| (pos, note))
    }

    /// The note with the largest position whose interval intersects the
    /// closed-open `bounds`.
    pub fn last_in_range(&self, bounds: Range) -> Option<(i64, &Note)> {
        let (pos, note) = self.notes.range(..bounds.end).next_back()?;
        if *pos >= bounds.start || pos + note.duration_ms > bounds.start {
            Some((*pos, note))
        } else {
            None
        }
    }

    /// All notes whose interval intersects `bounds`, in position order.
    pub fn notes_in_range(&self, bounds: Range) -> impl Iterator<Item = (i64, &Note)> {
        let tail = self
            .predecessor_of(bounds.start)
            .filter(|(pos, note)| pos + note.duration_ms > bounds.start);
        let inside = self
            .notes
            .range(bounds.start..bounds.end)
            .map(|(&pos, note)| (pos, note));
        tail.into_iter().chain(inside)
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &Note)> {
        self.notes.iter().map(|(&pos, note)| (pos, note))
    }
    pub fn positions(&self) -> impl Iterator<Item = i64> + '_ {
        self.notes.keys().copied()
    }

    pub fn clear(&mut self) {
        self.notes.clear();
    }

    /// Checks the no-overlap invariant over the whole timeline. Meant for
    /// tests and debug assertions after a mutation completes.
    pub fn check_overlap(&self) {
        let mut prev: Option<(i64, &Note)> = None;
        for (pos, note) in self.iter() {
            if let Some((prev_pos, prev_note)) = prev {
                assert!(
                    prev_pos + prev_note.duration_ms <= pos,
                    "note at {prev_pos}ms (duration {}ms) overlaps note at {pos}ms",
                    prev_note.duration_ms
                );
            }
            prev = Some((pos, note));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(duration_ms: i64) -> Note {
        Note::new(duration_ms, 40, "a")
    }

    #[test]
    fn test_put_rejects_occupied_position() {
        let mut timeline = NoteTimeline::new();
        timeline.put(1000, note(480)).unwrap();
        assert_eq!(
            timeline.put(1000, note(240)),
            Err(PositionOccupied { position: 1000 })
        );
        // The original note is untouched.
        assert_eq!(timeline.get(1000).unwrap().duration_ms, 480);
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn test_neighbors() {
        let mut timeline = NoteTimeline::new();
        timeline.put(0, note(480)).unwrap();
        timeline.put(1000, note(480)).unwrap();
        timeline.put(2000, note(480)).unwrap();

        assert_eq!(timeline.predecessor_of(1000).unwrap().0, 0);
        assert_eq!(timeline.successor_of(1000).unwrap().0, 2000);
        assert_eq!(timeline.predecessor_of(0), None);
        assert_eq!(timeline.successor_of(2000), None);
        // Strictly less / strictly greater, not "at".
        assert_eq!(timeline.predecessor_of(2000).unwrap().0, 1000);
        assert_eq!(timeline.successor_of(1999).unwrap().0, 2000);
    }

    #[test]
    fn test_range_queries_include_overlapping_tail() {
        let mut timeline = NoteTimeline::new();
        timeline.put(0, note(480)).unwrap();
        timeline.put(1000, note(2000)).unwrap();
        timeline.put(4000, note(480)).unwrap();

        // The note at 1000 reaches into [2000, 3000) with its tail.
        let bounds = Range::new(2000, 3000);
        assert_eq!(timeline.first_in_range(bounds).unwrap().0, 1000);
        assert_eq!(timeline.last_in_range(bounds).unwrap().0, 1000);
        assert_eq!(
            timeline.notes_in_range(bounds).map(|(p, _)| p).collect::<Vec<_>>(),
            vec![1000]
        );

        let bounds = Range::new(500, 5000);
        assert_eq!(timeline.first_in_range(bounds).unwrap().0, 1000);
        assert_eq!(timeline.last_in_range(bounds).unwrap().0, 4000);

        assert_eq!(timeline.first_in_range(Range::new(3001, 4000)), None);
        assert_eq!(timeline.last_in_range(Range::new(3001, 4000)), None);
    }

    #[test]
    fn test_is_empty() {
        let mut timeline = NoteTimeline::new();
        assert!(timeline.is_empty());
        timeline.put(1000, note(480)).unwrap();
        assert!(!timeline.is_empty());
        timeline.remove(1000).unwrap();
        assert!(timeline.is_empty());
    }
}
