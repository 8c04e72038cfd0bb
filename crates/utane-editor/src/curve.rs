//! The live, editable form of a portamento curve.
//!
//! A curve is a chain of typed segments between control points. Adjacent
//! segments share their endpoint: the chain stores every control point once
//! in an arena and each segment holds a pair of arena indices, so moving a
//! shared point moves both segments without any aliased references.
//!
//! Coordinates are model units throughout: x in absolute milliseconds, y in
//! pitch-row units. Display translation goes through a [`Scaler`].

use smallvec::SmallVec;
use utane_lib::{CurveData, CurveType};

use crate::Scaler;

/// Hard cap on control points per curve.
pub const MAX_CONTROL_POINTS: usize = 50;

/// Minimum horizontal gap between adjacent control points, in ms. Keeps the
/// chain strictly x-monotonic under drags.
const MIN_POINT_GAP: f64 = 1.0;

#[derive(PartialEq, Copy, Clone, Debug, thiserror::Error)]
pub enum CurveError {
    #[error("curve already holds the maximum of {MAX_CONTROL_POINTS} control points")]
    ControlPointLimit,
    #[error("boundary control points cannot be removed")]
    BoundaryMerge,
}

#[derive(PartialEq, Copy, Clone, Debug)]
pub struct CurvePoint {
    /// Absolute position, ms.
    pub x: f64,
    /// Pitch, row units.
    pub y: f64,
}

#[derive(Copy, Clone, Debug)]
struct Segment {
    /// Arena indices of the two endpoints.
    start: usize,
    end: usize,
    ty: CurveType,
}

/// What a [`CurveEdit`] records.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum CurveEditKind {
    Split,
    Merge,
    Retype,
    Drag,
}

/// Change event emitted by every structural edit and completed drag. The
/// session attaches the owning note's position and pushes `after` to the
/// song model; `before` is what an undo layer would restore.
#[derive(PartialEq, Clone, Debug)]
pub struct CurveEdit {
    pub kind: CurveEditKind,
    pub before: CurveData,
    pub after: CurveData,
}

/// Transient state for one control-point drag, created at drag-start and
/// consumed at drag-end. Holds the pre-drag snapshot for the change event.
#[derive(Clone, Debug)]
pub struct CurveDrag {
    start_data: CurveData,
    changed: bool,
}

#[derive(Clone, Debug)]
pub struct CurveModel {
    points: Vec<CurvePoint>,
    segments: SmallVec<[Segment; 8]>,
}

impl CurveModel {
    /// A single segment from `start` to `end`. Panics unless `start.x <
    /// end.x`; a curve always has at least one segment.
    pub fn new(start: CurvePoint, end: CurvePoint, ty: CurveType) -> Self {
        assert!(start.x < end.x, "curve endpoints must be x-ordered");
        Self {
            points: vec![start, end],
            segments: SmallVec::from_slice(&[Segment {
                start: 0,
                end: 1,
                ty,
            }]),
        }
    }

    /// Rebuilds the live chain from its canonical form.
    ///
    /// `start_y` is the pitch anchor of the transition: the previous note's
    /// pitch row (or the owning note's own row when it has no predecessor).
    /// `end_y` is the owning note's pitch row. This is how neighbor
    /// mutations re-anchor a curve: same data, new `start_y`.
    pub fn from_data(
        data: &CurveData,
        note_start_ms: i64,
        start_y: f64,
        end_y: f64,
        row_height_unit: f64,
    ) -> Self {
        let mut x = note_start_ms as f64 + data.start_offset_ms;
        let mut points = Vec::with_capacity(data.segment_count() + 1);
        points.push(CurvePoint { x, y: start_y });
        for (i, &width) in data.widths.iter().enumerate() {
            debug_assert!(width > 0.0, "non-positive segment width");
            x += width;
            let y = match data.heights.get(i) {
                Some(&height) => end_y - height * row_height_unit / 10.0,
                None => end_y,
            };
            points.push(CurvePoint { x, y });
        }
        let segments = data
            .shapes
            .iter()
            .enumerate()
            .map(|(i, &ty)| Segment {
                start: i,
                end: i + 1,
                ty,
            })
            .collect();
        let model = Self { points, segments };
        model.debug_check();
        model
    }

    /// Canonicalizes into the serialized, note-relative form: offset of the
    /// first point from `note_start_ms`, per-segment horizontal spans,
    /// interior heights as the final y-value minus the point's y-value in
    /// tenths of a row, shapes verbatim.
    pub fn to_data(&self, note_start_ms: i64, row_height_unit: f64) -> CurveData {
        let end_y = self.point(self.point_count() - 1).y;
        let mut widths = SmallVec::new();
        let mut heights = SmallVec::new();
        let mut shapes = SmallVec::new();
        for (i, segment) in self.segments.iter().enumerate() {
            widths.push(self.points[segment.end].x - self.points[segment.start].x);
            if i < self.segments.len() - 1 {
                heights.push((end_y - self.points[segment.end].y) / row_height_unit * 10.0);
            }
            shapes.push(segment.ty);
        }
        CurveData::new(
            self.points[self.segments[0].start].x - note_start_ms as f64,
            widths,
            heights,
            shapes,
        )
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }
    pub fn point_count(&self) -> usize {
        self.segments.len() + 1
    }

    fn arena_index(&self, point_index: usize) -> usize {
        if point_index < self.segments.len() {
            self.segments[point_index].start
        } else {
            assert_eq!(point_index, self.segments.len(), "point index out of range");
            self.segments[point_index - 1].end
        }
    }

    /// Control point by chain position (0 = curve start).
    pub fn point(&self, point_index: usize) -> CurvePoint {
        self.points[self.arena_index(point_index)]
    }
    pub fn points(&self) -> impl Iterator<Item = CurvePoint> + '_ {
        (0..self.point_count()).map(|i| self.point(i))
    }
    pub fn segment_type(&self, segment_index: usize) -> CurveType {
        self.segments[segment_index].ty
    }

    pub fn start_x(&self) -> f64 {
        self.point(0).x
    }
    pub fn end_x(&self) -> f64 {
        self.point(self.point_count() - 1).x
    }

    /// Control points in display space.
    pub fn points_display<'a, S: Scaler>(
        &'a self,
        scaler: &'a S,
    ) -> impl Iterator<Item = (f64, f64)> + 'a {
        self.points()
            .map(|p| (scaler.scale_pos(p.x), scaler.scale_y(p.y)))
    }

    /// Splits segment `segment_index` at its midpoint; both halves keep the
    /// segment's type. Returns the chain index of the new control point.
    pub fn split_at(
        &mut self,
        segment_index: usize,
        note_start_ms: i64,
        row_height_unit: f64,
    ) -> Result<(usize, CurveEdit), CurveError> {
        if self.point_count() >= MAX_CONTROL_POINTS {
            return Err(CurveError::ControlPointLimit);
        }
        let before = self.to_data(note_start_ms, row_height_unit);

        let segment = self.segments[segment_index];
        let (start, end) = (self.points[segment.start], self.points[segment.end]);
        let midpoint = CurvePoint {
            x: (start.x + end.x) / 2.0,
            y: (start.y + end.y) / 2.0,
        };
        self.points.push(midpoint);
        let mid_index = self.points.len() - 1;

        self.segments[segment_index].end = mid_index;
        self.segments.insert(
            segment_index + 1,
            Segment {
                start: mid_index,
                end: segment.end,
                ty: segment.ty,
            },
        );
        self.debug_check();

        let edit = CurveEdit {
            kind: CurveEditKind::Split,
            before,
            after: self.to_data(note_start_ms, row_height_unit),
        };
        Ok((segment_index + 1, edit))
    }

    /// Merges the two segments around interior control point `point_index`
    /// into one spanning the outer endpoints, keeping the first segment's
    /// type. Boundary points are never removable: a curve always has at
    /// least one segment.
    pub fn merge_at(
        &mut self,
        point_index: usize,
        note_start_ms: i64,
        row_height_unit: f64,
    ) -> Result<CurveEdit, CurveError> {
        if point_index == 0 || point_index >= self.point_count() - 1 {
            return Err(CurveError::BoundaryMerge);
        }
        let before = self.to_data(note_start_ms, row_height_unit);

        let removed_arena = self.arena_index(point_index);
        let second = self.segments.remove(point_index);
        self.segments[point_index - 1].end = second.end;

        self.points.remove(removed_arena);
        for segment in &mut self.segments {
            if segment.start > removed_arena {
                segment.start -= 1;
            }
            if segment.end > removed_arena {
                segment.end -= 1;
            }
        }
        self.debug_check();

        Ok(CurveEdit {
            kind: CurveEditKind::Merge,
            before,
            after: self.to_data(note_start_ms, row_height_unit),
        })
    }

    /// Replaces a segment's curve type in place; endpoints do not move.
    pub fn retype(
        &mut self,
        segment_index: usize,
        ty: CurveType,
        note_start_ms: i64,
        row_height_unit: f64,
    ) -> CurveEdit {
        let before = self.to_data(note_start_ms, row_height_unit);
        self.segments[segment_index].ty = ty;
        CurveEdit {
            kind: CurveEditKind::Retype,
            before,
            after: self.to_data(note_start_ms, row_height_unit),
        }
    }

    pub fn begin_drag(&self, note_start_ms: i64, row_height_unit: f64) -> CurveDrag {
        CurveDrag {
            start_data: self.to_data(note_start_ms, row_height_unit),
            changed: false,
        }
    }

    /// Moves a control point during a drag. The x-coordinate is clamped
    /// between its neighbors so the chain stays strictly x-monotonic; the
    /// boundary points are pitch anchors and keep their y.
    pub fn drag_point(&mut self, drag: &mut CurveDrag, point_index: usize, x: f64, y: f64) {
        let arena = self.arena_index(point_index);
        let mut point = self.points[arena];

        let min_x = (point_index > 0).then(|| self.point(point_index - 1).x + MIN_POINT_GAP);
        let max_x =
            (point_index < self.point_count() - 1).then(|| self.point(point_index + 1).x - MIN_POINT_GAP);
        let new_x = x
            .max(min_x.unwrap_or(f64::NEG_INFINITY))
            .min(max_x.unwrap_or(f64::INFINITY));
        if min_x.is_none_or(|min| new_x >= min) && max_x.is_none_or(|max| new_x <= max) {
            point.x = new_x;
        }

        let interior = point_index > 0 && point_index < self.point_count() - 1;
        if interior {
            point.y = y;
        }

        if point != self.points[arena] {
            self.points[arena] = point;
            drag.changed = true;
        }
        self.debug_check();
    }

    /// Ends a drag; yields a change event only if something actually moved.
    pub fn finish_drag(
        &self,
        drag: CurveDrag,
        note_start_ms: i64,
        row_height_unit: f64,
    ) -> Option<CurveEdit> {
        drag.changed.then(|| CurveEdit {
            kind: CurveEditKind::Drag,
            before: drag.start_data,
            after: self.to_data(note_start_ms, row_height_unit),
        })
    }

    fn debug_check(&self) {
        debug_assert!(!self.segments.is_empty(), "curve chain must not be empty");
        if cfg!(debug_assertions) {
            for window in 0..self.point_count() - 1 {
                let (a, b) = (self.point(window), self.point(window + 1));
                debug_assert!(
                    a.x < b.x,
                    "control points must be strictly x-increasing: {} >= {}",
                    a.x,
                    b.x
                );
            }
            for pair in self.segments.windows(2) {
                debug_assert_eq!(
                    pair[0].end, pair[1].start,
                    "adjacent segments must share their endpoint"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn simple_curve() -> CurveModel {
        CurveModel::new(
            CurvePoint { x: 960.0, y: 40.0 },
            CurvePoint { x: 1040.0, y: 44.0 },
            CurveType::S,
        )
    }

    #[test]
    fn test_split_inserts_midpoint() {
        let mut curve = simple_curve();
        let (new_point, edit) = curve.split_at(0, 1000, 1.0).unwrap();

        assert_eq!(curve.segment_count(), 2);
        assert_eq!(new_point, 1);
        let midpoint = curve.point(1);
        assert_eq!(midpoint, CurvePoint { x: 1000.0, y: 42.0 });
        // Both halves inherit the original type.
        assert_eq!(curve.segment_type(0), CurveType::S);
        assert_eq!(curve.segment_type(1), CurveType::S);
        assert_eq!(edit.kind, CurveEditKind::Split);
        assert_eq!(edit.after.segment_count(), 2);
    }

    #[test]
    fn test_split_respects_control_point_cap() {
        let mut curve = simple_curve();
        while curve.point_count() < MAX_CONTROL_POINTS {
            // Split the widest segment so spans never collapse to zero.
            let widest = (0..curve.segment_count())
                .max_by(|&a, &b| {
                    let width = |i: usize| curve.point(i + 1).x - curve.point(i).x;
                    width(a).total_cmp(&width(b))
                })
                .unwrap();
            curve.split_at(widest, 1000, 1.0).unwrap();
        }
        assert_eq!(curve.split_at(0, 1000, 1.0), Err(CurveError::ControlPointLimit));
        assert_eq!(curve.point_count(), MAX_CONTROL_POINTS);
    }

    #[test]
    fn test_merge_rejects_boundary_points() {
        let mut curve = simple_curve();
        curve.split_at(0, 1000, 1.0).unwrap();
        assert_eq!(curve.merge_at(0, 1000, 1.0), Err(CurveError::BoundaryMerge));
        assert_eq!(curve.merge_at(2, 1000, 1.0), Err(CurveError::BoundaryMerge));
        assert_eq!(curve.segment_count(), 2);
    }

    #[test]
    fn test_merge_inverts_split() {
        let mut curve = simple_curve();
        curve.retype(0, CurveType::J, 1000, 1.0);
        let before = curve.to_data(1000, 1.0);

        let (new_point, _) = curve.split_at(0, 1000, 1.0).unwrap();
        let edit = curve.merge_at(new_point, 1000, 1.0).unwrap();

        assert_eq!(curve.to_data(1000, 1.0), before);
        // The combined segment takes the first segment's type.
        assert_eq!(curve.segment_type(0), CurveType::J);
        assert_eq!(edit.after, before);
    }

    #[test]
    fn test_merge_keeps_first_segment_type() {
        let mut curve = simple_curve();
        let (point, _) = curve.split_at(0, 1000, 1.0).unwrap();
        curve.retype(0, CurveType::R, 1000, 1.0);
        curve.retype(1, CurveType::Linear, 1000, 1.0);
        curve.merge_at(point, 1000, 1.0).unwrap();
        assert_eq!(curve.segment_type(0), CurveType::R);
    }

    #[test]
    fn test_to_data_canonicalization() {
        let mut curve = simple_curve();
        curve.split_at(0, 1000, 1.0).unwrap();
        let data = curve.to_data(1000, 1.0);

        assert_eq!(data.start_offset_ms, -40.0);
        assert_eq!(data.widths.as_slice(), &[40.0, 40.0]);
        // Interior point sits 2 rows below the final y of 44: (44 - 42) * 10.
        assert_eq!(data.heights.as_slice(), &[20.0]);
        assert_eq!(data.shapes.as_slice(), &[CurveType::S, CurveType::S]);
    }

    #[test]
    fn test_data_round_trip() {
        let data = CurveData::new(
            -40.0,
            smallvec![30.0, 50.0, 20.0],
            smallvec![15.0, -10.0],
            smallvec![CurveType::S, CurveType::J, CurveType::R],
        );
        let curve = CurveModel::from_data(&data, 1000, 40.0, 44.0, 1.0);
        let first = curve.to_data(1000, 1.0);
        assert_eq!(first, data);

        // Canonicalization is idempotent through another rebuild.
        let again = CurveModel::from_data(&first, 1000, 40.0, 44.0, 1.0).to_data(1000, 1.0);
        assert_eq!(again, first);
    }

    #[test]
    fn test_reanchoring_keeps_data_shape() {
        let data = CurveData::single(-40.0, 80.0, CurveType::S);
        // Same serialized curve, new previous-pitch anchor.
        let reanchored = CurveModel::from_data(&data, 1000, 47.0, 44.0, 1.0);
        assert_eq!(reanchored.point(0).y, 47.0);
        assert_eq!(reanchored.to_data(1000, 1.0), data);
    }

    #[test]
    fn test_drag_clamps_between_neighbors() {
        let mut curve = simple_curve();
        curve.split_at(0, 1000, 1.0).unwrap();
        let mut drag = curve.begin_drag(1000, 1.0);

        // Way past the right neighbor: clamped just short of it.
        curve.drag_point(&mut drag, 1, 2000.0, 45.0);
        let point = curve.point(1);
        assert_eq!(point.x, 1040.0 - 1.0);
        assert_eq!(point.y, 45.0);

        let edit = curve.finish_drag(drag, 1000, 1.0).unwrap();
        assert_eq!(edit.kind, CurveEditKind::Drag);
        assert_ne!(edit.before, edit.after);
    }

    #[test]
    fn test_drag_locks_boundary_pitch() {
        let mut curve = simple_curve();
        let mut drag = curve.begin_drag(1000, 1.0);
        curve.drag_point(&mut drag, 0, 900.0, 99.0);
        let start = curve.point(0);
        assert_eq!(start.x, 900.0);
        // Boundary points are pitch anchors; y does not move.
        assert_eq!(start.y, 40.0);
    }

    #[test]
    fn test_unmoved_drag_emits_no_event() {
        let mut curve = simple_curve();
        let mut drag = curve.begin_drag(1000, 1.0);
        let p = curve.point(0);
        curve.drag_point(&mut drag, 0, p.x, p.y);
        assert!(curve.finish_drag(drag, 1000, 1.0).is_none());
    }
}
