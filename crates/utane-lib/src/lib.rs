//! Core data model for the utane note-timeline editing engine: the ordered
//! note store and the value types that travel between the editor and the
//! external song model.

mod note;
pub use note::{Note, MAX_DURATION};
mod range;
pub use range::Range;
mod timeline;
pub use timeline::{NoteTimeline, PositionOccupied};
mod envelope;
pub use envelope::EnvelopeData;
mod pitchbend;
pub use pitchbend::{CurveData, CurveType};
mod data;
pub use data::{MutateResponse, NoteData, NoteUpdateData};
pub mod pitch;
