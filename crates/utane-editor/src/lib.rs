//! The utane note-timeline editing engine.
//!
//! [`EditSession`] is the entry point: it owns the cached [`NoteTimeline`]
//! and drives every mutation through the external [`SongModel`]. The other
//! modules are its collaborators: overlap resolution, the live portamento
//! curve chain, envelope outline geometry and model-to-display scaling.
//!
//! [`NoteTimeline`]: utane_lib::NoteTimeline

mod curve;
pub use curve::{
    CurveDrag, CurveEdit, CurveEditKind, CurveError, CurveModel, CurvePoint, MAX_CONTROL_POINTS,
};
mod envelope_view;
pub use envelope_view::{editor_outline, outline, EnvelopeAnchor, ANCHOR_COUNT};
mod resolver;
pub use resolver::OverlapResolver;
mod scale;
pub use scale::{Scaler, ZoomScaler};
mod session;
pub use session::{ChangeSet, EditSession, Mode, SongModel};
