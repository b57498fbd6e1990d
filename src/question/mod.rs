//! Question data model and transcript text handling.
//!
//! * [`CurrentQuestion`] — the single live question being accumulated from
//!   remote-stream transcripts.  Its display text is always *derived* from
//!   the final and interim fragments, never stored.
//! * [`HistoryEntry`] — an immutable promoted question; only the
//!   `answered`/`incomplete` flags may change after promotion.
//! * [`QuestionId`] — either the CURRENT sentinel or a permanent history id.
//! * [`text`] — filler-token stripping and comparison normalisation.

pub mod model;
pub mod text;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use model::{CurrentQuestion, HistoryEntry, QuestionId};
pub use text::{clean_transcript, normalize_for_compare};
