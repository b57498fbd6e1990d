//! Voice-activity detection and silence debouncing.
//!
//! Two small state machines, one instance of each per audio source:
//!
//! * [`VadDetector`] — classifies a single tick (optional PCM frame plus an
//!   instantaneous volume percentage) as speech or silence.
//! * [`SilenceTracker`] — turns the stream of speech/silence booleans into a
//!   single debounced finalize edge, fired at most once per silence episode.
//!
//! ```text
//! VolumeSample ──▶ VadDetector::classify ──▶ SilenceTracker::observe
//!                                                  │
//!                                                  └─▶ SilenceEdge::Finalize
//!                                                      (flush the STT source)
//! ```
//!
//! The two sources (local microphone / remote meeting audio) never share
//! state; each gets its own detector and tracker with its own timeout.

pub mod detector;
pub mod silence;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use detector::VadDetector;
pub use silence::{SilenceEdge, SilenceTracker};
