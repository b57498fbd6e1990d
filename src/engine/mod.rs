//! The transcript consolidation & turn-finalization engine.
//!
//! # Architecture
//!
//! ```text
//! EngineEvent (mpsc, single queue)
//!        │
//!        ▼
//! Engine::run()  ← single async task, owns all mutable state
//!        │
//!        ├─ Volume ──▶ VadDetector ──▶ SilenceTracker ──▶ FlushNow{source}
//!        │
//!        ├─ Speech (remote, cleaned) ──▶ CurrentQuestion::consolidate
//!        │       └─ finalize trigger ──▶ lifecycle::finalize_current
//!        │               └─ promotion ──▶ history + (guided) auto-dispatch
//!        │
//!        ├─ Select ──▶ dispatch::request_dispatch ──▶ DispatchRequested
//!        │                                            + AnswerGenerator task
//!        │
//!        └─ AnswerCompleted/Failed ──▶ dispatch::complete/fail
//!
//! EngineOutput (mpsc) ──▶ host UI / STT collaborator
//! ```
//!
//! Everything that mutates [`EngineState`] happens inside the one event loop;
//! there are no locks and no interleaved transitions.  Answer generation is
//! fire-and-forget: the request runs on a spawned task and its completion
//! re-enters the queue as an ordinary event.

pub mod dispatch;
pub mod events;
pub mod lifecycle;
pub mod runner;
pub mod state;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use dispatch::DispatchError;
pub use events::{EngineEvent, EngineOutput, HistorySnapshot, StreamSource};
pub use runner::Engine;
pub use state::EngineState;
