//! Answer generation for promoted questions.
//!
//! The engine never talks to a provider directly — it emits
//! `DispatchRequested` and the host forwards the question to an
//! [`AnswerGenerator`], feeding the outcome back into the event queue.
//!
//! * [`AnswerGenerator`] — async trait implemented by all backends.
//! * [`ApiAnswerGenerator`] — OpenAI-compatible REST API backend.
//! * [`AnswerError`] — error variants for answer generation.

pub mod generator;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use generator::{AnswerError, AnswerGenerator, ApiAnswerGenerator};

#[cfg(test)]
pub use generator::MockAnswerGenerator;
