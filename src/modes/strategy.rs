//! Mode strategies — the behaviour set that differs between guided and
//! freeform conversations.
//!
//! Each strategy is a stateless behaviour bundle; all mutable bookkeeping
//! stays in the engine state.  The trait is object-safe so the manager can
//! hold strategies behind `Box<dyn ModeStrategy>`.

use serde::{Deserialize, Serialize};

use crate::question::QuestionId;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Closed set of conversation modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mode {
    /// Interview-style: questions auto-dispatch on finalize, one answer per
    /// turn, no re-asking.
    Guided,
    /// Note-taking style: finalize only promotes; dispatch happens on
    /// explicit selection, and re-asking is allowed.
    Freeform,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Guided => write!(f, "guided"),
            Mode::Freeform => write!(f, "freeform"),
        }
    }
}

// ---------------------------------------------------------------------------
// ModeStrategy trait
// ---------------------------------------------------------------------------

/// Behaviour set consulted by the lifecycle and dispatch coordinator.
pub trait ModeStrategy: Send + Sync {
    /// Short label for logs and status lines.
    fn name(&self) -> &'static str;

    /// Whether `text` is a dispatchable question.  Shared by both modes:
    /// anything non-blank qualifies.
    fn validate_question(&self, text: &str) -> bool {
        !text.trim().is_empty()
    }

    /// May an already-answered history question be dispatched again?
    fn can_re_ask(&self, question_id: &QuestionId) -> bool;

    /// Should a freshly promoted question be dispatched automatically?
    fn auto_dispatch_on_finalize(&self) -> bool;

    /// Does promotion advance the guided turn counter?
    fn increments_guided_turn(&self) -> bool;

    /// One-line mode state description for the host UI.
    fn mode_label(&self) -> &'static str;
}

// Compile-time assertion: Box<dyn ModeStrategy> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn ModeStrategy>) {}
};

// ---------------------------------------------------------------------------
// GuidedStrategy
// ---------------------------------------------------------------------------

/// Guided (interview) behaviour: auto-dispatch, strict one-answer-per-turn,
/// no re-asking.
#[derive(Debug, Default, Clone, Copy)]
pub struct GuidedStrategy;

impl ModeStrategy for GuidedStrategy {
    fn name(&self) -> &'static str {
        "guided"
    }

    fn can_re_ask(&self, _question_id: &QuestionId) -> bool {
        false
    }

    fn auto_dispatch_on_finalize(&self) -> bool {
        true
    }

    fn increments_guided_turn(&self) -> bool {
        true
    }

    fn mode_label(&self) -> &'static str {
        "guided — answering automatically"
    }
}

// ---------------------------------------------------------------------------
// FreeformStrategy
// ---------------------------------------------------------------------------

/// Freeform behaviour: promotion only; the user decides what gets answered,
/// as often as they like.
#[derive(Debug, Default, Clone, Copy)]
pub struct FreeformStrategy;

impl ModeStrategy for FreeformStrategy {
    fn name(&self) -> &'static str {
        "freeform"
    }

    fn can_re_ask(&self, _question_id: &QuestionId) -> bool {
        true
    }

    fn auto_dispatch_on_finalize(&self) -> bool {
        false
    }

    fn increments_guided_turn(&self) -> bool {
        false
    }

    fn mode_label(&self) -> &'static str {
        "freeform — select a question to answer"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
