//! Typed event and output contracts of the engine.
//!
//! A closed set of message variants replaces any stringly-typed event bus:
//! every input arrives as an [`EngineEvent`] on the single queue, every
//! observable effect leaves as an [`EngineOutput`].  No on-disk or wire
//! format is owned here — these are in-process contracts only.

use crate::question::QuestionId;

// ---------------------------------------------------------------------------
// StreamSource
// ---------------------------------------------------------------------------

/// Which audio pipeline an event belongs to.
///
/// The two streams run as fully parallel pipelines; only remote transcripts
/// feed the current question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamSource {
    /// The local microphone (the user's own voice).
    Local,
    /// The remote meeting audio (the other party).
    Remote,
}

impl StreamSource {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            StreamSource::Local => "local",
            StreamSource::Remote => "remote",
        }
    }
}

// ---------------------------------------------------------------------------
// EngineEvent
// ---------------------------------------------------------------------------

/// Every input the engine consumes, serialized onto one queue.
///
/// Timer expiry is not a separate thread poking shared state: silence
/// timeouts are recomputed from `Volume` ticks, so "timer fires" and "final
/// message arrives" are totally ordered like everything else.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// A partial or final transcript from the STT collaborator.
    Speech {
        source: StreamSource,
        text: String,
        /// `true` for a provisional fragment the backend may still revise.
        is_interim: bool,
        timestamp_ms: u64,
    },

    /// One audio-frame tick (~every 20–50 ms): instantaneous volume percent
    /// plus the raw PCM frame when the capture layer provides one.
    Volume {
        source: StreamSource,
        /// 0–100.
        percent: f32,
        pcm: Option<Vec<i16>>,
    },

    /// A capture stream (re)started; per-stream VAD state is reset.
    StreamStarted { source: StreamSource },

    /// Host request to switch the active mode.
    ModeSwitch { mode: crate::modes::Mode },

    /// Explicit user selection of a question (CURRENT or a history id),
    /// which may trigger promotion and dispatch.
    Select { question_id: QuestionId },

    /// The answer generator finished the request it was given for
    /// `question_id` (the id as tagged at dispatch time).
    AnswerCompleted { question_id: QuestionId },

    /// The answer generator failed.
    AnswerFailed {
        question_id: QuestionId,
        reason: String,
    },

    /// Full engine reset: history, current question, counters, answered set.
    Reset,
}

// ---------------------------------------------------------------------------
// HistorySnapshot
// ---------------------------------------------------------------------------

/// Read-only view of one history entry, as shipped to the host UI.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySnapshot {
    pub id: String,
    pub text: String,
    pub turn_id: u64,
    pub is_answered: bool,
    pub is_incomplete: bool,
    pub is_selected: bool,
}

// ---------------------------------------------------------------------------
// EngineOutput
// ---------------------------------------------------------------------------

/// Every observable effect the engine produces.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineOutput {
    /// The live question changed (new fragment, promotion, reset).
    CurrentQuestionChanged { text: String, is_selected: bool },

    /// History changed (promotion, answer completion, reset).
    HistoryChanged {
        entries: Vec<HistorySnapshot>,
        selected_id: Option<QuestionId>,
    },

    /// A question was handed to the answer generator exactly once.
    DispatchRequested {
        question_id: QuestionId,
        text: String,
        turn_id: u64,
    },

    /// Ask the STT collaborator to force-emit its buffered audio as a final
    /// result (stable silence was just detected on `source`).
    FlushNow { source: StreamSource },

    /// Human-readable status notification (recoverable guard failures,
    /// mode switches).
    Status { message: String },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
