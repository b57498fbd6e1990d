//! Dispatch coordination: exactly-once-per-turn hand-off to the answer
//! generator, re-targeting across promotion, stale-response rejection.
//!
//! Every guard runs before any mutation — check-then-act, never
//! act-then-rollback — so a rejected dispatch leaves no trace in the state.

use thiserror::Error;

use crate::modes::ModeStrategy;
use crate::question::{normalize_for_compare, QuestionId};

use super::state::{EngineState, InFlightDispatch};

// ---------------------------------------------------------------------------
// DispatchError
// ---------------------------------------------------------------------------

/// Recoverable reasons a dispatch request is refused.  None of these corrupt
/// state; the host surfaces them as status messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// Nothing to dispatch: the question text is blank.
    #[error("empty question — nothing to answer")]
    EmptyQuestion,

    /// The live question was already dispatched with identical (normalized)
    /// text; rapid double-fire suppressed.
    #[error("question already sent")]
    DuplicateDispatch,

    /// The history entry already has an answer and the active mode forbids
    /// re-asking.
    #[error("question already answered")]
    AlreadyAnswered,

    /// Guided mode already produced an answer this turn.
    #[error("this turn was already answered")]
    AlreadyAnsweredThisTurn,
}

// ---------------------------------------------------------------------------
// DispatchTicket
// ---------------------------------------------------------------------------

/// An accepted dispatch: what to hand to the answer generator.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchTicket {
    pub question_id: QuestionId,
    pub text: String,
    pub turn_id: u64,
}

// ---------------------------------------------------------------------------
// Request path
// ---------------------------------------------------------------------------

/// Run the guard ladder and, on success, record the in-flight request.
///
/// Guard order:
/// 1. blank text → [`DispatchError::EmptyQuestion`];
/// 2. live question with unchanged normalized text, or a history entry with
///    a request still in flight → [`DispatchError::DuplicateDispatch`];
/// 3. answered history entry when the mode forbids re-asking →
///    [`DispatchError::AlreadyAnswered`];
/// 4. guided mode, live question, turn already answered →
///    [`DispatchError::AlreadyAnsweredThisTurn`].
pub fn request_dispatch(
    state: &mut EngineState,
    strategy: &dyn ModeStrategy,
    question_id: QuestionId,
    text: &str,
) -> Result<DispatchTicket, DispatchError> {
    if !strategy.validate_question(text) {
        return Err(DispatchError::EmptyQuestion);
    }

    let normalized = normalize_for_compare(text);

    if question_id.is_current()
        && state.last_dispatched_normalized.as_deref() == Some(normalized.as_str())
    {
        return Err(DispatchError::DuplicateDispatch);
    }

    // Concurrent outstanding dispatches are only ever against distinct
    // history ids; a second request for one still in flight is a re-fire.
    if !question_id.is_current() && state.in_flight.iter().any(|f| f.target == question_id) {
        return Err(DispatchError::DuplicateDispatch);
    }

    if !question_id.is_current()
        && state.is_answered(&question_id)
        && !strategy.can_re_ask(&question_id)
    {
        return Err(DispatchError::AlreadyAnswered);
    }

    if strategy.increments_guided_turn()
        && question_id.is_current()
        && state.answered_turn_id == Some(state.guided_turn_id)
    {
        return Err(DispatchError::AlreadyAnsweredThisTurn);
    }

    state.dispatched_turn_id = Some(state.guided_turn_id);
    state.in_flight.push(InFlightDispatch {
        origin: question_id.clone(),
        target: question_id.clone(),
        turn_id: state.guided_turn_id,
    });
    if question_id.is_current() {
        state.last_dispatched_normalized = Some(normalized);
    }

    log::info!(
        "dispatch requested for {question_id} (turn {})",
        state.guided_turn_id
    );

    Ok(DispatchTicket {
        question_id,
        text: text.trim().to_string(),
        turn_id: state.guided_turn_id,
    })
}

// ---------------------------------------------------------------------------
// Completion path
// ---------------------------------------------------------------------------

/// Reconcile an answer-generator completion.
///
/// The completion is tagged with the id the producer was invoked with, which
/// may be the stale CURRENT sentinel after a mid-flight promotion; matching
/// accepts either the origin or the remapped target.  Returns the resolved
/// target id, or `None` for a stale completion (discarded, logged only).
pub fn complete_dispatch(state: &mut EngineState, completed_id: &QuestionId) -> Option<QuestionId> {
    let index = state
        .in_flight
        .iter()
        .position(|f| &f.origin == completed_id || &f.target == completed_id)?;

    let flight = state.in_flight.remove(index);
    let target = flight.target.clone();

    state.answered.insert(target.clone());
    state.answered_turn_id = Some(flight.turn_id);
    state.dispatched_turn_id = None;

    if let QuestionId::History(id) = &target {
        if let Some(entry) = state.entry_mut(id) {
            entry.answered = true;
        }
    }

    log::info!("answer completed for {target} (turn {})", flight.turn_id);
    Some(target)
}

/// Drop the in-flight record for a failed request so the turn can be retried.
/// Returns `false` when no matching dispatch was tracked (stale failure).
pub fn fail_dispatch(state: &mut EngineState, failed_id: &QuestionId, reason: &str) -> bool {
    let Some(index) = state
        .in_flight
        .iter()
        .position(|f| &f.origin == failed_id || &f.target == failed_id)
    else {
        log::debug!("stale failure for {failed_id} discarded: {reason}");
        return false;
    };

    let flight = state.in_flight.remove(index);
    state.dispatched_turn_id = None;
    // The retry guard must not keep refusing the same text after a failure.
    if flight.origin.is_current() {
        state.last_dispatched_normalized = None;
    }

    log::warn!("answer failed for {} (turn {}): {reason}", flight.target, flight.turn_id);
    true
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
